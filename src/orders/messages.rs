//! Messages exchanged by Sales and Shipping.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::bus::{Message, MessageKind};

pub type OrderId = u64;

/// Client → Sales: register a new order.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegisterOrder {
    pub order_id: OrderId,
    pub customer_name: String,
    #[serde(with = "rust_decimal::serde::str")]
    pub amount: Decimal,
}

impl Message for RegisterOrder {
    const MESSAGE_TYPE: &'static str = "RegisterOrder";
    const KIND: MessageKind = MessageKind::Command;
}

/// Sales: the order is within the acceptance limit.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderAccepted {
    pub order_id: OrderId,
}

impl Message for OrderAccepted {
    const MESSAGE_TYPE: &'static str = "OrderAccepted";
    const KIND: MessageKind = MessageKind::Event;
}

/// Sales: the order exceeds the acceptance limit.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderRefused {
    pub order_id: OrderId,
}

impl Message for OrderRefused {
    const MESSAGE_TYPE: &'static str = "OrderRefused";
    const KIND: MessageKind = MessageKind::Event;
}

/// Shipping: the order left the warehouse.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderShipped {
    pub order_id: OrderId,
}

impl Message for OrderShipped {
    const MESSAGE_TYPE: &'static str = "OrderShipped";
    const KIND: MessageKind = MessageKind::Event;
}
