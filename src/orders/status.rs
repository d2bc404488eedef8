//! Order lifecycle as seen from the events on the bus.
//!
//! ```text
//! Submitted ──► Accepted ──► Shipped
//!     │
//!     └──────► Refused
//! ```

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::bus::Envelope;

use super::messages::{OrderAccepted, OrderId, OrderRefused, OrderShipped, RegisterOrder};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OrderStatus {
    #[default]
    Submitted,
    Accepted,
    Refused,
    Shipped,
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            OrderStatus::Submitted => "submitted",
            OrderStatus::Accepted => "accepted",
            OrderStatus::Refused => "refused",
            OrderStatus::Shipped => "shipped",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("order cannot go from {from} to {to}")]
pub struct InvalidTransition {
    pub from: OrderStatus,
    pub to: OrderStatus,
}

impl OrderStatus {
    /// Apply a transition, refusing any the workflow does not allow.
    pub fn transition(self, to: OrderStatus) -> Result<OrderStatus, InvalidTransition> {
        use OrderStatus::*;
        match (self, to) {
            (Submitted, Accepted) | (Submitted, Refused) | (Accepted, Shipped) => Ok(to),
            (from, to) => Err(InvalidTransition { from, to }),
        }
    }

    pub fn is_final(self) -> bool {
        matches!(self, OrderStatus::Refused | OrderStatus::Shipped)
    }

    /// The order and status an order-workflow envelope stands for.
    pub fn from_envelope(envelope: &Envelope) -> Option<(OrderId, OrderStatus)> {
        if envelope.is::<RegisterOrder>() {
            let m = envelope.decode::<RegisterOrder>().ok()?;
            Some((m.order_id, OrderStatus::Submitted))
        } else if envelope.is::<OrderAccepted>() {
            let m = envelope.decode::<OrderAccepted>().ok()?;
            Some((m.order_id, OrderStatus::Accepted))
        } else if envelope.is::<OrderRefused>() {
            let m = envelope.decode::<OrderRefused>().ok()?;
            Some((m.order_id, OrderStatus::Refused))
        } else if envelope.is::<OrderShipped>() {
            let m = envelope.decode::<OrderShipped>().ok()?;
            Some((m.order_id, OrderStatus::Shipped))
        } else {
            None
        }
    }
}
