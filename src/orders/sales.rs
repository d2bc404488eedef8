//! Sales: accepts or refuses registered orders.

use rust_decimal::Decimal;
use tracing::info;

use crate::bus::Message;
use crate::endpoint::{Context, HandlerError};

use super::messages::{OrderAccepted, OrderRefused, RegisterOrder};

pub const MESSAGE: &str = RegisterOrder::MESSAGE_TYPE;

/// Largest amount that is still accepted.
pub const ACCEPTANCE_LIMIT: Decimal = Decimal::from_parts(500, 0, 0, false, 0);

pub fn is_acceptable(amount: Decimal) -> bool {
    amount <= ACCEPTANCE_LIMIT
}

pub fn handle(ctx: &Context<'_>) -> Result<(), HandlerError> {
    let order = ctx.message::<RegisterOrder>()?;
    info!(
        order_id = order.order_id,
        customer = %order.customer_name,
        amount = %order.amount,
        "received order, processing"
    );

    if is_acceptable(order.amount) {
        ctx.publish(&OrderAccepted {
            order_id: order.order_id,
        })
    } else {
        ctx.publish(&OrderRefused {
            order_id: order.order_id,
        })
    }
}
