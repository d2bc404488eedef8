//! Shipping: ships every accepted order.

use tracing::info;

use crate::bus::Message;
use crate::endpoint::{Context, HandlerError};

use super::messages::{OrderAccepted, OrderShipped};

pub const MESSAGE: &str = OrderAccepted::MESSAGE_TYPE;

/// Ships unconditionally. Redelivered acceptances ship again; there is no
/// deduplication here.
pub fn handle(ctx: &Context<'_>) -> Result<(), HandlerError> {
    let accepted = ctx.message::<OrderAccepted>()?;
    info!(order_id = accepted.order_id, "order accepted, shipping");

    ctx.publish(&OrderShipped {
        order_id: accepted.order_id,
    })
}
