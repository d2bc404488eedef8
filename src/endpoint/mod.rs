//! Message handler tables and the worker runtime that hosts them.
//!
//! Build an endpoint by registering one handler per message type. Each
//! handler receives a `Context` with the inbound message and publishes or
//! sends follow-up messages through it.
//!
//! ## Quick Start
//!
//! ```ignore
//! use order_bus::endpoint::Endpoint;
//!
//! let shipping = Endpoint::new("Shipping")
//!     .handle_message(|ctx, accepted: OrderAccepted| {
//!         ctx.publish(&OrderShipped { order_id: accepted.order_id })
//!     });
//!
//! let handle = order_bus::endpoint::spawn(
//!     shipping,
//!     vec!["OrderAccepted".into()],
//!     router,
//!     listener,
//!     Duration::from_millis(50),
//! )?;
//! let stats = handle.stop();
//! ```
//!
//! ## Handler Convention
//!
//! Each handler module follows this convention:
//!
//! ```ignore
//! // src/orders/shipping.rs
//!
//! pub const MESSAGE: &str = OrderAccepted::MESSAGE_TYPE;
//!
//! pub fn handle(ctx: &Context<'_>) -> Result<(), HandlerError> {
//!     let accepted = ctx.message::<OrderAccepted>()?;
//!     ctx.publish(&OrderShipped { order_id: accepted.order_id })
//! }
//! ```

mod context;
#[allow(clippy::module_inception)]
mod endpoint;
mod error;
mod runtime;

pub use context::Context;
pub use endpoint::Endpoint;
pub use error::HandlerError;
pub use runtime::{spawn, EndpointHandle, EndpointStats};

/// Register handler modules with an endpoint using the convention pattern.
///
/// Each handler module must export:
/// - `MESSAGE: &str`: the message type it handles
/// - `handle(ctx) -> Result<(), HandlerError>`: the handler
///
/// # Example
/// ```ignore
/// let sales = order_bus::register_handlers!(
///     Endpoint::new("Sales"),
///     orders::sales,
/// );
/// ```
#[macro_export]
macro_rules! register_handlers {
    ($endpoint:expr, $( $($seg:ident)::+ ),+ $(,)?) => {
        $endpoint
        $(
            .handle(
                $($seg)::+::MESSAGE,
                $($seg)::+::handle,
            )
        )+
    };
}
