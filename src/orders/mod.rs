//! Order workflow: Sales decides, Shipping ships.
//!
//! ```text
//! client ──RegisterOrder──► Sales ──OrderAccepted──► Shipping ──OrderShipped──►
//!                              └────OrderRefused───►
//! ```

mod messages;
pub mod sales;
pub mod shipping;
mod status;

pub use messages::{OrderAccepted, OrderId, OrderRefused, OrderShipped, RegisterOrder};
pub use status::{InvalidTransition, OrderStatus};

use crate::bus::Message;
use crate::endpoint::Endpoint;
use crate::host::{BusConfig, EndpointConfig};

pub const SALES: &str = "Sales";
pub const SHIPPING: &str = "Shipping";

/// Sales endpoint with its handler table.
pub fn sales_endpoint() -> Endpoint {
    crate::register_handlers!(Endpoint::new(SALES), sales)
}

/// Shipping endpoint with its handler table.
pub fn shipping_endpoint() -> Endpoint {
    crate::register_handlers!(Endpoint::new(SHIPPING), shipping)
}

/// Canonical wiring: `RegisterOrder` is owned by Sales, Shipping subscribes
/// to `OrderAccepted`.
pub fn bus_config() -> BusConfig {
    BusConfig::new()
        .endpoint(EndpointConfig::new(SALES).handles(RegisterOrder::MESSAGE_TYPE))
        .endpoint(EndpointConfig::new(SHIPPING).subscribes(OrderAccepted::MESSAGE_TYPE))
        .route(RegisterOrder::MESSAGE_TYPE, SALES)
}
