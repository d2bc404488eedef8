//! Bus and host integration tests.

mod support;
mod host;
mod delivery;
