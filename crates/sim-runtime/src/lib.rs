#![deny(warnings)]

//! Runtime for NimClickr: configuration, the game session a front end
//! drives, and the tick driver that advances it on a fixed cadence.

mod config;
mod driver;
mod session;

pub use config::{ConfigError, RuntimeConfig};
pub use driver::{run_realtime, TickDriver, TickReport};
pub use session::Session;
