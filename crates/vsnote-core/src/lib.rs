pub mod actions;
pub mod client;
pub mod clock;
pub mod config;
pub mod dispatcher;
pub mod error;
pub mod heartbeat;
pub mod identity;
pub mod io;
pub mod migrations;
pub mod paths;
pub mod transport;
pub mod version;

pub use client::{Client, ClientStatus, InitReport};
pub use error::{Result, TelemetryError};
