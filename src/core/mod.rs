//! Core configuration and scheduling
//!
//! Contains the system configuration and the fixed-rate tick clock

mod clock;
mod config;

pub use clock::TickClock;
pub use config::{OverflowPolicy, ParticleDensity, SystemConfig};
