//! PubIP Watch: public address change notifier
//!
//! A library for detecting changes of a host's public IP address, sending
//! notifications when it changes, and emitting a periodic liveness
//! heartbeat. Each invocation performs one detection cycle and exits; an
//! external scheduler provides the cadence.

pub mod config;
pub mod heartbeat;
pub mod notify;
pub mod resolver;
pub mod state;
pub mod time;
pub mod transport;
pub mod watch;
