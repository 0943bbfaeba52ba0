//! Classified ads application library
//!
//! Hosts the `ads` module and the bootstrap wiring it into the kernel.

pub mod bootstrap;
pub mod modules;

pub use bootstrap::{migrate, serve};
