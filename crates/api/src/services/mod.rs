//! Application services: the access gate and the order assembler.

pub mod checkout;
pub mod gate;

pub use checkout::CheckoutError;
pub use gate::{AccessGate, GateError};
