//! Key agreement inputs
//!
//! The Diffie-Hellman exchange and AEAD encryption live outside this crate.
//! The engine only consumes the resulting shared secret, from which the
//! settled session topic is derived.

mod agreement;

pub use agreement::*;
