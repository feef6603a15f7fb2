//! Host application for the WebAuthn signing enclave.
//!
//! The default `simulation` feature runs against an in-process stand-in that
//! keeps the signing key unprotected on disk. Build with `--no-default-features
//! --features sgx` to run against a real enclave.

pub mod app;
mod error;
pub mod hex_codec;

pub use error::{AppError, Result};
