mod bridges;
pub mod console;
pub mod ecalls;
pub mod errlist;
mod error;
pub mod init_enclave;
pub mod launch_token;
pub mod ocalls;
pub mod platform;
pub mod sealed_store;
pub mod services;
#[cfg(feature = "simulation")]
pub mod simulation;

pub use error::{FrameHostError as Error, Result, SealedStoreError};
pub use ecalls::EnclaveConnector;
pub use init_enclave::EnclaveManager;
pub use launch_token::LaunchTokenStore;
pub use ocalls::UntrustedServices;
#[cfg(feature = "sgx")]
pub use platform::SgxPlatform;
pub use platform::EnclavePlatform;
pub use sealed_store::SealedStore;
pub use services::{ConsoleInput, HostServices};
#[cfg(feature = "simulation")]
pub use simulation::SimulatedPlatform;
