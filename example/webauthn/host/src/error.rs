use crate::hex_codec::HexError;
use frame_host::errlist::describe;
use std::io;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, AppError>;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Failed to initialize enclave: {0}")]
    EnclaveInit(#[source] frame_host::Error),
    #[error("Failed to get the public key: {0}")]
    PublicKey(#[source] frame_host::Error),
    #[error("Invalid data to sign: {0}")]
    InvalidHex(#[from] HexError),
    #[error("Failed to sign: {0}")]
    Signature(#[source] frame_host::Error),
    #[error("Console error: {0}")]
    Io(#[from] io::Error),
}

impl AppError {
    /// What is shown to the user on stdout before exiting. A failed enclave
    /// creation is preceded by the platform's description of the status.
    pub fn diagnostic(&self) -> String {
        match self {
            AppError::EnclaveInit(e) => match e.sgx_status() {
                Some(status) => format!("{}\nFailed to initialize enclave!", describe(status)),
                None => "Failed to initialize enclave!".to_string(),
            },
            AppError::PublicKey(e) => format!("App Error: {}!", status_code(e)),
            AppError::InvalidHex(_) => "Error receiving data to sign!".to_string(),
            AppError::Signature(e) => format!("Signature Error: {}!", status_code(e)),
            AppError::Io(e) => format!("Console Error: {}!", e),
        }
    }
}

fn status_code(e: &frame_host::Error) -> u32 {
    e.sgx_status()
        .map(|status| status as u32)
        .unwrap_or(sgx_types::sgx_status_t::SGX_ERROR_UNEXPECTED as u32)
}
