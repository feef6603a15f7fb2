use frame_types::UntrustedStatus;
use sgx_types::sgx_status_t;
use std::{io, path::PathBuf};
use thiserror::Error;

pub type Result<T> = std::result::Result<T, FrameHostError>;

#[derive(Error, Debug)]
pub enum FrameHostError {
    #[error("SGX ecall failed function: {function:?}, status: {status:?}")]
    SgxStatus {
        status: sgx_status_t,
        function: &'static str,
    },
    #[error("Enclave ecall failed function: {function:?}, status: {status:?}")]
    EnclaveError {
        status: sgx_status_t,
        function: &'static str,
    },
    #[error("{function:?} requires a {expected} enclave, but it is {actual}")]
    InvalidState {
        function: &'static str,
        expected: &'static str,
        actual: &'static str,
    },
    #[error("{function:?} was called from inside an ocall")]
    NestedEcall { function: &'static str },
    #[error("{len} bytes do not fit the {function:?} parameter block")]
    InputTooLarge { function: &'static str, len: usize },
    #[error("IO error: {0}")]
    IoError(#[from] io::Error),
}

impl FrameHostError {
    /// The status reported across the boundary, if this error carries one.
    pub fn sgx_status(&self) -> Option<sgx_status_t> {
        match self {
            FrameHostError::SgxStatus { status, .. } | FrameHostError::EnclaveError { status, .. } => {
                Some(*status)
            }
            _ => None,
        }
    }
}

#[derive(Error, Debug)]
pub enum SealedStoreError {
    #[error("Cannot open sealed state file {path:?}: {source}")]
    Open { path: PathBuf, source: io::Error },
    #[error("Sealed state file {path:?} holds {actual} bytes, expected {expected}")]
    ShortRead {
        path: PathBuf,
        expected: usize,
        actual: usize,
    },
    #[error("IO error: {0}")]
    IoError(#[from] io::Error),
}

impl SealedStoreError {
    /// Code handed back to the trusted side.
    pub fn status(&self) -> UntrustedStatus {
        match self {
            SealedStoreError::Open { .. } => UntrustedStatus::OPEN_FAILED,
            _ => UntrustedStatus::IO_FAILED,
        }
    }
}
