//! Human-readable diagnostics for platform statuses.

use sgx_types::sgx_status_t;
use std::fmt;

#[derive(Debug)]
pub struct ErrorEntry {
    pub status: sgx_status_t,
    pub message: &'static str,
    pub suggestion: Option<&'static str>,
}

/// Error codes returned by enclave creation.
pub static SGX_ERRLIST: [ErrorEntry; 15] = [
    ErrorEntry {
        status: sgx_status_t::SGX_ERROR_UNEXPECTED,
        message: "Unexpected error occurred.",
        suggestion: None,
    },
    ErrorEntry {
        status: sgx_status_t::SGX_ERROR_INVALID_PARAMETER,
        message: "Invalid parameter.",
        suggestion: None,
    },
    ErrorEntry {
        status: sgx_status_t::SGX_ERROR_OUT_OF_MEMORY,
        message: "Out of memory.",
        suggestion: None,
    },
    ErrorEntry {
        status: sgx_status_t::SGX_ERROR_ENCLAVE_LOST,
        message: "Power transition occurred.",
        suggestion: Some("Please refer to the sample \"PowerTransition\" for details."),
    },
    ErrorEntry {
        status: sgx_status_t::SGX_ERROR_INVALID_ENCLAVE,
        message: "Invalid enclave image.",
        suggestion: None,
    },
    ErrorEntry {
        status: sgx_status_t::SGX_ERROR_INVALID_ENCLAVE_ID,
        message: "Invalid enclave identification.",
        suggestion: None,
    },
    ErrorEntry {
        status: sgx_status_t::SGX_ERROR_INVALID_SIGNATURE,
        message: "Invalid enclave signature.",
        suggestion: None,
    },
    ErrorEntry {
        status: sgx_status_t::SGX_ERROR_OUT_OF_EPC,
        message: "Out of EPC memory.",
        suggestion: None,
    },
    ErrorEntry {
        status: sgx_status_t::SGX_ERROR_NO_DEVICE,
        message: "Invalid SGX device.",
        suggestion: Some(
            "Please make sure SGX module is enabled in the BIOS, and install SGX driver afterwards.",
        ),
    },
    ErrorEntry {
        status: sgx_status_t::SGX_ERROR_MEMORY_MAP_CONFLICT,
        message: "Memory map conflicted.",
        suggestion: None,
    },
    ErrorEntry {
        status: sgx_status_t::SGX_ERROR_INVALID_METADATA,
        message: "Invalid enclave metadata.",
        suggestion: None,
    },
    ErrorEntry {
        status: sgx_status_t::SGX_ERROR_DEVICE_BUSY,
        message: "SGX device was busy.",
        suggestion: None,
    },
    ErrorEntry {
        status: sgx_status_t::SGX_ERROR_INVALID_VERSION,
        message: "Enclave version was invalid.",
        suggestion: None,
    },
    ErrorEntry {
        status: sgx_status_t::SGX_ERROR_INVALID_ATTRIBUTE,
        message: "Enclave was not authorized.",
        suggestion: None,
    },
    ErrorEntry {
        status: sgx_status_t::SGX_ERROR_ENCLAVE_FILE_ACCESS,
        message: "Can't open enclave file.",
        suggestion: None,
    },
];

#[derive(Debug, Clone, Copy)]
pub enum Diagnostic {
    Known(&'static ErrorEntry),
    Unknown(u32),
}

pub fn describe(status: sgx_status_t) -> Diagnostic {
    SGX_ERRLIST
        .iter()
        .find(|entry| entry.status == status)
        .map(Diagnostic::Known)
        .unwrap_or(Diagnostic::Unknown(status as u32))
}

impl Diagnostic {
    pub fn message(&self) -> Option<&'static str> {
        match self {
            Diagnostic::Known(entry) => Some(entry.message),
            Diagnostic::Unknown(_) => None,
        }
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Diagnostic::Known(entry) => {
                if let Some(suggestion) = entry.suggestion {
                    writeln!(f, "Info: {}", suggestion)?;
                }
                write!(f, "Error: {}", entry.message)
            }
            Diagnostic::Unknown(code) => write!(
                f,
                "Error code is 0x{:X}. Please refer to the \"Intel SGX SDK Developer Reference\" for more details.",
                code
            ),
        }
    }
}
