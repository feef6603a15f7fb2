use lazy_static::lazy_static;
use std::{env, path::PathBuf};

/// Launch token file name, looked up under the user's home directory.
pub const TOKEN_FILENAME: &str = "enclave.token";
/// Upper bound for a composed token path, `FILENAME_MAX` on Linux.
pub const MAX_PATH: usize = 4096;
pub const DEFAULT_ENCLAVE_FILENAME: &str = "enclave.signed.so";
pub const DEFAULT_SEALED_STATE_FILE: &str = "enclave_data.seal";

/// Console buffers, including the terminating NUL.
pub const CLIENT_DATA_MAX_SIZE: usize = 1024;
pub const SIGN_INPUT_MAX_SIZE: usize = 256;

lazy_static! {
    pub static ref ENCLAVE_IMAGE_PATH: PathBuf = env::var("ENCLAVE_IMAGE_PATH")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from(DEFAULT_ENCLAVE_FILENAME));
    pub static ref ENCLAVE_DEBUG: bool = {
        env::var("ENCLAVE_DEBUG")
            .map(|v| parse_flag(&v).expect("Failed to parse ENCLAVE_DEBUG"))
            .unwrap_or(cfg!(debug_assertions))
    };
    pub static ref SEALED_STATE_PATH: PathBuf = env::var("SEALED_STATE_PATH")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from(DEFAULT_SEALED_STATE_FILE));
}

pub fn parse_flag(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
