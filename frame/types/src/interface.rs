//! The call contract shared with the trusted side.
//!
//! Both index tables are positional: the host enters the enclave by ecall index and
//! the enclave reaches back through the ocall table by position. The positions are
//! the ones the edger8r-generated bridge of the trusted side was built with, and
//! the assertions below pin them so a reordering fails the build.

use crate::types::{Ec256PublicKey, Ec256Signature};
use core::ffi::c_void;
use sgx_types::sgx_status_t;
use std::os::raw::c_char;

#[repr(u32)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EcallIndex {
    GetPublicKey = 0,
    SignData = 1,
    WebauthnGetSignature = 2,
}

impl EcallIndex {
    pub const ALL: [EcallIndex; ECALL_COUNT] = [
        EcallIndex::GetPublicKey,
        EcallIndex::SignData,
        EcallIndex::WebauthnGetSignature,
    ];

    pub fn name(self) -> &'static str {
        match self {
            EcallIndex::GetPublicKey => "get_public_key",
            EcallIndex::SignData => "sign_data",
            EcallIndex::WebauthnGetSignature => "webauthn_get_signature",
        }
    }
}

pub const ECALL_COUNT: usize = 3;

#[repr(usize)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OcallIndex {
    PrintString = 0,
    SaveEnclaveData = 1,
    LoadEnclaveData = 2,
    GetUserInput = 3,
}

impl OcallIndex {
    pub const ALL: [OcallIndex; OCALL_COUNT] = [
        OcallIndex::PrintString,
        OcallIndex::SaveEnclaveData,
        OcallIndex::LoadEnclaveData,
        OcallIndex::GetUserInput,
    ];

    pub fn name(self) -> &'static str {
        match self {
            OcallIndex::PrintString => "untrusted_print_string",
            OcallIndex::GetUserInput => "untrusted_get_user_input",
            OcallIndex::SaveEnclaveData => "untrusted_save_enclave_data",
            OcallIndex::LoadEnclaveData => "untrusted_load_enclave_data",
        }
    }
}

pub const OCALL_COUNT: usize = 4;

// A table whose discriminants drift from their positions, or from the positions
// the trusted side was generated with, fails the build.
const _: () = {
    assert!(EcallIndex::GetPublicKey as u32 == 0);
    assert!(EcallIndex::SignData as u32 == 1);
    assert!(EcallIndex::WebauthnGetSignature as u32 == 2);
    assert!(OcallIndex::PrintString as usize == 0);
    assert!(OcallIndex::SaveEnclaveData as usize == 1);
    assert!(OcallIndex::LoadEnclaveData as usize == 2);
    assert!(OcallIndex::GetUserInput as usize == 3);

    let mut i = 0;
    while i < ECALL_COUNT {
        assert!(EcallIndex::ALL[i] as usize == i);
        i += 1;
    }
    let mut j = 0;
    while j < OCALL_COUNT {
        assert!(OcallIndex::ALL[j] as usize == j);
        j += 1;
    }
};

/// Untrusted bridge entered by the trusted runtime with a pointer to the ocall's parameter block.
pub type OcallBridge = unsafe extern "C" fn(pms: *mut c_void) -> sgx_status_t;

/// Layout of the table handed to every ecall, matching the edger8r `ocall_table_*` struct.
#[repr(C)]
pub struct OcallTable {
    pub nr_ocall: usize,
    pub table: [OcallBridge; OCALL_COUNT],
}

impl OcallTable {
    pub fn bridge(&self, index: usize) -> Option<OcallBridge> {
        if index >= self.nr_ocall {
            return None;
        }
        self.table.get(index).copied()
    }

    pub fn as_ptr(&self) -> *const c_void {
        self as *const OcallTable as *const c_void
    }
}

/*
 * Parameter blocks. The caller owns every buffer referenced by a pointer field
 * and keeps it alive until the call returns.
 */

#[repr(C)]
pub struct GetPublicKeyParams {
    pub retval: sgx_status_t,
    pub ret_pk: *mut Ec256PublicKey,
}

#[repr(C)]
pub struct SignDataParams {
    pub retval: sgx_status_t,
    pub data: *const u8,
    pub data_size: u32,
    pub ret_signature: *mut Ec256Signature,
}

#[repr(C)]
pub struct WebauthnGetSignatureParams {
    pub retval: sgx_status_t,
    pub data: *const u8,
    pub data_size: u32,
    pub client_data: *const u8,
    pub client_data_size: u32,
    pub ret_signature: *mut Ec256Signature,
}

#[repr(C)]
pub struct PrintStringParams {
    pub str: *const c_char,
}

#[repr(C)]
pub struct GetUserInputParams {
    pub ret_str: *mut c_char,
    pub n: usize,
}

#[repr(C)]
pub struct SaveEnclaveDataParams {
    pub retval: i32,
    pub sealed_data: *const u8,
    pub sealed_size: usize,
}

#[repr(C)]
pub struct LoadEnclaveDataParams {
    pub retval: i32,
    pub sealed_data: *mut u8,
    pub sealed_size: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ecall_positions() {
        let names: Vec<&str> = EcallIndex::ALL.iter().map(|e| e.name()).collect();
        assert_eq!(
            names,
            ["get_public_key", "sign_data", "webauthn_get_signature"]
        );
    }

    #[test]
    fn test_ocall_positions() {
        // print, save and load keep the positions of the generated trusted bridge;
        // the read-line capability is appended after them
        let names: Vec<&str> = OcallIndex::ALL.iter().map(|o| o.name()).collect();
        assert_eq!(
            names,
            [
                "untrusted_print_string",
                "untrusted_save_enclave_data",
                "untrusted_load_enclave_data",
                "untrusted_get_user_input",
            ]
        );
    }

    #[test]
    fn test_table_rejects_index_past_nr_ocall() {
        unsafe extern "C" fn noop(_pms: *mut c_void) -> sgx_status_t {
            sgx_status_t::SGX_SUCCESS
        }
        let table = OcallTable {
            nr_ocall: 2,
            table: [noop as OcallBridge; OCALL_COUNT],
        };

        assert!(table.bridge(1).is_some());
        assert!(table.bridge(2).is_none());
        assert!(table.bridge(OCALL_COUNT).is_none());
    }
}
