use crate::ocalls::{
    untrusted_get_user_input, untrusted_load_enclave_data, untrusted_print_string,
    untrusted_save_enclave_data,
};
use frame_types::*;
use sgx_types::sgx_status_t;
use std::ffi::c_void;

unsafe extern "C" fn bridge_print_string(pms: *mut c_void) -> sgx_status_t {
    let ms = match (pms as *mut PrintStringParams).as_mut() {
        Some(ms) => ms,
        None => return sgx_status_t::SGX_ERROR_INVALID_PARAMETER,
    };
    untrusted_print_string(ms.str);
    sgx_status_t::SGX_SUCCESS
}

unsafe extern "C" fn bridge_get_user_input(pms: *mut c_void) -> sgx_status_t {
    let ms = match (pms as *mut GetUserInputParams).as_mut() {
        Some(ms) => ms,
        None => return sgx_status_t::SGX_ERROR_INVALID_PARAMETER,
    };
    untrusted_get_user_input(ms.ret_str, ms.n);
    sgx_status_t::SGX_SUCCESS
}

unsafe extern "C" fn bridge_save_enclave_data(pms: *mut c_void) -> sgx_status_t {
    let ms = match (pms as *mut SaveEnclaveDataParams).as_mut() {
        Some(ms) => ms,
        None => return sgx_status_t::SGX_ERROR_INVALID_PARAMETER,
    };
    ms.retval = untrusted_save_enclave_data(ms.sealed_data, ms.sealed_size);
    sgx_status_t::SGX_SUCCESS
}

unsafe extern "C" fn bridge_load_enclave_data(pms: *mut c_void) -> sgx_status_t {
    let ms = match (pms as *mut LoadEnclaveDataParams).as_mut() {
        Some(ms) => ms,
        None => return sgx_status_t::SGX_ERROR_INVALID_PARAMETER,
    };
    ms.retval = untrusted_load_enclave_data(ms.sealed_data, ms.sealed_size);
    sgx_status_t::SGX_SUCCESS
}

const fn bridge_for(index: OcallIndex) -> OcallBridge {
    match index {
        OcallIndex::PrintString => bridge_print_string,
        OcallIndex::SaveEnclaveData => bridge_save_enclave_data,
        OcallIndex::LoadEnclaveData => bridge_load_enclave_data,
        OcallIndex::GetUserInput => bridge_get_user_input,
    }
}

/// Handed to every ecall. Position `i` serves `OcallIndex::ALL[i]`.
pub(crate) static OCALL_TABLE: OcallTable = OcallTable {
    nr_ocall: OCALL_COUNT,
    table: [
        bridge_for(OcallIndex::ALL[0]),
        bridge_for(OcallIndex::ALL[1]),
        bridge_for(OcallIndex::ALL[2]),
        bridge_for(OcallIndex::ALL[3]),
    ],
};

/// Dispatches ocall `index` through `table` the way the trusted runtime does.
///
/// # Safety
/// `pms` must point at the parameter block for `index`.
#[cfg(any(test, feature = "simulation"))]
pub(crate) unsafe fn dispatch(table: &OcallTable, index: usize, pms: *mut c_void) -> sgx_status_t {
    match table.bridge(index) {
        Some(bridge) => bridge(pms),
        None => sgx_status_t::SGX_ERROR_INVALID_FUNCTION,
    }
}
