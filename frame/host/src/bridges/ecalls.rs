use crate::{
    error::{FrameHostError, Result},
    init_enclave::EnclaveManager,
    platform::EnclavePlatform,
};
use frame_types::*;
use sgx_types::sgx_status_t;
use std::{convert::TryFrom, ffi::c_void};

/// Outcome of one trip across the boundary: the platform status, then the
/// enclave's own return value, which is only meaningful when the first is success.
pub(crate) type EcallStatus = (sgx_status_t, sgx_status_t);

fn block_len(function: &'static str, len: usize) -> Result<u32> {
    u32::try_from(len).map_err(|_| FrameHostError::InputTooLarge { function, len })
}

pub(crate) fn get_public_key<P: EnclavePlatform>(
    manager: &EnclaveManager<P>,
    ret_pk: &mut Ec256PublicKey,
) -> Result<EcallStatus> {
    let mut ms = GetPublicKeyParams {
        retval: sgx_status_t::SGX_ERROR_UNEXPECTED,
        ret_pk,
    };
    let status = unsafe {
        manager.enter(
            EcallIndex::GetPublicKey,
            &mut ms as *mut GetPublicKeyParams as *mut c_void,
        )?
    };

    Ok(returned(status, ms.retval))
}

pub(crate) fn sign_data<P: EnclavePlatform>(
    manager: &EnclaveManager<P>,
    data: &[u8],
    ret_signature: &mut Ec256Signature,
) -> Result<EcallStatus> {
    let mut ms = SignDataParams {
        retval: sgx_status_t::SGX_ERROR_UNEXPECTED,
        data: data.as_ptr(),
        data_size: block_len(EcallIndex::SignData.name(), data.len())?,
        ret_signature,
    };
    let status = unsafe {
        manager.enter(
            EcallIndex::SignData,
            &mut ms as *mut SignDataParams as *mut c_void,
        )?
    };

    Ok(returned(status, ms.retval))
}

pub(crate) fn webauthn_get_signature<P: EnclavePlatform>(
    manager: &EnclaveManager<P>,
    data: &[u8],
    client_data: &[u8],
    ret_signature: &mut Ec256Signature,
) -> Result<EcallStatus> {
    let function = EcallIndex::WebauthnGetSignature.name();
    let mut ms = WebauthnGetSignatureParams {
        retval: sgx_status_t::SGX_ERROR_UNEXPECTED,
        data: data.as_ptr(),
        data_size: block_len(function, data.len())?,
        client_data: client_data.as_ptr(),
        client_data_size: block_len(function, client_data.len())?,
        ret_signature,
    };
    let status = unsafe {
        manager.enter(
            EcallIndex::WebauthnGetSignature,
            &mut ms as *mut WebauthnGetSignatureParams as *mut c_void,
        )?
    };

    Ok(returned(status, ms.retval))
}

// The parameter block's retval is only copied out when the transition succeeded.
fn returned(status: sgx_status_t, retval: sgx_status_t) -> EcallStatus {
    if status == sgx_status_t::SGX_SUCCESS {
        (status, retval)
    } else {
        (status, sgx_status_t::SGX_ERROR_UNEXPECTED)
    }
}
