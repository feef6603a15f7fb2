//! In-process stand-in for the SGX runtime.
//!
//! `SimulatedPlatform` honors the same contract as the hardware platform: it
//! provisions launch tokens, hands out enclave ids, and services ecalls by
//! reading the parameter blocks and calling back through the ocall table it is
//! given. The enclave side keeps a P-256 signing key that it seals to the host
//! through the save/load ocalls.
//!
//! Nothing here is protected: the sealed blob holds the raw key scalar in the
//! clear next to a check value. It is the default so the workspace builds and
//! tests without the SDK; deployments build with `--no-default-features
//! --features sgx`.

use crate::{bridges::ocalls::dispatch, platform::EnclavePlatform};
use frame_types::*;
use p256::ecdsa::{signature::Signer, Signature, SigningKey};
use parking_lot::Mutex;
use rand::rngs::OsRng;
use sgx_types::*;
use sha2::{Digest, Sha256};
use std::{
    ffi::{c_void, CString},
    path::Path,
    slice,
    sync::atomic::{AtomicU64, AtomicUsize, Ordering},
};
use tracing::debug;

const KEY_SIZE: usize = SGX_ECP256_KEY_SIZE;
/// Secret scalar followed by its seal check.
pub const SIM_SEALED_SIZE: usize = KEY_SIZE * 2;

#[derive(Debug)]
pub struct SimulatedPlatform {
    next_eid: AtomicU64,
    live: AtomicUsize,
    create_failure: Option<sgx_status_t>,
    ecall_failure: Option<(EcallIndex, sgx_status_t)>,
}

impl SimulatedPlatform {
    pub fn new() -> Self {
        SimulatedPlatform {
            next_eid: AtomicU64::new(1),
            live: AtomicUsize::new(0),
            create_failure: None,
            ecall_failure: None,
        }
    }

    /// A platform whose every `create_enclave` fails with `status`.
    pub fn failing_with(status: sgx_status_t) -> Self {
        SimulatedPlatform {
            create_failure: Some(status),
            ..Self::new()
        }
    }

    /// A platform that fails to enter the enclave for `index` with `status`.
    /// The parameter block is left holding a success `retval`, which callers
    /// must not trust.
    pub fn failing_ecall_with(index: EcallIndex, status: sgx_status_t) -> Self {
        SimulatedPlatform {
            ecall_failure: Some((index, status)),
            ..Self::new()
        }
    }

    /// Enclaves created and not yet destroyed.
    pub fn live_enclaves(&self) -> usize {
        self.live.load(Ordering::SeqCst)
    }
}

impl Default for SimulatedPlatform {
    fn default() -> Self {
        Self::new()
    }
}

pub struct SimulatedEnclave {
    eid: sgx_enclave_id_t,
    measurement: [u8; 32],
    signing_key: Mutex<Option<SigningKey>>,
}

impl EnclavePlatform for SimulatedPlatform {
    type Enclave = SimulatedEnclave;

    fn create_enclave(
        &self,
        image: &Path,
        _debug: bool,
        token: &mut sgx_launch_token_t,
    ) -> SgxResult<(SimulatedEnclave, bool)> {
        if let Some(status) = self.create_failure {
            return Err(status);
        }

        let measurement: [u8; 32] = Sha256::digest(image.to_string_lossy().as_bytes()).into();
        let expected = provisioned_token(&measurement);
        let updated = token[..] != expected[..];
        if updated {
            debug!("Provisioning a launch token for {:?}", image);
            *token = expected;
        }

        let eid = self.next_eid.fetch_add(1, Ordering::SeqCst);
        self.live.fetch_add(1, Ordering::SeqCst);

        Ok((
            SimulatedEnclave {
                eid,
                measurement,
                signing_key: Mutex::new(None),
            },
            updated,
        ))
    }

    fn enclave_id(&self, enclave: &SimulatedEnclave) -> sgx_enclave_id_t {
        enclave.eid
    }

    fn destroy_enclave(&self, enclave: SimulatedEnclave) {
        self.live.fetch_sub(1, Ordering::SeqCst);
        debug!("Simulated enclave {} torn down", enclave.eid);
    }

    unsafe fn ecall(
        &self,
        enclave: &SimulatedEnclave,
        index: EcallIndex,
        ocall_table: &OcallTable,
        ms: *mut c_void,
    ) -> sgx_status_t {
        if ms.is_null() {
            return sgx_status_t::SGX_ERROR_INVALID_PARAMETER;
        }
        if let Some((failing, status)) = self.ecall_failure {
            if failing == index {
                // every ecall block starts with its retval
                *(ms as *mut sgx_status_t) = sgx_status_t::SGX_SUCCESS;
                return status;
            }
        }

        match index {
            EcallIndex::GetPublicKey => {
                let ms = &mut *(ms as *mut GetPublicKeyParams);
                ms.retval = into_status(enclave.get_public_key(ocall_table, ms.ret_pk));
            }
            EcallIndex::SignData => {
                let ms = &mut *(ms as *mut SignDataParams);
                ms.retval = into_status(enclave.sign(
                    ocall_table,
                    raw_input(ms.data, ms.data_size, false),
                    None,
                    ms.ret_signature,
                ));
            }
            EcallIndex::WebauthnGetSignature => {
                let ms = &mut *(ms as *mut WebauthnGetSignatureParams);
                ms.retval = into_status(enclave.sign(
                    ocall_table,
                    raw_input(ms.data, ms.data_size, false),
                    Some(raw_input(ms.client_data, ms.client_data_size, true)),
                    ms.ret_signature,
                ));
            }
        }

        sgx_status_t::SGX_SUCCESS
    }
}

fn provisioned_token(measurement: &[u8; 32]) -> sgx_launch_token_t {
    let mut token = [0u8; LAUNCH_TOKEN_SIZE];
    for chunk in token.chunks_mut(measurement.len()) {
        chunk.copy_from_slice(&measurement[..chunk.len()]);
    }
    token
}

fn into_status(res: SgxResult<()>) -> sgx_status_t {
    match res {
        Ok(()) => sgx_status_t::SGX_SUCCESS,
        Err(status) => status,
    }
}

// Empty input is only acceptable where `allow_empty` says so.
unsafe fn raw_input<'a>(ptr: *const u8, len: u32, allow_empty: bool) -> Option<&'a [u8]> {
    match (ptr.is_null(), len) {
        (_, 0) if allow_empty => Some(&[][..]),
        (true, _) | (_, 0) => None,
        (false, len) => Some(slice::from_raw_parts(ptr, len as usize)),
    }
}

impl SimulatedEnclave {
    fn get_public_key(&self, table: &OcallTable, ret_pk: *mut Ec256PublicKey) -> SgxResult<()> {
        if ret_pk.is_null() {
            return Err(sgx_status_t::SGX_ERROR_INVALID_PARAMETER);
        }
        let key = self.signing_key(table)?;

        let point = key.verifying_key().to_encoded_point(false);
        let (x, y) = match (point.x(), point.y()) {
            (Some(x), Some(y)) => (x, y),
            _ => return Err(sgx_status_t::SGX_ERROR_UNEXPECTED),
        };
        let mut gx = [0u8; KEY_SIZE];
        let mut gy = [0u8; KEY_SIZE];
        gx.copy_from_slice(x);
        gy.copy_from_slice(y);

        unsafe { *ret_pk = Ec256PublicKey::from_be_coordinates(&gx, &gy) };
        Ok(())
    }

    fn sign(
        &self,
        table: &OcallTable,
        data: Option<&[u8]>,
        client_data: Option<Option<&[u8]>>,
        ret_signature: *mut Ec256Signature,
    ) -> SgxResult<()> {
        let data = data.ok_or(sgx_status_t::SGX_ERROR_INVALID_PARAMETER)?;
        if ret_signature.is_null() {
            return Err(sgx_status_t::SGX_ERROR_INVALID_PARAMETER);
        }

        let mut message = data.to_vec();
        if let Some(client_data) = client_data {
            let client_data = client_data.ok_or(sgx_status_t::SGX_ERROR_INVALID_PARAMETER)?;
            message.extend_from_slice(&Sha256::digest(client_data));
        }

        let key = self.signing_key(table)?;
        let signature: Signature = key
            .try_sign(&message)
            .map_err(|_| sgx_status_t::SGX_ERROR_UNEXPECTED)?;
        let (r, s) = signature.split_bytes();
        let mut r_be = [0u8; KEY_SIZE];
        let mut s_be = [0u8; KEY_SIZE];
        r_be.copy_from_slice(&r);
        s_be.copy_from_slice(&s);

        unsafe { *ret_signature = Ec256Signature::from_be_scalars(&r_be, &s_be) };
        Ok(())
    }

    /// The in-memory key, restored from sealed state or freshly generated.
    fn signing_key(&self, table: &OcallTable) -> SgxResult<SigningKey> {
        let mut slot = self.signing_key.lock();
        if let Some(key) = slot.as_ref() {
            return Ok(key.clone());
        }

        let mut sealed = [0u8; SIM_SEALED_SIZE];
        let mut load = LoadEnclaveDataParams {
            retval: -1,
            sealed_data: sealed.as_mut_ptr(),
            sealed_size: sealed.len(),
        };
        ocall(table, OcallIndex::LoadEnclaveData, &mut load)?;

        let key = match UntrustedStatus(load.retval) {
            UntrustedStatus::SUCCESS => self.unseal(&sealed)?,
            UntrustedStatus::OPEN_FAILED => {
                let key = SigningKey::random(&mut OsRng);
                let sealed = self.seal(&key);
                let mut save = SaveEnclaveDataParams {
                    retval: -1,
                    sealed_data: sealed.as_ptr(),
                    sealed_size: sealed.len(),
                };
                ocall(table, OcallIndex::SaveEnclaveData, &mut save)?;
                if UntrustedStatus(save.retval).is_err() {
                    return Err(sgx_status_t::SGX_ERROR_UNEXPECTED);
                }
                print(table, "Generated and sealed a new signing key.\n")?;
                key
            }
            _ => return Err(sgx_status_t::SGX_ERROR_UNEXPECTED),
        };

        *slot = Some(key.clone());
        Ok(key)
    }

    fn seal(&self, key: &SigningKey) -> [u8; SIM_SEALED_SIZE] {
        let scalar = key.to_bytes();
        let mut sealed = [0u8; SIM_SEALED_SIZE];
        sealed[..KEY_SIZE].copy_from_slice(&scalar);
        sealed[KEY_SIZE..].copy_from_slice(&self.seal_check(&scalar));
        sealed
    }

    fn unseal(&self, sealed: &[u8; SIM_SEALED_SIZE]) -> SgxResult<SigningKey> {
        let (scalar, check) = sealed.split_at(KEY_SIZE);
        if self.seal_check(scalar)[..] != check[..] {
            return Err(sgx_status_t::SGX_ERROR_MAC_MISMATCH);
        }
        SigningKey::from_slice(scalar).map_err(|_| sgx_status_t::SGX_ERROR_MAC_MISMATCH)
    }

    // Bound to the image, so another enclave cannot unseal it.
    fn seal_check(&self, scalar: &[u8]) -> [u8; 32] {
        let mut hasher = Sha256::new();
        hasher.update(self.measurement);
        hasher.update(scalar);
        hasher.finalize().into()
    }
}

fn ocall<T>(table: &OcallTable, index: OcallIndex, ms: &mut T) -> SgxResult<()> {
    let status = unsafe { dispatch(table, index as usize, ms as *mut T as *mut c_void) };
    if status != sgx_status_t::SGX_SUCCESS {
        return Err(status);
    }
    Ok(())
}

fn print(table: &OcallTable, msg: &str) -> SgxResult<()> {
    let msg = CString::new(msg).map_err(|_| sgx_status_t::SGX_ERROR_INVALID_PARAMETER)?;
    let mut ms = PrintStringParams { str: msg.as_ptr() };
    ocall(table, OcallIndex::PrintString, &mut ms)
}
