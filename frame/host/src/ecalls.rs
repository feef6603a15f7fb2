use crate::{
    bridges::ecalls::{self, EcallStatus},
    error::{FrameHostError, Result},
    init_enclave::EnclaveManager,
    ocalls::{in_enclave_call, install, UntrustedServices},
    platform::EnclavePlatform,
};
use frame_types::{Ec256PublicKey, Ec256Signature, EcallIndex};
use sgx_types::sgx_status_t;
use tracing::debug;

/// Typed entry points into a loaded enclave.
///
/// Every call makes `services` available to the ocalls the enclave issues while
/// it runs.
pub struct EnclaveConnector<'a, P: EnclavePlatform> {
    manager: &'a EnclaveManager<P>,
    services: &'a dyn UntrustedServices,
}

impl<'a, P: EnclavePlatform> EnclaveConnector<'a, P> {
    pub fn new(manager: &'a EnclaveManager<P>, services: &'a dyn UntrustedServices) -> Self {
        EnclaveConnector { manager, services }
    }

    /// The enclave's signing public key. The first call on a fresh sealed state
    /// makes the enclave generate and persist a key.
    pub fn get_public_key(&self) -> Result<Ec256PublicKey> {
        let mut pk = Ec256PublicKey::default();
        self.invoke(EcallIndex::GetPublicKey, |manager| {
            ecalls::get_public_key(manager, &mut pk)
        })?;

        Ok(pk)
    }

    /// ECDSA P-256 signature over SHA-256 of `data`.
    pub fn sign_data(&self, data: &[u8]) -> Result<Ec256Signature> {
        let mut signature = Ec256Signature::default();
        self.invoke(EcallIndex::SignData, |manager| {
            ecalls::sign_data(manager, data, &mut signature)
        })?;

        Ok(signature)
    }

    /// Signature over `data` followed by SHA-256 of `client_data`, the layout a
    /// WebAuthn assertion signs.
    pub fn webauthn_get_signature(&self, data: &[u8], client_data: &[u8]) -> Result<Ec256Signature> {
        let mut signature = Ec256Signature::default();
        self.invoke(EcallIndex::WebauthnGetSignature, |manager| {
            ecalls::webauthn_get_signature(manager, data, client_data, &mut signature)
        })?;

        Ok(signature)
    }

    fn invoke<F>(&self, index: EcallIndex, call: F) -> Result<()>
    where
        F: FnOnce(&EnclaveManager<P>) -> Result<EcallStatus>,
    {
        let function = index.name();
        if in_enclave_call() {
            return Err(FrameHostError::NestedEcall { function });
        }

        let (status, retval) = {
            let _services = install(self.services);
            call(self.manager)?
        };
        debug!("{} returned {:?} / {:?}", function, status, retval);

        if status != sgx_status_t::SGX_SUCCESS {
            return Err(FrameHostError::SgxStatus { status, function });
        }
        if retval != sgx_status_t::SGX_SUCCESS {
            return Err(FrameHostError::EnclaveError {
                status: retval,
                function,
            });
        }

        Ok(())
    }
}
