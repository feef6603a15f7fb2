use crate::{
    bridges::OCALL_TABLE,
    errlist::describe,
    error::{FrameHostError, Result},
    launch_token::LaunchTokenStore,
    platform::EnclavePlatform,
};
use frame_types::EcallIndex;
use parking_lot::{Mutex, RwLock};
use sgx_types::*;
use std::{ffi::c_void, mem, path::Path};
use tracing::{debug, error, info};

enum LifecycleState<E> {
    Unloaded,
    Loaded(E),
    Destroyed,
}

impl<E> LifecycleState<E> {
    fn name(&self) -> &'static str {
        match self {
            LifecycleState::Unloaded => "unloaded",
            LifecycleState::Loaded(_) => "loaded",
            LifecycleState::Destroyed => "destroyed",
        }
    }
}

/// Owns at most one enclave over its lifetime: unloaded, then loaded, then destroyed.
///
/// Ecalls share the state lock for reading, so they may run concurrently with
/// each other but never with creation or destruction. Entering the enclave is
/// further serialized by `entry`.
pub struct EnclaveManager<P: EnclavePlatform> {
    platform: P,
    state: RwLock<LifecycleState<P::Enclave>>,
    entry: Mutex<()>,
}

impl<P: EnclavePlatform> EnclaveManager<P> {
    pub fn new(platform: P) -> Self {
        EnclaveManager {
            platform,
            state: RwLock::new(LifecycleState::Unloaded),
            entry: Mutex::new(()),
        }
    }

    pub fn platform(&self) -> &P {
        &self.platform
    }

    /// Loads the enclave with the persisted launch token, writing the token back
    /// if the platform refreshed it.
    pub fn init_enclave<T: AsRef<Path>>(
        &self,
        image: T,
        is_debug: bool,
        tokens: &LaunchTokenStore,
    ) -> Result<sgx_enclave_id_t> {
        let mut launch_token = tokens.load();
        let (eid, launch_token_updated) = self.create(image, is_debug, &mut launch_token)?;

        // If launch token is updated, save it as token file.
        tokens.save(&launch_token, launch_token_updated);

        Ok(eid)
    }

    /// Creates the enclave with a caller-supplied token buffer.
    /// Returns the enclave id and whether the platform updated the token.
    pub fn create<T: AsRef<Path>>(
        &self,
        image: T,
        is_debug: bool,
        launch_token: &mut sgx_launch_token_t,
    ) -> Result<(sgx_enclave_id_t, bool)> {
        let image = image.as_ref();
        let mut state = self.state.write();
        if !matches!(*state, LifecycleState::Unloaded) {
            return Err(FrameHostError::InvalidState {
                function: "sgx_create_enclave",
                expected: "unloaded",
                actual: state.name(),
            });
        }

        match self.platform.create_enclave(image, is_debug, launch_token) {
            Ok((enclave, updated)) => {
                let eid = self.platform.enclave_id(&enclave);
                *state = LifecycleState::Loaded(enclave);
                info!("[+] Init Enclave Successful {}!", eid);
                Ok((eid, updated))
            }
            Err(status) => {
                error!("Failed to create enclave from {:?}", image);
                for line in describe(status).to_string().lines() {
                    error!("{}", line);
                }
                Err(FrameHostError::SgxStatus {
                    status,
                    function: "sgx_create_enclave",
                })
            }
        }
    }

    /// Releases the enclave. Only valid once, and only after a successful create.
    pub fn destroy(&self) -> Result<()> {
        let mut state = self.state.write();
        match mem::replace(&mut *state, LifecycleState::Destroyed) {
            LifecycleState::Loaded(enclave) => {
                let eid = self.platform.enclave_id(&enclave);
                self.platform.destroy_enclave(enclave);
                info!("Destroyed enclave {}", eid);
                Ok(())
            }
            other => {
                let actual = other.name();
                *state = other;
                Err(FrameHostError::InvalidState {
                    function: "sgx_destroy_enclave",
                    expected: "loaded",
                    actual,
                })
            }
        }
    }

    pub fn eid(&self) -> Option<sgx_enclave_id_t> {
        match &*self.state.read() {
            LifecycleState::Loaded(enclave) => Some(self.platform.enclave_id(enclave)),
            _ => None,
        }
    }

    pub fn is_loaded(&self) -> bool {
        matches!(*self.state.read(), LifecycleState::Loaded(_))
    }

    pub fn state_name(&self) -> &'static str {
        self.state.read().name()
    }

    /// Enters the loaded enclave at `index`, handing it the host's ocall table.
    ///
    /// # Safety
    /// `ms` must point at the parameter block `index` expects and stay valid,
    /// along with every buffer it references, until this returns.
    pub(crate) unsafe fn enter(&self, index: EcallIndex, ms: *mut c_void) -> Result<sgx_status_t> {
        let state = self.state.read();
        let enclave = match &*state {
            LifecycleState::Loaded(enclave) => enclave,
            other => {
                return Err(FrameHostError::InvalidState {
                    function: index.name(),
                    expected: "loaded",
                    actual: other.name(),
                })
            }
        };

        let _entry = self.entry.lock();
        debug!("ecall {}", index.name());
        Ok(self.platform.ecall(enclave, index, &OCALL_TABLE, ms))
    }
}

impl<P: EnclavePlatform> Drop for EnclaveManager<P> {
    fn drop(&mut self) {
        if let LifecycleState::Loaded(enclave) =
            mem::replace(self.state.get_mut(), LifecycleState::Destroyed)
        {
            self.platform.destroy_enclave(enclave);
        }
    }
}
