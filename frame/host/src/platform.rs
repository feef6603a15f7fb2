use frame_types::{EcallIndex, OcallTable};
use sgx_types::*;
use std::{ffi::c_void, path::Path};

/// The runtime that actually creates and enters enclaves.
pub trait EnclavePlatform: Send + Sync {
    type Enclave: Send + Sync;

    /// Creates an enclave from `image`. On success also reports whether the
    /// platform rewrote `token`.
    fn create_enclave(
        &self,
        image: &Path,
        debug: bool,
        token: &mut sgx_launch_token_t,
    ) -> SgxResult<(Self::Enclave, bool)>;

    fn enclave_id(&self, enclave: &Self::Enclave) -> sgx_enclave_id_t;

    fn destroy_enclave(&self, enclave: Self::Enclave);

    /// Enters the enclave at `index` with `ms` pointing at that ecall's parameter block.
    ///
    /// # Safety
    /// `ms` must point at a live parameter block of the type `index` expects, and
    /// every buffer it references must outlive the call.
    unsafe fn ecall(
        &self,
        enclave: &Self::Enclave,
        index: EcallIndex,
        ocall_table: &OcallTable,
        ms: *mut c_void,
    ) -> sgx_status_t;
}

#[cfg(feature = "sgx")]
pub use self::sgx::SgxPlatform;

#[cfg(feature = "sgx")]
mod sgx {
    use super::*;
    use sgx_urts::SgxEnclave;
    use std::os::raw::c_int;
    use tracing::info;

    extern "C" {
        fn sgx_ecall(
            eid: sgx_enclave_id_t,
            index: c_int,
            ocall_table: *const c_void,
            ms: *mut c_void,
        ) -> sgx_status_t;
    }

    /// Enclaves loaded through the Intel SGX untrusted runtime.
    #[derive(Debug, Default, Clone, Copy)]
    pub struct SgxPlatform;

    impl SgxPlatform {
        pub fn new() -> Self {
            SgxPlatform
        }
    }

    impl EnclavePlatform for SgxPlatform {
        type Enclave = SgxEnclave;

        fn create_enclave(
            &self,
            image: &Path,
            debug: bool,
            token: &mut sgx_launch_token_t,
        ) -> SgxResult<(SgxEnclave, bool)> {
            let debug = if debug { 1 as i32 } else { 0 as i32 };
            let mut launch_token_updated = 0;

            let mut misc_attr = sgx_misc_attribute_t {
                secs_attr: sgx_attributes_t { flags: 0, xfrm: 0 },
                misc_select: 0,
            };

            let enclave = SgxEnclave::create(
                image,
                debug,
                token,
                &mut launch_token_updated,
                &mut misc_attr,
            )?;
            info!("Loaded enclave image {:?}", image);

            Ok((enclave, launch_token_updated != 0))
        }

        fn enclave_id(&self, enclave: &SgxEnclave) -> sgx_enclave_id_t {
            enclave.geteid()
        }

        fn destroy_enclave(&self, enclave: SgxEnclave) {
            enclave.destroy();
        }

        unsafe fn ecall(
            &self,
            enclave: &SgxEnclave,
            index: EcallIndex,
            ocall_table: &OcallTable,
            ms: *mut c_void,
        ) -> sgx_status_t {
            sgx_ecall(
                enclave.geteid(),
                index as c_int,
                ocall_table.as_ptr(),
                ms,
            )
        }
    }
}
