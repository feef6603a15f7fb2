use frame_config::{ENCLAVE_DEBUG, ENCLAVE_IMAGE_PATH, SEALED_STATE_PATH};
use frame_host::{EnclaveManager, HostServices, LaunchTokenStore, SealedStore};
use std::{io, process};
use tracing::{error, warn};
use tracing_subscriber::EnvFilter;
use webauthn_host::app;

#[cfg(not(any(feature = "sgx", feature = "simulation")))]
compile_error!("either the `sgx` or the `simulation` feature must be enabled");

#[cfg(feature = "sgx")]
fn platform() -> frame_host::SgxPlatform {
    frame_host::SgxPlatform::new()
}

#[cfg(all(feature = "simulation", not(feature = "sgx")))]
fn platform() -> frame_host::SimulatedPlatform {
    warn!("Running on the simulated platform, the sealed signing key is not protected");
    frame_host::SimulatedPlatform::new()
}

fn main() {
    // stdout carries the prompts and results, logs go to stderr
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(io::stderr)
        .init();

    let manager = EnclaveManager::new(platform());
    let tokens = LaunchTokenStore::from_home();
    let services = HostServices::new(SealedStore::new(&*SEALED_STATE_PATH));

    if let Err(e) = app::execute(
        &manager,
        &tokens,
        &ENCLAVE_IMAGE_PATH,
        *ENCLAVE_DEBUG,
        &services,
    ) {
        error!("{}", e);
        if let Err(e) = services.write_console(format!("{}\n", e.diagnostic()).as_bytes()) {
            warn!("Failed to write the diagnostic to stdout: {}", e);
        }
        process::exit(-1);
    }
}
