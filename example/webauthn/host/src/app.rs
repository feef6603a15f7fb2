use crate::{
    error::{AppError, Result},
    hex_codec::{self, encode_be_bytes, encode_be_limbs},
};
use frame_config::{CLIENT_DATA_MAX_SIZE, SIGN_INPUT_MAX_SIZE};
use frame_host::{EnclaveConnector, EnclaveManager, EnclavePlatform, HostServices, LaunchTokenStore};
use frame_types::{Ec256PublicKey, Ec256Signature};
use std::path::Path;
use tracing::{debug, info, warn};

/// Loads the enclave, runs one attestation round and releases the enclave again.
pub fn execute<P: EnclavePlatform>(
    manager: &EnclaveManager<P>,
    tokens: &LaunchTokenStore,
    image: &Path,
    is_debug: bool,
    services: &HostServices,
) -> Result<()> {
    let eid = manager
        .init_enclave(image, is_debug, tokens)
        .map_err(AppError::EnclaveInit)?;
    debug!("Enclave {} ready", eid);

    let res = run(manager, services);

    if let Err(e) = manager.destroy() {
        warn!("Failed to destroy enclave {}: {}", eid, e);
    }
    res
}

/// Prints the public key, asks for client data and the bytes to sign, then
/// prints the signature.
pub fn run<P: EnclavePlatform>(manager: &EnclaveManager<P>, services: &HostServices) -> Result<()> {
    let connector = EnclaveConnector::new(manager, services);

    let pk = connector.get_public_key().map_err(AppError::PublicKey)?;
    services.write_console(format_public_key(&pk).as_bytes())?;
    services.write_console(b"\n\n")?;

    let client_data = prompt(services, "Enter client JSON data:\n", CLIENT_DATA_MAX_SIZE)?;
    let hex_input = prompt(services, "Enter hex data to sign:\n", SIGN_INPUT_MAX_SIZE)?;

    let data = hex_codec::decode(&String::from_utf8_lossy(&hex_input))?;
    info!(
        "Signing {} bytes with {} bytes of client data",
        data.len(),
        client_data.len()
    );

    let signature = connector
        .webauthn_get_signature(&data, &client_data)
        .map_err(AppError::Signature)?;
    services.write_console(format_signature(&signature).as_bytes())?;

    Ok(())
}

fn prompt(services: &HostServices, message: &str, max_size: usize) -> Result<Vec<u8>> {
    services.write_console(message.as_bytes())?;

    let mut buf = vec![0u8; max_size];
    let len = services.read_console_line(&mut buf)?;
    buf.truncate(len);

    services.write_console(b"\n")?;
    Ok(buf)
}

pub fn format_public_key(pk: &Ec256PublicKey) -> String {
    format!(
        "Public Key:\ngx: {}\ngy: {}\n",
        encode_be_bytes(&pk.x_be()),
        encode_be_bytes(&pk.y_be())
    )
}

pub fn format_signature(signature: &Ec256Signature) -> String {
    format!(
        "Resulting signature: {},{}\n",
        encode_be_limbs(&signature.x),
        encode_be_limbs(&signature.y)
    )
}
