use core::fmt;
use sgx_types::{SGX_ECP256_KEY_SIZE, SGX_NISTP_ECP256_KEY_SIZE};

pub const LAUNCH_TOKEN_SIZE: usize = 1024;

/// Status for Ocall.
/// Plain integer codes are the only thing an ocall hands back to the trusted side.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct UntrustedStatus(pub i32);

impl UntrustedStatus {
    pub const SUCCESS: UntrustedStatus = UntrustedStatus(0);
    /// The backing file could not be opened.
    pub const OPEN_FAILED: UntrustedStatus = UntrustedStatus(1);
    /// The file was opened but the transfer did not complete.
    pub const IO_FAILED: UntrustedStatus = UntrustedStatus(2);

    pub fn success() -> Self {
        Self::SUCCESS
    }

    pub fn error() -> Self {
        Self::OPEN_FAILED
    }

    pub fn is_err(&self) -> bool {
        self.0 != 0
    }
}

/// NIST P-256 public key as laid out by `sgx_ec256_public_t`.
/// Coordinates are stored little-endian.
#[repr(C)]
#[derive(Clone, Copy, Default, PartialEq, Eq)]
pub struct Ec256PublicKey {
    pub gx: [u8; SGX_ECP256_KEY_SIZE],
    pub gy: [u8; SGX_ECP256_KEY_SIZE],
}

impl Ec256PublicKey {
    pub fn from_be_coordinates(x: &[u8; SGX_ECP256_KEY_SIZE], y: &[u8; SGX_ECP256_KEY_SIZE]) -> Self {
        let mut gx = *x;
        let mut gy = *y;
        gx.reverse();
        gy.reverse();
        Ec256PublicKey { gx, gy }
    }

    pub fn x_be(&self) -> [u8; SGX_ECP256_KEY_SIZE] {
        let mut x = self.gx;
        x.reverse();
        x
    }

    pub fn y_be(&self) -> [u8; SGX_ECP256_KEY_SIZE] {
        let mut y = self.gy;
        y.reverse();
        y
    }
}

impl fmt::Debug for Ec256PublicKey {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("Ec256PublicKey")
            .field("gx", &&self.gx[..])
            .field("gy", &&self.gy[..])
            .finish()
    }
}

/// ECDSA signature as laid out by `sgx_ec256_signature_t`.
/// `x[0]` is the least significant 32-bit limb.
#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Ec256Signature {
    pub x: [u32; SGX_NISTP_ECP256_KEY_SIZE],
    pub y: [u32; SGX_NISTP_ECP256_KEY_SIZE],
}

impl Ec256Signature {
    pub fn from_be_scalars(r: &[u8; SGX_ECP256_KEY_SIZE], s: &[u8; SGX_ECP256_KEY_SIZE]) -> Self {
        Ec256Signature {
            x: be_bytes_to_le_limbs(r),
            y: be_bytes_to_le_limbs(s),
        }
    }

    pub fn r_be(&self) -> [u8; SGX_ECP256_KEY_SIZE] {
        le_limbs_to_be_bytes(&self.x)
    }

    pub fn s_be(&self) -> [u8; SGX_ECP256_KEY_SIZE] {
        le_limbs_to_be_bytes(&self.y)
    }
}

fn be_bytes_to_le_limbs(bytes: &[u8; SGX_ECP256_KEY_SIZE]) -> [u32; SGX_NISTP_ECP256_KEY_SIZE] {
    let mut limbs = [0u32; SGX_NISTP_ECP256_KEY_SIZE];
    for (i, chunk) in bytes.rchunks_exact(4).enumerate() {
        limbs[i] = u32::from_be_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]);
    }
    limbs
}

fn le_limbs_to_be_bytes(limbs: &[u32; SGX_NISTP_ECP256_KEY_SIZE]) -> [u8; SGX_ECP256_KEY_SIZE] {
    let mut bytes = [0u8; SGX_ECP256_KEY_SIZE];
    for (i, chunk) in bytes.rchunks_exact_mut(4).enumerate() {
        chunk.copy_from_slice(&limbs[i].to_be_bytes());
    }
    bytes
}
