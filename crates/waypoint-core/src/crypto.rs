//! Cryptographic primitives for Waypoint.
//!
//! Provides two things:
//!   1. BLAKE3 hashing — ping/pong digests and identity key derivation
//!   2. Ed25519 signatures — peers sign pings, the directory signs pongs
//!
//! A peer's address IS its Ed25519 verifying key, so a signature can be
//! checked against the address alone. All three identifiers render as
//! `0x`-prefixed lowercase hex and parse with or without the prefix.
//!
//! Signing keys zeroize on drop (ed25519-dalek `zeroize` feature).
//! There is no unsafe code in this module.

use std::fmt;
use std::str::FromStr;

use ed25519_dalek::{Signer, SigningKey, VerifyingKey};
use rand::RngCore;
use thiserror::Error;
use zeroize::Zeroizing;

pub const HASH_LEN: usize = 32;
pub const ADDRESS_LEN: usize = 32;
pub const SIGNATURE_LEN: usize = 64;

// ── Identifiers ───────────────────────────────────────────────────────────────

/// 32-byte BLAKE3 digest.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Hash(pub [u8; HASH_LEN]);

/// 32-byte peer address (Ed25519 verifying key).
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Address(pub [u8; ADDRESS_LEN]);

/// 64-byte Ed25519 signature.
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct Signature(pub [u8; SIGNATURE_LEN]);

#[derive(Debug, Error, PartialEq)]
pub enum HexError {
    #[error("invalid hex: {0}")]
    Invalid(#[from] hex::FromHexError),

    #[error("expected {expected} bytes, got {actual}")]
    Length { expected: usize, actual: usize },
}

fn decode_fixed<const N: usize>(s: &str) -> Result<[u8; N], HexError> {
    let digits = s
        .strip_prefix("0x")
        .or_else(|| s.strip_prefix("0X"))
        .unwrap_or(s);
    let bytes = hex::decode(digits)?;
    let actual = bytes.len();
    bytes
        .try_into()
        .map_err(|_| HexError::Length { expected: N, actual })
}

macro_rules! hex_identifier {
    ($name:ident, $len:expr) => {
        impl $name {
            pub fn as_bytes(&self) -> &[u8; $len] {
                &self.0
            }

            /// `0x`-prefixed lowercase hex.
            pub fn to_hex(&self) -> String {
                format!("0x{}", hex::encode(self.0))
            }

            pub fn from_hex(s: &str) -> Result<Self, HexError> {
                decode_fixed::<{ $len }>(s).map(Self)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.to_hex())
            }
        }

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}({})", stringify!($name), self.to_hex())
            }
        }

        impl FromStr for $name {
            type Err = HexError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Self::from_hex(s)
            }
        }
    };
}

hex_identifier!(Hash, HASH_LEN);
hex_identifier!(Address, ADDRESS_LEN);
hex_identifier!(Signature, SIGNATURE_LEN);

// ── BLAKE3 ────────────────────────────────────────────────────────────────────

/// Hash a byte slice, returning a 32-byte BLAKE3 digest.
pub fn hash(data: &[u8]) -> Hash {
    Hash(*blake3::hash(data).as_bytes())
}

// ── Keypair ───────────────────────────────────────────────────────────────────

/// An Ed25519 signing keypair.
///
/// The secret half never leaves this struct. `Debug` shows only the address.
pub struct Keypair {
    signing: SigningKey,
    address: Address,
}

impl Keypair {
    /// Generate a new random keypair.
    pub fn generate() -> Self {
        let mut secret = Zeroizing::new([0u8; 32]);
        rand::thread_rng().fill_bytes(&mut secret[..]);
        Self::from_secret(&secret)
    }

    /// Reconstruct a keypair from 32 secret bytes.
    /// The address is derived deterministically from the secret.
    pub fn from_secret(secret: &[u8; 32]) -> Self {
        let signing = SigningKey::from_bytes(secret);
        let address = Address(signing.verifying_key().to_bytes());
        Self { signing, address }
    }

    pub fn address(&self) -> Address {
        self.address
    }

    /// Sign a digest.
    pub fn sign(&self, digest: &Hash) -> Signature {
        Signature(self.signing.sign(digest.as_bytes()).to_bytes())
    }
}

impl fmt::Debug for Keypair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Keypair")
            .field("address", &self.address)
            .finish_non_exhaustive()
    }
}

/// Check that `signature` over `digest` was produced by the key behind `address`.
///
/// Returns false for addresses that are not valid curve points.
pub fn verify(signature: &Signature, digest: &Hash, address: &Address) -> bool {
    let Ok(key) = VerifyingKey::from_bytes(address.as_bytes()) else {
        return false;
    };
    let sig = ed25519_dalek::Signature::from_bytes(signature.as_bytes());
    key.verify_strict(digest.as_bytes(), &sig).is_ok()
}

// ── Tests ─────────────────────────────────────────────────────────────────────
