//! Directory identity — the signing keypair every pong is sealed with.
//!
//! The identity file holds a BIP39 mnemonic. On first boot one is generated
//! and written; afterwards it is only ever read. Key derivation:
//!
//!   mnemonic → BIP39 seed (empty passphrase)
//!            → BLAKE3 derive_key(IDENTITY_KDF_CONTEXT, seed)
//!            → Ed25519 secret key
//!
//! The mnemonic IS the private key. It is never logged, and all
//! intermediate buffers are zeroized.

use std::fmt;
use std::io::Write;
use std::path::{Path, PathBuf};

use bip39::{Language, Mnemonic};
use rand::RngCore;
use thiserror::Error;
use zeroize::Zeroizing;

use crate::crypto::{Address, Keypair};
use crate::error::ErrorKind;

/// Used when no identity file is configured.
pub const DEFAULT_IDENTITY_FILE: &str = ".directory_identity";

const IDENTITY_KDF_CONTEXT: &str = "waypoint directory identity v1 ed25519";

#[derive(Debug, Error)]
pub enum IdentityError {
    #[error("failed to read key file {0}: {1}")]
    ReadFailed(PathBuf, std::io::Error),
    #[error("failed to write key file {0}: {1}")]
    WriteFailed(PathBuf, std::io::Error),
    #[error("key file {0} does not contain a valid mnemonic: {1}")]
    InvalidMnemonic(PathBuf, bip39::Error),
    #[error("failed to generate mnemonic: {0}")]
    GenerationFailed(bip39::Error),
}

impl IdentityError {
    pub fn kind(&self) -> ErrorKind {
        ErrorKind::Fatal
    }
}

/// The directory's own keypair, shared read-only for the process lifetime.
pub struct DirectoryIdentity {
    keypair: Keypair,
    path: PathBuf,
}

impl DirectoryIdentity {
    /// Load the identity at `configured`, provisioning one on first run.
    ///
    /// A blank path falls back to `DEFAULT_IDENTITY_FILE` in the working
    /// directory. An existing file is never overwritten.
    pub fn load(configured: Option<&Path>) -> Result<Self, IdentityError> {
        let path = resolve_path(configured);
        let keypair = load_or_create_keypair(&path)?;
        tracing::info!(address = %keypair.address(), "directory identity ready");

        Ok(Self { keypair, path })
    }

    pub fn address(&self) -> Address {
        self.keypair.address()
    }

    pub fn keypair(&self) -> &Keypair {
        &self.keypair
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl fmt::Debug for DirectoryIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DirectoryIdentity")
            .field("address", &self.keypair.address())
            .field("path", &self.path)
            .finish()
    }
}

/// Load the keypair behind a mnemonic key file, generating and saving a
/// fresh mnemonic if the file does not exist yet.
///
/// Shared by the directory and by peers signing their own pings.
pub fn load_or_create_keypair(path: &Path) -> Result<Keypair, IdentityError> {
    let phrase = if path.exists() {
        tracing::info!(path = %path.display(), "loading key file");
        let text = Zeroizing::new(
            std::fs::read_to_string(path)
                .map_err(|e| IdentityError::ReadFailed(path.to_path_buf(), e))?,
        );
        Zeroizing::new(text.trim().to_string())
    } else {
        tracing::info!(path = %path.display(), "no key file found, generating a new one");
        let phrase = generate_phrase()?;
        persist(path, &phrase)?;
        tracing::info!(path = %path.display(), "new key file saved");
        phrase
    };

    derive_keypair(&phrase).map_err(|e| IdentityError::InvalidMnemonic(path.to_path_buf(), e))
}

fn resolve_path(configured: Option<&Path>) -> PathBuf {
    match configured {
        Some(p) if !p.as_os_str().to_string_lossy().trim().is_empty() => p.to_path_buf(),
        _ => PathBuf::from(DEFAULT_IDENTITY_FILE),
    }
}

/// 24 words from 256 bits of CSPRNG entropy.
fn generate_phrase() -> Result<Zeroizing<String>, IdentityError> {
    let mut entropy = Zeroizing::new([0u8; 32]);
    rand::thread_rng().fill_bytes(&mut entropy[..]);
    let mnemonic = Mnemonic::from_entropy_in(Language::English, &entropy[..])
        .map_err(IdentityError::GenerationFailed)?;
    Ok(Zeroizing::new(mnemonic.to_string()))
}

/// Write the phrase with create-new semantics, creating parent directories.
fn persist(path: &Path, phrase: &str) -> Result<(), IdentityError> {
    let write_err = |e| IdentityError::WriteFailed(path.to_path_buf(), e);

    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent).map_err(write_err)?;
        }
    }

    let mut options = std::fs::OpenOptions::new();
    options.write(true).create_new(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        options.mode(0o600);
    }

    let mut file = options.open(path).map_err(write_err)?;
    file.write_all(phrase.as_bytes()).map_err(write_err)?;
    file.sync_all().map_err(write_err)?;
    Ok(())
}

/// Mnemonic text → Ed25519 keypair.
pub fn derive_keypair(phrase: &str) -> Result<Keypair, bip39::Error> {
    let mnemonic = Mnemonic::parse_in(Language::English, phrase)?;
    let seed = Zeroizing::new(mnemonic.to_seed(""));
    let secret = Zeroizing::new(blake3::derive_key(IDENTITY_KDF_CONTEXT, &seed[..]));
    Ok(Keypair::from_secret(&secret))
}
