//! waypoint-core — shared types, canonical encoding, and cryptographic primitives.
//! All other Waypoint crates depend on this one.

pub mod codec;
pub mod config;
pub mod crypto;
pub mod error;
pub mod fork;
pub mod identity;
pub mod message;

pub use crypto::{Address, Hash, Keypair, Signature};
pub use error::{ErrorKind, PingError};
pub use message::{Network, PeerSnapshot, PingMessage, PongMessage, PongPayload};
