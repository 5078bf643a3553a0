//! Ping/pong message schema.
//!
//! `PingMessage` and `PongMessage` are the JSON bodies exchanged with peers.
//! Identifiers travel as `0x` hex text and amounts as decimal text so that
//! no JSON number ever loses precision. `PingMessage::decode` turns the
//! wire form into typed `PingFields`, which is what gets hashed.

use primitive_types::U256;
use serde::{Deserialize, Serialize};

use crate::codec;
use crate::crypto::{self, Address, Hash, Keypair, Signature};
use crate::error::PingError;

/// Longest accepted `p2pListenHost` (DNS name limit).
pub const MAX_HOST_LEN: usize = 253;

/// Longest accepted `softwareVersion`. Semver build metadata is unbounded.
pub const MAX_VERSION_LEN: usize = 64;

/// Chain/network a peer belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Network {
    Main,
    Test,
}

impl Network {
    /// Byte used in the canonical encoding.
    pub fn code(&self) -> u8 {
        match self {
            Network::Main => 0x01,
            Network::Test => 0x02,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Network::Main => "MAIN",
            Network::Test => "TEST",
        }
    }
}

impl std::fmt::Display for Network {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Network {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "MAIN" => Ok(Network::Main),
            "TEST" => Ok(Network::Test),
            other => Err(format!("unknown network {other:?}")),
        }
    }
}

// ── Ping ──────────────────────────────────────────────────────────────────────

/// Heartbeat sent by a peer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PingMessage {
    pub node_identity: String,
    pub p2p_listen_host: String,
    pub p2p_listen_port: u16,
    pub network: Network,
    pub software_version: String,
    /// Decimal text.
    pub total_difficulty: String,
    pub head_hash: String,
    pub head_height: u64,
    /// Unix seconds at the peer when the ping was signed.
    pub timestamp: u64,
    pub hash: String,
    pub signature: String,
}

/// Typed ping fields — everything covered by the ping hash.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PingFields {
    pub identity: Address,
    pub listen_host: String,
    pub listen_port: u16,
    pub network: Network,
    pub software_version: String,
    pub total_difficulty: U256,
    pub head_hash: Hash,
    pub head_height: u64,
    pub timestamp: u64,
}

/// A decoded ping: typed fields plus the claimed hash and signature.
#[derive(Debug, Clone)]
pub struct Ping {
    pub fields: PingFields,
    pub claimed_hash: Hash,
    pub signature: Signature,
}

impl PingFields {
    /// BLAKE3 over the canonical encoding.
    pub fn canonical_hash(&self) -> Hash {
        crypto::hash(&codec::encode_ping(self))
    }

    /// Hash and sign these fields, producing the wire message.
    ///
    /// `keypair.address()` should equal `self.identity`; otherwise the
    /// directory will reject the ping.
    pub fn into_signed(self, keypair: &Keypair) -> PingMessage {
        let hash = self.canonical_hash();
        let signature = keypair.sign(&hash);
        PingMessage {
            node_identity: self.identity.to_hex(),
            p2p_listen_host: self.listen_host,
            p2p_listen_port: self.listen_port,
            network: self.network,
            software_version: self.software_version,
            total_difficulty: self.total_difficulty.to_string(),
            head_hash: self.head_hash.to_hex(),
            head_height: self.head_height,
            timestamp: self.timestamp,
            hash: hash.to_hex(),
            signature: signature.to_hex(),
        }
    }
}

impl PingMessage {
    /// Parse the wire fields. Any malformed field is a validation failure.
    pub fn decode(&self) -> Result<Ping, PingError> {
        let identity = Address::from_hex(&self.node_identity)
            .map_err(|e| PingError::malformed("nodeIdentity", e))?;
        let head_hash =
            Hash::from_hex(&self.head_hash).map_err(|e| PingError::malformed("headHash", e))?;
        let claimed_hash = Hash::from_hex(&self.hash).map_err(|e| PingError::malformed("hash", e))?;
        let signature = Signature::from_hex(&self.signature)
            .map_err(|e| PingError::malformed("signature", e))?;
        let total_difficulty = parse_decimal(&self.total_difficulty)
            .map_err(|e| PingError::malformed("totalDifficulty", e))?;

        if self.p2p_listen_host.is_empty() || self.p2p_listen_host.len() > MAX_HOST_LEN {
            return Err(PingError::malformed(
                "p2pListenHost",
                format!("length must be 1..={MAX_HOST_LEN}"),
            ));
        }

        let version = &self.software_version;
        if version.is_empty() || version.len() > MAX_VERSION_LEN {
            return Err(PingError::malformed(
                "softwareVersion",
                format!("length must be 1..={MAX_VERSION_LEN}"),
            ));
        }
        if version.trim() != version {
            return Err(PingError::malformed(
                "softwareVersion",
                "surrounding whitespace",
            ));
        }

        Ok(Ping {
            fields: PingFields {
                identity,
                listen_host: self.p2p_listen_host.clone(),
                listen_port: self.p2p_listen_port,
                network: self.network,
                software_version: self.software_version.clone(),
                total_difficulty,
                head_hash,
                head_height: self.head_height,
                timestamp: self.timestamp,
            },
            claimed_hash,
            signature,
        })
    }
}

/// Parse an unsigned decimal integer. Rejects signs, blanks and overflow.
fn parse_decimal(text: &str) -> Result<U256, String> {
    if text.is_empty() || !text.bytes().all(|b| b.is_ascii_digit()) {
        return Err(format!("expected unsigned decimal, got {text:?}"));
    }
    U256::from_dec_str(text).map_err(|e| format!("{e:?}"))
}

// ── Pong ──────────────────────────────────────────────────────────────────────

/// Read-only projection of one registry entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PeerSnapshot {
    pub node_identity: String,
    pub p2p_listen_host: String,
    pub p2p_listen_port: u16,
    pub network: Network,
    pub software_version: String,
    /// Decimal text.
    pub total_difficulty: String,
    pub head_hash: String,
    pub head_height: u64,
    pub updated_at: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PongPayload {
    pub entries: Vec<PeerSnapshot>,
    pub timestamp: u64,
}

/// Directory reply: a payload plus the directory's hash and signature over it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PongMessage {
    pub payload: PongPayload,
    pub hash: String,
    pub signature: String,
}

impl PongPayload {
    pub fn canonical_hash(&self) -> Hash {
        crypto::hash(&codec::encode_pong_payload(self))
    }
}

impl PongMessage {
    /// Hash and sign a payload with the directory key.
    pub fn seal(payload: PongPayload, keypair: &Keypair) -> Self {
        let hash = payload.canonical_hash();
        let signature = keypair.sign(&hash);
        Self {
            payload,
            hash: hash.to_hex(),
            signature: signature.to_hex(),
        }
    }

    /// True if the embedded hash matches the payload and the signature
    /// verifies against `directory`.
    pub fn is_authentic(&self, directory: &Address) -> bool {
        let (Ok(claimed), Ok(signature)) =
            (Hash::from_hex(&self.hash), Signature::from_hex(&self.signature))
        else {
            return false;
        };
        let computed = self.payload.canonical_hash();
        computed == claimed && crypto::verify(&signature, &computed, directory)
    }
}
