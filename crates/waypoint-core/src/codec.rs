//! Canonical encoding — the byte pre-image that pings and pongs are hashed over.
//!
//! Layout is a flat concatenation in fixed field order, preceded by a domain
//! tag so a ping digest can never be replayed as a pong digest:
//!
//!   [tag bytes] [field 0] [field 1] ...
//!
//! Field encodings:
//!   integers      — big-endian, fixed width
//!   strings       — u32 BE byte length, then UTF-8 bytes
//!   Hash/Address  — 32 raw bytes
//!   U256          — 32 bytes big-endian
//!   Network       — one byte (`Network::code`)
//!
//! Changing anything here changes every digest on the network.

use bytes::{BufMut, Bytes, BytesMut};
use primitive_types::U256;

use crate::message::{PeerSnapshot, PingFields, PongPayload};

pub const PING_TAG: &[u8] = b"waypoint.ping.v1";
pub const PONG_TAG: &[u8] = b"waypoint.pong.v1";

struct Encoder {
    buf: BytesMut,
}

impl Encoder {
    fn new(tag: &[u8]) -> Self {
        let mut buf = BytesMut::with_capacity(256);
        buf.put_slice(tag);
        Self { buf }
    }

    fn u8(&mut self, v: u8) -> &mut Self {
        self.buf.put_u8(v);
        self
    }

    fn u16(&mut self, v: u16) -> &mut Self {
        self.buf.put_u16(v);
        self
    }

    fn u32(&mut self, v: u32) -> &mut Self {
        self.buf.put_u32(v);
        self
    }

    fn u64(&mut self, v: u64) -> &mut Self {
        self.buf.put_u64(v);
        self
    }

    fn fixed(&mut self, v: &[u8]) -> &mut Self {
        self.buf.put_slice(v);
        self
    }

    fn str(&mut self, v: &str) -> &mut Self {
        self.buf.put_u32(v.len() as u32);
        self.buf.put_slice(v.as_bytes());
        self
    }

    fn u256(&mut self, v: &U256) -> &mut Self {
        let mut be = [0u8; 32];
        v.to_big_endian(&mut be);
        self.buf.put_slice(&be);
        self
    }

    fn finish(self) -> Bytes {
        self.buf.freeze()
    }
}

/// Encode every ping field except `hash` and `signature`.
pub fn encode_ping(fields: &PingFields) -> Bytes {
    let mut enc = Encoder::new(PING_TAG);
    enc.fixed(fields.identity.as_bytes())
        .str(&fields.listen_host)
        .u16(fields.listen_port)
        .u8(fields.network.code())
        .str(&fields.software_version)
        .u256(&fields.total_difficulty)
        .fixed(fields.head_hash.as_bytes())
        .u64(fields.head_height)
        .u64(fields.timestamp);
    enc.finish()
}

/// Encode a pong payload: entry count, each entry in order, then the timestamp.
///
/// Snapshot fields are already in canonical text form (lowercase `0x` hex,
/// decimal difficulty), so they are encoded as the strings the peer receives.
pub fn encode_pong_payload(payload: &PongPayload) -> Bytes {
    let mut enc = Encoder::new(PONG_TAG);
    enc.u32(payload.entries.len() as u32);
    for entry in &payload.entries {
        encode_snapshot(&mut enc, entry);
    }
    enc.u64(payload.timestamp);
    enc.finish()
}

fn encode_snapshot(enc: &mut Encoder, entry: &PeerSnapshot) {
    enc.str(&entry.node_identity)
        .str(&entry.p2p_listen_host)
        .u16(entry.p2p_listen_port)
        .u8(entry.network.code())
        .str(&entry.software_version)
        .str(&entry.total_difficulty)
        .str(&entry.head_hash)
        .u64(entry.head_height)
        .u64(entry.updated_at);
}
