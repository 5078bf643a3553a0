//! Node registry — the directory's in-memory table of live peers.
//!
//! Keyed on peer address. Backed by an LRU map whose recency order is the
//! order of successful pings, so the least recently refreshed peer is the
//! one evicted when the table is full. A ping is never refused because the
//! registry is full.
//!
//! Expiry: a record is expired once `now - updated_at >= ttl`. Reads filter
//! expired records out; `purge_expired` reclaims their memory and is run
//! periodically by the daemon.
//!
//! All methods take `now` explicitly. Handles are cheap to clone and share
//! one table; a single mutex makes every operation linearizable.

use std::num::NonZeroUsize;
use std::sync::Arc;

use lru::LruCache;
use parking_lot::Mutex;
use primitive_types::U256;

use waypoint_core::message::{Network, PeerSnapshot, PingFields};
use waypoint_core::{Address, Hash};

/// Last known good state of one peer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeRecord {
    pub identity: Address,
    pub listen_host: String,
    pub listen_port: u16,
    pub network: Network,
    pub software_version: String,
    pub total_difficulty: U256,
    pub head_hash: Hash,
    pub head_height: u64,
    /// Unix seconds of the last successful ping.
    pub updated_at: u64,
}

impl NodeRecord {
    /// Build a record from an authenticated ping.
    pub fn from_ping(fields: &PingFields, updated_at: u64) -> Self {
        Self {
            identity: fields.identity,
            listen_host: fields.listen_host.clone(),
            listen_port: fields.listen_port,
            network: fields.network,
            software_version: fields.software_version.clone(),
            total_difficulty: fields.total_difficulty,
            head_hash: fields.head_hash,
            head_height: fields.head_height,
            updated_at,
        }
    }

    pub fn is_expired(&self, now: u64, ttl_secs: u64) -> bool {
        now.saturating_sub(self.updated_at) >= ttl_secs
    }

    /// Wire projection sent inside a pong.
    pub fn snapshot(&self) -> PeerSnapshot {
        PeerSnapshot {
            node_identity: self.identity.to_hex(),
            p2p_listen_host: self.listen_host.clone(),
            p2p_listen_port: self.listen_port,
            network: self.network,
            software_version: self.software_version.clone(),
            total_difficulty: self.total_difficulty.to_string(),
            head_hash: self.head_hash.to_hex(),
            head_height: self.head_height,
            updated_at: self.updated_at,
        }
    }
}

/// Bounded, time-expiring map from peer address to `NodeRecord`.
#[derive(Clone)]
pub struct NodeRegistry {
    entries: Arc<Mutex<LruCache<Address, NodeRecord>>>,
    ttl_secs: u64,
}

impl NodeRegistry {
    /// `max_entries` of zero is treated as one.
    pub fn new(ttl_secs: u64, max_entries: usize) -> Self {
        let capacity = NonZeroUsize::new(max_entries).unwrap_or(NonZeroUsize::MIN);
        Self {
            entries: Arc::new(Mutex::new(LruCache::new(capacity))),
            ttl_secs,
        }
    }

    /// Insert or overwrite the record for `record.identity`.
    ///
    /// Returns the identity evicted to make room, if any.
    pub fn upsert(&self, record: NodeRecord) -> Option<Address> {
        let identity = record.identity;
        let displaced = self.entries.lock().push(identity, record);

        match displaced {
            Some((evicted, _)) if evicted != identity => {
                tracing::debug!(evicted = %evicted, "registry full, evicted least recent peer");
                Some(evicted)
            }
            _ => None,
        }
    }

    /// Point lookup. Expired records are invisible.
    pub fn get(&self, identity: &Address, now: u64) -> Option<NodeRecord> {
        self.entries
            .lock()
            .peek(identity)
            .filter(|r| !r.is_expired(now, self.ttl_secs))
            .cloned()
    }

    /// Owned copy of every live record, most recently refreshed first,
    /// optionally restricted to one network.
    pub fn snapshot(&self, network: Option<Network>, now: u64) -> Vec<NodeRecord> {
        self.entries
            .lock()
            .iter()
            .map(|(_, record)| record)
            .filter(|r| !r.is_expired(now, self.ttl_secs))
            .filter(|r| network.map_or(true, |n| r.network == n))
            .cloned()
            .collect()
    }

    /// Drop every expired record. Returns how many were removed.
    pub fn purge_expired(&self, now: u64) -> usize {
        let mut entries = self.entries.lock();
        let expired: Vec<Address> = entries
            .iter()
            .filter(|(_, r)| r.is_expired(now, self.ttl_secs))
            .map(|(identity, _)| *identity)
            .collect();
        for identity in &expired {
            entries.pop(identity);
        }
        expired.len()
    }

    /// Records held, including expired ones not yet purged.
    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn capacity(&self) -> usize {
        self.entries.lock().cap().get()
    }

    pub fn ttl_secs(&self) -> u64 {
        self.ttl_secs
    }
}
