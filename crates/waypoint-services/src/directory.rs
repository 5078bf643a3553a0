//! Ping/pong protocol handler.
//!
//! Each inbound ping runs through, in order:
//!   1. recompute the canonical hash and compare with the claimed one
//!   2. verify the signature over that hash against the node identity
//!   3. reject timestamps more than 60s away from local time
//!   4. reject software versions below any activated fork's floor
//!   5. upsert the peer into the registry
//!   6. snapshot the peer's network and seal a pong with the directory key
//!
//! The first failing step ends the request. Nothing touches the registry
//! before step 5. No state is kept between requests except the registry.

use std::sync::Arc;

use waypoint_core::config::TIMESTAMP_SKEW_TOLERANCE_SECS;
use waypoint_core::crypto;
use waypoint_core::fork::ForkSchedule;
use waypoint_core::identity::DirectoryIdentity;
use waypoint_core::message::{Network, PingMessage, PongMessage, PongPayload};
use waypoint_core::PingError;

use crate::registry::{NodeRecord, NodeRegistry};
use crate::unix_now;

/// Shared by every request handler. Cloning is cheap.
#[derive(Clone)]
pub struct DirectoryService {
    identity: Arc<DirectoryIdentity>,
    forks: Arc<ForkSchedule>,
    registry: NodeRegistry,
}

impl DirectoryService {
    pub fn new(
        identity: Arc<DirectoryIdentity>,
        forks: Arc<ForkSchedule>,
        registry: NodeRegistry,
    ) -> Self {
        Self {
            identity,
            forks,
            registry,
        }
    }

    /// Authenticate a ping, record the peer, and reply with a signed pong.
    pub fn handle_ping(&self, msg: &PingMessage) -> Result<PongMessage, PingError> {
        self.handle_ping_at(msg, unix_now())
    }

    /// `handle_ping` with an explicit clock.
    pub fn handle_ping_at(&self, msg: &PingMessage, now: u64) -> Result<PongMessage, PingError> {
        let ping = msg.decode().inspect_err(|e| {
            tracing::warn!(error = %e, "ping rejected: malformed");
        })?;
        let fields = &ping.fields;

        let computed = fields.canonical_hash();
        if computed != ping.claimed_hash {
            tracing::warn!(
                client = %ping.claimed_hash,
                server = %computed,
                "hash mismatch for incoming ping"
            );
            return Err(PingError::HashMismatch {
                claimed: ping.claimed_hash.to_hex(),
                computed: computed.to_hex(),
            });
        }

        if !crypto::verify(&ping.signature, &computed, &fields.identity) {
            tracing::warn!(identity = %fields.identity, "signature mismatch for incoming ping");
            return Err(PingError::BadSignature {
                identity: fields.identity.to_hex(),
            });
        }

        check_timestamp(fields.timestamp, now)?;

        if self
            .forks
            .should_reject(fields.head_height, &fields.software_version)
        {
            tracing::warn!(
                identity = %fields.identity,
                version = %fields.software_version,
                height = fields.head_height,
                "node rejected: software version below fork minimum"
            );
            return Err(PingError::VersionRejected {
                version: fields.software_version.clone(),
                height: fields.head_height,
            });
        }

        self.registry.upsert(NodeRecord::from_ping(fields, now));
        tracing::debug!(
            identity = %fields.identity,
            network = %fields.network,
            height = fields.head_height,
            "ping accepted"
        );

        Ok(self.build_pong_at(Some(fields.network), now))
    }

    /// Signed snapshot of live peers, optionally for one network.
    pub fn build_pong(&self, network: Option<Network>) -> PongMessage {
        self.build_pong_at(network, unix_now())
    }

    pub fn build_pong_at(&self, network: Option<Network>, now: u64) -> PongMessage {
        let entries = self
            .registry
            .snapshot(network, now)
            .iter()
            .map(NodeRecord::snapshot)
            .collect();
        PongMessage::seal(
            PongPayload {
                entries,
                timestamp: now,
            },
            self.identity.keypair(),
        )
    }

    pub fn registry(&self) -> &NodeRegistry {
        &self.registry
    }

    pub fn identity(&self) -> &DirectoryIdentity {
        &self.identity
    }

    pub fn forks(&self) -> &ForkSchedule {
        &self.forks
    }
}

fn check_timestamp(timestamp: u64, now: u64) -> Result<(), PingError> {
    let skew = now.abs_diff(timestamp);
    if skew > TIMESTAMP_SKEW_TOLERANCE_SECS {
        tracing::warn!(
            node_ts = timestamp,
            server_ts = now,
            skew,
            "ping rejected due to timestamp skew"
        );
        return Err(PingError::TimestampSkew {
            skew,
            tolerance: TIMESTAMP_SKEW_TOLERANCE_SECS,
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;
    use std::sync::atomic::{AtomicU64, Ordering};

    use primitive_types::U256;
    use waypoint_core::message::PingFields;
    use waypoint_core::{Address, ErrorKind, Keypair};

    static COUNTER: AtomicU64 = AtomicU64::new(0);

    const T: u64 = 1_700_000_000;

    struct Fixture {
        service: DirectoryService,
        dir: PathBuf,
    }

    impl Drop for Fixture {
        fn drop(&mut self) {
            let _ = std::fs::remove_dir_all(&self.dir);
        }
    }

    fn fixture() -> Fixture {
        let id = COUNTER.fetch_add(1, Ordering::Relaxed);
        let dir = std::env::temp_dir().join(format!(
            "waypoint-directory-test-{}-{}",
            std::process::id(),
            id
        ));
        let _ = std::fs::remove_dir_all(&dir);
        let identity = DirectoryIdentity::load(Some(&dir.join("identity"))).unwrap();
        let service = DirectoryService::new(
            Arc::new(identity),
            Arc::new(ForkSchedule::compiled()),
            NodeRegistry::new(180, 1000),
        );
        Fixture { service, dir }
    }

    fn fields(kp: &Keypair, network: Network, timestamp: u64) -> PingFields {
        PingFields {
            identity: kp.address(),
            listen_host: "10.1.2.3".into(),
            listen_port: 30303,
            network,
            software_version: "0.0.1".into(),
            total_difficulty: U256::from(5_000u64),
            head_hash: crypto::hash(b"head"),
            head_height: 100,
            timestamp,
        }
    }

    #[test]
    fn valid_ping_is_recorded_and_answered() {
        let fx = fixture();
        let peer = Keypair::generate();
        let msg = fields(&peer, Network::Main, T).into_signed(&peer);

        let pong = fx.service.handle_ping_at(&msg, T).unwrap();

        assert_eq!(pong.payload.entries.len(), 1);
        assert_eq!(pong.payload.entries[0].node_identity, peer.address().to_hex());
        assert_eq!(pong.payload.entries[0].updated_at, T);
        assert_eq!(pong.payload.timestamp, T);
        assert!(pong.is_authentic(&fx.service.identity().address()));
    }

    #[test]
    fn hash_mismatch_is_authentication_error_and_registry_unchanged() {
        let fx = fixture();
        let peer = Keypair::generate();
        let mut msg = fields(&peer, Network::Main, T).into_signed(&peer);
        msg.head_height = 101;

        let err = fx.service.handle_ping_at(&msg, T).unwrap_err();
        assert!(matches!(err, PingError::HashMismatch { .. }));
        assert_eq!(err.kind(), ErrorKind::Authentication);
        assert!(fx.service.registry().is_empty());
    }

    #[test]
    fn foreign_signature_is_rejected() {
        let fx = fixture();
        let peer = Keypair::generate();
        let impostor = Keypair::generate();
        // hash is correct for the claimed identity but signed by someone else
        let msg = fields(&peer, Network::Main, T).into_signed(&impostor);

        let err = fx.service.handle_ping_at(&msg, T).unwrap_err();
        assert!(matches!(err, PingError::BadSignature { .. }));
        assert_eq!(err.kind(), ErrorKind::Authentication);
        assert!(fx.service.registry().is_empty());
    }

    #[test]
    fn skew_boundary_is_sixty_seconds() {
        let fx = fixture();
        let peer = Keypair::generate();

        let at_limit = fields(&peer, Network::Main, T - 60).into_signed(&peer);
        assert!(fx.service.handle_ping_at(&at_limit, T).is_ok());

        let ahead = fields(&peer, Network::Main, T + 60).into_signed(&peer);
        assert!(fx.service.handle_ping_at(&ahead, T).is_ok());

        let stale = fields(&peer, Network::Main, T - 61).into_signed(&peer);
        let err = fx.service.handle_ping_at(&stale, T).unwrap_err();
        assert!(matches!(err, PingError::TimestampSkew { skew: 61, .. }));
        assert_eq!(err.kind(), ErrorKind::Validation);

        let future = fields(&peer, Network::Main, T + 61).into_signed(&peer);
        assert!(fx.service.handle_ping_at(&future, T).is_err());
    }

    #[test]
    fn stale_ping_does_not_touch_registry() {
        let fx = fixture();
        let peer = Keypair::generate();
        let stale = fields(&peer, Network::Main, T - 3600).into_signed(&peer);
        assert!(fx.service.handle_ping_at(&stale, T).is_err());
        assert!(fx.service.registry().is_empty());
    }

    #[test]
    fn outdated_software_is_rejected() {
        let fx = fixture();
        let peer = Keypair::generate();

        let mut f = fields(&peer, Network::Main, T);
        f.software_version = "0.0.0".into();
        let err = fx.service.handle_ping_at(&f.into_signed(&peer), T).unwrap_err();
        assert!(matches!(err, PingError::VersionRejected { .. }));
        assert_eq!(err.kind(), ErrorKind::Authentication);

        let mut f = fields(&peer, Network::Main, T);
        f.software_version = "latest".into();
        assert!(fx.service.handle_ping_at(&f.into_signed(&peer), T).is_err());

        assert!(fx.service.registry().is_empty());
    }

    #[test]
    fn huge_build_metadata_is_not_stored() {
        let fx = fixture();
        let peer = Keypair::generate();
        let mut f = fields(&peer, Network::Main, T);
        // valid semver, passes the fork gate on its own
        f.software_version = format!("0.0.1+{}", "a".repeat(1_500_000));

        let err = fx.service.handle_ping_at(&f.into_signed(&peer), T).unwrap_err();
        assert!(matches!(
            err,
            PingError::Malformed {
                field: "softwareVersion",
                ..
            }
        ));
        assert_eq!(err.kind(), ErrorKind::Validation);
        assert!(fx.service.registry().is_empty());
    }

    #[test]
    fn malformed_ping_is_validation_error() {
        let fx = fixture();
        let peer = Keypair::generate();
        let mut msg = fields(&peer, Network::Main, T).into_signed(&peer);
        msg.total_difficulty = "twelve".into();

        let err = fx.service.handle_ping_at(&msg, T).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);
        assert!(fx.service.registry().is_empty());
    }

    #[test]
    fn repeated_ping_keeps_one_entry_with_latest_time() {
        let fx = fixture();
        let peer = Keypair::generate();
        let msg = fields(&peer, Network::Main, T).into_signed(&peer);

        fx.service.handle_ping_at(&msg, T).unwrap();
        let pong = fx.service.handle_ping_at(&msg, T + 30).unwrap();

        assert_eq!(fx.service.registry().len(), 1);
        let record = fx
            .service
            .registry()
            .get(&peer.address(), T + 30)
            .unwrap();
        assert_eq!(record.updated_at, T + 30);
        assert_eq!(pong.payload.entries.len(), 1);
        assert_eq!(pong.payload.entries[0].updated_at, T + 30);
    }

    #[test]
    fn pong_only_lists_requesters_network() {
        let fx = fixture();
        let main_peer = Keypair::generate();
        let test_peer = Keypair::generate();

        fx.service
            .handle_ping_at(&fields(&test_peer, Network::Test, T).into_signed(&test_peer), T)
            .unwrap();
        let pong = fx
            .service
            .handle_ping_at(&fields(&main_peer, Network::Main, T).into_signed(&main_peer), T)
            .unwrap();

        assert_eq!(pong.payload.entries.len(), 1);
        assert_eq!(pong.payload.entries[0].network, Network::Main);

        let everything = fx.service.build_pong_at(None, T);
        assert_eq!(everything.payload.entries.len(), 2);
    }

    #[test]
    fn expired_peers_drop_out_of_pongs() {
        let fx = fixture();
        let peer = Keypair::generate();
        fx.service
            .handle_ping_at(&fields(&peer, Network::Main, T).into_signed(&peer), T)
            .unwrap();

        assert_eq!(fx.service.build_pong_at(None, T + 179).payload.entries.len(), 1);
        assert!(fx.service.build_pong_at(None, T + 180).payload.entries.is_empty());
    }

    #[test]
    fn pong_hash_matches_payload_and_verifies() {
        let fx = fixture();
        let pong = fx.service.build_pong_at(Some(Network::Main), T);
        assert_eq!(pong.hash, pong.payload.canonical_hash().to_hex());
        assert!(pong.is_authentic(&fx.service.identity().address()));
        assert!(!pong.is_authentic(&Address([0u8; 32])));
    }
}
