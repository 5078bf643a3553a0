//! Fork schedule — which protocol rules are active at a given height, and the
//! minimum client version each activated fork demands.
//!
//! The schedule is consensus, not local policy: it is compiled in via
//! `ForkSchedule::compiled`, built once at startup, and shared read-only.
//! A node must satisfy every fork whose activation height it has reached.

use semver::Version;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Fork {
    Genesis,
}

impl Fork {
    pub fn name(&self) -> &'static str {
        match self {
            Fork::Genesis => "GENESIS",
        }
    }
}

/// One row of the schedule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ForkRule {
    pub fork: Fork,
    pub activation_height: u64,
    /// None = the fork does not raise the version floor.
    pub required_version: Option<Version>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ForkSchedule {
    rules: Vec<ForkRule>,
}

impl ForkSchedule {
    /// Build a schedule from explicit rules, ordered by activation height.
    pub fn new(mut rules: Vec<ForkRule>) -> Self {
        rules.sort_by_key(|r| r.activation_height);
        Self { rules }
    }

    /// The network's fork table.
    pub fn compiled() -> Self {
        Self::new(vec![ForkRule {
            fork: Fork::Genesis,
            activation_height: 0,
            required_version: Some(Version::new(0, 0, 1)),
        }])
    }

    pub fn rules(&self) -> &[ForkRule] {
        &self.rules
    }

    /// A fork with no rule in the schedule is never active.
    pub fn is_fork_active(&self, fork: Fork, height: u64) -> bool {
        self.rules
            .iter()
            .find(|r| r.fork == fork)
            .is_some_and(|r| height >= r.activation_height)
    }

    /// Should a node at `height` running `version` be turned away?
    ///
    /// Unparsable versions are rejected, including ones with surrounding
    /// whitespace.
    pub fn should_reject(&self, height: u64, version: &str) -> bool {
        let Ok(version) = Version::parse(version) else {
            return true;
        };
        self.rules
            .iter()
            .filter(|r| height >= r.activation_height)
            .filter_map(|r| r.required_version.as_ref())
            .any(|required| version < *required)
    }

    /// Highest version floor in force at `height`, if any.
    pub fn minimum_version_at(&self, height: u64) -> Option<&Version> {
        self.rules
            .iter()
            .filter(|r| height >= r.activation_height)
            .filter_map(|r| r.required_version.as_ref())
            .max()
    }
}

impl Default for ForkSchedule {
    fn default() -> Self {
        Self::compiled()
    }
}
