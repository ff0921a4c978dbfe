//! Security domains and access contexts.

use serde::Deserialize;

use super::constants::{PID_ATTACKER, PID_VICTIM};

/// The security domain an access is issued from.
///
/// Domain-keyed schemes select per-domain keys with [`SecurityDomain::index`];
/// the unkeyed schemes treat both domains as one shared domain.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SecurityDomain {
    /// Accesses issued by the attacker process.
    #[default]
    Attacker,
    /// Accesses issued by the victim process.
    Victim,
}

impl SecurityDomain {
    /// Position of this domain in per-domain key tables.
    #[inline(always)]
    pub const fn index(self) -> usize {
        match self {
            Self::Attacker => 0,
            Self::Victim => 1,
        }
    }

    /// Domain tag as a 64-bit value, used as a cipher tweak.
    #[inline(always)]
    pub const fn tweak(self) -> u64 {
        self.index() as u64
    }
}

/// The identity an access is issued under.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Context {
    /// Security domain of the issuing process.
    pub domain: SecurityDomain,
    /// Process identifier of the issuing process.
    pub pid: u64,
}

impl Context {
    /// An attacker-domain context with the given PID.
    pub const fn attacker(pid: u64) -> Self {
        Self {
            domain: SecurityDomain::Attacker,
            pid,
        }
    }

    /// A victim-domain context with the given PID.
    pub const fn victim(pid: u64) -> Self {
        Self {
            domain: SecurityDomain::Victim,
            pid,
        }
    }

    /// The same domain under a different PID.
    pub const fn with_pid(self, pid: u64) -> Self {
        Self {
            domain: self.domain,
            pid,
        }
    }
}

impl Default for Context {
    fn default() -> Self {
        ATTACKER
    }
}

/// The default victim context.
pub const VICTIM: Context = Context::victim(PID_VICTIM);

/// The default attacker context.
pub const ATTACKER: Context = Context::attacker(PID_ATTACKER);
