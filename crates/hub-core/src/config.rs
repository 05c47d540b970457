//! Configuration for the federation hub pipeline.
//!
//! Size ceilings and replay windows are deployment knobs, not compile-time
//! constants: ceilings differ per message class and replay windows per
//! deployment environment.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Top-level hub configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HubConfig {
    /// Per-message-class byte ceilings.
    pub limits: MessageLimits,
    /// Replay-protection validity windows.
    pub replay: ReplayWindows,
    /// Minimum acceptable level of assurance for identity-provider
    /// responses. `None` accepts any parseable level.
    pub minimum_level_of_assurance: Option<LevelOfAssurance>,
}

/// Byte-size ceilings applied to raw wire messages before parsing.
///
/// Enforced against the encoded form, before any base64 decode, so oversized
/// input is rejected without allocating for it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageLimits {
    /// Ceiling for an inbound AuthnRequest.
    pub authn_request_max_bytes: usize,
    /// Ceiling for an inbound Response.
    pub response_max_bytes: usize,
    /// Ceiling for a single decrypted Assertion.
    pub assertion_max_bytes: usize,
}

/// Validity windows for the replay cache.
///
/// An ID may legally be reused once its window has elapsed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReplayWindows {
    /// How long an AuthnRequest ID is held against replay.
    pub authn_request_seconds: u64,
    /// How long an assertion ID is held against replay.
    pub assertion_seconds: u64,
}

/// Strength-of-identity-proofing tier.
///
/// Ordered: `Level2` satisfies a `Level1` minimum.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "kebab-case")]
pub enum LevelOfAssurance {
    /// Basic assurance.
    Level1,
    /// Substantial assurance.
    Level2,
}

impl Default for HubConfig {
    fn default() -> Self {
        Self {
            limits: MessageLimits::default(),
            replay: ReplayWindows::default(),
            minimum_level_of_assurance: None,
        }
    }
}

impl Default for MessageLimits {
    fn default() -> Self {
        Self {
            authn_request_max_bytes: 128 * 1024,
            response_max_bytes: 512 * 1024,
            assertion_max_bytes: 128 * 1024,
        }
    }
}

impl Default for ReplayWindows {
    fn default() -> Self {
        Self {
            authn_request_seconds: 900,
            assertion_seconds: 3600,
        }
    }
}

impl HubConfig {
    /// Checks that every ceiling and window is usable.
    pub fn validate(&self) -> Result<()> {
        if self.limits.authn_request_max_bytes == 0
            || self.limits.response_max_bytes == 0
            || self.limits.assertion_max_bytes == 0
        {
            return Err(Error::Config(
                "message size ceilings must be non-zero".to_string(),
            ));
        }
        if self.replay.authn_request_seconds == 0 || self.replay.assertion_seconds == 0 {
            return Err(Error::Config(
                "replay validity windows must be non-zero".to_string(),
            ));
        }
        Ok(())
    }
}
