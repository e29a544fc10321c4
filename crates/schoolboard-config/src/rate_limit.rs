//! Rate limiting configuration.
//!
//! Environment variables:
//!
//! - `RATE_LIMIT_ENABLED`: Turn the limiter on or off (default: true)
//! - `RATE_LIMIT_GENERAL_PER_SECOND`: Replenish interval in seconds for general endpoints (default: 1)
//! - `RATE_LIMIT_GENERAL_BURST_SIZE`: Burst size for general endpoints (default: 60)
//! - `RATE_LIMIT_AUTH_PER_SECOND`: Replenish interval in seconds for auth endpoints (default: 6)
//! - `RATE_LIMIT_AUTH_BURST_SIZE`: Burst size for auth endpoints (default: 10)
//!
//! Limits are keyed by peer IP, so the server must be started with
//! `into_make_service_with_connect_info::<SocketAddr>()`.

use tower_governor::governor::{GovernorConfig, GovernorConfigBuilder};
use tower_governor::key_extractor::PeerIpKeyExtractor;

use crate::env_or;

pub type IpGovernorConfig =
    GovernorConfig<PeerIpKeyExtractor, ::governor::middleware::NoOpMiddleware>;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RateLimitConfig {
    pub enabled: bool,
    pub general_per_second: u64,
    pub general_burst_size: u32,
    /// Stricter limits for login, register and refresh.
    pub auth_per_second: u64,
    pub auth_burst_size: u32,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            general_per_second: 1,
            general_burst_size: 60,
            auth_per_second: 6,
            auth_burst_size: 10,
        }
    }
}

impl RateLimitConfig {
    #[must_use]
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            enabled: env_or("RATE_LIMIT_ENABLED", defaults.enabled),
            general_per_second: env_or("RATE_LIMIT_GENERAL_PER_SECOND", defaults.general_per_second),
            general_burst_size: env_or("RATE_LIMIT_GENERAL_BURST_SIZE", defaults.general_burst_size),
            auth_per_second: env_or("RATE_LIMIT_AUTH_PER_SECOND", defaults.auth_per_second),
            auth_burst_size: env_or("RATE_LIMIT_AUTH_BURST_SIZE", defaults.auth_burst_size),
        }
    }

    /// Limiter disabled; used by router tests that have no peer address.
    pub fn disabled() -> Self {
        Self {
            enabled: false,
            ..Self::default()
        }
    }

    /// `None` when disabled or when the values cannot form a limiter
    /// (zero period or zero burst).
    #[must_use]
    pub fn general_governor_config(&self) -> Option<IpGovernorConfig> {
        self.build(self.general_per_second, self.general_burst_size)
    }

    #[must_use]
    pub fn auth_governor_config(&self) -> Option<IpGovernorConfig> {
        self.build(self.auth_per_second, self.auth_burst_size)
    }

    fn build(&self, per_second: u64, burst_size: u32) -> Option<IpGovernorConfig> {
        if !self.enabled {
            return None;
        }

        GovernorConfigBuilder::default()
            .per_second(per_second)
            .burst_size(burst_size)
            .key_extractor(PeerIpKeyExtractor)
            .finish()
    }
}
