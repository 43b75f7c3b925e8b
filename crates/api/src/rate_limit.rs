//! Rate Limiting for the Diagnose Routes
//!
//! GCRA (Generic Cell Rate Algorithm) enforcement via tower_governor,
//! keyed by peer IP. Only the two diagnose routes sit behind it; reads
//! (history, stats, alerts, health) are unlimited.

use crate::settings::RateLimitSettings;
use governor::middleware::StateInformationMiddleware;
use std::sync::Arc;
use tower_governor::governor::GovernorConfigBuilder;
use tower_governor::key_extractor::PeerIpKeyExtractor;

/// Governor config with X-RateLimit-* response headers enabled
pub type DiagnoseGovernorConfig =
    tower_governor::governor::GovernorConfig<PeerIpKeyExtractor, StateInformationMiddleware>;

/// Build the governor config for the diagnose routes.
///
/// PeerIpKeyExtractor needs the server to run with
/// `into_make_service_with_connect_info::<SocketAddr>()`.
pub fn governor_config(settings: &RateLimitSettings) -> Arc<DiagnoseGovernorConfig> {
    Arc::new(
        GovernorConfigBuilder::default()
            .per_second(settings.per_second)
            .burst_size(settings.burst_size)
            .use_headers()
            .finish()
            .expect("rate limit settings produce a valid governor config"),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_settings_build() {
        let config = governor_config(&RateLimitSettings::default());
        assert!(Arc::strong_count(&config) > 0);
    }

    #[test]
    fn test_custom_settings_build() {
        let settings = RateLimitSettings {
            per_second: 1,
            burst_size: 100,
        };
        governor_config(&settings);
    }
}
