use safe_coalesced::BatchLoader;
use safe_result::{Error, Result};

use crate::{Gateway, OverviewParams, SafeKey, SafeOverview};

/// Loads overviews for one batch of safes through the gateway
pub struct OverviewLoader {
    gateway: Gateway,
    trusted: bool,
    exclude_spam: bool,
}

impl OverviewLoader {
    pub fn new(gateway: Gateway, trusted: bool, exclude_spam: bool) -> Self {
        Self {
            gateway,
            trusted,
            exclude_spam,
        }
    }

    pub fn gateway(&self) -> &Gateway {
        &self.gateway
    }
}

#[async_trait]
impl BatchLoader for OverviewLoader {
    type BatchKey = OverviewParams;
    type ItemKey = SafeKey;
    type Value = SafeOverview;
    type Error = Error;

    async fn load(&self, params: &OverviewParams, safes: &[SafeKey]) -> Result<Vec<SafeOverview>> {
        let tags: Vec<String> = safes.iter().map(SafeKey::tag).collect();

        self.gateway
            .fetch_overview_batch(
                &tags,
                &params.currency,
                params.wallet_address.as_deref(),
                self.trusted,
                self.exclude_spam,
            )
            .await
    }

    fn key_of(&self, overview: &SafeOverview) -> SafeKey {
        overview.key()
    }
}
