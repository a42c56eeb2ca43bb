use std::{collections::HashMap, sync::Arc};

use futures::lock::Mutex;
use safe_result::{Error, Result};
use tokio::sync::Semaphore;

use crate::{SafeKey, SafeOverview};

use super::AbstractOverviewGateway;

/// A single call made against the reference gateway
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OverviewRequest {
    pub safes: Vec<String>,
    pub currency: String,
    pub wallet_address: Option<String>,
    pub trusted: bool,
    pub exclude_spam: bool,
}

/// Reference implementation
#[derive(Clone, Default)]
pub struct ReferenceGateway {
    pub overviews: Arc<Mutex<HashMap<SafeKey, SafeOverview>>>,
    pub requests: Arc<Mutex<Vec<OverviewRequest>>>,
    pub failure: Arc<Mutex<Option<Error>>>,
    gate: Option<Arc<Semaphore>>,
}

impl ReferenceGateway {
    /// Gateway that holds every call until a permit is added to the returned semaphore
    pub fn gated() -> (Self, Arc<Semaphore>) {
        let gate = Arc::new(Semaphore::new(0));
        (
            Self {
                gate: Some(gate.clone()),
                ..Default::default()
            },
            gate,
        )
    }

    /// Make an overview available
    pub async fn insert(&self, overview: SafeOverview) {
        self.overviews.lock().await.insert(overview.key(), overview);
    }

    /// Fail every following call with the given error, `None` to recover
    pub async fn fail_with(&self, error: Option<Error>) {
        *self.failure.lock().await = error;
    }

    /// Calls made so far
    pub async fn requests(&self) -> Vec<OverviewRequest> {
        self.requests.lock().await.clone()
    }
}

#[async_trait]
impl AbstractOverviewGateway for ReferenceGateway {
    async fn fetch_overview_batch(
        &self,
        safes: &[String],
        currency: &str,
        wallet_address: Option<&str>,
        trusted: bool,
        exclude_spam: bool,
    ) -> Result<Vec<SafeOverview>> {
        self.requests.lock().await.push(OverviewRequest {
            safes: safes.to_vec(),
            currency: currency.to_string(),
            wallet_address: wallet_address.map(str::to_string),
            trusted,
            exclude_spam,
        });

        if let Some(gate) = &self.gate {
            gate.acquire()
                .await
                .map_err(|_| create_error!(GatewayUnavailable {
                    error: "gate closed".to_string()
                }))?
                .forget();
        }

        if let Some(error) = self.failure.lock().await.clone() {
            return Err(error);
        }

        let overviews = self.overviews.lock().await;
        Ok(safes
            .iter()
            .filter_map(|tag| SafeKey::parse(tag))
            .filter_map(|key| overviews.get(&key).cloned())
            .collect())
    }
}
