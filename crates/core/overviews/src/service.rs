use std::{future::Future, sync::Arc};

use futures::future::join_all;
use safe_coalesced::{BatchCoalescer, CoalescerConfig, Error as CoalescerError};
use safe_config::config;
use safe_result::{ErrorType, Result};

use crate::{Gateway, GatewayInfo, OverviewLoader, OverviewParams, SafeKey, SafeOverview};

/// Options applied to every overview request
#[derive(Clone, Debug)]
pub struct OverviewOptions {
    /// Only count tokens the gateway marks as trusted
    pub trusted: bool,
    /// Hide tokens flagged as spam
    pub exclude_spam: bool,
    pub coalescer: CoalescerConfig,
}

impl Default for OverviewOptions {
    fn default() -> Self {
        Self {
            trusted: false,
            exclude_spam: true,
            coalescer: CoalescerConfig::default(),
        }
    }
}

/// Batched access to safe overviews.
///
/// Every [`SafeOverviews::get`] issued close together for the same [`OverviewParams`]
/// is answered by a single gateway request.
#[derive(Clone)]
pub struct SafeOverviews {
    coalescer: BatchCoalescer<OverviewLoader>,
}

impl SafeOverviews {
    pub fn new(gateway: Gateway, options: OverviewOptions) -> Self {
        let loader = OverviewLoader::new(gateway, options.trusted, options.exclude_spam);

        Self {
            coalescer: BatchCoalescer::from_config(loader, options.coalescer),
        }
    }

    /// Build from the loaded configuration
    pub async fn from_config() -> Result<Self> {
        let settings = config().await.overviews;
        let gateway = GatewayInfo::Auto.connect().await?;

        Ok(Self::new(
            gateway,
            OverviewOptions {
                trusted: settings.trusted,
                exclude_spam: settings.exclude_spam,
                coalescer: CoalescerConfig {
                    max_batch_size: settings.max_batch_size(),
                    flush_delay: settings.flush_delay(),
                },
            },
        ))
    }

    pub fn gateway(&self) -> &Gateway {
        self.coalescer.loader().gateway()
    }

    /// Request the overview of one safe.
    ///
    /// Resolves to `None` if the gateway does not know the safe, fails with
    /// `CouldNotFetchOverview` if the batch it was sent in failed.
    pub fn get(
        &self,
        safe: SafeKey,
        params: &OverviewParams,
    ) -> impl Future<Output = Result<Option<Arc<SafeOverview>>>> + Send + 'static {
        let request = if safe.address.trim().is_empty() {
            Err(create_error!(InvalidSafeAddress))
        } else {
            Ok(self.coalescer.get(params.clone(), safe))
        };

        async move {
            match request {
                Ok(overview) => overview.await.map_err(|err| match err {
                    CoalescerError::Fetch(err) => create_overview_error!(err.error_type),
                    err => {
                        warn!("Overview request ended without a batch result: {err}");
                        create_overview_error!(ErrorType::InternalError)
                    }
                }),
                Err(err) => Err(err),
            }
        }
    }

    /// Request many overviews, keeping only those that resolved, in input order
    pub async fn get_many(
        &self,
        safes: impl IntoIterator<Item = SafeKey>,
        params: &OverviewParams,
    ) -> Vec<Arc<SafeOverview>> {
        let requests: Vec<_> = safes
            .into_iter()
            .map(|safe| self.get(safe, params))
            .collect();

        join_all(requests)
            .await
            .into_iter()
            .filter_map(|result| match result {
                Ok(overview) => overview,
                Err(err) => {
                    debug!("Dropping overview from bulk request: {err} ({:?})", err.cause());
                    None
                }
            })
            .collect()
    }

    /// Number of parameter sets with outstanding requests
    pub fn queue_count(&self) -> usize {
        self.coalescer.queue_count()
    }

    pub fn pending_count(&self, params: &OverviewParams) -> usize {
        self.coalescer.pending_count(params)
    }

    pub fn in_flight_count(&self, params: &OverviewParams) -> usize {
        self.coalescer.in_flight_count(params)
    }
}
