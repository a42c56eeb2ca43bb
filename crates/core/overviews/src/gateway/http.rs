use std::{sync::Arc, time::Duration};

use reqwest::Client;
use safe_result::Result;

use crate::SafeOverview;

use super::AbstractOverviewGateway;

const USER_AGENT: &str = concat!("safe-overviews/", env!("CARGO_PKG_VERSION"));

/// Client gateway reached over HTTP
#[derive(Clone, Debug)]
pub struct HttpGateway {
    base_url: Arc<str>,
    client: Client,
}

impl HttpGateway {
    pub fn new(base_url: &str, timeout: Duration, connect_timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(timeout)
            .connect_timeout(connect_timeout)
            .build()
            .map_err(|err| {
                error!("Failed to build gateway client: {err}");
                create_error!(InternalError)
            })?;

        Ok(Self {
            base_url: Arc::from(base_url.trim_end_matches('/')),
            client,
        })
    }

    fn overviews_url(&self) -> String {
        format!("{}/v1/safes", self.base_url)
    }
}

/// Query string of the multi-safe overview endpoint
pub(crate) fn overview_query(
    safes: &[String],
    currency: &str,
    wallet_address: Option<&str>,
    trusted: bool,
    exclude_spam: bool,
) -> Vec<(&'static str, String)> {
    let mut query = vec![
        ("currency", currency.to_string()),
        ("safes", safes.join(",")),
        ("trusted", trusted.to_string()),
        ("exclude_spam", exclude_spam.to_string()),
    ];

    if let Some(wallet_address) = wallet_address {
        query.push(("wallet_address", wallet_address.to_string()));
    }

    query
}

#[async_trait]
impl AbstractOverviewGateway for HttpGateway {
    async fn fetch_overview_batch(
        &self,
        safes: &[String],
        currency: &str,
        wallet_address: Option<&str>,
        trusted: bool,
        exclude_spam: bool,
    ) -> Result<Vec<SafeOverview>> {
        let response = self
            .client
            .get(self.overviews_url())
            .query(&overview_query(
                safes,
                currency,
                wallet_address,
                trusted,
                exclude_spam,
            ))
            .send()
            .await
            .map_err(|err| create_error!(GatewayUnavailable { error: err.to_string() }))?;

        let status = response.status();
        if !status.is_success() {
            error!("Gateway responded to overview request with {status}.");
            return Err(create_error!(GatewayError {
                status: status.as_u16()
            }));
        }

        let text = response
            .text()
            .await
            .map_err(|err| create_error!(GatewayUnavailable { error: err.to_string() }))?;

        serde_json::from_str(&text)
            .map_err(|err| create_error!(InvalidGatewayResponse { error: err.to_string() }))
    }
}
