use safe_config::config;
use safe_result::Result;

use crate::SafeOverview;

mod http;
mod reference;

pub use self::http::*;
pub use self::reference::*;

#[async_trait]
pub trait AbstractOverviewGateway: Sync + Send {
    /// Fetch overviews for many safes in a single request
    ///
    /// `safes` are `{chain_id}:{address}` tags, safes unknown to the gateway are left out of the response.
    async fn fetch_overview_batch(
        &self,
        safes: &[String],
        currency: &str,
        wallet_address: Option<&str>,
        trusted: bool,
        exclude_spam: bool,
    ) -> Result<Vec<SafeOverview>>;
}

/// Gateway information to use to create a client
pub enum GatewayInfo {
    /// Use the HTTP gateway if one is configured, otherwise the reference gateway
    Auto,
    /// Use the in-memory gateway
    Reference,
    /// Connect to a client gateway over HTTP
    Http { url: String },
}

/// Overview gateway
#[derive(Clone)]
pub enum Gateway {
    /// In-memory gateway
    Reference(ReferenceGateway),
    /// Client gateway over HTTP
    Http(HttpGateway),
}

impl GatewayInfo {
    /// Create a gateway client from the given gateway information
    pub async fn connect(self) -> Result<Gateway> {
        match self {
            GatewayInfo::Auto => {
                let url = config().await.gateway.url;
                if url.is_empty() {
                    info!("No gateway URL configured, using the reference gateway.");
                    Ok(Gateway::Reference(Default::default()))
                } else {
                    connect_http(&url).await
                }
            }
            GatewayInfo::Reference => Ok(Gateway::Reference(Default::default())),
            GatewayInfo::Http { url } => connect_http(&url).await,
        }
    }
}

async fn connect_http(url: &str) -> Result<Gateway> {
    let settings = config().await.gateway;
    info!("Using client gateway at {url}.");

    Ok(Gateway::Http(HttpGateway::new(
        url,
        settings.timeout(),
        settings.connect_timeout(),
    )?))
}

impl std::ops::Deref for Gateway {
    type Target = dyn AbstractOverviewGateway;

    fn deref(&self) -> &Self::Target {
        match &self {
            Gateway::Reference(reference) => reference,
            Gateway::Http(http) => http,
        }
    }
}
