use std::{
    fmt,
    hash::{Hash, Hasher},
};

/// Identifies one safe: a chain id and an address on that chain.
///
/// Addresses compare case-insensitively, checksum casing is kept for display
/// and for the tag sent to the gateway.
#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct SafeKey {
    pub chain_id: String,
    pub address: String,
}

impl SafeKey {
    pub fn new(chain_id: impl Into<String>, address: impl Into<String>) -> Self {
        Self {
            chain_id: chain_id.into(),
            address: address.into(),
        }
    }

    /// Parse a `{chain_id}:{address}` tag
    pub fn parse(tag: &str) -> Option<Self> {
        let (chain_id, address) = tag.split_once(':')?;
        if chain_id.is_empty() || address.is_empty() {
            return None;
        }

        Some(Self::new(chain_id, address))
    }

    /// Canonical `{chain_id}:{address}` tag
    pub fn tag(&self) -> String {
        format!("{}:{}", self.chain_id, self.address)
    }
}

impl PartialEq for SafeKey {
    fn eq(&self, other: &Self) -> bool {
        self.chain_id == other.chain_id && self.address.eq_ignore_ascii_case(&other.address)
    }
}

impl Eq for SafeKey {}

impl Hash for SafeKey {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.chain_id.hash(state);
        for byte in self.address.bytes() {
            state.write_u8(byte.to_ascii_lowercase());
        }
        state.write_u8(0xff);
    }
}

impl fmt::Display for SafeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.chain_id, self.address)
    }
}

auto_derived!(
    /// Request-invariant parameters, overviews are only fetched together when these match
    #[derive(Hash, Default)]
    #[serde(rename_all = "camelCase")]
    pub struct OverviewParams {
        /// Fiat currency balances are expressed in
        pub currency: String,
        /// Wallet the queued transaction counts are computed for
        #[serde(skip_serializing_if = "Option::is_none")]
        pub wallet_address: Option<String>,
    }

    /// Address with optional display information
    #[serde(rename_all = "camelCase")]
    pub struct AddressInfo {
        pub value: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        pub name: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        pub logo_uri: Option<String>,
    }

    /// Summary of a safe as returned by the gateway
    #[serde(rename_all = "camelCase")]
    pub struct SafeOverview {
        pub address: AddressInfo,
        pub chain_id: String,
        pub threshold: u32,
        pub owners: Vec<AddressInfo>,
        pub fiat_total: String,
        pub queued: u32,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        pub awaiting_confirmation: Option<u32>,
    }
);

impl OverviewParams {
    pub fn new(currency: impl Into<String>) -> Self {
        Self {
            currency: currency.into(),
            wallet_address: None,
        }
    }

    pub fn with_wallet(mut self, wallet_address: impl Into<String>) -> Self {
        self.wallet_address = Some(wallet_address.into());
        self
    }
}

impl AddressInfo {
    pub fn new(value: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            name: None,
            logo_uri: None,
        }
    }
}

impl SafeOverview {
    /// Key this overview answers for
    pub fn key(&self) -> SafeKey {
        SafeKey::new(&self.chain_id, &self.address.value)
    }
}
