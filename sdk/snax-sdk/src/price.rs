use crate::types::SolPrice;
use async_trait::async_trait;
use reqwest::Client;
use std::collections::HashMap;
use std::error::Error;
use std::time::Duration;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Read-only, best-effort source for the SOL price.
#[async_trait]
pub trait PriceOracle: Send + Sync {
    async fn fetch_price(&self) -> Result<SolPrice, Box<dyn Error + Send + Sync>>;
}

/// CoinGecko `simple/price` endpoint
pub struct CoinGeckoOracle {
    client: Client,
    url: String,
}

impl CoinGeckoOracle {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            url: url.into(),
        }
    }

    fn request_url(&self) -> String {
        format!("{}?ids=solana&vs_currencies=usd,krw", self.url)
    }
}

/// `{"solana": {"usd": .., "krw": ..}}`
fn parse_price(body: &HashMap<String, SolPrice>) -> Result<SolPrice, Box<dyn Error + Send + Sync>> {
    body.get("solana")
        .copied()
        .ok_or_else(|| "price response has no solana entry".into())
}

#[async_trait]
impl PriceOracle for CoinGeckoOracle {
    async fn fetch_price(&self) -> Result<SolPrice, Box<dyn Error + Send + Sync>> {
        let body: HashMap<String, SolPrice> = self
            .client
            .get(self.request_url())
            .timeout(REQUEST_TIMEOUT)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;
        parse_price(&body)
    }
}
