//! HTTP market-data feed.
//!
//! Fetches the launchpad's token listing as JSON from `{base_url}/tokens`.
//! The endpoint may return either a bare array of tokens or an object
//! wrapping them under `tokens`. Auth, when configured, is sent as
//! `Authorization: Bearer {key}`.

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use rust_decimal::Decimal;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, warn};

use super::MarketData;
use crate::types::{AssetSnapshot, DataSourceError};

const FEED_NAME: &str = "http";

// ---------------------------------------------------------------------------
// API response types
// ---------------------------------------------------------------------------

/// One token as listed by the feed. Field names follow the launchpad API;
/// aliases cover the snake_case variant.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct FeedToken {
    #[serde(alias = "id")]
    address: String,
    name: String,
    price: Decimal,
    #[serde(default, alias = "volume_24h")]
    volume24h: Decimal,
    #[serde(default)]
    liquidity: Decimal,
    #[serde(default, alias = "price_change_24h")]
    price_change24h: Decimal,
}

impl From<FeedToken> for AssetSnapshot {
    fn from(t: FeedToken) -> Self {
        AssetSnapshot {
            id: t.address,
            name: t.name,
            price: t.price,
            volume_24h: t.volume24h,
            liquidity: t.liquidity,
            price_change_24h: t.price_change24h,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum FeedResponse {
    Bare(Vec<FeedToken>),
    Wrapped { tokens: Vec<FeedToken> },
}

/// Decode a token listing body into snapshots.
fn parse_token_list(body: &str) -> Result<Vec<AssetSnapshot>, DataSourceError> {
    let resp: FeedResponse =
        serde_json::from_str(body).map_err(|e| DataSourceError::Decode(e.to_string()))?;
    let tokens = match resp {
        FeedResponse::Bare(t) => t,
        FeedResponse::Wrapped { tokens } => tokens,
    };
    Ok(tokens.into_iter().map(AssetSnapshot::from).collect())
}

// ---------------------------------------------------------------------------
// Client
// ---------------------------------------------------------------------------

pub struct HttpMarketFeed {
    http: Client,
    base_url: String,
    api_key: Option<SecretString>,
}

impl HttpMarketFeed {
    pub fn new(base_url: &str, api_key: Option<SecretString>, timeout: Duration) -> Result<Self> {
        let http = Client::builder()
            .timeout(timeout)
            .user_agent("trader-agent/0.1.0")
            .build()
            .context("Failed to build HTTP client for market feed")?;

        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
        })
    }

    fn tokens_url(&self) -> String {
        format!("{}/tokens", self.base_url)
    }

    fn request_error(message: impl Into<String>) -> DataSourceError {
        DataSourceError::Request {
            source_name: FEED_NAME.to_string(),
            message: message.into(),
        }
    }
}

#[async_trait]
impl MarketData for HttpMarketFeed {
    async fn list_assets(&self) -> Result<Vec<AssetSnapshot>, DataSourceError> {
        let url = self.tokens_url();
        debug!(url = %url, "Fetching token listing");

        let mut req = self.http.get(&url);
        if let Some(key) = &self.api_key {
            req = req.bearer_auth(key.expose_secret());
        }

        let resp = req.send().await.map_err(|e| {
            if e.is_timeout() {
                Self::request_error(format!("timed out: {e}"))
            } else {
                Self::request_error(e.to_string())
            }
        })?;

        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            warn!(%status, "Token listing request rejected");
            return Err(Self::request_error(format!("HTTP {status}: {body}")));
        }

        let body = resp
            .text()
            .await
            .map_err(|e| Self::request_error(e.to_string()))?;
        let assets = parse_token_list(&body)?;
        debug!(count = assets.len(), "Token listing decoded");
        Ok(assets)
    }

    fn name(&self) -> &str {
        FEED_NAME
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_parse_bare_array() {
        let body = r#"[
            {"address":"0x1234","name":"AgentToken","price":0.5,
             "volume24h":5000,"liquidity":2000,"priceChange24h":15.5}
        ]"#;
        let assets = parse_token_list(body).unwrap();
        assert_eq!(assets.len(), 1);
        assert_eq!(assets[0].id, "0x1234");
        assert_eq!(assets[0].price, dec!(0.5));
        assert_eq!(assets[0].price_change_24h, dec!(15.5));
    }

    #[test]
    fn test_parse_wrapped_snake_case() {
        let body = r#"{"tokens":[
            {"id":"0xab","name":"Snake","price":1.25,
             "volume_24h":10,"liquidity":4000,"price_change_24h":-6}
        ]}"#;
        let assets = parse_token_list(body).unwrap();
        assert_eq!(assets[0].id, "0xab");
        assert_eq!(assets[0].volume_24h, dec!(10));
        assert_eq!(assets[0].price_change_24h, dec!(-6));
    }

    #[test]
    fn test_parse_missing_optional_fields() {
        let body = r#"[{"address":"0x1","name":"Bare","price":2}]"#;
        let assets = parse_token_list(body).unwrap();
        assert_eq!(assets[0].liquidity, Decimal::ZERO);
        assert_eq!(assets[0].price_change_24h, Decimal::ZERO);
    }

    #[test]
    fn test_parse_garbage_is_decode_error() {
        let err = parse_token_list("<html>maintenance</html>").unwrap_err();
        assert!(matches!(err, DataSourceError::Decode(_)));
    }

    #[test]
    fn test_url_trailing_slash() {
        let feed = HttpMarketFeed::new("https://feed.example.com/", None, Duration::from_secs(5)).unwrap();
        assert_eq!(feed.tokens_url(), "https://feed.example.com/tokens");
        assert_eq!(feed.name(), "http");
    }

    #[tokio::test]
    async fn test_unreachable_host_is_request_error() {
        let feed = HttpMarketFeed::new(
            "http://127.0.0.1:9",
            Some(SecretString::new("k".to_string())),
            Duration::from_secs(2),
        )
        .unwrap();
        let err = feed.list_assets().await.unwrap_err();
        assert!(matches!(err, DataSourceError::Request { .. }));
    }
}
