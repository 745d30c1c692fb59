use crate::models::FearGreed;
use crate::Result;
use reqwest::Client;
use serde::Deserialize;

const FEAR_GREED_API_BASE: &str = "https://api.alternative.me";

/// Client for the alternative.me fear & greed index
#[derive(Clone)]
pub struct FearGreedClient {
    client: Client,
    base_url: String,
}

#[derive(Debug, Deserialize)]
struct FngResponse {
    data: Vec<FngEntry>,
}

#[derive(Debug, Deserialize)]
struct FngEntry {
    // the API reports the numeric value as a string
    value: String,
    value_classification: String,
}

impl FearGreedClient {
    pub fn new() -> Self {
        Self::with_base_url(FEAR_GREED_API_BASE)
    }

    pub fn with_base_url(base_url: &str) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    /// Latest index value and classification
    /// Endpoint: GET /fng/?limit=1
    pub async fn latest(&self) -> Result<FearGreed> {
        let url = format!("{}/fng/?limit=1", self.base_url);
        let response = self.client.get(&url).send().await?;

        if !response.status().is_success() {
            return Err(format!("fear & greed API error: {}", response.status()).into());
        }

        let body: FngResponse = response.json().await?;
        let entry = body
            .data
            .into_iter()
            .next()
            .ok_or("fear & greed API returned no data")?;

        Ok(FearGreed {
            value: entry.value.parse()?,
            classification: entry.value_classification,
        })
    }
}

impl Default for FearGreedClient {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_latest_parses_string_value() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", "/fng/?limit=1")
            .with_status(200)
            .with_body(
                r#"{"data":[{"value":"72","value_classification":"Greed","timestamp":"1700000000"}]}"#,
            )
            .create_async()
            .await;

        let client = FearGreedClient::with_base_url(&server.url());
        let index = client.latest().await.unwrap();
        assert_eq!(index.value, 72);
        assert_eq!(index.classification, "Greed");
    }

    #[tokio::test]
    async fn test_error_status_is_an_error() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", "/fng/?limit=1")
            .with_status(503)
            .create_async()
            .await;

        let client = FearGreedClient::with_base_url(&server.url());
        assert!(client.latest().await.is_err());
    }

    #[tokio::test]
    async fn test_empty_data_is_an_error() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", "/fng/?limit=1")
            .with_status(200)
            .with_body(r#"{"data":[]}"#)
            .create_async()
            .await;

        let client = FearGreedClient::with_base_url(&server.url());
        assert!(client.latest().await.is_err());
    }
}
