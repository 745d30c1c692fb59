use crate::models::NewsHeadline;
use crate::Result;
use reqwest::Client;
use serde::Deserialize;

const SERP_API_BASE: &str = "https://serpapi.com";
const MAX_HEADLINES: usize = 5;

/// Client for SerpApi news search
#[derive(Clone)]
pub struct NewsClient {
    client: Client,
    base_url: String,
    api_key: String,
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    news_results: Vec<NewsResult>,
}

#[derive(Debug, Deserialize)]
struct NewsResult {
    title: String,
    #[serde(default)]
    date: Option<String>,
}

impl NewsClient {
    pub fn new(api_key: String) -> Self {
        Self::with_base_url(SERP_API_BASE, api_key)
    }

    pub fn with_base_url(base_url: &str, api_key: String) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
        }
    }

    /// Most recent headlines for a query, capped at 5
    /// Endpoint: GET /search.json?q={query}&tbm=nws&api_key={key}
    pub async fn latest_headlines(&self, query: &str) -> Result<Vec<NewsHeadline>> {
        let url = format!(
            "{}/search.json?q={}&tbm=nws&api_key={}",
            self.base_url, query, self.api_key
        );
        let response = self.client.get(&url).send().await?;

        if !response.status().is_success() {
            return Err(format!("news API error: {}", response.status()).into());
        }

        let body: SearchResponse = response.json().await?;
        let headlines = body
            .news_results
            .into_iter()
            .take(MAX_HEADLINES)
            .map(|item| NewsHeadline {
                title: item.title,
                published_at: item
                    .date
                    .unwrap_or_else(|| "No date information".to_string()),
            })
            .collect();

        Ok(headlines)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_headlines_capped_at_five() {
        let mut server = mockito::Server::new_async().await;
        let items: Vec<String> = (0..8)
            .map(|i| format!(r#"{{"title":"headline {}","date":"2024-10-0{}"}}"#, i, i + 1))
            .collect();
        let body = format!(r#"{{"news_results":[{}]}}"#, items.join(","));
        let _mock = server
            .mock("GET", "/search.json?q=btc&tbm=nws&api_key=k")
            .with_status(200)
            .with_body(body)
            .create_async()
            .await;

        let client = NewsClient::with_base_url(&server.url(), "k".to_string());
        let headlines = client.latest_headlines("btc").await.unwrap();
        assert_eq!(headlines.len(), 5);
        assert_eq!(headlines[0].title, "headline 0");
    }

    #[tokio::test]
    async fn test_missing_date_gets_placeholder() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", "/search.json?q=btc&tbm=nws&api_key=k")
            .with_status(200)
            .with_body(r#"{"news_results":[{"title":"undated story"}]}"#)
            .create_async()
            .await;

        let client = NewsClient::with_base_url(&server.url(), "k".to_string());
        let headlines = client.latest_headlines("btc").await.unwrap();
        assert_eq!(headlines[0].published_at, "No date information");
    }

    #[tokio::test]
    async fn test_no_results_key_is_empty_list() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", "/search.json?q=btc&tbm=nws&api_key=k")
            .with_status(200)
            .with_body(r#"{"search_metadata":{"status":"Success"}}"#)
            .create_async()
            .await;

        let client = NewsClient::with_base_url(&server.url(), "k".to_string());
        let headlines = client.latest_headlines("btc").await.unwrap();
        assert!(headlines.is_empty());
    }
}
