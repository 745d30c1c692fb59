// Sentiment collection: fear & greed index plus news headlines.
// Both sources degrade independently; a failure becomes `None` in the
// snapshot instead of aborting the cycle.

use crate::api::{FearGreedClient, NewsClient};
use crate::models::SentimentSnapshot;

const NEWS_QUERY: &str = "btc";

pub struct SentimentCollector {
    fear_greed: FearGreedClient,
    /// None when no news API key is configured
    news: Option<NewsClient>,
}

impl SentimentCollector {
    pub fn new(fear_greed: FearGreedClient, news: Option<NewsClient>) -> Self {
        if news.is_none() {
            tracing::info!("No news API key configured, headlines disabled");
        }
        Self { fear_greed, news }
    }

    pub async fn collect(&self) -> SentimentSnapshot {
        let fear_greed = match self.fear_greed.latest().await {
            Ok(index) => {
                tracing::info!(
                    "Fear and Greed Index: {} ({})",
                    index.value,
                    index.classification
                );
                Some(index)
            }
            Err(e) => {
                tracing::warn!("Failed to fetch fear & greed index: {}", e);
                None
            }
        };

        let headlines = match &self.news {
            Some(client) => match client.latest_headlines(NEWS_QUERY).await {
                Ok(headlines) => {
                    tracing::info!("Fetched {} news headlines", headlines.len());
                    Some(headlines)
                }
                Err(e) => {
                    tracing::warn!("Failed to fetch news headlines: {}", e);
                    None
                }
            },
            None => None,
        };

        SentimentSnapshot {
            fear_greed,
            headlines,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_failed_sources_degrade_to_none() {
        let mut server = mockito::Server::new_async().await;
        let _fng = server
            .mock("GET", "/fng/?limit=1")
            .with_status(500)
            .create_async()
            .await;
        let _news = server
            .mock("GET", "/search.json?q=btc&tbm=nws&api_key=k")
            .with_status(500)
            .create_async()
            .await;

        let collector = SentimentCollector::new(
            FearGreedClient::with_base_url(&server.url()),
            Some(NewsClient::with_base_url(&server.url(), "k".to_string())),
        );
        let snapshot = collector.collect().await;
        assert!(snapshot.fear_greed.is_none());
        assert!(snapshot.headlines.is_none());
    }

    #[tokio::test]
    async fn test_sources_are_independent() {
        let mut server = mockito::Server::new_async().await;
        let _fng = server
            .mock("GET", "/fng/?limit=1")
            .with_status(200)
            .with_body(r#"{"data":[{"value":"25","value_classification":"Extreme Fear"}]}"#)
            .create_async()
            .await;
        let _news = server
            .mock("GET", "/search.json?q=btc&tbm=nws&api_key=k")
            .with_status(500)
            .create_async()
            .await;

        let collector = SentimentCollector::new(
            FearGreedClient::with_base_url(&server.url()),
            Some(NewsClient::with_base_url(&server.url(), "k".to_string())),
        );
        let snapshot = collector.collect().await;
        assert_eq!(snapshot.fear_greed.unwrap().value, 25);
        assert!(snapshot.headlines.is_none());
    }

    #[tokio::test]
    async fn test_without_news_key_headlines_are_none() {
        let mut server = mockito::Server::new_async().await;
        let _fng = server
            .mock("GET", "/fng/?limit=1")
            .with_status(200)
            .with_body(r#"{"data":[{"value":"50","value_classification":"Neutral"}]}"#)
            .create_async()
            .await;

        let collector =
            SentimentCollector::new(FearGreedClient::with_base_url(&server.url()), None);
        let snapshot = collector.collect().await;
        assert!(snapshot.fear_greed.is_some());
        assert!(snapshot.headlines.is_none());
    }
}
