// Chart snapshot capture via WebDriver.
//
// Drives a headless Chrome session against the exchange's public full-chart
// page, adds the Bollinger and MACD studies through the page's own indicator
// menu, and screenshots the viewport. The element paths are tied to the
// page's current markup; when the page changes they break loudly and the
// error is handled at the scheduler level.

use crate::Result;
use anyhow::Context;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use fantoccini::{Client, ClientBuilder, Locator};
use std::time::Duration;

const INDICATOR_MENU_XPATH: &str =
    "/html/body/div[1]/div[2]/div[3]/span/div/div/div[1]/div/div/cq-menu[3]";
const BOLLINGER_ITEM_XPATH: &str = "/html/body/div[1]/div[2]/div[3]/span/div/div/div[1]/div/div/cq-menu[3]/cq-menu-dropdown/cq-scroll/cq-studies/cq-studies-content/cq-item[15]";
const MACD_ITEM_XPATH: &str = "/html/body/div[1]/div[2]/div[3]/span/div/div/div[1]/div/div/cq-menu[3]/cq-menu-dropdown/cq-scroll/cq-studies/cq-studies-content/cq-item[53]";

const PAGE_LOAD_WAIT: Duration = Duration::from_secs(2);
const MENU_WAIT: Duration = Duration::from_secs(2);
const RENDER_WAIT: Duration = Duration::from_secs(1);

pub struct ChartCapturer {
    webdriver_url: String,
    chart_url: String,
}

impl ChartCapturer {
    pub fn new(webdriver_url: String, chart_url: String) -> Self {
        Self {
            webdriver_url,
            chart_url,
        }
    }

    /// Render the chart with indicator overlays and return the screenshot as
    /// base64 PNG. The WebDriver session is closed on every path.
    pub async fn capture(&self) -> Result<String> {
        let mut caps = serde_json::Map::new();
        caps.insert(
            "goog:chromeOptions".to_string(),
            serde_json::json!({
                "args": ["--headless", "--disable-gpu", "--window-size=1920,1080"]
            }),
        );

        let client = ClientBuilder::native()
            .capabilities(caps)
            .connect(&self.webdriver_url)
            .await
            .context("failed to connect to WebDriver")?;

        let screenshot = self.render_and_screenshot(&client).await;

        // teardown happens whether or not the capture succeeded
        if let Err(e) = client.close().await {
            tracing::warn!("Failed to close WebDriver session: {}", e);
        }

        let png = screenshot?;
        tracing::info!("Chart screenshot captured ({} bytes)", png.len());
        Ok(BASE64.encode(png))
    }

    async fn render_and_screenshot(&self, client: &Client) -> Result<Vec<u8>> {
        client.goto(&self.chart_url).await?;
        tokio::time::sleep(PAGE_LOAD_WAIT).await;

        client.fullscreen_window().await?;

        // the menu closes after each selection, so it is reopened per study
        self.add_study(client, BOLLINGER_ITEM_XPATH).await?;
        self.add_study(client, MACD_ITEM_XPATH).await?;

        tokio::time::sleep(RENDER_WAIT).await;
        Ok(client.screenshot().await?)
    }

    async fn add_study(&self, client: &Client, item_xpath: &str) -> Result<()> {
        client
            .find(Locator::XPath(INDICATOR_MENU_XPATH))
            .await?
            .click()
            .await?;
        tokio::time::sleep(MENU_WAIT).await;
        client
            .find(Locator::XPath(item_xpath))
            .await?
            .click()
            .await?;
        Ok(())
    }
}
