use std::time::Duration;

use super::client::HttpClient;
use async_trait::async_trait;

pub struct BasicClient(reqwest::Client);

impl BasicClient {
    /// Builds a client whose requests fail after `timeout`.
    pub fn new(timeout: Duration) -> reqwest::Result<Self> {
        Ok(Self(reqwest::Client::builder().timeout(timeout).build()?))
    }
}

#[async_trait]
impl HttpClient for BasicClient {
    async fn execute(&self, req: reqwest::Request) -> reqwest::Result<reqwest::Response> {
        self.0.execute(req).await
    }
}
