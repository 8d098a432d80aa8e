use async_trait::async_trait;
use reqwest::{Request, Response};

/// Executes requests against the metering backend.
///
/// Decorators such as [`SessionHeaders`](super::auth::SessionHeaders) wrap an
/// inner client to add authentication.
#[async_trait]
pub trait HttpClient: Send + Sync {
    async fn execute(&self, req: Request) -> reqwest::Result<Response>;
}
