use crate::fetch::client::HttpClient;
use crate::session::AuthHeaders;
use async_trait::async_trait;
use reqwest::header::HeaderMap;

/// An [`HttpClient`] wrapper that sends a session's header bundle with every
/// request, replacing any header of the same name.
pub struct SessionHeaders<C> {
    pub inner: C,
    headers: HeaderMap,
}

impl<C> SessionHeaders<C> {
    pub fn new(inner: C, auth: AuthHeaders) -> Self {
        Self {
            inner,
            headers: auth.into_inner(),
        }
    }

    fn apply(&self, req: &mut reqwest::Request) {
        for (name, value) in &self.headers {
            req.headers_mut().insert(name.clone(), value.clone());
        }
    }
}

#[async_trait]
impl<C: HttpClient> HttpClient for SessionHeaders<C> {
    async fn execute(&self, mut req: reqwest::Request) -> reqwest::Result<reqwest::Response> {
        self.apply(&mut req);
        self.inner.execute(req).await
    }
}
