use anyhow::Result;

use super::{AuthHeaders, SessionProvider};

/// A session from a header value configured up front, e.g. `Bearer eyJ...`.
pub struct StaticToken {
    value: String,
}

impl StaticToken {
    pub fn new(value: impl Into<String>) -> Self {
        Self {
            value: value.into(),
        }
    }
}

#[async_trait::async_trait]
impl SessionProvider for StaticToken {
    async fn authorize(&self) -> Result<AuthHeaders> {
        AuthHeaders::authorization(&self.value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::header::AUTHORIZATION;

    #[tokio::test]
    async fn test_static_token() {
        let auth = StaticToken::new("Bearer t0k3n").authorize().await.unwrap();
        assert_eq!(auth.headers()[AUTHORIZATION], "Bearer t0k3n");
    }
}
