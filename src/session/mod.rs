//! Authenticated sessions against the customer portal.
//!
//! The metering API accepts the bearer token the portal's web client uses.
//! A [`SessionProvider`] yields that token as an [`AuthHeaders`] bundle; how
//! it was obtained (configured directly, or recovered from captured browser
//! traffic) is up to the implementation.

mod captured;
mod token;

pub use captured::CapturedTraffic;
pub use token::StaticToken;

use anyhow::{Context, Result};
use reqwest::header::{AUTHORIZATION, HeaderMap, HeaderValue};

/// Headers to send with every metering API request.
#[derive(Debug, Clone, Default)]
pub struct AuthHeaders(HeaderMap);

impl AuthHeaders {
    pub fn authorization(value: &str) -> Result<Self> {
        let mut value =
            HeaderValue::from_str(value).context("authorization is not a valid header value")?;
        value.set_sensitive(true);

        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, value);
        Ok(Self(headers))
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.0
    }

    pub fn into_inner(self) -> HeaderMap {
        self.0
    }
}

#[async_trait::async_trait]
pub trait SessionProvider: Send + Sync {
    async fn authorize(&self) -> Result<AuthHeaders>;
}
