use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, info};

use super::{AuthHeaders, SessionProvider};

/// Recovers the bearer token from a browser's captured network log.
///
/// The log is a JSON array of performance entries as exported by Chrome
/// DevTools. Each entry's `message` field is itself a JSON document whose
/// `message` object describes one network event. The first `Authorization`
/// value found in any event, at any depth, is used.
pub struct CapturedTraffic {
    path: PathBuf,
}

#[derive(Debug, Deserialize)]
struct LogEntry {
    message: String,
}

const AUTHORIZATION_KEY: &str = "Authorization";

impl CapturedTraffic {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    fn token_from_log(content: &str) -> Result<String> {
        let entries: Vec<LogEntry> =
            serde_json::from_str(content).context("traffic log is not a list of entries")?;

        for (index, entry) in entries.iter().enumerate() {
            let event: Value = match serde_json::from_str(&entry.message) {
                Ok(event) => event,
                Err(e) => {
                    debug!(index, error = %e, "Skipping unparseable log entry");
                    continue;
                }
            };
            if let Some(token) = find_string(&event["message"], AUTHORIZATION_KEY) {
                debug!(index, "Authorization found in traffic log");
                return Ok(token.to_string());
            }
        }

        bail!("no {AUTHORIZATION_KEY} header in {} log entries", entries.len())
    }
}

/// Depth-first search for the first string stored under `key`.
fn find_string<'v>(node: &'v Value, key: &str) -> Option<&'v str> {
    match node {
        Value::Array(items) => items.iter().find_map(|item| find_string(item, key)),
        Value::Object(map) => map
            .get(key)
            .and_then(Value::as_str)
            .or_else(|| map.values().find_map(|value| find_string(value, key))),
        _ => None,
    }
}

#[async_trait::async_trait]
impl SessionProvider for CapturedTraffic {
    async fn authorize(&self) -> Result<AuthHeaders> {
        let content = tokio::fs::read_to_string(&self.path)
            .await
            .with_context(|| format!("reading traffic log {}", self.path.display()))?;

        let token = Self::token_from_log(&content)?;
        info!(path = %self.path.display(), "Session token recovered from traffic log");
        AuthHeaders::authorization(&token)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::header::AUTHORIZATION;
    use serde_json::json;

    fn entry(message: Value) -> Value {
        json!({ "level": "INFO", "message": message.to_string(), "timestamp": 1 })
    }

    fn log(entries: Vec<Value>) -> String {
        Value::Array(entries).to_string()
    }

    #[test]
    fn test_find_string_nested() {
        let value = json!({
            "a": [1, {"b": {"Authorization": "Bearer deep"}}],
        });
        assert_eq!(find_string(&value, "Authorization"), Some("Bearer deep"));
        assert_eq!(find_string(&value, "Cookie"), None);
    }

    #[test]
    fn test_token_from_first_matching_entry() {
        let content = log(vec![
            entry(json!({"message": {"method": "Network.dataReceived", "params": {}}})),
            entry(json!({"message": {
                "method": "Network.requestWillBeSent",
                "params": {"request": {"headers": {"Authorization": "Bearer first"}}}
            }})),
            entry(json!({"message": {"params": {"headers": {"Authorization": "Bearer second"}}}})),
        ]);

        assert_eq!(CapturedTraffic::token_from_log(&content).unwrap(), "Bearer first");
    }

    #[test]
    fn test_unparseable_entries_are_skipped() {
        let content = log(vec![
            json!({"message": "{not json"}),
            entry(json!({"message": {"headers": {"Authorization": "Bearer ok"}}})),
        ]);
        assert_eq!(CapturedTraffic::token_from_log(&content).unwrap(), "Bearer ok");
    }

    #[test]
    fn test_missing_token_is_an_error() {
        let content = log(vec![entry(json!({"message": {"headers": {}}}))]);
        assert!(CapturedTraffic::token_from_log(&content).is_err());
        assert!(CapturedTraffic::token_from_log("{}").is_err());
    }

    #[tokio::test]
    async fn test_authorize_reads_file() {
        let path = std::env::temp_dir().join("sey_session_test_traffic.json");
        let content = log(vec![entry(
            json!({"message": {"headers": {"Authorization": "Bearer from-file"}}}),
        )]);
        std::fs::write(&path, content).unwrap();

        let auth = CapturedTraffic::new(&path).authorize().await.unwrap();
        assert_eq!(auth.headers()[AUTHORIZATION], "Bearer from-file");

        std::fs::remove_file(&path).unwrap();
    }
}
