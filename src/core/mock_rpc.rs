//! Mock RPC node for testing without real endpoints
//!
//! Each URL can be scripted to fail a number of times with a given message
//! before answering. Calls are counted per URL so tests can assert how the
//! retry and fallback layers walked the catalog.

use std::collections::HashMap;
use std::future::Future;
use std::sync::Mutex;

#[derive(Debug, Clone)]
struct Script {
    failures_left: u32,
    message: String,
}

/// Scripted RPC responses keyed by endpoint URL
#[derive(Debug, Default)]
pub struct MockRpc {
    scripts: Mutex<HashMap<String, Script>>,
    calls: Mutex<HashMap<String, u32>>,
}

impl MockRpc {
    /// Node that answers every call
    pub fn new() -> Self {
        Self::default()
    }

    /// Fail the next `times` calls to `url` with `message`
    pub fn fail_times(self, url: &str, times: u32, message: &str) -> Self {
        self.scripts.lock().unwrap().insert(
            url.to_string(),
            Script {
                failures_left: times,
                message: message.to_string(),
            },
        );
        self
    }

    pub fn calls(&self, url: &str) -> u32 {
        self.calls.lock().unwrap().get(url).copied().unwrap_or(0)
    }

    pub fn total_calls(&self) -> u32 {
        self.calls.lock().unwrap().values().sum()
    }

    /// Current slot as seen by `url`. Counts from 1 per URL.
    pub fn get_slot(&self, url: &str) -> impl Future<Output = Result<u64, String>> {
        let count = {
            let mut calls = self.calls.lock().unwrap();
            let entry = calls.entry(url.to_string()).or_insert(0);
            *entry += 1;
            *entry
        };

        let outcome = match self.scripts.lock().unwrap().get_mut(url) {
            Some(script) if script.failures_left > 0 => {
                script.failures_left -= 1;
                Err(script.message.clone())
            }
            _ => Ok(u64::from(count)),
        };

        async move { outcome }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_mock_answers_by_default() {
        let rpc = MockRpc::new();
        assert_eq!(rpc.get_slot("https://a").await, Ok(1));
        assert_eq!(rpc.get_slot("https://a").await, Ok(2));
        assert_eq!(rpc.calls("https://a"), 2);
    }

    #[tokio::test]
    async fn test_mock_scripted_failures() {
        let rpc = MockRpc::new().fail_times("https://a", 2, "timeout");
        assert_eq!(rpc.get_slot("https://a").await, Err("timeout".to_string()));
        assert_eq!(rpc.get_slot("https://a").await, Err("timeout".to_string()));
        assert_eq!(rpc.get_slot("https://a").await, Ok(3));
        assert_eq!(rpc.get_slot("https://b").await, Ok(1));
        assert_eq!(rpc.total_calls(), 4);
    }
}
