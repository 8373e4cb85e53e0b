//! HTTP transport with bounded waits
//!
//! Provider calls run on a worker thread; the caller waits at most the
//! call's timeout and then abandons the worker. Late results are dropped.

use super::SourceError;
use serde_json::Value;
use std::sync::mpsc;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

/// Fetches JSON documents by URL.
pub trait Transport: Send + Sync {
    fn get_json(&self, url: &str, timeout: Duration) -> Result<Value, SourceError>;
}

/// `Transport` backed by a blocking reqwest client.
pub struct HttpTransport {
    client: reqwest::blocking::Client,
}

impl HttpTransport {
    pub fn new() -> Result<Self, reqwest::Error> {
        let client = reqwest::blocking::Client::builder()
            .user_agent(concat!("wordscramble/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self { client })
    }
}

impl Transport for HttpTransport {
    fn get_json(&self, url: &str, timeout: Duration) -> Result<Value, SourceError> {
        let provider = host_of(url);
        let response = self
            .client
            .get(url)
            .header(reqwest::header::ACCEPT, "application/json")
            .timeout(timeout)
            .send()
            .map_err(|e| classify(&provider, timeout, e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(SourceError::ProviderError {
                provider,
                reason: format!("HTTP {}", status.as_u16()),
            });
        }

        response.json::<Value>().map_err(|e| classify(&provider, timeout, e))
    }
}

/// Run one transport call, giving up after `timeout`.
pub fn fetch_json(
    transport: &Arc<dyn Transport>,
    url: String,
    timeout: Duration,
) -> Result<Value, SourceError> {
    let (tx, rx) = mpsc::channel();
    let worker = Arc::clone(transport);
    let provider = host_of(&url);

    thread::spawn(move || {
        let result = worker.get_json(&url, timeout);
        // The caller may have stopped waiting
        let _ = tx.send(result);
    });

    match rx.recv_timeout(timeout) {
        Ok(result) => result,
        Err(mpsc::RecvTimeoutError::Timeout) => Err(SourceError::ProviderTimeout {
            provider,
            after: timeout,
        }),
        Err(mpsc::RecvTimeoutError::Disconnected) => Err(SourceError::ProviderError {
            provider,
            reason: "transport worker exited".to_string(),
        }),
    }
}

/// Host part of a URL, used to label provider errors.
pub fn host_of(url: &str) -> String {
    reqwest::Url::parse(url)
        .ok()
        .and_then(|u| u.host_str().map(str::to_string))
        .unwrap_or_else(|| url.to_string())
}

fn classify(provider: &str, timeout: Duration, e: reqwest::Error) -> SourceError {
    if e.is_timeout() {
        SourceError::ProviderTimeout {
            provider: provider.to_string(),
            after: timeout,
        }
    } else {
        SourceError::ProviderError {
            provider: provider.to_string(),
            reason: e.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::time::Instant;

    struct Fixed(Value);

    impl Transport for Fixed {
        fn get_json(&self, _url: &str, _timeout: Duration) -> Result<Value, SourceError> {
            Ok(self.0.clone())
        }
    }

    struct Stalled;

    impl Transport for Stalled {
        fn get_json(&self, _url: &str, _timeout: Duration) -> Result<Value, SourceError> {
            thread::sleep(Duration::from_secs(5));
            Ok(Value::Null)
        }
    }

    #[test]
    fn test_fetch_returns_transport_result() {
        let transport: Arc<dyn Transport> = Arc::new(Fixed(json!(["frog"])));
        let value = fetch_json(&transport, "https://example.com/x".to_string(), Duration::from_secs(1)).unwrap();
        assert_eq!(value, json!(["frog"]));
    }

    #[test]
    fn test_fetch_gives_up_after_timeout() {
        let transport: Arc<dyn Transport> = Arc::new(Stalled);
        let started = Instant::now();
        let result = fetch_json(&transport, "https://api.datamuse.com/words".to_string(), Duration::from_millis(50));
        assert!(started.elapsed() < Duration::from_secs(2));
        match result {
            Err(SourceError::ProviderTimeout { provider, after }) => {
                assert_eq!(provider, "api.datamuse.com");
                assert_eq!(after, Duration::from_millis(50));
            }
            other => panic!("expected timeout, got {:?}", other),
        }
    }

    #[test]
    fn test_host_of() {
        assert_eq!(host_of("https://api.dictionaryapi.dev/api/v2/entries/en/frog"), "api.dictionaryapi.dev");
        assert_eq!(host_of("not a url"), "not a url");
    }
}
