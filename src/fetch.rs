use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use crate::config::AppConfig;
use crate::error::FetchError;
use crate::http_cache::fetch_text;
use crate::http_client::http_client;
use crate::payload::{RawPayloads, parse_bootstrap_json, parse_fixtures_json};

/// Anything that can produce both raw payloads in one go.
pub trait PayloadSource: Send + Sync {
    fn fetch(&self) -> Result<Arc<RawPayloads>, FetchError>;
}

/// Blocking fetch of the bootstrap-static and fixtures endpoints.
#[derive(Debug, Clone)]
pub struct HttpSource {
    bootstrap_url: String,
    fixtures_url: String,
    timeout: Duration,
    revalidate: bool,
}

impl HttpSource {
    pub fn new(cfg: &AppConfig) -> Self {
        Self {
            bootstrap_url: cfg.bootstrap_url.clone(),
            fixtures_url: cfg.fixtures_url.clone(),
            timeout: cfg.http_timeout,
            revalidate: cfg.disk_cache,
        }
    }
}

impl PayloadSource for HttpSource {
    fn fetch(&self) -> Result<Arc<RawPayloads>, FetchError> {
        let client = http_client(self.timeout)?;

        let body = fetch_text(client, &self.bootstrap_url, self.revalidate)?;
        let bootstrap = parse_bootstrap_json(&body).map_err(|source| FetchError::Decode {
            url: self.bootstrap_url.clone(),
            source,
        })?;

        let body = fetch_text(client, &self.fixtures_url, self.revalidate)?;
        let fixtures = parse_fixtures_json(&body).map_err(|source| FetchError::Decode {
            url: self.fixtures_url.clone(),
            source,
        })?;

        tracing::info!(
            teams = bootstrap.teams.len(),
            elements = bootstrap.elements.len(),
            fixtures = fixtures.len(),
            "fetched fpl payloads"
        );
        Ok(Arc::new(RawPayloads {
            bootstrap,
            fixtures,
        }))
    }
}

/// Memoizes a parameterless source for `ttl`. Failed fetches are not cached.
pub struct MemoizedSource<S> {
    inner: S,
    ttl: Duration,
    slot: Mutex<Option<(Instant, Arc<RawPayloads>)>>,
}

impl<S: PayloadSource> MemoizedSource<S> {
    pub fn new(inner: S, ttl: Duration) -> Self {
        Self {
            inner,
            ttl,
            slot: Mutex::new(None),
        }
    }

    /// Drop the memoized value so the next fetch goes upstream.
    pub fn invalidate(&self) {
        let mut slot = self.slot.lock().unwrap_or_else(|e| e.into_inner());
        *slot = None;
    }

    pub fn age(&self) -> Option<Duration> {
        let slot = self.slot.lock().unwrap_or_else(|e| e.into_inner());
        slot.as_ref().map(|(at, _)| at.elapsed())
    }
}

impl<S: PayloadSource> PayloadSource for MemoizedSource<S> {
    fn fetch(&self) -> Result<Arc<RawPayloads>, FetchError> {
        let mut slot = self.slot.lock().unwrap_or_else(|e| e.into_inner());
        if let Some((at, payloads)) = slot.as_ref() {
            if at.elapsed() < self.ttl {
                tracing::debug!("serving memoized payloads");
                return Ok(Arc::clone(payloads));
            }
        }
        let payloads = self.inner.fetch()?;
        *slot = Some((Instant::now(), Arc::clone(&payloads)));
        Ok(payloads)
    }
}

impl<S: PayloadSource + ?Sized> PayloadSource for Arc<S> {
    fn fetch(&self) -> Result<Arc<RawPayloads>, FetchError> {
        (**self).fetch()
    }
}

#[cfg(test)]
mod tests {
    use std::io::{Read, Write};
    use std::net::TcpListener;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::thread;

    use super::*;

    struct CountingSource {
        calls: AtomicUsize,
        fail: bool,
    }

    impl CountingSource {
        fn new(fail: bool) -> Self {
            Self {
                calls: AtomicUsize::new(0),
                fail,
            }
        }
    }

    impl PayloadSource for CountingSource {
        fn fetch(&self) -> Result<Arc<RawPayloads>, FetchError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                return Err(FetchError::Status {
                    url: "http://test".to_string(),
                    status: 503,
                });
            }
            Ok(Arc::new(RawPayloads::default()))
        }
    }

    /// Serves one canned `(path, status, body)` response per connection, in
    /// order, then stops. Returns the base url.
    fn serve(responses: Vec<(&'static str, u16, &'static str)>) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        thread::spawn(move || {
            for (expected_path, status, body) in responses {
                let Ok((mut stream, _)) = listener.accept() else {
                    return;
                };
                let mut request = Vec::new();
                let mut buf = [0u8; 1024];
                while !request.windows(4).any(|w| w == b"\r\n\r\n") {
                    match stream.read(&mut buf) {
                        Ok(0) | Err(_) => break,
                        Ok(n) => request.extend_from_slice(&buf[..n]),
                    }
                }
                let head = String::from_utf8_lossy(&request);
                assert!(
                    head.starts_with(&format!("GET {expected_path} ")),
                    "unexpected request: {head}"
                );
                let response = format!(
                    "HTTP/1.1 {status} X\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
                    body.len()
                );
                let _ = stream.write_all(response.as_bytes());
            }
        });
        format!("http://{addr}")
    }

    fn http_source(base: &str) -> HttpSource {
        HttpSource::new(&AppConfig {
            bootstrap_url: format!("{base}/bootstrap-static/"),
            fixtures_url: format!("{base}/fixtures/"),
            ..AppConfig::default()
        })
    }

    #[test]
    fn non_success_status_is_a_status_error() {
        let base = serve(vec![("/bootstrap-static/", 503, "")]);
        match http_source(&base).fetch() {
            Err(FetchError::Status { url, status }) => {
                assert_eq!(status, 503);
                assert!(url.ends_with("/bootstrap-static/"));
            }
            other => panic!("expected status error, got {other:?}"),
        }
    }

    #[test]
    fn non_json_body_is_a_decode_error() {
        let base = serve(vec![(
            "/bootstrap-static/",
            200,
            "<html>502 Bad Gateway</html>",
        )]);
        match http_source(&base).fetch() {
            Err(FetchError::Decode { url, .. }) => assert!(url.ends_with("/bootstrap-static/")),
            other => panic!("expected decode error, got {other:?}"),
        }
    }

    #[test]
    fn second_endpoint_failure_yields_no_payload() {
        let base = serve(vec![
            ("/bootstrap-static/", 200, r#"{"teams": [], "elements": []}"#),
            ("/fixtures/", 503, ""),
        ]);
        let src = MemoizedSource::new(http_source(&base), Duration::from_secs(60));
        match src.fetch() {
            Err(FetchError::Status { url, status }) => {
                assert_eq!(status, 503);
                assert!(url.ends_with("/fixtures/"));
            }
            other => panic!("expected status error, got {other:?}"),
        }
        assert!(src.age().is_none());
    }

    #[test]
    fn both_endpoints_ok_yields_payloads() {
        let base = serve(vec![
            (
                "/bootstrap-static/",
                200,
                r#"{"teams": [{"id": 1, "name": "Arsenal", "short_name": "ARS"}], "elements": []}"#,
            ),
            ("/fixtures/", 200, r#"[{"team_h": 1, "team_a": 2}]"#),
        ]);
        let raw = http_source(&base).fetch().unwrap();
        assert_eq!(raw.bootstrap.teams.len(), 1);
        assert_eq!(raw.fixtures.len(), 1);
    }

    #[test]
    fn memoized_source_fetches_once_within_ttl() {
        let src = MemoizedSource::new(CountingSource::new(false), Duration::from_secs(60));
        let a = src.fetch().unwrap();
        let b = src.fetch().unwrap();
        assert!(Arc::ptr_eq(&a, &b));
        assert_eq!(src.inner.calls.load(Ordering::SeqCst), 1);
        assert!(src.age().is_some());
    }

    #[test]
    fn invalidate_forces_refetch() {
        let src = MemoizedSource::new(CountingSource::new(false), Duration::from_secs(60));
        src.fetch().unwrap();
        src.invalidate();
        assert!(src.age().is_none());
        src.fetch().unwrap();
        assert_eq!(src.inner.calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn zero_ttl_never_memoizes() {
        let src = MemoizedSource::new(CountingSource::new(false), Duration::ZERO);
        src.fetch().unwrap();
        src.fetch().unwrap();
        assert_eq!(src.inner.calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn failures_are_not_cached() {
        let src = MemoizedSource::new(CountingSource::new(true), Duration::from_secs(60));
        assert!(src.fetch().is_err());
        assert!(src.fetch().is_err());
        assert!(src.age().is_none());
        assert_eq!(src.inner.calls.load(Ordering::SeqCst), 2);
    }
}
