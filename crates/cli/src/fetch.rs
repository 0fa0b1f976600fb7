//! Source acquisition: read a table's text from a local file or an HTTP URL.
//!
//! Local files must be UTF-8 (a leading BOM is fine). HTTP bodies are
//! decoded lossily, since county portals occasionally serve stray Latin-1
//! bytes in free-text columns.

use std::path::{Path, PathBuf};
use std::thread;
use std::time::Duration;

use parceljoin_join::TableKind;
use url::Url;

use crate::exit_codes::EXIT_SOURCE;
use crate::CliError;

pub const DEFAULT_TIMEOUT_SECS: u64 = 90;
pub const DEFAULT_RETRIES: u32 = 3;
/// Upper bound on any single retry wait, `Retry-After` included.
const MAX_RETRY_WAIT_SECS: u64 = 60;
const USER_AGENT: &str = concat!("parceljoin/", env!("CARGO_PKG_VERSION"));

/// Where a table comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Source {
    Path(PathBuf),
    Url(Url),
}

impl std::fmt::Display for Source {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Path(p) => write!(f, "{}", p.display()),
            Self::Url(u) => write!(f, "{u}"),
        }
    }
}

/// clap value parser for `--*-url`: absolute http(s) URLs only.
pub fn parse_http_url(s: &str) -> Result<Url, String> {
    let url = Url::parse(s).map_err(|e| format!("invalid URL '{s}': {e}"))?;
    match url.scheme() {
        "http" | "https" => Ok(url),
        other => Err(format!("unsupported URL scheme '{other}' (expected http or https)")),
    }
}

fn source_err(kind: TableKind, msg: impl std::fmt::Display) -> CliError {
    CliError {
        code: EXIT_SOURCE,
        message: format!("{kind}: {msg}"),
        hint: None,
    }
}

/// Blocking HTTP client with retry and backoff; also reads local files.
pub struct Fetcher {
    http: reqwest::blocking::Client,
    retries: u32,
}

impl Fetcher {
    pub fn new(timeout: Duration, retries: u32) -> Result<Self, CliError> {
        let http = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| CliError::general(format!("cannot build HTTP client: {e}")))?;
        Ok(Self { http, retries })
    }

    /// Text of the table at `source`, BOM stripped.
    pub fn fetch_text(&self, kind: TableKind, source: &Source) -> Result<String, CliError> {
        let text = match source {
            Source::Path(path) => read_file(kind, path)?,
            Source::Url(url) => self.get_with_retry(kind, url)?,
        };
        log::info!("{kind}: read {} bytes from {source}", text.len());
        Ok(strip_bom(text))
    }

    /// GET with retry + exponential backoff. 429 and 5xx responses and
    /// transport errors are retried; any other non-2xx fails immediately.
    fn get_with_retry(&self, kind: TableKind, url: &Url) -> Result<String, CliError> {
        let mut backoff_secs = 1u64;
        let mut attempt = 0u32;

        loop {
            let wait = match self.http.get(url.clone()).send() {
                Ok(resp) => {
                    let status = resp.status().as_u16();

                    if resp.status().is_success() {
                        let bytes = resp
                            .bytes()
                            .map_err(|e| source_err(kind, format!("failed to read response body: {e}")))?;
                        return Ok(String::from_utf8_lossy(&bytes).into_owned());
                    }

                    if status != 429 && status < 500 {
                        return Err(source_err(kind, format!("GET {url} returned HTTP {status}")));
                    }

                    if attempt == self.retries {
                        return Err(source_err(
                            kind,
                            format!("GET {url} returned HTTP {status} after {} attempts", attempt + 1),
                        ));
                    }

                    let retry_after = if status == 429 {
                        resp.headers()
                            .get("retry-after")
                            .and_then(|v| v.to_str().ok())
                            .and_then(|v| v.trim().parse::<u64>().ok())
                    } else {
                        None
                    };
                    let wait = retry_wait(retry_after, backoff_secs);
                    log::warn!(
                        "{kind}: retry {}/{} in {}s (HTTP {})",
                        attempt + 1,
                        self.retries,
                        wait,
                        status,
                    );
                    wait
                }
                Err(e) => {
                    if attempt == self.retries {
                        return Err(source_err(
                            kind,
                            format!("GET {url} failed after {} attempts: {e}", attempt + 1),
                        ));
                    }
                    let wait = retry_wait(None, backoff_secs);
                    log::warn!(
                        "{kind}: retry {}/{} in {}s ({})",
                        attempt + 1,
                        self.retries,
                        wait,
                        e,
                    );
                    wait
                }
            };

            thread::sleep(Duration::from_secs(wait));
            backoff_secs = backoff_secs.saturating_mul(2);
            attempt += 1;
        }
    }
}

/// Seconds to wait before the next attempt: the server's `Retry-After` if
/// given, else the current backoff, capped at [`MAX_RETRY_WAIT_SECS`].
fn retry_wait(retry_after: Option<u64>, backoff_secs: u64) -> u64 {
    retry_after.unwrap_or(backoff_secs).min(MAX_RETRY_WAIT_SECS)
}

fn read_file(kind: TableKind, path: &Path) -> Result<String, CliError> {
    let bytes = std::fs::read(path)
        .map_err(|e| source_err(kind, format!("cannot read {}: {e}", path.display())))?;
    String::from_utf8(bytes).map_err(|e| {
        source_err(kind, format!("{} is not valid UTF-8: {e}", path.display()))
            .with_hint("re-export the file as UTF-8 CSV")
    })
}

fn strip_bom(text: String) -> String {
    match text.strip_prefix('\u{feff}') {
        Some(rest) => rest.to_string(),
        None => text,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::prelude::*;

    fn fetcher(retries: u32) -> Fetcher {
        Fetcher::new(Duration::from_secs(5), retries).unwrap()
    }

    fn url(server: &MockServer, path: &str) -> Source {
        Source::Url(Url::parse(&server.url(path)).unwrap())
    }

    #[test]
    fn test_url_parser_schemes() {
        assert!(parse_http_url("https://example.org/roll.csv").is_ok());
        assert!(parse_http_url("http://localhost:8080/x").is_ok());
        assert!(parse_http_url("ftp://example.org/roll.csv").is_err());
        assert!(parse_http_url("roll.csv").is_err());
    }

    #[test]
    fn test_http_success_strips_bom() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(GET).path("/roll.csv");
            then.status(200).body("\u{feff}folio,address\n01-1,1 MAIN ST\n");
        });

        let text = fetcher(0)
            .fetch_text(TableKind::Properties, &url(&server, "/roll.csv"))
            .unwrap();

        mock.assert();
        assert_eq!(text, "folio,address\n01-1,1 MAIN ST\n");
    }

    #[test]
    fn test_http_invalid_utf8_is_replaced() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET).path("/records.csv");
            then.status(200).body(b"doc_type\nMORTGAGE \xe9\n".to_vec());
        });

        let text = fetcher(0)
            .fetch_text(TableKind::Mortgages, &url(&server, "/records.csv"))
            .unwrap();
        assert!(text.starts_with("doc_type\nMORTGAGE "));
        assert!(text.contains('\u{fffd}'));
    }

    #[test]
    fn test_http_404_fails_without_retry() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(GET).path("/missing.csv");
            then.status(404).body("not found");
        });

        let err = fetcher(3)
            .fetch_text(TableKind::Properties, &url(&server, "/missing.csv"))
            .unwrap_err();

        assert_eq!(err.code, EXIT_SOURCE);
        assert!(err.message.contains("HTTP 404"), "message: {}", err.message);
        mock.assert_calls(1);
    }

    #[test]
    fn test_retry_on_429_exhausted() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(GET).path("/busy.csv");
            then.status(429).header("retry-after", "0");
        });

        let err = fetcher(2)
            .fetch_text(TableKind::Mortgages, &url(&server, "/busy.csv"))
            .unwrap_err();

        assert_eq!(err.code, EXIT_SOURCE);
        assert!(err.message.starts_with("mortgages:"), "message: {}", err.message);
        assert!(err.message.contains("after 3 attempts"), "message: {}", err.message);
        // 1 initial + 2 retries
        mock.assert_calls(3);
    }

    #[test]
    fn test_retry_wait_is_capped() {
        assert_eq!(retry_wait(Some(0), 8), 0);
        assert_eq!(retry_wait(Some(5), 1), 5);
        assert_eq!(retry_wait(Some(86_400), 1), MAX_RETRY_WAIT_SECS);
        assert_eq!(retry_wait(None, 4), 4);
        assert_eq!(retry_wait(None, u64::MAX), MAX_RETRY_WAIT_SECS);

        let mut backoff = 1u64;
        for _ in 0..100 {
            backoff = backoff.saturating_mul(2);
        }
        assert_eq!(backoff, u64::MAX);
        assert_eq!(retry_wait(None, backoff), MAX_RETRY_WAIT_SECS);
    }

    #[test]
    fn test_5xx_with_no_retries() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(GET).path("/down.csv");
            then.status(503);
        });

        let err = fetcher(0)
            .fetch_text(TableKind::Properties, &url(&server, "/down.csv"))
            .unwrap_err();
        assert!(err.message.contains("HTTP 503"));
        mock.assert_calls(1);
    }

    #[test]
    fn test_file_source() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("roll.csv");
        std::fs::write(&path, "\u{feff}folio\n01-1\n").unwrap();

        let text = fetcher(0)
            .fetch_text(TableKind::Properties, &Source::Path(path))
            .unwrap();
        assert_eq!(text, "folio\n01-1\n");
    }

    #[test]
    fn test_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = fetcher(0)
            .fetch_text(TableKind::Properties, &Source::Path(dir.path().join("nope.csv")))
            .unwrap_err();
        assert_eq!(err.code, EXIT_SOURCE);
        assert!(err.message.contains("cannot read"));
    }

    #[test]
    fn test_non_utf8_file_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("latin1.csv");
        std::fs::write(&path, b"address\nCALLE \xd1\n").unwrap();

        let err = fetcher(0)
            .fetch_text(TableKind::Properties, &Source::Path(path))
            .unwrap_err();
        assert_eq!(err.code, EXIT_SOURCE);
        assert!(err.hint.is_some());
    }
}
