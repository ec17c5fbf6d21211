use std::time::Duration;

use reqwest::Client;
use thiserror::Error;

use crate::config::{FetchConfig, TrustPolicy};

/// Classified fetch failure. `cause_code` feeds the structured JSON error
/// body returned by the ingest endpoint.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("invalid image URL: {url}")]
    InvalidUrl { url: String },

    #[error("DNS resolution failed for {url}")]
    Dns {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("TLS certificate verification failed for {url}")]
    Tls {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("timed out fetching {url} after {attempts} attempts")]
    Timeout {
        url: String,
        attempts: u32,
        #[source]
        source: reqwest::Error,
    },

    #[error("image too large: {declared} bytes declared, maximum is {max}")]
    TooLarge { declared: u64, max: u64 },

    #[error("upstream returned HTTP {status} for {url}")]
    UpstreamStatus { status: u16, url: String },

    #[error("network error fetching {url}")]
    Network {
        url: String,
        #[source]
        source: reqwest::Error,
    },
}

impl FetchError {
    pub fn cause_code(&self) -> &'static str {
        match self {
            FetchError::InvalidUrl { .. } => "invalid_url",
            FetchError::Dns { .. } => "dns",
            FetchError::Tls { .. } => "tls",
            FetchError::Timeout { .. } => "timeout",
            FetchError::TooLarge { .. } => "too_large",
            FetchError::UpstreamStatus { .. } => "upstream_status",
            FetchError::Network { .. } => "network",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureClass {
    Dns,
    Tls,
    Timeout,
    Other,
}

/// Classify a transport error by walking its source chain. reqwest does
/// not expose DNS/TLS causes as variants, so this matches on the rendered
/// chain the way the underlying resolver and TLS stacks word them.
pub fn classify(err: &reqwest::Error) -> FailureClass {
    if err.is_timeout() {
        return FailureClass::Timeout;
    }

    let mut chain = String::new();
    let mut current: Option<&(dyn std::error::Error + 'static)> = Some(err);
    while let Some(e) = current {
        chain.push_str(&e.to_string().to_lowercase());
        chain.push('\n');
        current = e.source();
    }
    classify_text(&chain)
}

pub(crate) fn classify_text(chain: &str) -> FailureClass {
    if chain.contains("dns error")
        || chain.contains("failed to lookup address")
        || chain.contains("name or service not known")
        || chain.contains("no such host")
    {
        FailureClass::Dns
    } else if chain.contains("certificate")
        || chain.contains("unknownissuer")
        || chain.contains("self signed")
        || chain.contains("handshake failure")
    {
        FailureClass::Tls
    } else if chain.contains("timed out") || chain.contains("timeout") {
        FailureClass::Timeout
    } else {
        FailureClass::Other
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Decision {
    Fail,
    RetryVerified,
    RetryInsecure,
}

/// Retry policy for one classified transport failure.
/// - DNS never retries.
/// - TLS retries only by switching to the insecure client, and only for
///   allow-listed hosts; a second TLS failure on that client is final.
/// - Timeout and generic errors retry until the budget is spent.
pub(crate) fn decide(
    class: FailureClass,
    attempt: u32,
    retries: u32,
    insecure_allowed: bool,
    already_insecure: bool,
) -> Decision {
    match class {
        FailureClass::Dns => Decision::Fail,
        FailureClass::Tls => {
            if already_insecure || !insecure_allowed {
                Decision::Fail
            } else {
                Decision::RetryInsecure
            }
        }
        FailureClass::Timeout | FailureClass::Other => {
            if attempt < retries {
                Decision::RetryVerified
            } else {
                Decision::Fail
            }
        }
    }
}

pub(crate) fn backoff_delay(attempt: u32, step: Duration) -> Duration {
    step * attempt
}

/// The three preconfigured reqwest clients the pipeline picks between:
/// certificate-verifying (default), verification-disabled (allow-listed
/// hosts only) and proxy-bypassing (direct fallback after a 5xx).
pub struct FetchClients {
    verified: Client,
    insecure: Client,
    direct: Client,
}

impl FetchClients {
    pub fn new(cfg: &FetchConfig) -> Result<Self, String> {
        let verified = Client::builder()
            .connect_timeout(cfg.timeout)
            .build()
            .map_err(|e| format!("Failed to build HTTP client: {}", e))?;
        let insecure = Client::builder()
            .connect_timeout(cfg.timeout)
            .danger_accept_invalid_certs(true)
            .build()
            .map_err(|e| format!("Failed to build insecure HTTP client: {}", e))?;
        let direct = Client::builder()
            .connect_timeout(cfg.timeout)
            .no_proxy()
            .build()
            .map_err(|e| format!("Failed to build direct HTTP client: {}", e))?;

        Ok(FetchClients {
            verified,
            insecure,
            direct,
        })
    }
}

pub struct FetchedImage {
    pub bytes: Vec<u8>,
    pub content_type: Option<String>,
}

/// Size gate applied twice: to the declared content-length before the
/// body download, and to the buffered payload afterwards (servers that
/// omit the header are still bounded). A missing length passes the first
/// gate only.
pub(crate) fn over_length_cap(length: Option<u64>, max: u64) -> bool {
    matches!(length, Some(l) if l > max)
}

async fn read_body(
    response: reqwest::Response,
    cfg: &FetchConfig,
    url: &str,
) -> Result<FetchedImage, FetchError> {
    if over_length_cap(response.content_length(), cfg.max_content_length) {
        return Err(FetchError::TooLarge {
            declared: response.content_length().unwrap_or_default(),
            max: cfg.max_content_length,
        });
    }

    let content_type = response
        .headers()
        .get(reqwest::header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(|s| s.to_string());

    let bytes = response.bytes().await.map_err(|e| FetchError::Network {
        url: url.to_string(),
        source: e,
    })?;

    if over_length_cap(Some(bytes.len() as u64), cfg.max_content_length) {
        return Err(FetchError::TooLarge {
            declared: bytes.len() as u64,
            max: cfg.max_content_length,
        });
    }

    Ok(FetchedImage {
        bytes: bytes.to_vec(),
        content_type,
    })
}

/// Fetch an external image with the configured retry budget. Every failed
/// attempt is logged with its classified cause before the loop moves on.
pub async fn fetch_external_image(
    clients: &FetchClients,
    cfg: &FetchConfig,
    trust: &TrustPolicy,
    url: &str,
) -> Result<FetchedImage, FetchError> {
    let parsed = reqwest::Url::parse(url).map_err(|_| FetchError::InvalidUrl {
        url: url.to_string(),
    })?;
    let host = parsed
        .host_str()
        .ok_or_else(|| FetchError::InvalidUrl {
            url: url.to_string(),
        })?
        .to_string();

    let mut insecure = false;
    let mut direct_tried = false;
    let mut attempt: u32 = 0;

    loop {
        if attempt > 0 {
            tokio::time::sleep(backoff_delay(attempt, cfg.backoff_step)).await;
        }

        let client = if insecure {
            &clients.insecure
        } else {
            &clients.verified
        };

        tracing::info!(
            "Fetching external image: url={}, attempt={}, insecure={}",
            url,
            attempt + 1,
            insecure
        );

        let result = client.get(url).timeout(cfg.timeout).send().await;

        match result {
            Ok(response) => {
                let status = response.status();

                if status.is_success() {
                    return read_body(response, cfg, url).await;
                }

                // One direct (proxy-bypassing) retry after a server error,
                // for hosts explicitly allowed to use it
                if status.is_server_error() && !direct_tried && trust.allows_direct_fallback(&host)
                {
                    direct_tried = true;
                    tracing::warn!(
                        "Upstream {} for {}, retrying once over direct connection",
                        status,
                        url
                    );
                    if let Ok(direct_response) =
                        clients.direct.get(url).timeout(cfg.timeout).send().await
                    {
                        if direct_response.status().is_success() {
                            return read_body(direct_response, cfg, url).await;
                        }
                    }
                }

                if status.is_server_error() && attempt < cfg.retries {
                    tracing::warn!(
                        "Upstream {} for {} on attempt {}, retrying",
                        status,
                        url,
                        attempt + 1
                    );
                    attempt += 1;
                    continue;
                }

                return Err(FetchError::UpstreamStatus {
                    status: status.as_u16(),
                    url: url.to_string(),
                });
            }
            Err(e) => {
                let class = classify(&e);
                tracing::error!(
                    "Fetch attempt failed: url={}, attempt={}, cause={:?}, error={}",
                    url,
                    attempt + 1,
                    class,
                    e
                );

                match decide(class, attempt, cfg.retries, trust.allows_insecure(&host), insecure) {
                    Decision::Fail => {
                        return Err(match class {
                            FailureClass::Dns => FetchError::Dns {
                                url: url.to_string(),
                                source: e,
                            },
                            FailureClass::Tls => FetchError::Tls {
                                url: url.to_string(),
                                source: e,
                            },
                            FailureClass::Timeout => FetchError::Timeout {
                                url: url.to_string(),
                                attempts: attempt + 1,
                                source: e,
                            },
                            FailureClass::Other => FetchError::Network {
                                url: url.to_string(),
                                source: e,
                            },
                        });
                    }
                    Decision::RetryInsecure => {
                        tracing::warn!(
                            "Switching to certificate-exempt client for allow-listed host {}",
                            host
                        );
                        insecure = true;
                        attempt += 1;
                    }
                    Decision::RetryVerified => {
                        attempt += 1;
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dns_failures_never_retry() {
        // A DNS failure on the very first attempt is final: one call total.
        assert_eq!(decide(FailureClass::Dns, 0, 2, true, false), Decision::Fail);
    }

    #[test]
    fn timeouts_retry_until_the_budget_is_spent() {
        let retries = 2;
        let mut calls = 0;
        for attempt in 0.. {
            calls += 1;
            match decide(FailureClass::Timeout, attempt, retries, false, false) {
                Decision::Fail => break,
                _ => continue,
            }
        }
        // retries + 1 total invocations
        assert_eq!(calls, 3);
    }

    #[test]
    fn tls_fails_unless_the_host_is_allow_listed() {
        assert_eq!(decide(FailureClass::Tls, 0, 2, false, false), Decision::Fail);
        assert_eq!(
            decide(FailureClass::Tls, 0, 2, true, false),
            Decision::RetryInsecure
        );
        // A TLS failure on the insecure client itself is final
        assert_eq!(decide(FailureClass::Tls, 1, 2, true, true), Decision::Fail);
    }

    #[test]
    fn generic_errors_respect_the_budget() {
        assert_eq!(
            decide(FailureClass::Other, 0, 2, false, false),
            Decision::RetryVerified
        );
        assert_eq!(decide(FailureClass::Other, 2, 2, false, false), Decision::Fail);
    }

    #[test]
    fn backoff_grows_linearly_with_attempts() {
        let step = Duration::from_millis(500);
        assert_eq!(backoff_delay(1, step), Duration::from_millis(500));
        assert_eq!(backoff_delay(2, step), Duration::from_millis(1000));
        assert!(backoff_delay(2, step) > backoff_delay(1, step));
    }

    #[test]
    fn declared_lengths_over_the_cap_are_rejected_before_download() {
        let max = 20 * 1024 * 1024;
        assert!(over_length_cap(Some(max + 1), max));
        // At the limit is still acceptable
        assert!(!over_length_cap(Some(max), max));
        assert!(!over_length_cap(Some(0), max));
    }

    #[test]
    fn missing_declared_length_defers_to_the_buffered_bound() {
        let max = 1024;
        // No header: the pre-download gate passes...
        assert!(!over_length_cap(None, max));
        // ...and the same gate over the buffered payload still catches it
        assert!(over_length_cap(Some(4096), max));
    }

    #[test]
    fn transport_chains_are_classified() {
        assert_eq!(
            classify_text("error sending request\ndns error: failed to lookup address information"),
            FailureClass::Dns
        );
        assert_eq!(
            classify_text("error sending request\ninvalid peer certificate: unknownissuer"),
            FailureClass::Tls
        );
        assert_eq!(
            classify_text("connection closed\noperation timed out"),
            FailureClass::Timeout
        );
        assert_eq!(classify_text("connection reset by peer"), FailureClass::Other);
    }
}
