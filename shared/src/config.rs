use std::collections::HashSet;
use std::env;
use std::time::Duration;

const DEFAULT_FETCH_TIMEOUT_SECS: u64 = 60;
const DEFAULT_FETCH_RETRIES: u32 = 2;
const DEFAULT_BACKOFF_STEP_MS: u64 = 500;
const DEFAULT_MAX_IMAGE_BYTES: u64 = 20 * 1024 * 1024;
const DEFAULT_LARGE_IMAGE_BYTES: usize = 10 * 1024 * 1024;

/// Limits for the external image fetch loop
#[derive(Debug, Clone)]
pub struct FetchConfig {
    /// Per-attempt timeout, not an overall budget
    pub timeout: Duration,
    /// Extra attempts after the first
    pub retries: u32,
    /// Backoff between attempts is step * attempt_number
    pub backoff_step: Duration,
    /// Declared content-length above this is rejected before download
    pub max_content_length: u64,
}

/// Hostname trust overrides for the image fetch. Kept as an explicit
/// policy table instead of conditionals scattered through the client code.
#[derive(Debug, Clone, Default)]
pub struct TrustPolicy {
    insecure_hosts: HashSet<String>,
    direct_fallback_hosts: HashSet<String>,
    allow_insecure_in_production: bool,
    production: bool,
}

impl TrustPolicy {
    pub fn new(
        insecure_hosts: HashSet<String>,
        direct_fallback_hosts: HashSet<String>,
        allow_insecure_in_production: bool,
        production: bool,
    ) -> Self {
        TrustPolicy {
            insecure_hosts,
            direct_fallback_hosts,
            allow_insecure_in_production,
            production,
        }
    }

    /// Whether certificate verification may be skipped for this host.
    /// In production the env flag must also be set.
    pub fn allows_insecure(&self, host: &str) -> bool {
        let listed = self.insecure_hosts.contains(&host.to_lowercase());
        if self.production {
            listed && self.allow_insecure_in_production
        } else {
            listed
        }
    }

    /// Whether a proxy-bypassing direct retry is allowed after a 5xx.
    pub fn allows_direct_fallback(&self, host: &str) -> bool {
        self.direct_fallback_hosts.contains(&host.to_lowercase())
    }
}

/// Size-driven transform plan parameters
#[derive(Debug, Clone)]
pub struct TransformConfig {
    /// Payloads above this get the aggressive downscale + re-encode
    pub large_image_bytes: usize,
    pub large_max_dimension: u32,
    pub default_max_dimension: u32,
    pub large_quality: u8,
    pub default_quality: u8,
}

#[derive(Debug, Clone)]
pub struct PipelineConfig {
    pub table_name: String,
    pub bucket_name: String,
    /// Base URL the stored objects are served from (the /proxy-image route)
    pub public_base_url: String,
    pub fetch: FetchConfig,
    pub trust: TrustPolicy,
    pub transform: TransformConfig,
}

fn env_u64(name: &str, default: u64) -> u64 {
    env::var(name)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

fn env_flag(name: &str) -> bool {
    matches!(
        env::var(name).unwrap_or_default().to_lowercase().as_str(),
        "1" | "true" | "yes"
    )
}

pub(crate) fn parse_host_list(raw: &str) -> HashSet<String> {
    raw.split(',')
        .map(|h| h.trim().to_lowercase())
        .filter(|h| !h.is_empty())
        .collect()
}

impl PipelineConfig {
    pub fn from_env() -> Self {
        let insecure_hosts =
            parse_host_list(&env::var("INSECURE_TLS_HOSTS").unwrap_or_default());
        let direct_fallback_hosts =
            parse_host_list(&env::var("DIRECT_FALLBACK_HOSTS").unwrap_or_default());
        let production = env::var("ENVIRONMENT")
            .map(|v| v.eq_ignore_ascii_case("production"))
            .unwrap_or(false);

        PipelineConfig {
            table_name: env::var("TABLE_NAME").unwrap_or_else(|_| "repvendas".to_string()),
            bucket_name: env::var("S3_BUCKET_NAME")
                .unwrap_or_else(|_| "repvendas-images".to_string()),
            public_base_url: env::var("PUBLIC_IMAGE_BASE_URL")
                .unwrap_or_else(|_| "https://api.repvendas.app/proxy-image".to_string()),
            fetch: FetchConfig {
                timeout: Duration::from_secs(env_u64(
                    "FETCH_TIMEOUT_SECS",
                    DEFAULT_FETCH_TIMEOUT_SECS,
                )),
                retries: env_u64("FETCH_RETRIES", DEFAULT_FETCH_RETRIES as u64) as u32,
                backoff_step: Duration::from_millis(DEFAULT_BACKOFF_STEP_MS),
                max_content_length: env_u64("MAX_IMAGE_BYTES", DEFAULT_MAX_IMAGE_BYTES),
            },
            trust: TrustPolicy::new(
                insecure_hosts,
                direct_fallback_hosts,
                env_flag("ALLOW_INSECURE_TLS"),
                production,
            ),
            transform: TransformConfig {
                large_image_bytes: env_u64(
                    "LARGE_IMAGE_THRESHOLD_BYTES",
                    DEFAULT_LARGE_IMAGE_BYTES as u64,
                ) as usize,
                large_max_dimension: 800,
                default_max_dimension: 1200,
                large_quality: 70,
                default_quality: 85,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn policy(insecure: &[&str], direct: &[&str], allow_prod: bool, prod: bool) -> TrustPolicy {
        TrustPolicy::new(
            insecure.iter().map(|s| s.to_string()).collect(),
            direct.iter().map(|s| s.to_string()).collect(),
            allow_prod,
            prod,
        )
    }

    #[test]
    fn host_list_parsing_trims_and_lowercases() {
        let hosts = parse_host_list(" Fotos.Fornecedor.com.br , cdn.exemplo.com ,, ");
        assert!(hosts.contains("fotos.fornecedor.com.br"));
        assert!(hosts.contains("cdn.exemplo.com"));
        assert_eq!(hosts.len(), 2);
    }

    #[test]
    fn insecure_hosts_matched_case_insensitively() {
        let p = policy(&["fotos.fornecedor.com.br"], &[], false, false);
        assert!(p.allows_insecure("FOTOS.fornecedor.com.BR"));
        assert!(!p.allows_insecure("outro.com"));
    }

    #[test]
    fn production_requires_the_extra_flag() {
        let listed_only = policy(&["fotos.fornecedor.com.br"], &[], false, true);
        assert!(!listed_only.allows_insecure("fotos.fornecedor.com.br"));

        let flagged = policy(&["fotos.fornecedor.com.br"], &[], true, true);
        assert!(flagged.allows_insecure("fotos.fornecedor.com.br"));
    }

    #[test]
    fn direct_fallback_is_a_separate_list() {
        let p = policy(&["a.com"], &["b.com"], false, false);
        assert!(!p.allows_direct_fallback("a.com"));
        assert!(p.allows_direct_fallback("b.com"));
    }
}
