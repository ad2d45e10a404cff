use serde::Deserialize;
use std::path::PathBuf;

/// US states and territories searched when no region list is configured
pub const DEFAULT_REGIONS: [&str; 59] = [
    "AL", "AK", "AZ", "AR", "CA", "CO", "CT", "DE", "DC", "FL", "GA", "HI", "ID", "IL", "IN", "IA",
    "KS", "KY", "LA", "ME", "MD", "MA", "MI", "MN", "MS", "MO", "MT", "NE", "NV", "NH", "NJ", "NM",
    "NY", "NC", "ND", "OH", "OK", "OR", "PA", "RI", "SC", "SD", "TN", "TX", "UT", "VT", "VA", "WA",
    "WV", "WI", "WY", "AS", "FM", "GU", "MH", "MP", "PW", "PR", "VI",
];

/// Program codes sent with every results query when no filter is configured
///
/// Applied and Professional Ethics, Ethics, Logic, Philosophy, and Philosophy (Other).
pub const DEFAULT_PROGRAM_FILTER: &str = "38.0104+38.0103+38.0102+38.0101+38.0199";

/// Country whose institutions come from the searchable registry
pub const REGISTRY_COUNTRY: &str = "usa";

/// Main configuration structure for Institution Finder
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub finder: FinderConfig,
    #[serde(default)]
    pub http: HttpConfig,
    #[serde(default)]
    pub output: OutputConfig,
}

/// Which institutions to find and where to find them
#[derive(Debug, Clone, Deserialize)]
pub struct FinderConfig {
    /// Country to produce institutions for ("usa" uses the registry search)
    pub country: String,

    /// Base URL of the registry search service
    #[serde(rename = "registry-url", default)]
    pub registry_url: Option<String>,

    /// Program codes constraining the search results
    #[serde(rename = "program-filter", default = "default_program_filter")]
    pub program_filter: String,

    /// Region codes searched in order
    #[serde(default = "default_regions")]
    pub regions: Vec<String>,

    /// Directory holding `<country>.json` files for non-registry countries
    #[serde(rename = "data-dir", default = "default_data_dir")]
    pub data_dir: PathBuf,

    /// Explicit JSON file, overrides `data-dir`
    #[serde(rename = "json-path", default)]
    pub json_path: Option<PathBuf>,
}

impl FinderConfig {
    /// Returns true if institutions are discovered through the registry search
    pub fn uses_registry(&self) -> bool {
        self.country.eq_ignore_ascii_case(REGISTRY_COUNTRY)
    }

    /// Resolves the JSON file for the configured country
    pub fn json_file(&self) -> PathBuf {
        match &self.json_path {
            Some(path) => path.clone(),
            None => self
                .data_dir
                .join(format!("{}.json", self.country.to_lowercase())),
        }
    }
}

/// HTTP client behavior
#[derive(Debug, Clone, Deserialize)]
pub struct HttpConfig {
    /// User agent sent with every request
    #[serde(rename = "user-agent", default = "default_user_agent")]
    pub user_agent: String,

    /// Connect timeout (seconds)
    #[serde(rename = "connect-timeout-secs", default = "default_connect_timeout")]
    pub connect_timeout_secs: u64,

    /// Whole-request timeout (seconds)
    #[serde(rename = "timeout-secs", default = "default_timeout")]
    pub timeout_secs: u64,

    /// Fixed delay before the single retry of a failed request (milliseconds)
    #[serde(rename = "retry-backoff-ms", default = "default_retry_backoff")]
    pub retry_backoff_ms: u64,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            user_agent: default_user_agent(),
            connect_timeout_secs: default_connect_timeout(),
            timeout_secs: default_timeout(),
            retry_backoff_ms: default_retry_backoff(),
        }
    }
}

/// Output configuration
#[derive(Debug, Clone, Default, Deserialize)]
pub struct OutputConfig {
    /// JSON-lines file receiving institutions; stdout when absent
    #[serde(default)]
    pub path: Option<PathBuf>,
}

fn default_program_filter() -> String {
    DEFAULT_PROGRAM_FILTER.to_string()
}

fn default_regions() -> Vec<String> {
    DEFAULT_REGIONS.iter().map(|r| r.to_string()).collect()
}

fn default_data_dir() -> PathBuf {
    PathBuf::from("./data")
}

fn default_user_agent() -> String {
    format!("institution-finder/{}", env!("CARGO_PKG_VERSION"))
}

fn default_connect_timeout() -> u64 {
    10
}

fn default_timeout() -> u64 {
    30
}

fn default_retry_backoff() -> u64 {
    2000
}
