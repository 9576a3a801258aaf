use serde::{Deserialize, Serialize};

/// Main configuration structure for Mojo-Sweep
///
/// Every table and key is optional; missing values fall back to the defaults
/// the sweep was tuned with.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub crawler: CrawlerConfig,
    pub http: HttpConfig,
    pub output: OutputConfig,
}

/// Sweep range and scheduling configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct CrawlerConfig {
    /// First profile ID of the sweep (inclusive)
    pub start_id: u64,

    /// Last profile ID of the sweep (inclusive)
    pub end_id: u64,

    /// Maximum number of fetches in flight at any instant
    pub max_concurrent: usize,

    /// Number of contiguous IDs dispatched as one batch
    pub batch_size: u64,

    /// Save a checkpoint once this many IDs were processed since the last save
    pub save_every: u64,
}

impl Default for CrawlerConfig {
    fn default() -> Self {
        Self {
            start_id: 1,
            end_id: 47_000,
            max_concurrent: 200,
            batch_size: 5_000,
            save_every: 2_000,
        }
    }
}

/// HTTP client configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct HttpConfig {
    /// Profile URL with an `{id}` placeholder
    pub url_template: String,

    /// User-Agent header sent with every request
    pub user_agent: String,

    /// Accept-Language header sent with every request
    pub accept_language: String,

    /// Connect timeout in seconds
    pub connect_timeout_secs: u64,

    /// Total request timeout in seconds (connect + headers + body)
    pub timeout_secs: u64,

    /// Global cap on outbound connections
    pub max_connections: usize,

    /// Cap on requests in flight to the target host
    pub max_connections_per_host: usize,

    /// Idle connections kept per destination host
    pub max_idle_per_host: usize,

    /// Extra attempts for timeouts, network errors and 5xx responses
    pub max_retries: u32,

    /// Delay between attempts (milliseconds)
    pub retry_delay_ms: u64,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            url_template: "https://mojo.az/az/users/{id}".to_string(),
            user_agent: "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 \
                         (KHTML, like Gecko) Chrome/91.0.4472.124 Safari/537.36"
                .to_string(),
            accept_language: "az,en;q=0.9".to_string(),
            connect_timeout_secs: 5,
            timeout_secs: 10,
            max_connections: 300,
            max_connections_per_host: 100,
            max_idle_per_host: 100,
            max_retries: 0,
            retry_delay_ms: 500,
        }
    }
}

/// Output configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct OutputConfig {
    /// Path to the JSON checkpoint file
    pub checkpoint_path: String,

    /// Base file name for exports; the format extension is appended
    pub export_base: String,

    /// Export formats written after the sweep
    pub formats: Vec<ExportFormat>,

    /// Path to the markdown run summary (empty disables it)
    pub summary_path: String,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            checkpoint_path: "scraper_checkpoint.json".to_string(),
            export_base: "mojo_users".to_string(),
            formats: vec![ExportFormat::Csv, ExportFormat::Json],
            summary_path: "mojo_summary.md".to_string(),
        }
    }
}

/// Serialization sinks the collected records can be exported to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    Csv,
    Json,
}

impl ExportFormat {
    /// File extension for this format
    pub fn extension(&self) -> &'static str {
        match self {
            Self::Csv => "csv",
            Self::Json => "json",
        }
    }
}
