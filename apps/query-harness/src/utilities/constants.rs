pub const CLI_VERSION: &str = env!("CARGO_PKG_VERSION");

pub const SETTINGS_FILE: &str = "query-harness.toml";
pub const ENV_SETTINGS_PREFIX: &str = "QUERY_HARNESS";

pub const DEFAULT_QUERY_DIR: &str = "queries";
pub const DEFAULT_RESULTS_MARKDOWN: &str = "tests/QUERY_TEST_RESULTS.md";

pub const QUERY_FILE_EXTENSION: &str = "sql";
pub const METADATA_FILE_EXTENSIONS: [&str; 2] = ["yaml", "yml"];

/// Directory name whose queries are excluded from execution.
pub const PENDING_CATEGORY: &str = "pending";
/// Category used for query files placed directly under the query root.
pub const ROOT_CATEGORY: &str = "root";

pub const DEFAULT_ROW_LIMIT: u32 = 1000;
pub const DEFAULT_VARIANCE_THRESHOLD: f64 = 0.10;

/// On-demand pricing, USD per tebibyte scanned.
pub const USD_PER_TIB: f64 = 6.25;
pub const BYTES_PER_TIB: f64 = 1_099_511_627_776.0;

pub const HEADER_SCAN_LINES: usize = 20;
pub const UNSET_STAT: &str = "TBD";
pub const UNKNOWN_COMPLEXITY: &str = "Unknown";

// Credentials
pub const ENV_GCP_SA_KEY: &str = "GCP_SA_KEY";
pub const ENV_GOOGLE_APPLICATION_CREDENTIALS: &str = "GOOGLE_APPLICATION_CREDENTIALS";
pub const ENV_GOOGLE_CLOUD_PROJECT: &str = "GOOGLE_CLOUD_PROJECT";
pub const GCLOUD_ADC_RELATIVE_PATH: &str = ".config/gcloud/application_default_credentials.json";

pub const BIGQUERY_API_BASE_URL: &str = "https://bigquery.googleapis.com/bigquery/v2";
pub const BIGQUERY_SCOPE: &str = "https://www.googleapis.com/auth/bigquery";
pub const GOOGLE_TOKEN_URI: &str = "https://oauth2.googleapis.com/token";
pub const JWT_BEARER_GRANT: &str = "urn:ietf:params:oauth:grant-type:jwt-bearer";
pub const DEFAULT_POLL_TIMEOUT_MS: u32 = 10_000;
