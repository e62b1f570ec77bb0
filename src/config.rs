use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub input: InputConfig,
    #[serde(default)]
    pub output: OutputConfig,
    #[serde(default)]
    pub monitoring: MonitoringConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct InputConfig {
    /// Seconds between collection rounds.
    #[serde(default = "default_period_secs")]
    pub period_secs: u64,
    /// Docker endpoint: `unix://<path>`, `tcp://host:port`, `http://host:port` or a bare socket path.
    #[serde(default = "default_socket")]
    pub socket: String,
    /// Upper bound on a single container's stats fetch.
    #[serde(default = "default_fetch_timeout_ms")]
    pub fetch_timeout_ms: u64,
    /// Ask Docker for a one-shot read (faster, but no CPU percent).
    #[serde(default)]
    pub one_shot: bool,
    /// Include stopped containers in the listing.
    #[serde(default)]
    pub all: bool,
}

impl Default for InputConfig {
    fn default() -> Self {
        Self {
            period_secs: default_period_secs(),
            socket: default_socket(),
            fetch_timeout_ms: default_fetch_timeout_ms(),
            one_shot: false,
            all: false,
        }
    }
}

fn default_period_secs() -> u64 {
    1
}

fn default_socket() -> String {
    "unix:///var/run/docker.sock".into()
}

fn default_fetch_timeout_ms() -> u64 {
    3000
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SinkKind {
    #[default]
    Stdout,
    Log,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct OutputConfig {
    #[serde(default)]
    pub sink: SinkKind,
    /// Pretty-print JSON written by the stdout sink.
    #[serde(default)]
    pub pretty: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MonitoringConfig {
    /// How often to log app stats (rounds, events, skips, overruns) at INFO level.
    #[serde(default = "default_stats_log_interval_secs")]
    pub stats_log_interval_secs: u64,
}

impl Default for MonitoringConfig {
    fn default() -> Self {
        Self {
            stats_log_interval_secs: default_stats_log_interval_secs(),
        }
    }
}

fn default_stats_log_interval_secs() -> u64 {
    60
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// `EnvFilter` directive used when `RUST_LOG` is not set.
    #[serde(default = "default_log_filter")]
    pub filter: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: default_log_filter(),
        }
    }
}

fn default_log_filter() -> String {
    "info".into()
}

/// Longest accepted collection period and stats log interval (one day).
pub const MAX_INTERVAL_SECS: u64 = 86_400;
/// Longest accepted per-container fetch timeout (five minutes).
pub const MAX_FETCH_TIMEOUT_MS: u64 = 300_000;

impl AppConfig {
    pub fn load() -> anyhow::Result<Self> {
        let path = std::env::var("CONFIG_FILE").unwrap_or_else(|_| "config.toml".into());
        let s = std::fs::read_to_string(&path)
            .map_err(|e| anyhow::anyhow!("reading config {}: {}", path, e))?;
        Self::load_from_str(&s)
    }

    /// Parse and validate config from a string (e.g. for tests).
    pub fn load_from_str(s: &str) -> anyhow::Result<Self> {
        let config: AppConfig = toml::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> anyhow::Result<()> {
        anyhow::ensure!(
            (1..=MAX_INTERVAL_SECS).contains(&self.input.period_secs),
            "input.period_secs must be between 1 and {}, got {}",
            MAX_INTERVAL_SECS,
            self.input.period_secs
        );
        anyhow::ensure!(
            (1..=MAX_FETCH_TIMEOUT_MS).contains(&self.input.fetch_timeout_ms),
            "input.fetch_timeout_ms must be between 1 and {}, got {}",
            MAX_FETCH_TIMEOUT_MS,
            self.input.fetch_timeout_ms
        );
        anyhow::ensure!(
            !self.input.socket.is_empty(),
            "input.socket must be non-empty"
        );
        anyhow::ensure!(
            self.input.socket.starts_with('/')
                || ["unix://", "tcp://", "http://"]
                    .iter()
                    .any(|scheme| self.input.socket.starts_with(scheme)),
            "input.socket must be a unix://, tcp:// or http:// address or an absolute path, got {}",
            self.input.socket
        );
        anyhow::ensure!(
            (1..=MAX_INTERVAL_SECS).contains(&self.monitoring.stats_log_interval_secs),
            "monitoring.stats_log_interval_secs must be between 1 and {}, got {}",
            MAX_INTERVAL_SECS,
            self.monitoring.stats_log_interval_secs
        );
        anyhow::ensure!(
            !self.logging.filter.is_empty(),
            "logging.filter must be non-empty"
        );
        Ok(())
    }
}
