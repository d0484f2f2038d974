use regex::Regex;
use std::sync::OnceLock;

/// Table the service reads and updates when `ENTRIES_TABLE` is unset.
pub const DEFAULT_ENTRIES_TABLE: &str = "gsk_table";

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub port: u16,
    /// Interpolated into SQL, so only identifiers accepted by [`validate_table_name`].
    pub entries_table: String,
    pub db_max_connections: u32,
    pub db_acquire_timeout_secs: u64,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        let config = Self {
            database_url: std::env::var("DATABASE_URL")
                .or_else(|_| std::env::var("DB_URL"))
                .map_err(|_| {
                    anyhow::anyhow!("DATABASE_URL or DB_URL environment variable required")
                })
                .and_then(|url| {
                    if url.trim().is_empty() {
                        anyhow::bail!("DATABASE_URL cannot be empty");
                    }
                    if !url.starts_with("postgresql://") && !url.starts_with("postgres://") {
                        anyhow::bail!("DATABASE_URL must start with postgresql:// or postgres://");
                    }
                    Ok(url)
                })?,
            port: std::env::var("PORT")
                .unwrap_or_else(|_| "8000".to_string())
                .parse()
                .map_err(|_| anyhow::anyhow!("PORT must be a valid number between 1-65535"))?,
            entries_table: validate_table_name(
                std::env::var("ENTRIES_TABLE")
                    .ok()
                    .filter(|s| !s.trim().is_empty())
                    .unwrap_or_else(|| DEFAULT_ENTRIES_TABLE.to_string()),
            )?,
            db_max_connections: std::env::var("DB_MAX_CONNECTIONS")
                .unwrap_or_else(|_| "10".to_string())
                .parse()
                .map_err(|_| anyhow::anyhow!("DB_MAX_CONNECTIONS must be a positive number"))
                .and_then(|n: u32| {
                    if n == 0 {
                        anyhow::bail!("DB_MAX_CONNECTIONS must be at least 1");
                    }
                    Ok(n)
                })?,
            db_acquire_timeout_secs: std::env::var("DB_ACQUIRE_TIMEOUT_SECS")
                .unwrap_or_else(|_| "5".to_string())
                .parse()
                .map_err(|_| anyhow::anyhow!("DB_ACQUIRE_TIMEOUT_SECS must be a number of seconds"))?,
        };

        // Never log the full connection string, it carries credentials
        tracing::info!("Configuration loaded successfully");
        tracing::debug!(
            "Database URL: {}...",
            &config.database_url[..20.min(config.database_url.len())]
        );
        tracing::debug!("Entries table: {}", config.entries_table);
        tracing::debug!(
            "Pool: max {} connections, {}s acquire timeout",
            config.db_max_connections,
            config.db_acquire_timeout_secs
        );
        tracing::debug!("Server Port: {}", config.port);

        Ok(config)
    }
}

fn table_name_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*(\.[A-Za-z_][A-Za-z0-9_]*)?$")
            .expect("table name pattern is valid")
    })
}

/// Accepts `table` or `schema.table` made of plain SQL identifier characters.
pub fn validate_table_name(name: String) -> anyhow::Result<String> {
    let trimmed = name.trim();
    if !table_name_pattern().is_match(trimmed) {
        anyhow::bail!(
            "ENTRIES_TABLE must be a plain identifier like gsk_table or schema.gsk_table, got {:?}",
            name
        );
    }
    Ok(trimmed.to_string())
}
