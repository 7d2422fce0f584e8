use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct PagingConfig {
    pub default_size: u32,
    pub max_size: u32,
}

impl Default for PagingConfig {
    fn default() -> Self {
        Self {
            default_size: 20,
            max_size: 1000,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    /// Absent means the in-memory store is used.
    pub database_url: Option<String>,
    pub db_max_connections: u32,
    pub paging: PagingConfig,
    /// Prefix for every HAL link; empty renders relative hrefs.
    pub public_base_url: String,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let paging = PagingConfig {
            default_size: parse_var("PAGE_SIZE_DEFAULT").unwrap_or(20),
            max_size: parse_var("PAGE_SIZE_MAX").unwrap_or(1000),
        };
        anyhow::ensure!(paging.default_size > 0, "PAGE_SIZE_DEFAULT must be positive");
        anyhow::ensure!(
            paging.max_size >= paging.default_size,
            "PAGE_SIZE_MAX must not be lower than PAGE_SIZE_DEFAULT"
        );

        Ok(Self {
            host: std::env::var("APP_HOST").unwrap_or_else(|_| "0.0.0.0".into()),
            port: parse_var("APP_PORT").unwrap_or(8080),
            database_url: std::env::var("DATABASE_URL")
                .ok()
                .filter(|v| !v.trim().is_empty()),
            db_max_connections: parse_var("DB_MAX_CONNECTIONS").unwrap_or(10),
            paging,
            public_base_url: normalize_base_url(
                &std::env::var("PUBLIC_BASE_URL").unwrap_or_default(),
            ),
        })
    }

    pub fn for_tests() -> Self {
        Self {
            host: "127.0.0.1".into(),
            port: 0,
            database_url: None,
            db_max_connections: 1,
            paging: PagingConfig::default(),
            public_base_url: String::new(),
        }
    }
}

fn parse_var<T: std::str::FromStr>(key: &str) -> Option<T> {
    std::env::var(key).ok().and_then(|v| v.trim().parse::<T>().ok())
}

fn normalize_base_url(raw: &str) -> String {
    raw.trim().trim_end_matches('/').to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn base_url_loses_trailing_slashes() {
        assert_eq!(normalize_base_url("http://api.local/"), "http://api.local");
        assert_eq!(normalize_base_url(" http://api.local// "), "http://api.local");
        assert_eq!(normalize_base_url(""), "");
    }

    #[test]
    fn default_paging_matches_documented_values() {
        let paging = PagingConfig::default();
        assert_eq!(paging.default_size, 20);
        assert_eq!(paging.max_size, 1000);
    }
}
