use std::str::FromStr;

use anyhow::Context;
use sqlx::postgres::PgConnectOptions;

/// Pool capacity is fixed; waiters queue without limit.
pub const MAX_DB_CONNECTIONS: u32 = 10;

#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    pub url: Option<String>,
    pub host: String,
    pub port: u16,
    pub user: String,
    pub password: String,
    pub name: String,
}

impl DatabaseConfig {
    pub fn connect_options(&self) -> anyhow::Result<PgConnectOptions> {
        if let Some(url) = &self.url {
            return PgConnectOptions::from_str(url).context("parse DATABASE_URL");
        }
        Ok(PgConnectOptions::new()
            .host(&self.host)
            .port(self.port)
            .username(&self.user)
            .password(&self.password)
            .database(&self.name))
    }
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database: DatabaseConfig,
    pub host: String,
    pub port: u16,
    /// Echo raw store errors in 500 bodies. Off unless asked for.
    pub expose_db_errors: bool,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_vars(|key| std::env::var(key).ok())
    }

    pub fn from_vars<F>(var: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let url = var("DATABASE_URL").filter(|v| !v.is_empty());
        let required = |key: &str| -> anyhow::Result<String> {
            match (&url, var(key)) {
                (_, Some(v)) => Ok(v),
                (Some(_), None) => Ok(String::new()),
                (None, None) => anyhow::bail!("{key} must be set when DATABASE_URL is not"),
            }
        };

        let database = DatabaseConfig {
            host: var("DB_HOST").unwrap_or_else(|| "localhost".into()),
            port: parse_or(&var, "DB_PORT", 5432)?,
            user: required("DB_USER")?,
            password: var("DB_PASSWORD").unwrap_or_default(),
            name: required("DB_NAME")?,
            url,
        };

        Ok(Self {
            database,
            host: var("APP_HOST").unwrap_or_else(|| "0.0.0.0".into()),
            port: parse_or(&var, "APP_PORT", 3000)?,
            expose_db_errors: var("EXPOSE_DB_ERRORS")
                .map(|v| matches!(v.as_str(), "1" | "true" | "yes"))
                .unwrap_or(false),
        })
    }

    pub fn listen_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn parse_or<F, T>(var: &F, key: &str, default: T) -> anyhow::Result<T>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match var(key) {
        Some(v) => v.parse::<T>().with_context(|| format!("parse {key}")),
        None => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn load(pairs: &[(&str, &str)]) -> anyhow::Result<AppConfig> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        AppConfig::from_vars(|k| vars.get(k).cloned())
    }

    #[test]
    fn defaults_apply_to_optional_vars() {
        let cfg = load(&[("DB_USER", "app"), ("DB_NAME", "accounts")]).unwrap();
        assert_eq!(cfg.database.host, "localhost");
        assert_eq!(cfg.database.port, 5432);
        assert_eq!(cfg.database.password, "");
        assert_eq!(cfg.listen_addr(), "0.0.0.0:3000");
        assert!(!cfg.expose_db_errors);
    }

    #[test]
    fn missing_db_user_is_an_error_without_url() {
        let err = load(&[("DB_NAME", "accounts")]).unwrap_err();
        assert!(err.to_string().contains("DB_USER"));
    }

    #[test]
    fn database_url_makes_parts_optional() {
        let cfg = load(&[("DATABASE_URL", "postgres://u:p@db:5433/accounts")]).unwrap();
        assert!(cfg.database.url.is_some());
        assert!(cfg.database.connect_options().is_ok());
    }

    #[test]
    fn bad_port_is_reported() {
        let err = load(&[
            ("DB_USER", "app"),
            ("DB_NAME", "accounts"),
            ("APP_PORT", "http"),
        ])
        .unwrap_err();
        assert!(err.to_string().contains("APP_PORT"));
    }

    #[test]
    fn expose_db_errors_flag() {
        let cfg = load(&[
            ("DB_USER", "app"),
            ("DB_NAME", "accounts"),
            ("EXPOSE_DB_ERRORS", "true"),
        ])
        .unwrap();
        assert!(cfg.expose_db_errors);
    }
}
