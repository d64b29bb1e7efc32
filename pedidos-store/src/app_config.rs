use serde::Deserialize;
use std::env;

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    #[serde(default)]
    pub orders: OrdersConfig,
    #[serde(default)]
    pub auth: AuthConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub port: u16,
    #[serde(default = "default_request_timeout")]
    pub request_timeout_seconds: u64,
}

fn default_request_timeout() -> u64 { 30 }

#[derive(Debug, Deserialize, Clone)]
pub struct DatabaseConfig {
    pub url: String,
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
    #[serde(default = "default_acquire_timeout")]
    pub acquire_timeout_seconds: u64,
}

fn default_max_connections() -> u32 { 5 }
fn default_acquire_timeout() -> u64 { 3 }

impl DatabaseConfig {
    pub fn is_memory(&self) -> bool {
        self.url.starts_with(crate::MEMORY_URL_SCHEME)
    }
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct OrdersConfig {
    /// Reject transitions to statuses outside the named set.
    #[serde(default)]
    pub strict_statuses: bool,
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct AuthConfig {
    /// Operator ids allowed to register stock. Empty means anyone.
    #[serde(default)]
    pub allowed_operators: Vec<i64>,
    pub inventory_key: Option<String>,
}

impl Config {
    pub fn load() -> Result<Self, config::ConfigError> {
        let run_mode = env::var("RUN_MODE").unwrap_or_else(|_| "development".into());

        let s = config::Config::builder()
            .add_source(config::File::with_name("config/default"))
            // Per-environment overrides, optional
            .add_source(config::File::with_name(&format!("config/{}", run_mode)).required(false))
            // Local overrides, not checked in
            .add_source(config::File::with_name("config/local").required(false))
            // Eg. `PEDIDOS__SERVER__PORT=8080`
            .add_source(environment())
            // Hosting platforms hand out the connection string as DATABASE_URL
            .set_override_option("database.url", env::var("DATABASE_URL").ok())?
            .build()?;

        s.try_deserialize()
    }
}

/// `PEDIDOS__*` variables. The operator allow-list is comma separated,
/// eg. `PEDIDOS__AUTH__ALLOWED_OPERATORS=6762915467,42`.
fn environment() -> config::Environment {
    config::Environment::with_prefix("PEDIDOS")
        .separator("__")
        .list_separator(",")
        .with_list_parse_key("auth.allowed_operators")
        .try_parsing(true)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_fill_optional_sections() {
        let cfg: Config = config::Config::builder()
            .set_override("server.port", 3000)
            .unwrap()
            .set_override("database.url", "memory://")
            .unwrap()
            .build()
            .unwrap()
            .try_deserialize()
            .unwrap();

        assert_eq!(cfg.server.request_timeout_seconds, 30);
        assert_eq!(cfg.database.max_connections, 5);
        assert!(cfg.database.is_memory());
        assert!(!cfg.orders.strict_statuses);
        assert!(cfg.auth.allowed_operators.is_empty());
        assert!(cfg.auth.inventory_key.is_none());
    }

    #[test]
    fn test_allow_list_from_environment() {
        let vars = [
            ("PEDIDOS__DATABASE__URL", "memory://"),
            ("PEDIDOS__SERVER__PORT", "8080"),
            ("PEDIDOS__AUTH__ALLOWED_OPERATORS", "6762915467,42"),
            ("PEDIDOS__AUTH__INVENTORY_KEY", "secret"),
        ];
        let cfg: Config = config::Config::builder()
            .add_source(
                environment().source(Some(
                    vars.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect(),
                )),
            )
            .build()
            .unwrap()
            .try_deserialize()
            .unwrap();

        assert_eq!(cfg.server.port, 8080);
        assert_eq!(cfg.auth.allowed_operators, vec![6762915467, 42]);
        assert_eq!(cfg.auth.inventory_key.as_deref(), Some("secret"));
    }
}
