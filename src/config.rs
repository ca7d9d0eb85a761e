use anyhow::{Result, bail};
use clap::Parser;
use serde::Deserialize;
use std::env;
use std::fs;
use std::path::PathBuf;

#[derive(Parser, Debug, Default)]
#[command(name = "catalog")]
#[command(about = "Runs the book catalog service", long_about = None)]
pub struct Cli {
    #[arg(short = 'c', long = "config")]
    pub config_path: Option<String>,

    #[arg(short = 'p', long = "port")]
    pub port: Option<u16>,
}

pub fn default_config_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".catalog")
}

pub fn default_config_path() -> PathBuf {
    default_config_dir().join("config.yaml")
}

#[derive(Debug, Deserialize, Default, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Backend {
    #[default]
    Mongodb,
    Memory,
}

impl Backend {
    fn parse(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "" | "mongodb" | "mongo" => Ok(Backend::Mongodb),
            "memory" => Ok(Backend::Memory),
            other => bail!("unknown backend '{}', expected mongodb or memory", other),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct App {
    #[serde(default = "default_port")]
    port: u16,
    #[serde(default)]
    pub backend: Backend,
    #[serde(default)]
    database_url: String,
    #[serde(default = "default_database")]
    database: String,
}

fn default_port() -> u16 {
    5000
}

fn default_database() -> String {
    "books".to_string()
}

impl Default for App {
    fn default() -> Self {
        App {
            port: default_port(),
            backend: Backend::default(),
            database_url: String::new(),
            database: default_database(),
        }
    }
}

impl App {
    pub fn get_port(&self) -> u16 {
        self.port
    }

    pub fn get_database_url(&self) -> &str {
        &self.database_url
    }

    pub fn get_database(&self) -> &str {
        &self.database
    }
}

/// Collection names inside the configured database.
#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct Collections {
    pub books: String,
    pub reviews: String,
    pub wishlist: String,
    pub reading: String,
    pub finished: String,
}

impl Default for Collections {
    fn default() -> Self {
        Collections {
            books: "allbooks".to_string(),
            reviews: "reviews".to_string(),
            wishlist: "wishlist".to_string(),
            reading: "reading".to_string(),
            finished: "finished".to_string(),
        }
    }
}

#[derive(Debug, Deserialize, Default, Clone)]
pub struct Config {
    #[serde(default)]
    pub app: App,
    #[serde(default)]
    pub collections: Collections,
}

impl Config {
    pub fn new(path: &str) -> Result<Self> {
        let cfg = Config::load_config(path)?;
        Ok(cfg)
    }

    /// Resolves the config for a run: an explicit `--config` file, else the
    /// default config file if present, else the process environment.
    pub fn load(cli: &Cli) -> Result<Self> {
        let mut cfg = match &cli.config_path {
            Some(path) => Config::new(path)?,
            None => {
                let path = default_config_path();
                if path.exists() {
                    Config::new(&path.to_string_lossy())?
                } else {
                    Config::from_env()?
                }
            }
        };

        if let Some(port) = cli.port {
            cfg.app.port = port;
        }

        Ok(cfg)
    }

    /// Builds the config from `DATABASE_URL`, `DATABASE_NAME`, `PORT` and
    /// `CATALOG_BACKEND`.
    pub fn from_env() -> Result<Self> {
        let mut app = App::default();

        if let Ok(url) = env::var("DATABASE_URL") {
            app.database_url = url;
        }
        if let Ok(name) = env::var("DATABASE_NAME") {
            app.database = name;
        }
        if let Ok(port) = env::var("PORT") {
            app.port = port
                .parse()
                .map_err(|e| anyhow::anyhow!("invalid PORT '{}': {}", port, e))?;
        }
        if let Ok(backend) = env::var("CATALOG_BACKEND") {
            app.backend = Backend::parse(&backend)?;
        }

        Ok(Config {
            app,
            collections: Collections::default(),
        })
    }

    fn load_config(path: &str) -> Result<Config> {
        let yaml_str = fs::read_to_string(path)?;
        Config::from_yaml(&yaml_str)
    }

    fn from_yaml(yaml_str: &str) -> Result<Config> {
        let config: Config = serde_yaml::from_str(&Config::expand_placeholders(yaml_str))?;
        Ok(config)
    }

    /// Expands `${VAR}` and `${VAR:-fallback}` placeholders from the process
    /// environment. Expanded values are not scanned again, and an unclosed
    /// `${` is kept verbatim.
    fn expand_placeholders(raw: &str) -> String {
        let mut expanded = String::with_capacity(raw.len());
        let mut rest = raw;

        while let Some(open) = rest.find("${") {
            let Some(close) = rest[open..].find('}').map(|i| open + i) else {
                break;
            };
            expanded.push_str(&rest[..open]);
            expanded.push_str(&Config::lookup_placeholder(&rest[open + 2..close]));
            rest = &rest[close + 1..];
        }

        expanded.push_str(rest);
        expanded
    }

    fn lookup_placeholder(expr: &str) -> String {
        match expr.split_once(":-") {
            Some((name, fallback)) => env::var(name).unwrap_or_else(|_| fallback.to_string()),
            None => env::var(expr).unwrap_or_else(|_| {
                tracing::warn!(var = expr, "environment variable not found");
                String::new()
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn substitutes_defaults_for_unset_vars() {
        let out = Config::expand_placeholders("url: ${CATALOG_TEST_UNSET_VAR:-mongodb://localhost}");
        assert_eq!(out, "url: mongodb://localhost");
    }

    #[test]
    fn substitutes_missing_vars_with_empty_string() {
        let out = Config::expand_placeholders("a: ${CATALOG_TEST_MISSING_VAR}x");
        assert_eq!(out, "a: x");
    }

    #[test]
    fn expands_several_placeholders_on_one_line() {
        let out = Config::expand_placeholders("${CATALOG_TEST_A:-x}-${CATALOG_TEST_B:-y} tail");
        assert_eq!(out, "x-y tail");
    }

    #[test]
    fn leaves_unterminated_placeholders() {
        let out = Config::expand_placeholders("a: ${OPEN");
        assert_eq!(out, "a: ${OPEN");
    }

    #[test]
    fn yaml_fills_defaults() {
        let cfg = Config::from_yaml(
            r#"
app:
  database_url: "${CATALOG_TEST_DB_URL:-mongodb://db:27017}"
collections:
  books: library
"#,
        )
        .unwrap();

        assert_eq!(cfg.app.get_port(), 5000);
        assert_eq!(cfg.app.get_database(), "books");
        assert_eq!(cfg.app.get_database_url(), "mongodb://db:27017");
        assert_eq!(cfg.app.backend, Backend::Mongodb);
        assert_eq!(cfg.collections.books, "library");
        assert_eq!(cfg.collections.reviews, "reviews");
    }

    #[test]
    fn yaml_selects_memory_backend() {
        let cfg = Config::from_yaml("app:\n  backend: memory\n  port: 8080\n").unwrap();
        assert_eq!(cfg.app.backend, Backend::Memory);
        assert_eq!(cfg.app.get_port(), 8080);
        assert_eq!(cfg.collections, Collections::default());
    }

    #[test]
    fn backend_names() {
        assert_eq!(Backend::parse("Memory").unwrap(), Backend::Memory);
        assert_eq!(Backend::parse("mongo").unwrap(), Backend::Mongodb);
        assert!(Backend::parse("sqlite").is_err());
    }

    #[test]
    fn cli_port_overrides_config_file() {
        let dir = std::env::temp_dir().join(format!("catalog-config-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("config.yaml");
        std::fs::write(&path, "app:\n  backend: memory\n").unwrap();

        let cli = Cli {
            config_path: Some(path.to_string_lossy().into_owned()),
            port: Some(6000),
        };
        let cfg = Config::load(&cli).unwrap();
        assert_eq!(cfg.app.get_port(), 6000);
        assert_eq!(cfg.app.backend, Backend::Memory);

        std::fs::remove_dir_all(&dir).ok();
    }
}
