use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

const CONFIG_FILE_NAME: &str = ".heatmap.toml";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    FileRead(#[from] std::io::Error),

    #[error("Failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Missing required config value: {0}")]
    Missing(&'static str),
}

/// Top-level configuration loaded from .heatmap.toml, with HEATMAP_* env overrides.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub jira: JiraConfig,

    #[serde(default)]
    pub mongo: MongoConfig,

    #[serde(default)]
    pub github: GitHubConfig,

    #[serde(default)]
    pub retry: RetryConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct JiraConfig {
    /// Base URL of the Jira instance (e.g., https://acme.atlassian.net)
    pub host: Option<String>,
    /// Project key searched by `backfill` unless --project is given
    pub project: Option<String>,
    /// Account email used for basic auth
    pub email: Option<String>,
    /// API token paired with `email`
    pub token: Option<String>,
    /// maxResults sent with every search page
    pub page_size: u32,
}

impl Default for JiraConfig {
    fn default() -> Self {
        Self {
            host: None,
            project: None,
            email: None,
            token: None,
            page_size: 100,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct MongoConfig {
    /// Connection string template. `{user}`, `{password}` and `{dbname}` are substituted.
    pub uri: Option<String>,
    pub user: Option<String>,
    pub password: Option<String>,
    pub dbname: Option<String>,
    pub mapping_collection: String,
    pub diff_collection: String,
    pub connect_timeout_secs: u64,
}

impl Default for MongoConfig {
    fn default() -> Self {
        Self {
            uri: None,
            user: None,
            password: None,
            dbname: None,
            mapping_collection: "jira".to_string(),
            diff_collection: "github".to_string(),
            connect_timeout_secs: 30,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct GitHubConfig {
    /// GitHub API token. If None, falls back to GITHUB_TOKEN env var.
    pub token: Option<String>,
    pub api_url: String,
}

impl Default for GitHubConfig {
    fn default() -> Self {
        Self {
            token: None,
            api_url: "https://api.github.com".to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RetryConfig {
    /// Total attempts per request, including the first one
    pub max_attempts: u32,
    pub initial_backoff_ms: u64,
    pub max_backoff_ms: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_backoff_ms: 500,
            max_backoff_ms: 8_000,
        }
    }
}

/// Jira settings after validation, ready to hand to `JiraClient::new`.
#[derive(Debug, Clone)]
pub struct JiraSettings {
    pub host: String,
    pub email: String,
    pub token: String,
    pub page_size: u32,
}

/// Mongo settings after validation, with the URI template already filled in.
#[derive(Debug, Clone)]
pub struct MongoSettings {
    pub uri: String,
    pub dbname: String,
    pub mapping_collection: String,
    pub diff_collection: String,
    pub connect_timeout_secs: u64,
}

impl Config {
    /// Load configuration from an explicit path, or from .heatmap.toml in the
    /// current directory, then the home directory. Returns default config if no
    /// file exists. Environment overrides are applied last.
    pub fn load(explicit: Option<&Path>) -> Result<Config, ConfigError> {
        let mut config = match explicit {
            Some(path) => Self::load_from(path)?,
            None => match Self::discover() {
                Some(path) => Self::load_from(&path)?,
                None => Config::default(),
            },
        };

        config.apply_env_overrides(|key| std::env::var(key).ok());
        Ok(config)
    }

    /// Load from a specific path (useful for testing).
    pub fn load_from(path: &Path) -> Result<Config, ConfigError> {
        let contents = fs::read_to_string(path)?;
        let config = toml::from_str(&contents)?;
        Ok(config)
    }

    fn discover() -> Option<PathBuf> {
        let local = PathBuf::from(CONFIG_FILE_NAME);
        if local.exists() {
            return Some(local);
        }
        let home = std::env::var_os("HOME")?;
        let in_home = PathBuf::from(home).join(CONFIG_FILE_NAME);
        in_home.exists().then_some(in_home)
    }

    /// Overlay HEATMAP_* variables on top of file values. `lookup` is injected so
    /// tests don't have to mutate the process environment.
    pub fn apply_env_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let targets: [(&str, &mut Option<String>); 9] = [
            ("HEATMAP_JIRA_HOST", &mut self.jira.host),
            ("HEATMAP_JIRA_PROJECT", &mut self.jira.project),
            ("HEATMAP_JIRA_EMAIL", &mut self.jira.email),
            ("HEATMAP_JIRA_TOKEN", &mut self.jira.token),
            ("HEATMAP_MONGO_URI", &mut self.mongo.uri),
            ("HEATMAP_MONGO_USER", &mut self.mongo.user),
            ("HEATMAP_MONGO_PASSWORD", &mut self.mongo.password),
            ("HEATMAP_MONGO_DBNAME", &mut self.mongo.dbname),
            ("HEATMAP_GITHUB_TOKEN", &mut self.github.token),
        ];
        for (key, slot) in targets {
            if let Some(value) = lookup(key).filter(|v| !v.is_empty()) {
                *slot = Some(value);
            }
        }

        if self.github.token.is_none() {
            self.github.token = lookup("GITHUB_TOKEN").filter(|v| !v.is_empty());
        }
    }

    /// Resolve the project key: the CLI override wins over `jira.project`.
    pub fn project(&self, cli_override: Option<&str>) -> Result<String, ConfigError> {
        cli_override
            .map(str::to_string)
            .or_else(|| self.jira.project.clone())
            .ok_or(ConfigError::Missing("jira.project"))
    }

    pub fn jira_settings(&self) -> Result<JiraSettings, ConfigError> {
        Ok(JiraSettings {
            host: required(&self.jira.host, "jira.host")?
                .trim_end_matches('/')
                .to_string(),
            email: required(&self.jira.email, "jira.email")?,
            token: required(&self.jira.token, "jira.token")?,
            page_size: self.jira.page_size.max(1),
        })
    }

    pub fn mongo_settings(&self) -> Result<MongoSettings, ConfigError> {
        let template = required(&self.mongo.uri, "mongo.uri")?;
        let dbname = required(&self.mongo.dbname, "mongo.dbname")?;
        let uri = template
            .replace("{user}", self.mongo.user.as_deref().unwrap_or_default())
            .replace("{password}", self.mongo.password.as_deref().unwrap_or_default())
            .replace("{dbname}", &dbname);

        Ok(MongoSettings {
            uri,
            dbname,
            mapping_collection: self.mongo.mapping_collection.clone(),
            diff_collection: self.mongo.diff_collection.clone(),
            connect_timeout_secs: self.mongo.connect_timeout_secs,
        })
    }

    pub fn github_token(&self) -> Result<String, ConfigError> {
        required(&self.github.token, "github.token")
    }
}

fn required(value: &Option<String>, key: &'static str) -> Result<String, ConfigError> {
    value
        .clone()
        .filter(|v| !v.trim().is_empty())
        .ok_or(ConfigError::Missing(key))
}
