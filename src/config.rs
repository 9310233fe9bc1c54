use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::{SyncError, SyncResult};
use crate::sync::gateway::Endpoint;

fn default_config_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("~/.config"))
        .join("lifeboard")
        .join("config.json")
}

fn default_base_url() -> String {
    "http://localhost/api".into()
}

fn default_timeout_secs() -> u64 {
    15
}

/// Script names of the remote store, one per endpoint.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(default)]
pub struct EndpointPaths {
    pub todo: String,
    pub money: String,
    pub health: String,
    pub project: String,
    pub section: String,
    pub memo: String,
    pub monthly_memo: String,
    pub delete: String,
    pub sort: String,
    pub completed: String,
    pub fetch: String,
    pub login: String,
    pub auth: String,
    pub logout: String,
}

impl Default for EndpointPaths {
    fn default() -> Self {
        Self {
            todo: "todo.php".into(),
            money: "money.php".into(),
            health: "health.php".into(),
            project: "project.php".into(),
            section: "section.php".into(),
            memo: "memo.php".into(),
            monthly_memo: "monthlyMemo.php".into(),
            delete: "delData.php".into(),
            sort: "sort.php".into(),
            completed: "completed.php".into(),
            fetch: "getData.php".into(),
            login: "login.php".into(),
            auth: "auth.php".into(),
            logout: "logout.php".into(),
        }
    }
}

impl EndpointPaths {
    pub fn path(&self, endpoint: Endpoint) -> &str {
        match endpoint {
            Endpoint::Todo => &self.todo,
            Endpoint::Money => &self.money,
            Endpoint::Health => &self.health,
            Endpoint::Project => &self.project,
            Endpoint::Section => &self.section,
            Endpoint::Memo => &self.memo,
            Endpoint::MonthlyMemo => &self.monthly_memo,
            Endpoint::Delete => &self.delete,
            Endpoint::Sort => &self.sort,
            Endpoint::Completed => &self.completed,
            Endpoint::Fetch => &self.fetch,
            Endpoint::Login => &self.login,
            Endpoint::Auth => &self.auth,
            Endpoint::Logout => &self.logout,
        }
    }
}

#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct BoardConfig {
    #[serde(default = "default_base_url")]
    pub api_base_url: String,
    #[serde(default)]
    pub endpoints: EndpointPaths,
    #[serde(default)]
    pub user_name: String,
    #[serde(default = "default_timeout_secs")]
    pub request_timeout_secs: u64,
    #[serde(default)]
    pub debug_logging: bool,
}

impl Default for BoardConfig {
    fn default() -> Self {
        Self {
            api_base_url: default_base_url(),
            endpoints: EndpointPaths::default(),
            user_name: String::new(),
            request_timeout_secs: default_timeout_secs(),
            debug_logging: false,
        }
    }
}

impl BoardConfig {
    pub fn config_path() -> PathBuf {
        default_config_path()
    }

    /// Load from the default location, falling back to defaults when no file exists.
    pub fn load() -> SyncResult<Self> {
        Self::load_from(&default_config_path())
    }

    pub fn load_from(path: &Path) -> SyncResult<Self> {
        if !path.exists() {
            log::info!("No config at {}, using defaults", path.display());
            return Ok(Self::default());
        }
        let text = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&text)?;
        config.check()?;
        Ok(config)
    }

    pub fn save_to(&self, path: &Path) -> SyncResult<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, serde_json::to_string_pretty(self)?)?;
        Ok(())
    }

    pub fn save(&self) -> SyncResult<()> {
        self.save_to(&default_config_path())
    }

    fn check(&self) -> SyncResult<()> {
        let base = self.api_base_url.trim();
        if !(base.starts_with("http://") || base.starts_with("https://")) {
            return Err(SyncError::Config(format!(
                "api_base_url must be an http(s) URL, got {:?}",
                self.api_base_url
            )));
        }
        if self.request_timeout_secs == 0 {
            return Err(SyncError::Config("request_timeout_secs must be positive".into()));
        }
        Ok(())
    }

    pub fn endpoint_url(&self, endpoint: Endpoint) -> String {
        format!(
            "{}/{}",
            self.api_base_url.trim().trim_end_matches('/'),
            self.endpoints.path(endpoint).trim_start_matches('/')
        )
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn endpoint_url_joins_base_and_script() {
        let config = BoardConfig {
            api_base_url: "https://example.test/api/".into(),
            ..Default::default()
        };
        assert_eq!(
            config.endpoint_url(Endpoint::MonthlyMemo),
            "https://example.test/api/monthlyMemo.php"
        );
        assert_eq!(config.endpoint_url(Endpoint::Delete), "https://example.test/api/delData.php");
    }

    #[test]
    fn partial_file_fills_defaults() {
        let config: BoardConfig =
            serde_json::from_str(r#"{"api_base_url":"https://x.test","endpoints":{"sort":"reorder.php"}}"#)
                .unwrap();
        assert_eq!(config.endpoints.sort, "reorder.php");
        assert_eq!(config.endpoints.todo, "todo.php");
        assert_eq!(config.request_timeout_secs, 15);
        assert!(!config.debug_logging);
    }

    #[test]
    fn load_and_save_roundtrip_through_disk() {
        let path = std::env::temp_dir()
            .join(format!("lifeboard-config-{}", std::process::id()))
            .join("config.json");
        let config = BoardConfig {
            api_base_url: "https://home.test".into(),
            user_name: "alice".into(),
            ..Default::default()
        };
        config.save_to(&path).unwrap();
        let loaded = BoardConfig::load_from(&path).unwrap();
        assert_eq!(loaded, config);
        let _ = std::fs::remove_dir_all(path.parent().unwrap());
    }

    #[test]
    fn rejects_non_http_base() {
        let path = std::env::temp_dir()
            .join(format!("lifeboard-bad-config-{}", std::process::id()))
            .join("config.json");
        let config = BoardConfig {
            api_base_url: "ftp://nope".into(),
            ..Default::default()
        };
        config.save_to(&path).unwrap();
        assert!(matches!(BoardConfig::load_from(&path), Err(SyncError::Config(_))));
        let _ = std::fs::remove_dir_all(path.parent().unwrap());
    }

    #[test]
    fn missing_file_gives_defaults() {
        let path = std::env::temp_dir().join("lifeboard-does-not-exist/config.json");
        assert_eq!(BoardConfig::load_from(&path).unwrap(), BoardConfig::default());
    }
}
