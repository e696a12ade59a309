use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result, bail};
use serde::{Deserialize, Serialize};

/// Environment variable overriding [`ChainConfig::url_template`].
pub const URL_TEMPLATE_ENV: &str = "MAXPAIN_URL_TEMPLATE";

const DEFAULT_URL_TEMPLATE: &str = "http://finance.yahoo.com/q/op?s={symbol}&m={year}-{month}";

/// Fetch and layout settings shared by every command.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChainConfig {
    /// Page URL with `{symbol}`, `{year}` and `{month}` placeholders.
    /// The month is zero-padded to two digits.
    pub url_template: String,
    pub user_agent: String,
    pub timeout_secs: u64,
    /// Upper bound on fetches in flight at once.
    pub max_concurrency: usize,
    pub layout: PageLayout,
}

/// Positional keys of the tables the chain page is read from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PageLayout {
    /// Description and last trade price.
    pub summary: String,
    /// Expiration label.
    pub expiry: String,
    pub calls: String,
    pub puts: String,
}

impl Default for ChainConfig {
    fn default() -> Self {
        Self {
            url_template: DEFAULT_URL_TEMPLATE.to_string(),
            user_agent: concat!("maxpain/", env!("CARGO_PKG_VERSION")).to_string(),
            timeout_secs: 30,
            max_concurrency: 4,
            layout: PageLayout::default(),
        }
    }
}

impl Default for PageLayout {
    fn default() -> Self {
        Self {
            summary: "table4".into(),
            expiry: "table9".into(),
            calls: "table11".into(),
            puts: "table15".into(),
        }
    }
}

impl ChainConfig {
    /// Load from an optional JSON file, then apply the environment override
    /// and the CLI concurrency flag.
    pub fn load(path: Option<&Path>, concurrency: Option<usize>) -> Result<Self> {
        Self::resolve(path, std::env::var(URL_TEMPLATE_ENV).ok(), concurrency)
    }

    /// [`load`](Self::load) with the environment value passed in.
    pub fn resolve(
        path: Option<&Path>,
        env_template: Option<String>,
        concurrency: Option<usize>,
    ) -> Result<Self> {
        let mut config = match path {
            Some(p) => {
                let contents = std::fs::read_to_string(p)
                    .with_context(|| format!("reading config {}", p.display()))?;
                serde_json::from_str(&contents)
                    .with_context(|| format!("parsing config {}", p.display()))?
            }
            None => ChainConfig::default(),
        };

        if let Some(template) = env_template {
            config.url_template = template;
        }
        if let Some(n) = concurrency {
            config.max_concurrency = n;
        }
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.max_concurrency == 0 {
            bail!("max_concurrency must be at least 1");
        }
        if !self.url_template.contains("{symbol}") {
            bail!("url_template '{}' has no {{symbol}} placeholder", self.url_template);
        }
        Ok(())
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Source URL for one symbol and expiration month.
    pub fn url(&self, symbol: &str, month: u32, year: i32) -> String {
        self.url_template
            .replace("{symbol}", symbol)
            .replace("{year}", &year.to_string())
            .replace("{month}", &format!("{month:02}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_url() {
        let c = ChainConfig::default();
        assert_eq!(
            c.url("SPY", 3, 2012),
            "http://finance.yahoo.com/q/op?s=SPY&m=2012-03"
        );
    }

    #[test]
    fn test_partial_json_keeps_defaults() {
        let json = r#"{"max_concurrency": 8, "layout": {"calls": "table2"}}"#;
        let c: ChainConfig = serde_json::from_str(json).unwrap();
        assert_eq!(c.max_concurrency, 8);
        assert_eq!(c.layout.calls, "table2");
        assert_eq!(c.layout.puts, "table15");
        assert_eq!(c.timeout_secs, 30);
    }

    fn write_config(dir: &tempfile::TempDir, json: &str) -> std::path::PathBuf {
        let path = dir.path().join("maxpain.json");
        std::fs::write(&path, json).unwrap();
        path
    }

    #[test]
    fn test_resolve_reads_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_config(&dir, r#"{"timeout_secs": 5, "layout": {"summary": "table1"}}"#);
        let c = ChainConfig::resolve(Some(&path), None, None).unwrap();
        assert_eq!(c.timeout_secs, 5);
        assert_eq!(c.layout.summary, "table1");
        assert_eq!(c.max_concurrency, 4);
        assert_eq!(c.url_template, DEFAULT_URL_TEMPLATE);
    }

    #[test]
    fn test_resolve_env_template_overrides_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_config(&dir, r#"{"url_template": "http://a/{symbol}"}"#);
        let env = Some("http://b/{symbol}/{year}{month}".to_string());
        let c = ChainConfig::resolve(Some(&path), env, None).unwrap();
        assert_eq!(c.url("SPY", 7, 2012), "http://b/SPY/201207");
    }

    #[test]
    fn test_resolve_cli_concurrency_overrides_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_config(&dir, r#"{"max_concurrency": 8}"#);
        let c = ChainConfig::resolve(Some(&path), None, Some(2)).unwrap();
        assert_eq!(c.max_concurrency, 2);
    }

    #[test]
    fn test_resolve_rejects_zero_concurrency() {
        assert!(ChainConfig::resolve(None, None, Some(0)).is_err());

        let dir = tempfile::tempdir().unwrap();
        let path = write_config(&dir, r#"{"max_concurrency": 0}"#);
        assert!(ChainConfig::resolve(Some(&path), None, None).is_err());
    }

    #[test]
    fn test_resolve_missing_or_bad_file() {
        let dir = tempfile::tempdir().unwrap();
        assert!(ChainConfig::resolve(Some(&dir.path().join("absent.json")), None, None).is_err());
        let path = write_config(&dir, "{not json");
        assert!(ChainConfig::resolve(Some(&path), None, None).is_err());
    }

    #[test]
    fn test_zero_concurrency_rejected() {
        let c = ChainConfig {
            max_concurrency: 0,
            ..Default::default()
        };
        assert!(c.validate().is_err());
    }
}
