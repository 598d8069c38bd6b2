use std::fmt;
use std::path::PathBuf;

pub const DEFAULT_DATABASE_URL: &str = "sqlite://nifty50.db?mode=ro";

#[derive(Clone, PartialEq)]
pub struct AppConfig {
    pub database_url: String,
    pub log_dir: PathBuf,
    /// 0 表示不做周期刷新
    pub refresh_secs: u64,
    pub reload_on_input: bool,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            database_url: DEFAULT_DATABASE_URL.to_string(),
            log_dir: PathBuf::from("logs"),
            refresh_secs: 0,
            reload_on_input: true,
        }
    }
}

impl AppConfig {
    /// 先加载 .env，再读取进程环境变量
    pub fn from_env() -> Self {
        let _ = dotenv::dotenv();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// 用于日志和报错的连接串，密码替换为 ***
    pub fn redacted_url(&self) -> String {
        redact_url(&self.database_url)
    }

    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let non_empty = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        Self {
            database_url: non_empty("DATABASE_URL").unwrap_or(defaults.database_url),
            log_dir: non_empty("NIFTY_LOG_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.log_dir),
            refresh_secs: non_empty("NIFTY_REFRESH_SECS")
                .and_then(|v| v.parse::<u64>().ok())
                .unwrap_or(defaults.refresh_secs),
            reload_on_input: non_empty("NIFTY_RELOAD_ON_INPUT")
                .map(|v| parse_flag(&v))
                .unwrap_or(defaults.reload_on_input),
        }
    }
}

impl fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AppConfig")
            .field("database_url", &self.redacted_url())
            .field("log_dir", &self.log_dir)
            .field("refresh_secs", &self.refresh_secs)
            .field("reload_on_input", &self.reload_on_input)
            .finish()
    }
}

fn redact_url(url: &str) -> String {
    let Some(scheme_end) = url.find("://") else {
        return url.to_string();
    };
    let rest_start = scheme_end + 3;
    let rest = &url[rest_start..];
    let authority_end = rest.find(['/', '?', '#']).unwrap_or(rest.len());
    let authority = &rest[..authority_end];
    let Some(at) = authority.rfind('@') else {
        return url.to_string();
    };
    let userinfo = &authority[..at];
    let Some(colon) = userinfo.find(':') else {
        return url.to_string();
    };
    format!(
        "{}{}:***{}",
        &url[..rest_start],
        &userinfo[..colon],
        &rest[at..]
    )
}

fn parse_flag(raw: &str) -> bool {
    matches!(
        raw.to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_when_nothing_is_set() {
        let cfg = AppConfig::from_lookup(|_| None);
        assert_eq!(cfg, AppConfig::default());
        assert_eq!(cfg.database_url, DEFAULT_DATABASE_URL);
        assert!(cfg.reload_on_input);
    }

    #[test]
    fn reads_every_key() {
        let cfg = AppConfig::from_lookup(lookup_from(&[
            ("DATABASE_URL", "postgres://u:p@localhost/nifty"),
            ("NIFTY_LOG_DIR", "/tmp/nifty-logs"),
            ("NIFTY_REFRESH_SECS", "30"),
            ("NIFTY_RELOAD_ON_INPUT", "off"),
        ]));
        assert_eq!(cfg.database_url, "postgres://u:p@localhost/nifty");
        assert_eq!(cfg.log_dir, PathBuf::from("/tmp/nifty-logs"));
        assert_eq!(cfg.refresh_secs, 30);
        assert!(!cfg.reload_on_input);
    }

    #[test]
    fn blank_or_invalid_values_fall_back() {
        let cfg = AppConfig::from_lookup(lookup_from(&[
            ("DATABASE_URL", "   "),
            ("NIFTY_REFRESH_SECS", "soon"),
        ]));
        assert_eq!(cfg.database_url, DEFAULT_DATABASE_URL);
        assert_eq!(cfg.refresh_secs, 0);
    }

    #[test]
    fn logged_form_hides_the_password() {
        let cfg = AppConfig::from_lookup(lookup_from(&[(
            "DATABASE_URL",
            "postgres://nifty:s3cr3t@db:5432/nifty?sslmode=disable",
        )]));
        let logged = format!("启动配置: {:?}", cfg);
        assert!(!logged.contains("s3cr3t"));
        assert!(logged.contains("postgres://nifty:***@db:5432/nifty?sslmode=disable"));
        assert!(!cfg.redacted_url().contains("s3cr3t"));
    }

    #[test]
    fn urls_without_password_are_unchanged() {
        assert_eq!(redact_url(DEFAULT_DATABASE_URL), DEFAULT_DATABASE_URL);
        assert_eq!(redact_url("postgres://nifty@db/nifty"), "postgres://nifty@db/nifty");
        assert_eq!(redact_url("sqlite::memory:"), "sqlite::memory:");
        assert_eq!(redact_url("postgres://u:p@w@db/x"), "postgres://u:***@db/x");
    }
}
