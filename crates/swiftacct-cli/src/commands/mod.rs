pub mod completions;
pub mod configure;
pub mod delete_meta;
pub mod set_meta;
pub mod show;
pub mod temp_url_key;

use indicatif::{ProgressBar, ProgressStyle};
use std::path::{Path, PathBuf};
use std::time::Duration;
use swiftacct_client::config::default_config_path;
use swiftacct_client::http::HttpTransport;
use swiftacct_client::{AccountConfig, AccountService};

pub const EXIT_SUCCESS: u8 = 0;
pub const EXIT_FAILURE: u8 = 1;
pub const EXIT_NOT_ACKNOWLEDGED: u8 = 2;
pub const EXIT_CONFIG_ERROR: u8 = 3;

pub type Service = AccountService<HttpTransport>;

/// Connection settings given on the command line or through the environment.
#[derive(Debug, Clone, Copy, Default)]
pub struct Connection<'a> {
    pub url: Option<&'a str>,
    pub token: Option<&'a str>,
    pub config: Option<&'a Path>,
}

impl Connection<'_> {
    pub fn config_path(&self) -> Result<PathBuf, String> {
        match self.config {
            Some(path) => Ok(path.to_path_buf()),
            None => default_config_path().map_err(|e| format!("config error: {e}")),
        }
    }
}

pub fn json_pretty(value: &impl serde::Serialize) -> Result<String, String> {
    serde_json::to_string_pretty(value).map_err(|e| format!("JSON serialization failed: {e}"))
}

pub fn spinner(msg: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::with_template("{spinner:.cyan} {msg}")
            .expect("valid template")
            .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"]),
    );
    pb.set_message(msg.to_owned());
    pb.enable_steady_tick(Duration::from_millis(80));
    pb
}

pub fn spin_ok(pb: &ProgressBar, msg: &str) {
    pb.set_style(ProgressStyle::with_template("{msg}").expect("valid template"));
    pb.finish_with_message(format!("✓ {msg}"));
}

pub fn spin_fail(pb: &ProgressBar, msg: &str) {
    pb.set_style(ProgressStyle::with_template("{msg}").expect("valid template"));
    pb.finish_with_message(format!("✗ {msg}"));
}

/// Parse a `KEY=VALUE` argument. The value may be empty; the key may not.
pub fn parse_key_value(arg: &str) -> Result<(String, String), String> {
    let (key, value) = arg
        .split_once('=')
        .ok_or_else(|| format!("expected KEY=VALUE, got '{arg}'"))?;
    if key.is_empty() {
        return Err(format!("empty key in '{arg}'"));
    }
    Ok((key.to_owned(), value.to_owned()))
}

/// Merge the config file (explicit `--config`, else the default path if it
/// exists) with `--url` and `--token` overrides.
pub fn resolve_config(conn: &Connection<'_>) -> Result<AccountConfig, String> {
    let from_file = match conn.config {
        Some(path) => Some(load_config(path)?),
        None => match default_config_path() {
            Ok(path) if path.exists() => Some(load_config(&path)?),
            _ => None,
        },
    };

    let mut config = match (conn.url, from_file) {
        (Some(url), Some(file)) => AccountConfig {
            url: AccountConfig::new(url).url,
            ..file
        },
        (Some(url), None) => AccountConfig::new(url),
        (None, Some(file)) => file,
        (None, None) => {
            return Err("config error: no --url given and no config file found".to_owned());
        }
    };
    if let Some(token) = conn.token {
        config.auth_token = Some(token.to_owned());
    }
    Ok(config)
}

fn load_config(path: &Path) -> Result<AccountConfig, String> {
    AccountConfig::load(path).map_err(|e| format!("config error: {}: {e}", path.display()))
}

pub fn connect(conn: &Connection<'_>) -> Result<Service, String> {
    let config = resolve_config(conn)?;
    tracing::debug!("account URL: {}", config.url);
    Ok(AccountService::new(HttpTransport::new(config)))
}

/// Report the outcome of a mutating request and pick the exit code.
///
/// `keys` are echoed back to the user, so callers must never pass secrets.
pub fn finish_update(
    pb: &ProgressBar,
    action: &str,
    keys: &[&str],
    acknowledged: bool,
    json: bool,
) -> Result<u8, String> {
    if acknowledged {
        spin_ok(pb, &format!("{action} acknowledged"));
    } else {
        spin_fail(pb, &format!("{action} not acknowledged"));
    }

    if json {
        let payload = serde_json::json!({
            "action": action,
            "keys": keys,
            "acknowledged": acknowledged,
        });
        println!("{}", json_pretty(&payload)?);
    } else if acknowledged {
        if keys.is_empty() {
            println!("{action}: done");
        } else {
            println!("{action}: {}", keys.join(", "));
        }
    } else {
        eprintln!("warning: the server did not acknowledge {action}");
    }

    Ok(if acknowledged {
        EXIT_SUCCESS
    } else {
        EXIT_NOT_ACKNOWLEDGED
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_key_value_splits_on_first_equals() {
        assert_eq!(
            parse_key_value("Color=red").unwrap(),
            ("Color".to_owned(), "red".to_owned())
        );
        assert_eq!(
            parse_key_value("expr=a=b").unwrap(),
            ("expr".to_owned(), "a=b".to_owned())
        );
        assert_eq!(
            parse_key_value("blank=").unwrap(),
            ("blank".to_owned(), String::new())
        );
    }

    #[test]
    fn parse_key_value_rejects_missing_parts() {
        assert!(parse_key_value("novalue").is_err());
        assert!(parse_key_value("=value").is_err());
    }

    #[test]
    fn resolve_config_from_explicit_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("account.json");
        AccountConfig::new("http://localhost:8322/v1/AUTH_a")
            .with_token("file-token")
            .with_timeout(5)
            .save(&path)
            .unwrap();

        let config = resolve_config(&Connection {
            config: Some(&path),
            ..Connection::default()
        })
        .unwrap();
        assert_eq!(config.url, "http://localhost:8322/v1/AUTH_a");
        assert_eq!(config.auth_token.as_deref(), Some("file-token"));
        assert_eq!(config.timeout_secs, Some(5));
    }

    #[test]
    fn resolve_config_flags_override_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("account.json");
        AccountConfig::new("http://localhost:8322/v1/AUTH_a")
            .with_token("file-token")
            .with_timeout(5)
            .save(&path)
            .unwrap();

        let config = resolve_config(&Connection {
            url: Some("http://other:1/v1/AUTH_b/"),
            token: Some("flag-token"),
            config: Some(&path),
        })
        .unwrap();
        assert_eq!(config.url, "http://other:1/v1/AUTH_b");
        assert_eq!(config.auth_token.as_deref(), Some("flag-token"));
        assert_eq!(config.timeout_secs, Some(5));
    }

    #[test]
    fn resolve_config_missing_explicit_file_is_config_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("absent.json");
        let err = resolve_config(&Connection {
            url: Some("http://localhost:1"),
            config: Some(&path),
            ..Connection::default()
        })
        .unwrap_err();
        assert!(err.starts_with("config error:"), "{err}");
    }

    #[test]
    fn exit_codes_are_distinct() {
        assert_ne!(EXIT_SUCCESS, EXIT_FAILURE);
        assert_ne!(EXIT_FAILURE, EXIT_NOT_ACKNOWLEDGED);
        assert_ne!(EXIT_NOT_ACKNOWLEDGED, EXIT_CONFIG_ERROR);
    }

    #[test]
    fn json_pretty_serializes_object() {
        let val = serde_json::json!({"key": "value"});
        let result = json_pretty(&val).unwrap();
        assert!(result.contains("\"key\""));
        assert!(result.contains("\"value\""));
    }

    #[test]
    fn spinner_finishes() {
        let pb = spinner("testing...");
        spin_ok(&pb, "done");
        let pb = spinner("testing...");
        spin_fail(&pb, "failed");
    }
}
