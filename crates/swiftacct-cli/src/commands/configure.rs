use super::{json_pretty, Connection, EXIT_SUCCESS};
use swiftacct_client::AccountConfig;

pub fn run(
    conn: &Connection<'_>,
    url: &str,
    timeout: Option<u64>,
    json: bool,
) -> Result<u8, String> {
    if url.trim().is_empty() {
        return Err("config error: url must not be empty".to_owned());
    }
    let path = conn.config_path()?;

    let mut config = AccountConfig::new(url);
    if let Some(token) = conn.token {
        config = config.with_token(token);
    }
    if let Some(secs) = timeout {
        config = config.with_timeout(secs);
    }
    config
        .save(&path)
        .map_err(|e| format!("config error: {}: {e}", path.display()))?;

    if json {
        let payload = serde_json::json!({
            "config": path.display().to_string(),
            "url": config.url,
            "auth_token_set": config.auth_token.is_some(),
            "timeout_secs": config.timeout_secs,
        });
        println!("{}", json_pretty(&payload)?);
    } else {
        println!("wrote {}", path.display());
    }
    Ok(EXIT_SUCCESS)
}
