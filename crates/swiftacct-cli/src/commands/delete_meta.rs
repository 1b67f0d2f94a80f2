use super::{finish_update, spin_fail, spinner, Service};

pub fn run(service: &Service, keys: &[String], json: bool) -> Result<u8, String> {
    let pb = spinner("removing metadata…");
    let acknowledged = service.delete_metadata_keys(keys).map_err(|e| {
        spin_fail(&pb, "metadata removal failed");
        e.to_string()
    })?;

    let keys: Vec<&str> = keys.iter().map(String::as_str).collect();
    finish_update(&pb, "delete-meta", &keys, acknowledged, json)
}
