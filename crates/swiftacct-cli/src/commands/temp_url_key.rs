use super::{finish_update, spin_fail, spinner, Service};

pub fn run(service: &Service, key: &str, json: bool) -> Result<u8, String> {
    let pb = spinner("rotating temporary URL key…");
    let acknowledged = service.update_temporary_url_key(key).map_err(|e| {
        spin_fail(&pb, "key rotation failed");
        e.to_string()
    })?;

    finish_update(&pb, "temp-url-key", &[], acknowledged, json)
}
