use super::{finish_update, spin_fail, spinner, Service};
use swiftacct_client::MetadataMap;

pub fn run(service: &Service, entries: &[(String, String)], json: bool) -> Result<u8, String> {
    let metadata: MetadataMap = entries.iter().cloned().collect();

    let pb = spinner("updating metadata…");
    let acknowledged = service.update_metadata(&metadata).map_err(|e| {
        spin_fail(&pb, "metadata update failed");
        e.to_string()
    })?;

    let keys: Vec<&str> = metadata.keys().map(String::as_str).collect();
    finish_update(&pb, "set-meta", &keys, acknowledged, json)
}
