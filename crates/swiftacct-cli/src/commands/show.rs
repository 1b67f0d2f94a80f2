use super::{json_pretty, spin_fail, spin_ok, spinner, Service, EXIT_SUCCESS};
use console::Style;

pub fn run(service: &Service, json: bool) -> Result<u8, String> {
    let pb = spinner("reading account…");
    let account = service.get_account().map_err(|e| {
        spin_fail(&pb, "account read failed");
        e.to_string()
    })?;
    spin_ok(&pb, "account read");

    if json {
        println!("{}", json_pretty(&account)?);
        return Ok(EXIT_SUCCESS);
    }

    let temp_url_key = if account.has_temp_url_key() {
        Style::new().green().apply_to("set").to_string()
    } else {
        Style::new().dim().apply_to("not set").to_string()
    };
    println!("containers:    {}", account.container_count());
    println!("objects:       {}", account.object_count());
    println!("bytes used:    {}", account.bytes_used());
    println!("temp URL key:  {temp_url_key}");
    if account.metadata().is_empty() {
        println!("metadata:      (none)");
    } else {
        println!("metadata:");
        for (key, value) in account.metadata() {
            println!("  {}: {value}", Style::new().cyan().apply_to(key));
        }
    }
    Ok(EXIT_SUCCESS)
}
