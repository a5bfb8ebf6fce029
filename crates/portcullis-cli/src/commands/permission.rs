use portcullis_core::PermissionGate;
use serde::Serialize;

#[derive(Debug, Serialize)]
struct PermissionReport<'a> {
    name: &'a str,
    origin: &'a str,
    granted: bool,
}

pub fn run(name: &str, origin: &str) -> anyhow::Result<()> {
    let granted = PermissionGate::new().check(name, origin);
    let report = PermissionReport { name, origin, granted };
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}
