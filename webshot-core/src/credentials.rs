// Loading of per-host Basic-auth credentials

use std::collections::HashMap;
use std::fs;
use std::path::Path;
use webshot_spider::Credential;

/// Read a JSON credential map of the form
/// `{ "intranet.example.com": { "user": "bob", "password": "..." } }`.
/// Host keys are lowercased.
pub fn load_credentials(path: &Path) -> Result<HashMap<String, Credential>, String> {
    let content = fs::read_to_string(path)
        .map_err(|e| format!("Failed to read credentials file {}: {}", path.display(), e))?;

    parse_credentials(&content)
        .map_err(|e| format!("Invalid credentials file {}: {}", path.display(), e))
}

pub fn parse_credentials(content: &str) -> Result<HashMap<String, Credential>, String> {
    let raw: HashMap<String, Credential> =
        serde_json::from_str(content).map_err(|e| e.to_string())?;

    Ok(raw
        .into_iter()
        .map(|(host, credential)| (host.trim().to_lowercase(), credential))
        .filter(|(host, _)| !host.is_empty())
        .collect())
}
