use std::{
    fs::{create_dir_all, read_to_string},
    io::Write,
    path::Path,
};

use _model::Snapshot;
use anyhow::{Context, Result};
use tempfile::NamedTempFile;
use ureq::Agent;

/// Replaces the snapshot at `path`. The document goes to a temp file next to
/// it first and is renamed into place, so readers see the old or the new one.
pub fn write(path: &Path, snapshot: &Snapshot) -> Result<()> {
    let dir = match path.parent() {
        Some(x) if !x.as_os_str().is_empty() => x,
        _ => Path::new("."),
    };
    create_dir_all(dir).with_context(|| format!("Failed to create {}", dir.display()))?;

    let mut output = serde_json::to_string_pretty(snapshot)?;
    output.push('\n');

    let mut file = NamedTempFile::new_in(dir)
        .with_context(|| format!("Failed to create temp file in {}", dir.display()))?;
    file.write_all(output.as_bytes())?;
    file.as_file().sync_all()?;
    file.persist(path)
        .with_context(|| format!("Failed to replace {}", path.display()))?;

    Ok(())
}

/// Reads a snapshot from a file or, for http(s) locations, over the network.
pub fn load(location: &str, agent: &Agent) -> Result<Snapshot> {
    let raw = if location.starts_with("http://") || location.starts_with("https://") {
        agent.get(location).call()?.into_string()?
    } else {
        read_to_string(location)?
    };
    Ok(serde_json::from_str(&raw)?)
}
