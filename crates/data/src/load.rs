use crate::schema::ItemRecord;
use anyhow::Context;
use divedraw_core::{Item, MachineConfig};
use serde::de::DeserializeOwned;
use std::fs;
use std::io::Read;
use std::path::Path;
use tracing::{debug, info};

pub fn load_items(path: &Path) -> anyhow::Result<Vec<Item>> {
    let file = fs::File::open(path).with_context(|| format!("open {}", path.display()))?;
    let items = read_items(file).with_context(|| format!("parse {}", path.display()))?;
    info!(path = %path.display(), items = items.len(), "loaded dataset");
    Ok(items)
}

/// Reads loadout rows, trimming every cell. Rows without a name are dropped.
pub fn read_items<R: Read>(reader: R) -> anyhow::Result<Vec<Item>> {
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .flexible(true)
        .from_reader(reader);
    let mut items = Vec::new();
    for (line, record) in reader.deserialize::<ItemRecord>().enumerate() {
        let record = record.with_context(|| format!("read row {}", line + 1))?;
        if record.name.is_empty() {
            debug!(row = line + 1, "skipping row without a name");
            continue;
        }
        items.push(Item::from(record));
    }
    Ok(items)
}

pub fn load_machine_config(path: &Path) -> anyhow::Result<MachineConfig> {
    let config: MachineConfig = load_json(path)?;
    config
        .validate()
        .with_context(|| format!("validate {}", path.display()))?;
    Ok(config)
}

/// Config from `path` when given, otherwise the built-in loadout machine.
pub fn load_machine_config_or_default(path: Option<&Path>) -> anyhow::Result<MachineConfig> {
    match path {
        Some(path) => load_machine_config(path),
        None => Ok(MachineConfig::default()),
    }
}

fn load_json<T: DeserializeOwned>(path: &Path) -> anyhow::Result<T> {
    let raw = fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
    let value = serde_json::from_str(&raw).with_context(|| format!("parse {}", path.display()))?;
    Ok(value)
}
