use crate::config::EngineConfig;
use crate::engine::Engine;
use crate::error::{Error, Result};
use crate::models::Item;
use crate::schema_validation::validate_dataset;
use serde_json::Value;
use std::fs;
use std::path::Path;
use tracing::debug;

fn read(path: &Path) -> Result<String> {
    fs::read_to_string(path).map_err(|source| Error::Io {
        path: path.to_path_buf(),
        source,
    })
}

/// Parse the configuration object
pub fn parse_config(contents: &str) -> Result<EngineConfig> {
    serde_json::from_str(contents).map_err(|source| Error::Json {
        context: "configuration".to_string(),
        source,
    })
}

/// Parse and validate a dataset: a JSON array of flat records
pub fn parse_dataset(contents: &str) -> Result<Vec<Item>> {
    let raw: Value = serde_json::from_str(contents).map_err(|source| Error::Json {
        context: "dataset".to_string(),
        source,
    })?;

    validate_dataset(&raw).map_err(Error::InvalidDataset)?;

    let records = raw.as_array().map(Vec::as_slice).unwrap_or_default();
    let items = records
        .iter()
        .enumerate()
        .map(|(position, record)| Item::from_record(position, record))
        .collect::<Result<Vec<_>>>()?;

    let located = items.iter().filter(|item| item.location.is_some()).count();
    debug!(items = items.len(), located, "dataset parsed");
    Ok(items)
}

/// Load the configuration object from a JSON file
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<EngineConfig> {
    parse_config(&read(path.as_ref())?)
}

/// Load a dataset from a JSON file
pub fn load_dataset<P: AsRef<Path>>(path: P) -> Result<Vec<Item>> {
    parse_dataset(&read(path.as_ref())?)
}

/// Load both files and build an engine; any failure aborts construction
pub fn load_engine<C: AsRef<Path>, D: AsRef<Path>>(config_path: C, data_path: D) -> Result<Engine> {
    let config = load_config(config_path)?;
    let items = load_dataset(data_path)?;
    Engine::new(config, items)
}
