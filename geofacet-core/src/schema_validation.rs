use serde_json::{json, Value};
use std::sync::LazyLock;

/// Shape every dataset must have before records are read
pub static DATASET_SCHEMA: LazyLock<Value> = LazyLock::new(|| {
    json!({
        "$schema": "http://json-schema.org/draft-07/schema#",
        "type": "array",
        "items": {
            "type": "object",
            "properties": {
                "id": {"type": ["string", "number"]},
                "latitude": {
                    "anyOf": [
                        {"type": "number", "minimum": -90, "maximum": 90},
                        {"type": "string", "pattern": "^\\s*-?[0-9]+(\\.[0-9]+)?\\s*$"},
                        {"type": "null"}
                    ]
                },
                "longitude": {
                    "anyOf": [
                        {"type": "number", "minimum": -180, "maximum": 180},
                        {"type": "string", "pattern": "^\\s*-?[0-9]+(\\.[0-9]+)?\\s*$"},
                        {"type": "null"}
                    ]
                }
            }
        }
    })
});

/// Validate data against JSON Schema
/// Returns Ok(()) if valid, Err with list of validation errors if invalid
pub fn validate_against_schema(schema: &Value, data: &Value) -> Result<(), Vec<String>> {
    // Compile the JSON Schema
    let compiled = jsonschema::validator_for(schema)
        .map_err(|e| vec![format!("Schema compilation error: {}", e)])?;

    match compiled.validate(data) {
        Ok(()) => Ok(()),
        Err(error) => {
            // Format validation error with path
            let path_str = error.instance_path.to_string();
            let location = if path_str.is_empty() {
                "root".to_string()
            } else {
                path_str
            };
            Err(vec![format!("{} at {}", error, location)])
        }
    }
}

/// Validate a raw dataset against [`DATASET_SCHEMA`]
pub fn validate_dataset(data: &Value) -> Result<(), Vec<String>> {
    validate_against_schema(&DATASET_SCHEMA, data)
}
