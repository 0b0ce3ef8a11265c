use crate::config::EngineConfig;
use std::collections::HashSet;

/// Validate an engine configuration
/// Returns Ok(()) if valid, or Err(Vec<String>) with validation errors
pub fn validate_config(config: &EngineConfig) -> Result<(), Vec<String>> {
    let mut errors = Vec::new();

    let default_sort = &config.search_config.default_sort;
    if default_sort.trim().is_empty() {
        errors.push("searchConfig.defaultSort cannot be empty".to_string());
    } else if config.resolve_sort(default_sort).is_none() {
        errors.push(format!(
            "searchConfig.defaultSort '{}' is neither a configured sorting nor of the form <field>_asc/<field>_desc",
            default_sort
        ));
    }

    validate_sort_options(config, &mut errors);

    for (key, spec) in &config.sortings {
        if spec.field.trim().is_empty() {
            errors.push(format!("Sorting '{}' must name a field", key));
        }
    }

    for field in config.aggregations.keys() {
        if field.trim().is_empty() {
            errors.push("Facet field names cannot be empty".to_string());
        }
    }

    for field in &config.searchable_fields {
        if field.trim().is_empty() {
            errors.push("searchableFields cannot contain empty names".to_string());
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn validate_sort_options(config: &EngineConfig, errors: &mut Vec<String>) {
    let mut seen = HashSet::new();

    for option in &config.search_config.sort_options {
        if !seen.insert(&option.value) {
            errors.push(format!("Sort option '{}' is listed twice", option.value));
        }
        if config.resolve_sort(&option.value).is_none() {
            errors.push(format!(
                "Sort option '{}' ('{}') cannot be resolved to a field",
                option.value, option.label
            ));
        }
    }
}
