use anyhow::{anyhow, bail, Context, Result};
use geofacet_core::{parse_facet_filters, Command, DateRange, Viewport};
use std::fs;
use std::path::Path;
use tracing::warn;

use crate::Cli;

/// Translate command-line selections into commands
///
/// Scope and filters come first, then the sort, and the text query last so
/// its debounced recompute sees everything else already applied.
pub fn commands_from_cli(cli: &Cli) -> Result<Vec<Command>> {
    let mut commands = Vec::new();

    if let Some(bbox) = &cli.bbox {
        let viewport = Viewport::parse(bbox)
            .ok_or_else(|| anyhow!("Invalid --bbox '{}'. Expected 'north,south,east,west'", bbox))?;
        commands.push(Command::SetViewport {
            viewport: Some(viewport),
        });
    }

    for facet_str in &cli.facets {
        if !facet_str.contains('=') {
            warn!("Invalid facet format '{}'. Expected 'field=value'", facet_str);
        }
    }
    for (field, values) in parse_facet_filters(&cli.facets) {
        commands.push(Command::SetTermsFilter { field, values });
    }

    for range_str in &cli.ranges {
        let (field, range) = range_str
            .split_once('=')
            .ok_or_else(|| anyhow!("Invalid range format '{}'. Expected 'field=START..END'", range_str))?;
        let Some(range) = DateRange::parse(range) else {
            bail!("Invalid date range '{}' for '{}'", range, field.trim());
        };
        commands.push(Command::SetRangeFilter {
            field: field.trim().to_string(),
            range: vec![range.start, range.end],
        });
    }

    for taxonomy_str in &cli.taxonomies {
        if !taxonomy_str.contains('=') {
            warn!("Invalid taxonomy format '{}'. Expected 'field=path'", taxonomy_str);
        }
    }
    for (field, paths) in parse_facet_filters(&cli.taxonomies) {
        commands.push(Command::SetTaxonomyFilter { field, paths });
    }

    if let Some(key) = &cli.sort {
        commands.push(Command::SetSort { key: key.clone() });
    }

    if let Some(text) = &cli.query {
        commands.push(Command::SetQuery { text: text.clone() });
    }

    Ok(commands)
}

/// Read a JSON array of commands
pub fn load_command_script<P: AsRef<Path>>(path: P) -> Result<Vec<Command>> {
    let path = path.as_ref();
    let contents = fs::read_to_string(path)
        .with_context(|| format!("Failed to read command script {}", path.display()))?;
    serde_json::from_str(&contents)
        .with_context(|| format!("Invalid command script {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;
    use serde_json::json;

    fn cli(args: &[&str]) -> Cli {
        let mut argv = vec!["geofacet", "-c", "config.json", "-d", "items.json"];
        argv.extend_from_slice(args);
        Cli::parse_from(argv)
    }

    #[test]
    fn test_no_selections_means_no_commands() {
        assert!(commands_from_cli(&cli(&[])).unwrap().is_empty());
    }

    #[test]
    fn test_facets_are_grouped_per_field() {
        let commands = commands_from_cli(&cli(&[
            "--facet",
            "mainSpace=Wall",
            "--facet",
            "mainSpace=Cave",
            "--facet",
            "missing-separator",
        ]))
        .unwrap();

        assert_eq!(
            commands,
            vec![Command::SetTermsFilter {
                field: "mainSpace".to_string(),
                values: vec!["Wall".to_string(), "Cave".to_string()],
            }]
        );
    }

    #[test]
    fn test_query_comes_last() {
        let commands = commands_from_cli(&cli(&[
            "--query",
            "fresco",
            "--sort",
            "year_desc",
            "--bbox",
            "-10,-20,30,20",
            "--taxonomy",
            "region=Alps > Mont Blanc",
        ]))
        .unwrap();

        assert_eq!(commands.len(), 4);
        assert!(matches!(commands[0], Command::SetViewport { viewport: Some(_) }));
        assert!(matches!(commands[1], Command::SetTaxonomyFilter { .. }));
        assert!(matches!(commands[2], Command::SetSort { .. }));
        assert!(commands[3].is_debounced());
    }

    #[test]
    fn test_range_parsing() {
        let commands = commands_from_cli(&cli(&["--range", "year=1970..1970-01-02"])).unwrap();
        assert_eq!(
            commands,
            vec![Command::SetRangeFilter {
                field: "year".to_string(),
                range: vec![0, 86_400_000],
            }]
        );

        assert!(commands_from_cli(&cli(&["--range", "year=1970"])).is_err());
        assert!(commands_from_cli(&cli(&["--range", "1950..1960"])).is_err());
        assert!(commands_from_cli(&cli(&["--range", "year=1980..1970"])).is_err());
    }

    #[test]
    fn test_invalid_bbox() {
        assert!(commands_from_cli(&cli(&["--bbox", "1,2,3"])).is_err());
    }

    #[test]
    fn test_load_command_script() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("session.json");
        let script = json!([
            {"command": "toggleTerm", "field": "mainSpace", "value": "Wall", "selected": true},
            {"command": "clearFilters"}
        ]);
        fs::write(&path, script.to_string()).unwrap();

        let commands = load_command_script(&path).unwrap();
        assert_eq!(commands.len(), 2);
        assert_eq!(commands[1], Command::ClearFilters);
    }
}
