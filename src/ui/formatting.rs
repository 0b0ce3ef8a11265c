use geofacet_core::models::format_number;
use geofacet_core::{
    format_instant, Aggregations, DateRange, FacetConfig, FacetKind, FilterValue, Item,
    TaxonomyForest, Update, Viewport,
};
use serde::Serialize;
use std::collections::BTreeMap;

/// Fields tried, in order, for an item's display label
const LABEL_FIELDS: [&str; 2] = ["title", "name"];

/// Label for an item: its title or name, falling back to the id
pub fn item_label(item: &Item) -> String {
    LABEL_FIELDS
        .iter()
        .find_map(|field| item.get_as_string(field))
        .unwrap_or_else(|| item.id.clone())
}

pub fn format_range(range: &DateRange) -> String {
    format!("{} to {}", format_instant(range.start), format_instant(range.end))
}

pub fn format_viewport(viewport: &Viewport) -> String {
    format!(
        "N {}, S {}, E {}, W {}",
        format_number(viewport.north),
        format_number(viewport.south),
        format_number(viewport.east),
        format_number(viewport.west)
    )
}

/// Human-readable form of an active filter
pub fn format_filter(filter: &FilterValue) -> String {
    match filter {
        FilterValue::Terms(values) | FilterValue::Taxonomy(values) => values
            .iter()
            .map(String::as_str)
            .collect::<Vec<_>>()
            .join(" OR "),
        FilterValue::Chronology(Some(range)) => format_range(range),
        FilterValue::Chronology(None) => String::new(),
    }
}

fn format_item(item: &Item, facets: &BTreeMap<String, FacetConfig>) -> Vec<String> {
    let mut lines = vec![match &item.location {
        Some(point) => format!(
            "- **{}** (`{}`) at {}, {}",
            item_label(item),
            item.id,
            format_number(point.latitude),
            format_number(point.longitude)
        ),
        None => format!("- **{}** (`{}`)", item_label(item), item.id),
    }];

    for (field, facet) in facets {
        let values = item.values(field);
        if !values.is_empty() {
            lines.push(format!(
                "  - {}: {}",
                facet.display_title(field),
                values.join(", ")
            ));
        }
    }

    lines
}

/// Indented outline of a taxonomy forest, parents before children
pub fn format_taxonomy(forest: &TaxonomyForest) -> Vec<String> {
    forest
        .depth_first()
        .into_iter()
        .map(|node| format!("{}- {} ({})", "  ".repeat(node.depth), node.key, node.doc_count))
        .collect()
}

fn format_facet(
    field: &str,
    facet: &FacetConfig,
    update: &Update<'_>,
    lines: &mut Vec<String>,
) {
    lines.push(format!("### {}\n", facet.display_title(field)));

    if let Some(extent) = update.extents.get(field) {
        lines.push(format!("_Extent: {}_\n", format_range(extent)));
    }

    let buckets = update.aggregations.get(field).map(Vec::as_slice).unwrap_or_default();
    if buckets.is_empty() {
        lines.push("_No values._\n".to_string());
        return;
    }

    match (facet.kind, update.taxonomies.get(field)) {
        (FacetKind::Taxonomy, Some(forest)) => lines.extend(format_taxonomy(forest)),
        _ => lines.extend(
            buckets
                .iter()
                .map(|bucket| format!("- {} ({})", bucket.key, bucket.doc_count)),
        ),
    }
    lines.push(String::new());
}

/// Render an update as a markdown report
pub fn render_markdown(
    update: &Update<'_>,
    facets: &BTreeMap<String, FacetConfig>,
    limit: Option<usize>,
) -> String {
    let state = update.state;
    let mut lines = vec!["# Search Results\n".to_string()];

    if !state.query.trim().is_empty() {
        lines.push(format!("**Query:** {}\n", state.query));
    }
    lines.push(format!("**Sorted by:** {}\n", state.sort));
    if let Some(viewport) = &state.viewport {
        lines.push(format!("**Viewport:** {}\n", format_viewport(viewport)));
    }

    if state.filters.has_filters() {
        lines.push("## Active Filters\n".to_string());
        for (field, filter) in state.filters.active() {
            let title = facets.get(field).map_or(field.as_str(), |f| f.display_title(field));
            lines.push(format!("- **{}:** {}", title, format_filter(filter)));
        }
        lines.push(String::new());
    }

    lines.push(format!("**Matching Items:** {}\n", update.items.len()));

    if update.items.is_empty() {
        lines.push("_No items match the current selection._\n".to_string());
    } else {
        let shown = limit.unwrap_or(update.items.len()).min(update.items.len());
        for item in &update.items[..shown] {
            lines.extend(format_item(item, facets));
        }
        lines.push(String::new());
        if shown < update.items.len() {
            lines.push(format!("_Showing {} of {} items._\n", shown, update.items.len()));
        }
    }

    if !facets.is_empty() {
        lines.push("## Facets\n".to_string());
        for (field, facet) in facets {
            format_facet(field, facet, update, &mut lines);
        }
    }

    let mut output = lines.join("\n");
    output.push('\n');
    output
}

#[derive(Serialize)]
struct JsonReport<'a> {
    query: &'a str,
    sort: &'a str,
    total: usize,
    items: &'a [&'a Item],
    aggregations: &'a Aggregations,
    taxonomies: &'a BTreeMap<String, TaxonomyForest>,
    extents: &'a BTreeMap<String, DateRange>,
}

/// Render an update as pretty-printed JSON
pub fn render_json(update: &Update<'_>, limit: Option<usize>) -> serde_json::Result<String> {
    let shown = limit.unwrap_or(update.items.len()).min(update.items.len());
    let report = JsonReport {
        query: &update.state.query,
        sort: &update.state.sort,
        total: update.items.len(),
        items: &update.items[..shown],
        aggregations: update.aggregations,
        taxonomies: update.taxonomies,
        extents: update.extents,
    };

    let mut output = serde_json::to_string_pretty(&report)?;
    output.push('\n');
    Ok(output)
}
