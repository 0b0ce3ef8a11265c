use crate::chronology::{parse_field_dates, DateRange};
use crate::config::{FacetConfig, FacetKind};
use crate::models::Item;
use crate::taxonomy::HIERARCHY_DELIMITER;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// The selection held for one facet
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "lowercase")]
pub enum FilterValue {
    Terms(BTreeSet<String>),
    Chronology(Option<DateRange>),
    Taxonomy(BTreeSet<String>),
}

impl FilterValue {
    /// The unconstrained value for a facet kind
    pub fn empty(kind: FacetKind) -> Self {
        match kind {
            FacetKind::Terms => FilterValue::Terms(BTreeSet::new()),
            FacetKind::Chronology => FilterValue::Chronology(None),
            FacetKind::Taxonomy => FilterValue::Taxonomy(BTreeSet::new()),
        }
    }

    pub fn kind(&self) -> FacetKind {
        match self {
            FilterValue::Terms(_) => FacetKind::Terms,
            FilterValue::Chronology(_) => FacetKind::Chronology,
            FilterValue::Taxonomy(_) => FacetKind::Taxonomy,
        }
    }

    pub fn is_empty(&self) -> bool {
        match self {
            FilterValue::Terms(values) | FilterValue::Taxonomy(values) => values.is_empty(),
            FilterValue::Chronology(range) => range.is_none(),
        }
    }
}

/// Selections for every configured facet
///
/// Every configured field always has an entry, possibly empty.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterState {
    filters: BTreeMap<String, FilterValue>,
}

impl FilterState {
    pub fn for_facets(facets: &BTreeMap<String, FacetConfig>) -> Self {
        let filters = facets
            .iter()
            .map(|(field, facet)| (field.clone(), FilterValue::empty(facet.kind)))
            .collect();
        Self { filters }
    }

    pub fn get(&self, field: &str) -> Option<&FilterValue> {
        self.filters.get(field)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &FilterValue)> {
        self.filters.iter()
    }

    /// Facets with a non-empty selection
    pub fn active(&self) -> impl Iterator<Item = (&String, &FilterValue)> {
        self.filters.iter().filter(|(_, value)| !value.is_empty())
    }

    pub fn has_filters(&self) -> bool {
        self.active().next().is_some()
    }

    /// Replace one facet's selection
    /// Returns `None` when the field is unknown or the value has the wrong kind
    pub fn with(&self, field: &str, value: FilterValue) -> Option<Self> {
        let current = self.filters.get(field)?;
        if current.kind() != value.kind() {
            return None;
        }

        let mut filters = self.filters.clone();
        filters.insert(field.to_string(), value);
        Some(Self { filters })
    }

    /// Same fields, every selection emptied
    pub fn cleared(&self) -> Self {
        let filters = self
            .filters
            .iter()
            .map(|(field, value)| (field.clone(), FilterValue::empty(value.kind())))
            .collect();
        Self { filters }
    }
}

/// Parse facet filter strings in the format "key=value" into a filter map
/// Multiple values for the same key are collected into a vector
pub fn parse_facet_filters(facet_strings: &[String]) -> BTreeMap<String, Vec<String>> {
    let mut facet_map = BTreeMap::new();

    for facet_str in facet_strings {
        if let Some((key, value)) = facet_str.split_once('=') {
            facet_map
                .entry(key.trim().to_string())
                .or_insert_with(Vec::new)
                .push(value.trim().to_string());
        }
    }

    facet_map
}

/// Check one facet's selection against an item
pub fn matches_facet(item: &Item, field: &str, filter: &FilterValue) -> bool {
    if filter.is_empty() {
        return true;
    }

    match filter {
        // OR within the facet
        FilterValue::Terms(selected) => item
            .values(field)
            .iter()
            .any(|value| selected.contains(&**value)),
        // Unparseable or missing dates fail closed
        FilterValue::Chronology(Some(range)) => item
            .get(field)
            .map(|value| parse_field_dates(value).into_iter().any(|d| range.contains(d)))
            .unwrap_or(false),
        FilterValue::Chronology(None) => true,
        FilterValue::Taxonomy(selected) => item.values(field).iter().any(|value| {
            selected
                .iter()
                .any(|path| is_within_path(value.as_ref(), path))
        }),
    }
}

/// True when the segments of `path` are a leading run of the segments of `value`
///
/// Both sides are split the way taxonomy forests split bucket keys, so a
/// node's path selects exactly the items counted under it.
/// "Alps > Mont Blanc" is within "Alps"; "Alps2" is not.
pub fn is_within_path(value: &str, path: &str) -> bool {
    let mut segments = value.split(HIERARCHY_DELIMITER);
    path.split(HIERARCHY_DELIMITER)
        .all(|wanted| segments.next() == Some(wanted))
}

/// Check if an item matches every active facet filter
/// AND between facets; `skip` leaves one facet out of the conjunction
pub fn matches_filters(item: &Item, filters: &FilterState, skip: Option<&str>) -> bool {
    filters
        .active()
        .filter(|(field, _)| Some(field.as_str()) != skip)
        .all(|(field, filter)| matches_facet(item, field, filter))
}

/// Fields whose active filter rejects the item, stopping once `limit` are found
pub fn failing_facets<'a>(item: &Item, filters: &'a FilterState, limit: usize) -> Vec<&'a str> {
    filters
        .active()
        .filter(|(field, filter)| !matches_facet(item, field, filter))
        .map(|(field, _)| field.as_str())
        .take(limit)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chronology::parse_date;
    use serde_json::json;

    fn item(record: serde_json::Value) -> Item {
        Item::from_record(0, &record).unwrap()
    }

    fn terms(values: &[&str]) -> FilterValue {
        FilterValue::Terms(values.iter().map(|v| v.to_string()).collect())
    }

    fn taxonomy(paths: &[&str]) -> FilterValue {
        FilterValue::Taxonomy(paths.iter().map(|v| v.to_string()).collect())
    }

    fn year_range(start: &str, end: &str) -> FilterValue {
        FilterValue::Chronology(DateRange::new(
            parse_date(start).unwrap(),
            parse_date(end).unwrap(),
        ))
    }

    fn facets() -> BTreeMap<String, FacetConfig> {
        BTreeMap::from([
            (
                "mainSpace".to_string(),
                FacetConfig::new("Main space", FacetKind::Terms),
            ),
            (
                "year".to_string(),
                FacetConfig::new("Year", FacetKind::Chronology),
            ),
            (
                "region".to_string(),
                FacetConfig::new("Region", FacetKind::Taxonomy),
            ),
        ])
    }

    #[test]
    fn test_terms_filter() {
        let wall = item(json!({"mainSpace": "Wall"}));

        assert!(matches_facet(&wall, "mainSpace", &terms(&[])));
        assert!(matches_facet(&wall, "mainSpace", &terms(&["Wall", "Cave"])));
        assert!(!matches_facet(&wall, "mainSpace", &terms(&["Cave"])));
    }

    #[test]
    fn test_terms_filter_on_numbers_and_lists() {
        let record = item(json!({"year": 1960, "tags": ["fresco", "church"]}));

        assert!(matches_facet(&record, "year", &terms(&["1960"])));
        assert!(matches_facet(&record, "tags", &terms(&["church"])));
        assert!(!matches_facet(&record, "missing", &terms(&["church"])));
    }

    #[test]
    fn test_chronology_filter() {
        let filter = year_range("1955", "1965");
        let years: Vec<bool> = [1950, 1960, 1970]
            .iter()
            .map(|year| matches_facet(&item(json!({"year": year.to_string()})), "year", &filter))
            .collect();

        assert_eq!(years, vec![false, true, false]);
    }

    #[test]
    fn test_chronology_filter_fails_closed() {
        let filter = year_range("1900", "2000");

        assert!(!matches_facet(&item(json!({"year": "unknown"})), "year", &filter));
        assert!(!matches_facet(&item(json!({})), "year", &filter));
        assert!(matches_facet(
            &item(json!({"year": "unknown"})),
            "year",
            &FilterValue::Chronology(None)
        ));
    }

    #[test]
    fn test_taxonomy_prefix_match() {
        let selected = taxonomy(&["Alps"]);

        assert!(matches_facet(&item(json!({"region": "Alps"})), "region", &selected));
        assert!(matches_facet(
            &item(json!({"region": "Alps > Mont Blanc"})),
            "region",
            &selected
        ));
        assert!(!matches_facet(&item(json!({"region": "Dolomites"})), "region", &selected));
        assert!(!matches_facet(&item(json!({"region": "Alps2"})), "region", &selected));
    }

    #[test]
    fn test_path_segments_compare_verbatim() {
        assert!(is_within_path("Alps >  Mont Blanc", "Alps"));
        assert!(is_within_path("Alps >  Mont Blanc", "Alps >  Mont Blanc"));
        assert!(!is_within_path("Alps >  Mont Blanc", "Alps > Mont Blanc"));
        assert!(!is_within_path("Alps > Mont Blanc", "Alps > Mont"));
        assert!(is_within_path("", ""));
        assert!(!is_within_path("Alps", ""));
    }

    #[test]
    fn test_conjunction_across_facets() {
        let wall = item(json!({"mainSpace": "Wall", "year": 1960}));
        let state = FilterState::for_facets(&facets());

        let cave_only = state.with("mainSpace", terms(&["Cave"])).unwrap();
        let with_year = cave_only.with("year", year_range("1955", "1965")).unwrap();
        assert!(!matches_filters(&wall, &cave_only, None));
        assert!(!matches_filters(&wall, &with_year, None));

        let wall_or_cave = state.with("mainSpace", terms(&["Wall", "Cave"])).unwrap();
        assert!(matches_filters(&wall, &wall_or_cave, None));
    }

    #[test]
    fn test_skip_leaves_facet_out() {
        let wall = item(json!({"mainSpace": "Wall"}));
        let state = FilterState::for_facets(&facets())
            .with("mainSpace", terms(&["Cave"]))
            .unwrap();

        assert!(!matches_filters(&wall, &state, None));
        assert!(matches_filters(&wall, &state, Some("mainSpace")));
        assert_eq!(failing_facets(&wall, &state, 2), vec!["mainSpace"]);
    }

    #[test]
    fn test_state_has_entry_for_every_facet() {
        let state = FilterState::for_facets(&facets());

        assert_eq!(state.iter().count(), 3);
        assert!(!state.has_filters());
        assert_eq!(state.get("year"), Some(&FilterValue::Chronology(None)));
    }

    #[test]
    fn test_with_rejects_unknown_field_and_kind_mismatch() {
        let state = FilterState::for_facets(&facets());

        assert!(state.with("unknown", terms(&["x"])).is_none());
        assert!(state.with("year", terms(&["1960"])).is_none());
    }

    #[test]
    fn test_cleared_keeps_fields() {
        let state = FilterState::for_facets(&facets())
            .with("region", taxonomy(&["Alps"]))
            .unwrap();
        assert!(state.has_filters());

        let cleared = state.cleared();
        assert!(!cleared.has_filters());
        assert_eq!(cleared.iter().count(), 3);
    }

    #[test]
    fn test_parse_facet_filters() {
        let parsed = parse_facet_filters(&[
            "mainSpace=Wall".to_string(),
            "mainSpace = Cave".to_string(),
            "invalid".to_string(),
        ]);

        assert_eq!(parsed.len(), 1);
        assert_eq!(parsed["mainSpace"], vec!["Wall", "Cave"]);
    }
}
