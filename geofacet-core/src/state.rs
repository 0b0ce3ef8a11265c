use crate::chronology::DateRange;
use crate::config::{EngineConfig, FacetKind};
use crate::filtering::{FilterState, FilterValue};
use crate::geo::Viewport;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use tracing::warn;

/// One immutable snapshot of everything that drives an evaluation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryState {
    pub query: String,
    pub sort: String,
    pub viewport: Option<Viewport>,
    pub filters: FilterState,
}

/// A mutation requested by a collaborator
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "command", rename_all = "camelCase")]
pub enum Command {
    SetQuery {
        text: String,
    },
    SetSort {
        key: String,
    },
    SetViewport {
        viewport: Option<Viewport>,
    },
    SetTermsFilter {
        field: String,
        values: Vec<String>,
    },
    /// Check or uncheck a single terms value
    ToggleTerm {
        field: String,
        value: String,
        selected: bool,
    },
    /// `[]` clears the range, `[start, end]` sets it
    SetRangeFilter {
        field: String,
        range: Vec<i64>,
    },
    SetTaxonomyFilter {
        field: String,
        paths: Vec<String>,
    },
    ClearFilters,
}

impl Command {
    /// Text edits are debounced; everything else applies at once
    pub fn is_debounced(&self) -> bool {
        matches!(self, Command::SetQuery { .. })
    }
}

impl QueryState {
    /// The starting state: no query, default sort, no viewport, empty filters
    pub fn initial(config: &EngineConfig) -> Self {
        Self {
            query: String::new(),
            sort: config.search_config.default_sort.clone(),
            viewport: None,
            filters: FilterState::for_facets(&config.aggregations),
        }
    }

    /// Produce the state that follows `command`
    ///
    /// Returns `None` when the command cannot apply (unknown facet field,
    /// wrong facet kind, malformed range, unresolvable sort key); the caller
    /// keeps the current state.
    pub fn apply(&self, command: &Command, config: &EngineConfig) -> Option<Self> {
        let next = match command {
            Command::SetQuery { text } => Self {
                query: text.clone(),
                ..self.clone()
            },
            Command::SetSort { key } => {
                if config.resolve_sort(key).is_none() {
                    warn!(sort = %key, "ignoring unknown sort key");
                    return None;
                }
                Self {
                    sort: key.clone(),
                    ..self.clone()
                }
            }
            Command::SetViewport { viewport } => Self {
                viewport: *viewport,
                ..self.clone()
            },
            Command::SetTermsFilter { field, values } => {
                let selected: BTreeSet<String> = values.iter().cloned().collect();
                self.with_filter(field, FilterValue::Terms(selected))?
            }
            Command::ToggleTerm {
                field,
                value,
                selected,
            } => {
                let mut values = match self.filters.get(field) {
                    Some(FilterValue::Terms(values)) => values.clone(),
                    _ => {
                        warn!(field = %field, "toggle on a field that is not a terms facet");
                        return None;
                    }
                };
                if *selected {
                    values.insert(value.clone());
                } else {
                    values.remove(value);
                }
                self.with_filter(field, FilterValue::Terms(values))?
            }
            Command::SetRangeFilter { field, range } => {
                let range = match range.as_slice() {
                    [] => None,
                    [start, end] => match DateRange::new(*start, *end) {
                        Some(range) => Some(range),
                        None => {
                            warn!(field = %field, start, end, "ignoring reversed date range");
                            return None;
                        }
                    },
                    _ => {
                        warn!(field = %field, len = range.len(), "date range needs zero or two bounds");
                        return None;
                    }
                };
                self.with_filter(field, FilterValue::Chronology(range))?
            }
            Command::SetTaxonomyFilter { field, paths } => {
                let selected: BTreeSet<String> = paths.iter().cloned().collect();
                self.with_filter(field, FilterValue::Taxonomy(selected))?
            }
            Command::ClearFilters => Self {
                filters: self.filters.cleared(),
                ..self.clone()
            },
        };

        Some(next)
    }

    fn with_filter(&self, field: &str, value: FilterValue) -> Option<Self> {
        let kind: FacetKind = value.kind();
        match self.filters.with(field, value) {
            Some(filters) => Some(Self {
                filters,
                ..self.clone()
            }),
            None => {
                warn!(field = %field, kind = ?kind, "ignoring filter for unknown or mismatched facet");
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn config() -> EngineConfig {
        serde_json::from_value(json!({
            "searchConfig": {"defaultSort": "title_asc"},
            "aggregations": {
                "mainSpace": {"title": "Main space", "type": "terms"},
                "year": {"title": "Year", "type": "chronology"},
                "region": {"title": "Region", "type": "taxonomy"}
            }
        }))
        .unwrap()
    }

    #[test]
    fn test_initial_state() {
        let state = QueryState::initial(&config());

        assert_eq!(state.sort, "title_asc");
        assert!(state.query.is_empty());
        assert!(state.viewport.is_none());
        assert!(!state.filters.has_filters());
        assert_eq!(state.filters.iter().count(), 3);
    }

    #[test]
    fn test_apply_returns_new_state_and_leaves_old_untouched() {
        let config = config();
        let state = QueryState::initial(&config);
        let next = state
            .apply(
                &Command::SetTermsFilter {
                    field: "mainSpace".to_string(),
                    values: vec!["Wall".to_string()],
                },
                &config,
            )
            .unwrap();

        assert!(next.filters.has_filters());
        assert!(!state.filters.has_filters());
    }

    #[test]
    fn test_toggle_term() {
        let config = config();
        let state = QueryState::initial(&config);
        let toggle = |state: &QueryState, value: &str, selected: bool| {
            state
                .apply(
                    &Command::ToggleTerm {
                        field: "mainSpace".to_string(),
                        value: value.to_string(),
                        selected,
                    },
                    &config,
                )
                .unwrap()
        };

        let state = toggle(&state, "Wall", true);
        let state = toggle(&state, "Cave", true);
        let state = toggle(&state, "Wall", false);

        assert_eq!(
            state.filters.get("mainSpace"),
            Some(&FilterValue::Terms(["Cave".to_string()].into()))
        );
    }

    #[test]
    fn test_unknown_field_is_a_no_op() {
        let config = config();
        let state = QueryState::initial(&config);

        let command = Command::SetTermsFilter {
            field: "unknown".to_string(),
            values: vec!["x".to_string()],
        };
        assert!(state.apply(&command, &config).is_none());
    }

    #[test]
    fn test_kind_mismatch_is_a_no_op() {
        let config = config();
        let state = QueryState::initial(&config);

        let command = Command::SetRangeFilter {
            field: "mainSpace".to_string(),
            range: vec![0, 1],
        };
        assert!(state.apply(&command, &config).is_none());
    }

    #[test]
    fn test_range_filter() {
        let config = config();
        let state = QueryState::initial(&config);
        let set = |range: Vec<i64>| {
            state.apply(
                &Command::SetRangeFilter {
                    field: "year".to_string(),
                    range,
                },
                &config,
            )
        };

        let ranged = set(vec![0, 10]).unwrap();
        assert_eq!(
            ranged.filters.get("year"),
            Some(&FilterValue::Chronology(DateRange::new(0, 10)))
        );
        assert!(!set(vec![]).unwrap().filters.has_filters());
        assert!(set(vec![10, 0]).is_none());
        assert!(set(vec![1]).is_none());
    }

    #[test]
    fn test_sort_must_resolve() {
        let config = config();
        let state = QueryState::initial(&config);

        let next = state
            .apply(
                &Command::SetSort {
                    key: "year_desc".to_string(),
                },
                &config,
            )
            .unwrap();
        assert_eq!(next.sort, "year_desc");

        let unknown = Command::SetSort {
            key: "relevance".to_string(),
        };
        assert!(state.apply(&unknown, &config).is_none());
    }

    #[test]
    fn test_clear_filters() {
        let config = config();
        let state = QueryState::initial(&config)
            .apply(
                &Command::SetTaxonomyFilter {
                    field: "region".to_string(),
                    paths: vec!["Alps".to_string()],
                },
                &config,
            )
            .unwrap();

        let cleared = state.apply(&Command::ClearFilters, &config).unwrap();
        assert!(!cleared.filters.has_filters());
    }

    #[test]
    fn test_command_json_shape() {
        let command: Command = serde_json::from_value(json!({
            "command": "setRangeFilter",
            "field": "year",
            "range": [0, 10]
        }))
        .unwrap();

        assert_eq!(
            command,
            Command::SetRangeFilter {
                field: "year".to_string(),
                range: vec![0, 10]
            }
        );
        assert!(!command.is_debounced());
    }
}
