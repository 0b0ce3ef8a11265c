use crate::aggregation::{aggregate_filtered, Aggregations};
use crate::chronology::{chronology_extent, DateRange};
use crate::config::{EngineConfig, FacetKind};
use crate::error::{Error, Result};
use crate::filtering::matches_filters;
use crate::geo::within_scope;
use crate::models::Item;
use crate::search::{matches_query, SearchText, TextQuery};
use crate::sorting::sort_items;
use crate::state::QueryState;
use crate::taxonomy::TaxonomyForest;
use crate::validation::validate_config;
use serde::Serialize;
use std::collections::BTreeMap;
use tracing::{debug, info, warn};

/// Matching items in order plus bucket counts for every facet
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SearchResult<'a> {
    pub items: Vec<&'a Item>,
    pub aggregations: Aggregations,
}

/// The filtering and aggregation engine over a fixed dataset
///
/// Evaluation is a pure function of the dataset and the `QueryState` passed
/// in: nothing is cached between calls. Only the folded search text of each
/// item is computed up front.
#[derive(Debug)]
pub struct Engine {
    config: EngineConfig,
    items: Vec<Item>,
    search_text: Vec<SearchText>,
}

impl Engine {
    /// Validate the configuration and take ownership of the dataset
    pub fn new(config: EngineConfig, items: Vec<Item>) -> Result<Self> {
        validate_config(&config).map_err(Error::InvalidConfig)?;

        info!(
            items = items.len(),
            facets = config.aggregations.len(),
            "engine ready"
        );
        let searchable = config.searchable_fields();
        let search_text = items
            .iter()
            .map(|item| SearchText::new(item, searchable))
            .collect();
        Ok(Self {
            config,
            items,
            search_text,
        })
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn items(&self) -> &[Item] {
        &self.items
    }

    pub fn initial_state(&self) -> QueryState {
        QueryState::initial(&self.config)
    }

    /// Items passing the text query and the viewport, in dataset order
    fn candidates(&self, state: &QueryState) -> Vec<&Item> {
        let query = TextQuery::parse(&state.query);

        self.items
            .iter()
            .zip(&self.search_text)
            .filter(|(item, _)| within_scope(item.location.as_ref(), state.viewport.as_ref()))
            .filter(|(_, text)| matches_query(text, query.as_ref()))
            .map(|(item, _)| item)
            .collect()
    }

    fn order(&self, items: &mut Vec<&Item>, sort: &str) {
        match self.config.resolve_sort(sort) {
            Some(spec) => {
                let chronological =
                    self.config.facet_kind(&spec.field) == Some(FacetKind::Chronology);
                sort_items(items, &spec, chronological);
            }
            None => warn!(sort = %sort, "unresolvable sort key, keeping dataset order"),
        }
    }

    /// Filter and order the dataset
    pub fn search(&self, state: &QueryState) -> Vec<&Item> {
        let mut items: Vec<&Item> = self
            .candidates(state)
            .into_iter()
            .filter(|item| matches_filters(item, &state.filters, None))
            .collect();
        self.order(&mut items, &state.sort);
        items
    }

    /// Bucket counts for every configured facet under the configured policy
    pub fn aggregate(&self, state: &QueryState) -> Aggregations {
        let candidates = self.candidates(state);
        aggregate_filtered(
            &candidates,
            &self.config.aggregations,
            &state.filters,
            self.config.aggregation_policy(),
        )
    }

    /// Items and aggregations in a single pass over the dataset
    pub fn evaluate(&self, state: &QueryState) -> SearchResult<'_> {
        let candidates = self.candidates(state);

        let aggregations = aggregate_filtered(
            &candidates,
            &self.config.aggregations,
            &state.filters,
            self.config.aggregation_policy(),
        );

        let mut items: Vec<&Item> = candidates
            .into_iter()
            .filter(|item| matches_filters(item, &state.filters, None))
            .collect();
        self.order(&mut items, &state.sort);

        debug!(
            query = %state.query,
            sort = %state.sort,
            matched = items.len(),
            total = self.items.len(),
            "evaluated"
        );

        SearchResult {
            items,
            aggregations,
        }
    }

    /// A forest for every taxonomy facet
    pub fn taxonomies(&self, aggregations: &Aggregations) -> BTreeMap<String, TaxonomyForest> {
        self.fields_of_kind(FacetKind::Taxonomy)
            .map(|field| {
                let buckets = aggregations.get(field).map(Vec::as_slice).unwrap_or_default();
                (field.to_string(), TaxonomyForest::build(buckets))
            })
            .collect()
    }

    /// Date extent of every chronology facet that has parseable buckets
    pub fn extents(&self, aggregations: &Aggregations) -> BTreeMap<String, DateRange> {
        self.fields_of_kind(FacetKind::Chronology)
            .filter_map(|field| {
                let buckets = aggregations.get(field)?;
                chronology_extent(buckets).map(|range| (field.to_string(), range))
            })
            .collect()
    }

    fn fields_of_kind(&self, kind: FacetKind) -> impl Iterator<Item = &str> {
        self.config
            .aggregations
            .iter()
            .filter(move |(_, facet)| facet.kind == kind)
            .map(|(field, _)| field.as_str())
    }
}
