// Public modules
pub mod aggregation;
pub mod chronology;
pub mod config;
pub mod debounce;
pub mod engine;
pub mod error;
pub mod filtering;
pub mod geo;
pub mod io;
pub mod models;
pub mod orchestrator;
pub mod schema_validation;
pub mod search;
pub mod sorting;
pub mod state;
pub mod taxonomy;
pub mod validation;

// Re-export commonly used types for convenience
pub use aggregation::{aggregate, aggregate_filtered, count_buckets, Aggregations, Bucket};
pub use chronology::{chronology_extent, format_instant, parse_date, DateRange};
pub use config::{
    AggregationPolicy, EngineConfig, FacetConfig, FacetKind, SearchConfig, SortOrder, SortSpec,
};
pub use debounce::{Debouncer, TimerHandle};
pub use engine::{Engine, SearchResult};
pub use error::{Error, Result};
pub use filtering::{matches_filters, parse_facet_filters, FilterState, FilterValue};
pub use geo::{GeoPoint, Viewport};
pub use io::{load_config, load_dataset, load_engine, parse_config, parse_dataset};
pub use models::{FieldValue, Item};
pub use orchestrator::{Orchestrator, Phase, Publisher, Update};
pub use schema_validation::{validate_against_schema, validate_dataset};
pub use search::{fold_for_search, SearchText, TextQuery};
pub use sorting::{normalize_for_sorting, sort_items, strip_leading_articles};
pub use state::{Command, QueryState};
pub use taxonomy::{build_taxonomy, TaxonomyEntry, TaxonomyForest, TaxonomyNode};
pub use validation::validate_config;
