use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::time::Duration;

pub const DEFAULT_DEBOUNCE_MS: u64 = 300;

/// Engine configuration, mirroring the JSON configuration object
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EngineConfig {
    pub search_config: SearchConfig,
    pub aggregations: BTreeMap<String, FacetConfig>,
    #[serde(default)]
    pub sortings: BTreeMap<String, SortSpec>,
    #[serde(default)]
    pub searchable_fields: Vec<String>,
    /// Keys consumed by other collaborators (map view, tiles)
    #[serde(flatten)]
    pub extra: HashMap<String, serde_json::Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchConfig {
    pub default_sort: String,
    #[serde(default)]
    pub debounce_time: Option<u64>,
    #[serde(default)]
    pub sort_options: Vec<SortOption>,
    #[serde(default)]
    pub aggregation_policy: AggregationPolicy,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SortOption {
    pub value: String,
    pub label: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FacetConfig {
    #[serde(default)]
    pub title: String,
    #[serde(rename = "type", default)]
    pub kind: FacetKind,
    /// Maximum number of buckets reported for this facet
    #[serde(default)]
    pub size: Option<usize>,
}

impl FacetConfig {
    pub fn new(title: impl Into<String>, kind: FacetKind) -> Self {
        Self {
            title: title.into(),
            kind,
            size: None,
        }
    }

    /// Title to display, falling back to the field name
    pub fn display_title<'a>(&'a self, field: &'a str) -> &'a str {
        if self.title.trim().is_empty() {
            field
        } else {
            &self.title
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FacetKind {
    #[default]
    Terms,
    Chronology,
    Taxonomy,
}

/// Whether a facet's own selection narrows its own bucket list
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum AggregationPolicy {
    /// Sibling counts under every other active constraint
    #[default]
    ExcludeOwnFilter,
    /// Buckets computed over the final result set
    IncludeOwnFilter,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SortSpec {
    pub field: String,
    #[serde(default)]
    pub order: SortOrder,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    #[default]
    Asc,
    Desc,
}

impl SortSpec {
    /// Parse a sort key following the "<field>_asc" / "<field>_desc" convention
    pub fn from_key(key: &str) -> Option<Self> {
        let (field, order) = if let Some(field) = key.strip_suffix("_asc") {
            (field, SortOrder::Asc)
        } else if let Some(field) = key.strip_suffix("_desc") {
            (field, SortOrder::Desc)
        } else {
            return None;
        };

        if field.is_empty() {
            return None;
        }

        Some(Self {
            field: field.to_string(),
            order,
        })
    }
}

impl EngineConfig {
    pub fn facet(&self, field: &str) -> Option<&FacetConfig> {
        self.aggregations.get(field)
    }

    pub fn facet_kind(&self, field: &str) -> Option<FacetKind> {
        self.aggregations.get(field).map(|f| f.kind)
    }

    /// Text-input debounce delay
    pub fn debounce(&self) -> Duration {
        Duration::from_millis(
            self.search_config
                .debounce_time
                .unwrap_or(DEFAULT_DEBOUNCE_MS),
        )
    }

    pub fn aggregation_policy(&self) -> AggregationPolicy {
        self.search_config.aggregation_policy
    }

    /// Resolve a sort key: explicit `sortings` entries win over the naming convention
    pub fn resolve_sort(&self, key: &str) -> Option<SortSpec> {
        self.sortings
            .get(key)
            .cloned()
            .or_else(|| SortSpec::from_key(key))
    }

    /// Fields the text query looks at; `None` means every field
    pub fn searchable_fields(&self) -> Option<&[String]> {
        if self.searchable_fields.is_empty() {
            None
        } else {
            Some(&self.searchable_fields)
        }
    }
}
