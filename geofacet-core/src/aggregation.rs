use crate::config::{AggregationPolicy, FacetConfig};
use crate::filtering::{failing_facets, FilterState};
use crate::models::Item;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap, HashSet};

/// Count of items holding one facet value
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bucket {
    pub key: String,
    pub doc_count: usize,
}

impl Bucket {
    pub fn new(key: impl Into<String>, doc_count: usize) -> Self {
        Self {
            key: key.into(),
            doc_count,
        }
    }
}

/// Bucket lists keyed by facet field
pub type Aggregations = BTreeMap<String, Vec<Bucket>>;

/// Accumulates bucket counts for one facet, remembering first-seen order
#[derive(Debug, Default)]
struct BucketCounter {
    order: Vec<String>,
    counts: HashMap<String, usize>,
}

impl BucketCounter {
    /// Count an item once per distinct value of `field`
    fn add(&mut self, item: &Item, field: &str) {
        let values = item.values(field);
        let mut seen = HashSet::with_capacity(values.len());

        for value in values {
            if !seen.insert(value.clone()) {
                continue;
            }
            match self.counts.get_mut(&*value) {
                Some(count) => *count += 1,
                None => {
                    self.order.push(value.to_string());
                    self.counts.insert(value.into_owned(), 1);
                }
            }
        }
    }

    /// Count descending; ties keep first-seen order
    fn into_buckets(self, size: Option<usize>) -> Vec<Bucket> {
        let Self { order, counts } = self;
        let mut buckets: Vec<Bucket> = order
            .into_iter()
            .map(|key| {
                let doc_count = counts.get(&key).copied().unwrap_or_default();
                Bucket { key, doc_count }
            })
            .collect();

        buckets.sort_by(|a, b| b.doc_count.cmp(&a.doc_count));
        if let Some(size) = size {
            buckets.truncate(size);
        }
        buckets
    }
}

/// Count bucket values for one field over a set of items
pub fn count_buckets<'a>(items: impl IntoIterator<Item = &'a Item>, field: &str) -> Vec<Bucket> {
    let mut counter = BucketCounter::default();
    for item in items {
        counter.add(item, field);
    }
    counter.into_buckets(None)
}

/// Bucket counts for every configured facet over exactly the given items
pub fn aggregate(items: &[&Item], facets: &BTreeMap<String, FacetConfig>) -> Aggregations {
    facets
        .iter()
        .map(|(field, facet)| {
            let mut counter = BucketCounter::default();
            for item in items {
                counter.add(item, field);
            }
            (field.clone(), counter.into_buckets(facet.size))
        })
        .collect()
}

/// Bucket counts under the current filters
///
/// `candidates` are the items that already passed the text query and the
/// viewport. With [`AggregationPolicy::ExcludeOwnFilter`] each facet is
/// counted over the candidates that satisfy every *other* active filter, so
/// an item rejected by exactly one facet still contributes to that facet's
/// own buckets. With [`AggregationPolicy::IncludeOwnFilter`] every facet is
/// counted over the final result set.
pub fn aggregate_filtered(
    candidates: &[&Item],
    facets: &BTreeMap<String, FacetConfig>,
    filters: &FilterState,
    policy: AggregationPolicy,
) -> Aggregations {
    let mut counters: BTreeMap<&str, BucketCounter> = facets
        .keys()
        .map(|field| (field.as_str(), BucketCounter::default()))
        .collect();

    for item in candidates {
        let failing = failing_facets(item, filters, 2);
        match (failing.as_slice(), policy) {
            ([], _) => {
                for (field, counter) in counters.iter_mut() {
                    counter.add(item, field);
                }
            }
            ([only], AggregationPolicy::ExcludeOwnFilter) => {
                if let Some(counter) = counters.get_mut(only) {
                    counter.add(item, only);
                }
            }
            _ => {}
        }
    }

    counters
        .into_iter()
        .map(|(field, counter)| {
            let size = facets.get(field).and_then(|f| f.size);
            (field.to_string(), counter.into_buckets(size))
        })
        .collect()
}
