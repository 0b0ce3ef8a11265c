use crate::chronology::parse_field_dates;
use crate::config::{SortOrder, SortSpec};
use crate::models::{FieldValue, Item};
use regex::Regex;
use std::cmp::Ordering;
use std::sync::LazyLock;
use unicode_normalization::UnicodeNormalization;

static LEADING_ARTICLES: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?i)(the|a|an|der|die|das|le|la|les|el|la|los|las|il|lo|i|gli|un|une|een)\s+")
        .expect("leading article pattern is valid")
});

#[derive(Debug, Clone, PartialEq)]
enum SortKey {
    Number(f64),
    Text(String),
}

impl SortKey {
    fn for_value(value: &FieldValue, chronological: bool) -> Option<Self> {
        if chronological {
            return parse_field_dates(value)
                .into_iter()
                .min()
                .map(|ms| SortKey::Number(ms as f64));
        }

        match value {
            FieldValue::Number(n) => Some(SortKey::Number(*n)),
            other => Some(SortKey::Text(normalize_for_sorting(&other.as_text()))),
        }
    }

    fn compare(&self, other: &Self) -> Ordering {
        match (self, other) {
            (SortKey::Number(a), SortKey::Number(b)) => a.total_cmp(b),
            (SortKey::Text(a), SortKey::Text(b)) => a.cmp(b),
            (SortKey::Number(_), SortKey::Text(_)) => Ordering::Less,
            (SortKey::Text(_), SortKey::Number(_)) => Ordering::Greater,
        }
    }
}

/// Stable sort by a single field
///
/// Items missing the field (or, for chronological fields, holding no
/// parseable date) go last in either direction. Ties keep their input order.
pub fn sort_items(items: &mut Vec<&Item>, spec: &SortSpec, chronological: bool) {
    let mut keyed: Vec<(Option<SortKey>, &Item)> = items
        .drain(..)
        .map(|item| {
            let key = item
                .get(&spec.field)
                .and_then(|value| SortKey::for_value(value, chronological));
            (key, item)
        })
        .collect();

    keyed.sort_by(|(a, _), (b, _)| match (a, b) {
        (Some(a), Some(b)) => match spec.order {
            SortOrder::Asc => a.compare(b),
            SortOrder::Desc => b.compare(a),
        },
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    });

    items.extend(keyed.into_iter().map(|(_, item)| item));
}

/// Normalize string for library science sorting
/// - Strip leading articles (a, an, the)
/// - Normalize unicode (NFD then lowercase)
/// - Collapse whitespace
pub fn normalize_for_sorting(s: &str) -> String {
    let without_articles = strip_leading_articles(s);

    let normalized: String = without_articles.nfd().collect::<String>().to_lowercase();

    normalized.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Strip leading articles following library science conventions
/// Supports: a, an, the (English) and common articles in other languages
pub fn strip_leading_articles(s: &str) -> String {
    LEADING_ARTICLES.replace(s, "").to_string()
}
