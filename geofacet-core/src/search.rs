use crate::models::Item;
use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

/// A parsed free-text query
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextQuery {
    phrase: String,
    tokens: Vec<String>,
}

/// Fold text for matching: compatibility decomposition, accents dropped, lowercase
pub fn fold_for_search(s: &str) -> String {
    s.nfkd()
        .filter(|c| !is_combining_mark(*c))
        .collect::<String>()
        .to_lowercase()
}

impl TextQuery {
    /// Returns `None` for a blank query, which matches everything
    pub fn parse(raw: &str) -> Option<Self> {
        let phrase = fold_for_search(raw.trim());
        if phrase.is_empty() {
            return None;
        }

        let tokens = phrase.split_whitespace().map(str::to_string).collect();
        Some(Self { phrase, tokens })
    }

    /// Match when a searchable field contains the whole phrase, or every
    /// token appears in some searchable field
    pub fn matches(&self, text: &SearchText) -> bool {
        let haystacks = &text.0;
        if haystacks.iter().any(|h| h.contains(&self.phrase)) {
            return true;
        }

        self.tokens.len() > 1
            && self
                .tokens
                .iter()
                .all(|token| haystacks.iter().any(|h| h.contains(token.as_str())))
    }
}

/// Folded searchable values of one item, built once when the engine loads
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchText(Vec<String>);

impl SearchText {
    /// Fold the configured fields, or every field when none are configured
    pub fn new(item: &Item, searchable_fields: Option<&[String]>) -> Self {
        let haystacks = match searchable_fields {
            Some(fields) => fields
                .iter()
                .filter_map(|field| item.get(field))
                .map(|value| fold_for_search(&value.as_text()))
                .collect(),
            None => item
                .fields
                .values()
                .map(|value| fold_for_search(&value.as_text()))
                .collect(),
        };
        Self(haystacks)
    }
}

/// Convenience wrapper: a blank query matches every item
pub fn matches_query(text: &SearchText, query: Option<&TextQuery>) -> bool {
    query.map_or(true, |q| q.matches(text))
}
