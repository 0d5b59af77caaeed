//! Token search over adapter metadata
//!
//! A query is split into lowercase tokens; each token that occurs in an
//! adapter's manufacturer, name, type or search tokens adds one point.

use crate::device::DeviceAdapter;

/// Lowercase word tokens of a string
fn tokenize(text: &str) -> impl Iterator<Item = String> + '_ {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|t| !t.is_empty())
        .map(str::to_lowercase)
}

/// Searchable tokens of one adapter
#[must_use]
pub fn adapter_tokens(adapter: &DeviceAdapter) -> Vec<String> {
    let mut tokens: Vec<String> = tokenize(&adapter.manufacturer)
        .chain(tokenize(&adapter.name))
        .chain(tokenize(adapter.device_type.as_str()))
        .chain(adapter.search_tokens.iter().flat_map(|t| tokenize(t)))
        .collect();
    tokens.sort();
    tokens.dedup();
    tokens
}

/// Score of `query` against a token set
///
/// A query token matches when some adapter token starts with it.
#[must_use]
pub fn score(query: &str, tokens: &[String]) -> usize {
    tokenize(query)
        .filter(|q| tokens.iter().any(|t| t.starts_with(q.as_str())))
        .count()
}
