use std::collections::HashSet;

use crate::types::TagNames;

/// Turns a raw tag-names value into the canonical name set: whitespace
/// runs collapse to a single space, tokens split on commas and are
/// trimmed, empty tokens are dropped, duplicates keep their first
/// occurrence. Matching is exact and case-sensitive.
///
/// List inputs are joined with `,` first, so a single element may
/// contribute several names.
pub fn normalize(value: &TagNames) -> Vec<String> {
    let text = match value {
        TagNames::Text(text) => text.clone(),
        TagNames::List(items) => items.join(","),
    };

    let mut seen = HashSet::new();
    let mut names = Vec::new();

    for token in text.split(',') {
        let name = token.split_whitespace().collect::<Vec<_>>().join(" ");
        if name.is_empty() {
            continue;
        }
        if seen.insert(name.clone()) {
            names.push(name);
        }
    }

    names
}
