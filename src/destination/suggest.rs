//! Prefix autocomplete over destination names and codes.

use super::gazetteer::Gazetteer;
use super::normalize::normalize_text;
use super::types::DestinationSummary;

pub const DEFAULT_SUGGESTION_LIMIT: usize = 10;

/// Sorted `(name, destination index)` pairs, built once per gazetteer.
#[derive(Debug, Clone)]
pub struct SuggestionIndex {
    keys: Vec<(String, usize)>,
    entries: Vec<Entry>,
}

#[derive(Debug, Clone)]
struct Entry {
    summary: DestinationSummary,
    priority: u32,
}

impl SuggestionIndex {
    pub fn build(gazetteer: &Gazetteer) -> Self {
        let mut keys = Vec::new();
        let mut entries = Vec::with_capacity(gazetteer.len());
        for (i, dest) in gazetteer.destinations().iter().enumerate() {
            for name in gazetteer.names_of(i) {
                keys.push((name.clone(), i));
            }
            keys.push((dest.code.to_lowercase(), i));
            entries.push(Entry {
                summary: dest.summary(),
                priority: dest.priority,
            });
        }
        keys.sort();
        keys.dedup();
        Self { keys, entries }
    }

    /// Destinations with a name or code starting with `prefix`, highest
    /// priority first, then alphabetical.
    pub fn get_suggestions(&self, prefix: &str, limit: usize) -> Vec<DestinationSummary> {
        let prefix = normalize_text(prefix);
        if prefix.is_empty() || limit == 0 {
            return Vec::new();
        }

        let start = self.keys.partition_point(|(k, _)| k.as_str() < prefix.as_str());
        let mut hits: Vec<usize> = self.keys[start..]
            .iter()
            .take_while(|(k, _)| k.starts_with(&prefix))
            .map(|(_, i)| *i)
            .collect();
        hits.sort_unstable();
        hits.dedup();

        let mut found: Vec<&Entry> = hits.iter().map(|&i| &self.entries[i]).collect();
        found.sort_by(|a, b| {
            b.priority
                .cmp(&a.priority)
                .then_with(|| a.summary.display_name.cmp(&b.summary.display_name))
                .then_with(|| a.summary.code.cmp(&b.summary.code))
        });
        found.into_iter().take(limit).map(|e| e.summary.clone()).collect()
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }
}
