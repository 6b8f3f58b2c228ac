//! Approximate page name matching.
//!
//! Used as the on-not-found fallback of a search and to build "did you mean"
//! lists. Names are compared after normalization.

use crate::normalize::normalize;

/// Default maximum edit distance for a fuzzy match
pub const DEFAULT_MAX_DISTANCE: usize = 3;

/// Chooses a known name for a sought name that has no exact match
#[derive(Debug, Clone, Copy)]
pub struct FuzzyMatcher {
    max_distance: usize,
}

impl Default for FuzzyMatcher {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_DISTANCE)
    }
}

impl FuzzyMatcher {
    pub fn new(max_distance: usize) -> Self {
        Self { max_distance }
    }

    pub fn max_distance(&self) -> usize {
        self.max_distance
    }

    /// Pick the best known name for `sought`.
    ///
    /// A unique prefix match wins, then a unique substring match, then the
    /// closest name within `max_distance` edits. Ties on distance go to the
    /// name discovered first.
    pub fn choose(&self, known: &[String], sought: &str) -> Option<String> {
        let sought = normalize(sought);
        if sought.is_empty() {
            return None;
        }

        if let Some(name) = unique(known, |name| name.starts_with(&sought)) {
            return Some(name);
        }
        if let Some(name) = unique(known, |name| name.contains(&sought)) {
            return Some(name);
        }

        known
            .iter()
            .map(|name| (levenshtein(&normalize(name), &sought), name))
            .filter(|(distance, _)| *distance <= self.max_distance)
            .min_by_key(|(distance, _)| *distance)
            .map(|(_, name)| name.clone())
    }
}

fn unique(known: &[String], matches: impl Fn(&str) -> bool) -> Option<String> {
    let mut found = known.iter().filter(|name| matches(&normalize(name)));
    match (found.next(), found.next()) {
        (Some(name), None) => Some(name.clone()),
        _ => None,
    }
}

/// Rank `known` names by closeness to `sought`, best first.
///
/// Names containing `sought` come before the rest. Other names more than
/// half of `sought` away in edits are left out.
pub fn suggest(known: &[String], sought: &str, limit: usize) -> Vec<String> {
    let sought = normalize(sought);
    if sought.is_empty() {
        return Vec::new();
    }

    let mut ranked: Vec<(bool, usize, &String)> = known
        .iter()
        .map(|name| {
            let normalized = normalize(name);
            let contains = normalized.contains(&sought) || sought.contains(&normalized);
            (!contains, levenshtein(&normalized, &sought), name)
        })
        .filter(|(far, distance, _)| !*far || *distance <= (sought.chars().count() + 1) / 2)
        .collect();
    ranked.sort_by_key(|(far, distance, _)| (*far, *distance));

    let mut suggestions: Vec<String> = Vec::new();
    for (_, _, name) in ranked {
        if suggestions.len() >= limit {
            break;
        }
        if !suggestions.contains(name) {
            suggestions.push(name.clone());
        }
    }
    suggestions
}

/// Edit distance between two strings, counted in chars
pub fn levenshtein(a: &str, b: &str) -> usize {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();

    let mut prev: Vec<usize> = (0..=b.len()).collect();
    let mut curr = vec![0usize; b.len() + 1];

    for (i, &ca) in a.iter().enumerate() {
        curr[0] = i + 1;
        for (j, &cb) in b.iter().enumerate() {
            let substitution = prev[j] + usize::from(ca != cb);
            curr[j + 1] = substitution.min(prev[j + 1] + 1).min(curr[j] + 1);
        }
        std::mem::swap(&mut prev, &mut curr);
    }

    prev[b.len()]
}
