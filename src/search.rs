//! Fuzzy task search.
//!
//! Scores follow the Bitap approximate matcher the host UI uses, so a query
//! ranks tasks the same way on both sides: per field, a score in [0, 1]
//! (0 = exact) from the number of errors and the distance of the match from
//! the expected location; across fields, the product of the field scores
//! raised to their normalized weight times a length norm.

use std::cmp::Ordering;
use std::collections::HashMap;

use serde::Serialize;

use crate::config::SearchConfig;
use crate::model::{RecordId, StoredTask, Task};

/// Longest pattern one Bitap pass can handle; longer queries are chunked.
pub const MAX_PATTERN_BITS: usize = 32;

/// Task fields the index searches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SearchKey {
    Name,
    Description,
    Url,
}

impl SearchKey {
    fn value(self, task: &Task) -> Option<&str> {
        match self {
            SearchKey::Name => Some(task.name.as_str()),
            SearchKey::Description => task.description.as_deref(),
            SearchKey::Url => task.url.as_deref(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct SearchOptions {
    pub threshold: f64,
    pub location: usize,
    pub distance: usize,
    pub min_match_char_length: usize,
    /// Keys with weights normalized to sum to 1
    keys: Vec<(SearchKey, f64)>,
}

impl SearchOptions {
    pub fn new(config: &SearchConfig) -> Self {
        let raw = [
            (SearchKey::Name, config.name_weight),
            (SearchKey::Description, config.description_weight),
            (SearchKey::Url, config.url_weight),
        ];
        let total: f64 = raw.iter().map(|(_, weight)| weight).sum();
        Self {
            threshold: config.threshold,
            location: config.location,
            distance: config.distance,
            min_match_char_length: config.min_match_char_length,
            keys: raw.iter().map(|&(key, weight)| (key, weight / total)).collect(),
        }
    }

    pub fn keys(&self) -> &[(SearchKey, f64)] {
        &self.keys
    }
}

impl Default for SearchOptions {
    fn default() -> Self {
        Self::new(&SearchConfig::default())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SearchHit {
    pub id: RecordId,
    /// `None` when no query was given
    pub score: Option<f64>,
}

/// Tasks passing the search gate, best match first.
#[derive(Debug, Clone, Default)]
pub struct SearchResults {
    hits: Vec<SearchHit>,
    by_id: HashMap<RecordId, Option<f64>>,
}

impl SearchResults {
    fn from_hits(hits: Vec<SearchHit>) -> Self {
        let by_id = hits.iter().map(|hit| (hit.id, hit.score)).collect();
        Self { hits, by_id }
    }

    pub fn contains(&self, id: RecordId) -> bool {
        self.by_id.contains_key(&id)
    }

    /// Score of a matched task; `None` for unmatched tasks and for the
    /// unscored results of an empty query.
    pub fn score(&self, id: RecordId) -> Option<f64> {
        self.by_id.get(&id).copied().flatten()
    }

    pub fn hits(&self) -> &[SearchHit] {
        &self.hits
    }

    pub fn len(&self) -> usize {
        self.hits.len()
    }

    pub fn is_empty(&self) -> bool {
        self.hits.is_empty()
    }
}

/// Match `tasks` against `query`. An empty query returns every task unscored.
pub fn search_tasks(tasks: &[StoredTask], query: &str, options: &SearchOptions) -> SearchResults {
    if query.is_empty() {
        return SearchResults::from_hits(
            tasks
                .iter()
                .map(|task| SearchHit {
                    id: task.id,
                    score: None,
                })
                .collect(),
        );
    }

    let pattern = Pattern::new(query);
    let mut scored: Vec<(usize, SearchHit)> = Vec::new();
    for (position, task) in tasks.iter().enumerate() {
        let mut total = 1.0_f64;
        let mut matched = false;
        for &(key, weight) in &options.keys {
            let Some(text) = key.value(task) else {
                continue;
            };
            if text.trim().is_empty() {
                continue;
            }
            let Some(score) = pattern.search_in(text, options) else {
                continue;
            };
            matched = true;
            let base = if score == 0.0 { f64::EPSILON } else { score };
            total *= base.powf(weight * field_norm(text));
        }
        if matched {
            scored.push((
                position,
                SearchHit {
                    id: task.id,
                    score: Some(total),
                },
            ));
        }
    }

    scored.sort_by(|(left_pos, left), (right_pos, right)| {
        let left_score = left.score.unwrap_or(1.0);
        let right_score = right.score.unwrap_or(1.0);
        left_score
            .partial_cmp(&right_score)
            .unwrap_or(Ordering::Equal)
            .then_with(|| left_pos.cmp(right_pos))
    });

    tracing::debug!(query, matches = scored.len(), total = tasks.len(), "task search");
    SearchResults::from_hits(scored.into_iter().map(|(_, hit)| hit).collect())
}

/// Length norm of a field: `1/sqrt(tokens)` rounded to three decimals.
fn field_norm(text: &str) -> f64 {
    let tokens = text.split(' ').filter(|token| !token.is_empty()).count().max(1);
    ((1.0 / (tokens as f64).sqrt()) * 1000.0).round() / 1000.0
}

struct Chunk {
    chars: Vec<char>,
    alphabet: HashMap<char, u64>,
    start: usize,
}

impl Chunk {
    fn new(chars: &[char], start: usize) -> Self {
        let len = chars.len();
        let mut alphabet = HashMap::new();
        for (i, ch) in chars.iter().enumerate() {
            *alphabet.entry(*ch).or_insert(0) |= 1u64 << (len - i - 1);
        }
        Self {
            chars: chars.to_vec(),
            alphabet,
            start,
        }
    }
}

struct Pattern {
    text: Vec<char>,
    chunks: Vec<Chunk>,
}

impl Pattern {
    fn new(query: &str) -> Self {
        let text: Vec<char> = query.to_lowercase().chars().collect();
        let len = text.len();
        let mut chunks = Vec::new();
        if len <= MAX_PATTERN_BITS {
            chunks.push(Chunk::new(&text, 0));
        } else {
            let remainder = len % MAX_PATTERN_BITS;
            let end = len - remainder;
            let mut i = 0;
            while i < end {
                chunks.push(Chunk::new(&text[i..i + MAX_PATTERN_BITS], i));
                i += MAX_PATTERN_BITS;
            }
            if remainder > 0 {
                let start = len - MAX_PATTERN_BITS;
                chunks.push(Chunk::new(&text[start..], start));
            }
        }
        Self { text, chunks }
    }

    /// Score of the best match in `text`, or `None` when nothing matches.
    fn search_in(&self, text: &str, options: &SearchOptions) -> Option<f64> {
        let text: Vec<char> = text.to_lowercase().chars().collect();
        if text == self.text {
            return Some(0.0);
        }

        let mut total = 0.0;
        let mut any = false;
        for chunk in &self.chunks {
            let (is_match, score) = bitap(&text, chunk, options.location + chunk.start, options);
            any |= is_match;
            total += score;
        }
        any.then(|| total / self.chunks.len() as f64)
    }
}

fn compute_score(pattern_len: usize, errors: usize, current: usize, expected: usize, distance: usize) -> f64 {
    let accuracy = errors as f64 / pattern_len as f64;
    let proximity = current.abs_diff(expected);
    if distance == 0 {
        return if proximity > 0 { 1.0 } else { accuracy };
    }
    accuracy + proximity as f64 / distance as f64
}

fn find_from(text: &[char], pattern: &[char], from: usize) -> Option<usize> {
    if pattern.is_empty() || from > text.len() || pattern.len() > text.len() - from {
        return None;
    }
    (from..=text.len() - pattern.len()).find(|&start| &text[start..start + pattern.len()] == pattern)
}

/// Runs of matched characters at least `min_len` long.
fn matched_runs(mask: &[bool], min_len: usize) -> Vec<(usize, usize)> {
    let mut runs = Vec::new();
    let mut start: Option<usize> = None;
    for (i, &hit) in mask.iter().enumerate() {
        match (hit, start) {
            (true, None) => start = Some(i),
            (false, Some(s)) => {
                if i - s >= min_len {
                    runs.push((s, i - 1));
                }
                start = None;
            }
            _ => {}
        }
    }
    if let Some(s) = start {
        if mask.len() - s >= min_len {
            runs.push((s, mask.len() - 1));
        }
    }
    runs
}

fn bitap(text: &[char], chunk: &Chunk, location: usize, options: &SearchOptions) -> (bool, f64) {
    let pattern = &chunk.chars;
    let pattern_len = pattern.len();
    let text_len = text.len();
    let distance = options.distance;
    let expected = location.min(text_len);
    let compute_matches = options.min_match_char_length > 1;
    let mut match_mask = vec![false; text_len + pattern_len + 1];

    // Exact occurrences tighten the threshold before the fuzzy pass.
    let mut threshold = options.threshold;
    let mut from = expected;
    while let Some(index) = find_from(text, pattern, from) {
        threshold = threshold.min(compute_score(pattern_len, 0, index, expected, distance));
        from = index + pattern_len;
        if compute_matches {
            for slot in &mut match_mask[index..index + pattern_len] {
                *slot = true;
            }
        }
    }

    let mut best: Option<usize> = None;
    let mut final_score = 1.0;
    let mut last_bits: Vec<u64> = Vec::new();
    let mut bin_max = pattern_len + text_len;
    let mask = 1u64 << (pattern_len - 1);

    for errors in 0..pattern_len {
        // Widest window still able to beat the threshold with this many errors.
        let mut bin_min = 0;
        let mut bin_mid = bin_max;
        while bin_min < bin_mid {
            if compute_score(pattern_len, errors, expected + bin_mid, expected, distance) <= threshold {
                bin_min = bin_mid;
            } else {
                bin_max = bin_mid;
            }
            bin_mid = (bin_max - bin_min) / 2 + bin_min;
        }
        bin_max = bin_mid;

        let mut start = (expected as isize - bin_mid as isize + 1).max(1) as usize;
        let finish = (expected + bin_mid).min(text_len) + pattern_len;
        let mut bits = vec![0u64; finish + 2];
        bits[finish + 1] = (1u64 << errors) - 1;
        let last = |j: usize| last_bits.get(j).copied().unwrap_or(0);

        let mut j = finish;
        while j >= start {
            let current = j - 1;
            let char_match = text
                .get(current)
                .and_then(|ch| chunk.alphabet.get(ch))
                .copied()
                .unwrap_or(0);
            if compute_matches {
                match_mask[current] = char_match != 0;
            }

            bits[j] = ((bits[j + 1] << 1) | 1) & char_match;
            if errors > 0 {
                bits[j] |= ((last(j + 1) | last(j)) << 1) | 1 | last(j + 1);
            }

            if bits[j] & mask != 0 {
                final_score = compute_score(pattern_len, errors, current, expected, distance);
                if final_score <= threshold {
                    threshold = final_score;
                    best = Some(current);
                    if current <= expected {
                        break;
                    }
                    start = (2 * expected as isize - current as isize).max(1) as usize;
                }
            }
            j -= 1;
        }

        if compute_score(pattern_len, errors + 1, expected, expected, distance) > threshold {
            break;
        }
        last_bits = bits;
    }

    let mut is_match = best.is_some();
    if compute_matches && matched_runs(&match_mask, options.min_match_char_length).is_empty() {
        is_match = false;
    }
    (is_match, final_score.max(0.001))
}
