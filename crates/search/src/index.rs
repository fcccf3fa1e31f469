//! Weighted approximate-match index.
//!
//! An index holds a list of entries and a set of weighted text fields. A query
//! scores every entry field by field with [`field_score`], combines the
//! matching fields into one score and returns the best hits, lowest score
//! first.
//!
//! Combination follows a weighted geometric scheme: each matching field
//! contributes `score ^ (weight * norm)`, where `weight` is the field's share
//! of the total weight and `norm` shrinks with field length. Fields that do not
//! match contribute nothing, so an entry matches as soon as one field does.

use crate::fuzzy::{field_norm, field_score, fold};

#[cfg(feature = "parallel")]
use rayon::prelude::*;

/// Entries below this count are scored on the calling thread.
#[cfg(feature = "parallel")]
const PARALLEL_MIN_ENTRIES: usize = 512;

/// Accessor for one text field of an entry.
pub type FieldFn<E> = for<'a> fn(&'a E) -> &'a str;

/// A named, weighted text field of `E`.
pub struct WeightedField<E> {
    pub name: &'static str,
    pub weight: f64,
    extract: FieldFn<E>,
}

impl<E> WeightedField<E> {
    pub fn new(name: &'static str, weight: f64, extract: FieldFn<E>) -> Self {
        Self { name, weight, extract }
    }

    /// The field's text for an entry.
    pub fn text<'a>(&self, entry: &'a E) -> &'a str {
        (self.extract)(entry)
    }
}

impl<E> Clone for WeightedField<E> {
    fn clone(&self) -> Self {
        Self { name: self.name, weight: self.weight, extract: self.extract }
    }
}

impl<E> std::fmt::Debug for WeightedField<E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WeightedField")
            .field("name", &self.name)
            .field("weight", &self.weight)
            .finish()
    }
}

/// One scored match. Lower scores are better.
#[derive(Debug)]
pub struct SearchHit<'a, E> {
    pub entry: &'a E,
    pub score: f64,
}

impl<E> Clone for SearchHit<'_, E> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<E> Copy for SearchHit<'_, E> {}

/// Lowercased field text with its length norm.
#[derive(Debug, Clone)]
struct PreparedField {
    chars: Vec<char>,
    norm: f64,
}

/// Approximate-match index over entries of type `E`.
#[derive(Debug)]
pub struct MatchIndex<E> {
    fields: Vec<WeightedField<E>>,
    /// Each field's weight divided by the sum of all weights
    shares: Vec<f64>,
    threshold: f64,
    limit: usize,
    entries: Vec<E>,
    prepared: Vec<Vec<Option<PreparedField>>>,
    built: bool,
}

impl<E: Sync> MatchIndex<E> {
    /// Creates an empty, unbuilt index.
    ///
    /// # Arguments
    /// * `fields` - Fields to match against, with raw weights
    /// * `threshold` - Largest tolerated `errors / query length`
    /// * `limit` - Maximum hits returned per query
    pub fn new(fields: Vec<WeightedField<E>>, threshold: f64, limit: usize) -> Self {
        let total: f64 = fields.iter().map(|f| f.weight).sum();
        let shares = if total > 0.0 {
            fields.iter().map(|f| f.weight / total).collect()
        } else {
            vec![1.0 / fields.len().max(1) as f64; fields.len()]
        };

        Self {
            fields,
            shares,
            threshold,
            limit,
            entries: Vec::new(),
            prepared: Vec::new(),
            built: false,
        }
    }

    /// Replaces the indexed entries wholesale.
    pub fn build(&mut self, entries: Vec<E>) {
        self.prepared = entries
            .iter()
            .map(|entry| {
                self.fields
                    .iter()
                    .map(|field| {
                        let text = field.text(entry);
                        // Blank fields never match anything.
                        (!text.trim().is_empty()).then(|| PreparedField {
                            chars: fold(text),
                            norm: field_norm(text),
                        })
                    })
                    .collect()
            })
            .collect();
        self.entries = entries;
        self.built = true;
    }

    /// Whether [`build`](Self::build) has run.
    pub fn is_built(&self) -> bool {
        self.built
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Indexed entries in build order.
    pub fn entries(&self) -> &[E] {
        &self.entries
    }

    /// Hit cap applied to every query.
    pub fn limit(&self) -> usize {
        self.limit
    }

    /// Finds entries approximately matching `text`, best first.
    ///
    /// Matching is case-insensitive and ignores where in a field the match
    /// sits. Equal scores keep build order. At most `limit` hits are returned;
    /// an unbuilt index or an empty query returns nothing.
    pub fn query(&self, text: &str) -> Vec<SearchHit<'_, E>> {
        if !self.built || text.is_empty() {
            return Vec::new();
        }

        let pattern = fold(text);
        let score_at = |i: usize| self.score_entry(&pattern, &self.prepared[i]).map(|s| (i, s));

        #[cfg(feature = "parallel")]
        let mut scored: Vec<(usize, f64)> = if self.entries.len() >= PARALLEL_MIN_ENTRIES {
            (0..self.entries.len()).into_par_iter().filter_map(score_at).collect()
        } else {
            (0..self.entries.len()).filter_map(score_at).collect()
        };

        #[cfg(not(feature = "parallel"))]
        let mut scored: Vec<(usize, f64)> = (0..self.entries.len()).filter_map(score_at).collect();

        scored.sort_by(|a, b| a.1.total_cmp(&b.1).then(a.0.cmp(&b.0)));
        scored.truncate(self.limit);

        scored
            .into_iter()
            .map(|(i, score)| SearchHit { entry: &self.entries[i], score })
            .collect()
    }

    fn score_entry(&self, pattern: &[char], fields: &[Option<PreparedField>]) -> Option<f64> {
        let mut total = 1.0_f64;
        let mut matched = false;

        for (prepared, share) in fields.iter().zip(&self.shares) {
            let Some(prepared) = prepared else { continue };
            if *share <= 0.0 {
                continue;
            }
            if let Some(score) = field_score(pattern, &prepared.chars, self.threshold) {
                let base = if score == 0.0 { f64::EPSILON } else { score };
                total *= base.powf(share * prepared.norm);
                matched = true;
            }
        }

        matched.then_some(total)
    }
}
