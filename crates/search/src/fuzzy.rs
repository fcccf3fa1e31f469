//! Fuzzy matching algorithms.

/// Smallest score given to a match that is not an exact field match.
pub const MIN_PARTIAL_SCORE: f64 = 0.001;

/// Edit distance between `pattern` and the best-matching substring of `text`.
///
/// Insertions, deletions and substitutions cost one each. The match may
/// start and end anywhere in `text`, so a pattern that occurs verbatim
/// somewhere inside the text has distance 0.
///
/// # Arguments
/// * `pattern` - Characters to look for
/// * `text` - Characters to search in
///
/// # Returns
/// Minimum number of edits turning `pattern` into some substring of `text`
pub fn substring_distance(pattern: &[char], text: &[char]) -> usize {
    let m = pattern.len();
    let n = text.len();

    if m == 0 { return 0; }
    if n == 0 { return m; }

    // Column-wise DP over the pattern; row 0 is free so matches may start anywhere.
    let mut prev: Vec<usize> = (0..=m).collect();
    let mut curr = vec![0; m + 1];
    let mut best = prev[m];

    for j in 1..=n {
        curr[0] = 0;
        for i in 1..=m {
            let cost = if pattern[i - 1] == text[j - 1] { 0 } else { 1 };
            curr[i] = (prev[i] + 1)
                .min(curr[i - 1] + 1)
                .min(prev[i - 1] + cost);
        }
        best = best.min(curr[m]);
        if best == 0 {
            return 0;
        }
        std::mem::swap(&mut prev, &mut curr);
    }

    best
}

/// Most edits tolerated for a pattern of `len` characters.
pub fn max_errors(len: usize, threshold: f64) -> usize {
    // The epsilon keeps 0.15 * 20 from landing on 2.999...
    (threshold * len as f64 + 1e-9).floor() as usize
}

/// Score one field against a lowercased query.
///
/// Both inputs must already be lowercased. Returns `None` when the field does
/// not match within `threshold`; otherwise `errors / pattern length`, with 0
/// reserved for a field equal to the query and every other match floored at
/// [`MIN_PARTIAL_SCORE`].
pub fn field_score(pattern: &[char], text: &[char], threshold: f64) -> Option<f64> {
    if pattern.is_empty() {
        return None;
    }
    if pattern == text {
        return Some(0.0);
    }

    let errors = substring_distance(pattern, text);
    if errors > max_errors(pattern.len(), threshold) {
        return None;
    }

    Some((errors as f64 / pattern.len() as f64).max(MIN_PARTIAL_SCORE))
}

/// Length norm for a field: `1 / sqrt(token count)`, rounded to three places.
///
/// Longer fields weigh less, so a hit on a one-word name outranks the same
/// hit inside a long list of platforms.
pub fn field_norm(text: &str) -> f64 {
    let tokens = text.split(' ').filter(|t| !t.is_empty()).count().max(1);
    ((1.0 / (tokens as f64).sqrt()) * 1000.0).round() / 1000.0
}

/// Lowercase a string into characters for matching.
pub fn fold(text: &str) -> Vec<char> {
    text.to_lowercase().chars().collect()
}
