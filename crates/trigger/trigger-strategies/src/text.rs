//! Text strategies: exact, contains and fuzzy scoring of one keyword against one message.
//!
//! Inputs are expected to be normalized already (see [`normalize`]).

/// Score of an exact hit.
pub const EXACT_SCORE: f64 = 1.0;
/// Score of a substring hit.
pub const CONTAINS_SCORE: f64 = 0.8;

/// Case-folds unless matching is case sensitive.
pub fn normalize(text: &str, case_sensitive: bool) -> String {
    if case_sensitive {
        text.to_string()
    } else {
        text.to_lowercase()
    }
}

/// 1.0 if the message equals the keyword (surrounding whitespace ignored), else 0.
pub fn exact_score(message: &str, keyword: &str) -> f64 {
    if message.trim() == keyword.trim() {
        EXACT_SCORE
    } else {
        0.0
    }
}

/// 0.8 if the message contains the keyword, with the character offset of every occurrence.
pub fn contains_score(message: &str, keyword: &str) -> (f64, Vec<usize>) {
    let keyword = keyword.trim();
    if keyword.is_empty() {
        return (0.0, Vec::new());
    }
    let positions: Vec<usize> = message
        .match_indices(keyword)
        .map(|(byte_idx, _)| message[..byte_idx].chars().count())
        .collect();
    if positions.is_empty() {
        (0.0, positions)
    } else {
        (CONTAINS_SCORE, positions)
    }
}

/// Levenshtein edit distance over characters.
pub fn levenshtein_distance(a: &str, b: &str) -> usize {
    if a == b {
        return 0;
    }
    if a.is_empty() {
        return b.chars().count();
    }
    if b.is_empty() {
        return a.chars().count();
    }

    let b_chars = b.chars().collect::<Vec<_>>();
    let mut previous = (0..=b_chars.len()).collect::<Vec<_>>();
    let mut current = vec![0; b_chars.len() + 1];

    for (i, left) in a.chars().enumerate() {
        current[0] = i + 1;
        for (j, right) in b_chars.iter().enumerate() {
            let substitution_cost = usize::from(left != *right);
            let deletion = previous[j + 1] + 1;
            let insertion = current[j] + 1;
            let substitution = previous[j] + substitution_cost;
            current[j + 1] = deletion.min(insertion).min(substitution);
        }
        previous.clone_from_slice(&current);
    }

    previous[b_chars.len()]
}

/// `1 - distance / max(len)`; 0 when both strings are empty.
pub fn fuzzy_similarity(a: &str, b: &str) -> f64 {
    let longest = a.chars().count().max(b.chars().count());
    if longest == 0 {
        return 0.0;
    }
    1.0 - levenshtein_distance(a, b) as f64 / longest as f64
}

/// Fuzzy similarity, or 0 when below `threshold`.
pub fn fuzzy_score(message: &str, keyword: &str, threshold: f64) -> f64 {
    let similarity = fuzzy_similarity(message.trim(), keyword.trim());
    if similarity >= threshold {
        similarity
    } else {
        0.0
    }
}
