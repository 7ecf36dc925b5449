// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! "Did you mean" suggestions shared by the parser and analyzer:
//! nearest-neighbor match by Levenshtein distance, suppressed beyond
//! distance 3.

/// The maximum edit distance at which a suggestion is still offered.
const MAX_DISTANCE: usize = 3;

/// Finds the candidate in `candidates` closest to `name` by Levenshtein
/// distance, returning `None` if the closest is farther than
/// [`MAX_DISTANCE`] or `candidates` is empty.
#[must_use]
pub fn suggest<'c>(name: &str, candidates: impl IntoIterator<Item = &'c str>) -> Option<&'c str> {
    candidates
        .into_iter()
        .map(|candidate| (candidate, levenshtein(name, candidate)))
        .filter(|&(_, distance)| distance <= MAX_DISTANCE)
        .min_by_key(|&(_, distance)| distance)
        .map(|(candidate, _)| candidate)
}

/// Classic Wagner–Fischer edit distance over `char`s, with a single
/// rolling row rather than a full matrix.
fn levenshtein(a: &str, b: &str) -> usize {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    let mut previous: Vec<usize> = (0..=b.len()).collect();
    let mut current = vec![0usize; b.len() + 1];

    for (i, &ca) in a.iter().enumerate() {
        current[0] = i + 1;
        for (j, &cb) in b.iter().enumerate() {
            let cost = usize::from(ca != cb);
            current[j + 1] = (previous[j + 1] + 1).min(current[j] + 1).min(previous[j] + cost);
        }
        std::mem::swap(&mut previous, &mut current);
    }
    previous[b.len()]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exact_match_has_zero_distance() {
        assert_eq!(levenshtein("cube", "cube"), 0);
    }

    #[test]
    fn suggests_closest_within_distance() {
        let candidates = ["cube", "sphere", "cylinder"];
        assert_eq!(suggest("cyube", candidates), Some("cube"));
    }

    #[test]
    fn suppresses_distant_suggestions() {
        let candidates = ["cube"];
        assert_eq!(suggest("completely_unrelated_name", candidates), None);
    }
}
