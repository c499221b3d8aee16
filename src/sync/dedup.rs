//! Deduplication of fetched catalog candidates against stored identifiers.

use std::collections::HashSet;

/// Keep only candidates whose external identifier is not already stored.
///
/// Pure and deterministic: the result is exactly the subset of `candidates`
/// whose key is absent from `existing`, in the original order. Running the
/// filter again with the same set is a no-op.
pub fn filter_new<T, K>(candidates: Vec<T>, existing: &HashSet<String>, key: K) -> Vec<T>
where
    K: Fn(&T) -> &str,
{
    candidates
        .into_iter()
        .filter(|candidate| !existing.contains(key(candidate)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn existing(keys: &[&str]) -> HashSet<String> {
        keys.iter().map(|k| k.to_string()).collect()
    }

    #[test]
    fn test_filters_exactly_the_known_identifiers() {
        let candidates = vec!["a", "b", "c", "d"];
        let known = existing(&["b", "d"]);
        let fresh = filter_new(candidates, &known, |c| *c);
        assert_eq!(fresh, vec!["a", "c"]);
    }

    #[test]
    fn test_idempotent() {
        let candidates = vec!["a", "b", "c"];
        let known = existing(&["b"]);
        let once = filter_new(candidates, &known, |c| *c);
        let twice = filter_new(once.clone(), &known, |c| *c);
        assert_eq!(once, twice, "Filtering twice must not change the result");
    }

    #[test]
    fn test_empty_existing_set_keeps_everything() {
        let candidates = vec!["a", "b"];
        let known = existing(&[]);
        assert_eq!(filter_new(candidates, &known, |c| *c), vec!["a", "b"]);
    }

    #[test]
    fn test_all_known_yields_nothing() {
        let candidates = vec!["a", "b"];
        let known = existing(&["a", "b"]);
        assert!(filter_new(candidates, &known, |c| *c).is_empty());
    }

    #[test]
    fn test_preserves_input_order() {
        let candidates = vec!["newest", "older", "oldest"];
        let known = existing(&["older"]);
        assert_eq!(
            filter_new(candidates, &known, |c| *c),
            vec!["newest", "oldest"]
        );
    }
}
