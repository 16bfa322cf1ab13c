use std::collections::HashSet;

/// Plates to flag. Fixed for the whole run, matched by exact string equality
/// only. No trimming, no case folding, nothing fuzzy.
pub struct Watchlist {
    plates: HashSet<String>,
}

impl Watchlist {

    pub fn new(plates: impl IntoIterator<Item = impl Into<String>>) -> Self {
        let plates = plates.into_iter().map(Into::into).collect();
        Self { plates }
    }

    /// Demo entries used when the command line supplies none.
    pub fn demo() -> Self {
        Self::new(vec!["ABC123", "XYZ789"])
    }

    pub fn contains(&self, plate: &str) -> bool {
        self.plates.contains(plate)
    }

    pub fn len(&self) -> usize {
        self.plates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.plates.is_empty()
    }
}

#[cfg(test)]
mod test {

    use super::Watchlist;

    #[test]
    fn exact_match_only() {
        let list = Watchlist::new(vec!["ABC123"]);
        assert!(list.contains("ABC123"));
        // near misses never match
        assert!(!list.contains("abc123"));
        assert!(!list.contains("ABC123 "));
        assert!(!list.contains(" ABC123"));
        assert!(!list.contains("ABC12"));
        assert!(!list.contains("ABC1234"));
    }

    #[test]
    fn demo_list_has_both_entries() {
        let list = Watchlist::demo();
        assert_eq!(list.len(), 2);
        assert!(list.contains("ABC123"));
        assert!(list.contains("XYZ789"));
    }
}
