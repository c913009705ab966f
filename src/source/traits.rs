use crate::engine::session::ResultRank;

/// Injectable randomness so default values can be made deterministic under test.
pub trait RandomSource: Send + Sync {
    /// Return an index uniformly drawn from `0..bound`. `bound` is never zero.
    fn next_index(&self, bound: usize) -> usize;
}

/// Display content for a search result.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Suggestion {
    pub title: String,
    pub thumbnail: String,
}

pub trait SuggestionProvider: Send + Sync {
    fn fetch_suggestion(&self, keyword: &str, rank: ResultRank) -> Suggestion;
}
