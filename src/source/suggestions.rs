// Mock suggestion provider: picks a canned result for any keyword/rank pair.

use std::sync::Arc;

use super::random::ThreadRandom;
use super::traits::{RandomSource, Suggestion, SuggestionProvider};
use crate::engine::session::ResultRank;

const CATALOG: &[(&str, &str)] = &[
    (
        "Lofi Hip Hop Beats - Study Music 2024",
        "https://images.pexels.com/photos/4709285/pexels-photo-4709285.jpeg?auto=compress&cs=tinysrgb&w=300&h=200&fit=crop",
    ),
    (
        "Relaxing Jazz Music for Work & Study",
        "https://images.pexels.com/photos/164936/pexels-photo-164936.jpeg?auto=compress&cs=tinysrgb&w=300&h=200&fit=crop",
    ),
    (
        "Deep House Mix 2024 - Best Electronic Music",
        "https://images.pexels.com/photos/1763075/pexels-photo-1763075.jpeg?auto=compress&cs=tinysrgb&w=300&h=200&fit=crop",
    ),
    (
        "Ambient Chillout Music - Relaxation Sounds",
        "https://images.pexels.com/photos/1694900/pexels-photo-1694900.jpeg?auto=compress&cs=tinysrgb&w=300&h=200&fit=crop",
    ),
    (
        "Piano Instrumental Music - Peaceful Melody",
        "https://images.pexels.com/photos/210887/pexels-photo-210887.jpeg?auto=compress&cs=tinysrgb&w=300&h=200&fit=crop",
    ),
];

pub struct MockSuggestionProvider {
    rng: Arc<dyn RandomSource>,
}

impl MockSuggestionProvider {
    pub fn new(rng: Arc<dyn RandomSource>) -> Self {
        Self { rng }
    }
}

impl Default for MockSuggestionProvider {
    fn default() -> Self {
        Self::new(Arc::new(ThreadRandom))
    }
}

impl SuggestionProvider for MockSuggestionProvider {
    // The keyword does not influence the pick; only the rank is echoed in the title.
    fn fetch_suggestion(&self, _keyword: &str, rank: ResultRank) -> Suggestion {
        let (title, thumbnail) = CATALOG[self.rng.next_index(CATALOG.len())];
        Suggestion {
            title: format!("{} (Rank {})", title, rank.get()),
            thumbnail: thumbnail.to_string(),
        }
    }
}
