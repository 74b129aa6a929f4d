use crate::cache::{CachePolicy, SearchCache};
use crate::records::SessionStore;
use crate::trending::TrendingAggregator;

/// Mutable state shared by successive searches of one [`crate::Discovery`].
///
/// Lives exactly as long as its owner; nothing in it is persisted or shared
/// between owners.
#[derive(Debug, Default)]
pub struct DiscoveryContext {
    pub cache: SearchCache,
    pub trending: TrendingAggregator,
    pub sessions: SessionStore,
}

impl DiscoveryContext {
    #[must_use]
    pub fn new(policy: CachePolicy) -> Self {
        Self {
            cache: SearchCache::new(policy),
            trending: TrendingAggregator::new(),
            sessions: SessionStore::new(),
        }
    }
}
