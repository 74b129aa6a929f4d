pub mod cache;
pub mod client;
pub mod context;
pub mod discovery;
pub mod dispatch;
pub mod error;
pub mod extract;
pub mod frame;
pub mod normalize;
pub mod reader;
pub mod records;
pub mod request;
pub mod session;
pub mod trending;

pub use cache::{CachePolicy, SearchCache, SearchCacheKey};
pub use client::{ByteStream, DiscoveryClient, ReplayOpener, StreamOpener};
pub use context::DiscoveryContext;
pub use discovery::{Discovery, NoopObserver, SearchObserver, SearchOutcome};
pub use dispatch::{Dispatcher, Effect, SearchState, SearchView};
pub use error::{FrameParseError, StreamError};
pub use extract::extract_pois;
pub use frame::{parse_frame, FrameKind, RawFrame};
pub use normalize::normalize;
pub use reader::LineBuffer;
pub use records::{SessionRecord, SessionStore};
pub use request::{DiscoveryRequest, SearchRequest};
pub use session::{AbortHandle, SearchController};
pub use trending::{TrendingAggregator, TrendingEntry};
