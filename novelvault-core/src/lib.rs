//! novelvault-core: domain rules shared by the server and CLI.
//!
//! Everything here is pure: no database, no HTTP. The server crate feeds
//! query results through these functions.

pub mod browse;
pub mod config;
pub mod error;
pub mod progress;
pub mod ranking;
pub mod rate_limit;
pub mod sitemap;

pub use browse::{BrowseCandidate, BrowsePage, BrowseQuery, BrowseSort};
pub use config::{NovelvaultConfig, RateLimitBackend};
pub use error::{CoreError, Result};
pub use progress::{reading_progress, ReadingProgress};
pub use ranking::{RankingCategory, SortKey};
pub use rate_limit::{Decision, RateLimitPolicy, SlidingWindow};
pub use sitemap::SitemapBuilder;
