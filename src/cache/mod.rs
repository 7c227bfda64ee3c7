//! Keyed caches for processed content.
//!
//! - `lru`: generic capacity-bounded cache with TTL staleness
//! - `source`: file-keyed specialization that also validates entries against
//!   the backing file's on-disk modification time

mod lru;
mod source;

pub use lru::LruCache;
pub use source::SourceCache;
