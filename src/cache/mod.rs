//! Query cache keyed by resource tags, with invalidation computed from
//! mutation outcomes.

pub mod invalidation;
pub mod key;
pub mod store;

pub use invalidation::{invalidated_keys, Mutation};
pub use key::{CacheKey, QueryKey, TagId};
pub use store::{CacheEvent, FetchTicket, QueryCache};
