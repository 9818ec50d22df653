//! Key-value storage and TTL caching for the maison storefront.
//!
//! Two concerns live here:
//!
//! - **Durable key-value storage** ([`KvStore`]): the persistence seam used
//!   by the cart store for the current cart and saved-cart snapshots. The
//!   in-memory implementation backs tests and the demo; a browser-profile or
//!   disk-backed implementation plugs in behind the same trait.
//! - **Short-lived output caching** ([`TtlCache`], [`CacheKey`]): keyed
//!   responses with a freshness window and an optional stale-while-revalidate
//!   grace period, used by the catalog search layer.
//!
//! # Example
//!
//! ```
//! use maison_cache::{set_json, get_json, MemoryStore};
//!
//! let store = MemoryStore::new();
//! set_json(&store, "cart:current", &vec![1, 2, 3]).unwrap();
//! let items: Option<Vec<i32>> = get_json(&store, "cart:current").unwrap();
//! assert_eq!(items, Some(vec![1, 2, 3]));
//! ```

mod error;
mod key;
mod policy;
mod store;
mod ttl;

pub use error::CacheError;
pub use key::CacheKey;
pub use policy::{CachePolicy, CacheState};
pub use store::{get_json, set_json, KvStore, MemoryStore};
pub use ttl::{Lookup, TtlCache};
