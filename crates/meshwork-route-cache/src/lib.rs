//! # meshwork-route-cache
//!
//! A fixed-capacity cache of routes learned by a higher-level routing
//! algorithm, indexed by destination and scored by observed delivery quality.
//!
//! The cache never allocates after construction: it holds
//! [`MAX_DST_NODES`] route lists of [`MAX_DST_ROUTES`] entries each, and every
//! route carries at most [`MAX_ROUTING_HOPS`] intermediate hops. When a list or
//! the whole table is full, a forced admission evicts the lowest-scoring
//! entry or destination.
//!
//! ```
//! use meshwork_route_cache::{Route, RouteCache, QosCalculation};
//!
//! let mut cache = RouteCache::new();
//! let route = Route::new(1, 9, &[4, 5])?;
//! cache.admit(&route, false);
//! cache.adjust_qos(&route, true);
//!
//! assert_eq!(cache.count(9), 1);
//! assert_eq!(cache.aggregate_qos(9, QosCalculation::Best), 8);
//! # Ok::<(), meshwork_route_cache::RouteError>(())
//! ```

mod cache;
mod error;
mod qos;
mod route;

pub use cache::*;
pub use error::*;
pub use qos::*;
pub use route::*;

/// Maximum number of distinct destinations tracked.
pub const MAX_DST_NODES: usize = 8;

/// Maximum number of routes cached per destination.
pub const MAX_DST_ROUTES: usize = 4;

/// Maximum number of intermediate hops in a route.
pub const MAX_ROUTING_HOPS: usize = 8;
