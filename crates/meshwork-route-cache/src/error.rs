//! Route construction errors.

use thiserror::Error;

use crate::MAX_ROUTING_HOPS;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RouteError {
    /// Node id 0 is reserved for empty slots.
    #[error("destination must be a non-zero node id")]
    ZeroDestination,

    #[error("route has {0} hops (max {max})", max = MAX_ROUTING_HOPS)]
    TooManyHops(usize),
}
