//! Routes and cache slots.

use std::fmt;

use meshwork_common::{NodeId, NODE_ID_NONE};

use crate::{Qos, RouteError, MAX_DST_ROUTES, MAX_ROUTING_HOPS, QOS_LEVEL_UNKNOWN};

/// One path through the mesh to a destination.
///
/// Two routes are equal when their destination and hop sequence match; the
/// source is not part of a route's identity.
#[derive(Debug, Clone, Copy, Default, Eq)]
pub struct Route {
    /// Node that originated the route.
    pub src: NodeId,
    /// Final destination. [`NODE_ID_NONE`] marks an empty slot.
    pub dst: NodeId,
    hop_count: u8,
    hops: [NodeId; MAX_ROUTING_HOPS],
}

impl Route {
    /// Build a route through `hops` (intermediate nodes, in order).
    pub fn new(src: NodeId, dst: NodeId, hops: &[NodeId]) -> Result<Self, RouteError> {
        if dst == NODE_ID_NONE {
            return Err(RouteError::ZeroDestination);
        }
        if hops.len() > MAX_ROUTING_HOPS {
            return Err(RouteError::TooManyHops(hops.len()));
        }
        let mut route = Route {
            src,
            dst,
            hop_count: hops.len() as u8,
            hops: [NODE_ID_NONE; MAX_ROUTING_HOPS],
        };
        route.hops[..hops.len()].copy_from_slice(hops);
        Ok(route)
    }

    /// A single-hop route with no intermediate nodes.
    pub fn direct(src: NodeId, dst: NodeId) -> Result<Self, RouteError> {
        Self::new(src, dst, &[])
    }

    pub fn hop_count(&self) -> usize {
        self.hop_count as usize
    }

    /// The intermediate hops, without padding.
    pub fn hops(&self) -> &[NodeId] {
        &self.hops[..self.hop_count()]
    }

    /// True for the empty-slot sentinel.
    pub fn is_empty(&self) -> bool {
        self.dst == NODE_ID_NONE
    }
}

impl PartialEq for Route {
    fn eq(&self, other: &Self) -> bool {
        self.dst == other.dst && self.hop_count == other.hop_count && self.hops() == other.hops()
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} -> ", self.src)?;
        for hop in self.hops() {
            write!(f, "{} -> ", hop)?;
        }
        write!(f, "{}", self.dst)
    }
}

/// A cached route and its quality score.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RouteEntry {
    pub route: Route,
    pub qos: Qos,
}

impl RouteEntry {
    pub fn is_active(&self) -> bool {
        !self.route.is_empty()
    }

    pub(crate) fn clear(&mut self) {
        *self = RouteEntry::default();
    }
}

impl Default for RouteEntry {
    fn default() -> Self {
        RouteEntry {
            route: Route::default(),
            qos: QOS_LEVEL_UNKNOWN,
        }
    }
}

/// All cached routes for one destination.
///
/// Active entries may be interleaved with empty slots.
#[derive(Debug, Clone, Copy, Default)]
pub struct RouteList {
    pub(crate) dst: NodeId,
    pub(crate) entries: [RouteEntry; MAX_DST_ROUTES],
}

impl RouteList {
    /// Destination this list belongs to; [`NODE_ID_NONE`] when free.
    pub fn dst(&self) -> NodeId {
        self.dst
    }

    pub fn is_active(&self) -> bool {
        self.dst != NODE_ID_NONE
    }

    /// Every slot, including empty ones.
    pub fn slots(&self) -> &[RouteEntry; MAX_DST_ROUTES] {
        &self.entries
    }

    /// Slots holding a route for this list's destination.
    pub fn entries(&self) -> impl Iterator<Item = &RouteEntry> {
        let dst = self.dst;
        self.entries
            .iter()
            .filter(move |e| dst != NODE_ID_NONE && e.route.dst == dst)
    }

    pub fn count(&self) -> usize {
        self.entries().count()
    }
}
