//! The route cache.

use std::fmt;

use log::{debug, trace, warn};
use meshwork_common::{NodeId, NODE_ID_NONE};
use meshwork_metrics::{metric_defs, metrics};

use crate::{
    normalize_qos, Qos, QosCalculation, Route, RouteEntry, RouteList, MAX_DST_NODES, MAX_DST_ROUTES,
    QOS_LEVEL_AVERAGE, QOS_LEVEL_MAX, QOS_LEVEL_MIN, QOS_LEVEL_UNKNOWN,
};

/// What is about to happen to an entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteEntryEvent {
    /// The entry was (re)populated with a new route.
    Changed,
    /// The entry is about to be cleared.
    Removing,
}

/// Observer of cache mutations.
///
/// `Removing` is delivered while the entry still holds its route; `Changed`
/// after the new route is in place.
pub trait RouteCacheListener {
    fn route_entry_change(&mut self, entry: &RouteEntry, event: RouteEntryEvent);
}

/// Destination-indexed route table with QoS-driven eviction.
pub struct RouteCache {
    table: [RouteList; MAX_DST_NODES],
    listener: Option<Box<dyn RouteCacheListener>>,
}

fn notify(
    listener: &mut Option<Box<dyn RouteCacheListener>>,
    entry: &RouteEntry,
    event: RouteEntryEvent,
) {
    if let Some(listener) = listener.as_mut() {
        listener.route_entry_change(entry, event);
    }
}

impl RouteCache {
    pub fn new() -> Self {
        RouteCache {
            table: [RouteList::default(); MAX_DST_NODES],
            listener: None,
        }
    }

    pub fn with_listener(listener: Box<dyn RouteCacheListener>) -> Self {
        let mut cache = Self::new();
        cache.listener = Some(listener);
        cache
    }

    pub fn set_listener(&mut self, listener: Option<Box<dyn RouteCacheListener>>) {
        self.listener = listener;
    }

    /// The route list for `dst`, if one is active.
    pub fn lookup(&self, dst: NodeId) -> Option<&RouteList> {
        self.list_index(dst).map(|i| &self.table[i])
    }

    /// All active route lists, in table order.
    pub fn lists(&self) -> impl Iterator<Item = &RouteList> {
        self.table.iter().filter(|l| l.is_active())
    }

    /// The cached entry equal to `route`.
    pub fn find(&self, route: &Route) -> Option<&RouteEntry> {
        self.locate(route).map(|(li, si)| &self.table[li].entries[si])
    }

    /// Number of cached routes to `dst`.
    pub fn count(&self, dst: NodeId) -> usize {
        self.lookup(dst).map_or(0, RouteList::count)
    }

    /// The `index`-th cached route to `dst`, skipping empty slots.
    pub fn route_at(&self, dst: NodeId, index: usize) -> Option<&RouteEntry> {
        self.lookup(dst).and_then(|list| list.entries().nth(index))
    }

    /// Total number of cached routes.
    pub fn len(&self) -> usize {
        self.lists().map(RouteList::count).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Cache `route`.
    ///
    /// Returns `None` when an equal route is already cached, or when there is
    /// no room and `force_replace` is not set. With `force_replace`, a full
    /// list gives up its lowest-scoring entry, and a full table gives up the
    /// destination whose average score is lowest. Ties go to the highest
    /// index.
    pub fn admit(&mut self, route: &Route, force_replace: bool) -> Option<RouteEntry> {
        if route.is_empty() {
            warn!("Refusing to cache a route with no destination");
            return None;
        }
        if self.locate(route).is_some() {
            trace!("Route {} already cached", route);
            return None;
        }
        // Re-pad through the constructor so unused hop slots are zero.
        let stored = Route::new(route.src, route.dst, route.hops()).ok()?;

        let (li, si) = match self.list_index(route.dst) {
            Some(li) => match self.table[li].entries.iter().position(|e| !e.is_active()) {
                Some(si) => (li, si),
                None if force_replace => {
                    let si = self.worst_entry_index(li);
                    debug!("List for dst {} full, replacing slot {}", route.dst, si);
                    self.evict_entry(li, si);
                    (li, si)
                }
                None => {
                    debug!("List for dst {} full, route {} not cached", route.dst, route);
                    return None;
                }
            },
            None => match self.table.iter().position(|l| !l.is_active()) {
                Some(li) => (li, 0),
                None if force_replace => {
                    let li = self.worst_list_index();
                    debug!(
                        "Table full, evicting dst {} for dst {}",
                        self.table[li].dst, route.dst
                    );
                    self.evict_list(li);
                    (li, 0)
                }
                None => {
                    debug!("Table full, route {} not cached", route);
                    return None;
                }
            },
        };

        let list = &mut self.table[li];
        list.dst = route.dst;
        let entry = &mut list.entries[si];
        entry.route = stored;
        entry.qos = QOS_LEVEL_AVERAGE;
        let admitted = *entry;
        notify(&mut self.listener, &admitted, RouteEntryEvent::Changed);

        debug!("Cached route {} at [{}][{}]", admitted.route, li, si);
        metrics::counter!(metric_defs::ROUTE_CACHE_ADMITTED.name).increment(1);
        self.record_size();
        Some(admitted)
    }

    /// Remove the entry equal to `route`. Removing the last route to a
    /// destination frees its list.
    pub fn remove(&mut self, route: &Route) -> bool {
        let Some((li, si)) = self.locate(route) else {
            return false;
        };
        let list = &mut self.table[li];
        notify(&mut self.listener, &list.entries[si], RouteEntryEvent::Removing);
        list.entries[si].clear();
        if list.count() == 0 {
            trace!("Last route to dst {} removed, freeing list", list.dst);
            list.dst = NODE_ID_NONE;
        }
        metrics::counter!(metric_defs::ROUTE_CACHE_REMOVED.name).increment(1);
        self.record_size();
        true
    }

    /// Drop every route to `dst`.
    pub fn remove_all_for_dst(&mut self, dst: NodeId) {
        if let Some(li) = self.list_index(dst) {
            self.free_list(li);
            self.record_size();
        }
    }

    /// Drop every route in the table.
    pub fn clear_all(&mut self) {
        for li in 0..MAX_DST_NODES {
            self.free_list(li);
        }
        self.record_size();
    }

    /// Nudge the score of the entry equal to `route` up or down by one.
    ///
    /// Returns whether such an entry exists.
    pub fn adjust_qos(&mut self, route: &Route, increase: bool) -> bool {
        let Some((li, si)) = self.locate(route) else {
            return false;
        };
        let entry = &mut self.table[li].entries[si];
        let delta = if increase { 1 } else { -1 };
        entry.qos = normalize_qos(entry.qos as i16 + delta);
        trace!("QoS for {} now {}", entry.route, entry.qos);
        true
    }

    /// Fold the scores of every route to `dst`.
    ///
    /// [`QosCalculation::Average`] is the arithmetic mean, truncated toward
    /// zero. Unknown destinations yield [`QOS_LEVEL_UNKNOWN`].
    pub fn aggregate_qos(&self, dst: NodeId, mode: QosCalculation) -> Qos {
        match self.lookup(dst) {
            Some(list) => aggregate(list, mode),
            None => QOS_LEVEL_UNKNOWN,
        }
    }

    fn list_index(&self, dst: NodeId) -> Option<usize> {
        if dst == NODE_ID_NONE {
            return None;
        }
        self.table.iter().position(|l| l.dst == dst)
    }

    fn locate(&self, route: &Route) -> Option<(usize, usize)> {
        let li = self.list_index(route.dst)?;
        self.table[li]
            .entries
            .iter()
            .position(|e| e.route == *route)
            .map(|si| (li, si))
    }

    fn worst_entry_index(&self, li: usize) -> usize {
        let mut worst = QOS_LEVEL_MAX;
        let mut worst_index = MAX_DST_ROUTES - 1;
        for (si, entry) in self.table[li].entries.iter().enumerate() {
            if entry.qos <= worst {
                worst = entry.qos;
                worst_index = si;
            }
        }
        worst_index
    }

    fn worst_list_index(&self) -> usize {
        let mut worst = QOS_LEVEL_MAX;
        let mut worst_index = MAX_DST_NODES - 1;
        for (li, list) in self.table.iter().enumerate() {
            let qos = aggregate(list, QosCalculation::Average);
            if qos <= worst {
                worst = qos;
                worst_index = li;
            }
        }
        worst_index
    }

    fn evict_entry(&mut self, li: usize, si: usize) {
        let entry = &mut self.table[li].entries[si];
        notify(&mut self.listener, entry, RouteEntryEvent::Removing);
        entry.clear();
        metrics::counter!(metric_defs::ROUTE_CACHE_EVICTED.name).increment(1);
    }

    fn evict_list(&mut self, li: usize) {
        let evicted = self.table[li].count() as u64;
        self.free_list(li);
        metrics::counter!(metric_defs::ROUTE_CACHE_EVICTED.name).increment(evicted);
    }

    fn free_list(&mut self, li: usize) {
        let list = &mut self.table[li];
        let dst = list.dst;
        for entry in list.entries.iter_mut() {
            if dst != NODE_ID_NONE && entry.route.dst == dst {
                notify(&mut self.listener, entry, RouteEntryEvent::Removing);
            }
            entry.clear();
        }
        list.dst = NODE_ID_NONE;
    }

    fn record_size(&self) {
        metrics::gauge!(metric_defs::ROUTE_CACHE_ENTRIES.name).set(self.len() as f64);
    }
}

fn aggregate(list: &RouteList, mode: QosCalculation) -> Qos {
    let mut result: i16 = match mode {
        QosCalculation::Best => QOS_LEVEL_MIN as i16,
        QosCalculation::Worst => QOS_LEVEL_MAX as i16,
        QosCalculation::Average => 0,
    };
    let mut sum: i16 = 0;
    let mut count: i16 = 0;
    for entry in list.entries() {
        let qos = entry.qos as i16;
        match mode {
            QosCalculation::Best => result = result.max(qos),
            QosCalculation::Worst => result = result.min(qos),
            QosCalculation::Average => {
                sum += qos;
                count += 1;
            }
        }
    }
    if mode == QosCalculation::Average && count > 0 {
        result = sum / count;
    }
    normalize_qos(result)
}

impl Default for RouteCache {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for RouteCache {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RouteCache")
            .field("table", &self.table)
            .field("listener", &self.listener.is_some())
            .finish()
    }
}

impl fmt::Display for RouteCache {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "RouteCache ({} destinations x {} routes, listener: {})",
            MAX_DST_NODES,
            MAX_DST_ROUTES,
            self.listener.is_some()
        )?;
        for (li, list) in self.table.iter().enumerate() {
            if !list.is_active() {
                writeln!(f, "  [{}] inactive", li)?;
                continue;
            }
            writeln!(f, "  [{}] dst {}", li, list.dst)?;
            for (si, entry) in list.entries.iter().enumerate() {
                if entry.is_active() {
                    writeln!(f, "    [{}] qos {:>2}  {}", si, entry.qos, entry.route)?;
                } else {
                    writeln!(f, "    [{}] empty", si)?;
                }
            }
        }
        Ok(())
    }
}
