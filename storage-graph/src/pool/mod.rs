//! The presentable pool: the one owner of all live presentables.
//!
//! All mutation funnels through the device-event entry points, each of
//! which follows the same two-phase discipline: mutate the cache, rebuild
//! and diff the graph, and only then flush the queued notifications FIFO.
//! Consumers therefore never observe a partially built graph, and a rule
//! re-evaluation can never synchronously re-trigger itself through an
//! event handler.

mod synthesis;

use std::cmp::Ordering;
use std::collections::{BTreeMap, BTreeSet};

use storage_graph_types::DeviceRecord;
use tracing::debug;

use crate::cache::DeviceRecordCache;
use crate::events::{EventFanout, PoolEvent, PoolEventStream};
use crate::presentable::Presentable;

#[derive(Debug, Default)]
pub struct Pool {
    cache: DeviceRecordCache,
    presentables: BTreeMap<String, Presentable>,
    /// parent id -> child ids, rebuilt each pass from the enclosing links.
    children: BTreeMap<String, BTreeSet<String>>,
    /// device id -> id of the Volume/Drive presentable wrapping it.
    device_index: BTreeMap<String, String>,
    fanout: EventFanout,
}

impl Pool {
    pub fn new() -> Self {
        let mut pool = Self::default();
        pool.resynthesize();
        pool
    }

    /// Subscribes to graph change events. Events queued before the call are
    /// not replayed; subscribe before feeding device events.
    pub fn subscribe(&mut self) -> PoolEventStream {
        self.fanout.subscribe()
    }

    // -- inbound device events -------------------------------------------

    pub fn device_added(&mut self, record: DeviceRecord) {
        debug!(device = %record.id, "device added");
        self.cache.upsert(record);
        self.resynthesize();
    }

    /// Wholesale snapshot replacement; identical handling to an add apart
    /// from logging, which is what makes coldplug replay order-independent.
    pub fn device_changed(&mut self, record: DeviceRecord) {
        debug!(device = %record.id, "device changed");
        self.cache.upsert(record);
        self.resynthesize();
    }

    pub fn device_removed(&mut self, device_id: &str) {
        debug!(device = %device_id, "device removed");
        self.cache.remove(device_id);
        self.resynthesize();
    }

    /// Replays a full scan in one pass. Arrival order within the batch is
    /// irrelevant; one synthesis pass runs at the end.
    pub fn coldplug(&mut self, records: Vec<DeviceRecord>) {
        debug!(devices = records.len(), "coldplug replay");
        for record in records {
            self.cache.upsert(record);
        }
        self.resynthesize();
    }

    // -- read side --------------------------------------------------------

    pub fn get_by_id(&self, id: &str) -> Option<&Presentable> {
        self.presentables.get(id)
    }

    /// Resolves the Volume or Drive presentable directly wrapping a device.
    pub fn get_by_device(&self, device_id: &str) -> Option<&Presentable> {
        let id = self.device_index.get(device_id)?;
        self.presentables.get(id)
    }

    pub fn device_record(&self, device_id: &str) -> Option<&DeviceRecord> {
        self.cache.get(device_id)
    }

    /// All live presentables in unspecified order; sort with
    /// [`Pool::sorted_presentables`] when display order matters.
    pub fn presentables(&self) -> impl Iterator<Item = &Presentable> {
        self.presentables.values()
    }

    /// Direct children of `id`.
    pub fn enclosed_by(&self, id: &str) -> Vec<&Presentable> {
        let mut result: Vec<&Presentable> = self
            .children
            .get(id)
            .into_iter()
            .flatten()
            .filter_map(|child| self.presentables.get(child))
            .collect();
        result.sort_by(|a, b| self.compare(a.id(), b.id()));
        result
    }

    /// Transitive closure of `enclosed_by`.
    pub fn all_enclosed_by(&self, id: &str) -> Vec<&Presentable> {
        let mut result = Vec::new();
        let mut stack: Vec<&str> = self
            .children
            .get(id)
            .into_iter()
            .flatten()
            .map(String::as_str)
            .collect();
        while let Some(child) = stack.pop() {
            if let Some(presentable) = self.presentables.get(child) {
                result.push(presentable);
            }
            stack.extend(
                self.children
                    .get(child)
                    .into_iter()
                    .flatten()
                    .map(String::as_str),
            );
        }
        result.sort_by(|a, b| self.compare(a.id(), b.id()));
        result
    }

    /// Whether `ancestor` transitively encloses `id`.
    pub fn encloses(&self, ancestor: &str, id: &str) -> bool {
        self.id_path(id)
            .iter()
            .take_while(|step| step.as_str() != id)
            .any(|step| step == ancestor)
    }

    /// Total display order: walk each enclosing chain to the root and
    /// compare the id paths lexicographically, so a node's children sort
    /// directly after it and before unrelated siblings.
    pub fn compare(&self, a: &str, b: &str) -> Ordering {
        self.id_path(a).cmp(&self.id_path(b))
    }

    pub fn sorted_presentables(&self) -> Vec<&Presentable> {
        let mut all: Vec<&Presentable> = self.presentables.values().collect();
        all.sort_by(|a, b| self.compare(a.id(), b.id()));
        all
    }

    fn id_path(&self, id: &str) -> Vec<String> {
        let mut path = vec![id.to_string()];
        let mut cursor = id.to_string();
        // Bounded walk; the enclosing relation is a forest but a stale
        // lookup mid-rebuild must not loop forever.
        for _ in 0..64 {
            let Some(parent) = self
                .presentables
                .get(&cursor)
                .and_then(|p| p.enclosing_id())
            else {
                break;
            };
            path.push(parent.to_string());
            cursor = parent.to_string();
        }
        path.reverse();
        path
    }

    // -- synthesis --------------------------------------------------------

    /// Rebuilds the desired graph from the cache, diffs it against the live
    /// graph, applies the difference, then flushes events.
    fn resynthesize(&mut self) {
        let desired = synthesis::desired_set(&self.cache);
        let mut events = Vec::new();

        // Phase 1: mutate. Nothing is emitted until the graph is whole.
        let removed: Vec<String> = self
            .presentables
            .keys()
            .filter(|id| !desired.contains_key(*id))
            .cloned()
            .collect();
        let added: Vec<String> = desired
            .keys()
            .filter(|id| !self.presentables.contains_key(*id))
            .cloned()
            .collect();

        // Children first, so no consumer ever sees an orphaned child of a
        // presentable it was already told is gone.
        let mut removals = removed;
        removals.sort_by_key(|id| std::cmp::Reverse(self.id_path(id).len()));
        for id in &removals {
            self.presentables.remove(id);
            events.push(PoolEvent::Removed(id.clone()));
        }

        for (id, presentable) in &desired {
            match self.presentables.get(id) {
                None => {
                    self.presentables.insert(id.clone(), presentable.clone());
                }
                Some(live) => {
                    let attrs_changed = !live.same_attributes(presentable);
                    let job_changed = !live.same_job(presentable);
                    if attrs_changed || job_changed {
                        self.presentables.insert(id.clone(), presentable.clone());
                    }
                    if attrs_changed {
                        events.push(PoolEvent::Changed(presentable.clone()));
                    }
                    if job_changed {
                        events.push(PoolEvent::JobChanged(presentable.clone()));
                    }
                }
            }
        }

        self.rebuild_edges();
        self.rebuild_device_index();

        // Parents first; id paths give exactly that order.
        let mut additions = added;
        additions.sort_by(|a, b| self.compare(a, b));
        // Added events go out ahead of Changed ones so a consumer reacting
        // to a dependent change (say, a re-derived VG) can already resolve
        // the nodes that change implies (its new LVs).
        let mut ordered = Vec::with_capacity(events.len() + additions.len());
        let mut changed = Vec::new();
        for event in events {
            match event {
                PoolEvent::Removed(_) => ordered.push(event),
                other => changed.push(other),
            }
        }
        for id in additions {
            if let Some(presentable) = self.presentables.get(&id) {
                ordered.push(PoolEvent::Added(presentable.clone()));
            }
        }
        ordered.extend(changed);

        // Phase 2: notify.
        self.fanout.broadcast(&ordered);
    }

    /// Re-emits `Changed` for a live presentable on behalf of a deferred
    /// notification. A no-op when the id is gone, which honors the
    /// guarantee that removed ids stay silent.
    pub fn renotify(&mut self, id: &str) {
        if let Some(presentable) = self.presentables.get(id).cloned() {
            self.fanout.broadcast(&[PoolEvent::Changed(presentable)]);
        }
    }

    fn rebuild_edges(&mut self) {
        self.children.clear();
        for presentable in self.presentables.values() {
            if let Some(parent) = presentable.enclosing_id() {
                self.children
                    .entry(parent.to_string())
                    .or_default()
                    .insert(presentable.id().to_string());
            }
        }
    }

    fn rebuild_device_index(&mut self) {
        self.device_index.clear();
        // Volumes win over the drives/arrays they sit on.
        for presentable in self.presentables.values() {
            if matches!(
                presentable,
                Presentable::Volume(_) | Presentable::Lvm2Volume(_)
            ) && let Some(device_id) = presentable.device_id()
            {
                self.device_index
                    .insert(device_id.to_string(), presentable.id().to_string());
            }
        }
        for presentable in self.presentables.values() {
            if let Some(device_id) = presentable.device_id() {
                self.device_index
                    .entry(device_id.to_string())
                    .or_insert_with(|| presentable.id().to_string());
            }
        }
    }
}
