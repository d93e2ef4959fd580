// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Per-frame annotation lookup.
//!
//! The store holds an immutable table that is replaced as a whole on every
//! load. Readers clone an `Arc` to the current table, so a lookup racing a
//! load sees either the old or the new mapping, never a mix.

use crate::models::annotation::{AnnotationShape, FrameIndex, FrameMap, ShapeList};
use parking_lot::RwLock;
use std::collections::BTreeMap;
use std::sync::Arc;

type FrameTable = BTreeMap<FrameIndex, ShapeList>;

/// Immutable view of the store taken at one instant.
#[derive(Debug, Clone)]
pub struct StoreSnapshot {
    table: Arc<FrameTable>,
    empty: ShapeList,
}

impl StoreSnapshot {
    /// Shapes for `frame`, or an empty list when the frame has none.
    pub fn lookup(&self, frame: FrameIndex) -> ShapeList {
        self.table
            .get(&frame)
            .cloned()
            .unwrap_or_else(|| self.empty.clone())
    }

    pub fn annotated_frames(&self) -> impl Iterator<Item = FrameIndex> + '_ {
        self.table.keys().copied()
    }

    /// First annotated frame strictly after `frame`.
    pub fn next_annotated_after(&self, frame: FrameIndex) -> Option<FrameIndex> {
        self.table
            .range(frame.saturating_add(1)..)
            .next()
            .map(|(index, _)| *index)
    }

    /// Last annotated frame strictly before `frame`.
    pub fn previous_annotated_before(&self, frame: FrameIndex) -> Option<FrameIndex> {
        self.table.range(..frame).next_back().map(|(index, _)| *index)
    }

    pub fn frame_count(&self) -> usize {
        self.table.len()
    }

    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }
}

/// Sparse frame-to-shapes mapping with atomic bulk replacement.
#[derive(Debug)]
pub struct AnnotationStore {
    table: RwLock<Arc<FrameTable>>,
    empty: ShapeList,
}

impl Default for AnnotationStore {
    fn default() -> Self {
        Self::new()
    }
}

impl AnnotationStore {
    pub fn new() -> Self {
        let empty: Vec<AnnotationShape> = Vec::new();
        Self {
            table: RwLock::new(Arc::new(FrameTable::new())),
            empty: ShapeList::from(empty),
        }
    }

    /// Replace the entire mapping.
    ///
    /// Shape order within each frame is kept as given, duplicates included.
    pub fn load(&self, mapping: FrameMap) {
        let table: FrameTable = mapping
            .into_iter()
            .filter(|(_, shapes)| !shapes.is_empty())
            .map(|(frame, shapes)| (frame, ShapeList::from(shapes)))
            .collect();
        let frames = table.len();
        *self.table.write() = Arc::new(table);
        log::info!("Loaded annotations for {} frames", frames);
    }

    /// Drop all annotations.
    pub fn clear(&self) {
        *self.table.write() = Arc::new(FrameTable::new());
    }

    /// Shapes for `frame`, or an empty list when the frame has none.
    pub fn lookup(&self, frame: FrameIndex) -> ShapeList {
        self.snapshot().lookup(frame)
    }

    /// Consistent view of the current mapping.
    pub fn snapshot(&self) -> StoreSnapshot {
        StoreSnapshot {
            table: self.table.read().clone(),
            empty: self.empty.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    fn shapes(ids: &[&str]) -> Vec<AnnotationShape> {
        ids.iter()
            .enumerate()
            .map(|(i, id)| AnnotationShape::rect(*id, i as f64 * 10.0, 0.0, 5.0, 5.0))
            .collect()
    }

    #[test]
    fn test_lookup_missing_frame_is_empty() {
        let store = AnnotationStore::new();
        assert!(store.lookup(0).is_empty());

        store.load(FrameMap::from([(30, shapes(&["box1"]))]));
        assert!(store.lookup(29).is_empty());
        assert!(store.lookup(31).is_empty());
    }

    #[test]
    fn test_lookup_returns_loaded_order() {
        let store = AnnotationStore::new();
        store.load(FrameMap::from([(7, shapes(&["a", "b", "c"]))]));

        let ids: Vec<String> = store.lookup(7).iter().map(|s| s.id.clone()).collect();
        assert_eq!(ids, vec!["a", "b", "c"]);
    }

    #[test]
    fn test_duplicate_ids_preserved() {
        let store = AnnotationStore::new();
        store.load(FrameMap::from([(1, shapes(&["box1", "box1"]))]));
        assert_eq!(store.lookup(1).len(), 2);
    }

    #[test]
    fn test_load_replaces_everything() {
        let store = AnnotationStore::new();
        store.load(FrameMap::from([(1, shapes(&["old"])), (2, shapes(&["old"]))]));
        store.load(FrameMap::from([(2, shapes(&["new"]))]));

        assert!(store.lookup(1).is_empty());
        assert_eq!(store.lookup(2)[0].id, "new");
    }

    #[test]
    fn test_snapshot_survives_reload() {
        let store = AnnotationStore::new();
        store.load(FrameMap::from([(3, shapes(&["before"]))]));
        let snapshot = store.snapshot();

        store.load(FrameMap::from([(3, shapes(&["after"]))]));

        assert_eq!(snapshot.lookup(3)[0].id, "before");
        assert_eq!(store.lookup(3)[0].id, "after");
    }

    #[test]
    fn test_concurrent_lookup_never_mixes_generations() {
        let store = Arc::new(AnnotationStore::new());
        let generation = |tag: &str| -> FrameMap {
            (0..50).map(|frame| (frame, shapes(&[tag, tag]))).collect()
        };
        store.load(generation("old"));

        let reader = {
            let store = Arc::clone(&store);
            thread::spawn(move || {
                for _ in 0..2_000 {
                    let snapshot = store.snapshot();
                    let first = snapshot.lookup(0)[0].id.clone();
                    for frame in 0..50 {
                        for shape in snapshot.lookup(frame).iter() {
                            assert_eq!(shape.id, first);
                        }
                    }
                }
            })
        };

        for i in 0..200 {
            store.load(generation(if i % 2 == 0 { "new" } else { "old" }));
        }
        reader.join().unwrap();
    }

    #[test]
    fn test_neighbouring_annotated_frames() {
        let store = AnnotationStore::new();
        store.load(FrameMap::from([
            (10, shapes(&["a"])),
            (20, shapes(&["b"])),
            (30, shapes(&["c"])),
        ]));
        let snapshot = store.snapshot();

        assert_eq!(snapshot.next_annotated_after(10), Some(20));
        assert_eq!(snapshot.next_annotated_after(0), Some(10));
        assert_eq!(snapshot.next_annotated_after(30), None);
        assert_eq!(snapshot.previous_annotated_before(20), Some(10));
        assert_eq!(snapshot.previous_annotated_before(10), None);
        assert_eq!(snapshot.frame_count(), 3);
    }
}
