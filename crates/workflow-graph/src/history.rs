//! Undo/redo history for graph edits
//!
//! Each entry is a zstd-compressed JSON snapshot of the whole graph plus
//! its content fingerprint, which ignores the version. Pushing a graph
//! whose content matches the current entry records nothing, so no-op edits
//! never create empty undo steps.

use std::collections::VecDeque;

use crate::error::{GraphError, Result};
use crate::graph::WorkflowGraph;

const COMPRESSION_LEVEL: i32 = 3;

struct Snapshot {
    compressed: Vec<u8>,
    fingerprint: String,
}

/// Bounded undo/redo stack of compressed graph snapshots
pub struct UndoStack {
    snapshots: VecDeque<Snapshot>,
    /// Index of the snapshot matching the live graph
    current: usize,
    depth: usize,
}

impl UndoStack {
    /// Create a stack keeping at most `depth` snapshots
    pub fn new(depth: usize) -> Self {
        Self {
            snapshots: VecDeque::new(),
            current: 0,
            depth: depth.max(1),
        }
    }

    /// Record the graph as the newest state
    ///
    /// Discards anything that could have been redone. Returns `false`
    /// without recording when the graph matches the current snapshot.
    pub fn push(&mut self, graph: &WorkflowGraph) -> Result<bool> {
        let fingerprint = graph.fingerprint();
        if self
            .snapshots
            .get(self.current)
            .is_some_and(|s| s.fingerprint == fingerprint)
        {
            return Ok(false);
        }

        let json = serde_json::to_vec(graph)?;
        let compressed = zstd::encode_all(&json[..], COMPRESSION_LEVEL)
            .map_err(|e| GraphError::Compression(e.to_string()))?;

        self.snapshots.truncate(self.current + 1);
        self.snapshots.push_back(Snapshot {
            compressed,
            fingerprint,
        });
        self.current = self.snapshots.len() - 1;

        while self.snapshots.len() > self.depth {
            self.snapshots.pop_front();
            self.current = self.current.saturating_sub(1);
        }

        Ok(true)
    }

    /// Step back, returning the previous graph, or None at the oldest entry
    pub fn undo(&mut self) -> Option<Result<WorkflowGraph>> {
        if !self.can_undo() {
            return None;
        }
        self.current -= 1;
        Some(self.decompress(self.current))
    }

    /// Step forward, returning the next graph, or None at the newest entry
    pub fn redo(&mut self) -> Option<Result<WorkflowGraph>> {
        if !self.can_redo() {
            return None;
        }
        self.current += 1;
        Some(self.decompress(self.current))
    }

    /// The graph at the current position
    pub fn current(&self) -> Option<Result<WorkflowGraph>> {
        (!self.snapshots.is_empty()).then(|| self.decompress(self.current))
    }

    pub fn can_undo(&self) -> bool {
        self.current > 0
    }

    pub fn can_redo(&self) -> bool {
        self.current + 1 < self.snapshots.len()
    }

    pub fn len(&self) -> usize {
        self.snapshots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.snapshots.is_empty()
    }

    /// Forget everything and start over from `graph`
    pub fn reset(&mut self, graph: &WorkflowGraph) -> Result<()> {
        self.snapshots.clear();
        self.current = 0;
        self.push(graph)?;
        Ok(())
    }

    /// Total compressed size of all snapshots, in bytes
    pub fn compressed_size(&self) -> usize {
        self.snapshots.iter().map(|s| s.compressed.len()).sum()
    }

    fn decompress(&self, index: usize) -> Result<WorkflowGraph> {
        let snapshot = self
            .snapshots
            .get(index)
            .ok_or_else(|| GraphError::Compression(format!("no snapshot at {}", index)))?;
        let json = zstd::decode_all(&snapshot.compressed[..])
            .map_err(|e| GraphError::Compression(e.to_string()))?;
        Ok(serde_json::from_slice(&json)?)
    }
}

impl Default for UndoStack {
    fn default() -> Self {
        Self::new(100)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn graph_with(value: i64) -> WorkflowGraph {
        let mut graph = WorkflowGraph::new();
        graph.set_variable("step", json!(value));
        graph
    }

    fn step(graph: &WorkflowGraph) -> i64 {
        graph.variables()["step"].as_i64().unwrap()
    }

    #[test]
    fn test_undo_and_redo() {
        let mut stack = UndoStack::new(10);
        for i in 1..=3 {
            assert!(stack.push(&graph_with(i)).unwrap());
        }

        assert_eq!(step(&stack.current().unwrap().unwrap()), 3);
        assert_eq!(step(&stack.undo().unwrap().unwrap()), 2);
        assert_eq!(step(&stack.undo().unwrap().unwrap()), 1);
        assert!(stack.undo().is_none());

        assert_eq!(step(&stack.redo().unwrap().unwrap()), 2);
        assert!(stack.can_redo());
    }

    #[test]
    fn test_identical_push_is_skipped() {
        let mut stack = UndoStack::new(10);
        assert!(stack.push(&graph_with(1)).unwrap());
        assert!(!stack.push(&graph_with(1)).unwrap());
        assert_eq!(stack.len(), 1);
        assert!(!stack.can_undo());
    }

    #[test]
    fn test_committed_version_alone_is_not_an_edit() {
        let mut stack = UndoStack::new(10);
        let mut graph = graph_with(1);
        assert!(stack.push(&graph).unwrap());

        graph.set_committed_version(4);
        assert!(!stack.push(&graph).unwrap());
        assert_eq!(stack.len(), 1);
    }

    #[test]
    fn test_push_truncates_redo() {
        let mut stack = UndoStack::new(10);
        stack.push(&graph_with(1)).unwrap();
        stack.push(&graph_with(2)).unwrap();
        stack.undo();

        stack.push(&graph_with(3)).unwrap();
        assert!(!stack.can_redo());
        assert_eq!(stack.len(), 2);
        assert_eq!(step(&stack.current().unwrap().unwrap()), 3);
    }

    #[test]
    fn test_depth_limit() {
        let mut stack = UndoStack::new(3);
        for i in 0..5 {
            stack.push(&graph_with(i)).unwrap();
        }
        assert_eq!(stack.len(), 3);
        assert_eq!(step(&stack.current().unwrap().unwrap()), 4);

        stack.undo();
        stack.undo();
        assert!(!stack.can_undo());
        assert_eq!(step(&stack.current().unwrap().unwrap()), 2);
    }

    #[test]
    fn test_reset() {
        let mut stack = UndoStack::default();
        stack.push(&graph_with(1)).unwrap();
        stack.push(&graph_with(2)).unwrap();
        stack.reset(&graph_with(9)).unwrap();
        assert_eq!(stack.len(), 1);
        assert!(stack.compressed_size() > 0);
        assert_eq!(step(&stack.current().unwrap().unwrap()), 9);
    }
}
