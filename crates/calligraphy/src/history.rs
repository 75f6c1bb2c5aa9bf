//! Bounded undo/redo history for the drawing layer

use std::collections::VecDeque;

use tracing::debug;

use crate::stamp::InkLayer;
use crate::surface::RasterSnapshot;
use crate::vector::VectorLog;

/// One undoable state of the drawing layer: its pixels and its vector log
#[derive(Debug, Clone)]
pub struct HistoryStep {
    pub raster: RasterSnapshot,
    pub log: VectorLog,
}

impl HistoryStep {
    pub fn capture(layer: &InkLayer) -> Self {
        Self {
            raster: layer.surface.snapshot(),
            log: layer.log.clone(),
        }
    }

    fn apply_to(&self, layer: &mut InkLayer) {
        layer.surface.restore(&self.raster);
        layer.log.replace_with(&self.log);
    }
}

/// Bounded history with branch-on-write semantics.
///
/// The oldest step is evicted when the capacity is exceeded and the current
/// index moves down with it, so it always names a retained step.
#[derive(Debug)]
pub struct HistoryManager {
    steps: VecDeque<HistoryStep>,
    index: usize,
    capacity: usize,
}

impl HistoryManager {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            steps: VecDeque::with_capacity(capacity),
            index: 0,
            capacity,
        }
    }

    /// Drop all steps and record the layer's current state as the undo floor
    pub fn reset(&mut self, layer: &InkLayer) {
        self.steps.clear();
        self.steps.push_back(HistoryStep::capture(layer));
        self.index = 0;
        debug!("HistoryManager::reset: floor recorded");
    }

    /// Record the layer's current state as a new step.
    ///
    /// Steps after the current index are discarded first.
    pub fn save(&mut self, layer: &InkLayer) {
        if !self.steps.is_empty() {
            self.steps.truncate(self.index + 1);
        }
        self.steps.push_back(HistoryStep::capture(layer));
        if self.steps.len() > self.capacity {
            self.steps.pop_front();
        }
        self.index = self.steps.len() - 1;
        debug!(
            "HistoryManager::save: index={} len={} entries={}",
            self.index,
            self.steps.len(),
            layer.log.len()
        );
    }

    /// Step back; returns false at the floor
    pub fn undo(&mut self, layer: &mut InkLayer) -> bool {
        if !self.can_undo() {
            debug!("Undo: at oldest retained step");
            return false;
        }
        self.index -= 1;
        self.steps[self.index].apply_to(layer);
        debug!("Undo: restored step {}", self.index);
        true
    }

    /// Step forward; returns false when no redo steps exist
    pub fn redo(&mut self, layer: &mut InkLayer) -> bool {
        if !self.can_redo() {
            debug!("Redo: no newer step");
            return false;
        }
        self.index += 1;
        self.steps[self.index].apply_to(layer);
        debug!("Redo: restored step {}", self.index);
        true
    }

    /// Put the layer back to the current step, discarding unsaved changes
    pub fn restore_current(&self, layer: &mut InkLayer) -> bool {
        match self.steps.get(self.index) {
            Some(step) => {
                step.apply_to(layer);
                true
            }
            None => false,
        }
    }

    pub fn can_undo(&self) -> bool {
        self.index > 0
    }

    pub fn can_redo(&self) -> bool {
        self.index + 1 < self.steps.len()
    }

    /// Index of the current step
    pub fn index(&self) -> usize {
        self.index
    }

    /// Number of retained steps
    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn current(&self) -> Option<&HistoryStep> {
        self.steps.get(self.index)
    }
}
