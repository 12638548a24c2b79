//! In-memory surface
//!
//! Implements all three collaborator traits on shared state so a headless
//! host (or a test) can hand clones to the animator and inspect the result.

use std::collections::BTreeSet;
use std::sync::Arc;

use parking_lot::Mutex;

use super::{Feedback, MessageType, Messenger, Renderer};

/// What the surface currently shows plus a history of calls
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SurfaceSnapshot {
    /// Classes currently applied to the mascot
    pub classes: BTreeSet<String>,
    /// Every message shown, oldest first
    pub messages: Vec<(String, MessageType)>,
    /// Every feedback trigger, oldest first
    pub feedback: Vec<String>,
    /// Number of renderer calls of any kind
    pub render_calls: usize,
}

/// Shared, cloneable in-memory surface
#[derive(Clone, Debug, Default)]
pub struct MemorySurface {
    inner: Arc<Mutex<SurfaceSnapshot>>,
}

impl MemorySurface {
    /// Create an empty surface
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Copy of the current state
    #[must_use]
    pub fn snapshot(&self) -> SurfaceSnapshot {
        self.inner.lock().clone()
    }

    /// Classes currently applied
    #[must_use]
    pub fn classes(&self) -> BTreeSet<String> {
        self.inner.lock().classes.clone()
    }

    /// Whether `class` is applied
    #[must_use]
    pub fn has_class(&self, class: &str) -> bool {
        self.inner.lock().classes.contains(class)
    }

    /// Most recent message, if any
    #[must_use]
    pub fn last_message(&self) -> Option<(String, MessageType)> {
        self.inner.lock().messages.last().cloned()
    }

    /// Number of renderer calls so far
    #[must_use]
    pub fn render_calls(&self) -> usize {
        self.inner.lock().render_calls
    }

    /// Forget recorded history, keeping applied classes
    pub fn reset_history(&self) {
        let mut inner = self.inner.lock();
        inner.messages.clear();
        inner.feedback.clear();
        inner.render_calls = 0;
    }
}

impl Renderer for MemorySurface {
    fn apply_visual_class(&mut self, class: &str) {
        let mut inner = self.inner.lock();
        inner.render_calls += 1;
        inner.classes.insert(class.to_string());
    }

    fn clear_visual_class(&mut self, class: &str) {
        let mut inner = self.inner.lock();
        inner.render_calls += 1;
        inner.classes.remove(class);
    }

    fn clear_all(&mut self) {
        let mut inner = self.inner.lock();
        inner.render_calls += 1;
        inner.classes.clear();
    }
}

impl Messenger for MemorySurface {
    fn show(&mut self, text: &str, kind: MessageType) {
        self.inner.lock().messages.push((text.to_string(), kind));
    }
}

impl Feedback for MemorySurface {
    fn trigger(&mut self, state: &str) {
        self.inner.lock().feedback.push(state.to_string());
    }
}
