//! Log-backed collaborators
//!
//! The player has no DOM, so Zap's classes and speech bubbles go to the log.

use std::collections::BTreeSet;

use tracing::{debug, info};

use zap_core::{reading_time, MessageType, Messenger, Renderer};

/// Tracks applied classes and logs every visible change
#[derive(Debug, Default)]
pub struct LogRenderer {
    classes: BTreeSet<String>,
}

impl LogRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Classes currently applied
    pub fn classes(&self) -> &BTreeSet<String> {
        &self.classes
    }

    fn joined(&self) -> String {
        self.classes().iter().cloned().collect::<Vec<_>>().join(" ")
    }
}

impl Renderer for LogRenderer {
    fn apply_visual_class(&mut self, class: &str) {
        if self.classes.insert(class.to_string()) {
            info!(classes = %self.joined(), "Zap");
        }
    }

    fn clear_visual_class(&mut self, class: &str) {
        if self.classes.remove(class) {
            debug!(class, "Cleared class");
        }
    }

    fn clear_all(&mut self) {
        self.classes.clear();
        info!("Zap cleared");
    }
}

/// Logs speech bubbles with their styling and on-screen time
#[derive(Debug, Default)]
pub struct LogMessenger {
    shown: usize,
    bubble_classes: BTreeSet<&'static str>,
}

impl LogMessenger {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Messenger for LogMessenger {
    fn show(&mut self, text: &str, kind: MessageType) {
        self.shown += 1;
        for class in MessageType::all_bubble_classes() {
            self.bubble_classes.remove(&class);
        }
        let bubble = kind.bubble_class();
        if let Some(class) = bubble {
            self.bubble_classes.insert(class);
        }

        let visible_ms = u64::try_from(reading_time(text).as_millis()).unwrap_or(u64::MAX);
        info!(
            kind = %kind,
            bubble = bubble.unwrap_or("plain"),
            visible_ms,
            count = self.shown,
            "💬 {text}"
        );
    }
}
