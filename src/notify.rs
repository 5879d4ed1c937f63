//! Host-framework notification protocol.

use crate::description::Description;

/// Receiver for run lifecycle notifications.
///
/// The coordinator fires exactly one started/finished pair per identity, with
/// finished always following started even on failure. Pass/fail only carries
/// meaning at spec granularity; absence of a failure notification between a
/// spec's started and finished signals a pass.
pub trait RunNotifier {
    fn fire_test_started(&mut self, description: &Description);
    fn fire_test_finished(&mut self, description: &Description);
    fn fire_test_failure(&mut self, description: &Description, diagnostic: &str);
}

/// One notification observed by a [`RecordingNotifier`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notification {
    Started(String),
    Finished(String),
    Failure(String, String),
}

/// A notifier that records every notification in order. Useful for embedding
/// tests and for debugging a run without a real host framework attached.
#[derive(Debug, Default)]
pub struct RecordingNotifier {
    events: Vec<Notification>,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> &[Notification] {
        &self.events
    }

    /// Display names of failed specs, in notification order.
    pub fn failures(&self) -> Vec<&str> {
        self.events
            .iter()
            .filter_map(|e| match e {
                Notification::Failure(name, _) => Some(name.as_str()),
                _ => None,
            })
            .collect()
    }
}

impl RunNotifier for RecordingNotifier {
    fn fire_test_started(&mut self, description: &Description) {
        self.events
            .push(Notification::Started(description.display_name().to_string()));
    }

    fn fire_test_finished(&mut self, description: &Description) {
        self.events
            .push(Notification::Finished(description.display_name().to_string()));
    }

    fn fire_test_failure(&mut self, description: &Description, diagnostic: &str) {
        self.events.push(Notification::Failure(
            description.display_name().to_string(),
            diagnostic.to_string(),
        ));
    }
}
