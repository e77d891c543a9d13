//! Feedback signals emitted by the progression tracker.
//!
//! Sinks are fire-and-forget: `signal` cannot fail, and a sink that cannot
//! deliver (no speaker, closed terminal) just drops the event.

use crate::config::FeedbackConfig;
use std::sync::Mutex;

/// A feedback cue
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FeedbackEvent {
    /// A dose was administered
    Success,
    /// Progress was reset
    Warning,
    /// Neutral tap, for surfaces that acknowledge plain input
    Click,
}

/// Receiver of feedback cues (sound, haptics, logs)
pub trait FeedbackSink {
    fn signal(&self, event: FeedbackEvent);
}

/// Drops every event
#[derive(Clone, Copy, Debug, Default)]
pub struct NoFeedback;

impl FeedbackSink for NoFeedback {
    fn signal(&self, _event: FeedbackEvent) {}
}

/// Forwards to an inner sink only while sound or haptics is enabled
pub struct GatedFeedback<S> {
    inner: S,
    settings: FeedbackConfig,
}

impl<S: FeedbackSink> GatedFeedback<S> {
    pub fn new(inner: S, settings: FeedbackConfig) -> Self {
        Self { inner, settings }
    }

    pub fn is_enabled(&self) -> bool {
        self.settings.sound_enabled || self.settings.haptics_enabled
    }
}

impl<S: FeedbackSink> FeedbackSink for GatedFeedback<S> {
    fn signal(&self, event: FeedbackEvent) {
        if self.is_enabled() {
            self.inner.signal(event);
        }
    }
}

/// Records events in memory
#[derive(Debug, Default)]
pub struct RecordingFeedback {
    events: Mutex<Vec<FeedbackEvent>>,
}

impl RecordingFeedback {
    pub fn new() -> Self {
        Self::default()
    }

    /// Events received so far, oldest first.
    pub fn events(&self) -> Vec<FeedbackEvent> {
        match self.events.lock() {
            Ok(events) => events.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }
}

impl FeedbackSink for RecordingFeedback {
    fn signal(&self, event: FeedbackEvent) {
        // A poisoned recorder still records; feedback must never fail the caller
        match self.events.lock() {
            Ok(mut events) => events.push(event),
            Err(poisoned) => poisoned.into_inner().push(event),
        }
    }
}

impl<S: FeedbackSink + ?Sized> FeedbackSink for &S {
    fn signal(&self, event: FeedbackEvent) {
        (**self).signal(event)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recording_keeps_order() {
        let sink = RecordingFeedback::new();
        sink.signal(FeedbackEvent::Success);
        sink.signal(FeedbackEvent::Warning);
        assert_eq!(
            sink.events(),
            vec![FeedbackEvent::Success, FeedbackEvent::Warning]
        );
    }

    #[test]
    fn test_gate_blocks_when_everything_disabled() {
        let recorder = RecordingFeedback::new();
        let gated = GatedFeedback::new(
            &recorder,
            FeedbackConfig {
                sound_enabled: false,
                haptics_enabled: false,
            },
        );
        gated.signal(FeedbackEvent::Success);
        assert!(recorder.events().is_empty());
    }

    #[test]
    fn test_gate_passes_with_one_channel_enabled() {
        let recorder = RecordingFeedback::new();
        let gated = GatedFeedback::new(
            &recorder,
            FeedbackConfig {
                sound_enabled: false,
                haptics_enabled: true,
            },
        );
        gated.signal(FeedbackEvent::Warning);
        assert_eq!(recorder.events(), vec![FeedbackEvent::Warning]);
    }
}
