//! Session progression over today's timeline.
//!
//! The cursor counts doses marked administered in this session and doubles as
//! a position index into the recomputed timeline. It is never persisted and
//! never rolls over at midnight on its own.
//!
//! Because the cursor is positional, editing schedules mid-session can shift
//! which dose counts as "already taken". There is no per-dose identity to
//! anchor it.

use crate::feedback::{FeedbackEvent, FeedbackSink};
use crate::ledger;
use crate::timeline::build_today;
use crate::{find_compartment_mut, Compartment, Error, Result, ScheduledDose};
use chrono::{DateTime, FixedOffset};
use std::sync::Mutex;

/// Where the day stands relative to the timeline
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DayState {
    /// Doses remain
    Pending,
    /// Every dose of a non-empty timeline has been administered
    Completed,
    /// Nothing is scheduled today
    Empty,
}

/// Outcome of a successful administer call
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AdministeredDose {
    pub dose: ScheduledDose,
    /// Quantity left afterwards, `None` if the compartment no longer exists
    pub remaining_after: Option<u32>,
}

/// Session cursor over today's timeline
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ProgressionTracker {
    cursor: usize,
}

impl ProgressionTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Doses administered this session.
    pub fn cursor(&self) -> usize {
        self.cursor
    }

    /// The next pending dose, if any.
    pub fn peek_next<'a>(&self, timeline: &'a [ScheduledDose]) -> Option<&'a ScheduledDose> {
        timeline.get(self.cursor)
    }

    /// True iff the timeline is non-empty and every dose has been administered.
    pub fn is_completed(&self, timeline: &[ScheduledDose]) -> bool {
        !timeline.is_empty() && self.cursor >= timeline.len()
    }

    pub fn state(&self, timeline: &[ScheduledDose]) -> DayState {
        if timeline.is_empty() {
            DayState::Empty
        } else if self.is_completed(timeline) {
            DayState::Completed
        } else {
            DayState::Pending
        }
    }

    /// Administer the next pending dose.
    ///
    /// Decrements the dose's compartment (clamped at zero), advances the
    /// cursor by one and signals success. No-op returning `None` when the
    /// timeline is empty or already completed.
    pub fn administer_next(
        &mut self,
        timeline: &[ScheduledDose],
        compartments: &mut [Compartment],
        feedback: &dyn FeedbackSink,
    ) -> Option<AdministeredDose> {
        if timeline.is_empty() || self.is_completed(timeline) {
            tracing::debug!("Nothing to administer (cursor {}, {} doses)", self.cursor, timeline.len());
            return None;
        }

        let dose = timeline[self.cursor].clone();
        let remaining_after = match find_compartment_mut(compartments, dose.compartment_id) {
            Some(compartment) => Some(ledger::decrement(compartment)),
            None => {
                tracing::warn!(
                    "Compartment {} for dose at {} no longer exists, inventory unchanged",
                    dose.compartment_id,
                    dose.time.format("%H:%M")
                );
                None
            }
        };

        self.cursor += 1;
        feedback.signal(FeedbackEvent::Success);

        tracing::info!(
            "Administered {} dose from compartment {} ({}/{})",
            dose.time.format("%H:%M"),
            dose.compartment_id,
            self.cursor,
            timeline.len()
        );

        Some(AdministeredDose {
            dose,
            remaining_after,
        })
    }

    /// Return the cursor to zero and signal a warning.
    pub fn reset(&mut self, feedback: &dyn FeedbackSink) {
        tracing::info!("Resetting progression (was {})", self.cursor);
        self.cursor = 0;
        feedback.signal(FeedbackEvent::Warning);
    }
}

/// A compartment collection paired with the cursor that indexes into it
#[derive(Clone, Debug, Default)]
pub struct Session {
    compartments: Vec<Compartment>,
    tracker: ProgressionTracker,
}

impl Session {
    pub fn new(compartments: Vec<Compartment>) -> Self {
        Self {
            compartments,
            tracker: ProgressionTracker::new(),
        }
    }

    pub fn compartments(&self) -> &[Compartment] {
        &self.compartments
    }

    pub fn tracker(&self) -> &ProgressionTracker {
        &self.tracker
    }

    /// Swap in a fresh collection after an external change. The cursor is kept.
    pub fn replace_compartments(&mut self, compartments: Vec<Compartment>) {
        self.compartments = compartments;
    }

    pub fn into_compartments(self) -> Vec<Compartment> {
        self.compartments
    }

    pub fn timeline(&self, now: &DateTime<FixedOffset>) -> Vec<ScheduledDose> {
        build_today(&self.compartments, now)
    }

    /// Rebuild today's timeline and administer the next dose from it.
    pub fn administer_next(
        &mut self,
        now: &DateTime<FixedOffset>,
        feedback: &dyn FeedbackSink,
    ) -> Option<AdministeredDose> {
        let timeline = build_today(&self.compartments, now);
        self.tracker
            .administer_next(&timeline, &mut self.compartments, feedback)
    }

    pub fn reset(&mut self, feedback: &dyn FeedbackSink) {
        self.tracker.reset(feedback);
    }
}

/// A session shared between threads.
///
/// One mutex covers both the compartments and the cursor, so an administer
/// call (decrement + advance) is a single critical section.
#[derive(Debug, Default)]
pub struct SharedSession {
    inner: Mutex<Session>,
}

impl SharedSession {
    pub fn new(session: Session) -> Self {
        Self {
            inner: Mutex::new(session),
        }
    }

    pub fn administer_next(
        &self,
        now: &DateTime<FixedOffset>,
        feedback: &dyn FeedbackSink,
    ) -> Result<Option<AdministeredDose>> {
        let mut session = self.inner.lock().map_err(|_| Error::LockPoisoned)?;
        Ok(session.administer_next(now, feedback))
    }

    pub fn reset(&self, feedback: &dyn FeedbackSink) -> Result<()> {
        let mut session = self.inner.lock().map_err(|_| Error::LockPoisoned)?;
        session.reset(feedback);
        Ok(())
    }

    pub fn cursor(&self) -> Result<usize> {
        let session = self.inner.lock().map_err(|_| Error::LockPoisoned)?;
        Ok(session.tracker.cursor())
    }

    /// Copy of the compartments for lock-free reads (timeline, alerts).
    pub fn snapshot(&self) -> Result<Vec<Compartment>> {
        let session = self.inner.lock().map_err(|_| Error::LockPoisoned)?;
        Ok(session.compartments.clone())
    }

    pub fn replace_compartments(&self, compartments: Vec<Compartment>) -> Result<()> {
        let mut session = self.inner.lock().map_err(|_| Error::LockPoisoned)?;
        session.replace_compartments(compartments);
        Ok(())
    }

    pub fn into_inner(self) -> Result<Session> {
        self.inner.into_inner().map_err(|_| Error::LockPoisoned)
    }
}
