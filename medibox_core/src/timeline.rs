//! Today's dose timeline.
//!
//! The timeline is recomputed from the live compartment collection on every
//! read; nothing here caches or mutates. Callers re-invoke [`build_today`]
//! whenever the collection changes or the clock ticks.

use crate::schedule::normalize;
use crate::{Compartment, ScheduledDose};
use chrono::{DateTime, Duration, FixedOffset};

/// Build the sorted sequence of today's doses.
///
/// Every schedule of every compartment is normalized against `now`. Malformed
/// schedules are skipped. The result is sorted by time with a stable sort, so
/// doses at the same minute keep compartment order, then schedule order.
pub fn build_today(compartments: &[Compartment], now: &DateTime<FixedOffset>) -> Vec<ScheduledDose> {
    let mut doses = Vec::with_capacity(compartments.iter().map(|c| c.schedules.len()).sum());

    for compartment in compartments {
        for schedule in &compartment.schedules {
            match normalize(&schedule.time, now) {
                Some(time) => doses.push(ScheduledDose {
                    time,
                    compartment_id: compartment.id,
                    schedule_id: schedule.id,
                }),
                None => {
                    tracing::debug!(
                        "Skipping malformed schedule {} ({:?}) in compartment {}",
                        schedule.id,
                        schedule.time,
                        compartment.id
                    );
                }
            }
        }
    }

    // Vec::sort_by_key is stable
    doses.sort_by_key(|d| d.time);
    doses
}

/// Time left until a dose is due. Negative once the dose time has passed.
pub fn time_until(dose: &ScheduledDose, now: &DateTime<FixedOffset>) -> Duration {
    dose.time.signed_duration_since(*now)
}

/// Display status of a dose relative to the session cursor and the clock
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DoseStatus {
    Taken,
    Overdue,
    Upcoming,
}

/// A dose paired with its display status and time remaining
#[derive(Clone, Debug)]
pub struct DoseView {
    pub dose: ScheduledDose,
    pub status: DoseStatus,
    pub remaining: Duration,
}

/// Annotate a timeline for display.
///
/// Positions before `cursor` count as taken; the rest are overdue when their
/// time is at or before `now`, upcoming otherwise.
pub fn annotate(
    timeline: &[ScheduledDose],
    cursor: usize,
    now: &DateTime<FixedOffset>,
) -> Vec<DoseView> {
    timeline
        .iter()
        .enumerate()
        .map(|(idx, dose)| {
            let remaining = time_until(dose, now);
            let status = if idx < cursor {
                DoseStatus::Taken
            } else if is_overdue(remaining) {
                DoseStatus::Overdue
            } else {
                DoseStatus::Upcoming
            };
            DoseView {
                dose: dose.clone(),
                status,
                remaining,
            }
        })
        .collect()
}

/// A dose is overdue from the moment its time arrives.
pub fn is_overdue(remaining: Duration) -> bool {
    remaining <= Duration::zero()
}

/// Human readable remaining time, e.g. `2h 05m` or `overdue 15m`.
pub fn format_remaining(remaining: Duration) -> String {
    let overdue = is_overdue(remaining);
    let minutes = remaining.num_minutes().abs();
    let text = if minutes >= 60 {
        format!("{}h {:02}m", minutes / 60, minutes % 60)
    } else {
        format!("{}m", minutes)
    };

    if overdue {
        format!("overdue {}", text)
    } else {
        text
    }
}
