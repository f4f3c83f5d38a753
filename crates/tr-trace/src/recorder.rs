use std::collections::HashMap;

use chrono::{DateTime, Utc};
use tr_document::{Phase, PhaseKind, PhaseMeta, Timeline};

/// Collects phase start/end callbacks from a transport executor and builds
/// the `Timeline` attached to a response (spec §4.4). A transport calls
/// [`Recorder::start`] as it enters a phase and [`Recorder::end`] as it
/// leaves; phases that are never started (e.g. `Tls` on a plaintext
/// connection) simply don't appear in the resulting timeline.
pub struct Recorder {
    started: DateTime<Utc>,
    open: HashMap<PhaseKind, DateTime<Utc>>,
    phases: Vec<Phase>,
    err: Option<String>,
}

impl Recorder {
    pub fn new(started: DateTime<Utc>) -> Self {
        Self {
            started,
            open: HashMap::new(),
            phases: Vec::new(),
            err: None,
        }
    }

    pub fn start(&mut self, kind: PhaseKind, at: DateTime<Utc>) {
        self.open.insert(kind, at);
    }

    /// Closes a phase opened with [`Recorder::start`]. Calling this for a
    /// phase that was never started is a no-op — transports differ in which
    /// phases they can observe.
    pub fn end(&mut self, kind: PhaseKind, at: DateTime<Utc>, meta: PhaseMeta, err: Option<String>) {
        let Some(start) = self.open.remove(&kind) else {
            tracing::debug!(?kind, "trace phase ended without a matching start, dropping");
            return;
        };
        let duration = (at - start).to_std().unwrap_or_default();
        self.phases.push(Phase {
            kind,
            start,
            end: at,
            duration,
            meta,
            err,
        });
    }

    /// Records a terminal error for the whole exchange (connection refused,
    /// timeout, etc). Open phases are left as-is; the caller should still
    /// close whichever phase was active when the error occurred.
    pub fn fail(&mut self, message: impl Into<String>) {
        self.err = Some(message.into());
    }

    /// Finalizes the timeline as of `completed`, sorting phases into their
    /// natural life-cycle order regardless of the order `end` was called in.
    pub fn finish(mut self, completed: DateTime<Utc>, details: Option<serde_json::Value>) -> Timeline {
        self.phases.sort_by_key(|p| {
            PhaseKind::ORDER
                .iter()
                .position(|k| *k == p.kind)
                .unwrap_or(usize::MAX)
        });
        Timeline {
            started: self.started,
            completed,
            duration: (completed - self.started).to_std().unwrap_or_default(),
            phases: self.phases,
            details,
            err: self.err,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn records_phases_in_life_cycle_order_regardless_of_end_order() {
        let t0 = Utc::now();
        let mut rec = Recorder::new(t0);
        rec.start(PhaseKind::Connect, t0);
        rec.start(PhaseKind::Dns, t0 - Duration::milliseconds(5));
        rec.end(PhaseKind::Connect, t0 + Duration::milliseconds(10), PhaseMeta::default(), None);
        rec.end(PhaseKind::Dns, t0, PhaseMeta::default(), None);

        let timeline = rec.finish(t0 + Duration::milliseconds(20), None);
        let kinds: Vec<_> = timeline.phases.iter().map(|p| p.kind).collect();
        assert_eq!(kinds, vec![PhaseKind::Dns, PhaseKind::Connect]);
    }

    #[test]
    fn ending_a_phase_that_was_never_started_is_dropped_not_panicked() {
        let t0 = Utc::now();
        let mut rec = Recorder::new(t0);
        rec.end(PhaseKind::Tls, t0, PhaseMeta::default(), None);
        let timeline = rec.finish(t0, None);
        assert!(timeline.phases.is_empty());
    }

    #[test]
    fn fail_is_carried_onto_the_finished_timeline() {
        let t0 = Utc::now();
        let mut rec = Recorder::new(t0);
        rec.fail("connection reset");
        let timeline = rec.finish(t0, None);
        assert_eq!(timeline.err.as_deref(), Some("connection reset"));
    }
}
