use tr_document::{Breach, BreachKind, Budgets, Report, Timeline};

/// Checks a finished `Timeline` against `Budgets`, producing a `Breach` for
/// every phase (and the total) that exceeded its limit by more than the
/// configured tolerance (spec §4.4).
pub fn evaluate(timeline: &Timeline, budgets: &Budgets) -> Report {
    let mut breaches = Vec::new();

    for (kind, limit) in &budgets.phases {
        let Some(phase) = timeline.phase(*kind) else {
            continue;
        };
        if let Some(over) = exceeds(phase.duration, *limit, budgets.tolerance) {
            breaches.push(Breach {
                kind: BreachKind::Phase(*kind),
                limit: *limit,
                actual: phase.duration,
                over,
            });
        }
    }

    if let Some(limit) = budgets.total {
        if let Some(over) = exceeds(timeline.duration, limit, budgets.tolerance) {
            breaches.push(Breach {
                kind: BreachKind::Total,
                limit,
                actual: timeline.duration,
                over,
            });
        }
    }

    Report { breaches }
}

fn exceeds(actual: std::time::Duration, limit: std::time::Duration, tolerance: std::time::Duration) -> Option<std::time::Duration> {
    let allowed = limit + tolerance;
    actual.checked_sub(allowed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use std::time::Duration;
    use tr_document::{Phase, PhaseKind, PhaseMeta};

    fn timeline_with_phase(kind: PhaseKind, duration: Duration) -> Timeline {
        let now = Utc::now();
        Timeline {
            started: now,
            completed: now,
            duration,
            phases: vec![Phase {
                kind,
                start: now,
                end: now,
                duration,
                meta: PhaseMeta::default(),
                err: None,
            }],
            details: None,
            err: None,
        }
    }

    #[test]
    fn phase_over_budget_beyond_tolerance_is_a_breach() {
        let timeline = timeline_with_phase(PhaseKind::Connect, Duration::from_millis(150));
        let mut budgets = Budgets::default();
        budgets.phases.insert(PhaseKind::Connect, Duration::from_millis(100));
        budgets.tolerance = Duration::from_millis(20);

        let report = evaluate(&timeline, &budgets);
        assert!(!report.within_budget());
        assert_eq!(report.breaches[0].over, Duration::from_millis(30));
    }

    #[test]
    fn within_tolerance_is_not_a_breach() {
        let timeline = timeline_with_phase(PhaseKind::Connect, Duration::from_millis(110));
        let mut budgets = Budgets::default();
        budgets.phases.insert(PhaseKind::Connect, Duration::from_millis(100));
        budgets.tolerance = Duration::from_millis(20);

        let report = evaluate(&timeline, &budgets);
        assert!(report.within_budget());
    }

    #[test]
    fn total_budget_is_checked_independently_of_phases() {
        let mut timeline = timeline_with_phase(PhaseKind::Connect, Duration::from_millis(10));
        timeline.duration = Duration::from_millis(500);
        let mut budgets = Budgets::default();
        budgets.total = Some(Duration::from_millis(200));

        let report = evaluate(&timeline, &budgets);
        assert_eq!(report.breaches.len(), 1);
        assert!(matches!(report.breaches[0].kind, BreachKind::Total));
    }
}
