//! Value-to-color decision rule: one pure function over the metric kinds.

use crate::store::Value;
use crate::{Color, Palette};

// ── Metric kinds ────────────────────────────────────────────────────

/// Warn/critical boundary pair for a gauge.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Thresholds {
    pub warn: f64,
    pub crit: f64,
}

impl Thresholds {
    pub const fn new(warn: f64, crit: f64) -> Self {
        Self { warn, crit }
    }
}

/// What a cell measures, carrying exactly the data its kind needs.
#[derive(Clone, Debug, PartialEq)]
pub enum MetricKind {
    /// Up/down status of a named service.
    Health,
    /// Numeric reading compared against thresholds. `invert` flips the
    /// direction: lower values are worse (e.g. days until cert expiry).
    /// A gauge without thresholds is informational-only.
    Gauge {
        thresholds: Option<Thresholds>,
        invert: bool,
    },
    /// Monotonic count whose only signal is active vs. idle.
    Counter,
    /// Boolean fetched already in "true = good" orientation.
    Boolean,
    /// Unmapped cell; stays dark.
    Reserved,
}

// ── Resolution ──────────────────────────────────────────────────────

/// Resolve a cell's color from its kind and latest value.
///
/// Total over every kind. A missing value is Unknown regardless of kind,
/// Reserved included: no data must never silently look like "off".
/// Threshold ties resolve to the worse severity.
pub fn resolve(kind: &MetricKind, value: Option<&Value>, palette: &Palette) -> Color {
    let Some(value) = value else {
        return palette.unknown;
    };

    match kind {
        MetricKind::Health | MetricKind::Boolean => {
            if value.truthy() {
                palette.healthy
            } else {
                palette.critical
            }
        }
        MetricKind::Gauge {
            thresholds: Some(t),
            invert,
        } => match value.as_f64() {
            Some(n) => gauge_color(n, *t, *invert, palette),
            None => palette.unknown,
        },
        MetricKind::Gauge {
            thresholds: None, ..
        } => palette.healthy,
        MetricKind::Counter => match value.as_f64() {
            Some(n) if n > 0.0 => palette.activity,
            _ => palette.off,
        },
        MetricKind::Reserved => palette.off,
    }
}

fn gauge_color(n: f64, t: Thresholds, invert: bool, palette: &Palette) -> Color {
    if invert {
        // Lower is worse (cert days remaining, success rate).
        if n <= t.crit {
            palette.critical
        } else if n <= t.warn {
            palette.warning
        } else {
            palette.healthy
        }
    } else {
        // Higher is worse (error counts, latency).
        if n >= t.crit {
            palette.critical
        } else if n >= t.warn {
            palette.warning
        } else {
            palette.healthy
        }
    }
}

// ── Tests ───────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    fn palette() -> Palette {
        Palette::default()
    }

    fn gauge(warn: f64, crit: f64, invert: bool) -> MetricKind {
        MetricKind::Gauge {
            thresholds: Some(Thresholds::new(warn, crit)),
            invert,
        }
    }

    #[rstest]
    #[case(MetricKind::Health)]
    #[case(MetricKind::Boolean)]
    #[case(MetricKind::Counter)]
    #[case(MetricKind::Reserved)]
    #[case(gauge(5.0, 20.0, false))]
    fn absent_value_is_unknown_for_every_kind(#[case] kind: MetricKind) {
        let p = palette();
        assert_eq!(resolve(&kind, None, &p), p.unknown);
    }

    #[rstest]
    #[case(Value::Bool(true), true)]
    #[case(Value::Bool(false), false)]
    #[case(Value::Number(1.0), true)]
    #[case(Value::Number(0.0), false)]
    fn health_and_boolean_follow_truthiness(#[case] value: Value, #[case] healthy: bool) {
        let p = palette();
        let expected = if healthy { p.healthy } else { p.critical };
        assert_eq!(resolve(&MetricKind::Health, Some(&value), &p), expected);
        assert_eq!(resolve(&MetricKind::Boolean, Some(&value), &p), expected);
    }

    // errors_1h style: thresholds (5, 20), higher is worse.
    #[rstest]
    #[case(2.0, "healthy")]
    #[case(4.9, "healthy")]
    #[case(5.0, "warning")]
    #[case(10.0, "warning")]
    #[case(19.9, "warning")]
    #[case(20.0, "critical")]
    #[case(25.0, "critical")]
    fn gauge_boundaries_higher_is_worse(#[case] value: f64, #[case] expected: &str) {
        let p = palette();
        let color = resolve(&gauge(5.0, 20.0, false), Some(&Value::Number(value)), &p);
        let want = match expected {
            "healthy" => p.healthy,
            "warning" => p.warning,
            _ => p.critical,
        };
        assert_eq!(color, want);
    }

    // cert_days style: thresholds (30, 14), lower is worse.
    #[rstest]
    #[case(45.0, "healthy")]
    #[case(30.1, "healthy")]
    #[case(30.0, "warning")]
    #[case(20.0, "warning")]
    #[case(14.1, "warning")]
    #[case(14.0, "critical")]
    #[case(10.0, "critical")]
    fn gauge_boundaries_lower_is_worse(#[case] value: f64, #[case] expected: &str) {
        let p = palette();
        let color = resolve(&gauge(30.0, 14.0, true), Some(&Value::Number(value)), &p);
        let want = match expected {
            "healthy" => p.healthy,
            "warning" => p.warning,
            _ => p.critical,
        };
        assert_eq!(color, want);
    }

    #[test]
    fn gauge_severity_is_monotonic_in_both_directions() {
        let p = palette();
        let rank = |c: Color| {
            if c == p.healthy {
                0
            } else if c == p.warning {
                1
            } else {
                2
            }
        };

        let plain = gauge(5.0, 20.0, false);
        let mut last = 0;
        for v in [0.0, 3.0, 5.0, 12.0, 20.0, 100.0] {
            let r = rank(resolve(&plain, Some(&Value::Number(v)), &p));
            assert!(r >= last, "severity dropped at value {v}");
            last = r;
        }

        let inverted = gauge(30.0, 14.0, true);
        let mut last = 0;
        for v in [90.0, 31.0, 30.0, 20.0, 14.0, 2.0] {
            let r = rank(resolve(&inverted, Some(&Value::Number(v)), &p));
            assert!(r >= last, "severity dropped at value {v}");
            last = r;
        }
    }

    #[test]
    fn gauge_without_thresholds_is_informational() {
        let p = palette();
        let kind = MetricKind::Gauge {
            thresholds: None,
            invert: false,
        };
        assert_eq!(resolve(&kind, Some(&Value::Number(1e9)), &p), p.healthy);
    }

    #[test]
    fn gauge_with_text_value_is_unknown() {
        let p = palette();
        let v = Value::Text("n/a".into());
        assert_eq!(resolve(&gauge(5.0, 20.0, false), Some(&v), &p), p.unknown);
    }

    #[rstest]
    #[case(0.0, false)]
    #[case(-3.0, false)]
    #[case(0.001, true)]
    #[case(1500.0, true)]
    fn counter_shows_activity_only_when_positive(#[case] value: f64, #[case] active: bool) {
        let p = palette();
        let expected = if active { p.activity } else { p.off };
        assert_eq!(
            resolve(&MetricKind::Counter, Some(&Value::Number(value)), &p),
            expected
        );
    }

    #[test]
    fn reserved_with_a_value_is_off() {
        let p = palette();
        assert_eq!(
            resolve(&MetricKind::Reserved, Some(&Value::Bool(true)), &p),
            p.off
        );
    }
}
