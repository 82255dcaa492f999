// ── Threshold levels and parameters ──
//
// A level specification is either "collect only" or a fixed (warn, crit)
// pair. The bound direction is not part of the specification: it is fixed
// per metric by the check that consumes it.

use serde::{Deserialize, Serialize};

use super::result::State;
use crate::error::CoreError;

/// Which side of a level pair alerts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    /// Alert when `value >= level`.
    Upper,
    /// Alert when `value <= level`.
    Lower,
}

/// Configured levels for one metric.
///
/// Serializes as `"no_levels"` or `{"fixed": [warn, crit]}`; the tuple
/// forms `["fixed", [warn, crit]]` and `["no_levels", null]` are accepted
/// on input as well.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", try_from = "LevelSpecRepr")]
pub enum LevelSpec {
    /// Record the metric, never alert on it.
    NoLevels,
    /// `(warn, crit)`.
    Fixed(f64, f64),
}

#[derive(Deserialize)]
#[serde(rename_all = "snake_case")]
enum TaggedLevels {
    NoLevels,
    Fixed(f64, f64),
}

#[derive(Deserialize)]
#[serde(untagged)]
enum LevelSpecRepr {
    Tagged(TaggedLevels),
    Tuple(String, Option<(f64, f64)>),
}

impl TryFrom<LevelSpecRepr> for LevelSpec {
    type Error = String;

    fn try_from(repr: LevelSpecRepr) -> Result<Self, Self::Error> {
        match repr {
            LevelSpecRepr::Tagged(TaggedLevels::NoLevels) => Ok(Self::NoLevels),
            LevelSpecRepr::Tagged(TaggedLevels::Fixed(warn, crit)) => Ok(Self::Fixed(warn, crit)),
            LevelSpecRepr::Tuple(tag, levels) => match (tag.as_str(), levels) {
                ("no_levels", _) => Ok(Self::NoLevels),
                ("fixed", Some((warn, crit))) => Ok(Self::Fixed(warn, crit)),
                ("fixed", None) => Err("\"fixed\" levels need a (warn, crit) pair".into()),
                (other, _) => Err(format!(
                    "unknown level type '{other}' (expected \"fixed\" or \"no_levels\")"
                )),
            },
        }
    }
}

impl LevelSpec {
    /// The `(warn, crit)` pair, if alerting is configured.
    pub fn pair(self) -> Option<(f64, f64)> {
        match self {
            Self::NoLevels => None,
            Self::Fixed(warn, crit) => Some((warn, crit)),
        }
    }

    /// Reject pairs whose warning level is more extreme than the critical
    /// level in the alerting direction.
    pub fn validate(self, direction: Direction) -> Result<(), String> {
        let Self::Fixed(warn, crit) = self else {
            return Ok(());
        };
        if !warn.is_finite() || !crit.is_finite() {
            return Err(format!("levels must be finite numbers, got ({warn}, {crit})"));
        }
        match direction {
            Direction::Upper if warn > crit => Err(format!(
                "warning level {warn} is above critical level {crit} for an upper bound"
            )),
            Direction::Lower if warn < crit => Err(format!(
                "warning level {warn} is below critical level {crit} for a lower bound"
            )),
            _ => Ok(()),
        }
    }

    /// Severity of `value` against these levels.
    ///
    /// The warning check runs first and the critical check may only raise
    /// the result, never lower it.
    pub fn evaluate(self, value: f64, direction: Direction) -> State {
        let Self::Fixed(warn, crit) = self else {
            return State::Ok;
        };
        let breaches = |level: f64| match direction {
            Direction::Upper => value >= level,
            Direction::Lower => value <= level,
        };

        let mut state = State::Ok;
        if breaches(warn) {
            state = state.escalate(State::Warn);
        }
        if breaches(crit) {
            state = state.escalate(State::Crit);
        }
        state
    }
}

// ── Check parameters ───────────────────────────────────────────────

/// Levels for the `VSX System` service.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SystemParams {
    pub cpu_levels: LevelSpec,
    pub session_levels: LevelSpec,
    /// Upper levels on the fall of session utilization since the last cycle.
    pub session_drop_levels: LevelSpec,
}

impl Default for SystemParams {
    fn default() -> Self {
        Self {
            cpu_levels: LevelSpec::Fixed(80.0, 90.0),
            session_levels: LevelSpec::Fixed(80.0, 90.0),
            session_drop_levels: LevelSpec::Fixed(10.0, 20.0),
        }
    }
}

/// Levels for one call direction of a trunk.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CallDirectionParams {
    pub failed_call_ratio_levels: LevelSpec,
    pub answer_seize_ratio_levels: LevelSpec,
    pub avg_postdial_delay_levels: LevelSpec,
}

impl Default for CallDirectionParams {
    fn default() -> Self {
        Self {
            failed_call_ratio_levels: LevelSpec::Fixed(5.0, 15.0),
            answer_seize_ratio_levels: LevelSpec::Fixed(70.0, 50.0),
            avg_postdial_delay_levels: LevelSpec::Fixed(3.0, 5.0),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RealtimeParams {
    pub origination_utilization_levels: LevelSpec,
    pub termination_utilization_levels: LevelSpec,
}

impl Default for RealtimeParams {
    fn default() -> Self {
        Self {
            origination_utilization_levels: LevelSpec::Fixed(80.0, 90.0),
            termination_utilization_levels: LevelSpec::Fixed(80.0, 90.0),
        }
    }
}

/// Levels for `VSX Trunk` services, grouped by direction.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrunkParams {
    pub ingress: CallDirectionParams,
    pub egress: CallDirectionParams,
    pub gw_egress_stat: CallDirectionParams,
    pub realtime: RealtimeParams,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MediaParams {
    pub session_levels: LevelSpec,
}

impl Default for MediaParams {
    fn default() -> Self {
        Self {
            session_levels: LevelSpec::Fixed(80.0, 90.0),
        }
    }
}

/// Every threshold the evaluator applies.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Thresholds {
    pub system: SystemParams,
    pub trunks: TrunkParams,
    pub media: MediaParams,
}

impl Thresholds {
    /// Check every pair against its metric's bound direction.
    ///
    /// Errors name the offending parameter, e.g. `trunks.ingress.answer_seize_ratio_levels`.
    pub fn validate(&self) -> Result<(), CoreError> {
        let mut checks: Vec<(String, LevelSpec, Direction)> = vec![
            ("system.cpu_levels".into(), self.system.cpu_levels, Direction::Upper),
            ("system.session_levels".into(), self.system.session_levels, Direction::Upper),
            (
                "system.session_drop_levels".into(),
                self.system.session_drop_levels,
                Direction::Upper,
            ),
            ("media.session_levels".into(), self.media.session_levels, Direction::Upper),
            (
                "trunks.realtime.origination_utilization_levels".into(),
                self.trunks.realtime.origination_utilization_levels,
                Direction::Upper,
            ),
            (
                "trunks.realtime.termination_utilization_levels".into(),
                self.trunks.realtime.termination_utilization_levels,
                Direction::Upper,
            ),
        ];
        for (group, params) in [
            ("ingress", &self.trunks.ingress),
            ("egress", &self.trunks.egress),
            ("gw_egress_stat", &self.trunks.gw_egress_stat),
        ] {
            checks.push((
                format!("trunks.{group}.failed_call_ratio_levels"),
                params.failed_call_ratio_levels,
                Direction::Upper,
            ));
            checks.push((
                format!("trunks.{group}.answer_seize_ratio_levels"),
                params.answer_seize_ratio_levels,
                Direction::Lower,
            ));
            checks.push((
                format!("trunks.{group}.avg_postdial_delay_levels"),
                params.avg_postdial_delay_levels,
                Direction::Upper,
            ));
        }

        checks
            .into_iter()
            .try_for_each(|(metric, spec, direction)| {
                spec.validate(direction)
                    .map_err(|reason| CoreError::InvalidLevels { metric, reason })
            })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use pretty_assertions::assert_eq;
    use serde_json::json;

    use super::*;

    #[test]
    fn upper_levels_escalate_in_order() {
        let levels = LevelSpec::Fixed(80.0, 90.0);
        assert_eq!(levels.evaluate(2.0, Direction::Upper), State::Ok);
        assert_eq!(levels.evaluate(80.0, Direction::Upper), State::Warn);
        assert_eq!(levels.evaluate(91.1, Direction::Upper), State::Crit);
    }

    #[test]
    fn lower_levels_alert_below() {
        let levels = LevelSpec::Fixed(70.0, 50.0);
        assert_eq!(levels.evaluate(75.0, Direction::Lower), State::Ok);
        assert_eq!(levels.evaluate(70.0, Direction::Lower), State::Warn);
        assert_eq!(levels.evaluate(12.5, Direction::Lower), State::Crit);
    }

    #[test]
    fn no_levels_never_alert() {
        assert_eq!(LevelSpec::NoLevels.evaluate(1e9, Direction::Upper), State::Ok);
        assert_eq!(LevelSpec::NoLevels.evaluate(-1e9, Direction::Lower), State::Ok);
    }

    #[test]
    fn all_level_syntaxes_deserialize() {
        let tagged: LevelSpec = serde_json::from_value(json!({ "fixed": [5.0, 15.0] })).unwrap();
        let tuple: LevelSpec = serde_json::from_value(json!(["fixed", [5.0, 15.0]])).unwrap();
        let off: LevelSpec = serde_json::from_value(json!("no_levels")).unwrap();
        let off_tuple: LevelSpec = serde_json::from_value(json!(["no_levels", null])).unwrap();

        assert_eq!(tagged, LevelSpec::Fixed(5.0, 15.0));
        assert_eq!(tuple, tagged);
        assert_eq!(off, LevelSpec::NoLevels);
        assert_eq!(off_tuple, LevelSpec::NoLevels);
        assert!(serde_json::from_value::<LevelSpec>(json!(["predictive", [1.0, 2.0]])).is_err());
    }

    #[test]
    fn levels_serialize_tagged() {
        assert_eq!(
            serde_json::to_value(LevelSpec::Fixed(80.0, 90.0)).unwrap(),
            json!({ "fixed": [80.0, 90.0] })
        );
        assert_eq!(serde_json::to_value(LevelSpec::NoLevels).unwrap(), json!("no_levels"));
    }

    #[test]
    fn inverted_pairs_are_rejected() {
        assert!(LevelSpec::Fixed(90.0, 80.0).validate(Direction::Upper).is_err());
        assert!(LevelSpec::Fixed(50.0, 70.0).validate(Direction::Lower).is_err());
        assert!(LevelSpec::Fixed(70.0, 50.0).validate(Direction::Lower).is_ok());
        assert!(LevelSpec::Fixed(f64::NAN, 1.0).validate(Direction::Upper).is_err());
    }

    #[test]
    fn defaults_are_valid_and_errors_name_the_parameter() {
        assert!(Thresholds::default().validate().is_ok());

        let mut bad = Thresholds::default();
        bad.trunks.egress.answer_seize_ratio_levels = LevelSpec::Fixed(50.0, 70.0);
        match bad.validate() {
            Err(CoreError::InvalidLevels { metric, .. }) => {
                assert_eq!(metric, "trunks.egress.answer_seize_ratio_levels");
            }
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn partial_params_fill_from_defaults() {
        let params: SystemParams =
            serde_json::from_value(json!({ "cpu_levels": "no_levels" })).unwrap();
        assert_eq!(params.cpu_levels, LevelSpec::NoLevels);
        assert_eq!(params.session_drop_levels, LevelSpec::Fixed(10.0, 20.0));
    }
}
