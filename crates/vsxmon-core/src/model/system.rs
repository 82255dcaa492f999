// ── System entity ──

use serde::{Deserialize, Serialize};

use super::fields::FieldMap;

/// Global counters from the realtime `system_stat` table.
///
/// Exactly one per cycle. The fields the evaluator needs are resolved at
/// normalization time; everything the device sent stays in `fields`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SystemStat {
    pub sum_active_session: Option<u64>,
    pub sum_attempt_session: Option<u64>,
    pub peak_active_session: Option<u64>,
    pub max_session_allowed: Option<u64>,
    pub cpu_idle_percent: Option<f64>,
    pub current_cps: Option<u64>,
    pub max_cps_allowed: Option<u64>,
    pub ha_current_state: Option<String>,
    pub ha_pre_state: Option<String>,
    pub demo_lic: Option<f64>,
    pub fields: FieldMap,
}

impl SystemStat {
    pub fn from_fields(fields: FieldMap) -> Self {
        Self {
            sum_active_session: fields.count("sum_active_session"),
            sum_attempt_session: fields.count("sum_attempt_session"),
            peak_active_session: fields.count("peak_active_session"),
            max_session_allowed: fields.count("max_session_allowed"),
            cpu_idle_percent: fields.number("cpu_idle_percent"),
            current_cps: fields.count("current_cps"),
            max_cps_allowed: fields.count("max_cps_allowed"),
            ha_current_state: fields.text("ha_current_state"),
            ha_pre_state: fields.text("ha_pre_state"),
            demo_lic: fields.number("demo_lic"),
            fields,
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn known_fields_are_typed() {
        let fields: FieldMap = [
            ("cpu_idle_percent".to_owned(), json!("98")),
            ("sum_active_session".to_owned(), json!(4)),
            ("max_session_allowed".to_owned(), json!("19750")),
            ("ha_current_state".to_owned(), json!("active")),
            ("slave_stat".to_owned(), json!(64)),
        ]
        .into_iter()
        .collect();

        let s = SystemStat::from_fields(fields);
        assert_eq!(s.cpu_idle_percent, Some(98.0));
        assert_eq!(s.sum_active_session, Some(4));
        assert_eq!(s.max_session_allowed, Some(19_750));
        assert_eq!(s.ha_current_state.as_deref(), Some("active"));
        assert_eq!(s.peak_active_session, None);
        assert_eq!(s.fields.count("slave_stat"), Some(64));
    }
}
