//! Per-feature comparison of two settings snapshots.

use serde_json::Value;

use super::{FEATURES, FeatureDescriptor};
use crate::settings::Snapshot;

/// What a reconciliation pass must do for one feature.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    None,
    Enable,
    Disable,
    Reconfigure,
}

/// Result of [`diff`]: one action per feature, in feature-table order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diff {
    actions: Vec<(&'static FeatureDescriptor, Action)>,
}

impl Diff {
    /// Action for `feature` (`Action::None` for unknown names).
    #[cfg(test)]
    pub fn get(&self, feature: &str) -> Action {
        self.actions
            .iter()
            .find(|(f, _)| f.name == feature)
            .map_or(Action::None, |(_, action)| *action)
    }

    /// Features whose action is not `None`.
    pub fn changes(&self) -> impl Iterator<Item = (&'static FeatureDescriptor, Action)> + '_ {
        self.actions
            .iter()
            .copied()
            .filter(|(_, action)| *action != Action::None)
    }

    /// Features with the given action.
    pub fn with_action(
        &self,
        action: Action,
    ) -> impl Iterator<Item = &'static FeatureDescriptor> + '_ {
        self.actions
            .iter()
            .filter(move |(_, a)| *a == action)
            .map(|(f, _)| *f)
    }

    pub fn is_empty(&self) -> bool {
        self.changes().next().is_none()
    }
}

/// Compare `old` and `new` for every feature in the static table.
pub fn diff(old: &Snapshot, new: &Snapshot) -> Diff {
    diff_with(FEATURES, old, new)
}

/// Compare `old` and `new` for the given features.
///
/// Enable/disable transitions take precedence over reconfiguration.
fn diff_with(
    features: &'static [FeatureDescriptor],
    old: &Snapshot,
    new: &Snapshot,
) -> Diff {
    let actions = features
        .iter()
        .map(|feature| (feature, action_for(feature, old, new)))
        .collect();
    Diff { actions }
}

fn action_for(feature: &FeatureDescriptor, old: &Snapshot, new: &Snapshot) -> Action {
    let was_enabled = old.is_enabled(feature.enable_key);
    let is_enabled = new.is_enabled(feature.enable_key);

    match (was_enabled, is_enabled) {
        (false, true) => Action::Enable,
        (true, false) => Action::Disable,
        (true, true)
            if feature
                .reconfig_keys
                .iter()
                .any(|key| !same_value(old.get(key), new.get(key))) =>
        {
            Action::Reconfigure
        }
        _ => Action::None,
    }
}

/// Absent differs from every present value, including `null`.
fn same_value(a: Option<&Value>, b: Option<&Value>) -> bool {
    match (a, b) {
        (None, None) => true,
        (Some(a), Some(b)) => values_equal(a, b),
        _ => false,
    }
}

/// Structural equality, with numbers compared by value (`4` equals `4.0`).
fn values_equal(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => match (x.as_f64(), y.as_f64()) {
            (Some(x), Some(y)) => x == y,
            _ => x == y,
        },
        (Value::Array(xs), Value::Array(ys)) => {
            xs.len() == ys.len() && xs.iter().zip(ys).all(|(x, y)| values_equal(x, y))
        }
        (Value::Object(xs), Value::Object(ys)) => {
            xs.len() == ys.len()
                && xs
                    .iter()
                    .all(|(k, x)| ys.get(k).is_some_and(|y| values_equal(x, y)))
        }
        _ => a == b,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    static TEST_FEATURE: &[FeatureDescriptor] = &[FeatureDescriptor {
        name: "f",
        enable_key: "f_enable",
        reconfig_keys: &["k1", "k2"],
        stop_hook: None,
    }];

    fn snap(pairs: &[(&str, Value)]) -> Snapshot {
        Snapshot::from_pairs(pairs.iter().map(|(k, v)| (*k, v.clone())))
    }

    fn action(old: &Snapshot, new: &Snapshot) -> Action {
        diff_with(TEST_FEATURE, old, new).get("f")
    }

    #[test]
    fn test_enable_disable_transitions() {
        let off = snap(&[("f_enable", json!(false))]);
        let on = snap(&[("f_enable", json!(true))]);
        let absent = Snapshot::empty();

        assert_eq!(action(&off, &on), Action::Enable);
        assert_eq!(action(&absent, &on), Action::Enable);
        assert_eq!(action(&on, &off), Action::Disable);
        assert_eq!(action(&on, &absent), Action::Disable);
        assert_eq!(action(&off, &absent), Action::None);
        assert_eq!(action(&on, &on), Action::None);
    }

    #[test]
    fn test_non_boolean_enable_is_false() {
        let truthy = snap(&[("f_enable", json!("true"))]);
        let one = snap(&[("f_enable", json!(1))]);
        let on = snap(&[("f_enable", json!(true))]);

        assert_eq!(action(&truthy, &on), Action::Enable);
        assert_eq!(action(&on, &one), Action::Disable);
        assert_eq!(action(&truthy, &one), Action::None);
    }

    #[test]
    fn test_reconfigure_requires_enabled_on_both_sides() {
        let on_a = snap(&[("f_enable", json!(true)), ("k1", json!("a"))]);
        let on_b = snap(&[("f_enable", json!(true)), ("k1", json!("b"))]);
        let off_a = snap(&[("f_enable", json!(false)), ("k1", json!("a"))]);
        let off_b = snap(&[("f_enable", json!(false)), ("k1", json!("b"))]);

        assert_eq!(action(&on_a, &on_b), Action::Reconfigure);
        assert_eq!(action(&off_a, &off_b), Action::None);
        // Transitions win over reconfiguration
        assert_eq!(action(&off_a, &on_b), Action::Enable);
        assert_eq!(action(&on_a, &off_b), Action::Disable);
    }

    #[test]
    fn test_absent_key_differs_from_present() {
        let without = snap(&[("f_enable", json!(true))]);
        let with_null = snap(&[("f_enable", json!(true)), ("k2", Value::Null)]);
        let with_zero = snap(&[("f_enable", json!(true)), ("k2", json!(0))]);

        assert_eq!(action(&without, &with_null), Action::Reconfigure);
        assert_eq!(action(&without, &with_zero), Action::Reconfigure);
        assert_eq!(action(&with_zero, &without), Action::Reconfigure);
    }

    #[test]
    fn test_unrelated_keys_ignored() {
        let a = snap(&[("f_enable", json!(true)), ("other", json!(1))]);
        let b = snap(&[("f_enable", json!(true)), ("other", json!(2))]);
        assert_eq!(action(&a, &b), Action::None);
    }

    #[test]
    fn test_structural_value_comparison() {
        let ratios_a = snap(&[("f_enable", json!(true)), ("k1", json!([0.2, 0.5]))]);
        let ratios_b = snap(&[("f_enable", json!(true)), ("k1", json!([0.2, 0.5]))]);
        let ratios_c = snap(&[("f_enable", json!(true)), ("k1", json!([0.2, 0.6]))]);
        let int = snap(&[("f_enable", json!(true)), ("k1", json!(4))]);
        let float = snap(&[("f_enable", json!(true)), ("k1", json!(4.0))]);

        assert_eq!(action(&ratios_a, &ratios_b), Action::None);
        assert_eq!(action(&ratios_a, &ratios_c), Action::Reconfigure);
        assert_eq!(action(&int, &float), Action::None);
    }

    #[test]
    fn test_night_limit_scenario() {
        let a = snap(&[("night_limit_enable", json!(false))]);
        let b = snap(&[
            ("night_limit_enable", json!(true)),
            ("night_limit_time", json!("23:00")),
        ]);
        let c = snap(&[
            ("night_limit_enable", json!(true)),
            ("night_limit_time", json!("06:00")),
        ]);

        let ab = diff(&a, &b);
        assert_eq!(ab.get("night_limit"), Action::Enable);
        assert_eq!(ab.changes().count(), 1);

        let bc = diff(&b, &c);
        assert_eq!(bc.get("night_limit"), Action::Reconfigure);
        assert_eq!(bc.changes().count(), 1);

        assert!(diff(&c, &c).is_empty());
    }

    #[test]
    fn test_with_action_filter() {
        let old = snap(&[("break_reminders_enable", json!(true))]);
        let new = snap(&[
            ("daily_limit_enable", json!(true)),
            ("night_limit_enable", json!(true)),
        ]);
        let d = diff(&old, &new);

        let enabled: Vec<_> = d.with_action(Action::Enable).map(|f| f.name).collect();
        let disabled: Vec<_> = d.with_action(Action::Disable).map(|f| f.name).collect();
        assert_eq!(enabled, vec!["night_limit", "daily_limit"]);
        assert_eq!(disabled, vec!["break_reminders"]);
    }
}
