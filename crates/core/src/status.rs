//! Condition severity colors for tiles and condition cards.
//!
//! The `(status, type)` table and the priority order encode the domain's
//! severity semantics; both are load-bearing and must not drift.

use crate::{Condition, ConditionStatus};
use serde::{Deserialize, Serialize};

/// Types that are good news when `True` and bad news when `False`.
pub const HEALTH_POSITIVE_TYPES: &[&str] =
    &["Available", "Balanced", "AutoscaleReady", "Synchronized"];

/// In-progress/transitional types; active ones render orange.
pub const TRANSITIONAL_TYPES: &[&str] = &[
    "Scaling",
    "ScalingUp",
    "ScalingDown",
    "Upgrading",
    "WaitingBetweenMigrations",
    "Migrating",
    "Rebalancing",
    "ExpandingVolume",
    "BucketMigrating",
];

/// Tile/condition color, declared worst-first. The derived `Ord` is the
/// severity priority: red(1) < orange(2) < purple(3) < blue(4) < green(5)
/// < grey(6).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TileColor {
    Red,
    Orange,
    Purple,
    Blue,
    Green,
    Grey,
}

impl TileColor {
    pub fn as_str(&self) -> &'static str {
        match self {
            TileColor::Red => "red",
            TileColor::Orange => "orange",
            TileColor::Purple => "purple",
            TileColor::Blue => "blue",
            TileColor::Green => "green",
            TileColor::Grey => "grey",
        }
    }
}

/// Map one `(status, type)` pair to its severity color.
pub fn color_of(status: ConditionStatus, type_: &str) -> TileColor {
    // Unknown status takes precedence over everything.
    if matches!(status, ConditionStatus::Unknown) {
        return TileColor::Grey;
    }
    match status {
        ConditionStatus::True => {
            if HEALTH_POSITIVE_TYPES.contains(&type_) {
                TileColor::Green
            } else if type_ == "Error" {
                TileColor::Red
            } else if TRANSITIONAL_TYPES.contains(&type_) {
                TileColor::Orange
            } else if type_ == "ManageConfig" {
                TileColor::Blue
            } else if type_ == "Hibernating" {
                TileColor::Purple
            } else {
                TileColor::Grey
            }
        }
        ConditionStatus::False => {
            if HEALTH_POSITIVE_TYPES.contains(&type_) {
                // A healthy condition being false is bad.
                TileColor::Red
            } else {
                // Inactive Error is neutral, as is everything else.
                TileColor::Grey
            }
        }
        _ => TileColor::Grey,
    }
}

/// Single overall color for a multi-condition tile: the first non-grey color
/// in priority order, grey when there is none (or no conditions at all).
pub fn overall_color(conditions: &[Condition]) -> TileColor {
    conditions
        .iter()
        .map(|c| color_of(c.status, &c.type_))
        .min()
        .unwrap_or(TileColor::Grey)
}

/// Sort a cluster's condition list worst-first. Stable, so conditions with
/// equal severity keep their snapshot order.
pub fn sort_by_severity(conditions: &mut [Condition]) {
    conditions.sort_by_key(|c| color_of(c.status, &c.type_));
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cond(type_: &str, status: ConditionStatus) -> Condition {
        Condition {
            type_: type_.to_string(),
            status,
            reason: String::new(),
            message: String::new(),
            last_transition_time: None,
            last_update_time: None,
        }
    }

    #[test]
    fn unknown_status_always_grey() {
        for t in ["Available", "Error", "Scaling", "Hibernating", "Nonsense"] {
            assert_eq!(color_of(ConditionStatus::Unknown, t), TileColor::Grey);
        }
    }

    #[test]
    fn active_condition_table() {
        assert_eq!(color_of(ConditionStatus::True, "Available"), TileColor::Green);
        assert_eq!(color_of(ConditionStatus::True, "Balanced"), TileColor::Green);
        assert_eq!(color_of(ConditionStatus::True, "AutoscaleReady"), TileColor::Green);
        assert_eq!(color_of(ConditionStatus::True, "Synchronized"), TileColor::Green);
        assert_eq!(color_of(ConditionStatus::True, "Error"), TileColor::Red);
        for t in TRANSITIONAL_TYPES {
            assert_eq!(color_of(ConditionStatus::True, t), TileColor::Orange, "{t}");
        }
        assert_eq!(color_of(ConditionStatus::True, "ManageConfig"), TileColor::Blue);
        assert_eq!(color_of(ConditionStatus::True, "Hibernating"), TileColor::Purple);
        assert_eq!(color_of(ConditionStatus::True, "SomethingElse"), TileColor::Grey);
    }

    #[test]
    fn inactive_condition_table() {
        assert_eq!(color_of(ConditionStatus::False, "Available"), TileColor::Red);
        assert_eq!(color_of(ConditionStatus::False, "Synchronized"), TileColor::Red);
        // An inactive error is neutral, not green.
        assert_eq!(color_of(ConditionStatus::False, "Error"), TileColor::Grey);
        assert_eq!(color_of(ConditionStatus::False, "Scaling"), TileColor::Grey);
        assert_eq!(color_of(ConditionStatus::False, "Hibernating"), TileColor::Grey);
    }

    #[test]
    fn other_status_is_grey() {
        assert_eq!(color_of(ConditionStatus::Other, "Available"), TileColor::Grey);
    }

    #[test]
    fn severity_sort_is_worst_first_and_stable() {
        // Colors: grey, red, green, orange -> expect red, orange, green, grey.
        let mut conds = vec![
            cond("Mystery", ConditionStatus::True),
            cond("Error", ConditionStatus::True),
            cond("Available", ConditionStatus::True),
            cond("Scaling", ConditionStatus::True),
        ];
        sort_by_severity(&mut conds);
        let types: Vec<&str> = conds.iter().map(|c| c.type_.as_str()).collect();
        assert_eq!(types, vec!["Error", "Scaling", "Available", "Mystery"]);

        // Two greens keep their incoming order.
        let mut conds = vec![
            cond("Balanced", ConditionStatus::True),
            cond("Available", ConditionStatus::True),
        ];
        sort_by_severity(&mut conds);
        assert_eq!(conds[0].type_, "Balanced");
        assert_eq!(conds[1].type_, "Available");
    }

    #[test]
    fn overall_color_prefers_worst() {
        let conds = vec![
            cond("Available", ConditionStatus::True),
            cond("Scaling", ConditionStatus::True),
        ];
        assert_eq!(overall_color(&conds), TileColor::Orange);
        assert_eq!(overall_color(&[]), TileColor::Grey);
        let all_grey = vec![cond("Error", ConditionStatus::False)];
        assert_eq!(overall_color(&all_grey), TileColor::Grey);
    }
}
