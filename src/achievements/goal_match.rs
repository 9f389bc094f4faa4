use serde::Serialize;

use crate::achievements::CANONICAL_LIFTS;
use crate::database::models::goal::{Goal, GoalStatus};

/// Informational signal that a freshly detected PR satisfies one of the
/// member's numeric goals. Matching is a best-effort keyword heuristic, not a
/// semantic guarantee; false positives and negatives outside the stated rule
/// are accepted.
#[derive(Debug, Serialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct GoalMatch {
    pub goal_id: String,
    pub goal_title: String,
    pub goal_category: String,
    pub target_value: f64,
    pub target_unit: String,
    pub current_pr_value: f64,
    pub exceeded_by: f64,
    pub status: GoalMatchStatus,
}

#[derive(Debug, Serialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum GoalMatchStatus {
    Met,
    Exceeded,
}

/// A goal title is considered relevant to an exercise when the exercise name
/// appears inside the title, or both independently mention the same canonical
/// lift keyword.
fn is_relevant(exercise_name: &str, goal_title: &str) -> bool {
    let exercise = exercise_name.to_lowercase();
    let title = goal_title.to_lowercase();
    if title.contains(&exercise) {
        return true;
    }
    CANONICAL_LIFTS
        .iter()
        .any(|keyword| exercise.contains(keyword) && title.contains(keyword))
}

/// Exact unit match, or both in the same weight family (lb or kg).
fn units_compatible(pr_unit: &str, goal_unit: &str) -> bool {
    let pr_unit = pr_unit.to_lowercase();
    let goal_unit = goal_unit.to_lowercase();
    if pr_unit == goal_unit {
        return true;
    }
    (pr_unit.contains("lb") && goal_unit.contains("lb")) || (pr_unit.contains("kg") && goal_unit.contains("kg"))
}

pub fn match_pr_against_goals(exercise_name: &str, value: f64, unit: &str, goals: &[Goal]) -> Vec<GoalMatch> {
    goals
        .iter()
        .filter(|goal| goal.status == GoalStatus::Active)
        .filter_map(|goal| {
            let target_value = goal.target_value?;
            let target_unit = goal.target_unit.as_deref()?;
            if !is_relevant(exercise_name, &goal.title) || !units_compatible(unit, target_unit) {
                return None;
            }
            if value < target_value {
                return None;
            }
            let status = if value > target_value { GoalMatchStatus::Exceeded } else { GoalMatchStatus::Met };
            Some(GoalMatch {
                goal_id: goal.id.clone(),
                goal_title: goal.title.clone(),
                goal_category: goal.category.clone(),
                target_value,
                target_unit: target_unit.to_owned(),
                current_pr_value: value,
                exceeded_by: value - target_value,
                status,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn goal(title: &str, target_value: Option<f64>, target_unit: Option<&str>, status: GoalStatus) -> Goal {
        Goal {
            id: format!("goal-{}", title.to_lowercase().replace(' ', "-")),
            member_id: String::from("member-1"),
            title: title.to_owned(),
            category: String::from("strength"),
            target_value,
            target_unit: target_unit.map(str::to_owned),
            status,
        }
    }

    #[test]
    fn pr_over_target_is_exceeded_by_the_difference() {
        let goals = vec![goal("Bench 225", Some(225.0), Some("lbs"), GoalStatus::Active)];
        let matches = match_pr_against_goals("Bench Press", 230.0, "lbs", &goals);
        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].status, GoalMatchStatus::Exceeded);
        assert_eq!(matches[0].exceeded_by, 5.0);
        assert_eq!(matches[0].current_pr_value, 230.0);
    }

    #[test]
    fn pr_exactly_at_target_is_met() {
        let goals = vec![goal("Squat 315", Some(315.0), Some("lbs"), GoalStatus::Active)];
        let matches = match_pr_against_goals("Back Squat", 315.0, "lb", &goals);
        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].status, GoalMatchStatus::Met);
        assert_eq!(matches[0].exceeded_by, 0.0);
    }

    #[test]
    fn shared_canonical_keyword_links_goal_and_exercise() {
        // "Incline Bench Press" is not a substring of the title, but both
        // mention "bench"
        let goals = vec![goal("Bigger bench this year", Some(200.0), Some("lbs"), GoalStatus::Active)];
        let matches = match_pr_against_goals("Incline Bench Press", 205.0, "lbs", &goals);
        assert_eq!(matches.len(), 1);
    }

    #[test]
    fn incompatible_units_never_match() {
        let goals = vec![goal("Bench 100", Some(100.0), Some("kg"), GoalStatus::Active)];
        assert!(match_pr_against_goals("Bench Press", 230.0, "lbs", &goals).is_empty());
    }

    #[test]
    fn pr_below_target_is_ignored() {
        let goals = vec![goal("Bench 225", Some(225.0), Some("lbs"), GoalStatus::Active)];
        assert!(match_pr_against_goals("Bench Press", 220.0, "lbs", &goals).is_empty());
    }

    #[test]
    fn non_numeric_and_inactive_goals_are_skipped() {
        let goals = vec![
            goal("Bench more", None, None, GoalStatus::Active),
            goal("Bench 225", Some(225.0), Some("lbs"), GoalStatus::Completed),
        ];
        assert!(match_pr_against_goals("Bench Press", 230.0, "lbs", &goals).is_empty());
    }

    #[test]
    fn unrelated_exercise_does_not_match() {
        let goals = vec![goal("Bench 225", Some(225.0), Some("lbs"), GoalStatus::Active)];
        assert!(match_pr_against_goals("Overhead Press", 230.0, "lbs", &goals).is_empty());
    }
}
