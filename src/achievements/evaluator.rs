use anyhow::Result;
use chrono::FixedOffset;
use mongodb::bson::{doc, Document};

use crate::achievements::repository::AchievementStores;
use crate::achievements::streak::longest_streak;
use crate::achievements::{EvaluationContext, CANONICAL_LIFTS};
use crate::database::models::badge::{Criteria, RequiredSkillStatus};
use crate::database::models::personal_record::{PersonalRecord, RecordType};
use crate::database::models::training::SkillStatus;

/// Exercise-name keywords that mark a PR as a track performance.
const TRACK_KEYWORDS: [&str; 2] = ["mile", "run"];

/// Who is being evaluated. Member-scoped checks (PRs, sessions) silently fail
/// eligibility when no member identity was supplied; that is missing data,
/// not an error.
pub struct EvaluationSubject {
    pub user_id: String,
    pub member_id: Option<String>,
}

impl From<&EvaluationContext> for EvaluationSubject {
    fn from(context: &EvaluationContext) -> Self {
        EvaluationSubject {
            user_id: context.user_id.clone(),
            member_id: context.member_id.clone(),
        }
    }
}

/// The numeric (or binary) reading a criterion produces before any threshold
/// comparison. Eligibility and progress percentages both derive from this,
/// so the two can never disagree on aggregation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CriterionMeasure {
    Threshold {
        current: f64,
        target: f64,
        lower_is_better: bool,
    },
    Attained(bool),
    /// Tag is declared in the catalog but has no semantics yet.
    Unsupported,
}

impl CriterionMeasure {
    pub fn is_met(&self) -> bool {
        match self {
            CriterionMeasure::Threshold { current, target, lower_is_better } => {
                if *lower_is_better {
                    current <= target
                } else {
                    current >= target
                }
            }
            CriterionMeasure::Attained(attained) => *attained,
            CriterionMeasure::Unsupported => false,
        }
    }

    fn threshold(current: f64, target: f64) -> Self {
        CriterionMeasure::Threshold { current, target, lower_is_better: false }
    }
}

pub struct CriteriaVerdict {
    pub eligible: bool,
    pub metadata: Option<Document>,
}

pub struct CriteriaEvaluator {
    stores: AchievementStores,
    offset: FixedOffset,
}

fn name_matches_any(exercise_name: &str, configured: &[String]) -> bool {
    let name = exercise_name.to_lowercase();
    configured.iter().any(|candidate| name.contains(&candidate.to_lowercase()))
}

fn best_value(records: &[PersonalRecord], predicate: impl Fn(&PersonalRecord) -> bool) -> Option<f64> {
    records
        .iter()
        .filter(|record| predicate(record))
        .map(|record| record.value)
        .fold(None, |best: Option<f64>, value| Some(best.map_or(value, |b| b.max(value))))
}

fn status_satisfies(stored: SkillStatus, required: RequiredSkillStatus) -> bool {
    match required {
        // mastery clears the lower bar
        RequiredSkillStatus::Achieved => matches!(stored, SkillStatus::Achieved | SkillStatus::Mastered),
        RequiredSkillStatus::Mastered => stored == SkillStatus::Mastered,
    }
}

impl CriteriaEvaluator {
    pub fn new(stores: AchievementStores, offset: FixedOffset) -> Self {
        CriteriaEvaluator { stores, offset }
    }

    pub async fn evaluate(&self, subject: &EvaluationSubject, criteria: &Criteria) -> Result<CriteriaVerdict> {
        let measure = self.measure(subject, criteria).await?;
        let eligible = measure.is_met();
        let metadata = if eligible { award_metadata(criteria, &measure) } else { None };
        Ok(CriteriaVerdict { eligible, metadata })
    }

    /// Exhaustive dispatch over the criteria tag. Every variant is handled;
    /// adding a tag without an arm here is a compile error.
    pub async fn measure(&self, subject: &EvaluationSubject, criteria: &Criteria) -> Result<CriterionMeasure> {
        match criteria {
            Criteria::PrTotal { exercises, threshold } => {
                self.measure_pr_total(subject, exercises, *threshold).await
            }
            Criteria::PrSingle { exercises, threshold } => {
                self.measure_pr_single(subject, exercises, *threshold).await
            }
            Criteria::PrBodyweightRatio { exercises, ratio } => {
                self.measure_pr_bodyweight_ratio(subject, exercises, *ratio).await
            }
            Criteria::SkillAchieved { skill, status } => {
                let skills = self.stores.skills.for_user(&subject.user_id).await?;
                let attained = skills
                    .iter()
                    .any(|s| s.name.eq_ignore_ascii_case(skill) && status_satisfies(s.current_status, *status));
                Ok(CriterionMeasure::Attained(attained))
            }
            Criteria::Sport { sport } => {
                let sports = self.stores.sports.for_user(&subject.user_id).await?;
                let attained = sports.iter().any(|s| s.sport.eq_ignore_ascii_case(sport));
                Ok(CriterionMeasure::Attained(attained))
            }
            Criteria::Streak { days } => {
                let member_id = match &subject.member_id {
                    Some(member_id) => member_id,
                    None => return Ok(CriterionMeasure::Attained(false)),
                };
                let timestamps = self.stores.sessions.completed_timestamps(member_id).await?;
                let longest = longest_streak(&timestamps, self.offset);
                Ok(CriterionMeasure::threshold(longest as f64, *days as f64))
            }
            Criteria::WorkoutCount { count } => {
                let member_id = match &subject.member_id {
                    Some(member_id) => member_id,
                    None => return Ok(CriterionMeasure::Attained(false)),
                };
                let completed = self.stores.sessions.completed_count(member_id).await?;
                Ok(CriterionMeasure::threshold(completed as f64, *count as f64))
            }
            Criteria::ChallengeComplete { challenge_id } => {
                let complete = self
                    .stores
                    .enrollments
                    .has_completed_challenge(&subject.user_id, challenge_id.as_deref())
                    .await?;
                Ok(CriterionMeasure::Attained(complete))
            }
            Criteria::ProgramComplete { program_id } => {
                let complete = self
                    .stores
                    .enrollments
                    .has_completed_program(&subject.user_id, program_id.as_deref())
                    .await?;
                Ok(CriterionMeasure::Attained(complete))
            }
            Criteria::Followers { count } => {
                let followers = self.stores.follows.follower_count(&subject.user_id).await?;
                Ok(CriterionMeasure::threshold(followers as f64, *count as f64))
            }
            Criteria::CirclesCreated { count } => {
                let owned = self.stores.circles.owned_circle_count(&subject.user_id).await?;
                Ok(CriterionMeasure::threshold(owned as f64, *count as f64))
            }
            Criteria::TrackTime { seconds } => self.measure_track_time(subject, *seconds).await,
            Criteria::FirstLogin | Criteria::ProfileComplete | Criteria::OnboardingComplete => {
                Ok(CriterionMeasure::Unsupported)
            }
        }
    }

    async fn member_records(&self, subject: &EvaluationSubject) -> Result<Option<Vec<PersonalRecord>>> {
        let member_id = match &subject.member_id {
            Some(member_id) => member_id,
            None => return Ok(None),
        };
        Ok(Some(self.stores.personal_records.for_member(member_id).await?))
    }

    /// Combined-lift total: the configured exercise list is resolved to
    /// canonical lift groups, each present group contributes its single best
    /// all-time PR (never a sum across synonyms), and the group maxima are
    /// summed. Groups with no logged PR contribute 0 without disqualifying.
    async fn measure_pr_total(
        &self,
        subject: &EvaluationSubject,
        exercises: &[String],
        threshold: f64,
    ) -> Result<CriterionMeasure> {
        let records = match self.member_records(subject).await? {
            Some(records) => records,
            None => return Ok(CriterionMeasure::Attained(false)),
        };
        let mut total = 0.0;
        for lift in CANONICAL_LIFTS {
            if !exercises.iter().any(|name| name.to_lowercase().contains(lift)) {
                continue;
            }
            let group_best = best_value(&records, |record| record.exercise_name.to_lowercase().contains(lift));
            if let Some(best) = group_best {
                total += best;
            }
        }
        Ok(CriterionMeasure::threshold(total, threshold))
    }

    async fn measure_pr_single(
        &self,
        subject: &EvaluationSubject,
        exercises: &[String],
        threshold: f64,
    ) -> Result<CriterionMeasure> {
        let records = match self.member_records(subject).await? {
            Some(records) => records,
            None => return Ok(CriterionMeasure::Attained(false)),
        };
        let best = best_value(&records, |record| name_matches_any(&record.exercise_name, exercises));
        Ok(CriterionMeasure::threshold(best.unwrap_or(0.0), threshold))
    }

    /// Like pr_single, but the target is derived from the most recent
    /// bodyweight metric. No bodyweight on file means no target to compare
    /// against, so the badge is simply not eligible.
    async fn measure_pr_bodyweight_ratio(
        &self,
        subject: &EvaluationSubject,
        exercises: &[String],
        ratio: f64,
    ) -> Result<CriterionMeasure> {
        let bodyweight = match self.stores.bodyweight.latest_for_user(&subject.user_id).await? {
            Some(metric) => metric.value,
            None => return Ok(CriterionMeasure::Attained(false)),
        };
        let records = match self.member_records(subject).await? {
            Some(records) => records,
            None => return Ok(CriterionMeasure::Attained(false)),
        };
        let best = best_value(&records, |record| name_matches_any(&record.exercise_name, exercises));
        Ok(CriterionMeasure::threshold(best.unwrap_or(0.0), bodyweight * ratio))
    }

    async fn measure_track_time(&self, subject: &EvaluationSubject, seconds: f64) -> Result<CriterionMeasure> {
        let records = match self.member_records(subject).await? {
            Some(records) => records,
            None => return Ok(CriterionMeasure::Attained(false)),
        };
        let best = records
            .iter()
            .filter(|record| {
                record.record_type == RecordType::Time
                    && TRACK_KEYWORDS
                        .iter()
                        .any(|keyword| record.exercise_name.to_lowercase().contains(keyword))
            })
            .map(|record| record.value)
            .fold(None, |best: Option<f64>, value| Some(best.map_or(value, |b| b.min(value))));
        match best {
            Some(best) => Ok(CriterionMeasure::Threshold {
                current: best,
                target: seconds,
                lower_is_better: true,
            }),
            None => Ok(CriterionMeasure::Attained(false)),
        }
    }
}

/// Facts captured at award time, stored on the earned row.
fn award_metadata(criteria: &Criteria, measure: &CriterionMeasure) -> Option<Document> {
    let current = match measure {
        CriterionMeasure::Threshold { current, .. } => *current,
        _ => return None,
    };
    match criteria {
        Criteria::PrTotal { .. } => Some(doc! { "total": current }),
        Criteria::PrSingle { .. } | Criteria::PrBodyweightRatio { .. } => Some(doc! { "value": current }),
        Criteria::Streak { .. } => Some(doc! { "longestStreak": current as i64 }),
        Criteria::WorkoutCount { .. } => Some(doc! { "count": current as i64 }),
        Criteria::Followers { .. } => Some(doc! { "followers": current as i64 }),
        Criteria::CirclesCreated { .. } => Some(doc! { "circles": current as i64 }),
        Criteria::TrackTime { .. } => Some(doc! { "bestSeconds": current }),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use chrono::FixedOffset;

    use super::*;
    use crate::achievements::repository::fakes::{bodyweight, skill, time_pr, weight_pr, FakeStores};

    fn subject() -> EvaluationSubject {
        EvaluationSubject {
            user_id: String::from("user-1"),
            member_id: Some(String::from("member-1")),
        }
    }

    fn evaluator(data: FakeStores) -> CriteriaEvaluator {
        CriteriaEvaluator::new(
            AchievementStores::fake(Arc::new(data)),
            FixedOffset::east_opt(0).unwrap(),
        )
    }

    fn strings(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[tokio::test]
    async fn pr_total_sums_one_maximum_per_canonical_group() {
        let data = FakeStores {
            records: vec![
                weight_pr("member-1", "Bench Press", 200.0),
                weight_pr("member-1", "Incline Bench Press", 180.0),
                weight_pr("member-1", "Back Squat", 300.0),
                // no deadlift logged: contributes 0, does not disqualify
            ],
            ..Default::default()
        };
        let criteria = Criteria::PrTotal {
            exercises: strings(&["Bench Press", "Squat", "Deadlift"]),
            threshold: 400.0,
        };
        let measure = evaluator(data).measure(&subject(), &criteria).await.unwrap();
        assert_eq!(
            measure,
            CriterionMeasure::Threshold { current: 500.0, target: 400.0, lower_is_better: false }
        );
        assert!(measure.is_met());
    }

    #[tokio::test]
    async fn pr_single_takes_the_best_substring_match() {
        let data = FakeStores {
            records: vec![
                weight_pr("member-1", "Bench Press", 185.0),
                weight_pr("member-1", "Incline Bench Press", 165.0),
            ],
            ..Default::default()
        };
        let criteria = Criteria::PrSingle { exercises: strings(&["bench"]), threshold: 180.0 };
        let verdict = evaluator(data).evaluate(&subject(), &criteria).await.unwrap();
        assert!(verdict.eligible);
        let metadata = verdict.metadata.unwrap();
        assert_eq!(metadata.get_f64("value").unwrap(), 185.0);
    }

    #[tokio::test]
    async fn bodyweight_ratio_without_a_metric_is_not_eligible() {
        let data = FakeStores {
            records: vec![weight_pr("member-1", "Bench Press", 400.0)],
            ..Default::default()
        };
        let criteria = Criteria::PrBodyweightRatio { exercises: strings(&["bench"]), ratio: 1.5 };
        let verdict = evaluator(data).evaluate(&subject(), &criteria).await.unwrap();
        assert!(!verdict.eligible);
    }

    #[tokio::test]
    async fn bodyweight_ratio_scales_the_latest_metric() {
        let data = FakeStores {
            records: vec![weight_pr("member-1", "Bench Press", 310.0)],
            bodyweights: vec![bodyweight("user-1", 200.0)],
            ..Default::default()
        };
        let criteria = Criteria::PrBodyweightRatio { exercises: strings(&["bench"]), ratio: 1.5 };
        let measure = evaluator(data).measure(&subject(), &criteria).await.unwrap();
        assert_eq!(
            measure,
            CriterionMeasure::Threshold { current: 310.0, target: 300.0, lower_is_better: false }
        );
    }

    #[tokio::test]
    async fn mastered_satisfies_an_achieved_requirement() {
        use crate::database::models::training::SkillStatus;
        let data = FakeStores {
            skills: vec![skill("user-1", "Muscle Up", SkillStatus::Mastered)],
            ..Default::default()
        };
        let criteria = Criteria::SkillAchieved {
            skill: String::from("muscle up"),
            status: RequiredSkillStatus::Achieved,
        };
        let verdict = evaluator(data).evaluate(&subject(), &criteria).await.unwrap();
        assert!(verdict.eligible);
    }

    #[tokio::test]
    async fn achieved_does_not_satisfy_a_mastered_requirement() {
        use crate::database::models::training::SkillStatus;
        let data = FakeStores {
            skills: vec![skill("user-1", "Muscle Up", SkillStatus::Achieved)],
            ..Default::default()
        };
        let criteria = Criteria::SkillAchieved {
            skill: String::from("Muscle Up"),
            status: RequiredSkillStatus::Mastered,
        };
        let verdict = evaluator(data).evaluate(&subject(), &criteria).await.unwrap();
        assert!(!verdict.eligible);
    }

    #[tokio::test]
    async fn track_time_uses_the_fastest_matching_record() {
        let data = FakeStores {
            records: vec![
                time_pr("member-1", "1 Mile Run", 360.0),
                time_pr("member-1", "1 Mile Run", 330.0),
                // weight PRs never count as track performances
                weight_pr("member-1", "Lunge", 100.0),
            ],
            ..Default::default()
        };
        let criteria = Criteria::TrackTime { seconds: 345.0 };
        let verdict = evaluator(data).evaluate(&subject(), &criteria).await.unwrap();
        assert!(verdict.eligible);
        let metadata = verdict.metadata.unwrap();
        assert_eq!(metadata.get_f64("bestSeconds").unwrap(), 330.0);
    }

    #[tokio::test]
    async fn track_time_with_no_track_records_is_not_eligible() {
        let data = FakeStores {
            records: vec![weight_pr("member-1", "Bench Press", 200.0)],
            ..Default::default()
        };
        let criteria = Criteria::TrackTime { seconds: 345.0 };
        let verdict = evaluator(data).evaluate(&subject(), &criteria).await.unwrap();
        assert!(!verdict.eligible);
    }

    #[tokio::test]
    async fn scoped_challenge_requires_that_challenge() {
        let data = FakeStores {
            completed_challenges: vec![String::from("summer-shred")],
            ..Default::default()
        };
        let evaluator = evaluator(data);

        let scoped_hit = Criteria::ChallengeComplete { challenge_id: Some(String::from("summer-shred")) };
        assert!(evaluator.evaluate(&subject(), &scoped_hit).await.unwrap().eligible);

        let scoped_miss = Criteria::ChallengeComplete { challenge_id: Some(String::from("winter-bulk")) };
        assert!(!evaluator.evaluate(&subject(), &scoped_miss).await.unwrap().eligible);

        let unscoped = Criteria::ChallengeComplete { challenge_id: None };
        assert!(evaluator.evaluate(&subject(), &unscoped).await.unwrap().eligible);
    }

    #[tokio::test]
    async fn member_scoped_checks_need_a_member_id() {
        let data = FakeStores {
            records: vec![weight_pr("member-1", "Bench Press", 500.0)],
            ..Default::default()
        };
        let no_member = EvaluationSubject { user_id: String::from("user-1"), member_id: None };
        let criteria = Criteria::PrSingle { exercises: strings(&["bench"]), threshold: 100.0 };
        let verdict = evaluator(data).evaluate(&no_member, &criteria).await.unwrap();
        assert!(!verdict.eligible);
    }

    #[tokio::test]
    async fn unimplemented_tags_are_never_eligible() {
        let verdict = evaluator(FakeStores::default())
            .evaluate(&subject(), &Criteria::FirstLogin)
            .await
            .unwrap();
        assert!(!verdict.eligible);
        assert!(verdict.metadata.is_none());
    }
}
