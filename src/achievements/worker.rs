use std::sync::Arc;

use tokio::sync::mpsc;

use crate::achievements::award::AchievementEngine;
use crate::achievements::EvaluationContext;

/// Handle external triggers use to request an evaluation without waiting on
/// it. Publishing never blocks and never fails the caller; a dropped context
/// self-heals on the next trigger because evaluation is a full re-scan.
#[derive(Clone)]
pub struct AchievementQueue {
    sender: mpsc::UnboundedSender<EvaluationContext>,
}

impl AchievementQueue {
    pub fn dispatch(&self, context: EvaluationContext) {
        if let Err(e) = self.sender.send(context) {
            warn!("Achievement evaluation queue is closed, dropping trigger: {}", e);
        }
    }
}

/// Spawns the consumer task that runs evaluations off the critical path of
/// whatever triggered them.
pub fn spawn_evaluation_worker(engine: Arc<AchievementEngine>) -> AchievementQueue {
    let (sender, mut receiver) = mpsc::unbounded_channel::<EvaluationContext>();
    tokio::spawn(async move {
        while let Some(context) = receiver.recv().await {
            let user_id = context.user_id.clone();
            let outcome = engine.evaluate_and_award(&context).await;
            if !outcome.awarded.is_empty() {
                let names: Vec<&str> = outcome.awarded.iter().map(|badge| badge.badge_name.as_str()).collect();
                info!("Awarded {} badge(s) to user {}: {}", outcome.awarded.len(), user_id, names.join(", "));
            }
            if !outcome.goal_matches.is_empty() {
                info!("User {} hit {} goal target(s) with a new PR", user_id, outcome.goal_matches.len());
            }
        }
        info!("Achievement evaluation queue closed");
    });
    AchievementQueue { sender }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use chrono::{FixedOffset, Utc};

    use super::*;
    use crate::achievements::repository::fakes::{badge, FakeStores};
    use crate::achievements::repository::AchievementStores;
    use crate::achievements::AchievementTrigger;
    use crate::database::models::badge::Criteria;

    #[tokio::test]
    async fn dispatched_triggers_are_evaluated_in_the_background() {
        let data = Arc::new(FakeStores {
            badges: vec![badge("first-workout", Criteria::WorkoutCount { count: 1 })],
            completed_sessions: vec![Utc::now()],
            ..Default::default()
        });
        let engine = Arc::new(AchievementEngine::new(
            AchievementStores::fake(data.clone()),
            FixedOffset::east_opt(0).unwrap(),
        ));
        let queue = spawn_evaluation_worker(engine);

        queue.dispatch(EvaluationContext {
            user_id: String::from("user-1"),
            member_id: Some(String::from("member-1")),
            trigger: AchievementTrigger::Workout,
            exercise_name: None,
            exercise_value: None,
            exercise_unit: None,
            skill_name: None,
            sport: None,
        });

        // the worker owns the award; poll until it lands
        for _ in 0..50 {
            if !data.earned.lock().unwrap().is_empty() {
                break;
            }
            tokio::time::sleep(std::time::Duration::from_millis(10)).await;
        }
        let earned = data.earned.lock().unwrap();
        assert_eq!(earned.len(), 1);
        assert_eq!(earned[0].badge_id, "first-workout");
    }
}
