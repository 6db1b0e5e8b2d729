//! Progress aggregation
//!
//! Two independent computations over raw client records: the per-goal
//! completion percentage, and the four-axis compass summary shown on the
//! dashboard. The axis constants are output-compatibility policy for
//! existing consumers and must not drift.

use crate::storage::ProgressCounts;
use crate::types::{Goal, GoalId, Task, TaskStatus};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Points one active goal contributes to the plan axis
pub const PLAN_POINTS_PER_GOAL: u32 = 20;

/// Points one log entry contributes to the check axis
pub const CHECK_POINTS_PER_LOG: u32 = 10;

/// Every axis and percentage is clamped to this ceiling
pub const AXIS_CAP: u32 = 100;

/// Completion percentage as an integer in [0, 100].
///
/// Round-half-up; zero items yields 0 rather than undefined.
pub fn completion_percentage(completed: usize, total: usize) -> u8 {
    if total == 0 {
        return 0;
    }
    let pct = (completed as f64 / total as f64 * 100.0).round();
    pct.min(AXIS_CAP as f64) as u8
}

/// Four-axis progress summary
///
/// Each axis is an independent proxy computed from a different raw count;
/// the axes are deliberately not weighted against each other.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompassSummary {
    /// Goal-setting momentum: 20 points per active goal, capped
    pub plan_progress: u8,

    /// Execution: completed share of all tasks
    pub do_progress: u8,

    /// Review habit: 10 points per log entry, capped
    pub check_progress: u8,

    /// Follow-through: completed share of action plans
    pub action_progress: u8,
}

impl CompassSummary {
    pub fn from_counts(counts: &ProgressCounts) -> Self {
        Self {
            plan_progress: capped_points(counts.active_goals, PLAN_POINTS_PER_GOAL),
            do_progress: completion_percentage(counts.completed_tasks, counts.total_tasks),
            check_progress: capped_points(counts.logs, CHECK_POINTS_PER_LOG),
            action_progress: completion_percentage(
                counts.completed_action_plans,
                counts.total_action_plans,
            ),
        }
    }
}

fn capped_points(count: usize, points_each: u32) -> u8 {
    (count as u32).saturating_mul(points_each).min(AXIS_CAP) as u8
}

/// A goal together with its derived completion metrics
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GoalProgress {
    #[serde(flatten)]
    pub goal: Goal,
    pub total_tasks: usize,
    pub completed_tasks: usize,
    pub progress_percentage: u8,
}

/// Attach completion percentages to goals from the flat task list.
///
/// Tasks with no goal, or with a dangling `goal_id`, contribute to no goal.
pub fn goal_progress_list(goals: Vec<Goal>, tasks: &[Task]) -> Vec<GoalProgress> {
    let mut by_goal: HashMap<GoalId, (usize, usize)> = HashMap::new();
    for task in tasks {
        let Some(goal_id) = task.goal_id else {
            continue;
        };
        let entry = by_goal.entry(goal_id).or_default();
        entry.1 += 1;
        if task.status == TaskStatus::Completed {
            entry.0 += 1;
        }
    }

    goals
        .into_iter()
        .map(|goal| {
            let (completed, total) = by_goal.get(&goal.id).copied().unwrap_or((0, 0));
            GoalProgress {
                progress_percentage: completion_percentage(completed, total),
                total_tasks: total,
                completed_tasks: completed,
                goal,
            }
        })
        .collect()
}
