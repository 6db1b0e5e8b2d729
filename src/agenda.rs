//! Today's-tasks ordering
//!
//! Deterministic sort for the daily agenda view: priority first, then
//! scheduled time ascending, with scheduled tasks ahead of unscheduled ones
//! at equal priority, and creation time as the final tie-break. Each entry
//! carries its parent goal's title when the goal still exists.

use crate::types::{Goal, GoalId, Task};
use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use std::cmp::Ordering;
use std::collections::HashMap;

/// A task in the daily agenda, annotated with its goal's title
///
/// `goal_name` is a left join with null tolerance: tasks whose `goal_id` is
/// unset or points at a deleted goal simply have no name attached.
#[derive(Debug, Clone, Serialize)]
pub struct AgendaEntry {
    #[serde(flatten)]
    pub task: Task,
    pub goal_name: Option<String>,
}

/// Half-open window [start, end) covering the day containing `now`, in UTC
pub fn day_window(now: DateTime<Utc>) -> (DateTime<Utc>, DateTime<Utc>) {
    let start = now
        .date_naive()
        .and_hms_opt(0, 0, 0)
        .expect("midnight is a valid time")
        .and_utc();
    (start, start + Duration::hours(24))
}

/// Compare two tasks for agenda order.
///
/// Key, in order: priority rank (high first); scheduled time ascending when
/// both are set; a scheduled task before an unscheduled one; creation time
/// ascending.
pub fn compare(a: &Task, b: &Task) -> Ordering {
    a.priority
        .rank()
        .cmp(&b.priority.rank())
        .then_with(|| match (a.scheduled_time, b.scheduled_time) {
            (Some(ta), Some(tb)) => ta.cmp(&tb),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => Ordering::Equal,
        })
        .then_with(|| a.created_at.cmp(&b.created_at))
}

/// Order today's tasks and attach goal titles
pub fn build_agenda(mut tasks: Vec<Task>, goals: &[Goal]) -> Vec<AgendaEntry> {
    let titles: HashMap<GoalId, &str> = goals
        .iter()
        .map(|g| (g.id, g.title.as_str()))
        .collect();

    tasks.sort_by(compare);
    tasks
        .into_iter()
        .map(|task| {
            let goal_name = task
                .goal_id
                .and_then(|id| titles.get(&id))
                .map(|title| title.to_string());
            AgendaEntry { task, goal_name }
        })
        .collect()
}
