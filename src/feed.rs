//! Activity feed builder
//!
//! Merges recent records from five source categories into a single
//! timestamp-sorted, capped feed of styled events. Events are synthetic:
//! they are derived from the source records at read time and never stored.

use crate::types::{ActionPlan, Goal, Reflection, Task};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Upper bound on raw records pulled per source before the merge
pub const SOURCE_CAP: usize = 10;

/// Feed length when the caller does not specify a limit
pub const DEFAULT_LIMIT: usize = 10;

/// Kind of activity event
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActivityKind {
    TaskCompleted,
    TaskCreated,
    GoalCreated,
    ReflectionCreated,
    ImprovementSuggested,
    LogRecorded,
}

impl ActivityKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ActivityKind::TaskCompleted => "task_completed",
            ActivityKind::TaskCreated => "task_created",
            ActivityKind::GoalCreated => "goal_created",
            ActivityKind::ReflectionCreated => "reflection_created",
            ActivityKind::ImprovementSuggested => "improvement_suggested",
            ActivityKind::LogRecorded => "log_recorded",
        }
    }

    /// The fixed presentation tuple for this kind
    pub fn style(&self) -> EventStyle {
        match self {
            ActivityKind::TaskCompleted => EventStyle {
                icon: "check-circle",
                icon_color: "text-green-500",
                background: "bg-green-50",
            },
            ActivityKind::TaskCreated => EventStyle {
                icon: "plus-circle",
                icon_color: "text-blue-500",
                background: "bg-blue-50",
            },
            ActivityKind::GoalCreated => EventStyle {
                icon: "flag",
                icon_color: "text-purple-500",
                background: "bg-purple-50",
            },
            ActivityKind::ReflectionCreated => EventStyle {
                icon: "book-open",
                icon_color: "text-indigo-500",
                background: "bg-indigo-50",
            },
            ActivityKind::ImprovementSuggested => EventStyle {
                icon: "light-bulb",
                icon_color: "text-amber-500",
                background: "bg-amber-50",
            },
            ActivityKind::LogRecorded => EventStyle {
                icon: "pencil",
                icon_color: "text-slate-500",
                background: "bg-slate-50",
            },
        }
    }
}

/// Presentation hints attached to every event
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct EventStyle {
    pub icon: &'static str,
    pub icon_color: &'static str,
    pub background: &'static str,
}

/// One entry in the merged activity feed
#[derive(Debug, Clone, Serialize)]
pub struct ActivityEvent {
    /// Synthetic id derived from the source record
    pub id: String,
    pub kind: ActivityKind,
    pub description: String,
    pub timestamp: DateTime<Utc>,
    pub style: EventStyle,
}

impl ActivityEvent {
    fn new(kind: ActivityKind, source_id: impl std::fmt::Display, description: String, timestamp: DateTime<Utc>) -> Self {
        Self {
            id: format!("{}:{}", kind.as_str(), source_id),
            kind,
            description,
            timestamp,
            style: kind.style(),
        }
    }

    fn task_completed(task: &Task) -> Option<Self> {
        let completed_at = task.completed_at?;
        Some(Self::new(
            ActivityKind::TaskCompleted,
            task.id,
            format!("Completed task \"{}\"", task.title),
            completed_at,
        ))
    }

    fn task_created(task: &Task) -> Self {
        Self::new(
            ActivityKind::TaskCreated,
            task.id,
            format!("Added task \"{}\"", task.title),
            task.created_at,
        )
    }

    fn goal_created(goal: &Goal) -> Self {
        Self::new(
            ActivityKind::GoalCreated,
            goal.id,
            format!("Set a new goal \"{}\"", goal.title),
            goal.created_at,
        )
    }

    fn reflection_created(reflection: &Reflection) -> Self {
        Self::new(
            ActivityKind::ReflectionCreated,
            reflection.id,
            "Wrote a reflection".to_string(),
            reflection.created_at,
        )
    }

    fn improvement_suggested(plan: &ActionPlan) -> Self {
        Self::new(
            ActivityKind::ImprovementSuggested,
            plan.id,
            format!("Started action plan \"{}\"", plan.title),
            plan.created_at,
        )
    }
}

/// Raw records pulled for the feed, at most [`SOURCE_CAP`] per source
///
/// Any subset of sources may be empty.
#[derive(Debug, Default)]
pub struct FeedSources {
    pub completed_tasks: Vec<Task>,
    pub created_tasks: Vec<Task>,
    pub goals: Vec<Goal>,
    pub reflections: Vec<Reflection>,
    pub action_plans: Vec<ActionPlan>,
}

/// Build the merged feed: map every source record to its event, stable-sort
/// the whole set descending by timestamp (ties keep source-iteration
/// order), and truncate to `limit`.
pub fn build_feed(sources: FeedSources, limit: usize) -> Vec<ActivityEvent> {
    let mut events: Vec<ActivityEvent> = Vec::new();

    events.extend(
        sources
            .completed_tasks
            .iter()
            .filter_map(ActivityEvent::task_completed),
    );
    events.extend(sources.created_tasks.iter().map(ActivityEvent::task_created));
    events.extend(sources.goals.iter().map(ActivityEvent::goal_created));
    events.extend(
        sources
            .reflections
            .iter()
            .map(ActivityEvent::reflection_created),
    );
    events.extend(
        sources
            .action_plans
            .iter()
            .map(ActivityEvent::improvement_suggested),
    );

    // sort_by is stable: equal timestamps keep source-iteration order
    events.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
    events.truncate(limit);
    events
}
