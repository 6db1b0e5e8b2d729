//! Aggregation views: compass summary, activity feed, daily agenda, and
//! mentor-note visibility.

mod common;

use common::{
    action_plan, active_relationship, create_test_context, due_task, goal, log_entry, reflection,
    task,
};
use chrono::{Duration, TimeZone, Utc};
use mentorbridge_core::types::{ActionPlanStatus, GoalStatus};
use mentorbridge_core::{
    ActivityKind, EngineError, StorageBackend, TaskPriority, TaskStatus, UserId,
};

#[tokio::test]
async fn dashboard_aggregates_all_sections() {
    let ctx = create_test_context().await;
    let client = UserId::new();
    let now = Utc.with_ymd_and_hms(2026, 3, 2, 9, 0, 0).unwrap();

    // 2 active goals -> plan 40; 1 of 4 tasks done -> do 25;
    // 3 logs -> check 30; 1 of 2 plans done -> action 50
    for i in 0..2 {
        ctx.store
            .create_goal(&goal(
                client,
                &format!("goal {}", i),
                GoalStatus::Active,
                now - Duration::days(1),
            ))
            .await
            .unwrap();
    }
    ctx.store
        .create_goal(&goal(
            client,
            "old goal",
            GoalStatus::Archived,
            now - Duration::days(30),
        ))
        .await
        .unwrap();

    for i in 0..4 {
        let status = if i == 0 {
            TaskStatus::Completed
        } else {
            TaskStatus::Pending
        };
        ctx.store
            .create_task(&task(
                client,
                &format!("task {}", i),
                status,
                now - Duration::hours(i),
            ))
            .await
            .unwrap();
    }

    for i in 0..3 {
        ctx.store
            .create_log(&log_entry(client, now - Duration::hours(i)))
            .await
            .unwrap();
    }

    ctx.store
        .create_action_plan(&action_plan(
            client,
            "sleep earlier",
            ActionPlanStatus::Completed,
            now - Duration::days(2),
        ))
        .await
        .unwrap();
    ctx.store
        .create_action_plan(&action_plan(
            client,
            "weekly review",
            ActionPlanStatus::Pending,
            now - Duration::days(1),
        ))
        .await
        .unwrap();

    let dashboard = ctx.engine.dashboard(client, now).await.unwrap();

    assert_eq!(dashboard.compass.plan_progress, 40);
    assert_eq!(dashboard.compass.do_progress, 25);
    assert_eq!(dashboard.compass.check_progress, 30);
    assert_eq!(dashboard.compass.action_progress, 50);

    // All goals are listed, each with its (here task-less) percentage
    assert_eq!(dashboard.goals.len(), 3);
    assert!(dashboard.goals.iter().all(|g| g.progress_percentage == 0));

    // Nothing is due today; the feed carries the recent records
    assert!(dashboard.today.is_empty());
    assert!(!dashboard.recent_activity.is_empty());
}

#[tokio::test]
async fn compass_axes_clamp_independently() {
    let ctx = create_test_context().await;
    let client = UserId::new();
    let now = Utc::now();

    // 6 active goals and 14 logs: both axes clamp at 100
    for i in 0..6 {
        ctx.store
            .create_goal(&goal(
                client,
                &format!("goal {}", i),
                GoalStatus::Active,
                now,
            ))
            .await
            .unwrap();
    }
    for i in 0..14 {
        ctx.store
            .create_log(&log_entry(client, now - Duration::minutes(i)))
            .await
            .unwrap();
    }

    let dashboard = ctx.engine.dashboard(client, now).await.unwrap();
    assert_eq!(dashboard.compass.plan_progress, 100);
    assert_eq!(dashboard.compass.check_progress, 100);
    assert_eq!(dashboard.compass.do_progress, 0);
    assert_eq!(dashboard.compass.action_progress, 0);
}

#[tokio::test]
async fn feed_merges_sources_newest_first() {
    let ctx = create_test_context().await;
    let client = UserId::new();
    let base = Utc.with_ymd_and_hms(2026, 3, 1, 8, 0, 0).unwrap();

    ctx.store
        .create_goal(&goal(client, "meditate daily", GoalStatus::Active, base))
        .await
        .unwrap();
    ctx.store
        .create_reflection(&reflection(client, base + Duration::hours(2)))
        .await
        .unwrap();
    let mut done = task(
        client,
        "morning pages",
        TaskStatus::Completed,
        base - Duration::hours(1),
    );
    done.completed_at = Some(base + Duration::hours(3));
    ctx.store.create_task(&done).await.unwrap();

    let feed = ctx.engine.activity_feed(client, None).await.unwrap();

    // task completion (base+3h), reflection (base+2h), then the task and
    // goal creations
    assert_eq!(feed[0].kind, ActivityKind::TaskCompleted);
    assert_eq!(feed[0].description, "Completed task \"morning pages\"");
    assert_eq!(feed[1].kind, ActivityKind::ReflectionCreated);
    for pair in feed.windows(2) {
        assert!(pair[0].timestamp >= pair[1].timestamp);
    }
}

#[tokio::test]
async fn feed_caps_each_source_before_the_merge() {
    let ctx = create_test_context().await;
    let client = UserId::new();
    let base = Utc::now();

    // 15 goals, but only the 10 most recent may enter the merge
    for i in 0..15 {
        ctx.store
            .create_goal(&goal(
                client,
                &format!("goal {}", i),
                GoalStatus::Active,
                base + Duration::minutes(i),
            ))
            .await
            .unwrap();
    }

    let feed = ctx.engine.activity_feed(client, Some(50)).await.unwrap();
    assert_eq!(feed.len(), 10);
    assert_eq!(feed[0].description, "Set a new goal \"goal 14\"");
    assert_eq!(feed[9].description, "Set a new goal \"goal 5\"");
}

#[tokio::test]
async fn feed_respects_limit_and_rejects_bad_ones() {
    let ctx = create_test_context().await;
    let client = UserId::new();
    let base = Utc::now();

    for i in 0..5 {
        ctx.store
            .create_reflection(&reflection(client, base + Duration::minutes(i)))
            .await
            .unwrap();
    }

    let feed = ctx.engine.activity_feed(client, Some(3)).await.unwrap();
    assert_eq!(feed.len(), 3);

    for bad in [0, 51] {
        let err = ctx
            .engine
            .activity_feed(client, Some(bad))
            .await
            .unwrap_err();
        assert!(matches!(err, EngineError::Validation(_)));
    }
}

#[tokio::test]
async fn feed_tolerates_empty_sources() {
    let ctx = create_test_context().await;
    let feed = ctx
        .engine
        .activity_feed(UserId::new(), None)
        .await
        .unwrap();
    assert!(feed.is_empty());
}

#[tokio::test]
async fn agenda_orders_by_priority_time_then_creation() {
    let ctx = create_test_context().await;
    let client = UserId::new();
    let now = Utc.with_ymd_and_hms(2026, 3, 2, 7, 0, 0).unwrap();
    let created = now - Duration::days(1);

    // The canonical ordering example, plus an unscheduled high task
    for (priority, scheduled, offset) in [
        (TaskPriority::Low, Some("08:00"), 0),
        (TaskPriority::High, Some("18:00"), 1),
        (TaskPriority::High, Some("09:00"), 2),
        (TaskPriority::High, None, 3),
    ] {
        ctx.store
            .create_task(&due_task(
                client,
                &format!("t{}", offset),
                priority,
                now + Duration::hours(offset),
                scheduled,
                created + Duration::minutes(offset),
            ))
            .await
            .unwrap();
    }

    // Due tomorrow: outside the window
    ctx.store
        .create_task(&due_task(
            client,
            "tomorrow",
            TaskPriority::High,
            now + Duration::days(1),
            Some("07:00"),
            created,
        ))
        .await
        .unwrap();

    let agenda = ctx.engine.today_agenda(client, now).await.unwrap();
    let titles: Vec<&str> = agenda.iter().map(|e| e.task.title.as_str()).collect();
    assert_eq!(titles, vec!["t2", "t1", "t3", "t0"]);
}

#[tokio::test]
async fn agenda_joins_goal_titles_null_tolerantly() {
    let ctx = create_test_context().await;
    let client = UserId::new();
    let now = Utc.with_ymd_and_hms(2026, 3, 2, 7, 0, 0).unwrap();

    let g = goal(client, "finish the thesis", GoalStatus::Active, now);
    ctx.store.create_goal(&g).await.unwrap();
    let doomed = goal(client, "abandoned", GoalStatus::Active, now);
    ctx.store.create_goal(&doomed).await.unwrap();

    let mut linked = due_task(client, "write chapter", TaskPriority::High, now, None, now);
    linked.goal_id = Some(g.id);
    ctx.store.create_task(&linked).await.unwrap();

    let mut orphaned = due_task(client, "stray", TaskPriority::Low, now, None, now);
    orphaned.goal_id = Some(doomed.id);
    ctx.store.create_task(&orphaned).await.unwrap();

    ctx.store.delete_goal(doomed.id).await.unwrap();

    let agenda = ctx.engine.today_agenda(client, now).await.unwrap();
    assert_eq!(agenda[0].goal_name.as_deref(), Some("finish the thesis"));
    assert_eq!(agenda[1].goal_name, None);
}

#[tokio::test]
async fn mentor_notes_visibility_both_directions() {
    let ctx = create_test_context().await;
    let (mentor, client) = (UserId::new(), UserId::new());
    let relationship = active_relationship(&ctx, mentor, client).await;

    ctx.engine
        .add_note(relationship.id, mentor, "private observation".to_string(), false)
        .await
        .unwrap();
    ctx.engine
        .add_note(relationship.id, mentor, "great week!".to_string(), true)
        .await
        .unwrap();

    // The client may not author mentor notes
    let err = ctx
        .engine
        .add_note(relationship.id, client, "hi".to_string(), true)
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::NotAuthorized(_)));

    let mentor_view = ctx.engine.notes(relationship.id, mentor).await.unwrap();
    assert_eq!(mentor_view.len(), 2);

    let client_view = ctx.engine.notes(relationship.id, client).await.unwrap();
    assert_eq!(client_view.len(), 1);
    assert_eq!(client_view[0].content, "great week!");

    let err = ctx
        .engine
        .notes(relationship.id, UserId::new())
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::NotAuthorized(_)));
}
