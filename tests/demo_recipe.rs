//! End-to-end check of the bundled demo recipe

use std::{fs, path::PathBuf, sync::Arc};

use chrono::Utc;
use cooking_timers::{
    plan::{plan, OrchestrationStrategy},
    recipe::{scale, Recipe},
    state::{ManualClock, SessionController, TimerEventKind, TimerLifecycle},
    TimerError,
};

fn demo_recipe() -> Recipe {
    let path = PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("demos/pasta.json");
    let raw = fs::read_to_string(path).unwrap();
    serde_json::from_str(&raw).unwrap()
}

#[test]
fn demo_recipe_plans_parallel_group() {
    let scaled = scale(&demo_recipe(), 4).unwrap();
    let plan = plan(&scaled.scaled_steps).unwrap();

    let offsets: Vec<(u64, u64)> = plan
        .entries()
        .iter()
        .map(|e| (e.step_id, e.start_offset_seconds))
        .collect();
    assert_eq!(offsets, vec![(1, 0), (2, 480), (3, 480), (4, 660)]);
    assert_eq!(plan.strategy(), OrchestrationStrategy::Parallel);
    assert_eq!(plan.total_cooking_time(), 1020);
}

#[test]
fn demo_recipe_cooks_through() {
    let clock = ManualClock::new(Utc::now());
    let scaled = scale(&demo_recipe(), 2).unwrap();
    let plan = plan(&scaled.scaled_steps).unwrap();
    let controller = SessionController::new(scaled, plan, Arc::new(clock.clone()));
    let mut events = controller.subscribe();

    controller.start_planned_timer(1).unwrap();
    clock.advance(240);
    controller.tick().unwrap();

    controller.advance_step().unwrap();
    controller.start_planned_timer(2).unwrap();
    controller.start_planned_timer(3).unwrap();
    assert!(matches!(
        controller.start_planned_timer(4),
        Err(TimerError::StepNotReady { waiting_on: 3, .. })
    ));

    // Garlic is 90s at two servings; the kitchen gets busy and ticks stall
    clock.advance(100);
    controller.tick().unwrap();
    controller.start_planned_timer(4).unwrap();

    clock.advance(1000);
    controller.tick().unwrap();
    assert!(controller
        .timers()
        .unwrap()
        .iter()
        .all(|t| t.state == TimerLifecycle::Completed));

    let completions: Vec<u64> = std::iter::from_fn(|| events.try_recv().ok())
        .filter(|e| e.kind == TimerEventKind::Complete)
        .map(|e| e.step_id)
        .collect();
    assert_eq!(completions, vec![1, 3, 2, 4]);
}
