mod common;

use common::{client_over, document_path, FixedTags, FlakyBackend, TEAL_SLOW};
use serde_json::json;
use starchart_core::{
    Clock, ControllerError, DocumentBackend, DocumentState, ManualClock, Phase, RandomTagSource,
    Schedule, ScheduleError, StarChartController, StarColor, CELEBRATION_DURATION, PRIZE_TARGET,
};
use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::Duration;

fn start_with(backend: &Arc<FlakyBackend>, clock: &Arc<ManualClock>) -> StarChartController {
    let clock: Arc<dyn Clock> = clock.clone();
    StarChartController::start(
        Some(client_over(backend)),
        Box::new(FixedTags(TEAL_SLOW)),
        clock,
    )
}

fn ready_controller() -> (Arc<FlakyBackend>, Arc<ManualClock>, StarChartController) {
    let backend = Arc::new(FlakyBackend::new());
    let clock = Arc::new(ManualClock::new());
    let mut controller = start_with(&backend, &clock);
    controller.process_events();
    assert!(controller.is_ready());
    // Second turn consumes the echo of the seed write.
    controller.process_events();
    (backend, clock, controller)
}

fn stored_schedule(backend: &Arc<FlakyBackend>) -> Option<Schedule> {
    client_over(backend).fetch().unwrap().into_schedule()
}

fn earn_stars(controller: &mut StarChartController, count: usize) {
    let slots = ["monday", "tuesday", "wednesday", "thursday", "friday"]
        .iter()
        .flat_map(|day| (0..8).map(move |index| (day.to_string(), format!("{day}-{index}"))))
        .take(count)
        .collect::<Vec<_>>();
    for (day_id, task_id) in slots {
        controller.toggle_task(&day_id, &task_id).unwrap();
    }
}

#[test]
fn empty_store_is_seeded_with_default_week() {
    let backend = Arc::new(FlakyBackend::new());
    let clock = Arc::new(ManualClock::new());
    let mut controller = start_with(&backend, &clock);
    assert_eq!(controller.phase(), Phase::Loading);

    controller.process_events();

    assert_eq!(controller.phase(), Phase::Ready);
    assert_eq!(controller.total_stars(), 0);
    assert_eq!(controller.schedule(), &Schedule::default_week());
    assert_eq!(backend.successful_writes(), 1);
    assert_eq!(stored_schedule(&backend), Some(Schedule::default_week()));
}

#[test]
fn existing_document_is_adopted_without_writing() {
    let backend = Arc::new(FlakyBackend::new());
    let existing = Schedule::default_week()
        .toggle_task("friday", "friday-2", || TEAL_SLOW)
        .unwrap();
    client_over(&backend).try_write(&existing).unwrap();
    let clock = Arc::new(ManualClock::new());

    let mut controller = start_with(&backend, &clock);
    controller.process_events();

    assert!(controller.is_ready());
    assert_eq!(controller.schedule(), &existing);
    assert_eq!(controller.total_stars(), 1);
    assert_eq!(backend.successful_writes(), 1);
}

#[test]
fn malformed_document_is_reseeded() {
    let backend = Arc::new(FlakyBackend::new());
    backend
        .write(&document_path(), &json!({"scheduleData": []}))
        .unwrap();
    let clock = Arc::new(ManualClock::new());

    let mut controller = start_with(&backend, &clock);
    controller.process_events();

    assert!(controller.is_ready());
    assert_eq!(stored_schedule(&backend), Some(Schedule::default_week()));
}

#[test]
fn read_failure_falls_back_to_default_without_writing() {
    let backend = Arc::new(FlakyBackend::new());
    backend.fail_reads.store(true, Ordering::SeqCst);
    let clock = Arc::new(ManualClock::new());

    let mut controller = start_with(&backend, &clock);
    controller.process_events();

    assert!(controller.is_ready());
    assert_eq!(controller.schedule(), &Schedule::default_week());
    assert_eq!(backend.successful_writes(), 0);
}

#[test]
fn absent_store_is_ready_immediately_and_keeps_local_state() {
    let clock: Arc<dyn Clock> = Arc::new(ManualClock::new());
    let mut controller = StarChartController::start(None, Box::new(FixedTags(TEAL_SLOW)), clock);

    assert!(controller.is_ready());
    controller.toggle_task("monday", "monday-0").unwrap();
    controller.process_events();

    assert_eq!(controller.total_stars(), 1);
    assert_eq!(controller.pending_writes(), 0);
}

#[test]
fn mutations_are_rejected_while_loading() {
    let backend = Arc::new(FlakyBackend::new());
    let clock = Arc::new(ManualClock::new());
    let mut controller = start_with(&backend, &clock);

    assert_eq!(
        controller.toggle_task("sunday", "sunday-0"),
        Err(ControllerError::NotReady)
    );
    assert_eq!(controller.reset_week(), Err(ControllerError::NotReady));
}

#[test]
fn toggle_updates_locally_then_writes_on_next_turn() {
    let (backend, _clock, mut controller) = ready_controller();
    let writes_before = backend.successful_writes();

    controller.toggle_task("sunday", "sunday-0").unwrap();

    let task = controller.schedule().task("sunday", "sunday-0").unwrap();
    assert!(task.completed);
    assert!(StarColor::ALL.contains(&task.star_color.unwrap()));
    assert_eq!(controller.total_stars(), 1);
    assert_eq!(controller.pending_writes(), 1);
    assert_eq!(backend.successful_writes(), writes_before);

    controller.process_events();

    assert_eq!(controller.pending_writes(), 0);
    assert_eq!(backend.successful_writes(), writes_before + 1);
    assert_eq!(stored_schedule(&backend).as_ref(), Some(controller.schedule()));
}

#[test]
fn toggling_twice_restores_initial_task() {
    let (_backend, _clock, mut controller) = ready_controller();

    controller.toggle_task("thursday", "thursday-4").unwrap();
    controller.toggle_task("thursday", "thursday-4").unwrap();

    let task = controller.schedule().task("thursday", "thursday-4").unwrap();
    assert!(!task.completed);
    assert_eq!(task.star_color, None);
    assert_eq!(task.bounce_speed, None);
    assert_eq!(task.name, "Eat Dinner Nicely");
    assert_eq!(controller.schedule(), &Schedule::default_week());
}

#[test]
fn unknown_task_is_reported() {
    let (_backend, _clock, mut controller) = ready_controller();
    assert_eq!(
        controller.toggle_task("sunday", "monday-0"),
        Err(ControllerError::Schedule(ScheduleError::TaskNotFound {
            day_id: "sunday".to_string(),
            task_id: "monday-0".to_string(),
        }))
    );
    assert_eq!(controller.pending_writes(), 0);
}

#[test]
fn random_tags_come_from_the_enumerated_sets() {
    let backend = Arc::new(FlakyBackend::new());
    let clock: Arc<dyn Clock> = Arc::new(ManualClock::new());
    let mut controller = StarChartController::start(
        Some(client_over(&backend)),
        Box::new(RandomTagSource::seeded(11)),
        clock,
    );
    controller.process_events();

    controller.toggle_task("saturday", "saturday-7").unwrap();

    let task = controller.schedule().task("saturday", "saturday-7").unwrap();
    assert!(task.cosmetic_tags().is_some());
}

#[test]
fn reset_week_clears_stars_and_writes() {
    let (backend, _clock, mut controller) = ready_controller();
    earn_stars(&mut controller, 6);
    controller.process_events();
    assert_eq!(controller.total_stars(), 6);

    controller.reset_week().unwrap();
    controller.process_events();

    assert_eq!(controller.total_stars(), 0);
    assert_eq!(controller.schedule(), &Schedule::default_week());
    assert_eq!(stored_schedule(&backend), Some(Schedule::default_week()));
}

#[test]
fn celebration_shows_at_target_and_hides_after_ten_seconds() {
    let (_backend, clock, mut controller) = ready_controller();
    earn_stars(&mut controller, PRIZE_TARGET as usize - 1);
    assert!(!controller.show_celebration());

    earn_stars_on(&mut controller, "sunday-0");
    assert_eq!(controller.total_stars(), PRIZE_TARGET);
    assert!(controller.show_celebration());
    assert!(controller.progress().prize_reached);

    clock.advance(CELEBRATION_DURATION - Duration::from_secs(1));
    controller.tick();
    assert!(controller.show_celebration());

    clock.advance(Duration::from_secs(1));
    controller.tick();
    assert!(!controller.show_celebration());
}

#[test]
fn celebration_hides_when_stars_drop_below_target() {
    let (_backend, _clock, mut controller) = ready_controller();
    earn_stars(&mut controller, PRIZE_TARGET as usize);
    assert!(controller.show_celebration());

    controller.toggle_task("monday", "monday-0").unwrap();
    assert!(!controller.show_celebration());

    controller.toggle_task("monday", "monday-0").unwrap();
    assert!(controller.show_celebration());

    controller.reset_week().unwrap();
    assert!(!controller.show_celebration());
}

#[test]
fn celebration_can_be_dismissed() {
    let (_backend, _clock, mut controller) = ready_controller();
    earn_stars(&mut controller, PRIZE_TARGET as usize);
    controller.dismiss_celebration();
    assert!(!controller.show_celebration());
}

#[test]
fn remote_snapshot_replaces_local_state() {
    let (backend, _clock, mut controller) = ready_controller();
    controller.toggle_task("monday", "monday-1").unwrap();
    controller.process_events();

    let remote = Schedule::default_week()
        .toggle_task("friday", "friday-7", || TEAL_SLOW)
        .unwrap();
    client_over(&backend).write(&remote);
    controller.process_events();

    assert_eq!(controller.schedule(), &remote);
    assert_eq!(controller.total_stars(), 1);
}

#[test]
fn remote_snapshot_after_local_toggle_wins() {
    let (backend, _clock, mut controller) = ready_controller();
    let remote = Schedule::default_week()
        .toggle_task("tuesday", "tuesday-0", || TEAL_SLOW)
        .unwrap();
    client_over(&backend).write(&remote);

    controller.toggle_task("monday", "monday-1").unwrap();
    controller.process_events();

    // The local write lands after the remote push, so its echo is newest.
    let stored = stored_schedule(&backend).unwrap();
    assert_eq!(controller.schedule(), &stored);
    assert!(stored.task("monday", "monday-1").unwrap().completed);
}

#[test]
fn remote_document_cleared_after_ready_is_reseeded() {
    let (backend, _clock, mut controller) = ready_controller();
    controller.toggle_task("monday", "monday-1").unwrap();
    controller.process_events();

    backend
        .write(&document_path(), &json!({"scheduleData": "broken"}))
        .unwrap();
    controller.process_events();

    assert_eq!(controller.schedule(), &Schedule::default_week());
    assert_eq!(
        client_over(&backend).fetch().unwrap(),
        DocumentState::Present(Schedule::default_week())
    );
}

#[test]
fn write_failures_keep_local_state() {
    let (backend, _clock, mut controller) = ready_controller();
    backend.fail_writes.store(true, Ordering::SeqCst);

    controller.toggle_task("wednesday", "wednesday-3").unwrap();
    controller.process_events();

    assert_eq!(controller.total_stars(), 1);
    assert_eq!(controller.pending_writes(), 0);
    assert_eq!(stored_schedule(&backend), Some(Schedule::default_week()));
}

#[test]
fn weekends_are_hidden_by_default() {
    let (_backend, _clock, mut controller) = ready_controller();
    assert!(controller.hide_weekends());
    assert_eq!(controller.displayed_schedule().len(), 5);

    controller.set_hide_weekends(false);
    let shown = controller
        .displayed_schedule()
        .iter()
        .map(|day| day.id.as_str())
        .collect::<Vec<_>>();
    assert_eq!(shown.len(), 7);
    assert_eq!(shown[0], "sunday");
}

#[test]
fn shutdown_flushes_writes_and_unsubscribes() {
    let (backend, _clock, mut controller) = ready_controller();
    assert_eq!(backend.watcher_count(), 1);

    controller.toggle_task("sunday", "sunday-3").unwrap();
    controller.shutdown();

    assert_eq!(backend.watcher_count(), 0);
    let stored = stored_schedule(&backend).unwrap();
    assert!(stored.task("sunday", "sunday-3").unwrap().completed);
}

#[test]
fn dropping_controller_unsubscribes() {
    let (backend, _clock, controller) = ready_controller();
    drop(controller);
    assert_eq!(backend.watcher_count(), 0);
}

fn earn_stars_on(controller: &mut StarChartController, task_id: &str) {
    let day_id = task_id.split('-').next().unwrap().to_string();
    controller.toggle_task(&day_id, task_id).unwrap();
}
