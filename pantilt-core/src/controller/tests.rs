//! End-to-end command scenarios against in-memory doubles

use std::string::String;
use std::vec::Vec;

use pantilt_hal::StorageKey;
use pantilt_protocol::reply::QueueMode;
use pantilt_protocol::Transport;

use super::{Controller, TransportEvent};
use crate::scheduler::QUEUE_CAPACITY;
use crate::testing::{MemoryStorage, RecordingOutput, RecordingSink};

type TestController = Controller<RecordingOutput, RecordingSink, MemoryStorage>;

fn controller_with(storage: MemoryStorage) -> TestController {
    let mut controller = Controller::new(RecordingOutput::default(), RecordingSink::default(), storage);
    let _ = controller.begin();
    controller.sink().lines.clear();
    controller
}

fn controller() -> TestController {
    controller_with(MemoryStorage::default())
}

fn send(controller: &mut TestController, line: &str, now_ms: u32) -> Vec<String> {
    controller.handle(line, Transport::Usb, now_ms);
    controller.sink().take_usb()
}

fn tick_until(controller: &mut TestController, from_ms: u32, to_ms: u32) -> Vec<String> {
    let mut now = from_ms;
    while now <= to_ms {
        controller.tick(now);
        now += 10;
    }
    controller.sink().take_usb()
}

fn has(lines: &[String], needle: &str) -> bool {
    lines.iter().any(|l| l.contains(needle))
}

#[test]
fn test_begin_announces_ready_on_usb_only() {
    let mut controller = Controller::new(
        RecordingOutput::default(),
        RecordingSink::default(),
        MemoryStorage::default(),
    );
    assert!(controller.begin().is_err());
    assert_eq!(
        controller.sink().lines,
        vec![(
            Transport::Usb,
            String::from(r#"{"ok":true,"event":"pantilt_ready","loaded":false}"#)
        )]
    );
    assert_eq!(controller.output().last(), Some((0.0, 0.0)));
}

#[test]
fn test_missing_cmd() {
    let mut c = controller();
    let lines = send(&mut c, r#"{"id":4,"axis":"x"}"#, 0);
    assert_eq!(
        lines,
        vec![String::from(
            r#"{"ok":false,"id":4,"subsystem":"usb","error":"missing_cmd","msg":"Missing required field: cmd (example: {\"cmd\":\"help\"})"}"#
        )]
    );
}

#[test]
fn test_unknown_cmd() {
    let mut c = controller();
    let lines = send(&mut c, r#"{"cmd":"dance"}"#, 0);
    assert_eq!(lines.len(), 1);
    assert!(lines[0].contains(r#""error":"unknown_cmd""#));
}

#[test]
fn test_overlong_cmd_is_unknown_not_missing() {
    let mut c = controller();
    let lines = send(&mut c, r#"{"cmd":"thisisaverylongcommandnamethatexceedsthirtytwo"}"#, 0);
    assert_eq!(lines.len(), 1);
    assert!(lines[0].contains(r#""error":"unknown_cmd""#));

    let lines = send(&mut c, r#"{"cmd":42}"#, 0);
    assert!(lines[0].contains(r#""error":"missing_cmd""#));
}

#[test]
fn test_blank_line_is_ignored() {
    let mut c = controller();
    assert!(send(&mut c, "   ", 0).is_empty());
}

#[test]
fn test_auto_and_explicit_ids() {
    let mut c = controller();
    let first = send(&mut c, r#"{"cmd":"status"}"#, 0);
    assert!(first[0].starts_with(r#"{"ok":true,"id":1,"#));
    let explicit = send(&mut c, r#"{"cmd":"status","id":42}"#, 0);
    assert!(explicit[0].starts_with(r#"{"ok":true,"id":42,"#));
    let second = send(&mut c, r#"{"cmd":"status","id":-3}"#, 0);
    assert!(second[0].starts_with(r#"{"ok":true,"id":2,"#));
}

#[test]
fn test_status_reply() {
    let mut c = controller();
    let lines = send(&mut c, r#"{"cmd":"status","id":7,"route":"cam"}"#, 0);
    assert_eq!(
        lines,
        vec![
            String::from(r#"{"ok":true,"id":7,"subsystem":"usb","route":"cam","msg":"status"}"#),
            String::from(concat!(
                r#"{"ok":true,"id":7,"subsystem":"usb","route":"cam","#,
                r#""state":{"x":0.00,"y":0.00,"invX":false,"invY":false,"speed":90.00,"#,
                r#""moving":{"x":false,"y":false},"queue":{"mode":"step","count":0,"active":false},"#,
                r#""cfgDirty":false}}"#
            )),
        ]
    );
}

#[test]
fn test_routing_tags_are_sticky() {
    let mut c = controller();
    send(&mut c, r#"{"cmd":"status","subsystem":"ui","route":"panel"}"#, 0);
    let lines = send(&mut c, r#"{"cmd":"status"}"#, 0);
    assert!(lines[0].contains(r#""subsystem":"ui","route":"panel""#));
}

#[test]
fn test_center_completes_after_duration() {
    let mut c = controller();
    send(&mut c, r#"{"cmd":"set","axis":"xy","x":30,"y":-20,"dur":0}"#, 0);
    assert_eq!(c.scheduler().angles(), (30.0, -20.0));

    let lines = send(&mut c, r#"{"cmd":"center","axis":"xy","dur":1.0,"id":9}"#, 0);
    assert_eq!(
        lines,
        vec![String::from(r#"{"ok":true,"id":9,"subsystem":"usb","msg":"executing"}"#)]
    );

    let events = tick_until(&mut c, 10, 1000);
    assert_eq!(
        events,
        vec![
            String::from(r#"{"ok":true,"event":"done","axis":"x","ref":9,"subsystem":"usb"}"#),
            String::from(r#"{"ok":true,"event":"done","axis":"y","ref":9,"subsystem":"usb"}"#),
        ]
    );
    let status = send(&mut c, r#"{"cmd":"status"}"#, 1010);
    assert!(status[1].contains(r#""x":0.00,"y":0.00"#));
    assert_eq!(c.output().last(), Some((0.0, 0.0)));
}

#[test]
fn test_set_requires_value() {
    let mut c = controller();
    let lines = send(&mut c, r#"{"cmd":"set","axis":"x"}"#, 0);
    assert!(lines[0].contains(r#""error":"missing_value""#));
    let lines = send(&mut c, r#"{"cmd":"set"}"#, 0);
    assert!(lines[0].contains(r#""error":"missing_value""#));
}

#[test]
fn test_bad_axis_and_timing() {
    let mut c = controller();
    let lines = send(&mut c, r#"{"cmd":"set","axis":"z","value":1}"#, 0);
    assert!(lines[0].contains(r#""error":"bad_axis""#));
    let lines = send(&mut c, r#"{"cmd":"set","axis":"x","value":1,"dur":4000}"#, 0);
    assert!(lines[0].contains(r#""error":"bad_timing""#));
    let lines = send(&mut c, r#"{"cmd":"set","axis":"x","value":1,"speed":0}"#, 0);
    assert!(lines[0].contains(r#""error":"bad_timing""#));
}

#[test]
fn test_targets_are_clamped() {
    let mut c = controller();
    send(&mut c, r#"{"cmd":"set","axis":"x","value":500,"dur":0}"#, 0);
    assert_eq!(c.scheduler().angles().0, 90.0);
    send(&mut c, r#"{"cmd":"adjust","axis":"x","value":-400,"dur":0}"#, 0);
    assert_eq!(c.scheduler().angles().0, -90.0);
}

#[test]
fn test_queue_on_holds_motion() {
    let mut c = controller();
    send(&mut c, r#"{"cmd":"queue","mode":"on"}"#, 0);
    let first = send(&mut c, r#"{"cmd":"set","axis":"x","value":10,"dur":1}"#, 0);
    assert!(first[0].contains(r#""msg":"queued""#));
    assert!(first[1].contains(r#""count":1"#));
    let second = send(&mut c, r#"{"cmd":"set","axis":"x","value":20,"dur":1}"#, 0);
    assert!(second[1].contains(r#""count":2"#));

    assert_eq!(c.scheduler().queue().len(), 2);
    assert!(!c.scheduler().is_moving());
    assert_eq!(c.scheduler().angles(), (0.0, 0.0));
}

#[test]
fn test_queued_steps_report_started_and_step_done() {
    let mut c = controller();
    send(&mut c, r#"{"cmd":"set","axis":"x","value":10,"dur":0.1,"q":true,"id":5}"#, 0);
    let events = tick_until(&mut c, 0, 200);
    assert_eq!(
        events,
        vec![
            String::from(
                r#"{"ok":true,"event":"started","ref":5,"subsystem":"usb","step":{"kind":"set","axis":"x","x":10.00,"dx":100,"dy":0}}"#
            ),
            String::from(r#"{"ok":true,"event":"done","axis":"x","ref":5,"subsystem":"usb"}"#),
            String::from(r#"{"ok":true,"event":"stepDone","ref":5,"subsystem":"usb"}"#),
        ]
    );
}

#[test]
fn test_queue_capacity() {
    let mut c = controller();
    for _ in 0..QUEUE_CAPACITY {
        let lines = send(&mut c, r#"{"cmd":"center","q":true}"#, 0);
        assert!(lines[0].contains("queued"));
    }
    let lines = send(&mut c, r#"{"cmd":"center","q":true}"#, 0);
    assert_eq!(lines.len(), 1);
    assert!(lines[0].contains(r#""error":"queue_full","msg":"Queue full""#));
    assert_eq!(c.scheduler().queue().len(), QUEUE_CAPACITY);
}

#[test]
fn test_queue_mode_errors() {
    let mut c = controller();
    let lines = send(&mut c, r#"{"cmd":"queue"}"#, 0);
    assert!(lines[0].contains(r#""error":"missing_mode""#));
    let lines = send(&mut c, r#"{"cmd":"queue","mode":"sometimes"}"#, 0);
    assert!(lines[0].contains(r#""error":"bad_mode""#));
    let lines = send(&mut c, r#"{"cmd":"queue","mode":"OFF"}"#, 0);
    assert!(lines[0].contains("queue_mode_set"));
    assert_eq!(c.queue_mode(), QueueMode::Off);
}

#[test]
fn test_q_add_always_enqueues() {
    let mut c = controller();
    send(&mut c, r#"{"cmd":"queue","mode":"off"}"#, 0);
    let lines = send(&mut c, r#"{"cmd":"qAdd","cmd2":"set","axis":"y","value":15,"q":false}"#, 0);
    assert!(lines[0].contains("queued"));
    assert_eq!(c.scheduler().queue().len(), 1);

    let lines = send(&mut c, r#"{"cmd":"qAdd"}"#, 0);
    assert!(lines[0].contains(r#""error":"missing_cmd2""#));
    let lines = send(&mut c, r#"{"cmd":"qAdd","cmd2":"sweep"}"#, 0);
    assert!(lines[0].contains(r#""error":"unknown_cmd""#));
    let lines = send(
        &mut c,
        r#"{"cmd":"qAdd","cmd2":"thisisaverylongmotioncommandnamepastthirtytwo"}"#,
        0,
    );
    assert!(lines[0].contains(r#""error":"unknown_cmd""#));
    assert_eq!(c.scheduler().queue().len(), 1);
}

#[test]
fn test_q_add_checks_axis_before_cmd2_name() {
    let mut c = controller();
    let lines = send(&mut c, r#"{"cmd":"qAdd","cmd2":"sweep","axis":"z"}"#, 0);
    assert!(lines[0].contains(r#""error":"bad_axis""#));
    let lines = send(&mut c, r#"{"cmd":"qAdd","axis":"z"}"#, 0);
    assert!(lines[0].contains(r#""error":"missing_cmd2""#));
    assert!(c.scheduler().queue().is_empty());
}

#[test]
fn test_q_list_shape() {
    let mut c = controller();
    send(&mut c, r#"{"cmd":"set","axis":"xy","x":5,"y":-5,"dur":1,"q":true,"id":3}"#, 0);
    let lines = send(&mut c, r#"{"cmd":"qList","id":4}"#, 0);
    assert_eq!(
        lines,
        vec![String::from(
            r#"{"ok":true,"id":4,"subsystem":"usb","queue":{"mode":"step","count":1,"items":[{"ref":3,"kind":"set","axis":"xy","x":5.00,"y":-5.00,"dx":1000,"dy":1000}]}}"#
        )]
    );
}

#[test]
fn test_q_clear_keeps_active_step() {
    let mut c = controller();
    send(&mut c, r#"{"cmd":"set","axis":"x","value":10,"dur":1,"q":true}"#, 0);
    send(&mut c, r#"{"cmd":"set","axis":"x","value":20,"dur":1,"q":true}"#, 0);
    c.tick(0);
    send(&mut c, r#"{"cmd":"qClear"}"#, 0);
    assert!(c.scheduler().active().is_some());
    assert!(c.scheduler().queue().is_empty());

    send(&mut c, r#"{"cmd":"qAbort"}"#, 0);
    assert!(c.scheduler().active().is_none());
    assert!(!c.scheduler().is_moving());
}

#[test]
fn test_stop_all_without_flush_keeps_queue() {
    let mut c = controller();
    send(&mut c, r#"{"cmd":"center","q":true}"#, 0);
    let lines = send(&mut c, r#"{"cmd":"stopAll","flush":false}"#, 0);
    assert!(lines[0].contains(r#""msg":"stopped_all""#));
    assert_eq!(c.scheduler().queue().len(), 1);

    let lines = send(&mut c, r#"{"cmd":"stopAll"}"#, 0);
    assert!(lines[0].contains("stopped_all_flushed"));
    assert!(lines[1].contains(r#""event":"done""#));
    assert!(c.scheduler().queue().is_empty());
}

#[test]
fn test_stop_holds_current_angle() {
    let mut c = controller();
    send(&mut c, r#"{"cmd":"set","axis":"x","value":40,"dur":1}"#, 0);
    c.tick(500);
    send(&mut c, r#"{"cmd":"stop","axis":"x"}"#, 500);
    let held = c.scheduler().angles().0;
    assert!((held - 20.0).abs() < 0.01);
    c.tick(1500);
    assert_eq!(c.scheduler().angles().0, held);
}

#[test]
fn test_reset_all_zeroes_angles() {
    let mut c = controller();
    send(&mut c, r#"{"cmd":"set","axis":"xy","value":25,"dur":0}"#, 0);
    let lines = send(&mut c, r#"{"cmd":"resetAll"}"#, 0);
    assert!(lines[0].contains("reset_all_runtime"));
    assert_eq!(c.scheduler().angles(), (0.0, 0.0));
}

#[test]
fn test_invert_keeps_physical_position() {
    let mut c = controller();
    send(&mut c, r#"{"cmd":"set","axis":"x","value":30,"dur":0}"#, 0);
    assert_eq!(c.output().last(), Some((30.0, 0.0)));

    let lines = send(&mut c, r#"{"cmd":"invert","axis":"x"}"#, 0);
    assert!(lines[0].contains("invert_toggled"));
    assert!(lines[1].contains(r#""invX":true"#));
    assert!(lines[1].contains(r#""cfgDirty":true"#));
    assert_eq!(c.scheduler().angles().0, -30.0);
    assert_eq!(c.output().last(), Some((30.0, 0.0)));
}

#[test]
fn test_speed_command() {
    let mut c = controller();
    let lines = send(&mut c, r#"{"cmd":"speed"}"#, 0);
    assert!(lines[0].contains(r#""error":"missing_value""#));
    let lines = send(&mut c, r#"{"cmd":"speed","value":2000}"#, 0);
    assert!(lines[0].contains(r#""error":"bad_value""#));
    let lines = send(&mut c, r#"{"cmd":"speed","value":45}"#, 0);
    assert!(lines[0].contains("speed_set"));
    assert!(lines[1].contains(r#""speed":45.00"#));

    // Default speed now drives duration: 90 degrees at 45 deg/s
    send(&mut c, r#"{"cmd":"set","axis":"x","value":90,"q":true}"#, 0);
    let item = c.scheduler().queue().iter().next().cloned().unwrap();
    assert_eq!(item.duration_x_ms, 2000);
}

#[test]
fn test_save_and_recall_position() {
    let mut c = controller();
    let lines = send(&mut c, r#"{"cmd":"recall","slot":2}"#, 0);
    assert!(lines[0].contains(r#""error":"empty_slot""#));
    let lines = send(&mut c, r#"{"cmd":"save","slot":6}"#, 0);
    assert!(lines[0].contains(r#""error":"bad_slot""#));

    send(&mut c, r#"{"cmd":"set","axis":"xy","x":12,"y":-8,"dur":0}"#, 0);
    let lines = send(&mut c, r#"{"cmd":"save","slot":2}"#, 0);
    assert!(lines[0].contains("saved_position"));

    send(&mut c, r#"{"cmd":"center","dur":0}"#, 0);
    let lines = send(&mut c, r#"{"cmd":"recall","slot":2,"dur":0}"#, 0);
    assert!(lines[0].contains("executing"));
    assert_eq!(c.scheduler().angles(), (12.0, -8.0));
}

#[test]
fn test_persist_without_changes_writes_nothing() {
    let mut c = controller();
    let lines = send(&mut c, r#"{"cmd":"persist"}"#, 0);
    assert!(lines[0].contains(r#""msg":"no_changes""#));
    assert_eq!(c.persistence.storage().writes, 0);
}

#[test]
fn test_persist_then_reboot_restores_settings() {
    let mut c = controller();
    send(&mut c, r#"{"cmd":"speed","value":33}"#, 0);
    send(&mut c, r#"{"cmd":"invert","axis":"y"}"#, 0);
    send(&mut c, r#"{"cmd":"save","slot":1}"#, 0);
    send(&mut c, r#"{"cmd":"favSave","slot":3,"line":"{\"cmd\":\"center\"}"}"#, 0);
    let lines = send(&mut c, r#"{"cmd":"persist"}"#, 0);
    assert!(lines[0].contains(r#""msg":"persisted""#));
    assert!(lines[1].contains(r#""cfgDirty":false"#));

    let storage = core::mem::take(c.persistence.storage());
    let mut rebooted = Controller::new(RecordingOutput::default(), RecordingSink::default(), storage);
    assert!(rebooted.begin().is_ok());
    assert!(rebooted.sink().lines[0].1.contains(r#""loaded":true"#));
    let settings = rebooted.settings();
    assert_eq!(settings.default_speed, 33.0);
    assert!(settings.invert_y);
    assert!(settings.positions[0].is_some());
    assert_eq!(settings.script(2), Some(r#"{"cmd":"center"}"#));
}

#[test]
fn test_persist_failure() {
    let mut storage = MemoryStorage::default();
    storage.fail_writes = true;
    let mut c = controller_with(storage);
    send(&mut c, r#"{"cmd":"speed","value":10}"#, 0);
    let lines = send(&mut c, r#"{"cmd":"persist"}"#, 0);
    assert_eq!(lines.len(), 1);
    assert!(lines[0].contains(r#""error":"write_failed""#));
    assert!(c.settings().dirty);
}

#[test]
fn test_factory_reset() {
    let mut c = controller();
    send(&mut c, r#"{"cmd":"speed","value":10}"#, 0);
    send(&mut c, r#"{"cmd":"persist"}"#, 0);
    send(&mut c, r#"{"cmd":"set","axis":"xy","value":40,"dur":0}"#, 0);
    send(&mut c, r#"{"cmd":"center","q":true}"#, 0);

    let lines = send(&mut c, r#"{"cmd":"factoryReset"}"#, 0);
    assert!(lines[0].contains(r#""msg":"factory_reset""#));
    assert_eq!(c.scheduler().angles(), (0.0, 0.0));
    assert!(c.scheduler().queue().is_empty());
    assert_eq!(c.settings().default_speed, 90.0);
    assert!(c.persistence.storage().entries.is_empty());
}

#[test]
fn test_factory_reset_failure_still_applies_defaults() {
    let mut storage = MemoryStorage::default();
    storage.fail_erase = true;
    let mut c = controller_with(storage);
    send(&mut c, r#"{"cmd":"speed","value":10}"#, 0);
    send(&mut c, r#"{"cmd":"set","axis":"x","value":40,"dur":0}"#, 0);
    let lines = send(&mut c, r#"{"cmd":"factoryReset"}"#, 0);
    assert_eq!(lines.len(), 1);
    assert!(lines[0].contains(r#""error":"clear_failed""#));
    assert_eq!(c.settings().default_speed, 90.0);
    assert_eq!(c.scheduler().angles().0, 40.0);
}

#[test]
fn test_fav_save_rejects_forbidden_commands() {
    let mut c = controller();
    let lines = send(
        &mut c,
        r#"{"cmd":"favSave","slot":1,"script":"{\"cmd\":\"center\"}\\n{\"cmd\":\"persist\"}"}"#,
        0,
    );
    assert_eq!(lines.len(), 1);
    assert!(lines[0].contains(r#""error":"disallowed""#));
    assert_eq!(c.settings().script(0), None);
    assert!(!c.settings().dirty);
}

#[test]
fn test_fav_save_validation() {
    let mut c = controller();
    let lines = send(&mut c, r#"{"cmd":"favSave","slot":1}"#, 0);
    assert!(lines[0].contains(r#""error":"missing_value""#));
    let lines = send(&mut c, r#"{"cmd":"favSave","slot":1,"line":"  \\n  "}"#, 0);
    assert!(lines[0].contains(r#""error":"empty_script""#));
    let lines = send(&mut c, r#"{"cmd":"favSave","slot":0,"line":"x"}"#, 0);
    assert!(lines[0].contains(r#""error":"bad_slot""#));
}

#[test]
fn test_fav_list_and_clear() {
    let mut c = controller();
    send(&mut c, r#"{"cmd":"favSave","slot":2,"script":"{\"cmd\":\"center\"}\\n{\"cmd\":\"stop\"}"}"#, 0);
    let lines = send(&mut c, r#"{"cmd":"favList","id":8}"#, 0);
    assert_eq!(
        lines,
        vec![String::from(concat!(
            r#"{"ok":true,"id":8,"subsystem":"usb","favorites":["#,
            r#"{"slot":1,"valid":false},"#,
            r#"{"slot":2,"valid":true,"preview":"{\"cmd\":\"center\"}\\n{\"cmd\":\"stop\"}"},"#,
            r#"{"slot":3,"valid":false},{"slot":4,"valid":false},{"slot":5,"valid":false}]}"#
        ))]
    );

    let lines = send(&mut c, r#"{"cmd":"favClear","slot":0}"#, 0);
    assert!(lines[0].contains("fav_cleared_all"));
    assert_eq!(c.settings().script(1), None);
    let lines = send(&mut c, r#"{"cmd":"favClear","slot":9}"#, 0);
    assert!(lines[0].contains(r#""error":"bad_slot""#));
}

#[test]
fn test_fav_run_queues_motion_and_restores_mode() {
    let mut c = controller();
    send(
        &mut c,
        r#"{"cmd":"favSave","slot":1,"script":"{\"cmd\":\"set\",\"axis\":\"x\",\"value\":-60,\"dur\":1.5}\\n\\n{\"cmd\":\"set\",\"axis\":\"x\",\"value\":60,\"dur\":1.5}"}"#,
        0,
    );
    let lines = send(&mut c, r#"{"cmd":"favRun","slot":1,"id":50}"#, 0);
    assert!(lines[0].contains(r#""id":50"#) && lines[0].contains("macro_running"));
    assert!(has(&lines, "macro_complete"));
    assert_eq!(c.scheduler().queue().len(), 2);
    assert_eq!(c.queue_mode(), QueueMode::Step);
    assert!(!c.is_macro_running());
}

#[test]
fn test_fav_run_respects_explicit_q_false() {
    let mut c = controller();
    send(
        &mut c,
        r#"{"cmd":"favSave","slot":1,"line":"{\"cmd\":\"set\",\"axis\":\"y\",\"value\":10,\"dur\":0,\"q\":false}"}"#,
        0,
    );
    send(&mut c, r#"{"cmd":"favRun","slot":1}"#, 0);
    assert!(c.scheduler().queue().is_empty());
    assert_eq!(c.scheduler().angles().1, 10.0);
}

#[test]
fn test_fav_run_too_long_runs_nothing() {
    let mut c = controller();
    let mut script = String::new();
    for _ in 0..51 {
        script.push_str(r#"{\"cmd\":\"center\"}\\n"#);
    }
    let line = format!(r#"{{"cmd":"favSave","slot":4,"script":"{}"}}"#, script);
    let saved = send(&mut c, &line, 0);
    assert!(saved[0].contains("fav_saved"));

    let lines = send(&mut c, r#"{"cmd":"favRun","slot":4}"#, 0);
    assert!(lines[0].contains("macro_running"));
    assert!(lines[1].contains(r#""error":"macro_too_long""#));
    assert!(!has(&lines, "macro_complete"));
    assert!(c.scheduler().queue().is_empty());
    assert_eq!(c.queue_mode(), QueueMode::Step);
}

#[test]
fn test_fav_run_empty_slot() {
    let mut c = controller();
    let lines = send(&mut c, r#"{"cmd":"favRun","slot":3}"#, 0);
    assert!(lines[0].contains(r#""error":"empty_slot""#));
}

#[test]
fn test_stored_fav_run_line_is_busy_not_recursive() {
    let mut c = controller();
    // Bypass the save-time check to exercise the runtime guard
    c.settings.scripts[0] = crate::config::Script::try_from(r#"{"cmd":"favRun","slot":1}"#).ok();
    let lines = send(&mut c, r#"{"cmd":"favRun","slot":1}"#, 0);
    assert!(has(&lines, r#""error":"macro_busy""#));
    assert!(has(&lines, "macro_complete"));
    assert!(!c.is_macro_running());
}

#[test]
fn test_sweep_example_enqueues_ten_steps() {
    let mut c = controller();
    let lines = send(
        &mut c,
        r#"{"cmd":"sweep","axis":"x","from":-80,"to":80,"dur":6,"loops":2,"dwell":0.2,"q":true,"id":20}"#,
        0,
    );
    assert!(lines[0].contains(r#""msg":"sweep_queued""#));
    assert!(lines[1].contains(r#""count":10"#));

    let kinds: Vec<&str> = c.scheduler().queue().iter().map(|i| i.kind.name()).collect();
    assert_eq!(
        kinds,
        [
            "sweepToFrom", "dwell", "sweepTo", "dwell", "sweepFrom", "dwell", "sweepTo", "dwell",
            "sweepFrom", "dwell"
        ]
    );
    let first = c.scheduler().queue().iter().next().unwrap();
    assert_eq!(first.id, 20);
    // 80 degrees at the default 90 deg/s
    assert_eq!(first.duration_x_ms, 889);
    assert_eq!(first.duration_y_ms, 0);
}

#[test]
fn test_sweep_chunk_does_not_fit() {
    let mut c = controller();
    let lines = send(
        &mut c,
        r#"{"cmd":"sweep","axis":"x","from":-80,"to":80,"dur":6,"loops":0,"dwell":0.2}"#,
        0,
    );
    assert_eq!(lines.len(), 1);
    assert!(lines[0].contains(r#""error":"queue_full","msg":"Not enough queue space for sweep steps""#));
    assert!(c.scheduler().queue().is_empty());
}

#[test]
fn test_step_timeout_reports_fault() {
    let mut c = controller();
    send(&mut c, r#"{"cmd":"set","axis":"x","value":10,"dur":1,"q":true,"id":11}"#, 0);
    send(&mut c, r#"{"cmd":"set","axis":"x","value":20,"dur":1,"q":true}"#, 0);
    c.tick(0);
    send(&mut c, r#"{"cmd":"stop","axis":"x"}"#, 100);

    let events = tick_until(&mut c, 10, 3010);
    assert!(has(
        &events,
        r#"{"ok":false,"event":"fault","error":"step_timeout","ref":11,"subsystem":"usb","msg":"Queued step timed out; aborted"}"#
    ));
    assert!(c.scheduler().queue().is_empty());
    assert!(c.scheduler().active().is_none());
}

#[test]
fn test_ble_origin_is_mirrored() {
    let mut c = controller();
    c.handle(r#"{"cmd":"status"}"#, Transport::Ble, 0);
    assert_eq!(c.sink().on(Transport::Usb).len(), 2);
    assert_eq!(c.sink().on(Transport::Ble).len(), 2);
    assert!(c.sink().on(Transport::Ble)[0].contains(r#""subsystem":"ble""#));
}

#[test]
fn test_usb_origin_not_mirrored() {
    let mut c = controller();
    c.on_transport_event(TransportEvent::Connected, Transport::Ble);
    c.handle(r#"{"cmd":"status"}"#, Transport::Usb, 0);
    assert!(c.sink().on(Transport::Ble).is_empty());
}

#[test]
fn test_ble_disconnect_keeps_motion() {
    let mut c = controller();
    c.handle(r#"{"cmd":"set","axis":"x","value":10,"dur":1}"#, Transport::Ble, 0);
    c.on_transport_event(TransportEvent::Disconnected, Transport::Ble);
    assert!(!c.links().ble_connected);
    assert!(c.scheduler().is_moving());
    c.sink().lines.clear();

    c.tick(1000);
    assert_eq!(c.scheduler().angles().0, 10.0);
    assert_eq!(c.sink().on(Transport::Usb).len(), 1);
    assert!(c.sink().on(Transport::Ble).is_empty());
}

#[test]
fn test_help_block() {
    let mut c = controller();
    let lines = send(&mut c, r#"{"cmd":"examples","id":2}"#, 0);
    assert_eq!(lines[0], r#"{"ok":true,"id":2,"subsystem":"usb","msg":"examples"}"#);
    assert_eq!(
        lines[1],
        r#"{"ok":true,"id":2,"event":"exampleLine","n":0,"subsystem":"usb","line":"Examples (NO id):"}"#
    );
    assert_eq!(
        lines[2],
        r#"{"ok":true,"id":2,"event":"exampleLine","n":1,"subsystem":"usb","line":{"cmd":"commands"}}"#
    );
    let last = lines.last().unwrap();
    assert_eq!(
        last,
        &format!(
            r#"{{"ok":true,"id":2,"event":"exampleLineDone","count":{},"subsystem":"usb"}}"#,
            super::info::EXAMPLES_LINES.len()
        )
    );
}

#[test]
fn test_overlong_line_is_truncated_not_rejected() {
    let mut c = controller();
    let mut line = String::from(r#"{"cmd":"status","pad":""#);
    line.push_str(&"x".repeat(5000));
    line.push_str("\"}");
    let lines = send(&mut c, &line, 0);
    assert!(lines[0].contains(r#""msg":"status""#));
}

#[test]
fn test_storage_keys_written_for_favorites_only() {
    let mut c = controller();
    send(&mut c, r#"{"cmd":"favSave","slot":5,"line":"{\"cmd\":\"center\"}"}"#, 0);
    send(&mut c, r#"{"cmd":"persist"}"#, 0);
    let storage = c.persistence.storage();
    assert!(storage.get(StorageKey::Config).is_some());
    assert!(storage.get(StorageKey::Favorite(5)).is_some());
    assert!(storage.get(StorageKey::Favorite(1)).is_none());
}
