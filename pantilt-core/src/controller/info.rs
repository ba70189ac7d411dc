//! Informational commands: `commands`, `help`, `examples`, `status`

use pantilt_hal::FlashStorage;
use pantilt_protocol::reply;

use super::dispatch::{Command, Request};
use super::Controller;
use crate::error::CommandResult;
use crate::traits::{LineSink, ServoOutput};

pub(crate) const COMMANDS_LINES: &[&str] = &[
    "Info: commands, help, examples, status",
    "Motion: set, adjust, center, stop, stopAll, resetAll, invert, speed",
    "Position favs: save, recall",
    "Command favs: favSave, favRun, favList, favClear",
    "Queue: queue, qAdd, qClear, qAbort, qStatus, qList",
    "Macro: sweep",
    "Persistence: persist, factoryReset",
];

pub(crate) const HELP_LINES: &[&str] = &[
    r#"Protocol: JSONL (one JSON object per line). Required field: "cmd"."#,
    "Key fields: axis, value/x/y, dur, speed, q, id, subsystem, route",
    "Ranges: position -90..+90, speed 0.1..1000, dur 0..3600",
    "Commands: commands, help, examples, status",
    "Motion: set, adjust, center, stop, stopAll, resetAll, invert, speed",
    "Favorites: save, recall, favSave, favRun, favList, favClear",
    "Queue: queue(off|on|step), qAdd, qClear, qAbort, qStatus, qList",
    "Macro: sweep",
    "Persistence: persist, factoryReset",
];

pub(crate) const EXAMPLES_LINES: &[&str] = &[
    "Examples (NO id):",
    r#"{"cmd":"commands"}"#,
    r#"{"cmd":"status"}"#,
    r#"{"cmd":"speed","value":120}"#,
    r#"{"cmd":"center","axis":"xy","dur":1.0}"#,
    r#"{"cmd":"set","axis":"x","value":45,"dur":0.7}"#,
    r#"{"cmd":"adjust","axis":"y","value":-10,"speed":120}"#,
    r#"{"cmd":"invert","axis":"x"}"#,
    r#"{"cmd":"save","slot":1}"#,
    r#"{"cmd":"recall","slot":1,"dur":1.2}"#,
    "Queue sequences:",
    r#"{"cmd":"queue","mode":"on"}"#,
    r#"{"cmd":"set","axis":"x","value":-60,"dur":1.5}"#,
    r#"{"cmd":"set","axis":"x","value":60,"dur":1.5}"#,
    r#"{"cmd":"set","axis":"xy","x":0,"y":-20,"dur":1.0}"#,
    r#"{"cmd":"stopAll"}"#,
    "Sweep:",
    r#"{"cmd":"queue","mode":"step"}"#,
    r#"{"cmd":"sweep","axis":"x","from":-80,"to":80,"dur":6,"loops":2,"dwell":0.2,"q":true}"#,
    "Command favorites (macros):",
    r#"{"cmd":"favSave","slot":1,"line":"{\"cmd\":\"center\",\"axis\":\"xy\",\"dur\":1.0}"}"#,
    r#"{"cmd":"favSave","slot":2,"script":"{\"cmd\":\"queue\",\"mode\":\"on\"}\\n{\"cmd\":\"set\",\"axis\":\"x\",\"value\":-60,\"dur\":1.5}\\n{\"cmd\":\"set\",\"axis\":\"x\",\"value\":60,\"dur\":1.5}\\n{\"cmd\":\"stopAll\"}"}"#,
    r#"{"cmd":"favRun","slot":2}"#,
    r#"{"cmd":"favList"}"#,
    r#"{"cmd":"favClear","slot":2}"#,
    "Persistence:",
    r#"{"cmd":"persist"}"#,
    r#"{"cmd":"factoryReset"}"#,
];

/// Text block for an informational command: ack message, per-line event,
/// closing event and the lines themselves
fn text_block(command: Command) -> (&'static str, &'static str, &'static str, &'static [&'static str]) {
    match command {
        Command::Help => ("help", "helpLine", "helpLineDone", HELP_LINES),
        Command::Examples => ("examples", "exampleLine", "exampleLineDone", EXAMPLES_LINES),
        _ => ("commands", "commandsLine", "commandsLineDone", COMMANDS_LINES),
    }
}

impl<O, K, S> Controller<O, K, S>
where
    O: ServoOutput,
    K: LineSink,
    S: FlashStorage,
{
    pub(super) fn cmd_text_block(&mut self, command: Command, req: &Request<'_>) -> CommandResult {
        let (msg, event, done_event, lines) = text_block(command);
        self.ack(req, msg);
        for (n, text) in lines.iter().enumerate() {
            self.emit(
                req.routing.dests,
                reply::text_line(req.id, event, n as u32, &req.routing.tags, text),
            );
        }
        self.emit(
            req.routing.dests,
            reply::text_done(req.id, done_event, lines.len() as u32, &req.routing.tags),
        );
        Ok(())
    }

    /// `status` and `qStatus`: ack then a plain snapshot
    pub(super) fn cmd_status(&mut self, req: &Request<'_>, msg: &str) -> CommandResult {
        self.ack(req, msg);
        self.send_state(req);
        Ok(())
    }
}
