//! Queue policy and queue inspection commands

use pantilt_hal::FlashStorage;
use pantilt_protocol::reply::{self, QueueMode};
use pantilt_protocol::{has_string_field, string_field};

use super::dispatch::{Command, Invocation, Request, CMD_NAME_LEN};
use super::motion::axis_mask;
use super::Controller;
use crate::error::{CommandError, CommandResult, ErrorCode};
use crate::motion::AxisMask;
use crate::scheduler::QueueItem;
use crate::traits::{LineSink, ServoOutput};

impl<O, K, S> Controller<O, K, S>
where
    O: ServoOutput,
    K: LineSink,
    S: FlashStorage,
{
    /// Whether a motion request goes to the queue instead of running now
    pub(super) fn should_enqueue(&self, req: &Request<'_>) -> bool {
        let q = req.q;
        if self.macro_running || req.invocation == Invocation::MacroLine {
            return q != Some(false);
        }
        match self.queue_mode {
            QueueMode::On => q != Some(false),
            QueueMode::Off | QueueMode::Step => q == Some(true),
        }
    }

    /// Append a step, acking `queued` plus a snapshot
    pub(super) fn enqueue_step(&mut self, req: &Request<'_>, item: QueueItem) -> CommandResult {
        self.scheduler
            .enqueue(item)
            .map_err(|_| CommandError::queue_full())?;
        self.ack(req, "queued");
        self.send_state(req);
        Ok(())
    }

    pub(super) fn cmd_queue_mode(&mut self, req: &Request<'_>) -> CommandResult {
        let mode = string_field::<16>(req.line, "mode").ok_or(CommandError::new(
            ErrorCode::MissingMode,
            "queue requires mode: off|on|step",
        ))?;
        self.queue_mode = QueueMode::parse(&mode).ok_or(CommandError::new(
            ErrorCode::BadMode,
            "mode must be off|on|step",
        ))?;
        self.ack_done(req, "queue_mode_set");
        Ok(())
    }

    /// Drop pending steps; the active step keeps running
    pub(super) fn cmd_queue_clear(&mut self, req: &Request<'_>) -> CommandResult {
        self.scheduler.clear_queue();
        self.ack_done(req, "queue_cleared");
        Ok(())
    }

    pub(super) fn cmd_queue_abort(&mut self, req: &Request<'_>) -> CommandResult {
        self.scheduler.abort_all();
        self.apply_outputs();
        self.ack_done(req, "aborted_all");
        Ok(())
    }

    pub(super) fn cmd_queue_list(&mut self, req: &Request<'_>) -> CommandResult {
        let queue = self.scheduler.queue();
        let line = reply::queue_list(
            req.id,
            &req.routing.tags,
            self.queue_mode,
            queue.len(),
            queue.iter().map(QueueItem::summary),
        );
        self.emit(req.routing.dests, line);
        Ok(())
    }

    /// `qAdd`: build a motion step from `cmd2` and always enqueue it
    pub(super) fn cmd_queue_add(&mut self, req: &Request<'_>) -> CommandResult {
        let unknown = CommandError::new(ErrorCode::UnknownCmd, "Unknown motion cmd");
        let name = match string_field::<CMD_NAME_LEN>(req.line, "cmd2") {
            Some(name) => Some(name),
            None if has_string_field(req.line, "cmd2") => None,
            None => return Err(CommandError::new(ErrorCode::MissingCmd2, "qAdd requires cmd2")),
        };
        axis_mask(req.line, AxisMask::XY)?;
        let command = match name.as_deref().and_then(Command::parse) {
            Some(c @ (Command::Set | Command::Adjust | Command::Center)) => c,
            _ => return Err(unknown),
        };
        let item = self.build_step(command, req)?;
        self.enqueue_step(req, item)
    }
}
