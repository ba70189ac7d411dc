//! Position favorites (`save`, `recall`) and command favorites
//! (`favList`, `favClear`, `favSave`, `favRun`)

use pantilt_hal::{FlashStorage, FAVORITE_SLOTS};
use pantilt_protocol::reply::{self, FavoriteSummary};
use pantilt_protocol::text::{script_lines, unescape_script};
use pantilt_protocol::{int_field, string_field, MAX_LINE_LEN};

use super::dispatch::{Command, Request, CMD_NAME_LEN};
use super::motion::{axis_mask, timing};
use super::Controller;
use crate::config::{slot_index, Position, Script, MAX_SCRIPT_LEN};
use crate::error::{CommandError, CommandResult, ErrorCode};
use crate::motion::{resolve_durations, AxisMask};
use crate::scheduler::{QueueItem, StepKind};
use crate::traits::{LineSink, ServoOutput};

/// Raw `"cmd":"..."` spellings a favorite may not contain (lowercase)
const FORBIDDEN_PATTERNS: [&str; 3] = [
    "\"cmd\":\"persist\"",
    "\"cmd\":\"factoryreset\"",
    "\"cmd\":\"favrun\"",
];

fn contains_ignore_case(haystack: &str, needle: &str) -> bool {
    let (hay, needle) = (haystack.as_bytes(), needle.as_bytes());
    if needle.is_empty() {
        return true;
    }
    if needle.len() > hay.len() {
        return false;
    }
    hay.windows(needle.len())
        .any(|window| window.eq_ignore_ascii_case(needle))
}

/// Whether one script line would run a command favorites may not use
///
/// Checks the raw text as well as the `cmd` value the field scanner sees,
/// so spacing around the colon does not slip through.
pub(crate) fn is_forbidden_line(line: &str) -> bool {
    if FORBIDDEN_PATTERNS
        .iter()
        .any(|pattern| contains_ignore_case(line, pattern))
    {
        return true;
    }
    string_field::<CMD_NAME_LEN>(line, "cmd")
        .and_then(|name| Command::parse(&name))
        .is_some_and(Command::is_macro_forbidden)
}

fn slot_field(req: &Request<'_>, err: CommandError) -> CommandResult<usize> {
    int_field(req.line, "slot")
        .and_then(slot_index)
        .ok_or(err)
}

impl<O, K, S> Controller<O, K, S>
where
    O: ServoOutput,
    K: LineSink,
    S: FlashStorage,
{
    pub(super) fn cmd_save_position(&mut self, req: &Request<'_>) -> CommandResult {
        let index = slot_field(
            req,
            CommandError::new(ErrorCode::BadSlot, "save requires slot 1..5"),
        )?;
        let (x, y) = self.scheduler.angles();
        self.settings.positions[index] = Some(Position { x, y });
        self.settings.touch();
        self.ack_done(req, "saved_position");
        Ok(())
    }

    pub(super) fn cmd_recall(&mut self, req: &Request<'_>) -> CommandResult {
        let index = slot_field(
            req,
            CommandError::new(ErrorCode::BadSlot, "recall requires slot 1..5"),
        )?;
        let position = self.settings.positions[index]
            .ok_or(CommandError::new(ErrorCode::EmptySlot, "slot not saved yet"))?;
        let mask = axis_mask(req.line, AxisMask::XY)?;

        let target = (position.x, position.y);
        let (duration_x_ms, duration_y_ms) = resolve_durations(
            mask,
            self.scheduler.angles(),
            target,
            timing(req.line),
            self.settings.default_speed,
        )
        .ok_or(CommandError::bad_timing())?;

        let item = QueueItem {
            id: req.id,
            routing: req.routing.clone(),
            kind: StepKind::Recall,
            mask,
            target_x: target.0,
            target_y: target.1,
            duration_x_ms,
            duration_y_ms,
            expected_end_ms: None,
        };
        self.submit_step(req, item)
    }

    pub(super) fn cmd_fav_list(&mut self, req: &Request<'_>) -> CommandResult {
        let settings = &self.settings;
        let line = reply::favorite_list(
            req.id,
            &req.routing.tags,
            (0..FAVORITE_SLOTS).map(|index| FavoriteSummary {
                slot: index + 1,
                script: settings.script(index),
            }),
        );
        self.emit(req.routing.dests, line);
        Ok(())
    }

    /// `favClear`: slot 1..5, or 0 for all slots
    pub(super) fn cmd_fav_clear(&mut self, req: &Request<'_>) -> CommandResult {
        let slot = int_field(req.line, "slot")
            .filter(|slot| (0..=FAVORITE_SLOTS as i32).contains(slot))
            .ok_or(CommandError::new(
                ErrorCode::BadSlot,
                "favClear requires slot 0..5 (0 clears all)",
            ))?;

        if slot == 0 {
            for script in self.settings.scripts.iter_mut() {
                *script = None;
            }
            self.settings.touch();
            self.ack_done(req, "fav_cleared_all");
            return Ok(());
        }

        self.settings.scripts[(slot - 1) as usize] = None;
        self.settings.touch();
        self.ack_done(req, "fav_cleared");
        Ok(())
    }

    pub(super) fn cmd_fav_save(&mut self, req: &Request<'_>) -> CommandResult {
        let index = slot_field(
            req,
            CommandError::new(ErrorCode::BadSlot, "favSave requires slot 1..5"),
        )?;

        let raw = string_field::<MAX_LINE_LEN>(req.line, "script")
            .or_else(|| string_field::<MAX_LINE_LEN>(req.line, "line"))
            .ok_or(CommandError::new(
                ErrorCode::MissingValue,
                "favSave requires \"line\" or \"script\"",
            ))?;

        let too_long = CommandError::new(ErrorCode::TooLong, "Script too long");
        let decoded = unescape_script::<MAX_SCRIPT_LEN>(&raw).ok_or(too_long)?;
        let script = decoded.trim();
        if script.is_empty() {
            return Err(CommandError::new(
                ErrorCode::EmptyScript,
                "Provided line/script is empty",
            ));
        }
        if script.len() > MAX_SCRIPT_LEN {
            return Err(too_long);
        }
        if script_lines(script).any(is_forbidden_line) {
            return Err(CommandError::new(
                ErrorCode::Disallowed,
                "Favorite cannot include persist/factoryReset/favRun",
            ));
        }

        self.settings.scripts[index] = Script::try_from(script).ok();
        self.settings.touch();
        self.ack_done(req, "fav_saved");
        Ok(())
    }

    pub(super) fn cmd_fav_run(&mut self, req: &Request<'_>) -> CommandResult {
        let index = slot_field(
            req,
            CommandError::new(ErrorCode::BadSlot, "favRun requires slot 1..5"),
        )?;
        let script: Script = self
            .settings
            .script(index)
            .and_then(|s| Script::try_from(s).ok())
            .ok_or(CommandError::new(ErrorCode::EmptySlot, "favorite slot is empty"))?;

        self.ack(req, "macro_running");
        self.run_macro(req, &script)?;
        self.ack_done(req, "macro_complete");
        Ok(())
    }
}
