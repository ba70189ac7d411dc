//! Motion commands and step construction

use pantilt_hal::FlashStorage;
use pantilt_protocol::{bool_field, number_field, string_field};

use super::dispatch::{Command, Request};
use super::Controller;
use crate::error::{CommandError, CommandResult, ErrorCode};
use crate::motion::{clamp_angle, resolve_durations, speed_in_range, AxisMask, Timing};
use crate::scheduler::{QueueItem, StepKind};
use crate::traits::{LineSink, ServoOutput};

/// Longest `axis` value that is inspected
const AXIS_FIELD_LEN: usize = 16;

/// Parse the `axis` field, falling back to `default` when absent
pub(super) fn axis_mask(line: &str, default: AxisMask) -> Result<AxisMask, CommandError> {
    match string_field::<AXIS_FIELD_LEN>(line, "axis") {
        Some(name) => AxisMask::parse(&name).ok_or(CommandError::bad_axis()),
        None => Ok(default),
    }
}

/// `dur` and `speed` fields of a request
pub(super) fn timing(line: &str) -> Timing {
    Timing {
        duration_s: number_field(line, "dur"),
        speed: number_field(line, "speed"),
    }
}

impl<O, K, S> Controller<O, K, S>
where
    O: ServoOutput,
    K: LineSink,
    S: FlashStorage,
{
    /// Build a `set`/`adjust`/`center` step from the request fields
    pub(super) fn build_step(&self, command: Command, req: &Request<'_>) -> CommandResult<QueueItem> {
        let mask = axis_mask(req.line, AxisMask::XY)?;
        let (cur_x, cur_y) = self.scheduler.angles();

        let (kind, target_x, target_y) = match command {
            Command::Center => (StepKind::Center, 0.0, 0.0),
            _ => {
                let adjust = command == Command::Adjust;
                let value = number_field(req.line, "value");
                let (x, y) = if mask.is_both() {
                    let x = value.or_else(|| number_field(req.line, "x"));
                    let y = value.or_else(|| number_field(req.line, "y"));
                    if x.is_none() && y.is_none() {
                        return Err(CommandError::new(
                            ErrorCode::MissingValue,
                            "For axis=xy provide x and/or y (or value for both)",
                        ));
                    }
                    (x, y)
                } else {
                    let value = value.ok_or(CommandError::new(
                        ErrorCode::MissingValue,
                        "Provide: value (degrees)",
                    ))?;
                    if mask.x {
                        (Some(value), None)
                    } else {
                        (None, Some(value))
                    }
                };
                let resolve = |current: f32, field: Option<f32>| match field {
                    Some(v) if adjust => current + v,
                    Some(v) => v,
                    None => current,
                };
                let kind = if adjust { StepKind::Adjust } else { StepKind::Set };
                (kind, resolve(cur_x, x), resolve(cur_y, y))
            }
        };

        let target_x = clamp_angle(target_x);
        let target_y = clamp_angle(target_y);
        let (duration_x_ms, duration_y_ms) = resolve_durations(
            mask,
            (cur_x, cur_y),
            (target_x, target_y),
            timing(req.line),
            self.settings.default_speed,
        )
        .ok_or(CommandError::bad_timing())?;

        Ok(QueueItem {
            id: req.id,
            routing: req.routing.clone(),
            kind,
            mask,
            target_x,
            target_y,
            duration_x_ms,
            duration_y_ms,
            expected_end_ms: None,
        })
    }

    /// Queue or run a step according to the enqueue policy
    pub(super) fn submit_step(&mut self, req: &Request<'_>, item: QueueItem) -> CommandResult {
        if self.should_enqueue(req) {
            return self.enqueue_step(req, item);
        }
        self.scheduler.execute_direct(item, req.now_ms);
        self.apply_outputs();
        self.ack(req, "executing");
        Ok(())
    }

    pub(super) fn cmd_motion(&mut self, command: Command, req: &Request<'_>) -> CommandResult {
        let item = self.build_step(command, req)?;
        self.submit_step(req, item)
    }

    pub(super) fn cmd_stop(&mut self, req: &Request<'_>) -> CommandResult {
        let mask = axis_mask(req.line, AxisMask::XY)?;
        self.scheduler.stop_axes(mask);
        self.apply_outputs();
        self.ack_done(req, "stopped");
        Ok(())
    }

    pub(super) fn cmd_stop_all(&mut self, req: &Request<'_>) -> CommandResult {
        let flush = bool_field(req.line, "flush").unwrap_or(true);
        self.scheduler.stop_all(flush);
        self.apply_outputs();
        self.ack_done(
            req,
            if flush {
                "stopped_all_flushed"
            } else {
                "stopped_all"
            },
        );
        Ok(())
    }

    pub(super) fn cmd_reset_all(&mut self, req: &Request<'_>) -> CommandResult {
        self.scheduler.abort_all();
        self.scheduler.reset_angles(0.0, 0.0);
        self.apply_outputs();
        self.ack_done(req, "reset_all_runtime");
        Ok(())
    }

    /// Toggle inversion; the logical frame is mirrored so the servo holds still
    pub(super) fn cmd_invert(&mut self, req: &Request<'_>) -> CommandResult {
        let mask = axis_mask(req.line, AxisMask::XY)?;
        if mask.x {
            self.settings.invert_x = !self.settings.invert_x;
        }
        if mask.y {
            self.settings.invert_y = !self.settings.invert_y;
        }
        self.scheduler.negate(mask);
        self.settings.touch();
        self.apply_outputs();
        self.ack_done(req, "invert_toggled");
        Ok(())
    }

    pub(super) fn cmd_speed(&mut self, req: &Request<'_>) -> CommandResult {
        let speed = number_field(req.line, "value").ok_or(CommandError::new(
            ErrorCode::MissingValue,
            "speed requires value (deg/sec)",
        ))?;
        if !speed_in_range(speed) {
            return Err(CommandError::new(ErrorCode::BadValue, "speed out of range"));
        }
        self.settings.default_speed = speed;
        self.settings.touch();
        self.ack_done(req, "speed_set");
        Ok(())
    }
}
