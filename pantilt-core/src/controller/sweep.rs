//! `sweep`: expand a back-and-forth pattern into queued steps

use pantilt_hal::FlashStorage;
use pantilt_protocol::{int_field, number_field};

use super::dispatch::Request;
use super::motion::axis_mask;
use super::Controller;
use crate::error::{CommandError, CommandResult, ErrorCode};
use crate::motion::{clamp_angle, duration_from_speed, seconds_to_ms, AxisMask, MAX_DURATION_S};
use crate::scheduler::{QueueItem, StepKind};
use crate::traits::{LineSink, ServoOutput};

/// Upper bound on `loops`
pub const MAX_SWEEP_LOOPS: i32 = 1_000_000;

/// Cycles attempted when `loops` is 0 ("run until stopped")
pub const CHUNK_CYCLES: u32 = 1000;

/// Upper bound on `dwell` in seconds
pub const MAX_DWELL_S: f32 = 60.0;

/// Validated sweep request
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SweepPlan {
    pub mask: AxisMask,
    pub from: f32,
    pub to: f32,
    /// Duration of each leg
    pub leg_ms: u32,
    /// Hold after every leg (0 = no dwell steps)
    pub dwell_ms: u32,
    /// Requested loops; 0 means a chunk of [`CHUNK_CYCLES`]
    pub loops: u32,
}

impl SweepPlan {
    /// Read and validate the sweep fields of a request
    pub fn parse(line: &str) -> Result<Self, CommandError> {
        let mask = axis_mask(line, AxisMask::X)?;

        let (from, to) = match (number_field(line, "from"), number_field(line, "to")) {
            (Some(from), Some(to)) => (clamp_angle(from), clamp_angle(to)),
            _ => {
                return Err(CommandError::new(
                    ErrorCode::MissingValue,
                    "sweep requires from and to",
                ))
            }
        };

        let dur = number_field(line, "dur")
            .filter(|d| *d > 0.0 && *d <= MAX_DURATION_S)
            .ok_or(CommandError::new(
                ErrorCode::BadDur,
                "sweep dur must be 0<dur<=3600 seconds",
            ))?;

        let loops = int_field(line, "loops")
            .unwrap_or(1)
            .clamp(0, MAX_SWEEP_LOOPS) as u32;
        let dwell = number_field(line, "dwell")
            .unwrap_or(0.0)
            .clamp(0.0, MAX_DWELL_S);

        Ok(Self {
            mask,
            from,
            to,
            leg_ms: seconds_to_ms(dur),
            dwell_ms: seconds_to_ms(dwell),
            loops,
        })
    }

    /// Number of to/from leg pairs that will be queued
    pub fn cycles(&self) -> u32 {
        if self.loops == 0 {
            CHUNK_CYCLES
        } else {
            self.loops
        }
    }

    /// Total queue slots the sweep needs
    pub fn step_count(&self) -> u64 {
        let legs = 1 + 2 * self.cycles() as u64;
        if self.dwell_ms > 0 {
            legs * 2
        } else {
            legs
        }
    }
}

impl<O, K, S> Controller<O, K, S>
where
    O: ServoOutput,
    K: LineSink,
    S: FlashStorage,
{
    pub(super) fn cmd_sweep(&mut self, req: &Request<'_>) -> CommandResult {
        let plan = SweepPlan::parse(req.line)?;
        if plan.step_count() > self.scheduler.queue().free() as u64 {
            return Err(CommandError::new(
                ErrorCode::QueueFull,
                "Not enough queue space for sweep steps",
            ));
        }

        let mask = plan.mask;
        let (cur_x, cur_y) = self.scheduler.angles();
        let pick = |value: f32, current: f32, selected: bool| if selected { value } else { current };
        let start = (pick(plan.from, cur_x, mask.x), pick(plan.from, cur_y, mask.y));
        let end = (pick(plan.to, cur_x, mask.x), pick(plan.to, cur_y, mask.y));

        let speed = self.settings.default_speed;
        let approach = (
            if mask.x { duration_from_speed(cur_x, start.0, speed) } else { 0 },
            if mask.y { duration_from_speed(cur_y, start.1, speed) } else { 0 },
        );
        self.push_sweep_step(req, req.id, StepKind::SweepToFrom, mask, start, approach)?;
        self.push_dwell(req, &plan, start)?;

        let leg = (
            if mask.x { plan.leg_ms } else { 0 },
            if mask.y { plan.leg_ms } else { 0 },
        );
        for _ in 0..plan.cycles() {
            let id = self.next_auto_id();
            self.push_sweep_step(req, id, StepKind::SweepTo, mask, end, leg)?;
            self.push_dwell(req, &plan, end)?;
            let id = self.next_auto_id();
            self.push_sweep_step(req, id, StepKind::SweepFrom, mask, start, leg)?;
            self.push_dwell(req, &plan, start)?;
        }

        self.ack(
            req,
            if plan.loops == 0 {
                "sweep_queued_chunk"
            } else {
                "sweep_queued"
            },
        );
        self.send_state(req);
        Ok(())
    }

    fn push_dwell(&mut self, req: &Request<'_>, plan: &SweepPlan, at: (f32, f32)) -> CommandResult {
        if plan.dwell_ms == 0 {
            return Ok(());
        }
        let hold = (
            if plan.mask.x { plan.dwell_ms } else { 0 },
            if plan.mask.y { plan.dwell_ms } else { 0 },
        );
        let id = self.next_auto_id();
        self.push_sweep_step(req, id, StepKind::Dwell, plan.mask, at, hold)
    }

    fn push_sweep_step(
        &mut self,
        req: &Request<'_>,
        id: u32,
        kind: StepKind,
        mask: AxisMask,
        target: (f32, f32),
        durations: (u32, u32),
    ) -> CommandResult {
        let item = QueueItem {
            id,
            routing: req.routing.clone(),
            kind,
            mask,
            target_x: target.0,
            target_y: target.1,
            duration_x_ms: durations.0,
            duration_y_ms: durations.1,
            expected_end_ms: None,
        };
        self.scheduler
            .enqueue(item)
            .map_err(|_| CommandError::queue_full())
    }
}
