//! Motion steps

use pantilt_protocol::{Routing, StepSummary};

use crate::motion::AxisMask;

/// What produced a step
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum StepKind {
    Set,
    Adjust,
    Center,
    Recall,
    /// Sweep: move from the current position to the sweep start
    SweepToFrom,
    /// Sweep: leg toward the sweep end
    SweepTo,
    /// Sweep: leg back to the sweep start
    SweepFrom,
    /// Sweep: hold position
    Dwell,
}

impl StepKind {
    /// Wire name
    pub fn name(self) -> &'static str {
        match self {
            StepKind::Set => "set",
            StepKind::Adjust => "adjust",
            StepKind::Center => "center",
            StepKind::Recall => "recall",
            StepKind::SweepToFrom => "sweepToFrom",
            StepKind::SweepTo => "sweepTo",
            StepKind::SweepFrom => "sweepFrom",
            StepKind::Dwell => "dwell",
        }
    }
}

/// One commanded motion target with its routing
#[derive(Debug, Clone, PartialEq)]
pub struct QueueItem {
    /// Request id (explicit or auto-assigned)
    pub id: u32,
    /// Where events about this step go
    pub routing: Routing,
    pub kind: StepKind,
    pub mask: AxisMask,
    pub target_x: f32,
    pub target_y: f32,
    pub duration_x_ms: u32,
    pub duration_y_ms: u32,
    /// Deadline, set when the step becomes active
    pub expected_end_ms: Option<u32>,
}

impl QueueItem {
    /// Longest duration among the axes the step drives
    pub fn longest_ms(&self) -> u32 {
        let x = if self.mask.x { self.duration_x_ms } else { 0 };
        let y = if self.mask.y { self.duration_y_ms } else { 0 };
        x.max(y)
    }

    /// Wire summary for `started` events and `qList`
    pub fn summary(&self) -> StepSummary {
        StepSummary {
            ref_id: self.id,
            kind: self.kind.name(),
            use_x: self.mask.x,
            use_y: self.mask.y,
            x: self.target_x,
            y: self.target_y,
            dx: self.duration_x_ms,
            dy: self.duration_y_ms,
        }
    }
}

/// The step currently driving the axes
#[derive(Debug, Clone, PartialEq)]
pub struct ActiveStep {
    pub item: QueueItem,
    pub x_done: bool,
    pub y_done: bool,
}

impl ActiveStep {
    /// Both axes have completed
    pub fn is_done(&self) -> bool {
        self.x_done && self.y_done
    }
}
