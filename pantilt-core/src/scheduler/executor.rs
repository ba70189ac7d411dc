//! Step scheduler
//!
//! Owns both axes, the pending queue and the active step. Each call to
//! [`Scheduler::tick`] advances interpolation and reports the events the
//! controller turns into reply lines.

use heapless::Vec;
use pantilt_protocol::{Routing, StepSummary, Transport};

use super::queue::StepQueue;
use super::step::{ActiveStep, QueueItem};
use crate::motion::{Axis, AxisMask, AxisState, AxisUpdate};

/// Slack added to a step's longest duration before it is faulted
pub const STEP_TIMEOUT_GRACE_MS: u32 = 2000;

/// Upper bound on events produced by a single tick
pub const MAX_TICK_EVENTS: usize = 8;

/// Something the scheduler observed while advancing
#[derive(Debug, Clone, PartialEq)]
pub enum MotionEvent {
    /// An axis reached its target
    AxisDone {
        axis: Axis,
        ref_id: u32,
        routing: Routing,
    },
    /// A queued step became active
    Started { step: StepSummary, routing: Routing },
    /// The active step completed on every axis it drives
    StepDone { ref_id: u32, routing: Routing },
    /// The active step overran its deadline; motion and queue were aborted
    StepTimeout { ref_id: u32, routing: Routing },
}

/// Output of one [`Scheduler::tick`]
#[derive(Debug, Default)]
pub struct TickOutcome {
    pub events: Vec<MotionEvent, MAX_TICK_EVENTS>,
    /// Some axis angle may have changed
    pub moved: bool,
}

impl TickOutcome {
    fn push(&mut self, event: MotionEvent) {
        // Bounded by construction: two axis events plus at most three step events
        let _ = self.events.push(event);
    }
}

/// Axes plus the step queue
#[derive(Debug)]
pub struct Scheduler {
    x: AxisState,
    y: AxisState,
    queue: StepQueue,
    active: Option<ActiveStep>,
    direct_routing: Routing,
}

impl Default for Scheduler {
    fn default() -> Self {
        Self::new()
    }
}

fn deadline_passed(now_ms: u32, deadline_ms: u32) -> bool {
    (now_ms.wrapping_sub(deadline_ms) as i32) > 0
}

impl Scheduler {
    pub fn new() -> Self {
        Self {
            x: AxisState::new(),
            y: AxisState::new(),
            queue: StepQueue::new(),
            active: None,
            direct_routing: Routing::for_origin(Transport::Usb),
        }
    }

    /// State of one axis
    pub fn axis(&self, axis: Axis) -> &AxisState {
        match axis {
            Axis::X => &self.x,
            Axis::Y => &self.y,
        }
    }

    fn axis_mut(&mut self, axis: Axis) -> &mut AxisState {
        match axis {
            Axis::X => &mut self.x,
            Axis::Y => &mut self.y,
        }
    }

    /// Logical angles `(x, y)`
    pub fn angles(&self) -> (f32, f32) {
        (self.x.angle(), self.y.angle())
    }

    pub fn is_moving(&self) -> bool {
        self.x.is_moving() || self.y.is_moving()
    }

    pub fn queue(&self) -> &StepQueue {
        &self.queue
    }

    /// The step currently driving the axes
    pub fn active(&self) -> Option<&ActiveStep> {
        self.active.as_ref()
    }

    /// Append a step to the queue
    pub fn enqueue(&mut self, item: QueueItem) -> Result<(), QueueItem> {
        self.queue.push(item)
    }

    /// Drop pending steps; the active step keeps running
    pub fn clear_queue(&mut self) {
        self.queue.clear();
    }

    /// Run a step immediately, bypassing the queue
    ///
    /// Completion events for direct moves go to `item.routing` unless a
    /// queued step is active, in which case the direct move takes over that
    /// step's completion.
    pub fn execute_direct(&mut self, item: QueueItem, now_ms: u32) {
        self.direct_routing = item.routing.clone();
        self.execute(&item, now_ms);
    }

    fn execute(&mut self, item: &QueueItem, now_ms: u32) {
        self.x.stop();
        self.y.stop();
        if let Some(active) = self.active.as_mut() {
            active.x_done = !item.mask.x || item.duration_x_ms == 0;
            active.y_done = !item.mask.y || item.duration_y_ms == 0;
        }
        if item.mask.x {
            self.x
                .start_move(item.target_x, item.duration_x_ms, item.id, now_ms);
        }
        if item.mask.y {
            self.y
                .start_move(item.target_y, item.duration_y_ms, item.id, now_ms);
        }
    }

    /// Stop in-flight motion on the selected axes
    pub fn stop_axes(&mut self, mask: AxisMask) {
        if mask.x {
            self.x.stop();
        }
        if mask.y {
            self.y.stop();
        }
    }

    /// Stop both axes; with `flush`, also drop the queue and the active step
    pub fn stop_all(&mut self, flush: bool) {
        self.stop_axes(AxisMask::XY);
        if flush {
            self.queue.clear();
            self.active = None;
        }
    }

    /// Stop motion, drop the queue and the active step
    pub fn abort_all(&mut self) {
        self.stop_all(true);
    }

    /// Hard-set both angles (no interpolation)
    pub fn reset_angles(&mut self, x: f32, y: f32) {
        self.x.reset_to(x);
        self.y.reset_to(y);
    }

    /// Mirror the logical frame of the selected axes
    pub fn negate(&mut self, mask: AxisMask) {
        if mask.x {
            self.x.negate();
        }
        if mask.y {
            self.y.negate();
        }
    }

    fn completion_routing(&self) -> Routing {
        match &self.active {
            Some(active) => active.item.routing.clone(),
            None => self.direct_routing.clone(),
        }
    }

    fn advance_axis(&mut self, axis: Axis, now_ms: u32, out: &mut TickOutcome) {
        match self.axis_mut(axis).update(now_ms) {
            AxisUpdate::Idle => {}
            AxisUpdate::Moving => out.moved = true,
            AxisUpdate::Finished(ref_id) => {
                out.moved = true;
                if let Some(active) = self.active.as_mut() {
                    if active.item.mask.has(axis) {
                        match axis {
                            Axis::X => active.x_done = true,
                            Axis::Y => active.y_done = true,
                        }
                    }
                }
                let routing = self.completion_routing();
                out.push(MotionEvent::AxisDone {
                    axis,
                    ref_id,
                    routing,
                });
            }
        }
    }

    /// Advance motion to `now_ms`
    ///
    /// Order per tick: axis completions, then the active step (done or
    /// timed out), then promotion of the next queued step.
    pub fn tick(&mut self, now_ms: u32) -> TickOutcome {
        let mut out = TickOutcome::default();
        self.advance_axis(Axis::X, now_ms, &mut out);
        self.advance_axis(Axis::Y, now_ms, &mut out);

        if let Some(active) = self.active.as_ref() {
            let finished = active.is_done() && !self.is_moving();
            let overran = active
                .item
                .expected_end_ms
                .is_some_and(|end| deadline_passed(now_ms, end));
            let ref_id = active.item.id;
            let routing = active.item.routing.clone();
            if finished {
                self.active = None;
                out.push(MotionEvent::StepDone { ref_id, routing });
            } else if overran {
                self.abort_all();
                out.push(MotionEvent::StepTimeout { ref_id, routing });
                return out;
            }
        }

        self.promote(now_ms, &mut out);
        out
    }

    fn promote(&mut self, now_ms: u32, out: &mut TickOutcome) {
        if self.active.is_some() || self.is_moving() {
            return;
        }
        let Some(mut item) = self.queue.pop() else {
            return;
        };
        item.expected_end_ms = Some(
            now_ms
                .wrapping_add(item.longest_ms())
                .wrapping_add(STEP_TIMEOUT_GRACE_MS),
        );
        out.moved = true;
        out.push(MotionEvent::Started {
            step: item.summary(),
            routing: item.routing.clone(),
        });

        self.active = Some(ActiveStep {
            item: item.clone(),
            x_done: false,
            y_done: false,
        });
        self.execute(&item, now_ms);

        if !self.is_moving() && self.active.as_ref().is_some_and(ActiveStep::is_done) {
            self.active = None;
            out.push(MotionEvent::StepDone {
                ref_id: item.id,
                routing: item.routing,
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scheduler::StepKind;

    fn step(id: u32, mask: AxisMask, x: f32, y: f32, dx: u32, dy: u32) -> QueueItem {
        QueueItem {
            id,
            routing: Routing::for_origin(Transport::Usb),
            kind: StepKind::Set,
            mask,
            target_x: x,
            target_y: y,
            duration_x_ms: dx,
            duration_y_ms: dy,
            expected_end_ms: None,
        }
    }

    fn kinds(out: &TickOutcome) -> std::vec::Vec<&'static str> {
        out.events
            .iter()
            .map(|e| match e {
                MotionEvent::AxisDone { .. } => "done",
                MotionEvent::Started { .. } => "started",
                MotionEvent::StepDone { .. } => "stepDone",
                MotionEvent::StepTimeout { .. } => "fault",
            })
            .collect()
    }

    #[test]
    fn test_direct_move_interpolates_and_completes() {
        let mut sched = Scheduler::new();
        sched.execute_direct(step(1, AxisMask::X, 10.0, 0.0, 1000, 0), 0);

        let out = sched.tick(500);
        assert!(out.moved);
        assert!(out.events.is_empty());
        assert!((sched.angles().0 - 5.0).abs() < 1e-3);

        let out = sched.tick(1000);
        assert_eq!(kinds(&out), ["done"]);
        assert_eq!(sched.angles().0, 10.0);
    }

    #[test]
    fn test_queued_steps_run_in_order() {
        let mut sched = Scheduler::new();
        sched
            .enqueue(step(1, AxisMask::X, 10.0, 0.0, 100, 0))
            .unwrap();
        sched
            .enqueue(step(2, AxisMask::Y, 0.0, 20.0, 100, 100))
            .unwrap();

        let out = sched.tick(0);
        assert_eq!(kinds(&out), ["started"]);
        assert_eq!(sched.active().unwrap().item.id, 1);

        let out = sched.tick(100);
        assert_eq!(kinds(&out), ["done", "stepDone", "started"]);
        assert_eq!(sched.active().unwrap().item.id, 2);

        let out = sched.tick(200);
        assert_eq!(kinds(&out), ["done", "stepDone"]);
        assert!(sched.active().is_none());
        assert_eq!(sched.angles(), (10.0, 20.0));
    }

    #[test]
    fn test_zero_duration_step_completes_on_promotion() {
        let mut sched = Scheduler::new();
        sched.enqueue(step(7, AxisMask::XY, 0.0, 0.0, 0, 0)).unwrap();
        let out = sched.tick(10);
        assert_eq!(kinds(&out), ["started", "stepDone"]);
        assert!(sched.active().is_none());
    }

    #[test]
    fn test_timeout_aborts_queue() {
        let mut sched = Scheduler::new();
        sched
            .enqueue(step(1, AxisMask::X, 10.0, 0.0, 1000, 0))
            .unwrap();
        sched
            .enqueue(step(2, AxisMask::X, 20.0, 0.0, 1000, 0))
            .unwrap();
        sched.tick(0);
        // Stopping the axis leaves the step incomplete
        sched.stop_axes(AxisMask::X);

        let out = sched.tick(3000);
        assert!(out.events.is_empty());
        let out = sched.tick(3001);
        assert_eq!(kinds(&out), ["fault"]);
        assert!(sched.active().is_none());
        assert!(sched.queue().is_empty());
    }

    #[test]
    fn test_stop_all_flush() {
        let mut sched = Scheduler::new();
        sched
            .enqueue(step(1, AxisMask::X, 10.0, 0.0, 1000, 0))
            .unwrap();
        sched
            .enqueue(step(2, AxisMask::X, 20.0, 0.0, 1000, 0))
            .unwrap();
        sched.tick(0);

        sched.stop_all(false);
        assert!(!sched.is_moving());
        assert!(sched.active().is_some());
        assert_eq!(sched.queue().len(), 1);

        sched.stop_all(true);
        assert!(sched.active().is_none());
        assert!(sched.queue().is_empty());
    }

    #[test]
    fn test_direct_done_uses_direct_routing() {
        let mut sched = Scheduler::new();
        let mut item = step(3, AxisMask::Y, 0.0, 5.0, 10, 10);
        item.routing = Routing::for_origin(Transport::Ble);
        sched.execute_direct(item, 0);
        let out = sched.tick(10);
        match &out.events[0] {
            MotionEvent::AxisDone {
                axis,
                ref_id,
                routing,
            } => {
                assert_eq!(*axis, Axis::Y);
                assert_eq!(*ref_id, 3);
                assert_eq!(routing.tags.subsystem.as_str(), "ble");
            }
            other => panic!("unexpected event {other:?}"),
        }
    }

    #[test]
    fn test_negate_mirrors_in_flight_move() {
        let mut sched = Scheduler::new();
        sched.execute_direct(step(1, AxisMask::X, 40.0, 0.0, 100, 0), 0);
        sched.tick(50);
        sched.negate(AxisMask::X);
        assert!((sched.angles().0 + 20.0).abs() < 1e-3);
        sched.tick(100);
        assert_eq!(sched.angles().0, -40.0);
    }
}
