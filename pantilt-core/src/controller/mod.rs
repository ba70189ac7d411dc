//! Command interpreter and machine context
//!
//! The [`Controller`] owns everything the head knows: the scheduler, the
//! settings, the queue policy and the sticky routing tags. The control
//! task feeds it framed lines and periodic ticks; it answers through an
//! injected [`LineSink`] and drives servos through a [`ServoOutput`].

mod dispatch;
mod favorites;
mod info;
mod motion;
mod queue;
mod script;
mod storage;
mod sweep;

#[cfg(test)]
mod tests;

pub use dispatch::{Command, Invocation};
pub use sweep::SweepPlan;

use pantilt_hal::FlashStorage;
use pantilt_protocol::reply::{self, QueueMode, ReplyError, ReplyLine, StateSnapshot};
use pantilt_protocol::{Destinations, RouteTags, Routing, Transport};

use crate::config::Settings;
use crate::error::CommandError;
use crate::motion::Axis;
use crate::persist::{LoadError, Persistence};
use crate::scheduler::{MotionEvent, Scheduler};
use crate::traits::{LineSink, ServoOutput};

use dispatch::Request;

/// Connection-level notifications from a transport adapter
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum TransportEvent {
    /// Adapter initialised
    Ready,
    /// A peer connected
    Connected,
    /// The peer went away
    Disconnected,
}

/// Link status as reported by the transport adapters
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct LinkStatus {
    pub usb_ready: bool,
    pub ble_connected: bool,
}

impl Default for LinkStatus {
    fn default() -> Self {
        Self {
            usb_ready: true,
            ble_connected: false,
        }
    }
}

/// Pan/tilt machine context
pub struct Controller<O, K, S> {
    output: O,
    sink: K,
    persistence: Persistence<S>,
    scheduler: Scheduler,
    settings: Settings,
    queue_mode: QueueMode,
    macro_running: bool,
    last_auto_id: u32,
    last_tags: RouteTags,
    links: LinkStatus,
}

impl<O, K, S> Controller<O, K, S>
where
    O: ServoOutput,
    K: LineSink,
    S: FlashStorage,
{
    /// Create a controller with default settings
    ///
    /// Call [`Controller::begin`] before feeding lines.
    pub fn new(output: O, sink: K, storage: S) -> Self {
        Self {
            output,
            sink,
            persistence: Persistence::new(storage),
            scheduler: Scheduler::new(),
            settings: Settings::default(),
            queue_mode: QueueMode::Step,
            macro_running: false,
            last_auto_id: 0,
            last_tags: RouteTags::default(),
            links: LinkStatus::default(),
        }
    }

    /// Load stored settings, drive the outputs and announce readiness on USB
    ///
    /// A load error leaves factory defaults in place; the error is returned
    /// for logging only.
    pub fn begin(&mut self) -> Result<(), LoadError> {
        let loaded = self.persistence.load(&mut self.settings);
        self.apply_outputs();
        self.emit(Destinations::USB, reply::ready(loaded.is_ok()));
        loaded
    }

    /// Advance motion and report completions
    pub fn tick(&mut self, now_ms: u32) {
        let outcome = self.scheduler.tick(now_ms);
        if outcome.moved {
            self.apply_outputs();
        }
        for event in outcome.events {
            self.emit_motion_event(event);
        }
    }

    /// Interpret one framed line from `origin`
    pub fn handle(&mut self, line: &str, origin: Transport, now_ms: u32) {
        if origin == Transport::Ble {
            self.links.ble_connected = true;
        }
        self.dispatch(line, origin, Invocation::Direct, now_ms);
    }

    /// Record a transport connection change
    ///
    /// Motion and the queue are unaffected.
    pub fn on_transport_event(&mut self, event: TransportEvent, transport: Transport) {
        match (transport, event) {
            (Transport::Usb, TransportEvent::Ready | TransportEvent::Connected) => {
                self.links.usb_ready = true
            }
            (Transport::Usb, TransportEvent::Disconnected) => self.links.usb_ready = false,
            (Transport::Ble, TransportEvent::Connected) => self.links.ble_connected = true,
            (Transport::Ble, TransportEvent::Disconnected) => self.links.ble_connected = false,
            (Transport::Ble, TransportEvent::Ready) => {}
        }
    }

    pub fn links(&self) -> LinkStatus {
        self.links
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn scheduler(&self) -> &Scheduler {
        &self.scheduler
    }

    pub fn queue_mode(&self) -> QueueMode {
        self.queue_mode
    }

    pub fn is_macro_running(&self) -> bool {
        self.macro_running
    }

    /// Get the reply sink
    pub fn sink(&mut self) -> &mut K {
        &mut self.sink
    }

    /// Get the servo output
    pub fn output(&mut self) -> &mut O {
        &mut self.output
    }

    /// Current state as reported in `state` objects
    pub fn snapshot(&self) -> StateSnapshot {
        let (x, y) = self.scheduler.angles();
        StateSnapshot {
            x,
            y,
            invert_x: self.settings.invert_x,
            invert_y: self.settings.invert_y,
            speed: self.settings.default_speed,
            moving_x: self.scheduler.axis(Axis::X).is_moving(),
            moving_y: self.scheduler.axis(Axis::Y).is_moving(),
            queue_mode: self.queue_mode,
            queue_count: self.scheduler.queue().len(),
            queue_active: self.scheduler.active().is_some(),
            dirty: self.settings.dirty,
        }
    }

    /// Push the physical angles (inversion applied) to the servos
    fn apply_outputs(&mut self) {
        let (x, y) = self.scheduler.angles();
        let x = if self.settings.invert_x { -x } else { x };
        let y = if self.settings.invert_y { -y } else { y };
        self.output.apply(x, y);
    }

    fn next_auto_id(&mut self) -> u32 {
        self.last_auto_id = self.last_auto_id.wrapping_add(1);
        if self.last_auto_id == 0 {
            self.last_auto_id = 1;
        }
        self.last_auto_id
    }

    /// Write a line to every connected destination
    ///
    /// A line that overflows the reply buffer is dropped.
    fn emit(&mut self, dests: Destinations, line: Result<ReplyLine, ReplyError>) {
        let Ok(line) = line else {
            return;
        };
        for transport in dests.iter() {
            if transport == Transport::Ble && !self.links.ble_connected {
                continue;
            }
            self.sink.send_line(transport, &line);
        }
    }

    fn emit_motion_event(&mut self, event: MotionEvent) {
        match event {
            MotionEvent::AxisDone {
                axis,
                ref_id,
                routing,
            } => self.emit(
                routing.dests,
                reply::axis_done(axis.name(), ref_id, &routing.tags),
            ),
            MotionEvent::Started { step, routing } => {
                self.emit(routing.dests, reply::step_started(&step, &routing.tags))
            }
            MotionEvent::StepDone { ref_id, routing } => {
                self.emit(routing.dests, reply::step_done(ref_id, &routing.tags))
            }
            MotionEvent::StepTimeout { ref_id, routing } => {
                self.apply_outputs();
                self.emit(
                    routing.dests,
                    reply::fault(
                        crate::ErrorCode::StepTimeout.as_str(),
                        ref_id,
                        &routing.tags,
                        "Queued step timed out; aborted",
                    ),
                )
            }
        }
    }

    fn ack(&mut self, req: &Request<'_>, msg: &str) {
        self.emit(req.routing.dests, reply::ack(req.id, &req.routing.tags, msg));
    }

    fn reject(&mut self, req: &Request<'_>, err: CommandError) {
        self.emit(
            req.routing.dests,
            reply::error(req.id, &req.routing.tags, err.code.as_str(), err.msg),
        );
    }

    /// Snapshot with `event:"done"` referring to the request
    fn send_done_state(&mut self, req: &Request<'_>) {
        let snapshot = self.snapshot();
        self.emit(
            req.routing.dests,
            reply::state(req.id, Some("done"), Some(req.id), &req.routing.tags, &snapshot),
        );
    }

    /// Plain snapshot without an event
    fn send_state(&mut self, req: &Request<'_>) {
        let snapshot = self.snapshot();
        self.emit(
            req.routing.dests,
            reply::state(req.id, None, None, &req.routing.tags, &snapshot),
        );
    }

    /// Ack followed by a `done` snapshot, for state-mutating commands
    fn ack_done(&mut self, req: &Request<'_>, msg: &str) {
        self.ack(req, msg);
        self.send_done_state(req);
    }

    fn routing_for(&mut self, line: &str, origin: Transport) -> Routing {
        let tags = dispatch::resolve_tags(line, origin, &self.last_tags);
        self.last_tags = tags.clone();
        Routing {
            tags,
            dests: Destinations::for_origin(origin),
        }
    }
}
