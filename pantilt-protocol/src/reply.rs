//! Reply and event encoding
//!
//! Every line written by the firmware is a single JSON object built with
//! [`JsonLine`]. Float fields are written with two decimals.

use core::fmt::{self, Write};

use heapless::String;

use crate::routing::RouteTags;
use crate::text::{looks_like_json, preview, write_escaped};

/// Maximum encoded reply size in bytes
pub const MAX_REPLY_LEN: usize = 4096;

/// One encoded reply line (without the trailing newline)
pub type ReplyLine = String<MAX_REPLY_LEN>;

/// Errors from reply encoding
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ReplyError {
    /// Encoded line does not fit in [`MAX_REPLY_LEN`]
    Overflow,
}

impl From<fmt::Error> for ReplyError {
    fn from(_: fmt::Error) -> Self {
        ReplyError::Overflow
    }
}

/// Global enqueue-vs-execute policy
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum QueueMode {
    /// Execute immediately unless `q:true`
    Off,
    /// Enqueue unless `q:false`
    On,
    /// Execute immediately unless `q:true` (power-on default)
    Step,
}

impl QueueMode {
    /// Parse a mode name, case-insensitively
    pub fn parse(name: &str) -> Option<Self> {
        if name.eq_ignore_ascii_case("off") {
            Some(QueueMode::Off)
        } else if name.eq_ignore_ascii_case("on") {
            Some(QueueMode::On)
        } else if name.eq_ignore_ascii_case("step") {
            Some(QueueMode::Step)
        } else {
            None
        }
    }

    /// Wire name
    pub fn as_str(self) -> &'static str {
        match self {
            QueueMode::Off => "off",
            QueueMode::On => "on",
            QueueMode::Step => "step",
        }
    }
}

/// Incremental writer for one JSON object line
pub struct JsonLine {
    out: ReplyLine,
    comma: bool,
}

impl JsonLine {
    /// Start a new top-level object
    pub fn object() -> Self {
        let mut out = ReplyLine::new();
        // An empty String always has room for one byte
        let _ = out.push('{');
        Self { out, comma: false }
    }

    fn separator(&mut self) -> Result<(), ReplyError> {
        if self.comma {
            self.out.push(',').map_err(|_| ReplyError::Overflow)?;
        }
        self.comma = true;
        Ok(())
    }

    fn key(&mut self, key: &str) -> Result<(), ReplyError> {
        self.separator()?;
        write!(self.out, "\"{}\":", key)?;
        Ok(())
    }

    /// Boolean member
    pub fn bool(&mut self, key: &str, value: bool) -> Result<&mut Self, ReplyError> {
        self.key(key)?;
        self.out
            .push_str(if value { "true" } else { "false" })
            .map_err(|_| ReplyError::Overflow)?;
        Ok(self)
    }

    /// Unsigned integer member
    pub fn uint(&mut self, key: &str, value: u32) -> Result<&mut Self, ReplyError> {
        self.key(key)?;
        write!(self.out, "{}", value)?;
        Ok(self)
    }

    /// Float member with two decimals
    pub fn fixed2(&mut self, key: &str, value: f32) -> Result<&mut Self, ReplyError> {
        self.key(key)?;
        // Values that round to zero print as 0.00, never -0.00
        let value = if value > -0.005 && value < 0.005 { 0.0 } else { value };
        write!(self.out, "{:.2}", value)?;
        Ok(self)
    }

    /// String member, escaped
    pub fn str(&mut self, key: &str, value: &str) -> Result<&mut Self, ReplyError> {
        self.key(key)?;
        self.out.push('"').map_err(|_| ReplyError::Overflow)?;
        write_escaped(&mut self.out, value)?;
        self.out.push('"').map_err(|_| ReplyError::Overflow)?;
        Ok(self)
    }

    /// Member whose value is already JSON text
    pub fn raw(&mut self, key: &str, json: &str) -> Result<&mut Self, ReplyError> {
        self.key(key)?;
        self.out.push_str(json).map_err(|_| ReplyError::Overflow)?;
        Ok(self)
    }

    /// `subsystem`/`route` members, each only when non-empty
    pub fn tags(&mut self, tags: &RouteTags) -> Result<&mut Self, ReplyError> {
        if !tags.subsystem.is_empty() {
            self.str("subsystem", &tags.subsystem)?;
        }
        if !tags.route.is_empty() {
            self.str("route", &tags.route)?;
        }
        Ok(self)
    }

    /// Open a nested object member
    pub fn open_object(&mut self, key: &str) -> Result<&mut Self, ReplyError> {
        self.key(key)?;
        self.out.push('{').map_err(|_| ReplyError::Overflow)?;
        self.comma = false;
        Ok(self)
    }

    /// Open a nested array member
    pub fn open_array(&mut self, key: &str) -> Result<&mut Self, ReplyError> {
        self.key(key)?;
        self.out.push('[').map_err(|_| ReplyError::Overflow)?;
        self.comma = false;
        Ok(self)
    }

    /// Open an object element inside an array
    pub fn open_item(&mut self) -> Result<&mut Self, ReplyError> {
        self.separator()?;
        self.out.push('{').map_err(|_| ReplyError::Overflow)?;
        self.comma = false;
        Ok(self)
    }

    /// Close the innermost object
    pub fn close_object(&mut self) -> Result<&mut Self, ReplyError> {
        self.out.push('}').map_err(|_| ReplyError::Overflow)?;
        self.comma = true;
        Ok(self)
    }

    /// Close the innermost array
    pub fn close_array(&mut self) -> Result<&mut Self, ReplyError> {
        self.out.push(']').map_err(|_| ReplyError::Overflow)?;
        self.comma = true;
        Ok(self)
    }

    /// Close the top-level object and return the line
    pub fn finish(mut self) -> Result<ReplyLine, ReplyError> {
        self.out.push('}').map_err(|_| ReplyError::Overflow)?;
        Ok(self.out)
    }
}

/// Everything a `state` object reports
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct StateSnapshot {
    pub x: f32,
    pub y: f32,
    pub invert_x: bool,
    pub invert_y: bool,
    pub speed: f32,
    pub moving_x: bool,
    pub moving_y: bool,
    pub queue_mode: QueueMode,
    pub queue_count: usize,
    pub queue_active: bool,
    pub dirty: bool,
}

/// Summary of a queued or starting step
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct StepSummary {
    pub ref_id: u32,
    pub kind: &'static str,
    pub use_x: bool,
    pub use_y: bool,
    pub x: f32,
    pub y: f32,
    pub dx: u32,
    pub dy: u32,
}

impl StepSummary {
    /// Axis mask name of the step
    pub fn axis_name(&self) -> &'static str {
        match (self.use_x, self.use_y) {
            (true, true) => "xy",
            (true, false) => "x",
            _ => "y",
        }
    }

    fn write_fields(&self, line: &mut JsonLine) -> Result<(), ReplyError> {
        line.str("kind", self.kind)?.str("axis", self.axis_name())?;
        if self.use_x {
            line.fixed2("x", self.x)?;
        }
        if self.use_y {
            line.fixed2("y", self.y)?;
        }
        line.uint("dx", self.dx)?.uint("dy", self.dy)?;
        Ok(())
    }
}

/// One favorite script slot as listed by `favList`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FavoriteSummary<'a> {
    /// 1-based slot number
    pub slot: usize,
    /// Stored script, if the slot is valid
    pub script: Option<&'a str>,
}

/// `{"ok":true,"id":N,...,"msg":M}`
pub fn ack(id: u32, tags: &RouteTags, msg: &str) -> Result<ReplyLine, ReplyError> {
    let mut line = JsonLine::object();
    line.bool("ok", true)?.uint("id", id)?.tags(tags)?.str("msg", msg)?;
    line.finish()
}

/// `{"ok":false,"id":N,...,"error":E,"msg":M}`
pub fn error(id: u32, tags: &RouteTags, code: &str, msg: &str) -> Result<ReplyLine, ReplyError> {
    let mut line = JsonLine::object();
    line.bool("ok", false)?
        .uint("id", id)?
        .tags(tags)?
        .str("error", code)?
        .str("msg", msg)?;
    line.finish()
}

/// State snapshot, optionally tagged as an event about request `ref_id`
pub fn state(
    id: u32,
    event: Option<&str>,
    ref_id: Option<u32>,
    tags: &RouteTags,
    snapshot: &StateSnapshot,
) -> Result<ReplyLine, ReplyError> {
    let mut line = JsonLine::object();
    line.bool("ok", true)?.uint("id", id)?;
    if let Some(event) = event {
        line.str("event", event)?;
    }
    if let Some(ref_id) = ref_id {
        line.uint("ref", ref_id)?;
    }
    line.tags(tags)?
        .open_object("state")?
        .fixed2("x", snapshot.x)?
        .fixed2("y", snapshot.y)?
        .bool("invX", snapshot.invert_x)?
        .bool("invY", snapshot.invert_y)?
        .fixed2("speed", snapshot.speed)?
        .open_object("moving")?
        .bool("x", snapshot.moving_x)?
        .bool("y", snapshot.moving_y)?
        .close_object()?
        .open_object("queue")?
        .str("mode", snapshot.queue_mode.as_str())?
        .uint("count", snapshot.queue_count as u32)?
        .bool("active", snapshot.queue_active)?
        .close_object()?
        .bool("cfgDirty", snapshot.dirty)?
        .close_object()?;
    line.finish()
}

/// Per-axis motion completion event
pub fn axis_done(axis: &str, ref_id: u32, tags: &RouteTags) -> Result<ReplyLine, ReplyError> {
    let mut line = JsonLine::object();
    line.bool("ok", true)?
        .str("event", "done")?
        .str("axis", axis)?
        .uint("ref", ref_id)?
        .tags(tags)?;
    line.finish()
}

/// A queued step became active
pub fn step_started(step: &StepSummary, tags: &RouteTags) -> Result<ReplyLine, ReplyError> {
    let mut line = JsonLine::object();
    line.bool("ok", true)?
        .str("event", "started")?
        .uint("ref", step.ref_id)?
        .tags(tags)?
        .open_object("step")?;
    step.write_fields(&mut line)?;
    line.close_object()?;
    line.finish()
}

/// The active step finished on every axis it drives
pub fn step_done(ref_id: u32, tags: &RouteTags) -> Result<ReplyLine, ReplyError> {
    let mut line = JsonLine::object();
    line.bool("ok", true)?
        .str("event", "stepDone")?
        .uint("ref", ref_id)?
        .tags(tags)?;
    line.finish()
}

/// Asynchronous runtime fault
pub fn fault(code: &str, ref_id: u32, tags: &RouteTags, msg: &str) -> Result<ReplyLine, ReplyError> {
    let mut line = JsonLine::object();
    line.bool("ok", false)?
        .str("event", "fault")?
        .str("error", code)?
        .uint("ref", ref_id)?
        .tags(tags)?
        .str("msg", msg)?;
    line.finish()
}

/// One line of a help/example block
///
/// Lines that are themselves JSON are embedded as values; anything else is
/// sent as a string.
pub fn text_line(
    id: u32,
    event: &str,
    n: u32,
    tags: &RouteTags,
    text: &str,
) -> Result<ReplyLine, ReplyError> {
    let text = text.trim();
    let mut line = JsonLine::object();
    line.bool("ok", true)?
        .uint("id", id)?
        .str("event", event)?
        .uint("n", n)?
        .tags(tags)?;
    if looks_like_json(text) {
        line.raw("line", text)?;
    } else {
        line.str("line", text)?;
    }
    line.finish()
}

/// Closing event of a help/example block
pub fn text_done(id: u32, event: &str, count: u32, tags: &RouteTags) -> Result<ReplyLine, ReplyError> {
    let mut line = JsonLine::object();
    line.bool("ok", true)?
        .uint("id", id)?
        .str("event", event)?
        .uint("count", count)?
        .tags(tags)?;
    line.finish()
}

/// Pending queue contents
pub fn queue_list<I>(
    id: u32,
    tags: &RouteTags,
    mode: QueueMode,
    count: usize,
    items: I,
) -> Result<ReplyLine, ReplyError>
where
    I: IntoIterator<Item = StepSummary>,
{
    let mut line = JsonLine::object();
    line.bool("ok", true)?
        .uint("id", id)?
        .tags(tags)?
        .open_object("queue")?
        .str("mode", mode.as_str())?
        .uint("count", count as u32)?
        .open_array("items")?;
    for item in items {
        line.open_item()?.uint("ref", item.ref_id)?;
        item.write_fields(&mut line)?;
        line.close_object()?;
    }
    line.close_array()?.close_object()?;
    line.finish()
}

/// Favorite script slots with previews
pub fn favorite_list<'a, I>(id: u32, tags: &RouteTags, favorites: I) -> Result<ReplyLine, ReplyError>
where
    I: IntoIterator<Item = FavoriteSummary<'a>>,
{
    let mut line = JsonLine::object();
    line.bool("ok", true)?
        .uint("id", id)?
        .tags(tags)?
        .open_array("favorites")?;
    for fav in favorites {
        line.open_item()?
            .uint("slot", fav.slot as u32)?
            .bool("valid", fav.script.is_some())?;
        if let Some(script) = fav.script {
            let text: String<512> = preview(script);
            line.str("preview", &text)?;
        }
        line.close_object()?;
    }
    line.close_array()?;
    line.finish()
}

/// Boot announcement
pub fn ready(loaded: bool) -> Result<ReplyLine, ReplyError> {
    let mut line = JsonLine::object();
    line.bool("ok", true)?
        .str("event", "pantilt_ready")?
        .bool("loaded", loaded)?;
    line.finish()
}
