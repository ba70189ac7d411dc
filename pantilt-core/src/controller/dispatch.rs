//! Request decoding and command dispatch

use heapless::String;
use pantilt_hal::FlashStorage;
use pantilt_protocol::routing::ROUTE_TAG_LEN;
use pantilt_protocol::text::clip;
use pantilt_protocol::{
    bool_field, has_string_field, int_field, string_field, RouteTags, Routing, Transport,
    MAX_LINE_LEN,
};

use super::Controller;
use crate::error::{CommandError, CommandResult, ErrorCode};
use crate::traits::{LineSink, ServoOutput};

/// Longest `cmd` value that is recognised
pub(crate) const CMD_NAME_LEN: usize = 32;

/// How a line reached the interpreter
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Invocation {
    /// Received from a transport
    Direct,
    /// One line of a running favorite script
    MacroLine,
}

/// Every command the interpreter understands
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Command {
    Commands,
    Help,
    Examples,
    Status,
    Persist,
    FactoryReset,
    Queue,
    QClear,
    QAbort,
    QStatus,
    QList,
    QAdd,
    Stop,
    StopAll,
    ResetAll,
    Invert,
    Speed,
    Save,
    Recall,
    FavList,
    FavClear,
    FavSave,
    FavRun,
    Sweep,
    Set,
    Adjust,
    Center,
}

const COMMAND_TABLE: [(&str, Command); 27] = [
    ("commands", Command::Commands),
    ("help", Command::Help),
    ("examples", Command::Examples),
    ("status", Command::Status),
    ("persist", Command::Persist),
    ("factoryReset", Command::FactoryReset),
    ("queue", Command::Queue),
    ("qClear", Command::QClear),
    ("qAbort", Command::QAbort),
    ("qStatus", Command::QStatus),
    ("qList", Command::QList),
    ("qAdd", Command::QAdd),
    ("stop", Command::Stop),
    ("stopAll", Command::StopAll),
    ("resetAll", Command::ResetAll),
    ("invert", Command::Invert),
    ("speed", Command::Speed),
    ("save", Command::Save),
    ("recall", Command::Recall),
    ("favList", Command::FavList),
    ("favClear", Command::FavClear),
    ("favSave", Command::FavSave),
    ("favRun", Command::FavRun),
    ("sweep", Command::Sweep),
    ("set", Command::Set),
    ("adjust", Command::Adjust),
    ("center", Command::Center),
];

impl Command {
    /// Look up a command name, case-insensitively
    pub fn parse(name: &str) -> Option<Self> {
        COMMAND_TABLE
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, c)| *c)
    }

    /// Canonical wire name
    pub fn name(self) -> &'static str {
        COMMAND_TABLE
            .iter()
            .find(|(_, c)| *c == self)
            .map(|(n, _)| *n)
            .unwrap_or("")
    }

    /// Commands a stored favorite may not contain
    pub fn is_macro_forbidden(self) -> bool {
        matches!(
            self,
            Command::Persist | Command::FactoryReset | Command::FavRun
        )
    }
}

/// Decoded envelope of one command line
pub(crate) struct Request<'a> {
    pub line: &'a str,
    pub id: u32,
    pub routing: Routing,
    pub origin: Transport,
    pub invocation: Invocation,
    /// Explicit per-request enqueue flag
    pub q: Option<bool>,
    pub now_ms: u32,
}

fn tag_field(line: &str, key: &str) -> Option<String<ROUTE_TAG_LEN>> {
    string_field::<ROUTE_TAG_LEN>(line, key).filter(|tag| !tag.is_empty())
}

/// Apply sticky routing: omitted tags inherit the last values used
pub(crate) fn resolve_tags(line: &str, origin: Transport, last: &RouteTags) -> RouteTags {
    let subsystem = tag_field(line, "subsystem").unwrap_or_else(|| {
        if last.subsystem.is_empty() {
            RouteTags::subsystem(origin.name()).subsystem
        } else {
            last.subsystem.clone()
        }
    });
    let route = tag_field(line, "route").unwrap_or_else(|| last.route.clone());
    RouteTags { subsystem, route }
}

impl<O, K, S> Controller<O, K, S>
where
    O: ServoOutput,
    K: LineSink,
    S: FlashStorage,
{
    /// Single entry point for transport lines and macro lines
    pub(super) fn dispatch(
        &mut self,
        line: &str,
        origin: Transport,
        invocation: Invocation,
        now_ms: u32,
    ) {
        let line = line.trim();
        if line.is_empty() {
            return;
        }
        let line = clip(line, MAX_LINE_LEN);

        let id = match int_field(line, "id") {
            Some(id) if id > 0 => id as u32,
            _ => self.next_auto_id(),
        };
        let routing = self.routing_for(line, origin);
        let req = Request {
            line,
            id,
            routing,
            origin,
            invocation,
            q: bool_field(line, "q"),
            now_ms,
        };

        let Some(name) = string_field::<CMD_NAME_LEN>(line, "cmd") else {
            if has_string_field(line, "cmd") {
                self.reject(&req, CommandError::unknown_cmd());
                return;
            }
            self.reject(
                &req,
                CommandError::new(
                    ErrorCode::MissingCmd,
                    "Missing required field: cmd (example: {\"cmd\":\"help\"})",
                ),
            );
            return;
        };

        let result = match Command::parse(&name) {
            Some(command) => self.run_command(command, &req),
            None => Err(CommandError::unknown_cmd()),
        };
        if let Err(err) = result {
            self.reject(&req, err);
        }
    }

    fn run_command(&mut self, command: Command, req: &Request<'_>) -> CommandResult {
        match command {
            Command::Commands | Command::Help | Command::Examples => self.cmd_text_block(command, req),
            Command::Status => self.cmd_status(req, "status"),
            Command::Persist => self.cmd_persist(req),
            Command::FactoryReset => self.cmd_factory_reset(req),
            Command::Queue => self.cmd_queue_mode(req),
            Command::QClear => self.cmd_queue_clear(req),
            Command::QAbort => self.cmd_queue_abort(req),
            Command::QStatus => self.cmd_status(req, "queue_status"),
            Command::QList => self.cmd_queue_list(req),
            Command::QAdd => self.cmd_queue_add(req),
            Command::Stop => self.cmd_stop(req),
            Command::StopAll => self.cmd_stop_all(req),
            Command::ResetAll => self.cmd_reset_all(req),
            Command::Invert => self.cmd_invert(req),
            Command::Speed => self.cmd_speed(req),
            Command::Save => self.cmd_save_position(req),
            Command::Recall => self.cmd_recall(req),
            Command::FavList => self.cmd_fav_list(req),
            Command::FavClear => self.cmd_fav_clear(req),
            Command::FavSave => self.cmd_fav_save(req),
            Command::FavRun => self.cmd_fav_run(req),
            Command::Sweep => self.cmd_sweep(req),
            Command::Set | Command::Adjust | Command::Center => self.cmd_motion(command, req),
        }
    }
}
