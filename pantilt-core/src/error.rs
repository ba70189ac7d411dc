//! Command error codes

use core::fmt;

/// Machine-readable error code carried in `"error"` fields
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ErrorCode {
    MissingCmd,
    MissingValue,
    MissingMode,
    MissingCmd2,
    BadAxis,
    BadTiming,
    BadMode,
    BadSlot,
    BadValue,
    BadDur,
    UnknownCmd,
    EmptySlot,
    EmptyScript,
    TooLong,
    QueueFull,
    StepTimeout,
    WriteFailed,
    ClearFailed,
    Disallowed,
    MacroBusy,
    MacroTooLong,
}

impl ErrorCode {
    /// Wire name
    pub fn as_str(self) -> &'static str {
        match self {
            ErrorCode::MissingCmd => "missing_cmd",
            ErrorCode::MissingValue => "missing_value",
            ErrorCode::MissingMode => "missing_mode",
            ErrorCode::MissingCmd2 => "missing_cmd2",
            ErrorCode::BadAxis => "bad_axis",
            ErrorCode::BadTiming => "bad_timing",
            ErrorCode::BadMode => "bad_mode",
            ErrorCode::BadSlot => "bad_slot",
            ErrorCode::BadValue => "bad_value",
            ErrorCode::BadDur => "bad_dur",
            ErrorCode::UnknownCmd => "unknown_cmd",
            ErrorCode::EmptySlot => "empty_slot",
            ErrorCode::EmptyScript => "empty_script",
            ErrorCode::TooLong => "too_long",
            ErrorCode::QueueFull => "queue_full",
            ErrorCode::StepTimeout => "step_timeout",
            ErrorCode::WriteFailed => "write_failed",
            ErrorCode::ClearFailed => "clear_failed",
            ErrorCode::Disallowed => "disallowed",
            ErrorCode::MacroBusy => "macro_busy",
            ErrorCode::MacroTooLong => "macro_too_long",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A rejected command: error code plus human-readable message
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct CommandError {
    pub code: ErrorCode,
    pub msg: &'static str,
}

impl CommandError {
    pub const fn new(code: ErrorCode, msg: &'static str) -> Self {
        Self { code, msg }
    }

    pub const fn bad_axis() -> Self {
        Self::new(ErrorCode::BadAxis, "axis must be x, y, or xy")
    }

    pub const fn bad_timing() -> Self {
        Self::new(ErrorCode::BadTiming, "Invalid dur or speed")
    }

    pub const fn unknown_cmd() -> Self {
        Self::new(ErrorCode::UnknownCmd, "Unknown cmd (try {\"cmd\":\"commands\"})")
    }

    pub const fn queue_full() -> Self {
        Self::new(ErrorCode::QueueFull, "Queue full")
    }
}

/// Result of a command handler
pub type CommandResult<T = ()> = Result<T, CommandError>;
