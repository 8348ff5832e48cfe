// ABOUTME: Diagnostic taxonomy and the control-flow channel for the interpreter

use crate::value::Value;
use std::fmt;
use thiserror::Error;

/// Optional source position carried by every diagnostic.
///
/// Displays as ` at line L, column C`, or as nothing when the position is
/// unknown (some native failures have no useful source location).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Pos(pub Option<(u32, u32)>);

impl Pos {
    pub fn at(line: u32, column: u32) -> Self {
        Pos(Some((line, column)))
    }

    pub fn none() -> Self {
        Pos(None)
    }
}

impl fmt::Display for Pos {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0 {
            Some((line, column)) => write!(f, " at line {}, column {}", line, column),
            None => Ok(()),
        }
    }
}

/// The closed set of user-facing diagnostic kinds.
///
/// The first five belong to the language engine; the rest are raised by
/// native collaborators and pass through the evaluator unchanged.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    DarkMagicDetected,
    SpellMiscast,
    UnknownIncantation,
    ForbiddenMagic,
    ProphecyViolation,
    PortalFailure,
    VoiceSilenced,
    ScrollDamaged,
    OracleSilent,
    QuestFailed,
    AzureRealmError,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ErrorKind::DarkMagicDetected => "Dark Magic Detected",
            ErrorKind::SpellMiscast => "Spell Miscast",
            ErrorKind::UnknownIncantation => "Unknown Incantation",
            ErrorKind::ForbiddenMagic => "Forbidden Magic",
            ErrorKind::ProphecyViolation => "Prophecy Violation",
            ErrorKind::PortalFailure => "Portal Failure",
            ErrorKind::VoiceSilenced => "Voice Silenced",
            ErrorKind::ScrollDamaged => "Scroll Damaged",
            ErrorKind::OracleSilent => "Oracle Silent",
            ErrorKind::QuestFailed => "Quest Failed",
            ErrorKind::AzureRealmError => "Azure Realm Error",
        };
        write!(f, "{}", name)
    }
}

/// A user-facing diagnostic: kind, message, optional source position.
#[derive(Error, Debug, Clone, PartialEq)]
#[error("{kind}! {message}{pos}")]
pub struct HexError {
    pub kind: ErrorKind,
    pub message: String,
    pub pos: Pos,
}

impl HexError {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        HexError {
            kind,
            message: message.into(),
            pos: Pos::none(),
        }
    }

    pub fn dark_magic(message: impl Into<String>, line: u32, column: u32) -> Self {
        HexError::new(ErrorKind::DarkMagicDetected, message).at(line, column)
    }

    pub fn miscast(message: impl Into<String>, line: u32, column: u32) -> Self {
        HexError::new(ErrorKind::SpellMiscast, message).at(line, column)
    }

    pub fn unknown(message: impl Into<String>) -> Self {
        HexError::new(ErrorKind::UnknownIncantation, message)
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        HexError::new(ErrorKind::ForbiddenMagic, message)
    }

    pub fn prophecy(message: impl Into<String>) -> Self {
        HexError::new(ErrorKind::ProphecyViolation, message)
    }

    pub fn portal(message: impl Into<String>) -> Self {
        HexError::new(ErrorKind::PortalFailure, message)
    }

    pub fn silenced(message: impl Into<String>) -> Self {
        HexError::new(ErrorKind::VoiceSilenced, message)
    }

    pub fn scroll(message: impl Into<String>) -> Self {
        HexError::new(ErrorKind::ScrollDamaged, message)
    }

    pub fn oracle(message: impl Into<String>) -> Self {
        HexError::new(ErrorKind::OracleSilent, message)
    }

    pub fn quest(message: impl Into<String>) -> Self {
        HexError::new(ErrorKind::QuestFailed, message)
    }

    /// Stamp a source position onto this error, keeping an existing one.
    ///
    /// Environment and native failures are raised without a position; the
    /// evaluator fills in the call site as the error bubbles past it.
    pub fn at(mut self, line: u32, column: u32) -> Self {
        if self.pos.0.is_none() {
            self.pos = Pos::at(line, column);
        }
        self
    }
}

/// Out-of-band outcome of evaluating a node: either a real diagnostic or a
/// non-local control-flow signal on its way to the construct that catches it.
///
/// Signals are not errors. `Return` is caught by the function invocation
/// frame, `Break` and `Continue` by the nearest enclosing loop; the program
/// boundary converts any signal that escapes into a fatal internal error,
/// since that can only be an interpreter bug.
#[derive(Debug, Clone)]
pub enum Interrupt {
    Error(HexError),
    Return(Value),
    Break,
    Continue,
}

impl From<HexError> for Interrupt {
    fn from(err: HexError) -> Self {
        Interrupt::Error(err)
    }
}
