// ABOUTME: Version info, REPL prompts, and welcome/farewell text

pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub const WELCOME_MESSAGE: &str = "HexScript REPL";
pub const WELCOME_SUBTITLE: &str = "Conjure variables, cast spells, consult oracles.";
pub const WELCOME_FOOTER: &str = "Type 'exit' or 'quit' to leave the circle.";
pub const FAREWELL: &str = "The circle is closed. Farewell.";

pub const PROMPT: &str = "hex> ";
pub const CONTINUATION_PROMPT: &str = "...> ";

pub const HISTORY_FILE: &str = ".hexscript_history";
