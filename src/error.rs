use crate::{Conflict, GrammarError, ParseError};
use std::fmt::{Display, Formatter};

impl GrammarError {
    pub fn new(what: &str, message: String) -> Self {
        Self {
            what: what.to_string(),
            message,
            pointer: None,
        }
    }

    pub fn with_pointer(what: &str, message: String, pointer: usize) -> Self {
        Self {
            what: what.to_string(),
            message,
            pointer: Some(pointer),
        }
    }

    pub fn what(&self) -> &str {
        &self.what
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    /// Byte offset of the offending construct, where meaningful.
    pub fn pointer(&self) -> Option<usize> {
        self.pointer
    }

    /// Prefix the message with extra context, keeping kind and position.
    pub fn context(self, prefix: &str) -> Self {
        Self {
            what: self.what,
            message: format!("{}: {}", prefix, self.message),
            pointer: self.pointer,
        }
    }
}

impl Display for GrammarError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self.pointer {
            Some(p) => write!(f, "GrammarError: {}-{} @ {}", self.what, self.message, p),
            None => write!(f, "GrammarError: {}-{}", self.what, self.message),
        }
    }
}

impl std::error::Error for GrammarError {}

impl ParseError {
    pub fn new(pointer: usize, message: String) -> Self {
        Self { pointer, message }
    }
}

impl Display for ParseError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "SyntaxError: {}", self.message)
    }
}

impl std::error::Error for ParseError {}

impl Display for Conflict {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Conflict::ShiftReduce {
                state,
                terminal,
                reduce,
            } => write!(
                f,
                "shift/reduce conflict in state {} on token {}: shifting over production {} of non-terminal {}",
                state.index(),
                terminal.index(),
                reduce.production,
                reduce.non_terminal.index()
            ),
            Conflict::ReduceReduce {
                state,
                terminal,
                kept,
                dropped,
            } => write!(
                f,
                "reduce/reduce conflict in state {} on token {}: keeping production {} of non-terminal {} over production {} of non-terminal {}",
                state.index(),
                terminal.index(),
                kept.production,
                kept.non_terminal.index(),
                dropped.production,
                dropped.non_terminal.index()
            ),
            Conflict::LexerTie { kept, dropped } => write!(
                f,
                "lexer tie: tokens {} and {} accept the same input, keeping the earlier declaration",
                kept.index(),
                dropped.index()
            ),
        }
    }
}
