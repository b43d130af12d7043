//! Language compiler-compiler (lang_cc) is a library to build an executable parser at runtime
//! from a textual grammar combining regular expression token definitions with BNF style
//! production rules and named semantic actions.
//!
//! # Overview
//! Parser generator tools usually compile a grammar ahead of time and emit parser source code
//! in the target language. This library instead compiles the grammar in memory:
//! every token regex is turned into an NFA, the union of all token NFAs is determinized into
//! a single lexer DFA, and the production rules are compiled into a canonical LR(1) automaton
//! with an action table. A [Compiler] built this way will tokenize an input string with
//! maximal munch, run a bottom-up shift/reduce parse, call a user registered action on every
//! reduction and return the final synthesized value.
//!
//! # Design
//!
//! The grammar source follows the classic two-section layout. The first section declares the
//! terminals with `%token`, `%left`, `%right` or `%nonassoc` followed by a name and a regular
//! expression. The second section, separated by `%%`, lists the productions. Every
//! alternative of a production may be terminated by a braced action name which is resolved
//! against the actions registered on the [Compiler]. Values flow through the parse as a
//! uniform exchange type implementing [ValueImpl]; the reference implementation is [String].
//!
//! # Example
//!
//! Following is a small arithmetic compiler implemented with lang_cc.
//! ```
//! use lang_cc::Compiler;
//!
//! let grammar = r#"
//! %token NUMBER [0-9]+
//! %left ADD \+
//! %left SUB -
//! %left MUL \*
//! %left DIV /
//! %left MOD %
//! %token LPAREN \(
//! %token RPAREN \)
//!
//! %%
//!
//! exp
//!     : exp ADD term { bin_op }
//!     | exp SUB term { bin_op }
//!     | term { forward }
//!     ;
//!
//! term
//!     : term MUL factor { bin_op }
//!     | term DIV factor { bin_op }
//!     | term MOD factor { bin_op }
//!     | factor { forward }
//!     ;
//!
//! factor
//!     : NUMBER { forward }
//!     | LPAREN exp RPAREN { parent_exp }
//!     ;
//! "#;
//!
//! let mut compiler: Compiler = Compiler::new(grammar).unwrap();
//!
//! compiler.register_action("forward", |values| values[0].clone());
//! compiler.register_action("parent_exp", |values| values[1].clone());
//! compiler.register_action("bin_op", |values| {
//!     let lhs: i64 = values[0].parse().unwrap();
//!     let rhs: i64 = values[2].parse().unwrap();
//!     let result = match values[1].as_str() {
//!         "+" => lhs + rhs,
//!         "-" => lhs - rhs,
//!         "*" => lhs * rhs,
//!         "/" => lhs / rhs,
//!         _ => lhs % rhs,
//!     };
//!     result.to_string()
//! });
//!
//! assert_eq!(compiler.compile("1+2*(2+2)").unwrap(), "9");
//! assert_eq!(compiler.compile("7%3").unwrap(), "1");
//! ```

pub mod automata;
mod code;
mod compiler;
mod error;
pub mod examples;
pub mod grammar;
pub mod lex_compiler;
mod logger;
pub mod parser_compiler;
mod regex;
mod runtime;
mod syntax_tree;

use lex_compiler::LexCompilerResult;
use once_cell::unsync::OnceCell;
use parser_compiler::ParserCompilerResult;
use std::collections::HashMap;
use std::rc::Rc;

/// A trait implemented by the uniform exchange type which is moved through the value stack
/// during parsing.
///
/// The parser never inspects a value. It creates one from the matched lexeme when a terminal
/// is shifted, hands slices of values to the registered actions on every reduction and
/// returns the last remaining value when the input is accepted.
pub trait ValueImpl: Clone {
    /// Create a value for a shifted terminal from its matched lexeme.
    fn from_lexeme(lexeme: &str) -> Self;
    /// Default value for a reduction without a registered action.
    fn empty() -> Self;
}

impl ValueImpl for String {
    fn from_lexeme(lexeme: &str) -> Self {
        lexeme.to_string()
    }
    fn empty() -> Self {
        String::new()
    }
}

/// A semantic action callable transforming the values of a matched production into a single
/// result value.
pub type ActionFn<V> = Rc<dyn Fn(&[V]) -> V>;

#[derive(Debug, Clone, Copy, Hash, PartialEq, Eq, PartialOrd, Ord)]
/// An index into the shared token table of a compiled grammar.
///
/// Terminals occupy the low indices and non-terminals the high indices. Index `0` is
/// reserved system-wide for the end-of-input terminal.
pub struct TokenId(pub(crate) usize);

impl TokenId {
    /// The reserved end-of-input token.
    pub const END: TokenId = TokenId(0);

    /// Position of the token in the token table.
    pub fn index(self) -> usize {
        self.0
    }
}

#[derive(Debug, Clone, Copy, Hash, PartialEq, Eq, PartialOrd, Ord)]
/// A dense index of a state inside a [StateMachine](automata::StateMachine).
///
/// State identifiers equal the position of the state in the owning machine and are rebased
/// whenever one machine is merged into another.
pub struct StateId(pub(crate) usize);

impl StateId {
    /// Position of the state in the owning machine.
    pub fn index(self) -> usize {
        self.0
    }
}

#[derive(Debug, Hash, Clone, Copy, PartialEq, Eq)]
/// Element of the tokenized input: a terminal id together with the byte range it matched.
pub struct Lexeme {
    pub token: TokenId,
    pub start: usize,
    pub end: usize,
}

#[derive(Debug)]
/// An error returned due to a failed grammar build: regex syntax errors, unresolved symbol
/// references, redefined tokens or malformed grammar source.
pub struct GrammarError {
    what: String,
    message: String,
    pointer: Option<usize>,
}

#[derive(Debug, Clone)]
/// An error returned when an input string could not be compiled: an unrecognized token, a
/// parse table miss or an unregistered action.
pub struct ParseError {
    pub pointer: usize,
    pub message: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
/// A reference to one production of a non-terminal in the token table.
pub struct ProductionRef {
    pub non_terminal: TokenId,
    pub production: usize,
}

#[derive(Debug, Clone)]
/// A grammar conflict detected while building the parse tables.
///
/// Conflicts do not abort the build. A shift/reduce conflict resolves to the shift and a
/// reduce/reduce conflict to the production declared first; a lexer tie resolves to the
/// token declared first.
pub enum Conflict {
    ShiftReduce {
        state: StateId,
        terminal: TokenId,
        reduce: ProductionRef,
    },
    ReduceReduce {
        state: StateId,
        terminal: TokenId,
        kept: ProductionRef,
        dropped: ProductionRef,
    },
    LexerTie {
        kept: TokenId,
        dropped: TokenId,
    },
}

#[derive(Debug, PartialEq, Eq, Clone, Copy)]
/// A enum structure to assign multiple level debugging to the compiler pipeline.
pub enum Log<T> {
    None,
    Default(T),
    Success(T),
    Result(T),
    Verbose(T),
}

#[derive(Debug, Clone, Copy, Hash, PartialEq, Eq)]
/// The line and column information at code point.
pub struct Position {
    pub line: usize,
    pub column: usize,
}

/// A wrapper for the input text to be compiled with lines information.
pub struct Code<'c> {
    pub value: &'c [u8],
    line_breaks: OnceCell<Vec<usize>>,
}

#[derive(Clone)]
/// Concrete syntax tree of a compiled input.
///
/// Terminal leaves carry the matched lexeme; every reduction becomes an interior node named
/// after the non-terminal it produced.
pub struct SyntaxTree {
    pub symbol: String,
    pub lexeme: Option<String>,
    pub start: usize,
    pub end: usize,
    pub children: Vec<SyntaxTree>,
}

/// A compiled grammar: the lexer DFA, the LR(1) parse tables and the registered semantic
/// actions.
///
/// The compiled tables are immutable after construction; [compile](Compiler::compile) keeps
/// all mutable parse state in locals and may be called any number of times.
pub struct Compiler<V: ValueImpl = String> {
    lexer: LexCompilerResult,
    parser: ParserCompilerResult,
    actions: HashMap<String, ActionFn<V>>,
    conflicts: Vec<Conflict>,
    debug: OnceCell<Log<&'static str>>,
}

impl<V: ValueImpl> std::fmt::Debug for Compiler<V> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Compiler")
            .field("lexer", &self.lexer)
            .field("parser", &self.parser)
            .field("actions", &self.actions.keys().collect::<Vec<_>>())
            .field("conflicts", &self.conflicts)
            .finish()
    }
}
