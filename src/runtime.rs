//! Runtime execution of a compiled grammar over an input string.
//!
//! The token cursor walks the lexer DFA with maximal munch: it remembers the latest
//! accepting position while trying to extend the match and rewinds to it when the walk dies.
//! The driver keeps two parallel stacks, a control stack of shifted symbols and states and a
//! value stack, and consults the action table of the top state on the current lookahead.

use crate::automata::{CharSet, Dfa};
use crate::lex_compiler::LexCompilerResult;
use crate::parser_compiler::{ParseAction, ParserCompilerResult};
use crate::{
    ActionFn, Code, Lexeme, Log, ParseError, StateId, SyntaxTree, TokenId, ValueImpl,
};
use std::collections::HashMap;

impl Lexeme {
    pub fn new(token: TokenId, start: usize, end: usize) -> Self {
        Self { token, start, end }
    }
}

/// Maximal munch token stream over the lexer DFA.
///
/// The end-of-input token is produced exactly once, after the last byte has been consumed.
pub(crate) struct TokenCursor<'c, 'm> {
    code: &'c Code<'c>,
    dfa: &'m Dfa<(), TokenId, CharSet>,
    pos: usize,
}

impl<'c, 'm> TokenCursor<'c, 'm> {
    pub fn new(code: &'c Code<'c>, dfa: &'m Dfa<(), TokenId, CharSet>) -> Self {
        Self { code, dfa, pos: 0 }
    }

    pub fn next(&mut self) -> Result<Lexeme, ParseError> {
        let input = self.code.value;

        if self.pos >= input.len() {
            return Ok(Lexeme::new(TokenId::END, input.len(), input.len()));
        }

        let token_start = self.pos;
        let mut cursor = self.pos;
        let mut state = self.dfa.start();
        let mut last_accept: Option<(usize, TokenId)> = None;

        loop {
            if let Some(tag) = self.dfa[state].reduce() {
                last_accept = Some((cursor, *tag));
            }

            let next_state = input.get(cursor).and_then(|byte| {
                self.dfa[state]
                    .next()
                    .iter()
                    .find(|(class, _)| class.test(*byte))
                    .map(|(_, target)| *target)
            });

            match next_state {
                Some(target) => {
                    state = target;
                    cursor += 1;
                }
                None => {
                    return match last_accept {
                        Some((end, token)) => {
                            self.pos = end;
                            Ok(Lexeme::new(token, token_start, end))
                        }
                        None => Err(ParseError::new(
                            cursor,
                            format!(
                                "Unknown token @ {}",
                                self.code.obtain_position(cursor.min(input.len()))
                            ),
                        )),
                    };
                }
            }
        }
    }
}

/// Shift/reduce driver over the compiled tables. Holds no state across runs.
pub(crate) struct Driver<'d, V: ValueImpl> {
    pub lexer: &'d LexCompilerResult,
    pub parser: &'d ParserCompilerResult,
    pub actions: &'d HashMap<String, ActionFn<V>>,
    pub debug: Log<&'static str>,
}

impl<'d, V: ValueImpl> Driver<'d, V> {
    pub fn run(
        &self,
        code: &Code,
        build_tree: bool,
    ) -> Result<(V, Option<SyntaxTree>), ParseError> {
        let mut cursor = TokenCursor::new(code, &self.lexer.dfa);
        let mut lookahead = cursor.next()?;

        let mut states: Vec<StateId> = vec![self.parser.dfa.start()];
        let mut symbols: Vec<TokenId> = Vec::new();
        let mut values: Vec<V> = Vec::new();
        let mut trees: Vec<SyntaxTree> = Vec::new();

        loop {
            let state = states[states.len() - 1];

            let action = match self.parser.dfa[state].value().actions.get(&lookahead.token) {
                Some(action) => action.clone(),
                None => {
                    #[cfg(debug_assertions)]
                    if self.debug.order() >= Log::Default(()).order() {
                        println!(
                            "[{}; ParserError]: no action in state {} on {:?} at {}",
                            self.debug,
                            state.index(),
                            self.parser.tokens.name(lookahead.token),
                            code.obtain_position(lookahead.start)
                        );
                    }
                    return Err(ParseError::new(
                        lookahead.start,
                        format!(
                            "Compilation error at token '{}' @ {}",
                            self.lexeme_text(code, &lookahead),
                            code.obtain_position(lookahead.start)
                        ),
                    ));
                }
            };

            match action {
                ParseAction::Shift(target) => {
                    let text = self.lexeme_text(code, &lookahead);
                    states.push(target);
                    symbols.push(lookahead.token);
                    values.push(V::from_lexeme(text));
                    if build_tree {
                        trees.push(SyntaxTree::leaf(
                            self.parser.tokens.name(lookahead.token).to_string(),
                            text.to_string(),
                            lookahead.start,
                            lookahead.end,
                        ));
                    }

                    #[cfg(debug_assertions)]
                    if self.debug.order() >= Log::Verbose(()).order() {
                        println!(
                            "[{}; Shift]: {:?} -> state {}",
                            self.debug,
                            text,
                            target.index()
                        );
                    }

                    lookahead = cursor.next()?;
                }
                ParseAction::Reduce { production, pop }
                | ParseAction::Accept { production, pop } => {
                    let accepting = matches!(action, ParseAction::Accept { .. });

                    let prod = match self.parser.tokens.production(production) {
                        Some(prod) => prod,
                        None => {
                            return Err(ParseError::new(
                                lookahead.start,
                                "Compilation error: invalid production reference".to_string(),
                            ))
                        }
                    };

                    let args = values.split_off(values.len() - pop);
                    states.truncate(states.len() - pop);
                    symbols.truncate(symbols.len() - pop);

                    let result = match &prod.action {
                        Some(name) => match self.actions.get(name) {
                            Some(action) => action(&args),
                            None => {
                                return Err(ParseError::new(
                                    lookahead.start,
                                    format!("Undefined action '{}'", name),
                                ))
                            }
                        },
                        None => V::empty(),
                    };

                    let non_terminal = production.non_terminal;

                    let node = if build_tree {
                        let children = trees.split_off(trees.len() - pop);
                        let (start, end) = match (children.first(), children.last()) {
                            (Some(first), Some(last)) => (first.start, last.end),
                            _ => (lookahead.start, lookahead.start),
                        };
                        Some(SyntaxTree::new(
                            self.parser.tokens.name(non_terminal).to_string(),
                            start,
                            end,
                            children,
                        ))
                    } else {
                        None
                    };

                    // the accept reduction terminates once the stack is back at the
                    // initial state; anywhere else it behaves like a plain reduce
                    if accepting && states.len() == 1 {
                        #[cfg(debug_assertions)]
                        if self.debug.order() >= Log::Success(()).order() {
                            println!("[{}; Compilation success]", self.debug);
                        }
                        return Ok((result, node));
                    }

                    let top = states[states.len() - 1];
                    let target = self.parser.dfa[top]
                        .next()
                        .iter()
                        .find(|(symbol, _)| *symbol == non_terminal)
                        .map(|(_, target)| *target);

                    let target = match target {
                        Some(target) => target,
                        None => {
                            return Err(ParseError::new(
                                lookahead.start,
                                format!(
                                    "Compilation error at token '{}' @ {}",
                                    self.lexeme_text(code, &lookahead),
                                    code.obtain_position(lookahead.start)
                                ),
                            ))
                        }
                    };

                    states.push(target);
                    symbols.push(non_terminal);
                    values.push(result);
                    if let Some(node) = node {
                        trees.push(node);
                    }

                    #[cfg(debug_assertions)]
                    if self.debug.order() >= Log::Verbose(()).order() {
                        let stack: Vec<String> = states
                            .iter()
                            .zip(std::iter::once(None).chain(symbols.iter().map(Some)))
                            .map(|(s, t)| match t {
                                Some(t) => {
                                    format!("[{}] {}", self.parser.tokens.name(*t), s.index())
                                }
                                None => format!("{}", s.index()),
                            })
                            .collect();
                        println!(
                            "[{}; Reduce]: {} <- {} | {}",
                            self.debug,
                            self.parser.tokens.name(non_terminal),
                            pop,
                            stack.join(" ")
                        );
                    }
                }
            }
        }
    }

    fn lexeme_text<'a>(&self, code: &'a Code, lexeme: &Lexeme) -> &'a str {
        if lexeme.token == TokenId::END {
            return "$end";
        }
        // the lexer only ever matches ASCII bytes
        unsafe { std::str::from_utf8_unchecked(&code.value[lexeme.start..lexeme.end]) }
    }
}
