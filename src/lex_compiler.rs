//! Compiles the token definitions of a grammar into a single lexer DFA.
//!
//! Terminals are numbered in declaration order with id 0 reserved for the end-of-input
//! token. Every definition's pattern is compiled to an NFA whose accepting states carry the
//! terminal id; the NFAs are unioned under a fresh start state and determinized. When two
//! patterns accept the same input the earliest declared terminal wins.

use crate::automata::{determinize_with, CharSet, Dfa, Nfa};
use crate::grammar::{Associativity, GrammarAst, TokenPattern};
use crate::regex::{class_expression, RegexParser};
use crate::{Conflict, GrammarError, TokenId};
use std::collections::BTreeSet;

#[derive(Debug, Clone)]
/// A terminal of the compiled grammar.
pub struct Terminal {
    pub name: String,
    pub tag: Option<String>,
    pub assoc: Associativity,
    /// Display form of the pattern the terminal was declared with.
    pub pattern: String,
}

/// Result of the lexer compilation: the ordered terminal table and the lexer DFA.
#[derive(Debug)]
pub struct LexCompilerResult {
    /// Terminal records; the position in the sequence is the terminal id.
    pub terminals: Vec<Terminal>,
    /// Lexer DFA; the reduction tag of an accepting state names the matched terminal.
    pub dfa: Dfa<(), TokenId, CharSet>,
    /// Lexer ties resolved during determinization.
    pub conflicts: Vec<Conflict>,
}

pub struct LexCompiler;

impl LexCompiler {
    pub fn compile(ast: &GrammarAst) -> Result<LexCompilerResult, GrammarError> {
        let mut terminals = vec![Terminal {
            name: "$end".to_string(),
            tag: None,
            assoc: Associativity::Token,
            pattern: String::new(),
        }];

        let mut nfa: Nfa<(), TokenId, CharSet> = Nfa::new();
        let start = nfa.insert();
        nfa.set_start(start);

        for definition in &ast.definitions {
            if terminals.iter().any(|t| t.name == definition.name) {
                return Err(GrammarError::new(
                    "TokenError",
                    format!("token '{}' already defined", definition.name),
                ));
            }

            let id = TokenId(terminals.len());
            terminals.push(Terminal {
                name: definition.name.clone(),
                tag: definition.tag.clone(),
                assoc: definition.assoc,
                pattern: match &definition.pattern {
                    TokenPattern::Regex(pattern) => format!("/{}/", pattern),
                    TokenPattern::Literal(c) => format!("{:?}", c),
                },
            });

            let mut token_nfa = match &definition.pattern {
                TokenPattern::Regex(pattern) => RegexParser::new(pattern)
                    .compile()
                    .map_err(|err| err.context(&format!("token '{}'", definition.name)))?,
                TokenPattern::Literal(c) => {
                    if !c.is_ascii() {
                        return Err(GrammarError::new(
                            "TokenError",
                            format!("literal {:?} is outside the ASCII alphabet", c),
                        ));
                    }
                    class_expression(CharSet::single(*c as u8))
                }
            };

            for accept in token_nfa.accepts().clone() {
                token_nfa[accept].set_reduce(Some(id));
            }

            let mapping = nfa.insert_machine(&token_nfa);
            nfa.connect_epsilon(start, mapping[token_nfa.start().index()]);
            for accept in token_nfa.accepts() {
                nfa.insert_accept(mapping[accept.index()]);
            }
        }

        // Determinize; a tie between two terminals resolves to the earliest declaration.
        let mut ties: BTreeSet<(TokenId, TokenId)> = BTreeSet::new();
        let dfa = determinize_with(
            &nfa,
            |lhs: &TokenId, rhs: &TokenId| {
                if lhs != rhs {
                    ties.insert((*lhs.min(rhs), *lhs.max(rhs)));
                }
                *lhs.min(rhs)
            },
            |lhs: &(), _: &()| *lhs,
        );

        if let Some(id) = dfa[dfa.start()].reduce() {
            return Err(GrammarError::new(
                "TokenError",
                format!("token '{}' matches the empty string", terminals[id.0].name),
            ));
        }

        let conflicts = ties
            .into_iter()
            .map(|(kept, dropped)| Conflict::LexerTie { kept, dropped })
            .collect();

        Ok(LexCompilerResult {
            terminals,
            dfa,
            conflicts,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::LexCompiler;
    use crate::grammar::GrammarAst;
    use crate::{Conflict, TokenId};

    fn compile(definitions: &str) -> super::LexCompilerResult {
        let source = format!("{}\n%%\ns : ;", definitions);
        let ast = GrammarAst::parse(&source).unwrap();
        LexCompiler::compile(&ast).unwrap()
    }

    #[test]
    fn terminal_ids_follow_declaration_order() {
        let result = compile("%token IF if\n%token ID [a-z]+");
        let names: Vec<&str> = result.terminals.iter().map(|t| t.name.as_str()).collect();
        assert_eq!(names, vec!["$end", "IF", "ID"]);
    }

    #[test]
    fn overlapping_tokens_report_a_tie() {
        let result = compile("%token IF if\n%token ID [a-z]+");
        assert!(result
            .conflicts
            .iter()
            .any(|c| matches!(c, Conflict::LexerTie { kept: TokenId(1), dropped: TokenId(2) })));
    }

    #[test]
    fn disjoint_tokens_have_no_tie() {
        let result = compile("%token NUMBER [0-9]+\n%token NAME [a-z]+");
        assert!(result.conflicts.is_empty());
    }

    #[test]
    fn outgoing_edges_stay_disjoint() {
        let result = compile("%token IF if\n%token ID [a-z]+\n%token NUMBER [0-9]+");
        for state in result.dfa.iter() {
            for (i, (lhs, _)) in state.next().iter().enumerate() {
                for (rhs, _) in state.next().iter().skip(i + 1) {
                    assert!(!lhs.intersects(rhs));
                }
            }
        }
    }

    #[test]
    fn nullable_patterns_are_rejected() {
        let source = "%token STARS (a)*\n%%\ns : STARS ;";
        let ast = GrammarAst::parse(source).unwrap();
        assert!(LexCompiler::compile(&ast).is_err());
    }

    #[test]
    fn duplicate_names_are_rejected() {
        let source = "%token A a\n%token A b\n%%\ns : A ;";
        let ast = GrammarAst::parse(source).unwrap();
        assert!(LexCompiler::compile(&ast).is_err());
    }
}
