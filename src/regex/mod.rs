//! Regular expression front end of the lexer pipeline.
//!
//! A pattern is lexed into character classes, operators and parentheses with implicit
//! concatenation synthesized between adjacent operands, converted to reverse polish
//! notation with the shunting yard algorithm and finally assembled into a Thompson style
//! NFA with character class edges.

mod lexer;
mod rpn;
mod thompson;

use crate::automata::{CharSet, Nfa};
use crate::{GrammarError, TokenId};
use lexer::RegexLexer;

pub(crate) use thompson::class_expression;

/// NFA over character class edges whose accepting states are tagged with the id of the
/// token they match.
pub(crate) type TokenNfa = Nfa<(), TokenId, CharSet>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum RegexOp {
    ZeroOne,
    ZeroMore,
    OneMore,
    Concat,
    Alternate,
}

impl RegexOp {
    /// Operator priority for the infix to RPN conversion.
    pub(crate) fn priority(self) -> u8 {
        match self {
            RegexOp::ZeroOne | RegexOp::ZeroMore | RegexOp::OneMore => 2,
            RegexOp::Concat => 1,
            RegexOp::Alternate => 0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) enum RegexToken {
    Class(CharSet),
    Op(RegexOp),
    LeftParen,
    RightParen,
    End,
}

/// Compiles one regex pattern into a [TokenNfa].
pub(crate) struct RegexParser<'p> {
    lexer: RegexLexer<'p>,
}

impl<'p> RegexParser<'p> {
    pub fn new(pattern: &'p str) -> Self {
        Self {
            lexer: RegexLexer::new(pattern),
        }
    }

    pub fn compile(mut self) -> Result<TokenNfa, GrammarError> {
        let rpn = rpn::compile_rpn(&mut self.lexer)?;
        thompson::compile_nfa(&rpn)
    }
}

#[cfg(test)]
mod tests {
    use super::{RegexParser, TokenNfa};
    use crate::automata::determinize;
    use crate::StateId;

    fn matches(nfa: &TokenNfa, input: &str) -> bool {
        let dfa = determinize(nfa);
        let mut state = dfa.start();
        for byte in input.bytes() {
            match dfa[state]
                .next()
                .iter()
                .find(|(edge, _)| edge.test(byte))
            {
                Some((_, target)) => state = *target,
                None => return false,
            }
        }
        dfa.is_accept(state)
    }

    fn compile(pattern: &str) -> TokenNfa {
        let mut nfa = RegexParser::new(pattern).compile().unwrap();
        // tag accepts so accept survival through determinization is visible
        for id in nfa.accepts().clone() {
            nfa[id].set_reduce(Some(crate::TokenId(1)));
        }
        nfa
    }

    #[test]
    fn single_class() {
        let nfa = compile("[0-9]");
        assert!(matches(&nfa, "5"));
        assert!(!matches(&nfa, "a"));
        assert!(!matches(&nfa, ""));
        assert!(!matches(&nfa, "55"));
    }

    #[test]
    fn one_or_more() {
        let nfa = compile("[0-9]+");
        assert!(matches(&nfa, "1"));
        assert!(matches(&nfa, "12345"));
        assert!(!matches(&nfa, ""));
    }

    #[test]
    fn zero_or_more() {
        let nfa = compile("a(b)*");
        assert!(matches(&nfa, "a"));
        assert!(matches(&nfa, "abbb"));
        assert!(!matches(&nfa, "ba"));
    }

    #[test]
    fn optional() {
        let nfa = compile("ab?");
        assert!(matches(&nfa, "a"));
        assert!(matches(&nfa, "ab"));
        assert!(!matches(&nfa, "abb"));
    }

    #[test]
    fn alternation_and_grouping() {
        let nfa = compile("(ab)|(cd)");
        assert!(matches(&nfa, "ab"));
        assert!(matches(&nfa, "cd"));
        assert!(!matches(&nfa, "ad"));
    }

    #[test]
    fn concatenation_of_literals() {
        let nfa = compile("if");
        assert!(matches(&nfa, "if"));
        assert!(!matches(&nfa, "i"));
        assert!(!matches(&nfa, "iff"));
    }

    #[test]
    fn escapes() {
        let nfa = compile(r"\+\d");
        assert!(matches(&nfa, "+4"));
        assert!(!matches(&nfa, "44"));
    }

    #[test]
    fn error_positions() {
        assert_eq!(
            RegexParser::new("(ab").compile().unwrap_err().pointer(),
            Some(0)
        );
        assert_eq!(
            RegexParser::new("a)b").compile().unwrap_err().pointer(),
            Some(1)
        );
        assert_eq!(
            RegexParser::new("[abc").compile().unwrap_err().pointer(),
            Some(0)
        );
        assert_eq!(
            RegexParser::new(r"a\qb").compile().unwrap_err().pointer(),
            Some(1)
        );
        assert!(RegexParser::new("").compile().is_err());
    }

    #[test]
    fn bad_ranges_are_rejected() {
        assert!(RegexParser::new("[z-a]").compile().is_err());
        assert!(RegexParser::new("[-a]").compile().is_err());
        assert!(RegexParser::new("[a-]").compile().is_err());
    }

    #[test]
    fn escaped_dash_in_class() {
        let nfa = compile(r"[a\-b]");
        assert!(matches(&nfa, "-"));
        assert!(matches(&nfa, "a"));
        assert!(matches(&nfa, "b"));
        assert!(!matches(&nfa, "c"));
    }

    #[test]
    fn accepts_carry_state_ids_inside_machine() {
        let nfa = compile("a|b");
        for id in nfa.accepts() {
            assert!(id.index() < nfa.len());
            let _ = &nfa[StateId(id.index())];
        }
    }
}
