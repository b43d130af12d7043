use super::{RegexOp, RegexToken, TokenNfa};
use crate::automata::CharSet;
use crate::GrammarError;

/// NFA recognizing exactly the characters of the class.
pub(crate) fn class_expression(class: CharSet) -> TokenNfa {
    let mut out = TokenNfa::new();
    let start = out.insert();
    let end = out.insert();
    out.set_start(start);
    out.insert_accept(end);
    out.connect(start, end, class);
    out
}

/// Concatenation: accepts of the left machine gain an epsilon to the start of the right
/// machine; the accepts of the right machine become the accepts of the result.
fn concatenation_expression(lhs: TokenNfa, rhs: &TokenNfa) -> TokenNfa {
    let mut out = lhs;
    let mapping = out.insert_machine(rhs);

    let lhs_accepts: Vec<_> = out.accepts().iter().copied().collect();
    out.clear_accepts();
    for accept in rhs.accepts() {
        out.insert_accept(mapping[accept.index()]);
    }

    let rhs_start = mapping[rhs.start().index()];
    for accept in lhs_accepts {
        out.connect_epsilon(accept, rhs_start);
    }

    out
}

/// Alternation: a fresh start with epsilons into both machines and a fresh common accept.
fn union_expression(lhs: &TokenNfa, rhs: &TokenNfa) -> TokenNfa {
    let mut out = TokenNfa::new();
    let start = out.insert();
    let end = out.insert();
    out.set_start(start);
    out.insert_accept(end);

    for expr in [lhs, rhs] {
        let mapping = out.insert_machine(expr);
        out.connect_epsilon(start, mapping[expr.start().index()]);
        for accept in expr.accepts() {
            out.connect_epsilon(mapping[accept.index()], end);
        }
    }

    out
}

fn one_or_more_expression(mut expr: TokenNfa) -> TokenNfa {
    let start = expr.start();
    for accept in expr.accepts().clone() {
        expr.connect_epsilon(accept, start);
    }
    expr
}

fn zero_or_one_expression(mut expr: TokenNfa) -> TokenNfa {
    let start = expr.start();
    for accept in expr.accepts().clone() {
        expr.connect_epsilon(start, accept);
    }
    expr
}

fn zero_or_more_expression(mut expr: TokenNfa) -> TokenNfa {
    let start = expr.start();
    for accept in expr.accepts().clone() {
        expr.connect_epsilon(start, accept);
        expr.connect_epsilon(accept, start);
    }
    expr
}

/// Assemble the NFA from the RPN form of the pattern.
pub(super) fn compile_nfa(rpn: &[(RegexToken, usize)]) -> Result<TokenNfa, GrammarError> {
    let mut stack: Vec<TokenNfa> = Vec::new();

    for (token, pos) in rpn {
        match token {
            RegexToken::Class(class) => stack.push(class_expression(*class)),
            RegexToken::Op(op) => match op {
                RegexOp::Concat | RegexOp::Alternate => {
                    let rhs = stack.pop();
                    let lhs = stack.pop();
                    let (lhs, rhs) = match (lhs, rhs) {
                        (Some(lhs), Some(rhs)) => (lhs, rhs),
                        _ => return Err(incomplete(*pos)),
                    };
                    let merged = match op {
                        RegexOp::Concat => concatenation_expression(lhs, &rhs),
                        _ => union_expression(&lhs, &rhs),
                    };
                    stack.push(merged);
                }
                RegexOp::OneMore | RegexOp::ZeroMore | RegexOp::ZeroOne => {
                    let expr = match stack.pop() {
                        Some(expr) => expr,
                        None => return Err(incomplete(*pos)),
                    };
                    stack.push(match op {
                        RegexOp::OneMore => one_or_more_expression(expr),
                        RegexOp::ZeroMore => zero_or_more_expression(expr),
                        _ => zero_or_one_expression(expr),
                    });
                }
            },
            RegexToken::LeftParen | RegexToken::RightParen | RegexToken::End => {
                return Err(incomplete(*pos))
            }
        }
    }

    match stack.len() {
        1 => Ok(stack.pop().unwrap()),
        0 => Err(GrammarError::with_pointer(
            "RegexError",
            "empty pattern".to_string(),
            0,
        )),
        _ => Err(GrammarError::with_pointer(
            "RegexError",
            "invalid regular expression: missing operator between terms".to_string(),
            0,
        )),
    }
}

fn incomplete(pos: usize) -> GrammarError {
    GrammarError::with_pointer(
        "RegexError",
        "incomplete regular expression".to_string(),
        pos,
    )
}
