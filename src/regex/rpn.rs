use super::lexer::RegexLexer;
use super::RegexToken;
use crate::GrammarError;

/// Shunting yard conversion of the token stream to reverse polish notation.
///
/// Parentheses only delimit and never appear in the output.
pub(super) fn compile_rpn(lexer: &mut RegexLexer) -> Result<Vec<(RegexToken, usize)>, GrammarError> {
    let mut output: Vec<(RegexToken, usize)> = Vec::new();
    let mut operator_stack: Vec<(RegexToken, usize)> = Vec::new();

    loop {
        let (token, pos) = lexer.next()?;

        match token {
            RegexToken::End => break,
            RegexToken::Class(_) => output.push((token, pos)),
            RegexToken::LeftParen => operator_stack.push((token, pos)),
            RegexToken::RightParen => loop {
                match operator_stack.pop() {
                    None => {
                        return Err(GrammarError::with_pointer(
                            "RegexError",
                            "mismatched parenthesis".to_string(),
                            pos,
                        ))
                    }
                    Some((RegexToken::LeftParen, _)) => break,
                    Some(op) => output.push(op),
                }
            },
            RegexToken::Op(op) => {
                while let Some((top, _)) = operator_stack.last() {
                    match top {
                        RegexToken::Op(top_op) if top_op.priority() >= op.priority() => {
                            output.push(operator_stack.pop().unwrap());
                        }
                        _ => break,
                    }
                }
                operator_stack.push((token, pos));
            }
        }
    }

    while let Some((op, pos)) = operator_stack.pop() {
        if let RegexToken::LeftParen = op {
            return Err(GrammarError::with_pointer(
                "RegexError",
                "mismatched parenthesis".to_string(),
                pos,
            ));
        }
        output.push((op, pos));
    }

    Ok(output)
}

#[cfg(test)]
mod tests {
    use super::super::lexer::RegexLexer;
    use super::super::{RegexOp, RegexToken};
    use super::compile_rpn;

    fn shape(pattern: &str) -> Vec<char> {
        let mut lexer = RegexLexer::new(pattern);
        compile_rpn(&mut lexer)
            .unwrap()
            .into_iter()
            .map(|(t, _)| match t {
                RegexToken::Class(_) => 'c',
                RegexToken::Op(RegexOp::Concat) => '.',
                RegexToken::Op(RegexOp::Alternate) => '|',
                RegexToken::Op(RegexOp::ZeroMore) => '*',
                RegexToken::Op(RegexOp::OneMore) => '+',
                RegexToken::Op(RegexOp::ZeroOne) => '?',
                _ => '!',
            })
            .collect()
    }

    #[test]
    fn concatenation_binds_tighter_than_alternation() {
        assert_eq!(shape("ab|cd"), vec!['c', 'c', '.', 'c', 'c', '.', '|']);
    }

    #[test]
    fn closure_binds_tighter_than_concatenation() {
        assert_eq!(shape("ab+"), vec!['c', 'c', '+', '.']);
    }

    #[test]
    fn parentheses_regroup_and_disappear() {
        assert_eq!(shape("(ab)+"), vec!['c', 'c', '.', '+']);
        assert_eq!(shape("a|(b|c)"), vec!['c', 'c', 'c', '|', '|']);
    }
}
