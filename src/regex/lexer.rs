use super::{RegexOp, RegexToken};
use crate::automata::CharSet;
use crate::GrammarError;

/// Lexer over a regex pattern with a one token lookahead used to synthesize the implicit
/// concatenation operator.
///
/// Concatenation is inserted between two character classes, between a closing parenthesis
/// and a class, and between a class and an opening parenthesis.
pub(super) struct RegexLexer<'p> {
    pattern: &'p [u8],
    pos: usize,
    c0: (RegexToken, usize),
    c1: (RegexToken, usize),
    primed: bool,
}

impl<'p> RegexLexer<'p> {
    pub fn new(pattern: &'p str) -> Self {
        Self {
            pattern: pattern.as_bytes(),
            pos: 0,
            c0: (RegexToken::End, 0),
            c1: (RegexToken::End, 0),
            primed: false,
        }
    }

    pub fn next(&mut self) -> Result<(RegexToken, usize), GrammarError> {
        if !self.primed {
            self.c0 = self.lex_raw()?;
            self.c1 = self.lex_raw()?;
            self.primed = true;
        }

        let ret = self.c0;

        let concatenated = matches!(
            (self.c0.0, self.c1.0),
            (RegexToken::Class(_), RegexToken::Class(_))
                | (RegexToken::RightParen, RegexToken::Class(_))
                | (RegexToken::Class(_), RegexToken::LeftParen)
        );

        if concatenated {
            self.c0 = (RegexToken::Op(RegexOp::Concat), self.c1.1);
        } else {
            self.c0 = self.c1;
            self.c1 = self.lex_raw()?;
        }

        Ok(ret)
    }

    fn lex_raw(&mut self) -> Result<(RegexToken, usize), GrammarError> {
        let start = self.pos;

        let byte = match self.pattern.get(self.pos) {
            Some(b) => *b,
            None => return Ok((RegexToken::End, start)),
        };

        let token = match byte {
            b'?' => RegexToken::Op(RegexOp::ZeroOne),
            b'*' => RegexToken::Op(RegexOp::ZeroMore),
            b'+' => RegexToken::Op(RegexOp::OneMore),
            b'|' => RegexToken::Op(RegexOp::Alternate),
            b'(' => RegexToken::LeftParen,
            b')' => RegexToken::RightParen,
            b'\\' => {
                self.pos += 1;
                let escaped = match self.pattern.get(self.pos) {
                    Some(b) => *b,
                    None => {
                        return Err(GrammarError::with_pointer(
                            "RegexError",
                            "dangling escape character".to_string(),
                            start,
                        ))
                    }
                };
                let class = escape_class(escaped).ok_or_else(|| {
                    GrammarError::with_pointer(
                        "RegexError",
                        format!("unknown escape character '\\{}'", escaped as char),
                        start,
                    )
                })?;
                self.pos += 1;
                return Ok((RegexToken::Class(class), start));
            }
            b'[' => return self.lex_class(),
            b if b < 128 => RegexToken::Class(CharSet::single(b)),
            b => {
                return Err(GrammarError::with_pointer(
                    "RegexError",
                    format!("non-ASCII byte 0x{:02x} in pattern", b),
                    start,
                ))
            }
        };

        self.pos += 1;
        Ok((token, start))
    }

    /// Bracketed character class with ranges and escapes.
    fn lex_class(&mut self) -> Result<(RegexToken, usize), GrammarError> {
        let open = self.pos;
        self.pos += 1;

        let mut class = CharSet::EMPTY;
        let mut range_start: Option<u8> = None;
        let mut in_range = false;

        loop {
            let byte = match self.pattern.get(self.pos) {
                Some(b) => *b,
                None => {
                    return Err(GrammarError::with_pointer(
                        "RegexError",
                        "unterminated character class".to_string(),
                        open,
                    ))
                }
            };

            if byte == b']' {
                self.pos += 1;
                break;
            }

            if byte == b'-' {
                if range_start.is_none() || in_range {
                    return Err(GrammarError::with_pointer(
                        "RegexError",
                        "mismatched character range '-'".to_string(),
                        self.pos,
                    ));
                }
                in_range = true;
                self.pos += 1;
                continue;
            }

            // a single member character or an escape standing for one or more characters
            let element = if byte == b'\\' {
                let escape_pos = self.pos;
                self.pos += 1;
                let escaped = match self.pattern.get(self.pos) {
                    Some(b) => *b,
                    None => {
                        return Err(GrammarError::with_pointer(
                            "RegexError",
                            "unterminated character class".to_string(),
                            open,
                        ))
                    }
                };
                self.pos += 1;
                match escaped {
                    b'-' => ClassElement::Single(b'-'),
                    b']' => ClassElement::Single(b']'),
                    _ => match escape_class(escaped) {
                        Some(set) if set.len() == 1 => {
                            ClassElement::Single(set.chars().next().unwrap())
                        }
                        Some(set) => ClassElement::Set(set),
                        None => {
                            return Err(GrammarError::with_pointer(
                                "RegexError",
                                format!("unknown escape character '\\{}'", escaped as char),
                                escape_pos,
                            ))
                        }
                    },
                }
            } else if byte < 128 {
                self.pos += 1;
                ClassElement::Single(byte)
            } else {
                return Err(GrammarError::with_pointer(
                    "RegexError",
                    format!("non-ASCII byte 0x{:02x} in character class", byte),
                    self.pos,
                ));
            };

            if in_range {
                let hi = match element {
                    ClassElement::Single(hi) => hi,
                    ClassElement::Set(_) => {
                        return Err(GrammarError::with_pointer(
                            "RegexError",
                            "bad character range endpoint".to_string(),
                            self.pos,
                        ))
                    }
                };
                let lo = range_start.take().unwrap();
                if lo > hi {
                    return Err(GrammarError::with_pointer(
                        "RegexError",
                        format!("bad character range '{}-{}'", lo as char, hi as char),
                        self.pos,
                    ));
                }
                class.insert_range(lo, hi);
                in_range = false;
            } else {
                match element {
                    ClassElement::Single(c) => {
                        class.set(c);
                        range_start = Some(c);
                    }
                    ClassElement::Set(set) => {
                        class.merge(&set);
                        range_start = None;
                    }
                }
            }
        }

        if in_range {
            return Err(GrammarError::with_pointer(
                "RegexError",
                "mismatched character range '-'".to_string(),
                self.pos,
            ));
        }

        if class.is_empty() {
            return Err(GrammarError::with_pointer(
                "RegexError",
                "empty character class".to_string(),
                open,
            ));
        }

        Ok((RegexToken::Class(class), open))
    }
}

enum ClassElement {
    Single(u8),
    Set(CharSet),
}

fn escape_class(escaped: u8) -> Option<CharSet> {
    match escaped {
        b'n' => Some(CharSet::single(b'\n')),
        b't' => Some(CharSet::single(b'\t')),
        b'd' => Some(CharSet::range(b'0', b'9')),
        b'\\' | b'(' | b')' | b'[' | b']' | b'|' | b'?' | b'+' | b'*' | b'-' | b'/' => {
            Some(CharSet::single(escaped))
        }
        _ => None,
    }
}
