use crate::GrammarError;

#[derive(Debug, Clone, PartialEq)]
pub(super) enum GrammarToken {
    Identifier(String),
    Literal(char),
    Tag(String),
    Regex(String),
    Action(String),
    Colon,
    Semicolon,
    Or,
    Mark,
    Token,
    Left,
    Right,
    NonAssoc,
    Start,
    End,
}

/// Lexer over the grammar source.
///
/// Regex patterns are read with [next_regex_token](GrammarLexer::next_regex_token): after
/// skipping trivia, the pattern is the maximal run of non-whitespace bytes. Every other
/// token is read with [next_token](GrammarLexer::next_token).
pub(super) struct GrammarLexer<'g> {
    source: &'g [u8],
    pos: usize,
}

impl<'g> GrammarLexer<'g> {
    pub fn new(source: &'g str) -> Self {
        Self {
            source: source.as_bytes(),
            pos: 0,
        }
    }

    pub fn next_token(&mut self) -> Result<(GrammarToken, usize), GrammarError> {
        self.skip_trivia()?;

        let start = self.pos;
        let byte = match self.source.get(self.pos) {
            Some(b) => *b,
            None => return Ok((GrammarToken::End, start)),
        };

        match byte {
            b':' => {
                self.pos += 1;
                Ok((GrammarToken::Colon, start))
            }
            b';' => {
                self.pos += 1;
                Ok((GrammarToken::Semicolon, start))
            }
            b'|' => {
                self.pos += 1;
                Ok((GrammarToken::Or, start))
            }
            b'%' => self.lex_directive(),
            b'\'' => self.lex_literal(),
            b'<' => self.lex_tag(),
            b'{' => self.lex_action(),
            b if b.is_ascii_alphabetic() || b == b'_' => {
                Ok((GrammarToken::Identifier(self.lex_identifier()), start))
            }
            b => Err(GrammarError::with_pointer(
                "GrammarSyntaxError",
                format!("unexpected character '{}'", b as char),
                start,
            )),
        }
    }

    /// Read a regex pattern: the maximal run of non-whitespace bytes.
    pub fn next_regex_token(&mut self) -> Result<(GrammarToken, usize), GrammarError> {
        self.skip_trivia()?;

        let start = self.pos;
        while self
            .source
            .get(self.pos)
            .map_or(false, |b| !b.is_ascii_whitespace())
        {
            self.pos += 1;
        }

        if self.pos == start {
            return Ok((GrammarToken::End, start));
        }

        let pattern = String::from_utf8_lossy(&self.source[start..self.pos]).into_owned();
        Ok((GrammarToken::Regex(pattern), start))
    }

    fn lex_identifier(&mut self) -> String {
        let start = self.pos;
        while self
            .source
            .get(self.pos)
            .map_or(false, |b| b.is_ascii_alphanumeric() || *b == b'_')
        {
            self.pos += 1;
        }
        String::from_utf8_lossy(&self.source[start..self.pos]).into_owned()
    }

    fn lex_directive(&mut self) -> Result<(GrammarToken, usize), GrammarError> {
        let start = self.pos;
        self.pos += 1;

        if self.source.get(self.pos) == Some(&b'%') {
            self.pos += 1;
            return Ok((GrammarToken::Mark, start));
        }

        let name = self.lex_identifier();
        let token = match name.as_str() {
            "token" => GrammarToken::Token,
            "left" => GrammarToken::Left,
            "right" => GrammarToken::Right,
            "nonassoc" => GrammarToken::NonAssoc,
            "start" => GrammarToken::Start,
            _ => {
                return Err(GrammarError::with_pointer(
                    "GrammarSyntaxError",
                    format!("unknown directive '%{}'", name),
                    start,
                ))
            }
        };

        Ok((token, start))
    }

    fn lex_literal(&mut self) -> Result<(GrammarToken, usize), GrammarError> {
        let start = self.pos;
        self.pos += 1;

        let byte = match self.source.get(self.pos) {
            Some(b) => *b,
            None => return Err(self.unterminated_literal(start)),
        };

        let c = if byte == b'\\' {
            self.pos += 1;
            match self.source.get(self.pos) {
                Some(b'n') => '\n',
                Some(b't') => '\t',
                Some(b'\\') => '\\',
                Some(b'\'') => '\'',
                Some(b) => {
                    return Err(GrammarError::with_pointer(
                        "GrammarSyntaxError",
                        format!("unknown escape character '\\{}' in literal", *b as char),
                        start,
                    ))
                }
                None => return Err(self.unterminated_literal(start)),
            }
        } else if byte == b'\'' {
            return Err(GrammarError::with_pointer(
                "GrammarSyntaxError",
                "empty literal".to_string(),
                start,
            ));
        } else {
            byte as char
        };
        self.pos += 1;

        if self.source.get(self.pos) != Some(&b'\'') {
            return Err(self.unterminated_literal(start));
        }
        self.pos += 1;

        Ok((GrammarToken::Literal(c), start))
    }

    fn unterminated_literal(&self, start: usize) -> GrammarError {
        GrammarError::with_pointer(
            "GrammarSyntaxError",
            "unterminated literal".to_string(),
            start,
        )
    }

    fn lex_tag(&mut self) -> Result<(GrammarToken, usize), GrammarError> {
        let start = self.pos;
        self.pos += 1;
        self.skip_spaces();

        let name = self.lex_identifier();
        if name.is_empty() {
            return Err(GrammarError::with_pointer(
                "GrammarSyntaxError",
                "expected identifier in tag".to_string(),
                start,
            ));
        }

        self.skip_spaces();
        if self.source.get(self.pos) != Some(&b'>') {
            return Err(GrammarError::with_pointer(
                "GrammarSyntaxError",
                "malformed tag, expected '>'".to_string(),
                start,
            ));
        }
        self.pos += 1;

        Ok((GrammarToken::Tag(name), start))
    }

    fn lex_action(&mut self) -> Result<(GrammarToken, usize), GrammarError> {
        let start = self.pos;
        self.pos += 1;
        self.skip_trivia()?;

        let name = self.lex_identifier();
        if name.is_empty() {
            return Err(GrammarError::with_pointer(
                "GrammarSyntaxError",
                "expected action name".to_string(),
                start,
            ));
        }

        self.skip_trivia()?;
        if self.source.get(self.pos) != Some(&b'}') {
            return Err(GrammarError::with_pointer(
                "GrammarSyntaxError",
                "malformed action, expected '}'".to_string(),
                start,
            ));
        }
        self.pos += 1;

        Ok((GrammarToken::Action(name), start))
    }

    fn skip_spaces(&mut self) {
        while self
            .source
            .get(self.pos)
            .map_or(false, |b| b.is_ascii_whitespace())
        {
            self.pos += 1;
        }
    }

    /// Skip whitespace and `//` and `/* */` comments.
    fn skip_trivia(&mut self) -> Result<(), GrammarError> {
        loop {
            self.skip_spaces();

            if self.source.get(self.pos) != Some(&b'/') {
                return Ok(());
            }

            match self.source.get(self.pos + 1) {
                Some(b'/') => {
                    while self.source.get(self.pos).map_or(false, |b| *b != b'\n') {
                        self.pos += 1;
                    }
                }
                Some(b'*') => {
                    let open = self.pos;
                    self.pos += 2;
                    loop {
                        match self.source.get(self.pos) {
                            Some(b'*') if self.source.get(self.pos + 1) == Some(&b'/') => {
                                self.pos += 2;
                                break;
                            }
                            Some(_) => self.pos += 1,
                            None => {
                                return Err(GrammarError::with_pointer(
                                    "GrammarSyntaxError",
                                    "unterminated comment".to_string(),
                                    open,
                                ))
                            }
                        }
                    }
                }
                _ => return Ok(()),
            }
        }
    }
}
