use super::lexer::{GrammarLexer, GrammarToken};
use super::{Associativity, GrammarAst, ProductionDef, RuleDef, SymbolRef, TokenDef, TokenPattern};
use crate::GrammarError;

/// Recursive descent parser over the grammar token stream.
pub(super) struct GrammarParser<'g> {
    lexer: GrammarLexer<'g>,
    current: (GrammarToken, usize),
    ast: GrammarAst,
}

impl<'g> GrammarParser<'g> {
    pub fn parse(source: &'g str) -> Result<GrammarAst, GrammarError> {
        let mut lexer = GrammarLexer::new(source);
        let current = lexer.next_token()?;

        let mut parser = Self {
            lexer,
            current,
            ast: GrammarAst::default(),
        };

        parser.parse_spec()?;
        Ok(parser.ast)
    }

    fn advance(&mut self) -> Result<(), GrammarError> {
        self.current = self.lexer.next_token()?;
        Ok(())
    }

    fn advance_regex(&mut self) -> Result<(), GrammarError> {
        self.current = self.lexer.next_regex_token()?;
        Ok(())
    }

    fn error(&self, message: String) -> GrammarError {
        GrammarError::with_pointer("GrammarSyntaxError", message, self.current.1)
    }

    fn parse_spec(&mut self) -> Result<(), GrammarError> {
        while self.current.0 != GrammarToken::Mark {
            if self.current.0 == GrammarToken::End {
                return Err(self.error("expected '%%' before the productions section".into()));
            }
            self.parse_def()?;
        }
        self.advance()?;

        while self.current.0 != GrammarToken::End && self.current.0 != GrammarToken::Mark {
            self.parse_prod()?;
        }

        // a second mark starts the free text tail which is ignored
        Ok(())
    }

    fn parse_def(&mut self) -> Result<(), GrammarError> {
        match self.current.0 {
            GrammarToken::Start => self.parse_def_start(),
            GrammarToken::Token
            | GrammarToken::Left
            | GrammarToken::Right
            | GrammarToken::NonAssoc => self.parse_def_token(),
            ref t => Err(self.error(format!(
                "unexpected token {:?} in the definitions section",
                t
            ))),
        }
    }

    fn parse_def_start(&mut self) -> Result<(), GrammarError> {
        self.advance()?;

        let name = match &self.current.0 {
            GrammarToken::Identifier(name) => name.clone(),
            t => return Err(self.error(format!("expected start symbol name, found {:?}", t))),
        };

        if self.ast.start.is_some() {
            return Err(self.error("start symbol already declared".into()));
        }
        self.ast.start = Some(name);

        self.advance()
    }

    fn parse_def_token(&mut self) -> Result<(), GrammarError> {
        let assoc = match self.current.0 {
            GrammarToken::Left => Associativity::Left,
            GrammarToken::Right => Associativity::Right,
            GrammarToken::NonAssoc => Associativity::NonAssoc,
            _ => Associativity::Token,
        };
        self.advance()?;

        let tag = match &self.current.0 {
            GrammarToken::Tag(tag) => {
                let tag = tag.clone();
                self.advance()?;
                Some(tag)
            }
            _ => None,
        };

        let name = match &self.current.0 {
            GrammarToken::Identifier(name) => name.clone(),
            t => return Err(self.error(format!("expected token name, found {:?}", t))),
        };

        // the pattern is read in regex mode: everything up to the next whitespace
        self.advance_regex()?;
        let pattern = match &self.current.0 {
            GrammarToken::Regex(pattern) => pattern.clone(),
            _ => return Err(self.error(format!("expected a regex pattern for token '{}'", name))),
        };
        self.advance()?;

        self.ast.definitions.push(TokenDef {
            assoc,
            tag,
            name,
            pattern: TokenPattern::Regex(pattern),
        });

        Ok(())
    }

    fn parse_prod(&mut self) -> Result<(), GrammarError> {
        let name = match &self.current.0 {
            GrammarToken::Identifier(name) => name.clone(),
            t => return Err(self.error(format!("expected production name, found {:?}", t))),
        };
        self.advance()?;

        if self.current.0 != GrammarToken::Colon {
            return Err(self.error(format!("expected ':' after production name '{}'", name)));
        }
        self.advance()?;

        let mut rules = Vec::new();

        loop {
            let mut rule = RuleDef::default();

            loop {
                match &self.current.0 {
                    GrammarToken::Identifier(symbol) => {
                        rule.symbols.push(SymbolRef::Name(symbol.clone()));
                        self.advance()?;
                    }
                    GrammarToken::Literal(c) => {
                        rule.symbols.push(SymbolRef::Literal(*c));
                        self.advance()?;
                    }
                    _ => break,
                }
            }

            if let GrammarToken::Action(action) = &self.current.0 {
                rule.action = Some(action.clone());
                self.advance()?;
            }

            rules.push(rule);

            match self.current.0 {
                GrammarToken::Or => self.advance()?,
                GrammarToken::Semicolon => {
                    self.advance()?;
                    break;
                }
                ref t => {
                    return Err(self.error(format!(
                        "expected '|' or ';' in production '{}', found {:?}",
                        name, t
                    )))
                }
            }
        }

        self.ast.productions.push(ProductionDef { name, rules });
        Ok(())
    }
}
