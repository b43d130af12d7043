//! Front end for the grammar source text.
//!
//! A grammar consists of a definitions section, a `%%` mark, a productions section and an
//! optional trailing free text section which is ignored. The parser produces a small AST
//! consumed by the lexer and parser compilers.

mod lexer;
mod parser;

use crate::GrammarError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
/// Associativity recorded on a terminal from its declaring keyword.
///
/// The tag is carried on the terminal record but takes no part in conflict resolution.
pub enum Associativity {
    Token,
    Left,
    Right,
    NonAssoc,
}

#[derive(Debug, Clone)]
/// The matching rule of a declared terminal.
pub enum TokenPattern {
    Regex(String),
    Literal(char),
}

#[derive(Debug, Clone)]
/// `%token [<tag>] NAME REGEX` and friends.
pub struct TokenDef {
    pub assoc: Associativity,
    pub tag: Option<String>,
    pub name: String,
    pub pattern: TokenPattern,
}

#[derive(Debug, Clone, PartialEq, Eq)]
/// A symbol reference inside a production body.
pub enum SymbolRef {
    /// Reference to a declared terminal or non-terminal by name.
    Name(String),
    /// A quoted literal character, implicitly declaring a terminal.
    Literal(char),
}

impl SymbolRef {
    /// The token table name the reference resolves against.
    pub fn table_name(&self) -> String {
        match self {
            SymbolRef::Name(name) => name.clone(),
            SymbolRef::Literal(c) => literal_name(*c),
        }
    }
}

/// Canonical token table name of an implicit literal terminal.
pub fn literal_name(c: char) -> String {
    format!("{:?}", c)
}

#[derive(Debug, Clone, Default)]
/// One alternative of a production: a symbol sequence and an optional trailing action name.
pub struct RuleDef {
    pub symbols: Vec<SymbolRef>,
    pub action: Option<String>,
}

#[derive(Debug, Clone)]
/// A named non-terminal with its alternatives.
pub struct ProductionDef {
    pub name: String,
    pub rules: Vec<RuleDef>,
}

#[derive(Debug, Clone, Default)]
/// Parsed grammar source.
pub struct GrammarAst {
    pub start: Option<String>,
    pub definitions: Vec<TokenDef>,
    pub productions: Vec<ProductionDef>,
}

impl GrammarAst {
    /// Parse a grammar source text.
    pub fn parse(source: &str) -> Result<GrammarAst, GrammarError> {
        parser::GrammarParser::parse(source)
    }

    /// Append an implicit terminal definition for every quoted literal appearing in a
    /// production body, in order of first appearance.
    pub fn expand_literals(mut self) -> GrammarAst {
        let mut declared: Vec<String> = self.definitions.iter().map(|d| d.name.clone()).collect();

        for production in &self.productions {
            for rule in &production.rules {
                for symbol in &rule.symbols {
                    if let SymbolRef::Literal(c) = symbol {
                        let name = literal_name(*c);
                        if !declared.contains(&name) {
                            declared.push(name.clone());
                            self.definitions.push(TokenDef {
                                assoc: Associativity::Token,
                                tag: None,
                                name,
                                pattern: TokenPattern::Literal(*c),
                            });
                        }
                    }
                }
            }
        }

        self
    }
}
