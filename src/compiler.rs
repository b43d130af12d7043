//! The compiler façade tying the build pipeline together.
//!
//! Building a [Compiler] parses the grammar source, compiles the lexer DFA and the LR(1)
//! parse tables; compiling an input runs the tokenizer and the shift/reduce driver over the
//! frozen tables.

use crate::grammar::GrammarAst;
use crate::lex_compiler::{LexCompiler, LexCompilerResult, Terminal};
use crate::parser_compiler::{ParserCompiler, ParserCompilerResult, TokenTable};
use crate::runtime::{Driver, TokenCursor};
use crate::{
    Compiler, Conflict, GrammarError, Lexeme, Log, ParseError, SyntaxTree, TokenId, ValueImpl,
};
use once_cell::unsync::OnceCell;
use std::collections::{BTreeSet, HashMap};
use std::fmt::Write;
use std::rc::Rc;

impl<V: ValueImpl> Compiler<V> {
    /// Build a compiler from a grammar source text.
    ///
    /// Grammar conflicts do not fail the build; they are resolved by the declared policy
    /// and reported through [conflicts](Compiler::conflicts).
    pub fn new(grammar: &str) -> Result<Self, GrammarError> {
        let ast = GrammarAst::parse(grammar)?.expand_literals();
        let lexer = LexCompiler::compile(&ast)?;
        let parser = ParserCompiler::compile(&lexer, &ast)?;

        let mut conflicts = Vec::new();
        conflicts.extend(lexer.conflicts.iter().cloned());
        conflicts.extend(parser.conflicts.iter().cloned());

        Ok(Self {
            lexer,
            parser,
            actions: HashMap::new(),
            conflicts,
            debug: OnceCell::new(),
        })
    }

    /// Register a semantic action; registering an existing name replaces the callable.
    pub fn register_action<F: Fn(&[V]) -> V + 'static>(&mut self, name: &str, action: F) {
        self.actions.insert(name.to_string(), Rc::new(action));
    }

    /// Compile an input string into its synthesized value.
    pub fn compile(&self, input: &str) -> Result<V, ParseError> {
        let code = input.into();
        let (value, _) = self.driver().run(&code, false)?;
        Ok(value)
    }

    /// Compile an input string and additionally capture the concrete syntax tree.
    pub fn syntax_tree(&self, input: &str) -> Result<SyntaxTree, ParseError> {
        let code = input.into();
        let (_, tree) = self.driver().run(&code, true)?;
        tree.ok_or_else(|| ParseError::new(0, "Internal error: missing syntax tree".to_string()))
    }

    /// Tokenize an input string without parsing it. The stream is terminated by the
    /// end-of-input token.
    pub fn tokenize(&self, input: &str) -> Result<Vec<Lexeme>, ParseError> {
        let code: crate::Code = input.into();
        let mut cursor = TokenCursor::new(&code, &self.lexer.dfa);
        let mut stream = Vec::new();

        loop {
            let lexeme = cursor.next()?;
            let done = lexeme.token == TokenId::END;
            stream.push(lexeme);
            if done {
                break Ok(stream);
            }
        }
    }

    fn driver(&self) -> Driver<V> {
        Driver {
            lexer: &self.lexer,
            parser: &self.parser,
            actions: &self.actions,
            debug: self.debug.get().copied().unwrap_or(Log::None),
        }
    }

    /// Conflicts resolved while building the tables, in lexer then parser order.
    pub fn conflicts(&self) -> &[Conflict] {
        &self.conflicts
    }

    /// The compiled lexer: terminal table and DFA.
    pub fn lexer(&self) -> &LexCompilerResult {
        &self.lexer
    }

    /// The compiled parser: token table, LR(1) automaton and FIRST sets.
    pub fn parser(&self) -> &ParserCompilerResult {
        &self.parser
    }

    pub fn terminals(&self) -> &[Terminal] {
        &self.lexer.terminals
    }

    pub fn tokens(&self) -> &TokenTable {
        &self.parser.tokens
    }

    /// FIRST set of a non-terminal, by name.
    pub fn first_set(&self, name: &str) -> Option<&BTreeSet<TokenId>> {
        let id = self.parser.tokens.id_by_name(name)?;
        self.parser.first_set(id)
    }

    /// Set a log label to debug the compiler pipeline.
    pub fn set_log(&self, log: Log<&'static str>) -> Result<(), String> {
        self.debug
            .set(log)
            .map_err(|err| format!("Log label {} is already assigned.", err))
    }

    /// Render the compiled grammar back as text: the terminal fragment followed by the
    /// productions with their action names.
    pub fn grammar(&self) -> Result<String, std::fmt::Error> {
        let mut writer = String::new();

        writeln!(writer, "fragment {{")?;
        for terminal in self.lexer.terminals.iter().skip(1) {
            writeln!(writer, "{:>6}{} : {} ,", "", terminal.name, terminal.pattern)?;
        }
        writeln!(writer, "}}")?;
        writeln!(writer)?;

        let tokens = &self.parser.tokens;
        for entry in tokens.iter() {
            let non_terminal = match entry.non_terminal() {
                Some(nt) => nt,
                None => continue,
            };

            writeln!(writer, "{}", non_terminal.name)?;
            for (index, production) in non_terminal.productions.iter().enumerate() {
                let marker = if index == 0 { ":" } else { "|" };
                write!(writer, "{:>6}", marker)?;
                for symbol in &production.symbols {
                    write!(writer, " {}", tokens.name(*symbol))?;
                }
                if let Some(action) = &production.action {
                    write!(writer, " {{ {} }}", action)?;
                }
                writeln!(writer)?;
            }
            writeln!(writer, "{:>6}", ";")?;
        }

        Ok(writer)
    }

    /// Human readable dump of the lexer DFA.
    pub fn lexer_summary(&self) -> Result<String, std::fmt::Error> {
        let mut writer = String::new();
        writeln!(writer, "============")?;

        for (id, state) in self.lexer.dfa.iter().enumerate() {
            write!(writer, "{}", id)?;
            if let Some(token) = state.reduce() {
                write!(writer, " -> {}", self.lexer.terminals[token.index()].name)?;
            }
            writeln!(writer)?;

            for (class, target) in state.next() {
                writeln!(writer, "\t{} | {}", target.index(), class)?;
            }
        }

        Ok(writer)
    }

    /// Human readable dump of the LR(1) states: items with lookaheads and goto edges.
    pub fn parser_summary(&self) -> Result<String, std::fmt::Error> {
        let mut writer = String::new();
        let result = &self.parser;

        for (id, state) in result.dfa.iter().enumerate() {
            writeln!(writer, "===== {} =====", id)?;

            for (core, lookahead) in state.value().items.iter() {
                self.write_item(&mut writer, core, lookahead)?;
            }

            writeln!(writer)?;
            for (symbol, target) in state.next() {
                writeln!(
                    writer,
                    "{} : {}",
                    result.tokens.name(*symbol),
                    target.index()
                )?;
            }
            writeln!(writer)?;
        }

        Ok(writer)
    }

    /// The LR(1) automaton in graphviz dot format.
    pub fn dot_graph(&self) -> Result<String, std::fmt::Error> {
        let mut writer = String::new();
        let result = &self.parser;

        writeln!(writer, "digraph G {{")?;
        for (id, state) in result.dfa.iter().enumerate() {
            write!(writer, "{} [ label = \"{}\n", id, id)?;
            for (core, lookahead) in state.value().items.iter() {
                self.write_item(&mut writer, core, lookahead)?;
            }
            writeln!(writer, "\"];")?;

            for (symbol, target) in state.next() {
                writeln!(
                    writer,
                    "{} -> {} [label=\"{} : {}\"];",
                    id,
                    target.index(),
                    result.tokens.name(*symbol),
                    symbol.index()
                )?;
            }
            writeln!(writer)?;
        }
        writeln!(writer, "}}")?;

        Ok(writer)
    }

    fn write_item(
        &self,
        writer: &mut String,
        core: &crate::parser_compiler::ItemCore,
        lookahead: &BTreeSet<TokenId>,
    ) -> std::fmt::Result {
        let tokens = &self.parser.tokens;
        let production = tokens
            .production(crate::ProductionRef {
                non_terminal: core.non_terminal,
                production: core.production,
            })
            .expect("item references a table production");

        write!(writer, "{} -> ", tokens.name(core.non_terminal))?;
        for i in 0..=production.symbols.len() {
            if i == core.dot {
                write!(writer, ". ")?;
            }
            if i < production.symbols.len() {
                write!(writer, "{} ", tokens.name(production.symbols[i]))?;
            }
        }

        write!(writer, " [ ")?;
        for follow in lookahead {
            write!(writer, "{} ", tokens.name(*follow))?;
        }
        writeln!(writer, "]")?;

        Ok(())
    }
}
