//! Compiles the productions of a grammar into a canonical LR(1) automaton.
//!
//! The token table is built on top of the lexer's terminals: non-terminals occupy the high
//! indices of the shared id space. FIRST sets are computed by fixed point iteration, the
//! item sets are closed with per-item lookaheads and the collection of states grows in
//! discovery order with set-equality deduplication. Finally every state receives an action
//! table entry per viable terminal: shift, reduce or accept.

use crate::automata::Dfa;
use crate::grammar::GrammarAst;
use crate::lex_compiler::{LexCompilerResult, Terminal};
use crate::{Conflict, GrammarError, ProductionRef, StateId, TokenId};
use std::collections::{BTreeMap, BTreeSet};
use std::ops::Index;

#[derive(Debug, Clone)]
/// One alternative of a non-terminal: the symbol sequence and the optional action name.
pub struct Production {
    pub symbols: Vec<TokenId>,
    pub action: Option<String>,
}

#[derive(Debug, Clone)]
pub struct NonTerminal {
    pub name: String,
    pub productions: Vec<Production>,
}

#[derive(Debug, Clone)]
/// Entry of the shared token table: a terminal or a non-terminal.
pub enum TokenEntry {
    Terminal(Terminal),
    NonTerminal(NonTerminal),
}

impl TokenEntry {
    pub fn name(&self) -> &str {
        match self {
            TokenEntry::Terminal(t) => &t.name,
            TokenEntry::NonTerminal(nt) => &nt.name,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, TokenEntry::Terminal(_))
    }

    pub fn is_non_terminal(&self) -> bool {
        matches!(self, TokenEntry::NonTerminal(_))
    }

    pub fn terminal(&self) -> Option<&Terminal> {
        match self {
            TokenEntry::Terminal(t) => Some(t),
            TokenEntry::NonTerminal(_) => None,
        }
    }

    pub fn non_terminal(&self) -> Option<&NonTerminal> {
        match self {
            TokenEntry::Terminal(_) => None,
            TokenEntry::NonTerminal(nt) => Some(nt),
        }
    }
}

#[derive(Debug, Clone, Default)]
/// Ordered token table: terminals at the low indices, non-terminals at the high ones.
pub struct TokenTable {
    entries: Vec<TokenEntry>,
    first_non_terminal: usize,
}

impl TokenTable {
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Index of the first non-terminal; equals the number of terminals.
    pub fn first_non_terminal(&self) -> usize {
        self.first_non_terminal
    }

    pub fn is_terminal(&self, id: TokenId) -> bool {
        id.0 < self.first_non_terminal
    }

    pub fn is_non_terminal(&self, id: TokenId) -> bool {
        id.0 >= self.first_non_terminal && id.0 < self.entries.len()
    }

    pub fn name(&self, id: TokenId) -> &str {
        self.entries[id.0].name()
    }

    pub fn id_by_name(&self, name: &str) -> Option<TokenId> {
        self.entries
            .iter()
            .position(|entry| entry.name() == name)
            .map(TokenId)
    }

    pub fn non_terminal(&self, id: TokenId) -> Option<&NonTerminal> {
        self.entries.get(id.0).and_then(|e| e.non_terminal())
    }

    pub fn production(&self, reference: ProductionRef) -> Option<&Production> {
        self.non_terminal(reference.non_terminal)
            .and_then(|nt| nt.productions.get(reference.production))
    }

    pub fn iter(&self) -> impl Iterator<Item = &TokenEntry> {
        self.entries.iter()
    }

    fn non_terminal_mut(&mut self, id: TokenId) -> Option<&mut NonTerminal> {
        match self.entries.get_mut(id.0) {
            Some(TokenEntry::NonTerminal(nt)) => Some(nt),
            _ => None,
        }
    }
}

impl Index<TokenId> for TokenTable {
    type Output = TokenEntry;

    fn index(&self, id: TokenId) -> &Self::Output {
        &self.entries[id.0]
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
/// The invariant part of an LR(1) item: which production and how far the dot has moved.
pub struct ItemCore {
    pub non_terminal: TokenId,
    pub production: usize,
    pub dot: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
/// An LR(1) item set: item cores with their mergeable lookahead sets.
///
/// Equality is order-insensitive over the items and includes the lookahead sets, which is
/// exactly the state deduplication relation of the canonical construction.
pub struct ItemSet {
    items: BTreeMap<ItemCore, BTreeSet<TokenId>>,
}

impl ItemSet {
    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&ItemCore, &BTreeSet<TokenId>)> {
        self.items.iter()
    }

    /// Insert an item or merge the lookahead into an existing one; reports growth.
    pub(crate) fn merge(&mut self, core: ItemCore, lookahead: &BTreeSet<TokenId>) -> bool {
        match self.items.get_mut(&core) {
            Some(existing) => {
                let before = existing.len();
                existing.extend(lookahead.iter().copied());
                existing.len() != before
            }
            None => {
                self.items.insert(core, lookahead.clone());
                true
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
/// A parser move recorded in the action table of a state.
pub enum ParseAction {
    /// Consume the lookahead and go to the given state.
    Shift(StateId),
    /// Pop `pop` frames and replace them by the production's non-terminal.
    Reduce { production: ProductionRef, pop: usize },
    /// Reduce the start production; the parse terminates once the control stack has
    /// unwound to the initial state.
    Accept { production: ProductionRef, pop: usize },
}

#[derive(Debug, Clone, Default)]
/// Value payload of a parser DFA state: its item set and its action table.
pub struct ParserState {
    pub items: ItemSet,
    pub actions: BTreeMap<TokenId, ParseAction>,
}

/// Result of the parser compilation.
#[derive(Debug)]
pub struct ParserCompilerResult {
    pub tokens: TokenTable,
    /// LR(1) automaton; edges are goto/shift successors keyed by token id.
    pub dfa: Dfa<ParserState, TokenId, TokenId>,
    /// The start non-terminal.
    pub start: TokenId,
    /// FIRST set per non-terminal, indexed by `id - first_non_terminal`.
    pub first_sets: Vec<BTreeSet<TokenId>>,
    pub conflicts: Vec<Conflict>,
}

impl ParserCompilerResult {
    pub fn first_set(&self, id: TokenId) -> Option<&BTreeSet<TokenId>> {
        if !self.tokens.is_non_terminal(id) {
            return None;
        }
        self.first_sets.get(id.0 - self.tokens.first_non_terminal())
    }
}

pub struct ParserCompiler<'c> {
    ast: &'c GrammarAst,
    tokens: TokenTable,
    first_sets: Vec<BTreeSet<TokenId>>,
    dfa: Dfa<ParserState, TokenId, TokenId>,
    start: TokenId,
    conflicts: Vec<Conflict>,
}

impl<'c> ParserCompiler<'c> {
    pub fn compile(
        lex: &LexCompilerResult,
        ast: &'c GrammarAst,
    ) -> Result<ParserCompilerResult, GrammarError> {
        let mut compiler = ParserCompiler {
            ast,
            tokens: TokenTable::default(),
            first_sets: Vec::new(),
            dfa: Dfa::new(),
            start: TokenId::END,
            conflicts: Vec::new(),
        };

        compiler.init_terminals(lex);
        compiler.init_non_terminals()?;
        compiler.generate_first_sets();
        compiler.init_first_state()?;
        compiler.init_states();
        compiler.compute_actions();

        Ok(ParserCompilerResult {
            tokens: compiler.tokens,
            dfa: compiler.dfa,
            start: compiler.start,
            first_sets: compiler.first_sets,
            conflicts: compiler.conflicts,
        })
    }

    fn init_terminals(&mut self, lex: &LexCompilerResult) {
        for terminal in &lex.terminals {
            self.tokens
                .entries
                .push(TokenEntry::Terminal(terminal.clone()));
        }
        self.tokens.first_non_terminal = self.tokens.entries.len();
    }

    fn init_non_terminals(&mut self) -> Result<(), GrammarError> {
        for production in &self.ast.productions {
            if self.tokens.id_by_name(&production.name).is_some() {
                return Err(GrammarError::new(
                    "GrammarReferenceError",
                    format!("symbol '{}' already defined", production.name),
                ));
            }
            self.tokens
                .entries
                .push(TokenEntry::NonTerminal(NonTerminal {
                    name: production.name.clone(),
                    productions: Vec::new(),
                }));
        }

        // resolve the symbol references of every rule against the completed table
        let mut resolved: Vec<Vec<Production>> = Vec::new();
        for production in &self.ast.productions {
            let mut alternatives = Vec::new();
            for rule in &production.rules {
                let mut symbols = Vec::new();
                for symbol in &rule.symbols {
                    let name = symbol.table_name();
                    let id = self.tokens.id_by_name(&name).ok_or_else(|| {
                        GrammarError::new(
                            "GrammarReferenceError",
                            format!(
                                "unknown symbol '{}' in production '{}'",
                                name, production.name
                            ),
                        )
                    })?;
                    symbols.push(id);
                }
                alternatives.push(Production {
                    symbols,
                    action: rule.action.clone(),
                });
            }
            resolved.push(alternatives);
        }

        let first_non_terminal = self.tokens.first_non_terminal;
        for (offset, alternatives) in resolved.into_iter().enumerate() {
            let id = TokenId(first_non_terminal + offset);
            if let Some(nt) = self.tokens.non_terminal_mut(id) {
                nt.productions = alternatives;
            }
        }

        Ok(())
    }

    /// FIRST set per non-terminal by fixed point: a terminal head contributes itself, a
    /// non-terminal head contributes its FIRST set, an empty production contributes the
    /// end-of-input token.
    fn generate_first_sets(&mut self) {
        let first_non_terminal = self.tokens.first_non_terminal;
        let count = self.tokens.len() - first_non_terminal;
        self.first_sets = vec![BTreeSet::new(); count];

        let tokens = &self.tokens;
        let first_sets = &mut self.first_sets;

        let mut modified = true;
        while modified {
            modified = false;

            for offset in 0..count {
                let id = TokenId(first_non_terminal + offset);
                let non_terminal = match tokens.non_terminal(id) {
                    Some(nt) => nt,
                    None => continue,
                };

                for production in &non_terminal.productions {
                    let before = first_sets[offset].len();

                    match production.symbols.first() {
                        None => {
                            first_sets[offset].insert(TokenId::END);
                        }
                        Some(head) if tokens.is_terminal(*head) => {
                            first_sets[offset].insert(*head);
                        }
                        Some(head) => {
                            let addition = first_sets[head.0 - first_non_terminal].clone();
                            first_sets[offset].extend(addition);
                        }
                    }

                    modified = modified || first_sets[offset].len() != before;
                }
            }
        }
    }

    fn first_set(&self, id: TokenId) -> &BTreeSet<TokenId> {
        debug_assert!(self.tokens.is_non_terminal(id));
        &self.first_sets[id.0 - self.tokens.first_non_terminal]
    }

    /// Seed state 0 with every production of the start non-terminal under the end-of-input
    /// lookahead and close it.
    fn init_first_state(&mut self) -> Result<(), GrammarError> {
        if self.ast.productions.is_empty() {
            return Err(GrammarError::new(
                "GrammarReferenceError",
                "grammar has no productions".to_string(),
            ));
        }

        self.start = match &self.ast.start {
            Some(name) => {
                let id = self.tokens.id_by_name(name).ok_or_else(|| {
                    GrammarError::new(
                        "GrammarReferenceError",
                        format!("unknown start symbol '{}'", name),
                    )
                })?;
                if !self.tokens.is_non_terminal(id) {
                    return Err(GrammarError::new(
                        "GrammarReferenceError",
                        format!("start symbol '{}' is not a non-terminal", name),
                    ));
                }
                id
            }
            None => TokenId(self.tokens.first_non_terminal),
        };

        let mut items = ItemSet::default();
        let mut end = BTreeSet::new();
        end.insert(TokenId::END);
        self.insert_items(&mut items, self.start, &end);
        self.close_items(&mut items);

        let id = self.dfa.insert_with(ParserState {
            items,
            actions: BTreeMap::new(),
        });
        self.dfa.set_start(id);

        Ok(())
    }

    /// Grow the state collection in discovery order, deduplicating goto sets against every
    /// existing state by item set equality.
    fn init_states(&mut self) {
        let mut index = 0;
        while index < self.dfa.len() {
            let state = StateId(index);
            let items = self.dfa[state].value().items.clone();

            let mut edge_symbols: BTreeSet<TokenId> = BTreeSet::new();
            for (core, _) in items.iter() {
                if let Some(symbol) = self.symbol_after_dot(core) {
                    edge_symbols.insert(symbol);
                }
            }

            for symbol in edge_symbols {
                let mut goto_items = ItemSet::default();
                for (core, lookahead) in items.iter() {
                    if self.symbol_after_dot(core) == Some(symbol) {
                        goto_items.merge(
                            ItemCore {
                                dot: core.dot + 1,
                                ..*core
                            },
                            lookahead,
                        );
                    }
                }
                self.close_items(&mut goto_items);

                let existing = (0..self.dfa.len())
                    .find(|j| self.dfa[StateId(*j)].value().items == goto_items);

                let target = match existing {
                    Some(j) => StateId(j),
                    None => self.dfa.insert_with(ParserState {
                        items: goto_items,
                        actions: BTreeMap::new(),
                    }),
                };

                self.dfa.connect(state, target, symbol);
            }

            index += 1;
        }
    }

    fn symbol_after_dot(&self, core: &ItemCore) -> Option<TokenId> {
        self.tokens
            .production(ProductionRef {
                non_terminal: core.non_terminal,
                production: core.production,
            })
            .and_then(|p| p.symbols.get(core.dot).copied())
    }

    /// LR(1) closure: for every item with the dot before a non-terminal B, add every
    /// production of B with the computed lookahead, merging lookaheads of coinciding items
    /// until nothing grows.
    fn close_items(&self, set: &mut ItemSet) {
        let mut modified = true;
        while modified {
            modified = false;

            let snapshot: Vec<(ItemCore, BTreeSet<TokenId>)> = set
                .iter()
                .map(|(core, lookahead)| (*core, lookahead.clone()))
                .collect();

            for (core, lookahead) in snapshot {
                let b = match self.symbol_after_dot(&core) {
                    Some(symbol) if self.tokens.is_non_terminal(symbol) => symbol,
                    _ => continue,
                };

                let symbols = &self
                    .tokens
                    .non_terminal(core.non_terminal)
                    .map(|nt| &nt.productions[core.production])
                    .unwrap()
                    .symbols;

                let follow: BTreeSet<TokenId> = match symbols.get(core.dot + 1) {
                    Some(next) if self.tokens.is_terminal(*next) => {
                        let mut set = BTreeSet::new();
                        set.insert(*next);
                        set
                    }
                    Some(next) => self.first_set(*next).clone(),
                    None => lookahead,
                };

                modified = self.insert_items(set, b, &follow) || modified;
            }
        }
    }

    /// Add the initial item of every production of the non-terminal with the lookahead.
    fn insert_items(
        &self,
        set: &mut ItemSet,
        non_terminal: TokenId,
        lookahead: &BTreeSet<TokenId>,
    ) -> bool {
        let count = match self.tokens.non_terminal(non_terminal) {
            Some(nt) => nt.productions.len(),
            None => return false,
        };

        let mut modified = false;
        for production in 0..count {
            modified = set.merge(
                ItemCore {
                    non_terminal,
                    production,
                    dot: 0,
                },
                lookahead,
            ) || modified;
        }
        modified
    }

    /// Fill the action table of every state: shift beats reduce, the first-declared
    /// production wins between reduces, a completed start item accepts on end-of-input.
    fn compute_actions(&mut self) {
        for index in 0..self.dfa.len() {
            let state = StateId(index);
            let mut actions: BTreeMap<TokenId, ParseAction> = BTreeMap::new();

            for (symbol, target) in self.dfa[state].next().to_vec() {
                if self.tokens.is_terminal(symbol) {
                    actions.insert(symbol, ParseAction::Shift(target));
                }
            }

            let items = self.dfa[state].value().items.clone();
            for (core, lookahead) in items.iter() {
                if self.symbol_after_dot(core).is_some() {
                    continue;
                }

                let reduce = ProductionRef {
                    non_terminal: core.non_terminal,
                    production: core.production,
                };

                for terminal in lookahead {
                    if core.non_terminal == self.start && *terminal == TokenId::END {
                        match actions.get(&TokenId::END) {
                            Some(ParseAction::Accept {
                                production: existing,
                                ..
                            }) => {
                                // two completed start productions in one state: the first
                                // declared one wins
                                self.conflicts.push(Conflict::ReduceReduce {
                                    state,
                                    terminal: TokenId::END,
                                    kept: *existing.min(&reduce),
                                    dropped: *existing.max(&reduce),
                                });
                                if reduce < *existing {
                                    actions.insert(
                                        TokenId::END,
                                        ParseAction::Accept {
                                            production: reduce,
                                            pop: core.dot,
                                        },
                                    );
                                }
                            }
                            Some(ParseAction::Reduce {
                                production: existing,
                                ..
                            }) => {
                                self.conflicts.push(Conflict::ReduceReduce {
                                    state,
                                    terminal: TokenId::END,
                                    kept: reduce,
                                    dropped: *existing,
                                });
                                actions.insert(
                                    TokenId::END,
                                    ParseAction::Accept {
                                        production: reduce,
                                        pop: core.dot,
                                    },
                                );
                            }
                            _ => {
                                actions.insert(
                                    TokenId::END,
                                    ParseAction::Accept {
                                        production: reduce,
                                        pop: core.dot,
                                    },
                                );
                            }
                        }
                        continue;
                    }

                    match actions.get(terminal) {
                        None => {
                            actions.insert(
                                *terminal,
                                ParseAction::Reduce {
                                    production: reduce,
                                    pop: core.dot,
                                },
                            );
                        }
                        Some(ParseAction::Shift(_)) => {
                            self.conflicts.push(Conflict::ShiftReduce {
                                state,
                                terminal: *terminal,
                                reduce,
                            });
                        }
                        Some(ParseAction::Reduce {
                            production: existing,
                            ..
                        }) => {
                            let existing = *existing;
                            if reduce < existing {
                                actions.insert(
                                    *terminal,
                                    ParseAction::Reduce {
                                        production: reduce,
                                        pop: core.dot,
                                    },
                                );
                                self.conflicts.push(Conflict::ReduceReduce {
                                    state,
                                    terminal: *terminal,
                                    kept: reduce,
                                    dropped: existing,
                                });
                            } else {
                                self.conflicts.push(Conflict::ReduceReduce {
                                    state,
                                    terminal: *terminal,
                                    kept: existing,
                                    dropped: reduce,
                                });
                            }
                        }
                        Some(ParseAction::Accept { .. }) => {}
                    }
                }
            }

            self.dfa[state].value_mut().actions = actions;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{ParseAction, ParserCompilerResult};
    use crate::grammar::GrammarAst;
    use crate::lex_compiler::LexCompiler;
    use crate::parser_compiler::ParserCompiler;
    use crate::{ProductionRef, StateId, TokenId};

    fn compile(source: &str) -> ParserCompilerResult {
        let ast = GrammarAst::parse(source).unwrap().expand_literals();
        let lex = LexCompiler::compile(&ast).unwrap();
        ParserCompiler::compile(&lex, &ast).unwrap()
    }

    const SEQUENCE: &str = "
%token X x
%token Y y
%%
s : a b ;
a : X ;
b : Y ;
";

    #[test]
    fn first_sets_follow_production_heads() {
        let result = compile(SEQUENCE);
        let tokens = &result.tokens;

        let x = tokens.id_by_name("X").unwrap();
        let y = tokens.id_by_name("Y").unwrap();
        let s = tokens.id_by_name("s").unwrap();
        let a = tokens.id_by_name("a").unwrap();
        let b = tokens.id_by_name("b").unwrap();

        assert_eq!(
            result.first_set(s).unwrap().iter().copied().collect::<Vec<_>>(),
            vec![x]
        );
        assert_eq!(
            result.first_set(a).unwrap().iter().copied().collect::<Vec<_>>(),
            vec![x]
        );
        assert_eq!(
            result.first_set(b).unwrap().iter().copied().collect::<Vec<_>>(),
            vec![y]
        );
    }

    #[test]
    fn token_table_orders_terminals_before_non_terminals() {
        let result = compile(SEQUENCE);
        let tokens = &result.tokens;

        assert_eq!(tokens.name(TokenId::END), "$end");
        assert_eq!(tokens.first_non_terminal(), 3);
        assert!(tokens.is_terminal(tokens.id_by_name("X").unwrap()));
        assert!(tokens.is_non_terminal(tokens.id_by_name("s").unwrap()));
    }

    #[test]
    fn unknown_symbols_are_fatal() {
        let source = "%token X x\n%%\ns : X missing ;";
        let ast = GrammarAst::parse(source).unwrap().expand_literals();
        let lex = LexCompiler::compile(&ast).unwrap();
        let err = ParserCompiler::compile(&lex, &ast).unwrap_err();
        assert_eq!(err.what(), "GrammarReferenceError");
    }

    #[test]
    fn reduce_pop_counts_match_production_lengths() {
        let result = compile(SEQUENCE);
        for state in result.dfa.iter() {
            for action in state.value().actions.values() {
                if let ParseAction::Reduce { production, pop }
                | ParseAction::Accept { production, pop } = action
                {
                    let length = result.tokens.production(*production).unwrap().symbols.len();
                    assert_eq!(*pop, length);
                }
            }
        }
    }

    #[test]
    fn accept_appears_on_exactly_one_state() {
        let result = compile(SEQUENCE);
        let mut accepts = 0;
        for state in result.dfa.iter() {
            for (terminal, action) in &state.value().actions {
                if let ParseAction::Accept { .. } = action {
                    assert_eq!(*terminal, TokenId::END);
                    accepts += 1;
                }
            }
        }
        assert_eq!(accepts, 1);
    }

    #[test]
    fn item_sets_are_unique_across_states() {
        let result = compile(SEQUENCE);
        for i in 0..result.dfa.len() {
            for j in (i + 1)..result.dfa.len() {
                assert_ne!(
                    result.dfa[StateId(i)].value().items,
                    result.dfa[StateId(j)].value().items
                );
            }
        }
    }

    #[test]
    fn reduce_reduce_resolves_to_first_declared() {
        // both a and b reduce on the same lookahead after seeing `x`
        let source = "
%token X x
%%
s : a | b ;
a : X ;
b : X ;
";
        let result = compile(source);
        assert!(!result.conflicts.is_empty());

        let a = result.tokens.id_by_name("a").unwrap();
        // the state reached on X keeps the reduction of the first declared production
        let mut found = false;
        for state in result.dfa.iter() {
            for action in state.value().actions.values() {
                if let ParseAction::Reduce { production, pop: 1 } = action {
                    if production.non_terminal == a {
                        found = true;
                    }
                    assert_ne!(
                        production,
                        &ProductionRef {
                            non_terminal: result.tokens.id_by_name("b").unwrap(),
                            production: 0
                        }
                    );
                }
            }
        }
        assert!(found);
    }

    #[test]
    fn explicit_start_symbol_is_used() {
        let source = "
%token X x
%start b
%%
a : X X ;
b : X ;
";
        let result = compile(source);
        assert_eq!(result.start, result.tokens.id_by_name("b").unwrap());
    }
}
