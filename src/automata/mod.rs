//! Generic finite state machine substrate shared by the lexer and parser automata.
//!
//! A [StateMachine] is a directed graph of states held by value in a contiguous sequence.
//! States are addressed by dense [StateId] indices; every outgoing edge is mirrored by a
//! matching incoming edge so that states can be erased and compacted cheaply. The machine is
//! parameterized over the per-state value, the optional reduction tag carried by accepting
//! states and the edge label; a const parameter selects between non-deterministic and
//! deterministic edge discipline.

mod charset;
mod subset;

pub use charset::CharSet;
pub use subset::{determinize, determinize_with};

use crate::{StateId, TokenId};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt::Debug;
use std::ops::{Index, IndexMut};

/// Operations an edge label has to support beyond equality.
///
/// A label may stand for a whole set of transitions (a character class); the subset
/// construction needs to test overlap between labels and to partition a collection of labels
/// into pairwise disjoint ones.
pub trait EdgeLabel: Clone + PartialEq + Eq + PartialOrd + Ord + Debug {
    /// The sentinel label of an epsilon transition.
    fn epsilon() -> Self;

    /// Whether two labels share no transition.
    fn empty_intersection(&self, other: &Self) -> bool;

    /// Partition the combined alphabet of the given labels into the coarsest collection of
    /// pairwise disjoint labels such that every input label is a disjoint union of parts.
    fn unique_edges(edges: &[Self]) -> Vec<Self>;
}

impl EdgeLabel for TokenId {
    fn epsilon() -> Self {
        TokenId(usize::MAX)
    }

    fn empty_intersection(&self, other: &Self) -> bool {
        self != other
    }

    fn unique_edges(edges: &[Self]) -> Vec<Self> {
        let set: BTreeSet<TokenId> = edges.iter().copied().collect();
        set.into_iter().collect()
    }
}

impl EdgeLabel for CharSet {
    fn epsilon() -> Self {
        CharSet::universal()
    }

    fn empty_intersection(&self, other: &Self) -> bool {
        !self.intersects(other)
    }

    fn unique_edges(edges: &[Self]) -> Vec<Self> {
        // Group character positions by the set of input edges covering them; every group
        // becomes one output class.
        let mut groups: BTreeMap<Vec<usize>, CharSet> = BTreeMap::new();

        for c in 0u8..128 {
            let covering: Vec<usize> = edges
                .iter()
                .enumerate()
                .filter_map(|(index, e)| if e.test(c) { Some(index) } else { None })
                .collect();

            if !covering.is_empty() {
                groups.entry(covering).or_insert(CharSet::EMPTY).set(c);
            }
        }

        groups.into_values().collect()
    }
}

#[derive(Debug, Clone)]
/// A single state: its value payload, optional reduction tag and symmetric edge lists.
pub struct State<V, R, E> {
    value: V,
    reduce: Option<R>,
    next: Vec<(E, StateId)>,
    previous: Vec<(E, StateId)>,
}

impl<V, R, E> State<V, R, E> {
    pub fn value(&self) -> &V {
        &self.value
    }

    pub fn value_mut(&mut self) -> &mut V {
        &mut self.value
    }

    pub fn reduce(&self) -> Option<&R> {
        self.reduce.as_ref()
    }

    pub fn set_reduce(&mut self, reduce: Option<R>) {
        self.reduce = reduce;
    }

    /// Outgoing edges; a multimap for non-deterministic machines and a functional map for
    /// deterministic ones.
    pub fn next(&self) -> &[(E, StateId)] {
        &self.next
    }

    /// Incoming edges, maintained symmetrically with [next](State::next).
    pub fn previous(&self) -> &[(E, StateId)] {
        &self.previous
    }
}

#[derive(Debug, Clone)]
/// A directed graph of states with labelled edges, a designated start state and a set of
/// accepting states.
pub struct StateMachine<V, R, E: EdgeLabel, const DETERMINISTIC: bool> {
    states: Vec<State<V, R, E>>,
    start: StateId,
    accepts: BTreeSet<StateId>,
}

/// Non-deterministic machine: a state may carry several overlapping outgoing edges.
pub type Nfa<V, R, E> = StateMachine<V, R, E, false>;
/// Deterministic machine: outgoing edges of a state are pairwise disjoint.
pub type Dfa<V, R, E> = StateMachine<V, R, E, true>;

impl<V, R, E: EdgeLabel, const DETERMINISTIC: bool> Default
    for StateMachine<V, R, E, DETERMINISTIC>
{
    fn default() -> Self {
        Self {
            states: Vec::new(),
            start: StateId(0),
            accepts: BTreeSet::new(),
        }
    }
}

impl<V, R, E: EdgeLabel, const DETERMINISTIC: bool> StateMachine<V, R, E, DETERMINISTIC> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.states.len()
    }

    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }

    /// The start state; defaults to the first inserted state.
    pub fn start(&self) -> StateId {
        self.start
    }

    pub fn set_start(&mut self, id: StateId) {
        debug_assert!(id.0 < self.states.len());
        self.start = id;
    }

    pub fn accepts(&self) -> &BTreeSet<StateId> {
        &self.accepts
    }

    pub fn is_accept(&self, id: StateId) -> bool {
        self.accepts.contains(&id)
    }

    pub fn insert_accept(&mut self, id: StateId) {
        debug_assert!(id.0 < self.states.len());
        self.accepts.insert(id);
    }

    pub fn clear_accepts(&mut self) {
        self.accepts.clear();
    }

    pub fn iter(&self) -> impl Iterator<Item = &State<V, R, E>> {
        self.states.iter()
    }

    /// Insert a fresh state and return its id.
    pub fn insert(&mut self) -> StateId
    where
        V: Default,
    {
        self.insert_with(V::default())
    }

    /// Insert a fresh state carrying the given value.
    pub fn insert_with(&mut self, value: V) -> StateId {
        self.states.push(State {
            value,
            reduce: None,
            next: Vec::new(),
            previous: Vec::new(),
        });
        StateId(self.states.len() - 1)
    }

    /// Merge another machine of the same type, returning the mapping from the other
    /// machine's state ids to the rebased ids in `self`.
    ///
    /// Start and accept markers of the merged machine are not carried over; callers rewire
    /// them through the returned mapping. The old identifiers must not be used afterwards.
    pub fn insert_machine(&mut self, other: &Self) -> Vec<StateId>
    where
        V: Clone,
        R: Clone,
    {
        let offset = self.states.len();
        let mut mapping = Vec::with_capacity(other.states.len());

        for (index, state) in other.states.iter().enumerate() {
            let mut rebased = state.clone();
            for (_, target) in rebased.next.iter_mut() {
                *target = StateId(target.0 + offset);
            }
            for (_, source) in rebased.previous.iter_mut() {
                *source = StateId(source.0 + offset);
            }
            self.states.push(rebased);
            mapping.push(StateId(index + offset));
        }

        mapping
    }

    /// Add an edge; a duplicate (same label, same target) is a no-op. Deterministic
    /// machines assert that the new label is disjoint from every existing outgoing label.
    pub fn connect(&mut self, from: StateId, to: StateId, edge: E) {
        debug_assert!(from.0 < self.states.len());
        debug_assert!(to.0 < self.states.len());

        if self.states[from.0]
            .next
            .iter()
            .any(|(e, t)| *t == to && *e == edge)
        {
            return;
        }

        if DETERMINISTIC {
            debug_assert!(
                self.states[from.0]
                    .next
                    .iter()
                    .all(|(e, _)| e.empty_intersection(&edge)),
                "overlapping edge labels on a deterministic state"
            );
        }

        self.states[from.0].next.push((edge.clone(), to));
        self.states[to.0].previous.push((edge, from));
    }

    /// Add an epsilon edge.
    pub fn connect_epsilon(&mut self, from: StateId, to: StateId) {
        self.connect(from, to, E::epsilon());
    }

    /// Remove every edge between the two states.
    pub fn disconnect(&mut self, from: StateId, to: StateId) {
        debug_assert!(from.0 < self.states.len());
        debug_assert!(to.0 < self.states.len());

        self.states[from.0].next.retain(|(_, t)| *t != to);
        self.states[to.0].previous.retain(|(_, s)| *s != from);
    }

    /// Remove a state. The last state is moved into the freed slot so that identifiers stay
    /// dense; references held to either id are invalidated.
    pub fn erase(&mut self, id: StateId) {
        debug_assert!(id.0 < self.states.len());

        self.isolate(id);
        self.accepts.remove(&id);

        let last = StateId(self.states.len() - 1);
        if id == last {
            self.states.pop();
        } else {
            self.move_state(last, id);
        }
    }

    /// Move a state into another slot, rewiring every edge referencing it. The source slot
    /// is popped when it is the last state.
    pub fn move_state(&mut self, from: StateId, to: StateId) {
        debug_assert!(from.0 < self.states.len());
        debug_assert!(to.0 < self.states.len());

        if from == to {
            return;
        }

        self.isolate(to);
        self.accepts.remove(&to);

        for state in self.states.iter_mut() {
            for (_, target) in state.next.iter_mut() {
                if *target == from {
                    *target = to;
                }
            }
            for (_, source) in state.previous.iter_mut() {
                if *source == from {
                    *source = to;
                }
            }
        }

        self.states.swap(from.0, to.0);

        if self.start == from {
            self.start = to;
        }
        if self.accepts.remove(&from) {
            self.accepts.insert(to);
        }

        if from.0 == self.states.len() - 1 {
            self.states.pop();
        }
    }

    fn isolate(&mut self, id: StateId) {
        while let Some((_, to)) = self.states[id.0].next.first().cloned() {
            self.disconnect(id, to);
        }
        while let Some((_, from)) = self.states[id.0].previous.first().cloned() {
            self.disconnect(from, id);
        }
    }
}

impl<V, R, E: EdgeLabel, const DETERMINISTIC: bool> Index<StateId>
    for StateMachine<V, R, E, DETERMINISTIC>
{
    type Output = State<V, R, E>;

    fn index(&self, id: StateId) -> &Self::Output {
        &self.states[id.0]
    }
}

impl<V, R, E: EdgeLabel, const DETERMINISTIC: bool> IndexMut<StateId>
    for StateMachine<V, R, E, DETERMINISTIC>
{
    fn index_mut(&mut self, id: StateId) -> &mut Self::Output {
        &mut self.states[id.0]
    }
}
