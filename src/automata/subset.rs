use super::{Dfa, EdgeLabel, Nfa};
use crate::StateId;
use std::collections::{BTreeMap, BTreeSet};

/// Determinize an NFA with the classical power-set construction.
///
/// `reduce_resolver` folds the reduction tags of the member NFA states whenever more than
/// one carries a tag; `value_resolver` folds their value payloads. Members are folded in
/// ascending state order, seeded from the lowest-numbered member.
pub fn determinize_with<V, R, E, FR, FV>(
    nfa: &Nfa<V, R, E>,
    mut reduce_resolver: FR,
    mut value_resolver: FV,
) -> Dfa<V, R, E>
where
    V: Clone + Default,
    R: Clone,
    E: EdgeLabel,
    FR: FnMut(&R, &R) -> R,
    FV: FnMut(&V, &V) -> V,
{
    let mut out = Dfa::new();

    if nfa.is_empty() {
        return out;
    }

    // Epsilon closure per NFA state, by fixed point iteration: seed every state with itself
    // plus its immediate epsilon targets, then keep replacing each set by the union of the
    // closures of its members until no set grows.
    let mut closures: Vec<BTreeSet<usize>> = (0..nfa.len())
        .map(|i| {
            let mut set = BTreeSet::new();
            set.insert(i);
            for (edge, target) in nfa[StateId(i)].next() {
                if *edge == E::epsilon() {
                    set.insert(target.0);
                }
            }
            set
        })
        .collect();

    let mut changed = true;
    while changed {
        changed = false;

        for i in 0..closures.len() {
            let mut merged = BTreeSet::new();
            for member in &closures[i] {
                merged.extend(closures[*member].iter().copied());
            }

            if merged.len() != closures[i].len() {
                changed = true;
            }
            closures[i] = merged;
        }
    }

    // Subset expansion in discovery order.
    let mut subset_ids: BTreeMap<BTreeSet<usize>, StateId> = BTreeMap::new();
    let mut subsets: Vec<BTreeSet<usize>> = Vec::new();

    let start_subset = closures[nfa.start().index()].clone();
    let start = out.insert();
    out.set_start(start);
    apply_members(
        nfa,
        &start_subset,
        &mut out,
        start,
        &mut reduce_resolver,
        &mut value_resolver,
    );
    subset_ids.insert(start_subset.clone(), start);
    subsets.push(start_subset);

    let mut index = 0;
    while index < out.len() {
        let members = subsets[index].clone();

        let mut edges: Vec<E> = Vec::new();
        for member in &members {
            for (edge, _) in nfa[StateId(*member)].next() {
                if *edge != E::epsilon() {
                    edges.push(edge.clone());
                }
            }
        }

        for edge in E::unique_edges(&edges) {
            // States reachable on any original edge overlapping the partitioned one,
            // extended to their epsilon closures.
            let mut targets: BTreeSet<usize> = BTreeSet::new();
            for member in &members {
                for (original, target) in nfa[StateId(*member)].next() {
                    if *original == E::epsilon() {
                        continue;
                    }
                    if !original.empty_intersection(&edge) {
                        targets.extend(closures[target.0].iter().copied());
                    }
                }
            }

            if targets.is_empty() {
                continue;
            }

            let target_id = match subset_ids.get(&targets) {
                Some(id) => *id,
                None => {
                    let id = out.insert();
                    apply_members(
                        nfa,
                        &targets,
                        &mut out,
                        id,
                        &mut reduce_resolver,
                        &mut value_resolver,
                    );
                    subset_ids.insert(targets.clone(), id);
                    subsets.push(targets);
                    id
                }
            };

            out.connect(StateId(index), target_id, edge);
        }

        index += 1;
    }

    out
}

/// Determinize with the default resolvers: the minimum reduction tag wins and the value of
/// the lowest-numbered member is kept.
pub fn determinize<V, R, E>(nfa: &Nfa<V, R, E>) -> Dfa<V, R, E>
where
    V: Clone + Default,
    R: Clone + Ord,
    E: EdgeLabel,
{
    determinize_with(
        nfa,
        |lhs: &R, rhs: &R| std::cmp::min(lhs, rhs).clone(),
        |lhs: &V, _: &V| lhs.clone(),
    )
}

fn apply_members<V, R, E, FR, FV>(
    nfa: &Nfa<V, R, E>,
    members: &BTreeSet<usize>,
    out: &mut Dfa<V, R, E>,
    id: StateId,
    reduce_resolver: &mut FR,
    value_resolver: &mut FV,
) where
    V: Clone + Default,
    R: Clone,
    E: EdgeLabel,
    FR: FnMut(&R, &R) -> R,
    FV: FnMut(&V, &V) -> V,
{
    let mut reduce: Option<R> = None;
    let mut value: Option<V> = None;
    let mut accept = false;

    for member in members {
        let state = &nfa[StateId(*member)];

        if let Some(tag) = state.reduce() {
            reduce = Some(match reduce {
                None => tag.clone(),
                Some(folded) => reduce_resolver(&folded, tag),
            });
        }

        value = Some(match value {
            None => state.value().clone(),
            Some(folded) => value_resolver(&folded, state.value()),
        });

        accept = accept || nfa.is_accept(StateId(*member));
    }

    out[id].set_reduce(reduce);
    if let Some(value) = value {
        *out[id].value_mut() = value;
    }
    if accept {
        out.insert_accept(id);
    }
}

#[cfg(test)]
mod tests {
    use super::{determinize, EdgeLabel};
    use crate::automata::{CharSet, Nfa};
    use crate::{StateId, TokenId};

    /// Union of `ab` tagged 1 and `a` tagged 2 under a common start.
    fn sample_nfa() -> Nfa<(), TokenId, CharSet> {
        let mut nfa = Nfa::new();
        let start = nfa.insert();
        nfa.set_start(start);

        let a0 = nfa.insert();
        let a1 = nfa.insert();
        let a2 = nfa.insert();
        nfa.connect(a0, a1, CharSet::single(b'a'));
        nfa.connect(a1, a2, CharSet::single(b'b'));
        nfa[a2].set_reduce(Some(TokenId(1)));
        nfa.insert_accept(a2);
        nfa.connect_epsilon(start, a0);

        let b0 = nfa.insert();
        let b1 = nfa.insert();
        nfa.connect(b0, b1, CharSet::single(b'a'));
        nfa[b1].set_reduce(Some(TokenId(2)));
        nfa.insert_accept(b1);
        nfa.connect_epsilon(start, b0);

        nfa
    }

    #[test]
    fn outgoing_edges_are_pairwise_disjoint() {
        let dfa = determinize(&sample_nfa());
        for state in dfa.iter() {
            for (i, (lhs, _)) in state.next().iter().enumerate() {
                for (rhs, _) in state.next().iter().skip(i + 1) {
                    assert!(lhs.empty_intersection(rhs));
                }
            }
        }
    }

    #[test]
    fn walks_both_patterns() {
        let dfa = determinize(&sample_nfa());

        let mut state = dfa.start();
        for byte in [b'a', b'b'] {
            let (_, next) = dfa[state]
                .next()
                .iter()
                .find(|(edge, _)| edge.test(byte))
                .expect("missing transition");
            state = *next;
        }
        assert_eq!(dfa[state].reduce(), Some(&TokenId(1)));
        assert!(dfa.is_accept(state));
    }

    #[test]
    fn reduce_conflict_resolves_to_minimum() {
        // both patterns accept `a`; the state reached on `a` folds both tags
        let dfa = determinize(&sample_nfa());
        let (_, after_a) = dfa[dfa.start()]
            .next()
            .iter()
            .find(|(edge, _)| edge.test(b'a'))
            .expect("missing transition")
            .clone();
        // only pattern 2 accepts plain `a`
        assert_eq!(dfa[after_a].reduce(), Some(&TokenId(2)));
    }

    #[test]
    fn values_fold_through_the_merge_resolver() {
        use super::determinize_with;

        // two states reachable on `a`, carrying different payloads
        let mut nfa: Nfa<String, TokenId, CharSet> = Nfa::new();
        let start = nfa.insert_with("start".to_string());
        nfa.set_start(start);
        let lhs = nfa.insert_with("lhs".to_string());
        let rhs = nfa.insert_with("rhs".to_string());
        nfa.connect(start, lhs, CharSet::single(b'a'));
        nfa.connect(start, rhs, CharSet::single(b'a'));

        let dfa = determinize_with(
            &nfa,
            |l: &TokenId, _: &TokenId| *l,
            |l: &String, r: &String| format!("{}+{}", l, r),
        );

        let (_, merged) = dfa[dfa.start()]
            .next()
            .iter()
            .find(|(edge, _)| edge.test(b'a'))
            .expect("missing transition");
        assert_eq!(dfa[*merged].value().as_str(), "lhs+rhs");
    }

    #[test]
    fn dangling_edges_never_appear() {
        let dfa = determinize(&sample_nfa());
        for state in dfa.iter() {
            for (_, target) in state.next() {
                assert!(target.index() < dfa.len());
            }
        }
        for (id, state) in dfa.iter().enumerate() {
            for (edge, target) in state.next() {
                assert!(dfa[*target]
                    .previous()
                    .iter()
                    .any(|(e, s)| s == &StateId(id) && e == edge));
            }
        }
    }
}
