use std::collections::{BTreeMap, BTreeSet, VecDeque};

use log::trace;

use crate::automaton::{next_char, prev_char, Automaton, Graph, StateId, Transition};
use crate::CompileError;

/// Default maximum number of states subset construction may create.
pub const DEFAULT_STATE_LIMIT: usize = 10_000;

/// A set of NFA states standing for one DFA state during construction.
#[derive(Debug)]
struct SubsetState {
    /// Epsilon-closed NFA states. The ordered set doubles as the subset's
    /// identity: two subsets are the same DFA state iff their ids match.
    states: BTreeSet<StateId>,
    /// DFA state this subset was merged into.
    merged: StateId,
    processed: bool,
}

/// Convert an NFA into a DFA with the subset (powerset) construction.
///
/// The NFA's transitions are first split into disjoint character ranges, so
/// every DFA state has at most one edge for any character. Adjacent ranges
/// leading to the same state are joined again on the way out. Fails once more
/// than `state_limit` DFA states are needed.
pub fn build_dfa(nfa: &Automaton, state_limit: usize) -> Result<Automaton, CompileError> {
    let mut builder = DfaBuilder {
        nfa,
        graph: Graph::default(),
        subsets: Vec::new(),
        ids: BTreeMap::new(),
        worklist: VecDeque::new(),
        state_limit,
    };

    let start = builder.subset(nfa.epsilon_closure([nfa.initial()]))?;
    let symbols = partition(nfa.alphabet());
    trace!("{} symbols: {symbols:?}", symbols.len());

    while let Some(current) = builder.worklist.pop_front() {
        let from = builder.subsets[current].merged;
        let mut pending: Option<(char, char, StateId)> = None;

        for &(lo, hi) in &symbols {
            let moved = builder.move_on(&builder.subsets[current].states, lo);
            if moved.is_empty() {
                continue;
            }
            let target = builder.subset(nfa.epsilon_closure(moved))?;
            let to = builder.subsets[target].merged;

            if let Some((_, end, state)) = pending.as_mut() {
                if *state == to && next_char(*end) == Some(lo) {
                    *end = hi;
                    continue;
                }
            }
            if let Some((first, end, state)) = pending.replace((lo, hi, to)) {
                builder.graph.connect(from, Transition::Range(first, end), state);
            }
        }
        if let Some((first, end, state)) = pending {
            builder.graph.connect(from, Transition::Range(first, end), state);
        }

        builder.subsets[current].processed = true;
    }

    debug_assert!(builder.subsets.iter().all(|subset| subset.processed));
    let start = builder.subsets[start].merged;
    Ok(Automaton::from_graph(builder.graph, start))
}

/// Split the characters accepted by `alphabet` into the coarsest sorted,
/// disjoint ranges such that every transition accepts either all or none of
/// the characters of each range.
fn partition(alphabet: &[Transition]) -> Vec<(char, char)> {
    let mut cuts = BTreeSet::new();
    for transition in alphabet {
        for (lo, hi) in transition.intervals() {
            cuts.insert(lo);
            if let Some(after) = next_char(hi) {
                cuts.insert(after);
            }
        }
    }

    let cuts: Vec<char> = cuts.into_iter().collect();
    cuts.iter()
        .enumerate()
        .filter_map(|(i, &lo)| {
            let hi = match cuts.get(i + 1) {
                Some(&next) => prev_char(next)?,
                None => char::MAX,
            };
            // Ranges are atomic, so testing one character tests the range.
            alphabet
                .iter()
                .any(|transition| transition.matches(lo))
                .then_some((lo, hi))
        })
        .collect()
}

struct DfaBuilder<'a> {
    nfa: &'a Automaton,
    graph: Graph,
    subsets: Vec<SubsetState>,
    /// Subset identity to index in `subsets`.
    ids: BTreeMap<BTreeSet<StateId>, usize>,
    /// Unprocessed subsets.
    worklist: VecDeque<usize>,
    state_limit: usize,
}

impl DfaBuilder<'_> {
    /// Index of the subset for `states`, creating and queueing it if new.
    fn subset(&mut self, states: BTreeSet<StateId>) -> Result<usize, CompileError> {
        if let Some(&index) = self.ids.get(&states) {
            return Ok(index);
        }
        if self.subsets.len() >= self.state_limit {
            return Err(CompileError::TooManyStates {
                limit: self.state_limit,
            });
        }

        let merged = self.graph.add_state();
        let accepting = states.iter().any(|&id| self.nfa.state(id).accepting);
        self.graph.state_mut(merged).accepting = accepting;

        let index = self.subsets.len();
        trace!("subset {index} = {states:?} (accepting: {accepting})");
        self.ids.insert(states.clone(), index);
        self.subsets.push(SubsetState {
            states,
            merged,
            processed: false,
        });
        self.worklist.push_back(index);
        Ok(index)
    }

    /// NFA states entered by consuming `c` from any state in `states`.
    /// `states` is epsilon-closed, so only its own edges need to be looked at.
    fn move_on(&self, states: &BTreeSet<StateId>, c: char) -> BTreeSet<StateId> {
        states
            .iter()
            .flat_map(|&id| &self.nfa.state(id).edges)
            .filter(|edge| edge.transition.matches(c))
            .map(|edge| edge.target)
            .collect()
    }
}
