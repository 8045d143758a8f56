use std::collections::{BTreeSet, HashSet, VecDeque};
use std::fmt;

/// Index of a state within its automaton.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct StateId(pub usize);

impl StateId {
    pub fn as_usize(self) -> usize {
        self.0
    }
}

impl fmt::Display for StateId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Label of an edge.
///
/// Two transitions are the same NFA alphabet symbol when they are
/// structurally equal. Structural equality is not set equality: `a-c` and
/// `b-d` are distinct symbols even though both accept `b`. The DFA builder
/// splits such overlaps into disjoint ranges.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Transition {
    Epsilon,
    /// Inclusive range `lo..=hi`.
    Range(char, char),
    /// Everything except the listed characters, kept sorted and deduplicated.
    ExcludeSet(Box<[char]>),
    /// Everything outside `lo..=hi`.
    ExcludeRange(char, char),
}

impl Transition {
    pub fn single(c: char) -> Self {
        Transition::Range(c, c)
    }

    pub fn exclude_set(chars: impl IntoIterator<Item = char>) -> Self {
        let set: BTreeSet<char> = chars.into_iter().collect();
        Transition::ExcludeSet(set.into_iter().collect())
    }

    pub fn is_epsilon(&self) -> bool {
        matches!(self, Transition::Epsilon)
    }

    /// Whether consuming `c` may follow this edge. Epsilon edges never consume.
    pub fn matches(&self, c: char) -> bool {
        match self {
            Transition::Epsilon => false,
            Transition::Range(lo, hi) => (*lo..=*hi).contains(&c),
            Transition::ExcludeSet(excluded) => excluded.binary_search(&c).is_err(),
            Transition::ExcludeRange(lo, hi) => c < *lo || c > *hi,
        }
    }

    /// Sorted, disjoint inclusive ranges of the characters this edge accepts.
    pub fn intervals(&self) -> Vec<(char, char)> {
        match self {
            Transition::Epsilon => Vec::new(),
            Transition::Range(lo, hi) => vec![(*lo, *hi)],
            Transition::ExcludeSet(excluded) => {
                complement(excluded.iter().map(|&c| (c, c)).collect())
            }
            Transition::ExcludeRange(lo, hi) => complement(vec![(*lo, *hi)]),
        }
    }
}

/// Canonical text of the symbol: `empty`, `'a'`, `a-z`, `^abc`, `^a-z`.
impl fmt::Display for Transition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Transition::Epsilon => f.write_str("empty"),
            Transition::Range(lo, hi) if lo == hi => write!(f, "'{}'", lo.escape_debug()),
            Transition::Range(lo, hi) => write!(f, "{}-{}", lo.escape_debug(), hi.escape_debug()),
            Transition::ExcludeSet(excluded) => {
                f.write_str("^")?;
                for c in excluded.iter() {
                    write!(f, "{}", c.escape_debug())?;
                }
                Ok(())
            }
            Transition::ExcludeRange(lo, hi) => {
                write!(f, "^{}-{}", lo.escape_debug(), hi.escape_debug())
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Edge {
    pub transition: Transition,
    pub target: StateId,
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct State {
    /// Outgoing edges. In a DFA no two edges accept the same character.
    pub edges: Vec<Edge>,
    pub initial: bool,
    pub accepting: bool,
}

impl State {
    pub fn has_transitions(&self) -> bool {
        !self.edges.is_empty()
    }

    /// Target of the edge accepting `c`.
    pub fn step(&self, c: char) -> Option<StateId> {
        self.edges
            .iter()
            .find(|edge| edge.transition.matches(c))
            .map(|edge| edge.target)
    }
}

/// Scratch graph that fragments are built in. Holds unreachable states too;
/// [`Automaton::from_graph`] keeps only what is reachable from the start.
#[derive(Debug, Default)]
pub(crate) struct Graph {
    states: Vec<State>,
}

impl Graph {
    pub fn add_state(&mut self) -> StateId {
        self.states.push(State::default());
        StateId(self.states.len() - 1)
    }

    pub fn connect(&mut self, from: StateId, transition: Transition, to: StateId) {
        self.states[from.0].edges.push(Edge {
            transition,
            target: to,
        });
    }

    pub fn state_mut(&mut self, id: StateId) -> &mut State {
        &mut self.states[id.0]
    }

    pub fn len(&self) -> usize {
        self.states.len()
    }
}

/// Finite automaton stored as a flat arena. State `0` is the initial state and
/// ids are dense in breadth-first order from it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Automaton {
    states: Vec<State>,
    /// One representative per distinct transition, in discovery order.
    alphabet: Vec<Transition>,
}

impl Automaton {
    /// Renumber the states reachable from `start` breadth-first and collect
    /// the alphabet on the way.
    pub(crate) fn from_graph(mut graph: Graph, start: StateId) -> Self {
        let mut ids: Vec<Option<StateId>> = vec![None; graph.len()];
        let mut order = Vec::new();
        let mut queue = VecDeque::new();

        ids[start.0] = Some(StateId(0));
        order.push(start);
        queue.push_back(start);

        let mut seen = HashSet::new();
        let mut alphabet = Vec::new();

        while let Some(old) = queue.pop_front() {
            for edge in &graph.states[old.0].edges {
                if seen.insert(edge.transition.clone()) {
                    alphabet.push(edge.transition.clone());
                }
                if ids[edge.target.0].is_none() {
                    ids[edge.target.0] = Some(StateId(order.len()));
                    order.push(edge.target);
                    queue.push_back(edge.target);
                }
            }
        }

        let states = order
            .into_iter()
            .enumerate()
            .map(|(new, old)| {
                let mut state = std::mem::take(&mut graph.states[old.0]);
                state.initial = new == 0;
                for edge in &mut state.edges {
                    // Every target was numbered during the traversal.
                    edge.target = ids[edge.target.0].unwrap_or_default();
                }
                state
            })
            .collect();

        Self { states, alphabet }
    }

    pub fn initial(&self) -> StateId {
        StateId(0)
    }

    pub fn state(&self, id: StateId) -> &State {
        &self.states[id.0]
    }

    pub fn states(&self) -> impl Iterator<Item = (StateId, &State)> {
        self.states
            .iter()
            .enumerate()
            .map(|(i, state)| (StateId(i), state))
    }

    pub fn len(&self) -> usize {
        self.states.len()
    }

    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }

    pub fn alphabet(&self) -> &[Transition] {
        &self.alphabet
    }

    /// States reachable from `seeds` through epsilon edges only, seeds included.
    pub fn epsilon_closure(&self, seeds: impl IntoIterator<Item = StateId>) -> BTreeSet<StateId> {
        let mut closure = BTreeSet::new();
        let mut stack: Vec<StateId> = seeds.into_iter().collect();

        while let Some(id) = stack.pop() {
            if !closure.insert(id) {
                continue;
            }
            for edge in &self.states[id.0].edges {
                if edge.transition.is_epsilon() && !closure.contains(&edge.target) {
                    stack.push(edge.target);
                }
            }
        }

        closure
    }

    /// Whether the automaton accepts exactly `text`, exploring every path.
    /// Works for both NFAs and DFAs.
    pub fn accepts(&self, text: &[char]) -> bool {
        let mut current = self.epsilon_closure([self.initial()]);
        for &c in text {
            let next = current.iter().flat_map(|id| {
                self.states[id.0]
                    .edges
                    .iter()
                    .filter(move |edge| edge.transition.matches(c))
                    .map(|edge| edge.target)
            });
            current = self.epsilon_closure(next.collect::<Vec<_>>());
            if current.is_empty() {
                return false;
            }
        }
        current.iter().any(|id| self.states[id.0].accepting)
    }
}

pub(crate) fn next_char(c: char) -> Option<char> {
    match c {
        '\u{D7FF}' => Some('\u{E000}'),
        _ => char::from_u32(c as u32 + 1),
    }
}

pub(crate) fn prev_char(c: char) -> Option<char> {
    match c {
        '\u{E000}' => Some('\u{D7FF}'),
        _ => (c as u32).checked_sub(1).and_then(char::from_u32),
    }
}

/// Inclusive ranges covering every character not in `ranges`.
pub(crate) fn complement(mut ranges: Vec<(char, char)>) -> Vec<(char, char)> {
    ranges.sort_unstable();

    let mut gaps = Vec::new();
    let mut from = Some('\0');
    for (lo, hi) in ranges {
        let Some(start) = from else {
            break;
        };
        if lo > start {
            if let Some(end) = prev_char(lo) {
                gaps.push((start, end));
            }
        }
        if hi >= start {
            from = next_char(hi);
        }
    }
    if let Some(start) = from {
        gaps.push((start, char::MAX));
    }
    gaps
}
