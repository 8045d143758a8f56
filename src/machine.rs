use crate::automaton::{Automaton, StateId};

/// String pointer.
/// This is used to point to the current character in the text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
struct Sp(usize);

impl Sp {
    fn inc(&mut self) {
        self.0 += 1;
    }
}

/// Scanner driving a DFA over a character buffer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Machine {
    dfa: Automaton,
}

impl Machine {
    pub fn new(dfa: Automaton) -> Self {
        Self { dfa }
    }

    pub fn automaton(&self) -> &Automaton {
        &self.dfa
    }

    /// Leftmost match starting at or after `from`, as `(start, end)`.
    ///
    /// A candidate starts in the initial state and follows the edge accepting
    /// each character until no edge does or the text ends. The
    /// candidate's match ends at the last accepting state it passed through.
    /// A candidate that never accepted is discarded and the next one starts
    /// one character after it.
    pub fn find_at(&self, text: &[char], from: usize) -> Option<(usize, usize)> {
        let initial = self.dfa.initial();
        let mut match_start = Sp(from);

        while match_start.0 < text.len() {
            if let Some(end) = self.longest_at(text, initial, match_start) {
                return Some((match_start.0, end.0));
            }
            match_start.inc();
        }

        None
    }

    /// End of the longest accepted prefix of `text[start..]`, if any.
    fn longest_at(&self, text: &[char], initial: StateId, start: Sp) -> Option<Sp> {
        let mut current = initial;
        let mut sp = start;
        let mut matched = self.dfa.state(current).accepting.then_some(sp);

        while let Some(&c) = text.get(sp.0) {
            // A state without edges, or without an edge for `c`, ends the candidate.
            let Some(next) = self.dfa.state(current).step(c) else {
                break;
            };
            current = next;
            sp.inc();
            if self.dfa.state(current).accepting {
                matched = Some(sp);
            }
        }

        matched
    }
}
