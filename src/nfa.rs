use crate::automaton::{complement, Automaton, Graph, StateId, Transition};
use crate::parser::{Ast, NodeKind};

/// Start and end state of a partially built automaton.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Fragment {
    start: StateId,
    end: StateId,
}

/// Build a nondeterministic automaton from a syntax tree (Thompson construction).
///
/// The tree must come from [`crate::parser::parse`].
pub fn build_nfa(ast: &Ast) -> Automaton {
    NfaBuilder::default().build(ast)
}

#[derive(Debug, Default)]
struct NfaBuilder {
    graph: Graph,
}

impl NfaBuilder {
    fn build(mut self, root: &Ast) -> Automaton {
        let fragment = self.regexp(root.only_child());
        self.graph.state_mut(fragment.start).initial = true;
        self.graph.state_mut(fragment.end).accepting = true;
        Automaton::from_graph(self.graph, fragment.start)
    }

    fn fragment(&mut self) -> Fragment {
        Fragment {
            start: self.graph.add_state(),
            end: self.graph.add_state(),
        }
    }

    fn epsilon(&mut self, from: StateId, to: StateId) {
        self.graph.connect(from, Transition::Epsilon, to);
    }

    /// Sequence of quantified expressions, then one branch per alternation.
    ///
    /// e1e2
    /// ```txt
    /// s1 -e1-> f1 -ε-> s2 -e2-> f2
    /// ```
    ///
    /// e1|e2|...
    /// ```txt
    ///    ε-> s1 -e1-> f1 -ε
    /// q0 ε-> s2 -e2-> f2 -ε-> q1
    ///    ...
    /// ```
    fn regexp(&mut self, node: &Ast) -> Fragment {
        let mut sequence: Option<Fragment> = None;
        let mut branches = Vec::new();

        for child in &node.children {
            match child.kind {
                NodeKind::Quantified => {
                    let next = self.quantified(child);
                    sequence = Some(match sequence {
                        Some(prev) => {
                            self.epsilon(prev.end, next.start);
                            Fragment {
                                start: prev.start,
                                end: next.end,
                            }
                        }
                        None => next,
                    });
                }
                NodeKind::Alternation => branches.push(self.regexp(child.only_child())),
                kind => unreachable!("{kind} node inside regexp"),
            }
        }

        let Some(first) = sequence else {
            unreachable!("regexp without expressions");
        };
        if branches.is_empty() {
            return first;
        }

        let or = self.fragment();
        for branch in std::iter::once(first).chain(branches) {
            self.epsilon(or.start, branch.start);
            self.epsilon(branch.end, or.end);
        }
        or
    }

    /// e*
    /// ```txt
    /// q0 -ε-> s -e-> f -ε-> q1, f -ε-> s, q0 -ε-> q1
    /// ```
    ///
    /// e+
    /// ```txt
    /// s -e-> f, f -ε-> s
    /// ```
    ///
    /// e?
    /// ```txt
    /// s -e-> f, s -ε-> f
    /// ```
    fn quantified(&mut self, node: &Ast) -> Fragment {
        let inner = self.expression(node.only_child());

        match node.value {
            Some('*') => {
                self.epsilon(inner.end, inner.start);
                let star = self.fragment();
                self.epsilon(star.start, inner.start);
                self.epsilon(inner.end, star.end);
                self.epsilon(star.start, star.end);
                star
            }
            Some('+') => {
                self.epsilon(inner.end, inner.start);
                inner
            }
            Some('?') => {
                self.epsilon(inner.start, inner.end);
                inner
            }
            _ => inner,
        }
    }

    fn expression(&mut self, node: &Ast) -> Fragment {
        let child = node.only_child();
        match child.kind {
            // Groups only affect precedence.
            NodeKind::Group => self.regexp(child.only_child()),
            NodeKind::Selector => self.selector(child.only_child()),
            kind => unreachable!("{kind} node inside expression"),
        }
    }

    fn selector(&mut self, node: &Ast) -> Fragment {
        let transitions = match node.kind {
            NodeKind::Literal => vec![Transition::single(literal(node))],
            NodeKind::Any => vec![Transition::Range(' ', char::MAX)],
            NodeKind::Class => class_transitions(node),
            kind => unreachable!("{kind} node inside selector"),
        };

        // All class members run in parallel between the same two states.
        let fragment = self.fragment();
        for transition in transitions {
            self.graph.connect(fragment.start, transition, fragment.end);
        }
        fragment
    }
}

fn literal(node: &Ast) -> char {
    node.value.unwrap_or_default()
}

/// Edges for a bracket expression.
///
/// A plain class gets one range per member. A negated class is negated as a
/// whole: a class of literals becomes one `ExcludeSet`, a single range one
/// `ExcludeRange`, and any other mix the inclusive ranges of its complement,
/// since parallel exclusions would accept the union of their complements.
fn class_transitions(node: &Ast) -> Vec<Transition> {
    let members: Vec<(char, char)> = node
        .children
        .iter()
        .map(|member| match member.kind {
            NodeKind::Range => (literal(&member.children[0]), literal(&member.children[1])),
            _ => (literal(member), literal(member)),
        })
        .collect();

    if node.value != Some('^') {
        return members
            .into_iter()
            .map(|(lo, hi)| Transition::Range(lo, hi))
            .collect();
    }

    let ranges = node
        .children
        .iter()
        .filter(|member| member.kind == NodeKind::Range)
        .count();
    match (ranges, members.as_slice()) {
        (0, _) => vec![Transition::exclude_set(members.iter().map(|&(c, _)| c))],
        (1, &[(lo, hi)]) => vec![Transition::ExcludeRange(lo, hi)],
        _ => complement(members)
            .into_iter()
            .map(|(lo, hi)| Transition::Range(lo, hi))
            .collect(),
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::parser::parse;

    fn nfa(pattern: &str) -> Automaton {
        build_nfa(&parse(pattern).unwrap())
    }

    fn accepts(fa: &Automaton, text: &str) -> bool {
        fa.accepts(&text.chars().collect::<Vec<_>>())
    }

    #[test]
    fn char() {
        let fa = nfa("a");
        assert_eq!(fa.len(), 2);
        assert!(fa.state(StateId(0)).initial);
        assert!(fa.state(StateId(1)).accepting);
        assert_eq!(fa.state(StateId(0)).edges[0].transition, Transition::single('a'));
        assert_eq!(fa.alphabet(), &[Transition::single('a')]);
    }

    #[test]
    fn concat() {
        // s -a-> f -ε-> s -b-> f
        let fa = nfa("ab");
        assert_eq!(fa.len(), 4);
        assert_eq!(
            fa.alphabet(),
            &[Transition::single('a'), Transition::Epsilon, Transition::single('b')]
        );
        assert!(accepts(&fa, "ab"));
        assert!(!accepts(&fa, "a"));
        assert!(!accepts(&fa, "abb"));
    }

    #[test]
    fn or() {
        let fa = nfa("a|b");
        assert_eq!(fa.len(), 6);
        let start = fa.state(fa.initial());
        assert_eq!(start.edges.len(), 2);
        assert!(start.edges.iter().all(|edge| edge.transition.is_epsilon()));
        assert!(accepts(&fa, "a"));
        assert!(accepts(&fa, "b"));
        assert!(!accepts(&fa, "ab"));

        // One start/end pair for the whole list of branches.
        let fa = nfa("a|b|c");
        assert_eq!(fa.len(), 8);
        assert_eq!(fa.state(fa.initial()).edges.len(), 3);

        let fa = nfa("ab(cd|ef|g)h");
        assert!(accepts(&fa, "abcdh"));
        assert!(accepts(&fa, "abefh"));
        assert!(accepts(&fa, "abgh"));
        assert!(!accepts(&fa, "abh"));
    }

    #[test]
    fn question() {
        let fa = nfa("a?b");
        assert!(accepts(&fa, "b"));
        assert!(accepts(&fa, "ab"));
        assert!(!accepts(&fa, "aab"));
    }

    #[test]
    fn star() {
        let fa = nfa("a*");
        assert_eq!(fa.len(), 4);
        assert!(accepts(&fa, ""));
        assert!(accepts(&fa, "aaa"));
        assert!(!accepts(&fa, "ab"));

        let fa = nfa("a*b");
        assert!(accepts(&fa, "b"));
        assert!(accepts(&fa, "aab"));
        assert!(!accepts(&fa, "xb"));
    }

    #[test]
    fn plus() {
        let fa = nfa("a+b");
        assert!(accepts(&fa, "ab"));
        assert!(accepts(&fa, "aaab"));
        assert!(!accepts(&fa, "b"));

        let fa = nfa("(aa|b)+");
        assert!(accepts(&fa, "aab"));
        assert!(accepts(&fa, "baab"));
        assert!(!accepts(&fa, "aba"));
    }

    #[test]
    fn nested_quantifiers() {
        let fa = nfa("(a*)*");
        assert!(accepts(&fa, ""));
        assert!(accepts(&fa, "aaaa"));

        let fa = nfa("(a?)+b");
        assert!(accepts(&fa, "b"));
        assert!(accepts(&fa, "aab"));
    }

    #[test]
    fn dot() {
        let fa = nfa("a.b");
        assert!(accepts(&fa, "axb"));
        assert!(accepts(&fa, "a b"));
        assert!(!accepts(&fa, "ab"));
        assert!(!accepts(&fa, "a\tb"));
        assert!(accepts(&nfa(r"a\.b"), "a.b"));
        assert!(!accepts(&nfa(r"a\.b"), "axb"));
    }

    #[test]
    fn class() {
        let fa = nfa("[a-cx]");
        assert_eq!(
            fa.state(fa.initial()).edges.iter().map(|e| e.transition.clone()).collect::<Vec<_>>(),
            vec![Transition::Range('a', 'c'), Transition::single('x')]
        );

        let fa = nfa("[^abc]");
        assert_eq!(fa.alphabet(), &[Transition::exclude_set("abc".chars())]);
        assert!(accepts(&fa, "x"));
        assert!(!accepts(&fa, "b"));

        let fa = nfa("[^0-9]");
        assert_eq!(fa.alphabet(), &[Transition::ExcludeRange('0', '9')]);

        // Mixed negations exclude every member.
        let fa = nfa("[^a-cx]");
        for c in ["a", "b", "c", "x"] {
            assert!(!accepts(&fa, c), "{c}");
        }
        assert!(accepts(&fa, "d"));
        assert!(accepts(&fa, "\u{10FFFF}"));
    }
}
