//! Graphviz rendering of syntax trees and automata, for debugging.

use std::fmt;

use crate::automaton::Automaton;
use crate::parser::Ast;

/// Display adapter rendering `T` as a DOT graph.
pub(crate) struct Dot<'a, T>(pub &'a T);

impl Ast {
    /// Render the tree as an undirected DOT graph.
    pub fn to_dot(&self) -> String {
        Dot(self).to_string()
    }
}

impl fmt::Display for Dot<'_, Ast> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "graph ast {{")?;
        write_node(self.0, f, &mut 0)?;
        writeln!(f, "}}")
    }
}

fn write_node(
    node: &Ast,
    f: &mut fmt::Formatter<'_>,
    next_id: &mut usize,
) -> Result<usize, fmt::Error> {
    let id = *next_id;
    *next_id += 1;

    write!(f, "  n{id} [label=\"{}", node.kind)?;
    if let Some(value) = node.value {
        write!(f, " ('{}')", value.escape_debug())?;
    }
    writeln!(f, "\"];")?;

    for child in &node.children {
        let child_id = write_node(child, f, next_id)?;
        writeln!(f, "  n{id} -- n{child_id};")?;
    }
    Ok(id)
}

impl Automaton {
    /// Render the automaton as a DOT digraph. Edge labels are the canonical
    /// text of each transition.
    pub fn to_dot(&self) -> String {
        Dot(self).to_string()
    }
}

impl fmt::Display for Dot<'_, Automaton> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "digraph fa {{")?;
        for (id, state) in self.0.states() {
            write!(f, "  {id} [label=\"{id}")?;
            if state.initial {
                f.write_str("-Start")?;
            }
            if state.accepting {
                f.write_str("-Accepted")?;
            }
            writeln!(f, "\"];")?;
            for edge in &state.edges {
                writeln!(f, "  {id} -> {} [label=\"{}\"];", edge.target, edge.transition)?;
            }
        }
        writeln!(f, "}}")
    }
}
