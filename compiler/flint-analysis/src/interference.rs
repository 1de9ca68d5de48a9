//! The interference graph: a symmetric graph over local ids where an edge
//! joins two locals that are simultaneously live at some program point.
//! Built as a side effect of the liveness analysis so the IR is only
//! walked once.

use std::io::{self, Write};

use flint_ir::LocalId;
use smallvec::SmallVec;

pub struct InterferenceGraph {
    adjacency: Vec<SmallVec<[LocalId; 4]>>,
}

impl InterferenceGraph {
    pub fn new(local_count: usize) -> Self {
        Self { adjacency: vec![SmallVec::new(); local_count] }
    }

    /// Record that `a` and `b` are simultaneously live. Self-edges are
    /// ignored; duplicate edges are not recorded twice.
    pub fn add_interference(&mut self, a: LocalId, b: LocalId) {
        if a == b {
            return;
        }

        if !self.adjacency[a.index()].contains(&b) {
            self.adjacency[a.index()].push(b);
        }
        if !self.adjacency[b.index()].contains(&a) {
            self.adjacency[b.index()].push(a);
        }
    }

    pub fn neighbors(&self, local: LocalId) -> &[LocalId] {
        &self.adjacency[local.index()]
    }

    pub fn local_count(&self) -> usize {
        self.adjacency.len()
    }

    /// Write the graph in `graphviz` dot format.
    pub fn write_dot(&self, out: &mut impl Write) -> io::Result<()> {
        writeln!(out, "graph ig {{")?;
        for (i, neighbors) in self.adjacency.iter().enumerate() {
            writeln!(out, "    _{i}")?;
            for other in neighbors {
                if i < other.index() {
                    writeln!(out, "    _{i} -- _{}", other.index())?;
                }
            }
        }
        writeln!(out, "}}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id(index: usize) -> LocalId {
        LocalId::from_usize(index)
    }

    #[test]
    fn edges_are_symmetric_and_deduplicated() {
        let mut graph = InterferenceGraph::new(3);
        graph.add_interference(id(0), id(1));
        graph.add_interference(id(1), id(0));
        graph.add_interference(id(0), id(0));

        assert_eq!(graph.neighbors(id(0)), &[id(1)]);
        assert_eq!(graph.neighbors(id(1)), &[id(0)]);
        assert!(graph.neighbors(id(2)).is_empty());
    }

    #[test]
    fn dot_lists_each_edge_once() {
        let mut graph = InterferenceGraph::new(2);
        graph.add_interference(id(0), id(1));

        let mut out = Vec::new();
        graph.write_dot(&mut out).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert_eq!(text.matches("_0 -- _1").count(), 1);
    }
}
