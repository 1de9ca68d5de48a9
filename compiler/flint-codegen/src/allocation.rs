//! Graph-colouring register allocation. Pointed locals are spilled up
//! front (their storage must be addressable); the remaining vertices are
//! removed from the graph largest-degree-first onto a stack, then coloured
//! as the stack unwinds with the smallest colour no assigned neighbour
//! uses. A vertex with no free colour joins the spill set. The allocator
//! runs once; spill decisions do not trigger a second round.

use flint_analysis::{InterferenceGraph, PointedLocals};
use flint_ir::{Function, LocalId};
use indexmap::{IndexMap, IndexSet};
use log::debug;

pub type ColorId = u32;

/// The allocator's verdict: every local either holds a colour (register)
/// or lives in a stack slot.
#[derive(Debug, Default)]
pub struct RegisterAllocation {
    pub registers: IndexMap<LocalId, ColorId>,
    pub spilled: IndexSet<LocalId>,
}

impl RegisterAllocation {
    /// The `-O0` allocation: no registers at all.
    pub fn all_spilled(func: &Function) -> Self {
        Self {
            registers: IndexMap::new(),
            spilled: (0..func.locals.len()).map(LocalId::from_usize).collect(),
        }
    }
}

pub fn compute_register_allocation(
    func: &Function,
    pointed: &PointedLocals,
    graph: &InterferenceGraph,
    register_count: u32,
) -> RegisterAllocation {
    let mut result = RegisterAllocation::default();
    result.spilled.extend(pointed.iter().copied());

    let mut removed_stack: Vec<LocalId> = Vec::new();

    // Simplify: repeatedly take the in-graph vertex with the most in-graph
    // neighbours.
    loop {
        let in_graph = |local: LocalId| {
            !result.spilled.contains(&local) && !removed_stack.contains(&local)
        };

        let mut best: Option<(LocalId, usize)> = None;
        for index in 0..graph.local_count() {
            let local = LocalId::from_usize(index);
            if !in_graph(local) {
                continue;
            }

            let degree =
                graph.neighbors(local).iter().filter(|&&other| in_graph(other)).count();
            match best {
                Some((_, best_degree)) if degree <= best_degree => {}
                _ => best = Some((local, degree)),
            }
        }

        match best {
            Some((local, _)) => removed_stack.push(local),
            None => break,
        }
    }

    // Select: colour in reverse removal order.
    while let Some(local) = removed_stack.pop() {
        let mut used: IndexSet<ColorId> = IndexSet::new();
        for neighbor in graph.neighbors(local) {
            if let Some(&color) = result.registers.get(neighbor) {
                used.insert(color);
            }
        }

        match (0..register_count).find(|color| !used.contains(color)) {
            Some(color) => {
                result.registers.insert(local, color);
            }
            None => {
                result.spilled.insert(local);
            }
        }
    }

    debug!(
        "allocation for `{}`: {} in registers, {} spilled",
        func.name(),
        result.registers.len(),
        result.spilled.len()
    );
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use flint_ir::TyId;

    fn id(index: usize) -> LocalId {
        LocalId::from_usize(index)
    }

    fn dummy_function(locals: usize) -> Function {
        let mut func = Function::new("f", TyId::INT);
        for _ in 1..locals {
            func.new_local(TyId::INT);
        }
        func
    }

    /// No two neighbours may share a colour.
    fn assert_valid_colouring(graph: &InterferenceGraph, allocation: &RegisterAllocation) {
        for index in 0..graph.local_count() {
            let local = id(index);
            let Some(&color) = allocation.registers.get(&local) else { continue };
            for neighbor in graph.neighbors(local) {
                if let Some(&other) = allocation.registers.get(neighbor) {
                    assert_ne!(color, other, "{local:?} and {neighbor:?} share colour {color}");
                }
            }
        }
    }

    #[test]
    fn a_triangle_needs_three_colours() {
        let func = dummy_function(3);
        let mut graph = InterferenceGraph::new(3);
        graph.add_interference(id(0), id(1));
        graph.add_interference(id(1), id(2));
        graph.add_interference(id(0), id(2));

        let allocation =
            compute_register_allocation(&func, &PointedLocals::new(), &graph, 3);
        assert_eq!(allocation.registers.len(), 3);
        assert!(allocation.spilled.is_empty());
        assert_valid_colouring(&graph, &allocation);
    }

    #[test]
    fn colour_exhaustion_spills() {
        // A 3-clique with only two registers: one vertex must spill.
        let func = dummy_function(3);
        let mut graph = InterferenceGraph::new(3);
        graph.add_interference(id(0), id(1));
        graph.add_interference(id(1), id(2));
        graph.add_interference(id(0), id(2));

        let allocation =
            compute_register_allocation(&func, &PointedLocals::new(), &graph, 2);
        assert_eq!(allocation.registers.len(), 2);
        assert_eq!(allocation.spilled.len(), 1);
        assert_valid_colouring(&graph, &allocation);
    }

    #[test]
    fn pointed_locals_are_pre_spilled_and_never_coloured() {
        let func = dummy_function(2);
        let mut graph = InterferenceGraph::new(2);
        graph.add_interference(id(0), id(1));

        let mut pointed = PointedLocals::new();
        pointed.insert(id(1));

        let allocation = compute_register_allocation(&func, &pointed, &graph, 4);
        assert!(allocation.spilled.contains(&id(1)));
        assert!(!allocation.registers.contains_key(&id(1)));
        assert!(allocation.registers.contains_key(&id(0)));
    }

    #[test]
    fn disconnected_vertices_share_the_first_colour() {
        let func = dummy_function(3);
        let graph = InterferenceGraph::new(3);
        let allocation =
            compute_register_allocation(&func, &PointedLocals::new(), &graph, 4);
        assert!(allocation.registers.values().all(|&color| color == 0));
    }
}
