//! Backwards block liveness. Every block carries an input set (live at
//! entry) and an output set (live at exit); the fixed point satisfies
//! `input(B) = (output(B) \ defs(B)) ∪ upward_uses(B)` and
//! `output(B) = ⋃ input(S)` over the successors `S`.
//!
//! The same traversal optionally produces two side outputs so the IR is
//! only walked once: the [InterferenceGraph] (an edge for every pair of
//! simultaneously-live locals) and the [CallLiveness] table (the live sets
//! immediately before and after every call, which identify the values that
//! must survive the call boundary).

use std::collections::HashMap;

use flint_ir::{BlockId, Function, Instruction, LocalId, RValue, Terminator};
use index_vec::IndexVec;
use indexmap::IndexSet;
use itertools::Itertools;
use log::trace;

use crate::dependence::Predecessors;
use crate::interference::InterferenceGraph;

pub type LiveSet = IndexSet<LocalId>;

#[derive(Debug, Default, Clone)]
pub struct BlockLiveness {
    /// Locals live on entry to the block.
    pub input: LiveSet,
    /// Locals live on exit from the block.
    pub output: LiveSet,
}

pub type BlockLivenessMap = IndexVec<BlockId, BlockLiveness>;

/// Per-call live sets, keyed by the call's position. `before` is the live
/// set just before the call executes (arguments included); `after` is the
/// live set just after it.
#[derive(Debug, Default)]
pub struct CallLiveness {
    sites: HashMap<(BlockId, usize), (LiveSet, LiveSet)>,
}

impl CallLiveness {
    /// The `(before, after)` live sets of the call at `index` in `block`.
    pub fn at(&self, block: BlockId, index: usize) -> Option<&(LiveSet, LiveSet)> {
        self.sites.get(&(block, index))
    }

    /// The locals live both before and after the call, i.e. the values
    /// that must survive it.
    pub fn live_across(&self, block: BlockId, index: usize) -> LiveSet {
        match self.at(block, index) {
            Some((before, after)) => before.intersection(after).copied().collect(),
            None => LiveSet::new(),
        }
    }
}

/// The liveness worklist pass. Construct with [LivenessAnalysis::new],
/// attach the optional side outputs, then [LivenessAnalysis::compute].
pub struct LivenessAnalysis<'a> {
    func: &'a Function,
    preds: &'a Predecessors,
    interference: Option<&'a mut InterferenceGraph>,
    calls: Option<&'a mut CallLiveness>,
    live: BlockLivenessMap,
    working: LiveSet,
}

impl<'a> LivenessAnalysis<'a> {
    pub fn new(func: &'a Function, preds: &'a Predecessors) -> Self {
        let live = (0..func.block_count())
            .map(|_| BlockLiveness::default())
            .collect::<Vec<_>>()
            .into();
        Self { func, preds, interference: None, calls: None, live, working: LiveSet::new() }
    }

    /// Also build the interference graph while the analysis runs.
    pub fn with_interference(mut self, graph: &'a mut InterferenceGraph) -> Self {
        self.interference = Some(graph);
        self
    }

    /// Also record the live sets around every call.
    pub fn with_call_liveness(mut self, calls: &'a mut CallLiveness) -> Self {
        self.calls = Some(calls);
        self
    }

    /// Run the worklist to its fixed point and return the per-block sets.
    pub fn compute(mut self) -> BlockLivenessMap {
        // The epilogue observes the return slot.
        self.live[self.func.epilogue()].output.insert(self.func.return_local().id);

        // Seed with every block so each is visited at least once.
        let mut to_visit: Vec<BlockId> = self.func.layout().collect();

        while let Some(current) = to_visit.pop() {
            self.working = self.live[current].output.clone();
            self.visit_block(current);

            if self.flush_block_input(current) {
                for &dep in &self.preds[current] {
                    if self.propagate(current, dep) {
                        trace!("liveness: re-queueing {:?}", dep);
                        to_visit.push(dep);
                    }
                }
            }
        }

        self.live
    }

    fn visit_block(&mut self, block: BlockId) {
        let data = self.func.block(block);

        if let Some(Terminator::ConditionalJump { condition, .. }) = &data.terminator {
            self.set_live_rvalue(condition);
        }

        for (index, instruction) in data.instructions.iter().enumerate().rev() {
            self.visit_instruction(block, index, instruction);
        }
    }

    // Def is applied before uses: in reverse order this keeps `x` live
    // through self-updates like `x := x + 1`.
    fn visit_instruction(&mut self, block: BlockId, index: usize, instruction: &Instruction) {
        match instruction {
            Instruction::Nop => {}
            Instruction::BinaryOp { dest, left, right, .. } => {
                self.unset_live(dest.id);
                self.set_live_rvalue(left);
                self.set_live_rvalue(right);
            }
            Instruction::UnaryOp { dest, operand, .. } => {
                self.unset_live(dest.id);
                self.set_live_rvalue(operand);
            }
            Instruction::Assignment { dest, source } | Instruction::Cast { dest, source } => {
                self.unset_live(dest.id);
                self.set_live_rvalue(source);
            }
            Instruction::Call { dest, args, .. } => {
                if let Some(calls) = self.calls.as_deref_mut() {
                    calls.sites.entry((block, index)).or_default().1 = self.working.clone();
                }
                self.unset_live(dest.id);
                for arg in args {
                    self.set_live_rvalue(arg);
                }
                if let Some(calls) = self.calls.as_deref_mut() {
                    calls.sites.entry((block, index)).or_default().0 = self.working.clone();
                }
            }
            Instruction::PointerRead { dest, address } => {
                self.unset_live(dest.id);
                self.set_live_rvalue(address);
            }
            Instruction::PointerWrite { address, source } => {
                self.set_live_rvalue(address);
                self.set_live_rvalue(source);
            }
            Instruction::AddressOf { dest, source } => {
                self.unset_live(dest.id);
                if let flint_ir::Addressable::Local(local) = source {
                    self.set_live(local.id);
                }
            }
        }
    }

    fn set_live_rvalue(&mut self, rvalue: &RValue) {
        if let RValue::Local(local) = rvalue {
            self.set_live(local.id);
        }
    }

    fn set_live(&mut self, local: LocalId) {
        if self.working.insert(local) {
            if let Some(graph) = self.interference.as_deref_mut() {
                for &other in &self.working {
                    if other != local {
                        graph.add_interference(local, other);
                    }
                }
            }
        }
    }

    fn unset_live(&mut self, local: LocalId) {
        self.working.shift_remove(&local);
    }

    /// Merge the working set into the block's input set; true when the
    /// input grew.
    fn flush_block_input(&mut self, block: BlockId) -> bool {
        let working = std::mem::take(&mut self.working);
        let mut changed = false;
        for local in working {
            changed |= self.live[block].input.insert(local);
        }
        changed
    }

    /// Merge `source`'s input into `target`'s output; true when the output
    /// grew. Newly inserted locals interfere with every existing member.
    fn propagate(&mut self, source: BlockId, target: BlockId) -> bool {
        let source_input = self.live[source].input.iter().copied().collect_vec();
        let mut changed = false;

        for local in source_input {
            if self.live[target].output.insert(local) {
                changed = true;
                if let Some(graph) = self.interference.as_deref_mut() {
                    for &other in &self.live[target].output {
                        if other != local {
                            graph.add_interference(local, other);
                        }
                    }
                }
            }
        }

        changed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dependence::predecessor_map;
    use flint_ir::{BinOp, Immediate, TyId};

    fn imm(value: i64) -> RValue {
        RValue::Immediate(Immediate::new(value, TyId::INT))
    }

    /// s := 0; i := 1; while (i <= 10) { s := s + i; i := i + 1 }; _0 := s
    fn loop_function() -> Function {
        let mut func = Function::new("sum", TyId::INT);
        let entry = func.new_block();
        let cond = func.new_block();
        let body = func.new_block();
        let exit = func.new_block();

        let s = func.new_local(TyId::INT);
        let i = func.new_local(TyId::INT);
        let t = func.new_local(TyId::BOOL);
        let ret = func.return_local();
        let epilogue = func.epilogue();

        func.block_mut(func.prologue()).terminate(Terminator::Jump { target: entry });

        let b = func.block_mut(entry);
        b.push(Instruction::Assignment { dest: s, source: imm(0) });
        b.push(Instruction::Assignment { dest: i, source: imm(1) });
        b.terminate(Terminator::Jump { target: cond });

        let b = func.block_mut(cond);
        b.push(Instruction::BinaryOp {
            dest: t,
            left: RValue::Local(i),
            right: imm(10),
            op: BinOp::Le,
        });
        b.terminate(Terminator::ConditionalJump {
            condition: RValue::Local(t),
            on_true: body,
            on_false: exit,
        });

        let b = func.block_mut(body);
        b.push(Instruction::BinaryOp {
            dest: s,
            left: RValue::Local(s),
            right: RValue::Local(i),
            op: BinOp::Add,
        });
        b.push(Instruction::BinaryOp {
            dest: i,
            left: RValue::Local(i),
            right: imm(1),
            op: BinOp::Add,
        });
        b.terminate(Terminator::Jump { target: cond });

        let b = func.block_mut(exit);
        b.push(Instruction::Assignment { dest: ret, source: RValue::Local(s) });
        b.terminate(Terminator::Jump { target: epilogue });

        func
    }

    #[test]
    fn loop_carried_locals_stay_live_around_the_back_edge() {
        let func = loop_function();
        let preds = predecessor_map(&func);
        let live = LivenessAnalysis::new(&func, &preds).compute();

        let s = LocalId::from_usize(1);
        let i = LocalId::from_usize(2);

        // Both accumulator and counter are live at the loop condition.
        let cond = func.body[1];
        assert!(live[cond].input.contains(&s));
        assert!(live[cond].input.contains(&i));

        // The body keeps both alive on exit (back to the condition).
        let body = func.body[2];
        assert!(live[body].output.contains(&s));
        assert!(live[body].output.contains(&i));

        // Nothing is live on entry to the whole function.
        assert!(live[func.prologue()].input.is_empty());
    }

    #[test]
    fn simultaneously_live_locals_interfere() {
        let func = loop_function();
        let preds = predecessor_map(&func);
        let mut graph = InterferenceGraph::new(func.locals.len());
        LivenessAnalysis::new(&func, &preds).with_interference(&mut graph).compute();

        let s = LocalId::from_usize(1);
        let i = LocalId::from_usize(2);
        assert!(graph.neighbors(s).contains(&i));
        assert!(graph.neighbors(i).contains(&s));
    }

    #[test]
    fn call_live_sets_surround_the_call() {
        // x := 1; y := f(x); _0 := x + y  -- x is live across the call.
        let mut func = Function::new("g", TyId::INT);
        let entry = func.new_block();
        let x = func.new_local(TyId::INT);
        let y = func.new_local(TyId::INT);
        let ret = func.return_local();
        let epilogue = func.epilogue();

        func.block_mut(func.prologue()).terminate(Terminator::Jump { target: entry });
        let b = func.block_mut(entry);
        b.push(Instruction::Assignment { dest: x, source: imm(1) });
        b.push(Instruction::Call {
            dest: y,
            name: "f".to_string(),
            args: vec![RValue::Local(x)],
            variadic: false,
        });
        b.push(Instruction::BinaryOp {
            dest: ret,
            left: RValue::Local(x),
            right: RValue::Local(y),
            op: BinOp::Add,
        });
        b.terminate(Terminator::Jump { target: epilogue });

        let preds = predecessor_map(&func);
        let mut calls = CallLiveness::default();
        LivenessAnalysis::new(&func, &preds).with_call_liveness(&mut calls).compute();

        let across = calls.live_across(entry, 1);
        assert!(across.contains(&x.id));
        assert!(!across.contains(&y.id));
    }
}
