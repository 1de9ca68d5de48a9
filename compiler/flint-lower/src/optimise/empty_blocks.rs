//! Empty-block elimination. Jumps whose target is an empty forwarding
//! block are retargeted through it; a non-empty block with a single
//! predecessor is merged into that predecessor; and a conditional jump
//! whose branch lands on an empty block testing the same condition
//! shortcuts through the matching arm of that test.
//!
//! Blocks bypassed during an iteration are marked and not re-examined, and
//! blocks that gained an edge mid-pass are never merge candidates, since
//! the predecessor map was computed when the pass started.

use flint_analysis::predecessor_map;
use flint_ir::{BlockId, Function, Terminator};
use indexmap::IndexSet;

pub struct EmptyBlockElimination;

impl EmptyBlockElimination {
    pub fn run(func: &mut Function) -> bool {
        let preds = predecessor_map(func);
        let mut skip = vec![false; func.block_count()];
        let mut retargeted: IndexSet<BlockId> = IndexSet::new();
        let mut changed = false;

        let layout: Vec<_> = func.layout().collect();
        for current in layout {
            if skip[current.index()] {
                continue;
            }
            if preds[current].is_empty() {
                // Unreachable blocks are left for reordering to drop; the
                // prologue itself is never a rewrite site.
                continue;
            }

            let Some(terminator) = func.block(current).terminator.clone() else { continue };

            match terminator {
                Terminator::Jump { target } => {
                    if target == current {
                        continue;
                    }

                    match func.block(target).terminator.clone() {
                        Some(Terminator::Jump { target: next })
                            if func.block(target).is_empty() && next != target =>
                        {
                            func.block_mut(current).terminate(Terminator::Jump { target: next });
                            skip[target.index()] = true;
                            retargeted.insert(next);
                            changed = true;
                        }
                        Some(Terminator::Jump { target: next })
                            if preds[target].len() <= 1
                                && next != target
                                && !retargeted.contains(&target) =>
                        {
                            // Sole predecessor: absorb the block outright.
                            func.merge_instructions(current, target);
                            func.block_mut(current).terminate(Terminator::Jump { target: next });
                            skip[target.index()] = true;
                            retargeted.insert(next);
                            changed = true;
                        }
                        _ => {}
                    }
                }
                Terminator::ConditionalJump { condition, on_true, on_false } => {
                    let mut rewritten = false;

                    let mut shortcut = |branch: BlockId, take_true: bool| -> BlockId {
                        if !func.block(branch).is_empty() {
                            return branch;
                        }
                        match func.block(branch).terminator.clone() {
                            Some(Terminator::Jump { target: next }) if next != branch => {
                                skip[branch.index()] = true;
                                rewritten = true;
                                next
                            }
                            Some(Terminator::ConditionalJump {
                                condition: nested,
                                on_true: nested_true,
                                on_false: nested_false,
                            }) if nested == condition => {
                                skip[branch.index()] = true;
                                rewritten = true;
                                if take_true {
                                    nested_true
                                } else {
                                    nested_false
                                }
                            }
                            _ => branch,
                        }
                    };

                    let new_true = shortcut(on_true, true);
                    let new_false = shortcut(on_false, false);

                    if rewritten {
                        retargeted.insert(new_true);
                        retargeted.insert(new_false);
                        func.block_mut(current).terminate(Terminator::ConditionalJump {
                            condition,
                            on_true: new_true,
                            on_false: new_false,
                        });
                        changed = true;
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
    use flint_ir::{Immediate, Instruction, Local, LocalId, RValue, TyId};

    fn imm(value: i64) -> RValue {
        RValue::Immediate(Immediate::new(value, TyId::INT))
    }

    #[test]
    fn empty_forwarding_blocks_are_bypassed() {
        let mut func = Function::new("f", TyId::INT);
        let entry = func.new_block();
        let hop = func.new_block();
        let end = func.new_block();
        let epilogue = func.epilogue();

        func.block_mut(func.prologue()).terminate(Terminator::Jump { target: entry });
        func.block_mut(entry).terminate(Terminator::Jump { target: hop });
        func.block_mut(hop).terminate(Terminator::Jump { target: end });
        func.block_mut(end).terminate(Terminator::Jump { target: epilogue });

        assert!(EmptyBlockElimination::run(&mut func));
        assert_eq!(func.block(entry).terminator, Some(Terminator::Jump { target: end }));
    }

    #[test]
    fn single_predecessor_blocks_are_merged() {
        let mut func = Function::new("f", TyId::INT);
        let entry = func.new_block();
        let tail = func.new_block();
        let x = func.new_local(TyId::INT);
        let epilogue = func.epilogue();

        func.block_mut(func.prologue()).terminate(Terminator::Jump { target: entry });
        func.block_mut(entry).push(Instruction::Assignment { dest: x, source: imm(1) });
        func.block_mut(entry).terminate(Terminator::Jump { target: tail });
        func.block_mut(tail).push(Instruction::Assignment { dest: x, source: imm(2) });
        func.block_mut(tail).terminate(Terminator::Jump { target: epilogue });

        assert!(EmptyBlockElimination::run(&mut func));
        assert_eq!(func.block(entry).instructions.len(), 2);
        assert!(func.block(tail).is_empty());
        assert_eq!(
            func.block(entry).terminator,
            Some(Terminator::Jump { target: epilogue })
        );
    }

    #[test]
    fn conditional_branches_skip_empty_blocks_independently() {
        let mut func = Function::new("f", TyId::INT);
        let entry = func.new_block();
        let hop_true = func.new_block();
        let real_true = func.new_block();
        let real_false = func.new_block();
        let cond = Local { id: LocalId::from_usize(1), ty: TyId::BOOL };
        let epilogue = func.epilogue();

        func.block_mut(func.prologue()).terminate(Terminator::Jump { target: entry });
        func.block_mut(entry).terminate(Terminator::ConditionalJump {
            condition: RValue::Local(cond),
            on_true: hop_true,
            on_false: real_false,
        });
        func.block_mut(hop_true).terminate(Terminator::Jump { target: real_true });
        func.block_mut(real_true).terminate(Terminator::Jump { target: epilogue });
        func.block_mut(real_false).push(Instruction::Nop);
        func.block_mut(real_false).terminate(Terminator::Jump { target: epilogue });

        assert!(EmptyBlockElimination::run(&mut func));
        assert_eq!(
            func.block(entry).terminator,
            Some(Terminator::ConditionalJump {
                condition: RValue::Local(cond),
                on_true: real_true,
                on_false: real_false,
            })
        );
    }

    #[test]
    fn repeated_condition_shortcuts_through_the_matching_arm() {
        // entry jumps on c; its false branch is an empty block that tests c
        // again. The second test must resolve to its own false arm.
        let mut func = Function::new("f", TyId::INT);
        let entry = func.new_block();
        let retest = func.new_block();
        let a = func.new_block();
        let b = func.new_block();
        let c = Local { id: LocalId::from_usize(1), ty: TyId::BOOL };
        let epilogue = func.epilogue();

        func.block_mut(func.prologue()).terminate(Terminator::Jump { target: entry });
        func.block_mut(entry).terminate(Terminator::ConditionalJump {
            condition: RValue::Local(c),
            on_true: a,
            on_false: retest,
        });
        func.block_mut(retest).terminate(Terminator::ConditionalJump {
            condition: RValue::Local(c),
            on_true: a,
            on_false: b,
        });
        func.block_mut(a).push(Instruction::Nop);
        func.block_mut(a).terminate(Terminator::Jump { target: epilogue });
        func.block_mut(b).push(Instruction::Nop);
        func.block_mut(b).terminate(Terminator::Jump { target: epilogue });

        assert!(EmptyBlockElimination::run(&mut func));
        assert_eq!(
            func.block(entry).terminator,
            Some(Terminator::ConditionalJump {
                condition: RValue::Local(c),
                on_true: a,
                on_false: b,
            })
        );
    }
}
