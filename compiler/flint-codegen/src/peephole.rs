//! Fixed-point peephole cleanup over the emitted assembly: self-moves
//! disappear, a jump to the label on the next line disappears, and labels
//! that nothing references disappear. Function entry labels (the only
//! ones without a leading dot) are always kept.

use crate::x86::AsmLine;

pub fn simplify_asm(mut lines: Vec<AsmLine>) -> Vec<AsmLine> {
    loop {
        let before = lines.len();
        lines = drop_self_moves(lines);
        lines = drop_jumps_to_next(lines);
        lines = drop_unreferenced_labels(lines);
        if lines.len() == before {
            return lines;
        }
    }
}

fn drop_self_moves(lines: Vec<AsmLine>) -> Vec<AsmLine> {
    lines
        .into_iter()
        .filter(|line| match line {
            AsmLine::Inst { op, args } if op.starts_with("mov") => {
                match args.split_once(", ") {
                    Some((src, dest)) => src != dest,
                    None => true,
                }
            }
            _ => true,
        })
        .collect()
}

fn drop_jumps_to_next(lines: Vec<AsmLine>) -> Vec<AsmLine> {
    let mut result: Vec<AsmLine> = Vec::with_capacity(lines.len());
    let mut iter = lines.into_iter().peekable();

    while let Some(line) = iter.next() {
        if let AsmLine::Jump(target) = &line {
            if matches!(iter.peek(), Some(AsmLine::Label(label)) if label == target) {
                continue;
            }
        }
        result.push(line);
    }

    result
}

fn drop_unreferenced_labels(lines: Vec<AsmLine>) -> Vec<AsmLine> {
    let referenced = |label: &str| {
        lines.iter().any(|line| match line {
            AsmLine::Jump(target) | AsmLine::CondJump(_, target) => target == label,
            // `leaq .f.literal.0(%rip), ...` style references.
            AsmLine::Inst { args, .. } => args.contains(label),
            AsmLine::Label(_) => false,
        })
    };

    let keep: Vec<bool> = lines
        .iter()
        .map(|line| match line {
            AsmLine::Label(label) => !label.starts_with('.') || referenced(label),
            _ => true,
        })
        .collect();

    lines.into_iter().zip(keep).filter_map(|(line, keep)| keep.then_some(line)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn inst(op: &str, args: &str) -> AsmLine {
        AsmLine::Inst { op: op.to_string(), args: args.to_string() }
    }

    #[test]
    fn self_moves_are_dropped() {
        let lines = vec![
            inst("movl", "%eax, %eax"),
            inst("movl", "%eax, %ebx"),
            inst("movslq", "%eax, %rax"),
        ];
        let simplified = simplify_asm(lines);
        assert_eq!(simplified.len(), 2);
    }

    #[test]
    fn jump_to_the_next_label_is_dropped_then_the_label_too() {
        let lines = vec![
            AsmLine::Label("f".to_string()),
            AsmLine::Jump(".f.BB0".to_string()),
            AsmLine::Label(".f.BB0".to_string()),
            inst("ret", ""),
        ];
        let simplified = simplify_asm(lines);
        // The jump falls through, and with no other reference the label
        // disappears in the next round.
        assert_eq!(
            simplified,
            vec![AsmLine::Label("f".to_string()), inst("ret", "")]
        );
    }

    #[test]
    fn referenced_labels_are_kept() {
        let lines = vec![
            AsmLine::Label("f".to_string()),
            AsmLine::CondJump("e", ".f.BB1".to_string()),
            AsmLine::Label(".f.BB1".to_string()),
            AsmLine::Label(".f.literal.0".to_string()),
            inst("leaq", ".f.literal.0(%rip), %r10"),
        ];
        let simplified = simplify_asm(lines);
        assert_eq!(simplified.len(), 5);
    }

    #[test]
    fn every_jump_still_has_a_label_after_cleanup() {
        let lines = vec![
            AsmLine::Label("f".to_string()),
            AsmLine::Jump(".f.BB2".to_string()),
            AsmLine::Label(".f.BB1".to_string()),
            inst("movl", "%eax, %eax"),
            AsmLine::Label(".f.BB2".to_string()),
            inst("ret", ""),
        ];
        let simplified = simplify_asm(lines);
        for line in &simplified {
            if let AsmLine::Jump(target) | AsmLine::CondJump(_, target) = line {
                assert!(simplified
                    .iter()
                    .any(|l| matches!(l, AsmLine::Label(label) if label == target)));
            }
        }
    }
}
