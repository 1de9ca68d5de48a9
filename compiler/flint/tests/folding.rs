//! Property test for the optimiser: programs of the form
//! `int main() { return <constant expression>; }` must collapse to a
//! single store of the value a reference interpreter computes, with
//! 32-bit two's-complement wraparound.
//!
//! Expression trees are generated from a small deterministic PRNG; the
//! generator evaluates as it builds so it never produces a division by
//! zero or the `INT_MIN / -1` overflow, which the folder (correctly)
//! refuses to collapse.

use flint_ir::{Instruction, RValue};
use flint_lower::{lower_program, Optimiser};
use flint_parser::parse_program;
use flint_reporting::Reporter;

/// A tiny deterministic linear congruential generator.
struct Lcg(u64);

impl Lcg {
    fn next(&mut self) -> u64 {
        self.0 = self.0.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
        self.0 >> 33
    }

    fn below(&mut self, bound: u64) -> u64 {
        self.next() % bound
    }
}

/// Build a random expression of at most `depth` levels and return its
/// source text together with its value.
fn gen_expr(rng: &mut Lcg, depth: u32) -> (String, i32) {
    if depth == 0 || rng.below(4) == 0 {
        let value = rng.below(41) as i32 - 20;
        if value < 0 {
            // Parenthesise so a negative literal can follow any operator.
            return (format!("({value})"), value);
        }
        return (value.to_string(), value);
    }

    match rng.below(10) {
        0 => {
            let (text, value) = gen_expr(rng, depth - 1);
            (format!("(-{text})"), value.wrapping_neg())
        }
        1 => {
            let (text, value) = gen_expr(rng, depth - 1);
            (format!("(!{text})"), i32::from(value == 0))
        }
        _ => {
            let (left_text, left) = gen_expr(rng, depth - 1);
            let (right_text, right) = gen_expr(rng, depth - 1);

            let mut op = ["+", "-", "*", "/", "%", "==", "!=", "<", ">", "<=", ">=", "&", "^", "|"]
                [rng.below(14) as usize];
            // Steer clear of the two traps the folder will not touch.
            if matches!(op, "/" | "%") && (right == 0 || (left == i32::MIN && right == -1)) {
                op = "+";
            }

            let value = match op {
                "+" => left.wrapping_add(right),
                "-" => left.wrapping_sub(right),
                "*" => left.wrapping_mul(right),
                "/" => left.wrapping_div(right),
                "%" => left.wrapping_rem(right),
                "==" => i32::from(left == right),
                "!=" => i32::from(left != right),
                "<" => i32::from(left < right),
                ">" => i32::from(left > right),
                "<=" => i32::from(left <= right),
                ">=" => i32::from(left >= right),
                "&" => left & right,
                "^" => left ^ right,
                "|" => left | right,
                _ => unreachable!(),
            };

            (format!("({left_text} {op} {right_text})"), value)
        }
    }
}

/// Optimise the program and extract the single constant stored into the
/// return slot.
fn folded_return_value(source: &str) -> i64 {
    let program = parse_program(source).expect("generated source must parse");
    let mut reporter = Reporter::new();
    let mut module = lower_program(&program, &mut reporter).expect("generated source must lower");
    let func = &mut module.functions[0];
    Optimiser::new().optimise(func);

    let mut stores = Vec::new();
    for block in func.layout() {
        for instruction in &func.block(block).instructions {
            if let Instruction::Assignment { dest, source: RValue::Immediate(imm) } = instruction {
                if dest.id.index() == 0 {
                    stores.push(imm.read());
                }
            }
        }
    }

    assert_eq!(
        stores.len(),
        1,
        "a constant expression must fold to one return store:\n{}",
        source
    );
    stores[0]
}

#[test]
fn folded_constants_match_the_reference_interpreter() {
    let mut rng = Lcg(0x5eed);

    for case in 0..200 {
        let (text, expected) = gen_expr(&mut rng, 6);
        let source = format!("int main() {{ return {text}; }}");
        let actual = folded_return_value(&source);
        assert_eq!(
            actual,
            i64::from(expected),
            "case {case}: `{text}` must evaluate to {expected}"
        );
    }
}
