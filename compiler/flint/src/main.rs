//! The Flint compiler driver: read the source file, parse, lower to IR,
//! optimise, allocate registers and emit x86-64 assembly on stdout. Exit
//! code 0 on success, 1 on any front-end or semantic error.
mod args;

use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::process::exit;

use clap::Parser;
use flint_analysis::{
    pointed_locals, predecessor_map, CallLiveness, InterferenceGraph, LivenessAnalysis,
};
use flint_codegen::{compute_register_allocation, peephole, x86, RegisterAllocation, X86Emitter};
use flint_ir::write::{graphviz, WriteIr};
use flint_ir::{Function, Module};
use flint_lower::{lower_program, Optimiser};
use flint_parser::parse_program;
use flint_pipeline::{timed, CompilerSettings, IrDumpMode};
use flint_reporting::{Report, Reporter};
use flint_target::ALLOCATABLE;
use log::debug;

fn main() {
    pretty_env_logger::init();
    let options = args::CompilerOptions::parse();
    exit(run(&options));
}

fn run(options: &args::CompilerOptions) -> i32 {
    let settings = CompilerSettings::from(options);
    let mut reporter = Reporter::new();

    let source = match fs::read_to_string(&options.filename) {
        Ok(source) => source,
        Err(error) => {
            reporter.emit(Report::error(format!(
                "cannot read file `{}`: {error}",
                options.filename
            )));
            return 1;
        }
    };

    let program = match parse_program(&source) {
        Ok(program) => program,
        Err(error) => {
            reporter.emit(Report::error(format!("syntax error: {error}")));
            return 1;
        }
    };

    let Some(mut module) = lower_program(&program, &mut reporter) else {
        return 1;
    };

    if settings.optimise() {
        let optimiser = Optimiser::new();
        for func in &mut module.functions {
            let name = func.name().to_string();
            timed(
                || optimiser.optimise(func),
                log::Level::Debug,
                |elapsed| debug!("optimised `{name}` in {elapsed:?}"),
            );
        }
    }

    if settings.dump_ir {
        if let Err(error) = dump_module(&module, &settings) {
            reporter.emit(Report::error(format!("cannot write output: {error}")));
            return 1;
        }
        return 0;
    }

    if let Err(error) = emit_module(&module, &settings) {
        reporter.emit(Report::error(format!("cannot write output: {error}")));
        return 1;
    }

    0
}

fn dump_module(module: &Module, settings: &CompilerSettings) -> std::io::Result<()> {
    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    for func in &module.functions {
        match settings.dump_mode {
            IrDumpMode::Pretty => writeln!(out, "{}", func.for_fmt(func))?,
            IrDumpMode::Graph => graphviz::write_graph(&mut out, func)?,
        }
    }
    Ok(())
}

fn emit_module(module: &Module, settings: &CompilerSettings) -> std::io::Result<()> {
    let stdout = std::io::stdout();
    let mut out = stdout.lock();

    for func in &module.functions {
        let preds = predecessor_map(func);
        let pointed = pointed_locals(func);
        let mut graph = InterferenceGraph::new(func.locals.len());
        let mut calls = CallLiveness::default();
        let live = LivenessAnalysis::new(func, &preds)
            .with_interference(&mut graph)
            .with_call_liveness(&mut calls)
            .compute();

        let allocation = if settings.optimise() {
            compute_register_allocation(func, &pointed, &graph, ALLOCATABLE.len() as u32)
        } else {
            RegisterAllocation::all_spilled(func)
        };

        if settings.emit_graphs {
            write_debug_artifacts(func, &graph)?;
        }

        let lines = X86Emitter::new(func, &allocation, &live, &calls).emit();
        let lines = peephole::simplify_asm(lines);
        x86::render(&lines, &mut out)?;
    }

    Ok(())
}

fn write_debug_artifacts(func: &Function, graph: &InterferenceGraph) -> std::io::Result<()> {
    let mut cfg = BufWriter::new(File::create(format!("{}.dot", func.name()))?);
    graphviz::write_graph(&mut cfg, func)?;

    let mut ig = BufWriter::new(File::create(format!("{}.ig.dot", func.name()))?);
    graph.write_dot(&mut ig)?;
    Ok(())
}
