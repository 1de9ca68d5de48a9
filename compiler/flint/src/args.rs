//! Flint compiler arguments management.

use clap::Parser;
use flint_pipeline::{CompilerSettings, IrDumpMode, OptimisationLevel};

/// CompilerOptions is a structural representation of what arguments the
/// compiler can take when running.
#[derive(Parser)]
#[command(
    name = "flint",
    version,
    author = "The Flint Compiler authors",
    about = "Compile a C subset to x86-64 assembly",
    disable_colored_help = true
)]
pub(crate) struct CompilerOptions {
    /// Path of the source file to compile.
    #[arg(required = true)]
    pub(crate) filename: String,

    /// The optimisation level that the compiler should run at. `-O0`
    /// disables the optimisation loop and register allocation.
    #[arg(short = 'O', value_enum, default_value = "1")]
    pub(crate) optimisation_level: OptimisationLevel,

    /// Dump the optimised IR to stdout instead of emitting assembly.
    #[arg(long)]
    pub(crate) dump_ir: bool,

    /// The format used by `--dump-ir`, either `pretty` or `graph`.
    #[arg(long, value_enum, default_value = "pretty")]
    pub(crate) dump_mode: IrDumpMode,

    /// Do not write the per-function `<name>.dot` and `<name>.ig.dot`
    /// debug artifacts into the working directory.
    #[arg(long)]
    pub(crate) no_graphs: bool,
}

impl From<&CompilerOptions> for CompilerSettings {
    fn from(options: &CompilerOptions) -> Self {
        CompilerSettings {
            optimisation_level: options.optimisation_level,
            dump_ir: options.dump_ir,
            dump_mode: options.dump_mode,
            emit_graphs: !options.no_graphs,
            ..CompilerSettings::default()
        }
    }
}
