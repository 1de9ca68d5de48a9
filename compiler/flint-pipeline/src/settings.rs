//! Settings that are present on the compiler pipeline when initially
//! launching. These are assembled from the command-line arguments by the
//! driver and then threaded through every stage.

use std::fmt::Display;

/// Various settings that are present on the compiler pipeline when
/// initially launching.
#[derive(Debug, Clone)]
pub struct CompilerSettings {
    /// The optimisation level that is to be performed. At
    /// [`OptimisationLevel::O0`] the optimisation loop is skipped entirely
    /// and every local is spilled to the stack.
    pub optimisation_level: OptimisationLevel,

    /// Whether to dump the IR after optimisation instead of only emitting
    /// assembly, and in which format.
    pub dump_ir: bool,

    /// The format used when dumping the IR.
    pub dump_mode: IrDumpMode,

    /// Whether to write the per-function `<name>.dot` control-flow graph
    /// and `<name>.ig.dot` interference graph into the working directory.
    pub emit_graphs: bool,

    /// To what stage the compiler should run, anywhere from parsing to
    /// code generation.
    pub stage: CompilerStageKind,
}

impl Default for CompilerSettings {
    fn default() -> Self {
        Self {
            optimisation_level: OptimisationLevel::default(),
            dump_ir: false,
            dump_mode: IrDumpMode::default(),
            emit_graphs: true,
            stage: CompilerStageKind::default(),
        }
    }
}

impl CompilerSettings {
    /// Whether the optimisation loop should run at all.
    pub fn optimise(&self) -> bool {
        self.optimisation_level > OptimisationLevel::O0
    }
}

/// What optimisation level the compiler should run at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default, clap::ValueEnum)]
pub enum OptimisationLevel {
    /// Disable the optimisation loop and register allocation; every local
    /// lives on the stack and emission is as simple as possible.
    #[value(name = "0")]
    O0,

    /// Run the full fixed-point optimisation loop and the graph-colouring
    /// register allocator.
    #[default]
    #[value(name = "1")]
    O1,
}

impl OptimisationLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::O0 => "O0",
            Self::O1 => "O1",
        }
    }
}

/// Enum representing the different options for dumping the IR. It can
/// either be emitted in the pretty-printing format, or in the `graphviz`
/// format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum IrDumpMode {
    /// Dump the generated IR using a pretty-printed format.
    #[default]
    Pretty,

    /// Dump the generated IR using the `graphviz` format.
    Graph,
}

/// Enum representing what mode the compiler should run in. Specifically,
/// whether the compiler should stop at a particular stage of the pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub enum CompilerStageKind {
    Parse,
    Lower,
    Optimise,
    #[default]
    CodeGen,
}

impl Display for CompilerStageKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CompilerStageKind::Parse => write!(f, "parsing"),
            CompilerStageKind::Lower => write!(f, "lowering"),
            CompilerStageKind::Optimise => write!(f, "optimisation"),
            CompilerStageKind::CodeGen => write!(f, "codegen"),
        }
    }
}
