//! ANSI terminal highlighting for rendered diagnostics.

/// The colours a diagnostic label can be rendered in.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Colour {
    Red,
    Yellow,
    Blue,
}

impl Colour {
    fn code(self) -> &'static str {
        match self {
            Colour::Red => "31",
            Colour::Yellow => "33",
            Colour::Blue => "34",
        }
    }
}

/// Wrap `message` in the ANSI escape sequence for `colour`, bold. Only
/// applied when stderr is a terminal; the caller decides.
pub fn highlight(colour: Colour, message: &str) -> String {
    format!("\x1b[{}m\x1b[1m{}\x1b[0m", colour.code(), message)
}
