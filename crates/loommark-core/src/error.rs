use thiserror::Error;

/// Fatal engine errors. Construction-time variants indicate a bad parser
/// configuration; the invariant variant indicates a buggy block parser
/// detected at runtime. Malformed input never produces an error.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum EngineError {
    /// Inline parsers declare first characters in the ASCII range only.
    #[error("inline parser `{parser}` declares non-ASCII first char 0x{byte:02x}")]
    NonAsciiFirstChar { parser: &'static str, byte: u8 },

    /// Two inline parsers claimed the same dispatch-table entry.
    #[error("inline parsers `{first}` and `{second}` both claim first char {byte:?}")]
    DuplicateFirstChar {
        first: &'static str,
        second: &'static str,
        byte: char,
    },

    /// The block-parser list must contain the terminal paragraph parser.
    #[error("block parser list has no paragraph parser")]
    NoParagraphParser,

    /// A block parser broke the driver protocol.
    #[error("invariant violation at line {line_index} in `{parser}`: {reason}")]
    InvariantViolation {
        reason: String,
        line_index: usize,
        parser: &'static str,
    },
}
