/// Default cap on dictionary/array nesting during parsing.
pub const DEFAULT_MAX_NESTING_DEPTH: usize = 256;

/// Tunable limits for the tokenizer and object parser.
///
/// The defaults are safe for real-world documents; lowering the nesting
/// depth hardens a parser that is fed untrusted input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseOptions {
    /// Maximum depth of nested arrays and dictionaries before parsing
    /// fails with `PdfError::NestingTooDeep`.
    pub max_nesting_depth: usize,
}

impl Default for ParseOptions {
    fn default() -> Self {
        ParseOptions {
            max_nesting_depth: DEFAULT_MAX_NESTING_DEPTH,
        }
    }
}

impl ParseOptions {
    /// Sets the maximum nesting depth for composite objects.
    pub fn with_max_nesting_depth(mut self, depth: usize) -> Self {
        self.max_nesting_depth = depth;
        self
    }
}
