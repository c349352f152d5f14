// program.rs - Internal types: bytecode operations, the compiled pattern,
// and engine limits.

use crate::analyze::AnchorFastPath;
use crate::ast::BitSet;
use crate::error::RegexError;
use crate::options::Options;

// === Config Constants ===
pub const DEFAULT_PARSE_DEPTH_LIMIT: u32 = 512;
pub const DEFAULT_RETRY_LIMIT_IN_MATCH: u64 = 10_000_000;
pub const MAX_REPEAT_NUM: u32 = 100_000;
/// Bytecode size limit; repeat expansion is the only way to approach it.
pub const MAX_PROGRAM_OPS: usize = 1 << 16;

/// One bytecode instruction of the backtracking matcher.
///
/// Case folding and class negation are resolved at compile time: `BytesIc`
/// carries lowercased bytes, `Class` carries the final byte set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Op {
    /// Successful end of the program.
    End,
    /// Match a literal byte run.
    Bytes(Vec<u8>),
    /// Match a literal byte run, ASCII case-insensitively.
    BytesIc(Vec<u8>),
    /// Match one byte contained in the set.
    Class(Box<BitSet>),
    /// Match one byte except `\n`.
    AnyChar,
    /// Match any one byte (DOTALL `.`).
    AnyCharMl,
    TextStart,
    TextEnd,
    LineStart,
    LineEnd,
    WordBoundary,
    NoWordBoundary,
    /// Push a choice point: on failure, resume at `addr` with the saved
    /// position.
    Push { addr: usize },
    Jump { addr: usize },
    /// Record the start/end of capturing group `mem` (backreference
    /// support only).
    MemStart { mem: usize },
    MemEnd { mem: usize },
    BackRef { mem: usize },
    BackRefIc { mem: usize },
    /// Guard against zero-progress repeat iterations: `EmptyCheckStart`
    /// records the position, `EmptyCheckEnd` fails the iteration if it has
    /// not advanced.
    EmptyCheckStart { id: usize },
    EmptyCheckEnd { id: usize },
    /// Zero-width sub-match (`(?=...)` / `(?!...)`).
    Look { prog: Box<[Op]>, negated: bool },
}

/// A compiled pattern: bytecode plus everything derived at compile time.
///
/// Immutable after [`Pattern::compile`] returns; a `&Pattern` may be
/// shared freely across threads and consulted by any number of concurrent
/// match calls.
pub struct Pattern {
    /// The source pattern, kept for diagnostics.
    pub pattern: Vec<u8>,
    pub options: Options,
    pub ops: Vec<Op>,
    /// Number of capturing groups.
    pub group_count: u32,
    /// Number of empty-check slots the matcher must allocate.
    pub num_empty_checks: usize,
    /// Dual-anchor fast-path data; see [`crate::analyze`].
    pub fast_path: AnchorFastPath,
    /// The program can only match starting exactly at the search start.
    pub anchored_start: bool,
    /// First-byte prefilter for unanchored search: the two byte values a
    /// match can start with (equal when only one is possible).
    pub first_bytes: Option<(u8, u8)>,
}

impl Pattern {
    /// Parse, analyze and compile a pattern in one step.
    pub fn compile(pattern: &[u8], options: Options) -> Result<Pattern, RegexError> {
        crate::compile::compile(pattern, options)
    }
}

impl std::fmt::Debug for Pattern {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Pattern")
            .field("pattern", &String::from_utf8_lossy(&self.pattern))
            .field("options", &self.options)
            .field("fast_path", &self.fast_path)
            .field("anchored_start", &self.anchored_start)
            .finish_non_exhaustive()
    }
}
