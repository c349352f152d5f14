// options.rs - Compile-time option flags.

use bitflags::bitflags;

bitflags! {
    /// Options applied when compiling a pattern.
    ///
    /// Options are fixed at compile time and baked into the bytecode; there
    /// are no per-search option overrides.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct Options: u32 {
        /// `^` and `$` match at line boundaries instead of only at the
        /// start/end of the input.
        ///
        /// Disables the dual-anchor fast path: a line anchor no longer pins
        /// the match span to the input length.
        const MULTILINE = 1 << 0;
        /// ASCII case-insensitive matching.
        const IGNORECASE = 1 << 1;
        /// `.` also matches `\n`.
        const DOTALL = 1 << 2;
    }
}

impl Options {
    #[inline]
    pub fn multiline(self) -> bool {
        self.contains(Options::MULTILINE)
    }

    #[inline]
    pub fn ignorecase(self) -> bool {
        self.contains(Options::IGNORECASE)
    }

    #[inline]
    pub fn dotall(self) -> bool {
        self.contains(Options::DOTALL)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_empty() {
        let opts = Options::default();
        assert!(!opts.multiline());
        assert!(!opts.ignorecase());
        assert!(!opts.dotall());
    }

    #[test]
    fn flag_combination() {
        let opts = Options::MULTILINE | Options::IGNORECASE;
        assert!(opts.multiline());
        assert!(opts.ignorecase());
        assert!(!opts.dotall());
    }
}
