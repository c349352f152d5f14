// api.rs - Idiomatic Rust API for Ancora.
//
// Wraps the engine internals (Pattern::compile, exec::search) with
// Rust-native types: Regex, RegexBuilder, Match, FindIter.

use std::ops::Range;

use crate::analyze::AnchorFastPath;
use crate::error::RegexError;
use crate::exec;
use crate::options::Options;
use crate::program::Pattern;

/// A compiled regular expression.
///
/// # Examples
///
/// ```
/// use ancora::api::Regex;
///
/// let re = Regex::new(r"[0-9]+").unwrap();
/// assert!(re.is_match("hello 42"));
///
/// let m = re.find("hello 42").unwrap();
/// assert_eq!(m.as_str(), "42");
/// assert_eq!(m.start(), 6);
/// assert_eq!(m.end(), 8);
/// ```
///
/// Patterns anchored at both ends with a fixed-length body get the
/// dual-anchor fast path: inputs of the wrong length are rejected without
/// running the matcher at all.
///
/// ```
/// use ancora::api::Regex;
///
/// let re = Regex::new(r"^1234$").unwrap();
/// assert!(re.fast_path().eligible);
/// assert!(!re.is_match("12345678901234567890")); // length check only
/// assert!(re.is_match("1234"));
/// ```
pub struct Regex {
    inner: Pattern,
}

impl Regex {
    /// Compile a pattern using default options.
    pub fn new(pattern: &str) -> Result<Regex, RegexError> {
        Self::new_bytes(pattern.as_bytes())
    }

    /// Compile a pattern from raw bytes using default options.
    pub fn new_bytes(pattern: &[u8]) -> Result<Regex, RegexError> {
        let inner = Pattern::compile(pattern, Options::default())?;
        Ok(Regex { inner })
    }

    /// Create a [`RegexBuilder`] for fine-grained control over compilation.
    pub fn builder(pattern: &str) -> RegexBuilder {
        RegexBuilder::new(pattern)
    }

    /// Return the first match in `text`, or `None` if no match.
    pub fn find<'t>(&self, text: &'t str) -> Option<Match<'t>> {
        self.find_bytes(text.as_bytes())
    }

    /// Return the first match in `text` (as bytes), or `None` if no match.
    ///
    /// A search that exceeds the backtracking retry limit reports "no
    /// match"; use [`crate::exec::search`] to observe the limit.
    pub fn find_bytes<'t>(&self, text: &'t [u8]) -> Option<Match<'t>> {
        self.find_bytes_at(text, 0)
    }

    fn find_bytes_at<'t>(&self, text: &'t [u8], start: usize) -> Option<Match<'t>> {
        match exec::search(&self.inner, text, start) {
            Ok(Some((start, end))) => Some(Match { text, start, end }),
            _ => None,
        }
    }

    /// Check whether `text` matches the pattern anywhere.
    pub fn is_match(&self, text: &str) -> bool {
        self.is_match_bytes(text.as_bytes())
    }

    /// Check whether `text` (as bytes) matches the pattern anywhere.
    pub fn is_match_bytes(&self, text: &[u8]) -> bool {
        matches!(exec::search(&self.inner, text, 0), Ok(Some(_)))
    }

    /// Iterate over all non-overlapping matches in `text`.
    pub fn find_iter<'r, 't>(&'r self, text: &'t str) -> FindIter<'r, 't> {
        self.find_iter_bytes(text.as_bytes())
    }

    /// Iterate over all non-overlapping matches in `text` (as bytes).
    pub fn find_iter_bytes<'r, 't>(&'r self, text: &'t [u8]) -> FindIter<'r, 't> {
        FindIter {
            regex: self,
            text,
            last_end: 0,
            last_was_empty: false,
        }
    }

    /// The dual-anchor fast-path data derived for this pattern.
    pub fn fast_path(&self) -> &AnchorFastPath {
        &self.inner.fast_path
    }

    /// The options this pattern was compiled with.
    pub fn options(&self) -> Options {
        self.inner.options
    }

    /// Access the underlying [`Pattern`] for low-level usage.
    pub fn as_raw(&self) -> &Pattern {
        &self.inner
    }
}

impl std::fmt::Debug for Regex {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Regex")
            .field("pattern", &String::from_utf8_lossy(&self.inner.pattern))
            .finish_non_exhaustive()
    }
}

// === RegexBuilder ===

/// Builder for compiling a [`Regex`] with custom options.
///
/// # Examples
///
/// ```
/// use ancora::api::Regex;
///
/// let re = Regex::builder(r"hello world")
///     .case_insensitive(true)
///     .build()
///     .unwrap();
/// assert!(re.is_match("Hello World"));
/// ```
pub struct RegexBuilder {
    pattern: Vec<u8>,
    options: Options,
}

impl RegexBuilder {
    /// Create a new builder for the given pattern.
    pub fn new(pattern: &str) -> Self {
        RegexBuilder {
            pattern: pattern.as_bytes().to_vec(),
            options: Options::default(),
        }
    }

    /// Enable or disable ASCII case-insensitive matching.
    pub fn case_insensitive(mut self, yes: bool) -> Self {
        self.options.set(Options::IGNORECASE, yes);
        self
    }

    /// Enable or disable `^`/`$` matching at every line boundary.
    ///
    /// Enabling this disables the dual-anchor fast path.
    pub fn multi_line(mut self, yes: bool) -> Self {
        self.options.set(Options::MULTILINE, yes);
        self
    }

    /// Enable or disable `.` matching `\n`.
    pub fn dot_matches_newline(mut self, yes: bool) -> Self {
        self.options.set(Options::DOTALL, yes);
        self
    }

    /// Set a raw option flag. See [`Options`].
    pub fn option(mut self, flag: Options) -> Self {
        self.options |= flag;
        self
    }

    /// Compile the pattern into a [`Regex`].
    pub fn build(self) -> Result<Regex, RegexError> {
        let inner = Pattern::compile(&self.pattern, self.options)?;
        Ok(Regex { inner })
    }
}

// === Match ===

/// A single match result referencing the original text.
#[derive(Debug, Clone, Copy)]
pub struct Match<'t> {
    text: &'t [u8],
    start: usize,
    end: usize,
}

impl<'t> Match<'t> {
    /// Byte offset of the start of the match.
    pub fn start(&self) -> usize {
        self.start
    }

    /// Byte offset of the end of the match (exclusive).
    pub fn end(&self) -> usize {
        self.end
    }

    /// Byte range of the match.
    pub fn range(&self) -> Range<usize> {
        self.start..self.end
    }

    /// The matched text as a byte slice.
    pub fn as_bytes(&self) -> &'t [u8] {
        &self.text[self.start..self.end]
    }

    /// The matched text as a `&str`.
    ///
    /// # Panics
    ///
    /// Panics if the matched bytes are not valid UTF-8.
    pub fn as_str(&self) -> &'t str {
        std::str::from_utf8(self.as_bytes()).expect("match is not valid UTF-8")
    }

    /// Returns the length of the match in bytes.
    pub fn len(&self) -> usize {
        self.end - self.start
    }

    /// Returns `true` if the match is empty (zero-length).
    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }
}

// === FindIter ===

/// Iterator over all non-overlapping matches in a text.
pub struct FindIter<'r, 't> {
    regex: &'r Regex,
    text: &'t [u8],
    last_end: usize,
    last_was_empty: bool,
}

impl<'t> Iterator for FindIter<'_, 't> {
    type Item = Match<'t>;

    fn next(&mut self) -> Option<Match<'t>> {
        if self.last_end > self.text.len() {
            return None;
        }

        let m = self.regex.find_bytes_at(self.text, self.last_end)?;

        // Handle empty matches: advance by one byte to avoid reporting the
        // same position forever.
        if m.is_empty() {
            if self.last_was_empty {
                if self.last_end >= self.text.len() {
                    return None;
                }
                self.last_end += 1;
                self.last_was_empty = false;
                return self.next();
            }
            self.last_was_empty = true;
        } else {
            self.last_was_empty = false;
        }

        self.last_end = m.end();

        Some(m)
    }
}
