// exec.rs - Match execution: the dual-anchor fast path and the
// backtracking VM it defers to.
//
// `search` is the entry point. It consults `try_match` first; only when
// the fast path cannot rule the input out does the bytecode run. Anchored
// programs attempt exactly one position; unanchored programs scan, with a
// memchr prefilter skipping to plausible start bytes.

use memchr::{memchr, memchr2};

use crate::analyze::AnchorFastPath;
use crate::ast::{bitset_at, is_word_byte};
use crate::error::RegexError;
use crate::program::{Op, Pattern, DEFAULT_RETRY_LIMIT_IN_MATCH};

/// Decision of the dual-anchor fast path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FastPathResult {
    /// No match is possible for this input; the general algorithm need not
    /// run.
    NoMatch,
    /// The fast path cannot decide; run the general algorithm.
    Defer,
}

/// Constant-time length check against the fast-path data.
///
/// `NoMatch` is returned only when the input length proves no match can
/// exist; a satisfied length constraint still defers, since content has
/// not been examined. Pure: no side effects, no allocation.
pub fn try_match(fast_path: &AnchorFastPath, input: &[u8], start: usize) -> FastPathResult {
    if !fast_path.eligible {
        return FastPathResult::Defer;
    }
    let Some(available) = input.len().checked_sub(start) else {
        return FastPathResult::NoMatch;
    };
    if fast_path.allows_length(available) {
        FastPathResult::Defer
    } else {
        FastPathResult::NoMatch
    }
}

/// Find the first match at or after `start`. Returns the match span.
pub fn search(
    pattern: &Pattern,
    text: &[u8],
    start: usize,
) -> Result<Option<(usize, usize)>, RegexError> {
    if start > text.len() {
        return Ok(None);
    }
    if try_match(&pattern.fast_path, text, start) == FastPathResult::NoMatch {
        return Ok(None);
    }

    let mut state = MatchState { text, start, retry: 0 };
    let mut regs = Regs::new(pattern);

    if pattern.anchored_start {
        return Ok(run(&pattern.ops, &mut state, &mut regs, start)?.map(|end| (start, end)));
    }

    let mut at = start;
    loop {
        if let Some((b1, b2)) = pattern.first_bytes {
            let found = if b1 == b2 {
                memchr(b1, &text[at..])
            } else {
                memchr2(b1, b2, &text[at..])
            };
            match found {
                Some(off) => at += off,
                None => return Ok(None),
            }
        }
        regs.reset();
        if let Some(end) = run(&pattern.ops, &mut state, &mut regs, at)? {
            return Ok(Some((at, end)));
        }
        if at >= text.len() {
            return Ok(None);
        }
        at += 1;
    }
}

/// Run the general algorithm at exactly one position. Returns the match
/// end offset. Ignores the fast path entirely.
pub fn match_at(
    pattern: &Pattern,
    text: &[u8],
    start: usize,
    at: usize,
) -> Result<Option<usize>, RegexError> {
    let mut state = MatchState { text, start, retry: 0 };
    let mut regs = Regs::new(pattern);
    run(&pattern.ops, &mut state, &mut regs, at)
}

// === VM internals ===

const CAP_UNSET: i32 = -1;
const EMPTY_UNSET: usize = usize::MAX;

struct MatchState<'t> {
    text: &'t [u8],
    /// Search start; `\A` (and non-multiline `^`) bind here.
    start: usize,
    retry: u64,
}

/// Mutable per-attempt registers: group positions and empty-check slots,
/// with an undo log so backtracking can restore them.
struct Regs {
    caps: Vec<i32>,
    empty_pos: Vec<usize>,
    undo: Vec<Undo>,
}

enum Undo {
    Cap { slot: usize, old: i32 },
    EmptyPos { id: usize, old: usize },
}

impl Regs {
    fn new(pattern: &Pattern) -> Regs {
        Regs {
            caps: vec![CAP_UNSET; 2 * (pattern.group_count as usize + 1)],
            empty_pos: vec![EMPTY_UNSET; pattern.num_empty_checks],
            undo: Vec::new(),
        }
    }

    fn reset(&mut self) {
        self.caps.fill(CAP_UNSET);
        self.empty_pos.fill(EMPTY_UNSET);
        self.undo.clear();
    }

    fn set_cap(&mut self, slot: usize, val: i32) {
        self.undo.push(Undo::Cap { slot, old: self.caps[slot] });
        self.caps[slot] = val;
    }

    fn set_empty_pos(&mut self, id: usize, val: usize) {
        self.undo.push(Undo::EmptyPos { id, old: self.empty_pos[id] });
        self.empty_pos[id] = val;
    }

    fn rewind(&mut self, mark: usize) {
        let Regs { caps, empty_pos, undo } = self;
        for entry in undo.drain(mark..).rev() {
            match entry {
                Undo::Cap { slot, old } => caps[slot] = old,
                Undo::EmptyPos { id, old } => empty_pos[id] = old,
            }
        }
    }

    fn group_span(&self, mem: usize) -> Option<(usize, usize)> {
        let beg = self.caps[2 * mem];
        let end = self.caps[2 * mem + 1];
        if beg == CAP_UNSET || end == CAP_UNSET || end < beg {
            return None;
        }
        Some((beg as usize, end as usize))
    }
}

struct Frame {
    pc: usize,
    pos: usize,
    undo_len: usize,
}

fn at_word_boundary(text: &[u8], pos: usize) -> bool {
    let before = pos > 0 && is_word_byte(text[pos - 1]);
    let after = pos < text.len() && is_word_byte(text[pos]);
    before != after
}

/// Execute a program at `at`. Backtracking uses an explicit stack of
/// choice points; register mutations are rolled back through the undo log.
fn run(
    prog: &[Op],
    state: &mut MatchState<'_>,
    regs: &mut Regs,
    at: usize,
) -> Result<Option<usize>, RegexError> {
    let text = state.text;
    let mut stack: Vec<Frame> = Vec::new();
    let mut pc = 0usize;
    let mut pos = at;

    loop {
        let matched = match &prog[pc] {
            Op::End => return Ok(Some(pos)),
            Op::Jump { addr } => {
                pc = *addr;
                continue;
            }
            Op::Push { addr } => {
                stack.push(Frame { pc: *addr, pos, undo_len: regs.undo.len() });
                pc += 1;
                continue;
            }
            Op::Bytes(s) => {
                if text[pos..].starts_with(s) {
                    pos += s.len();
                    true
                } else {
                    false
                }
            }
            Op::BytesIc(s) => {
                if text.len() - pos >= s.len()
                    && text[pos..pos + s.len()].eq_ignore_ascii_case(s)
                {
                    pos += s.len();
                    true
                } else {
                    false
                }
            }
            Op::Class(set) => {
                if pos < text.len() && bitset_at(set, text[pos]) {
                    pos += 1;
                    true
                } else {
                    false
                }
            }
            Op::AnyChar => {
                if pos < text.len() && text[pos] != b'\n' {
                    pos += 1;
                    true
                } else {
                    false
                }
            }
            Op::AnyCharMl => {
                if pos < text.len() {
                    pos += 1;
                    true
                } else {
                    false
                }
            }
            Op::TextStart => pos == state.start,
            Op::TextEnd => pos == text.len(),
            Op::LineStart => pos == state.start || (pos > 0 && text[pos - 1] == b'\n'),
            Op::LineEnd => pos == text.len() || text[pos] == b'\n',
            Op::WordBoundary => at_word_boundary(text, pos),
            Op::NoWordBoundary => !at_word_boundary(text, pos),
            Op::MemStart { mem } => {
                regs.set_cap(2 * mem, pos as i32);
                true
            }
            Op::MemEnd { mem } => {
                regs.set_cap(2 * mem + 1, pos as i32);
                true
            }
            Op::BackRef { mem } => match regs.group_span(*mem) {
                Some((beg, end)) => {
                    let captured = &text[beg..end];
                    if text[pos..].starts_with(captured) {
                        pos += captured.len();
                        true
                    } else {
                        false
                    }
                }
                None => false,
            },
            Op::BackRefIc { mem } => match regs.group_span(*mem) {
                Some((beg, end)) => {
                    let len = end - beg;
                    if text.len() - pos >= len
                        && text[pos..pos + len].eq_ignore_ascii_case(&text[beg..end])
                    {
                        pos += len;
                        true
                    } else {
                        false
                    }
                }
                None => false,
            },
            Op::EmptyCheckStart { id } => {
                regs.set_empty_pos(*id, pos);
                true
            }
            Op::EmptyCheckEnd { id } => regs.empty_pos[*id] != pos,
            Op::Look { prog: sub, negated } => {
                let mark = regs.undo.len();
                let found = run(sub, state, regs, pos)?.is_some();
                if *negated {
                    regs.rewind(mark);
                    !found
                } else if found {
                    true
                } else {
                    regs.rewind(mark);
                    false
                }
            }
        };

        if matched {
            pc += 1;
            continue;
        }

        // Backtrack to the most recent choice point.
        state.retry += 1;
        if state.retry > DEFAULT_RETRY_LIMIT_IN_MATCH {
            return Err(RegexError::RetryLimitInMatchOver);
        }
        match stack.pop() {
            Some(frame) => {
                regs.rewind(frame.undo_len);
                pc = frame.pc;
                pos = frame.pos;
            }
            None => return Ok(None),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::options::Options;

    fn pat(pattern: &str) -> Pattern {
        Pattern::compile(pattern.as_bytes(), Options::default()).unwrap()
    }

    fn pat_with(pattern: &str, options: Options) -> Pattern {
        Pattern::compile(pattern.as_bytes(), options).unwrap()
    }

    fn find(pattern: &str, text: &str) -> Option<(usize, usize)> {
        search(&pat(pattern), text.as_bytes(), 0).unwrap()
    }

    #[test]
    fn literal_search() {
        assert_eq!(find("world", "hello world"), Some((6, 11)));
        assert_eq!(find("nope", "hello world"), None);
    }

    #[test]
    fn greedy_and_lazy_repeats() {
        assert_eq!(find("a{2,3}", "aaaa"), Some((0, 3)));
        assert_eq!(find("a{2,3}?", "aaaa"), Some((0, 2)));
        assert_eq!(find("a+", "baaa"), Some((1, 4)));
        assert_eq!(find("a*?", "aaa"), Some((0, 0)));
    }

    #[test]
    fn alternation_prefers_left_branch() {
        assert_eq!(find("a|ab", "ab"), Some((0, 1)));
        assert_eq!(find("ab|a", "ab"), Some((0, 2)));
    }

    #[test]
    fn empty_body_loops_terminate() {
        assert_eq!(find("(a?)*", "b"), Some((0, 0)));
        assert_eq!(find("(a*)*", "b"), Some((0, 0)));
        assert_eq!(find("(a*)*", "aaab"), Some((0, 3)));
        assert_eq!(find("(a*)*?", "aaab"), Some((0, 0)));
    }

    #[test]
    fn backrefs() {
        assert_eq!(find(r"(ab)\1", "xabab"), Some((1, 5)));
        assert_eq!(find(r"(ab)\1", "abxab"), None);
        // A backreference to a group that never participated fails.
        assert_eq!(find(r"(a)?\1", "bb"), None);
    }

    #[test]
    fn backref_after_backtracking_restores_capture() {
        // The group must settle on "a" for the backref to match.
        assert_eq!(find(r"(a+)\1", "aaaa"), Some((0, 4)));
    }

    #[test]
    fn word_boundaries() {
        assert_eq!(find(r"\bfox\b", "the fox jumps"), Some((4, 7)));
        assert_eq!(find(r"\bfox\b", "foxy"), None);
        assert_eq!(find(r"\Box\b", "fox"), Some((1, 3)));
    }

    #[test]
    fn lookahead() {
        assert_eq!(find("foo(?=bar)", "foobar"), Some((0, 3)));
        assert_eq!(find("foo(?=bar)", "foobaz"), None);
        assert_eq!(find("foo(?!bar)", "foobaz"), Some((0, 3)));
        assert_eq!(find("foo(?!bar)", "foobar"), None);
    }

    #[test]
    fn anchors_bind_to_search_start() {
        let p = pat("^abc");
        assert_eq!(search(&p, b"abc rest", 0).unwrap(), Some((0, 3)));
        assert_eq!(search(&p, b"xabc", 0).unwrap(), None);
        // The anchor binds to the search start, not byte 0.
        assert_eq!(search(&p, b"xabc", 1).unwrap(), Some((1, 4)));
    }

    #[test]
    fn multiline_line_anchors() {
        let p = pat_with("^b$", Options::MULTILINE);
        assert_eq!(search(&p, b"a\nb\nc", 0).unwrap(), Some((2, 3)));
        let p = pat("^b$");
        assert_eq!(search(&p, b"a\nb\nc", 0).unwrap(), None);
    }

    #[test]
    fn dot_and_dotall() {
        assert_eq!(find("a.c", "abc"), Some((0, 3)));
        assert_eq!(find("a.c", "a\nc"), None);
        let p = pat_with("a.c", Options::DOTALL);
        assert_eq!(search(&p, b"a\nc", 0).unwrap(), Some((0, 3)));
    }

    #[test]
    fn ignorecase_matching() {
        let p = pat_with("hello", Options::IGNORECASE);
        assert_eq!(search(&p, b"say HeLLo", 0).unwrap(), Some((4, 9)));
        let p = pat_with(r"(ab)\1", Options::IGNORECASE);
        assert_eq!(search(&p, b"aBAb", 0).unwrap(), Some((0, 4)));
    }

    #[test]
    fn prefilter_agrees_with_scan() {
        // "world" can only start at 'w'; the memchr skip must not change
        // the result.
        assert_eq!(find("wo", "hello wonderful world"), Some((6, 8)));
        assert_eq!(find("wq", "hello wonderful world"), None);
    }

    #[test]
    fn fast_path_decisions() {
        let p = pat("^1234$");
        assert_eq!(try_match(&p.fast_path, b"1234", 0), FastPathResult::Defer);
        assert_eq!(try_match(&p.fast_path, b"12", 0), FastPathResult::NoMatch);
        assert_eq!(
            try_match(&p.fast_path, b"12345678901234567890", 0),
            FastPathResult::NoMatch
        );
        // Offsets shift the available length.
        assert_eq!(try_match(&p.fast_path, b"xx1234", 2), FastPathResult::Defer);
        assert_eq!(try_match(&p.fast_path, b"xx1234", 1), FastPathResult::NoMatch);
    }

    #[test]
    fn ineligible_patterns_always_defer() {
        let p = pat("1234");
        for len in 0..8 {
            let input = vec![b'1'; len];
            assert_eq!(try_match(&p.fast_path, &input, 0), FastPathResult::Defer);
        }
    }

    #[test]
    fn fast_path_short_circuits_search() {
        let p = pat("^1234$");
        assert_eq!(search(&p, b"12345678901234567890", 0).unwrap(), None);
        assert_eq!(search(&p, b"1234", 0).unwrap(), Some((0, 4)));
        // Same length, different content: deferred to the VM, which says no.
        assert_eq!(search(&p, b"9999", 0).unwrap(), None);
    }

    #[test]
    fn empty_pattern_and_empty_input() {
        assert_eq!(find("", ""), Some((0, 0)));
        assert_eq!(find("^$", ""), Some((0, 0)));
        assert_eq!(find("^$", "a"), None);
    }

    #[test]
    fn match_at_single_position() {
        let p = pat("ab");
        assert_eq!(match_at(&p, b"xab", 0, 0).unwrap(), None);
        assert_eq!(match_at(&p, b"xab", 0, 1).unwrap(), Some(3));
    }
}
