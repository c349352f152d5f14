// parse.rs - Pattern parser: byte strings into AST node trees.
//
// Recursive descent: alternation -> sequence -> quantified atom. The
// parser is option-independent; `^`/`$` are recorded as line anchors and
// resolved against MULTILINE later by the analyzer and the compiler.

use crate::ast::*;
use crate::error::RegexError;
use crate::program::{DEFAULT_PARSE_DEPTH_LIMIT, MAX_REPEAT_NUM};

/// Parse a pattern into an AST.
pub fn parse(pattern: &[u8]) -> Result<ParsedPattern, RegexError> {
    let mut p = Parser { pat: pattern, pos: 0, group_count: 0 };
    let root = p.parse_alternation(0)?;
    if !p.eof() {
        // The only byte parse_alternation stops at without consuming is ')'.
        return Err(RegexError::UnmatchedCloseParenthesis);
    }
    Ok(ParsedPattern { root, group_count: p.group_count })
}

struct Parser<'p> {
    pat: &'p [u8],
    pos: usize,
    group_count: u32,
}

/// A single entry parsed inside a character class.
enum ClassAtom {
    Byte(u8),
    /// A built-in set like `\d`; merged into the class as-is.
    Set(BitSet),
}

impl<'p> Parser<'p> {
    #[inline]
    fn eof(&self) -> bool {
        self.pos >= self.pat.len()
    }

    #[inline]
    fn peek(&self) -> Option<u8> {
        self.pat.get(self.pos).copied()
    }

    #[inline]
    fn peek_at(&self, off: usize) -> Option<u8> {
        self.pat.get(self.pos + off).copied()
    }

    #[inline]
    fn bump(&mut self) -> Option<u8> {
        let b = self.peek();
        if b.is_some() {
            self.pos += 1;
        }
        b
    }

    // === alternation / sequence ===

    fn parse_alternation(&mut self, depth: u32) -> Result<Node, RegexError> {
        if depth > DEFAULT_PARSE_DEPTH_LIMIT {
            return Err(RegexError::ParseDepthLimitOver);
        }
        let mut branches = vec![self.parse_sequence(depth)?];
        while self.peek() == Some(b'|') {
            self.pos += 1;
            branches.push(self.parse_sequence(depth)?);
        }
        if branches.len() == 1 {
            Ok(branches.pop().unwrap())
        } else {
            Ok(Node::Alternation(branches))
        }
    }

    fn parse_sequence(&mut self, depth: u32) -> Result<Node, RegexError> {
        let mut seq: Vec<Node> = Vec::new();

        loop {
            let c = match self.peek() {
                None | Some(b')') | Some(b'|') => break,
                Some(c) => c,
            };

            if c == b'*' || c == b'+' || c == b'?' {
                // A quantifier here has nothing to bind to; the previous
                // atom (if any) already consumed its own quantifier.
                return Err(if matches!(seq.last(), Some(Node::Repeat(_))) {
                    RegexError::TargetOfRepeatInvalid
                } else {
                    RegexError::TargetOfRepeatNotSpecified
                });
            }
            if c == b'{' && self.repeat_brace_ahead() {
                return Err(if matches!(seq.last(), Some(Node::Repeat(_))) {
                    RegexError::TargetOfRepeatInvalid
                } else {
                    RegexError::TargetOfRepeatNotSpecified
                });
            }

            let atom = self.parse_atom(depth)?;

            match self.try_parse_quantifier()? {
                Some((lower, upper, greedy)) => {
                    match atom {
                        Atom::Node(node) => {
                            if matches!(node, Node::Anchor(_) | Node::Lookahead(_)) {
                                return Err(RegexError::TargetOfRepeatInvalid);
                            }
                            seq.push(Node::Repeat(RepeatNode {
                                lower,
                                upper,
                                greedy,
                                body: Box::new(node),
                            }));
                        }
                        Atom::LiteralByte(b) => {
                            seq.push(Node::Repeat(RepeatNode {
                                lower,
                                upper,
                                greedy,
                                body: Box::new(Node::Literal(vec![b])),
                            }));
                        }
                    }
                }
                None => match atom {
                    Atom::Node(node) => seq.push(node),
                    Atom::LiteralByte(b) => {
                        // Merge consecutive literal bytes into one run.
                        if let Some(Node::Literal(run)) = seq.last_mut() {
                            run.push(b);
                        } else {
                            seq.push(Node::Literal(vec![b]));
                        }
                    }
                },
            }
        }

        if seq.len() == 1 {
            Ok(seq.pop().unwrap())
        } else {
            Ok(Node::Concat(seq))
        }
    }

    // === atoms ===

    fn parse_atom(&mut self, depth: u32) -> Result<Atom, RegexError> {
        let c = self.bump().expect("caller checked for end of pattern");
        match c {
            b'(' => self.parse_group(depth).map(Atom::Node),
            b'[' => self.parse_class().map(Atom::Node),
            b'.' => Ok(Atom::Node(Node::AnyChar)),
            b'^' => Ok(Atom::Node(Node::Anchor(AnchorKind::LineStart))),
            b'$' => Ok(Atom::Node(Node::Anchor(AnchorKind::LineEnd))),
            b'\\' => self.parse_escape(),
            _ => Ok(Atom::LiteralByte(c)),
        }
    }

    fn parse_group(&mut self, depth: u32) -> Result<Node, RegexError> {
        let node = if self.peek() == Some(b'?') {
            self.pos += 1;
            match self.bump() {
                Some(b':') => {
                    let body = self.parse_alternation(depth + 1)?;
                    Node::Group(GroupNode { number: None, body: Box::new(body) })
                }
                Some(b'=') => {
                    let body = self.parse_alternation(depth + 1)?;
                    Node::Lookahead(LookaheadNode { negated: false, body: Box::new(body) })
                }
                Some(b'!') => {
                    let body = self.parse_alternation(depth + 1)?;
                    Node::Lookahead(LookaheadNode { negated: true, body: Box::new(body) })
                }
                None => return Err(RegexError::PrematureEndOfPattern),
                Some(_) => return Err(RegexError::UndefinedGroupOption),
            }
        } else {
            // Numbered before the body parses, so `((a))` numbers
            // outside-in.
            self.group_count += 1;
            let number = self.group_count;
            let body = self.parse_alternation(depth + 1)?;
            Node::Group(GroupNode { number: Some(number), body: Box::new(body) })
        };

        match self.bump() {
            Some(b')') => Ok(node),
            _ => Err(RegexError::EndPatternWithUnmatchedParenthesis),
        }
    }

    // === character classes ===

    fn parse_class(&mut self) -> Result<Node, RegexError> {
        let mut class = ClassNode::new();
        if self.peek() == Some(b'^') {
            self.pos += 1;
            class.negated = true;
        }

        let mut any_entry = false;
        loop {
            match self.peek() {
                None => return Err(RegexError::PrematureEndOfCharClass),
                Some(b']') => {
                    self.pos += 1;
                    if !any_entry {
                        return Err(RegexError::EmptyCharClass);
                    }
                    return Ok(Node::Class(class));
                }
                Some(_) => {}
            }

            any_entry = true;
            match self.parse_class_atom()? {
                ClassAtom::Set(set) => {
                    for w in 0..BITSET_WORDS {
                        class.set[w] |= set[w];
                    }
                }
                ClassAtom::Byte(lo) => {
                    // `a-z` range, unless the `-` is trailing (`[a-]`).
                    if self.peek() == Some(b'-')
                        && !matches!(self.peek_at(1), None | Some(b']'))
                    {
                        self.pos += 1;
                        match self.parse_class_atom()? {
                            ClassAtom::Byte(hi) => {
                                if hi < lo {
                                    return Err(RegexError::EmptyRangeInCharClass);
                                }
                                class.add_range(lo, hi);
                            }
                            ClassAtom::Set(set) => {
                                // `[a-\d]`: treat the dash as a literal.
                                class.add_byte(lo);
                                class.add_byte(b'-');
                                for w in 0..BITSET_WORDS {
                                    class.set[w] |= set[w];
                                }
                            }
                        }
                    } else {
                        class.add_byte(lo);
                    }
                }
            }
        }
    }

    fn parse_class_atom(&mut self) -> Result<ClassAtom, RegexError> {
        let c = self.bump().expect("caller checked for end of class");
        if c != b'\\' {
            return Ok(ClassAtom::Byte(c));
        }
        let e = self.bump().ok_or(RegexError::PrematureEndOfCharClass)?;
        match e {
            b'd' => Ok(ClassAtom::Set(digit_set())),
            b'D' => Ok(ClassAtom::Set(inverted(digit_set()))),
            b'w' => Ok(ClassAtom::Set(word_set())),
            b'W' => Ok(ClassAtom::Set(inverted(word_set()))),
            b's' => Ok(ClassAtom::Set(space_set())),
            b'S' => Ok(ClassAtom::Set(inverted(space_set()))),
            _ => self.control_escape(e).map(ClassAtom::Byte),
        }
    }

    // === escapes ===

    fn parse_escape(&mut self) -> Result<Atom, RegexError> {
        let e = self.bump().ok_or(RegexError::PrematureEndOfPattern)?;
        match e {
            b'd' => Ok(Atom::Node(Node::Class(ClassNode { set: digit_set(), negated: false }))),
            b'D' => Ok(Atom::Node(Node::Class(ClassNode { set: digit_set(), negated: true }))),
            b'w' => Ok(Atom::Node(Node::Class(ClassNode { set: word_set(), negated: false }))),
            b'W' => Ok(Atom::Node(Node::Class(ClassNode { set: word_set(), negated: true }))),
            b's' => Ok(Atom::Node(Node::Class(ClassNode { set: space_set(), negated: false }))),
            b'S' => Ok(Atom::Node(Node::Class(ClassNode { set: space_set(), negated: true }))),
            b'A' => Ok(Atom::Node(Node::Anchor(AnchorKind::TextStart))),
            b'z' => Ok(Atom::Node(Node::Anchor(AnchorKind::TextEnd))),
            b'b' => Ok(Atom::Node(Node::Anchor(AnchorKind::WordBoundary))),
            b'B' => Ok(Atom::Node(Node::Anchor(AnchorKind::NotWordBoundary))),
            b'1'..=b'9' => {
                let number = (e - b'0') as u32;
                if number > self.group_count {
                    return Err(RegexError::InvalidBackrefNumber);
                }
                Ok(Atom::Node(Node::BackRef(number)))
            }
            _ => self.control_escape(e).map(Atom::LiteralByte),
        }
    }

    /// Escapes shared by the pattern body and character classes: control
    /// characters, `\xHH`, and escaped punctuation.
    fn control_escape(&mut self, e: u8) -> Result<u8, RegexError> {
        match e {
            b'n' => Ok(b'\n'),
            b't' => Ok(b'\t'),
            b'r' => Ok(b'\r'),
            b'f' => Ok(0x0c),
            b'v' => Ok(0x0b),
            b'0' => Ok(0x00),
            b'x' => {
                let hi = self.bump().and_then(hex_val);
                let lo = self.bump().and_then(hex_val);
                match (hi, lo) {
                    (Some(hi), Some(lo)) => Ok(hi * 16 + lo),
                    _ => Err(RegexError::InvalidEscape(b'x')),
                }
            }
            c if !c.is_ascii_alphanumeric() => Ok(c),
            c => Err(RegexError::InvalidEscape(c)),
        }
    }

    // === quantifiers ===

    /// Parse `*`, `+`, `?` or `{...}` (plus a lazy `?` suffix) if present.
    /// Returns `(lower, upper, greedy)`.
    fn try_parse_quantifier(
        &mut self,
    ) -> Result<Option<(u32, Option<u32>, bool)>, RegexError> {
        let (lower, upper) = match self.peek() {
            Some(b'*') => {
                self.pos += 1;
                (0, None)
            }
            Some(b'+') => {
                self.pos += 1;
                (1, None)
            }
            Some(b'?') => {
                self.pos += 1;
                (0, Some(1))
            }
            Some(b'{') if self.repeat_brace_ahead() => {
                self.pos += 1;
                let lower = self.parse_repeat_number()?;
                match self.bump() {
                    Some(b'}') => (lower, Some(lower)),
                    Some(b',') => {
                        if self.peek() == Some(b'}') {
                            self.pos += 1;
                            (lower, None)
                        } else {
                            let upper = self.parse_repeat_number()?;
                            if self.bump() != Some(b'}') {
                                return Err(RegexError::PrematureEndOfPattern);
                            }
                            if upper < lower {
                                return Err(RegexError::UpperSmallerThanLower);
                            }
                            (lower, Some(upper))
                        }
                    }
                    _ => return Err(RegexError::PrematureEndOfPattern),
                }
            }
            _ => return Ok(None),
        };

        let greedy = if self.peek() == Some(b'?') {
            self.pos += 1;
            false
        } else {
            true
        };
        Ok(Some((lower, upper, greedy)))
    }

    /// A `{` opens a repeat range only when followed by digits and a valid
    /// closer; anything else is a literal brace.
    fn repeat_brace_ahead(&self) -> bool {
        debug_assert_eq!(self.peek(), Some(b'{'));
        let mut i = 1;
        let mut digits = 0;
        while let Some(c) = self.peek_at(i) {
            match c {
                b'0'..=b'9' => {
                    digits += 1;
                    i += 1;
                }
                b',' | b'}' if digits > 0 => return true,
                _ => return false,
            }
        }
        false
    }

    fn parse_repeat_number(&mut self) -> Result<u32, RegexError> {
        let mut n: u32 = 0;
        let mut digits = 0;
        while let Some(c @ b'0'..=b'9') = self.peek() {
            self.pos += 1;
            digits += 1;
            n = n
                .checked_mul(10)
                .and_then(|n| n.checked_add((c - b'0') as u32))
                .ok_or(RegexError::TooBigNumberForRepeatRange)?;
            if n > MAX_REPEAT_NUM {
                return Err(RegexError::TooBigNumberForRepeatRange);
            }
        }
        debug_assert!(digits > 0, "repeat_brace_ahead guarantees digits");
        Ok(n)
    }
}

/// A parsed atom: either a full node or a literal byte that may still be
/// merged into a literal run.
enum Atom {
    Node(Node),
    LiteralByte(u8),
}

#[inline]
fn hex_val(c: u8) -> Option<u8> {
    match c {
        b'0'..=b'9' => Some(c - b'0'),
        b'a'..=b'f' => Some(c - b'a' + 10),
        b'A'..=b'F' => Some(c - b'A' + 10),
        _ => None,
    }
}

fn digit_set() -> BitSet {
    let mut bs = BITSET_EMPTY;
    bitset_set_range(&mut bs, b'0', b'9');
    bs
}

fn word_set() -> BitSet {
    let mut bs = BITSET_EMPTY;
    bitset_set_range(&mut bs, b'0', b'9');
    bitset_set_range(&mut bs, b'a', b'z');
    bitset_set_range(&mut bs, b'A', b'Z');
    bitset_set(&mut bs, b'_');
    bs
}

fn space_set() -> BitSet {
    let mut bs = BITSET_EMPTY;
    for b in [b' ', b'\t', b'\n', b'\r', 0x0b, 0x0c] {
        bitset_set(&mut bs, b);
    }
    bs
}

fn inverted(mut bs: BitSet) -> BitSet {
    bitset_invert(&mut bs);
    bs
}
