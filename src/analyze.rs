// analyze.rs - Compile-time anchor and body-length analysis.
//
// Decides whether a pattern qualifies for the dual-anchor fast path: both
// ends pinned by hard string anchors and a body whose match length is a
// statically known value (or small set of values). The result is attached
// to the compiled pattern and consulted before every match.

use smallvec::SmallVec;

use crate::ast::{AnchorKind, Node};
use crate::options::Options;

/// Upper bound on the number of distinct lengths tracked per pattern.
/// Larger sets degrade to [`BodyLen::Unknown`].
pub const LENGTH_SET_LIMIT: usize = 8;

/// Set of possible match-span lengths, in bytes.
pub type LengthSet = SmallVec<[u32; 4]>;

/// Statically derived length of a pattern (sub)tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BodyLen {
    /// Length cannot be bounded statically.
    Unknown,
    /// Every possible match has exactly this length.
    Fixed(u32),
    /// Every possible match has one of these lengths (sorted, deduplicated,
    /// at least two entries).
    OneOf(LengthSet),
}

impl BodyLen {
    fn from_set(mut set: LengthSet) -> BodyLen {
        set.sort_unstable();
        set.dedup();
        match set.len() {
            0 => BodyLen::Unknown,
            1 => BodyLen::Fixed(set[0]),
            n if n > LENGTH_SET_LIMIT => BodyLen::Unknown,
            _ => BodyLen::OneOf(set),
        }
    }

    fn values(&self) -> Option<LengthSet> {
        match self {
            BodyLen::Unknown => None,
            BodyLen::Fixed(n) => Some(SmallVec::from_slice(&[*n])),
            BodyLen::OneOf(set) => Some(set.clone()),
        }
    }
}

/// Fast-path decision data derived from a pattern at compile time.
///
/// Immutable once computed; any number of concurrent match calls may read
/// it. `eligible` implies `required_lengths` is non-empty and lists every
/// length the match span can have; `!eligible` implies the general
/// algorithm must always run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnchorFastPath {
    pub eligible: bool,
    pub required_lengths: LengthSet,
}

impl AnchorFastPath {
    fn ineligible() -> AnchorFastPath {
        AnchorFastPath { eligible: false, required_lengths: LengthSet::new() }
    }

    /// Whether a match span of `len` bytes is possible for this pattern.
    /// Meaningful only when `eligible` is true.
    #[inline]
    pub fn allows_length(&self, len: usize) -> bool {
        self.required_lengths.iter().any(|&l| l as usize == len)
    }
}

/// Analyze a parsed pattern under the given options.
///
/// Never fails: any construct that cannot be classified yields an
/// ineligible result, which is always safe.
pub fn analyze(root: &Node, options: Options) -> AnchorFastPath {
    let seq = root.as_sequence();
    if seq.len() < 2 {
        // A dual anchor needs at least two top-level nodes.
        return AnchorFastPath::ineligible();
    }

    let start = seq.first().and_then(Node::as_anchor);
    let end = seq.last().and_then(Node::as_anchor);
    let (Some(start), Some(end)) = (start, end) else {
        return AnchorFastPath::ineligible();
    };
    if !is_hard_start(start, options) || !is_hard_end(end, options) {
        return AnchorFastPath::ineligible();
    }

    let body = &seq[1..seq.len() - 1];
    match seq_len(body).values() {
        Some(required_lengths) => AnchorFastPath { eligible: true, required_lengths },
        None => AnchorFastPath::ineligible(),
    }
}

/// Anchors that pin the match start to the start of the input. `^` only
/// qualifies outside MULTILINE mode; `\A` always does.
fn is_hard_start(kind: AnchorKind, options: Options) -> bool {
    match kind {
        AnchorKind::TextStart => true,
        AnchorKind::LineStart => !options.multiline(),
        _ => false,
    }
}

/// Anchors that pin the match end to the end of the input. `$` only
/// qualifies outside MULTILINE mode; `\z` always does.
fn is_hard_end(kind: AnchorKind, options: Options) -> bool {
    match kind {
        AnchorKind::TextEnd => true,
        AnchorKind::LineEnd => !options.multiline(),
        _ => false,
    }
}

// === length fold ===

/// Static length of a node sequence.
pub fn seq_len(nodes: &[Node]) -> BodyLen {
    let mut acc = BodyLen::Fixed(0);
    for node in nodes {
        acc = len_add(&acc, &node_len(node));
        if acc == BodyLen::Unknown {
            return BodyLen::Unknown;
        }
    }
    acc
}

/// Static length of a single node, bottom-up.
pub fn node_len(node: &Node) -> BodyLen {
    match node {
        Node::Literal(bytes) => BodyLen::Fixed(bytes.len() as u32),
        Node::Class(_) | Node::AnyChar => BodyLen::Fixed(1),
        Node::Anchor(_) => BodyLen::Fixed(0),
        Node::Group(g) => node_len(&g.body),
        Node::Concat(seq) => seq_len(seq),
        Node::Alternation(branches) => {
            let mut all = LengthSet::new();
            for branch in branches {
                match node_len(branch).values() {
                    Some(values) => all.extend_from_slice(&values),
                    None => return BodyLen::Unknown,
                }
            }
            BodyLen::from_set(all)
        }
        Node::Repeat(rep) => {
            if rep.upper != Some(rep.lower) {
                return BodyLen::Unknown;
            }
            len_repeat(&node_len(&rep.body), rep.lower)
        }
        // A backreference's length depends on what the group captured at
        // run time.
        Node::BackRef(_) => BodyLen::Unknown,
        // Lookahead is zero-width, but its constraints on surrounding
        // content are not modeled here; stay conservative.
        Node::Lookahead(_) => BodyLen::Unknown,
    }
}

fn len_add(a: &BodyLen, b: &BodyLen) -> BodyLen {
    match (a, b) {
        (BodyLen::Unknown, _) | (_, BodyLen::Unknown) => BodyLen::Unknown,
        (BodyLen::Fixed(x), BodyLen::Fixed(y)) => match x.checked_add(*y) {
            Some(sum) => BodyLen::Fixed(sum),
            None => BodyLen::Unknown,
        },
        _ => {
            let (Some(xs), Some(ys)) = (a.values(), b.values()) else {
                return BodyLen::Unknown;
            };
            let mut sums = LengthSet::new();
            for &x in &xs {
                for &y in &ys {
                    match x.checked_add(y) {
                        Some(sum) => sums.push(sum),
                        None => return BodyLen::Unknown,
                    }
                }
            }
            BodyLen::from_set(sums)
        }
    }
}

fn len_repeat(body: &BodyLen, count: u32) -> BodyLen {
    if count == 0 {
        return BodyLen::Fixed(0);
    }
    match body {
        BodyLen::Unknown => BodyLen::Unknown,
        BodyLen::Fixed(w) => match w.checked_mul(count) {
            Some(total) => BodyLen::Fixed(total),
            None => BodyLen::Unknown,
        },
        BodyLen::OneOf(_) => {
            // Iterated sum-set; the set widens with every round, so either
            // it collapses early or it exceeds the limit and degrades.
            let mut acc = body.clone();
            for _ in 1..count {
                acc = len_add(&acc, body);
                if acc == BodyLen::Unknown {
                    return BodyLen::Unknown;
                }
            }
            acc
        }
    }
}
