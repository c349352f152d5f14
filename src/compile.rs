// compile.rs - Compiler: AST node trees into backtracking bytecode.
//
// Lowering is structural: choice points use Push/Jump with forward
// addresses patched once the target is known. Counted repeats are expanded
// inline up to the bytecode size limit; unbounded repeats compile to a
// guarded loop.

use crate::analyze::analyze;
use crate::ast::*;
use crate::error::RegexError;
use crate::options::Options;
use crate::parse::parse;
use crate::program::{Op, Pattern, MAX_PROGRAM_OPS};

/// Compile a pattern into an executable [`Pattern`].
pub fn compile(pattern: &[u8], options: Options) -> Result<Pattern, RegexError> {
    let parsed = parse(pattern)?;
    let fast_path = analyze(&parsed.root, options);

    let mut c = Compiler { ops: Vec::new(), options, num_empty_checks: 0 };
    c.node(&parsed.root)?;
    c.push_op(Op::End)?;

    let (anchored_start, first_bytes) = scan_prefix(&c.ops);

    Ok(Pattern {
        pattern: pattern.to_vec(),
        options,
        ops: c.ops,
        group_count: parsed.group_count,
        num_empty_checks: c.num_empty_checks,
        fast_path,
        anchored_start,
        first_bytes,
    })
}

/// Inspect the program head (past any group marks) for search metadata:
/// whether matching is pinned to the search start, and which byte values a
/// match can start with.
fn scan_prefix(ops: &[Op]) -> (bool, Option<(u8, u8)>) {
    let mut i = 0;
    while matches!(ops.get(i), Some(Op::MemStart { .. })) {
        i += 1;
    }
    match ops.get(i) {
        Some(Op::TextStart) => (true, None),
        Some(Op::Bytes(s)) => {
            let first = (s[0], s[0]);
            (false, Some(first))
        }
        Some(Op::BytesIc(s)) => (false, Some((s[0], s[0].to_ascii_uppercase()))),
        _ => (false, None),
    }
}

struct Compiler {
    ops: Vec<Op>,
    options: Options,
    num_empty_checks: usize,
}

impl Compiler {
    fn push_op(&mut self, op: Op) -> Result<usize, RegexError> {
        if self.ops.len() >= MAX_PROGRAM_OPS {
            return Err(RegexError::TooBigNumberForRepeatRange);
        }
        self.ops.push(op);
        Ok(self.ops.len() - 1)
    }

    #[inline]
    fn here(&self) -> usize {
        self.ops.len()
    }

    /// Fill in the address of a previously emitted `Push`/`Jump`.
    fn patch(&mut self, at: usize, target: usize) {
        match &mut self.ops[at] {
            Op::Push { addr } | Op::Jump { addr } => *addr = target,
            op => unreachable!("patching non-branch op {:?}", op),
        }
    }

    fn node(&mut self, node: &Node) -> Result<(), RegexError> {
        match node {
            Node::Literal(bytes) => {
                if self.options.ignorecase()
                    && bytes.iter().any(u8::is_ascii_alphabetic)
                {
                    self.push_op(Op::BytesIc(bytes.to_ascii_lowercase()))?;
                } else {
                    self.push_op(Op::Bytes(bytes.clone()))?;
                }
                Ok(())
            }
            Node::Class(class) => {
                let set = resolve_class(class, self.options);
                self.push_op(Op::Class(Box::new(set)))?;
                Ok(())
            }
            Node::AnyChar => {
                self.push_op(if self.options.dotall() { Op::AnyCharMl } else { Op::AnyChar })?;
                Ok(())
            }
            Node::Anchor(kind) => {
                let op = match kind {
                    AnchorKind::LineStart if !self.options.multiline() => Op::TextStart,
                    AnchorKind::LineEnd if !self.options.multiline() => Op::TextEnd,
                    AnchorKind::LineStart => Op::LineStart,
                    AnchorKind::LineEnd => Op::LineEnd,
                    AnchorKind::TextStart => Op::TextStart,
                    AnchorKind::TextEnd => Op::TextEnd,
                    AnchorKind::WordBoundary => Op::WordBoundary,
                    AnchorKind::NotWordBoundary => Op::NoWordBoundary,
                };
                self.push_op(op)?;
                Ok(())
            }
            Node::Group(group) => match group.number {
                Some(n) => {
                    self.push_op(Op::MemStart { mem: n as usize })?;
                    self.node(&group.body)?;
                    self.push_op(Op::MemEnd { mem: n as usize })?;
                    Ok(())
                }
                None => self.node(&group.body),
            },
            Node::Lookahead(look) => {
                let prog = self.subprog(&look.body)?;
                self.push_op(Op::Look { prog, negated: look.negated })?;
                Ok(())
            }
            Node::Concat(seq) => {
                for n in seq {
                    self.node(n)?;
                }
                Ok(())
            }
            Node::Alternation(branches) => self.alternation(branches),
            Node::Repeat(rep) => self.repeat(rep),
            Node::BackRef(n) => {
                let op = if self.options.ignorecase() {
                    Op::BackRefIc { mem: *n as usize }
                } else {
                    Op::BackRef { mem: *n as usize }
                };
                self.push_op(op)?;
                Ok(())
            }
        }
    }

    /// Compile a node into its own program (lookahead bodies).
    fn subprog(&mut self, node: &Node) -> Result<Box<[Op]>, RegexError> {
        let saved = std::mem::take(&mut self.ops);
        self.node(node)?;
        self.push_op(Op::End)?;
        let sub = std::mem::replace(&mut self.ops, saved);
        Ok(sub.into_boxed_slice())
    }

    fn alternation(&mut self, branches: &[Node]) -> Result<(), RegexError> {
        let mut exits = Vec::with_capacity(branches.len());
        for (i, branch) in branches.iter().enumerate() {
            if i + 1 < branches.len() {
                let fork = self.push_op(Op::Push { addr: 0 })?;
                self.node(branch)?;
                exits.push(self.push_op(Op::Jump { addr: 0 })?);
                let next = self.here();
                self.patch(fork, next);
            } else {
                self.node(branch)?;
            }
        }
        let end = self.here();
        for exit in exits {
            self.patch(exit, end);
        }
        Ok(())
    }

    fn repeat(&mut self, rep: &RepeatNode) -> Result<(), RegexError> {
        for _ in 0..rep.lower {
            self.node(&rep.body)?;
        }
        match rep.upper {
            Some(upper) => {
                let extra = upper - rep.lower;
                let mut exits = Vec::with_capacity(extra as usize);
                for _ in 0..extra {
                    if rep.greedy {
                        exits.push(self.push_op(Op::Push { addr: 0 })?);
                        self.node(&rep.body)?;
                    } else {
                        let fork = self.push_op(Op::Push { addr: 0 })?;
                        exits.push(self.push_op(Op::Jump { addr: 0 })?);
                        let body = self.here();
                        self.patch(fork, body);
                        self.node(&rep.body)?;
                    }
                }
                let end = self.here();
                for exit in exits {
                    self.patch(exit, end);
                }
                Ok(())
            }
            None => self.star(&rep.body, rep.greedy),
        }
    }

    /// Unbounded loop with an empty-iteration guard.
    fn star(&mut self, body: &Node, greedy: bool) -> Result<(), RegexError> {
        let id = self.num_empty_checks;
        self.num_empty_checks += 1;

        if greedy {
            let head = self.push_op(Op::Push { addr: 0 })?;
            self.push_op(Op::EmptyCheckStart { id })?;
            self.node(body)?;
            self.push_op(Op::EmptyCheckEnd { id })?;
            self.push_op(Op::Jump { addr: head })?;
            let end = self.here();
            self.patch(head, end);
        } else {
            let head = self.push_op(Op::Push { addr: 0 })?;
            let exit = self.push_op(Op::Jump { addr: 0 })?;
            let body_start = self.here();
            self.patch(head, body_start);
            self.push_op(Op::EmptyCheckStart { id })?;
            self.node(body)?;
            self.push_op(Op::EmptyCheckEnd { id })?;
            self.push_op(Op::Jump { addr: head })?;
            let end = self.here();
            self.patch(exit, end);
        }
        Ok(())
    }
}

/// Resolve a class node to its final byte set: ASCII case folding first,
/// then negation.
fn resolve_class(class: &ClassNode, options: Options) -> BitSet {
    let mut set = class.set;
    if options.ignorecase() {
        for b in b'a'..=b'z' {
            if bitset_at(&set, b) {
                bitset_set(&mut set, b.to_ascii_uppercase());
            }
        }
        for b in b'A'..=b'Z' {
            if bitset_at(&set, b) {
                bitset_set(&mut set, b.to_ascii_lowercase());
            }
        }
    }
    if class.negated {
        bitset_invert(&mut set);
    }
    set
}
