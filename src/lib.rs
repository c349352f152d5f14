//! # Ancora
//!
//! Pure-Rust anchored regex engine with a constant-time dual-anchor fast
//! path, SIMD-accelerated unanchored search via
//! [`memchr`](https://crates.io/crates/memchr).
//!
//! A pattern anchored at both ends whose body has a statically fixed
//! length (`^1234$`, `^1234\z`, `^(abcd|efgh)$`) can only ever match
//! inputs of that exact length. Ancora detects this at compile time and
//! rejects inputs of any other length with a single comparison, without
//! running the matching engine at all. Everything else falls through to a
//! conventional backtracking matcher.
//!
//! ## Quick Start
//!
//! ```rust
//! use ancora::prelude::*;
//!
//! let re = Regex::new(r"^\d{4}-\d{2}-\d{2}\z").unwrap();
//! assert!(re.is_match("2026-02-12"));
//! assert!(!re.is_match("Date: 2026-02-12"));   // wrong length, O(1) reject
//! ```
//!
//! For fine-grained control, use [`api::RegexBuilder`]:
//!
//! ```rust
//! use ancora::prelude::*;
//!
//! let re = Regex::builder(r"hello")
//!     .case_insensitive(true)
//!     .build()
//!     .unwrap();
//! assert!(re.is_match("Hello World"));
//! ```
//!
//! ## Low-Level API
//!
//! The engine internals are public for callers that want to drive the
//! pipeline themselves or inspect what compilation derived:
//!
//! ```rust
//! use ancora::exec::{try_match, FastPathResult};
//! use ancora::options::Options;
//! use ancora::program::Pattern;
//!
//! let pat = Pattern::compile(b"^(abcd|efgh)$", Options::default()).unwrap();
//! assert!(pat.fast_path.eligible);
//! assert_eq!(pat.fast_path.required_lengths.as_slice(), &[4]);
//!
//! // Wrong length: proven non-match without running the engine.
//! let decision = try_match(&pat.fast_path, b"abcdefgh", 0);
//! assert_eq!(decision, FastPathResult::NoMatch);
//! ```
//!
//! ## Module Structure
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`parse`] | Pattern parser (bytes → AST) |
//! | [`ast`] | AST node types |
//! | [`analyze`] | Anchor + body-length analysis (the fast-path derivation) |
//! | [`compile`] | AST → bytecode compiler |
//! | [`program`] | Bytecode ops, compiled `Pattern`, engine limits |
//! | [`exec`] | Fast-path decision + backtracking VM |
//! | [`api`] | Idiomatic `Regex` / `RegexBuilder` / `Match` |
//! | [`error`] | Error type |
//! | [`options`] | Option flags |

pub mod analyze;
pub mod api;
pub mod ast;
pub mod compile;
pub mod error;
pub mod exec;
pub mod options;
pub mod parse;
pub mod prelude;
pub mod program;
