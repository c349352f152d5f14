// fastpath_test.rs - Integration tests for the dual-anchor fast path:
// length derivation, pruning decisions, and soundness against the general
// matcher.

use ancora::analyze::{analyze, AnchorFastPath};
use ancora::exec::{self, try_match, FastPathResult};
use ancora::options::Options;
use ancora::parse::parse;
use ancora::prelude::*;
use ancora::program::Pattern;

fn fast_path(pattern: &str, options: Options) -> AnchorFastPath {
    let parsed = parse(pattern.as_bytes()).unwrap();
    analyze(&parsed.root, options)
}

fn pattern(pattern: &str, options: Options) -> Pattern {
    Pattern::compile(pattern.as_bytes(), options).unwrap()
}

/// The general algorithm alone: attempt every start position, no fast
/// path, no prefilter.
fn brute_force_is_match(pat: &Pattern, text: &[u8]) -> bool {
    let attempts: Vec<usize> = if pat.anchored_start {
        vec![0]
    } else {
        (0..=text.len()).collect()
    };
    attempts
        .into_iter()
        .any(|at| exec::match_at(pat, text, 0, at).unwrap().is_some())
}

// === length derivation ===

#[test]
fn fixed_length_pattern_with_both_anchors() {
    let fp = fast_path("^1234$", Options::default());
    assert!(fp.eligible);
    assert_eq!(fp.required_lengths.as_slice(), &[4]);
}

#[test]
fn strict_end_anchor_is_equivalent() {
    let dollar = fast_path("^1234$", Options::default());
    let end_z = fast_path(r"^1234\z", Options::default());
    assert!(dollar.eligible && end_z.eligible);
    assert_eq!(dollar.required_lengths, end_z.required_lengths);
}

#[test]
fn fixed_length_alternation_collapses_to_one_length() {
    let fp = fast_path("^(abcd|efgh)$", Options::default());
    assert!(fp.eligible);
    assert_eq!(fp.required_lengths.as_slice(), &[4]);
}

#[test]
fn mixed_width_alternation_keeps_every_length() {
    let fp = fast_path("^(abc|fghij)$", Options::default());
    assert!(fp.eligible);
    assert_eq!(fp.required_lengths.as_slice(), &[3, 5]);
}

#[test]
fn empty_body_requires_empty_input() {
    let fp = fast_path("^$", Options::default());
    assert!(fp.eligible);
    assert_eq!(fp.required_lengths.as_slice(), &[0]);
}

#[test]
fn multiline_mode_disables_eligibility() {
    assert!(fast_path("^1234$", Options::default()).eligible);
    assert!(!fast_path("^1234$", Options::MULTILINE).eligible);
    assert!(fast_path(r"\A1234\z", Options::MULTILINE).eligible);
}

#[test]
fn reanalysis_is_identical() {
    let parsed = parse(b"^(abc|fghij)$").unwrap();
    let first = analyze(&parsed.root, Options::default());
    let second = analyze(&parsed.root, Options::default());
    assert_eq!(first, second);

    // Recompiling gives the same derived data too.
    let a = pattern("^(abc|fghij)$", Options::default());
    let b = pattern("^(abc|fghij)$", Options::default());
    assert_eq!(a.fast_path, b.fast_path);
}

// === pruning decisions ===

#[test]
fn wrong_length_is_rejected_without_matching() {
    let pat = pattern("^1234$", Options::default());
    assert_eq!(try_match(&pat.fast_path, b"1234", 0), FastPathResult::Defer);
    assert_eq!(try_match(&pat.fast_path, b"12", 0), FastPathResult::NoMatch);
    assert_eq!(
        try_match(&pat.fast_path, b"12345678901234567890", 0),
        FastPathResult::NoMatch
    );
}

#[test]
fn start_offset_shifts_the_available_length() {
    let pat = pattern("^1234$", Options::default());
    let text = b"xxxx1234";
    assert_eq!(try_match(&pat.fast_path, text, 4), FastPathResult::Defer);
    assert_eq!(try_match(&pat.fast_path, text, 3), FastPathResult::NoMatch);
    assert_eq!(try_match(&pat.fast_path, text, 8), FastPathResult::NoMatch);
}

#[test]
fn zero_length_input_uses_the_same_rule() {
    let empty = pattern("^$", Options::default());
    assert_eq!(try_match(&empty.fast_path, b"", 0), FastPathResult::Defer);
    assert_eq!(try_match(&empty.fast_path, b"a", 0), FastPathResult::NoMatch);

    let four = pattern("^1234$", Options::default());
    assert_eq!(try_match(&four.fast_path, b"", 0), FastPathResult::NoMatch);
}

#[test]
fn length_match_still_needs_content_check() {
    // Same length as the alternation branches but different content:
    // the fast path defers, the engine rejects.
    let re = Regex::new("^(abcd|efgh)$").unwrap();
    assert_eq!(
        try_match(re.fast_path(), b"wxyz", 0),
        FastPathResult::Defer
    );
    assert!(!re.is_match("wxyz"));
    assert!(re.is_match("abcd"));
    assert!(re.is_match("efgh"));
}

#[test]
fn set_pruning_covers_every_branch_length() {
    let pat = pattern("^(abc|fghij)$", Options::default());
    for (input, expected) in [
        (&b"abc"[..], FastPathResult::Defer),
        (&b"fghij"[..], FastPathResult::Defer),
        (&b"ab"[..], FastPathResult::NoMatch),
        (&b"abcd"[..], FastPathResult::NoMatch),
        (&b"fghijk"[..], FastPathResult::NoMatch),
        (&b"12345678901234567890"[..], FastPathResult::NoMatch),
    ] {
        assert_eq!(try_match(&pat.fast_path, input, 0), expected, "{:?}", input);
    }
}

// === conservative deferral ===

#[test]
fn ineligible_patterns_always_defer() {
    let patterns = [
        "1234",
        "^1234",
        "1234$",
        "^a+$",
        "^a{2,4}$",
        "^(a|bc)*$",
        r"^(a)\1$",
        r"^(?=ab)ab$",
        r"\b1234\b",
        "^ab$|^cd$",
    ];
    for p in patterns {
        let pat = pattern(p, Options::default());
        assert!(!pat.fast_path.eligible, "{:?}", p);
        for len in 0..12 {
            let input = vec![b'a'; len];
            assert_eq!(
                try_match(&pat.fast_path, &input, 0),
                FastPathResult::Defer,
                "{:?} at len {}",
                p,
                len
            );
        }
    }
}

// === soundness: the fast path never contradicts the general algorithm ===

#[test]
fn fast_reject_implies_general_mismatch() {
    let patterns = [
        "^1234$",
        r"^1234\z",
        "^(abcd|efgh)$",
        "^(abc|fghij)$",
        "^$",
        "^.$",
        "^a{3}$",
        r"^\d\d-\d\d$",
        r"^a\bb$",
    ];
    let inputs: &[&[u8]] = &[
        b"",
        b"1",
        b"12",
        b"123",
        b"1234",
        b"9999",
        b"12345",
        b"abcd",
        b"efgh",
        b"wxyz",
        b"abc",
        b"fghij",
        b"aaa",
        b"a b",
        b"12-34",
        b"1-234",
        b"\n",
        b"1234\n",
        b"12345678901234567890",
    ];

    for p in patterns {
        let pat = pattern(p, Options::default());
        assert!(pat.fast_path.eligible, "{:?}", p);
        for &input in inputs {
            let brute = brute_force_is_match(&pat, input);
            let engine = exec::search(&pat, input, 0).unwrap().is_some();
            assert_eq!(engine, brute, "engine vs general for {:?} on {:?}", p, input);
            if try_match(&pat.fast_path, input, 0) == FastPathResult::NoMatch {
                assert!(
                    !brute,
                    "fast path rejected {:?} on {:?} but the general algorithm matches",
                    p, input
                );
            }
        }
    }
}

#[test]
fn engine_agrees_with_general_algorithm_when_ineligible() {
    let patterns = ["1234", "^1234", "1234$", "^a+$", r"^(a)\1$", "^ab$|^cd$"];
    let inputs: &[&[u8]] = &[b"", b"1234", b"x1234", b"1234x", b"aa", b"aaaa", b"ab", b"cd"];
    for p in patterns {
        let pat = pattern(p, Options::default());
        for &input in inputs {
            let brute = brute_force_is_match(&pat, input);
            let engine = exec::search(&pat, input, 0).unwrap().is_some();
            assert_eq!(engine, brute, "{:?} on {:?}", p, input);
        }
    }
}

#[test]
fn multiline_patterns_still_match_correctly() {
    // The fast path is off in multiline mode; matching must be unaffected.
    let re = Regex::builder("^1234$").multi_line(true).build().unwrap();
    assert!(!re.fast_path().eligible);
    assert!(re.is_match("1234"));
    assert!(re.is_match("x\n1234"));
    assert!(re.is_match("1234\ny"));
    assert!(!re.is_match("12345"));
}

// === end-to-end behavior from the original workload ===

#[test]
fn dual_anchor_end_to_end() {
    let exact = Regex::new("^1234$").unwrap();
    let end_z = Regex::new(r"^1234\z").unwrap();
    let alternation = Regex::new("^(abcd|efgh)$").unwrap();

    let exact_match = "1234";
    let too_long = "12345678901234567890";
    let too_short = "12";

    assert!(exact.is_match(exact_match));
    assert!(!exact.is_match(too_long));
    assert!(!exact.is_match(too_short));
    assert!(!end_z.is_match(too_long));
    assert!(end_z.is_match(exact_match));
    assert!(!alternation.is_match(too_long));
    assert!(alternation.is_match("abcd"));
    assert!(alternation.is_match("efgh"));
    assert!(!alternation.is_match("wxyz"));
}
