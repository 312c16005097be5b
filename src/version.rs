//! Version comparison for ports and installed packages.
//!
//! This module compares the `version-release` strings used throughout the
//! ports tree and the installed-package database. Unlike a plain ordering,
//! the comparison has a fourth outcome, [`VersionCmp::Undefined`], for pairs
//! that cannot be ordered with confidence (for example `1.0PR1` vs
//! `1.0RC1`). Callers use that outcome to refuse silent downgrades and to
//! report undecidable differences to the operator instead of guessing.

use std::cmp::Ordering;

/// Outcome of comparing two version-release strings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum VersionCmp {
    /// The left-hand version is older.
    Less,
    /// The left-hand version is newer.
    Greater,
    /// Both versions are equivalent.
    Equal,
    /// The versions cannot be ordered with confidence.
    Undefined,
}

/// Pre-release words ordered from oldest to newest. Words outside this list
/// (`pre`, `rc`, `test`, ...) deliberately compare as undefined.
const PRE_RELEASE_WORDS: [&str; 4] = ["alpha", "beta", "gamma", "delta"];

/// Padding token for operands of unequal length. Parses as a number smaller
/// than any non-negative integer, so a shorter operand loses against a
/// numeric suffix.
const PAD_TOKEN: &str = "-1";

/// What: Compare two version-release strings.
///
/// Inputs:
/// - `v1`: Left-hand version string (e.g., "1.4.2-alpha2").
/// - `v2`: Right-hand version string (e.g., "1.4.2-beta1").
///
/// Output:
/// - Returns `VersionCmp::Less`, `VersionCmp::Greater` or `VersionCmp::Equal`
///   when the strings can be ordered.
/// - Returns `VersionCmp::Undefined` when a position holds sub-tokens that
///   are neither numeric, single characters, nor known pre-release words.
///
/// Details:
/// - Operands are first cut into blocks on `-` and `_`, then each block into
///   tokens on `.`; the shorter side is padded with a sentinel that orders
///   below any non-negative number.
/// - Tokens that both parse as base-10 integers compare numerically.
///   Mixed tokens are re-cut into alternating digit and non-digit runs and
///   compared run by run.
/// - The first decisive position wins.
///
/// # Example
///
/// ```
/// use ports_toolkit::version::{VersionCmp, compare_versions};
///
/// assert_eq!(compare_versions("1.4.2-alpha2", "1.4.2-beta1"), VersionCmp::Less);
/// assert_eq!(compare_versions("1.2.3-2", "1.2.3-1"), VersionCmp::Greater);
/// assert_eq!(compare_versions("1.0PR1", "1.0RC1"), VersionCmp::Undefined);
/// ```
#[must_use]
pub fn compare_versions(v1: &str, v2: &str) -> VersionCmp {
    let mut blocks1 = split_dropping_last_empty(v1, &['-', '_']);
    let mut blocks2 = split_dropping_last_empty(v2, &['-', '_']);
    pad_matching(&mut blocks1, &mut blocks2);

    for (block1, block2) in blocks1.iter().zip(blocks2.iter()) {
        let mut tokens1 = split_dropping_last_empty(block1, &['.']);
        let mut tokens2 = split_dropping_last_empty(block2, &['.']);
        pad_matching(&mut tokens1, &mut tokens2);

        for (tok1, tok2) in tokens1.iter().zip(tokens2.iter()) {
            if tok1 == tok2 {
                continue;
            }

            match (tok1.parse::<i64>(), tok2.parse::<i64>()) {
                (Ok(n1), Ok(n2)) => match n1.cmp(&n2) {
                    Ordering::Less => return VersionCmp::Less,
                    Ordering::Greater => return VersionCmp::Greater,
                    Ordering::Equal => {}
                },
                _ => {
                    if let Some(result) = compare_mixed(tok1, tok2) {
                        return result;
                    }
                }
            }
        }
    }

    VersionCmp::Equal
}

/// Compare two tokens that are not both plain integers by cutting them into
/// alternating digit and non-digit runs. `None` means every run matched and
/// the caller should move on to the next token.
fn compare_mixed(tok1: &str, tok2: &str) -> Option<VersionCmp> {
    let mut subs1 = mixed_runs(tok1);
    let mut subs2 = mixed_runs(tok2);
    pad_matching(&mut subs1, &mut subs2);

    for (sub1, sub2) in subs1.iter().zip(subs2.iter()) {
        if sub1 == sub2 {
            continue;
        }

        match (sub1.parse::<i64>(), sub2.parse::<i64>()) {
            (Ok(a), Ok(b)) => match a.cmp(&b) {
                Ordering::Less => return Some(VersionCmp::Less),
                Ordering::Greater => return Some(VersionCmp::Greater),
                Ordering::Equal => {}
            },
            _ => return Some(compare_textual(sub1, sub2)),
        }
    }

    None
}

/// Compare two unequal non-numeric runs: single characters byte-wise,
/// known pre-release words by their position in [`PRE_RELEASE_WORDS`],
/// anything else is undecidable.
fn compare_textual(sub1: &str, sub2: &str) -> VersionCmp {
    if sub1.len() == 1 && sub2.len() == 1 {
        return match sub1.as_bytes()[0].cmp(&sub2.as_bytes()[0]) {
            Ordering::Less => VersionCmp::Less,
            Ordering::Greater => VersionCmp::Greater,
            Ordering::Equal => VersionCmp::Undefined,
        };
    }

    let pos1 = PRE_RELEASE_WORDS.iter().position(|w| w == &sub1);
    let pos2 = PRE_RELEASE_WORDS.iter().position(|w| w == &sub2);
    if let (Some(p1), Some(p2)) = (pos1, pos2) {
        return match p1.cmp(&p2) {
            Ordering::Less => VersionCmp::Less,
            Ordering::Greater => VersionCmp::Greater,
            Ordering::Equal => VersionCmp::Undefined,
        };
    }

    VersionCmp::Undefined
}

/// Split on any of `delimiters`, keeping interior empty fields but dropping
/// a single trailing empty field ("1.4.2-" splits like "1.4.2").
fn split_dropping_last_empty<'a>(s: &'a str, delimiters: &[char]) -> Vec<&'a str> {
    let mut parts: Vec<&str> = s.split(delimiters).collect();
    if parts.last() == Some(&"") {
        parts.pop();
    }
    parts
}

/// Right-pad the shorter list with the sentinel token until both match.
fn pad_matching<'a>(v1: &mut Vec<&'a str>, v2: &mut Vec<&'a str>) {
    while v1.len() < v2.len() {
        v1.push(PAD_TOKEN);
    }
    while v2.len() < v1.len() {
        v2.push(PAD_TOKEN);
    }
}

/// Cut a token into maximal runs of digits and non-digits, in order:
/// `"2alpha4"` becomes `["2", "alpha", "4"]`.
fn mixed_runs(s: &str) -> Vec<&str> {
    let mut runs = Vec::new();
    let mut start = 0;
    let mut digits = false;

    for (idx, ch) in s.char_indices() {
        let is_digit = ch.is_ascii_digit();
        if idx == 0 {
            digits = is_digit;
        } else if is_digit != digits {
            runs.push(&s[start..idx]);
            start = idx;
            digits = is_digit;
        }
    }
    if start < s.len() {
        runs.push(&s[start..]);
    }
    runs
}
