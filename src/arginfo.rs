//! Locating and replacing arginfo declarations in C source text.
//!
//! An arginfo declaration appears in one of two shapes:
//!
//! ```c
//! ZEND_BEGIN_ARG_WITH_RETURN_TYPE_INFO_EX(arginfo_foo, 0, 1, IS_LONG, 0)
//!     ZEND_ARG_TYPE_INFO(0, bar, IS_STRING, 0)
//! ZEND_END_ARG_INFO()
//! ```
//!
//! or, when it shares its signature with another one,
//!
//! ```c
//! #define arginfo_foo arginfo_baz
//! ```
//!
//! Both are matched as plain bytes; the surrounding source is never parsed
//! and need not be valid UTF-8.

use lazy_static::lazy_static;
use regex::bytes::Regex;
use std::ops::Range;

lazy_static! {
    static ref OVER_ESCAPED_RE: Regex = Regex::new(r"\\\\([uUxX])").unwrap();
}

/// A way of finding the declaration of a named arginfo table.
pub trait BlockLocator {
    /// Byte range of the first declaration of `name` in `source`.
    fn find(&self, source: &[u8], name: &str) -> Option<Range<usize>>;
}

/// `ZEND_BEGIN_ARG...(name, ...)` through the next `ZEND_END_ARG...(...)`.
pub struct BracketedBlock;

impl BlockLocator for BracketedBlock {
    fn find(&self, source: &[u8], name: &str) -> Option<Range<usize>> {
        let pattern = format!(
            r"ZEND_BEGIN_ARG(?-u:[^(])+\({},(?s-u:.)+?ZEND_END_ARG(?-u:[^)])+\)",
            regex::escape(name)
        );
        find_first(&pattern, source)
    }
}

/// `#define name ...` on a single line.
pub struct DefineLine;

impl BlockLocator for DefineLine {
    fn find(&self, source: &[u8], name: &str) -> Option<Range<usize>> {
        let pattern = format!(r"#define {} (?-u:[^\n])+", regex::escape(name));
        find_first(&pattern, source)
    }
}

fn find_first(pattern: &str, source: &[u8]) -> Option<Range<usize>> {
    Regex::new(pattern)
        .ok()
        .and_then(|re| re.find(source))
        .map(|m| m.range())
}

/// Locators in the order they are tried.
pub static LOCATORS: &[&(dyn BlockLocator + Sync)] = &[&BracketedBlock, &DefineLine];

/// Byte range of the declaration of `name`, trying each locator in turn.
pub fn find_block(source: &[u8], name: &str) -> Option<Range<usize>> {
    LOCATORS
        .iter()
        .find_map(|locator| locator.find(source, name))
}

/// Text of the declaration of `name`.
pub fn locate_block<'s>(source: &'s [u8], name: &str) -> Option<&'s [u8]> {
    find_block(source, name).map(|range| &source[range])
}

/// Undo the generator's doubled backslash before `u`, `U`, `x` and `X`.
///
/// `\\U` inside a stringified class name trips `-Wunicode`; the hex escape
/// `\x5c` spells the same backslash without it.
pub fn normalize_escapes(block: &[u8]) -> Vec<u8> {
    OVER_ESCAPED_RE
        .replace_all(block, &br"\x5c${1}"[..])
        .into_owned()
}

/// Outcome of refreshing one declaration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BlockChange {
    /// Generated text is identical to what is already in the source.
    Unchanged,
    /// The source declaration was replaced.
    Replaced,
    /// No declaration of the name exists in the source being updated.
    MissingInSource,
    /// The generated header has no declaration of the name.
    MissingInGenerated,
}

/// Replace the declaration of `name` in `source` with the one in `generated`.
pub fn refresh_block(source: &mut Vec<u8>, generated: &[u8], name: &str) -> BlockChange {
    let old = match find_block(source, name) {
        Some(old) => old,
        None => return BlockChange::MissingInSource,
    };
    let new = match locate_block(generated, name) {
        Some(new) => normalize_escapes(new),
        None => return BlockChange::MissingInGenerated,
    };
    if source[old.clone()] == new[..] {
        return BlockChange::Unchanged;
    }
    source.splice(old, new);
    BlockChange::Replaced
}
