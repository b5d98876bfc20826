//! Specifier relinking.
//!
//! Rewrites the module specifier literals found by the dependency collector
//! to the flat `./<name>` form. Only the recorded literal spans are touched,
//! so quotes inside comments or other strings never confuse the rewrite.
//! Replacement happens in a single left-to-right pass, so one rewrite can
//! never feed into another and a specifier that is a prefix of another
//! (`./a` vs `./ab`) is left alone.

use std::borrow::Cow;

use log::trace;
use rustc_hash::FxHashMap;

use crate::visitors::DiscoveredSpecifier;

/// Replace every specifier literal whose value is a key of `replacements`
/// with the mapped value, keeping the original quote style.
///
/// Text outside the rewritten literals is returned byte-for-byte.
pub fn relink<'a>(
    text: &'a str,
    literals: &[DiscoveredSpecifier],
    replacements: &FxHashMap<String, String>,
) -> Cow<'a, str> {
    if replacements.is_empty() {
        return Cow::Borrowed(text);
    }

    let mut ordered: Vec<&DiscoveredSpecifier> = literals
        .iter()
        .filter(|literal| replacements.contains_key(&literal.specifier))
        .collect();
    if ordered.is_empty() {
        return Cow::Borrowed(text);
    }
    ordered.sort_by_key(|literal| literal.span.start);

    let mut out = String::with_capacity(text.len());
    let mut cursor = 0;
    for literal in ordered {
        let (start, end) = (literal.span.start as usize, literal.span.end as usize);
        if start < cursor {
            continue;
        }
        let Some(quote) = literal_quote(text, start, end) else {
            trace!("Span {start}..{end} is not a quoted literal; left as is");
            continue;
        };
        let Some(replacement) = replacements.get(&literal.specifier) else {
            continue;
        };
        out.push_str(&text[cursor..start]);
        out.push(quote);
        out.push_str(replacement);
        out.push(quote);
        cursor = end;
    }
    out.push_str(&text[cursor..]);
    Cow::Owned(out)
}

/// Quote character of the literal at `start..end`, if the span really
/// delimits one
fn literal_quote(text: &str, start: usize, end: usize) -> Option<char> {
    let literal = text.get(start..end)?;
    let quote = literal.chars().next().filter(|c| matches!(c, '"' | '\''))?;
    (literal.len() >= 2 && literal.ends_with(quote)).then_some(quote)
}
