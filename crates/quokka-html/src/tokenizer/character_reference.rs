//! Character reference decoding.
//!
//! [§ 13.2.5.72 Character reference state](https://html.spec.whatwg.org/multipage/parsing.html#character-reference-state)
//!
//! Only the entities that show up in ordinary prose are recognised. An
//! unknown reference is emitted verbatim, ampersand included.

/// Named references, sorted by name for binary search.
const NAMED: &[(&str, &str)] = &[
    ("amp", "&"),
    ("apos", "'"),
    ("bull", "\u{2022}"),
    ("copy", "\u{00A9}"),
    ("gt", ">"),
    ("hellip", "\u{2026}"),
    ("laquo", "\u{00AB}"),
    ("ldquo", "\u{201C}"),
    ("lsquo", "\u{2018}"),
    ("lt", "<"),
    ("mdash", "\u{2014}"),
    ("middot", "\u{00B7}"),
    ("nbsp", "\u{00A0}"),
    ("ndash", "\u{2013}"),
    ("quot", "\""),
    ("raquo", "\u{00BB}"),
    ("rdquo", "\u{201D}"),
    ("reg", "\u{00AE}"),
    ("rsquo", "\u{2019}"),
    ("trade", "\u{2122}"),
];

/// Look up a named character reference (without `&` or `;`).
#[must_use]
pub fn lookup_entity(name: &str) -> Option<&'static str> {
    NAMED
        .binary_search_by(|(n, _)| n.cmp(&name))
        .ok()
        .map(|i| NAMED[i].1)
}

/// [§ 13.2.5.80 Numeric character reference end state](https://html.spec.whatwg.org/multipage/parsing.html#numeric-character-reference-end-state)
///
/// "If the number is 0x00 ... greater than 0x10FFFF ... or a surrogate, set
/// the character reference code to 0xFFFD."
#[must_use]
pub fn numeric_reference(code: u32) -> char {
    if code == 0 {
        return '\u{FFFD}';
    }
    char::from_u32(code).unwrap_or('\u{FFFD}')
}

/// Decode a reference starting right after the `&` at `input[pos..]`.
///
/// Returns the replacement text and the number of characters consumed
/// (excluding the ampersand), or `None` when nothing matched.
#[must_use]
pub fn decode_at(input: &[char], pos: usize) -> Option<(String, usize)> {
    let rest = input.get(pos..)?;
    if rest.first() == Some(&'#') {
        let hex = matches!(rest.get(1), Some('x' | 'X'));
        let start = if hex { 2 } else { 1 };
        let radix = if hex { 16 } else { 10 };
        let digits: String = rest[start.min(rest.len())..]
            .iter()
            .take_while(|c| c.is_digit(radix))
            .take(8)
            .collect();
        if digits.is_empty() {
            return None;
        }
        let mut consumed = start + digits.len();
        if rest.get(consumed) == Some(&';') {
            consumed += 1;
        }
        let code = u32::from_str_radix(&digits, radix).unwrap_or(0xFFFD);
        return Some((numeric_reference(code).to_string(), consumed));
    }

    let name: String = rest
        .iter()
        .take_while(|c| c.is_ascii_alphanumeric())
        .take(32)
        .collect();
    let replacement = lookup_entity(&name)?;
    let mut consumed = name.chars().count();
    if rest.get(consumed) == Some(&';') {
        consumed += 1;
    }
    Some((replacement.to_string(), consumed))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn table_is_sorted_for_binary_search() {
        assert!(NAMED.windows(2).all(|w| w[0].0 < w[1].0));
    }

    #[test]
    fn decodes_numeric_and_named_references() {
        let input: Vec<char> = "#x41;rest".chars().collect();
        assert_eq!(decode_at(&input, 0), Some(("A".to_string(), 5)));

        let input: Vec<char> = "amp;".chars().collect();
        assert_eq!(decode_at(&input, 0), Some(("&".to_string(), 4)));

        let input: Vec<char> = "bogus;".chars().collect();
        assert_eq!(decode_at(&input, 0), None);
    }
}
