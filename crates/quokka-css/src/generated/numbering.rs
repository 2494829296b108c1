//! [CSS 2.1 § 12.6.2 Lists: the 'list-style-type' property](https://www.w3.org/TR/CSS2/generate.html#propdef-list-style-type)
//!
//! Counter values rendered as text.

use crate::style::ListStyleType;

const ROMAN: [(i32, &str); 13] = [
    (1000, "m"),
    (900, "cm"),
    (500, "d"),
    (400, "cd"),
    (100, "c"),
    (90, "xc"),
    (50, "l"),
    (40, "xl"),
    (10, "x"),
    (9, "ix"),
    (5, "v"),
    (4, "iv"),
    (1, "i"),
];

const GREEK: [char; 24] = [
    'α', 'β', 'γ', 'δ', 'ε', 'ζ', 'η', 'θ', 'ι', 'κ', 'λ', 'μ', 'ν', 'ξ', 'ο', 'π', 'ρ', 'σ',
    'τ', 'υ', 'φ', 'χ', 'ψ', 'ω',
];

/// Digits for 1-9, 10-90, 100-900 and 1000-9000.
const ARMENIAN: [[char; 9]; 4] = [
    ['Ա', 'Բ', 'Գ', 'Դ', 'Ե', 'Զ', 'Է', 'Ը', 'Թ'],
    ['Ժ', 'Ի', 'Լ', 'Խ', 'Ծ', 'Կ', 'Հ', 'Ձ', 'Ղ'],
    ['Ճ', 'Մ', 'Յ', 'Ն', 'Շ', 'Ո', 'Չ', 'Պ', 'Ջ'],
    ['Ռ', 'Ս', 'Վ', 'Տ', 'Ր', 'Ց', 'Ւ', 'Փ', 'Ք'],
];

const GEORGIAN: [[char; 9]; 4] = [
    ['ა', 'ბ', 'გ', 'დ', 'ე', 'ვ', 'ზ', 'ჱ', 'თ'],
    ['ი', 'კ', 'ლ', 'მ', 'ნ', 'ჲ', 'ო', 'პ', 'ჟ'],
    ['რ', 'ს', 'ტ', 'ჳ', 'ფ', 'ქ', 'ღ', 'ყ', 'შ'],
    ['ჩ', 'ც', 'ძ', 'წ', 'ჭ', 'ხ', 'ჴ', 'ჯ', 'ჰ'],
];

const GEORGIAN_TEN_THOUSAND: char = 'ჵ';

/// Render `value` in `style`. Styles with a limited range fall back to
/// decimal outside it; `none` renders nothing.
#[must_use]
pub fn format_counter(value: i32, style: ListStyleType) -> String {
    match style {
        ListStyleType::None => String::new(),
        ListStyleType::Disc => "\u{2022}".to_string(),
        ListStyleType::Circle => "\u{25E6}".to_string(),
        ListStyleType::Square => "\u{25AA}".to_string(),
        ListStyleType::Decimal => value.to_string(),
        ListStyleType::DecimalLeadingZero => {
            if (-9..=9).contains(&value) {
                let sign = if value < 0 { "-" } else { "" };
                format!("{sign}0{}", value.unsigned_abs())
            } else {
                value.to_string()
            }
        }
        ListStyleType::LowerRoman => roman(value).unwrap_or_else(|| value.to_string()),
        ListStyleType::UpperRoman => roman(value)
            .map(|r| r.to_ascii_uppercase())
            .unwrap_or_else(|| value.to_string()),
        ListStyleType::LowerAlpha | ListStyleType::LowerLatin => {
            alphabetic(value, &ALPHABET_LOWER).unwrap_or_else(|| value.to_string())
        }
        ListStyleType::UpperAlpha | ListStyleType::UpperLatin => {
            alphabetic(value, &ALPHABET_UPPER).unwrap_or_else(|| value.to_string())
        }
        ListStyleType::LowerGreek => alphabetic(value, &GREEK).unwrap_or_else(|| value.to_string()),
        ListStyleType::Armenian => additive(value, &ARMENIAN, 9999).unwrap_or_else(|| value.to_string()),
        ListStyleType::Georgian => georgian(value).unwrap_or_else(|| value.to_string()),
    }
}

/// Marker text for a list item: glyphs stand alone, numbers get a period.
#[must_use]
pub fn marker_text(value: i32, style: ListStyleType) -> String {
    match style {
        ListStyleType::None => String::new(),
        ListStyleType::Disc | ListStyleType::Circle | ListStyleType::Square => {
            format_counter(value, style)
        }
        _ => format!("{}.", format_counter(value, style)),
    }
}

const ALPHABET_LOWER: [char; 26] = [
    'a', 'b', 'c', 'd', 'e', 'f', 'g', 'h', 'i', 'j', 'k', 'l', 'm', 'n', 'o', 'p', 'q', 'r',
    's', 't', 'u', 'v', 'w', 'x', 'y', 'z',
];

const ALPHABET_UPPER: [char; 26] = [
    'A', 'B', 'C', 'D', 'E', 'F', 'G', 'H', 'I', 'J', 'K', 'L', 'M', 'N', 'O', 'P', 'Q', 'R',
    'S', 'T', 'U', 'V', 'W', 'X', 'Y', 'Z',
];

fn roman(value: i32) -> Option<String> {
    if !(1..=3999).contains(&value) {
        return None;
    }
    let mut rest = value;
    let mut out = String::new();
    for (amount, digits) in ROMAN {
        while rest >= amount {
            out.push_str(digits);
            rest -= amount;
        }
    }
    Some(out)
}

/// Bijective base-N: 1 → a, N → z, N+1 → aa.
fn alphabetic(value: i32, alphabet: &[char]) -> Option<String> {
    if value < 1 {
        return None;
    }
    let base = u32::try_from(alphabet.len()).ok()?;
    let mut rest = value.unsigned_abs();
    let mut out = Vec::new();
    while rest > 0 {
        rest -= 1;
        out.push(alphabet[(rest % base) as usize]);
        rest /= base;
    }
    Some(out.into_iter().rev().collect())
}

fn additive(value: i32, digits: &[[char; 9]; 4], max: i32) -> Option<String> {
    if !(1..=max).contains(&value) {
        return None;
    }
    let mut out = String::new();
    let mut rest = value;
    for (place, row) in digits.iter().enumerate().rev() {
        let unit = 10_i32.pow(u32::try_from(place).ok()?);
        let digit = rest / unit;
        if digit > 0 {
            out.push(row[usize::try_from(digit - 1).ok()?]);
        }
        rest %= unit;
    }
    Some(out)
}

fn georgian(value: i32) -> Option<String> {
    if !(1..=19999).contains(&value) {
        return None;
    }
    let mut out = String::new();
    if value >= 10000 {
        out.push(GEORGIAN_TEN_THOUSAND);
    }
    let rest = value % 10000;
    if rest > 0 {
        out.push_str(&additive(rest, &GEORGIAN, 9999)?);
    }
    Some(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use quickcheck_macros::quickcheck;

    #[test]
    fn test_roman_numerals() {
        assert_eq!(format_counter(1, ListStyleType::LowerRoman), "i");
        assert_eq!(format_counter(4, ListStyleType::LowerRoman), "iv");
        assert_eq!(format_counter(1994, ListStyleType::UpperRoman), "MCMXCIV");
        assert_eq!(format_counter(3999, ListStyleType::UpperRoman), "MMMCMXCIX");
    }

    #[test]
    fn test_roman_out_of_range_falls_back_to_decimal() {
        assert_eq!(format_counter(0, ListStyleType::LowerRoman), "0");
        assert_eq!(format_counter(4000, ListStyleType::UpperRoman), "4000");
        assert_eq!(format_counter(-3, ListStyleType::LowerRoman), "-3");
    }

    #[test]
    fn test_alphabetic() {
        assert_eq!(format_counter(1, ListStyleType::LowerAlpha), "a");
        assert_eq!(format_counter(26, ListStyleType::LowerLatin), "z");
        assert_eq!(format_counter(27, ListStyleType::UpperAlpha), "AA");
        assert_eq!(format_counter(0, ListStyleType::LowerAlpha), "0");
        assert_eq!(format_counter(2, ListStyleType::LowerGreek), "β");
        assert_eq!(format_counter(25, ListStyleType::LowerGreek), "αα");
    }

    #[test]
    fn test_decimal_leading_zero() {
        assert_eq!(format_counter(7, ListStyleType::DecimalLeadingZero), "07");
        assert_eq!(format_counter(-7, ListStyleType::DecimalLeadingZero), "-07");
        assert_eq!(format_counter(12, ListStyleType::DecimalLeadingZero), "12");
    }

    #[test]
    fn test_additive_systems() {
        assert_eq!(format_counter(1, ListStyleType::Armenian), "Ա");
        assert_eq!(format_counter(11, ListStyleType::Armenian), "ԺԱ");
        assert_eq!(format_counter(10000, ListStyleType::Armenian), "10000");
        assert_eq!(format_counter(10001, ListStyleType::Georgian), "ჵა");
    }

    #[test]
    fn test_glyphs_and_none() {
        assert_eq!(format_counter(5, ListStyleType::Disc), "\u{2022}");
        assert_eq!(format_counter(5, ListStyleType::None), "");
        assert_eq!(marker_text(3, ListStyleType::Decimal), "3.");
        assert_eq!(marker_text(3, ListStyleType::Square), "\u{25AA}");
    }

    #[quickcheck]
    fn prop_decimal_matches_to_string(value: i32) -> bool {
        format_counter(value, ListStyleType::Decimal) == value.to_string()
    }

    #[quickcheck]
    fn prop_alphabetic_is_nonempty_for_positive(value: u16) -> bool {
        let v = i32::from(value) + 1;
        let text = format_counter(v, ListStyleType::LowerAlpha);
        !text.is_empty() && text.chars().all(|c| c.is_ascii_lowercase())
    }

    #[quickcheck]
    fn prop_roman_in_range_has_no_digits(value: u16) -> bool {
        let v = i32::from(value % 3999) + 1;
        !format_counter(v, ListStyleType::LowerRoman).chars().any(|c| c.is_ascii_digit())
    }
}
