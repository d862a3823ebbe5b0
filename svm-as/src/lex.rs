/// Starts a comment running to end of line.
pub const COMMENT: char = ';';
/// Ends the token that defines a label.
pub const LABEL_SUFFIX: char = ':';

/// One meaningful source line: `[label:] [MNEMONIC [operand]]`.
/// Blank and comment-only lines never become a [`Line`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Line<'a> {
    /// 1-based line number in the source.
    pub number: usize,
    pub label: Option<&'a str>,
    pub mnemonic: Option<&'a str>,
    pub operand: Option<&'a str>,
}

/// svm-as lexer.
/// Represents an iterator over source [`Line`]s. Tokens are separated by
/// whitespace, anything after the third token of a line is ignored.
///
/// # Example
/// ```
/// # use svm_as::lex::{Lex, Line};
/// #
/// let fragment = "loop: JNZ loop ; again\n\n; nothing here\nHALT";
/// let lines: Vec<Line> = Lex::new(fragment).collect();
///
/// assert_eq!(lines, vec![
///     Line { number: 1, label: Some("loop"), mnemonic: Some("JNZ"), operand: Some("loop") },
///     Line { number: 4, label: None, mnemonic: Some("HALT"), operand: None },
/// ]);
/// ```
pub struct Lex<'a> {
    lines: core::iter::Enumerate<core::str::Lines<'a>>,
}

impl<'a> Lex<'a> {
    /// Create new lexer by string.
    pub fn new(v: &'a str) -> Self {
        Self {
            lines: v.lines().enumerate(),
        }
    }
}

impl<'a> Iterator for Lex<'a> {
    type Item = Line<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        for (idx, raw) in self.lines.by_ref() {
            let code = raw.split(COMMENT).next().unwrap_or_default();
            let mut tokens = code.split_ascii_whitespace();

            let Some(first) = tokens.next() else {
                continue;
            };
            let (label, mnemonic) = match first.strip_suffix(LABEL_SUFFIX) {
                Some(name) => (Some(name), tokens.next()),
                None => (None, Some(first)),
            };

            return Some(Line {
                number: idx + 1,
                label,
                mnemonic,
                operand: tokens.next(),
            });
        }

        None
    }
}

/// Parses integer literal the way C `strtol` with base 0 does, but only
/// accepts the token if all of it is consumed.
///
/// Optional sign, then `0x`/`0X` for hexadecimal, a leading `0` for octal,
/// decimal otherwise. Values out of `i64` range saturate, the result is
/// truncated to 32 bits.
///
/// ```
/// # use svm_as::lex::parse_number;
/// assert_eq!(parse_number("-0x10"), Some(-16));
/// assert_eq!(parse_number("010"), Some(8));
/// assert_eq!(parse_number("4294967295"), Some(-1));
/// assert_eq!(parse_number("loop"), None);
/// ```
pub fn parse_number(token: &str) -> Option<i32> {
    let (neg, digits) = match token.as_bytes().first()? {
        b'-' => (true, &token[1..]),
        b'+' => (false, &token[1..]),
        _ => (false, token),
    };
    let (radix, digits) = if let Some(hex) = digits
        .strip_prefix("0x")
        .or_else(|| digits.strip_prefix("0X"))
    {
        (16, hex)
    } else if digits.len() > 1 && digits.starts_with('0') {
        (8, &digits[1..])
    } else {
        (10, digits)
    };

    if digits.is_empty() || !digits.chars().all(|c| c.is_digit(radix)) {
        return None;
    }

    let magnitude = digits.chars().try_fold(0i64, |acc, c| {
        acc.checked_mul(i64::from(radix))?
            .checked_add(i64::from(c.to_digit(radix)?))
    });
    let value = match (magnitude, neg) {
        (Some(m), false) => m,
        (Some(m), true) => -m,
        (None, false) => i64::MAX,
        (None, true) => i64::MIN,
    };

    Some(value as i32)
}
