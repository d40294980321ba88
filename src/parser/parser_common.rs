use winnow::{
    ascii::{alpha1, alphanumeric1, digit0, digit1, hex_digit1, multispace0, oct_digit1, Caseless},
    combinator::{alt, delimited, preceded, repeat},
    error::{self, ContextError, ErrMode},
    stream::{AsChar, Stream, StreamIsPartial},
    token::take_while,
    ModalResult, Parser,
};

//--------------------------------
// General parsing rules
pub type Res<'a, T> = ModalResult<T>;

//
pub fn ws<I, O, E: error::ParserError<I>, F>(inner: F) -> impl Parser<I, O, E>
where
    I: StreamIsPartial + Stream,
    <I as Stream>::Token: AsChar + Clone,
    F: Parser<I, O, E>,
{
    delimited(multispace0, inner, multispace0)
}

pub fn identifier<'a>(input: &mut &'a str) -> Res<'a, &'a str> {
    (
        alt((alpha1, "_")),
        repeat::<_, _, (), _, _>(0.., alt((alphanumeric1, "_"))),
    )
        .take()
        .parse_next(input)
}

/// True for characters that can be part of an identifier
pub fn is_ident_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}

/// Consume text up to the closing bracket matching an already consumed opening bracket.
/// Nested brackets are counted, the closing bracket is not consumed.
/// Fails when the group is not terminated.
pub fn take_until_unbalanced<'a>(
    opening_bracket: char,
    closing_bracket: char,
) -> impl Fn(&mut &'a str) -> Res<'a, &'a str> {
    move |i: &mut &'a str| {
        let mut index = 0;
        let mut bracket_counter = 0;
        while let Some(n) = &i[index..].find(&[opening_bracket, closing_bracket][..]) {
            index += n;
            if i[index..].starts_with(opening_bracket) {
                bracket_counter += 1;
                index += opening_bracket.len_utf8();
            } else {
                bracket_counter -= 1;
                index += closing_bracket.len_utf8();
            }
            // We found the unmatched closing bracket.
            if bracket_counter == -1 {
                // We do not consume it.
                index -= closing_bracket.len_utf8();
                return Ok(i.next_slice(index));
            };
        }
        Err(ErrMode::Backtrack(ContextError::new()))
    }
}

/// Parenthesis group: return the content without the outer parenthesis
pub fn paren_group<'a>(input: &mut &'a str) -> Res<'a, &'a str> {
    delimited(ws("("), take_until_unbalanced('(', ')'), ")").parse_next(input)
}

/// Split text on a separator found outside of any parenthesis group
pub fn split_top_level(txt: &str, sep: char) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut depth = 0_i32;
    let mut start = 0;
    for (i, c) in txt.char_indices() {
        match c {
            '(' => depth += 1,
            ')' => depth -= 1,
            c if c == sep && depth == 0 => {
                parts.push(txt[start..i].trim());
                start = i + c.len_utf8();
            }
            _ => {}
        }
    }
    parts.push(txt[start..].trim());
    parts.retain(|p| !p.is_empty());
    parts
}

#[allow(clippy::from_str_radix_10)]
pub fn val_u64<'a>(input: &mut &'a str) -> Res<'a, u64> {
    alt((
        preceded(Caseless("0x"), hex_digit1).try_map(|v| u64::from_str_radix(v, 16)),
        preceded(Caseless("0b"), take_while(1.., ['0', '1'])).try_map(|v| u64::from_str_radix(v, 2)),
        preceded(Caseless("0o"), oct_digit1).try_map(|v| u64::from_str_radix(v, 8)),
        preceded((digit0, Caseless("'h")), hex_digit1).try_map(|v| u64::from_str_radix(v, 16)),
        preceded((digit0, Caseless("'b")), digit1).try_map(|v| u64::from_str_radix(v, 2)),
        preceded((digit0, Caseless("'o")), digit1).try_map(|v| u64::from_str_radix(v, 8)),
        preceded((digit0, Caseless("'d")), digit1).try_map(|v| u64::from_str_radix(v, 10)),
        digit1.try_map(|v: &str| v.parse::<u64>()),
    ))
    .parse_next(input)
}

/// Read a whole string as an unsigned number (radix prefixes and `_` separators allowed)
pub fn parse_num(txt: &str) -> Option<u64> {
    let cleaned = txt.replace('_', "");
    // Bound to a local so the borrow of `cleaned` ends here
    let res = ws(val_u64).parse(cleaned.as_str()).ok();
    res
}

/// Position of the next occurrence of a keyword not embedded in an identifier.
/// `lower` must be an ASCII lower-cased text, `kw` a lower-case keyword.
pub fn find_keyword(lower: &str, kw: &str, from: usize) -> Option<usize> {
    let mut start = from;
    while let Some(n) = lower.get(start..)?.find(kw) {
        let pos = start + n;
        let end = pos + kw.len();
        let before_ok = lower[..pos].chars().next_back().map(|c| !is_ident_char(c)).unwrap_or(true);
        let after_ok = lower[end..].chars().next().map(|c| !is_ident_char(c)).unwrap_or(true);
        if before_ok && after_ok {
            return Some(pos);
        }
        start = end;
    }
    None
}

#[cfg(test)]
mod tests_parsing {

    use super::*;

    #[test]
    fn test_identifier() {
        assert_eq!(identifier(&mut "signal123"), Ok("signal123"));
        assert_eq!(identifier(&mut "_signal123"), Ok("_signal123"));
        assert_eq!(identifier(&mut "sig.field"), Ok("sig"));
        assert!(identifier(&mut "0sig").is_err());
        assert!(identifier(&mut "+").is_err());
    }

    #[test]
    fn test_values() {
        assert_eq!(parse_num("34"), Some(34));
        assert_eq!(parse_num("0x34"), Some(0x34));
        assert_eq!(parse_num("0X1f"), Some(0x1f));
        assert_eq!(parse_num("0b101"), Some(5));
        assert_eq!(parse_num("0o17"), Some(15));
        assert_eq!(parse_num("8'hFF"), Some(255));
        assert_eq!(parse_num("'b10"), Some(2));
        assert_eq!(parse_num(" 1_000 "), Some(1000));
        assert_eq!(parse_num("12abc"), None);
        assert_eq!(parse_num("-3"), None);
        assert_eq!(parse_num(""), None);
    }

    #[test]
    fn test_paren_group() {
        let mut s = "(a : in std_logic_vector(7 downto 0)); end";
        assert_eq!(paren_group(&mut s), Ok("a : in std_logic_vector(7 downto 0)"));
        assert_eq!(s, "; end");
        assert!(paren_group(&mut "(a (b)").is_err());
    }

    #[test]
    fn test_split_top_level() {
        assert_eq!(
            split_top_level("a : in t(1, 2); b : out u;  ;", ';'),
            vec!["a : in t(1, 2)", "b : out u"]
        );
        assert_eq!(split_top_level("x, y(1,2), z", ','), vec!["x", "y(1,2)", "z"]);
    }

    #[test]
    fn test_keyword() {
        let txt = "portx port_a port (";
        assert_eq!(find_keyword(txt, "port", 0), Some(13));
        assert_eq!(find_keyword("generic(", "generic", 0), Some(0));
        assert_eq!(find_keyword("generics", "generic", 0), None);
    }
}
