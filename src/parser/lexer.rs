// Token-level parsers for markdown code fences

use nom::{
    bytes::complete::{tag, take_while},
    character::complete::{line_ending, space0},
    combinator::opt,
    sequence::{preceded, terminated},
    IResult,
};

/// Markdown code fence delimiter
pub const FENCE: &str = "```";

/// Parse the three-backtick fence delimiter
pub fn fence_marker(input: &str) -> IResult<&str, &str> {
    tag(FENCE)(input)
}

/// Parse the language tag after an opening fence (e.g. `json`), which may be empty.
/// Consumes trailing spaces and at most one line break.
pub fn info_string(input: &str) -> IResult<&str, &str> {
    terminated(
        preceded(
            space0,
            take_while(|c: char| c.is_alphanumeric() || c == '-' || c == '_' || c == '+'),
        ),
        preceded(space0, opt(line_ending)),
    )(input)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fence_marker() {
        assert_eq!(fence_marker("```json"), Ok(("json", "```")));
        assert!(fence_marker("``json").is_err());
    }

    #[test]
    fn test_info_string_tagged() {
        assert_eq!(info_string("json\n{}"), Ok(("{}", "json")));
        assert_eq!(info_string(" JSON \r\n{}"), Ok(("{}", "JSON")));
    }

    #[test]
    fn test_info_string_untagged() {
        assert_eq!(info_string("\n{}"), Ok(("{}", "")));
    }

    #[test]
    fn test_info_string_same_line_body() {
        assert_eq!(info_string("json {\"a\":1}"), Ok(("{\"a\":1}", "json")));
    }
}
