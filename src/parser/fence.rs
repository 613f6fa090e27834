// Fenced code block scanner

use super::lexer::{fence_marker, info_string, FENCE};
use nom::{bytes::complete::take_until, IResult};

/// A markdown code block found in a reply
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FencedBlock<'a> {
    /// Language tag after the opening fence, empty when untagged
    pub tag: &'a str,
    /// Block contents, trimmed
    pub body: &'a str,
}

impl FencedBlock<'_> {
    /// Untagged blocks and blocks tagged `json` (any case) hold JSON candidates
    pub fn is_json(&self) -> bool {
        self.tag.is_empty() || self.tag.eq_ignore_ascii_case("json")
    }
}

/// Parse one fenced block starting at an opening fence
/// Format: ```<tag>\n<body>```
pub fn parse_fenced_block(input: &str) -> IResult<&str, FencedBlock<'_>> {
    let (input, _) = fence_marker(input)?;
    let (input, tag) = info_string(input)?;
    let (input, body) = take_until(FENCE)(input)?;
    let (input, _) = fence_marker(input)?;

    Ok((
        input,
        FencedBlock {
            tag,
            body: body.trim(),
        },
    ))
}

fn skip_to_fence(input: &str) -> IResult<&str, &str> {
    take_until(FENCE)(input)
}

/// Find the first fenced block that may hold JSON.
/// Blocks tagged with another language are skipped; an unterminated fence ends the search.
pub fn find_json_fence(text: &str) -> Option<FencedBlock<'_>> {
    let mut rest = text;

    loop {
        let (at_fence, _) = skip_to_fence(rest).ok()?;
        let (remaining, block) = parse_fenced_block(at_fence).ok()?;
        if block.is_json() {
            return Some(block);
        }
        rest = remaining;
    }
}
