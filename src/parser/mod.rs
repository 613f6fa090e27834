// Scanners that pull JSON candidates out of free-form AI replies

pub mod braces;
pub mod fence;
pub mod lexer;

// Public API re-exports
pub use braces::first_object_span;
pub use fence::{find_json_fence, FencedBlock};

/// Where a JSON candidate was found in the reply
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CandidateSource {
    Fence,
    Braces,
}

/// Locate the JSON text to parse: the first json/untagged fenced block,
/// else the first balanced top-level object.
pub fn json_candidate(text: &str) -> Option<(CandidateSource, &str)> {
    if let Some(block) = find_json_fence(text) {
        return Some((CandidateSource::Fence, block.body));
    }
    first_object_span(text).map(|span| (CandidateSource::Braces, span))
}
