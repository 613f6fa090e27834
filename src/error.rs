use thiserror::Error;

/// Failures surfaced by the invoker and the chat session.
/// Reply parsing never fails: the normalizer falls back instead.
#[derive(Error, Debug)]
pub enum Error {
    #[error("Prompt is empty")]
    EmptyPrompt,

    #[error("No data could be parsed from the file")]
    NoData,

    #[error("AI backend not configured: {0}")]
    NotConfigured(String),

    #[error("Rate limit exceeded. Please try again later.")]
    RateLimited,

    #[error("Payment required. Please add credits to your workspace.")]
    PaymentRequired,

    #[error("AI service error ({status}): {message}")]
    Remote { status: u16, message: String },

    #[error("Request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Invalid response from AI service: {0}")]
    InvalidResponse(String),
}

pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_facing_messages() {
        assert_eq!(Error::RateLimited.to_string(), "Rate limit exceeded. Please try again later.");
        assert_eq!(
            Error::PaymentRequired.to_string(),
            "Payment required. Please add credits to your workspace."
        );
        let remote = Error::Remote { status: 500, message: "boom".to_string() };
        assert_eq!(remote.to_string(), "AI service error (500): boom");
    }
}
