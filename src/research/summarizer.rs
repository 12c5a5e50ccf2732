//! Text summarisation.

use async_trait::async_trait;

use crate::error::Result;

/// Number of lead sentences kept by [`LeadSentenceSummarizer`].
const LEAD_SENTENCES: usize = 5;

/// Character cap on the joined lead sentences.
const MAX_SUMMARY_CHARS: usize = 800;

/// Condenses a source body into a short summary.
#[async_trait]
pub trait Summarizer: Send + Sync {
    /// Summarise `text`.
    ///
    /// # Errors
    ///
    /// Returns [`crate::SiraError::Pipeline`] if the backing model fails.
    async fn summarize(&self, text: &str) -> Result<String>;
}

/// Keeps the first five sentences as `- ` bullets, capped at 800 characters.
///
/// Used when no language model is available.
#[derive(Debug, Clone, Copy, Default)]
pub struct LeadSentenceSummarizer;

impl LeadSentenceSummarizer {
    /// Synchronous form of [`Summarizer::summarize`].
    pub fn lead_bullets(text: &str) -> String {
        let text = text.trim();
        if text.is_empty() {
            return String::new();
        }
        let joined = text
            .split(". ")
            .take(LEAD_SENTENCES)
            .collect::<Vec<_>>()
            .join("\n- ");
        let capped: String = joined.chars().take(MAX_SUMMARY_CHARS).collect();
        format!("- {capped}")
    }
}

#[async_trait]
impl Summarizer for LeadSentenceSummarizer {
    async fn summarize(&self, text: &str) -> Result<String> {
        Ok(Self::lead_bullets(text))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keeps_first_five_sentences() {
        let text = "One. Two. Three. Four. Five. Six. Seven.";
        assert_eq!(
            LeadSentenceSummarizer::lead_bullets(text),
            "- One\n- Two\n- Three\n- Four\n- Five"
        );
    }

    #[test]
    fn short_text_is_single_bullet() {
        assert_eq!(
            LeadSentenceSummarizer::lead_bullets("Only one sentence here."),
            "- Only one sentence here."
        );
    }

    #[test]
    fn blank_text_yields_empty_summary() {
        assert_eq!(LeadSentenceSummarizer::lead_bullets("   "), "");
    }

    #[test]
    fn long_sentences_are_capped() {
        let sentence = "x".repeat(1000);
        let summary = LeadSentenceSummarizer::lead_bullets(&sentence);
        assert_eq!(summary.chars().count(), MAX_SUMMARY_CHARS + 2);
    }

    #[test]
    fn cap_respects_char_boundaries() {
        let sentence = "é".repeat(900);
        let summary = LeadSentenceSummarizer::lead_bullets(&sentence);
        assert_eq!(summary.chars().count(), MAX_SUMMARY_CHARS + 2);
    }

    #[tokio::test]
    async fn trait_impl_matches_lead_bullets() {
        let summary = LeadSentenceSummarizer
            .summarize("Alpha. Beta.")
            .await
            .expect("summarize");
        assert_eq!(summary, "- Alpha\n- Beta.");
    }
}
