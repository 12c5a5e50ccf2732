//! Heuristic source credibility scoring.

/// URL fragments that mark research publishers and academic hosts.
const TRUSTED_MARKERS: &[&str] = &["nature", "arxiv", "springer", "research", "edu"];

/// URL fragments that mark self-published or community content.
const INFORMAL_MARKERS: &[&str] = &["medium", "blog", "reddit"];

/// Word count above which a source earns the length bonus.
const LONG_FORM_WORDS: usize = 500;

/// Score a source in `[0.0, 1.0]` from its URL and body text.
///
/// Starts at 0.5. A trusted marker in the URL adds 0.3; otherwise an
/// informal marker subtracts 0.2. Bodies longer than 500 words add 0.1.
pub fn evaluate_source(url: &str, text: &str) -> f64 {
    let mut trust: f64 = 0.5;
    if TRUSTED_MARKERS.iter().any(|m| url.contains(m)) {
        trust += 0.3;
    } else if INFORMAL_MARKERS.iter().any(|m| url.contains(m)) {
        trust -= 0.2;
    }
    if text.split_whitespace().count() > LONG_FORM_WORDS {
        trust += 0.1;
    }
    trust.min(1.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn words(n: usize) -> String {
        vec!["word"; n].join(" ")
    }

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn neutral_source_scores_baseline() {
        assert!(approx(evaluate_source("https://example.com/a", "short"), 0.5));
    }

    #[test]
    fn research_domain_is_trusted() {
        assert!(approx(evaluate_source("https://arxiv.org/abs/1", "short"), 0.8));
        assert!(approx(evaluate_source("https://cs.stanford.edu/x", "short"), 0.8));
    }

    #[test]
    fn informal_domain_is_discounted() {
        assert!(approx(evaluate_source("https://reddit.com/r/x", "short"), 0.3));
    }

    #[test]
    fn trusted_marker_wins_over_informal() {
        let score = evaluate_source("https://research.blog.example/post", "short");
        assert!(approx(score, 0.8));
    }

    #[test]
    fn long_form_bonus_needs_more_than_500_words() {
        assert!(approx(evaluate_source("https://example.com", &words(500)), 0.5));
        assert!(approx(evaluate_source("https://example.com", &words(501)), 0.6));
    }

    #[test]
    fn score_is_capped_at_one() {
        let score = evaluate_source("https://nature.com/articles/1", &words(1000));
        assert!(approx(score, 0.9));
        assert!(score <= 1.0);
    }
}
