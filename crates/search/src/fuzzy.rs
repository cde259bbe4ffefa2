use nucleo_matcher::pattern::{CaseMatching, Normalization, Pattern};
use nucleo_matcher::{Matcher, Utf32String};

/// Expands a query term to similar indexed terms using nucleo-matcher
pub struct FuzzyTerms {
    matcher: Matcher,
}

impl FuzzyTerms {
    pub fn new() -> Self {
        Self {
            matcher: Matcher::new(nucleo_matcher::Config::DEFAULT),
        }
    }

    /// Vocabulary terms matching `term`, best first, as (term, similarity in 0..=1).
    ///
    /// Similarity is relative to the score `term` gets against itself.
    pub fn expand<'v>(
        &mut self,
        term: &str,
        vocabulary: impl IntoIterator<Item = &'v str>,
        limit: usize,
        min_similarity: f32,
    ) -> Vec<(String, f32)> {
        let pattern = Pattern::parse(term, CaseMatching::Smart, Normalization::Smart);
        let perfect = {
            let haystack = Utf32String::from(term);
            pattern.score(haystack.slice(..), &mut self.matcher)
        };
        let Some(perfect) = perfect.filter(|score| *score > 0) else {
            return Vec::new();
        };

        let mut scored: Vec<(String, f32)> = vocabulary
            .into_iter()
            .filter(|candidate| *candidate != term)
            .filter_map(|candidate| {
                let haystack = Utf32String::from(candidate);
                let score = pattern.score(haystack.slice(..), &mut self.matcher)?;
                let similarity = (score as f32 / perfect as f32).min(1.0);
                (similarity >= min_similarity).then(|| (candidate.to_string(), similarity))
            })
            .collect();

        scored.sort_by(|a, b| {
            b.1.partial_cmp(&a.1)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| a.0.len().cmp(&b.0.len()))
                .then_with(|| a.0.cmp(&b.0))
        });
        scored.truncate(limit);
        scored
    }
}

impl Default for FuzzyTerms {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn abbreviated_term_finds_full_word() {
        let mut fuzzy = FuzzyTerms::new();
        let vocabulary = ["response", "request", "message"];

        let expanded = fuzzy.expand("rspns", vocabulary, 3, 0.3);
        assert_eq!(expanded.first().map(|(t, _)| t.as_str()), Some("response"));
    }

    #[test]
    fn unrelated_vocabulary_yields_nothing() {
        let mut fuzzy = FuzzyTerms::new();
        let expanded = fuzzy.expand("zzzz", ["alpha", "beta"], 3, 0.3);
        assert!(expanded.is_empty());
    }
}
