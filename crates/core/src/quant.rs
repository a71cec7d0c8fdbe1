//! Quantization preference policy.
//!
//! Picks the default file offered to the user when a repository ships several
//! quantizations. The policy is an ordered list of lowercase tokens matched as
//! substrings of the file path; earlier tokens win regardless of file order.

use crate::models::CandidateFile;

/// Default preference order, highest priority first.
pub const QUANT_PREFERENCE: &[&str] = &["q4k", "q4_k", "q4", "q3", "q5", "q6", "q8"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QuantPolicy {
    tokens: &'static [&'static str],
}

impl Default for QuantPolicy {
    fn default() -> Self {
        Self {
            tokens: QUANT_PREFERENCE,
        }
    }
}

impl QuantPolicy {
    pub const fn new(tokens: &'static [&'static str]) -> Self {
        Self { tokens }
    }

    /// Index of the recommended candidate, or `None` for an empty list.
    ///
    /// Falls back to the first candidate when no token matches.
    pub fn select_index(&self, candidates: &[CandidateFile]) -> Option<usize> {
        if candidates.is_empty() {
            return None;
        }

        let lowered: Vec<String> = candidates.iter().map(|c| c.path.to_lowercase()).collect();
        for &token in self.tokens {
            if let Some(index) = lowered.iter().position(|path| path.contains(token)) {
                tracing::debug!(token, path = %candidates[index].path, "quantization match");
                return Some(index);
            }
        }
        Some(0)
    }

    pub fn select_best<'a>(&self, candidates: &'a [CandidateFile]) -> Option<&'a CandidateFile> {
        self.select_index(candidates).map(|i| &candidates[i])
    }
}

/// Pick the recommended file using the default policy.
pub fn select_best(candidates: &[CandidateFile]) -> Option<&CandidateFile> {
    QuantPolicy::default().select_best(candidates)
}

/// Files of one repository together with the recommended pick.
#[derive(Debug, Clone)]
pub struct SelectionResult {
    pub source_repo: String,
    pub all_candidates: Vec<CandidateFile>,
    pub recommended_index: usize,
}

impl SelectionResult {
    pub fn new(source_repo: impl Into<String>, candidates: Vec<CandidateFile>) -> Option<Self> {
        Self::with_policy(source_repo, candidates, QuantPolicy::default())
    }

    pub fn with_policy(
        source_repo: impl Into<String>,
        candidates: Vec<CandidateFile>,
        policy: QuantPolicy,
    ) -> Option<Self> {
        let recommended_index = policy.select_index(&candidates)?;
        Some(Self {
            source_repo: source_repo.into(),
            all_candidates: candidates,
            recommended_index,
        })
    }

    pub fn recommended(&self) -> &CandidateFile {
        &self.all_candidates[self.recommended_index]
    }
}
