//! Candidate model registry
//!
//! Ordered, read-only list of models tried in priority order. Built once at
//! process start; cloning shares the same backing list.

use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;

use crate::error::{AnalysisError, Result};

/// One backend model in the fallback chain
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CandidateModel {
    id: String,
    supports_inline_data: bool,
}

impl CandidateModel {
    /// A candidate that accepts text and inline images
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            supports_inline_data: true,
        }
    }

    /// A candidate that only accepts text segments
    pub fn text_only(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            supports_inline_data: false,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn supports_inline_data(&self) -> bool {
        self.supports_inline_data
    }
}

impl fmt::Display for CandidateModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.id)
    }
}

/// Highest-priority-first list of candidates
#[derive(Debug, Clone)]
pub struct CandidateRegistry {
    candidates: Arc<[CandidateModel]>,
}

impl CandidateRegistry {
    /// Create a registry; empty lists and duplicate ids are configuration errors
    pub fn new(candidates: Vec<CandidateModel>) -> Result<Self> {
        if candidates.is_empty() {
            return Err(AnalysisError::configuration(
                "candidate model registry is empty",
            ));
        }

        let mut seen = HashSet::new();
        for candidate in &candidates {
            if candidate.id.trim().is_empty() {
                return Err(AnalysisError::configuration("candidate model id is blank"));
            }
            if !seen.insert(candidate.id.as_str()) {
                return Err(AnalysisError::configuration(format!(
                    "candidate model listed twice: {}",
                    candidate.id
                )));
            }
        }

        Ok(Self {
            candidates: candidates.into(),
        })
    }

    /// Build from model ids, marking the given ids as text-only
    pub fn from_ids<S: AsRef<str>>(ids: &[S], text_only: &[S]) -> Result<Self> {
        let text_only: HashSet<&str> = text_only.iter().map(|id| id.as_ref()).collect();
        let candidates = ids
            .iter()
            .map(|id| id.as_ref())
            .map(|id| {
                if text_only.contains(id) {
                    CandidateModel::text_only(id)
                } else {
                    CandidateModel::new(id)
                }
            })
            .collect();
        Self::new(candidates)
    }

    pub fn get(&self, index: usize) -> Option<&CandidateModel> {
        self.candidates.get(index)
    }

    pub fn len(&self) -> usize {
        self.candidates.len()
    }

    /// Always false for a constructed registry
    pub fn is_empty(&self) -> bool {
        self.candidates.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &CandidateModel> {
        self.candidates.iter()
    }

    pub fn ids(&self) -> Vec<&str> {
        self.candidates.iter().map(CandidateModel::id).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::FailureKind;

    #[test]
    fn test_priority_order_is_kept() {
        let registry = CandidateRegistry::from_ids(&["a", "b", "c"], &["b"]).unwrap();

        assert_eq!(registry.ids(), vec!["a", "b", "c"]);
        assert!(registry.get(0).unwrap().supports_inline_data());
        assert!(!registry.get(1).unwrap().supports_inline_data());
        assert!(registry.get(3).is_none());
    }

    #[test]
    fn test_empty_registry_is_configuration_error() {
        let err = CandidateRegistry::new(Vec::new()).unwrap_err();
        assert_eq!(err.kind(), FailureKind::ConfigurationError);
    }

    #[test]
    fn test_duplicates_rejected() {
        let err = CandidateRegistry::from_ids(&["a", "a"], &[]).unwrap_err();
        assert!(err.to_string().contains("listed twice"));
    }

    #[test]
    fn test_clones_share_storage() {
        let registry = CandidateRegistry::from_ids(&["a"], &[]).unwrap();
        let clone = registry.clone();
        assert!(Arc::ptr_eq(&registry.candidates, &clone.candidates));
    }
}
