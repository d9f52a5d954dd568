//! Reciprocal Rank Fusion algorithm for combining ranked lists

use ahash::AHashMap;
use thiserror::Error;
use tracing::warn;

/// Smoothing constant for RRF contributions
pub const DEFAULT_RRF_K: f32 = 60.0;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum FusionError {
    #[error("Invalid alpha {0}: must be within [0, 1]")]
    InvalidAlpha(f32),

    #[error("Invalid RRF constant {0}: must be positive and finite")]
    InvalidK(f32),
}

/// Configuration for fusion algorithm
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FusionConfig {
    /// RRF K constant (typically 60)
    pub rrf_k: f32,

    /// Weight of the semantic list; the lexical list gets `1 - alpha`
    pub alpha: f32,
}

impl FusionConfig {
    pub fn new(rrf_k: f32, alpha: f32) -> Result<Self, FusionError> {
        if !(rrf_k.is_finite() && rrf_k > 0.0) {
            return Err(FusionError::InvalidK(rrf_k));
        }
        if !(0.0..=1.0).contains(&alpha) {
            return Err(FusionError::InvalidAlpha(alpha));
        }

        Ok(Self { rrf_k, alpha })
    }

    /// Like [`FusionConfig::new`] but never fails
    ///
    /// Out-of-range alpha is clamped into [0, 1]; a NaN alpha becomes 0.5 and
    /// an unusable K falls back to [`DEFAULT_RRF_K`].
    pub fn clamped(rrf_k: f32, alpha: f32) -> Self {
        let rrf_k = if rrf_k.is_finite() && rrf_k > 0.0 {
            rrf_k
        } else {
            warn!("RRF constant {} unusable; using {}", rrf_k, DEFAULT_RRF_K);
            DEFAULT_RRF_K
        };

        let clamped_alpha = if alpha.is_nan() { 0.5 } else { alpha.clamp(0.0, 1.0) };
        if clamped_alpha != alpha {
            warn!("alpha {} outside [0, 1]; using {}", alpha, clamped_alpha);
        }

        Self {
            rrf_k,
            alpha: clamped_alpha,
        }
    }
}

impl Default for FusionConfig {
    fn default() -> Self {
        Self {
            rrf_k: DEFAULT_RRF_K,
            alpha: 0.5,
        }
    }
}

/// One fused entry with the contribution from each list
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FusedEntry {
    pub id: usize,
    pub score: f32,
    pub lexical_rrf: f32,
    pub semantic_rrf: f32,
    /// 1-based rank in the lexical list, if present
    pub lexical_rank: Option<usize>,
    /// 1-based rank in the semantic list, if present
    pub semantic_rank: Option<usize>,
}

impl FusedEntry {
    fn new(id: usize) -> Self {
        Self {
            id,
            score: 0.0,
            lexical_rrf: 0.0,
            semantic_rrf: 0.0,
            lexical_rank: None,
            semantic_rank: None,
        }
    }
}

/// Apply Reciprocal Rank Fusion to combine two ranked lists
///
/// RRF formula: each list contributes 1 / (k + rank) for rank starting at 1,
/// and the fused score is `alpha * semantic + (1 - alpha) * lexical`.
///
/// # Arguments
/// * `lexical` - ids ranked by the lexical retriever, best first
/// * `semantic` - ids ranked by the semantic retriever, best first
/// * `config` - Fusion configuration
///
/// # Returns
/// Entries with a nonzero fused score, sorted descending. Ties keep the
/// order ids were first seen: the lexical list, then semantic-only ids.
/// If an id repeats within one list, its first (best) rank counts.
pub fn reciprocal_rank_fusion(
    lexical: &[usize],
    semantic: &[usize],
    config: &FusionConfig,
) -> Vec<FusedEntry> {
    let mut entries: Vec<FusedEntry> = Vec::with_capacity(lexical.len() + semantic.len());
    let mut slots: AHashMap<usize, usize> = AHashMap::with_capacity(entries.capacity());

    for (position, &id) in lexical.iter().enumerate() {
        let slot = *slots.entry(id).or_insert_with(|| {
            entries.push(FusedEntry::new(id));
            entries.len() - 1
        });
        let entry = &mut entries[slot];
        if entry.lexical_rank.is_none() {
            entry.lexical_rank = Some(position + 1);
            entry.lexical_rrf = 1.0 / (config.rrf_k + (position + 1) as f32);
        }
    }

    for (position, &id) in semantic.iter().enumerate() {
        let slot = *slots.entry(id).or_insert_with(|| {
            entries.push(FusedEntry::new(id));
            entries.len() - 1
        });
        let entry = &mut entries[slot];
        if entry.semantic_rank.is_none() {
            entry.semantic_rank = Some(position + 1);
            entry.semantic_rrf = 1.0 / (config.rrf_k + (position + 1) as f32);
        }
    }

    for entry in &mut entries {
        entry.score = config.alpha * entry.semantic_rrf + (1.0 - config.alpha) * entry.lexical_rrf;
    }

    entries.retain(|entry| entry.score > 0.0);
    // Stable sort: equal scores stay in first-seen order
    entries.sort_by(|a, b| b.score.total_cmp(&a.score));

    entries
}
