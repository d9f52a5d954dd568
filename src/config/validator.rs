use crate::config::Config;
use crate::error::{Result, StudyragError, ValidationError};

/// Configuration validator
pub struct ConfigValidator;

impl ConfigValidator {
    /// Validate the configuration, collecting every problem found
    pub fn validate(config: &Config) -> Result<()> {
        let mut errors = Vec::new();

        Self::validate_chunking(config, &mut errors);
        Self::validate_embedding(config, &mut errors);
        Self::validate_retrieval(config, &mut errors);

        if errors.is_empty() {
            Ok(())
        } else {
            Err(StudyragError::ConfigValidation { errors })
        }
    }

    fn validate_chunking(config: &Config, errors: &mut Vec<ValidationError>) {
        if config.chunking.chunk_size == 0 {
            errors.push(ValidationError::new(
                "chunking.chunk_size",
                "Chunk size must be greater than 0",
            ));
        }

        // The character-window fallback is what guarantees termination
        match config.chunking.separators.last() {
            None => errors.push(ValidationError::new(
                "chunking.separators",
                "At least one separator is required",
            )),
            Some(last) if !last.is_empty() => errors.push(ValidationError::new(
                "chunking.separators",
                "The last separator must be the empty string",
            )),
            Some(_) => {}
        }
    }

    fn validate_embedding(config: &Config, errors: &mut Vec<ValidationError>) {
        if config.embedding.model.trim().is_empty() {
            errors.push(ValidationError::new(
                "embedding.model",
                "Model name cannot be empty",
            ));
        }

        if config.embedding.batch_size == 0 {
            errors.push(ValidationError::new(
                "embedding.batch_size",
                "Batch size must be greater than 0",
            ));
        }
    }

    fn validate_retrieval(config: &Config, errors: &mut Vec<ValidationError>) {
        let retrieval = &config.retrieval;

        if !(0.0..=1.0).contains(&retrieval.alpha) {
            errors.push(ValidationError::new(
                "retrieval.alpha",
                format!("Alpha must be within [0, 1], got {}", retrieval.alpha),
            ));
        }

        if retrieval.rrf_k <= 0.0 || !retrieval.rrf_k.is_finite() {
            errors.push(ValidationError::new(
                "retrieval.rrf_k",
                "RRF constant must be a positive number",
            ));
        }

        for (path, value) in [
            ("retrieval.top_k", retrieval.top_k),
            ("retrieval.lexical_k", retrieval.lexical_k),
            ("retrieval.semantic_k", retrieval.semantic_k),
        ] {
            if value == 0 {
                errors.push(ValidationError::new(path, "Must be greater than 0"));
            }
        }

        if !(-1.0..=1.0).contains(&retrieval.semantic_threshold) {
            errors.push(ValidationError::new(
                "retrieval.semantic_threshold",
                "Cosine similarity threshold must be within [-1, 1]",
            ));
        }
    }
}
