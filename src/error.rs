//! Failure taxonomy of the query pipeline.
//!
//! External clients return [`anyhow::Result`]; the orchestrator tags each
//! failure with the stage it came from so the fallback log says which
//! dependency went away.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum PipelineError {
    /// Embedding provider could not be initialized or failed to embed.
    #[error("embedding failed: {0:#}")]
    Embedding(anyhow::Error),

    /// Vector index unreachable or rejected the query.
    #[error("vector search failed: {0:#}")]
    VectorSearch(anyhow::Error),

    /// Generative model call failed or returned nothing usable.
    #[error("generation failed: {0:#}")]
    Generation(anyhow::Error),

    /// Model text did not contain the structured payload we asked for.
    #[error("could not extract structured output: {0}")]
    Extraction(String),
}

pub type PipelineResult<T> = std::result::Result<T, PipelineError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_includes_stage_and_cause() {
        let err = PipelineError::Embedding(anyhow::anyhow!("connection refused"));
        assert_eq!(err.to_string(), "embedding failed: connection refused");

        let err = PipelineError::Extraction("no JSON array found".into());
        assert_eq!(
            err.to_string(),
            "could not extract structured output: no JSON array found"
        );
    }

    #[test]
    fn display_keeps_context_chain() {
        let inner = anyhow::anyhow!("HTTP 503").context("pinecone query");
        let err = PipelineError::VectorSearch(inner);
        assert_eq!(err.to_string(), "vector search failed: pinecone query: HTTP 503");
    }
}
