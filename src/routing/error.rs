use thiserror::Error;

/// Failure modes inside the engine. None of these escape the public entry
/// points; each one moves the pipeline to its next, weaker step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum RouteError {
    #[error("grid search exhausted after {iterations} iterations")]
    SearchExhausted { iterations: usize },
    #[error("no corridor connects the endpoints in the free-space graph")]
    NoCorridor,
    #[error("branch candidate lies outside routable space")]
    InvalidProjection,
    #[error("every relaxation stage failed")]
    TotalFailure,
}
