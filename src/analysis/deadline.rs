//! Wall-clock budget for one analysis
//!
//! The pipeline has no suspension points, so the budget is checked between
//! stages: a stage that overruns is allowed to finish and the next check fails.

use std::time::{Duration, Instant};

use crate::error::AnalysisError;

/// Start time plus an optional limit
#[derive(Debug, Clone, Copy)]
pub struct Deadline {
    started: Instant,
    limit: Option<Duration>,
}

impl Deadline {
    /// Start the clock now
    pub fn start(limit: Option<Duration>) -> Self {
        Self {
            started: Instant::now(),
            limit,
        }
    }

    /// Time since [`Deadline::start`]
    pub fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }

    /// Fail with `Timeout` once the limit is reached
    ///
    /// `stage` names the step that just completed. A zero limit always fails.
    pub fn check(&self, stage: &str) -> Result<(), AnalysisError> {
        let Some(limit) = self.limit else {
            return Ok(());
        };
        let elapsed = self.elapsed();
        if elapsed >= limit {
            log::warn!(
                "Analysis budget of {:?} exhausted after {} ({:?} elapsed)",
                limit,
                stage,
                elapsed
            );
            return Err(AnalysisError::Timeout {
                elapsed_ms: elapsed.as_secs_f32() * 1000.0,
                limit_ms: limit.as_secs_f32() * 1000.0,
                stage: stage.to_string(),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_limit_never_expires() {
        assert!(Deadline::start(None).check("decode").is_ok());
    }

    #[test]
    fn test_zero_limit_expires() {
        let err = Deadline::start(Some(Duration::ZERO)).check("decode").unwrap_err();
        match err {
            AnalysisError::Timeout { stage, limit_ms, .. } => {
                assert_eq!(stage, "decode");
                assert_eq!(limit_ms, 0.0);
            }
            other => panic!("expected timeout, got {:?}", other),
        }
    }

    #[test]
    fn test_generous_limit_passes() {
        assert!(Deadline::start(Some(Duration::from_secs(3600))).check("features").is_ok());
    }
}
