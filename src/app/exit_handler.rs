//! Exit code logic for the crawler process.
//!
//! Single responsibility: map per-item results to the process exit outcome.

use crate::ProcessExit;

/// Success only when every requested item succeeded.
pub(crate) fn determine_exit_outcome(succeeded: usize, total: usize) -> ProcessExit {
    if succeeded == total {
        ProcessExit::Success
    } else {
        ProcessExit::Failure
    }
}

#[cfg(test)]
mod tests {
    use super::determine_exit_outcome;
    use crate::ProcessExit;

    #[test]
    fn test_exit_outcome_success_when_all_succeeded() {
        assert_eq!(determine_exit_outcome(3, 3), ProcessExit::Success);
    }

    #[test]
    fn test_exit_outcome_failure_when_any_failed() {
        assert_eq!(determine_exit_outcome(2, 3), ProcessExit::Failure);
        assert_eq!(determine_exit_outcome(0, 1), ProcessExit::Failure);
    }
}
