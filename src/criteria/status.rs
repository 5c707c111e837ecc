//! Calculation status reported by stop criteria.

use std::fmt;

/// State of an iterative calculation as judged by a stop criterion.
///
/// A criterion starts out `Indeterminate`, and every successful status
/// determination moves it into one of the other variants until it is reset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum CalculationStatus {
    /// Nothing evaluated yet, or the criterion was reset.
    #[default]
    Indeterminate,
    /// Keep iterating.
    Running,
    /// The accuracy target was met.
    Converged,
    /// Numeric breakdown or divergence was detected.
    Failed,
    /// An external controller aborted the calculation.
    Cancelled,
    /// A resource limit (e.g. the iteration budget) was exhausted.
    StoppedWithoutConvergence,
}

impl CalculationStatus {
    /// True while the solver loop should keep going.
    pub fn is_running(self) -> bool {
        matches!(self, CalculationStatus::Indeterminate | CalculationStatus::Running)
    }

    /// True for every status that ends the calculation.
    pub fn is_terminal(self) -> bool {
        !self.is_running()
    }

    /// Rank used when several statuses are combined; higher wins.
    ///
    /// Failed/Cancelled > Converged > StoppedWithoutConvergence > Running > Indeterminate.
    pub fn precedence(self) -> u8 {
        match self {
            CalculationStatus::Indeterminate => 0,
            CalculationStatus::Running => 1,
            CalculationStatus::StoppedWithoutConvergence => 2,
            CalculationStatus::Converged => 3,
            CalculationStatus::Failed | CalculationStatus::Cancelled => 4,
        }
    }
}

impl fmt::Display for CalculationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            CalculationStatus::Indeterminate => "indeterminate",
            CalculationStatus::Running => "running",
            CalculationStatus::Converged => "converged",
            CalculationStatus::Failed => "failed",
            CalculationStatus::Cancelled => "cancelled",
            CalculationStatus::StoppedWithoutConvergence => "stopped without convergence",
        };
        f.write_str(s)
    }
}
