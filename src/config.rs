use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

/// How hard the genetic phase works after feasibility is established.
/// `none` stops after the feasibility solve.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum OptimizationLevel {
    #[default]
    None,
    Low,
    Medium,
    High,
}

/// Cooperative cancellation signal shared between a caller and a planning
/// run. Checked at phase boundaries: after the feasibility solve and
/// between genetic generations.
#[derive(Debug, Clone, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

/// Knobs for one planning run.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Wall-clock budget for the feasibility solver.
    pub solver_timeout: Duration,
    /// Master seed for the genetic phase. Fix it to make runs reproducible;
    /// leave `None` to draw a fresh seed per run.
    pub seed: Option<u64>,
    pub cancel: CancelFlag,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            solver_timeout: Duration::from_secs(30),
            seed: None,
            cancel: CancelFlag::new(),
        }
    }
}
