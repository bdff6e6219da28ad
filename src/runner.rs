use std::time::Instant;

use async_trait::async_trait;
use serde::Serialize;
use tracing::{error, info, warn};

use crate::{CheckFailure, Fixture, Gate, ResourcePool};

/// Declaration of one case inside a suite.
#[derive(Clone, Copy, Debug)]
pub struct CaseDef {
    pub name: &'static str,
    pub tags: &'static [&'static str],
    pub gate: Gate,
}

impl CaseDef {
    pub fn matches_tags(&self, wanted: &[String]) -> bool {
        wanted.is_empty() || self.tags.iter().any(|t| wanted.iter().any(|w| w == t))
    }
}

/// A group of cases sharing set-up, in the manner of a test class.
#[async_trait]
pub trait Suite: Send {
    fn name(&self) -> &'static str;

    fn gate(&self) -> Gate {
        Gate::Always
    }

    fn cases(&self) -> &'static [CaseDef];

    fn fixture(&self) -> &Fixture;

    /// Runs once before the first case; resources added here live until the
    /// suite finishes.
    async fn set_up(&mut self, _resources: &mut ResourcePool) -> Result<(), CheckFailure> {
        Ok(())
    }

    async fn run_case(
        &mut self,
        case: &str,
        resources: &mut ResourcePool,
    ) -> Result<(), CheckFailure>;
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum Outcome {
    Passed,
    Failed { message: String },
    Skipped { reason: String },
}

#[derive(Clone, Debug, Serialize)]
pub struct CaseReport {
    pub case: &'static str,
    #[serde(flatten)]
    pub outcome: Outcome,
    pub elapsed_ms: u128,
}

#[derive(Clone, Debug, Serialize)]
pub struct SuiteReport {
    pub suite: &'static str,
    pub cases: Vec<CaseReport>,
    pub cleanup_failures: usize,
}

impl SuiteReport {
    pub fn passed(&self) -> usize {
        self.count(|o| matches!(o, Outcome::Passed))
    }

    pub fn failed(&self) -> usize {
        self.count(|o| matches!(o, Outcome::Failed { .. }))
    }

    pub fn skipped(&self) -> usize {
        self.count(|o| matches!(o, Outcome::Skipped { .. }))
    }

    pub fn outcome_of(&self, case: &str) -> Option<&Outcome> {
        self.cases.iter().find(|c| c.case == case).map(|c| &c.outcome)
    }

    fn count(&self, pred: impl Fn(&Outcome) -> bool) -> usize {
        self.cases.iter().filter(|c| pred(&c.outcome)).count()
    }
}

#[derive(Clone, Debug, Default)]
pub struct RunOptions {
    /// Only cases carrying one of these tags run; empty selects all.
    pub tags: Vec<String>,
}

/// Runs every selected case of `suite` in declaration order.
pub async fn run_suite(suite: &mut dyn Suite, opts: &RunOptions) -> SuiteReport {
    let name = suite.name();
    let selected: Vec<CaseDef> = suite
        .cases()
        .iter()
        .filter(|c| c.matches_tags(&opts.tags))
        .copied()
        .collect();
    let capabilities = suite.fixture().config.capabilities;

    if let Some(reason) = suite.gate().skip_reason(&capabilities) {
        warn!(suite = name, %reason, "suite skipped");
        return SuiteReport {
            suite: name,
            cases: selected
                .iter()
                .map(|c| skipped(c.name, reason.clone()))
                .collect(),
            cleanup_failures: 0,
        };
    }

    if selected.is_empty() {
        return SuiteReport {
            suite: name,
            cases: Vec::new(),
            cleanup_failures: 0,
        };
    }

    let mut suite_resources = suite.fixture().resource_pool();
    if let Err(err) = suite.set_up(&mut suite_resources).await {
        error!(suite = name, error = %err, "suite set-up failed");
        let message = format!("set-up failed: {err}");
        let cleanup_failures = suite_resources.release().await;
        return SuiteReport {
            suite: name,
            cases: selected
                .iter()
                .map(|c| CaseReport {
                    case: c.name,
                    outcome: Outcome::Failed {
                        message: message.clone(),
                    },
                    elapsed_ms: 0,
                })
                .collect(),
            cleanup_failures,
        };
    }

    let mut cases = Vec::with_capacity(selected.len());
    let mut cleanup_failures = 0;
    for case in &selected {
        if let Some(reason) = case.gate.skip_reason(&capabilities) {
            warn!(suite = name, case = case.name, %reason, "case skipped");
            cases.push(skipped(case.name, reason));
            continue;
        }

        let started = Instant::now();
        let mut resources = suite.fixture().resource_pool();
        let outcome = match suite.run_case(case.name, &mut resources).await {
            Ok(()) => {
                info!(suite = name, case = case.name, "case passed");
                Outcome::Passed
            }
            Err(err) => {
                error!(suite = name, case = case.name, error = %err, "case failed");
                Outcome::Failed {
                    message: err.to_string(),
                }
            }
        };
        cleanup_failures += resources.release().await;
        cases.push(CaseReport {
            case: case.name,
            outcome,
            elapsed_ms: started.elapsed().as_millis(),
        });
    }

    cleanup_failures += suite_resources.release().await;
    SuiteReport {
        suite: name,
        cases,
        cleanup_failures,
    }
}

fn skipped(case: &'static str, reason: String) -> CaseReport {
    CaseReport {
        case,
        outcome: Outcome::Skipped { reason },
        elapsed_ms: 0,
    }
}
