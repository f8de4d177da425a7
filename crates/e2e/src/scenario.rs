//! Scenario driver.
//!
//! A scenario is a named async check against live chains. The runner executes
//! scenarios in order and, depending on the [`FailurePolicy`], either keeps
//! going after a failure or stops at the first one.

use std::{fmt, time::Duration};

use async_trait::async_trait;
use sygma_client::ClientError;
use tokio::time::Instant;
use tracing::{error, info, warn};

use crate::{balance::ExpectationFailure, chains::ChainRole, config::ConfigError};

#[derive(Debug, thiserror::Error)]
pub enum ScenarioError {
    #[error("{}", join_failures(.0))]
    Expectations(Vec<ExpectationFailure>),

    #[error(transparent)]
    Client(#[from] ClientError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("no client connected for {0}")]
    NotConnected(ChainRole),

    /// Chain state that makes the scenario meaningless, e.g. a foreign MPC key.
    #[error("precondition failed: {0}")]
    Precondition(String),
}

impl ScenarioError {
    /// Turns an empty failure list into success.
    pub fn check(failures: Vec<ExpectationFailure>) -> Result<(), Self> {
        if failures.is_empty() { Ok(()) } else { Err(Self::Expectations(failures)) }
    }
}

fn join_failures(failures: &[ExpectationFailure]) -> String {
    failures.iter().map(ToString::to_string).collect::<Vec<_>>().join("; ")
}

#[async_trait]
pub trait Scenario: Send + Sync {
    fn name(&self) -> &str;

    async fn run(&self) -> Result<(), ScenarioError>;
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum FailurePolicy {
    /// Run everything and report all failures at the end.
    #[default]
    CollectAll,
    /// Stop after the first failing scenario.
    FailFast,
}

#[derive(Debug)]
pub struct ScenarioOutcome {
    pub name: String,
    pub elapsed: Duration,
    pub result: Result<(), ScenarioError>,
}

#[derive(Debug, Default)]
pub struct RunReport {
    pub outcomes: Vec<ScenarioOutcome>,
    /// Scenarios not started because an earlier one failed under `FailFast`.
    pub skipped: Vec<String>,
}

impl RunReport {
    pub fn passed(&self) -> impl Iterator<Item = &ScenarioOutcome> {
        self.outcomes.iter().filter(|o| o.result.is_ok())
    }

    pub fn failed(&self) -> impl Iterator<Item = &ScenarioOutcome> {
        self.outcomes.iter().filter(|o| o.result.is_err())
    }

    pub fn is_success(&self) -> bool {
        self.failed().next().is_none() && self.skipped.is_empty()
    }
}

impl fmt::Display for RunReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for outcome in &self.outcomes {
            match &outcome.result {
                Ok(()) => writeln!(f, "  PASS  {} ({:.1?})", outcome.name, outcome.elapsed)?,
                Err(err) => writeln!(f, "  FAIL  {}: {err}", outcome.name)?,
            }
        }
        for name in &self.skipped {
            writeln!(f, "  SKIP  {name}")?;
        }
        write!(
            f,
            "{} passed, {} failed, {} skipped",
            self.passed().count(),
            self.failed().count(),
            self.skipped.len()
        )
    }
}

#[derive(Default)]
pub struct ScenarioRunner {
    policy: FailurePolicy,
    scenarios: Vec<Box<dyn Scenario>>,
}

impl ScenarioRunner {
    pub fn new(policy: FailurePolicy) -> Self {
        Self { policy, scenarios: Vec::new() }
    }

    pub fn add(mut self, scenario: impl Scenario + 'static) -> Self {
        self.scenarios.push(Box::new(scenario));
        self
    }

    pub fn len(&self) -> usize {
        self.scenarios.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scenarios.is_empty()
    }

    pub async fn run(self) -> RunReport {
        let mut report = RunReport::default();
        let mut scenarios = self.scenarios.into_iter();

        for scenario in scenarios.by_ref() {
            let name = scenario.name().to_string();
            info!(scenario = %name, "Running scenario");

            let started = Instant::now();
            let result = scenario.run().await;
            let elapsed = started.elapsed();

            let failed = result.is_err();
            match &result {
                Ok(()) => info!(scenario = %name, ?elapsed, "Scenario passed"),
                Err(err) => error!(scenario = %name, error = %err, "Scenario failed"),
            }
            report.outcomes.push(ScenarioOutcome { name, elapsed, result });

            if failed && self.policy == FailurePolicy::FailFast {
                break;
            }
        }

        report.skipped = scenarios.map(|s| s.name().to_string()).collect();
        if !report.skipped.is_empty() {
            warn!(skipped = report.skipped.len(), "Stopped after first failure");
        }
        report
    }
}
