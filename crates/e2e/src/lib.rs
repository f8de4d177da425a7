//! End-to-end checks for the Sygma substrate pallets.
//!
//! Setup plans prepare a fresh network, scenarios submit bridge extrinsics and
//! assert on the balance movements they cause. Both are driven entirely by an
//! [`E2eConfig`].

pub mod balance;
pub mod chains;
pub mod config;
pub mod fixtures;
pub mod proposal;
pub mod scenario;
pub mod setup;
pub mod xcm;

pub use balance::{BalanceProbe, Check, Expectation, ExpectationFailure, Snapshot};
pub use chains::{ChainRole, Chains};
pub use config::{ConfigError, E2eConfig};
pub use proposal::ExecuteProposalScenario;
pub use scenario::{FailurePolicy, RunReport, Scenario, ScenarioError, ScenarioRunner};
pub use setup::{SetupPlan, SetupReport};
pub use xcm::{AssetDepositScenario, AssetHubDepositScenario, Deposit, NativeDepositScenario};
