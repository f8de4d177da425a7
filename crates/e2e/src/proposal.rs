//! Proposal execution against the standalone node.

use async_trait::async_trait;
use subxt_signer::sr25519::Keypair;
use sygma_client::{ChainClient, Confirmation, SubmitOptions};
use sygma_primitives::{MpcAddress, RuntimeCall};
use tracing::info;

use crate::{
    ScenarioError,
    balance::{BalanceProbe, Check, Expectation, verify},
    config::{ConfigError, ProposalConfig},
    fixtures::{self, SignedProposal},
    scenario::Scenario,
};

/// Executes the fixture USDC and native proposals and checks the recipient
/// was credited.
pub struct ExecuteProposalScenario {
    client: ChainClient,
    signer: Keypair,
    mpc_address: MpcAddress,
    config: ProposalConfig,
}

impl ExecuteProposalScenario {
    pub fn new(
        client: ChainClient,
        signer: Keypair,
        mpc_address: Option<MpcAddress>,
        config: ProposalConfig,
    ) -> Result<Self, ConfigError> {
        let mpc_address = mpc_address.ok_or(ConfigError::Missing { field: "mpc_address" })?;
        Ok(Self { client, signer, mpc_address, config })
    }

    async fn ensure_mpc_address(&self) -> Result<(), ScenarioError> {
        let registered = self.client.query().mpc_address().await?;
        if registered != Some(self.mpc_address) {
            return Err(ScenarioError::Precondition(format!(
                "registered MPC address {} does not match {}",
                registered.map_or_else(|| "<unset>".to_string(), |a| a.to_string()),
                self.mpc_address
            )));
        }
        Ok(())
    }

    async fn execute(&self, signed: SignedProposal) -> Result<(), ScenarioError> {
        let call = RuntimeCall::ExecuteProposal {
            proposals: vec![signed.proposal],
            signature: signed.signature,
        };
        // Inclusion is enough: the balance reads below see the best block.
        let options = SubmitOptions {
            confirmation: Confirmation::InBlock,
            ..self.client.submitter().options()
        };
        let receipt = self.client.submitter().submit_with(&call, &self.signer, options).await?;
        info!(block = ?receipt.block_hash, "Proposal executed");
        Ok(())
    }
}

#[async_trait]
impl Scenario for ExecuteProposalScenario {
    fn name(&self) -> &str {
        "execute-proposal"
    }

    async fn run(&self) -> Result<(), ScenarioError> {
        self.ensure_mpc_address().await?;
        let recipient = &self.config.recipient;

        let usdc = BalanceProbe::new(self.client.query().clone()).asset(
            "recipient usdc",
            self.config.usdc_asset_id,
            recipient,
        );
        let before = usdc.snapshot().await?;
        self.execute(fixtures::usdc_proposal()).await?;
        let after = usdc.snapshot().await?;
        ScenarioError::check(verify(
            &before,
            &after,
            &[Check::new("recipient usdc", Expectation::Changed)],
        ))?;

        let native =
            BalanceProbe::new(self.client.query().clone()).native("recipient native", recipient);
        let before = native.snapshot().await?;
        self.execute(fixtures::native_proposal()).await?;
        let after = native.snapshot().await?;
        ScenarioError::check(verify(
            &before,
            &after,
            &[Check::new(
                "recipient native",
                Expectation::net(self.config.native_amount, self.config.execution_fee),
            )],
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use subxt_signer::sr25519::dev;
    use sygma_client::{
        ClientError, TxStatus,
        mock::{MockBackend, MockStep},
    };

    const MPC: &str = "0x1c5541a79acc662ab2d2647f3b141a3b7cdb2ae4";
    const START: u128 = 1_000_000_000_000_000;

    fn scenario(mock: &MockBackend) -> ExecuteProposalScenario {
        let client = ChainClient::new("pallet", Arc::new(mock.clone()), SubmitOptions::finalized());
        ExecuteProposalScenario::new(
            client,
            dev::alice(),
            Some(MPC.parse().unwrap()),
            ProposalConfig::default(),
        )
        .unwrap()
    }

    /// Credits the recipient the way the runtime does, charging `tx_fee` to
    /// the signer.
    fn runtime(mock: &MockBackend, usdc_credit: u128, native_credit: u128, tx_fee: u128) {
        let recipient = ProposalConfig::default().recipient;
        mock.with_ledger(|l| {
            l.set_mpc_address(MPC.parse().unwrap());
            l.set_free(&recipient, START);
        });
        mock.on_submit(move |call, signer, ledger| {
            let RuntimeCall::ExecuteProposal { proposals, .. } = call else {
                return;
            };
            ledger.debit_free(signer, tx_fee);
            if proposals[0].resource_id == fixtures::usdc_proposal().proposal.resource_id {
                ledger.credit_asset(2000, &recipient, usdc_credit);
            } else {
                ledger.credit_free(&recipient, native_credit);
            }
        });
    }

    #[tokio::test]
    async fn passes_when_balances_move_as_expected() {
        let mock = MockBackend::new();
        runtime(&mock, 100_000_000, 100_000_000, 293_974_317);

        scenario(&mock).run().await.unwrap();

        let submissions = mock.submissions();
        assert_eq!(submissions.len(), 2);
        assert!(submissions[1].nonce > submissions[0].nonce);
    }

    #[tokio::test]
    async fn proposals_resolve_at_inclusion() {
        let mock = MockBackend::new();
        runtime(&mock, 1, 100_000_000, 293_974_317);
        // A stream that never finalizes still completes the scenario.
        for _ in 0..2 {
            mock.script_next(vec![
                MockStep::Status(TxStatus::InBlock(MockBackend::block(1))),
                MockStep::Hang,
            ]);
        }
        scenario(&mock).run().await.unwrap();
        assert_eq!(mock.tx_unsubscribes(), 2);
    }

    #[tokio::test]
    async fn unchanged_usdc_balance_fails() {
        let mock = MockBackend::new();
        runtime(&mock, 0, 100_000_000, 293_974_317);

        let err = scenario(&mock).run().await.unwrap_err();
        let ScenarioError::Expectations(failures) = err else {
            panic!("unexpected error: {err}");
        };
        assert_eq!(failures[0].label, "recipient usdc");
        // The native proposal is never attempted.
        assert_eq!(mock.submissions().len(), 1);
    }

    #[tokio::test]
    async fn wrong_native_delta_fails() {
        let mock = MockBackend::new();
        runtime(&mock, 5, 100_000_000, 1);

        let err = scenario(&mock).run().await.unwrap_err();
        assert!(err.to_string().starts_with("recipient native: expected decrease by 193974317"));
    }

    #[tokio::test]
    async fn mpc_mismatch_is_fatal() {
        let mock = MockBackend::new();
        runtime(&mock, 1, 1, 0);
        mock.with_ledger(|l| l.set_mpc_address(MpcAddress([7u8; 20])));

        let err = scenario(&mock).run().await.unwrap_err();
        assert!(matches!(err, ScenarioError::Precondition(_)));
        assert!(mock.submissions().is_empty());
    }

    #[tokio::test]
    async fn rejected_proposal_is_a_client_error() {
        let mock = MockBackend::new();
        runtime(&mock, 1, 1, 0);
        mock.script_next(vec![MockStep::Status(TxStatus::Invalid("bad signature".into()))]);

        let err = scenario(&mock).run().await.unwrap_err();
        assert!(matches!(err, ScenarioError::Client(ClientError::Invalid(_))));
    }

    #[test]
    fn requires_an_mpc_address() {
        let client =
            ChainClient::new("pallet", Arc::new(MockBackend::new()), SubmitOptions::default());
        let result =
            ExecuteProposalScenario::new(client, dev::alice(), None, ProposalConfig::default());
        assert!(matches!(result, Err(ConfigError::Missing { field: "mpc_address" })));
    }
}
