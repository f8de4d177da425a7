//! Before/after balance assertions.

use std::{collections::BTreeMap, fmt};

use subxt::utils::AccountId32;
use sygma_client::{ClientError, StateQuery};
use sygma_primitives::Balance;
use tracing::info;

/// What a probe reads for one label.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Holding {
    /// Free native balance.
    Native(AccountId32),
    /// `pallet-assets` balance; an account without one reads as zero.
    Asset { asset: u32, account: AccountId32 },
}

/// A set of labelled balances read together.
#[derive(Clone)]
pub struct BalanceProbe {
    query: StateQuery,
    tracked: Vec<(String, Holding)>,
}

impl BalanceProbe {
    pub fn new(query: StateQuery) -> Self {
        Self { query, tracked: Vec::new() }
    }

    pub fn native(mut self, label: impl Into<String>, account: &AccountId32) -> Self {
        self.tracked.push((label.into(), Holding::Native(account.clone())));
        self
    }

    pub fn asset(mut self, label: impl Into<String>, asset: u32, account: &AccountId32) -> Self {
        self.tracked
            .push((label.into(), Holding::Asset { asset, account: account.clone() }));
        self
    }

    pub async fn snapshot(&self) -> Result<Snapshot, ClientError> {
        let mut balances = BTreeMap::new();
        for (label, holding) in &self.tracked {
            let balance = match holding {
                Holding::Native(account) => self.query.free_balance(account).await?,
                Holding::Asset { asset, account } => self
                    .query
                    .asset_balance(*asset, account)
                    .await?
                    .map(|a| a.balance)
                    .unwrap_or_default(),
            };
            info!(%label, %balance, "Balance");
            balances.insert(label.clone(), balance);
        }
        Ok(Snapshot { balances })
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Snapshot {
    balances: BTreeMap<String, Balance>,
}

impl Snapshot {
    pub fn get(&self, label: &str) -> Option<Balance> {
        self.balances.get(label).copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, Balance)> {
        self.balances.iter().map(|(label, balance)| (label.as_str(), *balance))
    }
}

impl FromIterator<(String, Balance)> for Snapshot {
    fn from_iter<T: IntoIterator<Item = (String, Balance)>>(iter: T) -> Self {
        Self { balances: iter.into_iter().collect() }
    }
}

/// Expected movement of one balance between two snapshots.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Expectation {
    Decreased(Balance),
    Increased(Balance),
    /// Decreased by strictly more than the amount, e.g. a transfer plus fees.
    DecreasedMoreThan(Balance),
    Changed,
}

impl Expectation {
    /// Net effect of receiving `credit` while paying `debit`.
    pub fn net(credit: Balance, debit: Balance) -> Self {
        match credit.checked_sub(debit) {
            Some(gain) => Self::Increased(gain),
            None => Self::Decreased(debit.saturating_sub(credit)),
        }
    }

    pub fn holds(&self, before: Balance, after: Balance) -> bool {
        match *self {
            Self::Decreased(by) => before.checked_sub(after) == Some(by),
            Self::Increased(by) => after.checked_sub(before) == Some(by),
            Self::DecreasedMoreThan(by) => before.checked_sub(after).is_some_and(|d| d > by),
            Self::Changed => before != after,
        }
    }
}

impl fmt::Display for Expectation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Decreased(by) => write!(f, "decrease by {by}"),
            Self::Increased(by) => write!(f, "increase by {by}"),
            Self::DecreasedMoreThan(by) => write!(f, "decrease by more than {by}"),
            Self::Changed => write!(f, "change"),
        }
    }
}

/// A labelled expectation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Check {
    pub label: String,
    pub expectation: Expectation,
}

impl Check {
    pub fn new(label: impl Into<String>, expectation: Expectation) -> Self {
        Self { label: label.into(), expectation }
    }
}

/// A check that did not hold.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ExpectationFailure {
    pub label: String,
    pub expectation: Expectation,
    pub before: Option<Balance>,
    pub after: Option<Balance>,
}

impl fmt::Display for ExpectationFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let show = |b: Option<Balance>| b.map_or_else(|| "missing".to_string(), |b| b.to_string());
        write!(
            f,
            "{}: expected {}, before {} after {}",
            self.label,
            self.expectation,
            show(self.before),
            show(self.after)
        )
    }
}

/// Evaluates every check; labels absent from either snapshot fail.
pub fn verify(before: &Snapshot, after: &Snapshot, checks: &[Check]) -> Vec<ExpectationFailure> {
    checks
        .iter()
        .filter_map(|check| {
            let (b, a) = (before.get(&check.label), after.get(&check.label));
            let held = matches!((b, a), (Some(b), Some(a)) if check.expectation.holds(b, a));
            (!held).then(|| ExpectationFailure {
                label: check.label.clone(),
                expectation: check.expectation,
                before: b,
                after: a,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use sygma_client::mock::MockBackend;
    use test_case::test_case;

    fn b(n: u128) -> Balance {
        Balance::from(n)
    }

    #[test_case(Expectation::Decreased(b(10)), 100, 90, true ; "exact decrease")]
    #[test_case(Expectation::Decreased(b(10)), 100, 89, false ; "decrease too large")]
    #[test_case(Expectation::Increased(b(10)), 100, 110, true ; "exact increase")]
    #[test_case(Expectation::Increased(b(10)), 100, 90, false ; "wrong direction")]
    #[test_case(Expectation::DecreasedMoreThan(b(10)), 100, 89, true ; "more than")]
    #[test_case(Expectation::DecreasedMoreThan(b(10)), 100, 90, false ; "boundary is not more")]
    #[test_case(Expectation::Changed, 100, 100, false ; "unchanged")]
    #[test_case(Expectation::Changed, 0, 1, true ; "changed")]
    fn expectation_semantics(expectation: Expectation, before: u128, after: u128, holds: bool) {
        assert_eq!(expectation.holds(b(before), b(after)), holds);
    }

    #[test]
    fn net_expectation_picks_direction() {
        assert_eq!(
            Expectation::net(b(100_000_000), b(293_974_317)),
            Expectation::Decreased(b(193_974_317))
        );
        assert_eq!(Expectation::net(b(10), b(3)), Expectation::Increased(b(7)));
        assert_eq!(Expectation::net(b(5), b(5)), Expectation::Increased(Balance::ZERO));
    }

    #[test]
    fn verify_reports_each_failure() {
        let before: Snapshot =
            [("alice".to_string(), b(100)), ("reserve".to_string(), b(0))].into_iter().collect();
        let after: Snapshot =
            [("alice".to_string(), b(80)), ("reserve".to_string(), b(15))].into_iter().collect();

        let failures = verify(
            &before,
            &after,
            &[
                Check::new("alice", Expectation::DecreasedMoreThan(b(10))),
                Check::new("reserve", Expectation::Increased(b(20))),
                Check::new("fee", Expectation::Changed),
            ],
        );

        assert_eq!(failures.len(), 2);
        assert_eq!(failures[0].label, "reserve");
        assert_eq!(failures[0].to_string(), "reserve: expected increase by 20, before 0 after 15");
        assert_eq!(failures[1].before, None);
        assert!(failures[1].to_string().contains("missing"));
    }

    #[tokio::test]
    async fn snapshot_reads_native_and_asset_balances() {
        let mock = MockBackend::new();
        let alice: AccountId32 =
            "5GrwvaEF5zXb26Fz9rcQpDWS57CtERHpNehXCPcNoHGKutQY".parse().unwrap();
        mock.with_ledger(|l| {
            l.set_free(&alice, 1_000);
            l.set_asset_balance(2000, &alice, 42);
        });

        let probe = BalanceProbe::new(StateQuery::new(Arc::new(mock.clone())))
            .native("alice", &alice)
            .asset("alice usdc", 2000, &alice)
            .asset("alice erc20", 2001, &alice);
        let snapshot = probe.snapshot().await.unwrap();

        assert_eq!(snapshot.get("alice"), Some(b(1_000)));
        assert_eq!(snapshot.get("alice usdc"), Some(b(42)));
        assert_eq!(snapshot.get("alice erc20"), Some(Balance::ZERO));
        assert_eq!(snapshot.iter().count(), 3);
    }
}
