//! Read-only chain state helpers.

use std::sync::Arc;

use subxt::{
    dynamic::Value,
    ext::scale_value::{At, Composite, ValueDef},
    utils::AccountId32,
};
use sygma_primitives::{Balance, DomainId, MpcAddress};
use tracing::debug;

use crate::{
    ClientError,
    backend::{ChainBackend, StorageQuery},
    metrics::SubmitterMetrics,
};

impl StorageQuery {
    pub fn system_account(account: &AccountId32) -> Self {
        Self::new("System", "Account", vec![Value::from_bytes(account.0)])
    }

    pub fn asset_account(asset: u32, account: &AccountId32) -> Self {
        Self::new(
            "Assets",
            "Account",
            vec![Value::u128(asset as u128), Value::from_bytes(account.0)],
        )
    }

    pub fn mpc_address() -> Self {
        Self::plain("SygmaBridge", "MpcAddr")
    }

    pub fn is_paused(domain: DomainId) -> Self {
        Self::new("SygmaBridge", "IsPaused", vec![domain.to_value()])
    }

    pub fn dest_domain(domain: DomainId) -> Self {
        Self::new("SygmaBridge", "DestDomainIds", vec![domain.to_value()])
    }

    pub fn deposit_count(domain: DomainId) -> Self {
        Self::new("SygmaBridge", "DepositCounts", vec![domain.to_value()])
    }
}

/// `System.Account` for one account.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct AccountInfo {
    pub nonce: u64,
    pub free: Balance,
    pub reserved: Balance,
    pub frozen: Balance,
}

/// `Assets.Account` for one `(asset, account)` pair.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct AssetAccount {
    pub balance: Balance,
}

#[derive(Clone)]
pub struct StateQuery {
    backend: Arc<dyn ChainBackend>,
    metrics: SubmitterMetrics,
}

impl StateQuery {
    pub fn new(backend: Arc<dyn ChainBackend>) -> Self {
        Self { backend, metrics: SubmitterMetrics }
    }

    /// Fetches any storage entry as a dynamic value.
    pub async fn fetch_raw(&self, query: &StorageQuery) -> Result<Option<Value>, ClientError> {
        self.metrics.record_query(&query.to_string());
        let value = self.backend.fetch_storage(query).await?;
        debug!(entry = %query, found = value.is_some(), "Fetched storage");
        Ok(value)
    }

    /// Account balances. Accounts the chain has never seen read as zero.
    pub async fn account_info(&self, account: &AccountId32) -> Result<AccountInfo, ClientError> {
        let query = StorageQuery::system_account(account);
        let Some(value) = self.fetch_raw(&query).await? else {
            return Ok(AccountInfo::default());
        };

        let what = query.to_string();
        let data = value.at("data");
        let frozen = data
            .and_then(|d| d.at("frozen"))
            .or_else(|| data.and_then(|d| d.at("misc_frozen")))
            .map(|v| number(v, &what))
            .transpose()?
            .unwrap_or_default();

        Ok(AccountInfo {
            nonce: small_number(field(Some(&value), "nonce", &what)?, &what)?,
            free: number(field(data, "free", &what)?, &what)?.into(),
            reserved: number(field(data, "reserved", &what)?, &what)?.into(),
            frozen: frozen.into(),
        })
    }

    pub async fn free_balance(&self, account: &AccountId32) -> Result<Balance, ClientError> {
        Ok(self.account_info(account).await?.free)
    }

    /// `None` when the account holds no balance of `asset`.
    pub async fn asset_balance(
        &self,
        asset: u32,
        account: &AccountId32,
    ) -> Result<Option<AssetAccount>, ClientError> {
        let query = StorageQuery::asset_account(asset, account);
        let Some(value) = self.fetch_raw(&query).await? else {
            return Ok(None);
        };
        let what = query.to_string();
        let balance = number(field(Some(&value), "balance", &what)?, &what)?;
        Ok(Some(AssetAccount { balance: balance.into() }))
    }

    /// The registered MPC address, `None` while unset.
    pub async fn mpc_address(&self) -> Result<Option<MpcAddress>, ClientError> {
        let query = StorageQuery::mpc_address();
        let Some(value) = self.fetch_raw(&query).await? else {
            return Ok(None);
        };
        let bytes = value_bytes(&value)
            .ok_or_else(|| ClientError::decode(query.to_string(), "not a byte array"))?;
        let bytes: [u8; 20] = bytes.try_into().map_err(|b: Vec<u8>| {
            ClientError::decode(query.to_string(), format!("{} bytes", b.len()))
        })?;

        if bytes == [0u8; 20] {
            return Ok(None);
        }
        Ok(Some(MpcAddress(bytes)))
    }

    pub async fn is_paused(&self, domain: DomainId) -> Result<bool, ClientError> {
        self.flag(&StorageQuery::is_paused(domain)).await
    }

    pub async fn is_domain_registered(&self, domain: DomainId) -> Result<bool, ClientError> {
        self.flag(&StorageQuery::dest_domain(domain)).await
    }

    pub async fn deposit_count(&self, domain: DomainId) -> Result<u64, ClientError> {
        let query = StorageQuery::deposit_count(domain);
        match self.fetch_raw(&query).await? {
            Some(value) => small_number(&value, &query.to_string()),
            None => Ok(0),
        }
    }

    async fn flag(&self, query: &StorageQuery) -> Result<bool, ClientError> {
        match self.fetch_raw(query).await? {
            Some(value) => value
                .as_bool()
                .ok_or_else(|| ClientError::decode(query.to_string(), "not a bool")),
            None => Ok(false),
        }
    }
}

fn field<'a>(value: Option<&'a Value>, name: &str, what: &str) -> Result<&'a Value, ClientError> {
    value
        .and_then(|v| v.at(name))
        .ok_or_else(|| ClientError::decode(what, format!("missing field `{name}`")))
}

fn number(value: &Value, what: &str) -> Result<u128, ClientError> {
    value.as_u128().ok_or_else(|| ClientError::decode(what, "not an unsigned integer"))
}

fn small_number(value: &Value, what: &str) -> Result<u64, ClientError> {
    let n = number(value, what)?;
    u64::try_from(n).map_err(|_| ClientError::decode(what, format!("{n} does not fit in u64")))
}

/// Unwraps newtype composites down to a sequence of bytes.
fn value_bytes(value: &Value) -> Option<Vec<u8>> {
    let ValueDef::Composite(composite) = &value.value else {
        return None;
    };
    let items: Vec<&Value> = match composite {
        Composite::Named(fields) => fields.iter().map(|(_, v)| v).collect(),
        Composite::Unnamed(values) => values.iter().collect(),
    };

    if let [inner] = items.as_slice() {
        if let Some(bytes) = value_bytes(inner) {
            return Some(bytes);
        }
    }

    items
        .iter()
        .map(|v| v.as_u128().and_then(|n| u8::try_from(n).ok()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::MockBackend;
    use subxt_signer::sr25519::dev;

    fn query(mock: &MockBackend) -> StateQuery {
        StateQuery::new(Arc::new(mock.clone()))
    }

    #[tokio::test]
    async fn unknown_account_reads_as_zero() {
        let mock = MockBackend::new();
        let bob = dev::bob().public_key().to_account_id();
        assert_eq!(query(&mock).account_info(&bob).await.unwrap(), AccountInfo::default());
    }

    #[tokio::test]
    async fn account_info_decodes_free_balance() {
        let mock = MockBackend::new();
        let alice = dev::alice().public_key().to_account_id();
        mock.with_ledger(|l| l.set_free(&alice, 1_000_000_000_000_000));

        let info = query(&mock).account_info(&alice).await.unwrap();
        assert_eq!(info.free, Balance::from(1_000_000_000_000_000u128));
        assert_eq!(info.reserved, Balance::ZERO);
    }

    #[tokio::test]
    async fn asset_balance_distinguishes_absent() {
        let mock = MockBackend::new();
        let alice = dev::alice().public_key().to_account_id();
        let q = query(&mock);
        assert_eq!(q.asset_balance(2000, &alice).await.unwrap(), None);

        mock.with_ledger(|l| l.set_asset_balance(2000, &alice, 100));
        assert_eq!(
            q.asset_balance(2000, &alice).await.unwrap(),
            Some(AssetAccount { balance: Balance::from(100u128) })
        );
        assert_eq!(q.asset_balance(2001, &alice).await.unwrap(), None);
    }

    #[tokio::test]
    async fn mpc_address_unwraps_newtype() {
        let mock = MockBackend::new();
        let q = query(&mock);
        assert_eq!(q.mpc_address().await.unwrap(), None);

        let addr: MpcAddress = "0x1c5541a79acc662ab2d2647f3b141a3b7cdb2ae4".parse().unwrap();
        mock.with_ledger(|l| l.set_mpc_address(addr));
        assert_eq!(q.mpc_address().await.unwrap(), Some(addr));
    }

    #[tokio::test]
    async fn bridge_flags_default_to_false() {
        let mock = MockBackend::new();
        let q = query(&mock);
        assert!(!q.is_paused(DomainId(1)).await.unwrap());
        assert!(!q.is_domain_registered(DomainId(1)).await.unwrap());
        assert_eq!(q.deposit_count(DomainId(1)).await.unwrap(), 0);

        mock.with_ledger(|l| {
            l.set_paused(DomainId(1), true);
            l.register_domain(DomainId(1));
            l.set(&StorageQuery::deposit_count(DomainId(1)), Value::u128(4));
        });
        assert!(q.is_paused(DomainId(1)).await.unwrap());
        assert!(!q.is_paused(DomainId(2)).await.unwrap());
        assert!(q.is_domain_registered(DomainId(1)).await.unwrap());
        assert_eq!(q.deposit_count(DomainId(1)).await.unwrap(), 4);
    }

    #[tokio::test]
    async fn malformed_values_are_decode_errors() {
        let mock = MockBackend::new();
        mock.with_ledger(|l| l.set(&StorageQuery::is_paused(DomainId(1)), Value::u128(1)));
        let err = query(&mock).is_paused(DomainId(1)).await.unwrap_err();
        assert!(matches!(err, ClientError::Decode { .. }));
    }

    #[tokio::test]
    async fn oversized_deposit_count_is_decode_error() {
        let mock = MockBackend::new();
        let count = u128::from(u64::MAX) + 1;
        mock.with_ledger(|l| {
            l.set(&StorageQuery::deposit_count(DomainId(1)), Value::u128(count));
        });

        let err = query(&mock).deposit_count(DomainId(1)).await.unwrap_err();
        assert!(matches!(err, ClientError::Decode { .. }));
    }
}
