//! Harness configuration.
//!
//! Everything a run needs besides the signer's secret lives here: node
//! endpoints, reserve accounts, domains, fee settings, test assets and the
//! scenario parameters. Every section has a default matching the local
//! docker setup, so an empty file is a valid configuration.

use std::{
    path::{Path, PathBuf},
    str::FromStr,
    time::Duration,
};

use serde::{Deserialize, Serialize};
use subxt::utils::AccountId32;
use subxt_signer::{SecretUri, sr25519::Keypair};
use sygma_client::{Confirmation, SubmitOptions};
use sygma_primitives::{
    Balance, DomainId, FeeHandlerType, MpcAddress, PrimitivesError, types::decode_hex,
    xcm::MultiLocation,
};

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config {path:?}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("invalid signer uri: {0}")]
    Signer(String),

    #[error("{field} is not configured")]
    Missing { field: &'static str },

    #[error(transparent)]
    Primitives(#[from] PrimitivesError),

    #[error("{0}")]
    Invalid(String),
}

/// Top-level harness configuration, loaded from TOML.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct E2eConfig {
    pub endpoints: Endpoints,
    /// Secret URI of the admin account, `//Alice` on dev chains.
    pub sudo_uri: String,
    /// Registered by setup and checked before executing proposals.
    pub mpc_address: Option<MpcAddress>,
    pub submit: SubmitConfig,
    pub accounts: ReserveAccounts,
    pub fees: FeeConfig,
    pub standalone: StandaloneConfig,
    pub bridge_hub: BridgeHubConfig,
    pub proposal: ProposalConfig,
    pub xcm: XcmConfig,
}

impl Default for E2eConfig {
    fn default() -> Self {
        Self {
            endpoints: Endpoints::default(),
            sudo_uri: default_values::SUDO_URI.to_string(),
            mpc_address: Some(default_values::mpc_address()),
            submit: SubmitConfig::default(),
            accounts: ReserveAccounts::default(),
            fees: FeeConfig::default(),
            standalone: StandaloneConfig::default(),
            bridge_hub: BridgeHubConfig::default(),
            proposal: ProposalConfig::default(),
            xcm: XcmConfig::default(),
        }
    }
}

impl E2eConfig {
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .map_err(|source| ConfigError::Io { path: path.to_path_buf(), source })?;
        let config: Self = toml::from_str(&content)
            .map_err(|source| ConfigError::Parse { path: path.to_path_buf(), source })?;
        config.validate()?;
        Ok(config)
    }

    /// The configuration of the local docker network.
    pub fn default_local() -> Self {
        Self::default()
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.fees.handler == FeeHandlerType::DynamicFeeHandler {
            return Err(ConfigError::Invalid(
                "the dynamic fee handler cannot be configured by setup".into(),
            ));
        }
        if self.fees.lower_bound > self.fees.upper_bound {
            return Err(ConfigError::Invalid(format!(
                "fee lower bound {} exceeds upper bound {}",
                self.fees.lower_bound, self.fees.upper_bound
            )));
        }
        if self.standalone.domains.is_empty() || self.bridge_hub.domains.is_empty() {
            return Err(ConfigError::Invalid("at least one domain is required".into()));
        }
        for asset in self.standalone.assets.iter().chain([&self.bridge_hub.usdc]) {
            asset.location(0)?;
        }
        self.xcm.recipient_bytes()?;
        Ok(())
    }

    pub fn signer(&self) -> Result<Keypair, ConfigError> {
        let uri =
            SecretUri::from_str(&self.sudo_uri).map_err(|e| ConfigError::Signer(e.to_string()))?;
        Keypair::from_uri(&uri).map_err(|e| ConfigError::Signer(e.to_string()))
    }

    pub fn submit_options(&self) -> SubmitOptions {
        SubmitOptions {
            confirmation: self.submit.confirmation,
            timeout: self.submit.timeout_secs.map(Duration::from_secs),
        }
    }
}

/// WebSocket endpoints of the nodes under test.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Endpoints {
    /// Standalone node running the sygma pallets.
    pub pallet: String,
    /// Only reported by `status`; no scenario submits to the relay chain.
    pub relay_chain: Option<String>,
    pub asset_hub: String,
    pub bridge_hub: String,
}

impl Default for Endpoints {
    fn default() -> Self {
        Self {
            pallet: "ws://127.0.0.1:9944".to_string(),
            relay_chain: None,
            asset_hub: "ws://127.0.0.1:9910".to_string(),
            bridge_hub: "ws://127.0.0.1:8943".to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SubmitConfig {
    pub confirmation: Confirmation,
    /// Unset waits for a terminal status forever.
    pub timeout_secs: Option<u64>,
}

/// Pallet-derived accounts that hold bridged funds and collected fees.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReserveAccounts {
    pub fee_reserve: AccountId32,
    pub native_reserve: AccountId32,
    pub other_reserve: AccountId32,
}

impl Default for ReserveAccounts {
    fn default() -> Self {
        Self {
            fee_reserve: default_values::account(default_values::FEE_RESERVE),
            native_reserve: default_values::account(default_values::NATIVE_RESERVE),
            other_reserve: default_values::account(default_values::OTHER_RESERVE),
        }
    }
}

/// Fee handler attached to every `(domain, asset)` pair during setup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FeeConfig {
    pub handler: FeeHandlerType,
    /// Flat fee charged by the basic handler.
    pub basic_fee: Balance,
    /// Basis points, percentage handler only.
    pub rate: u32,
    pub lower_bound: Balance,
    pub upper_bound: Balance,
}

impl Default for FeeConfig {
    fn default() -> Self {
        Self {
            handler: FeeHandlerType::PercentageFeeHandler,
            basic_fee: Balance::pow10(12),
            rate: 500,
            lower_bound: Balance::ZERO,
            upper_bound: Balance::pow10(12).times(1000),
        }
    }
}

impl FeeConfig {
    /// The fee the configured handler charges on `amount`. The dynamic
    /// handler prices fees off-chain, so there is nothing to compute locally.
    pub fn fee_for(&self, amount: Balance) -> Option<Balance> {
        match self.handler {
            FeeHandlerType::BasicFeeHandler => Some(self.basic_fee),
            FeeHandlerType::PercentageFeeHandler => {
                Some(amount.bps(self.rate).clamp(self.lower_bound, self.upper_bound))
            }
            FeeHandlerType::DynamicFeeHandler => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DomainConfig {
    pub id: DomainId,
    pub chain_id: u64,
}

/// A pallet-assets token created by setup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssetConfig {
    pub id: u32,
    pub name: String,
    pub symbol: String,
    pub decimals: u8,
    #[serde(default = "default_values::min_balance")]
    pub min_balance: u128,
}

impl AssetConfig {
    fn new(id: u32, name: &str, symbol: &str, decimals: u8) -> Self {
        Self {
            id,
            name: name.to_string(),
            symbol: symbol.to_string(),
            decimals,
            min_balance: default_values::min_balance(),
        }
    }

    pub fn usdc() -> Self {
        Self::new(2000, "USDC test asset", "USDC", 12)
    }

    pub fn erc20tst() -> Self {
        Self::new(2001, "erc20tst test asset", "ERC20TST", 18)
    }

    pub fn erc20tstd20() -> Self {
        Self::new(2002, "erc20tstd20 test asset", "ERC20TSTD20", 20)
    }

    /// XCM location of the token, keyed by its lower-case symbol under `para`.
    pub fn location(&self, para: u32) -> Result<MultiLocation, PrimitivesError> {
        MultiLocation::sygma_token(para, &self.symbol.to_lowercase())
    }

    /// `n` whole tokens in base units.
    pub fn units(&self, n: u64) -> Balance {
        Balance::pow10(self.decimals as usize).times(n)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StandaloneConfig {
    /// Parachain id the runtime's token locations are rooted at.
    pub para_id: u32,
    pub domains: Vec<DomainConfig>,
    pub assets: Vec<AssetConfig>,
    /// Free balance given to every reserve account.
    pub reserve_balance: Balance,
    /// Whole tokens minted to the admin account per asset.
    pub admin_mint: u64,
    /// Base units of every asset minted to the other-token reserve.
    pub reserve_mint: Balance,
}

impl Default for StandaloneConfig {
    fn default() -> Self {
        Self {
            para_id: 2004,
            domains: vec![
                DomainConfig { id: DomainId(1), chain_id: 1 },
                DomainConfig { id: DomainId(2), chain_id: 2 },
            ],
            assets: vec![AssetConfig::usdc(), AssetConfig::erc20tst(), AssetConfig::erc20tstd20()],
            reserve_balance: Balance::pow10(12).times(10_000),
            admin_mint: 100,
            reserve_mint: Balance::pow10(12).times(100),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BridgeHubConfig {
    pub para_id: u32,
    pub domains: Vec<DomainConfig>,
    pub usdc: AssetConfig,
    pub reserve_balance: Balance,
    pub admin_mint: u64,
    /// Seeded into the reserves so their asset accounts exist before deposits.
    pub reserve_mint: Balance,
}

impl Default for BridgeHubConfig {
    fn default() -> Self {
        Self {
            para_id: 2005,
            domains: vec![DomainConfig { id: DomainId(1), chain_id: 1 }],
            usdc: AssetConfig::usdc(),
            reserve_balance: Balance::pow10(12).times(10_000),
            admin_mint: 100,
            reserve_mint: Balance::pow10(12),
        }
    }
}

/// Parameters of the proposal execution scenario.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProposalConfig {
    pub usdc_asset_id: u32,
    /// Account credited by both fixture proposals.
    pub recipient: AccountId32,
    /// Native amount carried by the native proposal.
    pub native_amount: Balance,
    /// Deducted from the native amount when the proposal executes.
    pub execution_fee: Balance,
}

impl Default for ProposalConfig {
    fn default() -> Self {
        Self {
            usdc_asset_id: 2000,
            recipient: default_values::account(default_values::ALICE),
            native_amount: Balance::from(100_000_000u64),
            execution_fee: Balance::from(293_974_317u64),
        }
    }
}

/// Parameters of the XCM deposit scenarios.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct XcmConfig {
    pub deposit_amount: Balance,
    pub dest_domain: DomainId,
    /// 20-byte EVM recipient on the destination domain.
    pub recipient: String,
    /// Also submit the asset hub native deposit, which has no assertions.
    pub asset_hub_deposit: bool,
}

impl Default for XcmConfig {
    fn default() -> Self {
        Self {
            deposit_amount: Balance::pow10(13),
            dest_domain: DomainId(1),
            recipient: "0x1abd6948e422a1b6ced1ba28ba72ca562333df01".to_string(),
            asset_hub_deposit: false,
        }
    }
}

impl XcmConfig {
    pub fn recipient_bytes(&self) -> Result<[u8; 20], ConfigError> {
        let bytes = decode_hex(&self.recipient)?;
        bytes.try_into().map_err(|b: Vec<u8>| {
            ConfigError::Invalid(format!("xcm recipient is {} bytes, expected 20", b.len()))
        })
    }

    pub fn destination(&self) -> Result<MultiLocation, ConfigError> {
        Ok(MultiLocation::deposit_dest(self.dest_domain, self.recipient_bytes()?)?)
    }
}

mod default_values {
    use super::*;

    pub(super) const SUDO_URI: &str = "//Alice";
    pub(super) const ALICE: &str = "5GrwvaEF5zXb26Fz9rcQpDWS57CtERHpNehXCPcNoHGKutQY";
    pub(super) const FEE_RESERVE: &str = "5ELLU7ibt5ZrNEYRwohtaRBDBa3TzcWwwPELBPSWWd2mbgv3";
    pub(super) const NATIVE_RESERVE: &str = "5EYCAe5jLbHcAAMKvLFSXgCTbPrLgBJusvPwfKcaKzuf5X5e";
    pub(super) const OTHER_RESERVE: &str = "5EYCAe5jLbHcAAMKvLFiGhk3htXY8jQncbLTDGJQnpnPMAVp";

    pub(super) fn mpc_address() -> MpcAddress {
        MpcAddress([
            0x1c, 0x55, 0x41, 0xa7, 0x9a, 0xcc, 0x66, 0x2a, 0xb2, 0xd2, 0x64, 0x7f, 0x3b, 0x14,
            0x1a, 0x3b, 0x7c, 0xdb, 0x2a, 0xe4,
        ])
    }

    /// Parses a compile-time SS58 constant. Falls back to the zero account,
    /// which only happens if a constant above is mistyped.
    pub(super) fn account(ss58: &str) -> AccountId32 {
        ss58.parse().unwrap_or(AccountId32([0u8; 32]))
    }

    pub(super) fn min_balance() -> u128 {
        100
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn default_accounts_parse() {
        let accounts = ReserveAccounts::default();
        for account in [&accounts.fee_reserve, &accounts.native_reserve, &accounts.other_reserve] {
            assert_ne!(account, &AccountId32([0u8; 32]));
        }
        assert_eq!(
            ProposalConfig::default().recipient.to_string(),
            default_values::ALICE
        );
    }

    #[test]
    fn default_mpc_address_matches_checksummed_form() {
        let parsed: MpcAddress = "0x1c5541A79AcC662ab2D2647F3B141a3B7Cdb2Ae4".parse().unwrap();
        assert_eq!(E2eConfig::default_local().mpc_address, Some(parsed));
    }

    #[test]
    fn default_config_is_valid() {
        E2eConfig::default_local().validate().unwrap();
    }

    #[test]
    fn empty_file_loads_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"").unwrap();
        assert_eq!(E2eConfig::load(file.path()).unwrap(), E2eConfig::default_local());
    }

    #[test]
    fn partial_file_overrides_sections() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"
sudo_uri = "//Bob"
mpc_address = "0x0000000000000000000000000000000000000001"

[endpoints]
pallet = "ws://10.0.0.5:9944"
relay_chain = "ws://10.0.0.5:9942"

[submit]
confirmation = "in-block"
timeout_secs = 30

[fees]
rate = 250
upper_bound = "1,000,000"

[[standalone.domains]]
id = 3
chain_id = 1337

[xcm]
deposit_amount = "5_000"
"#
        )
        .unwrap();

        let config = E2eConfig::load(file.path()).unwrap();
        assert_eq!(config.sudo_uri, "//Bob");
        assert_eq!(config.endpoints.pallet, "ws://10.0.0.5:9944");
        assert_eq!(config.endpoints.relay_chain.as_deref(), Some("ws://10.0.0.5:9942"));
        assert_eq!(config.endpoints.bridge_hub, Endpoints::default().bridge_hub);
        assert_eq!(
            config.standalone.domains,
            vec![DomainConfig { id: DomainId(3), chain_id: 1337 }]
        );
        assert_eq!(config.standalone.assets.len(), 3);
        assert_eq!(config.fees.rate, 250);
        assert_eq!(config.fees.upper_bound, Balance::from(1_000_000u64));
        assert_eq!(config.xcm.deposit_amount, Balance::from(5_000u64));

        let options = config.submit_options();
        assert_eq!(options.confirmation, Confirmation::InBlock);
        assert_eq!(options.timeout, Some(Duration::from_secs(30)));
    }

    #[test]
    fn inverted_fee_bounds_are_rejected() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "[fees]\nlower_bound = 10\nupper_bound = 1\n").unwrap();
        assert!(matches!(E2eConfig::load(file.path()), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn malformed_toml_reports_path() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "[endpoints\n").unwrap();
        let err = E2eConfig::load(file.path()).unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
        assert!(err.to_string().contains(&file.path().display().to_string()));
    }

    #[test]
    fn missing_file_is_io_error() {
        let err = E2eConfig::load("/nonexistent/sygma-e2e.toml").unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }

    #[test]
    fn percentage_fee_is_clamped() {
        let fees = FeeConfig::default();
        assert_eq!(
            fees.fee_for(Balance::pow10(13)),
            Some(Balance::from(500_000_000_000u128))
        );

        let tight = FeeConfig { upper_bound: Balance::from(7u64), ..fees };
        assert_eq!(tight.fee_for(Balance::pow10(13)), Some(Balance::from(7u64)));
    }

    #[test]
    fn basic_fee_is_flat() {
        let fees = FeeConfig { handler: FeeHandlerType::BasicFeeHandler, ..FeeConfig::default() };
        assert_eq!(fees.fee_for(Balance::pow10(13)), Some(Balance::pow10(12)));
        assert_eq!(fees.fee_for(Balance::from(5u64)), Some(Balance::pow10(12)));
    }

    #[test]
    fn dynamic_fee_handler_is_rejected() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "[fees]\nhandler = \"DynamicFeeHandler\"\n").unwrap();
        assert!(matches!(E2eConfig::load(file.path()), Err(ConfigError::Invalid(_))));

        let fees =
            FeeConfig { handler: FeeHandlerType::DynamicFeeHandler, ..FeeConfig::default() };
        assert_eq!(fees.fee_for(Balance::pow10(13)), None);
    }

    #[test]
    fn asset_units_and_locations() {
        let usdc = AssetConfig::usdc();
        assert_eq!(usdc.units(100), Balance::pow10(14));
        assert_eq!(usdc.location(2005).unwrap(), MultiLocation::usdc(2005).unwrap());
        assert_eq!(
            AssetConfig::erc20tstd20().location(2004).unwrap(),
            MultiLocation::erc20tstd20(2004).unwrap()
        );
    }

    #[test]
    fn signer_comes_from_uri() {
        let signer = E2eConfig::default_local().signer().unwrap();
        assert_eq!(signer.public_key().to_account_id().to_string(), default_values::ALICE);

        let bad = E2eConfig { sudo_uri: "not a uri//".into(), ..E2eConfig::default_local() };
        assert!(matches!(bad.signer(), Err(ConfigError::Signer(_))));
    }

    #[test]
    fn xcm_destination_uses_recipient() {
        let dest = XcmConfig::default().destination().unwrap();
        let recipient = XcmConfig::default().recipient_bytes().unwrap();
        assert_eq!(dest, MultiLocation::deposit_dest(DomainId(1), recipient).unwrap());

        let short = XcmConfig { recipient: "0x1abd".into(), ..XcmConfig::default() };
        assert!(short.destination().is_err());
    }
}
