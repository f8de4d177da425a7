//! XCM v3 locations and assets, as accepted by `SygmaBridge.deposit` and the
//! fee handler pallets.

use serde::{Deserialize, Serialize};
use subxt::dynamic::Value;

use crate::{DomainId, PrimitivesError};

/// Maximum number of junctions in an XCM v3 interior location.
pub const MAX_JUNCTIONS: usize = 8;

/// General key prefix shared by every bridged asset and deposit destination.
pub const SYGMA_KEY: &[u8] = b"sygma";

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Junction {
    Parachain(u32),
    GeneralKey { length: u8, data: [u8; 32] },
    GeneralIndex(u128),
    AccountId32 { id: [u8; 32] },
}

impl Junction {
    /// Builds a `GeneralKey` from raw bytes, zero-padding to 32.
    pub fn general_key(bytes: &[u8]) -> Result<Self, PrimitivesError> {
        if bytes.len() > 32 {
            return Err(PrimitivesError::GeneralKeyTooLong(bytes.len()));
        }
        let mut data = [0u8; 32];
        data[..bytes.len()].copy_from_slice(bytes);
        Ok(Self::GeneralKey { length: bytes.len() as u8, data })
    }

    pub fn to_value(&self) -> Value {
        match self {
            Self::Parachain(id) => Value::unnamed_variant("Parachain", [Value::u128(*id as u128)]),
            Self::GeneralKey { length, data } => Value::named_variant(
                "GeneralKey",
                [
                    ("length", Value::u128(*length as u128)),
                    ("data", Value::from_bytes(data)),
                ],
            ),
            Self::GeneralIndex(index) => {
                Value::unnamed_variant("GeneralIndex", [Value::u128(*index)])
            }
            Self::AccountId32 { id } => Value::named_variant(
                "AccountId32",
                [
                    ("network", Value::unnamed_variant("None", [])),
                    ("id", Value::from_bytes(id)),
                ],
            ),
        }
    }
}

/// Interior of a location. Lowers to `Here` or the `X1..X8` tuple arm matching
/// the number of junctions.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Junctions(Vec<Junction>);

impl Junctions {
    pub fn here() -> Self {
        Self(Vec::new())
    }

    pub fn new(junctions: Vec<Junction>) -> Result<Self, PrimitivesError> {
        if junctions.len() > MAX_JUNCTIONS {
            return Err(PrimitivesError::TooManyJunctions(junctions.len()));
        }
        Ok(Self(junctions))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Junction> {
        self.0.iter()
    }

    pub fn to_value(&self) -> Value {
        if self.0.is_empty() {
            return Value::unnamed_variant("Here", []);
        }
        Value::unnamed_variant(
            format!("X{}", self.0.len()),
            self.0.iter().map(Junction::to_value),
        )
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MultiLocation {
    pub parents: u8,
    pub interior: Junctions,
}

impl MultiLocation {
    pub fn here() -> Self {
        Self { parents: 0, interior: Junctions::here() }
    }

    pub fn to_value(&self) -> Value {
        Value::named_composite([
            ("parents", Value::u128(self.parents as u128)),
            ("interior", self.interior.to_value()),
        ])
    }

    /// Location of the chain's own native token.
    pub fn native() -> Self {
        Self::here()
    }

    /// A sygma-registered token living under `para`, keyed by `symbol`.
    pub fn sygma_token(para: u32, symbol: &str) -> Result<Self, PrimitivesError> {
        Ok(Self {
            parents: 1,
            interior: Junctions::new(vec![
                Junction::Parachain(para),
                Junction::general_key(SYGMA_KEY)?,
                Junction::general_key(symbol.as_bytes())?,
            ])?,
        })
    }

    pub fn usdc(para: u32) -> Result<Self, PrimitivesError> {
        Self::sygma_token(para, "usdc")
    }

    pub fn erc20tst(para: u32) -> Result<Self, PrimitivesError> {
        Self::sygma_token(para, "erc20tst")
    }

    pub fn erc20tstd20(para: u32) -> Result<Self, PrimitivesError> {
        Self::sygma_token(para, "erc20tstd20")
    }

    /// Deposit destination: an EVM recipient on the given bridge domain.
    pub fn deposit_dest(domain: DomainId, recipient: [u8; 20]) -> Result<Self, PrimitivesError> {
        Ok(Self {
            parents: 0,
            interior: Junctions::new(vec![
                Junction::general_key(SYGMA_KEY)?,
                Junction::GeneralIndex(domain.0 as u128),
                Junction::general_key(&recipient)?,
            ])?,
        })
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum AssetId {
    Concrete(MultiLocation),
}

impl AssetId {
    pub fn native() -> Self {
        Self::Concrete(MultiLocation::native())
    }

    pub fn location(&self) -> &MultiLocation {
        match self {
            Self::Concrete(location) => location,
        }
    }

    pub fn to_value(&self) -> Value {
        match self {
            Self::Concrete(location) => Value::unnamed_variant("Concrete", [location.to_value()]),
        }
    }
}

impl From<MultiLocation> for AssetId {
    fn from(location: MultiLocation) -> Self {
        Self::Concrete(location)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Fungibility {
    Fungible(u128),
}

impl Fungibility {
    pub fn to_value(self) -> Value {
        match self {
            Self::Fungible(amount) => Value::unnamed_variant("Fungible", [Value::u128(amount)]),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MultiAsset {
    pub id: AssetId,
    pub fun: Fungibility,
}

impl MultiAsset {
    pub fn fungible(id: impl Into<AssetId>, amount: u128) -> Self {
        Self { id: id.into(), fun: Fungibility::Fungible(amount) }
    }

    pub fn to_value(&self) -> Value {
        Value::named_composite([("id", self.id.to_value()), ("fun", self.fun.to_value())])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use subxt::ext::scale_value::{Composite, ValueDef, Variant};

    fn variant(value: &Value) -> &Variant<()> {
        match &value.value {
            ValueDef::Variant(v) => v,
            other => panic!("expected variant, got {other:?}"),
        }
    }

    #[test]
    fn general_key_pads_and_records_length() {
        let Junction::GeneralKey { length, data } = Junction::general_key(b"sygma").unwrap() else {
            panic!("expected general key");
        };
        assert_eq!(length, 5);
        assert_eq!(&data[..5], b"sygma");
        assert!(data[5..].iter().all(|b| *b == 0));
    }

    #[test]
    fn general_key_rejects_oversized_input() {
        assert_eq!(
            Junction::general_key(&[1u8; 33]),
            Err(PrimitivesError::GeneralKeyTooLong(33))
        );
    }

    #[test]
    fn junction_count_is_capped() {
        let nine = vec![Junction::GeneralIndex(0); 9];
        assert_eq!(Junctions::new(nine), Err(PrimitivesError::TooManyJunctions(9)));
    }

    #[test]
    fn interior_arm_follows_junction_count() {
        let here = MultiLocation::native().interior.to_value();
        assert_eq!(variant(&here).name, "Here");

        let usdc = MultiLocation::usdc(2004).unwrap().interior.to_value();
        let v = variant(&usdc);
        assert_eq!(v.name, "X3");
        assert!(matches!(&v.values, Composite::Unnamed(items) if items.len() == 3));

        let single = Junctions::new(vec![Junction::Parachain(1000)]).unwrap().to_value();
        assert_eq!(variant(&single).name, "X1");
    }

    #[test]
    fn usdc_location_layout() {
        let usdc = MultiLocation::usdc(2005).unwrap();
        assert_eq!(usdc.parents, 1);
        let junctions: Vec<_> = usdc.interior.iter().cloned().collect();
        assert_eq!(junctions[0], Junction::Parachain(2005));
        assert_eq!(junctions[1], Junction::general_key(b"sygma").unwrap());
        assert_eq!(junctions[2], Junction::general_key(b"usdc").unwrap());
    }

    #[test]
    fn erc20_presets_use_their_symbol_keys() {
        let tst = MultiLocation::erc20tst(2004).unwrap();
        let d20 = MultiLocation::erc20tstd20(2004).unwrap();
        let key = |loc: &MultiLocation| match loc.interior.iter().nth(2) {
            Some(Junction::GeneralKey { length, .. }) => *length,
            _ => 0,
        };
        assert_eq!(key(&tst), 8);
        assert_eq!(key(&d20), 11);
    }

    #[test]
    fn deposit_dest_embeds_domain_and_recipient() {
        let recipient = [0x1a; 20];
        let dest = MultiLocation::deposit_dest(DomainId(1), recipient).unwrap();
        assert_eq!(dest.parents, 0);
        let junctions: Vec<_> = dest.interior.iter().cloned().collect();
        assert_eq!(junctions[1], Junction::GeneralIndex(1));
        assert_eq!(junctions[2], Junction::general_key(&recipient).unwrap());
    }

    #[test]
    fn multi_asset_lowers_to_named_fields() {
        let asset = MultiAsset::fungible(AssetId::native(), 10_000_000_000_000);
        let ValueDef::Composite(Composite::Named(fields)) = asset.to_value().value else {
            panic!("expected named composite");
        };
        let names: Vec<_> = fields.iter().map(|(name, _)| name.as_str()).collect();
        assert_eq!(names, ["id", "fun"]);
    }
}
