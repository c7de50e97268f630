//! Address decoding and classification
//!
//! A transfer endpoint is either a transparent address (base58check, P2PKH or
//! P2SH) or a Sapling payment address (bech32, 43-byte raw encoding). The
//! [`AddressClassifier`] tells them apart and, for shielded addresses, asks
//! the wallet key store whether it can spend from them.

use crate::keys::KeyStore;
use crate::{Error, Result};
use bech32::primitives::decode::CheckedHrpstring;
use bech32::{Bech32, Hrp};
use pirate_params::{Network, NetworkType};
use std::fmt;

/// Length of a raw Sapling payment address
pub const SAPLING_ADDRESS_LENGTH: usize = 43;

/// Length of the hash carried by a transparent address
pub const TRANSPARENT_HASH_LENGTH: usize = 20;

/// Transparent address kind
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TransparentKind {
    /// Pay-to-public-key-hash
    PublicKeyHash,
    /// Pay-to-script-hash
    ScriptHash,
}

/// Decoded transparent address
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TransparentAddress {
    /// Address kind
    pub kind: TransparentKind,
    /// Key or script hash
    pub hash: [u8; TRANSPARENT_HASH_LENGTH],
}

impl TransparentAddress {
    /// P2PKH address for `hash`
    pub fn public_key_hash(hash: [u8; TRANSPARENT_HASH_LENGTH]) -> Self {
        Self {
            kind: TransparentKind::PublicKeyHash,
            hash,
        }
    }

    /// P2SH address for `hash`
    pub fn script_hash(hash: [u8; TRANSPARENT_HASH_LENGTH]) -> Self {
        Self {
            kind: TransparentKind::ScriptHash,
            hash,
        }
    }
}

/// Decoded Sapling payment address
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct ShieldedAddress {
    diversifier: [u8; 11],
    pk_d: [u8; 32],
}

impl ShieldedAddress {
    /// Build from diversifier and transmission key bytes
    pub fn new(diversifier: [u8; 11], pk_d: [u8; 32]) -> Self {
        Self { diversifier, pk_d }
    }

    /// Parse the 43-byte raw encoding
    pub fn from_bytes(bytes: &[u8]) -> Option<Self> {
        if bytes.len() != SAPLING_ADDRESS_LENGTH {
            return None;
        }
        let mut diversifier = [0u8; 11];
        let mut pk_d = [0u8; 32];
        diversifier.copy_from_slice(&bytes[..11]);
        pk_d.copy_from_slice(&bytes[11..]);
        Some(Self { diversifier, pk_d })
    }

    /// Raw 43-byte encoding
    pub fn to_bytes(&self) -> [u8; SAPLING_ADDRESS_LENGTH] {
        let mut out = [0u8; SAPLING_ADDRESS_LENGTH];
        out[..11].copy_from_slice(&self.diversifier);
        out[11..].copy_from_slice(&self.pk_d);
        out
    }

    /// Diversifier
    pub fn diversifier(&self) -> &[u8; 11] {
        &self.diversifier
    }

    /// Diversified transmission key
    pub fn pk_d(&self) -> &[u8; 32] {
        &self.pk_d
    }
}

impl fmt::Debug for ShieldedAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ShieldedAddress")
            .field("diversifier", &hex::encode(self.diversifier))
            .field("pk_d", &hex::encode(self.pk_d))
            .finish()
    }
}

/// Address codec used by the classifier.
///
/// Both methods return `None` for strings that are not addresses of the
/// respective kind; they never fail otherwise.
pub trait AddressCodec {
    /// Decode a transparent address
    fn decode_transparent(&self, address: &str) -> Option<TransparentAddress>;

    /// Decode a Sapling payment address
    fn decode_shielded(&self, address: &str) -> Option<ShieldedAddress>;
}

impl<C: AddressCodec + ?Sized> AddressCodec for &C {
    fn decode_transparent(&self, address: &str) -> Option<TransparentAddress> {
        (**self).decode_transparent(address)
    }

    fn decode_shielded(&self, address: &str) -> Option<ShieldedAddress> {
        (**self).decode_shielded(address)
    }
}

/// Codec for Pirate Chain address strings on one network.
#[derive(Debug, Clone)]
pub struct PirateAddressCodec {
    network: Network,
}

impl PirateAddressCodec {
    /// Codec for the given network
    pub fn new(network_type: NetworkType) -> Self {
        Self {
            network: Network::from_type(network_type),
        }
    }

    /// Mainnet codec
    pub fn mainnet() -> Self {
        Self::new(NetworkType::Mainnet)
    }

    /// Network this codec encodes for
    pub fn network_type(&self) -> NetworkType {
        self.network.network_type
    }

    /// Encode a transparent address as base58check
    pub fn encode_transparent(&self, address: &TransparentAddress) -> String {
        let prefix = match address.kind {
            TransparentKind::PublicKeyHash => self.network.b58_pubkey_address_prefix,
            TransparentKind::ScriptHash => self.network.b58_script_address_prefix,
        };
        let mut payload = Vec::with_capacity(prefix.len() + TRANSPARENT_HASH_LENGTH);
        payload.extend_from_slice(&prefix);
        payload.extend_from_slice(&address.hash);
        bs58::encode(payload).with_check().into_string()
    }

    /// Encode a Sapling payment address as bech32
    pub fn encode_shielded(&self, address: &ShieldedAddress) -> Result<String> {
        let hrp = Hrp::parse(self.network.sapling_address_hrp)
            .map_err(|e| Error::InvalidConfig(format!("Invalid Sapling HRP: {e}")))?;
        bech32::encode::<Bech32>(hrp, &address.to_bytes())
            .map_err(|e| Error::InvalidConfig(format!("Sapling bech32 encode failed: {e}")))
    }
}

impl Default for PirateAddressCodec {
    fn default() -> Self {
        Self::mainnet()
    }
}

impl AddressCodec for PirateAddressCodec {
    fn decode_transparent(&self, address: &str) -> Option<TransparentAddress> {
        let decoded = bs58::decode(address).with_check(None).into_vec().ok()?;
        if decoded.len() != 2 + TRANSPARENT_HASH_LENGTH {
            return None;
        }

        let (prefix, body) = decoded.split_at(2);
        let kind = if prefix == self.network.b58_pubkey_address_prefix {
            TransparentKind::PublicKeyHash
        } else if prefix == self.network.b58_script_address_prefix {
            TransparentKind::ScriptHash
        } else {
            return None;
        };

        let mut hash = [0u8; TRANSPARENT_HASH_LENGTH];
        hash.copy_from_slice(body);
        Some(TransparentAddress { kind, hash })
    }

    fn decode_shielded(&self, address: &str) -> Option<ShieldedAddress> {
        // Sapling addresses use the original Bech32 checksum, never Bech32m.
        let parsed = CheckedHrpstring::new::<Bech32>(address).ok()?;
        if !parsed
            .hrp()
            .as_str()
            .eq_ignore_ascii_case(self.network.sapling_address_hrp)
        {
            return None;
        }
        let data: Vec<u8> = parsed.byte_iter().collect();
        ShieldedAddress::from_bytes(&data)
    }
}

/// An address after classification.
///
/// `spending_key` is only populated for origins; recipients are classified
/// without a key lookup.
#[derive(Debug, Clone)]
pub enum ClassifiedAddress<S> {
    /// Transparent address
    Transparent(TransparentAddress),
    /// Sapling payment address
    Shielded {
        /// Decoded payment address
        address: ShieldedAddress,
        /// Spending key held by this wallet, if any
        spending_key: Option<S>,
    },
}

impl<S> ClassifiedAddress<S> {
    /// True for transparent addresses
    pub fn is_transparent(&self) -> bool {
        matches!(self, ClassifiedAddress::Transparent(_))
    }

    /// True for shielded addresses
    pub fn is_shielded(&self) -> bool {
        matches!(self, ClassifiedAddress::Shielded { .. })
    }

    /// Transparent address, if this is one
    pub fn as_transparent(&self) -> Option<&TransparentAddress> {
        match self {
            ClassifiedAddress::Transparent(addr) => Some(addr),
            ClassifiedAddress::Shielded { .. } => None,
        }
    }

    /// Shielded address, if this is one
    pub fn as_shielded(&self) -> Option<&ShieldedAddress> {
        match self {
            ClassifiedAddress::Shielded { address, .. } => Some(address),
            ClassifiedAddress::Transparent(_) => None,
        }
    }

    /// Spending key, for owned shielded addresses
    pub fn spending_key(&self) -> Option<&S> {
        match self {
            ClassifiedAddress::Shielded { spending_key, .. } => spending_key.as_ref(),
            ClassifiedAddress::Transparent(_) => None,
        }
    }
}

/// Tells transparent from shielded addresses and resolves spend capability.
pub struct AddressClassifier<'a, C, K> {
    codec: &'a C,
    keys: &'a K,
}

impl<'a, C: AddressCodec, K: KeyStore> AddressClassifier<'a, C, K> {
    /// Create a classifier over the given codec and key store
    pub fn new(codec: &'a C, keys: &'a K) -> Self {
        Self { codec, keys }
    }

    /// Classify `address` without a key lookup.
    ///
    /// Transparent decoding is tried first.
    pub fn classify(&self, address: &str) -> Result<ClassifiedAddress<K::SpendingKey>> {
        if let Some(transparent) = self.codec.decode_transparent(address) {
            return Ok(ClassifiedAddress::Transparent(transparent));
        }

        match self.codec.decode_shielded(address) {
            Some(shielded) => Ok(ClassifiedAddress::Shielded {
                address: shielded,
                spending_key: None,
            }),
            None => Err(Error::UnknownAddressFormat {
                address: address.to_string(),
            }),
        }
    }

    /// Spending key for `address` if this wallet controls it
    pub fn resolve_spend_capability(&self, address: &ShieldedAddress) -> Option<K::SpendingKey> {
        self.keys.spending_key_for(address)
    }

    /// Classify a transfer origin.
    ///
    /// Shielded origins must resolve to a spending key held by this wallet.
    pub fn classify_origin(&self, address: &str) -> Result<ClassifiedAddress<K::SpendingKey>> {
        match self.classify(address)? {
            ClassifiedAddress::Shielded { address: shielded, .. } => {
                let spending_key = self.resolve_spend_capability(&shielded).ok_or_else(|| {
                    Error::OriginNotOwned {
                        address: address.to_string(),
                    }
                })?;
                Ok(ClassifiedAddress::Shielded {
                    address: shielded,
                    spending_key: Some(spending_key),
                })
            }
            transparent => Ok(transparent),
        }
    }
}
