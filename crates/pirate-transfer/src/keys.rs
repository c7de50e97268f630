//! Wallet key access
//!
//! The planner never derives spending keys itself. It asks a [`KeyStore`] for
//! the spending key of a shielded origin and for the outgoing viewing key used
//! when shielding from a transparent address.

use crate::address::ShieldedAddress;
use blake2b_simd::Params as Blake2bParams;
use std::collections::HashMap;
use std::fmt;
use zeroize::Zeroizing;

/// BLAKE2b personalization for the transparent-to-shielded OVK
const TADDR_OVK_PERSONALIZATION: &[u8; 16] = b"ZcTaddrToSapling";

/// PRF^Expand domain separator
const PRF_EXPAND_PERSONALIZATION: &[u8; 16] = b"Zcash_ExpandSeed";

/// PRF^Expand domain byte for `ovk`
const PRF_OVK_DOMAIN: u8 = 0x02;

/// Sapling outgoing viewing key
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct OutgoingViewingKey(pub [u8; 32]);

impl OutgoingViewingKey {
    /// Raw key bytes
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }
}

impl fmt::Debug for OutgoingViewingKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("OutgoingViewingKey(..)")
    }
}

/// Handle to a spending key held by the wallet.
pub trait SpendingKeyHandle {
    /// OVK embedded in the full viewing key derived from this spending key
    fn outgoing_viewing_key(&self) -> OutgoingViewingKey;
}

/// Wallet key store.
pub trait KeyStore {
    /// Spending key handle type
    type SpendingKey: SpendingKeyHandle + Clone;

    /// Spending key controlling `address`, if held locally
    fn spending_key_for(&self, address: &ShieldedAddress) -> Option<Self::SpendingKey>;

    /// OVK for outputs created while shielding from a transparent address
    fn shielding_ovk(&self) -> OutgoingViewingKey;
}

impl<K: KeyStore + ?Sized> KeyStore for &K {
    type SpendingKey = K::SpendingKey;

    fn spending_key_for(&self, address: &ShieldedAddress) -> Option<Self::SpendingKey> {
        (**self).spending_key_for(address)
    }

    fn shielding_ovk(&self) -> OutgoingViewingKey {
        (**self).shielding_ovk()
    }
}

/// Derive the OVK used when shielding from a transparent address.
///
/// `I = BLAKE2b-512("ZcTaddrToSapling", seed)`, then
/// `ovk = PRF^Expand(I[..32], [0x02])[..32]`.
pub fn ovk_for_shielding_from_taddr(seed: &[u8]) -> OutgoingViewingKey {
    let intermediate = Blake2bParams::new()
        .hash_length(64)
        .personal(TADDR_OVK_PERSONALIZATION)
        .hash(seed);

    let expanded = Blake2bParams::new()
        .hash_length(64)
        .personal(PRF_EXPAND_PERSONALIZATION)
        .to_state()
        .update(&intermediate.as_bytes()[..32])
        .update(&[PRF_OVK_DOMAIN])
        .finalize();

    let mut ovk = [0u8; 32];
    ovk.copy_from_slice(&expanded.as_bytes()[..32]);
    OutgoingViewingKey(ovk)
}

/// Key store backed by the wallet seed and a set of registered spending keys.
pub struct SeedKeyStore<S> {
    seed: Zeroizing<Vec<u8>>,
    spending_keys: HashMap<ShieldedAddress, S>,
}

impl<S> SeedKeyStore<S> {
    /// Create from the raw wallet seed
    pub fn new(seed: Vec<u8>) -> Self {
        Self {
            seed: Zeroizing::new(seed),
            spending_keys: HashMap::new(),
        }
    }

    /// Register the spending key controlling `address`
    pub fn register(&mut self, address: ShieldedAddress, spending_key: S) {
        self.spending_keys.insert(address, spending_key);
    }

    /// Number of registered spending keys
    pub fn len(&self) -> usize {
        self.spending_keys.len()
    }

    /// True if no spending key is registered
    pub fn is_empty(&self) -> bool {
        self.spending_keys.is_empty()
    }
}

impl<S: SpendingKeyHandle + Clone> KeyStore for SeedKeyStore<S> {
    type SpendingKey = S;

    fn spending_key_for(&self, address: &ShieldedAddress) -> Option<S> {
        self.spending_keys.get(address).cloned()
    }

    fn shielding_ovk(&self) -> OutgoingViewingKey {
        ovk_for_shielding_from_taddr(&self.seed)
    }
}

impl<S> fmt::Debug for SeedKeyStore<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SeedKeyStore")
            .field("spending_keys", &self.spending_keys.len())
            .finish_non_exhaustive()
    }
}
