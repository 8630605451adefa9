use std::collections::BTreeMap;

use anchor_lang::prelude::*;
use solana_keccak_hasher::hash;

use crate::constants::{
    CITIZEN_COUNT_KEY, DEPLOYED_AT_BLOCK_KEY, HEAD_KEY, IS_INITIALIZED_KEY, OWNER_KEY, TAIL_KEY,
};

/// 32-byte storage slot, the keccak256 hash of a symbolic key
pub type StorageSlot = [u8; 32];

/// Symbolic keys of the typed cells used by the border citizen list
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StorageKey {
    Owner,
    Initialized,
    DeployedAtBlock,
    CitizenCount,
    Head,
    Tail,
}

impl StorageKey {
    pub const fn name(&self) -> &'static [u8] {
        match self {
            StorageKey::Owner => OWNER_KEY,
            StorageKey::Initialized => IS_INITIALIZED_KEY,
            StorageKey::DeployedAtBlock => DEPLOYED_AT_BLOCK_KEY,
            StorageKey::CitizenCount => CITIZEN_COUNT_KEY,
            StorageKey::Head => HEAD_KEY,
            StorageKey::Tail => TAIL_KEY,
        }
    }

    pub fn slot(&self) -> StorageSlot {
        hash(self.name()).to_bytes()
    }
}

/// Key-addressed storage with no behavior of its own.
///
/// Every typed cell is addressed by a `StorageSlot`; reading a cell that was
/// never written yields the type's zero value, so logic modules can be swapped
/// without migrating data. Citizen nodes live in their own accounts, see
/// `CitizenNodes`, so the size of this storage does not depend on the list.
#[derive(AnchorSerialize, AnchorDeserialize, Clone, Debug, Default, PartialEq, Eq)]
pub struct EternalStorage {
    pub address_storage: BTreeMap<StorageSlot, Pubkey>,
    pub boolean_storage: BTreeMap<StorageSlot, bool>,
    pub uint_storage: BTreeMap<StorageSlot, u64>,
}

impl EternalStorage {
    // Owner, head and tail
    const ADDRESS_CELLS: usize = 3;
    // Initialized flag
    const BOOLEAN_CELLS: usize = 1;
    // Deployment slot and citizen count
    const UINT_CELLS: usize = 2;

    /// Serialized size with every cell written, plus the three map length prefixes
    pub const SPACE: usize = 3 * 4
        + Self::ADDRESS_CELLS * (32 + 32)
        + Self::BOOLEAN_CELLS * (32 + 1)
        + Self::UINT_CELLS * (32 + 8);

    pub fn get_address(&self, key: StorageKey) -> Option<Pubkey> {
        self.address_storage.get(&key.slot()).copied()
    }

    pub fn set_address(&mut self, key: StorageKey, value: Pubkey) {
        self.address_storage.insert(key.slot(), value);
    }

    pub fn delete_address(&mut self, key: StorageKey) {
        self.address_storage.remove(&key.slot());
    }

    pub fn get_bool(&self, key: StorageKey) -> bool {
        self.boolean_storage
            .get(&key.slot())
            .copied()
            .unwrap_or_default()
    }

    pub fn set_bool(&mut self, key: StorageKey, value: bool) {
        self.boolean_storage.insert(key.slot(), value);
    }

    pub fn get_u64(&self, key: StorageKey) -> u64 {
        self.uint_storage.get(&key.slot()).copied().unwrap_or_default()
    }

    pub fn set_u64(&mut self, key: StorageKey, value: u64) {
        self.uint_storage.insert(key.slot(), value);
    }
}
