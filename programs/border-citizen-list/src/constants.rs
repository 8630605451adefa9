use anchor_lang::prelude::*;
use anchor_lang::solana_program::program::MAX_RETURN_DATA;

/// The zero address, never a citizen nor an owner
pub const ZERO_ADDRESS: Pubkey = Pubkey::new_from_array([0u8; 32]);

/// Reserved sentinel address (all bytes `0xff`), never a citizen nor an owner
pub const SENTINEL_ADDRESS: Pubkey = Pubkey::new_from_array([0xffu8; 32]);

// PDA SEEDS

/// Seed for the StorageProxy PDA
pub const STORAGE_PROXY_SEED: &[u8] = b"border_citizen_list";

/// Seed for the CitizenNodeAccount PDAs
pub const CITIZEN_NODE_SEED: &[u8] = b"citizen_node";

// LOGIC MODULES

/// Implementation identifier of the v1 border citizen list logic
pub const BORDER_CITIZEN_LIST_V1_ID: Pubkey =
    pubkey!("HZ4xtShG3bvzpgMLh5SjYJ8JQcw8g3SmLFLKzQrLaoy8");

/// Interface revision (major, minor, patch) exposed by the v1 logic
pub const BORDER_CITIZEN_LIST_V1_INTERFACES_VERSION: (u64, u64, u64) = (1, 0, 0);

// STORAGE KEYS
// Hashed with keccak256 into the 32-byte slots of `EternalStorage`

pub const OWNER_KEY: &[u8] = b"owner";
pub const IS_INITIALIZED_KEY: &[u8] = b"isInitialized";
pub const DEPLOYED_AT_BLOCK_KEY: &[u8] = b"deployedAtBlock";
pub const CITIZEN_COUNT_KEY: &[u8] = b"citizenCount";
pub const HEAD_KEY: &[u8] = b"head";
pub const TAIL_KEY: &[u8] = b"tail";

// LIMITS

/// Upper bound on citizens added or removed by a single instruction.
/// Every citizen is one node account of the transaction and a removal may
/// also need its predecessor, so a full batch stays within 64 account locks.
pub const MAX_CITIZENS_PER_CALL: usize = 16;

/// Largest list `citizen_list` can return: a Borsh `Vec<Pubkey>` within the return data limit
pub const MAX_CITIZENS_PER_LIST: usize = (MAX_RETURN_DATA - 4) / 32;

/// Largest page `citizen_list_page` can return, leaving room for the `Option<Pubkey>` cursor
pub const MAX_CITIZENS_PER_PAGE: usize = (MAX_RETURN_DATA - 4 - 33) / 32;
