use anchor_lang::prelude::*;

use crate::state::EternalStorage;

/// Storage proxy account - pairs the active logic module with the storage it runs against
#[account]
#[derive(Debug, Default, PartialEq, Eq)]
pub struct StorageProxy {
    // The account allowed to upgrade the logic module and hand over the proxy
    pub proxy_owner: Pubkey,

    // Identifier of the active logic module, `Pubkey::default()` until the first upgrade
    pub implementation: Pubkey,

    // Version recorded by the last upgrade, strictly increasing
    pub version: u64,

    // The bump used to derive the PDA for this account
    // Stored so we don't need to recalculate it later
    pub bump: u8,

    /// State of the border citizen list, owned by the proxy rather than the logic
    pub storage: EternalStorage,
}

impl StorageProxy {
    /// Account size including the discriminator, independent of the number of citizens
    pub const SPACE: usize = 8 + 32 + 32 + 8 + 1 + EternalStorage::SPACE;
}
