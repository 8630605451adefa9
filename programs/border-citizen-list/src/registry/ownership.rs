use anchor_lang::prelude::*;

use crate::{
    errors::BorderCitizenListError,
    state::{EternalStorage, StorageKey, StorageProxy},
};

/// Require an initialized list whose owner is `caller`
/// # Errors
/// * `BorderCitizenListError::Uninitialized` - If the list was never initialized
/// * `BorderCitizenListError::Unauthorized` - If `caller` is not the list owner
pub fn only_owner(storage: &EternalStorage, caller: &Pubkey) -> Result<()> {
    require!(
        storage.get_bool(StorageKey::Initialized),
        BorderCitizenListError::Uninitialized
    );
    require!(
        storage.get_address(StorageKey::Owner) == Some(*caller),
        BorderCitizenListError::Unauthorized
    );

    Ok(())
}

/// Require `caller` to be the owner of the storage proxy
/// # Errors
/// * `BorderCitizenListError::Unauthorized` - If `caller` is not the proxy owner
pub fn only_proxy_owner(proxy: &StorageProxy, caller: &Pubkey) -> Result<()> {
    require!(
        proxy.proxy_owner == *caller,
        BorderCitizenListError::Unauthorized
    );

    Ok(())
}
