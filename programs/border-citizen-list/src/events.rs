use anchor_lang::prelude::*;

/// Event emitted when a citizen is added to or removed from the list
/// Fields:
/// - citizen: The public key of the citizen
/// - whitelisted: True when the citizen was added, false when removed
#[event]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CitizenWhitelisted {
    pub citizen: Pubkey,
    pub whitelisted: bool,
}

impl CitizenWhitelisted {
    pub fn added(citizen: Pubkey) -> Self {
        Self {
            citizen,
            whitelisted: true,
        }
    }

    pub fn removed(citizen: Pubkey) -> Self {
        Self {
            citizen,
            whitelisted: false,
        }
    }
}

/// Event emitted when the storage proxy is pointed at a new logic module
/// Fields:
/// - version: The version recorded for the new implementation
/// - implementation: The identifier of the new logic module
#[event]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Upgraded {
    pub version: u64,
    pub implementation: Pubkey,
}

/// Event emitted when the storage proxy changes hands
/// Fields:
/// - previous_owner: The public key of the previous proxy owner
/// - new_owner: The public key of the new proxy owner
#[event]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProxyOwnershipTransferred {
    pub previous_owner: Pubkey,
    pub new_owner: Pubkey,
}
