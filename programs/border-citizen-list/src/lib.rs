#![allow(unexpected_cfgs)]
#![allow(deprecated)]

use anchor_lang::prelude::*;
mod constants;
mod dispatcher;
mod errors;
mod events;
mod instructions;
mod registry;
#[cfg(not(feature = "no-entrypoint"))]
pub mod security;
mod state;

#[cfg(test)]
mod heap_usage;

use instructions::*;
use registry::CitizenPage;

#[cfg(feature = "devnet")]
declare_id!("AUWz3v4vsnmEbijajgbCK6D75NjJWL7ks6ja2BdPWY2e");
#[cfg(feature = "testnet")]
declare_id!("6YixFPUuC7cLyWGKgwQb8pawMGkx4jayw9QxGc676kRc");
#[cfg(feature = "mainnet")]
declare_id!("EoMcqDxec6XxFGv6fDM8N19qLRuMuPKkTWqXL6GkAa7Z");
#[cfg(not(any(feature = "mainnet", feature = "devnet", feature = "testnet")))]
declare_id!("T9V5Gznd9ZRPTufi4kkSQuEaPmitFpBTe2rqGxBJHfC");

#[program]
pub mod border_citizen_list {
    use super::*;

    /// Create the storage proxy holding the border citizen list state
    ///
    /// The proxy starts without a logic module; the signer becomes the proxy owner.
    /// Signer must be the program upgrade authority
    pub fn initialize_storage_proxy(ctx: Context<InitializeStorageProxy>) -> Result<()> {
        ctx.accounts.initialize_storage_proxy(&ctx.bumps)
    }

    /// Point the storage proxy at a new logic module
    /// Signer must be the proxy owner
    pub fn upgrade_to(
        ctx: Context<StorageProxyAdmin>,
        version: u64,
        implementation: Pubkey,
    ) -> Result<()> {
        ctx.accounts.upgrade_to(version, implementation)
    }

    /// Point the storage proxy at a new logic module and initialize the list through it
    ///
    /// The vacant node PDAs of the initial citizens are passed via remaining_accounts.
    /// Signer must be the proxy owner
    pub fn upgrade_to_and_initialize<'info>(
        ctx: Context<'_, '_, 'info, 'info, UpgradeToAndInitialize<'info>>,
        version: u64,
        implementation: Pubkey,
        initial_citizens: Vec<Pubkey>,
        owner: Pubkey,
    ) -> Result<()> {
        ctx.accounts.upgrade_to_and_initialize(
            ctx.remaining_accounts,
            version,
            implementation,
            initial_citizens,
            owner,
        )
    }

    /// Hand the storage proxy over to a new owner
    /// Signer must be the proxy owner
    pub fn transfer_proxy_ownership(
        ctx: Context<StorageProxyAdmin>,
        new_owner: Pubkey,
    ) -> Result<()> {
        ctx.accounts.transfer_proxy_ownership(new_owner)
    }

    /// Initialize the border citizen list
    ///
    /// Links the initial citizens in order, records the owner and the current slot.
    /// The vacant node PDAs of the initial citizens are passed via remaining_accounts.
    /// Can only succeed once.
    pub fn initialize<'info>(
        ctx: Context<'_, '_, 'info, 'info, InitializeCitizenList<'info>>,
        initial_citizens: Vec<Pubkey>,
        owner: Pubkey,
    ) -> Result<()> {
        ctx.accounts
            .initialize(ctx.remaining_accounts, initial_citizens, owner)
    }

    /// Add a citizen at the end of the list
    ///
    /// Accounts passed via remaining_accounts: the vacant node PDA of the citizen
    /// and the node account of the current tail.
    /// Signer must be the list owner
    pub fn add_citizen<'info>(
        ctx: Context<'_, '_, 'info, 'info, AddCitizens<'info>>,
        citizen: Pubkey,
    ) -> Result<()> {
        ctx.accounts.add_citizen(ctx.remaining_accounts, citizen)
    }

    /// Add citizens at the end of the list, all or none
    ///
    /// Accounts passed via remaining_accounts: the vacant node PDAs of the citizens
    /// and the node account of the current tail.
    /// Signer must be the list owner
    pub fn add_citizen_list<'info>(
        ctx: Context<'_, '_, 'info, 'info, AddCitizens<'info>>,
        citizens: Vec<Pubkey>,
    ) -> Result<()> {
        ctx.accounts
            .add_citizen_list(ctx.remaining_accounts, citizens)
    }

    /// Remove a citizen from the list
    ///
    /// Accounts passed via remaining_accounts: the node accounts of the citizen
    /// and of its predecessor.
    /// Signer must be the list owner
    pub fn remove_citizen<'info>(
        ctx: Context<'_, '_, 'info, 'info, RemoveCitizens<'info>>,
        citizen: Pubkey,
    ) -> Result<()> {
        ctx.accounts.remove_citizen(ctx.remaining_accounts, citizen)
    }

    /// Remove citizens from the list, all or none
    ///
    /// Accounts passed via remaining_accounts: the node accounts of the citizens
    /// and of their predecessors.
    /// Signer must be the list owner
    pub fn remove_citizen_list<'info>(
        ctx: Context<'_, '_, 'info, 'info, RemoveCitizens<'info>>,
        citizens: Vec<Pubkey>,
    ) -> Result<()> {
        ctx.accounts
            .remove_citizen_list(ctx.remaining_accounts, citizens)
    }

    /// Whether `citizen` is a member, given its node account or vacant node PDA
    pub fn is_citizen<'info>(
        ctx: Context<'_, '_, 'info, 'info, CitizenListView<'info>>,
        citizen: Pubkey,
    ) -> Result<bool> {
        ctx.accounts.is_citizen(ctx.remaining_accounts, citizen)
    }

    pub fn citizen_count(ctx: Context<CitizenListView>) -> Result<u64> {
        ctx.accounts.citizen_count()
    }

    /// Citizens in insertion order, given every node account
    ///
    /// Fails once the list is too long for the return data; read it with
    /// `citizen_list_page` instead.
    pub fn citizen_list<'info>(
        ctx: Context<'_, '_, 'info, 'info, CitizenListView<'info>>,
    ) -> Result<Vec<Pubkey>> {
        ctx.accounts.citizen_list(ctx.remaining_accounts)
    }

    /// Up to `limit` citizens in insertion order, starting at `start` or at the head
    ///
    /// The page carries the citizen to start the next page from. The node
    /// accounts of the page are passed via remaining_accounts.
    pub fn citizen_list_page<'info>(
        ctx: Context<'_, '_, 'info, 'info, CitizenListView<'info>>,
        start: Option<Pubkey>,
        limit: u8,
    ) -> Result<CitizenPage> {
        ctx.accounts
            .citizen_list_page(ctx.remaining_accounts, start, limit)
    }

    /// The citizen added right after `citizen`, the default pubkey if there is none
    pub fn get_next_citizen<'info>(
        ctx: Context<'_, '_, 'info, 'info, CitizenListView<'info>>,
        citizen: Pubkey,
    ) -> Result<Pubkey> {
        ctx.accounts.get_next_citizen(ctx.remaining_accounts, citizen)
    }

    pub fn is_initialized(ctx: Context<CitizenListView>) -> Result<bool> {
        ctx.accounts.is_initialized()
    }

    pub fn owner(ctx: Context<CitizenListView>) -> Result<Pubkey> {
        ctx.accounts.owner()
    }

    /// Slot at which the list was initialized
    pub fn deployed_at_block(ctx: Context<CitizenListView>) -> Result<u64> {
        ctx.accounts.deployed_at_block()
    }

    pub fn get_border_citizen_list_interfaces_version(
        ctx: Context<CitizenListView>,
    ) -> Result<InterfacesVersion> {
        ctx.accounts.interfaces_version()
    }
}
