use anchor_lang::prelude::*;

use crate::{
    constants::{MAX_CITIZENS_PER_CALL, STORAGE_PROXY_SEED},
    dispatcher::Dispatcher,
    errors::BorderCitizenListError,
    state::{CitizenNodeAccounts, EternalStorage, StorageProxy},
};

/// Create the `StorageProxy` account with an empty storage and no logic module
/// Requires the signer to be the program upgrade authority
#[derive(Accounts)]
pub struct InitializeStorageProxy<'info> {
    /// Pays for account creation
    #[account(mut)]
    pub payer: Signer<'info>,

    /// The program upgrade authority, recorded as the proxy owner
    pub authority: Signer<'info>,

    /// The `StorageProxy` account to be initialized
    /// # PDA Seeds
    /// - `STORAGE_PROXY_SEED`
    #[account(
        init,
        payer = payer,
        space = StorageProxy::SPACE,
        seeds = [STORAGE_PROXY_SEED],
        bump
    )]
    pub storage_proxy: Account<'info, StorageProxy>,

    /// The system program
    pub system_program: Program<'info, System>,

    /// The Border Citizen List program
    #[account(address = crate::ID)]
    pub program: Program<'info, crate::program::BorderCitizenList>,

    /// The ProgramData account of the Border Citizen List program
    #[account(
        constraint =
            program_data.upgrade_authority_address == Some(authority.key())
                @ BorderCitizenListError::Unauthorized
    )]
    pub program_data: Account<'info, ProgramData>,
}

impl<'info> InitializeStorageProxy<'info> {
    /// Initialize the `StorageProxy` account owned by the authority
    /// # Arguments
    /// * `bumps` - The PDA bumps for account derivation
    /// # Returns
    /// * `Result<()>` - Ok if the proxy is successfully created, Err otherwise
    pub fn initialize_storage_proxy(&mut self, bumps: &InitializeStorageProxyBumps) -> Result<()> {
        // Verify the program upgrade authority
        if let Some(program_data_address) = self.program.programdata_address()? {
            require_keys_eq!(
                program_data_address,
                self.program_data.key(),
                BorderCitizenListError::ProgramMismatch
            );
        } else {
            return Err(BorderCitizenListError::ProgramMismatch.into());
        }

        self.storage_proxy.set_inner(StorageProxy {
            proxy_owner: self.authority.key(),
            implementation: Pubkey::default(),
            version: 0,
            bump: bumps.storage_proxy,
            storage: EternalStorage::default(),
        });

        msg!("Storage proxy created, owner: {}", self.authority.key());

        Ok(())
    }
}

/// Administer the `StorageProxy`: upgrade the logic module or hand the proxy over
/// Requires the signer to be the proxy owner
#[derive(Accounts)]
pub struct StorageProxyAdmin<'info> {
    /// The proxy owner
    pub authority: Signer<'info>,

    /// The `StorageProxy` account
    /// # PDA Seeds
    /// - `STORAGE_PROXY_SEED`
    #[account(
        mut,
        seeds = [STORAGE_PROXY_SEED],
        bump = storage_proxy.bump,
    )]
    pub storage_proxy: Account<'info, StorageProxy>,
}

impl<'info> StorageProxyAdmin<'info> {
    /// Point the proxy at a new logic module
    /// # Arguments
    /// * `version` - The new version, must be greater than the current one
    /// * `implementation` - The identifier of the new logic module
    /// # Returns
    /// * `Result<()>` - Ok if the upgrade is recorded, Err otherwise
    pub fn upgrade_to(&mut self, version: u64, implementation: Pubkey) -> Result<()> {
        let caller = self.authority.key();
        let mut dispatcher = Dispatcher::new(&mut self.storage_proxy);
        let upgraded = dispatcher.upgrade_to(&caller, version, implementation)?;

        msg!(
            "Storage proxy upgraded to version {}, implementation: {}",
            dispatcher.version(),
            dispatcher.implementation()
        );
        emit!(upgraded);

        Ok(())
    }

    /// Hand the proxy over to a new owner
    /// # Arguments
    /// * `new_owner` - The public key of the new proxy owner
    /// # Returns
    /// * `Result<()>` - Ok if ownership is transferred, Err otherwise
    pub fn transfer_proxy_ownership(&mut self, new_owner: Pubkey) -> Result<()> {
        let caller = self.authority.key();
        let mut dispatcher = Dispatcher::new(&mut self.storage_proxy);
        let transferred = dispatcher.transfer_proxy_ownership(&caller, new_owner)?;

        msg!(
            "Storage proxy ownership transferred to {}",
            dispatcher.proxy_owner()
        );
        emit!(transferred);

        Ok(())
    }
}

/// Upgrade the `StorageProxy` and initialize the border citizen list in one instruction
/// Requires the signer to be the proxy owner
///
/// The node PDAs of the initial citizens are passed via remaining_accounts.
#[derive(Accounts)]
pub struct UpgradeToAndInitialize<'info> {
    /// Pays for the citizen node accounts
    #[account(mut)]
    pub payer: Signer<'info>,

    /// The proxy owner
    pub authority: Signer<'info>,

    /// The `StorageProxy` account
    /// # PDA Seeds
    /// - `STORAGE_PROXY_SEED`
    #[account(
        mut,
        seeds = [STORAGE_PROXY_SEED],
        bump = storage_proxy.bump,
    )]
    pub storage_proxy: Account<'info, StorageProxy>,

    /// The system program
    pub system_program: Program<'info, System>,
}

impl<'info> UpgradeToAndInitialize<'info> {
    /// Upgrade to `implementation` and initialize the list through it
    /// # Arguments
    /// * `remaining_accounts` - The vacant node PDAs of the initial citizens
    /// * `version` - The new version, must be greater than the current one
    /// * `implementation` - The identifier of the new logic module
    /// * `initial_citizens` - Citizens to link, in order
    /// * `owner` - The owner of the border citizen list
    /// # Returns
    /// * `Result<()>` - Ok if both the upgrade and the initialization succeed, Err otherwise
    pub fn upgrade_to_and_initialize(
        &mut self,
        remaining_accounts: &'info [AccountInfo<'info>],
        version: u64,
        implementation: Pubkey,
        initial_citizens: Vec<Pubkey>,
        owner: Pubkey,
    ) -> Result<()> {
        require!(
            initial_citizens.len() <= MAX_CITIZENS_PER_CALL,
            BorderCitizenListError::TooManyCitizens
        );

        let caller = self.authority.key();
        let current_slot = Clock::get()?.slot;
        let mut nodes = CitizenNodeAccounts::load(remaining_accounts)?;
        let upgraded = Dispatcher::new(&mut self.storage_proxy).upgrade_to_and_initialize(
            &caller,
            version,
            implementation,
            &mut nodes,
            &initial_citizens,
            owner,
            current_slot,
        )?;
        nodes.commit(
            &self.payer.to_account_info(),
            &self.system_program.to_account_info(),
        )?;

        msg!(
            "Storage proxy upgraded to version {} and initialized with {} citizens",
            version,
            initial_citizens.len()
        );
        emit!(upgraded);

        Ok(())
    }
}
