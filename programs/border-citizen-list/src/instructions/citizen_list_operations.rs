use anchor_lang::prelude::*;

use crate::{
    constants::{
        MAX_CITIZENS_PER_CALL, MAX_CITIZENS_PER_LIST, MAX_CITIZENS_PER_PAGE, STORAGE_PROXY_SEED,
    },
    dispatcher::Dispatcher,
    errors::BorderCitizenListError,
    events::CitizenWhitelisted,
    registry::CitizenPage,
    state::{CitizenNodeAccounts, StorageProxy},
};

/// Interface revision of the active logic module
#[derive(AnchorSerialize, AnchorDeserialize, Clone, Copy, Debug, PartialEq, Eq)]
pub struct InterfacesVersion {
    pub major: u64,
    pub minor: u64,
    pub patch: u64,
}

fn emit_all(events: &[CitizenWhitelisted]) {
    for event in events {
        emit!(*event);
    }
}

/// Fail when the whole list would not fit in the instruction's return data
fn check_list_size(citizen_count: u64) -> Result<()> {
    require!(
        citizen_count <= MAX_CITIZENS_PER_LIST as u64,
        BorderCitizenListError::CitizenListTooLarge
    );
    Ok(())
}

/// Number of citizens to read for a page of at most `limit` entries
fn page_limit(limit: u8) -> Result<usize> {
    let limit = usize::from(limit);
    require!(
        (1..=MAX_CITIZENS_PER_PAGE).contains(&limit),
        BorderCitizenListError::InvalidPageLimit
    );
    Ok(limit)
}

/// Initialize the border citizen list held by the `StorageProxy`
/// Can only succeed once
///
/// The node PDAs of the initial citizens are passed via remaining_accounts.
#[derive(Accounts)]
pub struct InitializeCitizenList<'info> {
    /// Pays for the citizen node accounts
    #[account(mut)]
    pub payer: Signer<'info>,

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

impl<'info> InitializeCitizenList<'info> {
    /// Link the initial citizens and record the list owner
    /// # Arguments
    /// * `remaining_accounts` - The vacant node PDAs of the initial citizens
    /// * `initial_citizens` - Citizens to link, the first one becomes the head
    /// * `owner` - The account allowed to add and remove citizens
    /// # Returns
    /// * `Result<()>` - Ok if the list is successfully initialized, Err otherwise
    pub fn initialize(
        &mut self,
        remaining_accounts: &'info [AccountInfo<'info>],
        initial_citizens: Vec<Pubkey>,
        owner: Pubkey,
    ) -> Result<()> {
        require!(
            initial_citizens.len() <= MAX_CITIZENS_PER_CALL,
            BorderCitizenListError::TooManyCitizens
        );

        let current_slot = Clock::get()?.slot;
        let mut nodes = CitizenNodeAccounts::load(remaining_accounts)?;
        Dispatcher::new(&mut self.storage_proxy).forward(|logic, storage| {
            logic.initialize(storage, &mut nodes, &initial_citizens, owner, current_slot)
        })?;
        nodes.commit(
            &self.payer.to_account_info(),
            &self.system_program.to_account_info(),
        )?;

        msg!(
            "Border citizen list initialized with {} citizens at slot {}",
            initial_citizens.len(),
            current_slot
        );

        Ok(())
    }
}

/// Add citizens to the border citizen list
/// Requires the signer to be the list owner
///
/// Node accounts are passed via remaining_accounts, constraints:
/// 1. Accounts must be marked writable
/// 2. The vacant node PDA of every new citizen
/// 3. The node account of the current tail
#[derive(Accounts)]
pub struct AddCitizens<'info> {
    /// Pays for the citizen node accounts
    #[account(mut)]
    pub payer: Signer<'info>,

    /// The list owner
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

impl<'info> AddCitizens<'info> {
    /// Append citizens in order, either all of them or none
    /// # Arguments
    /// * `remaining_accounts` - The node accounts touched by the append
    /// * `citizens` - The public keys to whitelist
    /// # Returns
    /// * `Result<()>` - Ok if every citizen is added, Err otherwise
    pub fn add_citizen_list(
        &mut self,
        remaining_accounts: &'info [AccountInfo<'info>],
        citizens: Vec<Pubkey>,
    ) -> Result<()> {
        require!(
            citizens.len() <= MAX_CITIZENS_PER_CALL,
            BorderCitizenListError::TooManyCitizens
        );

        let caller = self.authority.key();
        let mut nodes = CitizenNodeAccounts::load(remaining_accounts)?;
        let events = Dispatcher::new(&mut self.storage_proxy).forward(|logic, storage| {
            logic.add_citizen_list(storage, &mut nodes, &caller, &citizens)
        })?;
        nodes.commit(
            &self.payer.to_account_info(),
            &self.system_program.to_account_info(),
        )?;

        emit_all(&events);

        Ok(())
    }

    /// Append a citizen at the end of the list
    /// # Arguments
    /// * `remaining_accounts` - The vacant node PDA of `citizen` and the node of the tail
    /// * `citizen` - The public key to whitelist
    /// # Returns
    /// * `Result<()>` - Ok if the citizen is added, Err otherwise
    pub fn add_citizen(
        &mut self,
        remaining_accounts: &'info [AccountInfo<'info>],
        citizen: Pubkey,
    ) -> Result<()> {
        let caller = self.authority.key();
        let mut nodes = CitizenNodeAccounts::load(remaining_accounts)?;
        let event = Dispatcher::new(&mut self.storage_proxy)
            .forward(|logic, storage| logic.add_citizen(storage, &mut nodes, &caller, citizen))?;
        nodes.commit(
            &self.payer.to_account_info(),
            &self.system_program.to_account_info(),
        )?;

        emit!(event);

        Ok(())
    }
}

/// Remove citizens from the border citizen list
/// Requires the signer to be the list owner
///
/// Node accounts are passed via remaining_accounts, constraints:
/// 1. Accounts must be marked writable
/// 2. The node account of every removed citizen
/// 3. The node account of each removed citizen's predecessor, unless it is removed too
#[derive(Accounts)]
pub struct RemoveCitizens<'info> {
    /// The list owner
    pub authority: Signer<'info>,

    /// Receives the rent of the closed node accounts
    #[account(mut)]
    pub recipient: SystemAccount<'info>,

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

impl<'info> RemoveCitizens<'info> {
    /// Remove a single citizen
    /// # Arguments
    /// * `remaining_accounts` - The node accounts of `citizen` and its predecessor
    /// * `citizen` - The public key to remove from the list
    /// # Returns
    /// * `Result<()>` - Ok if the citizen is removed, Err otherwise
    pub fn remove_citizen(
        &mut self,
        remaining_accounts: &'info [AccountInfo<'info>],
        citizen: Pubkey,
    ) -> Result<()> {
        let caller = self.authority.key();
        let mut nodes = CitizenNodeAccounts::load(remaining_accounts)?;
        let event = Dispatcher::new(&mut self.storage_proxy).forward(|logic, storage| {
            logic.remove_citizen(storage, &mut nodes, &caller, citizen)
        })?;
        nodes.commit(
            &self.recipient.to_account_info(),
            &self.system_program.to_account_info(),
        )?;

        emit!(event);

        Ok(())
    }

    /// Remove citizens in order, either all of them or none
    /// # Arguments
    /// * `remaining_accounts` - The node accounts of the citizens and their predecessors
    /// * `citizens` - The public keys to remove from the list
    /// # Returns
    /// * `Result<()>` - Ok if every citizen is removed, Err otherwise
    pub fn remove_citizen_list(
        &mut self,
        remaining_accounts: &'info [AccountInfo<'info>],
        citizens: Vec<Pubkey>,
    ) -> Result<()> {
        require!(
            citizens.len() <= MAX_CITIZENS_PER_CALL,
            BorderCitizenListError::TooManyCitizens
        );

        let caller = self.authority.key();
        let mut nodes = CitizenNodeAccounts::load(remaining_accounts)?;
        let events = Dispatcher::new(&mut self.storage_proxy).forward(|logic, storage| {
            logic.remove_citizen_list(storage, &mut nodes, &caller, &citizens)
        })?;
        nodes.commit(
            &self.recipient.to_account_info(),
            &self.system_program.to_account_info(),
        )?;

        emit_all(&events);

        Ok(())
    }
}

/// Read the border citizen list through the active logic module
///
/// Reads that follow citizens take their node accounts, or the vacant node
/// PDAs of non-members, via remaining_accounts.
#[derive(Accounts)]
pub struct CitizenListView<'info> {
    /// The `StorageProxy` account
    /// # PDA Seeds
    /// - `STORAGE_PROXY_SEED`
    #[account(
        seeds = [STORAGE_PROXY_SEED],
        bump = storage_proxy.bump,
    )]
    pub storage_proxy: Account<'info, StorageProxy>,
}

impl<'info> CitizenListView<'info> {
    fn dispatcher(&self) -> Dispatcher<&StorageProxy> {
        Dispatcher::view(&self.storage_proxy)
    }

    pub fn is_citizen(
        &self,
        remaining_accounts: &'info [AccountInfo<'info>],
        citizen: Pubkey,
    ) -> Result<bool> {
        let nodes = CitizenNodeAccounts::load(remaining_accounts)?;
        self.dispatcher()
            .forward_view(|logic, storage| logic.is_citizen(storage, &nodes, &citizen))
    }

    pub fn citizen_count(&self) -> Result<u64> {
        self.dispatcher()
            .forward_view(|logic, storage| Ok(logic.citizen_count(storage)))
    }

    /// The whole list, only while it fits in the return data
    /// # Errors
    /// * `BorderCitizenListError::CitizenListTooLarge` - Past `MAX_CITIZENS_PER_LIST` citizens
    pub fn citizen_list(
        &self,
        remaining_accounts: &'info [AccountInfo<'info>],
    ) -> Result<Vec<Pubkey>> {
        let nodes = CitizenNodeAccounts::load(remaining_accounts)?;
        self.dispatcher().forward_view(|logic, storage| {
            check_list_size(logic.citizen_count(storage))?;
            logic.citizen_list(storage, &nodes)
        })
    }

    /// Up to `limit` citizens from `start`, the head when `None`
    /// # Errors
    /// * `BorderCitizenListError::InvalidPageLimit` - If `limit` is 0 or above `MAX_CITIZENS_PER_PAGE`
    pub fn citizen_list_page(
        &self,
        remaining_accounts: &'info [AccountInfo<'info>],
        start: Option<Pubkey>,
        limit: u8,
    ) -> Result<CitizenPage> {
        let limit = page_limit(limit)?;
        let nodes = CitizenNodeAccounts::load(remaining_accounts)?;
        self.dispatcher().forward_view(|logic, storage| {
            logic.citizen_list_page(storage, &nodes, start, limit)
        })
    }

    pub fn get_next_citizen(
        &self,
        remaining_accounts: &'info [AccountInfo<'info>],
        citizen: Pubkey,
    ) -> Result<Pubkey> {
        let nodes = CitizenNodeAccounts::load(remaining_accounts)?;
        self.dispatcher()
            .forward_view(|logic, storage| logic.get_next_citizen(storage, &nodes, &citizen))
    }

    pub fn is_initialized(&self) -> Result<bool> {
        self.dispatcher()
            .forward_view(|logic, storage| Ok(logic.is_initialized(storage)))
    }

    pub fn owner(&self) -> Result<Pubkey> {
        self.dispatcher()
            .forward_view(|logic, storage| Ok(logic.owner(storage)))
    }

    pub fn deployed_at_block(&self) -> Result<u64> {
        self.dispatcher()
            .forward_view(|logic, storage| Ok(logic.deployed_at_block(storage)))
    }

    pub fn interfaces_version(&self) -> Result<InterfacesVersion> {
        self.dispatcher().forward_view(|logic, _| {
            let (major, minor, patch) = logic.interfaces_version();
            Ok(InterfacesVersion {
                major,
                minor,
                patch,
            })
        })
    }
}
