use anchor_lang::prelude::*;
use anchor_lang::system_program::{self, Allocate, Assign, CreateAccount, Transfer};

use crate::{
    constants::CITIZEN_NODE_SEED,
    errors::BorderCitizenListError,
    state::{CitizenNode, CitizenNodes},
};

/// Citizen node account - one per member of the border citizen list.
///
/// Presence of the account marks membership; `next` links the members in
/// insertion order.
#[account]
#[derive(InitSpace, Debug, PartialEq, Eq)]
pub struct CitizenNodeAccount {
    // The citizen this node belongs to
    pub citizen: Pubkey,

    // The next citizen in insertion order, `None` for the tail
    pub next: Option<Pubkey>,

    // The bump used to derive the PDA for this account
    pub bump: u8,
}

impl CitizenNodeAccount {
    /// Account size including the discriminator
    pub const SPACE: usize = 8 + Self::INIT_SPACE;

    /// PDA of the node of `citizen`
    /// # PDA Seeds
    /// - `CITIZEN_NODE_SEED`
    /// - The citizen's address
    pub fn address(citizen: &Pubkey) -> (Pubkey, u8) {
        Pubkey::find_program_address(&[CITIZEN_NODE_SEED, citizen.as_ref()], &crate::ID)
    }
}

/// Write needed to persist a node account once the instruction succeeds
#[derive(Debug, PartialEq, Eq)]
pub enum NodeChange {
    Create(CitizenNodeAccount),
    Update(CitizenNodeAccount),
    Close,
}

/// A node account passed to the instruction
struct NodeSlot<'a, 'info> {
    info: &'a AccountInfo<'info>,

    // Citizen and bump of the account, unknown for a vacant account until it is written
    owner_citizen: Option<(Pubkey, u8)>,

    // Node as loaded from the account
    stored: CitizenNode,

    // Node after the instruction's changes
    current: CitizenNode,
}

/// `CitizenNodes` backed by the node accounts passed through `remaining_accounts`.
///
/// Each account is either an existing `CitizenNodeAccount` or the vacant PDA
/// of a citizen that is not a member. Changes are kept in memory until
/// `commit`, which creates, rewrites and closes the accounts.
pub struct CitizenNodeAccounts<'a, 'info> {
    slots: Vec<NodeSlot<'a, 'info>>,
}

impl<'a, 'info> CitizenNodeAccounts<'a, 'info> {
    /// Load the node accounts
    /// # Arguments
    /// * `accounts` - Existing node accounts and vacant node PDAs, in any order
    /// # Errors
    /// * `BorderCitizenListError::InvalidCitizenAccount` - If an account is neither a node
    ///   account at its PDA nor an empty system account, or is passed twice
    pub fn load(accounts: &'a [AccountInfo<'info>]) -> Result<Self> {
        let mut slots: Vec<NodeSlot<'a, 'info>> = Vec::with_capacity(accounts.len());

        for info in accounts {
            require!(
                slots.iter().all(|slot| slot.info.key != info.key),
                BorderCitizenListError::InvalidCitizenAccount
            );

            let slot = if *info.owner == crate::ID {
                let data = info.try_borrow_data()?;
                let account = CitizenNodeAccount::try_deserialize(&mut &data[..])?;
                let address = Pubkey::create_program_address(
                    &[CITIZEN_NODE_SEED, account.citizen.as_ref(), &[account.bump]],
                    &crate::ID,
                )
                .map_err(|_| BorderCitizenListError::InvalidCitizenAccount)?;
                require_keys_eq!(
                    address,
                    info.key(),
                    BorderCitizenListError::InvalidCitizenAccount
                );

                let node = CitizenNode::member(account.next);
                NodeSlot {
                    info,
                    owner_citizen: Some((account.citizen, account.bump)),
                    stored: node,
                    current: node,
                }
            } else {
                require!(
                    *info.owner == system_program::ID && info.data_is_empty(),
                    BorderCitizenListError::InvalidCitizenAccount
                );

                NodeSlot {
                    info,
                    owner_citizen: None,
                    stored: CitizenNode::default(),
                    current: CitizenNode::default(),
                }
            };
            slots.push(slot);
        }

        Ok(Self { slots })
    }

    /// Index of the slot holding `citizen`, with the bump when it had to be derived
    fn locate(&self, citizen: &Pubkey) -> Result<(usize, Option<u8>)> {
        if let Some(index) = self
            .slots
            .iter()
            .position(|slot| matches!(slot.owner_citizen, Some((owner, _)) if owner == *citizen))
        {
            return Ok((index, None));
        }

        let (address, bump) = CitizenNodeAccount::address(citizen);
        self.slots
            .iter()
            .position(|slot| slot.owner_citizen.is_none() && *slot.info.key == address)
            .map(|index| (index, Some(bump)))
            .ok_or(BorderCitizenListError::MissingCitizenAccount.into())
    }

    /// Writes needed to persist the in-memory changes, in account order
    pub fn changes(&self) -> Vec<(&'a AccountInfo<'info>, NodeChange)> {
        self.slots
            .iter()
            .filter_map(|slot| {
                let (citizen, bump) = slot.owner_citizen?;
                let account = CitizenNodeAccount {
                    citizen,
                    next: slot.current.next,
                    bump,
                };

                let change = match (slot.stored.exists, slot.current.exists) {
                    (false, true) => NodeChange::Create(account),
                    (true, true) if slot.stored != slot.current => NodeChange::Update(account),
                    (true, false) => NodeChange::Close,
                    _ => return None,
                };
                Some((slot.info, change))
            })
            .collect()
    }

    /// Persist the in-memory changes
    /// # Arguments
    /// * `rent_account` - Funds created accounts and receives the lamports of closed ones,
    ///   must sign when an account is created
    /// * `system_program` - The system program
    pub fn commit(
        &self,
        rent_account: &AccountInfo<'info>,
        system_program: &AccountInfo<'info>,
    ) -> Result<()> {
        for (info, change) in self.changes() {
            require!(
                info.is_writable,
                BorderCitizenListError::InvalidCitizenAccount
            );

            match change {
                NodeChange::Create(account) => {
                    create_node_account(info, &account, rent_account, system_program)?;
                    write_node_account(info, &account)?;
                }
                NodeChange::Update(account) => write_node_account(info, &account)?,
                NodeChange::Close => close_node_account(info, rent_account)?,
            }
        }

        Ok(())
    }
}

impl CitizenNodes for CitizenNodeAccounts<'_, '_> {
    fn node(&self, citizen: &Pubkey) -> Result<CitizenNode> {
        let (index, _) = self.locate(citizen)?;
        Ok(self.slots[index].current)
    }

    fn set_node(&mut self, citizen: Pubkey, node: CitizenNode) -> Result<()> {
        let (index, derived_bump) = self.locate(&citizen)?;
        let slot = &mut self.slots[index];
        if let Some(bump) = derived_bump {
            slot.owner_citizen = Some((citizen, bump));
        }
        slot.current = node;

        Ok(())
    }

    fn delete_node(&mut self, citizen: &Pubkey) -> Result<()> {
        let (index, _) = self.locate(citizen)?;
        self.slots[index].current = CitizenNode::default();

        Ok(())
    }

    fn predecessor(&self, citizen: &Pubkey) -> Result<Option<Pubkey>> {
        Ok(self
            .slots
            .iter()
            .find(|slot| slot.current.exists && slot.current.next == Some(*citizen))
            .and_then(|slot| slot.owner_citizen)
            .map(|(owner, _)| owner))
    }
}

/// Create the PDA of a node account, funded by `payer`
fn create_node_account<'info>(
    info: &AccountInfo<'info>,
    account: &CitizenNodeAccount,
    payer: &AccountInfo<'info>,
    system_program: &AccountInfo<'info>,
) -> Result<()> {
    let bump = [account.bump];
    let seeds: &[&[u8]] = &[CITIZEN_NODE_SEED, account.citizen.as_ref(), &bump];
    let signer_seeds = &[seeds];
    let space = CitizenNodeAccount::SPACE as u64;
    let rent_exempt = Rent::get()?.minimum_balance(CitizenNodeAccount::SPACE);

    if info.lamports() == 0 {
        return system_program::create_account(
            CpiContext::new_with_signer(
                system_program.clone(),
                CreateAccount {
                    from: payer.clone(),
                    to: info.clone(),
                },
                signer_seeds,
            ),
            rent_exempt,
            space,
            &crate::ID,
        );
    }

    // Someone already sent lamports to the PDA, top it up and take it over
    let shortfall = rent_exempt.saturating_sub(info.lamports());
    if shortfall > 0 {
        system_program::transfer(
            CpiContext::new(
                system_program.clone(),
                Transfer {
                    from: payer.clone(),
                    to: info.clone(),
                },
            ),
            shortfall,
        )?;
    }
    system_program::allocate(
        CpiContext::new_with_signer(
            system_program.clone(),
            Allocate {
                account_to_allocate: info.clone(),
            },
            signer_seeds,
        ),
        space,
    )?;
    system_program::assign(
        CpiContext::new_with_signer(
            system_program.clone(),
            Assign {
                account_to_assign: info.clone(),
            },
            signer_seeds,
        ),
        &crate::ID,
    )
}

fn write_node_account(info: &AccountInfo, account: &CitizenNodeAccount) -> Result<()> {
    let mut data = info.try_borrow_mut_data()?;
    let mut writer: &mut [u8] = &mut data[..];
    account.try_serialize(&mut writer)
}

/// Close a node account, sending its lamports to `recipient`
fn close_node_account<'info>(
    info: &AccountInfo<'info>,
    recipient: &AccountInfo<'info>,
) -> Result<()> {
    let lamports = info.lamports();
    let balance = recipient
        .lamports()
        .checked_add(lamports)
        .ok_or(BorderCitizenListError::MathOverflow)?;

    **recipient.try_borrow_mut_lamports()? = balance;
    **info.try_borrow_mut_lamports()? = 0;

    // Reallocate account to zero size
    info.resize(0)?;

    // Assign account to system program
    info.assign(&system_program::ID);

    msg!("Citizen node account closed: {}", info.key());

    Ok(())
}

/// Node and vacant accounts laid out the way the runtime hands them to the program
#[cfg(test)]
pub struct TestAccount {
    pub key: Pubkey,
    pub lamports: u64,
    pub data: Vec<u8>,
    pub owner: Pubkey,
}

#[cfg(test)]
impl TestAccount {
    /// The node account of a member
    pub fn node(citizen: Pubkey, next: Option<Pubkey>) -> Self {
        let (key, bump) = CitizenNodeAccount::address(&citizen);
        let mut data = Vec::with_capacity(CitizenNodeAccount::SPACE);
        CitizenNodeAccount {
            citizen,
            next,
            bump,
        }
        .try_serialize(&mut data)
        .unwrap();

        Self {
            key,
            lamports: 1_000_000,
            data,
            owner: crate::ID,
        }
    }

    /// The not yet created node PDA of a non-member
    pub fn vacant(citizen: &Pubkey) -> Self {
        Self {
            key: CitizenNodeAccount::address(citizen).0,
            lamports: 0,
            data: Vec::new(),
            owner: system_program::ID,
        }
    }

    /// Node accounts for `list`, linked in order
    pub fn list(list: &[Pubkey]) -> Vec<Self> {
        list.iter()
            .enumerate()
            .map(|(i, citizen)| Self::node(*citizen, list.get(i + 1).copied()))
            .collect()
    }

    pub fn info(&mut self) -> AccountInfo<'_> {
        AccountInfo::new(
            &self.key,
            false,
            true,
            &mut self.lamports,
            &mut self.data,
            &self.owner,
            false,
            0,
        )
    }
}
