use std::collections::BTreeSet;

use anchor_lang::prelude::*;

use crate::{
    constants::{
        BORDER_CITIZEN_LIST_V1_ID, BORDER_CITIZEN_LIST_V1_INTERFACES_VERSION, ZERO_ADDRESS,
    },
    errors::BorderCitizenListError,
    events::CitizenWhitelisted,
    registry::{is_reserved_address, only_owner, BorderCitizenListLogic, CitizenPage},
    state::{CitizenNode, CitizenNodes, EternalStorage, StorageKey},
};

/// Border citizen list kept as an intrusive singly linked list.
///
/// Each citizen owns a `CitizenNode` pointing at the next citizen in
/// insertion order; `Head` and `Tail` cells mark both ends. Appending and
/// membership tests touch a single node, removal asks the node store for the
/// predecessor.
#[derive(Clone, Copy, Debug, Default)]
pub struct BorderCitizenListV1;

impl BorderCitizenListV1 {
    /// Link `citizen` after the current tail. Performs no validation.
    fn append(
        storage: &mut EternalStorage,
        nodes: &mut dyn CitizenNodes,
        citizen: Pubkey,
    ) -> Result<()> {
        nodes.set_node(citizen, CitizenNode::member(None))?;

        match storage.get_address(StorageKey::Tail) {
            Some(tail) => {
                let mut tail_node = nodes.node(&tail)?;
                tail_node.next = Some(citizen);
                nodes.set_node(tail, tail_node)?;
            }
            None => storage.set_address(StorageKey::Head, citizen),
        }

        storage.set_address(StorageKey::Tail, citizen);

        Ok(())
    }

    /// Citizen linked right before `citizen`, `None` when `citizen` is the head
    fn predecessor(
        storage: &EternalStorage,
        nodes: &dyn CitizenNodes,
        citizen: &Pubkey,
    ) -> Result<Option<Pubkey>> {
        if storage.get_address(StorageKey::Head) == Some(*citizen) {
            return Ok(None);
        }

        nodes
            .predecessor(citizen)?
            .map(Some)
            .ok_or(BorderCitizenListError::MissingCitizenAccount.into())
    }

    /// Splice a member out of the list. Performs no validation.
    fn unlink(
        storage: &mut EternalStorage,
        nodes: &mut dyn CitizenNodes,
        citizen: &Pubkey,
    ) -> Result<()> {
        let next = nodes.node(citizen)?.next;
        let predecessor = Self::predecessor(storage, nodes, citizen)?;

        match (predecessor, next) {
            (Some(previous), _) => {
                let mut previous_node = nodes.node(&previous)?;
                previous_node.next = next;
                nodes.set_node(previous, previous_node)?;
            }
            (None, Some(next)) => storage.set_address(StorageKey::Head, next),
            (None, None) => storage.delete_address(StorageKey::Head),
        }

        if next.is_none() {
            match predecessor {
                Some(previous) => storage.set_address(StorageKey::Tail, previous),
                None => storage.delete_address(StorageKey::Tail),
            }
        }

        nodes.delete_node(citizen)
    }

    /// Check every entry of `citizens` can be appended, in order
    fn validate_additions(nodes: &dyn CitizenNodes, citizens: &[Pubkey]) -> Result<()> {
        let mut batch = BTreeSet::new();
        for citizen in citizens {
            require!(
                !is_reserved_address(citizen),
                BorderCitizenListError::InvalidCitizen
            );
            require!(
                !nodes.node(citizen)?.exists && batch.insert(*citizen),
                BorderCitizenListError::AlreadyCitizen
            );
        }

        Ok(())
    }

    /// Check every entry of `citizens` can be removed, in order
    fn validate_removals(nodes: &dyn CitizenNodes, citizens: &[Pubkey]) -> Result<()> {
        let mut batch = BTreeSet::new();
        for citizen in citizens {
            require!(
                !is_reserved_address(citizen),
                BorderCitizenListError::NotCitizen
            );
            require!(
                nodes.node(citizen)?.exists && batch.insert(*citizen),
                BorderCitizenListError::NotCitizen
            );
        }

        Ok(())
    }

    fn count_after(storage: &EternalStorage, added: usize, removed: usize) -> Result<u64> {
        storage
            .get_u64(StorageKey::CitizenCount)
            .checked_add(added as u64)
            .and_then(|count| count.checked_sub(removed as u64))
            .ok_or(BorderCitizenListError::MathOverflow.into())
    }
}

impl BorderCitizenListLogic for BorderCitizenListV1 {
    fn id(&self) -> Pubkey {
        BORDER_CITIZEN_LIST_V1_ID
    }

    fn interfaces_version(&self) -> (u64, u64, u64) {
        BORDER_CITIZEN_LIST_V1_INTERFACES_VERSION
    }

    /// Link the initial citizens in the given order and record the owner
    /// # Arguments
    /// * `initial_citizens` - Citizens to link, the first one becomes the head
    /// * `owner` - The account allowed to add and remove citizens
    /// * `current_slot` - Recorded as the deployment block
    /// # Errors
    /// * `BorderCitizenListError::AlreadyInitialized` - If called a second time
    /// * `BorderCitizenListError::InvalidOwner` - If `owner` is the zero or sentinel address
    /// * `BorderCitizenListError::InvalidCitizen` - If an entry is reserved or repeated
    fn initialize(
        &self,
        storage: &mut EternalStorage,
        nodes: &mut dyn CitizenNodes,
        initial_citizens: &[Pubkey],
        owner: Pubkey,
        current_slot: u64,
    ) -> Result<()> {
        require!(
            !storage.get_bool(StorageKey::Initialized),
            BorderCitizenListError::AlreadyInitialized
        );
        require!(
            !is_reserved_address(&owner),
            BorderCitizenListError::InvalidOwner
        );

        let mut batch = BTreeSet::new();
        for citizen in initial_citizens {
            require!(
                !is_reserved_address(citizen) && batch.insert(*citizen),
                BorderCitizenListError::InvalidCitizen
            );
        }
        let count = Self::count_after(storage, initial_citizens.len(), 0)?;

        for citizen in initial_citizens {
            Self::append(storage, nodes, *citizen)?;
        }
        storage.set_u64(StorageKey::CitizenCount, count);
        storage.set_u64(StorageKey::DeployedAtBlock, current_slot);
        storage.set_address(StorageKey::Owner, owner);
        storage.set_bool(StorageKey::Initialized, true);

        Ok(())
    }

    fn is_initialized(&self, storage: &EternalStorage) -> bool {
        storage.get_bool(StorageKey::Initialized)
    }

    fn owner(&self, storage: &EternalStorage) -> Pubkey {
        storage
            .get_address(StorageKey::Owner)
            .unwrap_or(ZERO_ADDRESS)
    }

    fn deployed_at_block(&self, storage: &EternalStorage) -> u64 {
        storage.get_u64(StorageKey::DeployedAtBlock)
    }

    fn citizen_count(&self, storage: &EternalStorage) -> u64 {
        storage.get_u64(StorageKey::CitizenCount)
    }

    fn is_citizen(
        &self,
        _storage: &EternalStorage,
        nodes: &dyn CitizenNodes,
        citizen: &Pubkey,
    ) -> Result<bool> {
        if is_reserved_address(citizen) {
            return Ok(false);
        }

        Ok(nodes.node(citizen)?.exists)
    }

    fn citizen_list(
        &self,
        storage: &EternalStorage,
        nodes: &dyn CitizenNodes,
    ) -> Result<Vec<Pubkey>> {
        let page = self.citizen_list_page(storage, nodes, None, usize::MAX)?;
        Ok(page.citizens)
    }

    /// Walk the list from `start`
    /// # Errors
    /// * `BorderCitizenListError::Uninitialized` - Before initialization
    /// * `BorderCitizenListError::NotCitizen` - If `start` is not a member
    fn citizen_list_page(
        &self,
        storage: &EternalStorage,
        nodes: &dyn CitizenNodes,
        start: Option<Pubkey>,
        limit: usize,
    ) -> Result<CitizenPage> {
        require!(
            self.is_initialized(storage),
            BorderCitizenListError::Uninitialized
        );

        let mut cursor = match start {
            Some(citizen) => {
                require!(
                    self.is_citizen(storage, nodes, &citizen)?,
                    BorderCitizenListError::NotCitizen
                );
                Some(citizen)
            }
            None => storage.get_address(StorageKey::Head),
        };

        let capacity = limit.min(self.citizen_count(storage) as usize);
        let mut citizens = Vec::with_capacity(capacity);
        while let Some(citizen) = cursor {
            if citizens.len() == limit {
                break;
            }
            citizens.push(citizen);
            cursor = nodes.node(&citizen)?.next;
        }

        Ok(CitizenPage {
            citizens,
            next: cursor,
        })
    }

    fn get_next_citizen(
        &self,
        storage: &EternalStorage,
        nodes: &dyn CitizenNodes,
        citizen: &Pubkey,
    ) -> Result<Pubkey> {
        if !self.is_citizen(storage, nodes, citizen)? {
            return Ok(ZERO_ADDRESS);
        }

        Ok(nodes.node(citizen)?.next.unwrap_or(ZERO_ADDRESS))
    }

    fn add_citizen(
        &self,
        storage: &mut EternalStorage,
        nodes: &mut dyn CitizenNodes,
        caller: &Pubkey,
        citizen: Pubkey,
    ) -> Result<CitizenWhitelisted> {
        let mut events = self.add_citizen_list(storage, nodes, caller, &[citizen])?;
        events.pop().ok_or(BorderCitizenListError::InvalidCitizen.into())
    }

    /// Append `citizens` in order, either all of them or none
    /// # Errors
    /// * `BorderCitizenListError::Uninitialized` / `Unauthorized` - From the ownership guard
    /// * `BorderCitizenListError::InvalidCitizen` - If an entry is the zero or sentinel address
    /// * `BorderCitizenListError::AlreadyCitizen` - If an entry is a member or repeated in the batch
    fn add_citizen_list(
        &self,
        storage: &mut EternalStorage,
        nodes: &mut dyn CitizenNodes,
        caller: &Pubkey,
        citizens: &[Pubkey],
    ) -> Result<Vec<CitizenWhitelisted>> {
        only_owner(storage, caller)?;
        Self::validate_additions(nodes, citizens)?;
        let count = Self::count_after(storage, citizens.len(), 0)?;

        for citizen in citizens {
            Self::append(storage, nodes, *citizen)?;
        }
        storage.set_u64(StorageKey::CitizenCount, count);

        Ok(citizens
            .iter()
            .copied()
            .map(CitizenWhitelisted::added)
            .collect())
    }

    fn remove_citizen(
        &self,
        storage: &mut EternalStorage,
        nodes: &mut dyn CitizenNodes,
        caller: &Pubkey,
        citizen: Pubkey,
    ) -> Result<CitizenWhitelisted> {
        let mut events = self.remove_citizen_list(storage, nodes, caller, &[citizen])?;
        events.pop().ok_or(BorderCitizenListError::NotCitizen.into())
    }

    /// Unlink `citizens` in order, either all of them or none
    /// # Errors
    /// * `BorderCitizenListError::Uninitialized` / `Unauthorized` - From the ownership guard
    /// * `BorderCitizenListError::NotCitizen` - If an entry is not a member or repeated in the batch
    /// * `BorderCitizenListError::MissingCitizenAccount` - If a predecessor node was not provided
    fn remove_citizen_list(
        &self,
        storage: &mut EternalStorage,
        nodes: &mut dyn CitizenNodes,
        caller: &Pubkey,
        citizens: &[Pubkey],
    ) -> Result<Vec<CitizenWhitelisted>> {
        only_owner(storage, caller)?;
        Self::validate_removals(nodes, citizens)?;
        let count = Self::count_after(storage, 0, citizens.len())?;

        for citizen in citizens {
            Self::unlink(storage, nodes, citizen)?;
        }
        storage.set_u64(StorageKey::CitizenCount, count);

        Ok(citizens
            .iter()
            .copied()
            .map(CitizenWhitelisted::removed)
            .collect())
    }
}
