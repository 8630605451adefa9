use anchor_lang::prelude::*;

use crate::{
    constants::{SENTINEL_ADDRESS, ZERO_ADDRESS},
    events::CitizenWhitelisted,
    state::{CitizenNodes, EternalStorage},
};

pub mod border_citizen_list_v1;
pub mod ownership;

pub use border_citizen_list_v1::*;
pub use ownership::*;

/// One page of the border citizen list, in insertion order
#[derive(AnchorSerialize, AnchorDeserialize, Clone, Debug, Default, PartialEq, Eq)]
pub struct CitizenPage {
    pub citizens: Vec<Pubkey>,

    /// First citizen of the following page, `None` once the tail was returned
    pub next: Option<Pubkey>,
}

/// Logic of the border citizen list.
///
/// Implementations hold no state of their own: every call receives the
/// `EternalStorage` cells and the `CitizenNodes` it operates on, so the
/// storage proxy can replace the logic module without migrating data.
/// Mutations return the events they produced, in call order. A rejected
/// call leaves both untouched; a node store error part-way through aborts
/// the instruction, which reverts every account.
pub trait BorderCitizenListLogic: Sync {
    /// Identifier the storage proxy records when upgrading to this module
    fn id(&self) -> Pubkey;

    /// Interface revision as `(major, minor, patch)`
    fn interfaces_version(&self) -> (u64, u64, u64);

    fn initialize(
        &self,
        storage: &mut EternalStorage,
        nodes: &mut dyn CitizenNodes,
        initial_citizens: &[Pubkey],
        owner: Pubkey,
        current_slot: u64,
    ) -> Result<()>;

    fn is_initialized(&self, storage: &EternalStorage) -> bool;

    fn owner(&self, storage: &EternalStorage) -> Pubkey;

    fn deployed_at_block(&self, storage: &EternalStorage) -> u64;

    fn citizen_count(&self, storage: &EternalStorage) -> u64;

    fn is_citizen(
        &self,
        storage: &EternalStorage,
        nodes: &dyn CitizenNodes,
        citizen: &Pubkey,
    ) -> Result<bool>;

    fn citizen_list(&self, storage: &EternalStorage, nodes: &dyn CitizenNodes)
        -> Result<Vec<Pubkey>>;

    /// Up to `limit` citizens starting at `start`, or at the head when `start` is `None`
    fn citizen_list_page(
        &self,
        storage: &EternalStorage,
        nodes: &dyn CitizenNodes,
        start: Option<Pubkey>,
        limit: usize,
    ) -> Result<CitizenPage>;

    /// Successor of `citizen`, or the zero address for the tail and non-members
    fn get_next_citizen(
        &self,
        storage: &EternalStorage,
        nodes: &dyn CitizenNodes,
        citizen: &Pubkey,
    ) -> Result<Pubkey>;

    fn add_citizen(
        &self,
        storage: &mut EternalStorage,
        nodes: &mut dyn CitizenNodes,
        caller: &Pubkey,
        citizen: Pubkey,
    ) -> Result<CitizenWhitelisted>;

    fn add_citizen_list(
        &self,
        storage: &mut EternalStorage,
        nodes: &mut dyn CitizenNodes,
        caller: &Pubkey,
        citizens: &[Pubkey],
    ) -> Result<Vec<CitizenWhitelisted>>;

    fn remove_citizen(
        &self,
        storage: &mut EternalStorage,
        nodes: &mut dyn CitizenNodes,
        caller: &Pubkey,
        citizen: Pubkey,
    ) -> Result<CitizenWhitelisted>;

    fn remove_citizen_list(
        &self,
        storage: &mut EternalStorage,
        nodes: &mut dyn CitizenNodes,
        caller: &Pubkey,
        citizens: &[Pubkey],
    ) -> Result<Vec<CitizenWhitelisted>>;
}

/// Logic modules the storage proxy may be upgraded to
pub type LogicModules = &'static [&'static dyn BorderCitizenListLogic];

/// Every logic module deployed with this program
pub static LOGIC_MODULES: LogicModules = &[&BorderCitizenListV1];

/// Look up the logic module registered under `implementation`
pub fn resolve_logic(
    modules: LogicModules,
    implementation: &Pubkey,
) -> Option<&'static dyn BorderCitizenListLogic> {
    modules
        .iter()
        .copied()
        .find(|logic| logic.id() == *implementation)
}

/// True for the zero address and the sentinel, which are never citizens or owners
pub fn is_reserved_address(address: &Pubkey) -> bool {
    *address == ZERO_ADDRESS || *address == SENTINEL_ADDRESS
}
