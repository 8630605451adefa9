use anchor_lang::prelude::*;

/// Linked list node of a single citizen
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct CitizenNode {
    // The next citizen in insertion order, `None` for the tail
    pub next: Option<Pubkey>,

    // True while the citizen is a member
    pub exists: bool,
}

impl CitizenNode {
    pub const fn member(next: Option<Pubkey>) -> Self {
        Self { next, exists: true }
    }
}

/// Where the citizen nodes of the list are kept.
///
/// Nodes are addressed by citizen, one per member. A store only has to
/// answer for the citizens it was handed: asking about any other citizen
/// fails with `BorderCitizenListError::MissingCitizenAccount`.
pub trait CitizenNodes {
    /// Node of `citizen`, `CitizenNode::default()` for a non-member
    fn node(&self, citizen: &Pubkey) -> Result<CitizenNode>;

    fn set_node(&mut self, citizen: Pubkey, node: CitizenNode) -> Result<()>;

    fn delete_node(&mut self, citizen: &Pubkey) -> Result<()>;

    /// Member whose `next` is `citizen`, `None` if there is none
    fn predecessor(&self, citizen: &Pubkey) -> Result<Option<Pubkey>>;
}

#[cfg(test)]
pub use memory::MemoryCitizenNodes;
