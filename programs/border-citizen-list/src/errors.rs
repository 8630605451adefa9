use anchor_lang::prelude::*;

#[error_code]
pub enum BorderCitizenListError {
    #[msg("Caller is not authorized")]
    Unauthorized,
    #[msg("Border citizen list already initialized")]
    AlreadyInitialized,
    #[msg("Border citizen list not initialized")]
    Uninitialized,
    #[msg("Invalid Owner")]
    InvalidOwner,
    #[msg("Invalid Address")]
    InvalidAddress,
    #[msg("Invalid Citizen")]
    InvalidCitizen,
    #[msg("Address is already a citizen")]
    AlreadyCitizen,
    #[msg("Address is not a citizen")]
    NotCitizen,
    #[msg("Invalid Implementation")]
    InvalidImplementation,
    #[msg("ProgramMismatch")]
    ProgramMismatch,
    #[msg("Too many citizens in a single call")]
    TooManyCitizens,
    #[msg("Math Overflow")]
    MathOverflow,
    #[msg("Citizen node account not provided")]
    MissingCitizenAccount,
    #[msg("Invalid citizen node account")]
    InvalidCitizenAccount,
    #[msg("Citizen list too large to return, read it by page")]
    CitizenListTooLarge,
    #[msg("Invalid page limit")]
    InvalidPageLimit,
}
