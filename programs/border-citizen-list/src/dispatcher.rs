use std::ops::{Deref, DerefMut};

use anchor_lang::prelude::*;

use crate::{
    errors::BorderCitizenListError,
    events::{ProxyOwnershipTransferred, Upgraded},
    registry::{
        is_reserved_address, only_proxy_owner, resolve_logic, BorderCitizenListLogic,
        LogicModules, LOGIC_MODULES,
    },
    state::{CitizenNodes, EternalStorage, StorageProxy},
};

/// Routes border citizen list calls to the logic module recorded in a `StorageProxy`.
///
/// The logic always runs against the proxy's own `EternalStorage` and the
/// citizen nodes handed in by the caller, never against state of its own, so
/// upgrading the module keeps every citizen.
/// A dispatcher over `&StorageProxy` serves reads, one over
/// `&mut StorageProxy` also serves upgrades and mutations.
pub struct Dispatcher<P> {
    proxy: P,
    modules: LogicModules,
}

impl<'a> Dispatcher<&'a mut StorageProxy> {
    pub fn new(proxy: &'a mut StorageProxy) -> Self {
        Self::with_modules(proxy, LOGIC_MODULES)
    }
}

impl<'a> Dispatcher<&'a StorageProxy> {
    pub fn view(proxy: &'a StorageProxy) -> Self {
        Self::with_modules(proxy, LOGIC_MODULES)
    }
}

impl<P: Deref<Target = StorageProxy>> Dispatcher<P> {
    pub fn with_modules(proxy: P, modules: LogicModules) -> Self {
        Self { proxy, modules }
    }

    pub fn proxy_owner(&self) -> Pubkey {
        self.proxy.proxy_owner
    }

    pub fn implementation(&self) -> Pubkey {
        self.proxy.implementation
    }

    pub fn version(&self) -> u64 {
        self.proxy.version
    }

    /// The active logic module
    /// # Errors
    /// * `BorderCitizenListError::InvalidImplementation` - If no known module is bound
    pub fn logic(&self) -> Result<&'static dyn BorderCitizenListLogic> {
        resolve_logic(self.modules, &self.proxy.implementation)
            .ok_or(BorderCitizenListError::InvalidImplementation.into())
    }

    /// Check `caller` may move the proxy to `implementation` at `version`
    fn validate_upgrade(
        &self,
        caller: &Pubkey,
        version: u64,
        implementation: &Pubkey,
    ) -> Result<&'static dyn BorderCitizenListLogic> {
        only_proxy_owner(&self.proxy, caller)?;
        require!(
            version > self.proxy.version,
            BorderCitizenListError::InvalidImplementation
        );
        require!(
            *implementation != self.proxy.implementation,
            BorderCitizenListError::InvalidImplementation
        );

        resolve_logic(self.modules, implementation)
            .ok_or(BorderCitizenListError::InvalidImplementation.into())
    }

    /// Run a read-only call on the active module against the proxy's storage
    pub fn forward_view<R>(
        &self,
        call: impl FnOnce(&dyn BorderCitizenListLogic, &EternalStorage) -> Result<R>,
    ) -> Result<R> {
        let logic = self.logic()?;
        call(logic, &self.proxy.storage)
    }
}

impl<P: DerefMut<Target = StorageProxy>> Dispatcher<P> {
    fn commit_upgrade(&mut self, version: u64, implementation: Pubkey) -> Upgraded {
        self.proxy.implementation = implementation;
        self.proxy.version = version;

        Upgraded {
            version,
            implementation,
        }
    }

    /// Point the proxy at a new logic module
    /// # Arguments
    /// * `caller` - Must be the proxy owner
    /// * `version` - Must be greater than the current version
    /// * `implementation` - Identifier of a known logic module other than the current one
    /// # Errors
    /// * `BorderCitizenListError::Unauthorized` - If `caller` is not the proxy owner
    /// * `BorderCitizenListError::InvalidImplementation` - If the module or version is rejected
    pub fn upgrade_to(
        &mut self,
        caller: &Pubkey,
        version: u64,
        implementation: Pubkey,
    ) -> Result<Upgraded> {
        self.validate_upgrade(caller, version, &implementation)?;

        Ok(self.commit_upgrade(version, implementation))
    }

    /// Upgrade and initialize the list through the new module in one step.
    /// The upgrade is only recorded when the initialization succeeds.
    #[allow(clippy::too_many_arguments)]
    pub fn upgrade_to_and_initialize(
        &mut self,
        caller: &Pubkey,
        version: u64,
        implementation: Pubkey,
        nodes: &mut dyn CitizenNodes,
        initial_citizens: &[Pubkey],
        owner: Pubkey,
        current_slot: u64,
    ) -> Result<Upgraded> {
        let logic = self.validate_upgrade(caller, version, &implementation)?;
        logic.initialize(
            &mut self.proxy.storage,
            nodes,
            initial_citizens,
            owner,
            current_slot,
        )?;

        Ok(self.commit_upgrade(version, implementation))
    }

    /// Hand the proxy over to `new_owner`
    /// # Errors
    /// * `BorderCitizenListError::Unauthorized` - If `caller` is not the proxy owner
    /// * `BorderCitizenListError::InvalidAddress` - If `new_owner` is the zero or sentinel address
    pub fn transfer_proxy_ownership(
        &mut self,
        caller: &Pubkey,
        new_owner: Pubkey,
    ) -> Result<ProxyOwnershipTransferred> {
        only_proxy_owner(&self.proxy, caller)?;
        require!(
            !is_reserved_address(&new_owner),
            BorderCitizenListError::InvalidAddress
        );

        let previous_owner = self.proxy.proxy_owner;
        self.proxy.proxy_owner = new_owner;

        Ok(ProxyOwnershipTransferred {
            previous_owner,
            new_owner,
        })
    }

    /// Run a mutating call on the active module against the proxy's storage
    pub fn forward<R>(
        &mut self,
        call: impl FnOnce(&dyn BorderCitizenListLogic, &mut EternalStorage) -> Result<R>,
    ) -> Result<R> {
        let logic = self.logic()?;
        call(logic, &mut self.proxy.storage)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        constants::{BORDER_CITIZEN_LIST_V1_ID, SENTINEL_ADDRESS, ZERO_ADDRESS},
        events::CitizenWhitelisted,
        registry::{BorderCitizenListV1, CitizenPage},
        state::MemoryCitizenNodes,
    };

    const DEPLOY_SLOT: u64 = 77;

    /// Second revision used to exercise upgrades: same behavior as v1 under a new id
    struct BorderCitizenListV2;

    const BORDER_CITIZEN_LIST_V2_ID: Pubkey = Pubkey::new_from_array([2u8; 32]);

    impl BorderCitizenListLogic for BorderCitizenListV2 {
        fn id(&self) -> Pubkey {
            BORDER_CITIZEN_LIST_V2_ID
        }

        fn interfaces_version(&self) -> (u64, u64, u64) {
            (1, 1, 0)
        }

        fn initialize(
            &self,
            storage: &mut EternalStorage,
            nodes: &mut dyn CitizenNodes,
            initial_citizens: &[Pubkey],
            owner: Pubkey,
            current_slot: u64,
        ) -> Result<()> {
            BorderCitizenListV1.initialize(storage, nodes, initial_citizens, owner, current_slot)
        }

        fn is_initialized(&self, storage: &EternalStorage) -> bool {
            BorderCitizenListV1.is_initialized(storage)
        }

        fn owner(&self, storage: &EternalStorage) -> Pubkey {
            BorderCitizenListV1.owner(storage)
        }

        fn deployed_at_block(&self, storage: &EternalStorage) -> u64 {
            BorderCitizenListV1.deployed_at_block(storage)
        }

        fn citizen_count(&self, storage: &EternalStorage) -> u64 {
            BorderCitizenListV1.citizen_count(storage)
        }

        fn is_citizen(
            &self,
            storage: &EternalStorage,
            nodes: &dyn CitizenNodes,
            citizen: &Pubkey,
        ) -> Result<bool> {
            BorderCitizenListV1.is_citizen(storage, nodes, citizen)
        }

        fn citizen_list(
            &self,
            storage: &EternalStorage,
            nodes: &dyn CitizenNodes,
        ) -> Result<Vec<Pubkey>> {
            BorderCitizenListV1.citizen_list(storage, nodes)
        }

        fn citizen_list_page(
            &self,
            storage: &EternalStorage,
            nodes: &dyn CitizenNodes,
            start: Option<Pubkey>,
            limit: usize,
        ) -> Result<CitizenPage> {
            BorderCitizenListV1.citizen_list_page(storage, nodes, start, limit)
        }

        fn get_next_citizen(
            &self,
            storage: &EternalStorage,
            nodes: &dyn CitizenNodes,
            citizen: &Pubkey,
        ) -> Result<Pubkey> {
            BorderCitizenListV1.get_next_citizen(storage, nodes, citizen)
        }

        fn add_citizen(
            &self,
            storage: &mut EternalStorage,
            nodes: &mut dyn CitizenNodes,
            caller: &Pubkey,
            citizen: Pubkey,
        ) -> Result<CitizenWhitelisted> {
            BorderCitizenListV1.add_citizen(storage, nodes, caller, citizen)
        }

        fn add_citizen_list(
            &self,
            storage: &mut EternalStorage,
            nodes: &mut dyn CitizenNodes,
            caller: &Pubkey,
            citizens: &[Pubkey],
        ) -> Result<Vec<CitizenWhitelisted>> {
            BorderCitizenListV1.add_citizen_list(storage, nodes, caller, citizens)
        }

        fn remove_citizen(
            &self,
            storage: &mut EternalStorage,
            nodes: &mut dyn CitizenNodes,
            caller: &Pubkey,
            citizen: Pubkey,
        ) -> Result<CitizenWhitelisted> {
            BorderCitizenListV1.remove_citizen(storage, nodes, caller, citizen)
        }

        fn remove_citizen_list(
            &self,
            storage: &mut EternalStorage,
            nodes: &mut dyn CitizenNodes,
            caller: &Pubkey,
            citizens: &[Pubkey],
        ) -> Result<Vec<CitizenWhitelisted>> {
            BorderCitizenListV1.remove_citizen_list(storage, nodes, caller, citizens)
        }
    }

    static TEST_MODULES: LogicModules = &[&BorderCitizenListV1, &BorderCitizenListV2];

    fn proxy_owned_by(proxy_owner: Pubkey) -> StorageProxy {
        StorageProxy {
            proxy_owner,
            ..Default::default()
        }
    }

    fn assert_error<T: std::fmt::Debug>(result: Result<T>, expected: BorderCitizenListError) {
        assert_eq!(result.unwrap_err(), expected.into());
    }

    #[test]
    fn test_unconfigured_proxy_rejects_forwarded_calls() {
        let mut proxy = proxy_owned_by(Pubkey::new_unique());
        let mut nodes = MemoryCitizenNodes::default();
        let mut dispatcher = Dispatcher::new(&mut proxy);

        assert_error(
            dispatcher.forward_view(|logic, storage| Ok(logic.citizen_count(storage))),
            BorderCitizenListError::InvalidImplementation,
        );
        assert_error(
            dispatcher.forward(|logic, storage| {
                logic.initialize(storage, &mut nodes, &[], Pubkey::new_unique(), DEPLOY_SLOT)
            }),
            BorderCitizenListError::InvalidImplementation,
        );
    }

    #[test]
    fn test_upgrade_to() {
        let proxy_owner = Pubkey::new_unique();
        let mut proxy = proxy_owned_by(proxy_owner);
        let mut dispatcher = Dispatcher::new(&mut proxy);

        let event = dispatcher
            .upgrade_to(&proxy_owner, 1, BORDER_CITIZEN_LIST_V1_ID)
            .unwrap();

        assert_eq!(
            event,
            Upgraded {
                version: 1,
                implementation: BORDER_CITIZEN_LIST_V1_ID,
            }
        );
        assert_eq!(dispatcher.implementation(), BORDER_CITIZEN_LIST_V1_ID);
        assert_eq!(dispatcher.version(), 1);
        assert_eq!(dispatcher.logic().unwrap().id(), BORDER_CITIZEN_LIST_V1_ID);
    }

    #[test]
    fn test_upgrade_to_rejections() {
        let proxy_owner = Pubkey::new_unique();
        let mut proxy = proxy_owned_by(proxy_owner);
        let mut dispatcher = Dispatcher::with_modules(&mut proxy, TEST_MODULES);

        assert_error(
            dispatcher.upgrade_to(&Pubkey::new_unique(), 1, BORDER_CITIZEN_LIST_V1_ID),
            BorderCitizenListError::Unauthorized,
        );
        assert_error(
            dispatcher.upgrade_to(&proxy_owner, 1, Pubkey::new_unique()),
            BorderCitizenListError::InvalidImplementation,
        );
        assert_error(
            dispatcher.upgrade_to(&proxy_owner, 0, BORDER_CITIZEN_LIST_V1_ID),
            BorderCitizenListError::InvalidImplementation,
        );

        dispatcher
            .upgrade_to(&proxy_owner, 5, BORDER_CITIZEN_LIST_V1_ID)
            .unwrap();

        // Same module again, or a version that does not strictly increase
        assert_error(
            dispatcher.upgrade_to(&proxy_owner, 6, BORDER_CITIZEN_LIST_V1_ID),
            BorderCitizenListError::InvalidImplementation,
        );
        assert_error(
            dispatcher.upgrade_to(&proxy_owner, 5, BORDER_CITIZEN_LIST_V2_ID),
            BorderCitizenListError::InvalidImplementation,
        );
        assert_eq!(dispatcher.version(), 5);
        assert_eq!(dispatcher.implementation(), BORDER_CITIZEN_LIST_V1_ID);
    }

    #[test]
    fn test_state_survives_upgrade() {
        let proxy_owner = Pubkey::new_unique();
        let owner = Pubkey::new_unique();
        let [a, b, c] = [(); 3].map(|_| Pubkey::new_unique());
        let mut proxy = proxy_owned_by(proxy_owner);
        let mut nodes = MemoryCitizenNodes::default();
        let mut dispatcher = Dispatcher::with_modules(&mut proxy, TEST_MODULES);

        dispatcher
            .upgrade_to(&proxy_owner, 1, BORDER_CITIZEN_LIST_V1_ID)
            .unwrap();
        dispatcher
            .forward(|logic, storage| {
                logic.initialize(storage, &mut nodes, &[a, b], owner, DEPLOY_SLOT)
            })
            .unwrap();
        dispatcher
            .forward(|logic, storage| logic.add_citizen(storage, &mut nodes, &owner, c))
            .unwrap();

        dispatcher
            .upgrade_to(&proxy_owner, 2, BORDER_CITIZEN_LIST_V2_ID)
            .unwrap();

        let logic = dispatcher.logic().unwrap();
        assert_eq!(logic.interfaces_version(), (1, 1, 0));
        assert_eq!(
            dispatcher
                .forward_view(|logic, storage| logic.citizen_list(storage, &nodes))
                .unwrap(),
            vec![a, b, c]
        );
        assert_eq!(
            dispatcher
                .forward_view(|logic, storage| Ok(logic.owner(storage)))
                .unwrap(),
            owner
        );
        assert_eq!(
            dispatcher
                .forward_view(|logic, storage| Ok(logic.deployed_at_block(storage)))
                .unwrap(),
            DEPLOY_SLOT
        );

        let event = dispatcher
            .forward(|logic, storage| logic.remove_citizen(storage, &mut nodes, &owner, a))
            .unwrap();
        assert_eq!(event, CitizenWhitelisted::removed(a));
    }

    #[test]
    fn test_routed_calls_match_direct_calls() {
        let proxy_owner = Pubkey::new_unique();
        let owner = Pubkey::new_unique();
        let initial: Vec<Pubkey> = (0..5).map(|_| Pubkey::new_unique()).collect();
        let removed = [initial[4], initial[0]];

        let mut direct = EternalStorage::default();
        let mut direct_nodes = MemoryCitizenNodes::default();
        BorderCitizenListV1
            .initialize(&mut direct, &mut direct_nodes, &initial, owner, DEPLOY_SLOT)
            .unwrap();
        let direct_events = BorderCitizenListV1
            .remove_citizen_list(&mut direct, &mut direct_nodes, &owner, &removed)
            .unwrap();

        let mut proxy = proxy_owned_by(proxy_owner);
        let mut nodes = MemoryCitizenNodes::default();
        let mut dispatcher = Dispatcher::new(&mut proxy);
        dispatcher
            .upgrade_to(&proxy_owner, 1, BORDER_CITIZEN_LIST_V1_ID)
            .unwrap();
        dispatcher
            .forward(|logic, storage| {
                logic.initialize(storage, &mut nodes, &initial, owner, DEPLOY_SLOT)
            })
            .unwrap();
        let routed_events = dispatcher
            .forward(|logic, storage| {
                logic.remove_citizen_list(storage, &mut nodes, &owner, &removed)
            })
            .unwrap();

        assert_eq!(routed_events, direct_events);
        assert_eq!(proxy.storage, direct);
        assert_eq!(nodes, direct_nodes);
    }

    #[test]
    fn test_upgrade_to_and_initialize() {
        let proxy_owner = Pubkey::new_unique();
        let owner = Pubkey::new_unique();
        let initial = [Pubkey::new_unique(), Pubkey::new_unique()];
        let mut proxy = proxy_owned_by(proxy_owner);
        let mut nodes = MemoryCitizenNodes::default();
        let mut dispatcher = Dispatcher::new(&mut proxy);

        dispatcher
            .upgrade_to_and_initialize(
                &proxy_owner,
                1,
                BORDER_CITIZEN_LIST_V1_ID,
                &mut nodes,
                &initial,
                owner,
                DEPLOY_SLOT,
            )
            .unwrap();

        assert_eq!(dispatcher.version(), 1);
        let logic = dispatcher.logic().unwrap();
        assert!(logic.is_initialized(&proxy.storage));
        assert!(logic.is_citizen(&proxy.storage, &nodes, &initial[0]).unwrap());
        assert!(logic.is_citizen(&proxy.storage, &nodes, &initial[1]).unwrap());
        assert_eq!(logic.owner(&proxy.storage), owner);
        assert_eq!(logic.citizen_count(&proxy.storage), 2);
    }

    #[test]
    fn test_failed_initialize_does_not_record_upgrade() {
        let proxy_owner = Pubkey::new_unique();
        let mut proxy = proxy_owned_by(proxy_owner);
        let mut nodes = MemoryCitizenNodes::default();
        let mut dispatcher = Dispatcher::new(&mut proxy);

        assert_error(
            dispatcher.upgrade_to_and_initialize(
                &proxy_owner,
                1,
                BORDER_CITIZEN_LIST_V1_ID,
                &mut nodes,
                &[SENTINEL_ADDRESS],
                Pubkey::new_unique(),
                DEPLOY_SLOT,
            ),
            BorderCitizenListError::InvalidCitizen,
        );
        assert_eq!(proxy, proxy_owned_by(proxy_owner));
        assert_eq!(nodes, MemoryCitizenNodes::default());
    }

    #[test]
    fn test_transfer_proxy_ownership() {
        let proxy_owner = Pubkey::new_unique();
        let new_owner = Pubkey::new_unique();
        let mut proxy = proxy_owned_by(proxy_owner);
        let mut dispatcher = Dispatcher::new(&mut proxy);

        assert_error(
            dispatcher.transfer_proxy_ownership(&new_owner, new_owner),
            BorderCitizenListError::Unauthorized,
        );
        for reserved in [ZERO_ADDRESS, SENTINEL_ADDRESS] {
            assert_error(
                dispatcher.transfer_proxy_ownership(&proxy_owner, reserved),
                BorderCitizenListError::InvalidAddress,
            );
        }

        let event = dispatcher
            .transfer_proxy_ownership(&proxy_owner, new_owner)
            .unwrap();
        assert_eq!(
            event,
            ProxyOwnershipTransferred {
                previous_owner: proxy_owner,
                new_owner,
            }
        );
        assert_eq!(dispatcher.proxy_owner(), new_owner);

        // The previous owner can no longer upgrade
        assert_error(
            dispatcher.upgrade_to(&proxy_owner, 1, BORDER_CITIZEN_LIST_V1_ID),
            BorderCitizenListError::Unauthorized,
        );
        assert!(dispatcher
            .upgrade_to(&new_owner, 1, BORDER_CITIZEN_LIST_V1_ID)
            .is_ok());
    }
}
