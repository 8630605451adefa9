//! Heap used by the heaviest instructions.
//!
//! The runtime hands a program a 32 KiB bump heap that never frees, so every
//! allocation made while an instruction runs counts against it. The test
//! allocator below adds up the bytes requested on the current thread.

use std::{
    alloc::{GlobalAlloc, Layout, System},
    cell::Cell,
};

use anchor_lang::prelude::*;
use anchor_lang::solana_program::entrypoint::HEAP_LENGTH;

use crate::{
    constants::{BORDER_CITIZEN_LIST_V1_ID, MAX_CITIZENS_PER_CALL, MAX_CITIZENS_PER_PAGE},
    dispatcher::Dispatcher,
    registry::BorderCitizenListLogic,
    state::{CitizenNodeAccounts, EternalStorage, MemoryCitizenNodes, StorageProxy, TestAccount},
};

struct CountingAllocator;

thread_local! {
    static ALLOCATED: Cell<usize> = const { Cell::new(0) };
}

fn record(size: usize) {
    let _ = ALLOCATED.try_with(|total| total.set(total.get() + size));
}

unsafe impl GlobalAlloc for CountingAllocator {
    unsafe fn alloc(&self, layout: Layout) -> *mut u8 {
        record(layout.size());
        System.alloc(layout)
    }

    unsafe fn dealloc(&self, ptr: *mut u8, layout: Layout) {
        System.dealloc(ptr, layout)
    }

    unsafe fn realloc(&self, ptr: *mut u8, layout: Layout, new_size: usize) -> *mut u8 {
        // A bump heap copies into a fresh block
        record(new_size);
        System.realloc(ptr, layout, new_size)
    }
}

#[global_allocator]
static ALLOCATOR: CountingAllocator = CountingAllocator;

/// Leaves room for the account infos the entrypoint decodes before the handler runs
const HEAP_BUDGET: usize = HEAP_LENGTH / 2;

const LIST_LEN: usize = 1_000;

fn allocated() -> usize {
    ALLOCATED.try_with(Cell::get).unwrap_or(0)
}

fn heap_used<R>(run: impl FnOnce() -> R) -> (R, usize) {
    let before = allocated();
    let result = run();
    (result, allocated() - before)
}

/// Account data of a proxy holding `len` citizens, and the citizens in order
fn proxy_with_list(len: usize, owner: Pubkey) -> (Vec<u8>, Vec<Pubkey>) {
    let proxy_owner = Pubkey::new_unique();
    let mut proxy = StorageProxy {
        proxy_owner,
        ..Default::default()
    };
    let list: Vec<Pubkey> = (0..len).map(|_| Pubkey::new_unique()).collect();
    let mut nodes = MemoryCitizenNodes::default();
    Dispatcher::new(&mut proxy)
        .upgrade_to_and_initialize(
            &proxy_owner,
            1,
            BORDER_CITIZEN_LIST_V1_ID,
            &mut nodes,
            &list,
            owner,
            1,
        )
        .unwrap();

    let mut data = Vec::new();
    proxy.try_serialize(&mut data).unwrap();
    (data, list)
}

fn encode<T: AnchorSerialize>(value: &T) -> Vec<u8> {
    let mut data = Vec::new();
    value.serialize(&mut data).unwrap();
    data
}

/// Run a registry call the way its instruction does: decode the citizens
/// argument and the proxy, load the node accounts, route the call, collect the
/// node writes and encode the result for the log or the return data.
/// Returns the number of node writes and the heap used.
fn run_instruction<R: AnchorSerialize>(
    proxy_data: &[u8],
    accounts: &mut [TestAccount],
    args: &[u8],
    call: impl FnOnce(
        &dyn BorderCitizenListLogic,
        &mut EternalStorage,
        &mut CitizenNodeAccounts<'_, '_>,
        Vec<Pubkey>,
    ) -> Result<R>,
) -> (usize, usize) {
    heap_used(|| {
        let citizens = Vec::<Pubkey>::deserialize(&mut &args[..]).unwrap();
        let mut proxy = StorageProxy::try_deserialize(&mut &proxy_data[..]).unwrap();
        let infos: Vec<AccountInfo> = accounts.iter_mut().map(TestAccount::info).collect();
        let mut nodes = CitizenNodeAccounts::load(&infos).unwrap();

        let result = Dispatcher::new(&mut proxy)
            .forward(|logic, storage| call(logic, storage, &mut nodes, citizens))
            .unwrap();
        let writes = nodes.changes().len();
        encode(&result);

        writes
    })
}

#[test]
fn test_proxy_decoding_does_not_grow_with_the_list() {
    let owner = Pubkey::new_unique();
    let (small, _) = proxy_with_list(1, owner);
    let (large, _) = proxy_with_list(LIST_LEN, owner);
    assert_eq!(small.len(), StorageProxy::SPACE);
    assert_eq!(large.len(), StorageProxy::SPACE);

    let (_, small_heap) = heap_used(|| StorageProxy::try_deserialize(&mut &small[..]).unwrap());
    let (_, large_heap) = heap_used(|| StorageProxy::try_deserialize(&mut &large[..]).unwrap());
    assert_eq!(small_heap, large_heap);
}

#[test]
fn test_largest_add_stays_within_heap() {
    let owner = Pubkey::new_unique();
    let (proxy_data, list) = proxy_with_list(LIST_LEN, owner);
    let citizens: Vec<Pubkey> = (0..MAX_CITIZENS_PER_CALL)
        .map(|_| Pubkey::new_unique())
        .collect();
    let mut accounts = vec![TestAccount::node(list[LIST_LEN - 1], None)];
    accounts.extend(citizens.iter().map(TestAccount::vacant));

    let (writes, used) = run_instruction(
        &proxy_data,
        &mut accounts,
        &encode(&citizens),
        |logic, storage, nodes, citizens| {
            logic.add_citizen_list(storage, nodes, &owner, &citizens)
        },
    );

    assert_eq!(writes, MAX_CITIZENS_PER_CALL + 1);
    assert!(used <= HEAP_BUDGET, "add used {used} bytes of heap");
}

#[test]
fn test_largest_remove_stays_within_heap() {
    let owner = Pubkey::new_unique();
    let (proxy_data, list) = proxy_with_list(LIST_LEN, owner);
    // Every other citizen, so each removal needs its own predecessor account
    let citizens: Vec<Pubkey> = (0..MAX_CITIZENS_PER_CALL)
        .map(|i| list[2 * i + 1])
        .collect();
    let mut accounts: Vec<TestAccount> = (0..2 * MAX_CITIZENS_PER_CALL)
        .map(|i| TestAccount::node(list[i], Some(list[i + 1])))
        .collect();

    let (writes, used) = run_instruction(
        &proxy_data,
        &mut accounts,
        &encode(&citizens),
        |logic, storage, nodes, citizens| {
            logic.remove_citizen_list(storage, nodes, &owner, &citizens)
        },
    );

    assert_eq!(writes, 2 * MAX_CITIZENS_PER_CALL);
    assert!(used <= HEAP_BUDGET, "remove used {used} bytes of heap");
}

#[test]
fn test_full_page_stays_within_heap() {
    let owner = Pubkey::new_unique();
    let (proxy_data, list) = proxy_with_list(LIST_LEN, owner);
    let mut accounts: Vec<TestAccount> = (0..MAX_CITIZENS_PER_PAGE)
        .map(|i| TestAccount::node(list[i], Some(list[i + 1])))
        .collect();

    let (writes, used) = run_instruction(
        &proxy_data,
        &mut accounts,
        &encode(&Vec::<Pubkey>::new()),
        |logic, storage, nodes, _| {
            let page = logic.citizen_list_page(storage, &*nodes, None, MAX_CITIZENS_PER_PAGE)?;
            assert_eq!(page.citizens, list[..MAX_CITIZENS_PER_PAGE]);
            assert_eq!(page.next, Some(list[MAX_CITIZENS_PER_PAGE]));
            Ok(page)
        },
    );

    assert_eq!(writes, 0);
    assert!(used <= HEAP_BUDGET, "page used {used} bytes of heap");
}
