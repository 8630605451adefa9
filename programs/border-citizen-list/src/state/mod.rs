pub mod citizen_node;
pub mod citizen_node_account;
pub mod eternal_storage;
pub mod storage_proxy;

pub use citizen_node::*;
pub use citizen_node_account::*;
pub use eternal_storage::*;
pub use storage_proxy::*;
