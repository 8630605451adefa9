pub mod citizen_list_operations;
pub mod storage_proxy_admin_operations;

pub use citizen_list_operations::*;
pub use storage_proxy_admin_operations::*;
