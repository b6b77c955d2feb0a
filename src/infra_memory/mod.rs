mod member_repo_memory;
mod revocation_store_memory;

pub use member_repo_memory::*;
pub use revocation_store_memory::*;
