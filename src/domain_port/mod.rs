// store

mod revocation_store;

pub use revocation_store::*;

// repo

mod member_repo;

pub use member_repo::*;

// collaborators

mod withdrawal_listener;

pub use withdrawal_listener::*;
