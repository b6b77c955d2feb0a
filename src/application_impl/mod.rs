mod auth_gate_impl;
mod auth_service_impl;
mod credential_policy;
mod jwt_codec;
mod password_hasher;

pub use auth_gate_impl::*;
pub use auth_service_impl::*;
pub use credential_policy::*;
pub use jwt_codec::*;
pub use password_hasher::*;
