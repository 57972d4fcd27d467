//! Access control for the downstream broker.
//!
//! Only the bridge's own service principal may publish or administer; every
//! other authenticated principal holding the consume role may subscribe.

pub(crate) mod access_gate;
pub(crate) mod service_credential;

pub use access_gate::{
    AccessControlGate, AuthFailure, BrokerAction, Credential, IdentityStore, Principal,
    SecurityHook,
};
pub use service_credential::ServiceCredential;
