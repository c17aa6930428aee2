pub mod fingerprint;
pub mod store;

pub use fingerprint::{fingerprint, Fingerprint};
pub use store::{AppStore, StoreSnapshot};
