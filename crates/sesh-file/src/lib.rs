//! sesh-file - Filesystem-backed slot storage for sesh.

mod store;

pub use store::FileStorage;
