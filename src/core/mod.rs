pub mod api;
pub mod push;
pub mod reconcile;
pub mod session;
pub mod store;
