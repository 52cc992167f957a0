// Service module exports
// Layout, entry store, reconciliation and the persistence backends

pub mod backend;
pub mod database;
pub mod entry;
pub mod layout;
pub mod settings;
pub mod store;
pub mod sync;
