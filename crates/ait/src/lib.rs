pub mod coordinator;
pub mod errors;
pub mod instructions;
pub mod page;
pub mod presenter;
pub mod protocol;
pub mod providers;
pub mod selection;
pub mod store;
