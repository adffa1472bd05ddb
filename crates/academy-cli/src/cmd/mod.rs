pub mod account;
pub mod admin;
pub mod learning;
pub mod payments;
pub mod raw;
