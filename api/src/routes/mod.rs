pub mod checkout;
pub mod commit_status;
pub mod decorate;
pub mod file;
pub mod health;
pub mod resolve;
