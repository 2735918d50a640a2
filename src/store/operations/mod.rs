pub mod activities;
pub mod interactions;
