pub mod activities;
pub mod analysis;
pub mod auth;
pub mod health;
