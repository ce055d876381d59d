pub mod basic;
pub mod health;
