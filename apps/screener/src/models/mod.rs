pub mod candidate;
pub mod mail;
