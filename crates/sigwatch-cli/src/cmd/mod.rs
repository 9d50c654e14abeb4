pub mod config;
pub mod hash;
pub mod run;
pub mod verify;
