pub mod admindb;
pub mod bookingdb;
pub mod db;
#[cfg(test)]
pub mod memory;
pub mod providerdb;
pub mod reviewdb;
pub mod sessiondb;
pub mod userdb;

pub use db::{DBClient, Store};
