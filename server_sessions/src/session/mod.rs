mod flash;
mod manager;
mod store;


pub use manager::{DEFAULT_FLASH_KEY, Session};
