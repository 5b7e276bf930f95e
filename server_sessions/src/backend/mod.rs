mod memory;
mod types;

pub use memory::{CookieRecord, MemoryBackend};
pub use types::{
    CookieAttributes, CookieOptions, HeadersSentAt, SessionBackend, SessionData, SessionParams,
    StoreStatus,
};
