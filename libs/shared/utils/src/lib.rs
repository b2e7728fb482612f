pub mod token_store;
pub mod test_utils;

pub use token_store::{FileTokenStore, MemoryTokenStore, TokenStore};
