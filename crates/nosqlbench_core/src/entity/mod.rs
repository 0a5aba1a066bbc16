//! Entity identity and records.

mod key;
mod record;

pub use key::{Key, KEY_DELIMITER};
pub use record::Entity;
