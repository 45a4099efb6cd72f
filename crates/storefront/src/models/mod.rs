//! Session-stored models.

pub mod session;

pub use session::{
    FlashLevel, FlashMessage, load_cart, push_flash, session_keys, store_cart, take_flash,
};
