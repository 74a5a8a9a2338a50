pub mod api;
pub mod models;

pub use models::{Message, NewUser, User};
