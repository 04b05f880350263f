pub mod json;

pub use json::{ConfigProvider, JsonConnection, SaveSession, SaveStore};
