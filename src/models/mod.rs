pub mod realm;
pub mod token;

pub use realm::{Client, Credential, Realm, User};
pub use token::TokenSet;
