pub mod account;

pub use account::{Account, AccountResponse, NewAccount, Role};
