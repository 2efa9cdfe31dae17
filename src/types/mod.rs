mod account;
mod book;
mod category;
mod entry;
mod user;

pub use account::{Account, NewAccount};
pub use book::{Book, NewBook};
pub use category::Category;
pub use entry::{EntryFilter, EntryKind, EntryKindParseError, LedgerEntry, NewEntry};
pub use user::{NewUser, User};
