use crate::types::{
    Account, Book, Category, EntryFilter, LedgerEntry, NewAccount, NewBook, NewEntry, NewUser,
    User,
};

/// Queries. Every finance lookup takes the owning `user_id`; a row owned by
/// someone else is reported exactly like a missing one.
pub trait StorageRead {
    fn load_user(&self, id: i64) -> anyhow::Result<Option<User>>;
    fn find_user_by_username(&self, username: &str) -> anyhow::Result<Option<User>>;
    fn list_users(&self) -> anyhow::Result<Vec<User>>;
    fn count_users(&self) -> anyhow::Result<u64>;

    fn load_book(&self, id: i64) -> anyhow::Result<Option<Book>>;
    fn find_book_by_title(&self, title: &str) -> anyhow::Result<Option<Book>>;
    fn list_books(&self) -> anyhow::Result<Vec<Book>>;

    fn load_category(&self, user_id: i64, id: i64) -> anyhow::Result<Option<Category>>;
    fn list_categories(&self, user_id: i64) -> anyhow::Result<Vec<Category>>;

    fn load_account(&self, user_id: i64, id: i64) -> anyhow::Result<Option<Account>>;
    fn list_accounts(&self, user_id: i64) -> anyhow::Result<Vec<Account>>;

    fn load_entry(&self, user_id: i64, id: i64) -> anyhow::Result<Option<LedgerEntry>>;
    fn list_entries(&self, user_id: i64, filter: &EntryFilter)
        -> anyhow::Result<Vec<LedgerEntry>>;
    fn list_installments(&self, user_id: i64, parent_id: i64)
        -> anyhow::Result<Vec<LedgerEntry>>;
}

/// Mutations. Update and delete calls report whether a row matched.
pub trait StorageWrite {
    fn insert_user(&self, user: &NewUser) -> anyhow::Result<User>;
    fn set_user_admin(&self, id: i64, is_admin: bool) -> anyhow::Result<bool>;
    fn delete_user(&self, id: i64) -> anyhow::Result<bool>;

    fn insert_book(&self, book: &NewBook) -> anyhow::Result<Book>;
    fn update_book(&self, book: &Book) -> anyhow::Result<bool>;
    fn delete_book(&self, id: i64) -> anyhow::Result<bool>;

    fn insert_category(&self, user_id: i64, name: &str) -> anyhow::Result<Category>;
    fn update_category(&self, category: &Category) -> anyhow::Result<bool>;
    fn delete_category(&self, user_id: i64, id: i64) -> anyhow::Result<bool>;

    fn insert_account(&self, account: &NewAccount) -> anyhow::Result<Account>;
    fn update_account(&self, account: &Account) -> anyhow::Result<bool>;
    fn delete_account(&self, user_id: i64, id: i64) -> anyhow::Result<bool>;

    fn insert_entry(&self, entry: &NewEntry) -> anyhow::Result<LedgerEntry>;
    fn update_entry(&self, entry: &LedgerEntry) -> anyhow::Result<bool>;
    fn delete_entry(&self, user_id: i64, id: i64) -> anyhow::Result<bool>;
}

/// A write transaction. Dropping it without `commit` discards its writes.
pub trait StorageTx: StorageRead + StorageWrite {
    fn commit(self) -> anyhow::Result<()>;
}

pub trait Storage: StorageRead {
    type Tx: StorageTx;

    fn begin_tx(&self) -> anyhow::Result<Self::Tx>;
}
