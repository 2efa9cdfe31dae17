pub mod accounts;
pub mod auth;
pub mod books;
pub mod categories;
pub mod entries;
pub mod system;
pub mod users;

#[cfg(test)]
pub(crate) mod test_support;
