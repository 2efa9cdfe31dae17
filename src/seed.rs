//! Demo data for a fresh database.

use anyhow::{Context, Result};

use crate::{
    storage::{Storage, StorageRead, StorageTx, StorageWrite},
    types::{NewBook, NewUser},
};

const DEMO_PASSWORD: &str = "1234";

/// `(username, is_admin)`
const USERS: [(&str, bool); 2] = [("admin", true), ("user", false)];

/// `(title, author, available)`
const BOOKS: [(&str, &str, bool); 4] = [
    ("1984", "George Orwell", true),
    ("Dom Casmurro", "Machado de Assis", true),
    ("Harry Potter", "J.K. Rowling", false),
    ("Clean Code", "Robert Martin", true),
];

#[derive(Debug, Default, PartialEq, Eq)]
pub struct SeedReport {
    pub users_inserted: usize,
    pub books_inserted: usize,
}

/// Inserts the demo users and books, skipping any that already exist.
pub fn run<S: Storage>(storage: &S) -> Result<SeedReport> {
    let tx = storage.begin_tx().context("opening seed transaction")?;
    let mut report = SeedReport::default();

    for (username, is_admin) in USERS {
        if tx.find_user_by_username(username)?.is_some() {
            log::info!("👤 User {} already exists, skipping", username);
            continue;
        }
        tx.insert_user(&NewUser {
            username: username.to_string(),
            password: DEMO_PASSWORD.to_string(),
            is_admin,
        })
        .with_context(|| format!("seeding user {username}"))?;
        report.users_inserted += 1;
    }

    for (title, author, available) in BOOKS {
        if tx.find_book_by_title(title)?.is_some() {
            log::info!("📚 Book {:?} already exists, skipping", title);
            continue;
        }
        let book = if available {
            NewBook::new(title, author)
        } else {
            NewBook::new(title, author).unavailable()
        };
        tx.insert_book(&book)
            .with_context(|| format!("seeding book {title:?}"))?;
        report.books_inserted += 1;
    }

    tx.commit().context("committing seed data")?;
    Ok(report)
}
