use anyhow::Result;
use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::{params, params_from_iter, types::Type, types::Value, Connection, OptionalExtension};
use std::{path::Path, str::FromStr};

use super::traits::{Storage, StorageRead, StorageTx, StorageWrite};
use crate::types::{
    Account, Book, Category, EntryFilter, EntryKind, LedgerEntry, NewAccount, NewBook, NewEntry,
    NewUser, User,
};

const DB_SCHEMA_VERSION: i64 = 1;

const USER_COLUMNS: &str = "id, username, password, is_admin";
const BOOK_COLUMNS: &str = "id, title, author, available";
const CATEGORY_COLUMNS: &str = "id, user_id, nome";
const ACCOUNT_COLUMNS: &str = "id, user_id, descricao, saldo, limite";
const ENTRY_COLUMNS: &str = "id, user_id, descricao, valor, data, tipo, categoria_id, conta_id, \
                             parent_id, total_parcelas, parcela_atual, efetivado";

#[derive(Clone)]
pub struct SqliteStorage {
    pub path: String,
}

pub struct SqliteTx {
    conn: Connection,
}

impl StorageTx for SqliteTx {
    fn commit(self) -> Result<()> {
        self.conn.execute("COMMIT", [])?;
        Ok(())
    }
}

fn open_connection(path: &str) -> rusqlite::Result<Connection> {
    let conn = Connection::open(path)?;
    conn.pragma_update(None, "journal_mode", "WAL")?;
    conn.pragma_update(None, "synchronous", "NORMAL")?;
    conn.pragma_update(None, "foreign_keys", "ON")?;
    conn.busy_timeout(std::time::Duration::from_millis(500))?;
    Ok(conn)
}

fn conversion_error<E>(idx: usize, ty: Type, err: E) -> rusqlite::Error
where
    E: std::error::Error + Send + Sync + 'static,
{
    rusqlite::Error::FromSqlConversionFailure(idx, ty, Box::new(err))
}

fn encode_timestamp(ts: &DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Millis, true)
}

fn decode_timestamp(idx: usize, raw: &str) -> rusqlite::Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .map(|ts| ts.with_timezone(&Utc))
        .map_err(|err| conversion_error(idx, Type::Text, err))
}

fn get_u32_opt(row: &rusqlite::Row<'_>, idx: usize) -> rusqlite::Result<Option<u32>> {
    row.get::<_, Option<i64>>(idx)?
        .map(u32::try_from)
        .transpose()
        .map_err(|err| conversion_error(idx, Type::Integer, err))
}

fn map_user_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<User> {
    Ok(User {
        id: row.get(0)?,
        username: row.get(1)?,
        password: row.get(2)?,
        is_admin: row.get::<_, i64>(3)? != 0,
    })
}

fn map_book_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Book> {
    Ok(Book {
        id: row.get(0)?,
        title: row.get(1)?,
        author: row.get(2)?,
        available: row.get::<_, i64>(3)? != 0,
    })
}

fn map_category_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Category> {
    Ok(Category {
        id: row.get(0)?,
        user_id: row.get(1)?,
        name: row.get(2)?,
    })
}

fn map_account_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Account> {
    Ok(Account {
        id: row.get(0)?,
        user_id: row.get(1)?,
        description: row.get(2)?,
        balance: row.get(3)?,
        limit: row.get(4)?,
    })
}

fn map_entry_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<LedgerEntry> {
    let date: String = row.get(4)?;
    let kind: String = row.get(5)?;
    Ok(LedgerEntry {
        id: row.get(0)?,
        user_id: row.get(1)?,
        description: row.get(2)?,
        amount: row.get(3)?,
        date: decode_timestamp(4, &date)?,
        kind: EntryKind::from_str(&kind).map_err(|err| conversion_error(5, Type::Text, err))?,
        category_id: row.get(6)?,
        account_id: row.get(7)?,
        parent_id: row.get(8)?,
        total_installments: get_u32_opt(row, 9)?,
        installment: get_u32_opt(row, 10)?,
        settled: row.get::<_, i64>(11)? != 0,
    })
}

// --- users ---

fn db_load_user(conn: &Connection, id: i64) -> rusqlite::Result<Option<User>> {
    conn.query_row(
        &format!("SELECT {USER_COLUMNS} FROM users WHERE id = ?1"),
        params![id],
        map_user_row,
    )
    .optional()
}

fn db_find_user_by_username(conn: &Connection, username: &str) -> rusqlite::Result<Option<User>> {
    conn.query_row(
        &format!("SELECT {USER_COLUMNS} FROM users WHERE username = ?1"),
        params![username],
        map_user_row,
    )
    .optional()
}

fn db_list_users(conn: &Connection) -> rusqlite::Result<Vec<User>> {
    let mut stmt = conn.prepare(&format!("SELECT {USER_COLUMNS} FROM users ORDER BY id"))?;
    let rows = stmt
        .query_map([], map_user_row)?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(rows)
}

fn db_count_users(conn: &Connection) -> rusqlite::Result<u64> {
    let count: i64 = conn.query_row("SELECT COUNT(*) FROM users", [], |row| row.get(0))?;
    Ok(count as u64)
}

fn db_insert_user(conn: &Connection, user: &NewUser) -> rusqlite::Result<User> {
    conn.execute(
        "INSERT INTO users (username, password, is_admin) VALUES (?1, ?2, ?3)",
        params![user.username, user.password, user.is_admin as i64],
    )?;
    Ok(User {
        id: conn.last_insert_rowid(),
        username: user.username.clone(),
        password: user.password.clone(),
        is_admin: user.is_admin,
    })
}

fn db_set_user_admin(conn: &Connection, id: i64, is_admin: bool) -> rusqlite::Result<bool> {
    let rows = conn.execute(
        "UPDATE users SET is_admin = ?1 WHERE id = ?2",
        params![is_admin as i64, id],
    )?;
    Ok(rows > 0)
}

fn db_delete_user(conn: &Connection, id: i64) -> rusqlite::Result<bool> {
    let rows = conn.execute("DELETE FROM users WHERE id = ?1", params![id])?;
    Ok(rows > 0)
}

// --- books ---

fn db_load_book(conn: &Connection, id: i64) -> rusqlite::Result<Option<Book>> {
    conn.query_row(
        &format!("SELECT {BOOK_COLUMNS} FROM books WHERE id = ?1"),
        params![id],
        map_book_row,
    )
    .optional()
}

fn db_find_book_by_title(conn: &Connection, title: &str) -> rusqlite::Result<Option<Book>> {
    conn.query_row(
        &format!("SELECT {BOOK_COLUMNS} FROM books WHERE title = ?1 ORDER BY id LIMIT 1"),
        params![title],
        map_book_row,
    )
    .optional()
}

fn db_list_books(conn: &Connection) -> rusqlite::Result<Vec<Book>> {
    let mut stmt = conn.prepare(&format!("SELECT {BOOK_COLUMNS} FROM books ORDER BY id"))?;
    let rows = stmt
        .query_map([], map_book_row)?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(rows)
}

fn db_insert_book(conn: &Connection, book: &NewBook) -> rusqlite::Result<Book> {
    conn.execute(
        "INSERT INTO books (title, author, available) VALUES (?1, ?2, ?3)",
        params![book.title, book.author, book.available as i64],
    )?;
    Ok(Book {
        id: conn.last_insert_rowid(),
        title: book.title.clone(),
        author: book.author.clone(),
        available: book.available,
    })
}

fn db_update_book(conn: &Connection, book: &Book) -> rusqlite::Result<bool> {
    let rows = conn.execute(
        "UPDATE books SET title = ?1, author = ?2, available = ?3 WHERE id = ?4",
        params![book.title, book.author, book.available as i64, book.id],
    )?;
    Ok(rows > 0)
}

fn db_delete_book(conn: &Connection, id: i64) -> rusqlite::Result<bool> {
    let rows = conn.execute("DELETE FROM books WHERE id = ?1", params![id])?;
    Ok(rows > 0)
}

// --- categories ---

fn db_load_category(conn: &Connection, user_id: i64, id: i64) -> rusqlite::Result<Option<Category>> {
    conn.query_row(
        &format!("SELECT {CATEGORY_COLUMNS} FROM categories WHERE id = ?1 AND user_id = ?2"),
        params![id, user_id],
        map_category_row,
    )
    .optional()
}

fn db_list_categories(conn: &Connection, user_id: i64) -> rusqlite::Result<Vec<Category>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {CATEGORY_COLUMNS} FROM categories WHERE user_id = ?1 ORDER BY id"
    ))?;
    let rows = stmt
        .query_map(params![user_id], map_category_row)?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(rows)
}

fn db_insert_category(conn: &Connection, user_id: i64, name: &str) -> rusqlite::Result<Category> {
    conn.execute(
        "INSERT INTO categories (nome, user_id) VALUES (?1, ?2)",
        params![name, user_id],
    )?;
    Ok(Category {
        id: conn.last_insert_rowid(),
        user_id,
        name: name.to_string(),
    })
}

fn db_update_category(conn: &Connection, category: &Category) -> rusqlite::Result<bool> {
    let rows = conn.execute(
        "UPDATE categories SET nome = ?1 WHERE id = ?2 AND user_id = ?3",
        params![category.name, category.id, category.user_id],
    )?;
    Ok(rows > 0)
}

fn db_delete_category(conn: &Connection, user_id: i64, id: i64) -> rusqlite::Result<bool> {
    let rows = conn.execute(
        "DELETE FROM categories WHERE id = ?1 AND user_id = ?2",
        params![id, user_id],
    )?;
    Ok(rows > 0)
}

// --- accounts ---

fn db_load_account(conn: &Connection, user_id: i64, id: i64) -> rusqlite::Result<Option<Account>> {
    conn.query_row(
        &format!("SELECT {ACCOUNT_COLUMNS} FROM contas WHERE id = ?1 AND user_id = ?2"),
        params![id, user_id],
        map_account_row,
    )
    .optional()
}

fn db_list_accounts(conn: &Connection, user_id: i64) -> rusqlite::Result<Vec<Account>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {ACCOUNT_COLUMNS} FROM contas WHERE user_id = ?1 ORDER BY id"
    ))?;
    let rows = stmt
        .query_map(params![user_id], map_account_row)?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(rows)
}

fn db_insert_account(conn: &Connection, account: &NewAccount) -> rusqlite::Result<Account> {
    conn.execute(
        "INSERT INTO contas (descricao, saldo, limite, user_id) VALUES (?1, ?2, ?3, ?4)",
        params![
            account.description,
            account.balance,
            account.limit,
            account.user_id
        ],
    )?;
    Ok(Account {
        id: conn.last_insert_rowid(),
        user_id: account.user_id,
        description: account.description.clone(),
        balance: account.balance,
        limit: account.limit,
    })
}

fn db_update_account(conn: &Connection, account: &Account) -> rusqlite::Result<bool> {
    let rows = conn.execute(
        "UPDATE contas SET descricao = ?1, saldo = ?2, limite = ?3 WHERE id = ?4 AND user_id = ?5",
        params![
            account.description,
            account.balance,
            account.limit,
            account.id,
            account.user_id
        ],
    )?;
    Ok(rows > 0)
}

fn db_delete_account(conn: &Connection, user_id: i64, id: i64) -> rusqlite::Result<bool> {
    let rows = conn.execute(
        "DELETE FROM contas WHERE id = ?1 AND user_id = ?2",
        params![id, user_id],
    )?;
    Ok(rows > 0)
}

// --- ledger entries ---

fn db_load_entry(conn: &Connection, user_id: i64, id: i64) -> rusqlite::Result<Option<LedgerEntry>> {
    conn.query_row(
        &format!("SELECT {ENTRY_COLUMNS} FROM lancamentos WHERE id = ?1 AND user_id = ?2"),
        params![id, user_id],
        map_entry_row,
    )
    .optional()
}

fn db_list_entries(
    conn: &Connection,
    user_id: i64,
    filter: &EntryFilter,
) -> rusqlite::Result<Vec<LedgerEntry>> {
    let mut clauses = vec!["user_id = ?".to_string()];
    let mut values = vec![Value::Integer(user_id)];

    if let Some(kind) = filter.kind {
        clauses.push("tipo = ?".to_string());
        values.push(Value::Text(kind.as_str().to_string()));
    }
    if let Some(category_id) = filter.category_id {
        clauses.push("categoria_id = ?".to_string());
        values.push(Value::Integer(category_id));
    }
    if let Some(account_id) = filter.account_id {
        clauses.push("conta_id = ?".to_string());
        values.push(Value::Integer(account_id));
    }
    if let Some(settled) = filter.settled {
        clauses.push("efetivado = ?".to_string());
        values.push(Value::Integer(settled as i64));
    }

    let sql = format!(
        "SELECT {ENTRY_COLUMNS} FROM lancamentos WHERE {} ORDER BY data DESC, id DESC",
        clauses.join(" AND ")
    );
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt
        .query_map(params_from_iter(values.iter()), map_entry_row)?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(rows)
}

fn db_list_installments(
    conn: &Connection,
    user_id: i64,
    parent_id: i64,
) -> rusqlite::Result<Vec<LedgerEntry>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {ENTRY_COLUMNS} FROM lancamentos
         WHERE parent_id = ?1 AND user_id = ?2
         ORDER BY parcela_atual, id"
    ))?;
    let rows = stmt
        .query_map(params![parent_id, user_id], map_entry_row)?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(rows)
}

fn db_insert_entry(conn: &Connection, entry: &NewEntry) -> rusqlite::Result<LedgerEntry> {
    conn.execute(
        r#"
        INSERT INTO lancamentos (
            user_id, descricao, valor, data, tipo, categoria_id, conta_id,
            parent_id, total_parcelas, parcela_atual, efetivado
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)
        "#,
        params![
            entry.user_id,
            entry.description,
            entry.amount,
            encode_timestamp(&entry.date),
            entry.kind.as_str(),
            entry.category_id,
            entry.account_id,
            entry.parent_id,
            entry.total_installments.map(i64::from),
            entry.installment.map(i64::from),
            entry.settled as i64
        ],
    )?;
    Ok(LedgerEntry {
        id: conn.last_insert_rowid(),
        user_id: entry.user_id,
        description: entry.description.clone(),
        amount: entry.amount,
        date: entry.date,
        kind: entry.kind,
        category_id: entry.category_id,
        account_id: entry.account_id,
        parent_id: entry.parent_id,
        total_installments: entry.total_installments,
        installment: entry.installment,
        settled: entry.settled,
    })
}

fn db_update_entry(conn: &Connection, entry: &LedgerEntry) -> rusqlite::Result<bool> {
    let rows = conn.execute(
        r#"
        UPDATE lancamentos
        SET descricao = ?1,
            valor = ?2,
            data = ?3,
            tipo = ?4,
            categoria_id = ?5,
            conta_id = ?6,
            efetivado = ?7
        WHERE id = ?8
          AND user_id = ?9
        "#,
        params![
            entry.description,
            entry.amount,
            encode_timestamp(&entry.date),
            entry.kind.as_str(),
            entry.category_id,
            entry.account_id,
            entry.settled as i64,
            entry.id,
            entry.user_id
        ],
    )?;
    Ok(rows > 0)
}

fn db_delete_entry(conn: &Connection, user_id: i64, id: i64) -> rusqlite::Result<bool> {
    let rows = conn.execute(
        "DELETE FROM lancamentos WHERE id = ?1 AND user_id = ?2",
        params![id, user_id],
    )?;
    Ok(rows > 0)
}

impl StorageRead for SqliteTx {
    fn load_user(&self, id: i64) -> Result<Option<User>> {
        Ok(db_load_user(&self.conn, id)?)
    }

    fn find_user_by_username(&self, username: &str) -> Result<Option<User>> {
        Ok(db_find_user_by_username(&self.conn, username)?)
    }

    fn list_users(&self) -> Result<Vec<User>> {
        Ok(db_list_users(&self.conn)?)
    }

    fn count_users(&self) -> Result<u64> {
        Ok(db_count_users(&self.conn)?)
    }

    fn load_book(&self, id: i64) -> Result<Option<Book>> {
        Ok(db_load_book(&self.conn, id)?)
    }

    fn find_book_by_title(&self, title: &str) -> Result<Option<Book>> {
        Ok(db_find_book_by_title(&self.conn, title)?)
    }

    fn list_books(&self) -> Result<Vec<Book>> {
        Ok(db_list_books(&self.conn)?)
    }

    fn load_category(&self, user_id: i64, id: i64) -> Result<Option<Category>> {
        Ok(db_load_category(&self.conn, user_id, id)?)
    }

    fn list_categories(&self, user_id: i64) -> Result<Vec<Category>> {
        Ok(db_list_categories(&self.conn, user_id)?)
    }

    fn load_account(&self, user_id: i64, id: i64) -> Result<Option<Account>> {
        Ok(db_load_account(&self.conn, user_id, id)?)
    }

    fn list_accounts(&self, user_id: i64) -> Result<Vec<Account>> {
        Ok(db_list_accounts(&self.conn, user_id)?)
    }

    fn load_entry(&self, user_id: i64, id: i64) -> Result<Option<LedgerEntry>> {
        Ok(db_load_entry(&self.conn, user_id, id)?)
    }

    fn list_entries(&self, user_id: i64, filter: &EntryFilter) -> Result<Vec<LedgerEntry>> {
        Ok(db_list_entries(&self.conn, user_id, filter)?)
    }

    fn list_installments(&self, user_id: i64, parent_id: i64) -> Result<Vec<LedgerEntry>> {
        Ok(db_list_installments(&self.conn, user_id, parent_id)?)
    }
}

impl StorageWrite for SqliteTx {
    fn insert_user(&self, user: &NewUser) -> Result<User> {
        Ok(db_insert_user(&self.conn, user)?)
    }

    fn set_user_admin(&self, id: i64, is_admin: bool) -> Result<bool> {
        Ok(db_set_user_admin(&self.conn, id, is_admin)?)
    }

    fn delete_user(&self, id: i64) -> Result<bool> {
        Ok(db_delete_user(&self.conn, id)?)
    }

    fn insert_book(&self, book: &NewBook) -> Result<Book> {
        Ok(db_insert_book(&self.conn, book)?)
    }

    fn update_book(&self, book: &Book) -> Result<bool> {
        Ok(db_update_book(&self.conn, book)?)
    }

    fn delete_book(&self, id: i64) -> Result<bool> {
        Ok(db_delete_book(&self.conn, id)?)
    }

    fn insert_category(&self, user_id: i64, name: &str) -> Result<Category> {
        Ok(db_insert_category(&self.conn, user_id, name)?)
    }

    fn update_category(&self, category: &Category) -> Result<bool> {
        Ok(db_update_category(&self.conn, category)?)
    }

    fn delete_category(&self, user_id: i64, id: i64) -> Result<bool> {
        Ok(db_delete_category(&self.conn, user_id, id)?)
    }

    fn insert_account(&self, account: &NewAccount) -> Result<Account> {
        Ok(db_insert_account(&self.conn, account)?)
    }

    fn update_account(&self, account: &Account) -> Result<bool> {
        Ok(db_update_account(&self.conn, account)?)
    }

    fn delete_account(&self, user_id: i64, id: i64) -> Result<bool> {
        Ok(db_delete_account(&self.conn, user_id, id)?)
    }

    fn insert_entry(&self, entry: &NewEntry) -> Result<LedgerEntry> {
        Ok(db_insert_entry(&self.conn, entry)?)
    }

    fn update_entry(&self, entry: &LedgerEntry) -> Result<bool> {
        Ok(db_update_entry(&self.conn, entry)?)
    }

    fn delete_entry(&self, user_id: i64, id: i64) -> Result<bool> {
        Ok(db_delete_entry(&self.conn, user_id, id)?)
    }
}

impl Storage for SqliteStorage {
    type Tx = SqliteTx;

    fn begin_tx(&self) -> Result<Self::Tx> {
        let conn = open_connection(&self.path)?;
        conn.execute("BEGIN IMMEDIATE", [])?;

        Ok(SqliteTx { conn })
    }
}

impl SqliteStorage {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_string_lossy().to_string(),
        }
    }

    pub fn reset_all(&self) -> Result<()> {
        if !std::path::Path::new(&self.path).exists() {
            return Ok(());
        }
        std::fs::remove_file(&self.path)?;
        Ok(())
    }

    pub fn init(&self) -> Result<()> {
        self.with_conn(|_conn| Ok(()))?;
        Ok(())
    }

    fn with_conn<F, T>(&self, f: F) -> rusqlite::Result<T>
    where
        F: FnOnce(&Connection) -> rusqlite::Result<T>,
    {
        let conn = open_connection(&self.path)?;
        Self::migrate(&conn)?;
        f(&conn)
    }

    fn migrate(conn: &Connection) -> rusqlite::Result<()> {
        let version: i64 = conn.query_row("PRAGMA user_version", [], |row| row.get(0))?;

        if version == DB_SCHEMA_VERSION {
            return Ok(());
        }

        log::info!(
            "SQLite schema migration: {} -> {}",
            version,
            DB_SCHEMA_VERSION
        );

        if version == 0 {
            conn.execute_batch(
                r#"
            CREATE TABLE users (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                username TEXT NOT NULL UNIQUE,
                password TEXT NOT NULL,
                is_admin INTEGER NOT NULL DEFAULT 0
            );
            CREATE TABLE books (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                title TEXT NOT NULL,
                author TEXT NOT NULL,
                available INTEGER NOT NULL DEFAULT 1
            );
            CREATE TABLE categories (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                nome TEXT NOT NULL,
                user_id INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE
            );
            CREATE INDEX categories_user_idx ON categories(user_id);
            CREATE TABLE contas (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                descricao TEXT NOT NULL,
                saldo REAL NOT NULL,
                limite REAL NOT NULL,
                user_id INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE
            );
            CREATE INDEX contas_user_idx ON contas(user_id);
            CREATE TABLE lancamentos (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                descricao TEXT NOT NULL,
                valor REAL NOT NULL,
                data TEXT NOT NULL,
                tipo TEXT NOT NULL CHECK (tipo IN ('RECEITA', 'DESPESA')),
                categoria_id INTEGER REFERENCES categories(id) ON DELETE SET NULL,
                conta_id INTEGER REFERENCES contas(id) ON DELETE SET NULL,
                parent_id INTEGER REFERENCES lancamentos(id) ON DELETE CASCADE,
                total_parcelas INTEGER,
                parcela_atual INTEGER,
                efetivado INTEGER NOT NULL DEFAULT 0,
                user_id INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE
            );
            CREATE INDEX lancamentos_user_data_idx ON lancamentos(user_id, data);
            CREATE INDEX lancamentos_parent_idx ON lancamentos(parent_id);
        "#,
            )?;
            conn.pragma_update(None, "user_version", DB_SCHEMA_VERSION)?;
            return Ok(());
        }

        Err(rusqlite::Error::SqliteFailure(
            rusqlite::ffi::Error::new(rusqlite::ffi::ErrorCode::SchemaChanged as i32),
            Some("database schema version mismatch; please run with --reset option".to_string()),
        ))
    }
}

impl StorageRead for SqliteStorage {
    fn load_user(&self, id: i64) -> Result<Option<User>> {
        Ok(self.with_conn(|conn| db_load_user(conn, id))?)
    }

    fn find_user_by_username(&self, username: &str) -> Result<Option<User>> {
        Ok(self.with_conn(|conn| db_find_user_by_username(conn, username))?)
    }

    fn list_users(&self) -> Result<Vec<User>> {
        Ok(self.with_conn(db_list_users)?)
    }

    fn count_users(&self) -> Result<u64> {
        Ok(self.with_conn(db_count_users)?)
    }

    fn load_book(&self, id: i64) -> Result<Option<Book>> {
        Ok(self.with_conn(|conn| db_load_book(conn, id))?)
    }

    fn find_book_by_title(&self, title: &str) -> Result<Option<Book>> {
        Ok(self.with_conn(|conn| db_find_book_by_title(conn, title))?)
    }

    fn list_books(&self) -> Result<Vec<Book>> {
        Ok(self.with_conn(db_list_books)?)
    }

    fn load_category(&self, user_id: i64, id: i64) -> Result<Option<Category>> {
        Ok(self.with_conn(|conn| db_load_category(conn, user_id, id))?)
    }

    fn list_categories(&self, user_id: i64) -> Result<Vec<Category>> {
        Ok(self.with_conn(|conn| db_list_categories(conn, user_id))?)
    }

    fn load_account(&self, user_id: i64, id: i64) -> Result<Option<Account>> {
        Ok(self.with_conn(|conn| db_load_account(conn, user_id, id))?)
    }

    fn list_accounts(&self, user_id: i64) -> Result<Vec<Account>> {
        Ok(self.with_conn(|conn| db_list_accounts(conn, user_id))?)
    }

    fn load_entry(&self, user_id: i64, id: i64) -> Result<Option<LedgerEntry>> {
        Ok(self.with_conn(|conn| db_load_entry(conn, user_id, id))?)
    }

    fn list_entries(&self, user_id: i64, filter: &EntryFilter) -> Result<Vec<LedgerEntry>> {
        Ok(self.with_conn(|conn| db_list_entries(conn, user_id, filter))?)
    }

    fn list_installments(&self, user_id: i64, parent_id: i64) -> Result<Vec<LedgerEntry>> {
        Ok(self.with_conn(|conn| db_list_installments(conn, user_id, parent_id))?)
    }
}
