use chrono::{DateTime, NaiveDate, SecondsFormat, Timelike, Utc};
use serde::{de, Deserialize, Deserializer, Serialize};

use crate::types::{Account, Book, Category, EntryKind, LedgerEntry, User};

// --- responses ---

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub uptime_secs: u64,
}

#[derive(Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

#[derive(Serialize)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserResponse {
    pub id: i64,
    pub username: String,
    pub is_admin: bool,
}

impl From<&User> for UserResponse {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            username: user.username.clone(),
            is_admin: user.is_admin,
        }
    }
}

#[derive(Serialize)]
pub struct LoginResponse {
    pub message: &'static str,
    pub user: UserResponse,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterResponse {
    pub message: &'static str,
    pub user_id: i64,
    pub is_admin: bool,
}

#[derive(Serialize)]
pub struct UserEnvelope {
    pub message: &'static str,
    pub user: UserResponse,
}

#[derive(Serialize)]
pub struct BookResponse {
    pub id: i64,
    pub title: String,
    pub author: String,
    pub available: bool,
}

impl From<&Book> for BookResponse {
    fn from(book: &Book) -> Self {
        Self {
            id: book.id,
            title: book.title.clone(),
            author: book.author.clone(),
            available: book.available,
        }
    }
}

#[derive(Serialize)]
pub struct BookEnvelope {
    pub message: &'static str,
    pub book: BookResponse,
}

#[derive(Serialize)]
pub struct CategoryResponse {
    pub id: i64,
    pub nome: String,
}

impl From<&Category> for CategoryResponse {
    fn from(category: &Category) -> Self {
        Self {
            id: category.id,
            nome: category.name.clone(),
        }
    }
}

#[derive(Serialize)]
pub struct CategoryEnvelope {
    pub message: &'static str,
    pub category: CategoryResponse,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountResponse {
    pub id: i64,
    pub descricao: String,
    pub saldo: f64,
    pub limite: f64,
    pub user_id: i64,
}

impl From<&Account> for AccountResponse {
    fn from(account: &Account) -> Self {
        Self {
            id: account.id,
            descricao: account.description.clone(),
            saldo: account.balance,
            limite: account.limit,
            user_id: account.user_id,
        }
    }
}

#[derive(Serialize)]
pub struct AccountEnvelope {
    pub message: &'static str,
    pub conta: AccountResponse,
}

#[derive(Serialize)]
pub struct AccountRef {
    pub id: i64,
    pub descricao: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EntryResponse {
    pub id: i64,
    pub descricao: String,
    pub valor: f64,
    pub data: String,
    pub tipo: EntryKind,
    pub categoria_id: Option<i64>,
    pub categoria: Option<CategoryResponse>,
    pub conta_id: Option<i64>,
    pub conta: Option<AccountRef>,
    pub parent_id: Option<i64>,
    pub total_parcelas: Option<u32>,
    pub parcela_atual: Option<u32>,
    pub efetivado: bool,
}

impl EntryResponse {
    pub fn new(
        entry: &LedgerEntry,
        category: Option<&Category>,
        account: Option<&Account>,
    ) -> Self {
        Self {
            id: entry.id,
            descricao: entry.description.clone(),
            valor: entry.amount,
            data: format_timestamp(&entry.date),
            tipo: entry.kind,
            categoria_id: entry.category_id,
            categoria: category.map(CategoryResponse::from),
            conta_id: entry.account_id,
            conta: account.map(|a| AccountRef {
                id: a.id,
                descricao: a.description.clone(),
            }),
            parent_id: entry.parent_id,
            total_parcelas: entry.total_installments,
            parcela_atual: entry.installment,
            efetivado: entry.settled,
        }
    }
}

#[derive(Serialize)]
pub struct EntryDetailResponse {
    #[serde(flatten)]
    pub entry: EntryResponse,
    pub parcelas: Vec<EntryResponse>,
}

#[derive(Serialize)]
pub struct EntryEnvelope {
    pub message: &'static str,
    pub lancamento: EntryResponse,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parcelas: Option<Vec<EntryResponse>>,
}

// --- requests ---

#[derive(Deserialize)]
pub struct RegisterRequest {
    pub username: Option<String>,
    pub password: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdminFlagRequest {
    pub is_admin: Option<bool>,
}

#[derive(Deserialize)]
pub struct CreateBookRequest {
    pub title: Option<String>,
    pub author: Option<String>,
}

#[derive(Deserialize)]
pub struct UpdateBookRequest {
    pub title: Option<String>,
    pub author: Option<String>,
    pub available: Option<bool>,
}

#[derive(Deserialize)]
pub struct CategoryRequest {
    pub nome: Option<String>,
}

#[derive(Deserialize)]
pub struct AccountRequest {
    pub descricao: Option<String>,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub saldo: Option<f64>,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub limite: Option<f64>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateEntryRequest {
    pub descricao: Option<String>,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub valor: Option<f64>,
    pub data: Option<String>,
    pub tipo: Option<String>,
    #[serde(default, deserialize_with = "lenient_i64")]
    pub categoria_id: Option<i64>,
    #[serde(default, deserialize_with = "lenient_i64")]
    pub conta_id: Option<i64>,
    pub efetivado: Option<bool>,
    #[serde(default, deserialize_with = "lenient_i64")]
    pub parcelas: Option<i64>,
}

/// `categoriaId` / `contaId`: absent keeps the current link, `null` clears it.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateEntryRequest {
    pub descricao: Option<String>,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub valor: Option<f64>,
    pub data: Option<String>,
    pub tipo: Option<String>,
    #[serde(default, deserialize_with = "nullable_i64")]
    pub categoria_id: Option<Option<i64>>,
    #[serde(default, deserialize_with = "nullable_i64")]
    pub conta_id: Option<Option<i64>>,
    pub efetivado: Option<bool>,
}

#[derive(Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct EntryQuery {
    pub tipo: Option<String>,
    pub categoria_id: Option<String>,
    pub conta_id: Option<String>,
    pub efetivado: Option<String>,
}

// --- field helpers ---

#[derive(Deserialize)]
#[serde(untagged)]
enum NumberOrText {
    Integer(i64),
    Float(f64),
    Text(String),
}

fn lenient_f64<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = match Option::<NumberOrText>::deserialize(deserializer)? {
        None => return Ok(None),
        Some(NumberOrText::Integer(n)) => n as f64,
        Some(NumberOrText::Float(n)) => n,
        Some(NumberOrText::Text(s)) => s
            .trim()
            .parse::<f64>()
            .map_err(|_| <D::Error as de::Error>::custom(format!("invalid number: {s}")))?,
    };
    if !value.is_finite() {
        return Err(<D::Error as de::Error>::custom("number must be finite"));
    }
    Ok(Some(value))
}

fn to_i64<E: de::Error>(value: NumberOrText) -> Result<i64, E> {
    match value {
        NumberOrText::Integer(n) => Ok(n),
        NumberOrText::Float(n) => Err(E::custom(format!("expected an integer, got {n}"))),
        NumberOrText::Text(s) => s
            .trim()
            .parse::<i64>()
            .map_err(|_| E::custom(format!("invalid integer: {s}"))),
    }
}

fn lenient_i64<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    Option::<NumberOrText>::deserialize(deserializer)?
        .map(to_i64)
        .transpose()
}

fn nullable_i64<'de, D>(deserializer: D) -> Result<Option<Option<i64>>, D::Error>
where
    D: Deserializer<'de>,
{
    lenient_i64(deserializer).map(Some)
}

/// Non-empty text or `None`.
pub fn present(value: Option<String>) -> Option<String> {
    value.filter(|s| !s.is_empty())
}

/// Accepts an RFC 3339 timestamp or a bare `YYYY-MM-DD` date (UTC midnight).
/// Timestamps are stored at millisecond precision, so finer fractions are
/// rejected rather than truncated.
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        if ts.nanosecond() % 1_000_000 != 0 {
            return None;
        }
        return Some(ts.with_timezone(&Utc));
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()?
        .and_hms_opt(0, 0, 0)
        .map(|dt| dt.and_utc())
}

pub fn format_timestamp(ts: &DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Millis, true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn account_request_accepts_numeric_strings() {
        let req: AccountRequest =
            serde_json::from_str(r#"{"descricao":"Itaú","saldo":"10.5","limite":200}"#).unwrap();
        assert_eq!(req.saldo, Some(10.5));
        assert_eq!(req.limite, Some(200.0));
    }

    #[test]
    fn account_request_treats_null_as_missing() {
        let req: AccountRequest = serde_json::from_str(r#"{"saldo":null}"#).unwrap();
        assert_eq!(req.saldo, None);
        assert_eq!(req.limite, None);
    }

    #[test]
    fn account_request_rejects_garbage_numbers() {
        assert!(serde_json::from_str::<AccountRequest>(r#"{"saldo":"abc"}"#).is_err());
    }

    #[test]
    fn update_entry_request_distinguishes_null_from_absent() {
        let req: UpdateEntryRequest =
            serde_json::from_str(r#"{"categoriaId":null,"contaId":"7"}"#).unwrap();
        assert_eq!(req.categoria_id, Some(None));
        assert_eq!(req.conta_id, Some(Some(7)));

        let req: UpdateEntryRequest = serde_json::from_str("{}").unwrap();
        assert_eq!(req.categoria_id, None);
    }

    #[test]
    fn create_entry_request_rejects_fractional_installments() {
        assert!(serde_json::from_str::<CreateEntryRequest>(r#"{"parcelas":2.5}"#).is_err());
        let req: CreateEntryRequest = serde_json::from_str(r#"{"parcelas":"3"}"#).unwrap();
        assert_eq!(req.parcelas, Some(3));
    }

    #[test]
    fn parses_dates_and_timestamps() {
        assert_eq!(
            parse_timestamp("2024-01-15"),
            Some(Utc.with_ymd_and_hms(2024, 1, 15, 0, 0, 0).unwrap())
        );
        assert_eq!(
            parse_timestamp("2024-01-15T10:00:00-03:00"),
            Some(Utc.with_ymd_and_hms(2024, 1, 15, 13, 0, 0).unwrap())
        );
        assert_eq!(parse_timestamp("15/01/2024"), None);
    }

    #[test]
    fn rejects_precision_finer_than_millis() {
        assert_eq!(parse_timestamp("2024-01-15T10:00:00.000001Z"), None);
        assert_eq!(parse_timestamp("2024-01-15T10:00:00.5001Z"), None);
        let ts = parse_timestamp("2024-01-15T10:00:00.500Z").unwrap();
        assert_eq!(format_timestamp(&ts), "2024-01-15T10:00:00.500Z");
    }

    #[test]
    fn formats_with_millis_and_zulu() {
        let ts = Utc.with_ymd_and_hms(2024, 1, 15, 0, 0, 0).unwrap();
        assert_eq!(format_timestamp(&ts), "2024-01-15T00:00:00.000Z");
    }
}
