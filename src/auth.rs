//! `Authorization: Basic base64(username:password)` credential check.

use base64::{
    alphabet,
    engine::{DecodePaddingMode, GeneralPurpose, GeneralPurposeConfig},
    Engine as _,
};
use thiserror::Error;

use crate::{storage::StorageRead, types::User};

const BASIC_PREFIX: &str = "Basic ";

const INDIFFERENT: GeneralPurposeConfig =
    GeneralPurposeConfig::new().with_decode_padding_mode(DecodePaddingMode::Indifferent);

/// Standard alphabet, padding optional.
const STANDARD_INDIFFERENT: GeneralPurpose = GeneralPurpose::new(&alphabet::STANDARD, INDIFFERENT);

#[derive(Debug, Error, PartialEq, Eq)]
pub enum AuthError {
    #[error("authentication token required")]
    MissingToken,
    #[error("invalid token")]
    InvalidToken,
    #[error("invalid credentials")]
    InvalidCredentials,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

pub fn parse_basic(header: Option<&str>) -> Result<Credentials, AuthError> {
    let token = header
        .and_then(|h| h.strip_prefix(BASIC_PREFIX))
        .ok_or(AuthError::MissingToken)?;

    let decoded = STANDARD_INDIFFERENT
        .decode(token.trim())
        .map_err(|_| AuthError::InvalidToken)?;
    let decoded = String::from_utf8(decoded).map_err(|_| AuthError::InvalidToken)?;

    let (username, password) = decoded.split_once(':').ok_or(AuthError::InvalidToken)?;
    if username.is_empty() || password.is_empty() {
        return Err(AuthError::InvalidToken);
    }

    Ok(Credentials {
        username: username.to_string(),
        password: password.to_string(),
    })
}

/// Resolves the header to a stored user. The outer error is a storage
/// failure; the inner one is a rejected credential.
pub fn authenticate<S: StorageRead + ?Sized>(
    storage: &S,
    header: Option<&str>,
) -> anyhow::Result<Result<User, AuthError>> {
    let credentials = match parse_basic(header) {
        Ok(credentials) => credentials,
        Err(err) => return Ok(Err(err)),
    };

    let user = storage.find_user_by_username(&credentials.username)?;
    Ok(match user {
        Some(user) if user.password == credentials.password => Ok(user),
        _ => Err(AuthError::InvalidCredentials),
    })
}

/// Builds a header value for the given credentials.
pub fn basic_header(username: &str, password: &str) -> String {
    format!(
        "{BASIC_PREFIX}{}",
        STANDARD_INDIFFERENT.encode(format!("{username}:{password}"))
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::{SqliteStorage, Storage, StorageTx, StorageWrite};
    use crate::types::NewUser;
    use tempfile::TempDir;

    #[test]
    fn parses_well_formed_header() {
        let header = basic_header("admin", "1234");
        assert_eq!(header, "Basic YWRtaW46MTIzNA==");

        let creds = parse_basic(Some(&header)).unwrap();
        assert_eq!(creds.username, "admin");
        assert_eq!(creds.password, "1234");
    }

    #[test]
    fn accepts_unpadded_token() {
        let creds = parse_basic(Some("Basic YWRtaW46MTIzNA")).unwrap();
        assert_eq!(creds.username, "admin");
    }

    #[test]
    fn keeps_colons_in_password() {
        let creds = parse_basic(Some(&basic_header("ana", "a:b:c"))).unwrap();
        assert_eq!(creds.password, "a:b:c");
    }

    #[test]
    fn missing_or_foreign_scheme_is_missing_token() {
        assert_eq!(parse_basic(None), Err(AuthError::MissingToken));
        assert_eq!(
            parse_basic(Some("Bearer abc")),
            Err(AuthError::MissingToken)
        );
        assert_eq!(parse_basic(Some("basic abc")), Err(AuthError::MissingToken));
    }

    #[test]
    fn malformed_tokens_are_invalid() {
        assert_eq!(parse_basic(Some("Basic !!!")), Err(AuthError::InvalidToken));
        // "admin" without a separator
        assert_eq!(
            parse_basic(Some("Basic YWRtaW4=")),
            Err(AuthError::InvalidToken)
        );
        assert_eq!(
            parse_basic(Some(&basic_header("admin", ""))),
            Err(AuthError::InvalidToken)
        );
        assert_eq!(
            parse_basic(Some(&basic_header("", "1234"))),
            Err(AuthError::InvalidToken)
        );
    }

    #[test]
    fn authenticate_checks_stored_password() {
        let dir = TempDir::new().unwrap();
        let storage = SqliteStorage::new(dir.path().join("auth.sqlite"));
        storage.init().unwrap();
        let tx = storage.begin_tx().unwrap();
        tx.insert_user(&NewUser {
            username: "ana".to_string(),
            password: "secret".to_string(),
            is_admin: false,
        })
        .unwrap();
        tx.commit().unwrap();

        let ok = authenticate(&storage, Some(&basic_header("ana", "secret"))).unwrap();
        assert_eq!(ok.unwrap().username, "ana");

        let wrong = authenticate(&storage, Some(&basic_header("ana", "nope"))).unwrap();
        assert_eq!(wrong, Err(AuthError::InvalidCredentials));

        let unknown = authenticate(&storage, Some(&basic_header("bia", "secret"))).unwrap();
        assert_eq!(unknown, Err(AuthError::InvalidCredentials));
    }
}
