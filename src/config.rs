//! Git author identity, optionally overridden by `~/.plato/config.json`.
//!
//! Resolution never fails. Any problem finding, reading or parsing the file
//! is logged at debug level and the built-in defaults are used instead.

use serde_json::{Map, Value};
use std::fmt;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Location of the config file relative to the user's home directory.
pub const CONFIG_FILE: &str = ".plato/config.json";

const DEFAULT_AUTHOR_NAME: &str = "Plato";
const DEFAULT_AUTHOR_EMAIL: &str = "ops@platoteam.com";

const NAME_KEY: &str = "GitAuthorName";
const EMAIL_KEY: &str = "GitAuthorEmail";

/// Errors returned while loading the config file.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// The file could not be read.
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    /// The file is not a JSON object.
    #[error("failed to parse {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// Name and email used as the author of the marker commit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthorIdentity {
    pub name: String,
    pub email: String,
}

impl Default for AuthorIdentity {
    fn default() -> Self {
        Self {
            name: DEFAULT_AUTHOR_NAME.to_string(),
            email: DEFAULT_AUTHOR_EMAIL.to_string(),
        }
    }
}

impl fmt::Display for AuthorIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} <{}>", self.name, self.email)
    }
}

/// Apply a parsed config object on top of `base`.
///
/// Keys match ignoring ASCII case. `null` leaves a field alone, and a value
/// that is not a string is logged and skipped without touching the others.
fn apply(document: Map<String, Value>, mut base: AuthorIdentity) -> AuthorIdentity {
    for (key, value) in document {
        let field = if key.eq_ignore_ascii_case(NAME_KEY) {
            &mut base.name
        } else if key.eq_ignore_ascii_case(EMAIL_KEY) {
            &mut base.email
        } else {
            continue;
        };

        match value {
            Value::String(text) => *field = text,
            Value::Null => {}
            other => log::debug!("ignoring {}: expected a string, got {}", key, other),
        }
    }
    base
}

/// Returns `<home>/.plato/config.json`.
pub fn config_path(home: &Path) -> PathBuf {
    home.join(CONFIG_FILE)
}

/// Load the config file at `path` and apply it on top of `base`.
///
/// Only the string fields present in the document replace the ones in `base`.
pub fn load(path: &Path, base: AuthorIdentity) -> Result<AuthorIdentity, ConfigError> {
    let data = std::fs::read(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    let document: Map<String, Value> =
        serde_json::from_slice(&data).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
    Ok(apply(document, base))
}

/// Resolve the author identity for the given home directory.
///
/// A missing home directory falls through to a relative config path, which
/// normally does not exist.
pub fn resolve_from(home: Option<PathBuf>) -> AuthorIdentity {
    log::debug!("fetch git author info from plato config (if present)");

    let home = home.unwrap_or_else(|| {
        log::debug!("home directory not found, using empty base path");
        PathBuf::new()
    });
    let path = config_path(&home);

    let identity = match load(&path, AuthorIdentity::default()) {
        Ok(identity) => identity,
        Err(e) => {
            log::debug!("{}", e);
            log::debug!("fall back to default Git author info");
            AuthorIdentity::default()
        }
    };

    log::debug!("using following Git author config: {}", identity);
    identity
}

/// Resolve the author identity from the current user's home directory.
pub fn resolve() -> AuthorIdentity {
    resolve_from(dirs::home_dir())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn write_config(home: &Path, contents: &str) {
        let path = config_path(home);
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(path, contents).unwrap();
    }

    #[test]
    fn defaults_match_plato_identity() {
        let identity = AuthorIdentity::default();
        assert_eq!(identity.name, "Plato");
        assert_eq!(identity.email, "ops@platoteam.com");
        assert_eq!(identity.to_string(), "Plato <ops@platoteam.com>");
    }

    #[test]
    fn config_path_is_under_plato_dir() {
        let path = config_path(Path::new("/home/someone"));
        assert_eq!(path, PathBuf::from("/home/someone/.plato/config.json"));
    }

    #[test]
    fn missing_file_resolves_to_defaults() {
        let home = tempdir().unwrap();
        assert_eq!(
            resolve_from(Some(home.path().to_path_buf())),
            AuthorIdentity::default()
        );
    }

    #[test]
    fn missing_file_is_a_read_error() {
        let home = tempdir().unwrap();
        let err = load(&config_path(home.path()), AuthorIdentity::default()).unwrap_err();
        assert!(matches!(err, ConfigError::Read { .. }));
    }

    #[test]
    fn malformed_file_resolves_to_defaults() {
        let home = tempdir().unwrap();
        write_config(home.path(), "{\"GitAuthorName\": \"Ada\"");

        let err = load(&config_path(home.path()), AuthorIdentity::default()).unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
        assert_eq!(
            resolve_from(Some(home.path().to_path_buf())),
            AuthorIdentity::default()
        );
    }

    #[test]
    fn empty_file_resolves_to_defaults() {
        let home = tempdir().unwrap();
        write_config(home.path(), "");
        assert_eq!(
            resolve_from(Some(home.path().to_path_buf())),
            AuthorIdentity::default()
        );
    }

    #[test]
    fn scalar_document_resolves_to_defaults() {
        let home = tempdir().unwrap();
        write_config(home.path(), "\"Ada <ada@example.com>\"");
        assert_eq!(
            resolve_from(Some(home.path().to_path_buf())),
            AuthorIdentity::default()
        );
    }

    #[test]
    fn directory_in_place_of_file_resolves_to_defaults() {
        let home = tempdir().unwrap();
        std::fs::create_dir_all(config_path(home.path())).unwrap();
        assert_eq!(
            resolve_from(Some(home.path().to_path_buf())),
            AuthorIdentity::default()
        );
    }

    #[test]
    fn name_only_keeps_default_email() {
        let home = tempdir().unwrap();
        write_config(home.path(), r#"{"GitAuthorName": "Ada"}"#);

        let identity = resolve_from(Some(home.path().to_path_buf()));
        assert_eq!(identity.name, "Ada");
        assert_eq!(identity.email, "ops@platoteam.com");
    }

    #[test]
    fn email_only_keeps_default_name() {
        let home = tempdir().unwrap();
        write_config(home.path(), r#"{"GitAuthorEmail": "ada@example.com"}"#);

        let identity = resolve_from(Some(home.path().to_path_buf()));
        assert_eq!(identity.name, "Plato");
        assert_eq!(identity.email, "ada@example.com");
    }

    #[test]
    fn full_config_overrides_both_fields() {
        let home = tempdir().unwrap();
        write_config(
            home.path(),
            r#"{"GitAuthorEmail": "ada@example.com", "GitAuthorName": "Ada", "Extra": 1}"#,
        );

        let identity = resolve_from(Some(home.path().to_path_buf()));
        assert_eq!(identity.to_string(), "Ada <ada@example.com>");
    }

    #[test]
    fn null_field_keeps_default() {
        let home = tempdir().unwrap();
        write_config(home.path(), r#"{"GitAuthorName": null, "GitAuthorEmail": "a@b.c"}"#);

        let identity = resolve_from(Some(home.path().to_path_buf()));
        assert_eq!(identity.name, "Plato");
        assert_eq!(identity.email, "a@b.c");
    }

    #[test]
    fn keys_match_ignoring_case() {
        let home = tempdir().unwrap();
        write_config(
            home.path(),
            r#"{"gitauthorname": "Ada", "GITAUTHOREMAIL": "ada@example.com"}"#,
        );

        let identity = resolve_from(Some(home.path().to_path_buf()));
        assert_eq!(identity.to_string(), "Ada <ada@example.com>");
    }

    #[test]
    fn mistyped_field_keeps_the_well_typed_one() {
        let home = tempdir().unwrap();
        write_config(home.path(), r#"{"GitAuthorEmail": "a@b.c", "GitAuthorName": 5}"#);

        let identity = resolve_from(Some(home.path().to_path_buf()));
        assert_eq!(identity.name, "Plato");
        assert_eq!(identity.email, "a@b.c");
    }

    #[test]
    fn array_document_resolves_to_defaults() {
        let home = tempdir().unwrap();
        write_config(home.path(), r#"["Ada", "ada@example.com"]"#);

        let err = load(&config_path(home.path()), AuthorIdentity::default()).unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
    }

    #[test]
    fn load_applies_onto_given_base() {
        let home = tempdir().unwrap();
        write_config(home.path(), r#"{"GitAuthorName": "Ada"}"#);

        let base = AuthorIdentity {
            name: "Base".into(),
            email: "base@example.com".into(),
        };
        let identity = load(&config_path(home.path()), base).unwrap();
        assert_eq!(identity.name, "Ada");
        assert_eq!(identity.email, "base@example.com");
    }
}
