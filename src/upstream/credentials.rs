//! Icecast admin credentials.
//!
//! The collector asks a [`CredentialProvider`] for credentials on every run,
//! so a rotated admin password is picked up without a restart.

use crate::config::CredentialsConfig;
use quick_xml::events::Event;
use quick_xml::Reader;
use std::fmt;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors that can occur while resolving credentials.
#[derive(Debug, Error)]
pub enum CredentialsError {
    #[error("failed to read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse {}: {message}", path.display())]
    Parse { path: PathBuf, message: String },
    #[error("{} has no authentication/{element}", path.display())]
    MissingElement { path: PathBuf, element: &'static str },
}

/// Username and password for the Icecast admin interface.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl Credentials {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Source of admin credentials.
///
/// Lookups are synchronous and may fail; a failure aborts the whole
/// collection run.
pub trait CredentialProvider: Send + Sync {
    /// Resolves the current credentials.
    fn credentials(&self) -> Result<Credentials, CredentialsError>;
}

/// Fixed credentials from the exporter's own configuration.
#[derive(Debug, Clone)]
pub struct StaticCredentials(Credentials);

impl StaticCredentials {
    pub fn new(credentials: Credentials) -> Self {
        Self(credentials)
    }
}

impl CredentialProvider for StaticCredentials {
    fn credentials(&self) -> Result<Credentials, CredentialsError> {
        Ok(self.0.clone())
    }
}

/// Reads `<authentication>` from the Icecast server's `icecast.xml`.
#[derive(Debug, Clone)]
pub struct IcecastConfigCredentials {
    path: PathBuf,
}

impl IcecastConfigCredentials {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl CredentialProvider for IcecastConfigCredentials {
    fn credentials(&self) -> Result<Credentials, CredentialsError> {
        let content = std::fs::read_to_string(&self.path).map_err(|source| {
            CredentialsError::Read {
                path: self.path.clone(),
                source,
            }
        })?;
        parse_icecast_config(&content, &self.path)
    }
}

/// Builds the provider selected in the configuration.
pub fn provider_from_config(config: &CredentialsConfig) -> Box<dyn CredentialProvider> {
    match config {
        CredentialsConfig::IcecastConfig { path } => {
            Box::new(IcecastConfigCredentials::new(path.clone()))
        }
        CredentialsConfig::Static { username, password } => Box::new(StaticCredentials::new(
            Credentials::new(username.clone(), password.clone()),
        )),
    }
}

/// Extracts `admin-user` and `admin-password` from `<root>/authentication`.
fn parse_icecast_config(xml: &str, path: &Path) -> Result<Credentials, CredentialsError> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    let mut stack: Vec<Vec<u8>> = Vec::new();
    let mut user: Option<String> = None;
    let mut password: Option<String> = None;

    let parse_error = |message: String| CredentialsError::Parse {
        path: path.to_path_buf(),
        message,
    };

    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) => stack.push(e.name().as_ref().to_vec()),
            Ok(Event::End(_)) => {
                stack.pop();
            }
            Ok(Event::Text(t)) => {
                let slot = match stack.as_slice() {
                    [_, auth, leaf] if auth == b"authentication" => match leaf.as_slice() {
                        b"admin-user" => &mut user,
                        b"admin-password" => &mut password,
                        _ => continue,
                    },
                    _ => continue,
                };
                if slot.is_none() {
                    let text = t.unescape().map_err(|e| parse_error(e.to_string()))?;
                    *slot = Some(text.into_owned());
                }
            }
            Ok(Event::Eof) => break,
            Ok(_) => {}
            Err(e) => return Err(parse_error(e.to_string())),
        }
    }

    let missing = |element| CredentialsError::MissingElement {
        path: path.to_path_buf(),
        element,
    };
    let username = user
        .filter(|u| !u.is_empty())
        .ok_or_else(|| missing("admin-user"))?;
    let password = password
        .filter(|p| !p.is_empty())
        .ok_or_else(|| missing("admin-password"))?;

    Ok(Credentials { username, password })
}

#[cfg(test)]
mod tests {
    use super::*;

    const ICECAST_XML: &str = r#"<icecast>
    <location>Earth</location>
    <authentication>
        <source-password>sourcepw</source-password>
        <relay-password>relaypw</relay-password>
        <admin-user>admin</admin-user>
        <admin-password>h&amp;ckme</admin-password>
    </authentication>
    <listen-socket><port>8000</port></listen-socket>
</icecast>"#;

    fn parse(xml: &str) -> Result<Credentials, CredentialsError> {
        parse_icecast_config(xml, Path::new("icecast.xml"))
    }

    #[test]
    fn test_reads_admin_credentials() {
        let creds = parse(ICECAST_XML).unwrap();
        assert_eq!(creds, Credentials::new("admin", "h&ckme"));
    }

    #[test]
    fn test_missing_password_reported() {
        let err = parse(
            "<icecast><authentication><admin-user>admin</admin-user></authentication></icecast>",
        )
        .unwrap_err();
        assert!(matches!(
            err,
            CredentialsError::MissingElement {
                element: "admin-password",
                ..
            }
        ));
    }

    #[test]
    fn test_admin_user_outside_authentication_ignored() {
        let err = parse(
            "<icecast><admin-user>x</admin-user><authentication>\
             <admin-password>pw</admin-password></authentication></icecast>",
        )
        .unwrap_err();
        assert!(matches!(
            err,
            CredentialsError::MissingElement {
                element: "admin-user",
                ..
            }
        ));
    }

    #[test]
    fn test_malformed_xml_reported() {
        let err = parse("<icecast><authentication></icecast>").unwrap_err();
        assert!(matches!(err, CredentialsError::Parse { .. }));
    }

    #[test]
    fn test_missing_file_reported() {
        let provider = IcecastConfigCredentials::new("/nonexistent/icecast.xml");
        assert!(matches!(
            provider.credentials(),
            Err(CredentialsError::Read { .. })
        ));
    }

    #[test]
    fn test_reads_from_file() {
        let path = std::env::temp_dir().join(format!(
            "icecast-exporter-creds-{}.xml",
            std::process::id()
        ));
        std::fs::write(&path, ICECAST_XML).unwrap();

        let provider = IcecastConfigCredentials::new(&path);
        let creds = provider.credentials();
        std::fs::remove_file(&path).unwrap();

        assert_eq!(creds.unwrap(), Credentials::new("admin", "h&ckme"));
    }

    #[test]
    fn test_provider_from_static_config() {
        let provider = provider_from_config(&CredentialsConfig::Static {
            username: "u".into(),
            password: "p".into(),
        });
        assert_eq!(provider.credentials().unwrap(), Credentials::new("u", "p"));
    }

    #[test]
    fn test_debug_redacts_password() {
        let shown = format!("{:?}", Credentials::new("admin", "topsecret"));
        assert!(!shown.contains("topsecret"));
    }
}
