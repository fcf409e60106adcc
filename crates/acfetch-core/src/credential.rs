//! Access token lookup in the process environment.
//!
//! Every way the lookup can fail on a given platform collapses into
//! [`CredentialLookup::Absent`]. Machines without a token, and machines where
//! the environment cannot be read, are treated the same: nothing is fetched.

use std::env::VarError;
use std::fmt;

/// Opaque access token. Never printed.
#[derive(Clone, PartialEq, Eq)]
pub struct Credential(String);

impl Credential {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    /// Raw token, for building the auth header.
    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Credential(<redacted>)")
    }
}

/// Outcome of looking up a credential.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CredentialLookup {
    Present(Credential),
    Absent,
}

impl CredentialLookup {
    pub fn is_present(&self) -> bool {
        matches!(self, Self::Present(_))
    }

    pub fn into_credential(self) -> Option<Credential> {
        match self {
            Self::Present(credential) => Some(credential),
            Self::Absent => None,
        }
    }
}

/// Source of environment variables.
pub trait EnvSource {
    fn var(&self, name: &str) -> Result<String, VarError>;
}

/// The real process environment.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessEnv;

impl EnvSource for ProcessEnv {
    fn var(&self, name: &str) -> Result<String, VarError> {
        std::env::var(name)
    }
}

/// Resolves a named credential from an [`EnvSource`].
#[derive(Debug, Clone, Default)]
pub struct CredentialResolver<E = ProcessEnv> {
    env: E,
}

impl CredentialResolver<ProcessEnv> {
    pub fn new() -> Self {
        Self { env: ProcessEnv }
    }
}

impl<E: EnvSource> CredentialResolver<E> {
    pub fn with_env(env: E) -> Self {
        Self { env }
    }

    /// Look up `name`, returning [`CredentialLookup::Absent`] on any failure.
    pub fn resolve(&self, name: &str) -> CredentialLookup {
        if !is_lookup_name(name) {
            tracing::debug!(variable = name, "Variable name cannot be looked up on this platform");
            return CredentialLookup::Absent;
        }

        match self.env.var(name) {
            Ok(value) if value.is_empty() => {
                tracing::debug!(variable = name, "Credential variable is empty");
                CredentialLookup::Absent
            }
            Ok(value) => CredentialLookup::Present(Credential(value)),
            Err(VarError::NotPresent) => {
                tracing::debug!(variable = name, "Credential variable is not set");
                CredentialLookup::Absent
            }
            Err(VarError::NotUnicode(_)) => {
                tracing::debug!(variable = name, "Credential variable is not valid unicode");
                CredentialLookup::Absent
            }
        }
    }
}

/// Resolve `name` from the process environment.
pub fn resolve(name: &str) -> CredentialLookup {
    CredentialResolver::new().resolve(name)
}

// Names the OS environment API rejects outright.
fn is_lookup_name(name: &str) -> bool {
    !name.is_empty() && !name.contains('=') && !name.contains('\0')
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::ffi::OsString;

    struct MapEnv(HashMap<String, String>);

    impl EnvSource for MapEnv {
        fn var(&self, name: &str) -> Result<String, VarError> {
            self.0.get(name).cloned().ok_or(VarError::NotPresent)
        }
    }

    struct BrokenEnv;

    impl EnvSource for BrokenEnv {
        fn var(&self, _name: &str) -> Result<String, VarError> {
            Err(VarError::NotUnicode(OsString::from("\u{fffd}")))
        }
    }

    struct PanickingEnv;

    impl EnvSource for PanickingEnv {
        fn var(&self, name: &str) -> Result<String, VarError> {
            panic!("environment consulted for {name:?}");
        }
    }

    fn map_env(pairs: &[(&str, &str)]) -> MapEnv {
        MapEnv(
            pairs
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        )
    }

    #[test]
    fn test_present_variable_resolves() {
        let resolver = CredentialResolver::with_env(map_env(&[("TOKEN", "glpat-abc")]));
        let lookup = resolver.resolve("TOKEN");
        assert_eq!(lookup, CredentialLookup::Present(Credential::new("glpat-abc")));
    }

    #[test]
    fn test_unset_variable_is_absent() {
        let resolver = CredentialResolver::with_env(map_env(&[]));
        assert_eq!(resolver.resolve("TOKEN"), CredentialLookup::Absent);
    }

    #[test]
    fn test_empty_value_is_absent() {
        let resolver = CredentialResolver::with_env(map_env(&[("TOKEN", "")]));
        assert_eq!(resolver.resolve("TOKEN"), CredentialLookup::Absent);
    }

    #[test]
    fn test_platform_failure_is_absent() {
        let resolver = CredentialResolver::with_env(BrokenEnv);
        assert_eq!(resolver.resolve("TOKEN"), CredentialLookup::Absent);
    }

    #[test]
    fn test_unrepresentable_names_skip_lookup() {
        let resolver = CredentialResolver::with_env(PanickingEnv);
        for name in ["", "A=B", "NUL\0NAME"] {
            assert_eq!(resolver.resolve(name), CredentialLookup::Absent);
        }
    }

    #[test]
    fn test_value_is_not_validated() {
        let resolver = CredentialResolver::with_env(map_env(&[("TOKEN", " not a token ")]));
        let credential = resolver.resolve("TOKEN").into_credential().unwrap();
        assert_eq!(credential.expose(), " not a token ");
    }

    #[test]
    fn test_debug_redacts_token() {
        let credential = Credential::new("super-secret");
        let printed = format!("{:?}", CredentialLookup::Present(credential));
        assert!(!printed.contains("super-secret"));
        assert!(printed.contains("redacted"));
    }
}
