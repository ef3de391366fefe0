use std::env;
use std::fmt;

/// Runtime mode, read from `APP_ENV`.
///
/// Anything other than an explicit development or test value runs as
/// production, so a missing or misspelled `APP_ENV` never exposes internals.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum AppEnvironment {
    Development,
    Test,
    #[default]
    Production,
}

impl AppEnvironment {
    pub fn from_env() -> Self {
        Self::from_value(env::var("APP_ENV").ok().as_deref())
    }

    pub fn from_value(value: Option<&str>) -> Self {
        value.map(Self::parse).unwrap_or_default()
    }

    pub fn parse(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "development" | "dev" => Self::Development,
            "test" => Self::Test,
            _ => Self::Production,
        }
    }

    /// Whether internal error detail (stack traces) may be shown to clients.
    pub fn is_development(&self) -> bool {
        matches!(self, Self::Development)
    }
}

impl fmt::Display for AppEnvironment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Development => "development",
            Self::Test => "test",
            Self::Production => "production",
        };
        f.write_str(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse() {
        assert_eq!(AppEnvironment::parse("production"), AppEnvironment::Production);
        assert_eq!(AppEnvironment::parse("PROD"), AppEnvironment::Production);
        assert_eq!(AppEnvironment::parse("test"), AppEnvironment::Test);
        assert_eq!(AppEnvironment::parse(" Development "), AppEnvironment::Development);
        assert_eq!(AppEnvironment::parse("dev"), AppEnvironment::Development);
    }

    #[test]
    fn test_unset_or_unknown_hides_internals() {
        assert_eq!(AppEnvironment::from_value(None), AppEnvironment::Production);
        assert!(!AppEnvironment::default().is_development());
        for value in ["prodution", "staging", "", "develop"] {
            let env = AppEnvironment::parse(value);
            assert_eq!(env, AppEnvironment::Production, "{value:?}");
            assert!(!env.is_development());
        }
    }

    #[test]
    fn test_only_development_shows_internals() {
        assert!(AppEnvironment::Development.is_development());
        assert!(!AppEnvironment::Test.is_development());
        assert!(!AppEnvironment::Production.is_development());
    }
}
