//! Typed environment variables
//!
//! Every variable the crate reads is declared once here with its name, default and
//! description, so overrides are validated the same way everywhere and
//! `generate_env_docs` can list them.

use std::env;
use std::fmt;

/// Environment variable parse error
#[derive(Debug, Clone)]
pub struct EnvError {
    pub variable: String,
    pub message: String,
}

impl fmt::Display for EnvError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Environment variable '{}': {}", self.variable, self.message)
    }
}

impl std::error::Error for EnvError {}

pub type EnvResult<T> = Result<T, EnvError>;

/// Typed accessor for one environment variable
pub trait EnvVar<T> {
    const NAME: &'static str;
    const DEFAULT: Option<T>;
    const DESCRIPTION: &'static str;

    fn parse(value: &str) -> EnvResult<T>;

    fn get() -> EnvResult<T> {
        match env::var(Self::NAME) {
            Ok(value) => Self::parse(&value),
            Err(_) => {
                if let Some(default) = Self::DEFAULT {
                    Ok(default)
                } else {
                    Err(EnvError {
                        variable: Self::NAME.to_string(),
                        message: "Required environment variable not set".to_string(),
                    })
                }
            }
        }
    }

    /// Value only when the variable is actually set
    fn get_set() -> Option<EnvResult<T>> {
        env::var(Self::NAME).ok().map(|value| Self::parse(&value))
    }

    fn get_or_default(default: T) -> T {
        Self::get().unwrap_or(default)
    }
}

/// Process-level variables
pub mod core {
    use super::*;

    /// Log level
    pub struct LogLevel;
    impl EnvVar<String> for LogLevel {
        const NAME: &'static str = "BABELE_LOG_LEVEL";
        const DEFAULT: Option<String> = None;

        fn get() -> EnvResult<String> {
            match env::var(Self::NAME) {
                Ok(value) => Self::parse(&value),
                Err(_) => Ok("info".to_string()),
            }
        }
        const DESCRIPTION: &'static str = "Log level: trace, debug, info, warn, error";

        fn parse(value: &str) -> EnvResult<String> {
            match value.to_lowercase().as_str() {
                "trace" | "debug" | "info" | "warn" | "error" => Ok(value.to_lowercase()),
                _ => Err(EnvError {
                    variable: Self::NAME.to_string(),
                    message: format!("Invalid log level '{}'. Use: trace, debug, info, warn, error", value),
                }),
            }
        }
    }

    /// Disable colored output
    pub struct NoColor;
    impl EnvVar<bool> for NoColor {
        const NAME: &'static str = "NO_COLOR";
        const DEFAULT: Option<bool> = Some(false);
        const DESCRIPTION: &'static str = "Disable colored output when set to any value";

        fn parse(value: &str) -> EnvResult<bool> {
            Ok(!value.is_empty())
        }
    }
}

/// Translation lookup variables
pub mod babele {
    use super::*;

    /// Active language
    pub struct Lang;
    impl EnvVar<String> for Lang {
        const NAME: &'static str = "BABELE_LANG";
        const DEFAULT: Option<String> = None;

        fn get() -> EnvResult<String> {
            match env::var(Self::NAME) {
                Ok(value) => Self::parse(&value),
                Err(_) => Ok("en".to_string()),
            }
        }
        const DESCRIPTION: &'static str = "Active language code (e.g. de, fr, pt-BR)";

        fn parse(value: &str) -> EnvResult<String> {
            parse_language(value, Self::NAME)
        }
    }

    /// Locale used for sorting when the active language has no collation rules
    pub struct FallbackLocale;
    impl EnvVar<String> for FallbackLocale {
        const NAME: &'static str = "BABELE_FALLBACK_LOCALE";
        const DEFAULT: Option<String> = None;

        fn get() -> EnvResult<String> {
            match env::var(Self::NAME) {
                Ok(value) => Self::parse(&value),
                Err(_) => Ok("en".to_string()),
            }
        }
        const DESCRIPTION: &'static str = "Collation locale used when the active language has none";

        fn parse(value: &str) -> EnvResult<String> {
            parse_language(value, Self::NAME)
        }
    }

    /// User translation directory
    pub struct Directory;
    impl EnvVar<String> for Directory {
        const NAME: &'static str = "BABELE_DIRECTORY";
        const DEFAULT: Option<String> = None;
        const DESCRIPTION: &'static str = "Directory holding user supplied translation files";

        fn parse(value: &str) -> EnvResult<String> {
            parse_non_empty(value, Self::NAME)
        }
    }

    /// Root that relative translation paths resolve against
    pub struct DataDir;
    impl EnvVar<String> for DataDir {
        const NAME: &'static str = "BABELE_DATA_DIR";
        const DEFAULT: Option<String> = None;
        const DESCRIPTION: &'static str = "Data root for modules/, systems/ and user directories";

        fn parse(value: &str) -> EnvResult<String> {
            parse_non_empty(value, Self::NAME)
        }
    }
}

/// Cache variables
pub mod cache {
    use super::*;

    /// Persistent cache switch
    pub struct Enabled;
    impl EnvVar<bool> for Enabled {
        const NAME: &'static str = "BABELE_CACHE_ENABLED";
        const DEFAULT: Option<bool> = Some(true);
        const DESCRIPTION: &'static str = "Cache provider translations on disk";

        fn parse(value: &str) -> EnvResult<bool> {
            parse_bool(value, Self::NAME)
        }
    }

    /// Cache database location
    pub struct Path;
    impl EnvVar<String> for Path {
        const NAME: &'static str = "BABELE_CACHE_PATH";
        const DEFAULT: Option<String> = None;
        const DESCRIPTION: &'static str = "Location of the translation cache database";

        fn parse(value: &str) -> EnvResult<String> {
            parse_non_empty(value, Self::NAME)
        }
    }
}

fn parse_bool(value: &str, var_name: &str) -> EnvResult<bool> {
    match value.to_lowercase().as_str() {
        "true" | "1" | "yes" | "on" | "enabled" => Ok(true),
        "false" | "0" | "no" | "off" | "disabled" => Ok(false),
        _ => Err(EnvError {
            variable: var_name.to_string(),
            message: format!(
                "Invalid boolean value '{}'. Use: true/false, 1/0, yes/no, on/off, enabled/disabled",
                value
            ),
        }),
    }
}

fn parse_non_empty(value: &str, var_name: &str) -> EnvResult<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(EnvError {
            variable: var_name.to_string(),
            message: "Value cannot be empty".to_string(),
        });
    }
    Ok(trimmed.to_string())
}

fn parse_language(value: &str, var_name: &str) -> EnvResult<String> {
    let lang = value.trim();
    lang.parse::<icu_locid::LanguageIdentifier>()
        .map(|_| lang.to_string())
        .map_err(|e| EnvError {
            variable: var_name.to_string(),
            message: format!("Invalid language code '{}': {}", lang, e),
        })
}

/// Markdown listing of every variable
pub fn generate_env_docs() -> String {
    let mut docs = String::new();
    docs.push_str("# Environment Variables\n\n");

    docs.push_str("## Core\n\n");
    docs.push_str(&format!("- `{}`: {} (default: \"info\")\n", core::LogLevel::NAME, core::LogLevel::DESCRIPTION));
    docs.push_str(&format!(
        "- `{}`: {} (default: {:?})\n",
        core::NoColor::NAME,
        core::NoColor::DESCRIPTION,
        core::NoColor::DEFAULT
    ));

    docs.push_str("\n## Translations\n\n");
    docs.push_str(&format!("- `{}`: {} (default: \"en\")\n", babele::Lang::NAME, babele::Lang::DESCRIPTION));
    docs.push_str(&format!(
        "- `{}`: {} (default: \"en\")\n",
        babele::FallbackLocale::NAME,
        babele::FallbackLocale::DESCRIPTION
    ));
    docs.push_str(&format!("- `{}`: {}\n", babele::Directory::NAME, babele::Directory::DESCRIPTION));
    docs.push_str(&format!("- `{}`: {}\n", babele::DataDir::NAME, babele::DataDir::DESCRIPTION));

    docs.push_str("\n## Cache\n\n");
    docs.push_str(&format!(
        "- `{}`: {} (default: {:?})\n",
        cache::Enabled::NAME,
        cache::Enabled::DESCRIPTION,
        cache::Enabled::DEFAULT
    ));
    docs.push_str(&format!("- `{}`: {}\n", cache::Path::NAME, cache::Path::DESCRIPTION));

    docs
}
