//! Environment variable expansion for configuration strings.
//!
//! Only the braced forms are expanded:
//! - `${VAR}` - value of VAR, error if unset
//! - `${VAR:-default}` - value of VAR if set, otherwise `default`

use crate::ConfigError;

/// Lookup failure for an unset variable.
struct UnsetVar(String);

/// Expand `${...}` references in `value`. `field` names the setting in errors.
pub(crate) fn expand_env(value: &str, field: &str) -> Result<String, ConfigError> {
    if !value.contains("${") {
        return Ok(value.to_owned());
    }

    shellexpand::env_with_context(value, |name| match std::env::var(name) {
        Ok(found) => Ok(Some(found)),
        Err(_) => Err(UnsetVar(name.to_owned())),
    })
    .map(std::borrow::Cow::into_owned)
    .map_err(|err| ConfigError::EnvVar {
        field: field.to_owned(),
        message: format!("${{{}}} not set", err.cause.0),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_expand_title() {
        // SAFETY: test runs single-threaded per test function
        unsafe {
            std::env::set_var("MDC_TEST_PROJECT", "Handbook");
        }
        let result = expand_env("${MDC_TEST_PROJECT} guide", "document.title").unwrap();
        assert_eq!(result, "Handbook guide");
        unsafe {
            std::env::remove_var("MDC_TEST_PROJECT");
        }
    }

    #[test]
    fn test_default_used_when_unset() {
        // SAFETY: test runs single-threaded per test function
        unsafe {
            std::env::remove_var("MDC_TEST_NO_STYLE");
        }
        let result = expand_env("${MDC_TEST_NO_STYLE:-Monokai}", "highlight.style").unwrap();
        assert_eq!(result, "Monokai");
    }

    #[test]
    fn test_unset_var_error_names_field() {
        // SAFETY: test runs single-threaded per test function
        unsafe {
            std::env::remove_var("MDC_TEST_MISSING");
        }
        let err = expand_env("${MDC_TEST_MISSING}", "highlight.css_class").unwrap_err();

        assert!(matches!(err, ConfigError::EnvVar { .. }));
        let message = err.to_string();
        assert!(message.contains("MDC_TEST_MISSING"));
        assert!(message.contains("highlight.css_class"));
    }

    #[test]
    fn test_text_without_braces_unchanged() {
        assert_eq!(expand_env("cost: $5", "document.title").unwrap(), "cost: $5");
        assert_eq!(expand_env("plain", "document.title").unwrap(), "plain");
    }
}
