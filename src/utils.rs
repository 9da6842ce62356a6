//!
//! Utility types and functions shared across the crate.
//!
//! This module provides:
//! - [`Sensitive`] - A wrapper type for secret material that hides values in debug output
//! - [`replace_handlebars_with_env`] - Template substitution for environment variables
//!

use {
    regex::{Captures, Regex},
    std::{env, sync::LazyLock},
    zeroize::{Zeroize, ZeroizeOnDrop},
};

/// Regular expression pattern for matching handlebars-style environment variable references.
/// Matches patterns like `{{ VAR_NAME }}` with optional whitespace around the variable name.
/// Variable names must be uppercase letters, digits, or underscores (standard env var naming).
static HANDLEBAR_REGEXP: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\{\{\s*([A-Z0-9_]+)\s*\}\}").unwrap());

/// A wrapper type for sensitive data that obscures the value in debug output
/// and securely zeros memory when dropped.
///
/// The normalized configuration wraps the session secret(s) and the client
/// secret in this type so they never leak through `{:?}` formatting or log
/// lines.
///
/// The inner value remains accessible through the public field `0`, but when
/// formatted using `Debug`, it displays as `Sensitive(****)` instead of the
/// actual value.
///
/// # Examples
///
/// ```
/// use oidc_conf::Sensitive;
///
/// let secret = Sensitive::from("a long session secret");
/// assert_eq!(format!("{:?}", secret), "Sensitive(****)");
///
/// // Access the actual value when needed
/// let value: &str = &secret.0;
/// ```
///
/// # Security Limitations
///
/// This type does NOT:
/// - Prevent the value from being read if you have access to the `Sensitive` instance
/// - Encrypt or secure the value in memory while in use
/// - Prevent the compiler from copying the value (use with care in generic contexts)
#[derive(Clone, Default, Zeroize, ZeroizeOnDrop)]
pub struct Sensitive<T: Default + Zeroize>(pub T);

impl Sensitive<String> {
    /// Creates a new `Sensitive<String>` from a string slice.
    pub fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl<T: Default + Zeroize + PartialEq> PartialEq for Sensitive<T> {
    fn eq(&self, other: &Self) -> bool {
        self.0 == other.0
    }
}

impl<T: Default + Zeroize> std::fmt::Debug for Sensitive<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Sensitive(****)")
    }
}

/// Replaces handlebars-style placeholders with environment variable values.
///
/// Searches through the input string for patterns like `{{ VAR_NAME }}` and replaces
/// them with the corresponding environment variable value. Variable names are
/// case-sensitive and must consist of uppercase letters, digits, or underscores.
///
/// Whitespace around the variable name is allowed: `{{VAR}}`, `{{ VAR }}`, and
/// `{{  VAR  }}` are all valid and equivalent.
///
/// # Examples
///
/// ```
/// use oidc_conf::utils::replace_handlebars_with_env;
///
/// // Missing variables become empty strings
/// let template = "Value: {{ MISSING_VAR }}";
/// let result = replace_handlebars_with_env(template);
/// assert_eq!(result, "Value: ");
/// ```
///
/// # Security Considerations
///
/// - Substituted values appear in the returned string in plain text
/// - Be cautious when logging or displaying the result
pub fn replace_handlebars_with_env(input: &str) -> String {
    HANDLEBAR_REGEXP
        .replace_all(input, |caps: &Captures| {
            let var_name = &caps[1];
            env::var(var_name).unwrap_or_else(|_| {
                tracing::warn!(
                    variable = %var_name,
                    "Environment variable not found, substituting with empty string"
                );
                String::new()
            })
        })
        .to_string()
}
