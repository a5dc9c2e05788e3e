//! Secret redaction for anything that reaches a user or a log.

use std::collections::HashMap;

use regex::{Captures, Regex};

/// Environment names whose values are treated as secrets.
pub const SECRET_NAMES: [&str; 4] = ["PYPI_USERNAME", "PYPI_PASSWORD", "GH_TOKEN", "GL_TOKEN"];

/// Replaces known secret values with `${NAME}` placeholders.
#[derive(Debug, Clone, Default)]
pub struct Redactor {
    /// Alternation of every secret value, longest first.
    pattern: Option<Regex>,
    /// Secret value to its environment name.
    names: HashMap<String, String>,
}

impl Redactor {
    /// Builds a redactor from `(name, value)` pairs.
    ///
    /// Missing or empty values are ignored.
    pub fn new<I, N>(secrets: I) -> Self
    where
        I: IntoIterator<Item = (N, Option<String>)>,
        N: Into<String>,
    {
        let mut names = HashMap::new();
        for (name, value) in secrets {
            if let Some(value) = value.filter(|v| !v.is_empty()) {
                names.entry(value).or_insert_with(|| name.into());
            }
        }

        // Leftmost-first alternation: at a shared start the longer secret wins.
        let mut values: Vec<&String> = names.keys().collect();
        values.sort_by(|a, b| b.len().cmp(&a.len()).then_with(|| a.cmp(b)));
        let alternation = values
            .iter()
            .map(|value| regex::escape(value))
            .collect::<Vec<_>>()
            .join("|");
        let pattern = if alternation.is_empty() {
            None
        } else {
            Regex::new(&alternation).ok()
        };

        Self { pattern, names }
    }

    /// Returns `text` with every literal secret value replaced.
    ///
    /// The input is scanned once, so placeholders are never rewritten.
    pub fn redact(&self, text: &str) -> String {
        let Some(pattern) = &self.pattern else {
            return text.to_string();
        };
        pattern
            .replace_all(text, |caps: &Captures<'_>| match self.names.get(&caps[0]) {
                Some(name) => format!("${{{name}}}"),
                None => caps[0].to_string(),
            })
            .into_owned()
    }

    /// Whether there is nothing to redact.
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn redactor() -> Redactor {
        Redactor::new([
            ("GH_TOKEN", Some("ghp_secret123".to_string())),
            ("PYPI_PASSWORD", Some("hunter2".to_string())),
            ("PYPI_USERNAME", Some(String::new())),
            ("GL_TOKEN", None),
        ])
    }

    #[test]
    fn replaces_values_with_names() {
        let text = "push https://ghp_secret123@github.com failed, password hunter2";
        assert_eq!(
            redactor().redact(text),
            "push https://${GH_TOKEN}@github.com failed, password ${PYPI_PASSWORD}"
        );
    }

    #[test]
    fn ignores_empty_and_missing() {
        let r = redactor();
        assert_eq!(r.redact("nothing here"), "nothing here");
        assert_eq!(r.redact(""), "");
        assert!(Redactor::default().is_empty());
        assert_eq!(Redactor::default().redact("ghp_secret123"), "ghp_secret123");
    }

    #[test]
    fn partial_matches_are_kept() {
        assert_eq!(redactor().redact("hunter and ghp_secret"), "hunter and ghp_secret");
    }

    #[test]
    fn overlapping_secrets_prefer_longest() {
        let r = Redactor::new([
            ("PYPI_USERNAME", Some("abc".to_string())),
            ("PYPI_PASSWORD", Some("abcdef".to_string())),
        ]);
        assert_eq!(r.redact("abcdef abc"), "${PYPI_PASSWORD} ${PYPI_USERNAME}");
    }

    #[test]
    fn placeholders_are_not_redacted_again() {
        let r = Redactor::new([
            ("PYPI_PASSWORD", Some("s3cr3t-password".to_string())),
            ("PYPI_USERNAME", Some("PASS".to_string())),
        ]);
        assert_eq!(
            r.redact("login failed for s3cr3t-password as PASS"),
            "login failed for ${PYPI_PASSWORD} as ${PYPI_USERNAME}"
        );
    }

    #[test]
    fn regex_metacharacters_are_literal() {
        let r = Redactor::new([("GH_TOKEN", Some("a.b*c".to_string()))]);
        assert_eq!(r.redact("a.b*c axbbc"), "${GH_TOKEN} axbbc");
    }

    mod properties {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn secret_never_survives(
                secret in "[A-Za-z0-9_]{1,24}",
                prefix in ".{0,40}",
                suffix in ".{0,40}",
            ) {
                let r = Redactor::new([("GH_TOKEN", Some(secret.clone()))]);
                let output = r.redact(&format!("{prefix}{secret}{suffix}"));
                prop_assume!(!"${GH_TOKEN}".contains(secret.as_str()));
                prop_assert!(!output.contains(secret.as_str()));
            }

            #[test]
            fn text_without_secret_is_unchanged(text in "[a-z ]{0,60}") {
                let r = Redactor::new([("GH_TOKEN", Some("ZZ9PluralZAlpha".to_string()))]);
                prop_assert_eq!(r.redact(&text), text);
            }
        }
    }
}
