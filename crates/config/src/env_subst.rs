use std::sync::LazyLock;

use regex::{Captures, Regex};

static PLACEHOLDER: LazyLock<Option<Regex>> = LazyLock::new(|| {
    Regex::new(r"\$\{([A-Za-z_][A-Za-z0-9_]*)(?::-([^}]*))?\}").ok()
});

/// Replace `${ENV_VAR}` placeholders with values from the process environment.
///
/// `${ENV_VAR:-fallback}` yields `fallback` when the variable is unset.
/// Anything else unresolvable is left as written.
pub fn substitute_env(input: &str) -> String {
    substitute_env_with(input, |name| std::env::var(name).ok())
}

fn substitute_env_with(input: &str, lookup: impl Fn(&str) -> Option<String>) -> String {
    let Some(re) = PLACEHOLDER.as_ref() else {
        return input.to_owned();
    };
    re.replace_all(input, |caps: &Captures<'_>| {
        let name = &caps[1];
        match (lookup(name), caps.get(2)) {
            (Some(value), _) => value,
            (None, Some(fallback)) => fallback.as_str().to_owned(),
            (None, None) => caps[0].to_owned(),
        }
    })
    .into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lookup(name: &str) -> Option<String> {
        match name {
            "CLAWPRESS_SITE_TITLE" => Some("My Blog".to_string()),
            _ => None,
        }
    }

    #[test]
    fn substitutes_known_var() {
        assert_eq!(
            substitute_env_with("title = \"${CLAWPRESS_SITE_TITLE}\"", lookup),
            "title = \"My Blog\""
        );
    }

    #[test]
    fn unknown_var_is_left_alone() {
        assert_eq!(
            substitute_env_with("${CLAWPRESS_NOPE}", lookup),
            "${CLAWPRESS_NOPE}"
        );
    }

    #[test]
    fn fallback_used_when_unset() {
        assert_eq!(
            substitute_env_with("port = ${CLAWPRESS_PORT:-8787}", lookup),
            "port = 8787"
        );
        assert_eq!(
            substitute_env_with("${CLAWPRESS_SITE_TITLE:-Untitled}", lookup),
            "My Blog"
        );
    }

    #[test]
    fn malformed_placeholder_is_literal() {
        assert_eq!(substitute_env_with("${unclosed", lookup), "${unclosed");
        assert_eq!(substitute_env("plain text"), "plain text");
    }
}
