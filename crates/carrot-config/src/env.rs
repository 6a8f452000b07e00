use std::sync::LazyLock;

use regex::{Captures, Regex};

/// `{{ env.NAME }}` or `{{ env.NAME | default("value") }}`
static PLACEHOLDER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"\{\{\s*([A-Za-z0-9_.]+)\s*(?:\|\s*default\("([^"]*)"\)\s*)?\}\}"#).expect("must be valid regex")
});

/// Substitute environment placeholders in raw config text
///
/// Comment lines are copied verbatim so a commented-out secret never has to
/// be present in the environment.
pub(crate) fn expand_env(input: &str) -> Result<String, String> {
    let mut output = String::with_capacity(input.len());

    for line in input.split_inclusive('\n') {
        if line.trim_start().starts_with('#') {
            output.push_str(line);
        } else {
            expand_line(line, &mut output)?;
        }
    }

    Ok(output)
}

fn expand_line(line: &str, output: &mut String) -> Result<(), String> {
    let mut cursor = 0;

    for captures in PLACEHOLDER.captures_iter(line) {
        let Some(whole) = captures.get(0) else { continue };

        output.push_str(&line[cursor..whole.start()]);
        output.push_str(&resolve(&captures)?);
        cursor = whole.end();
    }

    output.push_str(&line[cursor..]);
    Ok(())
}

fn resolve(captures: &Captures<'_>) -> Result<String, String> {
    let key = captures.get(1).map_or("", |m| m.as_str());
    let fallback = captures.get(2).map(|m| m.as_str());

    let Some(name) = key.strip_prefix("env.").filter(|name| !name.contains('.')) else {
        return Err(format!("only variables scoped with 'env.' are supported: `{key}`"));
    };

    match (std::env::var(name), fallback) {
        (Ok(value), _) => Ok(value),
        (Err(_), Some(fallback)) => Ok(fallback.to_string()),
        (Err(_), None) => Err(format!("environment variable not found: `{name}`")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn text_without_placeholders_is_unchanged() {
        let input = "[chat]\nsystem_prompt = \"hi\"\n";
        assert_eq!(expand_env(input).unwrap(), input);
    }

    #[test]
    fn variables_are_substituted() {
        let vars = [("CARROT_A", Some("alpha")), ("CARROT_B", Some("beta"))];
        temp_env::with_vars(vars, || {
            let result = expand_env("a = \"{{ env.CARROT_A }}\"\nb = \"{{env.CARROT_B}}-x\"").unwrap();
            assert_eq!(result, "a = \"alpha\"\nb = \"beta-x\"");
        });
    }

    #[test]
    fn missing_variable_is_an_error() {
        temp_env::with_var_unset("CARROT_MISSING", || {
            let err = expand_env("key = \"{{ env.CARROT_MISSING }}\"").unwrap_err();
            assert!(err.contains("CARROT_MISSING"));
        });
    }

    #[test]
    fn default_applies_only_when_unset() {
        temp_env::with_var_unset("CARROT_OPTIONAL", || {
            let result = expand_env("key = \"{{ env.CARROT_OPTIONAL | default(\"fallback\") }}\"").unwrap();
            assert_eq!(result, "key = \"fallback\"");
        });

        temp_env::with_var("CARROT_OPTIONAL", Some("set"), || {
            let result = expand_env("key = \"{{ env.CARROT_OPTIONAL | default(\"fallback\") }}\"").unwrap();
            assert_eq!(result, "key = \"set\"");
        });
    }

    #[test]
    fn empty_default_is_allowed() {
        temp_env::with_var_unset("CARROT_OPTIONAL", || {
            let result = expand_env("key = \"{{ env.CARROT_OPTIONAL | default(\"\") }}\"").unwrap();
            assert_eq!(result, "key = \"\"");
        });
    }

    #[test]
    fn other_scopes_are_rejected() {
        let err = expand_env("key = \"{{ vault.TOKEN }}\"").unwrap_err();
        assert!(err.contains("only variables scoped with 'env.'"));
    }

    #[test]
    fn comment_lines_are_not_expanded() {
        temp_env::with_vars([("CARROT_REAL", Some("value")), ("CARROT_COMMENTED", None)], || {
            let input = "  # secret = \"{{ env.CARROT_COMMENTED }}\"\nkey = \"{{ env.CARROT_REAL }}\"\n";
            let result = expand_env(input).unwrap();
            assert_eq!(result, "  # secret = \"{{ env.CARROT_COMMENTED }}\"\nkey = \"value\"\n");
        });
    }
}
