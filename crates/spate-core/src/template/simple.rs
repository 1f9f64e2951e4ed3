//! The `$NAME` / `${NAME}` shell-style substitution engine.

use regex::Regex;
use std::sync::OnceLock;

use super::{Environment, TemplateEngine, Value};
use crate::error::{Result, SpateError};

fn pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\$\{([A-Za-z_][A-Za-z0-9_]*)\}|\$([A-Za-z_][A-Za-z0-9_]*)").unwrap())
}

pub struct SimpleEngine;

impl TemplateEngine for SimpleEngine {
    fn render(&self, template: &str, env: &Environment) -> Result<String> {
        let mut errors = Vec::new();
        let mut out = String::with_capacity(template.len());
        let mut last = 0;

        for cap in pattern().captures_iter(template) {
            let whole = cap.get(0).unwrap();
            let name = cap
                .get(1)
                .or_else(|| cap.get(2))
                .expect("one alternative always matches")
                .as_str();

            out.push_str(&template[last..whole.start()]);
            last = whole.end();

            match env.get(name) {
                Some(Value::Scalar(s)) => out.push_str(s),
                Some(Value::List(items)) => out.push_str(&items.join(" ")),
                None => errors.push(name.to_string()),
            }
        }
        out.push_str(&template[last..]);

        if !errors.is_empty() {
            return Err(SpateError::TemplateError(format!(
                "undefined variable(s): {}",
                errors.join(", ")
            )));
        }
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    fn env_with(pairs: &[(&str, Value)]) -> Environment {
        let mut map = BTreeMap::new();
        for (k, v) in pairs {
            map.insert(k.to_string(), v.clone());
        }
        Environment(map)
    }

    #[test]
    fn substitutes_bare_and_braced_names() {
        let env = env_with(&[("OUTPUT", Value::Scalar("D".to_string()))]);
        assert_eq!(
            SimpleEngine.render("cp $OUTPUT ${OUTPUT}.bak", &env).unwrap(),
            "cp D D.bak"
        );
    }

    #[test]
    fn missing_variable_is_an_error() {
        let env = Environment::default();
        assert!(SimpleEngine.render("$MISSING", &env).is_err());
    }

    #[test]
    fn list_variable_renders_space_joined() {
        let env = env_with(&[(
            "INPUTS",
            Value::List(vec!["A".to_string(), "B".to_string()]),
        )]);
        assert_eq!(SimpleEngine.render("$INPUTS", &env).unwrap(), "A B");
    }

    #[test]
    fn text_without_variables_passes_through() {
        let env = Environment::default();
        assert_eq!(SimpleEngine.render("plain text", &env).unwrap(), "plain text");
    }
}
