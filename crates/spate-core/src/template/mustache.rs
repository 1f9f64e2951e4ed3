//! The `{{NAME}}` / `{{#LIST}}…{{.}}…{{/LIST}}` / `{{^LIST}}…{{/LIST}}`
//! substitution engine: scalar variables, list iteration with `.` bound to
//! each element, and inverted sections rendered iff the list is empty.

use regex::Regex;
use std::sync::OnceLock;

use super::{Environment, TemplateEngine, Value};
use crate::error::{Result, SpateError};

#[derive(Debug, Clone)]
enum Token {
    Text(String),
    Var(String),
    SectionStart(String),
    InvertedStart(String),
    SectionEnd(String),
}

#[derive(Debug, Clone)]
enum Node {
    Text(String),
    Var(String),
    Section {
        name: String,
        inverted: bool,
        body: Vec<Node>,
    },
}

fn tag_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"\{\{(#|\^|/)?\s*([A-Za-z_][A-Za-z0-9_]*|\.)\s*\}\}").unwrap()
    })
}

fn tokenize(template: &str) -> Vec<Token> {
    let mut tokens = Vec::new();
    let mut last = 0;
    for cap in tag_pattern().captures_iter(template) {
        let whole = cap.get(0).unwrap();
        if whole.start() > last {
            tokens.push(Token::Text(template[last..whole.start()].to_string()));
        }
        last = whole.end();
        let name = cap.get(2).unwrap().as_str().to_string();
        match cap.get(1).map(|m| m.as_str()) {
            Some("#") => tokens.push(Token::SectionStart(name)),
            Some("^") => tokens.push(Token::InvertedStart(name)),
            Some("/") => tokens.push(Token::SectionEnd(name)),
            _ => tokens.push(Token::Var(name)),
        }
    }
    if last < template.len() {
        tokens.push(Token::Text(template[last..].to_string()));
    }
    tokens
}

fn parse_nodes(
    tokens: &[Token],
    pos: &mut usize,
    stop_name: Option<&str>,
) -> Result<Vec<Node>> {
    let mut nodes = Vec::new();
    while *pos < tokens.len() {
        match &tokens[*pos] {
            Token::SectionEnd(name) => {
                if Some(name.as_str()) == stop_name {
                    *pos += 1;
                    return Ok(nodes);
                }
                return Err(SpateError::TemplateError(format!(
                    "unexpected closing tag '{{{{/{name}}}}}'"
                )));
            }
            Token::SectionStart(name) => {
                let name = name.clone();
                *pos += 1;
                let body = parse_nodes(tokens, pos, Some(&name))?;
                nodes.push(Node::Section {
                    name,
                    inverted: false,
                    body,
                });
            }
            Token::InvertedStart(name) => {
                let name = name.clone();
                *pos += 1;
                let body = parse_nodes(tokens, pos, Some(&name))?;
                nodes.push(Node::Section {
                    name,
                    inverted: true,
                    body,
                });
            }
            Token::Var(name) => {
                nodes.push(Node::Var(name.clone()));
                *pos += 1;
            }
            Token::Text(text) => {
                nodes.push(Node::Text(text.clone()));
                *pos += 1;
            }
        }
    }
    if let Some(name) = stop_name {
        return Err(SpateError::TemplateError(format!(
            "unterminated section '{{{{#{name}}}}}'"
        )));
    }
    Ok(nodes)
}

fn render_nodes(nodes: &[Node], env: &Environment, dot: Option<&str>) -> Result<String> {
    let mut out = String::new();
    for node in nodes {
        match node {
            Node::Text(text) => out.push_str(text),
            Node::Var(name) if name == "." => {
                let value = dot.ok_or_else(|| {
                    SpateError::TemplateError("'.' used outside of a list section".to_string())
                })?;
                out.push_str(value);
            }
            Node::Var(name) => match env.get(name) {
                Some(Value::Scalar(s)) => out.push_str(s),
                Some(Value::List(items)) => out.push_str(&items.join(" ")),
                None => {
                    return Err(SpateError::TemplateError(format!(
                        "undefined variable '{name}'"
                    )))
                }
            },
            Node::Section {
                name,
                inverted,
                body,
            } => match env.get(name) {
                Some(Value::List(items)) => {
                    if *inverted {
                        if items.is_empty() {
                            out.push_str(&render_nodes(body, env, dot)?);
                        }
                    } else {
                        for item in items {
                            out.push_str(&render_nodes(body, env, Some(item))?);
                        }
                    }
                }
                Some(Value::Scalar(_)) => {
                    return Err(SpateError::TemplateError(format!(
                        "'{name}' is a scalar, not a list, and cannot be used in a section"
                    )))
                }
                None => {
                    return Err(SpateError::TemplateError(format!(
                        "undefined variable '{name}'"
                    )))
                }
            },
        }
    }
    Ok(out)
}

pub struct MustacheEngine;

impl TemplateEngine for MustacheEngine {
    fn render(&self, template: &str, env: &Environment) -> Result<String> {
        let tokens = tokenize(template);
        let mut pos = 0;
        let nodes = parse_nodes(&tokens, &mut pos, None)?;
        render_nodes(&nodes, env, None)
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
    fn substitutes_scalar() {
        let env = env_with(&[("OUTPUT", Value::Scalar("D".to_string()))]);
        assert_eq!(MustacheEngine.render("> {{OUTPUT}}", &env).unwrap(), "> D");
    }

    #[test]
    fn iterates_list_binding_dot() {
        let env = env_with(&[(
            "INPUTS",
            Value::List(vec!["A".to_string(), "C".to_string()]),
        )]);
        let rendered = MustacheEngine
            .render("cat {{#INPUTS}}{{.}} {{/INPUTS}}", &env)
            .unwrap();
        assert_eq!(rendered, "cat A C ");
    }

    #[test]
    fn inverted_section_renders_iff_list_empty() {
        let env = env_with(&[("INPUTS", Value::List(vec![]))]);
        assert_eq!(
            MustacheEngine
                .render("{{^INPUTS}}nothing{{/INPUTS}}", &env)
                .unwrap(),
            "nothing"
        );

        let env_nonempty = env_with(&[(
            "INPUTS",
            Value::List(vec!["A".to_string()]),
        )]);
        assert_eq!(
            MustacheEngine
                .render("{{^INPUTS}}nothing{{/INPUTS}}", &env_nonempty)
                .unwrap(),
            ""
        );
    }

    #[test]
    fn end_to_end_scenario_from_spec() {
        // Job with inputs (A, C), output D, matching spec.md §8 scenario 5.
        let env = env_with(&[
            (
                "INPUTS",
                Value::List(vec!["A".to_string(), "C".to_string()]),
            ),
            ("OUTPUT", Value::Scalar("D".to_string())),
        ]);
        let rendered = MustacheEngine
            .render("cat {{#INPUTS}}{{.}} {{/INPUTS}}> {{OUTPUT}}", &env)
            .unwrap();
        assert_eq!(rendered, "cat A C > D");
    }

    #[test]
    fn missing_variable_is_an_error() {
        let env = Environment::default();
        assert!(MustacheEngine.render("{{MISSING}}", &env).is_err());
    }
}
