use regex::{Captures, Regex};
use std::collections::HashMap;
use std::sync::LazyLock;
use thiserror::Error;

static PLACEHOLDER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\{([A-Za-z_][A-Za-z0-9_]*)\}").expect("placeholder pattern"));

#[derive(Debug, Error, PartialEq, Eq)]
pub enum TemplateError {
    #[error("missing value for template variable '{0}'")]
    MissingVariable(String),
    #[error("template expects variables {expected:?}, found {found:?}")]
    UnexpectedVariables {
        expected: Vec<String>,
        found: Vec<String>,
    },
}

/// A fixed prompt string with `{name}` placeholders.
#[derive(Debug, Clone)]
pub struct PromptTemplate {
    template: String,
    input_variables: Vec<String>,
}

impl PromptTemplate {
    pub fn new(template: impl Into<String>) -> Self {
        let template = template.into();
        let mut input_variables: Vec<String> = Vec::new();
        for captures in PLACEHOLDER.captures_iter(&template) {
            let name = captures[1].to_string();
            if !input_variables.contains(&name) {
                input_variables.push(name);
            }
        }

        PromptTemplate {
            template,
            input_variables,
        }
    }

    /// Like [`PromptTemplate::new`], but fails unless the placeholders are exactly `expected`.
    pub fn with_variables(template: impl Into<String>, expected: &[&str]) -> Result<Self, TemplateError> {
        let parsed = Self::new(template);
        let mut found = parsed.input_variables().to_vec();
        let mut wanted: Vec<String> = expected.iter().map(|name| name.to_string()).collect();
        found.sort();
        wanted.sort();
        if found != wanted {
            return Err(TemplateError::UnexpectedVariables {
                expected: wanted,
                found,
            });
        }
        Ok(parsed)
    }

    pub fn input_variables(&self) -> &[String] {
        &self.input_variables
    }

    /// Substitutes every placeholder in a single pass. Values are inserted
    /// verbatim and never rescanned for placeholders.
    pub fn format(&self, inputs: &HashMap<&str, &str>) -> Result<String, TemplateError> {
        if let Some(missing) = self
            .input_variables
            .iter()
            .find(|name| !inputs.contains_key(name.as_str()))
        {
            return Err(TemplateError::MissingVariable(missing.clone()));
        }

        let rendered = PLACEHOLDER.replace_all(&self.template, |captures: &Captures| {
            inputs
                .get(&captures[1])
                .copied()
                .unwrap_or_default()
                .to_string()
        });
        Ok(rendered.into_owned())
    }

    /// Shorthand for templates with a single placeholder.
    pub fn format_one(&self, name: &str, value: &str) -> Result<String, TemplateError> {
        self.format(&HashMap::from([(name, value)]))
    }
}
