//! Email template system
//!
//! Templates carry two kinds of markers:
//! - `#{key}` value placeholders, replaced by literal substring substitution
//! - `/* @NAME */` CSS injection points, replaced by an override or a built-in default
//!
//! Placeholders without a value, and injection points with neither an override nor a
//! default, are left in the output verbatim.

mod html;
mod styles;

pub use styles::default_css;

use crate::domain::CssOverrides;
use lazy_static::lazy_static;
use regex::{Captures, Regex};
use std::collections::HashMap;

lazy_static! {
    static ref CSS_MARKER: Regex =
        Regex::new(r"/\* @([A-Za-z0-9_-]+) \*/").expect("CSS marker pattern is valid");
    static ref VALUE_MARKER: Regex = Regex::new(r"#\{([^}]*)\}").expect("value marker pattern is valid");
}

/// Available built-in templates
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EmailTemplate {
    Welcome,
    PasswordReset,
    OrderConfirmation,
    NewsletterSubscription,
}

impl EmailTemplate {
    pub const ALL: [EmailTemplate; 4] = [
        Self::Welcome,
        Self::PasswordReset,
        Self::OrderConfirmation,
        Self::NewsletterSubscription,
    ];

    /// Look up a template by its public name (`welcome`, `passwordReset`, ...)
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|t| t.name() == name)
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Welcome => "welcome",
            Self::PasswordReset => "passwordReset",
            Self::OrderConfirmation => "orderConfirmation",
            Self::NewsletterSubscription => "newsletterSubscription",
        }
    }

    /// Get the HTML body template
    pub fn html_body(&self) -> &'static str {
        match self {
            Self::Welcome => html::WELCOME,
            Self::PasswordReset => html::PASSWORD_RESET,
            Self::OrderConfirmation => html::ORDER_CONFIRMATION,
            Self::NewsletterSubscription => html::NEWSLETTER_SUBSCRIPTION,
        }
    }

    /// Value placeholders the template expects
    pub fn placeholders(&self) -> &'static [&'static str] {
        match self {
            Self::Welcome => &["platform", "username", "body", "sender"],
            Self::PasswordReset => &["username", "resetLink", "sender"],
            Self::OrderConfirmation => &["username", "orderID", "sender"],
            Self::NewsletterSubscription => &["username", "unsubscribeLink", "sender"],
        }
    }
}

/// Replace every `#{key}` occurrence for each key in `values`.
///
/// Keys are applied in sorted order so the result does not depend on map iteration.
pub fn substitute_values(template: &str, values: &HashMap<String, String>) -> String {
    let mut keys: Vec<&String> = values.keys().collect();
    keys.sort();

    let mut result = template.to_string();
    for key in keys {
        let placeholder = format!("#{{{}}}", key);
        if result.contains(&placeholder) {
            result = result.replace(&placeholder, &values[key]);
        }
    }
    result
}

/// Replace every `/* @NAME */` marker with its override (if non-empty) or built-in default
pub fn inject_css(template: &str, overrides: &CssOverrides) -> String {
    CSS_MARKER
        .replace_all(template, |caps: &Captures| {
            let name = &caps[1];
            overrides
                .get(name)
                .map(String::as_str)
                .filter(|css| !css.is_empty())
                .or_else(|| default_css(name))
                .map(str::to_string)
                .unwrap_or_else(|| caps[0].to_string())
        })
        .into_owned()
}

/// Render a template: CSS injection points first, then value placeholders
pub fn render(template: &str, values: &HashMap<String, String>, overrides: &CssOverrides) -> String {
    substitute_values(&inject_css(template, overrides), values)
}

/// Names of the `#{...}` placeholders still present in `content`, in order of appearance
pub fn unresolved_placeholders(content: &str) -> Vec<String> {
    let mut names: Vec<String> = Vec::new();
    for caps in VALUE_MARKER.captures_iter(content) {
        let name = caps[1].to_string();
        if !names.contains(&name) {
            names.push(name);
        }
    }
    names
}

/// Template rendering engine with variable substitution and CSS injection
#[derive(Debug, Default, Clone)]
pub struct TemplateEngine {
    variables: HashMap<String, String>,
    css: CssOverrides,
}

impl TemplateEngine {
    /// Create a new template engine
    pub fn new() -> Self {
        Self::default()
    }

    /// Engine pre-loaded with CSS overrides
    pub fn with_css(css: CssOverrides) -> Self {
        Self {
            variables: HashMap::new(),
            css,
        }
    }

    /// Set a variable value
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) -> &mut Self {
        self.variables.insert(key.into(), value.into());
        self
    }

    /// Set multiple variables from an iterator
    pub fn set_all<I, K, V>(&mut self, iter: I) -> &mut Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        for (k, v) in iter {
            self.variables.insert(k.into(), v.into());
        }
        self
    }

    /// Inject CSS only; value placeholders are left for a later pass
    pub fn style(&self, template: &str) -> String {
        inject_css(template, &self.css)
    }

    /// Render a template string with the engine's variables and CSS overrides
    pub fn render(&self, template: &str) -> String {
        render(template, &self.variables, &self.css)
    }

    /// Render one of the built-in templates
    pub fn render_template(&self, template: EmailTemplate) -> String {
        self.render(template.html_body())
    }
}
