//! Server-side HTML rendering.

use axum::response::Html;
use minijinja::Environment;
use serde::Serialize;

use crate::error::AppError;

/// Template registry. Templates named `*.html` are auto-escaped.
pub struct Views {
    env: Environment<'static>,
}

impl Views {
    pub fn new() -> Self {
        Self {
            env: Environment::new(),
        }
    }

    /// Register a template, compiling it eagerly so syntax errors surface at startup.
    pub fn add(&mut self, name: &'static str, source: &'static str) -> anyhow::Result<()> {
        self.env
            .add_template(name, source)
            .map_err(|e| anyhow::anyhow!("failed to compile template '{name}': {e}"))
    }

    /// Render `name` with a serializable context.
    pub fn render<S: Serialize>(&self, name: &str, context: S) -> Result<Html<String>, AppError> {
        let template = self
            .env
            .get_template(name)
            .map_err(|e| AppError::Internal(anyhow::Error::new(e)))?;

        template
            .render(context)
            .map(Html)
            .map_err(|e| AppError::Internal(anyhow::anyhow!("failed to render '{name}': {e}")))
    }
}

impl Default for Views {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use minijinja::context;

    #[test]
    fn renders_with_autoescape() {
        let mut views = Views::new();
        views.add("hello.html", "<p>{{ name }}</p>").unwrap();

        let Html(body) = views
            .render("hello.html", context! { name => "<b>Vélo" })
            .unwrap();
        assert_eq!(body, "<p>&lt;b&gt;Vélo</p>");
    }

    #[test]
    fn broken_template_fails_registration() {
        let mut views = Views::new();
        assert!(views.add("broken.html", "{% if %}").is_err());
    }

    #[test]
    fn unknown_template_is_internal_error() {
        let views = Views::new();
        assert!(matches!(
            views.render("missing.html", ()),
            Err(AppError::Internal(_))
        ));
    }
}
