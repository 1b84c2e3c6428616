// HTML template parsing

use crate::context::RenderContext;
use crate::renderer::RenderHelpers;
use crate::{Result, SsrError};
use async_trait::async_trait;
use std::sync::Arc;

/// Marker replaced by the rendered application markup
pub const DEFAULT_PLACEHOLDER: &str = "<!--ssr-outlet-->";

/// A template split around the head boundary and the content placeholder.
///
/// `head` ends right before `</head>` so that resource hints and styles land
/// inside the document head; `neck` runs up to the placeholder and `tail`
/// holds the rest.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TemplateFragments {
    pub head: String,
    pub neck: String,
    pub tail: String,
}

/// Split `template` at the head boundary and at `placeholder`.
///
/// The boundary is the first `</head>`, else the first `<body>`, else the
/// placeholder itself (empty neck).
pub fn parse_template(template: &str, placeholder: &str) -> Result<TemplateFragments> {
    let j = template
        .find(placeholder)
        .ok_or_else(|| SsrError::PlaceholderNotFound(placeholder.to_string()))?;

    let i = template
        .find("</head>")
        .or_else(|| template.find("<body>"))
        .filter(|&i| i <= j)
        .unwrap_or(j);

    Ok(TemplateFragments {
        head: template[..i].to_string(),
        neck: template[i..j].to_string(),
        tail: template[j + placeholder.len()..].to_string(),
    })
}

/// Caller-owned document composition.
///
/// A function template receives the rendered body and is responsible for the
/// whole document; the helpers render the manifest-derived fragments on demand.
#[async_trait]
pub trait TemplateFunction: Send + Sync {
    async fn render(
        &self,
        content: &str,
        context: &RenderContext,
        helpers: &RenderHelpers<'_>,
    ) -> Result<String>;
}

/// Adapter for synchronous closures.
pub struct FnTemplate<F>(pub F);

#[async_trait]
impl<F> TemplateFunction for FnTemplate<F>
where
    F: Fn(&str, &RenderContext, &RenderHelpers<'_>) -> Result<String> + Send + Sync,
{
    async fn render(
        &self,
        content: &str,
        context: &RenderContext,
        helpers: &RenderHelpers<'_>,
    ) -> Result<String> {
        (self.0)(content, context, helpers)
    }
}

/// Template given to a renderer
#[derive(Clone)]
pub enum TemplateSource {
    /// HTML containing the content placeholder
    Html(String),
    /// Composition function
    Function(Arc<dyn TemplateFunction>),
}

impl TemplateSource {
    pub fn function<T: TemplateFunction + 'static>(template: T) -> Self {
        TemplateSource::Function(Arc::new(template))
    }
}

impl From<String> for TemplateSource {
    fn from(html: String) -> Self {
        TemplateSource::Html(html)
    }
}

impl From<&str> for TemplateSource {
    fn from(html: &str) -> Self {
        TemplateSource::Html(html.to_string())
    }
}

impl std::fmt::Debug for TemplateSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TemplateSource::Html(html) => f.debug_tuple("Html").field(&html.len()).finish(),
            TemplateSource::Function(_) => f.write_str("Function"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_full_document() {
        let fragments =
            parse_template("<html><head></head><body><!--ssr-outlet--></body></html>", DEFAULT_PLACEHOLDER)
                .unwrap();

        assert_eq!(fragments.head, "<html><head>");
        assert_eq!(fragments.neck, "</head><body>");
        assert_eq!(fragments.tail, "</body></html>");
    }

    #[test]
    fn test_parse_without_head() {
        let fragments = parse_template("<body><!--ssr-outlet--></body>", DEFAULT_PLACEHOLDER).unwrap();
        assert_eq!(fragments.head, "");
        assert_eq!(fragments.neck, "<body>");
        assert_eq!(fragments.tail, "</body>");
    }

    #[test]
    fn test_parse_placeholder_only() {
        let fragments = parse_template("<div id=app><!--ssr-outlet--></div>", DEFAULT_PLACEHOLDER).unwrap();
        assert_eq!(fragments.head, "<div id=app>");
        assert_eq!(fragments.neck, "");
        assert_eq!(fragments.tail, "</div>");
    }

    #[test]
    fn test_missing_placeholder() {
        let err = parse_template("<html><body></body></html>", DEFAULT_PLACEHOLDER).unwrap_err();
        assert!(matches!(err, SsrError::PlaceholderNotFound(_)));
        assert!(err.is_construction_error());
    }

    #[test]
    fn test_head_boundary_after_placeholder() {
        let fragments = parse_template("<!--ssr-outlet--><pre></head></pre>", DEFAULT_PLACEHOLDER).unwrap();
        assert_eq!(fragments.head, "");
        assert_eq!(fragments.neck, "");
        assert_eq!(fragments.tail, "<pre></head></pre>");
    }

    #[test]
    fn test_custom_placeholder() {
        let fragments = parse_template("<head></head><main>{{outlet}}</main>", "{{outlet}}").unwrap();
        assert_eq!(fragments.neck, "</head><main>");
        assert_eq!(fragments.tail, "</main>");
    }
}
