//! In-band error rendering
//!
//! A failed script or stylesheet is answered with a 200 whose body reports
//! the failure in the browser: a script that throws, or a stylesheet that
//! blanks the page and prints the error. Other content types are not
//! rendered.

use crate::asset::AssetError;
use crate::http::{self, mime, AssetBody};
use hyper::Response;

/// How a failure for a given request path is surfaced
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorRendering {
    Script,
    Stylesheet,
    /// Not rendered; the failure goes back to the caller
    Unhandled,
}

impl ErrorRendering {
    pub fn for_content_type(content_type: &str) -> Self {
        match content_type {
            mime::JAVASCRIPT => Self::Script,
            mime::CSS => Self::Stylesheet,
            _ => Self::Unhandled,
        }
    }

    /// Render `error`, or hand it back when this kind is not renderable
    pub fn render(
        self,
        error: AssetError,
        request_path: &str,
    ) -> Result<Response<AssetBody>, AssetError> {
        match self {
            Self::Script => Ok(http::build_rendered_response(
                mime::JAVASCRIPT,
                script_body(&error),
            )),
            Self::Stylesheet => Ok(http::build_rendered_response(
                "text/css; charset=utf-8",
                stylesheet_body(&error, request_path),
            )),
            Self::Unhandled => Err(error),
        }
    }
}

/// `throw Error("<kind>: <message>")`
pub fn script_body(error: &AssetError) -> String {
    let message = format!("{}: {}", error.kind(), error);
    // A JSON string is a valid JavaScript string literal
    let literal = serde_json::Value::String(message).to_string();
    format!("throw Error({literal})")
}

pub fn stylesheet_body(error: &AssetError, request_path: &str) -> String {
    let message = format!("\n{}: {}", error.kind(), error);
    let frame = error
        .location()
        .unwrap_or_else(|| request_path.to_string());
    let backtrace = format!("\n  at {frame}");

    format!(
        r#"html {{
  padding: 18px 36px;
}}

head {{
  display: block;
}}

body {{
  margin: 0;
  padding: 0;
}}

body > * {{
  display: none !important;
}}

head:after, body:before, body:after {{
  display: block !important;
}}

head:after {{
  font-family: sans-serif;
  font-size: large;
  font-weight: bold;
  content: "Error compiling CSS asset";
}}

body:before, body:after {{
  font-family: monospace;
  white-space: pre-wrap;
}}

body:before {{
  font-weight: bold;
  content: "{}";
}}

body:after {{
  content: "{}";
}}
"#,
        escape_css_content(&message),
        escape_css_content(&backtrace),
    )
}

/// Escape text for a double-quoted CSS string
///
/// Each escape is a CSS hex escape closed by a space, so the character after
/// it is never read as another hex digit.
pub fn escape_css_content(content: &str) -> String {
    let mut escaped = String::with_capacity(content.len());
    for c in content.chars() {
        match c {
            '\\' => escaped.push_str("\\005c "),
            '\n' => escaped.push_str("\\000a "),
            '"' => escaped.push_str("\\0022 "),
            '/' => escaped.push_str("\\002f "),
            other => escaped.push(other),
        }
    }
    escaped
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn compile_error(message: &str) -> AssetError {
        AssetError::Compile {
            path: PathBuf::from("app.css"),
            message: message.to_string(),
            location: Some("app.css:3".to_string()),
        }
    }

    #[test]
    fn test_rendering_by_content_type() {
        assert_eq!(
            ErrorRendering::for_content_type("application/javascript"),
            ErrorRendering::Script
        );
        assert_eq!(
            ErrorRendering::for_content_type("text/css"),
            ErrorRendering::Stylesheet
        );
        assert_eq!(
            ErrorRendering::for_content_type("image/png"),
            ErrorRendering::Unhandled
        );
    }

    #[test]
    fn test_script_body() {
        let body = script_body(&compile_error("unexpected \"token\""));
        assert_eq!(
            body,
            r#"throw Error("CompileError: unexpected \"token\"")"#
        );
    }

    #[test]
    fn test_escape_css_content() {
        assert_eq!(escape_css_content(r"a\b"), r"a\005c b");
        assert_eq!(escape_css_content("a\nb"), r"a\000a b");
        assert_eq!(escape_css_content("a\"b"), r"a\0022 b");
        assert_eq!(escape_css_content("a/b"), r"a\002f b");
        assert_eq!(escape_css_content("plain"), "plain");
    }

    #[test]
    fn test_stylesheet_body_escapes_injected_text() {
        let body = stylesheet_body(&compile_error("bad \\ \"quote\" /* \n next"), "/app.css");

        let before = body.split("body:before {").nth(1).unwrap();
        let injected = before.split("content: \"").nth(1).unwrap();
        let injected = &injected[..injected.find("\";").unwrap()];
        assert!(!injected.contains('"'));
        assert!(!injected.contains('\n'));
        assert!(!injected.contains('/'));
        let unescaped = ["\\005c ", "\\000a ", "\\0022 ", "\\002f "]
            .iter()
            .fold(injected.to_string(), |text, escape| text.replace(escape, ""));
        assert!(!unescaped.contains('\\'));
        assert!(injected.contains("CompileError: bad"));

        assert!(body.contains(r"\000a   at app.css:3"));
        assert!(body.contains("display: none !important"));
    }

    #[test]
    fn test_render_unhandled_returns_error() {
        let result = ErrorRendering::Unhandled.render(compile_error("boom"), "/logo.png");
        assert!(matches!(result, Err(AssetError::Compile { .. })));
    }

    #[test]
    fn test_render_stylesheet_response() {
        let response = ErrorRendering::Stylesheet
            .render(compile_error("boom"), "/app.css")
            .unwrap();
        assert_eq!(response.status(), 200);
        assert_eq!(
            response.headers().get("Content-Type").unwrap(),
            "text/css; charset=utf-8"
        );
    }
}
