//! Code generation stage: renders a single-file web application shell.

use async_trait::async_trait;
use serde_json::json;
use std::fmt::Write as _;

use super::Stage;
use crate::context::{StageContext, DEFAULT_PROJECT_NAME};
use crate::core::{StageKind, StageResult};
use crate::errors::StudioError;

/// Name of the generated file.
pub const GENERATED_FILE: &str = "index.html";

/// Confirmation text attached to generated code.
pub const GENERATION_CONFIRMATION: &str = "Code generation complete and verified";

const TAILWIND_CDN: &str = "https://cdn.tailwindcss.com";

/// Generates `index.html` from the design spec and infrastructure plan.
///
/// Makes no external call and never requires approval.
#[derive(Debug, Clone, Default)]
pub struct CodeGenerationStage;

impl CodeGenerationStage {
    /// Creates a code generation stage.
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    fn generate(&self, ctx: &StageContext) -> Result<serde_json::Value, StudioError> {
        let spec = ctx.require("spec")?;
        let infra = ctx.require("infra")?;
        if !infra.is_object() {
            return Err(StudioError::stage(
                self.name(),
                "infrastructure plan must be an object",
            ));
        }

        let title = spec
            .get("project_name")
            .and_then(serde_json::Value::as_str)
            .unwrap_or(DEFAULT_PROJECT_NAME);
        let features = spec
            .get("features")
            .and_then(serde_json::Value::as_array)
            .map(Vec::as_slice)
            .unwrap_or_default();

        Ok(json!({
            "file": GENERATED_FILE,
            "code": render_page(title, features),
            "confirmation": GENERATION_CONFIRMATION,
        }))
    }
}

fn render_page(title: &str, features: &[serde_json::Value]) -> String {
    let title = escape_html(title);
    let mut sections = String::new();
    for feature in features {
        let field = |key: &str| {
            feature
                .get(key)
                .and_then(serde_json::Value::as_str)
                .map(escape_html)
                .unwrap_or_default()
        };
        let _ = write!(
            sections,
            "\n      <section class=\"rounded-lg bg-white p-4 shadow\">\n        \
             <h2 class=\"text-xl font-semibold\">{}</h2>\n        \
             <p class=\"text-gray-600\">{}</p>\n      </section>",
            field("name"),
            field("description"),
        );
    }

    format!(
        "<!DOCTYPE html>\n\
         <html lang=\"en\">\n\
         <head>\n  \
         <meta charset=\"utf-8\">\n  \
         <meta name=\"viewport\" content=\"width=device-width, initial-scale=1\">\n  \
         <title>{title}</title>\n  \
         <script src=\"{TAILWIND_CDN}\"></script>\n\
         </head>\n\
         <body class=\"bg-gray-100\">\n  \
         <main class=\"mx-auto max-w-3xl p-8\">\n    \
         <h1 class=\"mb-6 text-3xl font-bold\">{title}</h1>\n    \
         <div class=\"space-y-4\">{sections}\n    </div>\n  \
         </main>\n\
         </body>\n\
         </html>\n"
    )
}

fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

#[async_trait]
impl Stage for CodeGenerationStage {
    fn name(&self) -> &str {
        "code_generation"
    }

    fn kind(&self) -> StageKind {
        StageKind::CodeGeneration
    }

    async fn execute(&self, ctx: &StageContext) -> StageResult {
        self.generate(ctx).into()
    }
}
