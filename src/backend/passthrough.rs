use async_trait::async_trait;
use serde_json::Value;

use crate::protocol::{parse_commands, Command, TraceError};
use crate::tracers::TracerKind;

use super::{SourceFile, TraceBackend};

const MARKDOWN_KEY: &str = "markdown";

/// Presents a markdown document as a single markdown tracer.
#[derive(Debug, Clone, Copy, Default)]
pub struct MarkdownBackend;

#[async_trait]
impl TraceBackend for MarkdownBackend {
    fn name(&self) -> &str {
        "md"
    }

    async fn trace(&self, source: &SourceFile) -> Result<Vec<Command>, TraceError> {
        Ok(vec![
            Command::keyed(
                MARKDOWN_KEY,
                TracerKind::Markdown.constructor_name(),
                vec![Value::from("Markdown")],
            ),
            Command::keyed(MARKDOWN_KEY, "set", vec![Value::from(source.content.as_str())]),
            Command::set_root(MARKDOWN_KEY),
        ])
    }
}

/// Treats the document as a pre-built command array.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonBackend;

#[async_trait]
impl TraceBackend for JsonBackend {
    fn name(&self) -> &str {
        "json"
    }

    async fn trace(&self, source: &SourceFile) -> Result<Vec<Command>, TraceError> {
        Ok(parse_commands(&source.content)?)
    }
}
