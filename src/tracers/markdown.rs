use crate::protocol::TraceError;
use crate::view::{text_of, TextView, View};

use super::{unknown_method, Args, Effect, Tracer, TracerBase, TracerKind};

/// Static markdown text, replaced wholesale by `set`.
#[derive(Debug, Clone)]
pub struct MarkdownTracer {
    base: TracerBase,
    markdown: String,
}

impl MarkdownTracer {
    pub fn new(base: TracerBase) -> Self {
        Self {
            base,
            markdown: String::new(),
        }
    }

    pub fn markdown(&self) -> &str {
        &self.markdown
    }
}

impl Tracer for MarkdownTracer {
    fn kind(&self) -> TracerKind {
        TracerKind::Markdown
    }

    fn base(&self) -> &TracerBase {
        &self.base
    }

    fn apply(&mut self, args: Args<'_>) -> Result<Vec<Effect>, TraceError> {
        match args.method() {
            "set" => self.markdown = args.get(0).map(text_of).unwrap_or_default(),
            "reset" => self.markdown.clear(),
            other => return Err(unknown_method(TracerKind::Markdown, other)),
        }
        Ok(Vec::new())
    }

    fn render(&self) -> View {
        View::Markdown(TextView {
            title: self.base.title.clone(),
            text: self.markdown.clone(),
        })
    }

    fn clone_box(&self) -> Box<dyn Tracer> {
        Box::new(self.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn set_replaces_text() {
        let mut md = MarkdownTracer::new(TracerBase::new("md", "Markdown"));
        let values = vec![json!("# Title")];
        md.apply(Args::new("set", &values)).unwrap();
        assert_eq!(md.markdown(), "# Title");
        md.apply(Args::new("set", &[])).unwrap();
        assert_eq!(md.markdown(), "");
        assert!(md.apply(Args::new("print", &[])).is_err());
    }
}
