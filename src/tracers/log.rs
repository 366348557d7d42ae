//! Append-only text log.

use crate::protocol::TraceError;
use crate::view::{text_of, TextView, View};

use super::printf::sprintf;
use super::{unknown_method, Args, Effect, Tracer, TracerBase, TracerKind};

#[derive(Debug, Clone)]
pub struct LogTracer {
    base: TracerBase,
    text: String,
}

impl LogTracer {
    pub fn new(base: TracerBase) -> Self {
        Self {
            base,
            text: String::new(),
        }
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    fn message(args: &Args<'_>) -> Result<String, TraceError> {
        args.raw(0)
            .map(text_of)
            .ok_or_else(|| TraceError::argument(args.method(), "a message is required"))
    }
}

impl Tracer for LogTracer {
    fn kind(&self) -> TracerKind {
        TracerKind::Log
    }

    fn base(&self) -> &TracerBase {
        &self.base
    }

    fn apply(&mut self, args: Args<'_>) -> Result<Vec<Effect>, TraceError> {
        match args.method() {
            "set" => self.text = args.get(0).map(text_of).unwrap_or_default(),
            "reset" => self.text.clear(),
            "print" => self.text.push_str(&Self::message(&args)?),
            "println" => {
                self.text.push_str(&Self::message(&args)?);
                self.text.push('\n');
            }
            "printf" => {
                let format = args.str(0)?;
                self.text.push_str(&sprintf(format, args.rest(1))?);
            }
            other => return Err(unknown_method(TracerKind::Log, other)),
        }
        Ok(Vec::new())
    }

    fn render(&self) -> View {
        View::Log(TextView {
            title: self.base.title.clone(),
            text: self.text.clone(),
        })
    }

    fn append_text(&mut self, text: &str) -> bool {
        self.text.push_str(text);
        true
    }

    fn clone_box(&self) -> Box<dyn Tracer> {
        Box::new(self.clone())
    }
}
