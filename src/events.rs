//! The YAML event adapter (§4.5): a thin wrapper over the external
//! `libyaml-safer` pull parser/emitter that normalizes events and errors
//! into this crate's own vocabulary.
//!
//! This module intentionally does no YAML-specific work of its own — that
//! is the job of the out-of-scope collaborator. It exists so the Load and
//! Save engines never reference `libyaml_safer` error or mark types
//! directly.

use libyaml_safer::{
    yaml_emitter_emit, yaml_emitter_new, yaml_emitter_set_output_string, yaml_parser_new,
    yaml_parser_set_input_string, Emitter, Encoding, Event, EventData, MappingStyle, Parser,
    ScalarStyle, SequenceStyle,
};

use crate::error::{CyamlError, Mark};

/// The core's own event vocabulary (§4.5), normalized from
/// `libyaml_safer::EventData`.
#[derive(Debug, PartialEq)]
pub enum CoreEvent {
    /// Start of the stream.
    StreamStart,
    /// End of the stream.
    StreamEnd,
    /// Start of a document.
    DocumentStart,
    /// End of a document.
    DocumentEnd,
    /// A scalar's resolved text.
    Scalar(String),
    /// Start of a sequence.
    SequenceStart,
    /// End of a sequence.
    SequenceEnd,
    /// Start of a mapping.
    MappingStart,
    /// End of a mapping.
    MappingEnd,
    /// An alias to an anchor. Anchors/aliases are a Non-goal (§1); the Load
    /// engine treats this as `UnexpectedEvent`.
    Alias,
}

fn to_core_mark(mark: libyaml_safer::Mark) -> Mark {
    Mark {
        index: mark.index,
        line: mark.line,
        column: mark.column,
    }
}

/// A source of [`CoreEvent`]s, wrapping a `libyaml_safer::Parser`.
///
/// Carries a one-event lookahead buffer: the Load engine needs to
/// distinguish "another sequence element follows" from "SEQUENCE-END
/// follows" before it knows which descriptor should consume the next
/// event, and a strictly-consuming pull interface can't express that.
pub struct EventSource<'r> {
    parser: Parser<'r>,
    lookahead: Option<(CoreEvent, Mark)>,
}

impl<'r> EventSource<'r> {
    /// Create a source reading from `input`, which must outlive the source
    /// (the underlying parser borrows it to avoid copying the whole
    /// document up front).
    pub fn from_bytes(input: &'r mut &[u8]) -> Self {
        let mut parser = yaml_parser_new();
        yaml_parser_set_input_string(&mut parser, input);
        Self {
            parser,
            lookahead: None,
        }
    }

    fn pull(&mut self) -> Result<(CoreEvent, Mark), CyamlError> {
        let event = self
            .parser
            .parse()
            .map_err(|e| CyamlError::LibYamlError(e.to_string()))?;
        let mark = to_core_mark(event.start_mark);
        let core = match event.data {
            EventData::StreamStart { .. } => CoreEvent::StreamStart,
            EventData::StreamEnd => CoreEvent::StreamEnd,
            EventData::DocumentStart { .. } => CoreEvent::DocumentStart,
            EventData::DocumentEnd { .. } => CoreEvent::DocumentEnd,
            EventData::Alias { .. } => CoreEvent::Alias,
            EventData::Scalar { value, .. } => CoreEvent::Scalar(value),
            EventData::SequenceStart { .. } => CoreEvent::SequenceStart,
            EventData::SequenceEnd => CoreEvent::SequenceEnd,
            EventData::MappingStart { .. } => CoreEvent::MappingStart,
            EventData::MappingEnd => CoreEvent::MappingEnd,
        };
        Ok((core, mark))
    }

    /// Pull the next event, mapping any underlying error to
    /// [`CyamlError::LibYamlError`].
    pub fn next_event(&mut self) -> Result<(CoreEvent, Mark), CyamlError> {
        if let Some(buffered) = self.lookahead.take() {
            return Ok(buffered);
        }
        self.pull()
    }

    /// Look at the next event without consuming it.
    pub fn peek_event(&mut self) -> Result<&CoreEvent, CyamlError> {
        if self.lookahead.is_none() {
            let next = self.pull()?;
            self.lookahead = Some(next);
        }
        Ok(&self.lookahead.as_ref().unwrap().0)
    }
}

/// A sink for emitted events, wrapping a `libyaml_safer::Emitter` writing
/// into a caller-owned `Vec<u8>`. The caller's `Vec` is exclusively
/// borrowed for the sink's lifetime and becomes readable again once the
/// sink is dropped.
pub struct EventSink<'w> {
    emitter: Emitter<'w>,
}

impl<'w> EventSink<'w> {
    /// Create a sink writing into `output` (cleared first).
    pub fn new(output: &'w mut Vec<u8>) -> Self {
        let mut emitter = yaml_emitter_new();
        yaml_emitter_set_output_string(&mut emitter, output);
        Self { emitter }
    }

    fn emit(&mut self, event: Event) -> Result<(), CyamlError> {
        yaml_emitter_emit(&mut self.emitter, event)
            .map_err(|e| CyamlError::LibYamlError(e.to_string()))
    }

    /// Emit STREAM-START.
    pub fn stream_start(&mut self) -> Result<(), CyamlError> {
        self.emit(Event::stream_start(Encoding::Utf8))
    }

    /// Emit STREAM-END.
    pub fn stream_end(&mut self) -> Result<(), CyamlError> {
        self.emit(Event::stream_end())
    }

    /// Emit DOCUMENT-START.
    pub fn document_start(&mut self) -> Result<(), CyamlError> {
        self.emit(Event::document_start(None, &[], true))
    }

    /// Emit DOCUMENT-END.
    pub fn document_end(&mut self) -> Result<(), CyamlError> {
        self.emit(Event::document_end(true))
    }

    /// Emit a plain scalar.
    pub fn scalar(&mut self, value: &str) -> Result<(), CyamlError> {
        self.emit(Event::scalar(None, None, value, true, true, ScalarStyle::Plain))
    }

    /// Emit the YAML null scalar `~`.
    pub fn null_scalar(&mut self) -> Result<(), CyamlError> {
        self.emit(Event::scalar(None, None, "~", true, true, ScalarStyle::Plain))
    }

    /// Emit SEQUENCE-START (block style, per §4.7).
    pub fn sequence_start(&mut self) -> Result<(), CyamlError> {
        self.emit(Event::sequence_start(None, None, true, SequenceStyle::Block))
    }

    /// Emit SEQUENCE-END.
    pub fn sequence_end(&mut self) -> Result<(), CyamlError> {
        self.emit(Event::sequence_end())
    }

    /// Emit MAPPING-START (block style, per §4.7).
    pub fn mapping_start(&mut self) -> Result<(), CyamlError> {
        self.emit(Event::mapping_start(None, None, true, MappingStyle::Block))
    }

    /// Emit MAPPING-END.
    pub fn mapping_end(&mut self) -> Result<(), CyamlError> {
        self.emit(Event::mapping_end())
    }
}
