//! The Load engine (§4.6): turns a YAML event stream into a [`Value`] graph
//! shaped by a [`Descriptor`] schema.

use crate::config::{Config, LogLevel};
use crate::error::{CyamlError, Mark};
use crate::events::{CoreEvent, EventSource};
use crate::schema::{Descriptor, SequenceKind};
use crate::scalar;
use crate::value::Value;

/// Rough byte-size estimate for an owned node, used only to feed the
/// allocation ledger (§4.2); Rust's own ownership already manages the real
/// memory, so this number is symbolic and only ever compared with itself.
fn estimate_bytes(value: &Value) -> usize {
    match value {
        Value::Null => 0,
        Value::Int(_) | Value::Uint(_) | Value::Enum(_) | Value::Float(_) | Value::Flags(_) => 8,
        Value::Bool(_) => 1,
        Value::String(s) => s.len() + 1,
        Value::Mapping(fields) => fields.iter().map(estimate_bytes).sum::<usize>() + fields.len() * 8,
        Value::Sequence(items) => items.iter().map(estimate_bytes).sum::<usize>() + items.len() * 8,
    }
}

fn unexpected(context: &'static str, mark: Mark) -> CyamlError {
    CyamlError::UnexpectedEvent { context, mark }
}

fn descriptor_kind(descriptor: &Descriptor) -> &'static str {
    match descriptor {
        Descriptor::Int { .. } => "int",
        Descriptor::Uint { .. } => "uint",
        Descriptor::Float { .. } => "float",
        Descriptor::Bool => "bool",
        Descriptor::StringInline { .. } => "string (inline)",
        Descriptor::StringOwned { .. } => "string (owned)",
        Descriptor::Enum { .. } => "enum",
        Descriptor::Flags { .. } => "flags",
        Descriptor::Ignore => "ignore",
        Descriptor::Mapping { .. } => "mapping",
        Descriptor::Sequence { .. } => "sequence",
    }
}

/// Consume one fully-balanced value (scalar, or a matched Start/End pair)
/// without materializing it. Used for ignored subtrees and unknown keys.
fn skip_subtree(source: &mut EventSource<'_>) -> Result<(), CyamlError> {
    let (event, mark) = source.next_event()?;
    match event {
        CoreEvent::Scalar(_) => Ok(()),
        CoreEvent::SequenceStart => {
            loop {
                if matches!(source.peek_event()?, CoreEvent::SequenceEnd) {
                    source.next_event()?;
                    return Ok(());
                }
                skip_subtree(source)?;
            }
        }
        CoreEvent::MappingStart => {
            loop {
                if matches!(source.peek_event()?, CoreEvent::MappingEnd) {
                    source.next_event()?;
                    return Ok(());
                }
                skip_subtree(source)?; // key
                skip_subtree(source)?; // value
            }
        }
        _ => Err(unexpected("ignored value", mark)),
    }
}

struct Loader<'a> {
    config: &'a Config,
    ledger: Vec<usize>,
}

impl<'a> Loader<'a> {
    fn note_owned(&mut self, value: &Value) {
        let bytes = estimate_bytes(value);
        self.config.allocator.note_alloc(bytes);
        self.ledger.push(bytes);
    }

    fn rollback(&mut self) {
        while let Some(bytes) = self.ledger.pop() {
            self.config.allocator.note_free(bytes);
        }
    }

    fn check_depth(&self, depth: usize) -> Result<(), CyamlError> {
        if depth > self.config.max_depth {
            return Err(CyamlError::InternalError("maximum schema recursion depth exceeded"));
        }
        Ok(())
    }

    fn bind(
        &mut self,
        source: &mut EventSource<'_>,
        descriptor: &Descriptor,
        depth: usize,
    ) -> Result<Value, CyamlError> {
        self.check_depth(depth)?;
        log::trace!(
            "load: push frame depth={depth} kind={}",
            descriptor_kind(descriptor)
        );
        let result = self.bind_inner(source, descriptor, depth);
        match &result {
            Ok(_) => log::trace!("load: pop frame depth={depth} ok"),
            Err(e) => log::trace!("load: pop frame depth={depth} err={e}"),
        }
        result
    }

    fn bind_inner(
        &mut self,
        source: &mut EventSource<'_>,
        descriptor: &Descriptor,
        depth: usize,
    ) -> Result<Value, CyamlError> {
        match descriptor {
            Descriptor::Int { width } => {
                let (event, mark) = source.next_event()?;
                let text = expect_scalar(event, mark, "integer")?;
                log::debug!("load: coercing scalar {text:?} to int");
                Ok(Value::Int(scalar::parse_int(&text, *width)?))
            }
            Descriptor::Uint { width } => {
                let (event, mark) = source.next_event()?;
                let text = expect_scalar(event, mark, "unsigned integer")?;
                log::debug!("load: coercing scalar {text:?} to uint");
                Ok(Value::Uint(scalar::parse_uint(&text, *width)?))
            }
            Descriptor::Float { width } => {
                let (event, mark) = source.next_event()?;
                let text = expect_scalar(event, mark, "float")?;
                log::debug!("load: coercing scalar {text:?} to float");
                Ok(Value::Float(scalar::parse_float(&text, *width)?))
            }
            Descriptor::Bool => {
                let (event, mark) = source.next_event()?;
                let text = expect_scalar(event, mark, "bool")?;
                log::debug!("load: coercing scalar {text:?} to bool");
                Ok(Value::Bool(scalar::parse_bool(&text)?))
            }
            Descriptor::StringInline { capacity, min_len } => {
                let (event, mark) = source.next_event()?;
                let text = expect_scalar(event, mark, "string")?;
                log::debug!("load: coercing scalar {text:?} to inline string");
                if text.len() < *min_len {
                    return Err(CyamlError::StringTooShort {
                        got: text.len(),
                        min: *min_len,
                    });
                }
                if text.len() > capacity.saturating_sub(1) {
                    return Err(CyamlError::StringTooLong {
                        got: text.len(),
                        max: capacity.saturating_sub(1),
                    });
                }
                Ok(Value::String(text))
            }
            Descriptor::StringOwned { min_len, max_len } => {
                let (event, mark) = source.next_event()?;
                let text = expect_scalar(event, mark, "string")?;
                log::debug!("load: coercing scalar {text:?} to owned string");
                if text.len() < *min_len {
                    return Err(CyamlError::StringTooShort {
                        got: text.len(),
                        min: *min_len,
                    });
                }
                if text.len() > *max_len {
                    return Err(CyamlError::StringTooLong {
                        got: text.len(),
                        max: *max_len,
                    });
                }
                let value = Value::String(text);
                self.note_owned(&value);
                Ok(value)
            }
            Descriptor::Enum {
                members,
                width,
                strict,
                case_insensitive,
            } => {
                let (event, mark) = source.next_event()?;
                let text = expect_scalar(event, mark, "enum")?;
                log::debug!("load: coercing scalar {text:?} to enum");
                let code = scalar::parse_enum(&text, members, *width, *strict, *case_insensitive)?;
                Ok(Value::Enum(code))
            }
            Descriptor::Flags {
                members,
                width,
                strict,
            } => {
                let (event, mark) = source.next_event()?;
                if !matches!(event, CoreEvent::SequenceStart) {
                    return Err(unexpected("flags sequence", mark));
                }
                let mut entries = Vec::new();
                loop {
                    if matches!(source.peek_event()?, CoreEvent::SequenceEnd) {
                        source.next_event()?;
                        break;
                    }
                    let (event, mark) = source.next_event()?;
                    entries.push(expect_scalar(event, mark, "flag entry")?);
                }
                log::debug!("load: coercing flag entries {entries:?} to flags bitmask");
                let bits = scalar::parse_flags(
                    entries.iter().map(String::as_str),
                    members,
                    *width,
                    *strict,
                )?;
                Ok(Value::Flags(bits))
            }
            Descriptor::Ignore => {
                skip_subtree(source)?;
                Ok(Value::Null)
            }
            Descriptor::Mapping { fields, owned } => {
                let (event, mark) = source.next_event()?;
                if !matches!(event, CoreEvent::MappingStart) {
                    return Err(unexpected("mapping", mark));
                }
                let mut slots: Vec<Option<Value>> = vec![None; fields.len()];
                loop {
                    if matches!(source.peek_event()?, CoreEvent::MappingEnd) {
                        source.next_event()?;
                        break;
                    }
                    let (key_event, key_mark) = source.next_event()?;
                    let key = expect_scalar(key_event, key_mark, "mapping key")?;
                    match fields.iter().position(|f| f.key == key) {
                        Some(index) => {
                            if slots[index].is_some() {
                                return Err(CyamlError::MappingKeyDuplicate { key });
                            }
                            let bound = self.bind(source, &fields[index].value, depth + 1)?;
                            slots[index] = Some(bound);
                        }
                        None => {
                            if self.config.flags.ignore_unknown_keys {
                                self.config.diagnostic(
                                    LogLevel::Warning,
                                    &format!("ignoring unknown mapping key '{key}'"),
                                );
                                skip_subtree(source)?;
                            } else {
                                return Err(CyamlError::MappingKeyUnknown { key });
                            }
                        }
                    }
                }
                let mut resolved = Vec::with_capacity(fields.len());
                for (field, slot) in fields.iter().zip(slots.into_iter()) {
                    match slot {
                        Some(v) => resolved.push(v),
                        None if field.optional => resolved.push(Value::Null),
                        None => {
                            return Err(CyamlError::MappingFieldMissing {
                                key: field.key.clone(),
                            })
                        }
                    }
                }
                let value = Value::Mapping(resolved);
                if *owned {
                    self.note_owned(&value);
                }
                Ok(value)
            }
            Descriptor::Sequence {
                element,
                min_count,
                max_count,
                kind,
                ..
            } => {
                let (event, mark) = source.next_event()?;
                if !matches!(event, CoreEvent::SequenceStart) {
                    return Err(unexpected("sequence", mark));
                }
                let mut items = Vec::new();
                loop {
                    if matches!(source.peek_event()?, CoreEvent::SequenceEnd) {
                        source.next_event()?;
                        break;
                    }
                    if items.len() >= *max_count {
                        return Err(CyamlError::SequenceTooLong {
                            got: items.len() + 1,
                            max: *max_count,
                        });
                    }
                    items.push(self.bind(source, element, depth + 1)?);
                }
                if items.len() < *min_count {
                    return Err(CyamlError::SequenceTooShort {
                        got: items.len(),
                        min: *min_count,
                    });
                }
                let value = Value::Sequence(items);
                if matches!(kind, SequenceKind::Owned) {
                    self.note_owned(&value);
                }
                Ok(value)
            }
        }
    }
}

fn expect_scalar(event: CoreEvent, mark: Mark, expected: &'static str) -> Result<String, CyamlError> {
    match event {
        CoreEvent::Scalar(text) => Ok(text),
        _ => Err(unexpected(expected, mark)),
    }
}

/// Bind `bytes` against `schema`, writing the result into `*out_root`.
///
/// `*out_root` must be `None` on entry (see [`CyamlError::DataTargetNonNull`]);
/// it is left `None` if the input has no document at all (the root value is
/// entirely absent — distinct from a document containing an explicit `~`).
pub fn load_data(
    bytes: &[u8],
    config: &Config,
    schema: &Descriptor,
    out_root: &mut Option<Value>,
) -> Result<(), CyamlError> {
    crate::schema::validate(schema)?;
    if out_root.is_some() {
        return Err(CyamlError::DataTargetNonNull);
    }

    let mut input = bytes;
    let mut source = EventSource::from_bytes(&mut input);
    let mut loader = Loader {
        config,
        ledger: Vec::new(),
    };

    let result = (|| -> Result<Option<Value>, CyamlError> {
        let (event, mark) = source.next_event()?;
        if !matches!(event, CoreEvent::StreamStart) {
            return Err(unexpected("stream start", mark));
        }
        let (event, _) = source.next_event()?;
        if matches!(event, CoreEvent::StreamEnd) {
            return Ok(None);
        }
        if !matches!(event, CoreEvent::DocumentStart) {
            return Err(unexpected("document start", Mark::default()));
        }
        let root = loader.bind(&mut source, schema, 0)?;
        let (event, mark) = source.next_event()?;
        if !matches!(event, CoreEvent::DocumentEnd) {
            return Err(unexpected("document end", mark));
        }
        let (event, mark) = source.next_event()?;
        if !matches!(event, CoreEvent::StreamEnd) {
            return Err(unexpected("stream end", mark));
        }
        Ok(Some(root))
    })();

    match result {
        Ok(root) => {
            *out_root = root;
            Ok(())
        }
        Err(e) => {
            loader.rollback();
            config.diagnostic(LogLevel::Error, &crate::error::strerror(&e));
            Err(e)
        }
    }
}
