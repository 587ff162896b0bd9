//! The Save engine (§4.7): walks a [`Value`] graph against a [`Descriptor`]
//! schema and emits the matching YAML event stream.

use crate::config::{Config, SaveFlags};
use crate::error::CyamlError;
use crate::events::EventSink;
use crate::schema::Descriptor;
use crate::scalar;
use crate::value::Value;

fn mismatch(reason: &'static str) -> CyamlError {
    CyamlError::SchemaInvalid { reason }
}

fn emit(
    sink: &mut EventSink<'_>,
    descriptor: &Descriptor,
    value: &Value,
) -> Result<(), CyamlError> {
    match (descriptor, value) {
        (Descriptor::Int { .. }, Value::Int(v)) => sink.scalar(&scalar::render_int(*v)),
        (Descriptor::Uint { .. }, Value::Uint(v)) => sink.scalar(&scalar::render_uint(*v)),
        (Descriptor::Float { width }, Value::Float(v)) => sink.scalar(&scalar::render_float(*v, *width)),
        (Descriptor::Bool, Value::Bool(v)) => sink.scalar(scalar::render_bool(*v)),
        (Descriptor::StringInline { .. }, Value::String(s))
        | (Descriptor::StringOwned { .. }, Value::String(s)) => sink.scalar(s),
        (Descriptor::Enum { members, .. }, Value::Enum(code)) => {
            sink.scalar(&scalar::render_enum(*code, members))
        }
        (Descriptor::Flags { members, .. }, Value::Flags(bits)) => {
            sink.sequence_start()?;
            for entry in scalar::render_flags(*bits, members) {
                sink.scalar(&entry)?;
            }
            sink.sequence_end()
        }
        (Descriptor::Ignore, _) => Ok(()),
        (Descriptor::Mapping { fields, .. }, _) => {
            let values = value
                .as_mapping()
                .ok_or_else(|| mismatch("value shape does not match schema descriptor"))?;
            if fields.len() != values.len() {
                return Err(mismatch("mapping value count does not match schema field count"));
            }
            sink.mapping_start()?;
            for (field, v) in fields.iter().zip(values.iter()) {
                if v.is_null() {
                    if !field.optional {
                        sink.scalar(&field.key)?;
                        sink.null_scalar()?;
                        continue;
                    }
                    continue;
                }
                sink.scalar(&field.key)?;
                emit(sink, &field.value, v)?;
            }
            sink.mapping_end()
        }
        (Descriptor::Sequence { element, .. }, _) => {
            let items = value
                .as_sequence()
                .ok_or_else(|| mismatch("value shape does not match schema descriptor"))?;
            sink.sequence_start()?;
            for item in items {
                emit(sink, element, item)?;
            }
            sink.sequence_end()
        }
        _ if value.is_null() => sink.null_scalar(),
        _ => Err(mismatch("value shape does not match schema descriptor")),
    }
}

/// Render `root` against `schema` into a fresh YAML document.
pub fn save_data(
    config: &Config,
    schema: &Descriptor,
    root: &Value,
    _flags: SaveFlags,
) -> Result<Vec<u8>, CyamlError> {
    crate::schema::validate(schema)?;
    let mut output = Vec::new();
    {
        let mut sink = EventSink::new(&mut output);
        sink.stream_start()?;
        sink.document_start()?;
        emit(&mut sink, schema, root)?;
        sink.document_end()?;
        sink.stream_end()?;
    }
    config.diagnostic(crate::config::LogLevel::Debug, "save_data produced a document");
    Ok(output)
}

/// Render `root` against `schema` and write the result to `path`.
pub fn save_file(
    path: &std::path::Path,
    config: &Config,
    schema: &Descriptor,
    root: &Value,
    flags: SaveFlags,
) -> Result<(), CyamlError> {
    let bytes = save_data(config, schema, root, flags)?;
    std::fs::write(path, bytes).map_err(|e| CyamlError::Io(e.to_string()))
}
