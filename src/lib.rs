//! `cyaml`: a schema-directed, bidirectional binder between YAML documents
//! and a typed data graph.
//!
//! A caller describes the shape of their data once, as a tree of
//! [`schema::Descriptor`]s, and then calls [`load_data`]/[`load_file`] to
//! parse a YAML document into a [`value::Value`] graph that matches it, or
//! [`save_data`]/[`save_file`] to render a graph back out as YAML. The
//! schema is validated (§4.3) before any YAML is read or written, so a
//! malformed schema never produces a partially-bound result.
//!
//! The YAML tokenizer/parser/emitter itself is out of scope for this crate
//! (see [`events`]) and is provided by the `libyaml-safer` dependency; this
//! crate's job is exactly the schema-directed binding layer on top of it.
#![deny(unsafe_code)]
#![warn(missing_docs)]

mod alloc;
mod config;
mod error;
mod events;
mod load;
mod save;
mod scalar;
mod schema;
mod value;

pub use alloc::{Allocator, CountingAllocator, NullAllocator};
pub use config::{Config, ConfigFlags, LogLevel, SaveFlags};
pub use error::{CyamlError, Mark, SUCCESS_STR};
pub use schema::{
    Descriptor, EnumMember, Field, FlagMember, FloatWidth, IntWidth, SequenceKind,
};
pub use value::Value;

use std::path::Path;

/// Parse `bytes` as a single YAML document and bind it against `schema`,
/// writing the resulting graph into `*out_root`.
///
/// `schema` is validated first (§4.3); `*out_root` must be `None` on entry.
/// An empty input (no document at all) succeeds and leaves `*out_root` as
/// `None`.
pub fn load_data(
    bytes: &[u8],
    config: &Config,
    schema: &Descriptor,
    out_root: &mut Option<Value>,
) -> Result<(), CyamlError> {
    load::load_data(bytes, config, schema, out_root)
}

/// Read `path` and bind its contents against `schema`, as [`load_data`].
pub fn load_file(
    path: &Path,
    config: &Config,
    schema: &Descriptor,
    out_root: &mut Option<Value>,
) -> Result<(), CyamlError> {
    let bytes = std::fs::read(path).map_err(|e| CyamlError::Io(e.to_string()))?;
    load_data(&bytes, config, schema, out_root)
}

/// Render `root` against `schema` as a single YAML document.
pub fn save_data(
    config: &Config,
    schema: &Descriptor,
    root: &Value,
    flags: SaveFlags,
) -> Result<Vec<u8>, CyamlError> {
    save::save_data(config, schema, root, flags)
}

/// Render `root` against `schema` and write the result to `path`.
pub fn save_file(
    path: &Path,
    config: &Config,
    schema: &Descriptor,
    root: &Value,
    flags: SaveFlags,
) -> Result<(), CyamlError> {
    save::save_file(path, config, schema, root, flags)
}

/// Release a loaded graph's allocation-ledger entries (§4.2).
///
/// Walks `schema` and `root` in lockstep, calling `config.allocator`'s
/// `note_free` once for every `owned` node `root` actually populated. Real
/// memory is reclaimed by `root`'s own `Drop` once this function returns
/// and the caller lets it go out of scope; this function only reconciles
/// the symbolic allocation ledger so it nets to zero (§8, idempotent free).
pub fn free(config: &Config, schema: &Descriptor, root: Option<Value>) {
    if let Some(value) = &root {
        free_walk(config, schema, value);
    }
}

fn free_walk(config: &Config, schema: &Descriptor, value: &Value) {
    match schema {
        Descriptor::StringOwned { .. } => {
            if let Value::String(s) = value {
                config.allocator.note_free(s.len() + 1);
            }
        }
        Descriptor::Mapping { fields, owned } => {
            let Some(values) = value.as_mapping() else {
                return;
            };
            for (field, v) in fields.iter().zip(values.iter()) {
                if !v.is_null() {
                    free_walk(config, &field.value, v);
                }
            }
            if *owned {
                config
                    .allocator
                    .note_free(estimate_mapping_bytes(fields.len(), values));
            }
        }
        Descriptor::Sequence { element, kind, .. } => {
            let Some(items) = value.as_sequence() else {
                return;
            };
            for item in items {
                free_walk(config, element, item);
            }
            if matches!(kind, SequenceKind::Owned) {
                config.allocator.note_free(estimate_sequence_bytes(items));
            }
        }
        _ => {}
    }
}

fn estimate_mapping_bytes(field_count: usize, values: &[Value]) -> usize {
    values.iter().map(estimate_leaf_bytes).sum::<usize>() + field_count * 8
}

fn estimate_sequence_bytes(items: &[Value]) -> usize {
    items.iter().map(estimate_leaf_bytes).sum::<usize>() + items.len() * 8
}

fn estimate_leaf_bytes(value: &Value) -> usize {
    match value {
        Value::Null => 0,
        Value::Int(_) | Value::Uint(_) | Value::Enum(_) | Value::Float(_) | Value::Flags(_) => 8,
        Value::Bool(_) => 1,
        Value::String(s) => s.len() + 1,
        Value::Mapping(values) => estimate_mapping_bytes(values.len(), values),
        Value::Sequence(items) => estimate_sequence_bytes(items),
    }
}

/// The stable human string for `err`, mirroring the original's
/// `cyaml_strerror` (§4.1).
#[must_use]
pub fn strerror(err: &CyamlError) -> String {
    error::strerror(err)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::rc::Rc;

    fn point_schema() -> Descriptor {
        Descriptor::Mapping {
            fields: vec![
                Field::new("x", Rc::new(Descriptor::Int { width: IntWidth::W4 })),
                Field::new("y", Rc::new(Descriptor::Int { width: IntWidth::W4 })),
                Field::optional(
                    "label",
                    Rc::new(Descriptor::StringOwned {
                        min_len: 0,
                        max_len: 64,
                    }),
                ),
            ],
            owned: false,
        }
    }

    #[test]
    fn round_trips_a_simple_mapping() {
        let schema = point_schema();
        let config = Config::default();
        let mut root = None;
        load_data(b"x: 1\ny: 2\n", &config, &schema, &mut root).unwrap();
        let value = root.expect("document present");
        assert_eq!(
            value,
            Value::Mapping(vec![Value::Int(1), Value::Int(2), Value::Null])
        );

        let rendered = save_data(&config, &schema, &value, SaveFlags::default()).unwrap();
        let text = String::from_utf8(rendered).unwrap();
        assert!(text.contains("x: 1"));
        assert!(text.contains("y: 2"));

        let mut round_tripped = None;
        load_data(text.as_bytes(), &config, &schema, &mut round_tripped).unwrap();
        assert_eq!(round_tripped.unwrap(), value);
    }

    #[test]
    fn empty_document_leaves_root_absent() {
        let schema = point_schema();
        let config = Config::default();
        let mut root = None;
        load_data(b"", &config, &schema, &mut root).unwrap();
        assert!(root.is_none());
    }

    #[test]
    fn unknown_key_is_rejected_unless_configured() {
        let schema = point_schema();
        let config = Config::default();
        let mut root = None;
        let err = load_data(b"x: 1\ny: 2\nz: 3\n", &config, &schema, &mut root).unwrap_err();
        assert!(matches!(err, CyamlError::MappingKeyUnknown { .. }));

        let mut lenient = Config::default();
        lenient.flags.ignore_unknown_keys = true;
        let mut root = None;
        load_data(b"x: 1\ny: 2\nz: 3\n", &lenient, &schema, &mut root).unwrap();
        assert!(root.is_some());
    }

    #[test]
    fn missing_required_field_is_rejected() {
        let schema = point_schema();
        let config = Config::default();
        let mut root = None;
        let err = load_data(b"x: 1\n", &config, &schema, &mut root).unwrap_err();
        assert!(matches!(err, CyamlError::MappingFieldMissing { .. }));
    }

    #[test]
    fn rollback_nets_to_zero_on_failed_load() {
        let schema = Descriptor::Mapping {
            fields: vec![
                Field::new(
                    "label",
                    Rc::new(Descriptor::StringOwned {
                        min_len: 0,
                        max_len: 64,
                    }),
                ),
                Field::new("count", Rc::new(Descriptor::Int { width: IntWidth::W4 })),
            ],
            owned: false,
        };
        let counter = std::sync::Arc::new(CountingAllocator::new());
        let mut config = Config::default();
        config.allocator = counter.clone() as std::sync::Arc<dyn Allocator>;
        let mut root = None;
        let err = load_data(
            b"label: hello\ncount: not-a-number\n",
            &config,
            &schema,
            &mut root,
        )
        .unwrap_err();
        assert!(matches!(err, CyamlError::InvalidScalar { .. }));
        assert_eq!(counter.live_bytes(), 0);
        assert_eq!(counter.live_count(), 0);
    }

    #[test]
    fn free_nets_the_ledger_back_to_zero() {
        let schema = Descriptor::Mapping {
            fields: vec![Field::new(
                "label",
                Rc::new(Descriptor::StringOwned {
                    min_len: 0,
                    max_len: 64,
                }),
            )],
            owned: false,
        };
        let counter = std::sync::Arc::new(CountingAllocator::new());
        let mut config = Config::default();
        config.allocator = counter.clone() as std::sync::Arc<dyn Allocator>;
        let mut root = None;
        load_data(b"label: hello\n", &config, &schema, &mut root).unwrap();
        assert_eq!(counter.live_count(), 1);
        free(&config, &schema, root);
        assert_eq!(counter.live_bytes(), 0);
        assert_eq!(counter.live_count(), 0);
    }

    #[test]
    fn data_target_non_null_is_rejected() {
        let schema = point_schema();
        let config = Config::default();
        let mut root = Some(Value::Null);
        let err = load_data(b"x: 1\ny: 2\n", &config, &schema, &mut root).unwrap_err();
        assert!(matches!(err, CyamlError::DataTargetNonNull));
    }

    #[test]
    fn file_round_trip_through_save_file_and_load_file() {
        let schema = point_schema();
        let config = Config::default();
        let value = Value::Mapping(vec![Value::Int(3), Value::Int(4), Value::Null]);

        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("point.yaml");
        save_file(&path, &config, &schema, &value, SaveFlags::default()).unwrap();

        let mut round_tripped = None;
        load_file(&path, &config, &schema, &mut round_tripped).unwrap();
        assert_eq!(round_tripped.unwrap(), value);
    }

    #[test]
    fn load_file_surfaces_io_errors() {
        let schema = point_schema();
        let config = Config::default();
        let dir = tempfile::tempdir().expect("tempdir");
        let missing = dir.path().join("does-not-exist.yaml");
        let mut root = None;
        let err = load_file(&missing, &config, &schema, &mut root).unwrap_err();
        assert!(matches!(err, CyamlError::Io(_)));
    }

    // S2: every accepted boolean spelling parses to the expected value.
    #[test]
    fn bool_variants_parse_as_expected() {
        let schema = Descriptor::Bool;
        let config = Config::default();
        for (text, expected) in [
            ("true", true),
            ("yes", true),
            ("on", true),
            ("enable", true),
            ("1", true),
            ("false", false),
            ("no", false),
            ("off", false),
            ("disable", false),
            ("0", false),
        ] {
            let mut root = None;
            load_data(format!("{text}\n").as_bytes(), &config, &schema, &mut root).unwrap();
            assert_eq!(root, Some(Value::Bool(expected)), "input {text:?}");
        }
    }

    // S3: a flags sequence with an unrecognized bit round-trips as a residual integer.
    #[test]
    fn flags_with_unknown_bit_round_trip() {
        let schema = Descriptor::Flags {
            members: vec![
                FlagMember::new("first", 0),
                FlagMember::new("second", 1),
                FlagMember::new("third", 2),
                FlagMember::new("fourth", 3),
                FlagMember::new("fifth", 4),
            ],
            width: IntWidth::W2,
            strict: false,
        };
        let config = Config::default();
        let mut root = None;
        load_data(b"[second, fifth, 1024]\n", &config, &schema, &mut root).unwrap();
        let value = root.expect("document present");
        assert_eq!(value, Value::Flags(0b10010 | 1024));

        let rendered = save_data(&config, &schema, &value, SaveFlags::default()).unwrap();
        let text = String::from_utf8(rendered).unwrap();
        assert!(text.contains("second"));
        assert!(text.contains("fifth"));
        assert!(text.contains("1024"));
    }

    // S4: a 4-row, fixed-3-column matrix — a fixed sequence nested inside a
    // bounded outer sequence.
    #[test]
    fn nested_fixed_sequence_matrix_binds_and_enforces_counts() {
        let row = Descriptor::Sequence {
            element: Rc::new(Descriptor::Int { width: IntWidth::W4 }),
            min_count: 3,
            max_count: 3,
            count_width: IntWidth::W4,
            kind: SequenceKind::Fixed,
        };
        let schema = Descriptor::Sequence {
            element: Rc::new(row),
            min_count: 0,
            max_count: 4,
            count_width: IntWidth::W4,
            kind: SequenceKind::Owned,
        };
        let config = Config::default();
        let mut root = None;
        load_data(
            b"[[1, 2, 3], [4, 5, 6], [7, 8, 9], [10, 11, 12]]\n",
            &config,
            &schema,
            &mut root,
        )
        .unwrap();
        assert_eq!(
            root,
            Some(Value::Sequence(vec![
                Value::Sequence(vec![Value::Int(1), Value::Int(2), Value::Int(3)]),
                Value::Sequence(vec![Value::Int(4), Value::Int(5), Value::Int(6)]),
                Value::Sequence(vec![Value::Int(7), Value::Int(8), Value::Int(9)]),
                Value::Sequence(vec![Value::Int(10), Value::Int(11), Value::Int(12)]),
            ]))
        );

        // A row with the wrong column count is rejected.
        let mut bad_row = None;
        let err = load_data(
            b"[[1, 2, 3], [4, 5]]\n",
            &config,
            &schema,
            &mut bad_row,
        )
        .unwrap_err();
        assert!(matches!(err, CyamlError::SequenceTooShort { .. }));

        // A fifth row exceeds the outer sequence's max_count.
        let mut too_many_rows = None;
        let err = load_data(
            b"[[1, 2, 3], [1, 2, 3], [1, 2, 3], [1, 2, 3], [1, 2, 3]]\n",
            &config,
            &schema,
            &mut too_many_rows,
        )
        .unwrap_err();
        assert!(matches!(err, CyamlError::SequenceTooLong { .. }));
    }

    // S7: an Ignore-typed field accepts and discards any subtree shape.
    #[test]
    fn ignored_subtree_accepts_any_shape() {
        let schema = Descriptor::Mapping {
            fields: vec![Field::new("payload", Rc::new(Descriptor::Ignore))],
            owned: false,
        };
        let config = Config::default();
        for doc in [
            "payload: 1\n",
            "payload: [1, 2, {a: b}]\n",
            "payload: {a: {b: c}}\n",
        ] {
            let mut root = None;
            load_data(doc.as_bytes(), &config, &schema, &mut root).unwrap();
            assert_eq!(root, Some(Value::Mapping(vec![Value::Null])), "input {doc:?}");
        }
    }
}
