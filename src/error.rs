//! The closed error-kind enumeration (§4.1) and its stable human strings.

use std::fmt;

/// A position in the input byte stream, forwarded from the YAML event adapter
/// for diagnostics only — it never affects control flow.
#[derive(Copy, Clone, Default, Debug, PartialEq, Eq)]
#[non_exhaustive]
pub struct Mark {
    /// Byte offset from the start of the stream.
    pub index: u64,
    /// Line number, zero-based.
    pub line: u64,
    /// Column number, zero-based.
    pub column: u64,
}

impl fmt::Display for Mark {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "line {} column {}", self.line, self.column)
    }
}

/// The closed set of error kinds a public operation may return.
///
/// Every variant carries a stable, unique `#[error(...)]` string (tested by
/// `strerror_strings_are_unique`); two distinct variants never render the
/// same text.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum CyamlError {
    /// The allocator reported it could not satisfy a request.
    #[error("out of memory")]
    OutOfMemory,
    /// The allocator refused a nonzero-size free.
    #[error("allocator refused a free")]
    Alloc,
    /// A mapping key was encountered that has no matching schema field.
    #[error("unexpected mapping key: {key}")]
    MappingKeyUnknown {
        /// The offending key.
        key: String,
    },
    /// A mapping key was encountered twice.
    #[error("duplicate mapping key: {key}")]
    MappingKeyDuplicate {
        /// The offending key.
        key: String,
    },
    /// A non-optional mapping field was never populated.
    #[error("missing required mapping field: {key}")]
    MappingFieldMissing {
        /// The missing field's key.
        key: String,
    },
    /// A sequence had fewer elements than `min_count`.
    #[error("sequence too short: got {got}, need at least {min}")]
    SequenceTooShort {
        /// Elements actually parsed.
        got: usize,
        /// The schema's `min_count`.
        min: usize,
    },
    /// A sequence had more elements than `max_count`.
    #[error("sequence too long: got {got}, limit is {max}")]
    SequenceTooLong {
        /// Elements actually parsed.
        got: usize,
        /// The schema's `max_count`.
        max: usize,
    },
    /// A scalar could not be parsed as the descriptor's type.
    #[error("invalid scalar {value:?} for {expected}")]
    InvalidScalar {
        /// The raw scalar text.
        value: String,
        /// What type was expected.
        expected: &'static str,
    },
    /// A scalar could not be parsed as a boolean.
    #[error("invalid boolean: {value:?}")]
    InvalidBool {
        /// The raw scalar text.
        value: String,
    },
    /// A scalar did not match any declared enum name or a numeric fallback.
    #[error("invalid enum value: {value:?}")]
    InvalidEnum {
        /// The raw scalar text.
        value: String,
    },
    /// A flag sequence entry did not match any declared flag name or literal.
    #[error("invalid flag value: {value:?}")]
    InvalidFlag {
        /// The raw scalar text.
        value: String,
    },
    /// An inline string's length was below `min_len`.
    #[error("string too short: got {got} bytes, need at least {min}")]
    StringTooShort {
        /// Bytes actually present.
        got: usize,
        /// The schema's `min_len`.
        min: usize,
    },
    /// An inline string's length exceeded `capacity - 1`.
    #[error("string too long: got {got} bytes, limit is {max}")]
    StringTooLong {
        /// Bytes actually present.
        got: usize,
        /// The schema's maximum (`capacity - 1`, or `max_len`).
        max: usize,
    },
    /// The event stream produced an event the current frame cannot accept.
    #[error("{}: unexpected event in {context}", mark)]
    UnexpectedEvent {
        /// What the current frame was trying to parse.
        context: &'static str,
        /// Where in the input this happened.
        mark: Mark,
    },
    /// Schema validation (§4.3) failed before any YAML was consumed.
    #[error("invalid schema: {reason}")]
    SchemaInvalid {
        /// Human-readable validation failure.
        reason: &'static str,
    },
    /// `load_data`/`load_file` was called with a non-empty `out_root`.
    #[error("load target is already populated")]
    DataTargetNonNull,
    /// The underlying YAML event producer/emitter reported an error.
    #[error("YAML error: {0}")]
    LibYamlError(String),
    /// Reading or writing the backing file failed.
    #[error("I/O error: {0}")]
    Io(String),
    /// An engine invariant was violated; indicates a bug in this crate.
    #[error("internal error: {0}")]
    InternalError(&'static str),
}

/// Returns the stable human string for an error, mirroring the original's
/// `cyaml_strerror`. `Ok(())`/no-error is represented by [`SUCCESS_STR`]
/// rather than a variant, since Rust expresses success as `Result::Ok`.
#[must_use]
pub fn strerror(err: &CyamlError) -> String {
    err.to_string()
}

/// The string `strerror` would use for a non-error, kept for parity with the
/// original's closed string table (`Ok` has code 0 and string "Success").
pub const SUCCESS_STR: &str = "Success";

#[cfg(test)]
mod tests {
    use super::*;

    fn all_variants() -> Vec<CyamlError> {
        vec![
            CyamlError::OutOfMemory,
            CyamlError::Alloc,
            CyamlError::MappingKeyUnknown { key: "a".into() },
            CyamlError::MappingKeyDuplicate { key: "a".into() },
            CyamlError::MappingFieldMissing { key: "a".into() },
            CyamlError::SequenceTooShort { got: 0, min: 1 },
            CyamlError::SequenceTooLong { got: 5, max: 1 },
            CyamlError::InvalidScalar {
                value: "x".into(),
                expected: "i32",
            },
            CyamlError::InvalidBool { value: "x".into() },
            CyamlError::InvalidEnum { value: "x".into() },
            CyamlError::InvalidFlag { value: "x".into() },
            CyamlError::StringTooShort { got: 0, min: 1 },
            CyamlError::StringTooLong { got: 5, max: 1 },
            CyamlError::UnexpectedEvent {
                context: "mapping",
                mark: Mark::default(),
            },
            CyamlError::SchemaInvalid { reason: "x" },
            CyamlError::DataTargetNonNull,
            CyamlError::LibYamlError("x".into()),
            CyamlError::Io("x".into()),
            CyamlError::InternalError("x"),
        ]
    }

    #[test]
    fn strerror_strings_are_unique_and_nonempty() {
        let variants = all_variants();
        let mut seen = std::collections::HashSet::new();
        for v in &variants {
            let s = strerror(v);
            assert!(!s.is_empty());
            assert!(seen.insert(s), "duplicate error string for {v:?}");
        }
        assert!(!SUCCESS_STR.is_empty());
        assert!(seen.insert(SUCCESS_STR.to_string()));
    }
}
