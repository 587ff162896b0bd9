//! A small CLI that runs this crate's concrete scenario checks and reports
//! pass/fail, mirroring the original library's own `test` driver. Not part
//! of the public API; useful as a quick smoke check when wiring a new
//! schema together.

use std::rc::Rc;

use clap::Parser;
use cyaml::{load_data, save_data, Config, Descriptor, Field, FloatWidth, IntWidth, SaveFlags, Value};

#[derive(Parser)]
#[command(name = "cyaml-cli", about = "Run cyaml's built-in scenario checks")]
struct Args {
    /// Suppress per-scenario output; only the final summary is printed.
    #[arg(short, long)]
    quiet: bool,
    /// Print each scenario's loaded value as well as its pass/fail result.
    #[arg(short, long)]
    verbose: bool,
    /// Enable debug-level diagnostics from the library itself.
    #[arg(short, long)]
    debug: bool,
    /// Only run scenarios whose name contains this substring.
    filter: Option<String>,
}

type Scenario = (&'static str, fn() -> Result<(), String>);

fn scenarios() -> Vec<Scenario> {
    vec![
        ("round_trip", scenario_round_trip),
        ("bool_variants", scenario_bool_variants),
        ("flags_unknown_bit", scenario_flags_unknown_bit),
        ("fixed_sequence", scenario_fixed_sequence),
        ("optional_field_absent", scenario_optional_field_absent),
        ("unknown_key_ignored", scenario_unknown_key_ignored),
        ("ignored_subtree", scenario_ignored_subtree),
    ]
}

fn main() {
    let args = Args::parse();

    if args.debug {
        env_logger::Builder::new()
            .filter_level(log::LevelFilter::Debug)
            .init();
    } else {
        env_logger::Builder::new()
            .filter_level(log::LevelFilter::Warn)
            .init();
    }

    let mut ran = 0usize;
    let mut failed = 0usize;
    for (name, run) in scenarios() {
        if let Some(filter) = &args.filter {
            if !name.contains(filter.as_str()) {
                continue;
            }
        }
        ran += 1;
        match run() {
            Ok(()) => {
                if !args.quiet {
                    println!("ok   {name}");
                }
            }
            Err(message) => {
                failed += 1;
                println!("FAIL {name}: {message}");
            }
        }
    }

    if args.verbose && !args.quiet {
        println!("---");
    }
    println!("{} run, {} failed", ran, failed);
    std::process::exit(if failed == 0 { 0 } else { 1 });
}

fn base_config() -> Config {
    Config::default()
}

// S1: a simple mapping round-trips through load then save unchanged.
fn scenario_round_trip() -> Result<(), String> {
    let schema = Descriptor::Mapping {
        fields: vec![
            Field::new("x", Rc::new(Descriptor::Int { width: IntWidth::W4 })),
            Field::new("y", Rc::new(Descriptor::Float { width: FloatWidth::W8 })),
        ],
        owned: false,
    };
    let config = base_config();
    let mut root = None;
    load_data(b"x: 7\ny: 2.5\n", &config, &schema, &mut root).map_err(|e| e.to_string())?;
    let value = root.ok_or("expected a document")?;
    let rendered = save_data(&config, &schema, &value, SaveFlags::default())
        .map_err(|e| e.to_string())?;
    let mut round_tripped = None;
    load_data(&rendered, &config, &schema, &mut round_tripped).map_err(|e| e.to_string())?;
    if round_tripped.as_ref() != Some(&value) {
        return Err("round trip changed the value".into());
    }
    Ok(())
}

// S2: every accepted boolean spelling parses to the expected value.
fn scenario_bool_variants() -> Result<(), String> {
    let schema = Descriptor::Bool;
    let config = base_config();
    for (text, expected) in [("true", true), ("no", false), ("1", true), ("off", false)] {
        let mut root = None;
        load_data(
            format!("{text}\n").as_bytes(),
            &config,
            &schema,
            &mut root,
        )
        .map_err(|e| e.to_string())?;
        if root != Some(Value::Bool(expected)) {
            return Err(format!("{text} did not parse to {expected}"));
        }
    }
    Ok(())
}

// S3: a flags sequence with an unrecognized bit round-trips as a residual integer.
fn scenario_flags_unknown_bit() -> Result<(), String> {
    use cyaml::FlagMember;
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
    let config = base_config();
    let mut root = None;
    load_data(
        b"[second, fifth, 1024]\n",
        &config,
        &schema,
        &mut root,
    )
    .map_err(|e| e.to_string())?;
    let value = root.ok_or("expected a document")?;
    let rendered = save_data(&config, &schema, &value, SaveFlags::default())
        .map_err(|e| e.to_string())?;
    let text = String::from_utf8_lossy(&rendered);
    if !text.contains("second") || !text.contains("fifth") || !text.contains("1024") {
        return Err(format!("unexpected render: {text}"));
    }
    Ok(())
}

// S4: a 4-row, fixed-3-column matrix — a fixed sequence nested inside a
// bounded outer sequence.
fn scenario_fixed_sequence() -> Result<(), String> {
    use cyaml::SequenceKind;
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
    let config = base_config();
    let mut root = None;
    load_data(
        b"[[1, 2, 3], [4, 5, 6], [7, 8, 9], [10, 11, 12]]\n",
        &config,
        &schema,
        &mut root,
    )
    .map_err(|e| e.to_string())?;
    if root.as_ref().and_then(Value::as_sequence).map(<[Value]>::len) != Some(4) {
        return Err("fixed matrix did not bind as expected".into());
    }
    let mut too_short = None;
    if load_data(b"[[1, 2, 3], [4, 5]]\n", &config, &schema, &mut too_short).is_ok() {
        return Err("expected SequenceTooShort".into());
    }
    Ok(())
}

// S5: an all-optional mapping against an empty document leaves root absent.
fn scenario_optional_field_absent() -> Result<(), String> {
    let schema = Descriptor::Mapping {
        fields: vec![Field::optional(
            "name",
            Rc::new(Descriptor::StringInline {
                capacity: 16,
                min_len: 0,
            }),
        )],
        owned: false,
    };
    let config = base_config();
    let mut root = None;
    load_data(b"", &config, &schema, &mut root).map_err(|e| e.to_string())?;
    if root.is_some() {
        return Err("expected the root to stay absent".into());
    }
    Ok(())
}

// S6: an unknown mapping key is accepted only when configured to ignore it.
fn scenario_unknown_key_ignored() -> Result<(), String> {
    let schema = Descriptor::Mapping {
        fields: vec![Field::new("x", Rc::new(Descriptor::Int { width: IntWidth::W4 }))],
        owned: false,
    };
    let strict = base_config();
    let mut root = None;
    if load_data(b"x: 1\nz: 2\n", &strict, &schema, &mut root).is_ok() {
        return Err("expected MappingKeyUnknown".into());
    }

    let mut lenient = Config::default();
    lenient.flags.ignore_unknown_keys = true;
    let mut root = None;
    load_data(b"x: 1\nz: 2\n", &lenient, &schema, &mut root).map_err(|e| e.to_string())?;
    Ok(())
}

// S7: an Ignore-typed field accepts and discards any subtree shape.
fn scenario_ignored_subtree() -> Result<(), String> {
    let schema = Descriptor::Mapping {
        fields: vec![Field::new("payload", Rc::new(Descriptor::Ignore))],
        owned: false,
    };
    let config = base_config();
    for doc in ["payload: 1\n", "payload: [1, 2, {a: b}]\n", "payload: {a: {b: c}}\n"] {
        let mut root = None;
        load_data(doc.as_bytes(), &config, &schema, &mut root).map_err(|e| e.to_string())?;
        if root != Some(Value::Mapping(vec![Value::Null])) {
            return Err(format!("expected an ignored payload for {doc:?}"));
        }
    }
    Ok(())
}
