//! hconfig command-line tool for checking and transcoding hconfig documents.
//!
//! Usage: hconfig [OPTIONS] [FILE]
//!
//! Options:
//!   -m, --mode <MODE>      How to read the input (value, root, sections) [default: value]
//!   -s, --schema <FILE>    Schema for sections mode
//!   -t, --to <FORMAT>      Output format (hconfig, json, yaml, toml, cbor) [default: json]
//!   -o, --output <FILE>    Write output to specified file
//!   --check                Check if input is valid (exit 0 if valid, 1 if invalid)
//!   -h, --help             Print help
//!   -V, --version          Print version

use libhconfig::{encode, encode_sections, Format, Loader, Schema, Sections, Value};
use std::fs;
use std::io::{self, Read, Write};
use std::path::Path;
use std::process;
use tracing::debug;
use tracing_subscriber::EnvFilter;

mod transcode;

/// How the input document is read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mode {
    /// An object body without braces.
    Value,
    /// A single root value.
    Root,
    /// Sections and includes.
    Sections,
}

/// Output format for -t.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Output {
    Hconfig,
    Json,
    Yaml,
    Toml,
    Cbor,
}

/// A parsed input, in whichever shape the mode produces.
enum Document {
    Value(Value),
    Sections(Sections),
}

impl Document {
    fn to_value(&self) -> Value {
        match self {
            Document::Value(value) => value.clone(),
            Document::Sections(sections) => sections.to_value(),
        }
    }
}

fn parse_mode(s: &str) -> Option<Mode> {
    match s {
        "value" => Some(Mode::Value),
        "root" => Some(Mode::Root),
        "sections" => Some(Mode::Sections),
        _ => None,
    }
}

fn parse_output(s: &str) -> Option<Output> {
    match s {
        "hconfig" | "hcnf" => Some(Output::Hconfig),
        "json" => Some(Output::Json),
        "yaml" | "yml" => Some(Output::Yaml),
        "toml" => Some(Output::Toml),
        "cbor" => Some(Output::Cbor),
        _ => None,
    }
}

fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

fn main() {
    init_logging();

    let args: Vec<String> = std::env::args().collect();

    let mut mode = Mode::Value;
    let mut schema_path: Option<&str> = None;
    let mut output = Output::Json;
    let mut output_file: Option<&str> = None;
    let mut check_only = false;
    let mut input_path: Option<&str> = None;

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "-h" | "--help" => {
                print_help();
                return;
            }
            "-V" | "--version" => {
                println!("hconfig {}", env!("CARGO_PKG_VERSION"));
                return;
            }
            "-m" | "--mode" => {
                i += 1;
                if i >= args.len() {
                    eprintln!("Error: --mode requires an argument");
                    process::exit(1);
                }
                mode = match parse_mode(&args[i]) {
                    Some(mode) => mode,
                    None => {
                        eprintln!("Error: Unknown mode: {}", args[i]);
                        process::exit(1);
                    }
                };
            }
            "-s" | "--schema" => {
                i += 1;
                if i >= args.len() {
                    eprintln!("Error: --schema requires a file argument");
                    process::exit(1);
                }
                schema_path = Some(&args[i]);
            }
            "-t" | "--to" => {
                i += 1;
                if i >= args.len() {
                    eprintln!("Error: -t requires a format argument");
                    process::exit(1);
                }
                output = match parse_output(&args[i]) {
                    Some(output) => output,
                    None => {
                        eprintln!("Error: Unknown format: {}", args[i]);
                        process::exit(1);
                    }
                };
            }
            "-o" | "--output" => {
                i += 1;
                if i >= args.len() {
                    eprintln!("Error: --output requires an argument");
                    process::exit(1);
                }
                output_file = Some(&args[i]);
            }
            "--check" => {
                check_only = true;
            }
            "-" => {
                // Explicit stdin
                input_path = None;
            }
            arg if arg.starts_with('-') => {
                eprintln!("Error: Unknown option: {}", arg);
                process::exit(1);
            }
            _ => {
                if input_path.is_some() {
                    eprintln!("Error: Multiple input paths not supported");
                    process::exit(1);
                }
                input_path = Some(&args[i]);
            }
        }
        i += 1;
    }

    if schema_path.is_some() && mode != Mode::Sections {
        eprintln!("Error: --schema requires --mode sections");
        process::exit(1);
    }

    let mut loader = Loader::new();

    let schema = match schema_path {
        Some(path) => match load_schema(&mut loader, path) {
            Ok(schema) => Some(schema),
            Err(e) => {
                eprintln!("Error: {}", e);
                process::exit(1);
            }
        },
        None => None,
    };

    let document = match read_document(&mut loader, input_path, mode, schema.as_ref()) {
        Ok(document) => document,
        Err(e) => {
            eprintln!("Error: {}", e);
            process::exit(1);
        }
    };
    debug!(warnings = loader.warnings().len(), "parsed input");

    if check_only {
        println!("{}: ok", input_path.unwrap_or("<stdin>"));
        return;
    }

    process::exit(output_document(&document, output, output_file));
}

/// Read a schema document (an object body of section specifiers).
fn load_schema(loader: &mut Loader, path: &str) -> Result<Schema, String> {
    let value = loader
        .value_from_file(path, false)
        .map_err(|e| e.to_string())?;
    Schema::from_value(&value).map_err(|e| format!("{}: {}", path, e))
}

fn read_document(
    loader: &mut Loader,
    input_path: Option<&str>,
    mode: Mode,
    schema: Option<&Schema>,
) -> Result<Document, String> {
    match input_path {
        Some(path) => {
            let path = Path::new(path);
            let document = match mode {
                Mode::Value => loader.value_from_file(path, false).map(Document::Value),
                Mode::Root => loader.value_from_file(path, true).map(Document::Value),
                Mode::Sections => loader
                    .sections_from_file(path, schema)
                    .map(Document::Sections),
            };
            document.map_err(|e| e.to_string())
        }
        None => {
            let mut buffer = Vec::new();
            io::stdin()
                .read_to_end(&mut buffer)
                .map_err(|e| format!("Error reading stdin: {}", e))?;
            // Same byte-per-character reading as file input.
            let input: String = buffer.iter().map(|&b| char::from(b)).collect();
            let document = match mode {
                Mode::Value => loader.value_from_str(&input, false).map(Document::Value),
                Mode::Root => loader.value_from_str(&input, true).map(Document::Value),
                Mode::Sections => loader
                    .sections_from_str(&input, schema)
                    .map(Document::Sections),
            };
            document.map_err(|e| e.to_string())
        }
    }
}

fn output_document(document: &Document, output: Output, output_file: Option<&str>) -> i32 {
    match output {
        Output::Hconfig => {
            let text = match document {
                Document::Value(value) => encode(value, Format::Hconfig),
                Document::Sections(sections) => encode_sections(sections),
            };
            write_text_output(&text, output_file);
        }
        Output::Json => {
            let text = encode(&document.to_value(), Format::Json);
            write_text_output(&text, output_file);
        }
        Output::Yaml => match transcode::yaml::encode(&document.to_value()) {
            Ok(text) => write_text_output(&text, output_file),
            Err(e) => {
                eprintln!("Error: Cannot convert to YAML: {}", e);
                return 1;
            }
        },
        Output::Toml => match transcode::toml::encode(&document.to_value()) {
            Ok(text) => write_text_output(&text, output_file),
            Err(e) => {
                eprintln!("Error: Cannot convert to TOML: {}", e);
                return 1;
            }
        },
        Output::Cbor => {
            let bytes = transcode::cbor::encode(&document.to_value());
            write_binary_output(&bytes, output_file);
        }
    }

    0
}

fn write_text_output(output: &str, output_file: Option<&str>) {
    if let Some(path) = output_file {
        let mut text = output.to_string();
        if !text.ends_with('\n') {
            text.push('\n');
        }
        if let Err(e) = fs::write(path, text) {
            eprintln!("Error writing {}: {}", path, e);
            process::exit(1);
        }
    } else {
        print!("{}", output);
        // Ensure output ends with newline
        if !output.ends_with('\n') {
            println!();
        }
    }
}

fn write_binary_output(output: &[u8], output_file: Option<&str>) {
    if let Some(path) = output_file {
        if let Err(e) = fs::write(path, output) {
            eprintln!("Error writing {}: {}", path, e);
            process::exit(1);
        }
    } else {
        let stdout = io::stdout();
        let mut handle = stdout.lock();
        if let Err(e) = handle.write_all(output) {
            eprintln!("Error writing to stdout: {}", e);
            process::exit(1);
        }
    }
}

fn print_help() {
    println!(
        "hconfig - hconfig command-line tool

USAGE:
    hconfig [OPTIONS] [FILE]

ARGS:
    [FILE]    Input file (reads from stdin if not provided or '-')

OPTIONS:
    -m, --mode <MODE>      How to read the input [default: value]
                           value     key/value pairs without surrounding braces
                           root      a single value
                           sections  'name [label] {{ ... }}' sections and includes

    -s, --schema <FILE>    Schema for sections mode, for example:
                               general once
                               vhost {{ count many props {{ webroot string }} }}

    -t, --to <FORMAT>      Output format [default: json]
                           Supported: hconfig, json, yaml, toml, cbor

    -o, --output <FILE>    Write output to specified file

    --check                Check if input is valid (exit 0 if valid, 1 if invalid)

    -h, --help             Print help

    -V, --version          Print version

ENVIRONMENT:
    RUST_LOG               Log filter for warnings and diagnostics [default: warn]

EXAMPLES:
    # Convert a config file to JSON
    hconfig app.hcnf

    # Validate a sectioned config against a schema
    hconfig --check -m sections -s app.schema app.hcnf

    # Reformat sections as canonical hconfig
    hconfig -m sections -t hconfig app.hcnf

    # Convert to YAML
    hconfig -t yaml app.hcnf

    # Write CBOR to a file
    hconfig -t cbor -o app.cbor app.hcnf
"
    );
}
