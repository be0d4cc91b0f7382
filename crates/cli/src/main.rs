mod filler;
mod loader;
mod serve;

use std::path::{Path, PathBuf};
use std::process;

use clap::{Parser, Subcommand, ValueEnum};

use mimus_eval::LiveRequest;

/// Output format for CLI responses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    Text,
    Json,
}

/// Mimus declarative mock server.
#[derive(Parser)]
#[command(name = "mimus", version, about = "Mimus declarative mock server")]
struct Cli {
    /// Output format (text or json)
    #[arg(long, global = true, default_value = "text", value_enum)]
    output: OutputFormat,

    /// Suppress non-essential output
    #[arg(long, global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate specification documents without serving them
    Validate {
        /// Specification files to check
        files: Vec<PathBuf>,
    },

    /// Generate one response from a spec without starting a server
    Generate {
        /// Path to the specification file
        file: PathBuf,
        /// Route parameter, as name=value (repeatable)
        #[arg(long = "param")]
        params: Vec<String>,
        /// Query parameter, as name=value (repeatable)
        #[arg(long = "query")]
        query: Vec<String>,
        /// Request header, as name:value (repeatable)
        #[arg(long = "header")]
        headers: Vec<String>,
        /// Path to a JSON file used as the request body
        #[arg(long)]
        payload: Option<PathBuf>,
    },

    /// Start the mock HTTP server
    Serve {
        /// Port to listen on
        #[arg(long, default_value = "8080")]
        port: u16,
        /// Specification files or directories to serve
        paths: Vec<PathBuf>,
    },
}

fn main() {
    let cli = Cli::parse();

    match cli.command {
        Commands::Validate { files } => {
            cmd_validate(&files, cli.output, cli.quiet);
        }
        Commands::Generate {
            file,
            params,
            query,
            headers,
            payload,
        } => {
            cmd_generate(&file, &params, &query, &headers, payload.as_deref(), cli.output);
        }
        Commands::Serve { port, paths } => {
            let specs = loader::load_paths(&paths);
            if specs.is_empty() {
                eprintln!("error: no valid specification documents loaded");
                process::exit(1);
            }
            let rt = match tokio::runtime::Runtime::new() {
                Ok(rt) => rt,
                Err(e) => {
                    eprintln!("error: failed to create tokio runtime: {}", e);
                    process::exit(1);
                }
            };
            if let Err(e) = rt.block_on(serve::start_server(port, specs)) {
                eprintln!("Server error: {}", e);
                process::exit(1);
            }
        }
    }
}

fn cmd_validate(files: &[PathBuf], output: OutputFormat, quiet: bool) {
    if files.is_empty() {
        eprintln!("error: no files given");
        process::exit(2);
    }
    let mut failures = 0usize;
    let mut report = Vec::new();
    for file in files {
        match loader::load_file(file) {
            Ok(loaded) => {
                if !quiet && output == OutputFormat::Text {
                    println!(
                        "ok: {} ({} {})",
                        file.display(),
                        loaded.spec.request.method.as_str(),
                        loaded.spec.request.route
                    );
                }
                report.push(serde_json::json!({
                    "file": file.display().to_string(),
                    "valid": true,
                }));
            }
            Err(e) => {
                failures += 1;
                if output == OutputFormat::Text {
                    eprintln!("invalid: {}: {}", file.display(), e);
                }
                report.push(serde_json::json!({
                    "file": file.display().to_string(),
                    "valid": false,
                    "error": e.to_string(),
                }));
            }
        }
    }
    if output == OutputFormat::Json {
        println!("{}", serde_json::json!({ "results": report }));
    }
    if failures > 0 {
        process::exit(1);
    }
}

fn cmd_generate(
    file: &Path,
    params: &[String],
    query: &[String],
    headers: &[String],
    payload: Option<&Path>,
    output: OutputFormat,
) {
    let loaded = match loader::load_file(file) {
        Ok(l) => l,
        Err(e) => {
            eprintln!("error: {}: {}", file.display(), e);
            process::exit(1);
        }
    };

    let payload = payload.map(|path| {
        let text = std::fs::read_to_string(path).unwrap_or_else(|e| {
            eprintln!("error: cannot read {}: {}", path.display(), e);
            process::exit(1);
        });
        serde_json::from_str(&text).unwrap_or_else(|e| {
            eprintln!("error: {} is not valid JSON: {}", path.display(), e);
            process::exit(1);
        })
    });

    let live = LiveRequest {
        params: split_pairs(params, '='),
        query: split_pairs(query, '='),
        headers: split_pairs(headers, ':'),
        payload,
    };

    let generated = match mimus_eval::generate(&loaded.spec, &live, &filler::fill) {
        Ok(g) => g,
        Err(e) => {
            eprintln!("error: generation failed: {}", e);
            process::exit(1);
        }
    };

    match output {
        OutputFormat::Json => {
            let headers: serde_json::Map<String, serde_json::Value> = generated
                .headers
                .iter()
                .map(|(k, v)| (k.clone(), serde_json::Value::String(v.clone())))
                .collect();
            println!(
                "{}",
                serde_json::json!({
                    "code": generated.code,
                    "headers": headers,
                    "content": generated.content,
                    "flow": generated.flow,
                    "flow_reason": generated.flow_reason,
                })
            );
        }
        OutputFormat::Text => {
            println!("code: {}", generated.code);
            for (name, value) in &generated.headers {
                println!("header: {}: {}", name, value);
            }
            if let Some(flow) = &generated.flow {
                println!("flow: {}", flow);
            }
            if let Some(reason) = &generated.flow_reason {
                println!("flow reason: {}", reason);
            }
            println!("{}", generated.content);
        }
    }
}

/// Split repeated `name<sep>value` flags into pairs; a missing separator
/// leaves the value empty.
fn split_pairs(raw: &[String], sep: char) -> Vec<(String, String)> {
    raw.iter()
        .map(|entry| match entry.split_once(sep) {
            Some((name, value)) => (name.trim().to_string(), value.trim().to_string()),
            None => (entry.trim().to_string(), String::new()),
        })
        .collect()
}
