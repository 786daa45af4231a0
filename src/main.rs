//! geoexpect -- expected-score engine speaking line-delimited JSON.
//!
//! Reads one request object per stdin line and writes one response object
//! per stdout line. Logs go to stderr, filtered by `RUST_LOG` (default
//! `warn`).
//!
//! Usage:
//!   geoexpect [OPTIONS]
//!
//! Options:
//!   --samples-lat N   Optimizer lattice rows (default: 30)
//!   --samples-lng N   Optimizer lattice columns (default: 30)
//!   --k K             Decay rate for --points (default: 0.01)
//!   --points FILE     Compute the best point for a point file and exit
//!   --sync            Run requests on the main thread instead of a worker
//!   --help            Show this help

use std::env;
use std::fs;
use std::io::{self, BufRead, Write};
use std::process;

use tracing_subscriber::EnvFilter;

use geoexpect::config::{EngineConfig, ExecutionMode};
use geoexpect::executor::{spawn_executor, Executor};
use geoexpect::parser::{coordinates, parse_points_from_json};
use geoexpect::protocol::{decode_request, Request, Response};

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(io::stderr)
        .init();

    let args: Vec<String> = env::args().collect();
    let mut config = EngineConfig::default();
    let mut points_path: Option<String> = None;

    let mut i = 1;
    while i < args.len() {
        let option = match args[i].as_str() {
            "--samples-lat" => Some("SamplesLat"),
            "--samples-lng" => Some("SamplesLng"),
            "--k" => Some("K"),
            "--points" => {
                i += 1;
                points_path = Some(value_of(&args, i, "--points").to_string());
                None
            }
            "--sync" => {
                config.mode = ExecutionMode::Local;
                None
            }
            "--help" | "-h" => {
                print_usage();
                return;
            }
            other => {
                eprintln!("Unknown argument: {}", other);
                print_usage();
                process::exit(1);
            }
        };
        if let Some(name) = option {
            let flag = args[i].clone();
            i += 1;
            if let Err(e) = config.set_option(name, value_of(&args, i, &flag)) {
                eprintln!("{}: {}", flag, e);
                process::exit(1);
            }
        }
        i += 1;
    }

    let executor = spawn_executor(&config);

    if let Some(path) = points_path {
        process::exit(run_point_file(executor.as_ref(), &path, config.k));
    }

    let stdin = io::stdin();
    let stdout = io::stdout();
    serve(executor.as_ref(), stdin.lock(), io::BufWriter::new(stdout.lock()));
}

/// Answers each non-blank input line with exactly one response line. A line
/// that is not UTF-8 still gets an `error` response.
fn serve<R: BufRead, W: Write>(executor: &dyn Executor, mut input: R, mut out: W) {
    let mut buf = Vec::new();
    loop {
        buf.clear();
        match input.read_until(b'\n', &mut buf) {
            Ok(0) => break,
            Ok(_) => {}
            Err(e) => {
                tracing::error!("failed to read stdin: {}", e);
                break;
            }
        }

        let response = match std::str::from_utf8(&buf) {
            Ok(line) if line.trim().is_empty() => continue,
            Ok(line) => match decode_request(line.trim_end_matches(&['\r', '\n'][..])) {
                Ok(request) => execute(executor, request),
                Err(message) => Response::error(message),
            },
            Err(e) => Response::error(format!("invalid request encoding: {}", e)),
        };
        if write_response(&mut out, &response).is_err() {
            break;
        }
    }
}

/// Runs a request, reporting a transport failure as an `error` response.
fn execute(executor: &dyn Executor, request: Request) -> Response {
    executor
        .call(request)
        .unwrap_or_else(|e| Response::error(e.to_string()))
}

fn write_response<W: Write>(out: &mut W, response: &Response) -> io::Result<()> {
    serde_json::to_writer(&mut *out, response)?;
    writeln!(out)?;
    out.flush()
}

/// Loads a point file, prints the `bestResult` response, and returns the
/// process exit code.
fn run_point_file(executor: &dyn Executor, path: &str, k: f64) -> i32 {
    let text = match fs::read_to_string(path) {
        Ok(t) => t,
        Err(e) => {
            eprintln!("failed to read {}: {}", path, e);
            return 1;
        }
    };
    let points = match parse_points_from_json(&text) {
        Ok(p) => p,
        Err(e) => {
            eprintln!("failed to parse {}: {}", path, e);
            return 1;
        }
    };
    tracing::info!(path, points = points.len(), "loaded point file");

    let response = execute(
        executor,
        Request::ComputeBest {
            points: coordinates(&points),
            k,
        },
    );
    let stdout = io::stdout();
    let mut out = stdout.lock();
    match write_response(&mut out, &response) {
        Ok(()) if !response.is_error() => 0,
        _ => 1,
    }
}

fn value_of<'a>(args: &'a [String], i: usize, flag: &str) -> &'a str {
    match args.get(i) {
        Some(v) => v,
        None => {
            eprintln!("missing value for {}", flag);
            print_usage();
            process::exit(1);
        }
    }
}

fn print_usage() {
    eprintln!("Usage: geoexpect [OPTIONS]");
    eprintln!();
    eprintln!("Reads one JSON request per stdin line and writes one JSON response per line.");
    eprintln!();
    eprintln!("Options:");
    eprintln!("  --samples-lat N  Optimizer lattice rows (default: 30)");
    eprintln!("  --samples-lng N  Optimizer lattice columns (default: 30)");
    eprintln!("  --k K            Decay rate for --points (default: 0.01)");
    eprintln!("  --points FILE    Compute the best point for a point file and exit");
    eprintln!("  --sync           Run requests on the main thread instead of a worker");
    eprintln!("  --help           Show this help");
}
