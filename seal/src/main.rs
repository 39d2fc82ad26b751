//! Command-line front end for signed sections. One-shot commands run against a
//! fresh store; `session` keeps a single store alive and answers JSON requests
//! from stdin, one per line.

use std::env;
use std::fs;
use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::process;

use serde::Serialize;
use serde_json::json;
use section_seal::config::{resolve_config, SealConfig};
use section_seal::crypto::digest::digest_hex;
use section_seal::crypto::keys::parse_key;
use section_seal::service::messages::{
    ErrorBody, ErrorResponse, GenerateKeysRequest, Request, SignRequest, VerifyRequest,
};
use section_seal::service::{SectionService, ServiceError};
use tracing_subscriber::EnvFilter;

fn print_usage() {
    eprintln!("Usage: section-seal [--config <path>] <command>\n\nCommands:\n  generate-keys [modulus-bits]\n  sign <section> <content> <private-key-pem-file>\n  verify <section> <public-key-pem-file>\n  digest <content>\n  inspect-key <pem-file>\n  session");
}

fn init_logging(config: &SealConfig) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

fn print_json<T: Serialize>(value: &T) {
    match serde_json::to_string_pretty(value) {
        Ok(text) => println!("{text}"),
        Err(err) => eprintln!("could not render output: {err}"),
    }
}

fn fail(err: &ServiceError) -> ! {
    print_json(&err.to_response());
    process::exit(1);
}

fn read_pem(path: &str) -> String {
    match fs::read_to_string(path) {
        Ok(text) => text,
        Err(err) => {
            eprintln!("unable to read {path}: {err}");
            process::exit(1);
        }
    }
}

/// Answers JSON-lines requests until stdin closes. Bad lines get an error
/// object back and the session continues.
fn run_session(service: &SectionService) -> io::Result<()> {
    let stdin = io::stdin();
    let stdout = io::stdout();
    let mut out = stdout.lock();
    for line in stdin.lock().lines() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        let rendered = match serde_json::from_str::<Request>(&line) {
            Ok(request) => match service.handle(request) {
                Ok(response) => serde_json::to_string(&response),
                Err(err) => serde_json::to_string(&err.to_response()),
            },
            Err(err) => serde_json::to_string(&ErrorResponse {
                error: ErrorBody {
                    kind: "invalid_request",
                    message: format!("{err}"),
                },
            }),
        };
        let rendered = rendered.map_err(|e| io::Error::new(io::ErrorKind::Other, e))?;
        writeln!(out, "{rendered}")?;
        out.flush()?;
    }
    Ok(())
}

fn main() {
    let mut args: Vec<String> = env::args().collect();
    let mut config_path = None;
    if args.get(1).map(String::as_str) == Some("--config") {
        if args.len() < 3 {
            return print_usage();
        }
        config_path = Some(PathBuf::from(args.remove(2)));
        args.remove(1);
    }
    if args.len() < 2 {
        print_usage();
        return;
    }

    let config = match resolve_config(config_path) {
        Ok(cfg) => cfg,
        Err(err) => {
            eprintln!("config load failed: {err}");
            process::exit(1);
        }
    };
    init_logging(&config);
    let service = SectionService::from_config(&config);

    match args[1].as_str() {
        "generate-keys" => {
            if args.len() > 3 {
                return print_usage();
            }
            let modulus_bits = match args.get(2).map(|raw| raw.parse::<usize>()) {
                None => None,
                Some(Ok(bits)) => Some(bits),
                Some(Err(err)) => {
                    eprintln!("invalid modulus size: {err}");
                    process::exit(1);
                }
            };
            match service.generate_keys(GenerateKeysRequest { modulus_bits }) {
                Ok(keys) => print_json(&keys),
                Err(err) => fail(&err),
            }
        }
        "sign" => {
            if args.len() != 5 {
                return print_usage();
            }
            let request = SignRequest {
                section: Some(args[2].clone()),
                content: Some(args[3].clone()),
                private_key: Some(read_pem(&args[4])),
            };
            match service.sign(request) {
                Ok(response) => print_json(&response),
                Err(err) => fail(&err),
            }
        }
        "verify" => {
            if args.len() != 4 {
                return print_usage();
            }
            let request = VerifyRequest {
                section: Some(args[2].clone()),
                public_key: Some(read_pem(&args[3])),
            };
            match service.verify(request) {
                Ok(response) => {
                    print_json(&response);
                    if !response.valid {
                        process::exit(2);
                    }
                }
                Err(err) => fail(&err),
            }
        }
        "digest" => {
            if args.len() != 3 {
                return print_usage();
            }
            println!("{}", digest_hex(args[2].as_bytes()));
        }
        "inspect-key" => {
            if args.len() != 3 {
                return print_usage();
            }
            match parse_key(&read_pem(&args[2])) {
                Ok(key) => print_json(&json!({
                    "kind": key.kind(),
                    "algorithm": key.algorithm().as_str(),
                    "modulusBits": key.modulus_bits(),
                })),
                Err(err) => fail(&ServiceError::from(err)),
            }
        }
        "session" => {
            if let Err(err) = run_session(&service) {
                eprintln!("session ended: {err}");
                process::exit(1);
            }
        }
        _ => print_usage(),
    }
}
