// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

//! Portier CLI - authenticated requests from the terminal
//!
//! The token is kept in a JSON file between runs, so `login` once and the
//! following `get`/`post` calls are authenticated.

use std::env;
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::Context;
use serde_json::Value;

use portier::{ClientConfig, ConsolePrompt, FileStorage, RequestClient};

#[tokio::main]
async fn main() -> ExitCode {
    // Initialize logging
    let mut filter = tracing_subscriber::EnvFilter::from_default_env();
    if let Ok(directive) = "portier=info".parse() {
        filter = filter.add_directive(directive);
    }
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let args: Vec<String> = env::args().collect();

    if args.len() < 2 {
        print_usage();
        return ExitCode::from(1);
    }

    match args[1].as_str() {
        "--help" | "-h" | "help" => {
            print_usage();
            return ExitCode::SUCCESS;
        }
        "--version" | "-v" | "version" => {
            println!("portier {}", portier::VERSION);
            return ExitCode::SUCCESS;
        }
        _ => {}
    }

    let client = match build_client() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Failed to create client: {:#}", e);
            return ExitCode::from(1);
        }
    };

    match args[1].as_str() {
        "get" => {
            if args.len() < 3 {
                eprintln!("Usage: portier get <url>");
                return ExitCode::from(1);
            }
            report(client.get(&args[2]).await)
        }
        "post" => {
            if args.len() < 4 {
                eprintln!("Usage: portier post <url> <json>");
                return ExitCode::from(1);
            }
            match parse_json(&args[3]) {
                Ok(body) => report(client.post(&args[2], &body).await),
                Err(code) => code,
            }
        }
        "login" => {
            if args.len() < 3 {
                eprintln!("Usage: portier login <json>");
                return ExitCode::from(1);
            }
            match parse_json(&args[2]) {
                Ok(body) => report(client.login(&body).await),
                Err(code) => code,
            }
        }
        "logout" => match client.logout() {
            Ok(()) => {
                println!("Logged out");
                ExitCode::SUCCESS
            }
            Err(e) => {
                eprintln!("Logout failed: {}", e);
                ExitCode::from(1)
            }
        },
        "token" => match client.session().token() {
            Some(token) => {
                println!("{}", token);
                ExitCode::SUCCESS
            }
            None => {
                eprintln!("Not logged in");
                ExitCode::from(1)
            }
        },
        cmd => {
            eprintln!("Unknown command: {}", cmd);
            print_usage();
            ExitCode::from(1)
        }
    }
}

fn print_usage() {
    println!(
        r#"Portier - Authenticated HTTP client

USAGE:
    portier <COMMAND> [ARGS]

COMMANDS:
    get <url>            GET a path or URL and print the payload
    post <url> <json>    POST a JSON body and print the payload
    login <json>         POST credentials to /api/auth/login and keep the token
    logout               Forget the stored token
    token                Print the stored token
    help                 Show this help message
    version              Show version information

ENVIRONMENT:
    PORTIER_BASE_URL     Base URL for relative paths
    PORTIER_TIMEOUT_MS   Request timeout (default 30000)
    PORTIER_STORAGE      Token storage file (default portier-storage.json)

EXAMPLES:
    portier login '{{"username":"demo","password":"demo"}}'
    portier get /api/data
    portier post /api/items '{{"name":"widget"}}'
"#
    );
}

fn build_client() -> anyhow::Result<RequestClient> {
    let config = ClientConfig::from_env().context("invalid PORTIER_* environment")?;
    let storage = FileStorage::open(&config.storage_path)
        .with_context(|| format!("cannot open {}", config.storage_path.display()))?;

    let client = RequestClient::builder()
        .config(config)
        .storage(Arc::new(storage))
        .prompt(Arc::new(ConsolePrompt))
        .build()?;
    Ok(client)
}

fn parse_json(raw: &str) -> Result<Value, ExitCode> {
    serde_json::from_str(raw).map_err(|e| {
        eprintln!("Invalid JSON body: {}", e);
        ExitCode::from(1)
    })
}

fn report(result: portier::Result<Value>) -> ExitCode {
    match result {
        Ok(payload) => {
            match serde_json::to_string_pretty(&payload) {
                Ok(pretty) => println!("{}", pretty),
                Err(_) => println!("{}", payload),
            }
            ExitCode::SUCCESS
        }
        Err(e) if e.is_authentication_required() || e.is_auth_expired() => {
            eprintln!("{}", e);
            ExitCode::from(2)
        }
        Err(e) => {
            eprintln!("Request failed: {}", e);
            ExitCode::from(1)
        }
    }
}
