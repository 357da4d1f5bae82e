//! Decode a configuration file and report the keys nothing used.
//!
//! Run with: cargo run --example decode_config

use serde::Deserialize;
use std::error::Error;
use std::time::Duration;
use tomldec::{Decoder, Primitive};

#[derive(Debug, Deserialize)]
struct Config {
    name: String,
    listen: Listen,
    backend: Vec<Backend>,
}

#[derive(Debug, Deserialize)]
struct Listen {
    port: u16,
    timeout: Duration,
}

#[derive(Debug, Deserialize)]
struct Backend {
    kind: String,
    options: Primitive,
}

#[derive(Debug, Deserialize)]
struct HttpOptions {
    url: String,
    retries: u8,
}

#[derive(Debug, Deserialize)]
struct FileOptions {
    path: String,
}

const INPUT: &str = r#"
name = "gateway"

[listen]
port = 8080
timeout = "1m30s"
backlog = 128   # not part of Listen

[[backend]]
kind = "http"
options = { url = "http://10.0.0.1", retries = 3 }

[[backend]]
kind = "file"
options = { path = "/srv/static", mode = "ro" }
"#;

fn main() -> Result<(), Box<dyn Error>> {
    let (config, mut meta) = Decoder::new().decode::<Config>(INPUT)?;
    println!(
        "{} listening on :{} (timeout {:?})",
        config.name, config.listen.port, config.listen.timeout
    );

    for backend in &config.backend {
        match backend.kind.as_str() {
            "http" => {
                let opts: HttpOptions = meta.decode_primitive(&backend.options)?;
                println!("  http backend {} ({} retries)", opts.url, opts.retries);
            }
            "file" => {
                let opts: FileOptions = meta.decode_primitive(&backend.options)?;
                println!("  file backend {}", opts.path);
            }
            other => println!("  unknown backend kind {other:?}"),
        }
    }

    for key in meta.undecoded() {
        println!("warning: unused key {key}");
    }

    // The same document, rejected by strict mode.
    if let Err(err) = Decoder::new().deny_unknown_keys(true).decode::<Config>(INPUT) {
        println!("\n{}", err.with_position());
    }

    // A type error, with guidance.
    let bad = INPUT.replace("port = 8080", "port = 80800");
    if let Err(err) = Decoder::new().decode::<Config>(&bad) {
        println!("{}", err.with_usage());
    }
    Ok(())
}
