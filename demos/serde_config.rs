//! Load an application config struct from INI text with Serde.
//!
//! Run with: cargo run --example serde_config

use initree::{from_str, to_string};
use serde::{Deserialize, Serialize};
use std::error::Error;

#[derive(Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "lowercase")]
enum Mode {
    Development,
    Production,
}

#[derive(Debug, Serialize, Deserialize, PartialEq)]
struct App {
    name: String,
    mode: Mode,
    features: Vec<String>,
}

#[derive(Debug, Serialize, Deserialize, PartialEq)]
struct Cache {
    enabled: bool,
    ttl_seconds: u64,
    max_entries: Option<usize>,
}

#[derive(Debug, Serialize, Deserialize, PartialEq)]
struct Config {
    app: App,
    cache: Cache,
}

const INPUT: &str = "\
[app]
name = inventory
mode = production
features = search, export
; comments are ignored by Serde
[cache]
enabled = yes
ttl_seconds = 300
";

fn main() -> Result<(), Box<dyn Error>> {
    let config: Config = from_str(INPUT)?;
    println!("{:#?}\n", config);

    let output = to_string(&config)?;
    println!("Serialized:\n{}", output);

    let back: Config = from_str(&output)?;
    assert_eq!(back, config);
    println!("✓ Round-trip successful");

    Ok(())
}
