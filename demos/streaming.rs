//! Feed a parser in arbitrary chunks and collect warnings.
//!
//! Run with: cargo run --example streaming

use initree::{Parser, ParserOptions};
use std::error::Error;

fn main() -> Result<(), Box<dyn Error>> {
    let chunks = ["[sens", "ors]\ntemp", " = 21.5\nthis line is bro", "ken\nhum", "idity = 40"];

    let mut warnings = Vec::new();
    let mut parser = Parser::new(ParserOptions::new())
        .with_warn_handler(|msg, offset| warnings.push(format!("offset {}: {}", offset, msg)));

    for chunk in chunks {
        parser.feed(chunk)?;
        println!("fed {:?}, {} characters so far", chunk, parser.offset());
    }
    parser.finish()?;
    let tree = parser.into_tree()?;

    println!("\ntemp = {:?}", tree.get("sensors", "temp"));
    println!("humidity = {:?}", tree.get("sensors", "humidity"));

    println!("\nWarnings:");
    for warning in &warnings {
        println!("  {}", warning);
    }

    Ok(())
}
