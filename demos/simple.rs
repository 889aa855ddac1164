//! Parse an INI document, edit it and write it back.
//!
//! Run with: cargo run --example simple

use initree::{encode, parse_str, Element, Entry, Item};
use std::error::Error;

const INPUT: &str = "\
; service configuration
[http]
listen = 0.0.0.0:8080
; seconds
timeout = 30

[db]
url = postgres://localhost/app
";

fn main() -> Result<(), Box<dyn Error>> {
    let mut tree = parse_str(INPUT)?;

    for element in &tree.elements {
        match element {
            Element::Comment(comment) => println!("comment: {}", comment.text),
            Element::Section(section) => {
                println!("section [{}]", section.name);
                for entry in &section.entries {
                    match entry {
                        Entry::Item(item) => println!("  {} = {}", item.key, item.value),
                        Entry::Comment(comment) => println!("  ; {}", comment.text),
                    }
                }
            }
        }
    }

    if let Some(http) = tree.section_mut("http") {
        http.set("timeout", "60");
        http.push_item(Item::new("keepalive", "true"));
    }

    let output = encode(&tree)?;
    println!("\nEncoded:\n{}", output);

    assert_eq!(parse_str(&output)?, tree);
    println!("✓ Round-trip successful");

    Ok(())
}
