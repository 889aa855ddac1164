//! Strict parsing, quoted values and CRLF output.
//!
//! Run with: cargo run --example custom_options

use initree::{
    encode_with_options, parse_with_options, EncodeOptions, Feature, LineEnding, ParserOptions,
};
use std::error::Error;

const INPUT: &str = "\
[banner]
text = \"Welcome!\\n\\tEnjoy your stay \\u263A\"
oops
";

fn main() -> Result<(), Box<dyn Error>> {
    // Lenient: the malformed line is dropped
    let lenient = ParserOptions::new().with_wrapped_value(true);
    let tree = parse_with_options(INPUT, lenient)?;
    println!("banner text: {:?}\n", tree.get("banner", "text"));

    // Strict: the same line is an error
    let strict: ParserOptions = [Feature::Strict, Feature::WrappedValue].into_iter().collect();
    match parse_with_options(INPUT, strict) {
        Ok(_) => println!("strict parse unexpectedly succeeded"),
        Err(e) => println!("strict parse failed: {}\n", e),
    }

    // Values with line breaks are only written when wrapping is enabled
    match encode_with_options(&tree, EncodeOptions::new()) {
        Ok(_) => println!("plain encode unexpectedly succeeded"),
        Err(e) => println!("plain encode failed: {}\n", e),
    }

    let options = EncodeOptions::new()
        .with_wrap_values(true)
        .with_line_ending(LineEnding::Crlf);
    let output = encode_with_options(&tree, options)?;
    println!("Wrapped, CRLF:\n{:?}", output);

    Ok(())
}
