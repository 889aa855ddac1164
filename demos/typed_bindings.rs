//! Typed access to a file through IniMapper and bindings.
//!
//! Run with: cargo run --example typed_bindings

use chrono::NaiveDate;
use initree::{FileStore, IniMapper};
use std::error::Error;

fn main() -> Result<(), Box<dyn Error>> {
    let path = std::env::temp_dir().join("initree-typed-bindings.ini");
    std::fs::write(
        &path,
        "[license]\nowner = ACME\nexpires = 2025-12-31\n[limits]\nseats = 25\n",
    )?;

    let mut mapper = IniMapper::new(FileStore::new(&path))?;

    let owner = mapper.bind::<String>("license", "owner")?;
    let expires = mapper.bind_path::<NaiveDate>("license:expires")?;
    let seats = mapper.bind_path::<u32>("limits:seats")?;
    let trial = mapper
        .bind_path::<bool>("license:trial")?
        .with_default(|| false);

    println!("owner   = {}", owner.get(&mut mapper)?);
    println!("expires = {}", expires.get(&mut mapper)?);
    println!("trial   = {}", trial.get(&mut mapper)?);

    let current = seats.get(&mut mapper)?;
    seats.set(&mut mapper, &(current + 5))?;
    mapper.store()?;

    println!("\nStored:\n{}", std::fs::read_to_string(&path)?);
    std::fs::remove_file(&path)?;

    Ok(())
}
