use std::env;
use std::process;

use anyhow::{Context, Result};

// Usage: regex-literal '/pattern/flags'
fn main() -> Result<()> {
    let literal = env::args()
        .nth(1)
        .context("expected a regex literal as the first argument")?;

    match regex_literal::parse(&literal) {
        Ok(tree) => {
            println!("{tree:#?}");
            Ok(())
        }
        Err(err) => {
            eprintln!("{literal}: {err}");
            process::exit(1);
        }
    }
}
