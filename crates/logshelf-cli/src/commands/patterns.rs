use anyhow::Result;
use logshelf_security::PatternRegistry;

pub fn handle(json: bool) -> Result<()> {
    let registry = PatternRegistry::builtin();
    let tags: Vec<&str> = registry.tags().collect();

    if json {
        println!("{}", serde_json::to_string_pretty(&tags)?);
        return Ok(());
    }

    println!("Patterns ({}, in match order):", tags.len());
    for (i, tag) in tags.iter().enumerate() {
        println!("  {:>2}. {}", i + 1, tag);
    }
    Ok(())
}
