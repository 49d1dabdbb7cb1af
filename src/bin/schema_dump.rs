// Schema Dump - print every collection definition as JSON

use blogsite_store::schemas::create_schema_registry;

fn main() -> anyhow::Result<()> {
    let registry = create_schema_registry();
    registry
        .validate()
        .map_err(|errors| anyhow::anyhow!("Invalid schemas: {}", errors.join("; ")))?;

    let definitions: Vec<_> = registry.definitions().collect();
    println!("{}", serde_json::to_string_pretty(&definitions)?);
    Ok(())
}
