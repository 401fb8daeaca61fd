//! Run with: cargo run --bin cleanup

use colorsplash::config::database::{Connection, DatabaseConfig};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let config = DatabaseConfig::from_env()?;

    println!("Connecting to MongoDB...");
    let connection = Connection::open(&config).await?;
    let db = connection.database();

    println!("Dropping {} collection...", config.collection);
    connection.collection().drop().await?;
    println!("✓ {} collection dropped", config.collection);

    println!("\nCollections remaining in {}:", db.name());
    let collections = db.list_collection_names().await?;
    for name in collections {
        println!("  - {}", name);
    }

    println!("\n✓ Cleanup complete!");
    Ok(())
}
