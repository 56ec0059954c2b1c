mod extract;
mod models;
mod parse;
mod rank;
mod scrapers;
mod search;

use models::SearchCriteria;
use search::SearchOrchestrator;
use serde_json::json;
use tracing::{info, Level};
use tracing_subscriber;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_max_level(Level::INFO)
        .init();

    info!("🏛  Asta Scout - Italian auction listing aggregator");
    info!("==================================================");

    let criteria = SearchCriteria {
        max_price: Some(150_000.0),
        min_size: Some(70.0),
        location: Some("Reggio Emilia".to_string()),
        tenancy_type: None,
        condition: Some("Abitabile".to_string()),
        property_kind: Some("Appartamento".to_string()),
    };

    let orchestrator = SearchOrchestrator::with_default_sources()?;

    info!("Searching auction portals...");
    let listings = orchestrator.search(&criteria).await;

    // Score against the criteria and rank best-first.
    let mut scored: Vec<_> = listings
        .into_iter()
        .map(|listing| {
            let score = rank::match_score(&listing, &criteria);
            (score, listing)
        })
        .collect();
    scored.sort_by(|a, b| b.0.cmp(&a.0));

    info!("\n✅ Found {} listings\n", scored.len());

    for (i, (score, listing)) in scored.iter().take(5).enumerate() {
        println!("{}. {} (score {})", i + 1, listing.title, score);
        println!("   Prezzo: €{:.0}", listing.price);
        println!("   Superficie: {} m²", listing.size);
        if let Some(ppm) = listing.price_per_m2 {
            println!("   Prezzo €/m²: €{ppm}");
        }
        println!("   Località: {}", listing.location);
        println!("   Tipologia: {}", listing.kind);
        println!("   Stato: {}", listing.condition);
        println!("   Data asta: {}", listing.auction_date);
        println!("   URL: {}", listing.url);
        println!();
    }

    // Dump the full scored set for inspection.
    let dump: Vec<_> = scored
        .iter()
        .map(|(score, listing)| json!({ "matchScore": score, "listing": listing }))
        .collect();
    let json = serde_json::to_string_pretty(&dump)?;
    tokio::fs::write("results.json", json).await?;
    info!("💾 Saved {} scored listings to results.json", scored.len());

    Ok(())
}
