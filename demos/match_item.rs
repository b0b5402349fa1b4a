//! Example: find recipients for an inventory item.
//!
//! Run with: `cargo run --example match_item`
//!
//! The backend is taken from `PANTRYLINK_*` variables (a `.env` file is
//! loaded if present). Set `PANTRYLINK_BACKEND=mock` to run without a model;
//! the mock replies with an empty list, so the fallback suggestions appear.

use chrono::NaiveDate;
use pantrylink::types::{Condition, PickupLocation};
use pantrylink::{
    suggest_matches_for_item, ExecCtxBuilder, FoodItem, FoodItemStatus, Fired, Inventory,
    InvocationTrigger, Session,
};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenv::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let ctx = ExecCtxBuilder::from_env()?.build()?;
    println!("Using {:?}", ctx);

    let mut inventory = Inventory::new();
    inventory.insert(FoodItem {
        id: "item-001".into(),
        name: "Organic Carrots".into(),
        category: "Produce".into(),
        weight_kg: 5.0,
        condition: Condition::Fresh,
        expiration_date: NaiveDate::from_ymd_opt(2024, 8, 1).ok_or("bad date")?,
        storage_temp: "refrigerated".into(),
        allergens: vec![],
        dietary_tags: vec!["vegetarian".into(), "vegan".into()],
        pickup_location: PickupLocation {
            latitude: 40.7128,
            longitude: -74.006,
            address: "123 Main St, New York, NY".into(),
        },
        status: FoodItemStatus::Stored,
        donor_id: "donor-1".into(),
        recipient_id: None,
    })?;

    let session = Session::default();
    let trigger = InvocationTrigger::new();
    let item = inventory.get("item-001")?.clone();

    match trigger.fire(suggest_matches_for_item(&ctx, &session, &item)).await {
        Fired::Done(Ok(outcome)) => {
            if outcome.is_degraded() {
                println!("(showing sample suggestions: {:?})", outcome.diagnostics.violation);
            }
            for m in outcome.value.matches() {
                println!("{:>5.1}  {:<24} {}", m.match_score, m.recipient_id, m.reason);
            }
            if let Some(best) = outcome.value.best() {
                inventory.allocate(&item.id, best.recipient_id.clone())?;
                println!("Allocated {} to {}", item.name, best.recipient_id);
            }
        }
        Fired::Done(Err(e)) => {
            eprintln!("Failed to fetch recipient matches: {}", e);
            if e.is_retryable() {
                eprintln!("Please try again.");
            }
        }
        Fired::Busy | Fired::Stale => {}
    }

    println!("Trigger state: {:?}", trigger.state());
    Ok(())
}
