//! Example: structure a free-text needs description.
//!
//! Run with: `cargo run --example assess_needs`
//!
//! Uses a scripted backend: the first reply is a well-formed assessment
//! wrapped in prose, the second is unusable and triggers the fallback.

use pantrylink::events::{Event, FnEventHandler};
use pantrylink::{assess_needs, AssessmentRequest, ExecCtx, MockBackend, MockReply};
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenv::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let mock = MockBackend::new(vec![
        MockReply::Text(
            r#"Sure, here is the assessment:
{"dietaryRestrictions": ["gluten-free"], "foodPreferences": ["rice", "beans"],
 "urgencyLevel": "high", "notes": "Single parent, no income this month."}"#
                .into(),
        ),
        MockReply::Text("I'm not sure.".into()),
    ]);

    let ctx = ExecCtx::builder("http://unused")
        .backend(Arc::new(mock))
        .event_handler(Arc::new(FnEventHandler(|event: Event| match event {
            Event::Fallback { operation, reason } => println!("[{}] fallback: {}", operation, reason),
            Event::FlowEnd { operation, ok, degraded } => {
                println!("[{}] done ok={} degraded={}", operation, ok, degraded)
            }
            _ => {}
        })))
        .build()?;

    let descriptions = [
        "Single parent with two kids, celiac. We ran out of food yesterday.",
        "Family of four, two young children, no peanuts please.",
    ];

    for text in descriptions {
        let request = AssessmentRequest::new(text)?;
        let outcome = assess_needs(&ctx, &request).await?;
        let a = &outcome.value;
        println!("Restrictions: {}", a.dietary_restrictions.join(", "));
        println!("Preferences:  {}", a.food_preferences.join(", "));
        println!("Urgency:      {}", a.urgency_level);
        println!("Notes:        {}\n", a.notes);
    }

    Ok(())
}
