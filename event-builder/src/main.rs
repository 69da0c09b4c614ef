//! Event builder demo binary
//!
//! Walks through the editor's flows against the mock backend: create an
//! event, fill in optional sections, swap imagery, add modules from the
//! quick-link catalog and render them.

use anyhow::Context;
use event_builder::{
    format_date_time, render_module, BackendGateway, Config, DateRangeDraft, EventActions,
    EventDraft, EventEnvironment, FieldController, FieldEdit, FieldKey, MockBackend, ModuleView,
    Privacy, QuickLinkCatalog, RenderContext,
};
use event_builder_core::environment::{Clock, SystemClock};
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::from_env();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(&config.log_filter))
        .with(tracing_subscriber::fmt::layer())
        .init();

    println!("=== Event Builder: Editor Flows ===\n");

    let clock: Arc<dyn Clock> = Arc::new(SystemClock);
    let backend: Arc<dyn BackendGateway> = MockBackend::new()
        .with_clock(Arc::clone(&clock))
        .with_latency(config.gateway.latency())
        .shared();
    let actions = EventActions::new(EventEnvironment::new(Arc::clone(&clock), Arc::clone(&backend)))
        .with_timeout(config.gateway.action_timeout());
    let mut fields = FieldController::with_window(config.editor.button_window);

    // Flow 1: create the event from the basic details form
    println!(">>> Saving basic details");
    let mut schedule = DateRangeDraft::open(None, clock.now(), config.editor.default_duration());
    schedule.set_start(clock.now() + chrono::Duration::days(14));
    let draft = EventDraft {
        phone_number: "555-0100".to_string(),
        title: "Launch Party".to_string(),
        date_time: Some(schedule.commit().context("schedule rejected")?),
        location: "Rooftop".to_string(),
        ..EventDraft::default()
    };
    let event = FieldController::save_draft(&actions, &draft)
        .await
        .context("creating event")?
        .context("draft has no phone number")?;
    fields.load(Some(&event));
    println!("Created {} ({})", event.title, event.id);
    println!("When: {}", format_date_time(event.date_time));

    // Optional sections
    println!("\n>>> Quick-add buttons: {:?}", labels(&fields.visible_buttons()));
    fields.add(FieldKey::Capacity);
    FieldController::apply_edit(&actions, FieldEdit::Capacity("50".to_string())).await?;
    fields.add(FieldKey::Privacy);
    FieldController::apply_edit(&actions, FieldEdit::Privacy(Privacy::InviteOnly)).await?;
    println!("Buttons left: {:?}", labels(&fields.visible_buttons()));
    if fields.hidden_count() > 0 {
        println!("(+{} more behind \"show more\")", fields.hidden_count());
    }

    // Flows 2 and 3: imagery
    println!("\n>>> Updating flyer and background");
    actions.update_event_flyer(&event.id, "https://example.com/flyer.png").await?;
    actions.update_event_flyer_text(&event.id, "YOU'RE INVITED").await?;
    actions
        .update_event_background(&event.id, "https://example.com/background.jpg")
        .await?;

    // Flow 4: modules from the catalog
    println!("\n>>> Adding modules");
    let catalog = QuickLinkCatalog::load(backend.as_ref())
        .await
        .context("loading quick links")?;
    for link in catalog.links() {
        let module = actions.add_quick_link_to_event(&event.id, link).await?;
        println!("Added {} as {}", link.label, module.id);
    }

    let current = actions.current_event().await.context("no current event")?;
    let ctx = RenderContext::at(clock.now())
        .with_event_start(current.date_time)
        .with_countdown_fallback(config.editor.countdown_fallback());

    println!("\n=== {} ===", current.title);
    for key in FieldKey::ALL.into_iter().filter(|k| fields.is_visible(*k)) {
        println!("{}: {}", key.label(), FieldController::summary(key, Some(&current)));
    }
    for module in &current.modules {
        match render_module(module, &ctx) {
            ModuleView::Tickets { heading, tiers, .. } => {
                let prices: Vec<String> = tiers
                    .iter()
                    .map(|t| format!("{} {}", t.name, t.price_label()))
                    .collect();
                println!("[{heading}] {}", prices.join(", "));
            },
            ModuleView::Rsvp { heading, fields: inputs, .. } => {
                println!("[{heading}] {}", inputs.join(", "));
            },
            ModuleView::Countdown { heading, remaining, .. } => println!(
                "[{heading}] {}d {}h {}m {}s",
                remaining.days, remaining.hours, remaining.minutes, remaining.seconds
            ),
            ModuleView::Social { heading, targets } => {
                let names: Vec<&str> = targets.iter().map(|t| t.label()).collect();
                println!("[{heading}] {}", names.join(", "));
            },
            ModuleView::Unknown { message, .. } => println!("[!] {message}"),
        }
    }

    println!("\nLast updated: {}", current.updated_at.to_rfc3339());
    actions
        .shutdown(std::time::Duration::from_secs(5))
        .await
        .context("shutting down store")?;
    Ok(())
}

fn labels(keys: &[FieldKey]) -> Vec<&'static str> {
    keys.iter().map(|k| k.label()).collect()
}
