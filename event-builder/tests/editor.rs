//! Editor flows: form fields, schedule, quick links and module rendering
//! driven through the action layer.

#![allow(clippy::unwrap_used, clippy::panic)]

use chrono::{Duration, TimeZone, Utc};
use event_builder::gateway::GatewayCall;
use event_builder::{
    render_module, CustomModule, DateRangeDraft, EventActions, EventDraft, EventEnvironment,
    FieldController, FieldEdit, FieldKey, GatewayLatency, MockBackend, ModuleId, ModuleKind,
    ModuleView, NewEvent, Privacy, QuickLinkCatalog, RenderContext, ScheduleError,
};
use event_builder_core::environment::Clock;
use event_builder_testing::{epoch, init_test_tracing, stepping_clock, SequentialIdGenerator};
use std::sync::Arc;

fn setup() -> (EventActions, Arc<MockBackend>) {
    init_test_tracing();
    let clock: Arc<dyn Clock> = Arc::new(stepping_clock());
    let gateway = MockBackend::new()
        .with_clock(Arc::clone(&clock))
        .with_ids(Arc::new(SequentialIdGenerator::new()))
        .with_latency(GatewayLatency::none())
        .shared();
    let actions = EventActions::new(EventEnvironment::new(clock, gateway.clone()))
        .with_ids(Arc::new(SequentialIdGenerator::new()));
    (actions, gateway)
}

#[tokio::test]
async fn edits_before_first_save_stay_local() {
    let (actions, gateway) = setup();

    let sent = FieldController::apply_edit(&actions, FieldEdit::Capacity("50".into()))
        .await
        .unwrap();

    assert!(!sent);
    assert!(gateway.calls().is_empty());
    assert!(actions.events().await.is_empty());
}

#[tokio::test]
async fn saving_a_draft_creates_then_updates() {
    let (actions, gateway) = setup();
    let mut draft = EventDraft {
        phone_number: " 555-0100 ".to_string(),
        title: "Launch Party".to_string(),
        location: "Rooftop".to_string(),
        ..EventDraft::default()
    };

    let created = FieldController::save_draft(&actions, &draft)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(created.phone_number.as_deref(), Some("555-0100"));
    assert_eq!(created.title, "Launch Party");
    assert_eq!(created.location.as_deref(), Some("Rooftop"));

    draft.title = "Launch Party II".to_string();
    draft.location = String::new();
    let updated = FieldController::save_draft(&actions, &draft)
        .await
        .unwrap()
        .unwrap();

    assert_eq!(updated.id, created.id);
    assert_eq!(updated.title, "Launch Party II");
    // Blank draft fields leave saved values alone
    assert_eq!(updated.location.as_deref(), Some("Rooftop"));
    assert_eq!(actions.events().await.len(), 1);
    assert_eq!(gateway.calls().len(), 2);
}

#[tokio::test]
async fn draft_without_phone_number_is_not_saved() {
    let (actions, gateway) = setup();
    let mut draft = EventDraft {
        phone_number: "   ".to_string(),
        title: "Launch Party".to_string(),
        ..EventDraft::default()
    };

    let saved = FieldController::save_draft(&actions, &draft).await.unwrap();
    assert_eq!(saved, None);
    assert!(gateway.calls().is_empty());
    assert!(actions.events().await.is_empty());

    // Same guard once the event exists
    draft.phone_number = "555-0100".to_string();
    let created = FieldController::save_draft(&actions, &draft)
        .await
        .unwrap()
        .unwrap();
    draft.phone_number = String::new();
    draft.title = "Renamed".to_string();
    assert_eq!(FieldController::save_draft(&actions, &draft).await.unwrap(), None);
    assert_eq!(gateway.calls().len(), 1);
    assert_eq!(actions.current_event().await.unwrap().title, created.title);
}

#[tokio::test]
async fn blank_title_saves_as_untitled() {
    let (actions, _) = setup();
    let draft = EventDraft {
        phone_number: "555-0100".to_string(),
        ..EventDraft::default()
    };
    let event = FieldController::save_draft(&actions, &draft)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(event.title, "Untitled Event");

    FieldController::apply_edit(&actions, FieldEdit::Title(String::new()))
        .await
        .unwrap();
    assert_eq!(actions.current_event().await.unwrap().title, "Untitled Event");
}

#[tokio::test]
async fn added_fields_survive_reloads() {
    let (actions, _) = setup();
    let mut fields = FieldController::new();
    let event = actions.create_event(NewEvent::new("A", "")).await.unwrap();
    fields.load(Some(&event));
    assert!(FieldKey::ALL.into_iter().all(|k| !fields.is_used(k)));

    assert!(fields.add(FieldKey::Capacity));
    assert_eq!(fields.press("privacy"), Some(FieldKey::Privacy));
    FieldController::apply_edit(&actions, FieldEdit::Privacy(Privacy::InviteOnly))
        .await
        .unwrap();

    // Clearing capacity and reloading does not bring the button back
    FieldController::apply_edit(&actions, FieldEdit::Capacity(String::new()))
        .await
        .unwrap();
    let current = actions.current_event().await.unwrap();
    assert_eq!(current.capacity, None);
    fields.load(Some(&current));
    fields.load(None);

    assert!(fields.is_used(FieldKey::Capacity));
    assert!(fields.is_used(FieldKey::Privacy));
    assert_eq!(
        FieldController::summary(FieldKey::Privacy, Some(&current)),
        "Invite only"
    );
    assert!(!fields.available().contains(&FieldKey::Capacity));
    assert_eq!(fields.available().len(), 6);
}

#[tokio::test]
async fn loading_a_populated_event_marks_its_fields() {
    let (actions, _) = setup();
    let event = actions.create_event(NewEvent::new("A", "")).await.unwrap();
    FieldController::apply_edit(
        &actions,
        FieldEdit::PhotoGallery(vec!["a.jpg".into(), "b.jpg".into(), "c.jpg".into()]),
    )
    .await
    .unwrap();
    let current = actions.event(&event.id).await.unwrap();

    let mut fields = FieldController::new();
    fields.load(Some(&current));

    assert!(fields.is_used(FieldKey::PhotoGallery));
    assert!(fields.is_visible(FieldKey::PhotoGallery));
    assert_eq!(
        FieldController::summary(FieldKey::PhotoGallery, Some(&current)),
        "3 photos"
    );
    assert_eq!(
        fields.visible_buttons(),
        vec![FieldKey::Capacity, FieldKey::Links, FieldKey::Privacy]
    );
    assert!(fields.toggle_expanded());
    assert_eq!(fields.visible_buttons().len(), 7);
    assert_eq!(fields.hidden_count(), 0);
}

#[tokio::test]
async fn schedule_rejects_end_before_start() {
    let (actions, _) = setup();
    actions.create_event(NewEvent::new("A", "")).await.unwrap();
    let start = Utc.with_ymd_and_hms(2025, 6, 1, 19, 0, 0).unwrap();

    let mut schedule = DateRangeDraft::open(None, start, Duration::hours(2));
    schedule.set_end(Utc.with_ymd_and_hms(2025, 6, 1, 18, 0, 0).unwrap());
    assert_eq!(schedule.commit(), Err(ScheduleError::EndBeforeStart));
    assert_eq!(
        schedule.error().unwrap().to_string(),
        "End date/time must be after start date/time"
    );

    schedule.set_end(Utc.with_ymd_and_hms(2025, 6, 1, 21, 0, 0).unwrap());
    let date_time = schedule.commit().unwrap();
    FieldController::apply_edit(&actions, FieldEdit::DateTime(Some(date_time)))
        .await
        .unwrap();

    assert_eq!(actions.current_event().await.unwrap().date_time, Some(start));
}

#[tokio::test]
async fn rsvp_quick_link_renders_rsvp_form() {
    let (actions, gateway) = setup();
    let event = actions.create_event(NewEvent::new("A", "")).await.unwrap();
    let catalog = QuickLinkCatalog::load(gateway.as_ref()).await.unwrap();
    let link = catalog.by_kind(&ModuleKind::Rsvp).unwrap();

    let module = actions.add_quick_link_to_event(&event.id, link).await.unwrap();

    let stored = actions.current_event().await.unwrap();
    assert_eq!(stored.modules, vec![module]);
    let view = render_module(&stored.modules[0], &RenderContext::at(epoch()));
    assert!(matches!(view, ModuleView::Rsvp { .. }));
    assert!(gateway.calls().contains(&GatewayCall::GetQuickLinks));
}

#[tokio::test]
async fn every_catalog_entry_renders_a_real_view() {
    let (actions, gateway) = setup();
    let event = actions.create_event(NewEvent::new("A", "")).await.unwrap();
    let catalog = QuickLinkCatalog::load(gateway.as_ref()).await.unwrap();

    for link in catalog.links() {
        actions.add_quick_link_to_event(&event.id, link).await.unwrap();
    }

    let current = actions.current_event().await.unwrap();
    let ctx = RenderContext::at(epoch()).with_event_start(Some(epoch() + Duration::days(1)));
    assert_eq!(current.modules.len(), catalog.len());
    for module in &current.modules {
        assert!(!render_module(module, &ctx).is_placeholder());
    }
}

#[tokio::test]
async fn unknown_module_code_is_kept_and_rendered_as_placeholder() {
    let (actions, _) = setup();
    let event = actions.create_event(NewEvent::new("A", "")).await.unwrap();
    let module = CustomModule {
        id: ModuleId::new("module-poll"),
        module_type: "poll".to_string(),
        code: ModuleKind::from_code("poll-module"),
        config: serde_json::Map::new(),
    };

    actions.add_module_to_event(&event.id, module).await.unwrap();

    let stored = actions.event(&event.id).await.unwrap();
    match render_module(&stored.modules[0], &RenderContext::at(epoch())) {
        ModuleView::Unknown { code, message } => {
            assert_eq!(code, "poll-module");
            assert!(message.contains("poll-module"));
        },
        other => panic!("expected placeholder, got {other:?}"),
    }
}
