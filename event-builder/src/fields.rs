//! Optional form sections and the quick-add buttons that reveal them.
//!
//! Each [`FieldKey`] starts unused. Pressing its button, or loading an event
//! where the field already has a value, marks it used: the row is shown and
//! the button is gone for the rest of the session. Clearing the value later
//! does not bring the button back.
//!
//! Edits to the current event go through [`FieldController::apply_edit`],
//! which turns the form value into an [`EventPatch`] and hands it to the
//! action layer.

use crate::actions::EventActions;
use crate::error::ActionError;
use crate::types::{Event, EventPatch, Link, NewEvent, Privacy, Section};
use chrono::{DateTime, Utc};
use std::collections::BTreeSet;

/// Title used when the host leaves it blank
pub const UNTITLED_EVENT: &str = "Untitled Event";

/// Buttons shown before the expand toggle
pub const DEFAULT_BUTTON_WINDOW: usize = 3;

/// Optional sections a host can add to the form, in button order
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum FieldKey {
    /// Maximum attendees
    Capacity,
    /// Photo gallery
    PhotoGallery,
    /// Links
    Links,
    /// Privacy picker
    Privacy,
    /// Questionnaires
    Questionnaires,
    /// Announcements
    Announcements,
    /// Personal invites
    Invite,
    /// Custom sections
    NewSections,
}

impl FieldKey {
    /// Every key, in button order
    pub const ALL: [Self; 8] = [
        Self::Capacity,
        Self::PhotoGallery,
        Self::Links,
        Self::Privacy,
        Self::Questionnaires,
        Self::Announcements,
        Self::Invite,
        Self::NewSections,
    ];

    /// Button id, matching the event's field name
    #[must_use]
    pub const fn id(self) -> &'static str {
        match self {
            Self::Capacity => "capacity",
            Self::PhotoGallery => "photoGallery",
            Self::Links => "links",
            Self::Privacy => "privacy",
            Self::Questionnaires => "questionnaires",
            Self::Announcements => "announcements",
            Self::Invite => "invite",
            Self::NewSections => "newSections",
        }
    }

    /// Looks a key up by button id
    #[must_use]
    pub fn from_id(id: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|key| key.id() == id)
    }

    /// Button label, also the row placeholder
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Capacity => "Capacity",
            Self::PhotoGallery => "Photo gallery",
            Self::Links => "Links",
            Self::Privacy => "Privacy",
            Self::Questionnaires => "Questionnaires",
            Self::Announcements => "Announcements",
            Self::Invite => "Invite",
            Self::NewSections => "New Sections",
        }
    }

    /// One-line pitch shown in the button list
    #[must_use]
    pub const fn description(self) -> &'static str {
        match self {
            Self::Capacity => "Set the maximum number of attendees for your event.",
            Self::PhotoGallery => "Add photos for guests to view and relive the vibe.",
            Self::Links => "Share links to event guides, menus, playlists, and more.",
            Self::Privacy => "Control who can see and join your event.",
            Self::Questionnaires => {
                "Create questionnaires for your event. Hosts can create questions and view responses."
            },
            Self::Announcements => "Send updates and announcements to your event guests.",
            Self::Invite => "Personally invite each and every guest within seconds.",
            Self::NewSections => {
                "Add a custom section to showcase anything you want on your event page."
            },
        }
    }

    /// `true` if `event` has a value for this field
    ///
    /// Strings count when non-empty, collections when they have an entry,
    /// privacy whenever it is set.
    #[must_use]
    pub fn is_populated(self, event: &Event) -> bool {
        fn text(value: Option<&String>) -> bool {
            value.is_some_and(|v| !v.is_empty())
        }
        fn list<T>(value: Option<&Vec<T>>) -> bool {
            value.is_some_and(|v| !v.is_empty())
        }

        match self {
            Self::Capacity => text(event.capacity.as_ref()),
            Self::PhotoGallery => list(event.photo_gallery.as_ref()),
            Self::Links => list(event.links.as_ref()),
            Self::Privacy => event.privacy.is_some(),
            Self::Questionnaires => text(event.questionnaires.as_ref()),
            Self::Announcements => list(event.announcements.as_ref()),
            Self::Invite => text(event.invite.as_ref()),
            Self::NewSections => list(event.new_sections.as_ref()),
        }
    }
}

impl std::fmt::Display for FieldKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.id())
    }
}

fn counted(n: usize, noun: &str) -> String {
    if n == 1 {
        format!("{n} {noun}")
    } else {
        format!("{n} {noun}s")
    }
}

fn non_empty(value: String) -> Option<String> {
    (!value.is_empty()).then_some(value)
}

fn non_empty_list<T>(value: Vec<T>) -> Option<Vec<T>> {
    (!value.is_empty()).then_some(value)
}

/// A single form edit on the current event
#[derive(Clone, Debug, PartialEq)]
pub enum FieldEdit {
    /// Title input; blank becomes [`UNTITLED_EVENT`]
    Title(String),
    /// Date editor result
    DateTime(Option<DateTime<Utc>>),
    /// Location input
    Location(String),
    /// Cost per person input
    CostPerPerson(String),
    /// Description input; blank is kept as empty
    Description(String),
    /// Capacity input
    Capacity(String),
    /// Gallery editor result
    PhotoGallery(Vec<String>),
    /// Links editor result
    Links(Vec<Link>),
    /// Privacy picker result
    Privacy(Privacy),
    /// Questionnaires input
    Questionnaires(String),
    /// Announcements editor result
    Announcements(Vec<String>),
    /// Invite input
    Invite(String),
    /// Sections editor result
    NewSections(Vec<Section>),
}

impl FieldEdit {
    /// The patch this edit sends
    ///
    /// Blank optional text and empty collections clear the field.
    #[must_use]
    pub fn into_patch(self) -> EventPatch {
        let patch = EventPatch::new();
        match self {
            Self::Title(title) => {
                patch.title(non_empty(title).unwrap_or_else(|| UNTITLED_EVENT.to_string()))
            },
            Self::DateTime(date_time) => EventPatch {
                date_time: Some(date_time),
                ..patch
            },
            Self::Location(value) => EventPatch {
                location: Some(non_empty(value)),
                ..patch
            },
            Self::CostPerPerson(value) => EventPatch {
                cost_per_person: Some(non_empty(value)),
                ..patch
            },
            Self::Description(value) => patch.description(value),
            Self::Capacity(value) => EventPatch {
                capacity: Some(non_empty(value)),
                ..patch
            },
            Self::PhotoGallery(photos) => EventPatch {
                photo_gallery: Some(non_empty_list(photos)),
                ..patch
            },
            Self::Links(links) => EventPatch {
                links: Some(non_empty_list(links)),
                ..patch
            },
            Self::Privacy(privacy) => patch.privacy(privacy),
            Self::Questionnaires(value) => EventPatch {
                questionnaires: Some(non_empty(value)),
                ..patch
            },
            Self::Announcements(items) => EventPatch {
                announcements: Some(non_empty_list(items)),
                ..patch
            },
            Self::Invite(value) => EventPatch {
                invite: Some(non_empty(value)),
                ..patch
            },
            Self::NewSections(sections) => EventPatch {
                new_sections: Some(non_empty_list(sections)),
                ..patch
            },
        }
    }
}

/// The basic-details form, saved in one go
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct EventDraft {
    /// Host phone number
    pub phone_number: String,
    /// Title
    pub title: String,
    /// Description
    pub description: String,
    /// Start instant
    pub date_time: Option<DateTime<Utc>>,
    /// Location
    pub location: String,
    /// Cost per person
    pub cost_per_person: String,
    /// Capacity
    pub capacity: String,
}

impl EventDraft {
    /// Fields for creating a new event
    #[must_use]
    pub fn to_new_event(&self) -> NewEvent {
        let title = non_empty(self.title.clone()).unwrap_or_else(|| UNTITLED_EVENT.to_string());
        let details = EventPatch {
            phone_number: Some(non_empty(self.phone_number.trim().to_string())),
            date_time: Some(self.date_time),
            location: Some(non_empty(self.location.clone())),
            cost_per_person: Some(non_empty(self.cost_per_person.clone())),
            capacity: Some(non_empty(self.capacity.clone())),
            ..EventPatch::default()
        };
        NewEvent::new(title, self.description.clone()).with_details(details)
    }

    /// Patch for an existing event; blank draft fields leave values alone
    #[must_use]
    pub fn to_patch(&self) -> EventPatch {
        EventPatch {
            title: non_empty(self.title.clone()),
            description: non_empty(self.description.clone()),
            phone_number: non_empty(self.phone_number.trim().to_string()).map(Some),
            date_time: self.date_time.map(Some),
            location: non_empty(self.location.clone()).map(Some),
            cost_per_person: non_empty(self.cost_per_person.clone()).map(Some),
            capacity: non_empty(self.capacity.clone()).map(Some),
            ..EventPatch::default()
        }
    }
}

/// Which optional rows are shown and which buttons remain
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FieldController {
    used: BTreeSet<FieldKey>,
    expanded: bool,
    window: usize,
}

impl Default for FieldController {
    fn default() -> Self {
        Self::new()
    }
}

impl FieldController {
    /// Nothing used, three buttons shown
    #[must_use]
    pub const fn new() -> Self {
        Self::with_window(DEFAULT_BUTTON_WINDOW)
    }

    /// Nothing used, `window` buttons shown before expanding
    #[must_use]
    pub const fn with_window(window: usize) -> Self {
        Self {
            used: BTreeSet::new(),
            expanded: false,
            window,
        }
    }

    /// Marks every field `event` already has a value for as used
    ///
    /// `None` changes nothing; keys never go back to unused.
    pub fn load(&mut self, event: Option<&Event>) {
        let Some(event) = event else {
            return;
        };
        for key in FieldKey::ALL {
            if key.is_populated(event) && self.used.insert(key) {
                tracing::debug!(field = %key, event_id = %event.id, "Field already populated");
            }
        }
    }

    /// Handles a quick-add button; returns `true` the first time
    pub fn add(&mut self, key: FieldKey) -> bool {
        self.used.insert(key)
    }

    /// Routes a button press by id; unknown ids are ignored
    pub fn press(&mut self, button_id: &str) -> Option<FieldKey> {
        let Some(key) = FieldKey::from_id(button_id) else {
            tracing::debug!(button_id, "No field for button");
            return None;
        };
        self.add(key);
        Some(key)
    }

    /// `true` once the key was added or found populated
    #[must_use]
    pub fn is_used(&self, key: FieldKey) -> bool {
        self.used.contains(&key)
    }

    /// `true` if the key's input row is shown
    #[must_use]
    pub fn is_visible(&self, key: FieldKey) -> bool {
        self.is_used(key)
    }

    /// Unused keys, in button order
    #[must_use]
    pub fn available(&self) -> Vec<FieldKey> {
        FieldKey::ALL
            .into_iter()
            .filter(|key| !self.used.contains(key))
            .collect()
    }

    /// Buttons to draw: the first window, or all when expanded
    #[must_use]
    pub fn visible_buttons(&self) -> Vec<FieldKey> {
        let available = self.available();
        if self.expanded {
            available
        } else {
            available.into_iter().take(self.window).collect()
        }
    }

    /// Flips the expand toggle; returns the new state
    pub fn toggle_expanded(&mut self) -> bool {
        self.expanded = !self.expanded;
        self.expanded
    }

    /// `true` when every available button is drawn
    #[must_use]
    pub const fn is_expanded(&self) -> bool {
        self.expanded
    }

    /// Available buttons hidden behind the toggle
    #[must_use]
    pub fn hidden_count(&self) -> usize {
        self.available().len() - self.visible_buttons().len()
    }

    /// Row text: the value, a count, or the label as placeholder
    #[must_use]
    pub fn summary(key: FieldKey, event: Option<&Event>) -> String {
        let placeholder = || key.label().to_string();
        let Some(event) = event else {
            return match key {
                FieldKey::Privacy => Privacy::default().label().to_string(),
                _ => placeholder(),
            };
        };
        let text = |value: &Option<String>| {
            value
                .as_ref()
                .filter(|v| !v.is_empty())
                .cloned()
                .unwrap_or_else(placeholder)
        };
        let count = |len: usize, noun: &str| {
            if len == 0 {
                placeholder()
            } else {
                counted(len, noun)
            }
        };

        match key {
            FieldKey::Capacity => text(&event.capacity),
            FieldKey::PhotoGallery => count(event.photo_gallery.as_ref().map_or(0, Vec::len), "photo"),
            FieldKey::Links => count(event.links.as_ref().map_or(0, Vec::len), "link"),
            FieldKey::Privacy => event.effective_privacy().label().to_string(),
            FieldKey::Questionnaires => text(&event.questionnaires),
            FieldKey::Announcements => {
                count(event.announcements.as_ref().map_or(0, Vec::len), "announcement")
            },
            FieldKey::Invite => text(&event.invite),
            FieldKey::NewSections => count(event.new_sections.as_ref().map_or(0, Vec::len), "section"),
        }
    }

    /// Sends one form edit for the current event
    ///
    /// Returns `false` without calling the backend when there is no current
    /// event yet.
    ///
    /// # Errors
    ///
    /// Whatever the action layer reports
    #[tracing::instrument(skip_all)]
    pub async fn apply_edit(actions: &EventActions, edit: FieldEdit) -> Result<bool, ActionError> {
        let Some(current) = actions.current_event().await else {
            tracing::debug!(?edit, "No current event, edit kept local");
            return Ok(false);
        };
        actions.update_event(&current.id, edit.into_patch()).await?;
        Ok(true)
    }

    /// Creates the event from `draft`, or updates the current one
    ///
    /// The phone number is what submits the basic details form: with a
    /// blank (or whitespace-only) phone nothing is sent and `None` comes
    /// back. Otherwise returns the current event afterwards.
    ///
    /// # Errors
    ///
    /// Whatever the action layer reports
    #[tracing::instrument(skip_all)]
    pub async fn save_draft(
        actions: &EventActions,
        draft: &EventDraft,
    ) -> Result<Option<Event>, ActionError> {
        if draft.phone_number.trim().is_empty() {
            tracing::debug!("No phone number, draft not saved");
            return Ok(None);
        }
        let saved = match actions.current_event().await {
            None => actions.create_event(draft.to_new_event()).await?,
            Some(current) => {
                actions.update_event(&current.id, draft.to_patch()).await?;
                actions.event(&current.id).await.unwrap_or(current)
            },
        };
        Ok(Some(saved))
    }
}
