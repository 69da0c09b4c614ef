//! Domain types for the event builder.
//!
//! An [`Event`] is the aggregate the editor builds: a title and schedule,
//! imagery, a set of optional feature sections and an append-only list of
//! [`CustomModule`]s picked from the [`QuickLink`] catalog.
//!
//! Field names serialize in camelCase so the JSON shape matches what the
//! editor front end exchanges with its backend.

use crate::modules::ModuleKind;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Opaque event identifier, assigned by the backend at creation
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EventId(String);

impl EventId {
    /// Wraps an id string
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the id as a string slice
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for EventId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Opaque module identifier, generated client-side when a module is added
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ModuleId(String);

impl ModuleId {
    /// Wraps an id string
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the id as a string slice
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ModuleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Who can see and join an event
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Privacy {
    /// Anyone can find and join
    #[default]
    Public,
    /// Hidden from listings
    Private,
    /// Only invited guests can join
    InviteOnly,
}

impl Privacy {
    /// All options, in picker order
    pub const ALL: [Self; 3] = [Self::Public, Self::Private, Self::InviteOnly];

    /// Display label
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Public => "Public",
            Self::Private => "Private",
            Self::InviteOnly => "Invite only",
        }
    }

    /// Short explanation shown under the label in the picker
    #[must_use]
    pub const fn description(self) -> &'static str {
        match self {
            Self::Public => "Anyone can see and join your event",
            Self::Private => "Only people with the link can see your event",
            Self::InviteOnly => "Only invited guests can see and join",
        }
    }
}

/// A titled link shown on the event page
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Link {
    /// Link text
    pub title: String,
    /// Target URL
    pub url: String,
}

impl Link {
    /// Creates a link
    #[must_use]
    pub fn new(title: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            url: url.into(),
        }
    }
}

/// A free-form section added by the host
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Section {
    /// Section heading
    pub title: String,
    /// Section body
    pub content: String,
}

impl Section {
    /// Creates a section
    #[must_use]
    pub fn new(title: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            content: content.into(),
        }
    }
}

/// A renderable feature unit attached to an event
///
/// `module_type` is a descriptive tag; rendering dispatches on `code` only.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CustomModule {
    /// Unique within the owning event's modules
    pub id: ModuleId,
    /// Semantic category, e.g. `tickets`
    #[serde(rename = "type")]
    pub module_type: String,
    /// Dispatch key for the module registry, e.g. `ticket-module`
    pub code: ModuleKind,
    /// Open configuration bag, reserved for renderers
    #[serde(default)]
    pub config: serde_json::Map<String, serde_json::Value>,
}

/// Catalog entry describing an addable module template
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuickLink {
    /// Stable catalog key
    pub id: String,
    /// Display name
    pub label: String,
    /// Copied into [`CustomModule::module_type`]
    pub module_type: String,
    /// Copied into [`CustomModule::code`]
    pub code: ModuleKind,
}

impl QuickLink {
    /// Creates a catalog entry
    #[must_use]
    pub fn new(
        id: impl Into<String>,
        label: impl Into<String>,
        module_type: impl Into<String>,
        code: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            label: label.into(),
            module_type: module_type.into(),
            code: ModuleKind::from_code(code.into()),
        }
    }
}

/// The aggregate root: one occasion being built in the editor
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Event {
    /// Assigned at creation, never changes
    pub id: EventId,
    /// Event title
    pub title: String,
    /// Long description, may be empty
    pub description: String,
    /// Host phone number
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone_number: Option<String>,
    /// Start instant
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date_time: Option<DateTime<Utc>>,
    /// Free-text location
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    /// Free text, not a validated amount
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cost_per_person: Option<String>,
    /// Free text, not a validated integer
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub capacity: Option<String>,
    /// Image URIs, in display order
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub photo_gallery: Option<Vec<String>>,
    /// Links, in display order
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub links: Option<Vec<Link>>,
    /// Visibility; `None` is shown as public
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub privacy: Option<Privacy>,
    /// Opaque questionnaire blob
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub questionnaires: Option<String>,
    /// Announcements, oldest first
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub announcements: Option<Vec<String>>,
    /// Opaque invite configuration
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub invite: Option<String>,
    /// Host-defined sections
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub new_sections: Option<Vec<Section>>,
    /// Flyer image URI or data URI
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub flyer_image: Option<String>,
    /// Flyer headline, e.g. "YOU'RE INVITED"
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub flyer_text: Option<String>,
    /// Page background URI or data URI
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub background_image: Option<String>,
    /// Attached modules, append-only
    #[serde(default)]
    pub modules: Vec<CustomModule>,
    /// Fixed at creation
    pub created_at: DateTime<Utc>,
    /// Rewritten on every successful mutation
    pub updated_at: DateTime<Utc>,
}

impl Event {
    /// A fresh event with no optional fields and no modules
    #[must_use]
    pub fn new(
        id: EventId,
        title: impl Into<String>,
        description: impl Into<String>,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            title: title.into(),
            description: description.into(),
            phone_number: None,
            date_time: None,
            location: None,
            cost_per_person: None,
            capacity: None,
            photo_gallery: None,
            links: None,
            privacy: None,
            questionnaires: None,
            announcements: None,
            invite: None,
            new_sections: None,
            flyer_image: None,
            flyer_text: None,
            background_image: None,
            modules: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Builds the event a backend returns for a create request
    #[must_use]
    pub fn from_new(id: EventId, fields: NewEvent, now: DateTime<Utc>) -> Self {
        let mut event = Self::new(id, fields.title, fields.description, now);
        fields.details.apply_to(&mut event);
        event
    }

    /// Privacy as displayed (unset means public)
    #[must_use]
    pub fn effective_privacy(&self) -> Privacy {
        self.privacy.unwrap_or_default()
    }

    /// Looks up an attached module
    #[must_use]
    pub fn module(&self, id: &ModuleId) -> Option<&CustomModule> {
        self.modules.iter().find(|m| &m.id == id)
    }
}

/// Input for creating an event
///
/// `title` should be non-empty; that is the caller's responsibility.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct NewEvent {
    /// Event title
    pub title: String,
    /// Event description
    pub description: String,
    /// Optional fields to set at creation
    pub details: EventPatch,
}

impl NewEvent {
    /// Title and description only
    #[must_use]
    pub fn new(title: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            description: description.into(),
            details: EventPatch::default(),
        }
    }

    /// Adds optional fields
    #[must_use]
    pub fn with_details(mut self, details: EventPatch) -> Self {
        self.details = details;
        self
    }
}

/// Generates a set/clear builder pair for each optional patch field
macro_rules! optional_setters {
    ($($field:ident, $clear:ident: $ty:ty;)*) => {
        $(
            #[doc = concat!("Set `", stringify!($field), "`")]
            #[must_use]
            pub fn $field(mut self, value: impl Into<$ty>) -> Self {
                self.$field = Some(Some(value.into()));
                self
            }

            #[doc = concat!("Clear `", stringify!($field), "`")]
            #[must_use]
            pub fn $clear(mut self) -> Self {
                self.$field = Some(None);
                self
            }
        )*
    };
}

/// A partial field set for a shallow merge into an [`Event`]
///
/// Required fields are `Option<T>` (leave or replace). Optional fields are
/// `Option<Option<T>>`: `None` leaves the field alone, `Some(None)` clears it
/// and `Some(Some(v))` sets it. Identity, modules and timestamps are not
/// patchable.
#[derive(Clone, Debug, Default, PartialEq)]
#[allow(clippy::option_option)] // Tri-state on purpose: leave, clear, set
pub struct EventPatch {
    /// Replacement title
    pub title: Option<String>,
    /// Replacement description
    pub description: Option<String>,
    /// Phone number
    pub phone_number: Option<Option<String>>,
    /// Start instant
    pub date_time: Option<Option<DateTime<Utc>>>,
    /// Location
    pub location: Option<Option<String>>,
    /// Cost per person
    pub cost_per_person: Option<Option<String>>,
    /// Capacity
    pub capacity: Option<Option<String>>,
    /// Photo gallery
    pub photo_gallery: Option<Option<Vec<String>>>,
    /// Links
    pub links: Option<Option<Vec<Link>>>,
    /// Privacy
    pub privacy: Option<Option<Privacy>>,
    /// Questionnaires
    pub questionnaires: Option<Option<String>>,
    /// Announcements
    pub announcements: Option<Option<Vec<String>>>,
    /// Invite
    pub invite: Option<Option<String>>,
    /// New sections
    pub new_sections: Option<Option<Vec<Section>>>,
    /// Flyer image
    pub flyer_image: Option<Option<String>>,
    /// Flyer text
    pub flyer_text: Option<Option<String>>,
    /// Background image
    pub background_image: Option<Option<String>>,
}

impl EventPatch {
    /// An empty patch
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the title
    #[must_use]
    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    /// Set the description
    #[must_use]
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    optional_setters! {
        phone_number, clear_phone_number: String;
        date_time, clear_date_time: DateTime<Utc>;
        location, clear_location: String;
        cost_per_person, clear_cost_per_person: String;
        capacity, clear_capacity: String;
        photo_gallery, clear_photo_gallery: Vec<String>;
        links, clear_links: Vec<Link>;
        privacy, clear_privacy: Privacy;
        questionnaires, clear_questionnaires: String;
        announcements, clear_announcements: Vec<String>;
        invite, clear_invite: String;
        new_sections, clear_new_sections: Vec<Section>;
        flyer_image, clear_flyer_image: String;
        flyer_text, clear_flyer_text: String;
        background_image, clear_background_image: String;
    }

    /// Returns `true` when applying the patch changes no field
    #[must_use]
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Shallow-merges the patch into `event`
    ///
    /// Does not touch `updated_at`; stamping is the caller's job.
    pub fn apply_to(&self, event: &mut Event) {
        fn merge<T: Clone>(slot: &mut T, value: Option<&T>) {
            if let Some(value) = value {
                slot.clone_from(value);
            }
        }

        merge(&mut event.title, self.title.as_ref());
        merge(&mut event.description, self.description.as_ref());
        merge(&mut event.phone_number, self.phone_number.as_ref());
        merge(&mut event.date_time, self.date_time.as_ref());
        merge(&mut event.location, self.location.as_ref());
        merge(&mut event.cost_per_person, self.cost_per_person.as_ref());
        merge(&mut event.capacity, self.capacity.as_ref());
        merge(&mut event.photo_gallery, self.photo_gallery.as_ref());
        merge(&mut event.links, self.links.as_ref());
        merge(&mut event.privacy, self.privacy.as_ref());
        merge(&mut event.questionnaires, self.questionnaires.as_ref());
        merge(&mut event.announcements, self.announcements.as_ref());
        merge(&mut event.invite, self.invite.as_ref());
        merge(&mut event.new_sections, self.new_sections.as_ref());
        merge(&mut event.flyer_image, self.flyer_image.as_ref());
        merge(&mut event.flyer_text, self.flyer_text.as_ref());
        merge(&mut event.background_image, self.background_image.as_ref());
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use event_builder_testing::epoch;

    fn sample() -> Event {
        Event::new(EventId::new("event-1"), "Launch Party", "", epoch())
    }

    #[test]
    fn patch_sets_and_clears_optional_fields() {
        let mut event = sample();
        EventPatch::new()
            .capacity("50")
            .location("Rooftop")
            .apply_to(&mut event);
        assert_eq!(event.capacity.as_deref(), Some("50"));
        assert_eq!(event.location.as_deref(), Some("Rooftop"));

        EventPatch::new().clear_capacity().apply_to(&mut event);
        assert_eq!(event.capacity, None);
        assert_eq!(event.location.as_deref(), Some("Rooftop"));
    }

    #[test]
    fn empty_patch_changes_nothing() {
        let mut event = sample();
        let before = event.clone();
        let patch = EventPatch::new();
        assert!(patch.is_empty());
        patch.apply_to(&mut event);
        assert_eq!(event, before);
    }

    #[test]
    fn from_new_applies_details_and_stamps_both_timestamps() {
        let fields = NewEvent::new("Launch Party", "Drinks")
            .with_details(EventPatch::new().phone_number("555-0100"));
        let event = Event::from_new(EventId::new("event-9"), fields, epoch());

        assert_eq!(event.phone_number.as_deref(), Some("555-0100"));
        assert!(event.modules.is_empty());
        assert_eq!(event.created_at, event.updated_at);
    }

    #[test]
    fn json_shape_uses_camel_case_and_kebab_privacy() {
        let mut event = sample();
        EventPatch::new()
            .privacy(Privacy::InviteOnly)
            .cost_per_person("$10")
            .apply_to(&mut event);

        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["privacy"], "invite-only");
        assert_eq!(json["costPerPerson"], "$10");
        assert!(json.get("capacity").is_none());

        let back: Event = serde_json::from_value(json).unwrap();
        assert_eq!(back, event);
    }

    #[test]
    fn module_json_keeps_code_string() {
        let json = serde_json::json!({
            "id": "module-1",
            "type": "rsvp",
            "code": "rsvp-module",
            "config": {}
        });
        let module: CustomModule = serde_json::from_value(json).unwrap();
        assert_eq!(module.code, ModuleKind::Rsvp);
        assert_eq!(serde_json::to_value(&module).unwrap()["code"], "rsvp-module");
    }

    #[test]
    fn unset_privacy_reads_as_public() {
        assert_eq!(sample().effective_privacy(), Privacy::Public);
    }
}
