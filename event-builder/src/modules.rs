//! Module registry: maps a module's code to the view that renders it.
//!
//! Codes are resolved into [`ModuleKind`] once, when a module or catalog
//! entry is deserialized or constructed. Rendering is then a plain match
//! over the enum. Codes nobody recognizes survive as
//! [`ModuleKind::Unknown`] and render as a placeholder that names the code.
//!
//! To add a module: add a variant, its code in [`ModuleKind::from_code`] and
//! [`ModuleKind::code`], and a [`ModuleView`] arm in [`render_module`].

use crate::types::CustomModule;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Code for the ticket sales module
pub const TICKET_MODULE: &str = "ticket-module";
/// Code for the RSVP form module
pub const RSVP_MODULE: &str = "rsvp-module";
/// Code for the countdown timer module
pub const COUNTDOWN_MODULE: &str = "countdown-module";
/// Code for the social share module
pub const SOCIAL_MODULE: &str = "social-module";

/// Known module variants, plus a catch-all for unrecognized codes
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ModuleKind {
    /// `ticket-module`
    Ticket,
    /// `rsvp-module`
    Rsvp,
    /// `countdown-module`
    Countdown,
    /// `social-module`
    Social,
    /// Any other code, kept verbatim for diagnostics
    Unknown(String),
}

impl ModuleKind {
    /// Resolves a code by exact, case-sensitive match
    ///
    /// Total over all strings: anything unrecognized becomes `Unknown`.
    #[must_use]
    pub fn from_code(code: impl Into<String>) -> Self {
        let code = code.into();
        match code.as_str() {
            TICKET_MODULE => Self::Ticket,
            RSVP_MODULE => Self::Rsvp,
            COUNTDOWN_MODULE => Self::Countdown,
            SOCIAL_MODULE => Self::Social,
            _ => Self::Unknown(code),
        }
    }

    /// The code string this kind was parsed from
    #[must_use]
    pub fn code(&self) -> &str {
        match self {
            Self::Ticket => TICKET_MODULE,
            Self::Rsvp => RSVP_MODULE,
            Self::Countdown => COUNTDOWN_MODULE,
            Self::Social => SOCIAL_MODULE,
            Self::Unknown(code) => code,
        }
    }

    /// `false` only for `Unknown`
    #[must_use]
    pub const fn is_known(&self) -> bool {
        !matches!(self, Self::Unknown(_))
    }
}

impl From<String> for ModuleKind {
    fn from(code: String) -> Self {
        Self::from_code(code)
    }
}

impl From<&str> for ModuleKind {
    fn from(code: &str) -> Self {
        Self::from_code(code)
    }
}

impl From<ModuleKind> for String {
    fn from(kind: ModuleKind) -> Self {
        match kind {
            ModuleKind::Unknown(code) => code,
            known => known.code().to_string(),
        }
    }
}

impl fmt::Display for ModuleKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// A ticket tier shown by the ticket module
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TicketTier {
    /// Tier name
    pub name: &'static str,
    /// Price in cents
    pub price_cents: u32,
}

impl TicketTier {
    /// Price formatted as dollars, e.g. `$25.00`
    #[must_use]
    pub fn price_label(&self) -> String {
        format!("${}.{:02}", self.price_cents / 100, self.price_cents % 100)
    }
}

/// Time left until a countdown target, clamped at zero
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct TimeRemaining {
    /// Whole days
    pub days: i64,
    /// Hours past the whole days
    pub hours: i64,
    /// Minutes past the whole hours
    pub minutes: i64,
    /// Seconds past the whole minutes
    pub seconds: i64,
}

impl TimeRemaining {
    /// Splits the gap between `now` and `target`
    #[must_use]
    pub fn between(now: DateTime<Utc>, target: DateTime<Utc>) -> Self {
        let total = (target - now).num_seconds();
        if total <= 0 {
            return Self::default();
        }
        Self {
            days: total / 86_400,
            hours: (total % 86_400) / 3_600,
            minutes: (total % 3_600) / 60,
            seconds: total % 60,
        }
    }

    /// `true` once the target has passed
    #[must_use]
    pub fn is_elapsed(&self) -> bool {
        *self == Self::default()
    }
}

/// Where a share button sends the event
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ShareTarget {
    /// Facebook
    Facebook,
    /// Twitter
    Twitter,
    /// `LinkedIn`
    LinkedIn,
    /// Copies the event link to the clipboard
    CopyLink,
}

impl ShareTarget {
    /// Buttons in display order
    pub const ALL: [Self; 4] = [Self::Facebook, Self::Twitter, Self::LinkedIn, Self::CopyLink];

    /// Button label
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Facebook => "Facebook",
            Self::Twitter => "Twitter",
            Self::LinkedIn => "LinkedIn",
            Self::CopyLink => "Copy Link",
        }
    }
}

/// What the editor draws for one module
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ModuleView {
    /// Ticket tiers with a buy button
    Tickets {
        /// Card heading
        heading: &'static str,
        /// Tiers, cheapest first
        tiers: Vec<TicketTier>,
        /// Button label
        call_to_action: &'static str,
    },
    /// Name/email form
    Rsvp {
        /// Card heading
        heading: &'static str,
        /// Input placeholders, in order
        fields: Vec<&'static str>,
        /// Button label
        call_to_action: &'static str,
        /// Shown after submitting
        confirmation: &'static str,
    },
    /// Time left until the event starts
    Countdown {
        /// Card heading
        heading: &'static str,
        /// Instant being counted down to
        target: DateTime<Utc>,
        /// Time left at render time
        remaining: TimeRemaining,
    },
    /// Share buttons
    Social {
        /// Card heading
        heading: &'static str,
        /// Buttons in display order
        targets: Vec<ShareTarget>,
    },
    /// Placeholder for codes no renderer handles
    Unknown {
        /// The unrecognized code
        code: String,
        /// Visible warning text
        message: String,
    },
}

impl ModuleView {
    /// `true` for the unknown-module placeholder
    #[must_use]
    pub const fn is_placeholder(&self) -> bool {
        matches!(self, Self::Unknown { .. })
    }
}

/// Inputs a renderer may read besides the module itself
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RenderContext {
    /// Render time
    pub now: DateTime<Utc>,
    /// The owning event's start, if scheduled
    pub event_start: Option<DateTime<Utc>>,
    /// Countdown target when the event has no start
    pub countdown_fallback: Duration,
}

impl RenderContext {
    /// Days added to `now` for an unscheduled countdown
    pub const DEFAULT_COUNTDOWN_FALLBACK_DAYS: i64 = 30;

    /// [`Self::DEFAULT_COUNTDOWN_FALLBACK_DAYS`] as a duration
    pub const DEFAULT_COUNTDOWN_FALLBACK: Duration = Duration::days(Self::DEFAULT_COUNTDOWN_FALLBACK_DAYS);

    /// Context for rendering at `now` with the default fallback
    #[must_use]
    pub fn at(now: DateTime<Utc>) -> Self {
        Self {
            now,
            event_start: None,
            countdown_fallback: Self::DEFAULT_COUNTDOWN_FALLBACK,
        }
    }

    /// Sets the owning event's start
    #[must_use]
    pub const fn with_event_start(mut self, start: Option<DateTime<Utc>>) -> Self {
        self.event_start = start;
        self
    }

    /// Overrides the unscheduled countdown target offset
    #[must_use]
    pub const fn with_countdown_fallback(mut self, fallback: Duration) -> Self {
        self.countdown_fallback = fallback;
        self
    }
}

/// Selects and fills the view for `module`, dispatching on its code only
///
/// Never fails: unknown codes produce [`ModuleView::Unknown`].
#[must_use]
pub fn render_module(module: &CustomModule, ctx: &RenderContext) -> ModuleView {
    match &module.code {
        ModuleKind::Ticket => ModuleView::Tickets {
            heading: "Ticket Sales",
            tiers: vec![
                TicketTier {
                    name: "General Admission",
                    price_cents: 2_500,
                },
                TicketTier {
                    name: "VIP",
                    price_cents: 5_000,
                },
            ],
            call_to_action: "Buy Tickets",
        },
        ModuleKind::Rsvp => ModuleView::Rsvp {
            heading: "RSVP Form",
            fields: vec!["Your Name", "Your Email"],
            call_to_action: "Confirm RSVP",
            confirmation: "Thank you for your RSVP! We'll see you there.",
        },
        ModuleKind::Countdown => {
            // Saturates rather than overflowing on absurd fallbacks
            let target = ctx.event_start.unwrap_or_else(|| {
                ctx.now
                    .checked_add_signed(ctx.countdown_fallback)
                    .unwrap_or(DateTime::<Utc>::MAX_UTC)
            });
            ModuleView::Countdown {
                heading: "Countdown Timer",
                target,
                remaining: TimeRemaining::between(ctx.now, target),
            }
        },
        ModuleKind::Social => ModuleView::Social {
            heading: "Share This Event",
            targets: ShareTarget::ALL.to_vec(),
        },
        ModuleKind::Unknown(code) => {
            tracing::debug!(module_id = %module.id, code = %code, "No renderer for module code");
            ModuleView::Unknown {
                code: code.clone(),
                message: format!("Unknown module type: {code}"),
            }
        },
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::panic)]
mod tests {
    use super::*;
    use crate::types::ModuleId;
    use event_builder_testing::epoch;
    use proptest::prelude::*;

    fn module(code: &str) -> CustomModule {
        CustomModule {
            id: ModuleId::new("module-1"),
            module_type: "anything".to_string(),
            code: ModuleKind::from_code(code),
            config: serde_json::Map::new(),
        }
    }

    #[test]
    fn known_codes_select_their_variant() {
        let ctx = RenderContext::at(epoch());
        assert!(matches!(
            render_module(&module("ticket-module"), &ctx),
            ModuleView::Tickets { .. }
        ));
        assert!(matches!(
            render_module(&module("rsvp-module"), &ctx),
            ModuleView::Rsvp { .. }
        ));
        assert!(matches!(
            render_module(&module("countdown-module"), &ctx),
            ModuleView::Countdown { .. }
        ));
        assert!(matches!(
            render_module(&module("social-module"), &ctx),
            ModuleView::Social { .. }
        ));
    }

    #[test]
    fn dispatch_ignores_module_type() {
        let mut rsvp = module("rsvp-module");
        rsvp.module_type = "tickets".to_string();
        let view = render_module(&rsvp, &RenderContext::at(epoch()));
        assert!(matches!(view, ModuleView::Rsvp { .. }));
    }

    #[test]
    fn no_case_folding_or_partial_matches() {
        let ctx = RenderContext::at(epoch());
        for code in ["RSVP-MODULE", "rsvp", "rsvp-module ", "ticket-module-v2", ""] {
            let view = render_module(&module(code), &ctx);
            assert_eq!(
                view,
                ModuleView::Unknown {
                    code: code.to_string(),
                    message: format!("Unknown module type: {code}"),
                }
            );
        }
    }

    #[test]
    fn ticket_prices_format_as_dollars() {
        let ModuleView::Tickets { tiers, .. } =
            render_module(&module("ticket-module"), &RenderContext::at(epoch()))
        else {
            panic!("expected tickets view");
        };
        let labels: Vec<String> = tiers.iter().map(TicketTier::price_label).collect();
        assert_eq!(labels, vec!["$25.00", "$50.00"]);
    }

    #[test]
    fn countdown_targets_event_start() {
        let start = epoch() + Duration::days(2) + Duration::hours(3) + Duration::seconds(5);
        let ctx = RenderContext::at(epoch()).with_event_start(Some(start));
        let ModuleView::Countdown { target, remaining, .. } =
            render_module(&module("countdown-module"), &ctx)
        else {
            panic!("expected countdown view");
        };
        assert_eq!(target, start);
        assert_eq!(
            remaining,
            TimeRemaining {
                days: 2,
                hours: 3,
                minutes: 0,
                seconds: 5
            }
        );
    }

    #[test]
    fn countdown_without_start_uses_fallback() {
        let ctx = RenderContext::at(epoch());
        let ModuleView::Countdown { remaining, .. } =
            render_module(&module("countdown-module"), &ctx)
        else {
            panic!("expected countdown view");
        };
        assert_eq!(remaining.days, 30);
    }

    #[test]
    fn huge_countdown_fallback_saturates() {
        let ctx = RenderContext::at(epoch()).with_countdown_fallback(Duration::days(1_000_000_000));
        let ModuleView::Countdown { target, remaining, .. } =
            render_module(&module("countdown-module"), &ctx)
        else {
            panic!("expected countdown view");
        };
        assert_eq!(target, DateTime::<Utc>::MAX_UTC);
        assert!(remaining.days > 0);
    }

    #[test]
    fn countdown_clamps_at_zero() {
        let ctx = RenderContext::at(epoch()).with_event_start(Some(epoch() - Duration::hours(1)));
        let ModuleView::Countdown { remaining, .. } =
            render_module(&module("countdown-module"), &ctx)
        else {
            panic!("expected countdown view");
        };
        assert!(remaining.is_elapsed());
    }

    #[test]
    fn kind_round_trips_through_string() {
        for code in [TICKET_MODULE, RSVP_MODULE, COUNTDOWN_MODULE, SOCIAL_MODULE, "poll-module"] {
            assert_eq!(String::from(ModuleKind::from_code(code)), code);
        }
        assert!(!ModuleKind::from("poll-module").is_known());
    }

    proptest! {
        #[test]
        fn unknown_codes_always_render_placeholder(code in ".*") {
            prop_assume!(![TICKET_MODULE, RSVP_MODULE, COUNTDOWN_MODULE, SOCIAL_MODULE]
                .contains(&code.as_str()));
            let view = render_module(&module(&code), &RenderContext::at(epoch()));
            prop_assert!(view.is_placeholder());
            prop_assert_eq!(
                view,
                ModuleView::Unknown { code: code.clone(), message: format!("Unknown module type: {code}") }
            );
        }
    }
}
