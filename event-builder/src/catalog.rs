//! Quick-link catalog: the module templates a host can add to an event.

use crate::gateway::{BackendGateway, GatewayResult};
use crate::modules::ModuleKind;
use crate::types::{CustomModule, ModuleId, QuickLink};
use event_builder_core::environment::IdGenerator;

/// Read-only list of addable module templates, seeded once
#[derive(Clone, Debug, Default, PartialEq)]
pub struct QuickLinkCatalog {
    links: Vec<QuickLink>,
}

impl QuickLinkCatalog {
    /// Seeds the catalog from the backend
    ///
    /// Entries whose code no renderer knows are kept, so they still show up
    /// in the picker, but are logged.
    ///
    /// # Errors
    ///
    /// Returns the gateway error if the catalog cannot be fetched
    #[tracing::instrument(skip(gateway))]
    pub async fn load(gateway: &dyn BackendGateway) -> GatewayResult<Self> {
        let links = gateway.get_quick_links().await?;
        for link in links.iter().filter(|l| !l.code.is_known()) {
            tracing::warn!(id = %link.id, code = %link.code, "Quick link has no renderer");
        }
        tracing::debug!(count = links.len(), "Quick-link catalog loaded");
        Ok(Self::from_links(links))
    }

    /// Catalog over a fixed list
    #[must_use]
    pub const fn from_links(links: Vec<QuickLink>) -> Self {
        Self { links }
    }

    /// Entries in catalog order
    #[must_use]
    pub fn links(&self) -> &[QuickLink] {
        &self.links
    }

    /// Looks up an entry by catalog id
    #[must_use]
    pub fn get(&self, id: &str) -> Option<&QuickLink> {
        self.links.iter().find(|l| l.id == id)
    }

    /// First entry producing modules of `kind`
    #[must_use]
    pub fn by_kind(&self, kind: &ModuleKind) -> Option<&QuickLink> {
        self.links.iter().find(|l| &l.code == kind)
    }

    /// Number of entries
    #[must_use]
    pub fn len(&self) -> usize {
        self.links.len()
    }

    /// `true` when nothing was seeded
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.links.is_empty()
    }
}

/// Turns a catalog entry into a module with a fresh client-side id
#[must_use]
pub fn instantiate(link: &QuickLink, ids: &dyn IdGenerator) -> CustomModule {
    CustomModule {
        id: ModuleId::new(ids.next_id("module")),
        module_type: link.module_type.clone(),
        code: link.code.clone(),
        config: serde_json::Map::new(),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::gateway::{GatewayError, GatewayLatency, MockBackend};
    use event_builder_testing::SequentialIdGenerator;

    fn backend() -> MockBackend {
        MockBackend::new().with_latency(GatewayLatency::none())
    }

    #[tokio::test]
    async fn loads_the_four_seeded_links() {
        let catalog = QuickLinkCatalog::load(&backend()).await.unwrap();
        assert_eq!(catalog.len(), 4);
        let labels: Vec<&str> = catalog.links().iter().map(|l| l.label.as_str()).collect();
        assert_eq!(
            labels,
            vec!["Ticket Sales", "RSVP Form", "Countdown Timer", "Social Share"]
        );
        assert_eq!(catalog.get("2").unwrap().module_type, "rsvp");
        assert_eq!(catalog.by_kind(&ModuleKind::Social).unwrap().id, "4");
    }

    #[tokio::test]
    async fn load_propagates_gateway_errors() {
        let gateway = backend();
        gateway.fail_next(GatewayError::Unavailable);
        assert_eq!(
            QuickLinkCatalog::load(&gateway).await,
            Err(GatewayError::Unavailable)
        );
    }

    #[test]
    fn instantiate_copies_type_and_code() {
        let ids = SequentialIdGenerator::new();
        let link = QuickLink::new("2", "RSVP Form", "rsvp", "rsvp-module");

        let first = instantiate(&link, &ids);
        let second = instantiate(&link, &ids);

        assert_eq!(first.module_type, "rsvp");
        assert_eq!(first.code, ModuleKind::Rsvp);
        assert!(first.config.is_empty());
        assert_eq!(first.id.as_str(), "module-1");
        assert_ne!(first.id, second.id);
    }

    #[test]
    fn unknown_codes_are_kept() {
        let catalog = QuickLinkCatalog::from_links(vec![QuickLink::new(
            "9",
            "Poll",
            "poll",
            "poll-module",
        )]);
        assert_eq!(
            catalog.get("9").unwrap().code,
            ModuleKind::Unknown("poll-module".to_string())
        );
    }
}
