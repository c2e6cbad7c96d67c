use std::collections::BTreeMap;
use std::fmt::{Debug, Formatter};
use std::sync::Arc;

use thiserror::Error;
use tracing::{debug, info};

use crate::adapter::FeeAdapter;
use crate::adapters::ADAPTER_MODULES;
use crate::config::AdapterSettings;
use crate::http_client::HttpClient;
use crate::subgraph::SubgraphClient;
use crate::throttling::RequestThrottle;
use crate::{CoreError, ProtocolId, ProtocolMetadata};

/// Registry configuration errors.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RegistryError {
    #[error("protocol '{id}' is already registered")]
    DuplicateProtocol { id: ProtocolId },
    #[error("protocol '{id}' is not registered")]
    ProtocolNotFound { id: ProtocolId },
}

/// One registered protocol: its adapter and immutable metadata.
#[derive(Clone)]
pub struct ProtocolRegistration {
    pub id: ProtocolId,
    pub adapter: Arc<dyn FeeAdapter>,
    pub metadata: ProtocolMetadata,
}

impl Debug for ProtocolRegistration {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProtocolRegistration")
            .field("id", &self.id)
            .field("metadata", &self.metadata)
            .finish_non_exhaustive()
    }
}

/// Protocol id → adapter map, populated once at startup.
///
/// There is no global instance: the entry point builds one with
/// [`AdapterRegistry::bootstrap`] (or registers adapters by hand in tests) and
/// hands it to the query service by `Arc`.
#[derive(Debug, Default)]
pub struct AdapterRegistry {
    registrations: BTreeMap<ProtocolId, ProtocolRegistration>,
}

impl AdapterRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a registry by running every adapter module's `register` entry point.
    ///
    /// # Errors
    ///
    /// Fails on the first duplicate id or invalid metadata; a registry that
    /// cannot be bootstrapped is a configuration defect.
    pub fn bootstrap(
        settings: &AdapterSettings,
        http: Arc<dyn HttpClient>,
    ) -> Result<Self, CoreError> {
        let mut registry = Self::new();
        {
            let mut registrar = Registrar::new(&mut registry, settings, http);
            for register in ADAPTER_MODULES {
                register(&mut registrar)?;
            }
        }

        info!(
            protocols = registry.len(),
            ids = %registry.list_ids().iter().map(ProtocolId::as_str).collect::<Vec<_>>().join(","),
            "adapter registry bootstrapped"
        );
        Ok(registry)
    }

    pub fn register(
        &mut self,
        id: ProtocolId,
        adapter: Arc<dyn FeeAdapter>,
        metadata: ProtocolMetadata,
    ) -> Result<(), RegistryError> {
        if self.registrations.contains_key(&id) {
            return Err(RegistryError::DuplicateProtocol { id });
        }

        debug!(protocol = %id, name = %metadata.name, "registering protocol");
        self.registrations.insert(
            id.clone(),
            ProtocolRegistration {
                id,
                adapter,
                metadata,
            },
        );
        Ok(())
    }

    pub fn lookup(&self, id: &ProtocolId) -> Result<&ProtocolRegistration, RegistryError> {
        self.registrations
            .get(id)
            .ok_or_else(|| RegistryError::ProtocolNotFound { id: id.clone() })
    }

    pub fn metadata(&self, id: &ProtocolId) -> Result<&ProtocolMetadata, RegistryError> {
        self.lookup(id).map(|registration| &registration.metadata)
    }

    pub fn contains(&self, id: &ProtocolId) -> bool {
        self.registrations.contains_key(id)
    }

    /// All ids in lexicographic order.
    pub fn list_ids(&self) -> Vec<ProtocolId> {
        self.registrations.keys().cloned().collect()
    }

    /// Registrations in id order.
    pub fn registrations(&self) -> impl Iterator<Item = &ProtocolRegistration> {
        self.registrations.values()
    }

    pub fn len(&self) -> usize {
        self.registrations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.registrations.is_empty()
    }
}

/// Handle passed to each adapter module's `register` function.
///
/// Gives modules the shared transports and settings, and forwards their
/// registrations to the registry.
pub struct Registrar<'r> {
    registry: &'r mut AdapterRegistry,
    settings: &'r AdapterSettings,
    http: Arc<dyn HttpClient>,
    throttle: RequestThrottle,
    subgraph: Arc<SubgraphClient>,
}

impl<'r> Registrar<'r> {
    pub fn new(
        registry: &'r mut AdapterRegistry,
        settings: &'r AdapterSettings,
        http: Arc<dyn HttpClient>,
    ) -> Self {
        let throttle = RequestThrottle::new(settings.requests_per_second);
        let subgraph = Arc::new(SubgraphClient::new(
            Arc::clone(&http),
            settings,
            throttle.clone(),
        ));
        Self {
            registry,
            settings,
            http,
            throttle,
            subgraph,
        }
    }

    pub fn settings(&self) -> &'r AdapterSettings {
        self.settings
    }

    pub fn http_client(&self) -> Arc<dyn HttpClient> {
        Arc::clone(&self.http)
    }

    /// The request budget shared by every adapter registered through this registrar.
    pub fn throttle(&self) -> RequestThrottle {
        self.throttle.clone()
    }

    pub fn subgraph_client(&self) -> Arc<SubgraphClient> {
        Arc::clone(&self.subgraph)
    }

    /// Parse `id` and register it.
    pub fn register(
        &mut self,
        id: &str,
        adapter: Arc<dyn FeeAdapter>,
        metadata: ProtocolMetadata,
    ) -> Result<(), CoreError> {
        let id = ProtocolId::parse(id)?;
        self.registry.register(id, adapter, metadata)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapter::QueryFuture;
    use crate::{DateKey, ProtocolCategory};

    struct ConstantAdapter(f64);

    impl FeeAdapter for ConstantAdapter {
        fn query<'a>(&'a self, _attribute: &'a str, _date: DateKey) -> QueryFuture<'a> {
            let value = self.0;
            Box::pin(async move { Ok(value) })
        }
    }

    fn metadata(name: &str) -> ProtocolMetadata {
        ProtocolMetadata::new(name, ProtocolCategory::Dex).expect("valid metadata")
    }

    fn id(value: &str) -> ProtocolId {
        ProtocolId::parse(value).expect("valid id")
    }

    #[test]
    fn duplicate_registration_is_rejected() {
        let mut registry = AdapterRegistry::new();
        registry
            .register(id("uniswap-v2"), Arc::new(ConstantAdapter(1.0)), metadata("Uniswap"))
            .expect("first registration succeeds");

        let error = registry
            .register(id("uniswap-v2"), Arc::new(ConstantAdapter(2.0)), metadata("Uniswap 2"))
            .expect_err("duplicate must fail");

        assert_eq!(error, RegistryError::DuplicateProtocol { id: id("uniswap-v2") });
        assert_eq!(registry.len(), 1);
        assert_eq!(
            registry.metadata(&id("uniswap-v2")).expect("registered").name,
            "Uniswap"
        );
    }

    #[test]
    fn lookup_of_unknown_id_fails() {
        let registry = AdapterRegistry::new();
        let error = registry.lookup(&id("balancer")).expect_err("unknown id");
        assert_eq!(error, RegistryError::ProtocolNotFound { id: id("balancer") });
    }

    #[test]
    fn list_ids_is_sorted() {
        let mut registry = AdapterRegistry::new();
        for name in ["sushiswap", "balancer", "ethereum"] {
            registry
                .register(id(name), Arc::new(ConstantAdapter(0.0)), metadata(name))
                .expect("unique ids");
        }

        assert_eq!(
            registry.list_ids(),
            vec![id("balancer"), id("ethereum"), id("sushiswap")]
        );
    }
}
