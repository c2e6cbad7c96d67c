//! Behavior tests for adapter registration and lookup.

mod support;

use std::sync::Arc;

use cryptofees_core::{
    AdapterRegistry, CoreError, ProtocolCategory, ProtocolMetadata, Registrar, RegistryError,
    ValidationError,
};

use support::{day, id, test_settings, RecordingHttpClient, TableAdapter};

fn metadata(name: &str) -> ProtocolMetadata {
    ProtocolMetadata::new(name, ProtocolCategory::Dex).expect("valid metadata")
}

#[test]
fn when_bootstrapped_every_adapter_module_registers_its_protocols() {
    // Given: The default adapter modules and a recording transport
    let http = Arc::new(RecordingHttpClient::new());

    // When: The registry is bootstrapped
    let registry =
        AdapterRegistry::bootstrap(&test_settings(), Arc::<RecordingHttpClient>::clone(&http)).expect("bootstrap");

    // Then: All six protocols are listed in id order
    let ids = registry
        .list_ids()
        .into_iter()
        .map(|id| id.to_string())
        .collect::<Vec<_>>();
    assert_eq!(
        ids,
        vec!["balancer", "bitcoin", "ethereum", "honeyswap", "sushiswap", "uniswap-v2"]
    );

    // And: Registration itself made no upstream calls
    assert_eq!(http.request_count(), 0);
}

#[test]
fn when_bootstrapped_metadata_is_attached_to_each_protocol() {
    // Given: A bootstrapped registry
    let registry = AdapterRegistry::bootstrap(&test_settings(), Arc::new(RecordingHttpClient::new()))
        .expect("bootstrap");

    // When: Metadata is looked up
    let ethereum = registry.metadata(&id("ethereum")).expect("registered");
    let honeyswap = registry.metadata(&id("honeyswap")).expect("registered");

    // Then: Category, chain and source reflect the adapter
    assert_eq!(ethereum.category, ProtocolCategory::L1);
    assert_eq!(ethereum.token.as_deref(), Some("ETH"));
    assert_eq!(honeyswap.category, ProtocolCategory::Dex);
    assert_eq!(honeyswap.blockchain.as_deref(), Some("xDai"));
    assert_eq!(honeyswap.source.as_deref(), Some(support::HONEYSWAP_URL));
}

#[test]
fn when_id_is_registered_twice_registration_fails_before_any_query() {
    // Given: A registry already holding `uniswap-v2`
    let first = Arc::new(TableAdapter::new([(day("2020-09-01"), 1.0)]));
    let second = Arc::new(TableAdapter::new([(day("2020-09-01"), 2.0)]));
    let mut registry = AdapterRegistry::new();
    registry
        .register(id("uniswap-v2"), first.clone(), metadata("Uniswap"))
        .expect("first registration");

    // When: The same id is registered again
    let error = registry
        .register(id("uniswap-v2"), second.clone(), metadata("Uniswap again"))
        .expect_err("duplicate");

    // Then: It is a configuration error and the original entry is untouched
    assert_eq!(error, RegistryError::DuplicateProtocol { id: id("uniswap-v2") });
    assert_eq!(registry.len(), 1);
    assert_eq!(
        registry.metadata(&id("uniswap-v2")).expect("registered").name,
        "Uniswap"
    );

    // And: Neither adapter has been queried
    assert_eq!(first.calls(), 0);
    assert_eq!(second.calls(), 0);
}

#[test]
fn when_registrar_receives_invalid_id_it_reports_validation_error() {
    // Given: A registrar over an empty registry
    let settings = test_settings();
    let mut registry = AdapterRegistry::new();
    let mut registrar =
        Registrar::new(&mut registry, &settings, Arc::new(RecordingHttpClient::new()));

    // When: A module registers an id containing a space
    let error = registrar
        .register(
            "Uniswap V2",
            Arc::new(TableAdapter::default()),
            metadata("Uniswap"),
        )
        .expect_err("invalid id");

    // Then: The id is rejected by validation
    assert!(matches!(
        error,
        CoreError::Validation(ValidationError::ProtocolIdInvalidChar { .. })
            | CoreError::Validation(ValidationError::ProtocolIdInvalidStart { .. })
    ));
    assert!(registry.is_empty());
}

#[test]
fn when_registrar_sees_a_duplicate_it_surfaces_registry_error() {
    // Given: A registrar that already registered `ethereum`
    let settings = test_settings();
    let mut registry = AdapterRegistry::new();
    let mut registrar =
        Registrar::new(&mut registry, &settings, Arc::new(RecordingHttpClient::new()));
    registrar
        .register("ethereum", Arc::new(TableAdapter::default()), metadata("Ethereum"))
        .expect("first registration");

    // When: The id is registered again through the registrar
    let error = registrar
        .register("ethereum", Arc::new(TableAdapter::default()), metadata("Ethereum"))
        .expect_err("duplicate");

    // Then: The registry error is carried through
    assert!(matches!(
        error,
        CoreError::Registry(RegistryError::DuplicateProtocol { .. })
    ));
}

#[test]
fn when_unknown_id_is_looked_up_lookup_fails() {
    // Given: A bootstrapped registry
    let registry = AdapterRegistry::bootstrap(&test_settings(), Arc::new(RecordingHttpClient::new()))
        .expect("bootstrap");

    // When: An unregistered protocol is looked up
    let error = registry.lookup(&id("aave")).expect_err("not registered");

    // Then: ProtocolNotFound names the id
    assert_eq!(error, RegistryError::ProtocolNotFound { id: id("aave") });
    assert!(!registry.contains(&id("aave")));
    assert!(registry.contains(&id("balancer")));
}
