use flowlineage::{build_backend, ConfigError, LineageConfig, TransportKind};
use lineage_core::{EventType, ExtractorSpec, RegistryError, TaskDescriptor, TaskEvent, WorkflowDescriptor};
use lineage_extractors::{PostgresExtractor, SnowflakeExtractor};

fn vars(pairs: &[(&str, &str)]) -> Vec<(String, String)> {
    pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect()
}

#[test]
fn reads_namespace_transport_and_overrides() {
    let config = LineageConfig::from_vars(vars(&[("OPENLINEAGE_NAMESPACE", "food_delivery"),
                                                 ("OPENLINEAGE_TRANSPORT", "memory"),
                                                 ("OPENLINEAGE_EXTRACTOR_PostgresOperator", SnowflakeExtractor::REFERENCE),
                                                 ("HOME", "/root")])).unwrap();
    assert_eq!(config.namespace, "food_delivery");
    assert_eq!(config.transport, TransportKind::Memory);
    assert_eq!(config.overrides.len(), 1);
    assert_eq!(config.overrides[0].task_type, "PostgresOperator");
}

#[test]
fn malformed_override_key_is_a_config_error() {
    let err = LineageConfig::from_vars(vars(&[("OPENLINEAGE_EXTRACTOR_", PostgresExtractor::REFERENCE)])).unwrap_err();
    assert!(matches!(err, ConfigError::Registry(RegistryError::MalformedOverride { .. })));
}

#[test]
fn unresolved_override_fails_at_build_time() {
    let config = LineageConfig::from_vars(vars(&[("OPENLINEAGE_EXTRACTOR_PostgresOperator", "nowhere::Extractor")])).unwrap();
    assert!(matches!(build_backend(&config), Err(ConfigError::Registry(RegistryError::UnresolvedReference { .. }))));
}

#[test]
fn memory_backend_retains_the_event_pair() {
    let config = LineageConfig::from_vars(vars(&[("OPENLINEAGE_TRANSPORT", "memory"),
                                                 ("OPENLINEAGE_NAMESPACE", "ops")])).unwrap();
    let mut hook = build_backend(&config).unwrap();
    let event = TaskEvent { task: TaskDescriptor::new("ping", "BashOperator"),
                            workflow: WorkflowDescriptor::new("healthcheck"),
                            run: None,
                            task_instance: None };
    let outcome = hook.on_task_event(&event);
    assert_eq!(outcome.events_sent, 2);

    let retained = hook.adapter().transport().retained();
    assert_eq!(retained.iter().map(|e| e.event_type).collect::<Vec<_>>(),
               vec![EventType::Running, EventType::Complete]);
    assert!(retained.iter().all(|e| e.job.namespace == "ops" && e.job.name == "healthcheck.ping"));
}
