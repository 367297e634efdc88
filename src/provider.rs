//! The provider surface.
//!
//! [`ProviderService`] is the typed API a plugin host drives: schema
//! discovery, configuration, planning and the resource lifecycle.
//! [`JunosProvider`] implements it by dispatching on the resource type name
//! to the registered descriptors and running them through one shared
//! [`Orchestrator`].

use std::collections::BTreeMap;
use std::marker::PhantomData;
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::RwLock;
use tracing::{info, instrument, warn};

use crate::config::ProviderConfig;
use crate::crud::{validate_options, Orchestrator};
use crate::error::{OperationError, ProviderError};
use crate::logging::try_init_logging_to_file;
use crate::resource::Resource;
use crate::resources::{AsPath, Community, EventDestination, FirewallPolicer, IpsecVpn};
use crate::schema::{Diagnostic, ProviderSchema, Schema};
use crate::session::{Client, ClientBuilder};
use crate::types::{Applied, ImportedResource, PlanResult, ProviderMetadata};
use crate::validation::validate;

/// Operations a provider exposes to its host.
#[async_trait]
pub trait ProviderService: Send + Sync + 'static {
    /// Return the provider's schema including all resources.
    fn schema(&self) -> ProviderSchema;

    /// Return provider metadata. By default, this is derived from the schema.
    fn metadata(&self) -> ProviderMetadata {
        ProviderMetadata {
            resources: self.schema().resources.keys().cloned().collect(),
        }
    }

    /// Validate the provider configuration before configuring.
    async fn validate_provider_config(&self, config: Value) -> Result<Vec<Diagnostic>, ProviderError> {
        let _ = config;
        Ok(vec![])
    }

    /// Configure the provider. Returns diagnostics (errors and warnings).
    async fn configure(&self, config: Value) -> Result<Vec<Diagnostic>, ProviderError>;

    /// Stop the provider gracefully.
    async fn stop(&self) -> Result<(), ProviderError> {
        Ok(())
    }

    /// Validate a resource's configuration before planning.
    async fn validate_resource_config(
        &self,
        resource_type: &str,
        config: Value,
    ) -> Result<Vec<Diagnostic>, ProviderError>;

    /// Plan changes for a resource. A null `proposed_state` plans a delete.
    async fn plan(
        &self,
        resource_type: &str,
        prior_state: Option<Value>,
        proposed_state: Value,
    ) -> Result<PlanResult, ProviderError>;

    /// Create a new resource.
    async fn create(&self, resource_type: &str, planned_state: Value) -> Result<Applied<Value>, OperationError>;

    /// Read the current state of a resource; `None` when it is gone.
    async fn read(&self, resource_type: &str, current_state: Value) -> Result<Option<Value>, ProviderError>;

    /// Update an existing resource.
    async fn update(
        &self,
        resource_type: &str,
        prior_state: Value,
        planned_state: Value,
    ) -> Result<Applied<Value>, OperationError>;

    /// Delete a resource.
    async fn delete(&self, resource_type: &str, current_state: Value) -> Result<Applied<()>, OperationError>;

    /// Import existing configuration into management.
    async fn import_resource(&self, resource_type: &str, id: &str) -> Result<Vec<ImportedResource>, ProviderError>;
}

/// A resource descriptor with its type erased, so descriptors with
/// different option types can share one registry.
#[async_trait]
trait DynResource<C: Client>: Send + Sync {
    fn schema(&self) -> Schema;

    fn validate(&self, state: &Value) -> Vec<Diagnostic>;

    async fn create(&self, orchestrator: &Orchestrator<C>, planned: Value) -> Result<Applied<Value>, OperationError>;

    async fn read(&self, orchestrator: &Orchestrator<C>, id: &str) -> Result<Option<Value>, ProviderError>;

    async fn update(
        &self,
        orchestrator: &Orchestrator<C>,
        prior_id: &str,
        planned: Value,
    ) -> Result<Applied<Value>, OperationError>;

    async fn delete(&self, orchestrator: &Orchestrator<C>, id: &str) -> Result<Applied<()>, OperationError>;

    async fn import(&self, orchestrator: &Orchestrator<C>, id: &str) -> Result<Value, ProviderError>;
}

struct Registered<R>(PhantomData<fn() -> R>);

#[async_trait]
impl<C: Client, R: Resource> DynResource<C> for Registered<R> {
    fn schema(&self) -> Schema {
        R::schema()
    }

    fn validate(&self, state: &Value) -> Vec<Diagnostic> {
        let diagnostics = validate(&R::schema(), state);
        if diagnostics.iter().any(Diagnostic::is_error) {
            return diagnostics;
        }
        match validate_options::<R>(state) {
            Ok(_) => diagnostics,
            Err(err) => vec![Diagnostic::from(&err)],
        }
    }

    async fn create(&self, orchestrator: &Orchestrator<C>, planned: Value) -> Result<Applied<Value>, OperationError> {
        orchestrator.create::<R>(planned).await
    }

    async fn read(&self, orchestrator: &Orchestrator<C>, id: &str) -> Result<Option<Value>, ProviderError> {
        orchestrator.read::<R>(id).await
    }

    async fn update(
        &self,
        orchestrator: &Orchestrator<C>,
        prior_id: &str,
        planned: Value,
    ) -> Result<Applied<Value>, OperationError> {
        // The object is keyed by its options, not by a computed `id` the
        // planned state may still carry.
        let planned_id = R::id(&validate_options::<R>(&planned)?);
        if planned_id != prior_id {
            return Err(ProviderError::Validation(format!(
                "cannot rename {} to {} in place",
                prior_id, planned_id
            ))
            .into());
        }
        orchestrator.update::<R>(planned).await
    }

    async fn delete(&self, orchestrator: &Orchestrator<C>, id: &str) -> Result<Applied<()>, OperationError> {
        orchestrator.delete::<R>(id).await
    }

    async fn import(&self, orchestrator: &Orchestrator<C>, id: &str) -> Result<Value, ProviderError> {
        orchestrator.import::<R>(id).await
    }
}

/// The Junos provider, generic over the device transport.
pub struct JunosProvider<B: ClientBuilder> {
    builder: B,
    resources: BTreeMap<&'static str, Box<dyn DynResource<B::Client>>>,
    orchestrator: RwLock<Option<Arc<Orchestrator<B::Client>>>>,
}

impl<B: ClientBuilder> JunosProvider<B> {
    /// A provider with every resource type of this crate registered.
    pub fn new(builder: B) -> Self {
        Self::empty(builder)
            .with_resource::<AsPath>()
            .with_resource::<Community>()
            .with_resource::<FirewallPolicer>()
            .with_resource::<EventDestination>()
            .with_resource::<IpsecVpn>()
    }

    /// A provider with no resource types.
    pub fn empty(builder: B) -> Self {
        Self {
            builder,
            resources: BTreeMap::new(),
            orchestrator: RwLock::new(None),
        }
    }

    /// Register a resource type.
    pub fn with_resource<R: Resource>(mut self) -> Self {
        self.resources
            .insert(R::TYPE_NAME, Box::new(Registered::<R>(PhantomData)));
        self
    }

    fn resource(&self, resource_type: &str) -> Result<&dyn DynResource<B::Client>, ProviderError> {
        self.resources
            .get(resource_type)
            .map(|r| r.as_ref())
            .ok_or_else(|| ProviderError::UnknownResource(resource_type.to_string()))
    }

    async fn orchestrator(&self) -> Result<Arc<Orchestrator<B::Client>>, ProviderError> {
        self.orchestrator
            .read()
            .await
            .clone()
            .ok_or_else(|| ProviderError::Configuration("provider is not configured".to_string()))
    }
}

/// Resource id carried in state: `id`, falling back to `name`.
fn state_id(state: &Value) -> Result<&str, ProviderError> {
    state
        .get("id")
        .and_then(Value::as_str)
        .filter(|id| !id.is_empty())
        .or_else(|| state.get("name").and_then(Value::as_str))
        .filter(|id| !id.is_empty())
        .ok_or_else(|| ProviderError::Validation("state carries no resource id".to_string()))
}

#[async_trait]
impl<B: ClientBuilder> ProviderService for JunosProvider<B> {
    fn schema(&self) -> ProviderSchema {
        self.resources.iter().fold(
            ProviderSchema::new().with_provider_config(ProviderConfig::schema()),
            |schema, (name, resource)| schema.with_resource(*name, resource.schema()),
        )
    }

    async fn validate_provider_config(&self, config: Value) -> Result<Vec<Diagnostic>, ProviderError> {
        let mut diagnostics = validate(&ProviderConfig::schema(), &config);
        if !diagnostics.iter().any(Diagnostic::is_error) {
            if let Err(err) = ProviderConfig::from_value(config) {
                diagnostics.push(Diagnostic::from(&err));
            }
        }
        Ok(diagnostics)
    }

    #[instrument(skip(self, config))]
    async fn configure(&self, config: Value) -> Result<Vec<Diagnostic>, ProviderError> {
        let diagnostics = validate(&ProviderConfig::schema(), &config);
        if diagnostics.iter().any(Diagnostic::is_error) {
            return Ok(diagnostics);
        }
        let config = ProviderConfig::from_value(config)?;
        let mut diagnostics = diagnostics;

        if !config.file_debug.is_empty() {
            if let Err(err) = try_init_logging_to_file(&config.file_debug) {
                diagnostics.push(
                    Diagnostic::warning("debug log file not enabled").with_detail(err.to_string()),
                );
            }
        }
        if let Some(path) = config.setfile() {
            diagnostics.push(Diagnostic::warning(format!(
                "create operations are written to {} instead of the device",
                path.display()
            )));
        }

        let client = self.builder.build(&config)?;
        let orchestrator = Orchestrator::from_config(client, &config);
        *self.orchestrator.write().await = Some(Arc::new(orchestrator));
        info!(host = %config.ip, port = config.port(), "Provider configured");
        Ok(diagnostics)
    }

    async fn stop(&self) -> Result<(), ProviderError> {
        if self.orchestrator.write().await.take().is_some() {
            info!("Provider stopped");
        }
        Ok(())
    }

    async fn validate_resource_config(
        &self,
        resource_type: &str,
        config: Value,
    ) -> Result<Vec<Diagnostic>, ProviderError> {
        Ok(self.resource(resource_type)?.validate(&config))
    }

    async fn plan(
        &self,
        resource_type: &str,
        prior_state: Option<Value>,
        proposed_state: Value,
    ) -> Result<PlanResult, ProviderError> {
        let schema = self.resource(resource_type)?.schema();
        Ok(PlanResult::diff(&schema, prior_state.as_ref(), proposed_state))
    }

    #[instrument(skip(self, planned_state))]
    async fn create(&self, resource_type: &str, planned_state: Value) -> Result<Applied<Value>, OperationError> {
        let resource = self.resource(resource_type)?;
        let orchestrator = self.orchestrator().await?;
        resource.create(&orchestrator, planned_state).await
    }

    #[instrument(skip(self, current_state))]
    async fn read(&self, resource_type: &str, current_state: Value) -> Result<Option<Value>, ProviderError> {
        let resource = self.resource(resource_type)?;
        let id = state_id(&current_state)?;
        let orchestrator = self.orchestrator().await?;
        resource.read(&orchestrator, id).await
    }

    #[instrument(skip(self, prior_state, planned_state))]
    async fn update(
        &self,
        resource_type: &str,
        prior_state: Value,
        planned_state: Value,
    ) -> Result<Applied<Value>, OperationError> {
        let resource = self.resource(resource_type)?;
        let prior_id = state_id(&prior_state)?;
        let orchestrator = self.orchestrator().await?;
        resource.update(&orchestrator, prior_id, planned_state).await
    }

    #[instrument(skip(self, current_state))]
    async fn delete(&self, resource_type: &str, current_state: Value) -> Result<Applied<()>, OperationError> {
        let resource = self.resource(resource_type)?;
        let id = state_id(&current_state)?;
        let orchestrator = self.orchestrator().await?;
        resource.delete(&orchestrator, id).await
    }

    #[instrument(skip(self))]
    async fn import_resource(&self, resource_type: &str, id: &str) -> Result<Vec<ImportedResource>, ProviderError> {
        let resource = self.resource(resource_type)?;
        let orchestrator = self.orchestrator().await?;
        match resource.import(&orchestrator, id).await {
            Ok(state) => Ok(vec![ImportedResource::new(resource_type, state)]),
            Err(err) => {
                warn!(error = %err, "Import failed");
                Err(err)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::FakeDevice;
    use serde_json::json;

    #[test]
    fn test_schema_lists_resources() {
        let provider = JunosProvider::new(FakeDevice::new());
        let schema = provider.schema();
        assert_eq!(schema.resources.len(), 5);
        assert!(schema.resources.contains_key("junos_firewall_policer"));
        assert!(schema.provider.block.attributes.contains_key("lock_timeout"));
        assert_eq!(
            provider.metadata().resources.first().map(String::as_str),
            Some("junos_eventoptions_destination")
        );
    }

    #[tokio::test]
    async fn test_unknown_resource() {
        let provider = JunosProvider::new(FakeDevice::new());
        let err = provider
            .validate_resource_config("junos_interface", json!({}))
            .await
            .unwrap_err();
        assert!(matches!(err, ProviderError::UnknownResource(_)));
    }

    #[tokio::test]
    async fn test_not_configured() {
        let provider = JunosProvider::new(FakeDevice::new());
        let err = provider
            .read("junos_policyoptions_as_path", json!({"id": "test"}))
            .await
            .unwrap_err();
        assert!(matches!(err, ProviderError::Configuration(_)));
    }

    #[tokio::test]
    async fn test_configure_rejects_bad_config() {
        let provider = JunosProvider::new(FakeDevice::new());
        let diagnostics = provider.configure(json!({"port": "830"})).await.unwrap();
        assert!(diagnostics.iter().any(Diagnostic::is_error));
        assert!(provider.orchestrator().await.is_err());
    }

    #[tokio::test]
    async fn test_configure_passes_command_pause() {
        let device = FakeDevice::new();
        let provider = JunosProvider::new(device.clone());
        assert_eq!(device.command_pause(), None);
        let diagnostics = provider
            .configure(json!({"cmd_sleep_short": 250}))
            .await
            .unwrap();
        assert!(!diagnostics.iter().any(Diagnostic::is_error));
        assert_eq!(device.command_pause(), Some(std::time::Duration::from_millis(250)));
    }

    #[tokio::test]
    async fn test_validate_provider_config_flags() {
        let provider = JunosProvider::new(FakeDevice::new());
        let diagnostics = provider
            .validate_provider_config(json!({"fake_delete_also": true}))
            .await
            .unwrap();
        assert_eq!(diagnostics.len(), 1);
        assert!(diagnostics[0].summary.contains("fake_delete_also"));
    }

    #[tokio::test]
    async fn test_update_refuses_rename() {
        let provider = JunosProvider::new(FakeDevice::new());
        provider.configure(json!({})).await.unwrap();
        let err = provider
            .update(
                "junos_policyoptions_as_path",
                json!({"id": "a", "name": "a", "path": "65000"}),
                json!({"name": "b", "path": "65000"}),
            )
            .await
            .unwrap_err();
        assert!(matches!(err.error, ProviderError::Validation(_)));
    }

    #[tokio::test]
    async fn test_update_refuses_rename_with_stale_id() {
        let device = FakeDevice::new().with_running(["set policy-options as-path a \"65000\""]);
        let provider = JunosProvider::new(device.clone());
        provider.configure(json!({})).await.unwrap();
        let err = provider
            .update(
                "junos_policyoptions_as_path",
                json!({"id": "a", "name": "a", "path": "65000"}),
                json!({"id": "a", "name": "b", "path": "65001"}),
            )
            .await
            .unwrap_err();
        assert!(matches!(err.error, ProviderError::Validation(_)));
        assert!(err.error.to_string().contains("cannot rename a to b"));
        assert_eq!(device.running(), vec![r#"set policy-options as-path a "65000""#]);
        assert_eq!(device.lock_attempts(), 0);
    }

    #[tokio::test]
    async fn test_update_keeps_name() {
        let device = FakeDevice::new().with_running(["set policy-options as-path a \"65000\""]);
        let provider = JunosProvider::new(device.clone());
        provider.configure(json!({})).await.unwrap();
        let applied = provider
            .update(
                "junos_policyoptions_as_path",
                json!({"id": "a", "name": "a", "path": "65000"}),
                json!({"id": "a", "name": "a", "path": "65001"}),
            )
            .await
            .unwrap();
        assert_eq!(applied.value["path"], "65001");
        assert_eq!(device.running(), vec![r#"set policy-options as-path a "65001""#]);
    }

    #[test]
    fn test_state_id_fallback() {
        assert_eq!(state_id(&json!({"id": "a", "name": "b"})).unwrap(), "a");
        assert_eq!(state_id(&json!({"name": "b"})).unwrap(), "b");
        assert!(state_id(&json!({"id": ""})).is_err());
    }
}
