//! Testing utilities.
//!
//! [`FakeDevice`] is an in-memory Junos device implementing the session
//! traits, with a running and a candidate configuration, an exclusive lock
//! and knobs to inject commit warnings and failures. [`ProviderTester`]
//! drives a [`ProviderService`] through plan/apply cycles the way a plugin
//! host would.
//!
//! # Example
//!
//! ```
//! use junos_provider::testing::{FakeDevice, ProviderTester};
//! use junos_provider::JunosProvider;
//! use serde_json::json;
//!
//! # tokio_test::block_on(async {
//! let device = FakeDevice::new();
//! let tester = ProviderTester::new(JunosProvider::new(device.clone()));
//! tester.configure(json!({})).await.unwrap();
//!
//! let state = tester
//!     .lifecycle_create(
//!         "junos_policyoptions_as_path",
//!         json!({"name": "test", "path": "65000 65001"}),
//!     )
//!     .await
//!     .unwrap();
//! assert_eq!(state["id"], "test");
//! assert_eq!(
//!     device.running(),
//!     vec![r#"set policy-options as-path test "65000 65001""#]
//! );
//! # });
//! ```

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;

use crate::config::ProviderConfig;
use crate::error::{OperationError, ProviderError};
use crate::parse::{split_word, trim_quotes};
use crate::provider::ProviderService;
use crate::render::{DELETE, SET};
use crate::schema::{Diagnostic, DiagnosticSeverity, ProviderSchema};
use crate::session::{Client, ClientBuilder, Session};
use crate::types::{Applied, ImportedResource, PlanResult};

const SHOW_CONFIGURATION: &str = "show configuration ";
const DISPLAY_SET_RELATIVE: &str = " | display set relative";
const DISPLAY_SET: &str = " | display set";

// Session id standing for a lock held outside the provider.
const FOREIGN_SESSION: u64 = 0;

/// A statement split into words, quotes kept.
type Statement = Vec<String>;

#[derive(Debug, Default)]
struct DeviceState {
    running: Vec<Statement>,
    candidate: Vec<Statement>,
    lock_holder: Option<u64>,
    next_session: u64,
    lock_attempts: usize,
    commit_warnings: Vec<String>,
    commit_failure: Option<String>,
    clear_failure: Option<String>,
    history: Vec<Vec<String>>,
    commits: Vec<String>,
    open_sessions: usize,
    show_delay: Duration,
    shows_in_flight: usize,
    max_shows_in_flight: usize,
    command_pause: Option<Duration>,
}

/// An in-memory Junos device.
///
/// Clones share the same device, so a test keeps one handle for assertions
/// and hands another to the provider as its [`ClientBuilder`].
#[derive(Debug, Clone, Default)]
pub struct FakeDevice {
    state: Arc<Mutex<DeviceState>>,
}

impl FakeDevice {
    /// An empty device.
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> MutexGuard<'_, DeviceState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Load `set` lines straight into the running configuration.
    pub fn with_running<I, S>(self, lines: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        {
            let mut state = self.state();
            for line in lines {
                let line = line.as_ref();
                let statement = words(line.strip_prefix(SET).unwrap_or(line));
                add_statement(&mut state.running, statement);
            }
        }
        self
    }

    /// The running configuration as `set` lines.
    pub fn running(&self) -> Vec<String> {
        self.state()
            .running
            .iter()
            .map(|statement| format!("{}{}", SET, statement.join(" ")))
            .collect()
    }

    /// Take the lock from outside the provider.
    pub fn hold_foreign_lock(&self) {
        self.state().lock_holder = Some(FOREIGN_SESSION);
    }

    /// Release a lock taken with [`FakeDevice::hold_foreign_lock`].
    pub fn release_foreign_lock(&self) {
        let mut state = self.state();
        if state.lock_holder == Some(FOREIGN_SESSION) {
            state.lock_holder = None;
        }
    }

    /// Whether any session holds the lock.
    pub fn is_locked(&self) -> bool {
        self.state().lock_holder.is_some()
    }

    /// Warnings returned by every successful commit.
    pub fn set_commit_warnings<I, S>(&self, warnings: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.state().commit_warnings = warnings.into_iter().map(Into::into).collect();
    }

    /// Make the next commit fail with `message`.
    pub fn fail_next_commit(&self, message: impl Into<String>) {
        self.state().commit_failure = Some(message.into());
    }

    /// Make the next candidate discard report `message`.
    pub fn fail_next_clear(&self, message: impl Into<String>) {
        self.state().clear_failure = Some(message.into());
    }

    /// Every batch passed to `config_set`, in order.
    pub fn history(&self) -> Vec<Vec<String>> {
        self.state().history.clone()
    }

    /// Messages of the successful commits, in order.
    pub fn commits(&self) -> Vec<String> {
        self.state().commits.clone()
    }

    /// Number of lock attempts made by sessions.
    pub fn lock_attempts(&self) -> usize {
        self.state().lock_attempts
    }

    /// Sessions started and not yet closed.
    pub fn open_sessions(&self) -> usize {
        self.state().open_sessions
    }

    /// Hold every `display set relative` command for `delay` before
    /// answering.
    pub fn set_show_delay(&self, delay: Duration) {
        self.state().show_delay = delay;
    }

    /// Pause between commands the device was built with, once configured.
    pub fn command_pause(&self) -> Option<Duration> {
        self.state().command_pause
    }

    /// Highest number of `display set relative` commands seen running at
    /// the same time.
    pub fn max_shows_in_flight(&self) -> usize {
        self.state().max_shows_in_flight
    }
}

impl ClientBuilder for FakeDevice {
    type Client = FakeDevice;

    fn build(&self, config: &ProviderConfig) -> Result<FakeDevice, ProviderError> {
        self.state().command_pause = Some(config.sleep_short());
        Ok(self.clone())
    }
}

#[async_trait]
impl Client for FakeDevice {
    type Session = FakeSession;

    async fn start_session(&self) -> Result<FakeSession, ProviderError> {
        let id = {
            let mut state = self.state();
            state.next_session += 1;
            state.open_sessions += 1;
            state.next_session
        };
        Ok(FakeSession {
            device: self.clone(),
            id,
        })
    }
}

/// A session opened on a [`FakeDevice`].
#[derive(Debug)]
pub struct FakeSession {
    device: FakeDevice,
    id: u64,
}

impl FakeSession {
    fn require_lock(&self, state: &DeviceState) -> Result<(), ProviderError> {
        if state.lock_holder == Some(self.id) {
            Ok(())
        } else {
            Err(ProviderError::Session(
                "configuration database not locked by this session".to_string(),
            ))
        }
    }
}

#[async_trait]
impl Session for FakeSession {
    async fn command(&self, command: &str) -> Result<String, ProviderError> {
        let unknown = || ProviderError::Session(format!("unknown command: {}", command));
        let target = command.strip_prefix(SHOW_CONFIGURATION).ok_or_else(unknown)?;
        let (path, relative) = match target.strip_suffix(DISPLAY_SET_RELATIVE) {
            Some(path) => (path, true),
            None => (target.strip_suffix(DISPLAY_SET).ok_or_else(unknown)?, false),
        };
        let path = words(path);

        if relative {
            let delay = {
                let mut state = self.device.state();
                state.shows_in_flight += 1;
                state.max_shows_in_flight = state.max_shows_in_flight.max(state.shows_in_flight);
                state.show_delay
            };
            if !delay.is_zero() {
                tokio::time::sleep(delay).await;
            }
        }

        let mut state = self.device.state();
        if relative {
            state.shows_in_flight -= 1;
        }
        let mut output = String::from("\n<configuration-output>\n");
        for statement in state.running.iter().filter(|s| starts_with(s, &path)) {
            let shown = if relative {
                &statement[path.len()..]
            } else {
                &statement[..]
            };
            if !shown.is_empty() {
                output.push_str(SET);
                output.push_str(&shown.join(" "));
                output.push('\n');
            }
        }
        output.push_str("</configuration-output>\n");
        Ok(output)
    }

    async fn config_set(&self, lines: &[String]) -> Result<(), ProviderError> {
        let mut state = self.device.state();
        self.require_lock(&state)?;
        state.history.push(lines.to_vec());
        for line in lines {
            if let Some(statement) = line.strip_prefix(SET) {
                add_statement(&mut state.candidate, words(statement));
            } else if let Some(path) = line.strip_prefix(DELETE) {
                let path = words(path);
                state.candidate.retain(|s| !starts_with(s, &path));
            } else {
                return Err(ProviderError::Session(format!("syntax error: {}", line)));
            }
        }
        Ok(())
    }

    async fn config_lock(&self) -> Result<bool, ProviderError> {
        let mut state = self.device.state();
        state.lock_attempts += 1;
        match state.lock_holder {
            Some(holder) => Ok(holder == self.id),
            None => {
                state.lock_holder = Some(self.id);
                state.candidate = state.running.clone();
                Ok(true)
            }
        }
    }

    async fn commit(&self, message: &str) -> Result<Vec<String>, ProviderError> {
        let mut state = self.device.state();
        self.require_lock(&state)?;
        if let Some(failure) = state.commit_failure.take() {
            return Err(ProviderError::Commit(failure));
        }
        let candidate = std::mem::take(&mut state.candidate);
        state.running = candidate;
        state.lock_holder = None;
        state.commits.push(message.to_string());
        Ok(state.commit_warnings.clone())
    }

    async fn config_clear(&self) -> Vec<String> {
        let mut state = self.device.state();
        if state.lock_holder == Some(self.id) {
            state.candidate.clear();
            state.lock_holder = None;
        }
        state.clear_failure.take().into_iter().collect()
    }

    async fn close(&self) -> Result<(), ProviderError> {
        let mut state = self.device.state();
        state.open_sessions = state.open_sessions.saturating_sub(1);
        if state.lock_holder == Some(self.id) {
            state.lock_holder = None;
        }
        Ok(())
    }
}

fn words(line: &str) -> Statement {
    let mut out = Vec::new();
    let mut rest = line.trim();
    while !rest.is_empty() {
        let (word, tail) = split_word(rest);
        out.push(word.to_string());
        rest = tail;
    }
    out
}

// Quotes are not significant when comparing paths.
fn starts_with(statement: &[String], path: &[String]) -> bool {
    statement.len() >= path.len()
        && statement
            .iter()
            .zip(path)
            .all(|(a, b)| trim_quotes(a) == trim_quotes(b))
}

fn add_statement(config: &mut Vec<Statement>, statement: Statement) {
    let exists = config
        .iter()
        .any(|s| s.len() == statement.len() && starts_with(s, &statement));
    if !exists {
        config.push(statement);
    }
}

/// A test harness driving a [`ProviderService`] like a plugin host.
pub struct ProviderTester<P: ProviderService> {
    provider: P,
}

impl<P: ProviderService> ProviderTester<P> {
    /// Create a new tester for the given provider.
    pub fn new(provider: P) -> Self {
        Self { provider }
    }

    /// Get a reference to the underlying provider.
    pub fn provider(&self) -> &P {
        &self.provider
    }

    /// Get the provider's schema.
    pub fn schema(&self) -> ProviderSchema {
        self.provider.schema()
    }

    /// Get the list of resource type names.
    pub fn resource_types(&self) -> Vec<String> {
        self.provider.metadata().resources
    }

    /// Configure the provider, failing on error diagnostics.
    pub async fn configure(&self, config: Value) -> Result<Vec<Diagnostic>, TestError> {
        let diagnostics = self.provider.configure(config).await?;
        check_diagnostics(diagnostics)
    }

    /// Validate a resource configuration, failing on error diagnostics.
    pub async fn validate_resource_config(&self, resource_type: &str, config: Value) -> Result<(), TestError> {
        let diagnostics = self
            .provider
            .validate_resource_config(resource_type, config)
            .await?;
        check_diagnostics(diagnostics).map(drop)
    }

    /// Plan a resource creation (no prior state).
    pub async fn plan_create(&self, resource_type: &str, proposed_state: Value) -> Result<PlanResult, ProviderError> {
        self.provider.plan(resource_type, None, proposed_state).await
    }

    /// Plan a resource update.
    pub async fn plan_update(
        &self,
        resource_type: &str,
        prior_state: Value,
        proposed_state: Value,
    ) -> Result<PlanResult, ProviderError> {
        self.provider
            .plan(resource_type, Some(prior_state), proposed_state)
            .await
    }

    /// Plan a resource deletion.
    pub async fn plan_delete(&self, resource_type: &str, prior_state: Value) -> Result<PlanResult, ProviderError> {
        self.provider
            .plan(resource_type, Some(prior_state), Value::Null)
            .await
    }

    /// Create a new resource.
    pub async fn create(&self, resource_type: &str, planned_state: Value) -> Result<Applied<Value>, OperationError> {
        self.provider.create(resource_type, planned_state).await
    }

    /// Read the current state of a resource.
    pub async fn read(&self, resource_type: &str, current_state: Value) -> Result<Option<Value>, ProviderError> {
        self.provider.read(resource_type, current_state).await
    }

    /// Update an existing resource.
    pub async fn update(
        &self,
        resource_type: &str,
        prior_state: Value,
        planned_state: Value,
    ) -> Result<Applied<Value>, OperationError> {
        self.provider
            .update(resource_type, prior_state, planned_state)
            .await
    }

    /// Delete a resource.
    pub async fn delete(&self, resource_type: &str, current_state: Value) -> Result<Applied<()>, OperationError> {
        self.provider.delete(resource_type, current_state).await
    }

    /// Import an existing resource.
    pub async fn import_resource(&self, resource_type: &str, id: &str) -> Result<Vec<ImportedResource>, ProviderError> {
        self.provider.import_resource(resource_type, id).await
    }

    /// Run validate -> plan -> create -> read.
    ///
    /// Returns the state after read.
    pub async fn lifecycle_create(&self, resource_type: &str, config: Value) -> Result<Value, TestError> {
        self.validate_resource_config(resource_type, config.clone())
            .await?;
        let plan = self.plan_create(resource_type, config).await?;
        let created = self.create(resource_type, plan.planned_state).await?;
        self.read_back(resource_type, created.value).await
    }

    /// Run validate -> plan -> update -> read.
    ///
    /// Returns the state after read.
    pub async fn lifecycle_update(
        &self,
        resource_type: &str,
        prior_state: Value,
        config: Value,
    ) -> Result<Value, TestError> {
        self.validate_resource_config(resource_type, config.clone())
            .await?;
        let plan = self
            .plan_update(resource_type, prior_state.clone(), config)
            .await?;
        if plan.requires_replace {
            self.delete(resource_type, prior_state).await?;
            let created = self
                .create(resource_type, without_id(plan.planned_state))
                .await?;
            return self.read_back(resource_type, created.value).await;
        }
        let updated = self
            .update(resource_type, prior_state, plan.planned_state)
            .await?;
        self.read_back(resource_type, updated.value).await
    }

    /// Run plan -> delete.
    pub async fn lifecycle_delete(&self, resource_type: &str, current_state: Value) -> Result<(), TestError> {
        self.plan_delete(resource_type, current_state.clone())
            .await?;
        self.delete(resource_type, current_state).await?;
        Ok(())
    }

    /// Run create -> update -> delete.
    ///
    /// Returns the state after the update (before delete).
    pub async fn lifecycle_crud(
        &self,
        resource_type: &str,
        initial_config: Value,
        updated_config: Value,
    ) -> Result<Value, TestError> {
        let created = self.lifecycle_create(resource_type, initial_config).await?;
        let updated = self
            .lifecycle_update(resource_type, created, updated_config)
            .await?;
        self.lifecycle_delete(resource_type, updated.clone())
            .await?;
        Ok(updated)
    }

    async fn read_back(&self, resource_type: &str, state: Value) -> Result<Value, TestError> {
        self.read(resource_type, state)
            .await?
            .ok_or_else(|| TestError::Provider(ProviderError::NotFound(resource_type.to_string())))
    }
}

fn without_id(mut state: Value) -> Value {
    if let Value::Object(map) = &mut state {
        map.remove("id");
    }
    state
}

/// Error type for test operations that may fail with diagnostics.
#[derive(Debug)]
pub enum TestError {
    /// The operation failed with diagnostics.
    Diagnostics(Vec<Diagnostic>),
    /// The operation failed with a provider error.
    Provider(ProviderError),
    /// An apply failed; warnings collected before the failure are kept.
    Operation(OperationError),
}

impl std::fmt::Display for TestError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TestError::Diagnostics(diags) => {
                writeln!(f, "Operation failed with {} diagnostic(s):", diags.len())?;
                for diag in diags {
                    write!(f, "  [{:?}] {}", diag.severity, diag.summary)?;
                    if let Some(detail) = &diag.detail {
                        write!(f, ": {}", detail)?;
                    }
                    if let Some(attr) = &diag.attribute {
                        write!(f, " (at {})", attr)?;
                    }
                    writeln!(f)?;
                }
                Ok(())
            }
            TestError::Provider(e) => write!(f, "Provider error: {}", e),
            TestError::Operation(e) => write!(f, "Apply failed: {}", e),
        }
    }
}

impl std::error::Error for TestError {}

impl From<ProviderError> for TestError {
    fn from(e: ProviderError) -> Self {
        TestError::Provider(e)
    }
}

impl From<OperationError> for TestError {
    fn from(e: OperationError) -> Self {
        TestError::Operation(e)
    }
}

/// Return the diagnostics unless one of them is an error.
fn check_diagnostics(diagnostics: Vec<Diagnostic>) -> Result<Vec<Diagnostic>, TestError> {
    if diagnostics.iter().any(Diagnostic::is_error) {
        let errors = diagnostics.into_iter().filter(Diagnostic::is_error).collect();
        Err(TestError::Diagnostics(errors))
    } else {
        Ok(diagnostics)
    }
}

/// Assert that a plan has no changes.
///
/// # Panics
///
/// Panics if the plan has any changes.
pub fn assert_plan_no_changes(plan: &PlanResult) {
    assert!(
        plan.changes.is_empty(),
        "Expected no changes, but got {} change(s): {:?}",
        plan.changes.len(),
        plan.changes.iter().map(|c| &c.path).collect::<Vec<_>>()
    );
}

/// Assert that a plan requires resource replacement.
///
/// # Panics
///
/// Panics if the plan does not require replacement.
pub fn assert_plan_replaces(plan: &PlanResult) {
    assert!(
        plan.requires_replace,
        "Expected plan to require replacement, but it does not"
    );
}

/// Assert that a plan has a change for a specific attribute.
///
/// # Panics
///
/// Panics if the plan does not change the attribute.
pub fn assert_plan_changes_attribute(plan: &PlanResult, path: &str) {
    assert!(
        plan.changes.iter().any(|c| c.path == path),
        "Expected plan to change attribute '{}'. Changed attributes: {:?}",
        path,
        plan.changes.iter().map(|c| &c.path).collect::<Vec<_>>()
    );
}

/// Assert that diagnostics contain no errors.
///
/// # Panics
///
/// Panics if there are any error diagnostics.
pub fn assert_no_errors(diagnostics: &[Diagnostic]) {
    let errors: Vec<_> = diagnostics.iter().filter(|d| d.is_error()).collect();
    assert!(
        errors.is_empty(),
        "Expected no errors, but got {} error(s): {:?}",
        errors.len(),
        errors.iter().map(|d| &d.summary).collect::<Vec<_>>()
    );
}

/// Assert that diagnostics contain an error with the given summary substring.
///
/// # Panics
///
/// Panics if no error diagnostic contains the given substring.
pub fn assert_error_contains(diagnostics: &[Diagnostic], substring: &str) {
    assert!(
        diagnostics
            .iter()
            .any(|d| d.is_error() && d.summary.contains(substring)),
        "Expected an error containing '{}'. Errors: {:?}",
        substring,
        diagnostics
            .iter()
            .filter(|d| d.is_error())
            .map(|d| &d.summary)
            .collect::<Vec<_>>()
    );
}

/// Assert that diagnostics contain a warning with the given summary substring.
///
/// # Panics
///
/// Panics if no warning diagnostic contains the given substring.
pub fn assert_warning_contains(diagnostics: &[Diagnostic], substring: &str) {
    assert!(
        diagnostics
            .iter()
            .any(|d| d.severity == DiagnosticSeverity::Warning && d.summary.contains(substring)),
        "Expected a warning containing '{}'. Warnings: {:?}",
        substring,
        diagnostics
            .iter()
            .filter(|d| d.severity == DiagnosticSeverity::Warning)
            .map(|d| &d.summary)
            .collect::<Vec<_>>()
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_device_show_relative_and_full() {
        let device = FakeDevice::new().with_running([
            r#"set event-options destinations "x" archive-sites "ftp://h/""#,
            "set event-options destinations y transfer-delay 5",
        ]);
        let session = device.start_session().await.unwrap();

        let show = session
            .command(r#"show configuration event-options destinations "x" | display set relative"#)
            .await
            .unwrap();
        assert!(show.contains("set archive-sites \"ftp://h/\"\n"));
        assert!(!show.contains("transfer-delay"));

        let show = session
            .command("show configuration event-options destinations y | display set")
            .await
            .unwrap();
        assert!(show.contains("set event-options destinations y transfer-delay 5\n"));
    }

    #[tokio::test]
    async fn test_device_candidate_isolated_until_commit() {
        let device = FakeDevice::new();
        let session = device.start_session().await.unwrap();
        assert!(session.config_set(&["set a b".to_string()]).await.is_err());

        assert!(session.config_lock().await.unwrap());
        session
            .config_set(&["set a b".to_string(), "set a b".to_string()])
            .await
            .unwrap();
        assert!(device.running().is_empty());

        let warnings = session.commit("test").await.unwrap();
        assert!(warnings.is_empty());
        assert_eq!(device.running(), vec!["set a b"]);
        assert!(!device.is_locked());
        assert_eq!(device.commits(), vec!["test"]);
    }

    #[tokio::test]
    async fn test_device_delete_by_prefix() {
        let device = FakeDevice::new().with_running(["set a b c", "set a b d", "set a e"]);
        let session = device.start_session().await.unwrap();
        assert!(session.config_lock().await.unwrap());
        session
            .config_set(&["delete a \"b\"".to_string()])
            .await
            .unwrap();
        session.commit("delete").await.unwrap();
        assert_eq!(device.running(), vec!["set a e"]);
    }

    #[tokio::test]
    async fn test_device_foreign_lock_and_clear() {
        let device = FakeDevice::new();
        device.hold_foreign_lock();
        let session = device.start_session().await.unwrap();
        assert!(!session.config_lock().await.unwrap());
        device.release_foreign_lock();
        assert!(session.config_lock().await.unwrap());
        assert_eq!(device.lock_attempts(), 2);

        device.fail_next_clear("error: configuration database modified");
        let messages = session.config_clear().await;
        assert_eq!(messages.len(), 1);
        assert!(!device.is_locked());
    }

    #[test]
    fn test_words_keep_quoted_spaces() {
        assert_eq!(
            words(r#"policy-options as-path test "65000 65001""#),
            vec!["policy-options", "as-path", "test", "\"65000 65001\""]
        );
    }

    #[test]
    fn test_test_error_display() {
        let err = TestError::Diagnostics(vec![
            Diagnostic::error("First error").with_attribute("field1"),
            Diagnostic::error("Second error").with_detail("More info"),
        ]);

        let display = format!("{}", err);
        assert!(display.contains("First error"));
        assert!(display.contains("Second error"));
        assert!(display.contains("field1"));
        assert!(display.contains("More info"));
    }

    #[test]
    fn test_assert_helpers() {
        let diagnostics = vec![Diagnostic::warning("statement has no effect")];
        assert_no_errors(&diagnostics);
        assert_warning_contains(&diagnostics, "no effect");

        let diagnostics = vec![Diagnostic::error("Invalid configuration value")];
        assert_error_contains(&diagnostics, "Invalid");
    }

    #[test]
    #[should_panic(expected = "Expected no errors")]
    fn test_assert_no_errors_fails() {
        assert_no_errors(&[Diagnostic::error("An error")]);
    }

    #[tokio::test]
    async fn test_tester_crud_lifecycle() {
        let device = FakeDevice::new();
        let tester = ProviderTester::new(crate::JunosProvider::new(device.clone()));
        tester.configure(json!({})).await.unwrap();
        assert!(tester
            .resource_types()
            .contains(&"junos_policyoptions_community".to_string()));

        let updated = tester
            .lifecycle_crud(
                "junos_policyoptions_community",
                json!({"name": "c1", "members": ["65000:100"]}),
                json!({"name": "c1", "members": ["65000:200"], "invert_match": true}),
            )
            .await
            .unwrap();
        assert_eq!(updated["members"], json!(["65000:200"]));
        assert_eq!(updated["invert_match"], true);
        assert!(device.running().is_empty());
        assert_eq!(
            device.commits(),
            vec![
                "create resource junos_policyoptions_community",
                "update resource junos_policyoptions_community",
                "delete resource junos_policyoptions_community",
            ]
        );
    }
}
