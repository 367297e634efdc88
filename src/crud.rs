//! The create/read/update/delete lifecycle shared by every resource.
//!
//! Writes follow the same shape for all resource types:
//!
//! ```text
//! lock -> (check) -> config_set -> commit "<verb> resource <type>" -> re-check -> read-back
//! ```
//!
//! Once the lock is held, any failure discards the candidate with
//! `config_clear` before returning, so a failed apply never leaves the
//! device locked with half-staged statements. Commit warnings and clear
//! failures are returned as warning diagnostics next to the result or the
//! error.
//!
//! Reads take no device lock. Their show and decode phase runs under a
//! mutex owned by the orchestrator, shared by all resource types using the
//! same client.

use std::path::Path;
use std::time::Duration;

use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;
use tracing::{debug, info, instrument, warn};

use crate::config::ProviderConfig;
use crate::error::{OperationError, ProviderError};
use crate::resource::{describe, from_state, to_state, Resource};
use crate::parse::is_empty_output;
use crate::schema::Diagnostic;
use crate::session::{config_exists, show_config_relative_command, Client, Session};
use crate::types::Applied;
use crate::validation::validate;

/// Lock retry settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LockPolicy {
    /// Pause between two attempts.
    pub retry_interval: Duration,
    /// Give up after this long.
    pub timeout: Duration,
}

impl LockPolicy {
    /// Take the policy from the provider configuration.
    pub fn from_config(config: &ProviderConfig) -> Self {
        Self {
            retry_interval: config.sleep_lock(),
            timeout: config.lock_timeout(),
        }
    }
}

/// Set-file mode: lines go to a file instead of the device.
#[derive(Debug, Clone, PartialEq, Eq)]
struct SetFile {
    path: std::path::PathBuf,
    update_also: bool,
    delete_also: bool,
}

/// Runs resource lifecycles against one client.
pub struct Orchestrator<C: Client> {
    client: C,
    lock_policy: LockPolicy,
    setfile: Option<SetFile>,
    read_lock: Mutex<()>,
}

type OpResult<T> = Result<Applied<T>, OperationError>;

impl<C: Client> Orchestrator<C> {
    /// Create an orchestrator with the given lock policy.
    pub fn new(client: C, lock_policy: LockPolicy) -> Self {
        Self {
            client,
            lock_policy,
            setfile: None,
            read_lock: Mutex::new(()),
        }
    }

    /// Create an orchestrator configured from the provider settings.
    pub fn from_config(client: C, config: &ProviderConfig) -> Self {
        let mut orchestrator = Self::new(client, LockPolicy::from_config(config));
        orchestrator.setfile = config.setfile().map(|path| SetFile {
            path,
            update_also: config.fake_update_also,
            delete_also: config.fake_delete_also,
        });
        orchestrator
    }

    /// Create the object described by `planned` and return its state.
    #[instrument(skip(self, planned), fields(resource = R::TYPE_NAME))]
    pub async fn create<R: Resource>(&self, planned: serde_json::Value) -> OpResult<serde_json::Value> {
        let options = validate_options::<R>(&planned)?;
        let id = R::id(&options);

        if let Some(setfile) = &self.setfile {
            append_lines(&setfile.path, &R::render(&options)).await?;
            info!(id = %id, path = %setfile.path.display(), "Create written to set file");
            return Ok(Applied::new(to_state::<R>(&options)?));
        }

        let session = self.client.start_session().await?;
        let result = self.create_with_session::<R>(&session, &options, &id).await;
        close(session).await;
        result
    }

    async fn create_with_session<R: Resource>(
        &self,
        session: &C::Session,
        options: &R::Options,
        id: &str,
    ) -> OpResult<serde_json::Value> {
        self.lock(session).await?;
        let mut warnings = Vec::new();

        let staged = async {
            if config_exists(session, &R::config_path(id)).await? {
                return Err(ProviderError::AlreadyExists(describe::<R>(id)));
            }
            session.config_set(&R::render(options)).await
        }
        .await;
        if let Err(err) = staged {
            return Err(clear(session, err, warnings).await);
        }
        self.commit(session, &format!("create resource {}", R::TYPE_NAME), &mut warnings)
            .await?;

        match config_exists(session, &R::config_path(id)).await {
            Ok(true) => {}
            Ok(false) => {
                return Err(OperationError::new(
                    ProviderError::Consistency(format!(
                        "{} not exists after commit",
                        describe::<R>(id)
                    )),
                    warnings,
                ))
            }
            Err(err) => return Err(OperationError::new(err, warnings)),
        }
        info!(id = %id, "Created");

        match self.read_with_session::<R>(session, id).await {
            Ok(Some(read)) => Ok(Applied::with_warnings(read, warnings)),
            Ok(None) => Err(OperationError::new(
                ProviderError::NotFound(describe::<R>(id)),
                warnings,
            )),
            Err(err) => Err(OperationError::new(err, warnings)),
        }
    }

    /// Read the object with the given id.
    ///
    /// Returns `None` when it no longer exists on the device; the caller
    /// should forget the resource.
    #[instrument(skip(self), fields(resource = R::TYPE_NAME))]
    pub async fn read<R: Resource>(&self, id: &str) -> Result<Option<serde_json::Value>, ProviderError> {
        let session = self.client.start_session().await?;
        let result = self.read_with_session::<R>(&session, id).await;
        close(session).await;
        if matches!(result, Ok(None)) {
            info!(id = %id, "Not found on device, dropping from state");
        }
        result
    }

    async fn read_with_session<R: Resource>(
        &self,
        session: &C::Session,
        id: &str,
    ) -> Result<Option<serde_json::Value>, ProviderError> {
        let options = {
            let _guard = self.read_lock.lock().await;
            let show = session
                .command(&show_config_relative_command(&R::config_path(id)))
                .await?;
            if is_empty_output(&show) {
                return Ok(None);
            }
            R::parse(id, &show)?
        };
        debug!(id = %id, ?options, "Decoded");
        to_state::<R>(&options).map(Some)
    }

    /// Replace the object's statements with the ones from `planned`.
    #[instrument(skip(self, planned), fields(resource = R::TYPE_NAME))]
    pub async fn update<R: Resource>(&self, planned: serde_json::Value) -> OpResult<serde_json::Value> {
        let options = validate_options::<R>(&planned)?;
        let id = R::id(&options);
        let mut lines = R::render_delete(&id);
        lines.extend(R::render(&options));

        if let Some(setfile) = self.setfile.as_ref().filter(|s| s.update_also) {
            append_lines(&setfile.path, &lines).await?;
            info!(id = %id, "Update written to set file");
            return Ok(Applied::new(to_state::<R>(&options)?));
        }

        let session = self.client.start_session().await?;
        let result = self.update_with_session::<R>(&session, &lines, &id).await;
        close(session).await;
        result
    }

    async fn update_with_session<R: Resource>(
        &self,
        session: &C::Session,
        lines: &[String],
        id: &str,
    ) -> OpResult<serde_json::Value> {
        self.lock(session).await?;
        let mut warnings = Vec::new();
        if let Err(err) = session.config_set(lines).await {
            return Err(clear(session, err, warnings).await);
        }
        self.commit(session, &format!("update resource {}", R::TYPE_NAME), &mut warnings)
            .await?;
        info!(id = %id, "Updated");

        match self.read_with_session::<R>(session, id).await {
            Ok(Some(read)) => Ok(Applied::with_warnings(read, warnings)),
            Ok(None) => Err(OperationError::new(
                ProviderError::Consistency(format!(
                    "{} not exists after commit",
                    describe::<R>(id)
                )),
                warnings,
            )),
            Err(err) => Err(OperationError::new(err, warnings)),
        }
    }

    /// Remove the object with the given id.
    #[instrument(skip(self), fields(resource = R::TYPE_NAME))]
    pub async fn delete<R: Resource>(&self, id: &str) -> OpResult<()> {
        let lines = R::render_delete(id);

        if let Some(setfile) = self.setfile.as_ref().filter(|s| s.delete_also) {
            append_lines(&setfile.path, &lines).await?;
            info!(id = %id, "Delete written to set file");
            return Ok(Applied::new(()));
        }

        let session = self.client.start_session().await?;
        let result = self.delete_with_session::<R>(&session, &lines, id).await;
        close(session).await;
        result
    }

    async fn delete_with_session<R: Resource>(
        &self,
        session: &C::Session,
        lines: &[String],
        id: &str,
    ) -> OpResult<()> {
        self.lock(session).await?;
        let mut warnings = Vec::new();
        if let Err(err) = session.config_set(lines).await {
            return Err(clear(session, err, warnings).await);
        }
        self.commit(session, &format!("delete resource {}", R::TYPE_NAME), &mut warnings)
            .await?;

        match config_exists(session, &R::config_path(id)).await {
            Ok(false) => {
                info!(id = %id, "Deleted");
                Ok(Applied::with_warnings((), warnings))
            }
            Ok(true) => Err(OperationError::new(
                ProviderError::Consistency(format!(
                    "{} still exists after commit",
                    describe::<R>(id)
                )),
                warnings,
            )),
            Err(err) => Err(OperationError::new(err, warnings)),
        }
    }

    /// Read an existing object for import.
    #[instrument(skip(self), fields(resource = R::TYPE_NAME))]
    pub async fn import<R: Resource>(&self, id: &str) -> Result<serde_json::Value, ProviderError> {
        self.read::<R>(id).await?.ok_or_else(|| {
            ProviderError::NotFound(format!("don't find {} with id '{}'", R::LABEL, id))
        })
    }

    async fn lock(&self, session: &C::Session) -> Result<(), OperationError> {
        let policy = self.lock_policy;
        let attempts = async {
            loop {
                if session.config_lock().await? {
                    return Ok::<(), ProviderError>(());
                }
                debug!(retry_in = ?policy.retry_interval, "Configuration locked by another session");
                tokio::time::sleep(policy.retry_interval).await;
            }
        };
        match tokio::time::timeout(policy.timeout, attempts).await {
            Ok(result) => Ok(result?),
            Err(_) => Err(ProviderError::LockTimeout(format!(
                "configuration still locked after {:?}",
                policy.timeout
            ))
            .into()),
        }
    }

    async fn commit(
        &self,
        session: &C::Session,
        message: &str,
        warnings: &mut Vec<Diagnostic>,
    ) -> Result<(), OperationError> {
        match session.commit(message).await {
            Ok(commit_warnings) => {
                for w in &commit_warnings {
                    warn!(warning = %w, "Commit warning");
                }
                warnings.extend(commit_warnings.into_iter().map(Diagnostic::warning));
                Ok(())
            }
            Err(err) => Err(clear(session, err, std::mem::take(warnings)).await),
        }
    }
}

/// Validate state against the schema and the resource's own checks.
///
/// Runs before any session is opened.
pub fn validate_options<R: Resource>(state: &serde_json::Value) -> Result<R::Options, ProviderError> {
    let diagnostics = validate(&R::schema(), state);
    if let Some(first) = diagnostics.iter().find(|d| d.is_error()) {
        let summary = match &first.detail {
            Some(detail) => format!("{}: {}", first.summary, detail),
            None => first.summary.clone(),
        };
        return Err(ProviderError::Validation(summary));
    }
    let options = from_state::<R>(state.clone())?;
    if R::id(&options).is_empty() {
        return Err(ProviderError::Validation(format!(
            "{} requires a non-empty name",
            R::TYPE_NAME
        )));
    }
    R::validate(&options)?;
    Ok(options)
}

/// Discard the candidate after `err` and wrap everything for the caller.
async fn clear<S: Session>(session: &S, err: ProviderError, mut warnings: Vec<Diagnostic>) -> OperationError {
    warn!(error = %err, "Discarding candidate configuration");
    for failure in session.config_clear().await {
        warn!(error = %failure, "Clearing candidate failed");
        warnings.push(Diagnostic::warning(failure));
    }
    OperationError::new(err, warnings)
}

async fn close<S: Session>(session: S) {
    if let Err(err) = session.close().await {
        warn!(error = %err, "Closing session failed");
    }
}

async fn append_lines(path: &Path, lines: &[String]) -> Result<(), ProviderError> {
    let mut file = tokio::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .await?;
    let mut buf = lines.join("\n");
    buf.push('\n');
    file.write_all(buf.as_bytes()).await?;
    file.flush().await?;
    Ok(())
}
