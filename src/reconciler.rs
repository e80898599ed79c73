//! Reconciler for custom field sets.
//!
//! This module implements install and uninstall: it walks the field sets a
//! manifest declares, looks up the matching stored record by name, and
//! deletes or recreates it. Definitions are processed in manifest order and
//! each store call completes before the next one starts.
//!
//! Install never updates a record in place. An existing record is deleted
//! and a new one created from the manifest, so fields removed from the
//! manifest cannot survive a reinstall. The stored id changes every time.

use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::context::ExecutionContext;
use crate::error::Result;
use crate::manifest::{DefinitionHasher, FieldSetDefinition, ManifestLoader, XmlManifestLoader};
use crate::store::{FieldSetRecord, FieldSetStore, StoredFieldSet};

/// Reconciler between a manifest and a field-set store.
pub struct FieldSetReconciler<'a, S: FieldSetStore, L: ManifestLoader = XmlManifestLoader> {
    /// Field-set store.
    store: &'a S,
    /// Manifest loader.
    loader: &'a L,
    /// Fingerprint hasher for drift checks.
    hasher: DefinitionHasher,
}

/// Reconciliation mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    /// Make the store match the manifest.
    Install,
    /// Remove manifest-declared sets from the store.
    Uninstall,
}

/// What happened to one field set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ActionType {
    /// No record existed; a new one was created.
    Created,
    /// An existing record was deleted and recreated.
    Replaced,
    /// An existing record was deleted.
    Removed,
    /// No record existed; nothing was done.
    Skipped,
}

/// Outcome for a single field set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldSetAction {
    /// Field-set name.
    pub name: String,
    /// Action taken.
    pub action: ActionType,
    /// Id of the record that was deleted, if any.
    pub previous_id: Option<String>,
    /// Id of the record that was created, if any.
    pub id: Option<String>,
}

/// Result of an install or uninstall run.
#[derive(Debug, Clone, Serialize)]
pub struct ReconciliationResult {
    /// Mode that ran.
    pub mode: Mode,
    /// Manifest that was applied.
    pub manifest: PathBuf,
    /// One entry per field set, in manifest order.
    pub actions: Vec<FieldSetAction>,
}

/// Drift state of one field set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum DriftStatus {
    /// No stored record carries the name.
    Missing,
    /// The stored record matches the manifest.
    InSync,
    /// The stored record differs from the manifest.
    Drifted,
}

/// Drift details for one field set.
#[derive(Debug, Clone, Serialize)]
pub struct DriftEntry {
    /// Field-set name.
    pub name: String,
    /// Drift state.
    pub status: DriftStatus,
    /// Fingerprint of the manifest definition.
    pub desired_hash: String,
    /// Fingerprint of the stored record, if one exists.
    pub stored_hash: Option<String>,
    /// Id of the stored record, if one exists.
    pub stored_id: Option<String>,
}

/// Report of drift detection.
#[derive(Debug, Clone, Serialize)]
pub struct DriftReport {
    /// Manifest that was checked.
    pub manifest: PathBuf,
    /// One entry per field set, in manifest order.
    pub entries: Vec<DriftEntry>,
}

impl<'a, S: FieldSetStore, L: ManifestLoader> FieldSetReconciler<'a, S, L> {
    /// Creates a new reconciler.
    #[must_use]
    pub const fn new(store: &'a S, loader: &'a L) -> Self {
        Self {
            store,
            loader,
            hasher: DefinitionHasher::new(),
        }
    }

    /// Installs the field sets declared by the manifest at `path`.
    ///
    /// Each set is deleted (if present) and recreated under an elevated copy
    /// of `context`. The search index is refreshed once afterwards under
    /// `context` itself. A manifest without field sets makes no store calls.
    ///
    /// # Errors
    ///
    /// Returns manifest errors from the loader and store errors unchanged.
    /// Sets processed before a failure stay applied.
    pub async fn install(
        &self,
        path: &Path,
        context: &ExecutionContext,
    ) -> Result<ReconciliationResult> {
        let manifest = self.loader.load(path)?;
        let mut result = ReconciliationResult::new(Mode::Install, path);

        if manifest.is_empty() {
            info!("Manifest {} declares no custom field sets", path.display());
            return Ok(result);
        }

        info!(
            "Installing {} custom field set(s) from {}",
            manifest.field_sets().len(),
            path.display()
        );

        for definition in manifest.field_sets() {
            let scoped = context.elevated();
            let previous_id = self.delete_field_set(&definition.name, &scoped).await?;
            let stored = self.create_field_set(definition, &scoped).await?;

            let action = if previous_id.is_some() {
                ActionType::Replaced
            } else {
                ActionType::Created
            };
            result.actions.push(FieldSetAction {
                name: definition.name.clone(),
                action,
                previous_id,
                id: Some(stored.id),
            });
        }

        self.finish_batch(context).await?;
        Ok(result)
    }

    /// Removes the field sets declared by the manifest at `path`.
    ///
    /// Sets that are not stored are skipped, so repeating an uninstall is
    /// harmless. The search index is refreshed at the end unless `context`
    /// disables indexing.
    ///
    /// # Errors
    ///
    /// Returns manifest errors from the loader and store errors unchanged.
    pub async fn uninstall(
        &self,
        path: &Path,
        context: &ExecutionContext,
    ) -> Result<ReconciliationResult> {
        let manifest = self.loader.load(path)?;
        let mut result = ReconciliationResult::new(Mode::Uninstall, path);

        if manifest.is_empty() {
            info!("Manifest {} declares no custom field sets", path.display());
            return Ok(result);
        }

        info!(
            "Uninstalling {} custom field set(s) from {}",
            manifest.field_sets().len(),
            path.display()
        );

        for definition in manifest.field_sets() {
            let previous_id = self.delete_field_set(&definition.name, context).await?;

            let action = if previous_id.is_some() {
                ActionType::Removed
            } else {
                ActionType::Skipped
            };
            result.actions.push(FieldSetAction {
                name: definition.name.clone(),
                action,
                previous_id,
                id: None,
            });
        }

        self.finish_batch(context).await?;
        Ok(result)
    }

    /// Looks up the stored field set named `name`.
    ///
    /// # Errors
    ///
    /// Returns store errors unchanged.
    pub async fn lookup(
        &self,
        name: &str,
        context: &ExecutionContext,
    ) -> Result<Option<StoredFieldSet>> {
        self.store.find_by_name(name, context).await
    }

    /// Compares the manifest at `path` with the store without changing it.
    ///
    /// # Errors
    ///
    /// Returns manifest errors from the loader and store errors unchanged.
    pub async fn check_drift(&self, path: &Path, context: &ExecutionContext) -> Result<DriftReport> {
        let manifest = self.loader.load(path)?;
        info!("Checking drift for {}", path.display());

        let mut entries = Vec::with_capacity(manifest.field_sets().len());
        for definition in manifest.field_sets() {
            let desired_hash = self.hasher.hash_definition(definition);
            let stored = self.lookup(&definition.name, context).await?;

            let entry = match stored {
                None => DriftEntry {
                    name: definition.name.clone(),
                    status: DriftStatus::Missing,
                    desired_hash,
                    stored_hash: None,
                    stored_id: None,
                },
                Some(stored) => {
                    let stored_hash = self.hasher.hash_definition(&stored.payload);
                    let status = if stored_hash == desired_hash {
                        DriftStatus::InSync
                    } else {
                        DriftStatus::Drifted
                    };
                    DriftEntry {
                        name: definition.name.clone(),
                        status,
                        desired_hash,
                        stored_hash: Some(stored_hash),
                        stored_id: Some(stored.id),
                    }
                }
            };
            debug!("Field set {}: {:?}", entry.name, entry.status);
            entries.push(entry);
        }

        Ok(DriftReport {
            manifest: path.to_path_buf(),
            entries,
        })
    }

    /// Runs the index refresh deferred by the writes of a batch.
    ///
    /// Uses the caller's context, so an install refreshes once in the
    /// default scope after all elevated writes. Skipped when indexing is off.
    async fn finish_batch(&self, context: &ExecutionContext) -> Result<()> {
        if !context.indexing_enabled() {
            debug!("Indexing disabled, search index left as is");
            return Ok(());
        }

        self.store.refresh_index(context).await
    }

    /// Deletes the stored set named `name`, returning its id if one existed.
    async fn delete_field_set(
        &self,
        name: &str,
        context: &ExecutionContext,
    ) -> Result<Option<String>> {
        let Some(existing) = self.lookup(name, context).await? else {
            debug!("Custom field set {name} not stored, nothing to delete");
            return Ok(None);
        };

        self.store.delete_by_id(&existing.id, context).await?;
        debug!("Deleted custom field set {name} ({})", existing.id);
        Ok(Some(existing.id))
    }

    /// Creates a new stored set from a manifest definition.
    async fn create_field_set(
        &self,
        definition: &FieldSetDefinition,
        context: &ExecutionContext,
    ) -> Result<StoredFieldSet> {
        let stored = self
            .store
            .upsert(FieldSetRecord::from_definition(definition), context)
            .await?;
        debug!(
            "Created custom field set {} ({}) with {} field(s)",
            stored.name(),
            stored.id,
            stored.fields().len()
        );
        Ok(stored)
    }
}

impl ReconciliationResult {
    /// Creates an empty result.
    #[must_use]
    pub fn new(mode: Mode, manifest: &Path) -> Self {
        Self {
            mode,
            manifest: manifest.to_path_buf(),
            actions: Vec::new(),
        }
    }

    /// Returns the number of sets that received the given action.
    #[must_use]
    pub fn count(&self, action: ActionType) -> usize {
        self.actions.iter().filter(|a| a.action == action).count()
    }

    /// Returns true if the run changed nothing in the store.
    #[must_use]
    pub fn is_noop(&self) -> bool {
        self.actions.iter().all(|a| a.action == ActionType::Skipped)
    }
}

impl DriftReport {
    /// Returns true if any set is missing or drifted.
    #[must_use]
    pub fn has_drift(&self) -> bool {
        self.entries.iter().any(|e| e.status != DriftStatus::InSync)
    }

    /// Returns true if the store matches the manifest.
    #[must_use]
    pub fn is_converged(&self) -> bool {
        !self.has_drift()
    }

    /// Returns the number of sets in the given state.
    #[must_use]
    pub fn count(&self, status: DriftStatus) -> usize {
        self.entries.iter().filter(|e| e.status == status).count()
    }
}

impl std::fmt::Display for Mode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Install => write!(f, "install"),
            Self::Uninstall => write!(f, "uninstall"),
        }
    }
}

impl std::fmt::Display for ActionType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Created => write!(f, "created"),
            Self::Replaced => write!(f, "replaced"),
            Self::Removed => write!(f, "removed"),
            Self::Skipped => write!(f, "skipped"),
        }
    }
}

impl std::fmt::Display for DriftStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Missing => write!(f, "missing"),
            Self::InSync => write!(f, "in sync"),
            Self::Drifted => write!(f, "drifted"),
        }
    }
}

impl std::fmt::Display for ReconciliationResult {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Custom field {} of {}:", self.mode, self.manifest.display())?;
        if self.actions.is_empty() {
            return write!(f, "  No custom field sets declared");
        }
        for action in &self.actions {
            writeln!(f, "  {}: {}", action.name, action.action)?;
        }
        Ok(())
    }
}

impl std::fmt::Display for DriftReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.has_drift() {
            writeln!(f, "Drift detected:")?;
            for entry in self.entries.iter().filter(|e| e.status != DriftStatus::InSync) {
                writeln!(f, "  - {} ({})", entry.name, entry.status)?;
            }
        } else {
            write!(f, "No drift detected - custom fields are in sync")?;
        }
        Ok(())
    }
}
