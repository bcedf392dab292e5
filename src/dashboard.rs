//! View-state controller for the camera dashboard.
//!
//! [`Dashboard`] owns the one authoritative copy of the camera, recording and
//! alert collections, the system settings and the derived
//! [`DashboardStats`]. Views never hold their own copies; they ask the
//! controller for a filtered subset.
//!
//! # Lifecycle
//!
//! Each collection moves through [`Phase`]s:
//!
//! ```text
//! Uninitialized -> Loading -> Ready -> Refreshing -> Ready
//!                     \
//!                      -> Error (serving cached or seed data)
//! ```
//!
//! # Mutations
//!
//! A mutation is sent to the backend first. Only when the backend accepts it
//! is the local collection patched and the stats recomputed, so a failed call
//! leaves everything exactly as it was. Failures are returned to the caller
//! and also kept as a dismissible [`Dashboard::last_error`].
//!
//! # Usage
//!
//! ```ignore
//! let mut dashboard = Dashboard::new(CctvClient::new(config)).with_store(store);
//! dashboard.load().await;
//! let motion = dashboard.visible_recordings(&RecordingFilter {
//!     category: Selection::Only(RecordingType::Motion),
//!     ..Default::default()
//! });
//! ```

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tokio::sync::watch;
use tracing::{debug, info, warn};

use crate::aggregation::{self, DEFAULT_STORAGE_TOTAL_GB, StorageUsage};
use crate::client::CctvClient;
use crate::error::{Error, Result};
use crate::filter::{AlertTab, RecordingFilter, Selection, SortOrder, filter_cameras, sort_by_date};
use crate::model::{
    Alert, Camera, CameraDraft, CameraPatch, CameraType, CollectionKind, DashboardStats,
    Recording, SettingsPatch, SystemSettings,
};
use crate::seed;
use crate::storage::SnapshotStore;

/// Load state of one collection.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    #[default]
    Uninitialized,
    /// First fetch in flight.
    Loading,
    Ready,
    /// Re-fetch in flight; the previous items are still served.
    Refreshing,
    /// The first fetch failed; items come from the cache or the seed data.
    Error,
}

/// Where the items of a collection came from.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DataSource {
    #[default]
    None,
    Backend,
    Cache,
    Seed,
}

/// One authoritative entity collection.
#[derive(Debug, Clone)]
pub struct Collection<T> {
    items: Vec<T>,
    phase: Phase,
    source: DataSource,
    error: Option<Error>,
    fetched_at: Option<DateTime<Utc>>,
}

impl<T> Default for Collection<T> {
    fn default() -> Self {
        Self {
            items: Vec::new(),
            phase: Phase::Uninitialized,
            source: DataSource::None,
            error: None,
            fetched_at: None,
        }
    }
}

impl<T> Collection<T> {
    pub fn items(&self) -> &[T] {
        &self.items
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn source(&self) -> DataSource {
        self.source
    }

    /// Error of the last failed fetch, if it has not been superseded.
    pub fn error(&self) -> Option<&Error> {
        self.error.as_ref()
    }

    /// Time of the last successful fetch.
    pub fn fetched_at(&self) -> Option<DateTime<Utc>> {
        self.fetched_at
    }

    fn status(&self) -> CollectionStatus {
        CollectionStatus {
            phase: self.phase,
            source: self.source,
            count: self.items.len(),
            error: self.error.as_ref().map(|e| e.to_string()),
            fetched_at: self.fetched_at,
        }
    }

    /// Mark a fetch as started. Collections that never loaded go to
    /// `Loading`, the rest to `Refreshing`.
    fn begin_fetch(&mut self) {
        self.phase = match self.phase {
            Phase::Ready | Phase::Refreshing => Phase::Refreshing,
            Phase::Uninitialized | Phase::Loading | Phase::Error => Phase::Loading,
        };
    }

    fn accept(&mut self, items: Vec<T>, now: DateTime<Utc>) {
        self.items = items;
        self.phase = Phase::Ready;
        self.source = DataSource::Backend;
        self.error = None;
        self.fetched_at = Some(now);
    }
}

/// Observable summary of one collection.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CollectionStatus {
    pub phase: Phase,
    pub source: DataSource,
    pub count: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fetched_at: Option<DateTime<Utc>>,
}

/// Published on every state transition; see [`Dashboard::subscribe`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardStatus {
    pub cameras: CollectionStatus,
    pub recordings: CollectionStatus,
    pub alerts: CollectionStatus,
    pub stats: DashboardStats,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_error: Option<String>,
}

impl DashboardStatus {
    /// True while any fetch is in flight.
    pub fn is_busy(&self) -> bool {
        [&self.cameras, &self.recordings, &self.alerts]
            .iter()
            .any(|c| matches!(c.phase, Phase::Loading | Phase::Refreshing))
    }
}

// ============================================================================
// Controller
// ============================================================================

pub struct Dashboard {
    client: CctvClient,
    store: Option<SnapshotStore>,
    storage_total_gb: f64,

    cameras: Collection<Camera>,
    recordings: Collection<Recording>,
    alerts: Collection<Alert>,
    settings: SystemSettings,
    stats: DashboardStats,
    last_error: Option<Error>,

    status_tx: watch::Sender<DashboardStatus>,
}

impl Dashboard {
    /// Create an empty controller. Nothing is fetched until [`Dashboard::load`].
    pub fn new(client: CctvClient) -> Self {
        let (status_tx, _) = watch::channel(DashboardStatus::default());
        Self {
            client,
            store: None,
            storage_total_gb: DEFAULT_STORAGE_TOTAL_GB,
            cameras: Collection::default(),
            recordings: Collection::default(),
            alerts: Collection::default(),
            settings: SystemSettings::default(),
            stats: DashboardStats {
                storage_total: DEFAULT_STORAGE_TOTAL_GB,
                ..DashboardStats::default()
            },
            last_error: None,
            status_tx,
        }
    }

    /// Attach the snapshot cache and settings store.
    pub fn with_store(mut self, store: SnapshotStore) -> Self {
        self.store = Some(store);
        self
    }

    pub fn with_storage_total(mut self, storage_total_gb: f64) -> Self {
        self.storage_total_gb = storage_total_gb;
        self.stats.storage_total = storage_total_gb;
        self.publish();
        self
    }

    pub fn client(&self) -> &CctvClient {
        &self.client
    }

    pub fn cameras(&self) -> &Collection<Camera> {
        &self.cameras
    }

    pub fn recordings(&self) -> &Collection<Recording> {
        &self.recordings
    }

    pub fn alerts(&self) -> &Collection<Alert> {
        &self.alerts
    }

    pub fn stats(&self) -> &DashboardStats {
        &self.stats
    }

    pub fn storage_usage(&self) -> StorageUsage {
        StorageUsage::from_stats(&self.stats)
    }

    pub fn settings(&self) -> &SystemSettings {
        &self.settings
    }

    pub fn last_error(&self) -> Option<&Error> {
        self.last_error.as_ref()
    }

    pub fn dismiss_error(&mut self) {
        if self.last_error.take().is_some() {
            self.publish();
        }
    }

    /// Watch phases, stats and the last error without borrowing the controller.
    pub fn subscribe(&self) -> watch::Receiver<DashboardStatus> {
        self.status_tx.subscribe()
    }

    pub fn status(&self) -> DashboardStatus {
        DashboardStatus {
            cameras: self.cameras.status(),
            recordings: self.recordings.status(),
            alerts: self.alerts.status(),
            stats: self.stats.clone(),
            last_error: self.last_error.as_ref().map(|e| e.to_string()),
        }
    }

    fn publish(&self) {
        self.status_tx.send_replace(self.status());
    }

    fn recompute_stats(&mut self) {
        self.stats = aggregation::compute_stats(
            &self.cameras.items,
            &self.recordings.items,
            &self.alerts.items,
            self.storage_total_gb,
        );
    }

    /// Record a failed operation and hand the error back.
    fn fail<T>(&mut self, operation: &str, error: Error) -> Result<T> {
        warn!(operation, error = %error, "Dashboard operation failed");
        self.last_error = Some(error.clone());
        self.publish();
        Err(error)
    }

    // ========================================================================
    // Loading
    // ========================================================================

    /// Initial load of settings and all three collections.
    ///
    /// The lists are fetched concurrently and every kind settles on its own.
    /// A kind that fails falls back to its cached snapshot, or to the seed
    /// data when nothing was ever cached, and ends in [`Phase::Error`].
    pub async fn load(&mut self) {
        self.load_settings().await;

        self.cameras.phase = Phase::Loading;
        self.recordings.phase = Phase::Loading;
        self.alerts.phase = Phase::Loading;
        self.publish();

        self.fetch_all().await;
    }

    /// Re-fetch all three collections.
    ///
    /// A successful fetch supersedes the current items. A failed one keeps
    /// them in place with the error attached. Returns the first failure.
    pub async fn refresh(&mut self) -> Result<()> {
        self.cameras.begin_fetch();
        self.recordings.begin_fetch();
        self.alerts.begin_fetch();
        self.publish();

        match self.fetch_all().await {
            Some(error) => {
                self.last_error = Some(error.clone());
                self.publish();
                Err(error)
            }
            None => Ok(()),
        }
    }

    async fn fetch_all(&mut self) -> Option<Error> {
        let (cameras, recordings, alerts) = tokio::join!(
            self.client.list_cameras(),
            self.client.list_recordings(),
            self.client.list_alerts(),
        );

        let now = Utc::now();
        let store = self.store.as_ref();
        let mut first_error = None;

        if let Err(e) = settle(
            &mut self.cameras,
            CollectionKind::Cameras,
            cameras,
            store,
            seed::cameras,
            now,
        )
        .await
        {
            first_error.get_or_insert(e);
        }
        if let Err(e) = settle(
            &mut self.recordings,
            CollectionKind::Recordings,
            recordings,
            store,
            seed::recordings,
            now,
        )
        .await
        {
            first_error.get_or_insert(e);
        }
        if let Err(e) = settle(
            &mut self.alerts,
            CollectionKind::Alerts,
            alerts,
            store,
            seed::alerts,
            now,
        )
        .await
        {
            first_error.get_or_insert(e);
        }

        self.recompute_stats();
        self.publish();

        info!(
            cameras = self.cameras.items.len(),
            recordings = self.recordings.items.len(),
            alerts = self.alerts.items.len(),
            failed = first_error.is_some(),
            "Dashboard collections fetched"
        );

        first_error
    }

    async fn load_settings(&mut self) {
        let Some(store) = &self.store else {
            return;
        };
        match store.load_settings().await {
            Ok(Some(settings)) => self.settings = settings,
            Ok(None) => debug!("No stored settings, using defaults"),
            Err(e) => warn!(error = %e, "Failed to load settings, using defaults"),
        }
    }

    async fn persist<T: Serialize>(&self, kind: CollectionKind, items: &[T]) {
        save_snapshot(self.store.as_ref(), kind, items, Utc::now()).await;
    }

    // ========================================================================
    // Mutations
    // ========================================================================

    /// Validate and create a camera, then append the server's record.
    pub async fn create_camera(&mut self, draft: CameraDraft) -> Result<Camera> {
        if let Err(e) = draft.validate() {
            return self.fail("create_camera", e);
        }

        let camera = match self.client.create_camera(&draft).await {
            Ok(camera) => camera,
            Err(e) => return self.fail("create_camera", e),
        };

        match self.cameras.items.iter_mut().find(|c| c.id == camera.id) {
            Some(existing) => *existing = camera.clone(),
            None => self.cameras.items.push(camera.clone()),
        }
        self.after_camera_change().await;

        info!(camera_id = %camera.id, name = %camera.name, "Camera created");
        Ok(camera)
    }

    /// Apply a partial update. The backend's canonical record replaces the
    /// local one.
    pub async fn update_camera(&mut self, id: &str, patch: CameraPatch) -> Result<Camera> {
        if let Err(e) = patch.validate() {
            return self.fail("update_camera", e);
        }

        let camera = match self.client.update_camera(id, &patch).await {
            Ok(camera) => camera,
            Err(e) => return self.fail("update_camera", e),
        };

        match self.cameras.items.iter_mut().find(|c| c.id == id) {
            Some(existing) => *existing = camera.clone(),
            None => self.cameras.items.push(camera.clone()),
        }
        self.after_camera_change().await;

        info!(camera_id = %id, "Camera updated");
        Ok(camera)
    }

    /// Delete a camera. Its recordings and alerts are left alone.
    pub async fn delete_camera(&mut self, id: &str) -> Result<()> {
        if let Err(e) = self.client.delete_camera(id).await {
            return self.fail("delete_camera", e);
        }

        self.cameras.items.retain(|c| c.id != id);
        self.after_camera_change().await;

        info!(camera_id = %id, "Camera deleted");
        Ok(())
    }

    async fn after_camera_change(&mut self) {
        self.recompute_stats();
        self.publish();
        self.persist(CollectionKind::Cameras, &self.cameras.items)
            .await;
    }

    /// Mark one alert as read.
    ///
    /// The unread counter is decremented in place, and only when the alert
    /// was unread before. `is_read` never goes back to false.
    pub async fn mark_alert_read(&mut self, id: &str) -> Result<Alert> {
        let mut updated = match self.client.mark_alert_read(id).await {
            Ok(alert) => alert,
            Err(e) => return self.fail("mark_alert_read", e),
        };
        updated.is_read = true;

        match self.alerts.items.iter_mut().find(|a| a.id == id) {
            Some(existing) => {
                let was_unread = !existing.is_read;
                *existing = updated.clone();
                if was_unread {
                    self.stats.unread_alerts = self.stats.unread_alerts.saturating_sub(1);
                }
            }
            None => {
                self.alerts.items.push(updated.clone());
                self.recompute_stats();
            }
        }
        debug_assert_eq!(
            self.stats.unread_alerts,
            aggregation::unread_alert_count(&self.alerts.items)
        );

        self.publish();
        self.persist(CollectionKind::Alerts, &self.alerts.items)
            .await;

        debug!(alert_id = %id, unread = self.stats.unread_alerts, "Alert marked as read");
        Ok(updated)
    }

    /// Mark every unread alert as read, one request at a time.
    ///
    /// Stops at the first failure. Alerts marked before it stay marked.
    /// Returns how many alerts changed.
    pub async fn mark_all_alerts_read(&mut self) -> Result<usize> {
        let unread: Vec<String> = self
            .alerts
            .items
            .iter()
            .filter(|a| !a.is_read)
            .map(|a| a.id.clone())
            .collect();

        let mut marked = 0;
        for id in unread {
            self.mark_alert_read(&id).await?;
            marked += 1;
        }

        if marked > 0 {
            info!(marked, "All alerts marked as read");
        }
        Ok(marked)
    }

    // ========================================================================
    // Settings
    // ========================================================================

    /// Merge, validate and store new settings. The record is replaced
    /// wholesale; an invalid result leaves the current settings untouched.
    pub async fn save_settings(&mut self, patch: SettingsPatch) -> Result<SystemSettings> {
        let merged = patch.merge(&self.settings);
        if let Err(e) = merged.validate() {
            return self.fail("save_settings", e);
        }

        self.settings = merged.clone();

        if let Some(store) = &self.store {
            if let Err(e) = store.save_settings(&merged, Utc::now()).await {
                warn!(error = %e, "Failed to persist settings");
            }
        }

        info!(quality = ?merged.recording_quality, retention_days = merged.storage_retention_days, "Settings saved");
        Ok(merged)
    }

    // ========================================================================
    // Views
    // ========================================================================

    pub fn visible_recordings(&self, filter: &RecordingFilter) -> Vec<Recording> {
        filter.apply(&self.recordings.items)
    }

    /// Alerts of one panel tab, optionally sorted by timestamp.
    pub fn visible_alerts(&self, tab: AlertTab, order: Option<SortOrder>) -> Vec<Alert> {
        let alerts = tab.apply(&self.alerts.items);
        match order {
            Some(order) => sort_by_date(&alerts, order),
            None => alerts,
        }
    }

    pub fn visible_cameras(&self, search: &str, camera_type: &Selection<CameraType>) -> Vec<Camera> {
        filter_cameras(&self.cameras.items, search, camera_type)
    }
}

// ============================================================================
// Settling fetch results
// ============================================================================

/// Fold one fetch result into its collection.
async fn settle<T>(
    collection: &mut Collection<T>,
    kind: CollectionKind,
    result: Result<Vec<T>>,
    store: Option<&SnapshotStore>,
    seed: fn() -> Vec<T>,
    now: DateTime<Utc>,
) -> Result<()>
where
    T: Serialize + DeserializeOwned,
{
    let error = match result {
        Ok(items) => {
            save_snapshot(store, kind, &items, now).await;
            collection.accept(items, now);
            return Ok(());
        }
        Err(e) => e,
    };

    warn!(kind = kind.as_str(), error = %error, "Failed to fetch collection");

    if collection.phase == Phase::Refreshing {
        // Keep serving what we had.
        collection.phase = Phase::Ready;
    } else {
        let (items, source) = fallback(kind, store, seed).await;
        collection.items = items;
        collection.source = source;
        collection.phase = Phase::Error;
    }
    collection.error = Some(error.clone());

    Err(error)
}

/// Cached snapshot of `kind`, or the seed data when there is none.
async fn fallback<T: DeserializeOwned>(
    kind: CollectionKind,
    store: Option<&SnapshotStore>,
    seed: fn() -> Vec<T>,
) -> (Vec<T>, DataSource) {
    if let Some(store) = store {
        match store.load_snapshot::<T>(kind).await {
            Ok(Some(snapshot)) => {
                info!(
                    kind = kind.as_str(),
                    count = snapshot.items.len(),
                    saved_at = %snapshot.saved_at,
                    "Serving cached snapshot"
                );
                return (snapshot.items, DataSource::Cache);
            }
            Ok(None) => {}
            Err(e) => warn!(kind = kind.as_str(), error = %e, "Failed to read snapshot"),
        }
    }

    info!(kind = kind.as_str(), "Serving seed data");
    (seed(), DataSource::Seed)
}

/// Best effort; a failed write is logged and otherwise ignored.
async fn save_snapshot<T: Serialize>(
    store: Option<&SnapshotStore>,
    kind: CollectionKind,
    items: &[T],
    now: DateTime<Utc>,
) {
    if let Some(store) = store {
        if let Err(e) = store.save_snapshot(kind, items, now).await {
            warn!(kind = kind.as_str(), error = %e, "Failed to save snapshot");
        }
    }
}
