//! Filtering, searching and sorting of dashboard collections.
//!
//! All functions here are pure and total: they borrow the source slice, never
//! modify it, and return a new `Vec` (possibly empty). Entity kinds opt into
//! the filters through four small traits:
//!
//! - [`Searchable`]: fields matched by the free-text search
//! - [`Owned`]: the owning camera id
//! - [`Categorized`]: the discriminant (`type`) field
//! - [`Timestamped`]: the primary timestamp used for ranges and sorting
//!
//! [`FilterCriteria::apply`] combines the active filters with logical AND in
//! a fixed order (search, owner, category, date range) and then sorts.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::model::{
    Alert, AlertSeverity, AlertType, Camera, CameraType, Recording, RecordingType,
};

pub trait Searchable {
    /// Fields matched case-insensitively by the search box.
    fn search_fields(&self) -> Vec<&str>;
}

pub trait Owned {
    fn owner_id(&self) -> &str;
}

pub trait Categorized {
    type Category: Copy + PartialEq;

    fn category(&self) -> Self::Category;
}

pub trait Timestamped {
    fn primary_timestamp(&self) -> DateTime<Utc>;
}

impl Searchable for Recording {
    fn search_fields(&self) -> Vec<&str> {
        vec![
            self.filename.as_str(),
            self.camera_name.as_str(),
            self.recording_type.as_str(),
        ]
    }
}

impl Owned for Recording {
    fn owner_id(&self) -> &str {
        &self.camera_id
    }
}

impl Categorized for Recording {
    type Category = RecordingType;

    fn category(&self) -> RecordingType {
        self.recording_type
    }
}

impl Timestamped for Recording {
    fn primary_timestamp(&self) -> DateTime<Utc> {
        self.start_time
    }
}

impl Searchable for Alert {
    fn search_fields(&self) -> Vec<&str> {
        vec![
            self.camera_name.as_str(),
            self.message.as_str(),
            self.alert_type.as_str(),
        ]
    }
}

impl Owned for Alert {
    fn owner_id(&self) -> &str {
        &self.camera_id
    }
}

impl Categorized for Alert {
    type Category = AlertType;

    fn category(&self) -> AlertType {
        self.alert_type
    }
}

impl Timestamped for Alert {
    fn primary_timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }
}

impl Searchable for Camera {
    fn search_fields(&self) -> Vec<&str> {
        vec![self.name.as_str(), self.location.as_str()]
    }
}

impl Categorized for Camera {
    type Category = CameraType;

    fn category(&self) -> CameraType {
        self.camera_type
    }
}

/// Either every value or exactly one. `All` is the identity filter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Selection<T> {
    All,
    Only(T),
}

impl<T> Default for Selection<T> {
    fn default() -> Self {
        Selection::All
    }
}

impl<T> From<Option<T>> for Selection<T> {
    fn from(value: Option<T>) -> Self {
        match value {
            Some(v) => Selection::Only(v),
            None => Selection::All,
        }
    }
}

impl<T: PartialEq> Selection<T> {
    pub fn admits(&self, value: &T) -> bool {
        match self {
            Selection::All => true,
            Selection::Only(expected) => expected == value,
        }
    }
}

/// Inclusive timestamp bounds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateRange {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl DateRange {
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        Self { start, end }
    }

    pub fn contains(&self, at: DateTime<Utc>) -> bool {
        at >= self.start && at <= self.end
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    Asc,
    /// Newest first.
    #[default]
    Desc,
}

/// Normalise a search term; `None` means "no filtering".
fn normalized_term(term: &str) -> Option<String> {
    let trimmed = term.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_lowercase())
    }
}

fn matches_term<T: Searchable>(item: &T, lowered: &str) -> bool {
    item.search_fields()
        .iter()
        .any(|field| field.to_lowercase().contains(lowered))
}

pub fn filter_by_search_term<T: Searchable + Clone>(items: &[T], term: &str) -> Vec<T> {
    match normalized_term(term) {
        None => items.to_vec(),
        Some(lowered) => items
            .iter()
            .filter(|item| matches_term(*item, &lowered))
            .cloned()
            .collect(),
    }
}

fn owner_matches(owner: &Selection<String>, id: &str) -> bool {
    match owner {
        Selection::All => true,
        Selection::Only(expected) => expected == id,
    }
}

pub fn filter_by_owner<T: Owned + Clone>(items: &[T], owner: &Selection<String>) -> Vec<T> {
    items
        .iter()
        .filter(|item| owner_matches(owner, item.owner_id()))
        .cloned()
        .collect()
}

pub fn filter_by_category<T: Categorized + Clone>(
    items: &[T],
    category: &Selection<T::Category>,
) -> Vec<T> {
    items
        .iter()
        .filter(|item| category.admits(&item.category()))
        .cloned()
        .collect()
}

pub fn filter_by_date_range<T: Timestamped + Clone>(items: &[T], range: &DateRange) -> Vec<T> {
    items
        .iter()
        .filter(|item| range.contains(item.primary_timestamp()))
        .cloned()
        .collect()
}

/// Stable sort on the primary timestamp; equal timestamps keep their input
/// order in both directions.
pub fn sort_by_date<T: Timestamped + Clone>(items: &[T], order: SortOrder) -> Vec<T> {
    let mut sorted = items.to_vec();
    match order {
        SortOrder::Asc => sorted.sort_by_key(|item| item.primary_timestamp()),
        SortOrder::Desc => {
            sorted.sort_by(|a, b| b.primary_timestamp().cmp(&a.primary_timestamp()))
        }
    }
    sorted
}

/// The set of filters active on a panel.
#[derive(Debug, Clone, PartialEq)]
pub struct FilterCriteria<C> {
    pub search: String,
    pub owner: Selection<String>,
    pub category: Selection<C>,
    pub date_range: Option<DateRange>,
    /// `None` keeps the collection order.
    pub order: Option<SortOrder>,
}

impl<C> Default for FilterCriteria<C> {
    fn default() -> Self {
        Self {
            search: String::new(),
            owner: Selection::All,
            category: Selection::All,
            date_range: None,
            order: None,
        }
    }
}

pub type RecordingFilter = FilterCriteria<RecordingType>;
pub type AlertFilter = FilterCriteria<AlertType>;

impl<C: Copy + PartialEq> FilterCriteria<C> {
    pub fn is_identity(&self) -> bool {
        normalized_term(&self.search).is_none()
            && self.owner == Selection::All
            && self.category == Selection::All
            && self.date_range.is_none()
            && self.order.is_none()
    }

    /// Apply every active filter, then sort.
    ///
    /// Predicates are evaluated per item in the order search, owner,
    /// category, date range.
    pub fn apply<T>(&self, items: &[T]) -> Vec<T>
    where
        T: Clone + Searchable + Owned + Timestamped + Categorized<Category = C>,
    {
        let term = normalized_term(&self.search);

        let filtered: Vec<T> = items
            .iter()
            .filter(|item| term.as_deref().is_none_or(|t| matches_term(*item, t)))
            .filter(|item| owner_matches(&self.owner, item.owner_id()))
            .filter(|item| self.category.admits(&item.category()))
            .filter(|item| {
                self.date_range
                    .is_none_or(|range| range.contains(item.primary_timestamp()))
            })
            .cloned()
            .collect();

        match self.order {
            Some(order) => sort_by_date(&filtered, order),
            None => filtered,
        }
    }
}

/// Camera list filter: search on name/location plus an optional type.
pub fn filter_cameras(
    cameras: &[Camera],
    search: &str,
    camera_type: &Selection<CameraType>,
) -> Vec<Camera> {
    let searched = filter_by_search_term(cameras, search);
    filter_by_category(&searched, camera_type)
}

pub fn filter_unread(alerts: &[Alert]) -> Vec<Alert> {
    alerts.iter().filter(|a| !a.is_read).cloned().collect()
}

pub fn filter_by_severity(alerts: &[Alert], severity: &Selection<AlertSeverity>) -> Vec<Alert> {
    alerts
        .iter()
        .filter(|a| severity.admits(&a.severity))
        .cloned()
        .collect()
}

/// Tabs of the alerts panel.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AlertTab {
    #[default]
    All,
    Unread,
    Motion,
    Offline,
}

impl AlertTab {
    pub fn apply(self, alerts: &[Alert]) -> Vec<Alert> {
        match self {
            AlertTab::All => alerts.to_vec(),
            AlertTab::Unread => filter_unread(alerts),
            AlertTab::Motion => filter_by_category(alerts, &Selection::Only(AlertType::Motion)),
            AlertTab::Offline => filter_by_category(alerts, &Selection::Only(AlertType::Offline)),
        }
    }
}
