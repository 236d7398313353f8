use crate::domain::{Subscription, SubscriptionCategory};
use thiserror::Error;
use tracing::debug;
use uuid::Uuid;

#[derive(Error, Debug, PartialEq)]
pub enum StoreError {
    #[error("Duplicate subscription id: {0}")]
    DuplicateId(Uuid),
    #[error("Not found: {0}")]
    NotFound(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CategoryFilter {
    #[default]
    All,
    Only(SubscriptionCategory),
}

impl CategoryFilter {
    /// `"all"` (any case) or a category label.
    pub fn parse(value: &str) -> Option<Self> {
        let value = value.trim();
        if value.is_empty() || value.eq_ignore_ascii_case("all") {
            return Some(Self::All);
        }
        value.parse().ok().map(Self::Only)
    }

    fn matches(&self, category: SubscriptionCategory) -> bool {
        match self {
            Self::All => true,
            Self::Only(c) => *c == category,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListFilter {
    pub category: CategoryFilter,
    pub search: String,
}

impl ListFilter {
    pub fn new(category: CategoryFilter, search: impl Into<String>) -> Self {
        Self {
            category,
            search: search.into(),
        }
    }

    pub fn all() -> Self {
        Self::default()
    }

    fn matches(&self, sub: &Subscription, needle: &str) -> bool {
        self.category.matches(sub.category)
            && sub.service_name.to_lowercase().contains(needle)
    }
}

/// Authoritative in-memory list for the active session, newest first.
#[derive(Debug, Clone, Default)]
pub struct SubscriptionStore {
    items: Vec<Subscription>,
}

impl SubscriptionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Keeps the given order; used for seeding.
    pub fn with_items(items: Vec<Subscription>) -> Result<Self, StoreError> {
        let mut store = Self::new();
        for item in items.into_iter().rev() {
            store.add(item)?;
        }
        Ok(store)
    }

    pub fn add(&mut self, record: Subscription) -> Result<(), StoreError> {
        if self.contains(record.id) {
            return Err(StoreError::DuplicateId(record.id));
        }
        debug!(id = %record.id, service = %record.service_name, "Store insert");
        self.items.insert(0, record);
        Ok(())
    }

    pub fn update(&mut self, record: Subscription) -> Result<(), StoreError> {
        let slot = self
            .items
            .iter_mut()
            .find(|s| s.id == record.id)
            .ok_or_else(|| StoreError::NotFound(format!("Subscription {}", record.id)))?;
        *slot = record;
        Ok(())
    }

    /// Idempotent; returns the removed record if there was one.
    pub fn remove(&mut self, id: Uuid) -> Option<Subscription> {
        let index = self.items.iter().position(|s| s.id == id)?;
        Some(self.items.remove(index))
    }

    pub fn set_notifications(&mut self, id: Uuid, enabled: bool) -> Result<(), StoreError> {
        let sub = self
            .items
            .iter_mut()
            .find(|s| s.id == id)
            .ok_or_else(|| StoreError::NotFound(format!("Subscription {}", id)))?;
        sub.notifications_enabled = enabled;
        Ok(())
    }

    pub fn get(&self, id: Uuid) -> Option<&Subscription> {
        self.items.iter().find(|s| s.id == id)
    }

    pub fn contains(&self, id: Uuid) -> bool {
        self.get(id).is_some()
    }

    /// Lazy and restartable (clone the iterator to walk it again).
    /// Order is store order, never filter order.
    pub fn list<'a>(
        &'a self,
        filter: &'a ListFilter,
    ) -> impl Iterator<Item = &'a Subscription> + Clone + 'a {
        let needle = filter.search.trim().to_lowercase();
        self.items
            .iter()
            .filter(move |s| filter.matches(s, &needle))
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::SubscriptionDraft;

    fn sub(name: &str, category: SubscriptionCategory) -> Subscription {
        let mut draft = SubscriptionDraft::new(name);
        draft.category = Some(category);
        draft.into_subscription(Uuid::new_v4(), "user123", "USD")
    }

    #[test]
    fn add_prepends_and_rejects_duplicates() {
        let mut store = SubscriptionStore::new();
        let first = sub("Netflix", SubscriptionCategory::Entertainment);
        let second = sub("Spotify", SubscriptionCategory::Music);

        store.add(first.clone()).unwrap();
        store.add(second.clone()).unwrap();

        let filter = ListFilter::all();
        let names: Vec<_> = store.list(&filter).map(|s| s.service_name.as_str()).collect();
        assert_eq!(names, vec!["Spotify", "Netflix"]);

        assert_eq!(store.add(first.clone()), Err(StoreError::DuplicateId(first.id)));
        assert_eq!(store.len(), 2);
    }

    #[test]
    fn update_replaces_in_place_or_signals_missing() {
        let mut store = SubscriptionStore::new();
        let mut netflix = sub("Netflix", SubscriptionCategory::Entertainment);
        store.add(netflix.clone()).unwrap();
        store.add(sub("Spotify", SubscriptionCategory::Music)).unwrap();

        netflix.price = 15.99;
        store.update(netflix.clone()).unwrap();
        assert_eq!(store.get(netflix.id).unwrap().price, 15.99);
        assert_eq!(store.list(&ListFilter::all()).last().unwrap().id, netflix.id);

        let stranger = sub("Hulu", SubscriptionCategory::Entertainment);
        assert!(matches!(store.update(stranger), Err(StoreError::NotFound(_))));
    }

    #[test]
    fn remove_is_idempotent() {
        let mut store = SubscriptionStore::new();
        let netflix = sub("Netflix", SubscriptionCategory::Entertainment);
        store.add(netflix.clone()).unwrap();

        assert!(store.remove(netflix.id).is_some());
        assert!(store.remove(netflix.id).is_none());
        assert!(store.is_empty());
    }

    #[test]
    fn list_filters_by_category_and_case_insensitive_search() {
        let store = SubscriptionStore::with_items(vec![
            sub("Spotify Premium", SubscriptionCategory::Music),
            sub("Netflix", SubscriptionCategory::Entertainment),
            sub("Apple Music", SubscriptionCategory::Music),
        ])
        .unwrap();

        let music = ListFilter::new(CategoryFilter::Only(SubscriptionCategory::Music), "");
        let names: Vec<_> = store.list(&music).map(|s| s.service_name.clone()).collect();
        assert_eq!(names, vec!["Spotify Premium", "Apple Music"]);

        let search = ListFilter::new(CategoryFilter::All, "  PREMIUM ");
        let iter = store.list(&search);
        assert_eq!(iter.clone().count(), 1);
        assert_eq!(iter.count(), 1);
    }

    #[test]
    fn category_filter_parses_all_and_labels() {
        assert_eq!(CategoryFilter::parse("all"), Some(CategoryFilter::All));
        assert_eq!(CategoryFilter::parse(""), Some(CategoryFilter::All));
        assert_eq!(
            CategoryFilter::parse("Health & Fitness"),
            Some(CategoryFilter::Only(SubscriptionCategory::HealthAndFitness))
        );
        assert_eq!(CategoryFilter::parse("Gaming"), None);
    }

    #[test]
    fn notifications_toggle() {
        let mut store = SubscriptionStore::new();
        let netflix = sub("Netflix", SubscriptionCategory::Entertainment);
        store.add(netflix.clone()).unwrap();

        store.set_notifications(netflix.id, false).unwrap();
        assert!(!store.get(netflix.id).unwrap().notifications_enabled);
        assert!(store.set_notifications(Uuid::new_v4(), true).is_err());
    }
}
