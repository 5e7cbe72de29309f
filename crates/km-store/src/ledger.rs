//! Trip ledger: completed trips and their aggregates.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use km_core::{
    ActivityType, NewTripEntry, Observable, Session, Subscription, TripEntry, TripEntryUpdate,
    TripId,
};

use crate::LedgerError;
use crate::store::KeyValueStore;

/// Key under which the entries are stored, as a JSON array.
pub const STORAGE_KEY: &str = "kmtrack-entries";

/// Persisted list of trips, newest first.
pub struct TripLedger<S: KeyValueStore> {
    store: S,
    entries: Observable<Vec<TripEntry>>,
}

impl<S: KeyValueStore> TripLedger<S> {
    /// Loads the ledger from `store`.
    ///
    /// Missing, unreadable or corrupt data yields an empty ledger.
    pub fn load(store: S) -> Self {
        let mut entries = read_entries(&store);
        sort_newest_first(&mut entries);
        tracing::debug!(entries = entries.len(), "trip ledger loaded");
        Self {
            store,
            entries: Observable::new(entries),
        }
    }

    /// Snapshot of all entries, newest first.
    pub fn entries(&self) -> Vec<TripEntry> {
        self.entries.get()
    }

    /// Registers a callback for every change of the entry list.
    #[must_use = "dropping the subscription immediately unsubscribes"]
    pub fn subscribe(&self, callback: impl FnMut(&Vec<TripEntry>) + 'static) -> Subscription {
        self.entries.subscribe(callback)
    }

    pub fn get(&self, id: &TripId) -> Option<TripEntry> {
        self.entries.get().into_iter().find(|entry| &entry.id == id)
    }

    pub fn len(&self) -> usize {
        self.entries.get().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub const fn store(&self) -> &S {
        &self.store
    }

    /// Adds a trip and persists the ledger.
    pub fn add_entry(&mut self, entry: NewTripEntry) -> Result<TripEntry, LedgerError> {
        validate_distance(entry.distance_km)?;
        let entry = TripEntry::new(TripId::generate(), entry);

        let mut entries = self.entries.get();
        entries.push(entry.clone());
        self.commit(entries)?;

        tracing::debug!(id = %entry.id, distance_km = entry.distance_km, "trip added");
        Ok(entry)
    }

    /// Records a finished session. Sessions without distance are skipped.
    pub fn record_session(
        &mut self,
        session: &Session,
        activity: ActivityType,
    ) -> Result<Option<TripEntry>, LedgerError> {
        match NewTripEntry::from_session(session, activity) {
            Some(entry) => self.add_entry(entry).map(Some),
            None => {
                tracing::debug!(session = %session.id, "session without distance not recorded");
                Ok(None)
            }
        }
    }

    /// Applies a user edit to an existing entry.
    pub fn update_entry(
        &mut self,
        id: &TripId,
        update: TripEntryUpdate,
    ) -> Result<TripEntry, LedgerError> {
        if let Some(distance_km) = update.distance_km {
            validate_distance(distance_km)?;
        }

        let mut entries = self.entries.get();
        let entry = entries
            .iter_mut()
            .find(|entry| &entry.id == id)
            .ok_or_else(|| LedgerError::NotFound(id.clone()))?;
        update.apply(entry);
        let updated = entry.clone();

        self.commit(entries)?;
        Ok(updated)
    }

    /// Deletes an entry. Returns the removed entry, or `None` if it did not exist.
    pub fn delete_entry(&mut self, id: &TripId) -> Result<Option<TripEntry>, LedgerError> {
        let mut entries = self.entries.get();
        let Some(pos) = entries.iter().position(|entry| &entry.id == id) else {
            return Ok(None);
        };
        let removed = entries.remove(pos);
        self.commit(entries)?;
        Ok(Some(removed))
    }

    /// Removes every entry and the stored key.
    pub fn reset_all(&mut self) -> Result<(), LedgerError> {
        self.store.remove(STORAGE_KEY)?;
        self.entries.set(Vec::new());
        Ok(())
    }

    /// Sum of all trip distances.
    pub fn total_km(&self) -> f64 {
        self.entries.get().iter().map(|entry| entry.distance_km).sum()
    }

    /// Distance per activity type. Types without trips are absent.
    pub fn total_by_type(&self) -> BTreeMap<ActivityType, f64> {
        let mut totals = BTreeMap::new();
        for entry in self.entries.get() {
            *totals.entry(entry.activity).or_insert(0.0) += entry.distance_km;
        }
        totals
    }

    /// Distance per month, keyed by `YYYY-MM`.
    pub fn total_by_month(&self) -> BTreeMap<String, f64> {
        let mut totals = BTreeMap::new();
        for entry in self.entries.get() {
            *totals.entry(entry.month_key()).or_insert(0.0) += entry.distance_km;
        }
        totals
    }

    /// Distance in one month given as `YYYY-MM`.
    pub fn total_for_month(&self, month: &str) -> Result<f64, LedgerError> {
        validate_month(month)?;
        Ok(self
            .entries
            .get()
            .iter()
            .filter(|entry| entry.month_key() == month)
            .map(|entry| entry.distance_km)
            .sum())
    }

    /// Sorts, persists and then publishes the new entry list.
    fn commit(&mut self, mut entries: Vec<TripEntry>) -> Result<(), LedgerError> {
        sort_newest_first(&mut entries);
        let json = serde_json::to_string(&entries)?;
        self.store.set(STORAGE_KEY, &json)?;
        self.entries.set(entries);
        Ok(())
    }
}

fn read_entries<S: KeyValueStore>(store: &S) -> Vec<TripEntry> {
    let raw = match store.get(STORAGE_KEY) {
        Ok(Some(raw)) => raw,
        Ok(None) => return Vec::new(),
        Err(err) => {
            tracing::warn!(%err, "could not read stored trips, starting empty");
            return Vec::new();
        }
    };
    serde_json::from_str(&raw).unwrap_or_else(|err| {
        tracing::warn!(%err, "stored trips are corrupt, starting empty");
        Vec::new()
    })
}

/// Stable: trips on the same day keep insertion order.
fn sort_newest_first(entries: &mut [TripEntry]) {
    entries.sort_by(|a, b| b.date.cmp(&a.date));
}

fn validate_distance(distance_km: f64) -> Result<(), LedgerError> {
    if distance_km.is_finite() && distance_km >= 0.0 {
        Ok(())
    } else {
        Err(LedgerError::InvalidDistance(distance_km))
    }
}

fn validate_month(month: &str) -> Result<(), LedgerError> {
    let valid = month.len() == 7
        && NaiveDate::parse_from_str(&format!("{month}-01"), "%Y-%m-%d").is_ok();
    if valid {
        Ok(())
    } else {
        Err(LedgerError::InvalidMonth(month.to_string()))
    }
}
