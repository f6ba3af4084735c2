//! Domain data structures for waste collection schedules.

use chrono::{NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};

/// Waste-type codes used by Mantova Ambiente, paired with their display titles.
///
/// The remote API identifies each stream by a numeric code; the titles are the
/// Italian labels shown to users during setup.
pub const WASTE_TYPES: &[(&str, &str)] = &[
    ("6256", "Abiti"),
    ("3705", "Pannolini e pannoloni"),
    ("3581", "Carta"),
    ("3701", "Indifferenziato"),
    ("3704", "Organico"),
    ("3707", "Plastica"),
    ("3708", "Sfalci"),
    ("3710", "Vetro"),
    ("3702", "Ingombranti"),
];

/// Look up the display title for a waste-type code.
#[must_use]
pub fn waste_type_title(code: &str) -> Option<&'static str> {
    WASTE_TYPES
        .iter()
        .find(|(known_code, _)| *known_code == code)
        .map(|(_, title)| *title)
}

#[derive(Debug, Clone, Serialize, Deserialize)]
/// A collection zone as listed by the remote API.
pub struct ZoneMeta {
    /// Zone identifier used in schedule requests.
    pub id: String,
    /// Human-readable zone name.
    pub title: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
/// Schedule of future pickups for a single waste stream.
///
/// Instants are timezone-naive local timestamps, sorted ascending at
/// construction and never mutated afterwards. A refresh builds a new value
/// instead of editing this one.
pub struct Collection {
    id: String,
    title: String,
    instants: Vec<NaiveDateTime>,
}

impl Collection {
    /// Build a collection schedule, sorting `instants` ascending.
    ///
    /// `id` and `title` are stored verbatim; emptiness is not validated.
    #[must_use]
    pub fn new<S: Into<String>, T: Into<String>>(
        id: S,
        title: T,
        mut instants: Vec<NaiveDateTime>,
    ) -> Self {
        instants.sort_unstable();
        Self {
            id: id.into(),
            title: title.into(),
            instants,
        }
    }

    /// Stable identifier of the waste stream.
    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Human-readable label.
    #[must_use]
    pub fn title(&self) -> &str {
        &self.title
    }

    /// All scheduled instants, ascending.
    #[must_use]
    pub fn instants(&self) -> &[NaiveDateTime] {
        &self.instants
    }

    /// The earliest instant strictly after `now`, if any.
    #[must_use]
    pub fn next_instant(&self, now: NaiveDateTime) -> Option<NaiveDateTime> {
        // Sorted ascending, so the first future hit is the answer.
        self.instants.iter().copied().find(|instant| *instant > now)
    }

    /// All instants strictly after `now`, preserving ascending order.
    #[must_use]
    pub fn future_instants(&self, now: NaiveDateTime) -> Vec<NaiveDateTime> {
        self.instants
            .iter()
            .copied()
            .filter(|instant| *instant > now)
            .collect()
    }

    /// Whether any pickup falls on the calendar day after `now`.
    ///
    /// The window is [tomorrow 00:00:00, tomorrow 23:59:59] inclusive, so an
    /// instant carrying sub-second precision past 23:59:59 would be excluded.
    /// Schedule data carries whole seconds in practice.
    #[must_use]
    pub fn is_due_tomorrow(&self, now: NaiveDateTime) -> bool {
        let Some(tomorrow) = now.date().succ_opt() else {
            return false;
        };
        let window_start = tomorrow.and_time(NaiveTime::MIN);
        let window_end = tomorrow
            .and_hms_opt(23, 59, 59)
            .expect("23:59:59 is a valid time of day");

        self.instants
            .iter()
            .any(|instant| (window_start..=window_end).contains(instant))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
/// Point-in-time snapshot of every known collection schedule.
///
/// A refresh replaces the whole snapshot; nothing mutates it in place.
pub struct Dataset {
    collections: Vec<Collection>,
    fetched_at: NaiveDateTime,
}

impl Dataset {
    /// Wrap the given schedules with the timestamp of their retrieval.
    #[must_use]
    pub fn new(collections: Vec<Collection>, fetched_at: NaiveDateTime) -> Self {
        Self {
            collections,
            fetched_at,
        }
    }

    /// All schedules in this snapshot, in API order.
    #[must_use]
    pub fn collections(&self) -> &[Collection] {
        &self.collections
    }

    /// When this snapshot was produced, by fetch or cache load.
    #[must_use]
    pub fn fetched_at(&self) -> NaiveDateTime {
        self.fetched_at
    }

    /// First schedule whose id matches, if any.
    ///
    /// Ids are expected unique per snapshot; duplicates would resolve to the
    /// first occurrence.
    #[must_use]
    pub fn find_by_id(&self, id: &str) -> Option<&Collection> {
        self.collections
            .iter()
            .find(|collection| collection.id == id)
    }

    /// Schedules with a pickup on the day after `now`, preserving order.
    #[must_use]
    pub fn due_tomorrow(&self, now: NaiveDateTime) -> Vec<&Collection> {
        self.collections
            .iter()
            .filter(|collection| collection.is_due_tomorrow(now))
            .collect()
    }
}
