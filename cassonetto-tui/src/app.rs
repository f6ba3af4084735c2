use std::path::PathBuf;
use std::sync::Arc;

use cassonetto_core::{
    cache::CacheStore,
    client::AmbienteClient,
    model::{Collection, Dataset, WASTE_TYPES, ZoneMeta},
    ports::ScheduleSource,
    service::{DEFAULT_CACHE_HOURS, DataService},
};

/// TTL bounds offered in the setup step, in hours.
const MIN_CACHE_HOURS: u32 = 1;
const MAX_CACHE_HOURS: u32 = 168;

#[derive(Debug, Clone, Copy)]
pub(crate) enum Screen {
    ZoneSelect,
    Setup,
    ScheduleView,
}

/// One toggleable waste stream in the setup step.
pub(crate) struct WasteToggle {
    pub code: String,
    pub title: String,
    pub enabled: bool,
}

pub(crate) struct App {
    pub client: Arc<AmbienteClient>,
    pub storage_dir: PathBuf,

    pub screen: Screen,
    pub zones: Vec<ZoneMeta>,
    pub zone_list_index: usize,
    pub selected_zone: Option<ZoneMeta>,

    pub waste_toggles: Vec<WasteToggle>,
    /// Cursor over the setup rows; `waste_toggles.len()` is the TTL row.
    pub setup_index: usize,
    pub cache_hours: u32,

    pub service: Option<Arc<DataService>>,
    pub dataset: Option<Dataset>,

    pub is_loading: bool,
    pub error_message: Option<String>,
}

impl App {
    pub(crate) fn new(
        client: Arc<AmbienteClient>,
        storage_dir: PathBuf,
        zones: Vec<ZoneMeta>,
    ) -> Self {
        Self {
            client,
            storage_dir,
            screen: Screen::ZoneSelect,
            zones,
            zone_list_index: 0,
            selected_zone: None,
            waste_toggles: WASTE_TYPES
                .iter()
                .map(|(code, title)| WasteToggle {
                    code: (*code).to_owned(),
                    title: (*title).to_owned(),
                    enabled: false,
                })
                .collect(),
            setup_index: 0,
            cache_hours: DEFAULT_CACHE_HOURS,
            service: None,
            dataset: None,
            is_loading: false,
            error_message: None,
        }
    }

    pub(crate) fn select_current_zone(&mut self) {
        if let Some(zone) = self.zones.get(self.zone_list_index) {
            self.selected_zone = Some(zone.clone());
            self.screen = Screen::Setup;
            self.setup_index = 0;
        }
    }

    /// Number of cursor positions in the setup step (toggles + TTL row).
    pub(crate) fn setup_rows(&self) -> usize {
        self.waste_toggles.len() + 1
    }

    pub(crate) fn on_ttl_row(&self) -> bool {
        self.setup_index == self.waste_toggles.len()
    }

    pub(crate) fn toggle_current_waste(&mut self) {
        if let Some(toggle) = self.waste_toggles.get_mut(self.setup_index) {
            toggle.enabled = !toggle.enabled;
        }
    }

    pub(crate) fn adjust_cache_hours(&mut self, delta: i32) {
        let adjusted = self.cache_hours.saturating_add_signed(delta);
        self.cache_hours = adjusted.clamp(MIN_CACHE_HOURS, MAX_CACHE_HOURS);
    }

    /// Finish setup: build the per-zone service.
    ///
    /// Fails with a user-facing message when nothing is selected or the
    /// storage directory cannot be created.
    pub(crate) fn confirm_setup(&mut self) -> Result<Arc<DataService>, String> {
        let Some(zone) = self.selected_zone.clone() else {
            return Err("Select a zone first".into());
        };
        if !self.waste_toggles.iter().any(|toggle| toggle.enabled) {
            return Err("Select at least one waste type (Space toggles)".into());
        }

        let cache = CacheStore::new(&self.storage_dir, &zone.id)
            .map_err(|err| format!("Could not prepare the cache directory: {err}"))?;

        let source: Arc<dyn ScheduleSource> = Arc::clone(&self.client) as _;
        let service = Arc::new(DataService::new(
            source,
            cache,
            zone.id,
            self.cache_hours,
        ));
        self.service = Some(Arc::clone(&service));
        self.screen = Screen::ScheduleView;
        Ok(service)
    }

    /// Collections of the current snapshot restricted to the selected types.
    pub(crate) fn visible_collections(&self) -> Vec<&Collection> {
        let Some(dataset) = &self.dataset else {
            return Vec::new();
        };
        dataset
            .collections()
            .iter()
            .filter(|collection| {
                self.waste_toggles
                    .iter()
                    .any(|toggle| toggle.enabled && toggle.code == collection.id())
            })
            .collect()
    }
}
