//! Scraper configuration: DOM selectors, scroll behaviour, page timing.
//!
//! Every field has a serde default so a partial JSON file only overrides
//! what it names.

use std::path::{Path, PathBuf};

use reviewsweep_core::config::{read_json_or_default, write_json};
use serde::{Deserialize, Serialize};

use crate::handle::Selector;

/// Selectors for the listing page and its review blocks.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReviewSelectors {
    #[serde(default = "default_place")]
    pub place: Selector,
    #[serde(default = "default_reviews_tab")]
    pub reviews_tab: Selector,
    #[serde(default = "default_sort_button")]
    pub sort_button: Selector,
    #[serde(default = "default_lowest_rating_option")]
    pub lowest_rating_option: Selector,
    #[serde(default = "default_default_sort_option")]
    pub default_sort_option: Selector,
    #[serde(default = "default_container")]
    pub container: Selector,
    #[serde(default = "default_review_block")]
    pub review_block: Selector,
    #[serde(default = "default_more_button")]
    pub more_button: Selector,
    #[serde(default = "default_rating")]
    pub rating: Selector,
    #[serde(default = "default_rating_attribute")]
    pub rating_attribute: String,
    #[serde(default = "default_text")]
    pub text: Selector,
    #[serde(default = "default_user")]
    pub user: Selector,
    #[serde(default = "default_date")]
    pub date: Selector,
    #[serde(default = "default_total_reviews")]
    pub total_reviews: Selector,
}

fn default_place() -> Selector {
    Selector::xpath("//h1[contains(@class, 'DUwDvf')]")
}
fn default_reviews_tab() -> Selector {
    Selector::xpath("//button[contains(., 'Reviews') or contains(., 'Ulasan')]")
}
fn default_sort_button() -> Selector {
    Selector::xpath("//button[contains(., 'Sort') or contains(., 'Urutkan')]")
}
fn default_lowest_rating_option() -> Selector {
    Selector::xpath("//*[contains(text(), 'Lowest rating') or contains(text(), 'Peringkat terendah')]")
}
fn default_default_sort_option() -> Selector {
    Selector::xpath("//*[contains(text(), 'Most relevant') or contains(text(), 'Paling relevan')]")
}
fn default_container() -> Selector {
    Selector::xpath("//div[contains(@class,'m6QErb') and contains(@class,'DxyBCb')]")
}
fn default_review_block() -> Selector {
    Selector::class("jftiEf")
}
fn default_more_button() -> Selector {
    Selector::class("w8nwRe")
}
fn default_rating() -> Selector {
    Selector::class("kvMYJc")
}
fn default_rating_attribute() -> String {
    "aria-label".into()
}
fn default_text() -> Selector {
    Selector::class("wiI7pd")
}
fn default_user() -> Selector {
    Selector::class("d4r55")
}
fn default_date() -> Selector {
    Selector::class("rsqaWe")
}
fn default_total_reviews() -> Selector {
    Selector::class("RfnDt")
}

impl Default for ReviewSelectors {
    fn default() -> Self {
        Self {
            place: default_place(),
            reviews_tab: default_reviews_tab(),
            sort_button: default_sort_button(),
            lowest_rating_option: default_lowest_rating_option(),
            default_sort_option: default_default_sort_option(),
            container: default_container(),
            review_block: default_review_block(),
            more_button: default_more_button(),
            rating: default_rating(),
            rating_attribute: default_rating_attribute(),
            text: default_text(),
            user: default_user(),
            date: default_date(),
            total_reviews: default_total_reviews(),
        }
    }
}

/// Scroll state machine tuning.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScrollConfig {
    #[serde(default = "default_step_min")]
    pub step_min_px: i64,
    #[serde(default = "default_step_max")]
    pub step_max_px: i64,
    #[serde(default = "default_pause_min")]
    pub pause_min_ms: u64,
    #[serde(default = "default_pause_max")]
    pub pause_max_ms: u64,
    /// A reading pause follows every N scroll steps; 0 disables it.
    #[serde(default = "default_reading_every")]
    pub reading_every: usize,
    #[serde(default = "default_reading_min")]
    pub reading_min_ms: u64,
    #[serde(default = "default_reading_max")]
    pub reading_max_ms: u64,
    /// Consecutive non-advancing checks before the pass is done.
    #[serde(default = "default_stuck_budget")]
    pub stuck_retry_budget: usize,
    /// Hard bound on state machine iterations per pass.
    #[serde(default = "default_max_iterations")]
    pub max_iterations: usize,
    /// Fixed RNG seed for reproducible step sizes and pauses.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seed: Option<u64>,
}

fn default_step_min() -> i64 {
    300
}
fn default_step_max() -> i64 {
    800
}
fn default_pause_min() -> u64 {
    300
}
fn default_pause_max() -> u64 {
    900
}
fn default_reading_every() -> usize {
    8
}
fn default_reading_min() -> u64 {
    1500
}
fn default_reading_max() -> u64 {
    3500
}
fn default_stuck_budget() -> usize {
    5
}
fn default_max_iterations() -> usize {
    10_000
}

impl Default for ScrollConfig {
    fn default() -> Self {
        Self {
            step_min_px: default_step_min(),
            step_max_px: default_step_max(),
            pause_min_ms: default_pause_min(),
            pause_max_ms: default_pause_max(),
            reading_every: default_reading_every(),
            reading_min_ms: default_reading_min(),
            reading_max_ms: default_reading_max(),
            stuck_retry_budget: default_stuck_budget(),
            max_iterations: default_max_iterations(),
            seed: None,
        }
    }
}

/// Settle delays after page actions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PageTiming {
    #[serde(default = "default_page_load")]
    pub page_load_ms: u64,
    #[serde(default = "default_click_settle")]
    pub click_settle_ms: u64,
    #[serde(default = "default_menu_settle")]
    pub menu_settle_ms: u64,
    #[serde(default = "default_expand_settle")]
    pub expand_settle_ms: u64,
}

fn default_page_load() -> u64 {
    5000
}
fn default_click_settle() -> u64 {
    2000
}
fn default_menu_settle() -> u64 {
    1000
}
fn default_expand_settle() -> u64 {
    200
}

impl Default for PageTiming {
    fn default() -> Self {
        Self {
            page_load_ms: default_page_load(),
            click_settle_ms: default_click_settle(),
            menu_settle_ms: default_menu_settle(),
            expand_settle_ms: default_expand_settle(),
        }
    }
}

/// Persisted scraper configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ScraperConfig {
    #[serde(default)]
    pub selectors: ReviewSelectors,
    #[serde(default)]
    pub scroll: ScrollConfig,
    #[serde(default)]
    pub timing: PageTiming,
    /// Path to config file (not serialized).
    #[serde(skip)]
    pub config_path: PathBuf,
}

impl ScraperConfig {
    /// Load `scraper.json` from `config_dir`, or return defaults.
    pub fn load(config_dir: &Path) -> Self {
        let config_path = config_dir.join("scraper.json");
        let mut config: ScraperConfig = read_json_or_default(&config_path);
        config.config_path = config_path;
        config
    }

    /// Save config to disk.
    pub fn save(&self) -> reviewsweep_core::Result<()> {
        write_json(&self.config_path, self)
    }

    /// Defaults with every sleep set to zero.
    pub fn no_delay() -> Self {
        let mut config = Self::default();
        config.scroll.pause_min_ms = 0;
        config.scroll.pause_max_ms = 0;
        config.scroll.reading_min_ms = 0;
        config.scroll.reading_max_ms = 0;
        config.timing = PageTiming {
            page_load_ms: 0,
            click_settle_ms: 0,
            menu_settle_ms: 0,
            expand_settle_ms: 0,
        };
        config
    }
}
