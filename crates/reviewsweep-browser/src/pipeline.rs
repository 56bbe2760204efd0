//! Review pipeline: navigation, sort passes, default pass, merge, dedup.

use std::time::Duration;

use chrono::NaiveDate;
use reviewsweep_core::{Error, Result};
use reviewsweep_ingest::{dedup_by_content, Review};
use tracing::{debug, info, warn};

use crate::config::ScraperConfig;
use crate::error::BrowserError;
use crate::handle::{AutomationHandle, Selector};
use crate::scroller::ExtractionScroller;
use crate::session::ReportSession;
use crate::types::*;

/// Orchestrates extraction passes over one listing.
pub struct ReviewPipeline {
    config: ScraperConfig,
    today: Option<NaiveDate>,
}

impl ReviewPipeline {
    pub fn new(config: ScraperConfig) -> Self {
        Self { config, today: None }
    }

    /// Fix the anchor for relative dates.
    pub fn with_today(mut self, today: NaiveDate) -> Self {
        self.today = Some(today);
        self
    }

    /// Extract low-rating reviews from `url`.
    ///
    /// Never returns an error: setup failures come back as an empty
    /// [`PipelineOutcome`] with status `Failed` and the error place sentinel.
    pub fn run<H: AutomationHandle + ?Sized>(
        &self,
        handle: &mut H,
        url: &str,
        session: &ReportSession,
    ) -> PipelineOutcome {
        match self.try_run(handle, url, session) {
            Ok(outcome) => outcome,
            Err(e) => {
                warn!("Review extraction failed for {}: {}", url, e);
                PipelineOutcome::failed(e.to_string())
            }
        }
    }

    fn try_run<H: AutomationHandle + ?Sized>(
        &self,
        handle: &mut H,
        url: &str,
        session: &ReportSession,
    ) -> Result<PipelineOutcome> {
        let cancel = session.cancel_token();
        let mut scroller = ExtractionScroller::new(&self.config);
        if let Some(today) = self.today {
            scroller = scroller.with_today(today);
        }

        handle.navigate(url)?;
        self.settle(self.config.timing.page_load_ms);

        let place = self.read_place(handle);
        info!("Extracting reviews for '{}'", place);
        self.open_reviews_tab(handle);

        let mut passes: Vec<PassSummary> = Vec::new();
        let mut raw: Vec<Review> = Vec::new();

        let mut orders = Vec::with_capacity(3);
        if self.select_sort(handle, &self.config.selectors.lowest_rating_option) {
            orders.extend([PassOrder::LowestRating, PassOrder::LowestRating]);
        } else {
            info!("Lowest-rating sort unavailable; default order only");
        }
        orders.push(PassOrder::Default);

        for (i, order) in orders.into_iter().enumerate() {
            if cancel.is_cancelled() {
                break;
            }
            if order == PassOrder::Default && i > 0 {
                self.select_sort(handle, &self.config.selectors.default_sort_option);
            }

            // Re-found per pass: sorting re-renders the list.
            let container = handle
                .find_element(None, &self.config.selectors.container)
                .map_err(|e| match e {
                    BrowserError::NoSuchElement(_) => Error::Pipeline("review list container not found".into()),
                    other => other.into(),
                })?;

            let result = scroller.run_pass(handle, &container, cancel)?;
            debug!("{:?} pass yielded {} reviews", order, result.reviews.len());
            raw.extend(result.reviews);
            passes.push(PassSummary {
                order,
                report: result.report,
            });
        }

        for review in &mut raw {
            review.place = place.clone();
        }
        let merged = dedup_by_content(raw);

        let status = if cancel.is_cancelled() {
            PipelineStatus::Cancelled
        } else {
            PipelineStatus::Completed
        };
        let outcome = PipelineOutcome {
            place,
            reviews: merged.reviews,
            before_dedup: merged.before,
            after_dedup: merged.after,
            passes,
            status,
            error: None,
        };

        info!(
            "Extraction {:?}: {} passes, {} rows before dedup, {} after, {} critical skips",
            outcome.status,
            outcome.passes.len(),
            outcome.before_dedup,
            outcome.after_dedup,
            outcome.critical_skips()
        );
        Ok(outcome)
    }

    fn read_place<H: AutomationHandle + ?Sized>(&self, handle: &mut H) -> String {
        let name = handle
            .find_element(None, &self.config.selectors.place)
            .and_then(|el| handle.text(&el));
        match name {
            Ok(name) if !name.trim().is_empty() => name.trim().to_string(),
            Ok(_) => UNKNOWN_PLACE.to_string(),
            Err(e) => {
                debug!("Place name unreadable: {}", e);
                UNKNOWN_PLACE.to_string()
            }
        }
    }

    fn open_reviews_tab<H: AutomationHandle + ?Sized>(&self, handle: &mut H) {
        let clicked = handle
            .find_element(None, &self.config.selectors.reviews_tab)
            .and_then(|tab| handle.script_click(&tab));
        match clicked {
            Ok(()) => self.settle(self.config.timing.click_settle_ms),
            Err(e) => debug!("Reviews tab not clicked: {}", e),
        }
    }

    /// Open the sort menu and click the first clickable `option`.
    fn select_sort<H: AutomationHandle + ?Sized>(&self, handle: &mut H, option: &Selector) -> bool {
        let opened = handle
            .find_element(None, &self.config.selectors.sort_button)
            .and_then(|button| handle.script_click(&button));
        if let Err(e) = opened {
            debug!("Sort menu unavailable: {}", e);
            return false;
        }
        self.settle(self.config.timing.menu_settle_ms);

        let options = handle.find_elements(None, option).unwrap_or_default();
        let selected = options.iter().any(|opt| handle.script_click(opt).is_ok());
        self.settle(self.config.timing.click_settle_ms);
        selected
    }

    fn settle(&self, ms: u64) {
        if ms > 0 {
            std::thread::sleep(Duration::from_millis(ms));
        }
    }
}
