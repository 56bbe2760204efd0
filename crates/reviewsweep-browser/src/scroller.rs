//! Incremental scroll-and-collect over a lazily rendered review list.
//!
//! One pass = scroll phase, then extraction phase.
//!
//! Scroll phase state machine:
//!
//! ```text
//! Scrolling --offset repeated--> Stuck --budget left--> Recovering
//!     ^                            |                        |
//!     +--------offset advanced-----+------------------------+
//!                                  +--budget spent--> Done
//! ```
//!
//! An iteration ceiling bounds the loop whatever the state, and the
//! session's cancellation token is checked on every iteration.
//!
//! Extraction reads every rendered block field by field. A missing field
//! takes its default; an unreadable block is counted as a critical skip.

use std::time::Duration;

use chrono::NaiveDate;
use reviewsweep_ingest::{is_low_rating, normalize_text, parse_relative_date, Review};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::config::{PageTiming, ReviewSelectors, ScraperConfig, ScrollConfig};
use crate::error::{BrowserError, BrowserResult};
use crate::handle::{AutomationHandle, ElementRef, Selector};
use crate::types::{PassResult, ScrollPhase, ScrollReport, ScrollStop, UNKNOWN_USER};

pub struct ExtractionScroller {
    selectors: ReviewSelectors,
    scroll: ScrollConfig,
    timing: PageTiming,
    rng: fastrand::Rng,
    today: NaiveDate,
}

/// Substitute `default` when the element is simply absent.
fn or_default<T>(result: BrowserResult<T>, default: T) -> BrowserResult<T> {
    match result {
        Ok(v) => Ok(v),
        Err(e) if e.is_field_level() => Ok(default),
        Err(e) => Err(e),
    }
}

/// First whitespace token of a label like `"2 stars"` or `"1,0 bintang"`.
fn parse_rating_label(label: &str) -> Option<f64> {
    label
        .split_whitespace()
        .next()
        .and_then(|tok| tok.replace(',', ".").parse::<f64>().ok())
}

impl ExtractionScroller {
    pub fn new(config: &ScraperConfig) -> Self {
        let rng = match config.scroll.seed {
            Some(seed) => fastrand::Rng::with_seed(seed),
            None => fastrand::Rng::new(),
        };
        Self {
            selectors: config.selectors.clone(),
            scroll: config.scroll.clone(),
            timing: config.timing.clone(),
            rng,
            today: chrono::Local::now().date_naive(),
        }
    }

    /// Anchor for relative dates ("3 weeks ago").
    pub fn with_today(mut self, today: NaiveDate) -> Self {
        self.today = today;
        self
    }

    /// Run one pass against `container`, starting from the top.
    ///
    /// Errors from the container itself end the pass with `Err`; block
    /// errors never do. A cancelled scroll phase skips extraction.
    pub fn run_pass<H: AutomationHandle + ?Sized>(
        &mut self,
        handle: &mut H,
        container: &ElementRef,
        cancel: &CancellationToken,
    ) -> BrowserResult<PassResult> {
        // Passes must not inherit the previous pass's offset.
        handle.set_scroll_top(container, 0)?;

        let (stop, iterations, recoveries) = self.scroll_phase(handle, container, cancel)?;

        let mut report = ScrollReport {
            iterations,
            recoveries,
            stop,
            blocks: 0,
            kept: 0,
            discarded: 0,
            critical_skips: 0,
        };

        if stop == ScrollStop::Cancelled {
            info!("Pass cancelled after {} iterations", iterations);
            return Ok(PassResult {
                reviews: Vec::new(),
                report,
            });
        }

        let reviews = self.extract_all(handle, cancel, &mut report)?;
        info!(
            "Pass done ({:?}): {} iterations, {} blocks, {} kept, {} discarded, {} critical skips",
            report.stop, report.iterations, report.blocks, report.kept, report.discarded, report.critical_skips
        );

        Ok(PassResult { reviews, report })
    }

    // ---------------------------------------------------------------
    // Scroll phase
    // ---------------------------------------------------------------

    fn scroll_phase<H: AutomationHandle + ?Sized>(
        &mut self,
        handle: &mut H,
        container: &ElementRef,
        cancel: &CancellationToken,
    ) -> BrowserResult<(ScrollStop, usize, usize)> {
        let mut phase = ScrollPhase::Scrolling;
        let mut last_top = handle.scroll_top(container)?;
        let mut stuck_checks = 0usize;
        let mut steps = 0usize;
        let mut recoveries = 0usize;
        let mut iterations = 0usize;

        loop {
            if cancel.is_cancelled() {
                return Ok((ScrollStop::Cancelled, iterations, recoveries));
            }
            if iterations >= self.scroll.max_iterations {
                warn!("Scroll ceiling reached ({} iterations)", iterations);
                return Ok((ScrollStop::IterationCeiling, iterations, recoveries));
            }
            iterations += 1;

            phase = match phase {
                ScrollPhase::Scrolling => {
                    let lo = self.scroll.step_min_px.min(self.scroll.step_max_px);
                    let step = self.rng.i64(lo..=self.scroll.step_max_px);
                    handle.scroll_by(container, step)?;
                    self.pause(self.scroll.pause_min_ms, self.scroll.pause_max_ms);

                    steps += 1;
                    if self.scroll.reading_every > 0 && steps % self.scroll.reading_every == 0 {
                        self.pause(self.scroll.reading_min_ms, self.scroll.reading_max_ms);
                    }

                    let top = handle.scroll_top(container)?;
                    debug!("scroll step {} -> offset {}", step, top);
                    if top == last_top {
                        ScrollPhase::Stuck
                    } else {
                        last_top = top;
                        stuck_checks = 0;
                        ScrollPhase::Scrolling
                    }
                }
                ScrollPhase::Stuck => {
                    stuck_checks += 1;
                    if stuck_checks >= self.scroll.stuck_retry_budget {
                        ScrollPhase::Done
                    } else {
                        ScrollPhase::Recovering
                    }
                }
                ScrollPhase::Recovering => {
                    let height = handle.scroll_height(container)?;
                    handle.set_scroll_top(container, height)?;
                    self.pause(self.scroll.pause_min_ms, self.scroll.pause_max_ms);

                    let top = handle.scroll_top(container)?;
                    debug!("recovery jump to {} -> offset {}", height, top);
                    if top != last_top {
                        last_top = top;
                        stuck_checks = 0;
                        recoveries += 1;
                        ScrollPhase::Scrolling
                    } else {
                        ScrollPhase::Stuck
                    }
                }
                ScrollPhase::Done => return Ok((ScrollStop::Settled, iterations, recoveries)),
            };
        }
    }

    fn pause(&mut self, min_ms: u64, max_ms: u64) {
        if max_ms == 0 {
            return;
        }
        let ms = self.rng.u64(min_ms.min(max_ms)..=max_ms);
        std::thread::sleep(Duration::from_millis(ms));
    }

    // ---------------------------------------------------------------
    // Extraction phase
    // ---------------------------------------------------------------

    fn extract_all<H: AutomationHandle + ?Sized>(
        &mut self,
        handle: &mut H,
        cancel: &CancellationToken,
        report: &mut ScrollReport,
    ) -> BrowserResult<Vec<Review>> {
        let blocks = handle.find_elements(None, &self.selectors.review_block)?;
        report.blocks = blocks.len();

        let mut reviews = Vec::new();
        for block in &blocks {
            if cancel.is_cancelled() {
                info!("Extraction cancelled with {} reviews collected", reviews.len());
                report.stop = ScrollStop::Cancelled;
                break;
            }
            match self.extract_block(handle, block) {
                Ok(Some(review)) => reviews.push(review),
                Ok(None) => report.discarded += 1,
                Err(e) => {
                    warn!("Skipping unreadable review block {}: {}", block.id(), e);
                    report.critical_skips += 1;
                }
            }
        }
        report.kept = reviews.len();
        Ok(reviews)
    }

    /// `Ok(None)` when the rating is outside the retained set.
    fn extract_block<H: AutomationHandle + ?Sized>(
        &mut self,
        handle: &mut H,
        block: &ElementRef,
    ) -> BrowserResult<Option<Review>> {
        let rating = self.read_rating(handle, block)?;
        if !is_low_rating(rating) {
            return Ok(None);
        }

        self.expand(handle, block);

        let text = or_default(self.read_text(handle, block, &self.selectors.text), String::new())?;
        let user = or_default(self.read_text(handle, block, &self.selectors.user), String::new())?;
        let raw_date = or_default(self.read_text(handle, block, &self.selectors.date), String::new())?;
        let total = or_default(self.read_text(handle, block, &self.selectors.total_reviews), String::new())?;

        Ok(Some(Review {
            place: String::new(),
            user: if user.is_empty() { UNKNOWN_USER.to_string() } else { user },
            rating,
            parsed_date: parse_relative_date(&raw_date, self.today),
            raw_date,
            review_text: normalize_text(&text),
            total_reviews: if total.is_empty() { None } else { Some(total) },
        }))
    }

    /// Rating from the star widget's label; 0.0 when absent or unparseable.
    fn read_rating<H: AutomationHandle + ?Sized>(
        &self,
        handle: &mut H,
        block: &ElementRef,
    ) -> BrowserResult<f64> {
        let label = match handle.find_element(Some(block), &self.selectors.rating) {
            Ok(el) => handle.attribute(&el, &self.selectors.rating_attribute),
            Err(e) => Err(e),
        };
        let label = or_default(label, None)?;
        Ok(label.as_deref().and_then(parse_rating_label).unwrap_or(0.0))
    }

    fn read_text<H: AutomationHandle + ?Sized>(
        &self,
        handle: &mut H,
        block: &ElementRef,
        selector: &Selector,
    ) -> BrowserResult<String> {
        let el = handle.find_element(Some(block), selector)?;
        Ok(handle.text(&el)?.trim().to_string())
    }

    /// Click "more" so truncated text is fully rendered. Best-effort.
    fn expand<H: AutomationHandle + ?Sized>(&mut self, handle: &mut H, block: &ElementRef) {
        let clicked = match handle.find_element(Some(block), &self.selectors.more_button) {
            Ok(more) => handle.script_click(&more),
            Err(e) => Err(e),
        };
        match clicked {
            Ok(()) => self.pause(self.timing.expand_settle_ms, self.timing.expand_settle_ms),
            Err(BrowserError::NoSuchElement(_)) => {}
            Err(e) => debug!("Could not expand block {}: {}", block.id(), e),
        }
    }
}
