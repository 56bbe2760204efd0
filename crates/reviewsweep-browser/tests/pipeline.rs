use std::collections::HashSet;

use chrono::NaiveDate;
use reviewsweep_browser::testing::{FakeBlock, FakeBrowser};
use reviewsweep_browser::{
    PassOrder, PipelineStatus, ReportSession, ReviewPipeline, ScraperConfig, ScrollStop, UNKNOWN_PLACE,
    UNKNOWN_PLACE_ERROR,
};

const URL: &str = "https://maps.example.com/place/cafe-luna";

fn pipeline() -> ReviewPipeline {
    let mut config = ScraperConfig::no_delay();
    config.scroll.seed = Some(7);
    ReviewPipeline::new(config).with_today(NaiveDate::from_ymd_opt(2024, 1, 22).unwrap())
}

fn scenario_blocks() -> Vec<FakeBlock> {
    vec![
        FakeBlock::review(1.0, "Ann", "Cold food and rude staff", "3 weeks ago"),
        FakeBlock::review(3.0, "Bob", "Average place", "2 days ago"),
        FakeBlock::review(2.0, "Cy", "Waited an hour for coffee", "a month ago"),
        FakeBlock::broken(),
    ]
}

#[test]
fn end_to_end_keeps_low_ratings_and_counts_skips() {
    let mut browser = FakeBrowser::with_blocks(scenario_blocks());
    let outcome = pipeline().run(&mut browser, URL, &ReportSession::anonymous());

    assert_eq!(outcome.status, PipelineStatus::Completed);
    assert_eq!(outcome.place, "Cafe Luna");
    assert_eq!(outcome.reviews.len(), 2);
    assert!(outcome.reviews.iter().all(|r| r.rating == 1.0 || r.rating == 2.0));
    assert!(outcome.reviews.iter().all(|r| r.place == "Cafe Luna"));

    // Two lowest-rating passes plus the default pass.
    let orders: Vec<PassOrder> = outcome.passes.iter().map(|p| p.order).collect();
    assert_eq!(orders, vec![PassOrder::LowestRating, PassOrder::LowestRating, PassOrder::Default]);
    assert!(outcome.passes.iter().all(|p| p.report.critical_skips == 1));
    assert!(outcome.passes.iter().all(|p| p.report.kept == 2));
    assert_eq!(outcome.critical_skips(), 3);

    assert_eq!(outcome.before_dedup, 6);
    assert_eq!(outcome.after_dedup, 2);
}

#[test]
fn each_pass_starts_from_the_top() {
    let mut browser = FakeBrowser::with_blocks(scenario_blocks());
    pipeline().run(&mut browser, URL, &ReportSession::anonymous());

    assert_eq!(browser.count("set_scroll_top:container:0"), 3);
    assert_eq!(browser.count("script_click:opt-lowest"), 1);
    assert_eq!(browser.count("script_click:opt-default"), 1);
    assert_eq!(browser.count("script_click:reviews-tab"), 1);
}

#[test]
fn default_pass_runs_when_sort_is_unavailable() {
    let mut browser = FakeBrowser::with_blocks(scenario_blocks());
    browser.sort_available = false;

    let outcome = pipeline().run(&mut browser, URL, &ReportSession::anonymous());

    assert_eq!(outcome.status, PipelineStatus::Completed);
    assert_eq!(outcome.passes.len(), 1);
    assert_eq!(outcome.passes[0].order, PassOrder::Default);
    assert_eq!(outcome.reviews.len(), 2);
}

#[test]
fn no_two_reviews_share_user_and_text() {
    let mut blocks = scenario_blocks();
    blocks.push(FakeBlock::review(1.0, "Ann", "Cold food and rude staff", "2 months ago"));
    blocks.push(FakeBlock::review(1.0, "Dee", "Cold food and rude staff", "2 months ago"));
    let mut browser = FakeBrowser::with_blocks(blocks);

    let outcome = pipeline().run(&mut browser, URL, &ReportSession::anonymous());

    let mut seen = HashSet::new();
    for review in &outcome.reviews {
        assert!(seen.insert((review.user.clone(), review.review_text.clone())));
    }
    assert_eq!(outcome.reviews.len(), 3);
    // First-seen order survives the merge.
    let users: Vec<&str> = outcome.reviews.iter().map(|r| r.user.as_str()).collect();
    assert_eq!(users, vec!["Ann", "Cy", "Dee"]);
    // The later-dated duplicate by Ann was merged into the first one.
    assert_eq!(outcome.reviews[0].raw_date, "3 weeks ago");
}

#[test]
fn missing_title_uses_place_sentinel() {
    let mut browser = FakeBrowser::with_blocks(scenario_blocks());
    browser.place = None;

    let outcome = pipeline().run(&mut browser, URL, &ReportSession::anonymous());

    assert_eq!(outcome.status, PipelineStatus::Completed);
    assert_eq!(outcome.place, UNKNOWN_PLACE);
    assert!(outcome.reviews.iter().all(|r| r.place == UNKNOWN_PLACE));
}

#[test]
fn navigation_failure_is_an_explicit_failed_outcome() {
    let mut browser = FakeBrowser::with_blocks(scenario_blocks());
    browser.fail_navigation = true;

    let outcome = pipeline().run(&mut browser, URL, &ReportSession::anonymous());

    assert_eq!(outcome.status, PipelineStatus::Failed);
    assert_eq!(outcome.place, UNKNOWN_PLACE_ERROR);
    assert!(outcome.reviews.is_empty());
    assert!(outcome.error.is_some());
}

#[test]
fn missing_container_fails_the_pipeline() {
    let mut browser = FakeBrowser::with_blocks(scenario_blocks());
    browser.container_present = false;

    let outcome = pipeline().run(&mut browser, URL, &ReportSession::anonymous());

    assert_eq!(outcome.status, PipelineStatus::Failed);
    assert_eq!(outcome.place, UNKNOWN_PLACE_ERROR);
    assert!(outcome.error.unwrap().contains("container"));
}

#[test]
fn cancelled_session_runs_no_passes() {
    let mut browser = FakeBrowser::with_blocks(scenario_blocks());
    let session = ReportSession::anonymous();
    session.cancel();

    let outcome = pipeline().run(&mut browser, URL, &session);

    assert_eq!(outcome.status, PipelineStatus::Cancelled);
    assert!(outcome.passes.is_empty());
    assert!(outcome.reviews.is_empty());
}

#[test]
fn cancellation_mid_run_keeps_collected_reviews() {
    let mut config = ScraperConfig::no_delay();
    config.scroll.seed = Some(7);
    // Endless list: every pass stops at the ceiling after exactly 5 scroll steps.
    config.scroll.max_iterations = 5;
    let pipeline = ReviewPipeline::new(config);

    let session = ReportSession::new(Some("ann@example.com".into()));
    let mut browser = FakeBrowser::with_blocks(scenario_blocks());
    browser.endless = true;
    browser.cancel_on_scroll = Some((7, session.cancel_token().clone()));

    let outcome = pipeline.run(&mut browser, URL, &session);

    assert_eq!(outcome.status, PipelineStatus::Cancelled);
    assert_eq!(outcome.passes.len(), 2);
    assert_eq!(outcome.passes[0].report.stop, ScrollStop::IterationCeiling);
    assert_eq!(outcome.passes[1].report.stop, ScrollStop::Cancelled);
    assert_eq!(outcome.reviews.len(), 2);
}
