//! Subcommand implementations. Each `run_*` returns data; `print_*` renders it.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use anyhow::{anyhow, bail, Context};
use reviewsweep_browser::CookieJarStore;
use reviewsweep_infer::{filter_by_category, ClassificationResult, SemanticClassifier};
use reviewsweep_ingest::{
    export_csv, export_file_name, is_low_rating, unreported_only, RatingSummary, Review,
};
use reviewsweep_store::ReportHistory;
use tracing::{info, warn};

// ---------------------------------------------------------------
// classify
// ---------------------------------------------------------------

pub fn print_assessment(text: &str, result: &ClassificationResult) {
    let c = &result.classification;
    let v = &result.validation;
    println!("Text:           {}", text);
    println!("Category:       {}", c.category);
    println!("Confidence:     {:.2}%", c.confidence);
    println!("Key concepts:   {}", v.key_concepts);
    println!("Policy reason:  {}", v.policy_reason);
    println!("Context:        {}", v.context_sentence);
}

// ---------------------------------------------------------------
// dataset
// ---------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub struct DatasetArgs {
    pub input: PathBuf,
    pub category: Option<String>,
    pub reporter: Option<String>,
    pub unreported: bool,
    pub csv: Option<PathBuf>,
}

impl DatasetArgs {
    /// Parse `<reviews.json> [--category C] [--reporter R] [--unreported] [--csv OUT]`.
    pub fn parse(args: &[String]) -> anyhow::Result<Self> {
        let mut input = None;
        let mut category = None;
        let mut reporter = None;
        let mut unreported = false;
        let mut csv = None;

        let mut it = args.iter();
        while let Some(arg) = it.next() {
            match arg.as_str() {
                "--category" => category = Some(flag_value(&mut it, "--category")?),
                "--reporter" => reporter = Some(flag_value(&mut it, "--reporter")?),
                "--csv" => csv = Some(PathBuf::from(flag_value(&mut it, "--csv")?)),
                "--unreported" => unreported = true,
                other if other.starts_with("--") => bail!("Unknown option: {}", other),
                other if input.is_none() => input = Some(PathBuf::from(other)),
                other => bail!("Unexpected argument: {}", other),
            }
        }

        let input = input.ok_or_else(|| anyhow!("Missing <reviews.json>"))?;
        if unreported && reporter.is_none() {
            bail!("--unreported needs --reporter");
        }

        Ok(Self {
            input,
            category,
            reporter,
            unreported,
            csv,
        })
    }
}

fn flag_value<'a>(it: &mut impl Iterator<Item = &'a String>, flag: &str) -> anyhow::Result<String> {
    it.next().cloned().ok_or_else(|| anyhow!("{} needs a value", flag))
}

/// One classified dataset row.
#[derive(Debug, Clone)]
pub struct DatasetRow {
    pub review: Review,
    pub category: String,
    pub confidence: f64,
    pub reported: bool,
}

#[derive(Debug)]
pub struct DatasetReport {
    /// Rows in the input file.
    pub loaded: usize,
    pub rows: Vec<DatasetRow>,
    pub summary: RatingSummary,
    pub exported: Option<PathBuf>,
}

pub fn load_reviews(path: &Path) -> anyhow::Result<Vec<Review>> {
    let data = std::fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    let reviews: Vec<Review> =
        serde_json::from_str(&data).with_context(|| format!("parsing {}", path.display()))?;
    Ok(reviews)
}

pub fn run_dataset(
    args: &DatasetArgs,
    classifier: &SemanticClassifier,
    history: &ReportHistory,
) -> anyhow::Result<DatasetReport> {
    let loaded_reviews = load_reviews(&args.input)?;
    let loaded = loaded_reviews.len();

    let mut reviews: Vec<Review> = loaded_reviews.into_iter().filter(|r| is_low_rating(r.rating)).collect();
    if reviews.len() < loaded {
        warn!("Ignoring {} rows outside the 1-2 star range", loaded - reviews.len());
    }

    let reported_keys: HashSet<String> = args
        .reporter
        .as_deref()
        .map(|r| history.reported_keys(r))
        .unwrap_or_default();

    if args.unreported {
        reviews = unreported_only(&reviews, &reported_keys).into_iter().cloned().collect();
    }

    if let Some(category) = &args.category {
        if !classifier.taxonomy().contains(category) {
            let names: Vec<&str> = classifier.taxonomy().names().collect();
            bail!("Unknown category '{}'. Known: {}", category, names.join(", "));
        }
        reviews = filter_by_category(&reviews, classifier, category)
            .into_iter()
            .cloned()
            .collect();
    }

    let summary = RatingSummary::from_reviews(&reviews);

    let exported = match &args.csv {
        Some(out) => {
            let path = if out.is_dir() {
                let place = reviews.first().map(|r| r.place.as_str()).unwrap_or("dataset");
                out.join(export_file_name(place))
            } else {
                out.clone()
            };
            let file = std::fs::File::create(&path).with_context(|| format!("creating {}", path.display()))?;
            export_csv(&reviews, file)?;
            info!("Wrote {}", path.display());
            Some(path)
        }
        None => None,
    };

    let rows = reviews
        .into_iter()
        .map(|review| {
            let c = classifier.classify(&review.review_text);
            let reported = reported_keys.contains(&review.review_key());
            DatasetRow {
                review,
                category: c.category,
                confidence: c.confidence,
                reported,
            }
        })
        .collect();

    Ok(DatasetReport {
        loaded,
        rows,
        summary,
        exported,
    })
}

pub fn print_dataset_report(report: &DatasetReport) {
    println!("=== Dataset ===");
    println!();
    println!("Loaded rows:      {}", report.loaded);
    println!("Selected rows:    {}", report.summary.total);
    for (stars, count) in &report.summary.counts {
        println!("  {} star:         {}", stars, count);
    }
    match report.summary.average {
        Some(avg) => println!("Average rating:   {:.2}", avg),
        None => println!("Average rating:   n/a"),
    }

    if !report.rows.is_empty() {
        println!();
        for row in &report.rows {
            println!(
                "[{:.1}] {:<20} {:<30} {:>6.2}%{}  {}",
                row.review.rating,
                row.review.user,
                row.category,
                row.confidence,
                if row.reported { "  (reported)" } else { "" },
                row.review.review_text
            );
        }
    }

    if let Some(path) = &report.exported {
        println!();
        println!("CSV written to {}", path.display());
    }
}

// ---------------------------------------------------------------
// history / accounts
// ---------------------------------------------------------------

pub fn print_history(history: &ReportHistory, reporter: Option<&str>) {
    let reporters: Vec<&str> = match reporter {
        Some(r) => vec![r],
        None => history.reporters().collect(),
    };
    if reporters.is_empty() || history.is_empty() {
        println!("No reports recorded.");
        return;
    }

    for r in reporters {
        let entries = history.entries_for(r);
        println!("{} ({} reports)", r, entries.len());
        for (key, entry) in entries {
            println!("  {}  {:<30} {}", entry.date, entry.category, key);
        }
    }
}

pub fn print_accounts(store: &CookieJarStore) {
    let accounts = store.accounts();
    if accounts.is_empty() {
        println!("No saved account sessions.");
        return;
    }
    for account in accounts {
        if let Some(jar) = store.get(&account) {
            println!(
                "{:<24} {:<32} {} cookies, saved {}",
                jar.account,
                jar.reporter_key(),
                jar.cookies.len(),
                jar.saved_at.format("%Y-%m-%d %H:%M")
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reviewsweep_infer::{HashingEmbedder, Taxonomy};
    use reviewsweep_ingest::ParsedDate;
    use std::sync::Arc;

    fn args(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    fn review(user: &str, rating: f64, text: &str) -> Review {
        Review {
            place: "Cafe Luna".into(),
            user: user.into(),
            rating,
            raw_date: "3 weeks ago".into(),
            parsed_date: ParsedDate::Raw("3 weeks ago".into()),
            review_text: text.into(),
            total_reviews: None,
        }
    }

    fn classifier() -> SemanticClassifier {
        SemanticClassifier::new(Arc::new(HashingEmbedder::new(384)), Taxonomy::builtin()).unwrap()
    }

    fn write_dataset(dir: &Path, reviews: &[Review]) -> PathBuf {
        let path = dir.join("reviews.json");
        std::fs::write(&path, serde_json::to_string(reviews).unwrap()).unwrap();
        path
    }

    #[test]
    fn test_parse_dataset_args() {
        let parsed = DatasetArgs::parse(&args(&[
            "r.json",
            "--category",
            "Spam",
            "--reporter",
            "ann",
            "--unreported",
            "--csv",
            "out.csv",
        ]))
        .unwrap();
        assert_eq!(parsed.input, PathBuf::from("r.json"));
        assert_eq!(parsed.category.as_deref(), Some("Spam"));
        assert_eq!(parsed.reporter.as_deref(), Some("ann"));
        assert!(parsed.unreported);
        assert_eq!(parsed.csv, Some(PathBuf::from("out.csv")));
    }

    #[test]
    fn test_parse_dataset_args_errors() {
        assert!(DatasetArgs::parse(&args(&[])).is_err());
        assert!(DatasetArgs::parse(&args(&["r.json", "--category"])).is_err());
        assert!(DatasetArgs::parse(&args(&["r.json", "--unreported"])).is_err());
        assert!(DatasetArgs::parse(&args(&["r.json", "--bogus"])).is_err());
        assert!(DatasetArgs::parse(&args(&["a.json", "b.json"])).is_err());
    }

    #[test]
    fn test_unreported_filter_and_summary() {
        let dir = tempfile::tempdir().unwrap();
        let reviews = vec![
            review("Ann", 1.0, "cold food"),
            review("Bob", 2.0, "slow service"),
            review("Cy", 4.0, "lovely"),
        ];
        let input = write_dataset(dir.path(), &reviews);

        let mut history = ReportHistory::load(&dir.path().join("history.json"));
        history.record("ann@example.com", &reviews[0].review_key(), "Spam");

        let parsed = DatasetArgs::parse(&args(&[
            input.to_str().unwrap(),
            "--reporter",
            "ann@example.com",
            "--unreported",
        ]))
        .unwrap();
        let report = run_dataset(&parsed, &classifier(), &history).unwrap();

        assert_eq!(report.loaded, 3);
        assert_eq!(report.rows.len(), 1);
        assert_eq!(report.rows[0].review.user, "Bob");
        assert_eq!(report.summary.average, Some(2.0));
    }

    #[test]
    fn test_category_filter_and_csv_export() {
        let dir = tempfile::tempdir().unwrap();
        let reviews = vec![review("Ann", 1.0, ""), review("Bob", 2.0, "slow service")];
        let input = write_dataset(dir.path(), &reviews);
        let history = ReportHistory::load(&dir.path().join("history.json"));
        let out_dir = dir.path().join("exports");
        std::fs::create_dir_all(&out_dir).unwrap();

        let parsed = DatasetArgs::parse(&args(&[
            input.to_str().unwrap(),
            "--category",
            "Spam",
            "--csv",
            out_dir.to_str().unwrap(),
        ]))
        .unwrap();
        let report = run_dataset(&parsed, &classifier(), &history).unwrap();

        // Empty text always lands in the insufficient-content bucket.
        assert!(report.rows.iter().any(|r| r.review.user == "Ann"));
        assert!(report.rows.iter().all(|r| r.category == "Spam"));
        let exported = report.exported.unwrap();
        assert_eq!(exported, out_dir.join("low_rating_reviews_Cafe_Luna.csv"));
        let csv = std::fs::read_to_string(exported).unwrap();
        assert!(csv.starts_with("Place,User,Total Reviews,Rating"));
    }

    #[test]
    fn test_unknown_category_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let input = write_dataset(dir.path(), &[review("Ann", 1.0, "cold food")]);
        let history = ReportHistory::load(&dir.path().join("history.json"));
        let parsed = DatasetArgs::parse(&args(&[input.to_str().unwrap(), "--category", "Nope"])).unwrap();
        assert!(run_dataset(&parsed, &classifier(), &history).is_err());
    }
}
