//! Tabular (CSV) export of a review dataset.

use std::io::Write;

use reviewsweep_core::{Error, Result};
use tracing::info;

use crate::review::Review;

const HEADERS: [&str; 8] = [
    "Place",
    "User",
    "Total Reviews",
    "Rating",
    "Date (Raw)",
    "Date (Parsed)",
    "Review Text",
    "Review Key",
];

/// Write reviews as CSV, one row per review, header first.
pub fn export_csv<W: Write>(reviews: &[Review], writer: W) -> Result<()> {
    let mut wtr = csv::Writer::from_writer(writer);
    wtr.write_record(HEADERS).map_err(csv_err)?;

    for review in reviews {
        let rating = format!("{:.1}", review.rating);
        let parsed_date = review.parsed_date.to_string();
        let key = review.review_key();
        wtr.write_record([
            review.place.as_str(),
            review.user.as_str(),
            review.total_reviews.as_deref().unwrap_or(""),
            rating.as_str(),
            review.raw_date.as_str(),
            parsed_date.as_str(),
            review.review_text.as_str(),
            key.as_str(),
        ])
        .map_err(csv_err)?;
    }

    wtr.flush()?;
    info!("Exported {} reviews to CSV", reviews.len());
    Ok(())
}

/// `low_rating_reviews_<place>.csv`, with spaces and slashes replaced.
pub fn export_file_name(place: &str) -> String {
    let safe: String = place
        .chars()
        .map(|c| if c == ' ' || c == '/' { '_' } else { c })
        .collect();
    format!("low_rating_reviews_{}.csv", safe)
}

fn csv_err(e: csv::Error) -> Error {
    Error::Export(e.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::review::ParsedDate;
    use chrono::NaiveDate;

    #[test]
    fn test_export_rows() {
        let reviews = vec![Review {
            place: "Cafe Luna".into(),
            user: "Ann, B.".into(),
            rating: 1.0,
            raw_date: "3 weeks ago".into(),
            parsed_date: ParsedDate::Date(NaiveDate::from_ymd_opt(2024, 1, 1).unwrap()),
            review_text: "cold food".into(),
            total_reviews: Some("12 reviews".into()),
        }];

        let mut buf = Vec::new();
        export_csv(&reviews, &mut buf).unwrap();
        let out = String::from_utf8(buf).unwrap();
        let mut lines = out.lines();

        assert_eq!(
            lines.next().unwrap(),
            "Place,User,Total Reviews,Rating,Date (Raw),Date (Parsed),Review Text,Review Key"
        );
        assert_eq!(
            lines.next().unwrap(),
            "Cafe Luna,\"Ann, B.\",12 reviews,1.0,3 weeks ago,2024-01-01,cold food,\"cafeluna_ann,b._20240101_coldfood\""
        );
        assert!(lines.next().is_none());
    }

    #[test]
    fn test_export_file_name() {
        assert_eq!(export_file_name("Cafe Luna / Downtown"), "low_rating_reviews_Cafe_Luna___Downtown.csv");
    }
}
