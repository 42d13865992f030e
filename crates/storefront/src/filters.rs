//! Custom Askama template filters.

use std::fmt::Display;

use paperback_core::RatingScore;

/// Returns the current year.
///
/// Usage in templates: `{{ ""|current_year }}`
#[allow(clippy::unnecessary_wraps)]
#[askama::filter_fn]
pub fn current_year(_value: impl Display, _env: &dyn askama::Values) -> askama::Result<i32> {
    use chrono::Datelike;
    Ok(chrono::Utc::now().year())
}

/// Renders a rating score as five stars, filled up to the score.
///
/// Usage in templates: `{{ rating.score|stars }}` -> `★★★☆☆`
///
/// Anything that does not display as a score from 1 to 5 renders as five
/// empty stars.
#[allow(clippy::unnecessary_wraps)]
#[askama::filter_fn]
pub fn stars(value: impl Display, _env: &dyn askama::Values) -> askama::Result<String> {
    let filled = value
        .to_string()
        .parse::<i16>()
        .ok()
        .and_then(|score| RatingScore::new(score).ok())
        .map_or(0, |score| usize::try_from(score.value()).unwrap_or(0));

    Ok("★".repeat(filled) + &"☆".repeat(5 - filled))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use askama::Template;

    use crate::filters;

    #[derive(Template)]
    #[template(source = "{{ score|stars }}", ext = "txt")]
    struct Stars {
        score: i16,
    }

    fn render(score: i16) -> String {
        Stars { score }.render().unwrap()
    }

    #[test]
    fn test_stars_fill_to_score() {
        assert_eq!(render(1), "★☆☆☆☆");
        assert_eq!(render(4), "★★★★☆");
        assert_eq!(render(5), "★★★★★");
    }

    #[test]
    fn test_stars_out_of_range_are_empty() {
        assert_eq!(render(0), "☆☆☆☆☆");
        assert_eq!(render(9), "☆☆☆☆☆");
    }
}
