//! `weft feature list`

use chrono::{DateTime, Utc};
use colored::{ColoredString, Colorize};
use weft_core::{FeatureState, FeatureStatus};

use crate::cli::SortBy;
use crate::context::Context;
use crate::error::Result;

/// Run the feature list command
pub fn run_list(ctx: &Context, all: bool, sort_by: SortBy) -> Result<()> {
    let states = ctx.store()?.list(None)?;
    let total = states.len();
    let features = select_features(states, all, sort_by);

    if features.is_empty() {
        if total == 0 {
            println!("No features yet. Create one with {}", "weft feature create <id>".cyan());
        } else {
            println!("No active features. Use {} to include finished ones.", "--all".cyan());
        }
        return Ok(());
    }

    let width = features
        .iter()
        .map(|f| f.feature_name.len())
        .max()
        .unwrap_or(0)
        .max("FEATURE".len());

    println!(
        "{:<width$}  {:<15}  {}",
        "FEATURE".bold(),
        "STATUS".bold(),
        "LAST ACTIVITY".bold()
    );
    let now = Utc::now();
    for state in &features {
        println!(
            "{:<width$}  {:<15}  {}",
            state.feature_name,
            status_label(state.status),
            humanize_time(state.last_activity, now)
        );
    }

    let hidden = total - features.len();
    if hidden > 0 {
        println!();
        println!("{} finished feature(s) hidden, use --all to show", hidden);
    }
    Ok(())
}

/// Filter out finished features unless `all`, then sort.
pub fn select_features(states: Vec<FeatureState>, all: bool, sort_by: SortBy) -> Vec<FeatureState> {
    let mut features: Vec<FeatureState> = states
        .into_iter()
        .filter(|s| all || !s.status.is_terminal())
        .collect();

    match sort_by {
        SortBy::Name => features.sort_by(|a, b| a.feature_name.cmp(&b.feature_name)),
        SortBy::Status => features.sort_by(|a, b| {
            a.status
                .display_rank()
                .cmp(&b.status.display_rank())
                .then_with(|| a.feature_name.cmp(&b.feature_name))
        }),
        SortBy::Activity => features.sort_by(|a, b| b.last_activity.cmp(&a.last_activity)),
    }
    features
}

pub fn status_label(status: FeatureStatus) -> ColoredString {
    let label = status.as_str();
    match status {
        FeatureStatus::Draft => label.normal(),
        FeatureStatus::InProgress => label.blue(),
        FeatureStatus::Ready => label.green(),
        FeatureStatus::MergeConflict => label.red(),
        FeatureStatus::Completed => label.dimmed(),
        FeatureStatus::Dropped => label.dimmed(),
    }
}

/// Short relative description of `time` as seen from `now`.
pub fn humanize_time(time: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let delta = now.signed_duration_since(time);
    let minutes = delta.num_minutes();
    let hours = delta.num_hours();
    let days = delta.num_days();

    if minutes < 1 {
        "just now".to_string()
    } else if hours < 1 {
        format!("{minutes}m ago")
    } else if hours < 24 {
        format!("{hours}h ago")
    } else if days < 2 {
        "yesterday".to_string()
    } else if days < 7 {
        format!("{days}d ago")
    } else {
        time.format("%Y-%m-%d").to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 15, 12, 0, 0).unwrap()
    }

    #[rstest]
    #[case(Duration::seconds(30), "just now")]
    #[case(Duration::minutes(5), "5m ago")]
    #[case(Duration::minutes(59), "59m ago")]
    #[case(Duration::hours(3), "3h ago")]
    #[case(Duration::hours(30), "yesterday")]
    #[case(Duration::days(4), "4d ago")]
    #[case(Duration::days(10), "2026-03-05")]
    fn humanizes_relative_times(#[case] ago: Duration, #[case] expected: &str) {
        assert_eq!(humanize_time(now() - ago, now()), expected);
    }

    #[test]
    fn future_timestamps_are_just_now() {
        assert_eq!(humanize_time(now() + Duration::minutes(2), now()), "just now");
    }

    fn state(name: &str, status: FeatureStatus, minutes_ago: i64) -> FeatureState {
        let mut state = FeatureState::create_initial(name);
        state.status = status;
        state.last_activity = now() - Duration::minutes(minutes_ago);
        state
    }

    fn names(states: &[FeatureState]) -> Vec<&str> {
        states.iter().map(|s| s.feature_name.as_str()).collect()
    }

    fn sample() -> Vec<FeatureState> {
        vec![
            state("billing", FeatureStatus::Ready, 10),
            state("auth", FeatureStatus::InProgress, 60),
            state("search", FeatureStatus::Completed, 1),
            state("cart", FeatureStatus::Draft, 5),
        ]
    }

    #[test]
    fn hides_finished_features() {
        let listed = select_features(sample(), false, SortBy::Name);
        assert_eq!(names(&listed), vec!["auth", "billing", "cart"]);
    }

    #[test]
    fn sorts_by_status_rank() {
        let listed = select_features(sample(), true, SortBy::Status);
        assert_eq!(names(&listed), vec!["auth", "cart", "billing", "search"]);
    }

    #[test]
    fn sorts_by_recent_activity() {
        let listed = select_features(sample(), true, SortBy::Activity);
        assert_eq!(names(&listed), vec!["search", "cart", "billing", "auth"]);
    }
}
