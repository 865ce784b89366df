//! Descriptive aggregates over a task snapshot.
//!
//! Every function here is a pure computation over the tasks it is given and
//! an explicit reference instant. Nothing reads the store, nothing fails:
//! degenerate inputs produce the documented fallback values.

use crate::model::{Task, TaskStatus};
use time::{Date, Duration, OffsetDateTime, Weekday};

/// Aggregation window anchored at the reference instant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Period {
    Day,
    Week,
    Month,
    Year,
}

impl Period {
    /// Maps a user-supplied period name. Unknown names yield `None`, which
    /// [`completion_stats`] treats as the trailing seven-day window.
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "day" => Some(Self::Day),
            "week" => Some(Self::Week),
            "month" => Some(Self::Month),
            "year" => Some(Self::Year),
            _ => None,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::Day => "day",
            Self::Week => "week",
            Self::Month => "month",
            Self::Year => "year",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CompletionStats {
    pub period: Option<Period>,
    pub total_tasks: usize,
    pub completed_tasks: usize,
    pub not_started_tasks: usize,
    pub in_progress_tasks: usize,
    pub completion_rate: f64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrendSeries {
    pub labels: Vec<String>,
    pub data: Vec<usize>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MostProductiveDay {
    pub day: Weekday,
    pub completion_rate: f64,
    pub total_tasks: usize,
    pub completed_tasks: usize,
}

const SCORE_WINDOW_DAYS: i64 = 30;
const MIN_TASKS_PER_WEEKDAY: usize = 3;

const WEEK_SUNDAY_FIRST: [Weekday; 7] = [
    Weekday::Sunday,
    Weekday::Monday,
    Weekday::Tuesday,
    Weekday::Wednesday,
    Weekday::Thursday,
    Weekday::Friday,
    Weekday::Saturday,
];

const MONTH_ABBREVS: [&str; 12] = [
    "Jan", "Feb", "Mar", "Apr", "May", "Jun", "Jul", "Aug", "Sep", "Oct", "Nov", "Dec",
];

/// Status counts and completion rate for tasks dated within the period
/// window ending at `now`. `None` selects the trailing seven-day window
/// used for unrecognized period names.
pub fn completion_stats(
    tasks: &[Task],
    period: Option<Period>,
    now: OffsetDateTime,
) -> CompletionStats {
    let today = now.date();
    let start = window_start(period, today);

    let mut total_tasks = 0;
    let mut completed_tasks = 0;
    let mut not_started_tasks = 0;
    let mut in_progress_tasks = 0;

    for task in tasks {
        if task.date < start || task.date > today {
            continue;
        }
        total_tasks += 1;
        match task.status {
            TaskStatus::Completed => completed_tasks += 1,
            TaskStatus::NotStarted => not_started_tasks += 1,
            TaskStatus::InProgress => in_progress_tasks += 1,
        }
    }

    let completion_rate = if total_tasks > 0 {
        round_to_tenth(completed_tasks as f64 / total_tasks as f64 * 100.0)
    } else {
        0.0
    };

    CompletionStats {
        period,
        total_tasks,
        completed_tasks,
        not_started_tasks,
        in_progress_tasks,
        completion_rate,
    }
}

fn window_start(period: Option<Period>, today: Date) -> Date {
    match period {
        Some(Period::Day) => today,
        Some(Period::Week) => {
            today - Duration::days(today.weekday().number_days_from_sunday() as i64)
        }
        Some(Period::Month) => today.replace_day(1).unwrap_or(today),
        Some(Period::Year) => Date::from_ordinal_date(today.year(), 1).unwrap_or(today),
        None => today - Duration::days(7),
    }
}

/// Completed-task counts over time, oldest bucket first. Week yields one
/// point per day, Month four seven-day buckets, Year one point per calendar
/// month. Day has no trend resolution and yields an empty series.
pub fn completion_trend(tasks: &[Task], period: Period, now: OffsetDateTime) -> TrendSeries {
    let today = now.date();
    let mut labels = Vec::new();
    let mut data = Vec::new();

    match period {
        Period::Day => {}
        Period::Week => {
            for offset in (0..7).rev() {
                let day = today - Duration::days(offset);
                labels.push(short_date(day));
                data.push(completed_on(tasks, day));
            }
        }
        Period::Month => {
            let start = today - Duration::days(27);
            for bucket in 0..4 {
                let bucket_start = start + Duration::days(bucket * 7);
                let bucket_end = bucket_start + Duration::days(6);
                labels.push(format!(
                    "{} - {}",
                    short_date(bucket_start),
                    short_date(bucket_end)
                ));
                data.push(completed_between(tasks, bucket_start, bucket_end));
            }
        }
        Period::Year => {
            // Zero-based month arithmetic so the series can cross a year
            // boundary without calendar lookups.
            let current = i32::from(u8::from(today.month())) - 1;
            for back in (0..12).rev() {
                let month0 = (current - back).rem_euclid(12);
                let year = today.year() - if current < back { 1 } else { 0 };
                labels.push(format!("{} {}", MONTH_ABBREVS[month0 as usize], year));
                data.push(completed_in_month(tasks, year, month0 + 1));
            }
        }
    }

    TrendSeries { labels, data }
}

fn completed_on(tasks: &[Task], day: Date) -> usize {
    tasks
        .iter()
        .filter(|task| task.status == TaskStatus::Completed && task.date == day)
        .count()
}

fn completed_between(tasks: &[Task], start: Date, end: Date) -> usize {
    tasks
        .iter()
        .filter(|task| {
            task.status == TaskStatus::Completed && task.date >= start && task.date <= end
        })
        .count()
}

fn completed_in_month(tasks: &[Task], year: i32, month: i32) -> usize {
    tasks
        .iter()
        .filter(|task| {
            task.status == TaskStatus::Completed
                && task.date.year() == year
                && i32::from(u8::from(task.date.month())) == month
        })
        .count()
}

/// Recency-weighted completion percentage over the trailing thirty days,
/// in `[0, 100]`. Returns 0 when no task falls in the window.
pub fn productivity_score(tasks: &[Task], now: OffsetDateTime) -> u8 {
    let today = now.date();
    let start = today - Duration::days(SCORE_WINDOW_DAYS);

    let mut weight_total = 0i64;
    let mut weight_completed = 0i64;

    for task in tasks {
        if task.date < start || task.date > today {
            continue;
        }
        // Linear decay: 31 for a task dated today, 1 at the window edge.
        let midnight = task.date.midnight().assume_offset(now.offset());
        let days_ago = (now - midnight).whole_days();
        let weight = SCORE_WINDOW_DAYS + 1 - days_ago;

        weight_total += weight;
        if task.status == TaskStatus::Completed {
            weight_completed += weight;
        }
    }

    if weight_total == 0 {
        return 0;
    }

    (weight_completed as f64 / weight_total as f64 * 100.0).round() as u8
}

/// Weekday with the highest completion rate among weekdays holding at least
/// three tasks, over the full snapshot. Ties keep the earlier weekday in
/// Sunday-to-Saturday order; with no qualifying weekday the result
/// degenerates to Sunday with rate 0 and Sunday's actual totals.
pub fn most_productive_day(tasks: &[Task]) -> MostProductiveDay {
    let mut totals = [0usize; 7];
    let mut completed = [0usize; 7];

    for task in tasks {
        let index = task.date.weekday().number_days_from_sunday() as usize;
        totals[index] += 1;
        if task.status == TaskStatus::Completed {
            completed[index] += 1;
        }
    }

    let mut best_index = 0;
    let mut best_rate = 0.0f64;
    for index in 0..7 {
        if totals[index] < MIN_TASKS_PER_WEEKDAY {
            continue;
        }
        let rate = completed[index] as f64 / totals[index] as f64;
        if rate > best_rate {
            best_rate = rate;
            best_index = index;
        }
    }

    MostProductiveDay {
        day: WEEK_SUNDAY_FIRST[best_index],
        completion_rate: round_to_tenth(best_rate * 100.0),
        total_tasks: totals[best_index],
        completed_tasks: completed[best_index],
    }
}

fn short_date(date: Date) -> String {
    format!("{}/{}", u8::from(date.month()), date.day())
}

fn round_to_tenth(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}
