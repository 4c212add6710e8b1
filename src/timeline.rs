use chrono::{Datelike, NaiveDate};
use itertools::Itertools;
use std::fmt;

pub const WEEKDAY_LABELS: [&str; 7] = ["Sun", "Mon", "Tue", "Wed", "Thu", "Fri", "Sat"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct MonthKey {
    pub year: i32,
    pub month: u32,
}

impl MonthKey {
    pub fn of<T: Datelike>(date: &T) -> Self {
        MonthKey {
            year: date.year(),
            month: date.month(),
        }
    }
}

impl fmt::Display for MonthKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.year, self.month)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Day {
    pub date: NaiveDate,
    pub weekday_label: &'static str,
    pub month_key: MonthKey,
    pub is_today: bool,
    pub day_of_month: u32,
}

impl Day {
    fn new(date: NaiveDate, is_today: bool) -> Self {
        Day {
            date,
            weekday_label: WEEKDAY_LABELS[date.weekday().num_days_from_sunday() as usize],
            month_key: MonthKey::of(&date),
            is_today,
            day_of_month: date.day(),
        }
    }

    pub fn iso_date(&self) -> String {
        self.date.format("%Y-%m-%d").to_string()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimelineMonth {
    pub key: MonthKey,
    pub label: String,
    pub year: i32,
    pub day_count: usize,
    pub start_index: usize,
    pub week_start_index: usize,
    pub ordinal: usize,
}

impl TimelineMonth {
    pub fn end_index(&self) -> usize {
        self.start_index + self.day_count
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Week {
    pub start_index: usize,
    pub day_count: usize,
    pub label: String,
}

impl Week {
    pub fn end_index(&self) -> usize {
        self.start_index + self.day_count
    }
}

/// Every day from an epoch up to an as-of date, grouped into months and
/// Monday-aligned weeks.
///
/// The as-of date is treated as today. A timeline is never updated in
/// place; a new day requires a new build.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Timeline {
    days: Vec<Day>,
    months: Vec<TimelineMonth>,
    weeks: Vec<Week>,
    today_index: usize,
}

impl Timeline {
    pub fn build(epoch: NaiveDate, as_of: NaiveDate) -> Self {
        let days: Vec<Day> = epoch
            .iter_days()
            .take_while(|date| *date <= as_of)
            .map(|date| Day::new(date, date == as_of))
            .collect();

        let today_index = days.iter().position(|d| d.is_today).unwrap_or(0);

        let mut months = Vec::new();
        let mut start_index = 0;
        for (ordinal, (key, run)) in (&days.iter().group_by(|d| d.month_key))
            .into_iter()
            .enumerate()
        {
            let day_count = run.count();
            months.push(TimelineMonth {
                key,
                label: format!("{:02}", key.month),
                year: key.year,
                day_count,
                start_index,
                week_start_index: 0,
                ordinal,
            });
            start_index += day_count;
        }

        let mut weeks = Vec::new();
        let mut index = 0;
        while index < days.len() {
            let to_sunday = 6 - days[index].date.weekday().num_days_from_monday() as usize;
            let last = (index + to_sunday).min(days.len() - 1);
            weeks.push(Week {
                start_index: index,
                day_count: last - index + 1,
                label: format!(
                    "{:02}-{:02}",
                    days[index].day_of_month, days[last].day_of_month
                ),
            });
            index = last + 1;
        }

        for month in months.iter_mut() {
            month.week_start_index = weeks
                .iter()
                .position(|w| days[w.start_index].month_key == month.key)
                .unwrap_or(0);
        }

        log::debug!(
            "built timeline {}..={}: {} days, {} weeks, {} months",
            epoch,
            as_of,
            days.len(),
            weeks.len(),
            months.len()
        );

        Timeline {
            days,
            months,
            weeks,
            today_index,
        }
    }

    pub fn days(&self) -> &[Day] {
        &self.days
    }

    pub fn months(&self) -> &[TimelineMonth] {
        &self.months
    }

    pub fn weeks(&self) -> &[Week] {
        &self.weeks
    }

    pub fn today_index(&self) -> usize {
        self.today_index
    }

    pub fn is_empty(&self) -> bool {
        self.days.is_empty()
    }

    pub fn month_days(&self, month: &TimelineMonth) -> &[Day] {
        &self.days[month.start_index..month.end_index()]
    }

    pub fn week_days(&self, week: &Week) -> &[Day] {
        &self.days[week.start_index..week.end_index()]
    }

    pub fn month_of_day(&self, day_index: usize) -> Option<&TimelineMonth> {
        if day_index >= self.days.len() {
            return None;
        }
        let pos = self
            .months
            .partition_point(|m| m.start_index <= day_index);
        pos.checked_sub(1).map(|i| &self.months[i])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn sample() -> Timeline {
        Timeline::build(date(2023, 8, 1), date(2024, 3, 13))
    }

    #[test]
    fn single_day_range() {
        let tl = Timeline::build(date(2023, 8, 1), date(2023, 8, 1));

        assert_eq!(tl.days().len(), 1);
        assert_eq!(tl.months().len(), 1);
        assert_eq!(tl.weeks().len(), 1);
        assert_eq!(tl.today_index(), 0);
        assert!(tl.days()[0].is_today);
        assert_eq!(tl.days()[0].iso_date(), "2023-08-01");
        assert_eq!(tl.days()[0].weekday_label, "Tue");
        assert_eq!(tl.weeks()[0].label, "01-01");
    }

    #[test]
    fn day_count_is_inclusive() {
        let tl = sample();
        let expected = date(2024, 3, 13)
            .signed_duration_since(date(2023, 8, 1))
            .num_days()
            + 1;

        assert_eq!(tl.days().len() as i64, expected);
        assert_eq!(tl.days().last().unwrap().date, date(2024, 3, 13));
        assert_eq!(tl.today_index(), tl.days().len() - 1);
        assert_eq!(tl.days().iter().filter(|d| d.is_today).count(), 1);
    }

    #[test]
    fn days_are_contiguous() {
        let tl = sample();
        for pair in tl.days().windows(2) {
            assert_eq!(pair[0].date.succ_opt().unwrap(), pair[1].date);
        }
    }

    #[test]
    fn months_partition_days() {
        let tl = sample();
        let rebuilt: Vec<&Day> = tl
            .months()
            .iter()
            .flat_map(|m| tl.month_days(m).iter())
            .collect();

        assert_eq!(rebuilt.len(), tl.days().len());
        assert!(rebuilt.iter().zip(tl.days()).all(|(a, b)| *a == b));

        for m in tl.months() {
            assert!(tl.month_days(m).iter().all(|d| d.month_key == m.key));
        }

        let labels: Vec<&str> = tl.months().iter().map(|m| m.label.as_str()).collect();
        assert_eq!(
            labels,
            vec!["08", "09", "10", "11", "12", "01", "02", "03"]
        );
        assert_eq!(tl.months()[5].year, 2024);
        assert_eq!(tl.months()[7].day_count, 13);
        assert_eq!(tl.months()[3].ordinal, 3);
    }

    #[test]
    fn weeks_partition_days() {
        let tl = sample();
        let weeks = tl.weeks();

        let mut next = 0;
        for week in weeks {
            assert_eq!(week.start_index, next);
            assert!(week.day_count >= 1 && week.day_count <= 7);
            next = week.end_index();
        }
        assert_eq!(next, tl.days().len());

        for week in &weeks[1..weeks.len() - 1] {
            assert_eq!(week.day_count, 7);
            assert_eq!(tl.week_days(week)[0].weekday_label, "Mon");
        }

        // 2023-08-01 is a Tuesday, so the first run ends on Sunday the 6th.
        assert_eq!(weeks[0].day_count, 6);
        assert_eq!(weeks[0].label, "01-06");
        assert_eq!(weeks[1].label, "07-13");
        // 2024-03-13 is a Wednesday.
        assert_eq!(weeks.last().unwrap().day_count, 3);
    }

    #[test]
    fn monday_epoch_to_sunday_has_full_weeks() {
        let tl = Timeline::build(date(2023, 7, 31), date(2023, 8, 20));
        let sizes: Vec<usize> = tl.weeks().iter().map(|w| w.day_count).collect();

        assert_eq!(sizes, vec![7, 7, 7]);
        assert_eq!(tl.weeks()[0].label, "31-06");
        assert_eq!(tl.days().last().unwrap().weekday_label, "Sun");
    }

    #[test]
    fn sunday_epoch_to_monday_has_single_day_ends() {
        let tl = Timeline::build(date(2023, 8, 6), date(2023, 8, 28));
        let sizes: Vec<usize> = tl.weeks().iter().map(|w| w.day_count).collect();

        assert_eq!(sizes, vec![1, 7, 7, 7, 1]);
        assert_eq!(tl.weeks()[0].label, "06-06");
        assert_eq!(tl.weeks()[4].label, "28-28");
    }

    #[test]
    fn month_week_start_index() {
        let tl = sample();
        for m in tl.months() {
            let week = &tl.weeks()[m.week_start_index];
            assert_eq!(tl.days()[week.start_index].month_key, m.key);
        }
    }

    #[test]
    fn month_of_day_bisects() {
        let tl = sample();
        for (idx, day) in tl.days().iter().enumerate() {
            assert_eq!(tl.month_of_day(idx).unwrap().key, day.month_key);
        }
        assert!(tl.month_of_day(tl.days().len()).is_none());
    }

    #[test]
    fn as_of_before_epoch_is_empty() {
        let tl = Timeline::build(date(2023, 8, 1), date(2023, 7, 31));

        assert!(tl.is_empty());
        assert!(tl.months().is_empty());
        assert!(tl.weeks().is_empty());
    }
}
