use chrono::{Datelike, Month, Months, NaiveDate};
use num_traits::FromPrimitive;
use std::collections::BTreeSet;
use std::time::Duration;

use crate::events::{Scheduler, Timer, TimerHandle};

pub const WEEKDAY_HEADER: [&str; 7] = ["SUN", "MON", "TUE", "WED", "THU", "FRI", "SAT"];
pub const GRID_CELLS: usize = 42;

pub fn days_of_month(month: &Month, year: i32) -> u32 {
    let first = NaiveDate::from_ymd_opt(year, month.number_from_month(), 1);
    let next = first.and_then(|d| d.checked_add_months(Months::new(1)));

    match (first, next) {
        (Some(first), Some(next)) => next.signed_duration_since(first).num_days() as u32,
        _ => 0,
    }
}

pub fn display_date(date: &NaiveDate) -> String {
    date.format("%Y/%m/%d").to_string()
}

pub fn display_date_with_weekday(date: &NaiveDate) -> String {
    format!(
        "{} {}",
        display_date(date),
        WEEKDAY_HEADER[date.weekday().num_days_from_sunday() as usize]
    )
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CalendarMonth {
    pub year: i32,
    pub month: Month,
    pub days: u32,
    pub first_weekday: u32,
}

impl CalendarMonth {
    pub fn new(month: Month, year: i32) -> Self {
        let first_weekday = NaiveDate::from_ymd_opt(year, month.number_from_month(), 1)
            .map(|d| d.weekday().num_days_from_sunday())
            .unwrap_or(0);

        CalendarMonth {
            year,
            month,
            days: days_of_month(&month, year),
            first_weekday,
        }
    }

    pub fn containing<T: Datelike>(date: &T) -> Option<Self> {
        Month::from_u32(date.month()).map(|m| CalendarMonth::new(m, date.year()))
    }

    pub fn key(&self) -> String {
        format!("{}-{:02}", self.year, self.month.number_from_month())
    }

    pub fn label(&self) -> String {
        format!("{}/{:02}", self.year, self.month.number_from_month())
    }

    pub fn date(&self, day: u32) -> Option<NaiveDate> {
        if day == 0 || day > self.days {
            return None;
        }
        NaiveDate::from_ymd_opt(self.year, self.month.number_from_month(), day)
    }

    pub fn cells(&self) -> [Option<u32>; GRID_CELLS] {
        let mut cells = [None; GRID_CELLS];
        for day in 1..=self.days {
            cells[(self.first_weekday + day - 1) as usize] = Some(day);
        }
        cells
    }
}

pub fn build_month_list(start: NaiveDate, as_of: NaiveDate, lookahead: u32) -> Vec<CalendarMonth> {
    let first = start.with_day(1).unwrap_or(start);
    let last = as_of
        .with_day(1)
        .and_then(|d| d.checked_add_months(Months::new(lookahead)))
        .unwrap_or(as_of);

    let mut months = Vec::new();
    let mut cursor = Some(first);
    while let Some(date) = cursor.filter(|d| *d <= last) {
        months.extend(CalendarMonth::containing(&date));
        cursor = date.checked_add_months(Months::new(1));
    }
    months
}

pub trait Prompt {
    fn confirm(&mut self, message: &str) -> bool;
}

impl<F: FnMut(&str) -> bool> Prompt for F {
    fn confirm(&mut self, message: &str) -> bool {
        self(message)
    }
}

#[derive(Debug, Clone, Copy)]
pub struct AutoAnswer(pub bool);

impl Prompt for AutoAnswer {
    fn confirm(&mut self, message: &str) -> bool {
        log::info!("{} -> {}", message.replace('\n', " "), self.0);
        self.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CarouselState {
    Idle,
    ProgrammaticScroll,
    Settling,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DayClick {
    Ignored,
    Selected,
    Declined,
    Planned,
    Unplanned,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CarouselDelays {
    pub initial_settle: Duration,
    pub nav_settle: Duration,
    pub debounce: Duration,
}

impl Default for CarouselDelays {
    fn default() -> Self {
        CarouselDelays {
            initial_settle: Duration::from_millis(120),
            nav_settle: Duration::from_millis(350),
            debounce: Duration::from_millis(100),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Carousel {
    months: Vec<CalendarMonth>,
    today: NaiveDate,
    initial_index: usize,
    active_index: usize,
    page_width: u32,
    scroll_left: i64,
    state: CarouselState,
    settle_timer: Option<TimerHandle>,
    debounce_timer: Option<TimerHandle>,
    delays: CarouselDelays,
    selected: Option<NaiveDate>,
    planned: BTreeSet<NaiveDate>,
}

impl Carousel {
    pub fn new(months: Vec<CalendarMonth>, today: NaiveDate, page_width: u32, delays: CarouselDelays) -> Self {
        let initial_index = months
            .iter()
            .position(|m| m.year == today.year() && m.month.number_from_month() == today.month())
            .unwrap_or_else(|| months.len().saturating_sub(1));

        Carousel {
            months,
            today,
            initial_index,
            active_index: initial_index,
            page_width: page_width.max(1),
            scroll_left: 0,
            state: CarouselState::Idle,
            settle_timer: None,
            debounce_timer: None,
            delays,
            selected: None,
            planned: BTreeSet::new(),
        }
    }

    pub fn months(&self) -> &[CalendarMonth] {
        &self.months
    }

    pub fn state(&self) -> CarouselState {
        self.state
    }

    pub fn active_index(&self) -> usize {
        self.active_index
    }

    pub fn initial_index(&self) -> usize {
        self.initial_index
    }

    pub fn active_month(&self) -> Option<&CalendarMonth> {
        self.months.get(self.active_index).or_else(|| self.months.last())
    }

    pub fn scroll_left(&self) -> i64 {
        self.scroll_left
    }

    pub fn selected(&self) -> Option<NaiveDate> {
        self.selected
    }

    pub fn planned(&self) -> &BTreeSet<NaiveDate> {
        &self.planned
    }

    pub fn is_planned(&self, date: &NaiveDate) -> bool {
        self.planned.contains(date)
    }

    pub fn today(&self) -> NaiveDate {
        self.today
    }

    pub fn scroll_width(&self) -> i64 {
        i64::from(self.page_width) * self.months.len() as i64
    }

    fn column_width(&self) -> i64 {
        if self.months.is_empty() {
            1
        } else {
            (self.scroll_width() / self.months.len() as i64).max(1)
        }
    }

    fn clamp(&self, index: i64) -> usize {
        index.min(self.months.len() as i64 - 1).max(0) as usize
    }

    fn begin_programmatic<S: Scheduler + ?Sized>(&mut self, target: usize, settle: Duration, sched: &mut S) {
        if let Some(handle) = self.debounce_timer.take() {
            sched.cancel(handle);
        }
        if let Some(handle) = self.settle_timer.take() {
            sched.cancel(handle);
        }

        self.active_index = target;
        self.scroll_left = self.column_width() * target as i64;
        self.state = CarouselState::ProgrammaticScroll;
        self.settle_timer = Some(sched.schedule(settle, Timer::CarouselSettle));
    }

    pub fn open<S: Scheduler + ?Sized>(&mut self, sched: &mut S) {
        log::debug!("calendar opened on month {}", self.initial_index);
        let target = self.initial_index;
        self.begin_programmatic(target, self.delays.initial_settle, sched);
    }

    pub fn close<S: Scheduler + ?Sized>(&mut self, sched: &mut S) {
        for handle in self.settle_timer.take().into_iter().chain(self.debounce_timer.take()) {
            sched.cancel(handle);
        }
        self.state = CarouselState::Idle;
    }

    pub fn navigate<S: Scheduler + ?Sized>(&mut self, delta: i64, sched: &mut S) {
        if self.months.is_empty() {
            return;
        }
        let target = self.clamp(self.active_index as i64 + delta);
        self.begin_programmatic(target, self.delays.nav_settle, sched);
    }

    pub fn on_scroll<S: Scheduler + ?Sized>(&mut self, scroll_left: i64, sched: &mut S) {
        self.scroll_left = scroll_left;
        if self.state == CarouselState::ProgrammaticScroll {
            return;
        }

        if let Some(handle) = self.debounce_timer.take() {
            sched.cancel(handle);
        }
        self.state = CarouselState::Settling;
        self.debounce_timer = Some(sched.schedule(self.delays.debounce, Timer::CarouselDebounce));
    }

    pub fn on_timer(&mut self, handle: TimerHandle, timer: Timer) {
        match timer {
            Timer::CarouselSettle if self.settle_timer == Some(handle) => {
                self.settle_timer = None;
                if self.state == CarouselState::ProgrammaticScroll {
                    self.state = CarouselState::Idle;
                }
            }
            Timer::CarouselDebounce if self.debounce_timer == Some(handle) => {
                self.debounce_timer = None;
                self.state = CarouselState::Idle;
                if self.months.is_empty() {
                    return;
                }

                let raw = self.scroll_left as f64 / self.column_width() as f64;
                let index = self.clamp(raw.round() as i64);
                if index != self.active_index {
                    log::debug!("carousel settled on month {}", index);
                    self.active_index = index;
                }
            }
            _ => {}
        }
    }

    /// Click on a grid cell of `month_index`.
    ///
    /// Any date becomes the selected date. For today and later dates the
    /// planned-visit membership is toggled after confirmation.
    pub fn click_day<P: Prompt + ?Sized>(
        &mut self,
        month_index: usize,
        day: Option<u32>,
        prompt: &mut P,
    ) -> DayClick {
        let date = match day
            .zip(self.months.get(month_index))
            .and_then(|(day, month)| month.date(day))
        {
            Some(date) => date,
            None => return DayClick::Ignored,
        };

        self.selected = Some(date);

        if date < self.today {
            return DayClick::Selected;
        }

        let has_plan = self.planned.contains(&date);
        let message = format!(
            "{}\n来館予定を{}",
            display_date(&date),
            if has_plan { "削除しますか" } else { "登録しますか" }
        );
        if !prompt.confirm(&message) {
            return DayClick::Declined;
        }

        if has_plan {
            self.planned.remove(&date);
            DayClick::Unplanned
        } else {
            self.planned.insert(date);
            DayClick::Planned
        }
    }

    pub fn click_date<P: Prompt + ?Sized>(&mut self, date: NaiveDate, prompt: &mut P) -> DayClick {
        match self
            .months
            .iter()
            .position(|m| m.year == date.year() && m.month.number_from_month() == date.month())
        {
            Some(index) => self.click_day(index, Some(date.day()), prompt),
            None => DayClick::Ignored,
        }
    }

    pub fn selected_display(&self) -> Option<String> {
        self.selected.as_ref().map(display_date_with_weekday)
    }
}
