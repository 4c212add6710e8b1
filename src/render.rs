use std::fmt::{self, Write};

use crate::app::App;
use crate::calendar::{display_date_with_weekday, CalendarMonth, Carousel, WEEKDAY_HEADER};
use crate::scroll::{markers, Granularity, TimelineView, TrackMetrics};
use crate::sheet::{Phase, SheetKey};
use crate::shell::{HeaderButton, Route, DRAWER_ITEMS};
use crate::timeline::Timeline;

const CELL_WIDTH: usize = 4;

pub struct DayCell {
    day_num: u32,
    selected: bool,
    is_today: bool,
    planned: bool,
    focus_symbol: char,
    today_symbol: char,
    plan_symbol: char,
}

impl DayCell {
    pub fn new(day_num: u32) -> Self {
        DayCell {
            day_num,
            selected: false,
            is_today: false,
            planned: false,
            focus_symbol: '>',
            today_symbol: '*',
            plan_symbol: '+',
        }
    }

    pub fn selected(mut self, selected: bool) -> Self {
        self.selected = selected;
        self
    }

    pub fn today(mut self, is_today: bool) -> Self {
        self.is_today = is_today;
        self
    }

    pub fn planned(mut self, planned: bool) -> Self {
        self.planned = planned;
        self
    }
}

impl fmt::Display for DayCell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mark = if self.planned {
            self.plan_symbol
        } else if self.is_today {
            self.today_symbol
        } else {
            ' '
        };
        let focus = if self.selected { self.focus_symbol } else { ' ' };
        write!(f, "{}{}{:>2}", mark, focus, self.day_num)
    }
}

pub struct MonthGrid<'a> {
    month: &'a CalendarMonth,
    carousel: &'a Carousel,
}

impl<'a> MonthGrid<'a> {
    pub fn new(month: &'a CalendarMonth, carousel: &'a Carousel) -> Self {
        MonthGrid { month, carousel }
    }

    fn cell(&self, day: Option<u32>) -> String {
        match day.and_then(|d| self.month.date(d)) {
            Some(date) => DayCell::new(day.unwrap_or_default())
                .today(date == self.carousel.today())
                .selected(self.carousel.selected() == Some(date))
                .planned(self.carousel.is_planned(&date))
                .to_string(),
            None => " ".repeat(CELL_WIDTH),
        }
    }
}

impl fmt::Display for MonthGrid<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let width = CELL_WIDTH * WEEKDAY_HEADER.len();
        writeln!(f, "{:^width$}", self.month.label(), width = width)?;

        for name in WEEKDAY_HEADER.iter() {
            write!(f, "{:>width$}", name, width = CELL_WIDTH)?;
        }
        writeln!(f)?;

        let cells = self.month.cells();
        for row in cells.chunks(WEEKDAY_HEADER.len()) {
            if row.iter().all(Option::is_none) {
                continue;
            }
            let line: String = row.iter().map(|day| self.cell(*day)).collect();
            writeln!(f, "{}", line.trim_end())?;
        }
        Ok(())
    }
}

pub struct TimelineStrip<'a> {
    timeline: &'a Timeline,
    view: &'a TimelineView,
    metrics: &'a TrackMetrics,
}

impl<'a> TimelineStrip<'a> {
    pub fn new(timeline: &'a Timeline, view: &'a TimelineView, metrics: &'a TrackMetrics) -> Self {
        TimelineStrip {
            timeline,
            view,
            metrics,
        }
    }

    fn items(&self) -> Vec<(String, bool)> {
        let today = self.timeline.today_index();
        match self.view.granularity() {
            Granularity::Day => self
                .timeline
                .days()
                .iter()
                .map(|d| (format!("{:02}", d.day_of_month), d.is_today))
                .collect(),
            Granularity::Week => self
                .timeline
                .weeks()
                .iter()
                .map(|w| (w.label.clone(), (w.start_index..w.end_index()).contains(&today)))
                .collect(),
            Granularity::Month => self
                .timeline
                .months()
                .iter()
                .map(|m| (m.label.clone(), (m.start_index..m.end_index()).contains(&today)))
                .collect(),
        }
    }
}

impl fmt::Display for TimelineStrip<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "[{}] {}",
            self.view.sticky_label(),
            self.view.granularity()
        )?;

        let width = self.metrics.item_width(self.view.granularity());
        let count = (i64::from(self.view.container_width()) / width + 1) as usize;
        let line = self
            .items()
            .into_iter()
            .skip(self.view.first_visible(self.metrics))
            .take(count)
            .map(|(text, today)| if today { format!("*{}", text) } else { text })
            .collect::<Vec<_>>()
            .join(" ");
        writeln!(f, "{}", line)?;

        let start = self.view.offset();
        let end = start + i64::from(self.view.container_width());
        let marks = markers(self.view.granularity(), self.metrics, self.timeline)
            .into_iter()
            .filter(|m| (start..end).contains(&m.left))
            .map(|m| format!("^{}", m.text))
            .collect::<Vec<_>>()
            .join(" ");
        writeln!(f, "{}", marks)
    }
}

pub struct HomeCard {
    pub title: &'static str,
    pub description: &'static str,
    pub highlight: Option<&'static str>,
}

pub const HOME_CARDS: &[HomeCard] = &[
    HomeCard {
        title: "同伴利用",
        description: "同伴利用対応のプランです",
        highlight: None,
    },
    HomeCard {
        title: "ベアレージポイント",
        description: "貯まったポイントを確認",
        highlight: Some("2,875 BP"),
    },
    HomeCard {
        title: "お知らせ",
        description: "本日抽選申込日！FIT365 あんしんサポートに関するご案内",
        highlight: None,
    },
    HomeCard {
        title: "店舗",
        description: "最近利用した店舗が表示されます（位置情報が利用可能な場合）",
        highlight: None,
    },
    HomeCard {
        title: "会員情報",
        description: "プレミアム / レディースルーム",
        highlight: None,
    },
    HomeCard {
        title: "トレーニング",
        description: "メニューや記録を確認",
        highlight: None,
    },
    HomeCard {
        title: "コンディション",
        description: "体調や睡眠、体重のログを確認",
        highlight: None,
    },
];

pub const CALENDAR_STATS: [(&str, u32); 2] = [("来館", 6), ("トレーニング", 4)];

fn home(app: &App, out: &mut String) -> fmt::Result {
    writeln!(out, "[cal] {}", display_date_with_weekday(&app.today()))?;
    for card in HOME_CARDS {
        writeln!(out, "- {}: {}", card.title, card.description)?;
        if let Some(highlight) = card.highlight {
            writeln!(out, "  {}", highlight)?;
        }
    }
    Ok(())
}

fn page(app: &App, out: &mut String) -> fmt::Result {
    match app.shell().route() {
        Route::Home => home(app, out),
        Route::Training => write!(
            out,
            "{}",
            TimelineStrip::new(app.timeline(), app.timeline_view(), &app.config().track)
        ),
        Route::Condition | Route::Stores => writeln!(out, "計画中"),
    }
}

fn sheet(app: &App, key: SheetKey, out: &mut String) -> fmt::Result {
    let panel = app.panel();
    let content = key.content();
    let phase = match panel.phase() {
        Phase::Closed => "closed",
        Phase::Opening => "opening",
        Phase::Open => "open",
        Phase::Closing => "closing",
    };

    writeln!(
        out,
        "== {} ({}, from {:?}{}) ==",
        content.title,
        phase,
        key.slide_from(),
        if panel.shows_close() { ", [x]" } else { "" }
    )?;
    writeln!(out, "{}", content.message)?;

    if key == SheetKey::Qr {
        let camera = app.camera();
        if let Some(error) = camera.error() {
            writeln!(out, "camera: {}", error)?;
        } else if camera.has_stream() {
            writeln!(out, "camera: streaming")?;
        } else if camera.is_pending() {
            writeln!(out, "camera: starting")?;
        }
    }
    Ok(())
}

fn write_screen(app: &App, out: &mut String) -> fmt::Result {
    let shell = app.shell();
    let button = match shell.header_button() {
        HeaderButton::Menu => "[=]",
        HeaderButton::Back => "[<]",
    };
    writeln!(out, "{} {}", button, shell.route().label())?;

    if shell.drawer_open() {
        for item in DRAWER_ITEMS.iter() {
            writeln!(out, "  | {}", item.label)?;
        }
    }

    page(app, out)?;

    if shell.record_choice_open() {
        writeln!(out, "? トレーニング / コンディション / キャンセル")?;
    }

    if shell.calendar_open() {
        let carousel = app.carousel();
        let stats: Vec<String> = CALENDAR_STATS
            .iter()
            .map(|(label, value)| format!("{} {}回", label, value))
            .collect();
        writeln!(out, "{}", stats.join("  "))?;
        if let Some(month) = carousel.active_month() {
            write!(out, "{}", MonthGrid::new(month, carousel))?;
        }
        writeln!(out, "+ 来館予定日")?;
        if let Some(selected) = carousel.selected_display() {
            writeln!(out, "selected: {}", selected)?;
        }
    }

    let overlay = shell.overlay();
    if overlay.active {
        writeln!(
            out,
            "overlay: {}{}",
            if overlay.visible { "shown" } else { "fading" },
            if overlay.dimmed { ", dimmed" } else { "" }
        )?;
    }

    if let Some(active) = shell.active_sheet() {
        sheet(app, active.key, out)?;
    }
    Ok(())
}

pub fn screen(app: &App) -> String {
    let mut out = String::new();
    if let Err(e) = write_screen(app, &mut out) {
        log::error!("rendering failed: {}", e);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calendar::{build_month_list, AutoAnswer, CarouselDelays};
    use crate::config::Config;
    use crate::shell::Action;
    use chrono::NaiveDate;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn day_cell_width() {
        assert_eq!(DayCell::new(5).to_string(), "   5");
        assert_eq!(DayCell::new(25).today(true).to_string(), "* 25");
        assert_eq!(DayCell::new(25).today(true).selected(true).to_string(), "*>25");
        assert_eq!(DayCell::new(1).planned(true).today(true).to_string(), "+  1");
    }

    #[test]
    fn month_grid_layout() {
        let today = date(2025, 11, 25);
        let months = build_month_list(date(2025, 11, 1), today, 0);
        let carousel = Carousel::new(months, today, 358, CarouselDelays::default());
        let grid = MonthGrid::new(&carousel.months()[0], &carousel).to_string();
        let lines: Vec<&str> = grid.lines().collect();

        assert_eq!(lines[0].trim(), "2025/11");
        assert_eq!(lines[1], " SUN MON TUE WED THU FRI SAT");
        // November 2025 starts on a Saturday.
        assert_eq!(lines[2], format!("{}   1", " ".repeat(24)));
        assert!(lines[6].contains("* 25"));
        assert_eq!(lines.len(), 2 + 6);
    }

    #[test]
    fn selected_and_planned_cells() {
        let today = date(2025, 11, 25);
        let months = build_month_list(date(2025, 11, 1), today, 1);
        let mut carousel = Carousel::new(months, today, 358, CarouselDelays::default());
        carousel.click_date(date(2025, 12, 3), &mut AutoAnswer(true));

        let grid = MonthGrid::new(&carousel.months()[1], &carousel).to_string();
        assert!(grid.contains("+> 3"));
    }

    #[test]
    fn home_screen() {
        let app = App::new(&Config::default(), date(2025, 11, 25));
        let out = screen(&app);
        assert!(out.starts_with("[=] ホーム"));
        assert!(out.contains("[cal] 2025/11/25 TUE"));
        assert!(out.contains("2,875 BP"));
    }

    #[test]
    fn training_strip_shows_today() {
        let mut app = App::new(&Config::default(), date(2025, 11, 25));
        app.reduce(Action::Navigate(Route::Training));
        let out = screen(&app);
        assert!(out.contains("[11] day"));
        assert!(out.contains("*25"));
    }

    #[test]
    fn strip_marks_visible_month_starts() {
        let tl = Timeline::build(date(2023, 8, 1), date(2024, 3, 13));
        let m = TrackMetrics::default();
        let mut view = TimelineView::new(&tl, 390);

        view.scroll_to(0, &m, &tl);
        let out = TimelineStrip::new(&tl, &view, &m).to_string();
        assert_eq!(out.lines().nth(2), Some("^08"));

        view.scroll_to(31 * 68, &m, &tl);
        let out = TimelineStrip::new(&tl, &view, &m).to_string();
        assert_eq!(out.lines().nth(2), Some("^09"));

        view.scroll_to(40 * 68, &m, &tl);
        let out = TimelineStrip::new(&tl, &view, &m).to_string();
        assert_eq!(out.lines().nth(2), Some(""));

        view.set_granularity(Granularity::Month, &m, &tl);
        view.scroll_to(0, &m, &tl);
        let out = TimelineStrip::new(&tl, &view, &m).to_string();
        assert_eq!(out.lines().nth(2), Some(""));
    }

    #[test]
    fn fixed_sheet_shows_back_button() {
        let mut app = App::new(&Config::default(), date(2025, 11, 25));
        app.reduce(Action::DrawerItem(SheetKey::Help));
        let out = screen(&app);
        assert!(out.starts_with("[<]"));
        assert!(out.contains(SheetKey::Help.content().title));
        assert!(!out.contains("[x]"));
    }

    #[test]
    fn calendar_sheet_section() {
        let mut app = App::new(&Config::default(), date(2025, 11, 25));
        app.reduce(Action::OpenCalendar);
        let out = screen(&app);
        assert!(out.contains("来館 6回  トレーニング 4回"));
        assert!(out.contains("2025/11"));
        assert!(!out.contains("selected:"));
    }
}
