use chrono::NaiveDate;
use std::time::Duration;

use crate::calendar::{build_month_list, AutoAnswer, Carousel, DayClick, Prompt};
use crate::camera::{CameraError, CameraView, MediaDevices, SimulatedDevices};
use crate::config::Config;
use crate::events::{Dispatcher, Event, Scheduler, Timer};
use crate::scroll::{Granularity, TimelineView};
use crate::sheet::{SheetKey, SheetNotice, SheetPanel, TransitionTarget};
use crate::shell::{Action, Effect, Route, ShellState};
use crate::timeline::Timeline;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Input {
    Shell(Action),
    SheetCloseButton,
    SheetBackdrop,
    SheetTransitionEnd(TransitionTarget),
    CalendarNav(i64),
    CalendarScroll(i64),
    CalendarDay { month: usize, day: Option<u32> },
    CalendarDate(NaiveDate),
    TimelineScroll(i64),
    TimelineGranularity(Granularity),
    TimelineTap,
}

pub struct App {
    config: Config,
    today: NaiveDate,
    dispatcher: Dispatcher,
    shell: ShellState,
    panel: SheetPanel,
    timeline: Timeline,
    timeline_view: TimelineView,
    carousel: Carousel,
    camera: CameraView,
    devices: Box<dyn MediaDevices>,
    prompt: Box<dyn Prompt>,
    last_click: Option<DayClick>,
}

impl App {
    pub fn new(config: &Config, today: NaiveDate) -> App {
        let dispatcher = Dispatcher::new();
        let devices = Box::new(SimulatedDevices::new(dispatcher.event_sink().clone(), Ok(())));

        let timeline = Timeline::build(config.epoch, today);
        let timeline_view = TimelineView::new(&timeline, config.viewport_width);
        let months = build_month_list(config.calendar_start, today, config.lookahead_months);
        let carousel = Carousel::new(
            months,
            today,
            config.calendar_page_width,
            config.delays.carousel(),
        );

        App {
            config: config.clone(),
            today,
            dispatcher,
            shell: ShellState::default(),
            panel: SheetPanel::new(config.delays.sheet_enter()),
            timeline,
            timeline_view,
            carousel,
            camera: CameraView::new(),
            devices,
            prompt: Box::new(AutoAnswer(true)),
            last_click: None,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn today(&self) -> NaiveDate {
        self.today
    }

    pub fn now(&self) -> Duration {
        self.dispatcher.now()
    }

    pub fn shell(&self) -> &ShellState {
        &self.shell
    }

    pub fn panel(&self) -> &SheetPanel {
        &self.panel
    }

    pub fn timeline(&self) -> &Timeline {
        &self.timeline
    }

    pub fn timeline_view(&self) -> &TimelineView {
        &self.timeline_view
    }

    pub fn carousel(&self) -> &Carousel {
        &self.carousel
    }

    pub fn camera(&self) -> &CameraView {
        &self.camera
    }

    pub fn last_click(&self) -> Option<DayClick> {
        self.last_click
    }

    pub fn set_prompt(&mut self, prompt: Box<dyn Prompt>) {
        self.prompt = prompt;
    }

    pub fn set_devices(&mut self, devices: Box<dyn MediaDevices>) {
        self.devices = devices;
    }

    pub fn simulate_camera(&mut self, outcome: Result<(), CameraError>) {
        let sink = self.dispatcher.event_sink().clone();
        self.set_devices(Box::new(SimulatedDevices::new(sink, outcome)));
    }

    pub fn dispatch(&mut self, input: Input) {
        self.dispatcher.post(Event::Input(input));
        self.drain();
    }

    pub fn reduce(&mut self, action: Action) {
        self.dispatch(Input::Shell(action));
    }

    pub fn advance(&mut self, by: Duration) {
        let until = self.dispatcher.now() + by;
        self.drain();
        while let Some(event) = self.dispatcher.pop_due(until) {
            self.handle(event);
            self.drain();
        }
        self.dispatcher.set_now(until);
    }

    fn drain(&mut self) {
        while let Some(event) = self.dispatcher.next() {
            self.handle(event);
        }
    }

    fn handle(&mut self, event: Event) {
        log::trace!("{:?}", event);

        match event {
            Event::Input(input) => self.handle_input(input),
            Event::Timer(handle, Timer::SheetEnter) => {
                let notices = self.panel.on_timer(handle);
                self.apply_notices(notices);
            }
            Event::Timer(handle, timer) => self.carousel.on_timer(handle, timer),
            Event::Camera(ticket, outcome) => {
                self.camera.resolve(ticket, outcome);
            }
        }
    }

    fn handle_input(&mut self, input: Input) {
        match input {
            Input::Shell(action) => self.apply_action(action),
            Input::SheetCloseButton => {
                let notices = self.panel.close_button(&mut self.dispatcher);
                self.apply_notices(notices);
            }
            Input::SheetBackdrop => {
                let notices = self.panel.close(&mut self.dispatcher);
                self.apply_notices(notices);
            }
            Input::SheetTransitionEnd(target) => {
                let notices = self.panel.transition_end(target);
                self.apply_notices(notices);
            }
            Input::CalendarNav(_)
            | Input::CalendarScroll(_)
            | Input::CalendarDay { .. }
            | Input::CalendarDate(_)
                if !self.shell.calendar_open() =>
            {
                log::debug!("calendar closed, ignoring {:?}", input);
            }
            Input::CalendarNav(delta) => self.carousel.navigate(delta, &mut self.dispatcher),
            Input::CalendarScroll(left) => self.carousel.on_scroll(left, &mut self.dispatcher),
            Input::CalendarDay { month, day } => {
                self.last_click = Some(self.carousel.click_day(month, day, self.prompt.as_mut()));
            }
            Input::CalendarDate(date) => {
                self.last_click = Some(self.carousel.click_date(date, self.prompt.as_mut()));
            }
            Input::TimelineScroll(_) | Input::TimelineGranularity(_) | Input::TimelineTap
                if self.shell.route() != Route::Training =>
            {
                log::debug!("timeline not shown, ignoring {:?}", input);
            }
            Input::TimelineScroll(offset) => {
                self.timeline_view
                    .scroll_to(offset, &self.config.track, &self.timeline)
            }
            Input::TimelineGranularity(granularity) => self.timeline_view.set_granularity(
                granularity,
                &self.config.track,
                &self.timeline,
            ),
            Input::TimelineTap => self.apply_action(Action::OpenSheet {
                key: SheetKey::RecordTraining,
                closable: true,
            }),
        }
    }

    fn apply_action(&mut self, action: Action) {
        let before = self.shell.route();
        let effects = self.shell.reduce(action);

        let route = self.shell.route();
        if route != before && route == Route::Training {
            self.timeline_view = TimelineView::new(&self.timeline, self.config.viewport_width);
            self.timeline_view.mount(&self.config.track, &self.timeline);
        }

        for effect in effects {
            self.apply_effect(effect);
        }
    }

    fn apply_effect(&mut self, effect: Effect) {
        match effect {
            Effect::MountSheet(sheet) => {
                let signal = self.shell.close_signal();
                let notices =
                    self.panel
                        .open(sheet.key, sheet.closable, signal, &mut self.dispatcher);
                if sheet.key == SheetKey::Qr {
                    self.camera.open(self.devices.as_mut());
                } else {
                    self.camera.close();
                }
                self.apply_notices(notices);
            }
            Effect::SignalClose(signal) => {
                let notices = self.panel.sync_close_signal(signal, &mut self.dispatcher);
                self.apply_notices(notices);
            }
            Effect::CalendarOpened => self.carousel.open(&mut self.dispatcher),
            Effect::CalendarClosed => self.carousel.close(&mut self.dispatcher),
        }
    }

    fn apply_notices(&mut self, notices: Vec<SheetNotice>) {
        for notice in notices {
            let action = match notice {
                SheetNotice::StartClose => {
                    self.camera.close();
                    Action::SheetStartClose
                }
                SheetNotice::VisibilityChanged(visible) => Action::SheetVisibility(visible),
                SheetNotice::Closed => Action::SheetClosed,
            };
            self.apply_action(action);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calendar::CarouselState;
    use crate::sheet::Phase;
    use crate::shell::HeaderButton;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn app() -> App {
        App::new(&Config::default(), date(2025, 11, 25))
    }

    fn ms(n: u64) -> Duration {
        Duration::from_millis(n)
    }

    #[test]
    fn menu_sheet_closed_by_header_back() {
        let mut app = app();
        app.reduce(Action::ToggleDrawer);
        app.reduce(Action::DrawerItem(SheetKey::Billing));
        assert_eq!(app.panel().phase(), Phase::Opening);
        assert!(!app.shell().drawer_open());

        app.advance(ms(10));
        assert_eq!(app.panel().phase(), Phase::Open);
        assert!(app.shell().overlay().visible);
        assert_eq!(app.shell().header_button(), HeaderButton::Back);

        app.reduce(Action::HeaderBack);
        assert_eq!(app.panel().phase(), Phase::Closing);
        assert!(!app.shell().overlay().visible);
        assert!(app.shell().active_sheet().is_some());

        // A nested element finishing its transition changes nothing.
        app.dispatch(Input::SheetTransitionEnd(TransitionTarget::Nested));
        assert!(app.shell().active_sheet().is_some());

        app.dispatch(Input::SheetTransitionEnd(TransitionTarget::Own));
        assert_eq!(app.panel().phase(), Phase::Closed);
        assert!(app.shell().active_sheet().is_none());
        assert!(!app.shell().overlay().active);

        // Completion is reported only once.
        app.dispatch(Input::SheetTransitionEnd(TransitionTarget::Own));
        assert!(app.shell().active_sheet().is_none());
    }

    #[test]
    fn fixed_sheet_ignores_close_button() {
        let mut app = app();
        app.reduce(Action::DrawerItem(SheetKey::Help));
        app.advance(ms(10));

        app.dispatch(Input::SheetCloseButton);
        assert_eq!(app.panel().phase(), Phase::Open);

        app.dispatch(Input::SheetBackdrop);
        assert_eq!(app.panel().phase(), Phase::Closing);
    }

    #[test]
    fn qr_sheet_streams_camera_until_closed() {
        let mut app = app();
        app.reduce(Action::QrButton);
        assert!(app.camera().has_stream());

        app.advance(ms(10));
        app.dispatch(Input::SheetCloseButton);
        assert!(!app.camera().has_stream());
        assert!(!app.camera().is_pending());
    }

    #[test]
    fn denied_camera_shows_error() {
        let mut app = app();
        app.simulate_camera(Err(CameraError::PermissionDenied));
        app.reduce(Action::QrButton);

        assert!(!app.camera().has_stream());
        assert!(!app.camera().error().unwrap_or_default().is_empty());
        assert_eq!(app.shell().active_sheet().unwrap().key, SheetKey::Qr);
    }

    #[test]
    fn calendar_flow() {
        let mut app = app();
        app.dispatch(Input::CalendarNav(1));
        assert_eq!(app.carousel().active_index(), app.carousel().initial_index());

        app.reduce(Action::OpenCalendar);
        assert_eq!(app.carousel().state(), CarouselState::ProgrammaticScroll);
        app.advance(ms(120));
        assert_eq!(app.carousel().state(), CarouselState::Idle);

        app.dispatch(Input::CalendarNav(1));
        assert_eq!(app.carousel().active_month().unwrap().key(), "2025-12");
        app.advance(ms(350));

        app.set_prompt(Box::new(AutoAnswer(true)));
        app.dispatch(Input::CalendarDate(date(2025, 12, 1)));
        assert_eq!(app.last_click(), Some(DayClick::Planned));

        app.dispatch(Input::CalendarDate(date(2025, 11, 1)));
        assert_eq!(app.last_click(), Some(DayClick::Selected));
        assert_eq!(app.carousel().planned().len(), 1);

        app.reduce(Action::CloseCalendar);
        app.dispatch(Input::CalendarDate(date(2025, 12, 1)));
        assert_eq!(app.carousel().planned().len(), 1);
    }

    #[test]
    fn training_page_mounts_timeline_on_today() {
        let mut app = app();
        app.dispatch(Input::TimelineScroll(0));
        assert_eq!(app.timeline_view().offset(), 0);

        app.reduce(Action::Navigate(Route::Training));
        assert_eq!(app.timeline_view().sticky_label(), "11");
        assert!(app.timeline_view().offset() > 0);

        app.dispatch(Input::TimelineScroll(0));
        assert_eq!(app.timeline_view().sticky_label(), "08");

        app.dispatch(Input::TimelineGranularity(Granularity::Month));
        assert_eq!(app.timeline_view().sticky_label(), "2025");

        app.dispatch(Input::TimelineTap);
        assert_eq!(
            app.shell().active_sheet().map(|s| s.key),
            Some(SheetKey::RecordTraining)
        );
    }
}
