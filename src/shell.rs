use derive_more::Display;
use std::str::FromStr;

use crate::error::{Error, ErrorKind};
use crate::sheet::{SheetKey, TransitionTarget};

#[derive(Debug, Display, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    #[display(fmt = "/")]
    Home,
    #[display(fmt = "/training")]
    Training,
    #[display(fmt = "/condition")]
    Condition,
    #[display(fmt = "/stores")]
    Stores,
}

impl Route {
    pub const ALL: [Route; 4] = [Route::Home, Route::Training, Route::Condition, Route::Stores];

    pub fn label(&self) -> &'static str {
        match self {
            Route::Home => "ホーム",
            Route::Training => "トレーニング",
            Route::Condition => "コンディション",
            Route::Stores => "お気に入り店舗",
        }
    }

    pub fn record_target(&self) -> SheetKey {
        match self {
            Route::Home | Route::Training => SheetKey::RecordTraining,
            Route::Condition => SheetKey::RecordCondition,
            Route::Stores => SheetKey::RecordStore,
        }
    }
}

impl FromStr for Route {
    type Err = Error;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Route::ALL
            .iter()
            .copied()
            .find(|r| r.to_string() == s)
            .ok_or_else(|| Error::new(ErrorKind::UnknownRoute, s))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DrawerItem {
    pub label: &'static str,
    pub sheet: SheetKey,
}

pub const DRAWER_ITEMS: [DrawerItem; 16] = [
    DrawerItem { label: "お知らせ", sheet: SheetKey::News },
    DrawerItem { label: "ベアレージポイント", sheet: SheetKey::Points },
    DrawerItem { label: "友達紹介", sheet: SheetKey::Referral },
    DrawerItem { label: "デジタルチケット", sheet: SheetKey::DigitalTicket },
    DrawerItem { label: "トレーニング動画", sheet: SheetKey::TrainingVideos },
    DrawerItem { label: "レズミルズ動画", sheet: SheetKey::Lesmills },
    DrawerItem { label: "来館の記録", sheet: SheetKey::Visits },
    DrawerItem { label: "FIT365施設利用方法", sheet: SheetKey::Guide },
    DrawerItem { label: "契約情報", sheet: SheetKey::Contract },
    DrawerItem { label: "各種お手続き", sheet: SheetKey::Procedures },
    DrawerItem { label: "お支払い情報", sheet: SheetKey::Billing },
    DrawerItem { label: "オンラインショップ", sheet: SheetKey::Shop },
    DrawerItem { label: "アプリ設定", sheet: SheetKey::Settings },
    DrawerItem { label: "ヘルプ", sheet: SheetKey::Help },
    DrawerItem { label: "minefitのご紹介", sheet: SheetKey::Minefit },
    DrawerItem { label: "お問い合わせ", sheet: SheetKey::Contact },
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ActiveSheet {
    pub key: SheetKey,
    pub closable: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordChoice {
    Training,
    Condition,
    Cancel,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Overlay {
    pub visible: bool,
    pub active: bool,
    pub dimmed: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HeaderButton {
    Menu,
    Back,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Navigate(Route),
    Back,
    ToggleDrawer,
    CloseDrawer,
    Escape,
    DrawerItem(SheetKey),
    OpenSheet { key: SheetKey, closable: bool },
    QrButton,
    RecordButton,
    RecordChoice(RecordChoice),
    HeaderBack,
    OpenCalendar,
    CloseCalendar,
    SheetStartClose,
    SheetVisibility(bool),
    SheetClosed,
    OverlayTransitionEnd(TransitionTarget),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Effect {
    MountSheet(ActiveSheet),
    SignalClose(u64),
    CalendarOpened,
    CalendarClosed,
}

#[derive(Debug, Clone)]
pub struct ShellState {
    history: Vec<Route>,
    drawer_open: bool,
    calendar_open: bool,
    record_choice_open: bool,
    active_sheet: Option<ActiveSheet>,
    close_signal: u64,
    overlay: Overlay,
}

impl Default for ShellState {
    fn default() -> Self {
        ShellState {
            history: vec![Route::Home],
            drawer_open: false,
            calendar_open: false,
            record_choice_open: false,
            active_sheet: None,
            close_signal: 0,
            overlay: Overlay::default(),
        }
    }
}

impl ShellState {
    pub fn route(&self) -> Route {
        self.history.last().copied().unwrap_or(Route::Home)
    }

    pub fn drawer_open(&self) -> bool {
        self.drawer_open
    }

    pub fn calendar_open(&self) -> bool {
        self.calendar_open
    }

    pub fn record_choice_open(&self) -> bool {
        self.record_choice_open
    }

    pub fn active_sheet(&self) -> Option<ActiveSheet> {
        self.active_sheet
    }

    pub fn close_signal(&self) -> u64 {
        self.close_signal
    }

    pub fn overlay(&self) -> Overlay {
        self.overlay
    }

    pub fn header_button(&self) -> HeaderButton {
        match self.active_sheet {
            Some(ActiveSheet { closable: false, .. }) => HeaderButton::Back,
            _ => HeaderButton::Menu,
        }
    }

    pub fn content_shifted(&self) -> bool {
        self.drawer_open
    }

    fn open_sheet(&mut self, key: SheetKey, closable: bool) -> Vec<Effect> {
        let sheet = ActiveSheet { key, closable };
        self.active_sheet = Some(sheet);
        self.overlay = Overlay {
            visible: true,
            active: true,
            dimmed: key.is_dimmed(),
        };
        vec![Effect::MountSheet(sheet)]
    }

    fn settle_overlay(&mut self) {
        if self.active_sheet.is_none() && !self.overlay.visible {
            self.overlay.active = false;
            self.overlay.dimmed = false;
        }
    }

    pub fn reduce(&mut self, action: Action) -> Vec<Effect> {
        log::trace!("shell action {:?}", action);

        match action {
            Action::Navigate(route) => {
                if route != self.route() {
                    self.history.push(route);
                }
                self.drawer_open = false;
                self.record_choice_open = false;
                Vec::new()
            }
            Action::Back => {
                if self.history.len() > 1 {
                    self.history.pop();
                }
                Vec::new()
            }
            Action::ToggleDrawer => {
                self.drawer_open = !self.drawer_open;
                Vec::new()
            }
            Action::CloseDrawer | Action::Escape => {
                self.drawer_open = false;
                Vec::new()
            }
            Action::DrawerItem(key) => {
                self.drawer_open = false;
                self.open_sheet(key, false)
            }
            Action::OpenSheet { key, closable } => self.open_sheet(key, closable),
            Action::QrButton => self.open_sheet(SheetKey::Qr, true),
            Action::RecordButton => {
                let route = self.route();
                if route == Route::Home {
                    self.record_choice_open = true;
                    Vec::new()
                } else {
                    self.open_sheet(route.record_target(), true)
                }
            }
            Action::RecordChoice(choice) => {
                if !self.record_choice_open {
                    return Vec::new();
                }
                self.record_choice_open = false;
                match choice {
                    RecordChoice::Training => self.open_sheet(SheetKey::RecordTraining, true),
                    RecordChoice::Condition => self.open_sheet(SheetKey::RecordCondition, true),
                    RecordChoice::Cancel => Vec::new(),
                }
            }
            Action::HeaderBack => {
                if self.header_button() != HeaderButton::Back {
                    return Vec::new();
                }
                self.overlay.visible = false;
                self.close_signal += 1;
                vec![Effect::SignalClose(self.close_signal)]
            }
            Action::OpenCalendar => {
                if self.calendar_open {
                    return Vec::new();
                }
                self.calendar_open = true;
                vec![Effect::CalendarOpened]
            }
            Action::CloseCalendar => {
                if !self.calendar_open {
                    return Vec::new();
                }
                self.calendar_open = false;
                vec![Effect::CalendarClosed]
            }
            Action::SheetStartClose => {
                self.overlay.visible = false;
                Vec::new()
            }
            Action::SheetVisibility(visible) => {
                self.overlay.visible = visible;
                if visible {
                    self.overlay.active = true;
                }
                self.settle_overlay();
                Vec::new()
            }
            Action::SheetClosed => {
                self.active_sheet = None;
                self.settle_overlay();
                Vec::new()
            }
            Action::OverlayTransitionEnd(target) => {
                if target == TransitionTarget::Own && !self.overlay.visible {
                    self.settle_overlay();
                }
                Vec::new()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn routes_parse_from_paths() {
        assert_eq!("/".parse::<Route>().unwrap(), Route::Home);
        assert_eq!("/stores".parse::<Route>().unwrap(), Route::Stores);
        assert!("/gym".parse::<Route>().is_err());
        assert_eq!(Route::Condition.to_string(), "/condition");
    }

    #[test]
    fn navigation_history() {
        let mut shell = ShellState::default();
        shell.reduce(Action::Navigate(Route::Training));
        shell.reduce(Action::Navigate(Route::Training));
        shell.reduce(Action::Navigate(Route::Stores));

        assert_eq!(shell.route(), Route::Stores);
        shell.reduce(Action::Back);
        assert_eq!(shell.route(), Route::Training);
        shell.reduce(Action::Back);
        shell.reduce(Action::Back);
        assert_eq!(shell.route(), Route::Home);
    }

    #[test]
    fn drawer_item_opens_fixed_sheet() {
        let mut shell = ShellState::default();
        shell.reduce(Action::ToggleDrawer);
        assert!(shell.drawer_open());

        let effects = shell.reduce(Action::DrawerItem(SheetKey::News));

        assert!(!shell.drawer_open());
        assert_eq!(
            effects,
            vec![Effect::MountSheet(ActiveSheet {
                key: SheetKey::News,
                closable: false
            })]
        );
        assert_eq!(shell.header_button(), HeaderButton::Back);
        assert!(!shell.overlay().dimmed);
    }

    #[test]
    fn header_back_bumps_close_signal() {
        let mut shell = ShellState::default();
        assert!(shell.reduce(Action::HeaderBack).is_empty());

        shell.reduce(Action::DrawerItem(SheetKey::Help));
        assert_eq!(shell.reduce(Action::HeaderBack), vec![Effect::SignalClose(1)]);
        assert!(!shell.overlay().visible);
        assert!(shell.overlay().active);

        shell.reduce(Action::SheetClosed);
        assert_eq!(shell.active_sheet(), None);
        assert_eq!(shell.overlay(), Overlay::default());
        assert_eq!(shell.header_button(), HeaderButton::Menu);
    }

    #[test]
    fn header_back_ignored_for_closable_sheet() {
        let mut shell = ShellState::default();
        shell.reduce(Action::QrButton);
        assert_eq!(shell.header_button(), HeaderButton::Menu);

        assert!(shell.reduce(Action::HeaderBack).is_empty());
        assert_eq!(shell.close_signal(), 0);
        assert!(shell.overlay().visible);
    }

    #[test]
    fn record_button_depends_on_route() {
        let mut shell = ShellState::default();
        assert!(shell.reduce(Action::RecordButton).is_empty());
        assert!(shell.record_choice_open());

        let effects = shell.reduce(Action::RecordChoice(RecordChoice::Condition));
        assert!(!shell.record_choice_open());
        assert_eq!(
            effects,
            vec![Effect::MountSheet(ActiveSheet {
                key: SheetKey::RecordCondition,
                closable: true
            })]
        );
        assert!(shell.overlay().dimmed);

        shell.reduce(Action::Navigate(Route::Stores));
        let effects = shell.reduce(Action::RecordButton);
        assert_eq!(
            effects,
            vec![Effect::MountSheet(ActiveSheet {
                key: SheetKey::RecordStore,
                closable: true
            })]
        );
    }

    #[test]
    fn cancelled_record_choice_opens_nothing() {
        let mut shell = ShellState::default();
        shell.reduce(Action::RecordButton);

        assert!(shell.reduce(Action::RecordChoice(RecordChoice::Cancel)).is_empty());
        assert!(shell.active_sheet().is_none());
        assert!(shell.reduce(Action::RecordChoice(RecordChoice::Training)).is_empty());
    }

    #[test]
    fn overlay_fade_ignores_nested_targets() {
        let mut shell = ShellState::default();
        shell.reduce(Action::QrButton);
        shell.reduce(Action::SheetStartClose);

        // Sheet still mounted: fade-out leaves the overlay rendered.
        shell.reduce(Action::OverlayTransitionEnd(TransitionTarget::Own));
        assert!(shell.overlay().active);

        shell.active_sheet = None;
        shell.reduce(Action::OverlayTransitionEnd(TransitionTarget::Nested));
        assert!(shell.overlay().active);
        shell.reduce(Action::OverlayTransitionEnd(TransitionTarget::Own));
        assert!(!shell.overlay().active);
    }

    #[test]
    fn calendar_open_close_is_idempotent() {
        let mut shell = ShellState::default();

        assert_eq!(shell.reduce(Action::OpenCalendar), vec![Effect::CalendarOpened]);
        assert!(shell.reduce(Action::OpenCalendar).is_empty());
        assert_eq!(shell.reduce(Action::CloseCalendar), vec![Effect::CalendarClosed]);
        assert!(shell.reduce(Action::CloseCalendar).is_empty());
    }

    #[test]
    fn escape_closes_drawer() {
        let mut shell = ShellState::default();
        shell.reduce(Action::ToggleDrawer);
        assert!(shell.content_shifted());

        shell.reduce(Action::Escape);
        assert!(!shell.drawer_open());
    }
}
