use std::str::FromStr;
use std::time::Duration;

use crate::error::{Error, ErrorKind};
use crate::events::{Scheduler, Timer, TimerHandle};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SheetKey {
    Qr,
    MyQr,
    RecordTraining,
    RecordCondition,
    RecordStore,
    StoreHome,
    News,
    Points,
    Referral,
    DigitalTicket,
    TrainingVideos,
    Lesmills,
    Visits,
    Guide,
    Contract,
    Procedures,
    Billing,
    Shop,
    Settings,
    Help,
    Minefit,
    Contact,
}

static SHEET_NAMES: phf::Map<&'static str, SheetKey> = phf::phf_map! {
    "qr" => SheetKey::Qr,
    "myQr" => SheetKey::MyQr,
    "recordTraining" => SheetKey::RecordTraining,
    "recordCondition" => SheetKey::RecordCondition,
    "recordStore" => SheetKey::RecordStore,
    "storeHome" => SheetKey::StoreHome,
    "news" => SheetKey::News,
    "points" => SheetKey::Points,
    "referral" => SheetKey::Referral,
    "digitalTicket" => SheetKey::DigitalTicket,
    "trainingVideos" => SheetKey::TrainingVideos,
    "lesmills" => SheetKey::Lesmills,
    "visits" => SheetKey::Visits,
    "guide" => SheetKey::Guide,
    "contract" => SheetKey::Contract,
    "procedures" => SheetKey::Procedures,
    "billing" => SheetKey::Billing,
    "shop" => SheetKey::Shop,
    "settings" => SheetKey::Settings,
    "help" => SheetKey::Help,
    "minefit" => SheetKey::Minefit,
    "contact" => SheetKey::Contact,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SheetContent {
    pub title: &'static str,
    pub message: &'static str,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlideFrom {
    Bottom,
    Right,
}

impl SheetKey {
    pub fn name(&self) -> &'static str {
        SHEET_NAMES
            .entries()
            .find(|(_, key)| *key == self)
            .map(|(name, _)| *name)
            .unwrap_or("")
    }

    pub fn content(&self) -> SheetContent {
        use SheetKey::*;
        let (title, message) = match self {
            Qr => ("QRコード", "QRコードシート"),
            MyQr => ("マイQRコード", "マイQRコードシート"),
            RecordTraining => ("トレーニング記録", "トレーニング記録シート"),
            RecordCondition => ("コンディション記録", "コンディション記録シート"),
            RecordStore => ("店舗検索", "店舗検索シート"),
            StoreHome => (
                "店舗ホームページ",
                "店舗ホームページ / アプリダウンロード表示シート",
            ),
            News => ("お知らせ", "お知らせシート"),
            Points => ("ベアレージポイント", "ポイント確認シート"),
            Referral => ("友達紹介", "友達紹介シート"),
            DigitalTicket => ("デジタルチケット", "デジタルチケットシート"),
            TrainingVideos => ("トレーニング動画", "トレーニング動画シート"),
            Lesmills => ("レズミルズ動画", "レズミルズ動画シート"),
            Visits => ("来館の記録", "来館記録シート"),
            Guide => ("FIT365施設利用方法", "FIT365施設利用方法シート"),
            Contract => ("契約情報", "契約情報シート"),
            Procedures => ("各種お手続き", "各種お手続きシート"),
            Billing => ("お支払い情報", "お支払い情報シート"),
            Shop => ("オンラインショップ", "オンラインショップシート"),
            Settings => ("アプリ設定", "アプリ設定シート"),
            Help => ("ヘルプ", "ヘルプシート"),
            Minefit => ("minefitのご紹介", "minefitのご紹介シート"),
            Contact => ("お問い合わせ", "お問い合わせシート"),
        };
        SheetContent { title, message }
    }

    pub fn is_dimmed(&self) -> bool {
        use SheetKey::*;
        matches!(
            self,
            Qr | MyQr | RecordTraining | RecordCondition | RecordStore | StoreHome
        )
    }

    pub fn slide_from(&self) -> SlideFrom {
        if self.is_dimmed() {
            SlideFrom::Bottom
        } else {
            SlideFrom::Right
        }
    }
}

impl FromStr for SheetKey {
    type Err = Error;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        SHEET_NAMES
            .get(s)
            .copied()
            .ok_or_else(|| Error::new(ErrorKind::UnknownSheet, s))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Closed,
    Opening,
    Open,
    Closing,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SheetNotice {
    VisibilityChanged(bool),
    StartClose,
    Closed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransitionTarget {
    Own,
    Nested,
}

#[derive(Debug, Clone)]
pub struct SheetPanel {
    key: Option<SheetKey>,
    closable: bool,
    phase: Phase,
    visible: bool,
    last_signal: u64,
    enter_timer: Option<TimerHandle>,
    enter_delay: Duration,
}

impl SheetPanel {
    pub fn new(enter_delay: Duration) -> Self {
        SheetPanel {
            key: None,
            closable: true,
            phase: Phase::Closed,
            visible: false,
            last_signal: 0,
            enter_timer: None,
            enter_delay,
        }
    }

    pub fn key(&self) -> Option<SheetKey> {
        self.key
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }

    pub fn shows_close(&self) -> bool {
        self.closable
    }

    /// Mounts `key`. The panel turns visible on the next enter tick.
    ///
    /// `close_signal` is the owner's counter at mount time; only later
    /// changes close the panel.
    pub fn open<S: Scheduler + ?Sized>(
        &mut self,
        key: SheetKey,
        closable: bool,
        close_signal: u64,
        sched: &mut S,
    ) -> Vec<SheetNotice> {
        if let Some(handle) = self.enter_timer.take() {
            sched.cancel(handle);
        }

        log::debug!("sheet '{}' opening", key.name());
        self.key = Some(key);
        self.closable = closable;
        self.last_signal = close_signal;

        if self.visible {
            // Content swap on an already shown panel.
            self.phase = Phase::Open;
        } else {
            self.phase = Phase::Opening;
            self.enter_timer = Some(sched.schedule(self.enter_delay, Timer::SheetEnter));
        }
        Vec::new()
    }

    pub fn on_timer(&mut self, handle: TimerHandle) -> Vec<SheetNotice> {
        if self.enter_timer != Some(handle) {
            return Vec::new();
        }
        self.enter_timer = None;

        if self.phase == Phase::Opening {
            self.phase = Phase::Open;
            self.visible = true;
            vec![SheetNotice::VisibilityChanged(true)]
        } else {
            Vec::new()
        }
    }

    pub fn close<S: Scheduler + ?Sized>(&mut self, sched: &mut S) -> Vec<SheetNotice> {
        match self.phase {
            Phase::Closed | Phase::Closing => Vec::new(),
            Phase::Opening => {
                // Never shown, so no transition will end.
                if let Some(handle) = self.enter_timer.take() {
                    sched.cancel(handle);
                }
                log::debug!("sheet closed before becoming visible");
                self.finish();
                vec![SheetNotice::StartClose, SheetNotice::Closed]
            }
            Phase::Open => {
                self.phase = Phase::Closing;
                self.visible = false;
                vec![SheetNotice::StartClose, SheetNotice::VisibilityChanged(false)]
            }
        }
    }

    pub fn close_button<S: Scheduler + ?Sized>(&mut self, sched: &mut S) -> Vec<SheetNotice> {
        if self.closable {
            self.close(sched)
        } else {
            Vec::new()
        }
    }

    /// Propagates the owner's close counter; each new value closes once.
    pub fn sync_close_signal<S: Scheduler + ?Sized>(
        &mut self,
        signal: u64,
        sched: &mut S,
    ) -> Vec<SheetNotice> {
        if signal == self.last_signal {
            return Vec::new();
        }
        self.last_signal = signal;
        self.close(sched)
    }

    pub fn transition_end(&mut self, target: TransitionTarget) -> Vec<SheetNotice> {
        if target != TransitionTarget::Own {
            return Vec::new();
        }
        if self.phase == Phase::Closing && !self.visible {
            self.finish();
            vec![SheetNotice::Closed]
        } else {
            Vec::new()
        }
    }

    fn finish(&mut self) {
        log::debug!(
            "sheet '{}' closed",
            self.key.map(|k| k.name()).unwrap_or_default()
        );
        self.phase = Phase::Closed;
        self.visible = false;
        self.key = None;
    }
}
