use std::cell::Cell;
use std::fmt;
use std::rc::Rc;
use std::sync::mpsc;

use crate::events::Event;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FacingMode {
    Environment,
    User,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StreamConstraints {
    pub facing_mode: FacingMode,
    pub audio: bool,
}

impl StreamConstraints {
    pub fn rear_camera() -> Self {
        StreamConstraints {
            facing_mode: FacingMode::Environment,
            audio: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CameraError {
    PermissionDenied,
    NoDevice,
    InsecureContext,
    Other(String),
}

impl fmt::Display for CameraError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CameraError::PermissionDenied => write!(f, "カメラの使用が許可されていません"),
            CameraError::NoDevice => write!(f, "利用できるカメラが見つかりません"),
            CameraError::InsecureContext => {
                write!(f, "カメラは安全な接続（HTTPS）でのみ利用できます")
            }
            CameraError::Other(msg) => write!(f, "カメラを起動できませんでした: {}", msg),
        }
    }
}

impl std::error::Error for CameraError {}

pub trait MediaStream {
    fn stop_tracks(&mut self);
}

pub trait MediaDevices {
    /// Starts acquiring a stream. The outcome must be delivered later for
    /// `ticket`; it must never be delivered from inside this call.
    fn request(&mut self, constraints: &StreamConstraints, ticket: AcquireTicket);
}

#[derive(Clone)]
pub struct AcquireTicket {
    id: u64,
    cancelled: Rc<Cell<bool>>,
}

impl AcquireTicket {
    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.get()
    }
}

impl fmt::Debug for AcquireTicket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "AcquireTicket({}{})", self.id, if self.is_cancelled() { ", cancelled" } else { "" })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolution {
    Streaming,
    Failed,
    Discarded,
}

#[derive(Default)]
pub struct CameraView {
    pending: Option<AcquireTicket>,
    stream: Option<Box<dyn MediaStream>>,
    error: Option<String>,
    next_id: u64,
}

impl fmt::Debug for CameraView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CameraView")
            .field("pending", &self.pending)
            .field("streaming", &self.stream.is_some())
            .field("error", &self.error)
            .finish()
    }
}

impl CameraView {
    pub fn new() -> Self {
        CameraView::default()
    }

    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    pub fn has_stream(&self) -> bool {
        self.stream.is_some()
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn open(&mut self, devices: &mut dyn MediaDevices) {
        self.close();

        let ticket = AcquireTicket {
            id: self.next_id,
            cancelled: Rc::new(Cell::new(false)),
        };
        self.next_id += 1;

        log::debug!("requesting camera stream {:?}", ticket);
        self.pending = Some(ticket.clone());
        devices.request(&StreamConstraints::rear_camera(), ticket);
    }

    pub fn resolve(
        &mut self,
        ticket: AcquireTicket,
        outcome: Result<Box<dyn MediaStream>, CameraError>,
    ) -> Resolution {
        let current = self
            .pending
            .as_ref()
            .map_or(false, |p| p.id == ticket.id);

        if ticket.is_cancelled() || !current {
            if let Ok(mut stream) = outcome {
                log::debug!("releasing late camera stream {:?}", ticket);
                stream.stop_tracks();
            }
            return Resolution::Discarded;
        }

        self.pending = None;
        match outcome {
            Ok(stream) => {
                self.stream = Some(stream);
                self.error = None;
                Resolution::Streaming
            }
            Err(e) => {
                log::warn!("camera unavailable: {:?}", e);
                self.error = Some(e.to_string());
                Resolution::Failed
            }
        }
    }

    pub fn close(&mut self) {
        if let Some(ticket) = self.pending.take() {
            ticket.cancelled.set(true);
        }
        if let Some(mut stream) = self.stream.take() {
            log::debug!("releasing camera stream");
            stream.stop_tracks();
        }
        self.error = None;
    }
}

impl Drop for CameraView {
    fn drop(&mut self) {
        self.close();
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SimulatedStream;

impl MediaStream for SimulatedStream {
    fn stop_tracks(&mut self) {
        log::info!("camera tracks stopped");
    }
}

pub struct SimulatedDevices {
    sink: mpsc::Sender<Event>,
    outcome: Result<(), CameraError>,
}

impl SimulatedDevices {
    pub fn new(sink: mpsc::Sender<Event>, outcome: Result<(), CameraError>) -> Self {
        SimulatedDevices { sink, outcome }
    }
}

impl MediaDevices for SimulatedDevices {
    fn request(&mut self, constraints: &StreamConstraints, ticket: AcquireTicket) {
        log::debug!("simulated camera request {:?}", constraints);
        let outcome = self
            .outcome
            .clone()
            .map(|_| Box::new(SimulatedStream) as Box<dyn MediaStream>);
        if self.sink.send(Event::Camera(ticket, outcome)).is_err() {
            log::warn!("camera outcome dropped: dispatcher gone");
        }
    }
}
