//! Host-driven lockstep loop
//!
//! The simulation host is the only clock. Once the client has registered, the
//! host sends one frame event per simulation tick and waits for the client to
//! report completion before the simulation advances:
//!
//! ```text
//!   Idle
//!    │ start
//!    ▼
//!  RunningCallback ──── python_finished ───► AwaitingEvent
//!    ▲                                         │
//!    └────────────── start / update ───────────┘
//!
//!  exit, refused registration, callback or transport failure: Terminated
//! ```
//!
//! Any other event byte, a host `error` datagram included, is answered with
//! `[error, generic]` and otherwise ignored; the loop keeps waiting.

use serde::Serialize;
use tracing::{debug, error, info, warn};

use crate::config::BridgeConfig;
use crate::error::CallbackStage;
use crate::racecar::{DisplaySink, Racecar};
use crate::transport::{Transport, UdpTransport};
use crate::types::{ErrorCode, FrameEvent, Header, PROTOCOL_VERSION};
use crate::wire::{CallFrame, ResponseShape};
use crate::{BridgeError, Result};

/// Completion acknowledgment for a start or update event.
const FINISHED: [u8; 1] = [Header::PythonFinished.tag()];

/// User control logic driven by the lockstep loop.
///
/// ```rust,no_run
/// use racecar_link::{BridgeConfig, Program, Racecar, Session, Transport};
///
/// struct Forward;
///
/// impl<T: Transport> Program<T> for Forward {
///     fn start(&mut self, rc: &mut Racecar<T>) -> anyhow::Result<()> {
///         rc.drive().stop()?;
///         Ok(())
///     }
///
///     fn update(&mut self, rc: &mut Racecar<T>) -> anyhow::Result<()> {
///         rc.drive().set_speed_angle(0.5, 0.0)?;
///         Ok(())
///     }
/// }
///
/// let mut session = Session::connect(BridgeConfig::default())?;
/// let summary = session.run(&mut Forward)?;
/// println!("{} frames", summary.frames);
/// # Ok::<(), racecar_link::BridgeError>(())
/// ```
pub trait Program<T: Transport> {
    /// Runs once each time the user enters user program mode.
    fn start(&mut self, rc: &mut Racecar<T>) -> anyhow::Result<()>;

    /// Runs once per simulation frame.
    fn update(&mut self, rc: &mut Racecar<T>) -> anyhow::Result<()>;

    /// Runs after `update` whenever the slow-update interval has elapsed.
    fn update_slow(&mut self, _rc: &mut Racecar<T>) -> anyhow::Result<()> {
        Ok(())
    }
}

/// Where the loop is in the lockstep cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum LoopState {
    /// No frame has completed yet.
    Idle,
    AwaitingEvent,
    RunningCallback,
    Terminated,
}

/// What a session did, reported when it ends cleanly.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SessionSummary {
    /// Start and update events handled.
    pub frames: u64,
    pub starts: u64,
    pub updates: u64,
    pub slow_updates: u64,
    pub calls: u64,
    pub casts: u64,
    pub chunk_acks: u64,
    /// Unknown events answered with an error acknowledgment.
    pub ignored_events: u64,
}

/// One control-program session against one simulation host.
pub struct Session<T> {
    racecar: Racecar<T>,
    state: LoopState,
    summary: SessionSummary,
    /// Simulation seconds since `update_slow` last ran.
    slow_elapsed: f32,
    /// Car index the host assigned, while registered.
    car: Option<u8>,
}

impl Session<UdpTransport> {
    /// Bind the client port and prepare a session over UDP.
    pub fn connect(config: BridgeConfig) -> Result<Self> {
        config.validate()?;
        let transport = UdpTransport::bind(&config)?;
        Self::new(transport, config)
    }
}

impl<T: Transport> Session<T> {
    pub fn new(transport: T, config: BridgeConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            racecar: Racecar::new(transport, config),
            state: LoopState::Idle,
            summary: SessionSummary::default(),
            slow_elapsed: 0.0,
            car: None,
        })
    }

    /// Route [`crate::racecar::Display`] output to `sink`.
    pub fn with_display<D: DisplaySink + 'static>(mut self, sink: D) -> Self {
        self.racecar.display = Box::new(sink);
        self
    }

    pub fn state(&self) -> LoopState {
        self.state
    }

    pub fn racecar(&self) -> &Racecar<T> {
        &self.racecar
    }

    /// Car index assigned by the host while the session is registered.
    pub fn car(&self) -> Option<u8> {
        self.car
    }

    /// Give back the transport, e.g. to inspect a scripted host after a run.
    pub fn into_transport(self) -> T {
        self.racecar.dispatcher.into_transport()
    }

    /// Register with the host, then serve frame events until it sends `exit`.
    ///
    /// Returns the session summary on `exit`. Any fatal error ends the session
    /// and leaves it [`LoopState::Terminated`]. Either way a registered session
    /// tells the host it is leaving.
    pub fn run<P: Program<T>>(&mut self, program: &mut P) -> Result<SessionSummary> {
        if self.state == LoopState::Terminated {
            return Err(BridgeError::invalid_argument("run", "session already terminated"));
        }

        let outcome = self.register().and_then(|()| self.serve(program));
        self.state = LoopState::Terminated;
        self.leave();

        match outcome {
            Ok(()) => {
                let summary = self.summary();
                info!(
                    frames = summary.frames,
                    starts = summary.starts,
                    updates = summary.updates,
                    slow_updates = summary.slow_updates,
                    calls = summary.calls,
                    casts = summary.casts,
                    chunk_acks = summary.chunk_acks,
                    ignored_events = summary.ignored_events,
                    "Session finished"
                );
                Ok(summary)
            }
            Err(e) => {
                error!(error = %e, "Session aborted");
                Err(e)
            }
        }
    }

    /// Counters so far, including traffic.
    pub fn summary(&self) -> SessionSummary {
        let stats = self.racecar.stats();
        SessionSummary {
            calls: stats.calls,
            casts: stats.casts,
            chunk_acks: stats.chunk_acks,
            ..self.summary
        }
    }

    /// Send `[connect, version]` and wait for the host to assign a car.
    ///
    /// A refusal (`no_free_car`, either side outdated) is
    /// [`BridgeError::HostReported`].
    fn register(&mut self) -> Result<()> {
        if self.racecar.config.registration_port.is_none() || self.car.is_some() {
            return Ok(());
        }

        let request = CallFrame::new(Header::Connect).push_u8(PROTOCOL_VERSION);
        let reply = self
            .racecar
            .dispatcher
            .call_control(&request, ResponseShape::Raw(2))?
            .into_raw()?;

        match *reply.as_slice() {
            [tag, car] if tag == Header::Connect.tag() => {
                info!(car, version = PROTOCOL_VERSION, "Registered with the simulator");
                self.car = Some(car);
                Ok(())
            }
            [tag, code] if tag == Header::Error.tag() => {
                let code = ErrorCode::from_byte(code).unwrap_or(ErrorCode::Generic);
                Err(BridgeError::HostReported { code })
            }
            [tag, ..] => Err(BridgeError::unexpected_event(tag)),
            [] => Err(BridgeError::framing("registration reply", 2, 0)),
        }
    }

    /// Send `python_exit` so the host frees the car. Failures are only logged.
    fn leave(&mut self) {
        let Some(car) = self.car.take() else {
            return;
        };
        match self.racecar.dispatcher.cast_control(&CallFrame::new(Header::PythonExit)) {
            Ok(()) => debug!(car, "Left the simulator"),
            Err(e) => warn!(car, error = %e, "Could not tell the simulator we left"),
        }
    }

    fn serve<P: Program<T>>(&mut self, program: &mut P) -> Result<()> {
        info!("Waiting for the simulator to enter user program mode");
        while self.serve_one(program)? {}
        Ok(())
    }

    /// Handle one host datagram. Returns `false` once the host says `exit`.
    fn serve_one<P: Program<T>>(&mut self, program: &mut P) -> Result<bool> {
        let event = match self.racecar.dispatcher.next_event() {
            Ok(event) => event,
            Err(BridgeError::UnexpectedEvent { code }) => {
                warn!(code, "Unexpected frame event, answering with an error");
                self.ignore_event()?;
                return Ok(true);
            }
            Err(e) => return Err(e),
        };

        debug!(?event, frame = self.racecar.frame, "Frame event");
        match event {
            FrameEvent::Start => self.run_start(program)?,
            FrameEvent::Update => self.run_update(program)?,
            FrameEvent::Exit => {
                info!("Exit received from the simulator");
                return Ok(false);
            }
            FrameEvent::HostError(code) => {
                warn!(%code, "Simulator sent an error instead of a frame event, answering with an error");
                self.ignore_event()?;
            }
        }

        Ok(true)
    }

    /// Answer a non-event datagram with `[error, generic]` and keep waiting.
    fn ignore_event(&mut self) -> Result<()> {
        self.summary.ignored_events += 1;
        self.racecar.dispatcher.acknowledge(&ErrorCode::Generic.datagram())
    }

    fn run_start<P: Program<T>>(&mut self, program: &mut P) -> Result<()> {
        self.state = LoopState::RunningCallback;
        if self.summary.starts > 0 {
            info!("Simulator restarted the user program");
        }

        self.racecar.frame = 0;
        self.racecar.cache.invalidate();
        self.slow_elapsed = 0.0;

        if let Err(e) = program.start(&mut self.racecar) {
            return Err(self.report_failure(CallbackStage::Start, e));
        }
        self.summary.starts += 1;
        self.complete()
    }

    fn run_update<P: Program<T>>(&mut self, program: &mut P) -> Result<()> {
        self.state = LoopState::RunningCallback;
        self.racecar.frame += 1;
        self.racecar.cache.invalidate();

        if let Err(e) = program.update(&mut self.racecar) {
            return Err(self.report_failure(CallbackStage::Update, e));
        }
        self.summary.updates += 1;

        match self.maybe_update_slow(program) {
            Ok(()) => self.complete(),
            Err(BridgeError::Callback { stage, source }) => Err(self.report_failure(stage, source)),
            Err(e) => Err(e),
        }
    }

    /// Accumulate this frame's delta time and run `update_slow` when due.
    fn maybe_update_slow<P: Program<T>>(&mut self, program: &mut P) -> Result<()> {
        let Some(interval) = self.racecar.update_slow_time else {
            return Ok(());
        };

        self.slow_elapsed += self.racecar.delta_time()?;
        if self.slow_elapsed < interval {
            return Ok(());
        }

        self.slow_elapsed = 0.0;
        program
            .update_slow(&mut self.racecar)
            .map_err(|e| BridgeError::callback(CallbackStage::UpdateSlow, e))?;
        self.summary.slow_updates += 1;
        Ok(())
    }

    /// Tell the host this frame's work is done.
    fn complete(&mut self) -> Result<()> {
        self.racecar.dispatcher.acknowledge(&FINISHED)?;
        self.summary.frames += 1;
        self.state = LoopState::AwaitingEvent;
        Ok(())
    }

    /// Send `[error, python_exception]` and wrap the callback error.
    fn report_failure(&mut self, stage: CallbackStage, source: anyhow::Error) -> BridgeError {
        error!(%stage, error = %format!("{source:#}"), "User callback failed");
        let notice = ErrorCode::PythonException.datagram();
        if let Err(e) = self.racecar.dispatcher.acknowledge(&notice) {
            warn!(error = %e, "Could not report the failure to the simulator");
        }
        BridgeError::callback(stage, source)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{Exchange, ScriptedTransport, numbered_chunks};
    use crate::wire::Response;
    use anyhow::{Context, bail, ensure};

    const CONNECT: [u8; 2] = [Header::Connect.tag(), PROTOCOL_VERSION];
    const LEAVE: [u8; 1] = [Header::PythonExit.tag()];

    #[derive(Default)]
    struct Counting {
        starts: u32,
        updates: u32,
        slow: u32,
        fail_start: bool,
        fail_update_at: Option<u32>,
        fail_slow: bool,
    }

    impl<T: Transport> Program<T> for Counting {
        fn start(&mut self, _rc: &mut Racecar<T>) -> anyhow::Result<()> {
            self.starts += 1;
            ensure!(!self.fail_start, "start failed");
            Ok(())
        }

        fn update(&mut self, _rc: &mut Racecar<T>) -> anyhow::Result<()> {
            self.updates += 1;
            ensure!(Some(self.updates) != self.fail_update_at, "update {} failed", self.updates);
            Ok(())
        }

        fn update_slow(&mut self, _rc: &mut Racecar<T>) -> anyhow::Result<()> {
            self.slow += 1;
            if self.fail_slow {
                bail!("slow update failed");
            }
            Ok(())
        }
    }

    fn no_slow_updates() -> BridgeConfig {
        BridgeConfig { update_slow_time: None, ..Default::default() }
    }

    /// A host that accepts registration for car 0, then sends `headers`.
    fn events(headers: &[Header]) -> ScriptedTransport {
        let mut script = ScriptedTransport::default();
        script.push_connected(0);
        for header in headers {
            script.push_event(*header);
        }
        script
    }

    #[test]
    fn start_update_update_exit() {
        let _ = tracing_subscriber::fmt::try_init();
        let script = events(&[
            Header::UnityStart,
            Header::UnityUpdate,
            Header::UnityUpdate,
            Header::UnityExit,
        ]);
        let mut session = Session::new(script, no_slow_updates()).unwrap();
        let mut program = Counting::default();

        let summary = session.run(&mut program).unwrap();

        assert_eq!((program.starts, program.updates), (1, 2));
        assert_eq!(summary.frames, 3);
        assert_eq!(session.state(), LoopState::Terminated);
        assert_eq!(session.car(), None);

        let transport = session.into_transport();
        assert_eq!(
            transport.sent(),
            vec![&CONNECT[..], &FINISHED[..], &FINISHED[..], &FINISHED[..], &LEAVE[..]]
        );
        let log = transport.log();
        assert_eq!(log[log.len() - 2], Exchange::Received(vec![Header::UnityExit.tag()]));
    }

    #[test]
    fn unknown_event_is_answered_and_skipped() {
        let mut script = events(&[Header::UnityStart]);
        script.push(vec![99]);
        script.push_event(Header::UnityExit);
        let mut session = Session::new(script, no_slow_updates()).unwrap();
        let mut program = Counting::default();

        let summary = session.run(&mut program).unwrap();

        assert_eq!(summary.ignored_events, 1);
        assert_eq!((program.starts, program.updates), (1, 0));
        let transport = session.into_transport();
        assert_eq!(
            transport.sent(),
            vec![&CONNECT[..], &FINISHED[..], &ErrorCode::Generic.datagram()[..], &LEAVE[..]]
        );
    }

    #[test]
    fn error_byte_between_frames_is_not_fatal() {
        let mut script = events(&[Header::UnityStart]);
        script.push(vec![Header::Error.tag()]);
        script.push_event(Header::UnityUpdate);
        script.push_host_error(ErrorCode::Timeout);
        script.push_event(Header::UnityExit);
        let mut session = Session::new(script, no_slow_updates()).unwrap();
        let mut program = Counting::default();

        let summary = session.run(&mut program).unwrap();

        assert_eq!((program.starts, program.updates), (1, 1));
        assert_eq!(summary.ignored_events, 2);
        let generic = ErrorCode::Generic.datagram();
        let transport = session.into_transport();
        assert_eq!(
            transport.sent(),
            vec![&CONNECT[..], &FINISHED[..], &generic[..], &FINISHED[..], &generic[..], &LEAVE[..]]
        );
        assert_eq!(transport.remaining(), 0);
    }

    #[test]
    fn refused_registration_is_host_reported() {
        let mut script = ScriptedTransport::default();
        script.push_host_error(ErrorCode::NoFreeCar);
        script.push_event(Header::UnityStart);
        let mut session = Session::new(script, no_slow_updates()).unwrap();
        let mut program = Counting::default();

        let err = session.run(&mut program).unwrap_err();

        assert!(matches!(err, BridgeError::HostReported { code: ErrorCode::NoFreeCar }));
        assert_eq!(program.starts, 0);
        assert_eq!(session.state(), LoopState::Terminated);
        let transport = session.into_transport();
        assert_eq!(transport.sent(), vec![&CONNECT[..]]);
        assert_eq!(transport.remaining(), 1);
    }

    #[test]
    fn registration_assigns_a_car() {
        let mut script = ScriptedTransport::default();
        script.push_connected(2);
        let mut session = Session::new(script, no_slow_updates()).unwrap();

        session.register().unwrap();
        assert_eq!(session.car(), Some(2));

        // Already registered; nothing more goes out.
        session.register().unwrap();
        assert_eq!(session.into_transport().sent(), vec![&CONNECT[..]]);
    }

    #[test]
    fn registration_can_be_disabled() {
        let config = BridgeConfig { registration_port: None, ..no_slow_updates() };
        let script = ScriptedTransport::new([vec![Header::UnityStart.tag()], vec![Header::UnityExit.tag()]]);
        let mut session = Session::new(script, config).unwrap();

        session.run(&mut Counting::default()).unwrap();

        let transport = session.into_transport();
        assert_eq!(transport.sent(), vec![&FINISHED[..]]);
    }

    #[test]
    fn state_leaves_idle_only_after_first_start() {
        let mut script = ScriptedTransport::default();
        script.push(vec![99]).push_event(Header::UnityStart);
        let config = BridgeConfig { registration_port: None, ..no_slow_updates() };
        let mut session = Session::new(script, config).unwrap();
        let mut program = Counting::default();

        assert!(session.serve_one(&mut program).unwrap());
        assert_eq!(session.state(), LoopState::Idle);

        assert!(session.serve_one(&mut program).unwrap());
        assert_eq!(session.state(), LoopState::AwaitingEvent);
    }

    #[test]
    fn callback_failure_is_reported_to_host() {
        let script = events(&[Header::UnityStart, Header::UnityUpdate, Header::UnityUpdate]);
        let mut session = Session::new(script, no_slow_updates()).unwrap();
        let mut program = Counting { fail_update_at: Some(2), ..Default::default() };

        let err = session.run(&mut program).unwrap_err();

        assert!(matches!(err, BridgeError::Callback { stage: CallbackStage::Update, .. }));
        assert!(format!("{:#}", anyhow::Error::new(err)).contains("update 2 failed"));
        assert_eq!(session.state(), LoopState::Terminated);
        let transport = session.into_transport();
        let sent = transport.sent();
        assert_eq!(&sent[sent.len() - 2..], &[&ErrorCode::PythonException.datagram()[..], &LEAVE[..]]);
        assert_eq!(transport.count_sent(Header::PythonFinished), 2);
    }

    #[test]
    fn start_failure_is_reported_to_host() {
        let script = events(&[Header::UnityStart, Header::UnityUpdate]);
        let mut session = Session::new(script, no_slow_updates()).unwrap();
        let mut program = Counting { fail_start: true, ..Default::default() };

        let err = session.run(&mut program).unwrap_err();

        assert!(matches!(err, BridgeError::Callback { stage: CallbackStage::Start, .. }));
        assert_eq!(program.updates, 0);
        let transport = session.into_transport();
        assert_eq!(
            transport.sent(),
            vec![&CONNECT[..], &ErrorCode::PythonException.datagram()[..], &LEAVE[..]]
        );
        assert_eq!(transport.remaining(), 1);
    }

    #[test]
    fn slow_update_failure_is_reported_to_host() {
        let mut script = events(&[Header::UnityStart, Header::UnityUpdate]);
        script.push_response(&Response::Float(0.5));
        script.push_event(Header::UnityUpdate);
        let config = BridgeConfig { update_slow_time: Some(0.25), ..Default::default() };
        let mut session = Session::new(script, config).unwrap();
        let mut program = Counting { fail_slow: true, ..Default::default() };

        let err = session.run(&mut program).unwrap_err();

        assert!(matches!(err, BridgeError::Callback { stage: CallbackStage::UpdateSlow, .. }));
        assert!(format!("{:#}", anyhow::Error::new(err)).contains("slow update failed"));
        assert_eq!((program.updates, program.slow), (1, 1));
        let transport = session.into_transport();
        assert_eq!(
            transport.sent(),
            vec![
                &CONNECT[..],
                &FINISHED[..],
                &[Header::RacecarGetDeltaTime.tag()][..],
                &ErrorCode::PythonException.datagram()[..],
                &LEAVE[..],
            ]
        );
        assert_eq!(transport.remaining(), 1);
    }

    #[test]
    fn silent_host_terminates() {
        let mut session = Session::new(events(&[Header::UnityStart]), no_slow_updates()).unwrap();
        let err = session.run(&mut Counting::default()).unwrap_err();

        assert!(matches!(err, BridgeError::HostUnresponsive { .. }));
        assert!(session.run(&mut Counting::default()).is_err());
        assert_eq!(session.into_transport().count_sent(Header::PythonExit), 1);
    }

    #[test]
    fn slow_updates_follow_simulation_time() -> anyhow::Result<()> {
        let mut script = events(&[Header::UnityStart]);
        for _ in 0..6 {
            script.push_event(Header::UnityUpdate);
            script.push_response(&Response::Float(0.02));
        }
        script.push_event(Header::UnityExit);
        let config = BridgeConfig { update_slow_time: Some(0.05), ..Default::default() };
        let mut session = Session::new(script, config)?;
        let mut program = Counting::default();

        let summary = session.run(&mut program).context("session failed")?;

        ensure!(program.updates == 6, "expected 6 updates, got {}", program.updates);
        ensure!(program.slow == 2, "expected 2 slow updates, got {}", program.slow);
        ensure!(summary.slow_updates == 2);
        ensure!(session.into_transport().count_sent(Header::RacecarGetDeltaTime) == 6);
        Ok(())
    }

    #[test]
    fn restart_reruns_start_and_resets_frame() {
        struct FrameRecorder(Vec<u64>);

        impl<T: Transport> Program<T> for FrameRecorder {
            fn start(&mut self, rc: &mut Racecar<T>) -> anyhow::Result<()> {
                self.0.push(rc.frame());
                Ok(())
            }

            fn update(&mut self, rc: &mut Racecar<T>) -> anyhow::Result<()> {
                self.0.push(rc.frame());
                Ok(())
            }
        }

        let script = events(&[
            Header::UnityStart,
            Header::UnityUpdate,
            Header::UnityUpdate,
            Header::UnityStart,
            Header::UnityUpdate,
            Header::UnityExit,
        ]);
        let mut session = Session::new(script, no_slow_updates()).unwrap();
        let mut recorder = FrameRecorder(Vec::new());

        let summary = session.run(&mut recorder).unwrap();

        assert_eq!(recorder.0, vec![0, 1, 2, 0, 1]);
        assert_eq!(summary.starts, 2);
        assert_eq!(summary.frames, 5);
    }

    #[test]
    fn drive_then_camera_end_to_end() {
        struct DriveAndLook;

        impl<T: Transport> Program<T> for DriveAndLook {
            fn start(&mut self, _rc: &mut Racecar<T>) -> anyhow::Result<()> {
                Ok(())
            }

            fn update(&mut self, rc: &mut Racecar<T>) -> anyhow::Result<()> {
                rc.drive().set_speed_angle(1.0, 0.0)?;
                let image = rc.camera().color_image()?;
                ensure!(image.data.len() == 640 * 480 * 4);
                Ok(())
            }
        }

        let mut script = ScriptedTransport::default();
        script.push_event(Header::UnityUpdate);
        for chunk in numbered_chunks(32, 38_400) {
            script.push(chunk);
        }
        script.push_event(Header::UnityExit);
        let config = BridgeConfig { registration_port: None, ..no_slow_updates() };
        let mut session = Session::new(script, config).unwrap();

        let summary = session.run(&mut DriveAndLook).unwrap();
        assert_eq!(summary.chunk_acks, 32);
        assert_eq!((summary.calls, summary.casts), (1, 1));

        let transport = session.into_transport();
        let log = transport.log();
        // update event, cast, color request, 32 x (chunk, ack), completion, exit
        assert_eq!(log.len(), 1 + 2 + 64 + 1 + 1);
        assert!(matches!(&log[1], Exchange::Sent(b) if b[0] == Header::DriveSetSpeedAngle.tag()));
        assert_eq!(log[2], Exchange::Sent(vec![Header::CameraGetColorImage.tag()]));
        for pair in log[3..67].chunks(2) {
            assert!(matches!(&pair[0], Exchange::Received(b) if b.len() == 38_400));
            assert_eq!(pair[1], Exchange::Sent(vec![Header::PythonSendNext.tag()]));
        }
        assert_eq!(log[67], Exchange::Sent(FINISHED.to_vec()));
        assert!(matches!(log[68], Exchange::Received(_)));
    }
}
