use std::{
    sync::{
        atomic::{AtomicBool, AtomicU64, Ordering},
        Arc, Mutex,
    },
    thread::{self, JoinHandle},
    time::{Duration, Instant},
};

use crossbeam::channel;
use enclose::enclose;
use log::{info, warn};
use padinput::{
    DeviceId, DeviceInfo, Rumble, StickPos, TunedFrame, AXIS_LEFT_X, AXIS_LEFT_Y, AXIS_RIGHT_X,
    AXIS_RIGHT_Y,
};
use thiserror::Error;

use crate::{
    config::{self, RootConfig, StickSide, TriggerSide, CONFIG_KEY},
    device::{registry::Registry, DeviceSource, SourceEvent},
    remap::{ButtonMap, RemapSession, CAPTURE_TIMEOUT},
    store::Store,
    transform::{self, ResponseCurve},
    util::{
        recent_channel::{self as recent, TrySendError},
        RateCounter,
    },
};

pub type FrameSender = recent::Sender<Record>;
pub type FrameReceiver = recent::Receiver<Record>;
pub type NotificationSender = channel::Sender<Notification>;

pub const DEFAULT_TICK_INTERVAL: Duration = Duration::from_millis(8);

const RATE_WINDOW: Duration = Duration::from_secs(1);

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct Settings {
    pub tick_interval: Duration,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            tick_interval: DEFAULT_TICK_INTERVAL,
        }
    }
}

/// One observation of the active device, already run through the
/// tuning pipeline. `timestamp` is measured from poll start.
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    pub device: DeviceId,
    pub frame: TunedFrame,
    pub poll_rate: Option<u32>,
    pub timestamp: Duration,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Notification {
    Connected(DeviceInfo),
    Disconnected(DeviceId),
    ActiveChanged(Option<DeviceInfo>),
    PollRate(u32),
    RemapCaptured { target: usize, source: usize },
    RemapTimedOut { target: usize },
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Error)]
pub enum CommandError {
    #[error("no active device")]
    NoActiveDevice,
}

/// Rumble requests cross to the poll thread through a queue; the
/// thread owns the source, so nothing else may touch the hardware.
pub(crate) enum HapticsCommand {
    Play {
        id: DeviceId,
        levels: Rumble,
        duration: Duration,
    },
    Stop {
        id: DeviceId,
    },
}

/// State shared between the public handle, the poll thread, and any
/// capture session. Lock order is registry before config; the other
/// mutexes are leaves.
pub(crate) struct Context<S> {
    pub config: Mutex<RootConfig>,
    pub registry: Mutex<Registry>,
    pub store: S,
    pub stop_flag: AtomicBool,
    pub poll_rate: Mutex<Option<u32>>,
    pub remap_generation: AtomicU64,
    pub frame_senders: Mutex<Vec<FrameSender>>,
    pub notify_senders: Mutex<Vec<NotificationSender>>,
}

impl<S: Store> Context<S> {
    pub fn new(config: RootConfig, store: S) -> Self {
        Self {
            config: Mutex::new(config),
            registry: Mutex::new(Registry::new()),
            store,
            stop_flag: Default::default(),
            poll_rate: Default::default(),
            remap_generation: Default::default(),
            frame_senders: Default::default(),
            notify_senders: Default::default(),
        }
    }

    pub fn notify(&self, note: Notification) {
        let mut senders = self.notify_senders.lock().unwrap();
        senders.retain(|sender| sender.send(note.clone()).is_ok());
    }

    pub fn save_config(&self) {
        let json = self.config.lock().unwrap().to_json_pretty();

        if let Err(e) = self.store.set(CONFIG_KEY, &json) {
            warn!("Failed to persist configuration: {}", e);
        }
    }

    pub fn update_config(&self, apply: impl FnOnce(&mut RootConfig)) {
        {
            let mut config = self.config.lock().unwrap();
            apply(&mut config);
        }

        self.save_config();
    }

    pub fn poll_loop<D: DeviceSource>(
        &self,
        mut source: D,
        haptics: channel::Receiver<HapticsCommand>,
        interval: Duration,
    ) -> D {
        let mut rate = RateCounter::start(RATE_WINDOW);
        let started = Instant::now();

        while !self.stop_flag.load(Ordering::Acquire) {
            self.poll_cycle(&mut source, &haptics, &mut rate, started);
            thread::sleep(interval);
        }

        source
    }

    fn poll_cycle<D: DeviceSource>(
        &self,
        source: &mut D,
        haptics: &channel::Receiver<HapticsCommand>,
        rate: &mut RateCounter,
        started: Instant,
    ) {
        while let Ok(command) = haptics.try_recv() {
            let result = match command {
                HapticsCommand::Play {
                    id,
                    levels,
                    duration,
                } => source.play_rumble(id, levels, duration),
                HapticsCommand::Stop { id } => source.stop_rumble(id),
            };

            if let Err(e) = result {
                warn!("Rumble command failed: {}", e);
            }
        }

        for event in source.poll_events() {
            self.apply_source_event(event);
        }

        {
            let mut registry = self.registry.lock().unwrap();
            for frame in source.frames() {
                registry.observe_frame(frame);
            }
        }

        if let Some(ticks) = rate.tick() {
            *self.poll_rate.lock().unwrap() = Some(ticks);
            self.notify(Notification::PollRate(ticks));
        }

        let poll_rate = *self.poll_rate.lock().unwrap();
        let record = {
            let registry = self.registry.lock().unwrap();
            registry.active_frame().map(|frame| {
                let config = self.config.lock().unwrap();

                Record {
                    device: frame.id,
                    frame: transform::tune_frame(frame, &config),
                    poll_rate,
                    timestamp: started.elapsed(),
                }
            })
        };

        if let Some(record) = record {
            let mut senders = self.frame_senders.lock().unwrap();
            senders.retain(|sender| {
                !matches!(
                    sender.try_send(record.clone()),
                    Err(TrySendError::Disconnected(_))
                )
            });
        }
    }

    fn apply_source_event(&self, event: SourceEvent) {
        let mut notes = Vec::new();

        {
            let mut registry = self.registry.lock().unwrap();
            let active_before = registry.active_id();

            match event {
                SourceEvent::Connected(info) => {
                    info!("Device {} connected: {}", info.id, info.name);
                    notes.push(Notification::Connected(info.clone()));
                    registry.connect(info);
                }
                SourceEvent::Disconnected(id) => {
                    info!("Device {} disconnected", id);
                    notes.push(Notification::Disconnected(id));
                    registry.disconnect(id);
                }
            }

            if registry.active_id() != active_before {
                notes.push(Notification::ActiveChanged(registry.active_info()));
            }
        }

        for note in notes {
            self.notify(note);
        }
    }
}

/// Owns the device source and drives it from a worker thread. Created
/// idle; `start` spawns the thread and `stop` recovers the source so
/// the poller can be started again.
pub struct Poller<D: DeviceSource + 'static, S: Store + Send + Sync + 'static> {
    context: Arc<Context<S>>,
    settings: Settings,
    source: Option<D>,
    thread: Option<JoinHandle<D>>,
    haptics_sender: channel::Sender<HapticsCommand>,
    haptics_receiver: channel::Receiver<HapticsCommand>,
}

impl<D: DeviceSource + 'static, S: Store + Send + Sync + 'static> Poller<D, S> {
    pub fn new(source: D, config: RootConfig, store: S, settings: Settings) -> Self {
        let (haptics_sender, haptics_receiver) = channel::unbounded();

        Self {
            context: Arc::new(Context::new(config, store)),
            settings,
            source: Some(source),
            thread: None,
            haptics_sender,
            haptics_receiver,
        }
    }

    /// Spawns the poll thread. Does nothing when already running.
    pub fn start(&mut self) {
        if self.thread.is_some() {
            return;
        }

        if let Some(source) = self.source.take() {
            let interval = self.settings.tick_interval;
            self.context.stop_flag.store(false, Ordering::Release);

            self.thread = Some(thread::spawn(enclose!(
                (self.context => context, self.haptics_receiver => haptics) move || {
                    context.poll_loop(source, haptics, interval)
                }
            )));
        }
    }

    /// Stops the poll thread and takes the source back for a later
    /// restart. Safe to call when already stopped.
    pub fn stop(&mut self) {
        self.context.stop_flag.store(true, Ordering::Release);

        if let Some(thread) = self.thread.take() {
            match thread.join() {
                Ok(source) => self.source = Some(source),
                Err(_) => warn!("Poll thread panicked"),
            }
        }
    }

    #[must_use]
    pub fn running(&self) -> bool {
        self.thread.is_some()
    }

    #[must_use]
    pub fn connected(&self) -> bool {
        !self.context.registry.lock().unwrap().is_empty()
    }

    #[must_use]
    pub fn devices(&self) -> Vec<DeviceInfo> {
        self.context.registry.lock().unwrap().devices()
    }

    #[must_use]
    pub fn active(&self) -> Option<DeviceInfo> {
        self.context.registry.lock().unwrap().active_info()
    }

    /// Selects which device observations and commands apply to.
    /// Returns whether the device was present; an absent id leaves the
    /// selection unchanged.
    pub fn set_active(&self, id: DeviceId) -> bool {
        let (present, changed, info) = {
            let mut registry = self.context.registry.lock().unwrap();
            let active_before = registry.active_id();
            let present = registry.set_active(id);

            (
                present,
                registry.active_id() != active_before,
                registry.active_info(),
            )
        };

        if changed {
            self.context.notify(Notification::ActiveChanged(info));
        }

        present
    }

    /// Most recent ticks-per-window figure, absent until the first
    /// window completes.
    #[must_use]
    pub fn poll_rate(&self) -> Option<u32> {
        *self.context.poll_rate.lock().unwrap()
    }

    /// Subscribes to tuned frames. The channel keeps only the most
    /// recent record, so a slow consumer sees current state rather
    /// than a backlog.
    pub fn subscribe_frames(&self) -> FrameReceiver {
        let (sender, receiver) = recent::channel();
        self.context.frame_senders.lock().unwrap().push(sender);
        receiver
    }

    pub fn send_on_event(&self, sender: NotificationSender) {
        self.context.notify_senders.lock().unwrap().push(sender);
    }

    #[must_use]
    pub fn config(&self) -> RootConfig {
        self.context.config.lock().unwrap().clone()
    }

    pub fn set_stick_deadzone(&self, side: StickSide, pct: f32) {
        self.context
            .update_config(|config| config.sticks.side_mut(side).set_deadzone(pct));
    }

    pub fn set_stick_sensitivity(&self, side: StickSide, pct: f32) {
        self.context
            .update_config(|config| config.sticks.side_mut(side).set_sensitivity(pct));
    }

    pub fn set_stick_curve(&self, side: StickSide, curve: ResponseCurve) {
        self.context
            .update_config(|config| config.sticks.side_mut(side).curve = curve);
    }

    pub fn set_trigger_deadzone(&self, side: TriggerSide, pct: f32) {
        self.context
            .update_config(|config| config.triggers.side_mut(side).set_deadzone(pct));
    }

    pub fn set_trigger_sensitivity(&self, side: TriggerSide, pct: f32) {
        self.context
            .update_config(|config| config.triggers.side_mut(side).set_sensitivity(pct));
    }

    pub fn set_vibration(&self, left: f32, right: f32) {
        self.context
            .update_config(|config| config.vibration.set_levels(left, right));
    }

    #[must_use]
    pub fn button_mapping(&self) -> ButtonMap {
        self.context.config.lock().unwrap().button_mapping.clone()
    }

    pub fn map_button(&self, physical: usize, target: usize) {
        self.context
            .update_config(|config| config.button_mapping.set(physical, target));
    }

    pub fn clear_button(&self, physical: usize) {
        self.context
            .update_config(|config| config.button_mapping.clear(physical));
    }

    /// Starts an interactive capture for `target`: the next other
    /// button pressed on the active device becomes what `target`
    /// reports as. Supersedes any session already listening.
    pub fn remap_listen(&self, target: usize) -> RemapSession {
        RemapSession::spawn(self.context.clone(), target, CAPTURE_TIMEOUT)
    }

    /// Samples the resting stick positions of the active device and
    /// stores them as drift offsets. Sticks must be untouched while
    /// this runs. Returns the sampled left and right offsets.
    pub fn calibrate_drift(&self) -> Result<(StickPos, StickPos), CommandError> {
        let (left, right) = {
            let registry = self.context.registry.lock().unwrap();
            let frame = registry.active_frame().ok_or(CommandError::NoActiveDevice)?;

            (
                StickPos::new(frame.axis(AXIS_LEFT_X), frame.axis(AXIS_LEFT_Y)),
                StickPos::new(frame.axis(AXIS_RIGHT_X), frame.axis(AXIS_RIGHT_Y)),
            )
        };

        self.context.update_config(|config| {
            config.sticks.left.set_drift(left.x, left.y);
            config.sticks.right.set_drift(right.x, right.y);
        });

        Ok((left, right))
    }

    /// Queues a rumble burst on the active device. Levels are
    /// percentages; the poll thread owns the source, so the command
    /// takes effect on its next tick.
    pub fn vibrate(&self, left: f32, right: f32, duration: Duration) -> Result<(), CommandError> {
        let id = self.active_id()?;
        let levels = Rumble::new(
            (left / 100.0).clamp(0.0, 1.0),
            (right / 100.0).clamp(0.0, 1.0),
        );

        self.haptics_sender
            .send(HapticsCommand::Play {
                id,
                levels,
                duration,
            })
            .ok();
        Ok(())
    }

    /// Rumble burst at the configured default levels.
    pub fn vibrate_default(&self, duration: Duration) -> Result<(), CommandError> {
        let (left, right) = {
            let config = self.context.config.lock().unwrap();
            (config.vibration.left, config.vibration.right)
        };

        self.vibrate(left, right, duration)
    }

    pub fn stop_vibration(&self) -> Result<(), CommandError> {
        let id = self.active_id()?;
        self.haptics_sender.send(HapticsCommand::Stop { id }).ok();
        Ok(())
    }

    #[must_use]
    pub fn export_config(&self) -> String {
        self.context.config.lock().unwrap().to_json_pretty()
    }

    /// Replaces the whole configuration from an interchange document.
    /// A document that does not parse leaves the current configuration
    /// untouched.
    pub fn import_config(&self, json: &str) -> config::Result<()> {
        let parsed = RootConfig::from_json(json)?;
        self.context.update_config(|config| *config = parsed);
        Ok(())
    }

    pub fn reset_config(&self) {
        self.context
            .update_config(|config| *config = RootConfig::default());
    }

    fn active_id(&self) -> Result<DeviceId, CommandError> {
        self.context
            .registry
            .lock()
            .unwrap()
            .active_id()
            .ok_or(CommandError::NoActiveDevice)
    }
}

impl<D: DeviceSource + 'static, S: Store + Send + Sync + 'static> Drop for Poller<D, S> {
    fn drop(&mut self) {
        self.stop();
    }
}

#[cfg(test)]
mod tests {
    use std::{
        collections::VecDeque,
        mem,
        time::{Duration, Instant},
    };

    use crossbeam::channel;
    use padinput::{DeviceFrame, DeviceId, DeviceInfo, Rumble};

    use super::{CommandError, Notification, Poller, Settings};
    use crate::{
        config::{RootConfig, StickSide, TriggerSide},
        device::{self, DeviceSource, SourceEvent},
        store::MemoryStore,
        transform::{self, ResponseCurve},
        util::RateCounter,
    };

    #[derive(Default)]
    struct FakeSource {
        events: VecDeque<SourceEvent>,
        frames: Vec<DeviceFrame>,
        rumbles: Vec<(DeviceId, Rumble, Duration)>,
        stops: Vec<DeviceId>,
        reject_rumble: bool,
    }

    impl FakeSource {
        fn with_pad(axes: &[f32]) -> Self {
            let mut source = Self::default();
            source.events.push_back(SourceEvent::Connected(pad_info(0)));
            source.frames.push(frame_with_axes(0, axes));
            source
        }
    }

    impl DeviceSource for FakeSource {
        fn poll_events(&mut self) -> Vec<SourceEvent> {
            self.events.drain(..).collect()
        }

        fn frames(&mut self) -> Vec<DeviceFrame> {
            mem::take(&mut self.frames)
        }

        fn play_rumble(
            &mut self,
            id: DeviceId,
            levels: Rumble,
            duration: Duration,
        ) -> device::Result<()> {
            if self.reject_rumble {
                return Err(device::Error::FfUnsupported);
            }

            self.rumbles.push((id, levels, duration));
            Ok(())
        }

        fn stop_rumble(&mut self, id: DeviceId) -> device::Result<()> {
            self.stops.push(id);
            Ok(())
        }
    }

    fn pad_info(id: usize) -> DeviceInfo {
        DeviceInfo {
            id: DeviceId(id),
            name: format!("pad {id}"),
            axis_count: 4,
            button_count: 17,
        }
    }

    fn frame_with_axes(id: usize, axes: &[f32]) -> DeviceFrame {
        let mut frame = DeviceFrame::neutral(DeviceId(id), 4, 17);
        for (index, &value) in axes.iter().enumerate() {
            frame.axes[index] = value;
        }
        frame
    }

    /// Drives poll cycles by hand so tests stay deterministic.
    struct Bench {
        poller: Poller<FakeSource, MemoryStore>,
        rate: RateCounter,
        started: Instant,
    }

    impl Bench {
        fn new(source: FakeSource) -> Self {
            Self {
                poller: Poller::new(
                    source,
                    RootConfig::default(),
                    MemoryStore::new(),
                    Settings::default(),
                ),
                rate: RateCounter::start(Duration::from_secs(1)),
                started: Instant::now(),
            }
        }

        fn cycle(&mut self) {
            let context = self.poller.context.clone();
            let haptics = self.poller.haptics_receiver.clone();
            let source = self.poller.source.as_mut().unwrap();
            context.poll_cycle(source, &haptics, &mut self.rate, self.started);
        }

        fn push_event(&mut self, event: SourceEvent) {
            self.poller.source.as_mut().unwrap().events.push_back(event);
        }

        fn source(&self) -> &FakeSource {
            self.poller.source.as_ref().unwrap()
        }
    }

    #[test]
    fn cycle_registers_devices_and_emits_tuned_frames() {
        let mut bench = Bench::new(FakeSource::with_pad(&[0.5, 0.5, 0.0, 0.0]));
        let frames = bench.poller.subscribe_frames();
        let (sender, notes) = channel::unbounded();
        bench.poller.send_on_event(sender);

        bench.cycle();

        assert!(bench.poller.connected());
        assert_eq!(bench.poller.active(), Some(pad_info(0)));

        let record = frames.try_recv().unwrap();
        assert_eq!(record.device, DeviceId(0));
        assert_eq!(record.poll_rate, None);

        let expected = transform::tune_frame(
            &frame_with_axes(0, &[0.5, 0.5, 0.0, 0.0]),
            &RootConfig::default(),
        );
        assert_eq!(record.frame, expected);

        let received: Vec<_> = notes.try_iter().collect();
        assert_eq!(
            received,
            vec![
                Notification::Connected(pad_info(0)),
                Notification::ActiveChanged(Some(pad_info(0))),
            ]
        );
    }

    #[test]
    fn cycle_without_devices_emits_nothing() {
        let mut bench = Bench::new(FakeSource::default());
        let frames = bench.poller.subscribe_frames();

        bench.cycle();

        assert!(!bench.poller.connected());
        assert!(frames.try_recv().is_err());
    }

    #[test]
    fn disconnect_promotes_the_lowest_remaining_device() {
        let mut source = FakeSource::default();
        source.events.push_back(SourceEvent::Connected(pad_info(0)));
        source.events.push_back(SourceEvent::Connected(pad_info(1)));
        source.events.push_back(SourceEvent::Connected(pad_info(2)));

        let mut bench = Bench::new(source);
        bench.cycle();
        assert_eq!(bench.poller.active(), Some(pad_info(0)));

        bench.push_event(SourceEvent::Disconnected(DeviceId(0)));
        bench.cycle();

        assert_eq!(bench.poller.active(), Some(pad_info(1)));
        assert_eq!(bench.poller.devices().len(), 2);
    }

    #[test]
    fn set_active_switches_and_reports_presence() {
        let mut source = FakeSource::default();
        source.events.push_back(SourceEvent::Connected(pad_info(0)));
        source.events.push_back(SourceEvent::Connected(pad_info(1)));

        let mut bench = Bench::new(source);
        bench.cycle();

        let (sender, notes) = channel::unbounded();
        bench.poller.send_on_event(sender);

        assert!(bench.poller.set_active(DeviceId(1)));
        assert_eq!(bench.poller.active(), Some(pad_info(1)));

        assert!(!bench.poller.set_active(DeviceId(9)));
        assert_eq!(bench.poller.active(), Some(pad_info(1)));

        let received: Vec<_> = notes.try_iter().collect();
        assert_eq!(received, vec![Notification::ActiveChanged(Some(pad_info(1)))]);
    }

    #[test]
    fn rumble_commands_reach_the_source_on_the_next_cycle() {
        let mut bench = Bench::new(FakeSource::with_pad(&[0.0; 4]));
        bench.cycle();

        bench
            .poller
            .vibrate(80.0, 25.0, Duration::from_millis(300))
            .unwrap();
        bench.poller.stop_vibration().unwrap();
        bench.cycle();

        assert_eq!(
            bench.source().rumbles,
            vec![(DeviceId(0), Rumble::new(0.8, 0.25), Duration::from_millis(300))]
        );
        assert_eq!(bench.source().stops, vec![DeviceId(0)]);
    }

    #[test]
    fn rumble_failures_are_swallowed() {
        let mut source = FakeSource::with_pad(&[0.0; 4]);
        source.reject_rumble = true;

        let mut bench = Bench::new(source);
        bench.cycle();

        bench
            .poller
            .vibrate_default(Duration::from_millis(100))
            .unwrap();
        bench.cycle();

        assert!(bench.source().rumbles.is_empty());
    }

    #[test]
    fn commands_require_an_active_device() {
        let bench = Bench::new(FakeSource::default());

        assert_eq!(
            bench.poller.vibrate(50.0, 50.0, Duration::from_millis(100)),
            Err(CommandError::NoActiveDevice)
        );
        assert_eq!(
            bench.poller.stop_vibration(),
            Err(CommandError::NoActiveDevice)
        );
        assert_eq!(
            bench.poller.calibrate_drift(),
            Err(CommandError::NoActiveDevice)
        );
    }

    #[test]
    fn calibrate_drift_samples_the_resting_frame() {
        let mut bench = Bench::new(FakeSource::with_pad(&[0.05, -0.02, 0.1, 0.0]));
        bench.cycle();

        let (left, right) = bench.poller.calibrate_drift().unwrap();
        assert_eq!((left.x, left.y), (0.05, -0.02));
        assert_eq!((right.x, right.y), (0.1, 0.0));

        let config = bench.poller.config();
        assert_eq!(config.sticks.left.drift_x, 0.05);
        assert_eq!(config.sticks.left.drift_y, -0.02);
        assert_eq!(config.sticks.right.drift_x, 0.1);

        let stored = RootConfig::load(&bench.poller.context.store);
        assert_eq!(stored, config);
    }

    #[test]
    fn tuning_setters_clamp_and_persist() {
        let bench = Bench::new(FakeSource::default());

        bench.poller.set_stick_deadzone(StickSide::Left, 250.0);
        bench
            .poller
            .set_stick_curve(StickSide::Right, ResponseCurve::Aggressive);
        bench
            .poller
            .set_trigger_sensitivity(TriggerSide::Right, 150.0);
        bench.poller.set_vibration(80.0, 20.0);
        bench.poller.map_button(0, 2);

        let config = bench.poller.config();
        assert_eq!(config.sticks.left.deadzone, 100.0);
        assert_eq!(config.sticks.right.curve, ResponseCurve::Aggressive);
        assert_eq!(config.triggers.rt.sensitivity, 150.0);
        assert_eq!((config.vibration.left, config.vibration.right), (80.0, 20.0));
        assert_eq!(config.button_mapping.resolve(0), 2);

        bench.poller.clear_button(0);
        assert!(bench.poller.button_mapping().is_identity());

        assert_eq!(
            RootConfig::load(&bench.poller.context.store),
            bench.poller.config()
        );
    }

    #[test]
    fn import_replaces_and_bad_documents_leave_state_alone() {
        let bench = Bench::new(FakeSource::default());
        bench.poller.set_stick_deadzone(StickSide::Left, 42.0);

        assert!(bench.poller.import_config("{ nope").is_err());
        assert_eq!(bench.poller.config().sticks.left.deadzone, 42.0);

        let mut replacement = RootConfig::default();
        replacement.triggers.lt.set_deadzone(33.0);

        bench
            .poller
            .import_config(&replacement.to_json_pretty())
            .unwrap();
        assert_eq!(bench.poller.config(), replacement);
        assert_eq!(bench.poller.export_config(), replacement.to_json_pretty());

        bench.poller.reset_config();
        assert_eq!(bench.poller.config(), RootConfig::default());
        assert_eq!(
            RootConfig::load(&bench.poller.context.store),
            RootConfig::default()
        );
    }

    #[test]
    fn poll_rate_reports_once_per_window() {
        let mut bench = Bench::new(FakeSource::with_pad(&[0.0; 4]));
        bench.rate = RateCounter::start(Duration::ZERO);
        let frames = bench.poller.subscribe_frames();
        let (sender, notes) = channel::unbounded();
        bench.poller.send_on_event(sender);

        bench.cycle();

        assert_eq!(bench.poller.poll_rate(), Some(1));
        assert_eq!(frames.try_recv().unwrap().poll_rate, Some(1));

        let received: Vec<_> = notes.try_iter().collect();
        assert!(received.contains(&Notification::PollRate(1)));
    }

    #[test]
    fn start_stop_and_restart_recover_the_source() {
        let source = FakeSource::with_pad(&[0.25, 0.0, 0.0, 0.0]);
        let mut poller = Poller::new(
            source,
            RootConfig::default(),
            MemoryStore::new(),
            Settings::default(),
        );
        let frames = poller.subscribe_frames();

        assert!(!poller.running());
        poller.start();
        assert!(poller.running());
        poller.start();

        let record = frames.recv_timeout(Duration::from_secs(2)).unwrap();
        assert_eq!(record.device, DeviceId(0));

        poller.stop();
        assert!(!poller.running());
        poller.stop();

        poller.start();
        assert!(poller.running());
        assert!(poller.connected());

        let record = frames.recv_timeout(Duration::from_secs(2)).unwrap();
        assert_eq!(record.device, DeviceId(0));
        poller.stop();
    }
}
