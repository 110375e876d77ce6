use std::time::Duration;

use instant::Instant;
use winit::application::ApplicationHandler;
use winit::event::WindowEvent;
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop, EventLoopProxy};
use winit::window::WindowId;

use crate::config::Config;
use crate::load::{LoadSampler, SampleUnavailable, SamplerWorker};
use crate::playback::PlaybackState;
use crate::schedule::Cadence;
use crate::sprite::Selection;
use crate::tray::{TrayCommand, TrayIcon};

// ---------------------------------------------------------------------------
// Seams
// ---------------------------------------------------------------------------

/// Where sample requests go. Implemented by the worker thread.
trait SampleRequests {
    fn request(&self) -> bool;
    fn shutdown(&mut self);
}

impl SampleRequests for SamplerWorker {
    fn request(&self) -> bool {
        SamplerWorker::request(self)
    }

    fn shutdown(&mut self) {
        SamplerWorker::shutdown(self);
    }
}

/// What shows the current frame. Implemented by the tray.
trait Presenter {
    fn present(&mut self, state: &PlaybackState);
    fn remove(&mut self);
}

impl Presenter for TrayIcon {
    fn present(&mut self, state: &PlaybackState) {
        TrayIcon::present(self, state);
    }

    fn remove(&mut self) {
        TrayIcon::remove(self);
    }
}

// ---------------------------------------------------------------------------
// Timers
// ---------------------------------------------------------------------------

/// The two periodic jobs: frame advance and CPU sampling.
struct Timers {
    animation: Cadence,
    sampling: Cadence,
}

impl Timers {
    /// Both cadences are due at `now`: first frame and first sample.
    fn new(config: &Config, now: Instant) -> Self {
        Self {
            animation: Cadence::new(config.frame_interval, Duration::ZERO, now),
            sampling: Cadence::new(config.sample_interval, config.sample_tolerance, now),
        }
    }

    /// Fire whichever cadences are due at `now`. Returns the instant to
    /// sleep until.
    fn step<S, P>(
        &mut self,
        now: Instant,
        playback: &mut PlaybackState,
        sampler: Option<&S>,
        presenter: Option<&mut P>,
    ) -> Instant
    where
        S: SampleRequests,
        P: Presenter,
    {
        if self.sampling.poll(now) {
            if let Some(sampler) = sampler {
                sampler.request();
            }
        }

        if self.animation.poll(now) {
            // Show the current frame, then step to the next one.
            if let Some(presenter) = presenter {
                presenter.present(playback);
            }
            playback.tick();
        }

        self.animation.deadline().min(self.sampling.deadline())
    }
}

/// Stop the sampler before releasing the presenter, so no sample lands on a
/// removed tray.
fn teardown<S, P>(sampler: &mut Option<S>, presenter: &mut Option<P>)
where
    S: SampleRequests,
    P: Presenter,
{
    if let Some(mut sampler) = sampler.take() {
        sampler.shutdown();
    }
    if let Some(mut presenter) = presenter.take() {
        presenter.remove();
    }
}

/// Events delivered to the event loop from other threads or the tray.
#[derive(Debug)]
pub enum AppEvent {
    /// Result of one CPU sample from the worker thread.
    LoadSampled(Result<f32, SampleUnavailable>),
    /// A tray menu item was picked.
    Tray(TrayCommand),
}

// ---------------------------------------------------------------------------
// App
// ---------------------------------------------------------------------------

/// Top-level application context. Lives on the event loop thread, which is
/// the only place `PlaybackState` is read or written.
struct App {
    config: Config,
    proxy: EventLoopProxy<AppEvent>,

    playback: PlaybackState,

    // Periodic work
    timers: Timers,

    // Off-thread OS reads
    sampler: Option<SamplerWorker>,

    // Presenter
    tray: Option<TrayIcon>,

    /// Set when startup fails inside the event loop; returned from `run`.
    startup_error: Option<Box<dyn std::error::Error>>,
}

impl App {
    fn new(config: Config, proxy: EventLoopProxy<AppEvent>) -> Self {
        Self {
            playback: PlaybackState::new(Selection::default()),
            timers: Timers::new(&config, Instant::now()),
            sampler: None,
            tray: None,
            startup_error: None,
            config,
            proxy,
        }
    }

    /// Load frames for `selection` and rewind playback onto it.
    fn select(&mut self, selection: Selection) {
        match &mut self.tray {
            Some(tray) => {
                let frames = tray.load_sprites(&self.config.asset_dir, selection);
                self.playback.apply_selection_with_frames(selection, frames);
            }
            None => self.playback.apply_selection(selection),
        }
        log::info!(
            "Runner: {} / Theme: {} ({} frames)",
            selection.runner.label(),
            selection.theme.label(),
            self.playback.frame_count()
        );
        self.present();
    }

    fn present(&mut self) {
        if let Some(tray) = &mut self.tray {
            tray.present(&self.playback);
        }
    }

    fn start_sampler(&mut self) {
        let proxy = self.proxy.clone();
        match SamplerWorker::spawn(LoadSampler::system(), move |result| {
            proxy.send_event(AppEvent::LoadSampled(result)).is_ok()
        }) {
            Ok(worker) => self.sampler = Some(worker),
            Err(e) => log::warn!("Could not start load sampler, CPU usage unavailable: {e}"),
        }
    }

    /// Fire whichever cadences are due and sleep until the next deadline.
    fn run_timers(&mut self, event_loop: &ActiveEventLoop) {
        let wake = self.timers.step(
            Instant::now(),
            &mut self.playback,
            self.sampler.as_ref(),
            self.tray.as_mut(),
        );
        event_loop.set_control_flow(ControlFlow::WaitUntil(wake));
    }

    /// Stop periodic work before releasing the tray.
    fn shutdown(&mut self) {
        teardown(&mut self.sampler, &mut self.tray);
    }
}

impl ApplicationHandler<AppEvent> for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.tray.is_some() {
            return;
        }

        match TrayIcon::new(self.proxy.clone(), self.playback.selection()) {
            Ok(tray) => self.tray = Some(tray),
            Err(e) => {
                log::error!("Failed to create tray icon: {e}");
                self.startup_error = Some(e);
                event_loop.exit();
                return;
            }
        }

        self.select(self.playback.selection());
        self.start_sampler();

        let now = Instant::now();
        self.timers = Timers::new(&self.config, now);

        log::info!(
            "Playback every {:?}, sampling every {:?} (+{:?})",
            self.timers.animation.period(),
            self.timers.sampling.period(),
            self.config.sample_tolerance,
        );
        event_loop.set_control_flow(ControlFlow::WaitUntil(now));
    }

    fn user_event(&mut self, event_loop: &ActiveEventLoop, event: AppEvent) {
        match event {
            AppEvent::LoadSampled(result) => {
                match &result {
                    Ok(pct) => log::debug!("CPU usage: {pct:.1}%"),
                    Err(e) => log::debug!("CPU usage unavailable: {e}"),
                }
                self.playback.record_sample(result);
            }
            AppEvent::Tray(TrayCommand::Quit) => {
                log::info!("Quit selected, exiting");
                event_loop.exit();
            }
            AppEvent::Tray(cmd) => {
                if let Some(selection) = cmd.apply_to(self.playback.selection()) {
                    self.select(selection);
                }
            }
        }
    }

    fn about_to_wait(&mut self, event_loop: &ActiveEventLoop) {
        if self.tray.is_none() {
            return;
        }
        self.run_timers(event_loop);
    }

    fn window_event(
        &mut self,
        _event_loop: &ActiveEventLoop,
        _window_id: WindowId,
        _event: WindowEvent,
    ) {
        // No windows of our own.
    }

    fn exiting(&mut self, _event_loop: &ActiveEventLoop) {
        log::info!("Shutting down");
        self.shutdown();
    }
}

/// Entry point — create event loop and run.
pub fn run() -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::from_env();
    let event_loop = EventLoop::<AppEvent>::with_user_event().build()?;
    let mut app = App::new(config, event_loop.create_proxy());
    event_loop.run_app(&mut app)?;

    match app.startup_error.take() {
        Some(e) => Err(e),
        None => Ok(()),
    }
}
