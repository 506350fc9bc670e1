//! Application state management

use anyhow::Result;
use caliber_core::{
    DisplayChange, FpsCounter, FrameClock, MovementSnapshot, PartCatalog, TimeKeeper,
    WatchAssembly,
};
use serde::Serialize;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::{broadcast, Mutex, RwLock};
use tracing::{debug, info};

use crate::config::Config;

/// Events pushed to WebSocket clients
#[derive(Debug, Clone)]
pub enum MovementEvent {
    Frame { fps: f32, snapshot: MovementSnapshot },
    Highlight(Option<String>),
}

/// Timing state advanced once per frame
struct FrameState {
    clock: FrameClock,
    keeper: TimeKeeper,
    fps: FpsCounter,
}

/// Current time as served by the API
#[derive(Debug, Clone, Serialize)]
pub struct TimeReport {
    pub formatted: String,
    pub timezone: String,
    pub time: caliber_core::TimeState,
    pub fps: f32,
}

/// Shared application state
pub struct AppState {
    /// Movement model
    pub assembly: RwLock<WatchAssembly>,
    frame: Mutex<FrameState>,
    /// Configuration
    pub config: Config,
    /// Event broadcast for WebSocket clients
    pub events: broadcast::Sender<MovementEvent>,
}

impl AppState {
    /// Create new application state
    pub async fn new(config: Config) -> Result<Arc<Self>> {
        let catalog = match &config.daemon.catalog {
            Some(path) => PartCatalog::from_file(path)?,
            None => PartCatalog::builtin()?,
        };
        let mut assembly = WatchAssembly::with_catalog(&catalog)?;
        assembly.apply_settings(DisplayChange {
            wireframe: Some(config.display.wireframe),
            performance_mode: Some(config.display.performance_mode),
        });

        let keeper = TimeKeeper::system().with_timezone_name(&config.clock.timezone)?;
        info!(
            parts = assembly.parts().len(),
            timezone = %keeper.timezone(),
            "Movement assembled"
        );

        let (events, _) = broadcast::channel(16);

        Ok(Arc::new(Self {
            assembly: RwLock::new(assembly),
            frame: Mutex::new(FrameState {
                clock: FrameClock::new(),
                keeper,
                fps: FpsCounter::new(),
            }),
            config,
            events,
        }))
    }

    /// Subscribe to movement events
    pub fn subscribe(&self) -> broadcast::Receiver<MovementEvent> {
        self.events.subscribe()
    }

    /// Sample the clock, tick the movement once and publish the frame
    pub async fn advance_frame(&self, now: Instant) -> MovementSnapshot {
        let (delta_time, time, fps) = {
            let mut frame = self.frame.lock().await;
            let delta_time = frame.clock.tick(now);
            let time = frame.keeper.sample();
            if let Some(fps) = frame.fps.record(now) {
                debug!(fps, frames = frame.clock.frames(), "Frame rate");
            }
            (delta_time, time, frame.fps.fps())
        };

        let snapshot = {
            let mut assembly = self.assembly.write().await;
            assembly.update(delta_time, &time);
            assembly.snapshot()
        };

        // No subscribers is not an error
        let _ = self.events.send(MovementEvent::Frame {
            fps,
            snapshot: snapshot.clone(),
        });
        snapshot
    }

    /// Drive frames at the configured rate until the task is dropped
    pub async fn run_frames(self: Arc<Self>) {
        let period = self.config.daemon.frame_interval();
        let mut interval = tokio::time::interval(period);
        interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
        info!(period_ms = period.as_millis() as u64, "Starting frame loop");
        loop {
            let now = interval.tick().await;
            self.advance_frame(now.into_std()).await;
        }
    }

    pub async fn time_report(&self) -> TimeReport {
        let frame = self.frame.lock().await;
        TimeReport {
            formatted: frame.keeper.formatted(),
            timezone: frame.keeper.timezone().name().to_string(),
            time: frame.keeper.state(),
            fps: frame.fps.fps(),
        }
    }

    /// Highlight a part; false if the id is unknown
    pub async fn highlight(&self, id: &str) -> bool {
        let found = self.assembly.write().await.highlight_part(id);
        if found {
            let _ = self.events.send(MovementEvent::Highlight(Some(id.to_string())));
        }
        found
    }

    pub async fn clear_highlight(&self) {
        self.assembly.write().await.reset_highlight();
        let _ = self.events.send(MovementEvent::Highlight(None));
    }
}
