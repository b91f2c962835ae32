//! Fixed-timestep frame loop.
//!
//! Each frame runs the gameplay systems over the active scene in order:
//!
//! 1. Spawn rubbish (game scene only).
//! 2. Refresh conveyor contacts.
//! 3. Drive conveyors.
//! 4. Operate pushers.
//! 5. Integrate bodies.
//! 6. Sort rubbish and update the score (game scene only).
//! 7. Count the frame and leave the menu once it has been shown long enough.

use std::time::{Duration, Instant};

use tracing::{debug, info, warn};

use crate::config::FrameConfig;
use crate::context::{ActiveScene, GameContext};
use crate::systems;

/// The frame loop state.
#[derive(Debug)]
pub struct FrameLoop {
    /// Frames run so far.
    frame_id: u64,
    config: FrameConfig,
    context: GameContext,
}

impl FrameLoop {
    /// Create a frame loop over `context`.
    #[must_use]
    pub fn new(config: FrameConfig, context: GameContext) -> Self {
        Self {
            frame_id: 0,
            config,
            context,
        }
    }

    /// Returns the current frame counter.
    #[must_use]
    pub fn frame_id(&self) -> u64 {
        self.frame_id
    }

    #[must_use]
    pub fn context(&self) -> &GameContext {
        &self.context
    }

    /// Run one frame of every system over the active scene.
    ///
    /// # Errors
    ///
    /// Propagates registry usage errors raised by a system.
    pub fn frame(&mut self, dt: f64) -> ecosort_ecs::Result<()> {
        self.frame_id += 1;
        let dt = dt as f32;
        let active = self.context.active();
        let frame_in_scene = self.context.frames_in_scene();

        debug!(frame_id = self.frame_id, ?active, dt, "frame start");

        if active == ActiveScene::Game {
            systems::spawn_rubbish(
                self.context.active_scene_mut(),
                frame_in_scene,
                self.config.spawn_interval,
            );
        }

        let registry = self.context.active_scene_mut().registry_mut();
        systems::detect_contacts(registry)?;
        systems::drive_conveyors(registry)?;
        systems::operate_pushers(registry, dt)?;
        systems::integrate_bodies(registry, dt)?;

        if active == ActiveScene::Game {
            let outcomes = systems::sort_rubbish(registry)?;
            if !outcomes.is_empty() {
                let score = self.context.score_mut();
                for outcome in &outcomes {
                    score.record(outcome.is_correct());
                }
                let score = self.context.score();
                info!(
                    frame_id = self.frame_id,
                    points = score.points(),
                    sorted = score.sorted,
                    missed = score.missed,
                    "score changed"
                );
            }
        }

        self.context.advance_frame();
        systems::advance_menu(&mut self.context, self.config.menu_frames);
        Ok(())
    }

    /// Run the frame loop for the configured number of frames, or
    /// indefinitely when `max_frames` is 0.
    ///
    /// # Errors
    ///
    /// Stops at the first frame that fails.
    pub fn run(&mut self) -> ecosort_ecs::Result<()> {
        let frame_duration = Duration::from_secs_f64(self.config.frame_time());
        let mut frame_count = 0u64;

        info!(
            frame_rate = self.config.frame_rate,
            max_frames = self.config.max_frames,
            "starting frame loop"
        );

        loop {
            let start = Instant::now();

            self.frame(frame_duration.as_secs_f64())?;

            frame_count += 1;
            if self.config.max_frames > 0 && frame_count >= self.config.max_frames {
                let score = self.context.score();
                info!(
                    frames = frame_count,
                    points = score.points(),
                    sorted = score.sorted,
                    missed = score.missed,
                    "frame loop complete"
                );
                break;
            }

            let elapsed = start.elapsed();
            if elapsed < frame_duration {
                std::thread::sleep(frame_duration - elapsed);
            } else {
                warn!(
                    frame_id = self.frame_id,
                    elapsed_ms = elapsed.as_millis() as u64,
                    budget_ms = frame_duration.as_millis() as u64,
                    "frame exceeded time budget"
                );
            }
        }
        Ok(())
    }
}
