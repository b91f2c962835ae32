//! Game-wide state: both scenes, which one is active, and the score.

use ecosort_ecs::Entity;
use tracing::{debug, info};

use crate::components::{Camera, Conveyor, IsGameFlag, Light, RigidBody};
use crate::scene::Scene;

/// Which scene the frame loop currently drives.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ActiveScene {
    #[default]
    Menu,
    Game,
}

/// Running tally of sorted and missed rubbish.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Score {
    pub sorted: u32,
    pub missed: u32,
}

impl Score {
    /// Points: one per correctly sorted item, minus one per miss.
    #[must_use]
    pub fn points(&self) -> i64 {
        i64::from(self.sorted) - i64::from(self.missed)
    }

    pub fn record(&mut self, correct: bool) {
        if correct {
            self.sorted += 1;
        } else {
            self.missed += 1;
        }
    }
}

/// Owns the menu and game scenes and tracks which one is live.
#[derive(Debug)]
pub struct GameContext {
    menu: Scene,
    game: Scene,
    active: ActiveScene,
    /// Frames spent in the active scene since it was activated.
    frames_in_scene: u64,
    score: Score,
}

impl GameContext {
    /// Create a context starting in the menu.
    #[must_use]
    pub fn new(menu: Scene, game: Scene) -> Self {
        Self {
            menu,
            game,
            active: ActiveScene::Menu,
            frames_in_scene: 0,
            score: Score::default(),
        }
    }

    #[must_use]
    pub fn active(&self) -> ActiveScene {
        self.active
    }

    #[must_use]
    pub fn active_scene(&self) -> &Scene {
        self.scene(self.active)
    }

    pub fn active_scene_mut(&mut self) -> &mut Scene {
        self.scene_mut(self.active)
    }

    #[must_use]
    pub fn scene(&self, which: ActiveScene) -> &Scene {
        match which {
            ActiveScene::Menu => &self.menu,
            ActiveScene::Game => &self.game,
        }
    }

    pub fn scene_mut(&mut self, which: ActiveScene) -> &mut Scene {
        match which {
            ActiveScene::Menu => &mut self.menu,
            ActiveScene::Game => &mut self.game,
        }
    }

    #[must_use]
    pub fn score(&self) -> Score {
        self.score
    }

    pub fn score_mut(&mut self) -> &mut Score {
        &mut self.score
    }

    #[must_use]
    pub fn frames_in_scene(&self) -> u64 {
        self.frames_in_scene
    }

    /// Count one frame in the active scene.
    pub fn advance_frame(&mut self) {
        self.frames_in_scene += 1;
    }

    /// Switch the active scene.
    ///
    /// The scene being left has its bodies stopped and its conveyor contact
    /// lists cleared. Entering the game starts a fresh round. Returns `false`
    /// if `target` is already active.
    pub fn activate(&mut self, target: ActiveScene) -> bool {
        if self.active == target {
            return false;
        }

        let leaving = self.active;
        clear_transient_state(self.scene_mut(leaving));

        self.active = target;
        self.frames_in_scene = 0;
        if target == ActiveScene::Game {
            self.reset_round();
        }

        let scene = self.active_scene();
        let viewpoints = scene.registry().find_any::<(Camera, Light)>().len();
        info!(
            from = ?leaving,
            to = ?target,
            scene = scene.name(),
            objects = scene.object_count(),
            viewpoints,
            "activated scene"
        );
        true
    }

    /// Remove every object of the previous round from the game scene and
    /// zero the score.
    pub fn reset_round(&mut self) {
        let registry = self.game.registry_mut();
        let leftovers: Vec<Entity> = registry.find_all::<(IsGameFlag,)>().entities();
        for entity in &leftovers {
            // Every entity came from the query just above.
            let _ = registry.destroy_entity(*entity);
        }
        self.score = Score::default();
        debug!(removed = leftovers.len(), "reset round");
    }
}

fn clear_transient_state(scene: &mut Scene) {
    let registry = scene.registry_mut();
    for (_, body) in registry.components_mut::<RigidBody>() {
        body.reset_motion();
    }
    for (_, conveyor) in registry.components_mut::<Conveyor>() {
        conveyor.touching.clear();
    }
}
