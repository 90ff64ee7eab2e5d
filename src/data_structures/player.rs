//! The walking first-person player of the play screen.

use cgmath::{Deg, InnerSpace, Point3, Rad, Vector2};

use crate::{camera::Camera, data_structures::terrain::Terrain, resources::tags::TagBlock};

/// Gameplay values of the `Player` block in the terrain config.
#[derive(Debug, Clone, PartialEq)]
pub struct PlayerSettings {
    /// Start position in world (x, z). `None` starts two cells in from the
    /// terrain's minimum corner.
    pub start: Option<Vector2<f32>>,
    /// The player has won on reaching this world (x, z). `None` means the
    /// terrain corner opposite the start.
    pub goal: Option<Vector2<f32>>,
    pub goal_radius: f32,
    pub eye_height: f32,
    /// World units per second.
    pub speed: f32,
    /// Radians per pixel of mouse motion.
    pub sensitivity: f32,
    /// Radians per second for keyboard and stick turning.
    pub turn_speed: f32,
}

impl Default for PlayerSettings {
    fn default() -> Self {
        Self {
            start: None,
            goal: None,
            goal_radius: 4.0,
            eye_height: 1.7,
            speed: 8.0,
            sensitivity: 0.003,
            turn_speed: 1.8,
        }
    }
}

impl PlayerSettings {
    pub fn from_block(block: &TagBlock) -> anyhow::Result<Self> {
        let defaults = Self::default();
        let point = |x: &str, z: &str| -> anyhow::Result<Option<Vector2<f32>>> {
            if block.contains(x) || block.contains(z) {
                Ok(Some(Vector2::new(block.get_f32(x)?, block.get_f32(z)?)))
            } else {
                Ok(None)
            }
        };
        Ok(Self {
            start: point("start.x", "start.z")?,
            goal: point("goal.x", "goal.z")?,
            goal_radius: block.get_f32_or("goal.radius", defaults.goal_radius)?,
            eye_height: block.get_f32_or("eye.height", defaults.eye_height)?,
            speed: block.get_f32_or("speed", defaults.speed)?,
            sensitivity: block.get_f32_or("sensitivity", defaults.sensitivity)?,
            turn_speed: block.get_f32_or("turn.speed", defaults.turn_speed)?,
        })
    }
}

#[derive(Debug, Clone)]
pub struct Player {
    camera: Camera,
    goal: Vector2<f32>,
    settings: PlayerSettings,
}

impl Player {
    /// Places the player on the ground at the start position, facing the goal.
    pub fn new(settings: PlayerSettings, terrain: &Terrain) -> Self {
        let bounds = terrain.bounds();
        let inset = 2.0 * terrain.grid().cell_size;
        let start = settings.start.unwrap_or(Vector2::new(
            bounds.minimum.x + inset,
            bounds.minimum.z + inset,
        ));
        let goal = settings
            .goal
            .unwrap_or(Vector2::new(bounds.maximum.x - inset, bounds.maximum.z - inset));

        let heading = goal - start;
        let yaw = if heading.magnitude2() > f32::EPSILON {
            Rad(heading.y.atan2(heading.x))
        } else {
            Rad(0.0)
        };

        let mut player = Self {
            camera: Camera::new((start.x, 0.0, start.y), yaw, Deg(-10.0)),
            goal,
            settings,
        };
        player.place(terrain, start);
        player
    }

    /// Moves along the ground. `forward` and `strafe` are in `[-1, 1]`; the
    /// player stays inside the terrain bounds and on its surface.
    pub fn walk(&mut self, terrain: &Terrain, forward: f32, strafe: f32, dt: f32) {
        let mut direction = self.camera.forward() * forward + self.camera.right() * strafe;
        if direction.magnitude2() > 1.0 {
            direction = direction.normalize();
        }
        let step = direction * self.settings.speed * dt;
        let target = Vector2::new(self.camera.position.x + step.x, self.camera.position.z + step.z);
        self.place(terrain, target);
    }

    pub fn look(&mut self, yaw: Rad<f32>, pitch: Rad<f32>) {
        self.camera.rotate(yaw, pitch);
    }

    /// Mouse motion in pixels, scaled by the configured sensitivity.
    pub fn look_by_mouse(&mut self, motion: Vector2<f32>) {
        let s = self.settings.sensitivity;
        self.look(Rad(motion.x * s), Rad(-motion.y * s));
    }

    /// Turning from keys or a stick, `yaw` and `pitch` in `[-1, 1]`.
    pub fn turn(&mut self, yaw: f32, pitch: f32, dt: f32) {
        let speed = self.settings.turn_speed * dt;
        self.look(Rad(yaw * speed), Rad(pitch * speed));
    }

    fn place(&mut self, terrain: &Terrain, target: Vector2<f32>) {
        let bounds = terrain.bounds();
        let x = target.x.clamp(bounds.minimum.x, bounds.maximum.x);
        let z = target.y.clamp(bounds.minimum.z, bounds.maximum.z);
        let y = terrain.height_at_offset(x, z, self.settings.eye_height);
        self.camera.position = Point3::new(x, y, z);
    }

    pub fn position(&self) -> Point3<f32> {
        self.camera.position
    }

    pub fn camera(&self) -> &Camera {
        &self.camera
    }

    pub fn goal(&self) -> Vector2<f32> {
        self.goal
    }

    pub fn distance_to_goal(&self) -> f32 {
        let here = Vector2::new(self.camera.position.x, self.camera.position.z);
        (self.goal - here).magnitude()
    }

    pub fn reached_goal(&self) -> bool {
        self.distance_to_goal() <= self.settings.goal_radius
    }

    pub fn settings(&self) -> &PlayerSettings {
        &self.settings
    }
}
