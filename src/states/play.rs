//! The walkable terrain.
//!
//! WASD or the arrow keys walk, the mouse (with the right button held), Q/E
//! or the right stick look around. The left stick walks as well. Reaching the
//! goal on the far side of the terrain ends the game. The on-screen menu and
//! help buttons do what Escape and F1 do.

use cgmath::Vector2;
use log::{info, warn};
use winit::{event::MouseButton, keyboard::KeyCode};

use crate::{
    camera::{CameraUniform, Projection},
    data_structures::{
        player::{Player, PlayerSettings},
        sprite::{Button, clicked_action},
        terrain::{Terrain, TerrainMesh, TextureFiles},
    },
    game::{GameContext, TERRAIN_CONFIG},
    input::InputManager,
    state::{GameState, StateKind, Transition},
    states::{HELP_BUTTON, MENU_BUTTON, transition_for},
};

const BUTTONS: [&str; 2] = ["PlayMenu", "PlayHelp"];

const SKY: wgpu::Color = wgpu::Color {
    r: 0.02,
    g: 0.02,
    b: 0.04,
    a: 1.0,
};

pub struct PlayState {
    terrain: Terrain,
    mesh: TerrainMesh,
    player: Player,
    projection: Projection,
    buttons: Vec<Button>,
}

impl PlayState {
    pub fn new(ctx: &mut GameContext) -> anyhow::Result<Self> {
        let terrain_block = ctx.config_block(TERRAIN_CONFIG, "Terrain")?;
        let terrain = Terrain::from_block(&terrain_block, &ctx.asset_root)?;
        let textures = ctx.load_texture_pack(&TextureFiles::from_block(&terrain_block)?)?;
        let mesh = TerrainMesh::new(
            &ctx.gpu.device,
            &ctx.gpu.terrain_texture_layout,
            &terrain,
            textures,
        );

        let player_settings = match ctx.config_block(TERRAIN_CONFIG, "Player") {
            Ok(block) => PlayerSettings::from_block(&block)?,
            Err(_) => PlayerSettings::default(),
        };
        let player = Player::new(player_settings, &terrain);

        let [width, height] = ctx.window_size();
        let far = terrain.bounds().size().x.max(terrain.bounds().size().z) * 2.0;
        let projection = Projection::new(width, height, cgmath::Deg(60.0), 0.1, far.max(100.0));

        info!(
            "Player starts at {:?}, goal at {:?}",
            player.position(),
            player.goal()
        );
        Ok(Self {
            terrain,
            mesh,
            player,
            projection,
            buttons: ctx.load_buttons(&BUTTONS)?,
        })
    }
}

/// Walking input in `[-1, 1]`: (forward, strafe).
fn walk_input(input: &mut InputManager) -> Vector2<f32> {
    let mut forward = 0.0;
    let mut strafe = 0.0;
    if input.is_key_pressed(KeyCode::KeyW, true) || input.is_key_pressed(KeyCode::ArrowUp, true) {
        forward += 1.0;
    }
    if input.is_key_pressed(KeyCode::KeyS, true) || input.is_key_pressed(KeyCode::ArrowDown, true) {
        forward -= 1.0;
    }
    if input.is_key_pressed(KeyCode::KeyD, true) || input.is_key_pressed(KeyCode::ArrowRight, true) {
        strafe += 1.0;
    }
    if input.is_key_pressed(KeyCode::KeyA, true) || input.is_key_pressed(KeyCode::ArrowLeft, true) {
        strafe -= 1.0;
    }
    let stick = input.left_axis();
    let pad = input.directional_pad();
    Vector2::new(
        (forward - stick.y - pad.y as f32).clamp(-1.0, 1.0),
        (strafe + stick.x + pad.x as f32).clamp(-1.0, 1.0),
    )
}

impl GameState<GameContext> for PlayState {
    fn update(&mut self, ctx: &mut GameContext) -> Transition {
        let input = &mut ctx.input;
        if input.is_key_pressed(KeyCode::Escape, false)
            || input.is_controller_button_pressed(MENU_BUTTON, false)
        {
            return Transition::Permanent(StateKind::Menu);
        }
        if input.is_key_pressed(KeyCode::F1, false)
            || input.is_controller_button_pressed(HELP_BUTTON, false)
        {
            return Transition::Temporary(StateKind::Guide);
        }
        let window = ctx.window_size();
        if let Some(action) = clicked_action(&self.buttons, &mut ctx.input, window) {
            match transition_for(action) {
                Some(transition) => return transition,
                None => warn!("Unknown play action: {}", action),
            }
        }

        let input = &mut ctx.input;
        let dt = ctx.timer.delta_seconds();
        let walk = walk_input(input);
        self.player.walk(&self.terrain, walk.x, walk.y, dt);

        if input.is_mouse_button_pressed(MouseButton::Right, true) {
            self.player.look_by_mouse(input.mouse_motion());
        }
        let mut turn = input.right_axis();
        if input.is_key_pressed(KeyCode::KeyQ, true) {
            turn.x -= 1.0;
        }
        if input.is_key_pressed(KeyCode::KeyE, true) {
            turn.x += 1.0;
        }
        self.player.turn(turn.x, -turn.y, dt);

        let [width, height] = window;
        self.projection.resize(width, height);

        if self.player.reached_goal() {
            info!("Goal reached at {:?}", self.player.position());
            return Transition::Permanent(StateKind::End);
        }
        Transition::None
    }

    fn render(&self, ctx: &mut GameContext) {
        let mut uniform = CameraUniform::new();
        uniform.update_view_proj(self.player.camera(), &self.projection);
        ctx.frame.set_camera(uniform);
        ctx.frame.set_clear_color(SKY);
        ctx.frame.push(self.mesh.render());
        self.buttons
            .iter()
            .for_each(|button| ctx.frame.push(button.render()));
    }
}
