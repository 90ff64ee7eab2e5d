//! flashlight
//!
//! A small state-machine driven 3D game engine. Screens are [`state::GameState`]s
//! owned by a [`fsm::FiniteStateMachine`] that replaces them (permanent
//! transitions) or stacks them as overlays (temporary transitions). The play
//! screen walks a camera over terrain generated from a raster heightmap.
//!
//! High-level modules
//! - `state`/`fsm`: the game state capability and the machine that owns states
//! - `game`: window, frame loop and the context passed to every state
//! - `data_structures`: heightmap, terrain, textures, sprites and the player
//! - `resources`: tag-delimited config files, asset loading and the texture cache
//! - `input`: keyboard, mouse and gamepad state
//! - `timer`: delta time, fps and frame budget
//! - `camera`: first-person camera and its uniform
//! - `pipelines`: GUI and terrain render pipelines
//! - `render`: draw commands queued by states for the frame's render pass
//! - `states`: the concrete screens

pub mod camera;
pub mod context;
pub mod data_structures;
pub mod fsm;
pub mod game;
pub mod input;
pub mod pipelines;
pub mod render;
pub mod resources;
pub mod state;
pub mod states;
pub mod timer;

pub use game::{GameContext, GameManager, Settings, run};
