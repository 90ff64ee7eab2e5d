//! Keyboard, mouse and gamepad state.
//!
//! [`InputManager`] is fed with winit window and device events as they
//! arrive and answers queries from the game states once per frame. Every
//! button query takes a `repeat` flag: with `repeat == true` a held button
//! reports `true` on every frame, with `repeat == false` it reports `true`
//! once per press and is then locked until released.
//!
//! Gamepads are fed through [`GamepadEvent`]s so any controller backend can
//! drive them. Buttons are addressed by the names of a mapping block:
//!
//! ```text
//! TYPE >> MappedButtons
//! confirm:0
//! back:1
//! menu:7
//! ----------END----------
//! ```

use std::collections::HashMap;

use cgmath::Vector2;
use log::{debug, warn};
use winit::{
    event::{DeviceEvent, ElementState, MouseButton, MouseScrollDelta, WindowEvent},
    keyboard::{KeyCode, PhysicalKey},
};

use crate::resources::tags::TagBlock;

/// Raw axis values closer to rest than this are reported as zero.
pub const AXIS_DEAD_ZONE: i16 = 8000;
pub const AXIS_MAX: f32 = 32767.0;

/// Pixels per line for wheels that report whole lines.
const PIXELS_PER_LINE: f32 = 20.0;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
struct ButtonState {
    down: bool,
    locked: bool,
}

impl ButtonState {
    fn set(&mut self, down: bool) {
        self.down = down;
        if !down {
            self.locked = false;
        }
    }

    fn query(&mut self, repeat: bool) -> bool {
        if !self.down {
            return false;
        }
        if repeat {
            return true;
        }
        if self.locked {
            return false;
        }
        self.locked = true;
        true
    }
}

/// Axis-aligned rectangle in window pixels, origin at the top left.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bounds2D {
    pub min: Vector2<f32>,
    pub max: Vector2<f32>,
}

impl Bounds2D {
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            min: Vector2::new(x, y),
            max: Vector2::new(x + width, y + height),
        }
    }

    pub fn contains(&self, point: Vector2<f32>) -> bool {
        point.x >= self.min.x && point.x <= self.max.x && point.y >= self.min.y && point.y <= self.max.y
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GamepadAxis {
    LeftX,
    LeftY,
    RightX,
    RightY,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GamepadEvent {
    Connected,
    Disconnected,
    ButtonDown(u8),
    ButtonUp(u8),
    /// Raw stick position, `-32768..=32767`.
    Axis(GamepadAxis, i16),
    /// D-pad direction, each component in `-1..=1`.
    DirectionalPad(i8, i8),
}

#[derive(Debug)]
pub struct InputManager {
    keys: HashMap<KeyCode, ButtonState>,
    mouse_buttons: HashMap<MouseButton, ButtonState>,
    mouse_position: Vector2<f32>,
    mouse_motion: Vector2<f32>,
    mouse_wheel: Vector2<f32>,

    gamepad_connected: bool,
    gamepad_buttons: HashMap<u8, ButtonState>,
    mapped_buttons: HashMap<String, u8>,
    axes: HashMap<GamepadAxis, i16>,
    directional_pad: Vector2<i8>,

    window_closed: bool,
}

impl InputManager {
    pub fn new() -> Self {
        Self {
            keys: HashMap::new(),
            mouse_buttons: HashMap::new(),
            mouse_position: Vector2::new(0.0, 0.0),
            mouse_motion: Vector2::new(0.0, 0.0),
            mouse_wheel: Vector2::new(0.0, 0.0),
            gamepad_connected: false,
            gamepad_buttons: HashMap::new(),
            mapped_buttons: HashMap::new(),
            axes: HashMap::new(),
            directional_pad: Vector2::new(0, 0),
            window_closed: false,
        }
    }

    //--- Event intake -----------------------------------------------------

    pub fn handle_window_event(&mut self, event: &WindowEvent) {
        match event {
            WindowEvent::CloseRequested => self.window_closed = true,
            WindowEvent::KeyboardInput { event, .. } => {
                if let PhysicalKey::Code(code) = event.physical_key {
                    self.set_key(code, event.state == ElementState::Pressed);
                }
            }
            WindowEvent::MouseInput { state, button, .. } => {
                self.set_mouse_button(*button, *state == ElementState::Pressed);
            }
            WindowEvent::CursorMoved { position, .. } => {
                self.set_mouse_position(position.x as f32, position.y as f32);
            }
            WindowEvent::MouseWheel { delta, .. } => match delta {
                MouseScrollDelta::LineDelta(x, y) => {
                    self.mouse_wheel += Vector2::new(*x, *y) * PIXELS_PER_LINE;
                }
                MouseScrollDelta::PixelDelta(position) => {
                    self.mouse_wheel += Vector2::new(position.x as f32, position.y as f32);
                }
            },
            WindowEvent::Focused(false) => self.release_all(),
            _ => {}
        }
    }

    pub fn handle_device_event(&mut self, event: &DeviceEvent) {
        if let DeviceEvent::MouseMotion { delta } = event {
            self.mouse_motion += Vector2::new(delta.0 as f32, delta.1 as f32);
        }
    }

    pub fn handle_gamepad_event(&mut self, event: GamepadEvent) {
        match event {
            GamepadEvent::Connected => {
                debug!("Gamepad connected");
                self.gamepad_connected = true;
            }
            GamepadEvent::Disconnected => {
                debug!("Gamepad disconnected");
                self.gamepad_connected = false;
                self.gamepad_buttons.clear();
                self.axes.clear();
                self.directional_pad = Vector2::new(0, 0);
            }
            GamepadEvent::ButtonDown(button) => {
                self.gamepad_buttons.entry(button).or_default().set(true)
            }
            GamepadEvent::ButtonUp(button) => {
                self.gamepad_buttons.entry(button).or_default().set(false)
            }
            GamepadEvent::Axis(axis, value) => {
                self.axes.insert(axis, value);
            }
            GamepadEvent::DirectionalPad(x, y) => {
                self.directional_pad = Vector2::new(x.clamp(-1, 1), y.clamp(-1, 1));
            }
        }
    }

    pub fn set_key(&mut self, key: KeyCode, down: bool) {
        self.keys.entry(key).or_default().set(down);
    }

    pub fn set_mouse_button(&mut self, button: MouseButton, down: bool) {
        self.mouse_buttons.entry(button).or_default().set(down);
    }

    pub fn set_mouse_position(&mut self, x: f32, y: f32) {
        self.mouse_position = Vector2::new(x, y);
    }

    /// Clears the per-frame accumulators (mouse motion and wheel).
    pub fn end_frame(&mut self) {
        self.mouse_motion = Vector2::new(0.0, 0.0);
        self.mouse_wheel = Vector2::new(0.0, 0.0);
    }

    fn release_all(&mut self) {
        self.keys.values_mut().for_each(|state| state.set(false));
        self.mouse_buttons
            .values_mut()
            .for_each(|state| state.set(false));
    }

    /// Loads `name:index` pairs from a mapping block. Entries whose index is
    /// not a button number are skipped with a warning.
    pub fn load_mapped_buttons(&mut self, block: &TagBlock) {
        for (name, value) in block.entries() {
            match value.parse::<u8>() {
                Ok(index) => {
                    self.mapped_buttons.insert(name.to_string(), index);
                }
                Err(_) => warn!("Mapped button {} has an invalid index {:?}", name, value),
            }
        }
        debug!("{} gamepad buttons mapped", self.mapped_buttons.len());
    }

    //--- Queries ----------------------------------------------------------

    pub fn is_key_pressed(&mut self, key: KeyCode, repeat: bool) -> bool {
        self.keys
            .get_mut(&key)
            .is_some_and(|state| state.query(repeat))
    }

    pub fn is_mouse_button_pressed(&mut self, button: MouseButton, repeat: bool) -> bool {
        self.mouse_buttons
            .get_mut(&button)
            .is_some_and(|state| state.query(repeat))
    }

    /// Queries a gamepad button by its mapped name. Unknown names are never
    /// pressed.
    pub fn is_controller_button_pressed(&mut self, name: &str, repeat: bool) -> bool {
        let Some(index) = self.mapped_buttons.get(name) else {
            return false;
        };
        self.gamepad_buttons
            .get_mut(index)
            .is_some_and(|state| state.query(repeat))
    }

    pub fn is_mouse_colliding(&self, bounds: &Bounds2D) -> bool {
        bounds.contains(self.mouse_position)
    }

    pub fn mouse_position(&self) -> Vector2<f32> {
        self.mouse_position
    }

    /// Mouse movement accumulated since the last [`end_frame`](Self::end_frame).
    pub fn mouse_motion(&self) -> Vector2<f32> {
        self.mouse_motion
    }

    pub fn mouse_wheel(&self) -> Vector2<f32> {
        self.mouse_wheel
    }

    pub fn is_gamepad_connected(&self) -> bool {
        self.gamepad_connected
    }

    /// Normalized axis value in `[-1, 1]`, zero inside the dead zone.
    pub fn axis(&self, axis: GamepadAxis) -> f32 {
        let raw = self.axes.get(&axis).copied().unwrap_or(0);
        if raw.unsigned_abs() <= AXIS_DEAD_ZONE as u16 {
            0.0
        } else {
            (raw as f32 / AXIS_MAX).clamp(-1.0, 1.0)
        }
    }

    pub fn left_axis(&self) -> Vector2<f32> {
        Vector2::new(self.axis(GamepadAxis::LeftX), self.axis(GamepadAxis::LeftY))
    }

    pub fn right_axis(&self) -> Vector2<f32> {
        Vector2::new(self.axis(GamepadAxis::RightX), self.axis(GamepadAxis::RightY))
    }

    pub fn directional_pad(&self) -> Vector2<i8> {
        self.directional_pad
    }

    pub fn is_window_closed(&self) -> bool {
        self.window_closed
    }

    pub fn set_window_closed(&mut self, closed: bool) {
        self.window_closed = closed;
    }
}

impl Default for InputManager {
    fn default() -> Self {
        Self::new()
    }
}
