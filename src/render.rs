//! Render composition.
//!
//! States do not own a render pass. During `render` they push [`Render`]
//! commands into the frame's [`RenderQueue`], and the game manager drains the
//! queue into a single render pass: terrain first with depth testing, then the
//! GUI quads on top in submission order.
//!
//! Commands hold clones of the GPU handles, which are reference counted by
//! wgpu, so a state can be dropped while its last frame is still queued.

use crate::camera::CameraUniform;

/// Vertex and index buffers with the texture bind group they are drawn with.
#[derive(Debug, Clone)]
pub struct Flat {
    pub vertex: wgpu::Buffer,
    pub index: wgpu::Buffer,
    pub group: wgpu::BindGroup,
    pub amount: u32,
}

/// Specifies how a piece of geometry is drawn.
///
/// - `None` draws nothing
/// - `GUI(Flat)` draws a textured quad with the GUI pipeline (u16 indices)
/// - `Terrain(Flat)` draws a terrain strip with the terrain pipeline (u32
///   indices with strip restart)
/// - `Composed(Vec<Render>)` draws its parts in order
#[derive(Debug, Clone)]
pub enum Render {
    None,
    GUI(Flat),
    Terrain(Flat),
    Composed(Vec<Render>),
}

impl Render {
    fn flatten_into(self, terrain: &mut Vec<Flat>, gui: &mut Vec<Flat>) {
        match self {
            Render::None => {}
            Render::GUI(flat) => gui.push(flat),
            Render::Terrain(flat) => terrain.push(flat),
            Render::Composed(parts) => parts
                .into_iter()
                .for_each(|part| part.flatten_into(terrain, gui)),
        }
    }
}

/// Draw work collected for one frame.
#[derive(Debug)]
pub struct RenderQueue {
    clear_color: wgpu::Color,
    camera: Option<CameraUniform>,
    terrain: Vec<Flat>,
    gui: Vec<Flat>,
}

impl RenderQueue {
    pub fn new() -> Self {
        Self {
            clear_color: wgpu::Color::BLACK,
            camera: None,
            terrain: Vec::new(),
            gui: Vec::new(),
        }
    }

    pub fn push(&mut self, render: Render) {
        render.flatten_into(&mut self.terrain, &mut self.gui);
    }

    /// Camera used for the terrain this frame. The last state to set it wins.
    pub fn set_camera(&mut self, camera: CameraUniform) {
        self.camera = Some(camera);
    }

    pub fn camera(&self) -> Option<&CameraUniform> {
        self.camera.as_ref()
    }

    pub fn set_clear_color(&mut self, color: wgpu::Color) {
        self.clear_color = color;
    }

    pub fn clear_color(&self) -> wgpu::Color {
        self.clear_color
    }

    pub fn terrain(&self) -> &[Flat] {
        &self.terrain
    }

    pub fn gui(&self) -> &[Flat] {
        &self.gui
    }

    pub fn is_empty(&self) -> bool {
        self.terrain.is_empty() && self.gui.is_empty()
    }

    /// Forgets everything queued; called at the start of every frame.
    pub fn reset(&mut self) {
        self.clear_color = wgpu::Color::BLACK;
        self.camera = None;
        self.terrain.clear();
        self.gui.clear();
    }
}

impl Default for RenderQueue {
    fn default() -> Self {
        Self::new()
    }
}
