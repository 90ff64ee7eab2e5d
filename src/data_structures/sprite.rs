//! Textured screen quads and the widgets built on them.
//!
//! Widgets are described by config blocks:
//!
//! ```text
//! TYPE >> MenuPlay
//! tag:Play
//! sprite:textures/button_play.png
//! transform.x:540
//! transform.y:300
//! width:200
//! height:60
//! action:play
//! ----------END----------
//! ```
//!
//! Positions are in the virtual screen resolution
//! ([`VIRTUAL_SCREEN`](crate::pipelines::gui::VIRTUAL_SCREEN)), origin at the
//! top left, and are stretched to the window.

use std::rc::Rc;

use wgpu::util::DeviceExt;
use winit::event::MouseButton;

use crate::{
    data_structures::texture::Texture,
    input::{Bounds2D, InputManager},
    pipelines::gui::{QUAD_INDICES, VIRTUAL_SCREEN, Vertex},
    render::{Flat, Render},
    resources::{tags::TagBlock, texture::texture_bind_group},
};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Rect {
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// The whole virtual screen.
    pub fn screen() -> Self {
        Self::new(0.0, 0.0, VIRTUAL_SCREEN[0], VIRTUAL_SCREEN[1])
    }

    /// Reads `transform.x`, `transform.y`, `width` and `height`. A missing
    /// position defaults to the top left, a missing size to the whole screen.
    pub fn from_block(block: &TagBlock) -> anyhow::Result<Self> {
        Ok(Self::new(
            block.get_f32_or("transform.x", 0.0)?,
            block.get_f32_or("transform.y", 0.0)?,
            block.get_f32_or("width", VIRTUAL_SCREEN[0])?,
            block.get_f32_or("height", VIRTUAL_SCREEN[1])?,
        ))
    }

    /// Area covered in a window of `window` physical pixels.
    pub fn bounds_in(&self, window: [u32; 2]) -> Bounds2D {
        let sx = window[0] as f32 / VIRTUAL_SCREEN[0];
        let sy = window[1] as f32 / VIRTUAL_SCREEN[1];
        Bounds2D::new(self.x * sx, self.y * sy, self.width * sx, self.height * sy)
    }

    /// Corners in clip space: top left, bottom left, top right, bottom right.
    pub fn quad(&self) -> [Vertex; 4] {
        let to_clip = |x: f32, y: f32| {
            [
                x / VIRTUAL_SCREEN[0] * 2.0 - 1.0,
                1.0 - y / VIRTUAL_SCREEN[1] * 2.0,
            ]
        };
        let (left, top) = (self.x, self.y);
        let (right, bottom) = (self.x + self.width, self.y + self.height);
        [
            Vertex {
                position: to_clip(left, top),
                tex_coords: [0.0, 0.0],
            },
            Vertex {
                position: to_clip(left, bottom),
                tex_coords: [0.0, 1.0],
            },
            Vertex {
                position: to_clip(right, top),
                tex_coords: [1.0, 0.0],
            },
            Vertex {
                position: to_clip(right, bottom),
                tex_coords: [1.0, 1.0],
            },
        ]
    }
}

/// The CPU side of a widget: what it shows and where.
#[derive(Debug, Clone, PartialEq)]
pub struct WidgetDesc {
    pub tag: String,
    pub sprite: String,
    pub rect: Rect,
    /// Only buttons carry an action.
    pub action: Option<String>,
}

impl WidgetDesc {
    /// Reads `tag`, `sprite`, the [`Rect`] keys and the optional `action`.
    /// The tag defaults to the block name.
    pub fn from_block(block: &TagBlock) -> anyhow::Result<Self> {
        let tag = if block.contains("tag") {
            block.get("tag")?.to_string()
        } else {
            block.name().to_string()
        };
        let action = if block.contains("action") {
            Some(block.get("action")?.to_string())
        } else {
            None
        };
        Ok(Self {
            tag,
            sprite: block.get("sprite")?.to_string(),
            rect: Rect::from_block(block)?,
            action,
        })
    }

    pub fn is_hovered(&self, input: &InputManager, window: [u32; 2]) -> bool {
        input.is_mouse_colliding(&self.rect.bounds_in(window))
    }

    /// A left click on the widget. Holding the button clicks only once.
    pub fn is_clicked(&self, input: &mut InputManager, window: [u32; 2]) -> bool {
        self.is_hovered(input, window) && input.is_mouse_button_pressed(MouseButton::Left, false)
    }
}

/// A textured quad with its own GPU buffers. The texture is shared through the
/// texture cache.
#[derive(Debug)]
pub struct Sprite {
    rect: Rect,
    texture: Rc<Texture>,
    bind_group: wgpu::BindGroup,
    vertex_buffer: wgpu::Buffer,
    index_buffer: wgpu::Buffer,
}

impl Sprite {
    pub fn new(
        device: &wgpu::Device,
        layout: &wgpu::BindGroupLayout,
        texture: Rc<Texture>,
        rect: Rect,
        label: &str,
    ) -> Self {
        let bind_group = texture_bind_group(device, layout, &texture, label);
        let vertex_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(&format!("{} Vertex Buffer", label)),
            contents: bytemuck::cast_slice(&rect.quad()),
            usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
        });
        let index_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(&format!("{} Index Buffer", label)),
            contents: bytemuck::cast_slice(&QUAD_INDICES),
            usage: wgpu::BufferUsages::INDEX,
        });
        Self {
            rect,
            texture,
            bind_group,
            vertex_buffer,
            index_buffer,
        }
    }

    pub fn rect(&self) -> Rect {
        self.rect
    }

    pub fn texture(&self) -> &Rc<Texture> {
        &self.texture
    }

    /// Moves the quad. Only the vertex buffer is rewritten.
    pub fn set_rect(&mut self, queue: &wgpu::Queue, rect: Rect) {
        self.rect = rect;
        queue.write_buffer(&self.vertex_buffer, 0, bytemuck::cast_slice(&rect.quad()));
    }

    pub fn render(&self) -> Render {
        Render::GUI(Flat {
            vertex: self.vertex_buffer.clone(),
            index: self.index_buffer.clone(),
            group: self.bind_group.clone(),
            amount: QUAD_INDICES.len() as u32,
        })
    }
}

/// A full-screen or positioned image without interaction.
#[derive(Debug)]
pub struct Background {
    pub desc: WidgetDesc,
    pub sprite: Sprite,
}

impl Background {
    pub fn tag(&self) -> &str {
        &self.desc.tag
    }

    pub fn render(&self) -> Render {
        self.sprite.render()
    }
}

/// A clickable image that names the action it triggers.
#[derive(Debug)]
pub struct Button {
    pub desc: WidgetDesc,
    pub sprite: Sprite,
}

impl Button {
    pub fn tag(&self) -> &str {
        &self.desc.tag
    }

    pub fn action(&self) -> Option<&str> {
        self.desc.action.as_deref()
    }

    pub fn is_hovered(&self, input: &InputManager, window: [u32; 2]) -> bool {
        self.desc.is_hovered(input, window)
    }

    pub fn is_clicked(&self, input: &mut InputManager, window: [u32; 2]) -> bool {
        self.desc.is_clicked(input, window)
    }

    pub fn render(&self) -> Render {
        self.sprite.render()
    }
}

/// The action of the first button clicked this frame.
pub fn clicked_action<'a>(
    buttons: &'a [Button],
    input: &mut InputManager,
    window: [u32; 2],
) -> Option<&'a str> {
    buttons
        .iter()
        .find(|button| button.is_hovered(input, window))
        .filter(|_| input.is_mouse_button_pressed(MouseButton::Left, false))
        .and_then(|button| button.action())
}
