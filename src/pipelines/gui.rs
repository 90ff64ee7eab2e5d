use crate::{data_structures::texture::Texture, pipelines::Primitive};

/// Widgets are placed in this virtual resolution and stretched to the window.
pub const VIRTUAL_SCREEN: [f32; 2] = [1280.0, 720.0];

/// Two counter-clockwise triangles over the four corners of a quad.
pub const QUAD_INDICES: [u16; 6] = [0, 1, 2, 2, 1, 3];

#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct Vertex {
    pub position: [f32; 2],
    pub tex_coords: [f32; 2],
}

impl Vertex {
    pub fn desc() -> wgpu::VertexBufferLayout<'static> {
        use std::mem;
        wgpu::VertexBufferLayout {
            array_stride: mem::size_of::<Vertex>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &[
                wgpu::VertexAttribute {
                    offset: 0,
                    shader_location: 0,
                    format: wgpu::VertexFormat::Float32x2,
                },
                wgpu::VertexAttribute {
                    offset: mem::size_of::<[f32; 2]>() as wgpu::BufferAddress,
                    shader_location: 1,
                    format: wgpu::VertexFormat::Float32x2,
                },
            ],
        }
    }
}

pub fn mk_gui_pipeline(
    device: &wgpu::Device,
    config: &wgpu::SurfaceConfiguration,
    texture_bind_group_layout: &wgpu::BindGroupLayout,
) -> wgpu::RenderPipeline {
    let layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
        label: Some("GUI Render Pipeline Layout"),
        bind_group_layouts: &[texture_bind_group_layout],
        push_constant_ranges: &[],
    });

    let shader = wgpu::ShaderModuleDescriptor {
        label: Some("GUI Shader"),
        source: wgpu::ShaderSource::Wgsl(include_str!("gui_shader.wgsl").into()),
    };

    super::mk_render_pipeline(
        device,
        "GUI Render Pipeline",
        &layout,
        config.format,
        Some(wgpu::BlendState::ALPHA_BLENDING),
        Some((Texture::DEPTH_FORMAT, false)),
        Primitive {
            topology: wgpu::PrimitiveTopology::TriangleList,
            strip_index_format: None,
            cull_mode: None,
        },
        &[Vertex::desc()],
        shader,
    )
}
