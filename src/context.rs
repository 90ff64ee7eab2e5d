use std::sync::Arc;

use anyhow::Context as _;
use winit::window::Window;

use crate::{
    data_structures::texture,
    game::Settings,
    pipelines::{gui::mk_gui_pipeline, terrain::{CameraResources, mk_terrain_pipeline}},
    resources::texture::{terrain_texture_layout, texture_layout},
};

/// The window and everything the GPU needs to draw into it.
#[derive(Debug)]
pub struct Context {
    pub(crate) window: Arc<Window>,
    pub(crate) depth_texture: texture::Texture,
    pub surface: wgpu::Surface<'static>,
    pub device: wgpu::Device,
    pub queue: wgpu::Queue,
    pub config: wgpu::SurfaceConfiguration,
    pub texture_layout: wgpu::BindGroupLayout,
    pub terrain_texture_layout: wgpu::BindGroupLayout,
    pub camera: CameraResources,
    pub gui_pipeline: wgpu::RenderPipeline,
    pub terrain_pipeline: wgpu::RenderPipeline,
    pub(crate) is_surface_configured: bool,
}

impl Context {
    pub async fn new(window: Arc<Window>, settings: &Settings) -> anyhow::Result<Self> {
        let size = window.inner_size();

        log::info!("WGPU setup");
        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::PRIMARY,
            ..Default::default()
        });

        let surface = instance
            .create_surface(window.clone())
            .context("Failed to create a surface for the window")?;

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::default(),
                compatible_surface: Some(&surface),
                force_fallback_adapter: false,
            })
            .await
            .context("No graphics adapter can present to the window")?;
        log::info!("Adapter: {}", adapter.get_info().name);

        let (device, queue) = adapter
            .request_device(&wgpu::DeviceDescriptor {
                label: None,
                required_features: wgpu::Features::empty(),
                // The core profile asks for the full default limits; the
                // compatibility profile settles for what GL ES 3 offers.
                required_limits: if settings.core_profile {
                    wgpu::Limits::default()
                } else {
                    wgpu::Limits::downlevel_webgl2_defaults()
                },
                memory_hints: Default::default(),
                ..Default::default()
            })
            .await
            .context("Failed to create the graphics device")?;

        #[cfg(debug_assertions)]
        device.on_uncaptured_error(Arc::new(|error: wgpu::Error| {
            log::error!("Graphics API error: {}", error);
        }));

        let surface_caps = surface.get_capabilities(&adapter);
        // Shaders assume an sRGB surface.
        let surface_format = surface_caps
            .formats
            .iter()
            .copied()
            .find(|f| f.is_srgb())
            .or_else(|| surface_caps.formats.first().copied())
            .context("The surface reports no texture formats")?;
        let present_mode = if settings.vsync {
            wgpu::PresentMode::AutoVsync
        } else {
            wgpu::PresentMode::AutoNoVsync
        };
        let alpha_mode = surface_caps
            .alpha_modes
            .first()
            .copied()
            .unwrap_or(wgpu::CompositeAlphaMode::Auto);
        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format: surface_format,
            width: size.width.max(1),
            height: size.height.max(1),
            present_mode,
            alpha_mode,
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };

        let texture_layout = texture_layout(&device);
        let terrain_texture_layout = terrain_texture_layout(&device);
        let camera = CameraResources::new(&device);
        let gui_pipeline = mk_gui_pipeline(&device, &config, &texture_layout);
        let terrain_pipeline = mk_terrain_pipeline(
            &device,
            &config,
            &terrain_texture_layout,
            &camera.bind_group_layout,
        );

        let depth_texture = texture::Texture::create_depth_texture(
            &device,
            [config.width, config.height],
            "depth_texture",
        );

        log::info!(
            "Surface {}x{} ({:?}, {:?})",
            config.width,
            config.height,
            config.format,
            config.present_mode
        );

        Ok(Self {
            window,
            depth_texture,
            surface,
            device,
            queue,
            config,
            texture_layout,
            terrain_texture_layout,
            camera,
            gui_pipeline,
            terrain_pipeline,
            is_surface_configured: false,
        })
    }

    pub fn window(&self) -> &Window {
        &self.window
    }

    /// Current surface size in physical pixels.
    pub fn size(&self) -> [u32; 2] {
        [self.config.width, self.config.height]
    }

    pub fn resize(&mut self, width: u32, height: u32) {
        if width == 0 || height == 0 {
            // Minimized; keep the old configuration until the window returns.
            self.is_surface_configured = false;
            return;
        }
        self.config.width = width;
        self.config.height = height;
        self.configure_surface();
    }

    pub(crate) fn configure_surface(&mut self) {
        self.surface.configure(&self.device, &self.config);
        self.depth_texture = texture::Texture::create_depth_texture(
            &self.device,
            [self.config.width, self.config.height],
            "depth_texture",
        );
        self.is_surface_configured = true;
    }
}
