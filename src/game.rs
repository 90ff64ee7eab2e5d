//! The game manager: window, frame loop and the context every state works
//! with.
//!
//! Each frame runs poll input -> update active states -> apply transitions ->
//! render active states -> present. The loop ends once the state machine is
//! empty or the window is closed.

use std::{path::PathBuf, rc::Rc, sync::Arc, time::Duration};

use log::{error, info, warn};
use winit::{
    application::ApplicationHandler,
    event::{DeviceEvent, DeviceId, WindowEvent},
    event_loop::{ActiveEventLoop, ControlFlow, EventLoop},
    window::{Fullscreen, Window, WindowId},
};

use crate::{
    context::Context,
    data_structures::{
        sprite::{Background, Button, Sprite, WidgetDesc},
        terrain::{TextureFiles, TexturePack},
        texture::Texture,
    },
    fsm::FiniteStateMachine,
    input::InputManager,
    render::RenderQueue,
    resources::{
        DEFAULT_ASSET_ROOT, asset_path, config_path,
        tags::{TagBlock, TagFile},
        texture::{TextureCache, load_texture},
    },
    state::{StateKind, StateTable},
    states,
    timer::FrameTimer,
};

/// Widget blocks of every screen.
pub const INTERFACE_CONFIG: &str = "interfaceObjects.config";
/// Terrain and player blocks of the play screen.
pub const TERRAIN_CONFIG: &str = "terrain.config";
/// Cache tag of the black texture standing in for a missing blend map.
const BLANK_TEXTURE: &str = "blank";
/// Gamepad button names.
pub const INPUT_CONFIG: &str = "mappedButtons.config";
pub const MAPPED_BUTTONS_BLOCK: &str = "MappedButtons";

/// How long the loop waits for events before running the next frame.
const TICK: Duration = Duration::from_millis(1);

/// Window and graphics options the game starts with.
#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub title: String,
    pub fullscreen: bool,
    /// Request the full default device limits instead of the GL ES 3 subset.
    pub core_profile: bool,
    pub vsync: bool,
    pub asset_root: PathBuf,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            title: "Flashlight".to_string(),
            fullscreen: false,
            core_profile: true,
            vsync: true,
            asset_root: PathBuf::from(DEFAULT_ASSET_ROOT),
        }
    }
}

/// Everything a state may use during construction, update and render.
pub struct GameContext {
    pub gpu: Context,
    pub input: InputManager,
    pub timer: FrameTimer,
    pub textures: TextureCache<Texture>,
    pub frame: RenderQueue,
    pub asset_root: PathBuf,
}

impl GameContext {
    pub fn new(gpu: Context, asset_root: PathBuf) -> Self {
        let mut ctx = Self {
            gpu,
            input: InputManager::new(),
            timer: FrameTimer::new(),
            textures: TextureCache::new(),
            frame: RenderQueue::new(),
            asset_root,
        };
        match ctx.config_block(INPUT_CONFIG, MAPPED_BUTTONS_BLOCK) {
            Ok(block) => ctx.input.load_mapped_buttons(&block),
            Err(e) => warn!("Gamepad buttons are not mapped: {:#}", e),
        }
        ctx
    }

    pub fn window_size(&self) -> [u32; 2] {
        self.gpu.size()
    }

    /// Reads block `name` from the config file `file` under the config directory.
    pub fn config_block(&self, file: &str, name: &str) -> anyhow::Result<TagBlock> {
        let file = TagFile::open(config_path(&self.asset_root, file))?;
        Ok(file.block(name)?)
    }

    /// Loads the image `file` once and shares it afterwards.
    pub fn load_texture(&mut self, file: &str) -> anyhow::Result<Rc<Texture>> {
        let path = asset_path(&self.asset_root, file);
        let gpu = &self.gpu;
        self.textures
            .get_or_load(file, || load_texture(&path, &gpu.device, &gpu.queue))
    }

    /// Loads a terrain texture pack, sharing images with every other user.
    pub fn load_texture_pack(&mut self, files: &TextureFiles) -> anyhow::Result<TexturePack> {
        let gpu = &self.gpu;
        let blank = self.textures.get_or_load(BLANK_TEXTURE, || {
            let pixel = image::RgbaImage::from_pixel(1, 1, image::Rgba([0, 0, 0, 255]));
            Ok(Texture::from_image(
                &gpu.device,
                &gpu.queue,
                &image::DynamicImage::ImageRgba8(pixel),
                Some(BLANK_TEXTURE),
            ))
        })?;
        TexturePack::load(files, blank, |file| self.load_texture(file))
    }

    fn load_sprite(&mut self, desc: &WidgetDesc) -> anyhow::Result<Sprite> {
        let texture = self.load_texture(&desc.sprite)?;
        Ok(Sprite::new(
            &self.gpu.device,
            &self.gpu.texture_layout,
            texture,
            desc.rect,
            &desc.tag,
        ))
    }

    pub fn load_background(&mut self, block: &str) -> anyhow::Result<Background> {
        let desc = WidgetDesc::from_block(&self.config_block(INTERFACE_CONFIG, block)?)?;
        let sprite = self.load_sprite(&desc)?;
        Ok(Background { desc, sprite })
    }

    pub fn load_button(&mut self, block: &str) -> anyhow::Result<Button> {
        let desc = WidgetDesc::from_block(&self.config_block(INTERFACE_CONFIG, block)?)?;
        let sprite = self.load_sprite(&desc)?;
        Ok(Button { desc, sprite })
    }

    pub fn load_buttons(&mut self, blocks: &[&str]) -> anyhow::Result<Vec<Button>> {
        blocks.iter().map(|block| self.load_button(block)).collect()
    }
}

/// Owns the state machine and drives it from the winit event loop.
pub struct GameManager {
    settings: Settings,
    machine: FiniteStateMachine<GameContext>,
    context: Option<GameContext>,
    error: Option<anyhow::Error>,
}

impl GameManager {
    pub fn new(settings: Settings, table: StateTable<GameContext>) -> Self {
        Self {
            settings,
            machine: FiniteStateMachine::new(table),
            context: None,
            error: None,
        }
    }

    fn start(&mut self, event_loop: &ActiveEventLoop) -> anyhow::Result<GameContext> {
        let fullscreen = self
            .settings
            .fullscreen
            .then_some(Fullscreen::Borderless(None));
        let attributes = Window::default_attributes()
            .with_title(self.settings.title.clone())
            .with_fullscreen(fullscreen);
        let window = Arc::new(event_loop.create_window(attributes)?);

        let mut gpu = futures::executor::block_on(Context::new(window, &self.settings))?;
        gpu.configure_surface();

        let mut ctx = GameContext::new(gpu, self.settings.asset_root.clone());
        self.machine.make_permanent(StateKind::Begin, None, &mut ctx)?;
        Ok(ctx)
    }

    fn shutdown(&mut self, event_loop: &ActiveEventLoop) {
        if let Some(ctx) = self.context.as_mut() {
            self.machine.clear(ctx);
        }
        event_loop.exit();
    }
}

impl ApplicationHandler for GameManager {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.context.is_some() {
            return;
        }
        match self.start(event_loop) {
            Ok(ctx) => {
                info!("{} started", self.settings.title);
                ctx.gpu.window.request_redraw();
                self.context = Some(ctx);
            }
            Err(e) => {
                error!("Failed to start the game: {:#}", e);
                self.error = Some(e);
                event_loop.exit();
            }
        }
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, _window_id: WindowId, event: WindowEvent) {
        let Some(ctx) = self.context.as_mut() else {
            return;
        };
        ctx.input.handle_window_event(&event);

        match event {
            WindowEvent::CloseRequested => {
                info!("Window closed");
                self.shutdown(event_loop);
            }
            WindowEvent::Resized(size) => ctx.gpu.resize(size.width, size.height),
            WindowEvent::RedrawRequested => {
                run_frame(&mut self.machine, ctx);
                if self.machine.is_empty() {
                    info!("No game state left, shutting down");
                    event_loop.exit();
                }
            }
            _ => {}
        }
    }

    fn device_event(&mut self, _event_loop: &ActiveEventLoop, _device_id: DeviceId, event: DeviceEvent) {
        if let Some(ctx) = self.context.as_mut() {
            ctx.input.handle_device_event(&event);
        }
    }

    fn about_to_wait(&mut self, event_loop: &ActiveEventLoop) {
        if let Some(ctx) = &self.context {
            ctx.gpu.window.request_redraw();
        }
        event_loop.set_control_flow(ControlFlow::WaitUntil(std::time::Instant::now() + TICK));
    }

    fn exiting(&mut self, _event_loop: &ActiveEventLoop) {
        if let Some(ctx) = self.context.as_mut() {
            self.machine.clear(ctx);
            ctx.textures.clear();
        }
        info!("Shut down");
    }
}

fn run_frame(machine: &mut FiniteStateMachine<GameContext>, ctx: &mut GameContext) {
    ctx.timer.begin_frame();

    machine.update(ctx);
    ctx.textures.release_unused();

    if !machine.is_empty() {
        ctx.frame.reset();
        machine.render(ctx);
        match draw_frame(ctx) {
            Ok(()) => {}
            // Reconfigure the surface if it's lost or outdated
            Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                let size = ctx.gpu.window.inner_size();
                ctx.gpu.resize(size.width, size.height);
            }
            Err(e) => error!("Unable to render {}", e),
        }
    }

    ctx.input.end_frame();
    ctx.timer.end_frame();
}

/// Drains the frame's render queue into one render pass: terrain with depth
/// testing first, GUI quads on top.
fn draw_frame(ctx: &mut GameContext) -> Result<(), wgpu::SurfaceError> {
    let gpu = &mut ctx.gpu;
    let frame = &ctx.frame;

    // Rendering requires the surface to be configured
    if !gpu.is_surface_configured {
        return Ok(());
    }
    if let Some(camera) = frame.camera() {
        gpu.camera.write(&gpu.queue, *camera);
    }

    let output = gpu.surface.get_current_texture()?;
    let view = output
        .texture
        .create_view(&wgpu::TextureViewDescriptor::default());
    let mut encoder = gpu
        .device
        .create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("Render Encoder"),
        });
    {
        let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("Render Pass"),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view: &view,
                resolve_target: None,
                ops: wgpu::Operations {
                    load: wgpu::LoadOp::Clear(frame.clear_color()),
                    store: wgpu::StoreOp::Store,
                },
                depth_slice: None,
            })],
            depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                view: &gpu.depth_texture.view,
                depth_ops: Some(wgpu::Operations {
                    load: wgpu::LoadOp::Clear(1.0),
                    store: wgpu::StoreOp::Store,
                }),
                stencil_ops: None,
            }),
            occlusion_query_set: None,
            timestamp_writes: None,
        });

        if !frame.terrain().is_empty() {
            render_pass.set_pipeline(&gpu.terrain_pipeline);
            render_pass.set_bind_group(1, &gpu.camera.bind_group, &[]);
            for terrain in frame.terrain() {
                render_pass.set_bind_group(0, &terrain.group, &[]);
                render_pass.set_vertex_buffer(0, terrain.vertex.slice(..));
                render_pass.set_index_buffer(terrain.index.slice(..), wgpu::IndexFormat::Uint32);
                render_pass.draw_indexed(0..terrain.amount, 0, 0..1);
            }
        }

        if !frame.gui().is_empty() {
            render_pass.set_pipeline(&gpu.gui_pipeline);
            for quad in frame.gui() {
                render_pass.set_bind_group(0, &quad.group, &[]);
                render_pass.set_vertex_buffer(0, quad.vertex.slice(..));
                render_pass.set_index_buffer(quad.index.slice(..), wgpu::IndexFormat::Uint16);
                render_pass.draw_indexed(0..quad.amount, 0, 0..1);
            }
        }
    }

    gpu.queue.submit(std::iter::once(encoder.finish()));
    output.present();
    Ok(())
}

/// Opens the window, runs the game until it quits and shuts it down.
pub fn run(settings: Settings) -> anyhow::Result<()> {
    if let Err(e) = env_logger::try_init() {
        println!("Warning: Could not initialize logger: {}", e);
    };

    let event_loop = EventLoop::new()?;
    let mut game = GameManager::new(settings, states::state_table());
    event_loop.run_app(&mut game)?;

    match game.error.take() {
        Some(e) => Err(e),
        None => Ok(()),
    }
}
