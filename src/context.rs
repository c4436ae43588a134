use std::{path::PathBuf, sync::Arc};

use anyhow::Context as _;
use winit::{dpi::PhysicalPosition, window::Window};

use crate::{
    camera::{Camera, CameraResources, Projection},
    config::EngineConfig,
    data_structures::{material, texture},
    pipelines::{
        Layouts, Pipelines,
        light::{Light, LightResources},
        pick::mk_pick_bind_group_layout,
        textured::mk_texture_bind_group_layout,
    },
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MouseButtonState {
    Left,
    Right,
    None,
}

#[derive(Debug, Clone)]
pub struct MouseState {
    pub coords: PhysicalPosition<f64>,
    pub pressed: MouseButtonState,
    /// Last picked id.
    pub selected: Option<u32>,
}

impl MouseState {
    /// Selects `id`, or clears the selection when it was already selected.
    pub fn toggle(&mut self, id: u32) {
        self.selected = if self.selected == Some(id) { None } else { Some(id) };
    }
}

impl Default for MouseState {
    fn default() -> Self {
        Self {
            coords: PhysicalPosition::new(0.0, 0.0),
            pressed: MouseButtonState::None,
            selected: None,
        }
    }
}

/// Everything a flow constructor needs to create GPU resources.
///
/// wgpu handles are reference counted, so this is a set of cheap clones.
#[derive(Debug, Clone)]
pub struct InitContext {
    pub device: wgpu::Device,
    pub queue: wgpu::Queue,
    pub layouts: Layouts,
    pub surface_format: wgpu::TextureFormat,
}

impl From<&Context> for InitContext {
    fn from(ctx: &Context) -> Self {
        Self {
            device: ctx.device.clone(),
            queue: ctx.queue.clone(),
            layouts: ctx.layouts.clone(),
            surface_format: ctx.config.format,
        }
    }
}

#[derive(Debug)]
pub struct Context {
    pub(crate) window: Arc<Window>,
    pub(crate) depth_texture: texture::Texture,
    pub surface: wgpu::Surface<'static>,
    pub device: wgpu::Device,
    pub queue: wgpu::Queue,
    pub config: wgpu::SurfaceConfiguration,
    pub camera: CameraResources,
    pub projection: Projection,
    pub lights: LightResources,
    pub layouts: Layouts,
    pub pipelines: Pipelines,
    pub mouse: MouseState,
    pub clear_colour: wgpu::Color,
    pub tick_duration_millis: u64,
    pub capture_dir: PathBuf,
}

impl Context {
    pub async fn new(window: Arc<Window>, config: &EngineConfig) -> anyhow::Result<Self> {
        let size = window.inner_size();
        let (width, height) = if size.width > 0 && size.height > 0 {
            (size.width, size.height)
        } else {
            (config.width, config.height)
        };

        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            #[cfg(not(target_arch = "wasm32"))]
            backends: wgpu::Backends::PRIMARY,
            #[cfg(target_arch = "wasm32")]
            backends: wgpu::Backends::GL,
            ..Default::default()
        });

        let surface = instance
            .create_surface(window.clone())
            .context("failed to create wgpu surface")?;

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::default(),
                compatible_surface: Some(&surface),
                force_fallback_adapter: false,
            })
            .await
            .context("failed to find a suitable GPU adapter")?;
        log::info!("using adapter {:?}", adapter.get_info().name);

        let (device, queue) = adapter
            .request_device(&wgpu::DeviceDescriptor {
                label: None,
                required_features: wgpu::Features::empty(),
                // WebGL doesn't support all of wgpu's features, so if
                // we're building for the web we'll have to disable some.
                required_limits: if cfg!(target_arch = "wasm32") {
                    wgpu::Limits::downlevel_webgl2_defaults()
                } else {
                    wgpu::Limits::default()
                },
                experimental_features: wgpu::ExperimentalFeatures::disabled(),
                memory_hints: Default::default(),
                trace: wgpu::Trace::Off,
            })
            .await
            .context("failed to create wgpu device/queue")?;

        let surface_caps = surface.get_capabilities(&adapter);
        // Colours are authored as plain 0..1 values, so a linear (non-sRGB)
        // surface reproduces them as written.
        let surface_format = surface_caps
            .formats
            .iter()
            .copied()
            .find(|f| !f.is_srgb())
            .or_else(|| surface_caps.formats.first().copied())
            .context("surface reports no supported formats")?;
        let surface_config = wgpu::SurfaceConfiguration {
            // COPY_SRC is not needed: captures render into their own target.
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format: surface_format,
            width,
            height,
            present_mode: surface_caps
                .present_modes
                .first()
                .copied()
                .unwrap_or(wgpu::PresentMode::Fifo),
            alpha_mode: surface_caps
                .alpha_modes
                .first()
                .copied()
                .unwrap_or(wgpu::CompositeAlphaMode::Auto),
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };
        surface.configure(&device, &surface_config);
        log::info!("surface configured: {}x{} {:?}", width, height, surface_format);

        let projection = Projection::perspective(
            width,
            height,
            cgmath::Deg(config.fovy_deg),
            config.znear,
            config.zfar,
        );
        let camera = CameraResources::new(&device, Camera::default(), &projection);
        let lights = LightResources::new(&device, vec![Light::ambient([1.0; 3])]);

        let layouts = Layouts {
            camera: camera.bind_group_layout.clone(),
            lights: lights.bind_group_layout.clone(),
            material: material::mk_bind_group_layout(&device),
            pick: mk_pick_bind_group_layout(&device),
            texture: mk_texture_bind_group_layout(&device),
        };
        let pipelines = Pipelines::new(&device, surface_format, &layouts);

        let depth_texture = texture::Texture::create_depth_texture(&device, [width, height], "depth_texture");

        Ok(Self {
            window,
            depth_texture,
            surface,
            device,
            queue,
            config: surface_config,
            camera,
            projection,
            lights,
            layouts,
            pipelines,
            mouse: MouseState::default(),
            clear_colour: config.clear_colour,
            tick_duration_millis: config.tick_millis,
            capture_dir: config.capture_dir.clone(),
        })
    }

    pub fn window(&self) -> &Window {
        &self.window
    }

    /// Current surface size in physical pixels.
    pub fn size(&self) -> (u32, u32) {
        (self.config.width, self.config.height)
    }
}
