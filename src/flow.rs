//! Flow control and application event loop.
//!
//! A "flow" is one scene or interaction layer: it handles user input, updates
//! its scene graph and hands over renderable objects each frame. The engine
//! runs several flows side by side and coordinates rendering, picking and
//! event distribution between them.
//!
//! # User-facing types
//!
//! - [`GraphicsFlow<S, E>`] is the trait for scenes that handle events and rendering
//! - [`Out<S, E>`] is the output type for async event handling and context configuration
//!
//! # Lifecycle
//!
//! The event loop follows this pattern each frame:
//! 1. Collect window/device events
//! 2. Call `on_<device/window/custom>_event` on all flows
//! 3. Update flow state (via `on_update` / `on_tick`)
//! 4. Upload camera and lights
//! 5. Call flows' `on_render()` and batch the result per pipeline
//! 6. Perform picking if the left mouse button was pressed
//! 7. Present frame

use std::{collections::HashSet, fmt::Debug, iter, pin::Pin, sync::Arc};

use instant::{Duration, Instant};

use winit::{
    application::ApplicationHandler,
    event::{DeviceEvent, DeviceId, ElementState, KeyEvent, MouseButton, WindowEvent},
    event_loop::{ActiveEventLoop, EventLoop},
    keyboard::{KeyCode, PhysicalKey},
    window::Window,
};

use crate::{
    capture::capture_path,
    config::EngineConfig,
    context::{Context, InitContext, MouseButtonState},
    data_structures::{mesh::DrawMesh, texture::Texture},
    logging::init_logging,
    pick::draw_to_pick_buffer,
    render::{Batches, Drawable, Render},
};

#[cfg(not(target_arch = "wasm32"))]
use crate::capture::Capture;

///
/// This is the Output Type for every lifecycle hook where the user can pass async events that are
/// handled according to the platform you're running on.
///
/// `Out::FutEvent` resolves futures of events that are put in the event queue once resolved.
/// The flows receive them through `on_custom_events`.
///
/// `Out::FutFn` resolves futures of state mutations that are applied without further action.
///
/// `Out::Configure` modifies the Context, for instance to move the camera, replace the lights or
/// change the tick speed and clear colour.
///
/// `Empty` is the default output used when no eventing/futures need to be handled.
///
pub enum Out<S, E> {
    FutEvent(Vec<Box<dyn Future<Output = E>>>),
    FutFn(Vec<Box<dyn Future<Output = Box<dyn FnOnce(&mut S)>>>>),
    Configure(Box<dyn FnOnce(&mut Context)>),
    Empty,
}

impl<S, E> Default for Out<S, E> {
    fn default() -> Self {
        Self::Empty
    }
}

/// Trait for implementing an interactive scene.
///
/// A `GraphicsFlow` owns a self-contained part of the application: its scene
/// graph, render objects, animations and input handling. The engine passes
/// events to every flow and composes their renders.
///
/// # Lifecycle
///
/// 1. `on_init()` is called once when the flow is created; configure camera, lights and clear colour
/// 2. `on_window_events()` and `on_device_events()` are called for each winit input event
/// 3. `on_update()` is called every frame
/// 4. `on_tick()` is called every `tick_duration_millis`
/// 5. `on_click()` is called when an object with this flow's pick id is clicked
/// 6. `on_custom_events()` is called for custom application events
/// 7. `on_render()` is called each frame and specifies how to render `self`
///
pub trait GraphicsFlow<S, E> {
    /// Initialize the flow and configure the context.
    fn on_init(&mut self, ctx: &mut Context, state: &mut S) -> Out<S, E>;

    /// Handle a click on an object rendered by this flow.
    ///
    /// `id` is the pick id of the clicked object as set via `on_render`.
    /// Objects rendered through `Render::Custom` are never reported; see
    /// [`crate::pick::draw_to_pick_buffer`].
    fn on_click(&mut self, ctx: &Context, state: &mut S, id: u32) -> Out<S, E>;

    /// Update state every frame with the elapsed time `dt`.
    fn on_update(&mut self, ctx: &Context, state: &mut S, dt: Duration) -> Out<S, E>;

    /// Update state every `tick_duration_millis` milliseconds.
    fn on_tick(&mut self, ctx: &Context, state: &mut S) -> Out<S, E>;

    /// Handle raw device events (mouse motion, raw keys).
    fn on_device_events(&mut self, ctx: &Context, state: &mut S, event: &DeviceEvent) -> Out<S, E>;

    /// Handle window events (keyboard, mouse buttons, cursor, resizing).
    fn on_window_events(&mut self, ctx: &Context, state: &mut S, event: &WindowEvent) -> Out<S, E>;

    /// Handle custom application events.
    ///
    /// Returns the event if it was not consumed, allowing it to be passed to
    /// the next flow. Returning `None` means the event was consumed.
    fn on_custom_events(&mut self, ctx: &Context, state: &mut S, event: E) -> Option<E>;

    /// Return renderable objects for this flow.
    fn on_render<'pass>(&self) -> Render<'_, 'pass>;
}

// Dummy impl to make wasm work
impl<State, Event> Debug for dyn GraphicsFlow<State, Event> + 'static {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("GraphicsFlow")
    }
}

/// Type alias for a flow constructor (factory function).
///
/// A flow constructor takes an `InitContext` and asynchronously returns a
/// boxed `GraphicsFlow`, so meshes can be built before the first frame.
pub type FlowConsturctor<S, E> =
    Box<dyn FnOnce(InitContext) -> Pin<Box<dyn Future<Output = Box<dyn GraphicsFlow<S, E>>>>>>;

/// Records the main pass of one frame into `encoder`.
///
/// Flows are drawn lit first, then unlit, then textured. Used for the
/// surface and for captures alike.
pub(crate) fn encode_scene<State, Event>(
    ctx: &Context,
    graphics_flows: &[Box<dyn GraphicsFlow<State, Event>>],
    encoder: &mut wgpu::CommandEncoder,
    view: &wgpu::TextureView,
    depth_view: &wgpu::TextureView,
) {
    let mut render_pass = begin_pass(encoder, "Render Pass", view, depth_view, ctx.clear_colour);
    let render = Render::Composed(graphics_flows.iter().map(|flow| flow.on_render()).collect());
    draw_render(ctx, &mut render_pass, render, &ctx.camera.bind_group);
}

/// Starts a pass that clears `view` to `clear` and the depth to 1.
pub(crate) fn begin_pass<'e>(
    encoder: &'e mut wgpu::CommandEncoder,
    label: &str,
    view: &wgpu::TextureView,
    depth_view: &wgpu::TextureView,
    clear: wgpu::Color,
) -> wgpu::RenderPass<'e> {
    encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
        label: Some(label),
        color_attachments: &[Some(wgpu::RenderPassColorAttachment {
            view,
            resolve_target: None,
            ops: wgpu::Operations {
                load: wgpu::LoadOp::Clear(clear),
                store: wgpu::StoreOp::Store,
            },
            depth_slice: None,
        })],
        depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
            view: depth_view,
            depth_ops: Some(wgpu::Operations {
                load: wgpu::LoadOp::Clear(1.0),
                store: wgpu::StoreOp::Store,
            }),
            stencil_ops: None,
        }),
        occlusion_query_set: None,
        timestamp_writes: None,
        multiview_mask: None,
    })
}

/// Batches `render` per pipeline and draws it as seen through `camera`.
pub(crate) fn draw_render<'a, 'pass>(
    ctx: &Context,
    render_pass: &mut wgpu::RenderPass<'pass>,
    render: Render<'a, 'pass>,
    camera: &wgpu::BindGroup,
) {
    let mut batches = Batches::default();
    render.set_pipelines(ctx, render_pass, &mut batches);

    render_pass.set_pipeline(&ctx.pipelines.phong);
    draw_batch(ctx, render_pass, camera, &batches.lits);
    render_pass.set_pipeline(&ctx.pipelines.unlit);
    draw_batch(ctx, render_pass, camera, &batches.unlits);
    render_pass.set_pipeline(&ctx.pipelines.textured);
    draw_batch(ctx, render_pass, camera, &batches.textured);
}

fn draw_batch(ctx: &Context, render_pass: &mut wgpu::RenderPass<'_>, camera: &wgpu::BindGroup, batch: &[Drawable]) {
    for drawable in batch {
        if drawable.amount == 0 || drawable.instance.size() == 0 {
            log::warn!("you attempted to render '{}' with zero instances", drawable.mesh.name);
            continue;
        }
        render_pass.set_vertex_buffer(1, drawable.instance.slice(..));
        render_pass.draw_mesh_instanced(
            drawable.mesh,
            0..drawable.amount,
            &[camera, &ctx.lights.bind_group, drawable.material],
        );
    }
}

/// Application state bundle: GPU context, app state, and surface status.
#[derive(Debug)]
pub struct AppState<State: 'static> {
    pub(crate) ctx: Context,
    state: State,
    is_surface_configured: bool,
    captures: u32,
}

impl<State: Default> AppState<State> {
    async fn new(window: Arc<Window>, config: &EngineConfig) -> anyhow::Result<Self> {
        let ctx = Context::new(window, config).await?;
        Ok(Self {
            ctx,
            state: State::default(),
            is_surface_configured: false,
            captures: 0,
        })
    }

    fn resize(&mut self, width: u32, height: u32) {
        if width > 0 && height > 0 {
            self.ctx.config.width = width;
            self.ctx.config.height = height;
            self.is_surface_configured = true;
            self.ctx.projection.resize(width, height);
            self.ctx.surface.configure(&self.ctx.device, &self.ctx.config);
            self.ctx.depth_texture = Texture::create_depth_texture(
                &self.ctx.device,
                [self.ctx.config.width, self.ctx.config.height],
                "depth_texture",
            );
        }
    }

    /// Uploads the camera (after applying the orbit controller) and lights.
    fn upload_uniforms(&mut self, dt: Duration) {
        let ctx = &mut self.ctx;
        ctx.camera.controller.update(&mut ctx.camera.camera, dt);
        ctx.camera.write_to_buffer(&ctx.queue, &ctx.projection);
        ctx.lights.write_to_buffer(&ctx.queue);
    }

    fn render<Event>(&mut self, graphics_flows: &[Box<dyn GraphicsFlow<State, Event>>]) -> Result<(), wgpu::SurfaceError> {
        // invoke main render loop
        self.ctx.window.request_redraw();

        // Rendering requires the surface to be configured
        if !self.is_surface_configured {
            return Ok(());
        }

        let output = self.ctx.surface.get_current_texture()?;
        let view = output.texture.create_view(&wgpu::TextureViewDescriptor::default());

        let mut encoder = self.ctx.device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("Render Encoder"),
        });
        encode_scene(&self.ctx, graphics_flows, &mut encoder, &view, &self.ctx.depth_texture.view);
        self.ctx.queue.submit(iter::once(encoder.finish()));

        output.present();
        Ok(())
    }

    /// Renders the current frame off-screen and writes it as PNG into the
    /// configured capture directory.
    #[cfg(not(target_arch = "wasm32"))]
    fn capture<Event>(
        &mut self,
        async_runtime: &tokio::runtime::Runtime,
        graphics_flows: &[Box<dyn GraphicsFlow<State, Event>>],
    ) {
        let (width, height) = self.ctx.size();
        let capture = Capture::new(&self.ctx.device, width, height, self.ctx.config.format);
        let mut encoder = self.ctx.device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("Capture Encoder"),
        });
        encode_scene(
            &self.ctx,
            graphics_flows,
            &mut encoder,
            &capture.target.view,
            &capture.depth.view,
        );
        capture.copy_to_buffer(&mut encoder);
        self.ctx.queue.submit(iter::once(encoder.finish()));

        let path = capture_path(&self.ctx.capture_dir, self.captures);
        match async_runtime.block_on(capture.save(&self.ctx.device, &path)) {
            Ok(()) => self.captures += 1,
            Err(e) => log::error!("capture failed: {:#}", e),
        }
    }

    #[cfg(target_arch = "wasm32")]
    fn capture<Event>(&mut self, _graphics_flows: &[Box<dyn GraphicsFlow<State, Event>>]) {
        let path = capture_path(&self.ctx.capture_dir, self.captures);
        log::warn!("captures are not supported on the web, skipping {}", path.display());
    }
}

pub struct App<State: 'static, Event: 'static> {
    #[cfg(not(target_arch = "wasm32"))]
    async_runtime: tokio::runtime::Runtime,
    proxy: winit::event_loop::EventLoopProxy<FlowEvent<State, Event>>,
    config: EngineConfig,
    state: Option<AppState<State>>,
    // This will hold the fully initialized flows once they are ready.
    graphics_flows: Vec<Box<dyn GraphicsFlow<State, Event>>>,
    // This holds the constructors at the start.
    // We use Option to `take()` it after use.
    constructors: Option<Vec<FlowConsturctor<State, Event>>>,
    last_time: Instant,
    time_since_tick: Duration,
}

impl<State, Event> App<State, Event>
where
    State: 'static,
    Event: 'static,
{
    fn new(
        event_loop: &EventLoop<FlowEvent<State, Event>>,
        config: EngineConfig,
        constructors: Vec<FlowConsturctor<State, Event>>,
        #[cfg(not(target_arch = "wasm32"))] async_runtime: tokio::runtime::Runtime,
    ) -> Self {
        let proxy = event_loop.create_proxy();
        Self {
            #[cfg(not(target_arch = "wasm32"))]
            async_runtime,
            proxy,
            config,
            state: None,
            graphics_flows: Vec::new(),
            constructors: Some(constructors),
            last_time: Instant::now(),
            time_since_tick: Duration::from_millis(0),
        }
    }
}

pub(crate) enum FlowEvent<State: 'static, Event: 'static> {
    #[allow(dead_code)]
    Initialized {
        state: AppState<State>,
        flows: Vec<Box<dyn GraphicsFlow<State, Event>>>,
    },
    #[allow(dead_code)]
    Id((u32, HashSet<usize>)),
    #[allow(dead_code)]
    Mut(Box<dyn FnOnce(&mut State)>),
    #[allow(dead_code)]
    Custom(Event),
    #[allow(dead_code)]
    Exit,
}

impl<State, Event> Debug for FlowEvent<State, Event> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Initialized { state: _, flows } => f.debug_struct("Initialized").field("flows", flows).finish(),
            Self::Id(arg0) => f.debug_tuple("Id").field(arg0).finish(),
            Self::Mut(_) => f.write_str("Mut(|&mut State| -> {...})"),
            Self::Custom(_) => f.write_str("Custom(E)"),
            Self::Exit => f.write_str("Exit"),
        }
    }
}

fn is_capture_key(event: &KeyEvent) -> bool {
    event.state == ElementState::Pressed && !event.repeat && event.physical_key == PhysicalKey::Code(KeyCode::KeyP)
}

impl<State: 'static + Default, Event: 'static> ApplicationHandler<FlowEvent<State, Event>> for App<State, Event> {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        // Resumed fires again on some platforms; everything is set up once.
        let Some(constructors) = self.constructors.take() else {
            return;
        };

        #[allow(unused_mut)]
        let mut window_attributes = Window::default_attributes()
            .with_title(self.config.title.clone())
            .with_inner_size(winit::dpi::PhysicalSize::new(self.config.width, self.config.height));

        #[cfg(target_arch = "wasm32")]
        {
            use wasm_bindgen::JsCast;
            use winit::platform::web::WindowAttributesExtWebSys;

            const CANVAS_ID: &str = "canvas";

            let canvas = wgpu::web_sys::window()
                .and_then(|window| window.document())
                .and_then(|document| document.get_element_by_id(CANVAS_ID));
            match canvas {
                Some(canvas) => {
                    window_attributes = window_attributes.with_canvas(Some(canvas.unchecked_into()));
                }
                None => log::warn!("no element with id '{}', winit creates its own canvas", CANVAS_ID),
            }
        }

        let window = match event_loop.create_window(window_attributes) {
            Ok(window) => Arc::new(window),
            Err(e) => {
                log::error!("cannot create the window: {}", e);
                event_loop.exit();
                return;
            }
        };

        let config = self.config.clone();
        let init_future = async move {
            let app_state = AppState::new(window, &config).await?;

            let flow_futures: Vec<_> = constructors
                .into_iter()
                // The clone in into() leverages the internal Arcs of Device and Queue and thus only clones the ref
                .map(|constructor| constructor((&app_state.ctx).into()))
                .collect();
            let flows: Vec<_> = futures::future::join_all(flow_futures).await;
            anyhow::Ok((app_state, flows))
        };

        #[cfg(not(target_arch = "wasm32"))]
        {
            let (mut app_state, flows) = match self.async_runtime.block_on(init_future) {
                Ok(initialized) => initialized,
                Err(e) => {
                    log::error!("App initialization failed. Cannot create the main context: {:#}", e);
                    event_loop.exit();
                    return;
                }
            };
            self.graphics_flows = flows;
            self.graphics_flows.iter_mut().for_each(|flow| {
                let events = flow.on_init(&mut app_state.ctx, &mut app_state.state);
                let proxy = self.proxy.clone();
                handle_flow_output(&self.async_runtime, &mut app_state.state, &mut app_state.ctx, proxy, events);
            });
            self.state = Some(app_state);
        }

        #[cfg(target_arch = "wasm32")]
        {
            let proxy = self.proxy.clone();
            wasm_bindgen_futures::spawn_local(async move {
                match init_future.await {
                    Ok((app_state, flows)) => {
                        if proxy
                            .send_event(FlowEvent::Initialized { state: app_state, flows })
                            .is_err()
                        {
                            log::error!("event loop closed before initialization finished");
                        }
                    }
                    Err(e) => log::error!("App initialization failed. Cannot create the main context: {:#}", e),
                }
            });
        }
    }

    #[allow(unused_mut)]
    fn user_event(&mut self, event_loop: &ActiveEventLoop, mut event: FlowEvent<State, Event>) {
        match event {
            FlowEvent::Initialized { state, flows } => {
                // This is the message from our wasm `spawn_local`
                self.graphics_flows = flows;
                let app_state = self.state.insert(state);

                // Important: Trigger a resize and redraw now that we are initialized
                let size = app_state.ctx.window.inner_size();
                app_state.resize(size.width, size.height);
                self.graphics_flows.iter_mut().for_each(|flow| {
                    let events = flow.on_init(&mut app_state.ctx, &mut app_state.state);
                    let proxy = self.proxy.clone();
                    handle_flow_output(
                        #[cfg(not(target_arch = "wasm32"))]
                        &self.async_runtime,
                        &mut app_state.state,
                        &mut app_state.ctx,
                        proxy,
                        events,
                    );
                });
                app_state.ctx.window.request_redraw();
            }
            FlowEvent::Id((pick_id, flow_ids)) => {
                if let Some(state) = &mut self.state {
                    state.ctx.mouse.toggle(pick_id);
                    flow_ids.into_iter().for_each(|flow_id| {
                        if let Some(flow) = self.graphics_flows.get_mut(flow_id) {
                            let events = flow.on_click(&state.ctx, &mut state.state, pick_id);
                            let proxy = self.proxy.clone();
                            handle_flow_output(
                                #[cfg(not(target_arch = "wasm32"))]
                                &self.async_runtime,
                                &mut state.state,
                                &mut state.ctx,
                                proxy,
                                events,
                            );
                        }
                    });
                }
            }
            FlowEvent::Custom(custom_event) => {
                if let Some(state) = &mut self.state {
                    let result = self
                        .graphics_flows
                        .iter_mut()
                        .fold(Some(custom_event), |event, flow| {
                            flow.on_custom_events(&state.ctx, &mut state.state, event?)
                        });
                    if result.is_some() {
                        log::warn!("Custom event was not consumed this cycle");
                    }
                }
            }
            FlowEvent::Mut(fn_once) => {
                if let Some(state) = &mut self.state {
                    fn_once(&mut state.state);
                }
            }
            FlowEvent::Exit => {
                event_loop.exit();
            }
        }
    }

    fn device_event(&mut self, _event_loop: &ActiveEventLoop, _device_id: DeviceId, event: DeviceEvent) {
        let state = match &mut self.state {
            Some(state) => state,
            None => return,
        };
        if let DeviceEvent::MouseMotion { delta: (dx, dy) } = event {
            let speed_factor = 5.0;
            if let MouseButtonState::Right = state.ctx.mouse.pressed {
                state
                    .ctx
                    .camera
                    .controller
                    .handle_mouse(dx * speed_factor, dy * speed_factor);
            }
        }
        self.graphics_flows.iter_mut().for_each(|f| {
            let events = f.on_device_events(&state.ctx, &mut state.state, &event);
            let proxy = self.proxy.clone();
            handle_flow_output(
                #[cfg(not(target_arch = "wasm32"))]
                &self.async_runtime,
                &mut state.state,
                &mut state.ctx,
                proxy,
                events,
            );
        });
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, _window_id: winit::window::WindowId, event: WindowEvent) {
        let state = match &mut self.state {
            Some(state) => state,
            None => return,
        };

        // general stuff
        state.ctx.camera.controller.handle_window_events(&event);

        if let WindowEvent::CursorMoved { device_id: _, position } = event {
            state.ctx.mouse.coords = position;
        };

        // Mouse buttons are tracked before the flows see the event, so their
        // handlers can rely on `ctx.mouse.pressed`. The selection is updated
        // afterwards by the pick below.
        if let WindowEvent::MouseInput {
            state: button_state,
            button,
            ..
        } = event
        {
            state.ctx.mouse.pressed = match (button, button_state.is_pressed()) {
                (MouseButton::Left, true) => MouseButtonState::Left,
                (MouseButton::Right, true) => MouseButtonState::Right,
                (_, false) => MouseButtonState::None,
                _ => state.ctx.mouse.pressed,
            };
        }

        self.graphics_flows.iter_mut().for_each(|f| {
            let events = f.on_window_events(&state.ctx, &mut state.state, &event);
            let proxy = self.proxy.clone();
            handle_flow_output(
                #[cfg(not(target_arch = "wasm32"))]
                &self.async_runtime,
                &mut state.state,
                &mut state.ctx,
                proxy,
                events,
            );
        });

        match event {
            WindowEvent::CloseRequested => event_loop.exit(),
            WindowEvent::Resized(size) => state.resize(size.width, size.height),
            WindowEvent::KeyboardInput { event: ref key, .. } if is_capture_key(key) => {
                state.capture(
                    #[cfg(not(target_arch = "wasm32"))]
                    &self.async_runtime,
                    &self.graphics_flows,
                );
            }
            WindowEvent::RedrawRequested => {
                let dt = self.last_time.elapsed();
                self.last_time = Instant::now();
                self.time_since_tick += dt;

                if self.time_since_tick >= Duration::from_millis(state.ctx.tick_duration_millis) {
                    self.graphics_flows.iter_mut().for_each(|f| {
                        let events = f.on_tick(&state.ctx, &mut state.state);
                        let proxy = self.proxy.clone();
                        handle_flow_output(
                            #[cfg(not(target_arch = "wasm32"))]
                            &self.async_runtime,
                            &mut state.state,
                            &mut state.ctx,
                            proxy,
                            events,
                        );
                    });
                    self.time_since_tick = Duration::from_millis(0);
                }

                self.graphics_flows.iter_mut().for_each(|f| {
                    let events = f.on_update(&state.ctx, &mut state.state, dt);
                    let proxy = self.proxy.clone();
                    handle_flow_output(
                        #[cfg(not(target_arch = "wasm32"))]
                        &self.async_runtime,
                        &mut state.state,
                        &mut state.ctx,
                        proxy,
                        events,
                    );
                });
                state.upload_uniforms(dt);

                match state.render(&self.graphics_flows) {
                    Ok(_) => {}
                    // Reconfigure the surface if it's lost or outdated
                    Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                        let size = state.ctx.window.inner_size();
                        state.resize(size.width, size.height);
                    }
                    Err(e) => {
                        log::error!("Unable to render {}", e);
                    }
                }
            }
            WindowEvent::MouseInput {
                state: button_state,
                button: MouseButton::Left,
                ..
            } if button_state.is_pressed() => {
                if let Some((pick_id, flow_ids)) = draw_to_pick_buffer::<State, Event>(
                    #[cfg(not(target_arch = "wasm32"))]
                    &self.async_runtime,
                    &mut self.graphics_flows,
                    &state.ctx,
                    &state.ctx.mouse,
                    #[cfg(target_arch = "wasm32")]
                    self.proxy.clone(),
                ) {
                    state.ctx.mouse.toggle(pick_id);
                    if flow_ids.len() > 1 {
                        log::warn!(
                            "Multiple flows (indices {:?}) want to react to the render ID {}.",
                            flow_ids,
                            pick_id
                        );
                    }
                    flow_ids.into_iter().for_each(|flow_id| {
                        if let Some(flow) = self.graphics_flows.get_mut(flow_id) {
                            let events = flow.on_click(&state.ctx, &mut state.state, pick_id);
                            let proxy = self.proxy.clone();
                            handle_flow_output(
                                #[cfg(not(target_arch = "wasm32"))]
                                &self.async_runtime,
                                &mut state.state,
                                &mut state.ctx,
                                proxy,
                                events,
                            );
                        }
                    });
                }
            }
            _ => {}
        }
    }
}

fn handle_flow_output<State, Event>(
    #[cfg(not(target_arch = "wasm32"))] async_runtime: &tokio::runtime::Runtime,
    state: &mut State,
    ctx: &mut Context,
    proxy: winit::event_loop::EventLoopProxy<FlowEvent<State, Event>>,
    out: Out<State, Event>,
) {
    match out {
        // Send the events passed by the user to winit
        Out::FutEvent(futures) => {
            let fut = async move { futures::future::join_all(futures.into_iter().map(Pin::from)).await };
            #[cfg(not(target_arch = "wasm32"))]
            {
                let resolved = async_runtime.block_on(fut);
                for event in resolved {
                    if let Err(err) = proxy.send_event(FlowEvent::Custom(event)) {
                        log::error!("Event loop was closed before all events could be processed: {}", err);
                        break;
                    }
                }
            }

            #[cfg(target_arch = "wasm32")]
            {
                wasm_bindgen_futures::spawn_local(async move {
                    let resolved = fut.await;
                    for event in resolved {
                        if proxy.send_event(FlowEvent::Custom(event)).is_err() {
                            log::error!("Event loop was closed before all events could be processed");
                            break;
                        }
                    }
                });
            }
        }
        // Mutate the state if the arch supports blocking, create an event otherwise
        Out::FutFn(futures) => {
            let events: Vec<Pin<Box<dyn Future<Output = Box<dyn FnOnce(&mut State)>>>>> =
                futures.into_iter().map(Pin::from).collect();
            let fut = async move { futures::future::join_all(events.into_iter()).await };
            #[cfg(not(target_arch = "wasm32"))]
            {
                let resolved: Vec<Box<dyn FnOnce(&mut State)>> = async_runtime.block_on(fut);
                resolved.into_iter().for_each(|mutation| {
                    mutation(state);
                });
            }

            #[cfg(target_arch = "wasm32")]
            {
                let _ = &state;
                wasm_bindgen_futures::spawn_local(async move {
                    let resolved = fut.await;
                    for mutation in resolved {
                        if proxy.send_event(FlowEvent::Mut(mutation)).is_err() {
                            log::error!("Event loop was closed before all mutations could be applied");
                            break;
                        }
                    }
                });
            }
        }
        Out::Configure(f) => f(ctx),
        Out::Empty => (),
    }
}

/// Opens the window described by `config` and runs `constructors` until the
/// window is closed.
pub fn run<State: 'static + Default, Event: 'static>(
    config: EngineConfig,
    constructors: Vec<FlowConsturctor<State, Event>>,
) -> anyhow::Result<()> {
    init_logging(config.logging.clone());
    log::info!("starting '{}' at {}x{}", config.title, config.width, config.height);

    let event_loop: EventLoop<FlowEvent<State, Event>> = EventLoop::with_user_event().build()?;

    #[cfg(not(target_arch = "wasm32"))]
    let mut app: App<State, Event> = App::new(&event_loop, config, constructors, tokio::runtime::Runtime::new()?);
    #[cfg(target_arch = "wasm32")]
    let mut app: App<State, Event> = App::new(&event_loop, config, constructors);

    event_loop.run_app(&mut app)?;

    Ok(())
}

#[cfg(target_arch = "wasm32")]
pub(crate) fn throw_on_error(result: anyhow::Result<()>) {
    if let Err(e) = result {
        wasm_bindgen::throw_str(&format!("{:#}", e));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn out_defaults_to_empty() {
        let out: Out<(), ()> = Out::default();
        assert!(matches!(out, Out::Empty));
    }
}
