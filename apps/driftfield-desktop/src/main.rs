use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use anyhow::{Context, Result};
use clap::Parser;
use driftfield_field::{FieldAnimator, FrameOutcome, FrameReport, SceneConfig, Viewport};
use driftfield_frame::{FrameRequestId, FrameSource};
use driftfield_profile::{
    HostEnvironment, PerformanceProfiler, PerformanceTier, QualitySettings, get_settings,
};
use driftfield_render_wgpu::{FieldCamera, FieldGpuRenderer, GpuFieldOptions, InstanceStaging};
use driftfield_tools::FieldInspector;
use egui::Context as EguiContext;
use glam::Vec2;
use tracing_subscriber::EnvFilter;
use winit::application::ApplicationHandler;
use winit::dpi::PhysicalSize;
use winit::event::{
    DeviceEvent, ElementState, KeyEvent, MouseButton, MouseScrollDelta, WindowEvent,
};
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::keyboard::{KeyCode, PhysicalKey};
use winit::window::{Window, WindowId};

#[derive(Parser)]
#[command(name = "driftfield-desktop", about = "Driftfield desktop preview")]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// Scene file (YAML); defaults to the built-in field
    scene: Option<PathBuf>,

    /// Force a tier instead of profiling the device
    #[arg(long)]
    tier: Option<PerformanceTier>,
}

/// Frame source backed by winit redraw requests.
///
/// A request asks the window for a redraw and remembers its id; the next
/// `RedrawRequested` delivers it. Redraws caused by the overlay or the OS
/// find no pending id and leave the field alone.
#[derive(Default)]
struct RedrawSource {
    window: Option<Arc<Window>>,
    next_id: u64,
    pending: Option<FrameRequestId>,
}

impl FrameSource for RedrawSource {
    fn request_frame(&mut self) -> FrameRequestId {
        self.next_id += 1;
        let id = FrameRequestId(self.next_id);
        self.pending = Some(id);
        if let Some(window) = &self.window {
            window.request_redraw();
        }
        id
    }

    fn cancel_frame(&mut self, id: FrameRequestId) {
        if self.pending == Some(id) {
            self.pending = None;
        }
    }
}

/// Field, camera and host flags.
struct FieldState {
    tier: PerformanceTier,
    settings: QualitySettings,
    reduced_motion: bool,
    animator: FieldAnimator,
    staging: InstanceStaging,
    camera: FieldCamera,
    source: RedrawSource,
    started: Instant,
    last_report: FrameReport,
    // host visibility inputs
    occluded: bool,
    minimized: bool,
    user_paused: bool,
    // pointer
    pointer_enabled: bool,
    cursor: Option<Vec2>,
    window_size: PhysicalSize<u32>,
    orbiting: bool,
    show_overlay: bool,
}

impl FieldState {
    fn new(
        scene: SceneConfig,
        tier: PerformanceTier,
        reduced_motion: bool,
        window: &Arc<Window>,
    ) -> Result<Self> {
        let settings = get_settings(tier);
        let size = window.inner_size();
        let viewport = logical_viewport(size, window.scale_factor());
        let camera = FieldCamera::framing(scene.field.half_extent, viewport.aspect());
        let animator = FieldAnimator::new(scene.field, &settings, viewport, scene.max_fps)?;
        let staging = InstanceStaging::new(animator.renderer().instance_count());

        Ok(Self {
            tier,
            settings,
            reduced_motion,
            animator,
            staging,
            camera,
            source: RedrawSource {
                window: Some(window.clone()),
                ..RedrawSource::default()
            },
            started: Instant::now(),
            last_report: FrameReport::default(),
            occluded: false,
            minimized: false,
            user_paused: false,
            pointer_enabled: true,
            cursor: None,
            window_size: size,
            orbiting: false,
            show_overlay: true,
        })
    }

    /// Start animating, or draw one still frame under reduced motion.
    fn start(&mut self) -> Result<()> {
        if self.reduced_motion {
            tracing::info!("reduced motion requested, drawing a still field");
            self.last_report = self.animator.renderer().update(0.0, &mut self.staging);
            return Ok(());
        }
        self.animator.start(&mut self.source)?;
        Ok(())
    }

    fn sync_host_visibility(&mut self) {
        let visible = !(self.occluded || self.minimized || self.user_paused);
        if let Err(e) = self.animator.set_visible(visible, &mut self.source) {
            tracing::warn!("could not update field visibility: {e}");
        }
    }

    fn update_pointer(&mut self) {
        let ndc = self
            .cursor
            .filter(|_| self.pointer_enabled)
            .and_then(|p| to_ndc(p, self.window_size));
        self.animator.set_pointer(ndc);
    }

    fn resize(&mut self, size: PhysicalSize<u32>, scale_factor: f64) {
        self.window_size = size;
        if size.width == 0 || size.height == 0 {
            // minimized windows report a zero size
            return;
        }
        self.camera.set_aspect(size.width as f32, size.height as f32);
        if let Err(e) = self.animator.resize(logical_viewport(size, scale_factor)) {
            tracing::warn!("ignoring resize: {e}");
        }
        if self.reduced_motion {
            self.last_report = self.animator.renderer().update(0.0, &mut self.staging);
        }
    }

    /// Deliver the pending frame request, if this redraw carries one.
    fn advance(&mut self) {
        let Some(id) = self.source.pending.take() else {
            return;
        };
        let now_ms = self.started.elapsed().as_secs_f64() * 1000.0;
        if let FrameOutcome::Rendered(report) =
            self.animator
                .on_animation_frame(id, now_ms, &mut self.source, &mut self.staging)
        {
            self.last_report = report;
        }
    }

    fn handle_key(&mut self, key: KeyCode) {
        match key {
            KeyCode::F1 => self.show_overlay = !self.show_overlay,
            KeyCode::Space => {
                self.user_paused = !self.user_paused;
                self.sync_host_visibility();
            }
            KeyCode::KeyP => {
                self.pointer_enabled = !self.pointer_enabled;
                self.update_pointer();
            }
            _ => {}
        }
    }

    fn draw_ui(&mut self, ctx: &EguiContext) {
        if !self.show_overlay {
            return;
        }

        let summary = FieldInspector::summary(self.tier, &self.settings, &self.animator);
        let mut paused = self.user_paused;
        let mut pointer = self.pointer_enabled;

        egui::Window::new("Driftfield")
            .default_width(260.0)
            .resizable(false)
            .show(ctx, |ui| {
                ui.label(format!("Tier: {}", summary.tier));
                ui.label(format!("Topology: {}", summary.topology));
                ui.label(format!("Instances: {}", summary.instances));
                ui.label(format!(
                    "FPS: {:.1} / {}",
                    summary.achieved_fps, summary.target_fps
                ));
                ui.label(format!(
                    "Loop: {}  Visible: {}",
                    summary.loop_state, summary.visible
                ));
                ui.label(format!(
                    "Last frame: {} written, {} skipped",
                    self.last_report.written, self.last_report.skipped
                ));
                ui.label(format!(
                    "Antialias: {}  Shadows: {}",
                    self.settings.antialias, self.settings.shadows
                ));
                if self.reduced_motion {
                    ui.label("Reduced motion: still frame");
                }
                ui.separator();
                ui.checkbox(&mut paused, "Pause (Space)");
                ui.checkbox(&mut pointer, "Pointer interaction (P)");
                ui.separator();
                ui.small("F1: Toggle overlay | RMB: Orbit | Wheel: Zoom");
            });

        if paused != self.user_paused {
            self.user_paused = paused;
            self.sync_host_visibility();
        }
        if pointer != self.pointer_enabled {
            self.pointer_enabled = pointer;
            self.update_pointer();
        }
    }
}

fn logical_viewport(size: PhysicalSize<u32>, scale_factor: f64) -> Viewport {
    let logical = size.to_logical::<f32>(scale_factor);
    Viewport::new(logical.width, logical.height)
}

/// Window pixel position to normalized device coordinates, y up.
fn to_ndc(p: Vec2, size: PhysicalSize<u32>) -> Option<Vec2> {
    if size.width == 0 || size.height == 0 {
        return None;
    }
    Some(Vec2::new(
        2.0 * p.x / size.width as f32 - 1.0,
        1.0 - 2.0 * p.y / size.height as f32,
    ))
}

struct Gpu {
    surface: wgpu::Surface<'static>,
    device: wgpu::Device,
    queue: wgpu::Queue,
    config: wgpu::SurfaceConfiguration,
    renderer: FieldGpuRenderer,
    egui_renderer: egui_wgpu::Renderer,
}

struct GpuApp {
    scene: SceneConfig,
    tier_override: Option<PerformanceTier>,
    state: Option<FieldState>,
    window: Option<Arc<Window>>,
    gpu: Option<Gpu>,
    egui_ctx: EguiContext,
    egui_winit: Option<egui_winit::State>,
}

impl GpuApp {
    fn new(scene: SceneConfig, tier_override: Option<PerformanceTier>) -> Self {
        Self {
            scene,
            tier_override,
            state: None,
            window: None,
            gpu: None,
            egui_ctx: EguiContext::default(),
            egui_winit: None,
        }
    }

    fn init(&mut self, event_loop: &ActiveEventLoop) -> Result<()> {
        let attrs = Window::default_attributes()
            .with_title("Driftfield")
            .with_inner_size(PhysicalSize::new(1280u32, 720));
        let window = Arc::new(event_loop.create_window(attrs)?);

        let profiler =
            PerformanceProfiler::new(HostEnvironment::with_pixel_ratio(window.scale_factor() as f32));
        let tier = self
            .tier_override
            .or(self.scene.tier)
            .unwrap_or_else(|| profiler.tier());
        let reduced_motion = self.scene.reduced_motion || profiler.prefers_reduced_motion();
        let settings = get_settings(tier);
        tracing::info!(
            %tier,
            pixel_ratio = settings.clamp_pixel_ratio(window.scale_factor() as f32),
            reduced_motion,
            "profiled host"
        );

        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::all(),
            ..Default::default()
        });
        let surface = instance.create_surface(window.clone())?;

        let power_preference = match tier {
            PerformanceTier::Low => wgpu::PowerPreference::LowPower,
            _ => wgpu::PowerPreference::HighPerformance,
        };
        let adapter = pollster::block_on(instance.request_adapter(&wgpu::RequestAdapterOptions {
            power_preference,
            compatible_surface: Some(&surface),
            force_fallback_adapter: false,
        }))
        .context("no compatible GPU adapter")?;

        let (device, queue) = pollster::block_on(adapter.request_device(
            &wgpu::DeviceDescriptor {
                label: Some("driftfield_device"),
                required_features: wgpu::Features::empty(),
                required_limits: wgpu::Limits::default(),
                memory_hints: Default::default(),
            },
            None,
        ))?;

        let size = window.inner_size();
        let surface_caps = surface.get_capabilities(&adapter);
        let surface_format = surface_caps
            .formats
            .iter()
            .find(|f| f.is_srgb())
            .or_else(|| surface_caps.formats.first())
            .copied()
            .context("surface reports no formats")?;
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
            present_mode: wgpu::PresentMode::AutoVsync,
            alpha_mode,
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };
        surface.configure(&device, &config);

        let mut state = FieldState::new(self.scene.clone(), tier, reduced_motion, &window)?;
        let max_instances =
            u32::try_from(state.animator.renderer().instance_count()).unwrap_or(u32::MAX);
        let renderer = FieldGpuRenderer::new(
            &device,
            surface_format,
            config.width,
            config.height,
            max_instances,
            GpuFieldOptions::from_settings(&settings),
        );

        let egui_winit = egui_winit::State::new(
            self.egui_ctx.clone(),
            egui::ViewportId::ROOT,
            &window,
            Some(window.scale_factor() as f32),
            None,
            None,
        );
        let egui_renderer = egui_wgpu::Renderer::new(&device, surface_format, None, 1, false);

        state.start()?;

        tracing::info!(
            backend = adapter.get_info().backend.to_str(),
            instances = max_instances,
            "GPU initialized"
        );

        self.window = Some(window);
        self.egui_winit = Some(egui_winit);
        self.state = Some(state);
        self.gpu = Some(Gpu {
            surface,
            device,
            queue,
            config,
            renderer,
            egui_renderer,
        });
        Ok(())
    }

    fn redraw(&mut self) {
        let (Some(window), Some(state), Some(gpu), Some(egui_winit)) = (
            &self.window,
            &mut self.state,
            &mut self.gpu,
            &mut self.egui_winit,
        ) else {
            return;
        };

        state.advance();
        gpu.renderer.upload(&gpu.queue, &mut state.staging);

        let output = match gpu.surface.get_current_texture() {
            Ok(t) => t,
            Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                gpu.surface.configure(&gpu.device, &gpu.config);
                return;
            }
            Err(e) => {
                tracing::error!("surface error: {e}");
                return;
            }
        };
        let view = output
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        gpu.renderer
            .render(&gpu.device, &gpu.queue, &view, &state.camera);

        let raw_input = egui_winit.take_egui_input(window);
        let full_output = self.egui_ctx.run(raw_input, |ctx| {
            state.draw_ui(ctx);
        });
        egui_winit.handle_platform_output(window, full_output.platform_output);

        let paint_jobs = self
            .egui_ctx
            .tessellate(full_output.shapes, full_output.pixels_per_point);
        let screen_descriptor = egui_wgpu::ScreenDescriptor {
            size_in_pixels: [gpu.config.width, gpu.config.height],
            pixels_per_point: full_output.pixels_per_point,
        };

        for (id, image_delta) in &full_output.textures_delta.set {
            gpu.egui_renderer
                .update_texture(&gpu.device, &gpu.queue, *id, image_delta);
        }
        let mut encoder = gpu
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("egui_encoder"),
            });
        gpu.egui_renderer.update_buffers(
            &gpu.device,
            &gpu.queue,
            &mut encoder,
            &paint_jobs,
            &screen_descriptor,
        );
        {
            let mut pass = encoder
                .begin_render_pass(&wgpu::RenderPassDescriptor {
                    label: Some("egui_pass"),
                    color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                        view: &view,
                        resolve_target: None,
                        ops: wgpu::Operations {
                            load: wgpu::LoadOp::Load,
                            store: wgpu::StoreOp::Store,
                        },
                    })],
                    depth_stencil_attachment: None,
                    ..Default::default()
                })
                .forget_lifetime();
            gpu.egui_renderer
                .render(&mut pass, &paint_jobs, &screen_descriptor);
        }
        gpu.queue.submit(std::iter::once(encoder.finish()));
        for id in &full_output.textures_delta.free {
            gpu.egui_renderer.free_texture(id);
        }

        output.present();

        if full_output
            .viewport_output
            .get(&egui::ViewportId::ROOT)
            .is_some_and(|v| v.repaint_delay.is_zero())
        {
            window.request_redraw();
        }
    }
}

impl ApplicationHandler for GpuApp {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() {
            return;
        }
        if let Err(e) = self.init(event_loop) {
            tracing::error!("failed to initialize: {e:#}");
            event_loop.exit();
        }
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _window_id: WindowId,
        event: WindowEvent,
    ) {
        if let (Some(egui_winit), Some(window)) = (&mut self.egui_winit, &self.window) {
            let response = egui_winit.on_window_event(window, &event);
            if response.repaint {
                window.request_redraw();
            }
            if response.consumed {
                return;
            }
        }

        match event {
            WindowEvent::CloseRequested => {
                if let Some(state) = &mut self.state {
                    state.animator.dispose(&mut state.source);
                }
                event_loop.exit();
            }
            WindowEvent::Resized(new_size) => {
                let scale = self.window.as_ref().map_or(1.0, |w| w.scale_factor());
                if let Some(gpu) = &mut self.gpu {
                    gpu.config.width = new_size.width.max(1);
                    gpu.config.height = new_size.height.max(1);
                    gpu.surface.configure(&gpu.device, &gpu.config);
                    gpu.renderer
                        .resize(&gpu.device, gpu.config.width, gpu.config.height);
                }
                if let Some(state) = &mut self.state {
                    state.minimized = new_size.width == 0 || new_size.height == 0;
                    state.resize(new_size, scale);
                    state.sync_host_visibility();
                }
                if let Some(window) = &self.window {
                    window.request_redraw();
                }
            }
            WindowEvent::Occluded(occluded) => {
                if let Some(state) = &mut self.state {
                    state.occluded = occluded;
                    state.sync_host_visibility();
                }
            }
            WindowEvent::KeyboardInput {
                event:
                    KeyEvent {
                        physical_key: PhysicalKey::Code(key),
                        state: ElementState::Pressed,
                        ..
                    },
                ..
            } => {
                if key == KeyCode::Escape {
                    event_loop.exit();
                } else if let Some(state) = &mut self.state {
                    state.handle_key(key);
                }
            }
            WindowEvent::CursorMoved { position, .. } => {
                if let Some(state) = &mut self.state {
                    state.cursor = Some(Vec2::new(position.x as f32, position.y as f32));
                    state.update_pointer();
                }
            }
            WindowEvent::CursorLeft { .. } => {
                if let Some(state) = &mut self.state {
                    state.cursor = None;
                    state.update_pointer();
                }
            }
            WindowEvent::MouseInput {
                button: MouseButton::Right,
                state: btn_state,
                ..
            } => {
                if let Some(state) = &mut self.state {
                    state.orbiting = btn_state == ElementState::Pressed;
                }
            }
            WindowEvent::MouseWheel { delta, .. } => {
                if let Some(state) = &mut self.state {
                    let steps = match delta {
                        MouseScrollDelta::LineDelta(_, y) => y,
                        MouseScrollDelta::PixelDelta(p) => p.y as f32 / 40.0,
                    };
                    state.camera.zoom(steps);
                }
                if let Some(window) = &self.window {
                    window.request_redraw();
                }
            }
            WindowEvent::RedrawRequested => self.redraw(),
            _ => {}
        }
    }

    fn device_event(
        &mut self,
        _event_loop: &ActiveEventLoop,
        _device_id: winit::event::DeviceId,
        event: DeviceEvent,
    ) {
        let DeviceEvent::MouseMotion { delta } = event else {
            return;
        };
        let Some(state) = self.state.as_mut().filter(|s| s.orbiting) else {
            return;
        };
        state.camera.orbit(delta.0 as f32, delta.1 as f32);
        if let Some(window) = &self.window {
            window.request_redraw();
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .init();

    let scene = match &cli.scene {
        Some(path) => SceneConfig::load(path)
            .with_context(|| format!("loading scene {}", path.display()))?,
        None => SceneConfig::default(),
    };

    tracing::info!("driftfield-desktop starting");

    let event_loop = EventLoop::new()?;
    // frames are driven by redraw requests; a paused field costs nothing
    event_loop.set_control_flow(ControlFlow::Wait);

    let mut app = GpuApp::new(scene, cli.tier);
    event_loop.run_app(&mut app)?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ndc_maps_corners_and_centre() {
        let size = PhysicalSize::new(200u32, 100);
        assert_eq!(to_ndc(Vec2::new(0.0, 0.0), size), Some(Vec2::new(-1.0, 1.0)));
        assert_eq!(to_ndc(Vec2::new(100.0, 50.0), size), Some(Vec2::ZERO));
        assert_eq!(to_ndc(Vec2::new(200.0, 100.0), size), Some(Vec2::new(1.0, -1.0)));
        assert_eq!(to_ndc(Vec2::ZERO, PhysicalSize::new(0, 0)), None);
    }

    #[test]
    fn redraw_source_tracks_latest_request() {
        let mut source = RedrawSource::default();
        let a = source.request_frame();
        let b = source.request_frame();
        assert_ne!(a, b);
        source.cancel_frame(a);
        assert_eq!(source.pending, Some(b));
        source.cancel_frame(b);
        assert_eq!(source.pending, None);
    }

    #[test]
    fn logical_viewport_divides_scale() {
        let v = logical_viewport(PhysicalSize::new(2560, 1440), 2.0);
        assert_eq!(v, Viewport::new(1280.0, 720.0));
    }
}
