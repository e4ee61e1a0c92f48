//! Sward - procedural grass field demo
//!
//! Usage: sward [--config <file.json>] [--grid <n>] [--cpu-params]
//!
//! Keys: R reloads the config file, P toggles GPU/CPU parameter pass.

use std::path::PathBuf;
use std::sync::Arc;
use winit::{
    application::ApplicationHandler,
    event::{ElementState, KeyEvent, WindowEvent},
    event_loop::ActiveEventLoop,
    keyboard::{KeyCode, PhysicalKey},
    window::{Window, WindowId},
};

use sward::core::{camera::Camera, logging, time::FrameTimer, Result, Vec3};
use sward::grass::{FieldLayout, GrassConfig, GrassSystem};
use sward::render::{
    context::GpuContext,
    window::{self, WindowConfig},
    GrassRenderer, ParameterSource,
};

const SKY_COLOR: wgpu::Color = wgpu::Color {
    r: 0.52,
    g: 0.68,
    b: 0.86,
    a: 1.0,
};

/// Radians per second the camera travels around the field
const ORBIT_SPEED: f32 = 0.08;

/// Command line options
#[derive(Debug, Default)]
struct DemoArgs {
    config_path: Option<PathBuf>,
    grid_size: Option<u32>,
    cpu_params: bool,
}

struct App {
    args: DemoArgs,
    window_config: WindowConfig,
    window: Option<Arc<Window>>,
    gpu: Option<GpuContext>,
    renderer: Option<GrassRenderer>,
    system: GrassSystem,
    camera: Camera,
    timer: FrameTimer,
}

impl App {
    fn new(args: DemoArgs, system: GrassSystem) -> Self {
        let window_config = WindowConfig::default();
        let aspect = window_config.width as f32 / window_config.height as f32;
        Self {
            args,
            window_config,
            window: None,
            gpu: None,
            renderer: None,
            system,
            camera: Camera::new(Vec3::new(0.0, 2.0, 8.0), 60.0, aspect),
            timer: FrameTimer::new(),
        }
    }

    fn init_gpu(&mut self, window: Arc<Window>) -> Result<()> {
        let gpu = pollster::block_on(GpuContext::new(window.clone()))?;
        let size = window.inner_size();
        self.camera.set_aspect(size.width as f32, size.height as f32);

        let source = if self.args.cpu_params {
            ParameterSource::Cpu
        } else {
            ParameterSource::Gpu
        };
        let (width, height) = gpu.size();
        let renderer = GrassRenderer::new(&gpu.device, gpu.format(), width, height, &self.system, source);

        self.window = Some(window);
        self.renderer = Some(renderer);
        self.gpu = Some(gpu);
        Ok(())
    }

    fn update_camera(&mut self) {
        let field = self.system.layout().field();
        let radius = 0.45 * field.patch_size;
        let angle = (self.timer.elapsed_secs_f64() * ORBIT_SPEED as f64 % std::f64::consts::TAU) as f32;
        self.camera.orbit(Vec3::ZERO, radius, 1.6, angle);
    }

    fn render(&mut self) {
        let Some(gpu) = &self.gpu else { return };
        let Some(renderer) = &mut self.renderer else { return };

        let output = match gpu.get_current_texture() {
            Ok(t) => t,
            Err(e) => {
                log::error!("Failed to get surface texture: {}", e);
                return;
            }
        };
        let view = output.texture.create_view(&wgpu::TextureViewDescriptor::default());

        let mut encoder = gpu.device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("frame_encoder"),
        });

        let frame = renderer.prepare(
            &mut encoder,
            &gpu.queue,
            &self.system,
            &self.camera,
            self.timer.elapsed_secs_f64(),
        );
        renderer.render(&frame, &mut encoder, &view, SKY_COLOR);

        gpu.queue.submit(std::iter::once(encoder.finish()));
        output.present();
    }

    fn reload_config(&mut self) {
        let Some(path) = &self.args.config_path else {
            log::info!("No --config file to reload");
            return;
        };
        match GrassConfig::load(path) {
            Ok(config) => self.system.set_config(config),
            Err(e) => log::error!("Failed to reload grass config: {}", e),
        }
    }

    fn toggle_parameter_source(&mut self) {
        if let Some(renderer) = &mut self.renderer {
            let next = match renderer.parameter_source() {
                ParameterSource::Gpu => ParameterSource::Cpu,
                ParameterSource::Cpu => ParameterSource::Gpu,
            };
            renderer.set_parameter_source(next);
        }
    }

    fn handle_key(&mut self, event: &KeyEvent) {
        if event.state != ElementState::Pressed || event.repeat {
            return;
        }
        match event.physical_key {
            PhysicalKey::Code(KeyCode::KeyR) => self.reload_config(),
            PhysicalKey::Code(KeyCode::KeyP) => self.toggle_parameter_source(),
            _ => {}
        }
    }
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() {
            return;
        }

        let result = window::create_window(event_loop, &self.window_config)
            .and_then(|window| self.init_gpu(window));
        if let Err(e) = result {
            log::error!("Failed to start renderer: {}", e);
            event_loop.exit();
        }
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, _id: WindowId, event: WindowEvent) {
        match event {
            WindowEvent::CloseRequested => {
                log::info!("Window close requested");
                event_loop.exit();
            }
            WindowEvent::Resized(size) => {
                if size.width > 0 && size.height > 0 {
                    if let Some(gpu) = &mut self.gpu {
                        gpu.resize(size.width, size.height);
                        self.camera.set_aspect(size.width as f32, size.height as f32);
                        if let Some(renderer) = &mut self.renderer {
                            renderer.resize(&gpu.device, size.width, size.height);
                        }
                    }
                }
            }
            WindowEvent::KeyboardInput { event, .. } => self.handle_key(&event),
            WindowEvent::RedrawRequested => {
                self.timer.tick();
                self.update_camera();
                self.render();

                if self.timer.fps_updated() {
                    log::info!("{:.1} FPS ({} frames)", self.timer.fps(), self.timer.frame_count());
                    if let Some(window) = &self.window {
                        window.set_title(&format!("{} - {:.1} FPS", self.window_config.title, self.timer.fps()));
                    }
                }
            }
            _ => {}
        }
    }

    fn about_to_wait(&mut self, _event_loop: &ActiveEventLoop) {
        if let Some(window) = &self.window {
            window.request_redraw();
        }
    }
}

/// Parse command line arguments
fn parse_args(args: &[String]) -> Result<DemoArgs> {
    let mut parsed = DemoArgs::default();
    let mut iter = args.iter().skip(1);
    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "--config" | "-c" => {
                let path = iter
                    .next()
                    .ok_or_else(|| sward::core::Error::Config("--config needs a file".to_string()))?;
                parsed.config_path = Some(PathBuf::from(path));
            }
            "--grid" | "-g" => {
                let value = iter
                    .next()
                    .ok_or_else(|| sward::core::Error::Config("--grid needs a number".to_string()))?;
                let grid = value
                    .parse()
                    .map_err(|_| sward::core::Error::Config(format!("invalid grid size '{}'", value)))?;
                parsed.grid_size = Some(grid);
            }
            "--cpu-params" => parsed.cpu_params = true,
            other => log::warn!("Ignoring unknown argument '{}'", other),
        }
    }
    Ok(parsed)
}

fn run() -> Result<()> {
    let args: Vec<String> = std::env::args().collect();
    let args = parse_args(&args)?;

    let config = match &args.config_path {
        Some(path) => GrassConfig::load(path)?,
        None => GrassConfig::default(),
    };
    let mut field = FieldLayout::default();
    if let Some(grid) = args.grid_size {
        field.grid_size = grid;
    }

    let system = GrassSystem::new(config, &field)?;
    let mut app = App::new(args, system);
    window::run(&mut app)
}

fn main() {
    logging::init();
    log::info!("Sward starting...");

    if let Err(e) = run() {
        log::error!("{}", e);
        std::process::exit(1);
    }
}
