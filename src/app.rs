use std::f32::consts::TAU;
use std::sync::Arc;
use std::time::Instant;

use glam::{Vec2, Vec3};
use rand::rngs::ThreadRng;
use rand::Rng;
use winit::application::ApplicationHandler;
use winit::dpi::PhysicalPosition;
use winit::event::{ElementState, MouseButton, WindowEvent};
use winit::event_loop::ActiveEventLoop;
use winit::keyboard::{KeyCode, PhysicalKey};
use winit::window::{Window, WindowId};

use water_surface::gpu::WindowSurface;
use water_surface::{
    Camera, FieldSimulator, GpuContext, SurfaceRenderer, WaterConfig, WaterError, WaterSimulator,
};

/// Chance per frame that a rain drop lands
const RAIN_PROBABILITY: f64 = 0.3;
const RAIN_RADIUS: f32 = 0.03;
const RAIN_STRENGTH: f32 = 0.01;

const CLICK_RADIUS: f32 = 0.06;
const CLICK_STRENGTH: f32 = 0.03;

const SPHERE_RADIUS: f32 = 0.2;
const SPHERE_ORBIT: f32 = 0.55;
/// Radians per frame
const SPHERE_SPEED: f32 = 0.01;
const CAMERA_SPEED: f32 = 0.003;
/// Radians per key press
const LIGHT_STEP: f32 = TAU / 16.0;

const CLEAR_COLOR: [f64; 4] = [0.02, 0.05, 0.1, 1.0];

struct Demo {
    gpu: GpuContext,
    surface: WindowSurface,
    simulator: WaterSimulator,
    renderer: SurfaceRenderer,
}

/// Things the keyboard toggles
struct Controls {
    raining: bool,
    orbit_camera: bool,
    camera_angle: f32,
    light_angle: f32,
}

impl Default for Controls {
    fn default() -> Self {
        Self {
            raining: true,
            orbit_camera: false,
            camera_angle: 0.0,
            light_angle: 0.0,
        }
    }
}

/// Application state
pub struct App {
    window: Option<Arc<Window>>,
    demo: Option<Demo>,
    config: WaterConfig,
    controls: Controls,
    rng: ThreadRng,
    cursor: Option<PhysicalPosition<f64>>,
    sphere_angle: f32,
    sphere_center: Vec3,
    fps_counter: FpsCounter,
}

impl App {
    pub fn new() -> Self {
        let mut config = WaterConfig::default();
        config.surface.clear_color = Some(CLEAR_COLOR);
        Self {
            window: None,
            demo: None,
            config,
            controls: Controls::default(),
            rng: rand::thread_rng(),
            cursor: None,
            sphere_angle: 0.0,
            sphere_center: sphere_position(0.0),
            fps_counter: FpsCounter::new(),
        }
    }

    fn init(&self, window: Arc<Window>) -> Result<Demo, WaterError> {
        let (gpu, surface) = pollster::block_on(GpuContext::new(window))?;
        log::info!("Backend: {:?}", gpu.adapter_info().backend);
        let simulator = WaterSimulator::new(&gpu, &self.config.simulation)?;
        let camera = Camera {
            aspect: surface.aspect(),
            ..Camera::default()
        };
        let renderer = SurfaceRenderer::new(&gpu, &self.config.surface, camera, surface.format())?;
        Ok(Demo {
            gpu,
            surface,
            simulator,
            renderer,
        })
    }

    /// Feed this frame's disturbances, step the field, then draw it
    fn frame(&mut self) -> Result<(), WaterError> {
        let Some(demo) = self.demo.as_mut() else {
            return Ok(());
        };

        if self.controls.raining && self.rng.gen_bool(RAIN_PROBABILITY) {
            let center = Vec2::new(self.rng.gen_range(-1.0..1.0), self.rng.gen_range(-1.0..1.0));
            let strength = if self.rng.gen_bool(0.5) {
                RAIN_STRENGTH
            } else {
                -RAIN_STRENGTH
            };
            demo.simulator.add_drop(center, RAIN_RADIUS, strength)?;
        }

        self.sphere_angle = (self.sphere_angle + SPHERE_SPEED) % TAU;
        let next = sphere_position(self.sphere_angle);
        demo.simulator
            .move_volume(self.sphere_center, next, SPHERE_RADIUS)?;
        self.sphere_center = next;

        demo.simulator.update()?;

        if self.controls.orbit_camera {
            self.controls.camera_angle = (self.controls.camera_angle + CAMERA_SPEED) % TAU;
            let mut camera = *demo.renderer.camera();
            camera.orbit(self.controls.camera_angle);
            demo.renderer.set_camera(camera);
        }

        let output = match demo.surface.surface.get_current_texture() {
            Ok(texture) => texture,
            Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                demo.surface
                    .surface
                    .configure(&demo.gpu.device, &demo.surface.config);
                return Ok(());
            }
            Err(e) => {
                log::error!("Surface error: {:?}", e);
                return Ok(());
            }
        };
        let view = output
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());
        demo.renderer.render(&demo.simulator, &view)?;
        output.present();

        if let Some(fps) = self.fps_counter.tick() {
            if let Some(window) = &self.window {
                let rain = if self.controls.raining { "" } else { " [rain paused]" };
                window.set_title(&format!("Water - {:.0} FPS{}", fps, rain));
            }
        }
        Ok(())
    }

    fn drop_at_cursor(&mut self) -> Result<(), WaterError> {
        let (Some(demo), Some(cursor)) = (self.demo.as_mut(), self.cursor) else {
            return Ok(());
        };
        let config = &demo.surface.config;
        let ndc = Vec2::new(
            (cursor.x as f32 / config.width.max(1) as f32) * 2.0 - 1.0,
            1.0 - (cursor.y as f32 / config.height.max(1) as f32) * 2.0,
        );
        let hit = demo.renderer.camera().pick_water_plane(ndc);
        match hit.and_then(|world| demo.renderer.field_point(world)) {
            Some(center) => {
                log::debug!("Drop at {:?}", center);
                demo.simulator.add_drop(center, CLICK_RADIUS, CLICK_STRENGTH)
            }
            None => Ok(()),
        }
    }

    fn reset(&mut self) -> Result<(), WaterError> {
        if let Some(demo) = self.demo.as_mut() {
            demo.simulator.dispose();
            demo.simulator = WaterSimulator::new(&demo.gpu, &self.config.simulation)?;
            log::info!("Water reset");
        }
        Ok(())
    }

    fn handle_key(&mut self, key_code: KeyCode) -> Result<(), WaterError> {
        match key_code {
            KeyCode::Space => {
                self.controls.raining = !self.controls.raining;
                log::info!("Rain: {}", if self.controls.raining { "ON" } else { "OFF" });
            }
            KeyCode::KeyL => {
                self.controls.light_angle = (self.controls.light_angle + LIGHT_STEP) % TAU;
                if let Some(demo) = self.demo.as_mut() {
                    let base = self.config.surface.light_direction;
                    let (sin, cos) = self.controls.light_angle.sin_cos();
                    let rotated = Vec3::new(
                        base.x * cos - base.z * sin,
                        base.y,
                        base.x * sin + base.z * cos,
                    );
                    demo.renderer.set_light_direction(rotated);
                    log::info!("Light direction: {:?}", demo.renderer.light_direction());
                }
            }
            KeyCode::KeyC => {
                self.controls.orbit_camera = !self.controls.orbit_camera;
                log::info!(
                    "Orbiting camera: {}",
                    if self.controls.orbit_camera { "ON" } else { "OFF" }
                );
            }
            KeyCode::KeyR => self.reset()?,
            _ => {}
        }
        Ok(())
    }

    fn report(&self, event_loop: &ActiveEventLoop, result: Result<(), WaterError>) {
        if let Err(e) = result {
            log::error!("Water simulation failed: {}", e);
            event_loop.exit();
        }
    }
}

fn sphere_position(angle: f32) -> Vec3 {
    Vec3::new(angle.cos() * SPHERE_ORBIT, 0.0, angle.sin() * SPHERE_ORBIT)
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() {
            return;
        }

        log::info!("Initializing water demo...");
        log::info!(
            "Grid size: {}x{}",
            self.config.simulation.grid_size,
            self.config.simulation.grid_size
        );

        let window_attrs = Window::default_attributes()
            .with_title("Water - Initializing...")
            .with_inner_size(winit::dpi::LogicalSize::new(1280, 720));

        let window = Arc::new(
            event_loop
                .create_window(window_attrs)
                .expect("Failed to create window"),
        );

        match self.init(window.clone()) {
            Ok(demo) => self.demo = Some(demo),
            Err(e) => {
                log::error!("Initialization failed: {}", e);
                event_loop.exit();
                return;
            }
        }

        log::info!("Initialization complete!");
        log::info!("Controls:");
        log::info!("  Left click: Drop");
        log::info!("  Space: Pause/resume rain");
        log::info!("  L: Rotate light");
        log::info!("  C: Toggle orbiting camera");
        log::info!("  R: Reset water");
        log::info!("  Escape: Quit");

        window.request_redraw();
        self.window = Some(window);
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _window_id: WindowId,
        event: WindowEvent,
    ) {
        match event {
            WindowEvent::CloseRequested => {
                log::info!("Close requested, exiting...");
                event_loop.exit();
            }
            WindowEvent::KeyboardInput { event, .. } => {
                if event.state.is_pressed() {
                    if let PhysicalKey::Code(key_code) = event.physical_key {
                        if key_code == KeyCode::Escape {
                            log::info!("Escape pressed, exiting...");
                            event_loop.exit();
                        } else {
                            let result = self.handle_key(key_code);
                            self.report(event_loop, result);
                        }
                    }
                }
            }
            WindowEvent::CursorMoved { position, .. } => {
                self.cursor = Some(position);
            }
            WindowEvent::CursorLeft { .. } => {
                self.cursor = None;
            }
            WindowEvent::MouseInput {
                state: ElementState::Pressed,
                button: MouseButton::Left,
                ..
            } => {
                let result = self.drop_at_cursor();
                self.report(event_loop, result);
            }
            WindowEvent::Resized(new_size) => {
                if let Some(demo) = &mut self.demo {
                    log::info!("Window resized to {}x{}", new_size.width, new_size.height);
                    demo.surface.resize(&demo.gpu.device, new_size);
                    demo.renderer.set_aspect(demo.surface.aspect());
                }
            }
            WindowEvent::RedrawRequested => {
                let result = self.frame();
                self.report(event_loop, result);
                if let Some(window) = &self.window {
                    window.request_redraw();
                }
            }
            _ => {}
        }
    }

    fn exiting(&mut self, _event_loop: &ActiveEventLoop) {
        if let Some(demo) = self.demo.as_mut() {
            demo.renderer.dispose();
            demo.simulator.dispose();
        }
    }
}

/// Simple FPS counter
struct FpsCounter {
    last_update: Instant,
    frame_count: u32,
}

impl FpsCounter {
    fn new() -> Self {
        Self {
            last_update: Instant::now(),
            frame_count: 0,
        }
    }

    /// Tick the counter, returns Some(fps) every second
    fn tick(&mut self) -> Option<f64> {
        self.frame_count += 1;
        let elapsed = self.last_update.elapsed();

        if elapsed.as_secs_f64() >= 1.0 {
            let fps = self.frame_count as f64 / elapsed.as_secs_f64();
            self.frame_count = 0;
            self.last_update = Instant::now();
            Some(fps)
        } else {
            None
        }
    }
}
