//! GPU field checks against the host reference. Each test skips when no
//! adapter is available.

use glam::{Vec2, Vec3};
use water_surface::{
    BoundaryMode, Camera, Field, FieldCell, FieldSimulator, GpuContext, SimulationConfig,
    SurfaceConfig, SurfaceRenderer, WaterError, WaterSimulator,
};

const TOLERANCE: f32 = 1e-3;

fn gpu() -> Option<GpuContext> {
    match GpuContext::headless() {
        Ok(ctx) => Some(ctx),
        Err(e) => {
            eprintln!("skipping GPU test: {}", e);
            None
        }
    }
}

fn config(grid_size: u32, boundary: BoundaryMode) -> SimulationConfig {
    SimulationConfig {
        grid_size,
        boundary,
        ..SimulationConfig::default()
    }
}

fn assert_close(gpu: &[FieldCell], cpu: &[FieldCell]) {
    assert_eq!(gpu.len(), cpu.len());
    for (i, (g, c)) in gpu.iter().zip(cpu).enumerate() {
        let diffs = [
            g.height - c.height,
            g.velocity - c.velocity,
            g.normal_x - c.normal_x,
            g.normal_z - c.normal_z,
        ];
        assert!(
            diffs.iter().all(|d| d.abs() < TOLERANCE),
            "cell {} differs: gpu {:?} cpu {:?}",
            i,
            g,
            c
        );
    }
}

/// Run the same script on both backends
fn script(sim: &mut impl FieldSimulator) {
    sim.add_drop(Vec2::new(0.1, -0.2), 0.15, 0.5).unwrap();
    sim.add_drop(Vec2::new(-0.95, 0.9), 0.1, -0.3).unwrap();
    sim.move_volume(Vec3::new(-0.3, 0.0, 0.2), Vec3::new(-0.25, 0.0, 0.2), 0.2)
        .unwrap();
    for _ in 0..5 {
        sim.update().unwrap();
    }
}

#[test]
fn test_fresh_field_is_at_rest() {
    let Some(ctx) = gpu() else { return };
    let sim = WaterSimulator::new(&ctx, &config(32, BoundaryMode::Clamp)).unwrap();
    let cells = sim.read_field().unwrap();
    assert_eq!(cells.len(), 32 * 32);
    assert!(cells.iter().all(|c| *c == FieldCell::REST));
}

#[test]
fn test_drop_matches_host() {
    let Some(ctx) = gpu() else { return };
    let config = config(64, BoundaryMode::Clamp);
    let mut gpu_sim = WaterSimulator::new(&ctx, &config).unwrap();
    let mut cpu_sim = Field::new(&config).unwrap();

    gpu_sim.add_drop(Vec2::ZERO, 0.2, 1.0).unwrap();
    cpu_sim.add_drop(Vec2::ZERO, 0.2, 1.0).unwrap();

    let cells = gpu_sim.read_field().unwrap();
    assert_close(&cells, cpu_sim.current());
    let peak = cells.iter().map(|c| c.height).fold(f32::MIN, f32::max);
    assert!(peak > 0.9, "peak {}", peak);
}

#[test]
fn test_script_matches_host_with_clamped_edges() {
    let Some(ctx) = gpu() else { return };
    let config = config(64, BoundaryMode::Clamp);
    let mut gpu_sim = WaterSimulator::new(&ctx, &config).unwrap();
    let mut cpu_sim = Field::new(&config).unwrap();

    script(&mut gpu_sim);
    script(&mut cpu_sim);

    assert_close(&gpu_sim.read_field().unwrap(), cpu_sim.current());
}

#[test]
fn test_script_matches_host_with_wrapped_edges() {
    let Some(ctx) = gpu() else { return };
    let config = config(48, BoundaryMode::Wrap);
    let mut gpu_sim = WaterSimulator::new(&ctx, &config).unwrap();
    let mut cpu_sim = Field::new(&config).unwrap();

    script(&mut gpu_sim);
    script(&mut cpu_sim);

    assert_close(&gpu_sim.read_field().unwrap(), cpu_sim.current());
}

#[test]
fn test_wrapped_step_crosses_border() {
    let Some(ctx) = gpu() else { return };
    let n = 48;
    let config = config(n, BoundaryMode::Wrap);
    let mut gpu_sim = WaterSimulator::new(&ctx, &config).unwrap();
    let mut cpu_sim = Field::new(&config).unwrap();

    // Near the top-left corner; one step pulls row 0 and column 0 across the seam
    for sim in [&mut gpu_sim as &mut dyn FieldSimulator, &mut cpu_sim] {
        sim.add_drop(Vec2::new(-0.95, 0.9), 0.1, -0.3).unwrap();
        sim.advance().unwrap();
        sim.recompute_normals().unwrap();
    }

    let cells = gpu_sim.read_field().unwrap();
    let row = n as usize;
    assert_close(&cells[..row], &cpu_sim.current()[..row]);
    assert!(cpu_sim.current()[..row].iter().any(|c| c.height != 0.0));
    assert_close(&cells, cpu_sim.current());
}

#[test]
fn test_non_multiple_of_workgroup_grid() {
    let Some(ctx) = gpu() else { return };
    let config = config(37, BoundaryMode::Clamp);
    let mut gpu_sim = WaterSimulator::new(&ctx, &config).unwrap();
    let mut cpu_sim = Field::new(&config).unwrap();

    script(&mut gpu_sim);
    script(&mut cpu_sim);

    assert_close(&gpu_sim.read_field().unwrap(), cpu_sim.current());
}

#[test]
fn test_stationary_volume_is_noop() {
    let Some(ctx) = gpu() else { return };
    let mut sim = WaterSimulator::new(&ctx, &config(32, BoundaryMode::Clamp)).unwrap();
    sim.add_drop(Vec2::new(0.3, 0.3), 0.2, 0.4).unwrap();
    let before = sim.read_field().unwrap();

    let center = Vec3::new(0.0, 0.0, 0.0);
    sim.move_volume(center, center, 0.3).unwrap();

    assert_eq!(sim.read_field().unwrap(), before);
}

#[test]
fn test_degenerate_drop_leaves_field() {
    let Some(ctx) = gpu() else { return };
    let mut sim = WaterSimulator::new(&ctx, &config(32, BoundaryMode::Clamp)).unwrap();
    sim.add_drop(Vec2::ZERO, 0.0, 1.0).unwrap();
    sim.add_drop(Vec2::new(f32::NAN, 0.0), 0.1, 1.0).unwrap();
    sim.add_drop(Vec2::ZERO, 0.1, 0.0).unwrap();

    assert!(sim
        .read_field()
        .unwrap()
        .iter()
        .all(|c| *c == FieldCell::REST));
}

#[test]
fn test_dispose_is_idempotent_and_final() {
    let Some(ctx) = gpu() else { return };
    let mut sim = WaterSimulator::new(&ctx, &config(16, BoundaryMode::Clamp)).unwrap();
    sim.dispose();
    sim.dispose();

    assert!(sim.is_disposed());
    assert!(matches!(
        sim.add_drop(Vec2::ZERO, 0.1, 1.0),
        Err(WaterError::Disposed)
    ));
    assert!(matches!(sim.advance(), Err(WaterError::Disposed)));
    assert!(matches!(sim.update(), Err(WaterError::Disposed)));
    assert!(matches!(sim.read_field(), Err(WaterError::Disposed)));
}

#[test]
fn test_tiny_grid_rejected() {
    let Some(ctx) = gpu() else { return };
    let result = WaterSimulator::new(&ctx, &config(1, BoundaryMode::Clamp));
    assert!(matches!(result, Err(WaterError::InvalidConfig(_))));
}

fn offscreen_target(ctx: &GpuContext, width: u32, height: u32) -> wgpu::Texture {
    ctx.device.create_texture(&wgpu::TextureDescriptor {
        label: Some("test-target"),
        size: wgpu::Extent3d {
            width,
            height,
            depth_or_array_layers: 1,
        },
        mip_level_count: 1,
        sample_count: 1,
        dimension: wgpu::TextureDimension::D2,
        format: wgpu::TextureFormat::Rgba8UnormSrgb,
        usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
        view_formats: &[],
    })
}

#[test]
fn test_render_offscreen() {
    let Some(ctx) = gpu() else { return };
    let mut sim = WaterSimulator::new(&ctx, &config(64, BoundaryMode::Clamp)).unwrap();
    let surface = SurfaceConfig {
        mesh_segments: 32,
        clear_color: Some([0.0, 0.0, 0.0, 1.0]),
        ..SurfaceConfig::default()
    };
    let format = wgpu::TextureFormat::Rgba8UnormSrgb;
    let mut renderer = SurfaceRenderer::new(&ctx, &surface, Camera::default(), format).unwrap();

    let target = offscreen_target(&ctx, 64, 36);
    let view = target.create_view(&wgpu::TextureViewDescriptor::default());

    sim.add_drop(Vec2::ZERO, 0.2, 0.5).unwrap();
    sim.update().unwrap();
    renderer.render(&sim, &view).unwrap();
    sim.update().unwrap();
    renderer.render(&sim, &view).unwrap();
    ctx.device.poll(wgpu::Maintain::Wait);

    renderer.dispose();
    renderer.dispose();
    assert!(matches!(
        renderer.render(&sim, &view),
        Err(WaterError::Disposed)
    ));
}

#[test]
fn test_draw_needs_bound_field() {
    let Some(ctx) = gpu() else { return };
    let format = wgpu::TextureFormat::Rgba8UnormSrgb;
    let renderer =
        SurfaceRenderer::new(&ctx, &SurfaceConfig::default(), Camera::default(), format).unwrap();
    let target = offscreen_target(&ctx, 8, 8);
    let view = target.create_view(&wgpu::TextureViewDescriptor::default());
    assert!(matches!(renderer.draw(&view), Err(WaterError::Resource(_))));
}

#[test]
fn test_render_disposed_field_fails() {
    let Some(ctx) = gpu() else { return };
    let mut sim = WaterSimulator::new(&ctx, &config(16, BoundaryMode::Clamp)).unwrap();
    let format = wgpu::TextureFormat::Rgba8UnormSrgb;
    let mut renderer =
        SurfaceRenderer::new(&ctx, &SurfaceConfig::default(), Camera::default(), format).unwrap();
    sim.dispose();
    assert!(matches!(
        renderer.update_texture(&sim),
        Err(WaterError::Disposed)
    ));
}

#[test]
fn test_renderer_rebinds_only_for_new_simulator() {
    let Some(ctx) = gpu() else { return };
    let format = wgpu::TextureFormat::Rgba8UnormSrgb;
    let mut renderer =
        SurfaceRenderer::new(&ctx, &SurfaceConfig::default(), Camera::default(), format).unwrap();
    let target = offscreen_target(&ctx, 16, 16);
    let view = target.create_view(&wgpu::TextureViewDescriptor::default());
    assert_eq!(renderer.bound_simulator(), None);

    let mut first = WaterSimulator::new(&ctx, &config(16, BoundaryMode::Clamp)).unwrap();
    renderer.render(&first, &view).unwrap();
    assert_eq!(renderer.bound_simulator(), Some(first.id()));

    // A swap picks the other cached binding of the same simulator
    first.update().unwrap();
    renderer.render(&first, &view).unwrap();
    assert_eq!(renderer.bound_simulator(), Some(first.id()));

    let second = WaterSimulator::new(&ctx, &config(16, BoundaryMode::Clamp)).unwrap();
    assert_ne!(first.id(), second.id());
    renderer.render(&second, &view).unwrap();
    assert_eq!(renderer.bound_simulator(), Some(second.id()));
    ctx.device.poll(wgpu::Maintain::Wait);
}
