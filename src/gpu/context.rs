use std::sync::Arc;
use wgpu::{Adapter, Device, Instance, Queue, Surface, SurfaceConfiguration};
use winit::window::Window;

use crate::error::{Result, WaterError};

/// GPU context holding the device and queue shared by simulator and renderer
pub struct GpuContext {
    pub device: Arc<Device>,
    pub queue: Arc<Queue>,
    adapter: Adapter,
}

/// Window surface and its configuration
pub struct WindowSurface {
    pub surface: Surface<'static>,
    pub config: SurfaceConfiguration,
}

impl GpuContext {
    /// Create a context that can present to the given window
    pub async fn new(window: Arc<Window>) -> Result<(Self, WindowSurface)> {
        let instance = Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::PRIMARY,
            ..Default::default()
        });

        let surface = instance.create_surface(window.clone())?;
        let context = Self::from_instance(&instance, Some(&surface)).await?;

        let size = window.inner_size();
        let config = surface
            .get_default_config(&context.adapter, size.width.max(1), size.height.max(1))
            .ok_or(WaterError::SurfaceUnsupported)?;
        surface.configure(&context.device, &config);

        Ok((context, WindowSurface { surface, config }))
    }

    /// Create a context without a window, for offscreen work and tests
    pub fn headless() -> Result<Self> {
        let instance = Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::all(),
            ..Default::default()
        });
        pollster::block_on(Self::from_instance(&instance, None))
    }

    async fn from_instance(instance: &Instance, surface: Option<&Surface<'static>>) -> Result<Self> {
        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::HighPerformance,
                compatible_surface: surface,
                force_fallback_adapter: false,
            })
            .await
            .ok_or(WaterError::AdapterNotFound)?;

        log::info!("Using GPU: {}", adapter.get_info().name);

        let (device, queue) = adapter
            .request_device(
                &wgpu::DeviceDescriptor {
                    label: Some("water-surface-device"),
                    required_features: wgpu::Features::empty(),
                    required_limits: wgpu::Limits::default().using_resolution(adapter.limits()),
                    memory_hints: wgpu::MemoryHints::Performance,
                },
                None,
            )
            .await?;

        Ok(Self {
            device: Arc::new(device),
            queue: Arc::new(queue),
            adapter,
        })
    }

    pub fn adapter_info(&self) -> wgpu::AdapterInfo {
        self.adapter.get_info()
    }

    /// Run `build` and report any allocation or validation failure it caused
    pub(crate) fn capture_errors<T>(&self, what: &str, build: impl FnOnce() -> T) -> Result<T> {
        self.device.push_error_scope(wgpu::ErrorFilter::Validation);
        self.device.push_error_scope(wgpu::ErrorFilter::OutOfMemory);
        let value = build();
        let oom = pollster::block_on(self.device.pop_error_scope());
        let validation = pollster::block_on(self.device.pop_error_scope());
        match oom.or(validation) {
            Some(error) => Err(WaterError::Resource(format!("{}: {}", what, error))),
            None => Ok(value),
        }
    }
}

impl WindowSurface {
    /// Handle window resize
    pub fn resize(&mut self, device: &Device, new_size: winit::dpi::PhysicalSize<u32>) {
        if new_size.width > 0 && new_size.height > 0 {
            self.config.width = new_size.width;
            self.config.height = new_size.height;
            self.surface.configure(device, &self.config);
        }
    }

    /// Get current surface texture format
    pub fn format(&self) -> wgpu::TextureFormat {
        self.config.format
    }

    pub fn aspect(&self) -> f32 {
        self.config.width as f32 / self.config.height.max(1) as f32
    }
}
