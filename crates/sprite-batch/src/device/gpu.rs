use anyhow::{Context, Result};
use wgpu::SurfaceError;
use winit::dpi::PhysicalSize;
use winit::window::Window;

/// Surface and adapter preferences.
#[derive(Debug, Clone)]
pub struct GpuInit {
    /// Prefer an sRGB surface so that linear shader output is encoded on store.
    pub prefer_srgb: bool,
    /// `Fifo` when set, otherwise `AutoNoVsync`.
    pub vsync: bool,
    pub power_preference: wgpu::PowerPreference,
    pub frame_latency: u32,
}

impl Default for GpuInit {
    fn default() -> Self {
        Self {
            prefer_srgb: true,
            vsync: true,
            power_preference: wgpu::PowerPreference::HighPerformance,
            frame_latency: 2,
        }
    }
}

/// The acquired swapchain image and an encoder for this frame's passes.
pub struct GpuFrame {
    pub surface_texture: wgpu::SurfaceTexture,
    pub view: wgpu::TextureView,
    pub encoder: wgpu::CommandEncoder,
}

/// What the runtime should do after a failed acquire.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum SurfaceErrorAction {
    /// The surface was configured again; try the next frame.
    Reconfigured,
    SkipFrame,
    /// Out of memory; stop the event loop.
    Fatal,
}

/// Device, queue and window surface used by the batch renderer.
pub struct Gpu<'w> {
    _instance: wgpu::Instance,
    surface: wgpu::Surface<'w>,
    device: wgpu::Device,
    queue: wgpu::Queue,
    config: wgpu::SurfaceConfiguration,
    size: PhysicalSize<u32>,
}

impl<'w> Gpu<'w> {
    pub async fn new(window: &'w Window, init: GpuInit) -> Result<Self> {
        let size = window.inner_size();
        anyhow::ensure!(size.width > 0 && size.height > 0, "window has zero size");

        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::all(),
            ..Default::default()
        });
        let surface = instance
            .create_surface(window)
            .context("failed to create wgpu surface")?;

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: init.power_preference,
                compatible_surface: Some(&surface),
                force_fallback_adapter: false,
            })
            .await
            .context("no GPU adapter can present to this window")?;

        let info = adapter.get_info();
        log::info!("GPU adapter: {} ({:?}, {:?})", info.name, info.backend, info.device_type);

        let limits = device_limits(&adapter.limits());
        let (device, queue) = adapter
            .request_device(&wgpu::DeviceDescriptor {
                label: Some("sprite-batch device"),
                required_features: wgpu::Features::empty(),
                required_limits: limits,
                experimental_features: wgpu::ExperimentalFeatures::disabled(),
                memory_hints: wgpu::MemoryHints::Performance,
                trace: wgpu::Trace::Off,
            })
            .await
            .context("failed to open GPU device")?;
        log::debug!("max texture side: {}", device.limits().max_texture_dimension_2d);

        let caps = surface.get_capabilities(&adapter);
        let format = surface_format(&caps.formats, init.prefer_srgb).context("surface reports no formats")?;
        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format,
            width: size.width,
            height: size.height,
            present_mode: if init.vsync { wgpu::PresentMode::Fifo } else { wgpu::PresentMode::AutoNoVsync },
            alpha_mode: caps.alpha_modes.first().copied().unwrap_or(wgpu::CompositeAlphaMode::Auto),
            view_formats: Vec::new(),
            desired_maximum_frame_latency: init.frame_latency,
        };
        surface.configure(&device, &config);
        log::debug!("surface {format:?} {}x{}", size.width, size.height);

        Ok(Self { _instance: instance, surface, device, queue, config, size })
    }

    #[inline]
    pub fn surface_format(&self) -> wgpu::TextureFormat {
        self.config.format
    }

    /// Drawable size in physical pixels.
    #[inline]
    pub fn size(&self) -> PhysicalSize<u32> {
        self.size
    }

    /// Largest texture side the device accepts. Atlas builds are capped to
    /// it by the caller.
    #[inline]
    pub fn max_texture_side(&self) -> u32 {
        self.device.limits().max_texture_dimension_2d
    }

    #[inline]
    pub fn device(&self) -> &wgpu::Device {
        &self.device
    }

    #[inline]
    pub fn queue(&self) -> &wgpu::Queue {
        &self.queue
    }

    /// A zero-sized window keeps the old configuration until it grows again.
    pub fn resize(&mut self, new_size: PhysicalSize<u32>) {
        self.size = new_size;
        if new_size.width > 0 && new_size.height > 0 {
            self.config.width = new_size.width;
            self.config.height = new_size.height;
            self.surface.configure(&self.device, &self.config);
        }
    }

    pub fn begin_frame(&self) -> std::result::Result<GpuFrame, SurfaceError> {
        let surface_texture = self.surface.get_current_texture()?;
        let view = surface_texture.texture.create_view(&Default::default());
        let encoder = self.device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("sprite-batch frame"),
        });
        Ok(GpuFrame { surface_texture, view, encoder })
    }

    /// Submits the frame's command buffer and presents it.
    pub fn submit(&self, frame: GpuFrame) {
        let GpuFrame { surface_texture, view, encoder } = frame;
        self.queue.submit([encoder.finish()]);
        drop(view);
        surface_texture.present();
    }

    pub fn handle_surface_error(&mut self, err: SurfaceError) -> SurfaceErrorAction {
        match err {
            SurfaceError::Lost | SurfaceError::Outdated => {
                if self.size.width > 0 && self.size.height > 0 {
                    self.surface.configure(&self.device, &self.config);
                }
                SurfaceErrorAction::Reconfigured
            }
            SurfaceError::OutOfMemory => SurfaceErrorAction::Fatal,
            SurfaceError::Timeout | SurfaceError::Other => SurfaceErrorAction::SkipFrame,
        }
    }
}

/// Downlevel limits raised to the adapter's texture resolution.
fn device_limits(adapter: &wgpu::Limits) -> wgpu::Limits {
    wgpu::Limits::downlevel_defaults().using_resolution(adapter.clone())
}

/// First sRGB format when preferred (8-bit BGRA/RGBA first), else the
/// surface's first format.
fn surface_format(formats: &[wgpu::TextureFormat], prefer_srgb: bool) -> Option<wgpu::TextureFormat> {
    let first = formats.first().copied()?;
    if !prefer_srgb {
        return Some(first);
    }
    let preferred = [wgpu::TextureFormat::Bgra8UnormSrgb, wgpu::TextureFormat::Rgba8UnormSrgb];
    preferred
        .into_iter()
        .find(|f| formats.contains(f))
        .or_else(|| formats.iter().copied().find(|f| f.is_srgb()))
        .or(Some(first))
}

#[cfg(test)]
mod tests {
    use super::*;
    use wgpu::TextureFormat as F;

    #[test]
    fn srgb_surface_is_preferred() {
        let formats = [F::Rgba16Float, F::Bgra8Unorm, F::Rgba8UnormSrgb];
        assert_eq!(surface_format(&formats, true), Some(F::Rgba8UnormSrgb));
        assert_eq!(surface_format(&formats, false), Some(F::Rgba16Float));
        assert_eq!(surface_format(&[F::Bgra8Unorm], true), Some(F::Bgra8Unorm));
        assert_eq!(surface_format(&[], true), None);
    }

    #[test]
    fn limits_follow_adapter_texture_size() {
        let small = wgpu::Limits { max_texture_dimension_2d: 4096, ..Default::default() };
        assert_eq!(device_limits(&small).max_texture_dimension_2d, 4096);

        let big = wgpu::Limits { max_texture_dimension_2d: 16384, ..Default::default() };
        assert_eq!(device_limits(&big).max_texture_dimension_2d, 16384);
    }
}
