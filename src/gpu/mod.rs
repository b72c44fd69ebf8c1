//! GPU surface: draws a field's [`DrawList`] into a window with wgpu.
//!
//! Points and links are instanced screen-space quads (see `shader.wgsl`).
//! Instance buffers grow on demand and are reused between frames.

use std::sync::Arc;

use bytemuck::{Pod, Zeroable};
use glam::Vec2;
use wgpu::util::DeviceExt;
use winit::window::Window;

use crate::error::GpuError;
use crate::lifecycle::{Surface, SurfaceProvider};
use crate::render::{DrawList, Rgba};

const SHADER: &str = include_str!("shader.wgsl");

#[repr(C)]
#[derive(Copy, Clone, Pod, Zeroable)]
struct ViewportUniform {
    size: [f32; 2],
    _padding: [f32; 2],
}

#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, Pod, Zeroable)]
struct PointInstance {
    center: [f32; 2],
    radius: f32,
    color: [f32; 4],
}

#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, Pod, Zeroable)]
struct LineInstance {
    a: [f32; 2],
    b: [f32; 2],
    half_width: f32,
    color: [f32; 4],
}

const POINT_ATTRIBUTES: [wgpu::VertexAttribute; 3] =
    wgpu::vertex_attr_array![0 => Float32x2, 1 => Float32, 2 => Float32x4];
const LINE_ATTRIBUTES: [wgpu::VertexAttribute; 4] =
    wgpu::vertex_attr_array![0 => Float32x2, 1 => Float32x2, 2 => Float32, 3 => Float32x4];

/// A vertex buffer that doubles when it runs out of room.
struct InstanceBuffer {
    label: &'static str,
    buffer: wgpu::Buffer,
    capacity: usize,
    stride: usize,
    len: u32,
}

impl InstanceBuffer {
    fn new(device: &wgpu::Device, label: &'static str, stride: usize) -> Self {
        let capacity = 256;
        Self {
            label,
            buffer: create_instance_buffer(device, label, capacity * stride),
            capacity,
            stride,
            len: 0,
        }
    }

    fn upload(&mut self, device: &wgpu::Device, queue: &wgpu::Queue, bytes: &[u8]) {
        let count = bytes.len() / self.stride;
        if count > self.capacity {
            self.capacity = count.next_power_of_two();
            self.buffer.destroy();
            self.buffer = create_instance_buffer(device, self.label, self.capacity * self.stride);
        }
        if !bytes.is_empty() {
            queue.write_buffer(&self.buffer, 0, bytes);
        }
        self.len = count as u32;
    }
}

fn create_instance_buffer(device: &wgpu::Device, label: &str, size: usize) -> wgpu::Buffer {
    device.create_buffer(&wgpu::BufferDescriptor {
        label: Some(label),
        size: size as wgpu::BufferAddress,
        usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
        mapped_at_creation: false,
    })
}

/// Window-backed wgpu surface.
pub struct GpuSurface {
    window: Arc<Window>,
    surface: wgpu::Surface<'static>,
    device: wgpu::Device,
    queue: wgpu::Queue,
    config: wgpu::SurfaceConfiguration,
    point_pipeline: wgpu::RenderPipeline,
    line_pipeline: wgpu::RenderPipeline,
    uniform_buffer: wgpu::Buffer,
    uniform_bind_group: wgpu::BindGroup,
    points: InstanceBuffer,
    lines: InstanceBuffer,
    point_scratch: Vec<PointInstance>,
    line_scratch: Vec<LineInstance>,
    released: bool,
}

impl GpuSurface {
    pub async fn new(window: Arc<Window>) -> Result<Self, GpuError> {
        let size = window.inner_size();

        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::PRIMARY,
            ..Default::default()
        });

        let surface = instance.create_surface(Arc::clone(&window))?;

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::LowPower,
                compatible_surface: Some(&surface),
                force_fallback_adapter: false,
            })
            .await
            .ok_or(GpuError::NoAdapter)?;

        let (device, queue) = adapter
            .request_device(
                &wgpu::DeviceDescriptor {
                    label: Some("Field Device"),
                    required_features: wgpu::Features::empty(),
                    required_limits: wgpu::Limits::downlevel_webgl2_defaults()
                        .using_resolution(adapter.limits()),
                    memory_hints: Default::default(),
                },
                None,
            )
            .await?;

        // Colours are already display-encoded, so prefer a linear target.
        let surface_caps = surface.get_capabilities(&adapter);
        let surface_format = surface_caps
            .formats
            .iter()
            .find(|f| !f.is_srgb())
            .or_else(|| surface_caps.formats.first())
            .copied()
            .ok_or(GpuError::NoAdapter)?;
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

        let uniforms = ViewportUniform {
            size: [config.width as f32, config.height as f32],
            _padding: [0.0; 2],
        };
        let uniform_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Viewport Uniform Buffer"),
            contents: bytemuck::bytes_of(&uniforms),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });

        let uniform_bind_group_layout =
            device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                label: Some("Viewport Bind Group Layout"),
                entries: &[wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::VERTEX,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Uniform,
                        has_dynamic_offset: false,
                        min_binding_size: None,
                    },
                    count: None,
                }],
            });

        let uniform_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Viewport Bind Group"),
            layout: &uniform_bind_group_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: uniform_buffer.as_entire_binding(),
            }],
        });

        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("Field Shader"),
            source: wgpu::ShaderSource::Wgsl(SHADER.into()),
        });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("Field Pipeline Layout"),
            bind_group_layouts: &[&uniform_bind_group_layout],
            push_constant_ranges: &[],
        });

        let point_pipeline = create_shape_pipeline(
            &device,
            &pipeline_layout,
            &shader,
            surface_format,
            ("Point Pipeline", "vs_point", "fs_point"),
            wgpu::VertexBufferLayout {
                array_stride: std::mem::size_of::<PointInstance>() as wgpu::BufferAddress,
                step_mode: wgpu::VertexStepMode::Instance,
                attributes: &POINT_ATTRIBUTES,
            },
        );
        let line_pipeline = create_shape_pipeline(
            &device,
            &pipeline_layout,
            &shader,
            surface_format,
            ("Line Pipeline", "vs_line", "fs_line"),
            wgpu::VertexBufferLayout {
                array_stride: std::mem::size_of::<LineInstance>() as wgpu::BufferAddress,
                step_mode: wgpu::VertexStepMode::Instance,
                attributes: &LINE_ATTRIBUTES,
            },
        );

        let points = InstanceBuffer::new(&device, "Point Instances", std::mem::size_of::<PointInstance>());
        let lines = InstanceBuffer::new(&device, "Line Instances", std::mem::size_of::<LineInstance>());

        log::info!(
            "gpu surface ready: {} ({:?}), {}x{}",
            adapter.get_info().name,
            surface_format,
            config.width,
            config.height
        );

        Ok(Self {
            window,
            surface,
            device,
            queue,
            config,
            point_pipeline,
            line_pipeline,
            uniform_buffer,
            uniform_bind_group,
            points,
            lines,
            point_scratch: Vec::new(),
            line_scratch: Vec::new(),
            released: false,
        })
    }

    pub fn window(&self) -> &Arc<Window> {
        &self.window
    }

    /// Reconfigure if the window changed size since the last frame.
    /// Returns false while the window has no area.
    fn sync_size(&mut self) -> bool {
        let size = self.window.inner_size();
        if size.width == 0 || size.height == 0 {
            return false;
        }
        if size.width != self.config.width || size.height != self.config.height {
            self.config.width = size.width;
            self.config.height = size.height;
            self.surface.configure(&self.device, &self.config);
        }
        true
    }

    fn upload(&mut self, frame: &DrawList) {
        let uniforms = ViewportUniform {
            size: [self.config.width as f32, self.config.height as f32],
            _padding: [0.0; 2],
        };
        self.queue
            .write_buffer(&self.uniform_buffer, 0, bytemuck::bytes_of(&uniforms));

        // Overlay instances follow the field's own in each buffer
        self.point_scratch.clear();
        self.point_scratch.extend(frame.points.iter().chain(&frame.overlay_points).map(|p| {
            PointInstance {
                center: p.position.to_array(),
                radius: p.radius.max(0.5),
                color: p.color.to_array(),
            }
        }));
        self.line_scratch.clear();
        self.line_scratch.extend(frame.lines.iter().chain(&frame.overlay_lines).map(|l| LineInstance {
            a: l.a.to_array(),
            b: l.b.to_array(),
            half_width: (l.width * 0.5).max(0.5),
            color: l.color.to_array(),
        }));

        self.points
            .upload(&self.device, &self.queue, bytemuck::cast_slice(&self.point_scratch));
        self.lines
            .upload(&self.device, &self.queue, bytemuck::cast_slice(&self.line_scratch));
    }

    fn render(&mut self, frame: &DrawList) -> Result<(), wgpu::SurfaceError> {
        self.upload(frame);

        let output = self.surface.get_current_texture()?;
        let view = output
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Field Encoder"),
            });

        {
            let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Field Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(clear_color(frame.clear)),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: None,
                timestamp_writes: None,
                occlusion_query_set: None,
            });

            render_pass.set_bind_group(0, &self.uniform_bind_group, &[]);

            let field_lines = frame.lines.len() as u32;
            let field_points = frame.points.len() as u32;
            let passes = [
                (&self.line_pipeline, &self.lines, 0..field_lines),
                (&self.point_pipeline, &self.points, 0..field_points),
                (&self.line_pipeline, &self.lines, field_lines..self.lines.len),
                (&self.point_pipeline, &self.points, field_points..self.points.len),
            ];
            for (pipeline, instances, range) in passes {
                if range.is_empty() {
                    continue;
                }
                render_pass.set_pipeline(pipeline);
                render_pass.set_vertex_buffer(0, instances.buffer.slice(..));
                render_pass.draw(0..6, range);
            }
        }

        self.queue.submit(std::iter::once(encoder.finish()));
        output.present();

        Ok(())
    }
}

impl Surface for GpuSurface {
    fn size(&self) -> Vec2 {
        if self.released {
            return Vec2::ZERO;
        }
        let size = self.window.inner_size();
        Vec2::new(size.width as f32, size.height as f32)
    }

    fn present(&mut self, frame: &DrawList) {
        if self.released || !self.sync_size() {
            return;
        }
        match self.render(frame) {
            Ok(()) => {}
            Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                log::debug!("surface lost or outdated, reconfiguring");
                self.surface.configure(&self.device, &self.config);
            }
            Err(wgpu::SurfaceError::OutOfMemory) => {
                log::error!("gpu out of memory, frame dropped");
            }
            Err(e) => log::warn!("frame dropped: {e}"),
        }
    }

    fn release(&mut self) {
        if self.released {
            return;
        }
        self.points.buffer.destroy();
        self.lines.buffer.destroy();
        self.uniform_buffer.destroy();
        self.released = true;
    }
}

/// Creates a [`GpuSurface`] for one window.
pub struct GpuProvider {
    window: Arc<Window>,
}

impl GpuProvider {
    pub fn new(window: Arc<Window>) -> Self {
        Self { window }
    }
}

impl SurfaceProvider for GpuProvider {
    type Surface = GpuSurface;

    /// Blocks on device creation. Logs and returns `None` if the GPU
    /// cannot be set up.
    fn acquire(&mut self) -> Option<GpuSurface> {
        match pollster::block_on(GpuSurface::new(Arc::clone(&self.window))) {
            Ok(surface) => Some(surface),
            Err(e) => {
                log::error!("{e}");
                None
            }
        }
    }
}

fn create_shape_pipeline(
    device: &wgpu::Device,
    layout: &wgpu::PipelineLayout,
    shader: &wgpu::ShaderModule,
    format: wgpu::TextureFormat,
    (label, vertex_entry, fragment_entry): (&str, &str, &str),
    instances: wgpu::VertexBufferLayout<'_>,
) -> wgpu::RenderPipeline {
    device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
        label: Some(label),
        layout: Some(layout),
        vertex: wgpu::VertexState {
            module: shader,
            entry_point: Some(vertex_entry),
            buffers: &[instances],
            compilation_options: Default::default(),
        },
        fragment: Some(wgpu::FragmentState {
            module: shader,
            entry_point: Some(fragment_entry),
            targets: &[Some(wgpu::ColorTargetState {
                format,
                blend: Some(wgpu::BlendState::ALPHA_BLENDING),
                write_mask: wgpu::ColorWrites::ALL,
            })],
            compilation_options: Default::default(),
        }),
        primitive: wgpu::PrimitiveState {
            topology: wgpu::PrimitiveTopology::TriangleList,
            strip_index_format: None,
            front_face: wgpu::FrontFace::Ccw,
            cull_mode: None,
            polygon_mode: wgpu::PolygonMode::Fill,
            unclipped_depth: false,
            conservative: false,
        },
        depth_stencil: None,
        multisample: wgpu::MultisampleState::default(),
        multiview: None,
        cache: None,
    })
}

fn clear_color(color: Rgba) -> wgpu::Color {
    wgpu::Color {
        r: color.r as f64,
        g: color.g as f64,
        b: color.b as f64,
        a: 1.0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Validates WGSL code using naga.
    fn validate_wgsl(code: &str) -> Result<naga::Module, String> {
        let module = naga::front::wgsl::parse_str(code)
            .map_err(|e| format!("WGSL parse error: {:?}", e))?;

        let mut validator = naga::valid::Validator::new(
            naga::valid::ValidationFlags::all(),
            naga::valid::Capabilities::all(),
        );
        validator
            .validate(&module)
            .map_err(|e| format!("WGSL validation error: {:?}", e))?;

        Ok(module)
    }

    #[test]
    fn test_shader_validates() {
        let module = validate_wgsl(SHADER).unwrap();
        let entries: Vec<&str> = module.entry_points.iter().map(|e| e.name.as_str()).collect();
        for name in ["vs_point", "fs_point", "vs_line", "fs_line"] {
            assert!(entries.contains(&name), "missing entry point {name}");
        }
    }

    #[test]
    fn test_instance_layouts_match_attributes() {
        assert_eq!(std::mem::size_of::<PointInstance>(), 28);
        assert_eq!(POINT_ATTRIBUTES[2].offset, 12);
        assert_eq!(std::mem::size_of::<LineInstance>(), 36);
        assert_eq!(LINE_ATTRIBUTES[3].offset, 20);
        assert_eq!(std::mem::size_of::<ViewportUniform>(), 16);
    }

    #[test]
    fn test_clear_color_is_opaque() {
        let c = clear_color(Rgba::new(0.2, 0.4, 0.6, 0.0));
        assert_eq!(c.a, 1.0);
        assert!((c.g - 0.4).abs() < 1e-6);
    }
}
