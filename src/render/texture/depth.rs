//! Depth targets: the main depth buffer and the blade shadow map.

use glam::{Mat4, Vec3};
use wgpu::{Device, Extent3d, TextureView};

use crate::render::buffer::{CameraBuffer, CameraUniform};

pub const DEPTH_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth32Float;

/// Texture extent for a `width x height` target; zero sides become one.
pub fn depth_extent(width: u32, height: u32) -> Extent3d {
    Extent3d {
        width: width.max(1),
        height: height.max(1),
        depth_or_array_layers: 1,
    }
}

/// Screen-sized depth buffer
pub struct DepthTexture {
    texture: wgpu::Texture,
    view: TextureView,
}

impl DepthTexture {
    pub fn new(device: &Device, width: u32, height: u32) -> Self {
        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some("depth_texture"),
            size: depth_extent(width, height),
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: DEPTH_FORMAT,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            view_formats: &[],
        });
        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        Self { texture, view }
    }

    pub fn view(&self) -> &TextureView {
        &self.view
    }

    /// Whether a `width x height` target can keep using this buffer.
    pub fn matches(&self, width: u32, height: u32) -> bool {
        self.texture.size() == depth_extent(width, height)
    }
}

/// Directional shadow map with its light camera.
///
/// Bound at group 3 of the blade pipeline: depth texture, comparison
/// sampler, light view-projection.
pub struct ShadowMap {
    view: TextureView,
    light_camera: CameraBuffer,
    bind_group_layout: wgpu::BindGroupLayout,
    bind_group: wgpu::BindGroup,
    size: u32,
}

impl ShadowMap {
    pub fn new(device: &Device, size: u32) -> Self {
        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some("grass_shadow_map"),
            size: Extent3d {
                width: size,
                height: size,
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: DEPTH_FORMAT,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT | wgpu::TextureUsages::TEXTURE_BINDING,
            view_formats: &[],
        });
        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());

        let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("grass_shadow_sampler"),
            address_mode_u: wgpu::AddressMode::ClampToEdge,
            address_mode_v: wgpu::AddressMode::ClampToEdge,
            address_mode_w: wgpu::AddressMode::ClampToEdge,
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            compare: Some(wgpu::CompareFunction::LessEqual),
            ..Default::default()
        });

        let light_camera = CameraBuffer::new(device, "grass_light_camera");

        let bind_group_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("grass_shadow_layout"),
            entries: &[
                wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Texture {
                        sample_type: wgpu::TextureSampleType::Depth,
                        view_dimension: wgpu::TextureViewDimension::D2,
                        multisampled: false,
                    },
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: 1,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Comparison),
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: 2,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Uniform,
                        has_dynamic_offset: false,
                        min_binding_size: None,
                    },
                    count: None,
                },
            ],
        });

        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("grass_shadow_bind_group"),
            layout: &bind_group_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: wgpu::BindingResource::TextureView(&view),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::Sampler(&sampler),
                },
                wgpu::BindGroupEntry {
                    binding: 2,
                    resource: light_camera.buffer().as_entire_binding(),
                },
            ],
        });

        Self {
            view,
            light_camera,
            bind_group_layout,
            bind_group,
            size,
        }
    }

    /// Point the light camera at the field from `light_direction`.
    pub fn update_light(&self, queue: &wgpu::Queue, light_direction: Vec3, center: Vec3, extent: f32) {
        let view_proj = light_view_projection(light_direction, center, extent);
        self.light_camera.write(queue, &CameraUniform::from_matrix(view_proj, center));
    }

    pub fn view(&self) -> &TextureView {
        &self.view
    }

    /// Light camera, bound at group 0 of the shadow pipeline.
    pub fn light_camera(&self) -> &CameraBuffer {
        &self.light_camera
    }

    pub fn bind_group_layout(&self) -> &wgpu::BindGroupLayout {
        &self.bind_group_layout
    }

    pub fn bind_group(&self) -> &wgpu::BindGroup {
        &self.bind_group
    }

    pub fn size(&self) -> u32 {
        self.size
    }
}

/// Orthographic light transform covering a square field of half-size `extent`.
pub fn light_view_projection(light_direction: Vec3, center: Vec3, extent: f32) -> Mat4 {
    let dir = light_direction.normalize_or(Vec3::Y);
    let eye = center + dir * (extent * 2.0);
    // Avoid a degenerate up vector when the light is overhead
    let up = if dir.y.abs() > 0.99 { Vec3::Z } else { Vec3::Y };
    let view = Mat4::look_at_rh(eye, center, up);
    let proj = Mat4::orthographic_rh(-extent, extent, -extent, extent, 0.01, extent * 4.0);
    proj * view
}
