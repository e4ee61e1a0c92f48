//! Parameter textures: the persistent per-instance parameter buffers.
//!
//! Three Rgba32Float textures of `grid_size x grid_size`, one texel per
//! blade instance:
//! - shape: height, width, bend, type
//! - clump: dir_to_center.xz, presence, base_facing
//! - motion: facing, phase, wind_sample, lod_seed
//!
//! Written by the parameter pass (storage writes) or by a CPU upload, read
//! by the blade pipelines with exact `textureLoad` addressing.

use wgpu::{Device, Extent3d, Texture};

use crate::grass::pass::{ParamBuffer, ParameterBuffers};
use crate::grass::InstanceAddressing;

/// Texel format of every parameter texture.
pub const PARAM_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba32Float;
/// Bytes per Rgba32Float texel.
const TEXEL_BYTES: u32 = 16;

pub struct ParamTextures {
    textures: [Texture; 3],

    /// Bind group layout for reading from the blade pipelines
    read_bind_group_layout: wgpu::BindGroupLayout,
    read_bind_group: wgpu::BindGroup,
    /// Bind group layout for writing from the parameter pass
    storage_bind_group_layout: wgpu::BindGroupLayout,
    storage_bind_group: wgpu::BindGroup,

    addressing: InstanceAddressing,
}

impl ParamTextures {
    /// Allocate textures for `addressing`; never resized afterwards.
    pub fn new(device: &Device, addressing: InstanceAddressing) -> Self {
        let extent = addressing.texture_extent();
        let size = Extent3d {
            width: extent.x,
            height: extent.y,
            depth_or_array_layers: 1,
        };

        let textures = ParamBuffer::ALL.map(|buffer| {
            device.create_texture(&wgpu::TextureDescriptor {
                label: Some(buffer.label()),
                size,
                mip_level_count: 1,
                sample_count: 1,
                dimension: wgpu::TextureDimension::D2,
                format: PARAM_FORMAT,
                usage: wgpu::TextureUsages::STORAGE_BINDING
                    | wgpu::TextureUsages::TEXTURE_BINDING
                    | wgpu::TextureUsages::COPY_DST,
                view_formats: &[],
            })
        });
        let views = [
            textures[0].create_view(&wgpu::TextureViewDescriptor::default()),
            textures[1].create_view(&wgpu::TextureViewDescriptor::default()),
            textures[2].create_view(&wgpu::TextureViewDescriptor::default()),
        ];

        let read_entry = |binding: u32| wgpu::BindGroupLayoutEntry {
            binding,
            visibility: wgpu::ShaderStages::VERTEX,
            ty: wgpu::BindingType::Texture {
                sample_type: wgpu::TextureSampleType::Float { filterable: false },
                view_dimension: wgpu::TextureViewDimension::D2,
                multisampled: false,
            },
            count: None,
        };
        let read_bind_group_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("grass_params_read_layout"),
            entries: &[read_entry(0), read_entry(1), read_entry(2)],
        });

        let storage_entry = |binding: u32| wgpu::BindGroupLayoutEntry {
            binding,
            visibility: wgpu::ShaderStages::COMPUTE,
            ty: wgpu::BindingType::StorageTexture {
                access: wgpu::StorageTextureAccess::WriteOnly,
                format: PARAM_FORMAT,
                view_dimension: wgpu::TextureViewDimension::D2,
            },
            count: None,
        };
        let storage_bind_group_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("grass_params_storage_layout"),
            entries: &[storage_entry(0), storage_entry(1), storage_entry(2)],
        });

        let entries = [
            wgpu::BindGroupEntry {
                binding: 0,
                resource: wgpu::BindingResource::TextureView(&views[0]),
            },
            wgpu::BindGroupEntry {
                binding: 1,
                resource: wgpu::BindingResource::TextureView(&views[1]),
            },
            wgpu::BindGroupEntry {
                binding: 2,
                resource: wgpu::BindingResource::TextureView(&views[2]),
            },
        ];
        let read_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("grass_params_read_bind_group"),
            layout: &read_bind_group_layout,
            entries: &entries,
        });
        let storage_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("grass_params_storage_bind_group"),
            layout: &storage_bind_group_layout,
            entries: &entries,
        });

        log::info!(
            "Created grass parameter textures: 3 x {}x{} Rgba32Float ({} KiB)",
            extent.x,
            extent.y,
            3 * addressing.instance_count() as u64 * TEXEL_BYTES as u64 / 1024
        );

        Self {
            textures,
            read_bind_group_layout,
            read_bind_group,
            storage_bind_group_layout,
            storage_bind_group,
            addressing,
        }
    }

    /// Upload CPU-computed parameters in place of the compute pass.
    pub fn upload(&self, queue: &wgpu::Queue, params: &ParameterBuffers) {
        debug_assert_eq!(params.addressing(), self.addressing);
        let extent = self.addressing.texture_extent();
        for (texture, buffer) in self.textures.iter().zip(ParamBuffer::ALL) {
            queue.write_texture(
                wgpu::TexelCopyTextureInfo {
                    texture,
                    mip_level: 0,
                    origin: wgpu::Origin3d::ZERO,
                    aspect: wgpu::TextureAspect::All,
                },
                bytemuck::cast_slice(params.texels(buffer)),
                wgpu::TexelCopyBufferLayout {
                    offset: 0,
                    bytes_per_row: Some(extent.x * TEXEL_BYTES),
                    rows_per_image: Some(extent.y),
                },
                Extent3d {
                    width: extent.x,
                    height: extent.y,
                    depth_or_array_layers: 1,
                },
            );
        }
    }

    pub fn addressing(&self) -> InstanceAddressing {
        self.addressing
    }

    pub fn read_bind_group_layout(&self) -> &wgpu::BindGroupLayout {
        &self.read_bind_group_layout
    }

    pub fn read_bind_group(&self) -> &wgpu::BindGroup {
        &self.read_bind_group
    }

    pub fn storage_bind_group_layout(&self) -> &wgpu::BindGroupLayout {
        &self.storage_bind_group_layout
    }

    pub fn storage_bind_group(&self) -> &wgpu::BindGroup {
        &self.storage_bind_group
    }
}
