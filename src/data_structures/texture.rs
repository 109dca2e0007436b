//! Texture records and GPU textures.
//!
//! This module provides:
//!
//! - [`TextureKind`], the material slot a texture was referenced from
//! - [`Texture`], the per-mesh record of one texture reference
//! - [`TextureHandle`], an index into the texture arena owned by a model
//! - [`GpuTexture`], a wrapper around a wgpu texture and its view, used by the
//!   wgpu backend

use std::{fmt, path::PathBuf};

use serde::Deserialize;

use crate::resources::image::DecodedImage;

/// The material slot a texture is bound through.
///
/// The name doubles as the sampler uniform prefix: the second diffuse texture of
/// a mesh is bound to `diffuse_2`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TextureKind {
    Diffuse,
    Specular,
    Normal,
    Height,
}

impl TextureKind {
    pub const COUNT: usize = 4;

    pub const ALL: [TextureKind; Self::COUNT] = [
        TextureKind::Diffuse,
        TextureKind::Specular,
        TextureKind::Normal,
        TextureKind::Height,
    ];

    pub fn name(self) -> &'static str {
        match self {
            TextureKind::Diffuse => "diffuse",
            TextureKind::Specular => "specular",
            TextureKind::Normal => "normal",
            TextureKind::Height => "height",
        }
    }

    /// Sampler uniform name for the `nth` (1-based) texture of this kind.
    pub fn sampler_name(self, nth: usize) -> String {
        format!("{}_{}", self.name(), nth)
    }

    pub(crate) fn index(self) -> usize {
        self as usize
    }
}

impl fmt::Display for TextureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Index of an uploaded texture inside a model's texture arena.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct TextureHandle(pub(crate) usize);

impl TextureHandle {
    pub fn index(self) -> usize {
        self.0
    }
}

/// One texture reference of a mesh.
///
/// Several records (across meshes, or across slots of one mesh) may share a
/// handle; the upload itself belongs to the model.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Texture {
    pub handle: TextureHandle,
    pub kind: TextureKind,
    pub path: PathBuf,
}

/// A GPU texture with its default view.
#[derive(Clone, Debug)]
pub struct GpuTexture {
    #[allow(unused)]
    pub texture: wgpu::Texture,
    pub view: wgpu::TextureView,
}

impl GpuTexture {
    /// Standard depth buffer texture format (32-bit float).
    pub const DEPTH_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth32Float;

    /// Create a depth texture usable as `RENDER_ATTACHMENT`.
    ///
    /// * `size` is [width, height] of the texture in pixels
    /// * `label` is used as a debug label for the GPU resource
    pub fn create_depth_texture(device: &wgpu::Device, size: [u32; 2], label: &str) -> Self {
        let size = wgpu::Extent3d {
            width: size[0].max(1),
            height: size[1].max(1),
            depth_or_array_layers: 1,
        };
        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some(label),
            size,
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: Self::DEPTH_FORMAT,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            view_formats: &[],
        });
        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        Self { texture, view }
    }

    /// A 1x1 opaque white texture, bound to samplers no texture unit feeds.
    pub fn create_fallback(device: &wgpu::Device, queue: &wgpu::Queue) -> Self {
        let image = DecodedImage {
            width: 1,
            height: 1,
            channels: 4,
            pixels: vec![255; 4],
        };
        Self::from_image(device, queue, &image, Some("fallback texture"))
    }

    /// Upload decoded pixels as an sRGB RGBA8 texture.
    ///
    /// Images with fewer than four channels are expanded first.
    pub fn from_image(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        img: &DecodedImage,
        label: Option<&str>,
    ) -> Self {
        let rgba = img.to_rgba8();
        let size = wgpu::Extent3d {
            width: img.width,
            height: img.height,
            depth_or_array_layers: 1,
        };
        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label,
            size,
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: wgpu::TextureFormat::Rgba8UnormSrgb,
            usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
            view_formats: &[],
        });

        queue.write_texture(
            wgpu::TexelCopyTextureInfo {
                aspect: wgpu::TextureAspect::All,
                texture: &texture,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
            },
            &rgba,
            wgpu::TexelCopyBufferLayout {
                offset: 0,
                bytes_per_row: Some(4 * img.width),
                rows_per_image: Some(img.height),
            },
            size,
        );

        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        Self { texture, view }
    }
}

pub fn create_default_sampler(device: &wgpu::Device) -> wgpu::Sampler {
    device.create_sampler(&wgpu::SamplerDescriptor {
        address_mode_u: wgpu::AddressMode::Repeat,
        address_mode_v: wgpu::AddressMode::Repeat,
        address_mode_w: wgpu::AddressMode::Repeat,
        mag_filter: wgpu::FilterMode::Linear,
        min_filter: wgpu::FilterMode::Linear,
        mipmap_filter: wgpu::MipmapFilterMode::Linear,
        ..Default::default()
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sampler_names_are_one_based() {
        assert_eq!(TextureKind::Diffuse.sampler_name(1), "diffuse_1");
        assert_eq!(TextureKind::Specular.sampler_name(2), "specular_2");
    }

    #[test]
    fn kind_index_matches_declaration_order() {
        for (i, kind) in TextureKind::ALL.into_iter().enumerate() {
            assert_eq!(kind.index(), i);
        }
        let names: std::collections::HashSet<_> =
            TextureKind::ALL.iter().map(|kind| kind.name()).collect();
        assert_eq!(names.len(), TextureKind::COUNT);
    }

    #[test]
    fn kinds_deserialize_lowercase() {
        #[derive(Deserialize)]
        struct Kinds {
            kinds: Vec<TextureKind>,
        }
        let parsed: Kinds = toml::from_str(r#"kinds = ["specular", "height"]"#).unwrap();
        assert_eq!(parsed.kinds, vec![TextureKind::Specular, TextureKind::Height]);
    }
}
