//! Image decoding for texture uploads.

use std::path::Path;

use image::DynamicImage;

use crate::error::TextureLoadError;

/// Decoded 8-bit pixels, rows tightly packed, top row first.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DecodedImage {
    pub width: u32,
    pub height: u32,
    /// 1 (grey), 2 (grey + alpha), 3 (RGB) or 4 (RGBA).
    pub channels: u8,
    pub pixels: Vec<u8>,
}

impl DecodedImage {
    pub fn from_dynamic(img: DynamicImage) -> Self {
        let (width, height) = (img.width(), img.height());
        let (channels, pixels) = match img.color().channel_count() {
            1 => (1, img.into_luma8().into_raw()),
            2 => (2, img.into_luma_alpha8().into_raw()),
            3 => (3, img.into_rgb8().into_raw()),
            _ => (4, img.into_rgba8().into_raw()),
        };
        Self {
            width,
            height,
            channels,
            pixels,
        }
    }

    /// Expand to four channels; grey is replicated, missing alpha is opaque.
    pub fn to_rgba8(&self) -> Vec<u8> {
        if self.channels == 4 {
            return self.pixels.clone();
        }
        let channels = self.channels.max(1) as usize;
        self.pixels
            .chunks_exact(channels)
            .flat_map(|px| match px {
                [g] => [*g, *g, *g, 255],
                [g, a] => [*g, *g, *g, *a],
                [r, g, b] => [*r, *g, *b, 255],
                _ => [px[0], px[1], px[2], px[3]],
            })
            .collect()
    }
}

/// Where the bytes of a texture come from, after path resolution.
#[derive(Clone, Copy, Debug)]
pub enum ImageSource<'a> {
    File(&'a Path),
    /// Encoded image bytes stored inside the asset, identified by `key`.
    Embedded { key: &'a Path, bytes: &'a [u8] },
}

impl ImageSource<'_> {
    pub fn key(&self) -> &Path {
        match self {
            ImageSource::File(path) => path,
            ImageSource::Embedded { key, .. } => key,
        }
    }
}

/// Turns a texture reference into pixels.
pub trait ImageLoader {
    fn load(&self, source: ImageSource<'_>) -> Result<DecodedImage, TextureLoadError>;
}

/// Decodes files and embedded bytes with the `image` crate.
#[derive(Clone, Copy, Debug, Default)]
pub struct FsImageLoader {
    pub flip_vertically: bool,
}

impl FsImageLoader {
    pub fn new(flip_vertically: bool) -> Self {
        Self { flip_vertically }
    }
}

impl ImageLoader for FsImageLoader {
    fn load(&self, source: ImageSource<'_>) -> Result<DecodedImage, TextureLoadError> {
        log::trace!("Decoding image {}", source.key().display());
        let img = match source {
            ImageSource::File(path) => {
                if !path.is_file() {
                    return Err(TextureLoadError::NotFound(path.to_path_buf()));
                }
                let bytes = std::fs::read(path).map_err(|source| TextureLoadError::Io {
                    path: path.to_path_buf(),
                    source,
                })?;
                decode(path, &bytes)?
            }
            ImageSource::Embedded { key, bytes } => decode(key, bytes)?,
        };
        let img = if self.flip_vertically { img.flipv() } else { img };
        Ok(DecodedImage::from_dynamic(img))
    }
}

fn decode(path: &Path, bytes: &[u8]) -> Result<DynamicImage, TextureLoadError> {
    image::load_from_memory(bytes).map_err(|source| TextureLoadError::Decode {
        path: path.to_path_buf(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rgb_expands_with_opaque_alpha() {
        let img = DecodedImage {
            width: 2,
            height: 1,
            channels: 3,
            pixels: vec![1, 2, 3, 4, 5, 6],
        };
        assert_eq!(img.to_rgba8(), vec![1, 2, 3, 255, 4, 5, 6, 255]);
    }

    #[test]
    fn grey_alpha_is_replicated() {
        let img = DecodedImage {
            width: 1,
            height: 1,
            channels: 2,
            pixels: vec![9, 7],
        };
        assert_eq!(img.to_rgba8(), vec![9, 9, 9, 7]);
    }

    #[test]
    fn embedded_png_keeps_channel_count() {
        let mut bytes = Vec::new();
        image::RgbImage::from_pixel(3, 2, image::Rgb([10, 20, 30]))
            .write_to(&mut std::io::Cursor::new(&mut bytes), image::ImageFormat::Png)
            .unwrap();
        let decoded = FsImageLoader::default()
            .load(ImageSource::Embedded {
                key: Path::new("scene.gltf#image0"),
                bytes: &bytes,
            })
            .unwrap();
        assert_eq!((decoded.width, decoded.height, decoded.channels), (3, 2, 3));
        assert_eq!(&decoded.pixels[..3], &[10, 20, 30]);
    }

    #[test]
    fn missing_file_is_not_found() {
        let err = FsImageLoader::default()
            .load(ImageSource::File(Path::new("/definitely/not/here.png")))
            .unwrap_err();
        assert!(matches!(err, TextureLoadError::NotFound(_)));
    }
}
