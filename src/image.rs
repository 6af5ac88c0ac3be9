//! Image acquisition
//!
//! Decodes a PNG or JPEG (detected from its leading bytes), reduces it to
//! 8-bit luma, resamples it to the network's input size by
//! nearest-source-pixel sampling and scales it into `[0, 1]`.
//!
//! Luma uses the 16-bit integer weights `19595 R + 38470 G + 7471 B` over
//! alpha-premultiplied 16-bit channels. 8-bit samples are widened by 257
//! first, so fully transparent pixels come out black and gray images pass
//! through unchanged at either bit depth.

use crate::error::{CnnError, Result};
use crate::tensor::Tensor3D;
use jpeg_decoder::PixelFormat;
use png::{BitDepth, ColorType, Decoder, Transformations};
use std::fs;
use std::io::Read;
use std::path::Path;

const PNG_SIGNATURE: [u8; 8] = [0x89, b'P', b'N', b'G', 0x0d, 0x0a, 0x1a, 0x0a];
const JPEG_SOI: [u8; 3] = [0xff, 0xd8, 0xff];

/// Container formats the loader understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageFormat {
    Png,
    Jpeg,
}

impl ImageFormat {
    /// Detects the format from magic bytes; the file extension is ignored.
    pub fn sniff(bytes: &[u8]) -> Option<Self> {
        if bytes.starts_with(&PNG_SIGNATURE) {
            Some(ImageFormat::Png)
        } else if bytes.starts_with(&JPEG_SOI) {
            Some(ImageFormat::Jpeg)
        } else {
            None
        }
    }
}

/// An 8-bit single-channel image, row-major.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LumaImage {
    pub width: usize,
    pub height: usize,
    pub pixels: Vec<u8>,
}

/// Luma of one non-premultiplied RGBA pixel with 16-bit channels.
pub fn luma16(r: u16, g: u16, b: u16, a: u16) -> u8 {
    let premultiply = |c: u16| u64::from(c) * u64::from(a) / 0xffff;
    let y = (19595 * premultiply(r) + 38470 * premultiply(g) + 7471 * premultiply(b) + (1 << 15))
        >> 24;
    y as u8
}

/// Luma of one RGBA pixel.
pub fn luma(r: u8, g: u8, b: u8, a: u8) -> u8 {
    luma16(widen(r), widen(g), widen(b), widen(a))
}

/// Luma of one CMYK pixel, inks in `0..=255` with 0 meaning no ink.
pub fn cmyk_luma(c: u8, m: u8, y: u8, k: u8) -> u8 {
    let white = 0xffff - u32::from(widen(k));
    let channel = |ink: u8| ((0xffff - u32::from(widen(ink))) * white / 0xffff) as u16;
    luma16(channel(c), channel(m), channel(y), 0xffff)
}

fn widen(v: u8) -> u16 {
    u16::from(v) * 257
}

/// Convert one decoded PNG frame (8 or 16 bits per sample) to luma.
pub fn frame_to_luma(
    bytes: &[u8],
    color_type: ColorType,
    bit_depth: BitDepth,
    width: usize,
    height: usize,
    line_size: usize,
) -> Result<LumaImage> {
    let samples = match color_type {
        ColorType::Grayscale => 1,
        ColorType::GrayscaleAlpha => 2,
        ColorType::Rgb => 3,
        ColorType::Rgba => 4,
        ColorType::Indexed => {
            return Err(CnnError::UnsupportedImage(
                "indexed color was not expanded".to_string(),
            ))
        }
    };
    let sample_bytes = match bit_depth {
        BitDepth::Eight => 1,
        BitDepth::Sixteen => 2,
        other => {
            return Err(CnnError::UnsupportedImage(format!(
                "{:?} bit samples were not expanded",
                other
            )))
        }
    };
    let pixel_bytes = samples * sample_bytes;
    if line_size < width * pixel_bytes || bytes.len() < line_size * height {
        return Err(CnnError::UnsupportedImage(format!(
            "frame of {} bytes is too small for {}x{} {:?}",
            bytes.len(),
            width,
            height,
            color_type
        )));
    }

    // 16-bit PNG samples are big-endian
    let sample = |px: &[u8], i: usize| -> u16 {
        if sample_bytes == 2 {
            u16::from_be_bytes([px[2 * i], px[2 * i + 1]])
        } else {
            widen(px[i])
        }
    };

    let mut pixels = Vec::with_capacity(width * height);
    for row in bytes.chunks(line_size).take(height) {
        for px in row[..width * pixel_bytes].chunks_exact(pixel_bytes) {
            let y = match samples {
                1 => {
                    let v = sample(px, 0);
                    luma16(v, v, v, 0xffff)
                }
                2 => {
                    let v = sample(px, 0);
                    luma16(v, v, v, sample(px, 1))
                }
                3 => luma16(sample(px, 0), sample(px, 1), sample(px, 2), 0xffff),
                _ => luma16(sample(px, 0), sample(px, 1), sample(px, 2), sample(px, 3)),
            };
            pixels.push(y);
        }
    }

    Ok(LumaImage {
        width,
        height,
        pixels,
    })
}

/// Nearest-source-pixel resample: output `(y, x)` reads source
/// `(y * src_height / height, x * src_width / width)`.
pub fn resample_nearest(image: &LumaImage, width: usize, height: usize) -> Result<LumaImage> {
    if width == 0 || height == 0 {
        return Err(CnnError::invalid_config(format!(
            "target size must be positive, got {}x{}",
            height, width
        )));
    }
    if image.width == 0 || image.height == 0 {
        return Err(CnnError::UnsupportedImage("image has no pixels".to_string()));
    }

    let mut pixels = Vec::with_capacity(width * height);
    for y in 0..height {
        let sy = y * image.height / height;
        for x in 0..width {
            let sx = x * image.width / width;
            pixels.push(image.pixels[sy * image.width + sx]);
        }
    }

    Ok(LumaImage {
        width,
        height,
        pixels,
    })
}

/// 1×H×W tensor with every pixel divided by 255.
pub fn to_tensor(image: &LumaImage) -> Result<Tensor3D> {
    let data = image.pixels.iter().map(|&p| f32::from(p) / 255.0).collect();
    Tensor3D::new(1, image.height, image.width, data)
}

/// Decode a PNG or JPEG held in memory into a luma image at its native size.
pub fn decode_luma(bytes: &[u8]) -> Result<LumaImage> {
    match ImageFormat::sniff(bytes) {
        Some(ImageFormat::Png) => decode_png(bytes),
        Some(ImageFormat::Jpeg) => decode_jpeg(bytes),
        None => Err(CnnError::UnsupportedImage(
            "unrecognized format, expected PNG or JPEG".to_string(),
        )),
    }
}

/// Decode a PNG stream. Palette and sub-byte images are expanded to 8 bits;
/// 16-bit images keep their full precision.
pub fn decode_png<R: Read>(reader: R) -> Result<LumaImage> {
    let mut decoder = Decoder::new(reader);
    decoder.set_transformations(Transformations::EXPAND);
    let mut reader = decoder.read_info()?;

    let mut buf = vec![0; reader.output_buffer_size()];
    let info = reader.next_frame(&mut buf)?;
    tracing::debug!(
        width = info.width,
        height = info.height,
        color = ?info.color_type,
        depth = ?info.bit_depth,
        "decoded png"
    );

    frame_to_luma(
        &buf[..info.buffer_size()],
        info.color_type,
        info.bit_depth,
        info.width as usize,
        info.height as usize,
        info.line_size,
    )
}

/// Decode a baseline or progressive JPEG stream.
pub fn decode_jpeg<R: Read>(reader: R) -> Result<LumaImage> {
    let mut decoder = jpeg_decoder::Decoder::new(reader);
    let data = decoder.decode()?;
    let info = decoder
        .info()
        .ok_or_else(|| CnnError::UnsupportedImage("jpeg has no frame header".to_string()))?;
    tracing::debug!(
        width = info.width,
        height = info.height,
        format = ?info.pixel_format,
        "decoded jpeg"
    );

    let width = usize::from(info.width);
    let height = usize::from(info.height);
    let samples = match info.pixel_format {
        PixelFormat::L8 => 1,
        PixelFormat::RGB24 => 3,
        PixelFormat::CMYK32 => 4,
        PixelFormat::L16 => {
            return Err(CnnError::UnsupportedImage(
                "16-bit lossless jpeg".to_string(),
            ))
        }
    };
    if data.len() < width * height * samples {
        return Err(CnnError::UnsupportedImage(format!(
            "jpeg data of {} bytes is too small for {}x{} {:?}",
            data.len(),
            width,
            height,
            info.pixel_format
        )));
    }

    let pixels = data
        .chunks_exact(samples)
        .take(width * height)
        .map(|px| match *px {
            [v] => v,
            [r, g, b] => luma(r, g, b, 255),
            [c, m, y, k] => cmyk_luma(c, m, y, k),
            _ => 0,
        })
        .collect();

    Ok(LumaImage {
        width,
        height,
        pixels,
    })
}

/// Load a PNG or JPEG as a normalized `1 × height × width` input tensor.
pub fn load_image(path: impl AsRef<Path>, height: usize, width: usize) -> Result<Tensor3D> {
    let path = path.as_ref();
    let bytes = fs::read(path)?;
    let native = decode_luma(&bytes)?;
    tracing::info!(
        path = %path.display(),
        width = native.width,
        height = native.height,
        "loaded image"
    );
    to_tensor(&resample_nearest(&native, width, height)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_luma_gray_is_unchanged() {
        for v in [0u8, 1, 77, 128, 254, 255] {
            assert_eq!(luma(v, v, v, 255), v);
        }
    }

    #[test]
    fn test_luma_transparent_is_black() {
        assert_eq!(luma(255, 255, 255, 0), 0);
    }

    #[test]
    fn test_luma_primaries() {
        assert_eq!(luma(255, 0, 0, 255), 76);
        assert_eq!(luma(0, 255, 0, 255), 150);
        assert_eq!(luma(0, 0, 255, 255), 29);
    }

    #[test]
    fn test_luma16_keeps_low_byte_precision() {
        // the high bytes alone give 113
        assert_eq!(luma16(0x80ff, 0x80ff, 0, 0xffff), 114);
        assert_eq!(luma16(0xffff, 0xffff, 0xffff, 0x8000), 128);
    }

    #[test]
    fn test_cmyk_luma() {
        assert_eq!(cmyk_luma(0, 0, 0, 0), 255);
        assert_eq!(cmyk_luma(0, 0, 0, 255), 0);
        assert_eq!(cmyk_luma(0, 255, 255, 0), 76);
    }

    #[test]
    fn test_sniff() {
        assert_eq!(ImageFormat::sniff(&PNG_SIGNATURE), Some(ImageFormat::Png));
        assert_eq!(ImageFormat::sniff(&[0xff, 0xd8, 0xff, 0xe0]), Some(ImageFormat::Jpeg));
        assert_eq!(ImageFormat::sniff(b"GIF89a"), None);
        assert_eq!(ImageFormat::sniff(&[]), None);
    }

    #[test]
    fn test_sixteen_bit_gray_alpha_frame() {
        let bytes = [0xff, 0xff, 0x80, 0x00, 0x12, 0x34, 0xff, 0xff];
        let img = frame_to_luma(&bytes, ColorType::GrayscaleAlpha, BitDepth::Sixteen, 2, 1, 8)
            .unwrap();
        assert_eq!(img.pixels, vec![128, 0x12]);
    }

    #[test]
    fn test_frame_rows_with_padding() {
        // two 1-pixel RGB rows, each padded to 4 bytes
        let bytes = [255, 255, 255, 9, 0, 0, 0, 9];
        let img = frame_to_luma(&bytes, ColorType::Rgb, BitDepth::Eight, 1, 2, 4).unwrap();
        assert_eq!(img.pixels, vec![255, 0]);
    }

    #[test]
    fn test_frame_rejects_indexed() {
        assert!(matches!(
            frame_to_luma(&[0], ColorType::Indexed, BitDepth::Eight, 1, 1, 1),
            Err(CnnError::UnsupportedImage(_))
        ));
    }

    #[test]
    fn test_resample_downscale_picks_nearest_source() {
        let img = LumaImage {
            width: 4,
            height: 1,
            pixels: vec![10, 20, 30, 40],
        };
        let out = resample_nearest(&img, 2, 1).unwrap();
        assert_eq!(out.pixels, vec![10, 30]);
    }

    #[test]
    fn test_resample_upscale_repeats() {
        let img = LumaImage {
            width: 2,
            height: 1,
            pixels: vec![1, 2],
        };
        let out = resample_nearest(&img, 4, 2).unwrap();
        assert_eq!(out.pixels, vec![1, 1, 2, 2, 1, 1, 2, 2]);
    }
}
