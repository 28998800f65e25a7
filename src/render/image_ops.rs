//! Image decode/encode helpers and pixmap conversions
//!
//! `tiny_skia::Pixmap` stores premultiplied RGBA while `image::RgbaImage` is
//! straight alpha; every crossing between the two goes through this module.

use crate::core::{CoreError, CoreResult};
use image::codecs::jpeg::JpegEncoder;
use image::imageops::FilterType;
use image::{DynamicImage, ImageFormat, ImageReader, Limits, RgbaImage};
use sha2::{Digest, Sha256};
use std::io::Cursor;
use std::path::{Path, PathBuf};
use tiny_skia::{ColorU8, Pixmap};

/// Default long-edge limit for [`load_downsampled`]
pub const DOWNSAMPLE_DEFAULT_DIM: u32 = 1024;

/// Largest accepted source edge as a multiple of the requested `max_dim`
pub const MAX_SOURCE_FACTOR: u32 = 8;

/// Convert straight-alpha RGBA into a premultiplied pixmap
pub fn rgba_to_pixmap(img: &RgbaImage) -> CoreResult<Pixmap> {
    let mut pixmap = Pixmap::new(img.width(), img.height())
        .ok_or_else(|| CoreError::Raster(format!("invalid size {}x{}", img.width(), img.height())))?;

    for (dst, src) in pixmap.pixels_mut().iter_mut().zip(img.pixels()) {
        let [r, g, b, a] = src.0;
        *dst = ColorU8::from_rgba(r, g, b, a).premultiply();
    }
    Ok(pixmap)
}

/// Convert a premultiplied pixmap back to straight-alpha RGBA
pub fn pixmap_to_rgba(pixmap: &Pixmap) -> RgbaImage {
    let mut data = Vec::with_capacity(pixmap.data().len());
    for p in pixmap.pixels() {
        let c = p.demultiply();
        data.extend_from_slice(&[c.red(), c.green(), c.blue(), c.alpha()]);
    }
    // Length always matches width * height * 4
    RgbaImage::from_raw(pixmap.width(), pixmap.height(), data)
        .unwrap_or_else(|| RgbaImage::new(pixmap.width(), pixmap.height()))
}

pub fn encode_png(pixmap: &Pixmap) -> CoreResult<Vec<u8>> {
    let mut buf = Cursor::new(Vec::new());
    pixmap_to_rgba(pixmap).write_to(&mut buf, ImageFormat::Png)?;
    Ok(buf.into_inner())
}

pub fn write_png(pixmap: &Pixmap, path: &Path) -> CoreResult<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, encode_png(pixmap)?)?;
    Ok(())
}

/// Decode any supported image file into a pixmap
pub fn decode_pixmap(path: &Path) -> CoreResult<Pixmap> {
    let img = image::open(path)?;
    rgba_to_pixmap(&img.to_rgba8())
}

/// Decoder limits for sources meant to end up at most `max_dim` on a side
pub fn decode_limits(max_dim: u32) -> Limits {
    let edge = max_dim.max(1).saturating_mul(MAX_SOURCE_FACTOR);
    let mut limits = Limits::default();
    limits.max_image_width = Some(edge);
    limits.max_image_height = Some(edge);
    limits.max_alloc = Some(u64::from(edge) * u64::from(edge) * 4);
    limits
}

/// Decode behind a header check so oversized sources fail before any pixel
/// buffer is allocated.
fn decode_bounded<R>(open: impl Fn() -> std::io::Result<ImageReader<R>>, max_dim: u32) -> CoreResult<DynamicImage>
where
    R: std::io::BufRead + std::io::Seek,
{
    let (width, height) = open()?.with_guessed_format()?.into_dimensions()?;
    let edge = max_dim.max(1).saturating_mul(MAX_SOURCE_FACTOR);
    if width > edge || height > edge {
        return Err(CoreError::InvalidInput(format!(
            "image {}x{} exceeds the {}px decode limit",
            width, height, edge
        )));
    }

    let mut reader = open()?.with_guessed_format()?;
    reader.limits(decode_limits(max_dim));
    Ok(reader.decode()?)
}

/// Decode an image, skipping ahead by powers of two until the longer edge is
/// below `2 * max_dim`.
///
/// Returns the coarse image only; callers needing an exact size resize after.
pub fn load_downsampled(path: &Path, max_dim: u32) -> CoreResult<RgbaImage> {
    let img = decode_bounded(|| ImageReader::open(path), max_dim)?;
    let factor = subsample_factor(img.width(), img.height(), max_dim, true);
    Ok(subsample(img, factor).to_rgba8())
}

/// Power-of-two factor that brings an image close to `max_dim`.
///
/// With `inclusive`, halving continues while a halved edge is still at least
/// `max_dim`; otherwise only while it exceeds it.
pub fn subsample_factor(width: u32, height: u32, max_dim: u32, inclusive: bool) -> u32 {
    let max_dim = max_dim.max(1);
    let keep_going = |w: u32, h: u32| {
        if inclusive {
            w / 2 >= max_dim || h / 2 >= max_dim
        } else {
            w / 2 > max_dim || h / 2 > max_dim
        }
    };

    if !inclusive && width <= max_dim && height <= max_dim {
        return 1;
    }

    let (mut w, mut h, mut factor) = (width, height, 1u32);
    while keep_going(w, h) {
        w /= 2;
        h /= 2;
        factor *= 2;
    }
    factor
}

fn subsample(img: DynamicImage, factor: u32) -> DynamicImage {
    if factor <= 1 {
        return img;
    }
    let w = (img.width() / factor).max(1);
    let h = (img.height() / factor).max(1);
    img.resize_exact(w, h, FilterType::Nearest)
}

/// Final size keeping aspect ratio with the long edge at most `max_dim`
pub fn fit_within(width: u32, height: u32, max_dim: u32) -> (u32, u32) {
    if width <= max_dim && height <= max_dim {
        return (width, height);
    }
    let ratio = width as f32 / height.max(1) as f32;
    if ratio > 1.0 {
        (max_dim, ((max_dim as f32 / ratio) as u32).max(1))
    } else {
        (((max_dim as f32 * ratio) as u32).max(1), max_dim)
    }
}

/// Shrink and re-encode an imported image into `dest_dir`.
///
/// Images with alpha are written as PNG, opaque ones as JPEG. The file name is
/// derived from the source bytes so importing the same file twice reuses the
/// first result.
pub fn optimize_image(
    source: &Path,
    dest_dir: &Path,
    max_dim: u32,
    jpeg_quality: u8,
) -> CoreResult<PathBuf> {
    let bytes = std::fs::read(source)?;
    let digest = hex::encode(Sha256::digest(&bytes));

    let img = decode_bounded(|| Ok(ImageReader::new(Cursor::new(bytes.as_slice()))), max_dim)?;
    let has_alpha = img.color().has_alpha();
    let ext = if has_alpha { "png" } else { "jpg" };

    std::fs::create_dir_all(dest_dir)?;
    let dest = dest_dir.join(format!("sticker_{}.{}", &digest[..16], ext));
    if dest.exists() {
        tracing::debug!("Import of {:?} reuses {:?}", source, dest);
        return Ok(dest);
    }

    let (orig_w, orig_h) = (img.width(), img.height());
    let rough = subsample(img, subsample_factor(orig_w, orig_h, max_dim, false));
    let (final_w, final_h) = fit_within(rough.width(), rough.height(), max_dim);
    let resized = if (final_w, final_h) == (rough.width(), rough.height()) {
        rough
    } else {
        rough.resize_exact(final_w, final_h, FilterType::Triangle)
    };

    let mut out = Cursor::new(Vec::new());
    if has_alpha {
        resized.to_rgba8().write_to(&mut out, ImageFormat::Png)?;
    } else {
        let encoder = JpegEncoder::new_with_quality(&mut out, jpeg_quality.clamp(1, 100));
        resized.to_rgb8().write_with_encoder(encoder)?;
    }
    std::fs::write(&dest, out.into_inner())?;

    tracing::info!(
        "Imported {:?}: {}x{} -> {}x{} ({})",
        source,
        orig_w,
        orig_h,
        final_w,
        final_h,
        ext
    );
    Ok(dest)
}
