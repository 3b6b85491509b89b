//! # Image Utilities
//!
//! Bulk operations layered on the image table's pixel contract: mip chain
//! generation, format conversion, tint/roughness packing and summed area
//! tables.
//!
//! Work is split across rayon workers that each own a disjoint range of
//! output pixels, so results never depend on scheduling.

use bifrost_core::math::{from_unorm8, unorm8};
use bifrost_core::Rgba;
use rayon::prelude::*;

use crate::images::{ImageId, ImageSize, Images};
use crate::pixel_data::PixelData;
use crate::pixel_format::PixelFormat;

// =============================================================================
// MIP CHAIN
// =============================================================================

/// Fills mip levels `1..mipmap_count` of an image from level 0.
///
/// Each pixel of level `m + 1` is the box filtered 2x2 block of level `m`
/// below it. When a dimension of level `m` is odd and greater than one, the
/// leftover row or column is folded into the last row or column of level
/// `m + 1`:
/// - Odd width: `(4 * block + right_top + right_bottom) / 6`
/// - Odd height: `(4 * block + bottom_left + bottom_right) / 6`
/// - Both odd, corner: `(6 * blended_block + three bottom pixels) / 9`
///
/// A level that is one pixel high or wide pairs its single row or column with
/// itself. Every intermediate result is quantized through the image's format
/// and gamma exactly as storing and reloading it would.
///
/// # Panics
///
/// Panics if the image is 3D.
pub fn fill_mipmap_chain(images: &mut Images, id: ImageId) {
    assert_eq!(images.depth(id, 0), 1, "Mip chains of 3D images are not supported");

    let format = images.pixel_format(id);
    let gamma = images.gamma(id);
    let mipmap_count = images.mipmap_count(id);

    let mut source = images.decode_level(id, 0);
    for level in 0..mipmap_count.saturating_sub(1) {
        let size = images.size(id).mip(level);
        let next = downsample(&source, size, format, gamma);
        images.encode_level(id, level + 1, &next);
        source = images.decode_level(id, level + 1);
    }

    tracing::debug!(
        "Filled {} mip levels of image '{}'",
        mipmap_count,
        images.name(id)
    );
}

/// Computes the next mip level of `source`, one output row per work item.
fn downsample(source: &[Rgba], size: ImageSize, format: PixelFormat, gamma: f32) -> Vec<Rgba> {
    let width = size.width as usize;
    let height = size.height as usize;
    let next_width = (width / 2).max(1);
    let next_height = (height / 2).max(1);
    let odd_width = width > 1 && width % 2 == 1;
    let odd_height = height > 1 && height % 2 == 1;

    let pixel = |x: usize, y: usize| source[x + y * width];
    let quantize = |color: Rgba| PixelData::quantize(format, color, gamma);

    let mut next = vec![Rgba::default(); next_width * next_height];
    next.par_chunks_mut(next_width)
        .enumerate()
        .for_each(|(j, row)| {
            let y0 = (2 * j).min(height - 1);
            let y1 = (2 * j + 1).min(height - 1);
            let last_row = j == next_height - 1;

            for (i, out) in row.iter_mut().enumerate() {
                let x0 = (2 * i).min(width - 1);
                let x1 = (2 * i + 1).min(width - 1);
                let last_column = i == next_width - 1;

                let block = (pixel(x0, y0) + pixel(x1, y0) + pixel(x0, y1) + pixel(x1, y1)) * 0.25;
                let mut value = quantize(block);

                if odd_width && last_column {
                    let right = pixel(width - 1, y0) + pixel(width - 1, y1);
                    value = quantize((value * 4.0 + right) * (1.0 / 6.0));

                    if odd_height && last_row {
                        let bottom = pixel(width - 3, height - 1)
                            + pixel(width - 2, height - 1)
                            + pixel(width - 1, height - 1);
                        value = quantize((value * 6.0 + bottom) * (1.0 / 9.0));
                    }
                } else if odd_height && last_row {
                    let bottom = pixel(x0, height - 1) + pixel(x1, height - 1);
                    value = quantize((value * 4.0 + bottom) * (1.0 / 6.0));
                }

                *out = value;
            }
        });
    next
}

// =============================================================================
// FORMAT CONVERSION
// =============================================================================

/// Copies an image into a new image of another format, keeping name, gamma,
/// size and mip levels.
pub fn change_format(images: &mut Images, id: ImageId, new_format: PixelFormat) -> ImageId {
    let gamma = images.gamma(id);
    copy_with_new_format(images, id, new_format, gamma, |color| color)
}

/// Copies an image into a new image of another format and gamma, passing
/// every linear pixel of every mip level through `process`.
pub fn copy_with_new_format(
    images: &mut Images,
    id: ImageId,
    new_format: PixelFormat,
    new_gamma: f32,
    process: impl Fn(Rgba) -> Rgba + Sync,
) -> ImageId {
    let chunk_size = images.parallel_chunk_size();
    let mut colors = images.decode_pixels(id);
    colors
        .par_iter_mut()
        .with_min_len(chunk_size)
        .for_each(|color| *color = process(*color));

    let name = images.name(id).to_owned();
    let size = images.size(id);
    let mipmap_count = images.mipmap_count(id);
    create_from_colors(images, &name, new_format, new_gamma, size, mipmap_count, &colors)
}

fn create_from_colors(
    images: &mut Images,
    name: &str,
    format: PixelFormat,
    gamma: f32,
    size: ImageSize,
    mipmap_count: u32,
    colors: &[Rgba],
) -> ImageId {
    let gamma = if format.is_color() { gamma } else { 1.0 };
    match PixelData::allocate(format, colors.len()) {
        Some(mut pixels) => {
            pixels.encode_range(0, colors, gamma, images.parallel_chunk_size());
            images.create_with_pixels(name, gamma, size, mipmap_count, pixels)
        }
        None => images.create_3d(name, format, gamma, size, mipmap_count),
    }
}

// =============================================================================
// TINT / ROUGHNESS PACKING
// =============================================================================

/// Packs a tint image and one channel of a roughness image into a single
/// RGBA32 image, tint in RGB and linear roughness in alpha.
///
/// Missing inputs are handled without packing:
/// - No roughness: the tint itself, or a copy with alpha set to 1 if the
///   tint has an alpha channel
/// - No tint: the roughness itself if it is `Roughness8`, otherwise a
///   `Roughness8` copy of the selected channel
///
/// # Arguments
///
/// * `tint` - Tint image, may be dead or invalid
/// * `roughness` - Roughness image, may be dead or invalid
/// * `roughness_channel` - Channel of the roughness image holding roughness
///
/// # Panics
///
/// Panics if both images are live but differ in size or are 3D.
pub fn combine_tint_roughness(
    images: &mut Images,
    tint: ImageId,
    roughness: ImageId,
    roughness_channel: usize,
) -> ImageId {
    if !images.has(roughness) {
        if images.has(tint) && images.pixel_format(tint).has_alpha() {
            return tint_without_roughness(images, tint);
        }
        return tint;
    }

    if !images.has(tint) {
        if images.pixel_format(roughness) == PixelFormat::Roughness8 {
            return roughness;
        }
        let channel = decoded_channel(images.pixel_format(roughness), roughness_channel);
        return copy_with_new_format(images, roughness, PixelFormat::Roughness8, 1.0, |pixel| {
            Rgba::splat(pixel.to_array()[channel])
        });
    }

    let size = images.size(tint);
    assert_eq!(size, images.size(roughness), "Tint and roughness must have the same size");
    assert_eq!(size.depth, 1, "Tint and roughness must be 2D");

    let mipmap_count = images.mipmap_count(tint).min(images.mipmap_count(roughness));
    let pixel_count: usize = (0..mipmap_count).map(|m| images.pixel_count(tint, m)).sum();
    let name = format!("{}_{}", images.name(tint), images.name(roughness));

    let tint_format = images.pixel_format(tint);
    let roughness_format = images.pixel_format(roughness);
    let tint_is_byte = matches!(tint_format, PixelFormat::Rgb24 | PixelFormat::Rgba32);

    let id = if tint_is_byte && roughness_format.is_byte() {
        let pixels = pack_bytes(images, tint, roughness, roughness_channel, pixel_count);
        let gamma = images.gamma(tint);
        images.create_with_pixels(&name, gamma, size, mipmap_count, pixels)
    } else {
        let colors = pack_linear(images, tint, roughness, roughness_channel, pixel_count);
        create_from_colors(images, &name, PixelFormat::Rgba32, 2.2, size, mipmap_count, &colors)
    };

    tracing::debug!(
        "Packed tint/roughness image '{}' ({} pixels, {} levels)",
        images.name(id),
        pixel_count,
        mipmap_count
    );
    id
}

/// Copies a tint with alpha into RGBA32 with alpha reset to 1.
fn tint_without_roughness(images: &mut Images, tint: ImageId) -> ImageId {
    let name = images.name(tint).to_owned();
    let gamma = images.gamma(tint);
    let size = images.size(tint);
    let mipmap_count = images.mipmap_count(tint);

    if let Some(PixelData::Rgba32(pixels)) = images.pixels(tint) {
        let pixels = pixels.iter().map(|&[r, g, b, _]| [r, g, b, 255]).collect();
        return images.create_with_pixels(&name, gamma, size, mipmap_count, PixelData::Rgba32(pixels));
    }

    let mut colors = images.decode_pixels(tint);
    for color in &mut colors {
        color.a = 1.0;
    }
    create_from_colors(images, &name, PixelFormat::Rgba32, gamma, size, mipmap_count, &colors)
}

/// Byte fast path. Roughness stored as color is linearized with its gamma.
fn pack_bytes(
    images: &Images,
    tint: ImageId,
    roughness: ImageId,
    roughness_channel: usize,
    pixel_count: usize,
) -> PixelData {
    let tint_stride = images.pixel_format(tint).size_of();
    let roughness_format = images.pixel_format(roughness);
    let roughness_stride = roughness_format.size_of();
    let roughness_gamma = images.gamma(roughness);
    #[allow(clippy::float_cmp)]
    let roughness_is_linear = roughness_format == PixelFormat::Roughness8 || roughness_gamma == 1.0;

    // Single channel formats hold roughness in their only byte.
    let channel = roughness_channel.min(roughness_stride - 1);

    let tint_bytes = images.pixels(tint).map_or(&[][..], PixelData::as_bytes);
    let roughness_bytes = images.pixels(roughness).map_or(&[][..], PixelData::as_bytes);
    let chunk_size = images.parallel_chunk_size();

    let mut packed = vec![[0u8; 4]; pixel_count];
    packed
        .par_chunks_mut(chunk_size)
        .enumerate()
        .for_each(|(chunk, pixels)| {
            let begin = chunk * chunk_size;
            for (p, out) in (begin..).zip(pixels.iter_mut()) {
                let t = &tint_bytes[p * tint_stride..p * tint_stride + 3];
                let r = roughness_bytes[p * roughness_stride + channel];
                let alpha = if roughness_is_linear {
                    r
                } else {
                    unorm8(from_unorm8(r).powf(roughness_gamma))
                };
                *out = [t[0], t[1], t[2], alpha];
            }
        });
    PixelData::Rgba32(packed)
}

/// Index into a decoded pixel of the channel holding roughness. Single
/// channel formats hold it in their only stored channel.
const fn decoded_channel(format: PixelFormat, requested: usize) -> usize {
    match format {
        PixelFormat::Alpha8 => 3,
        PixelFormat::Intensity8 | PixelFormat::IntensityFloat | PixelFormat::Roughness8 => 0,
        _ if requested > 3 => 3,
        _ => requested,
    }
}

/// General path through linear color.
fn pack_linear(
    images: &Images,
    tint: ImageId,
    roughness: ImageId,
    roughness_channel: usize,
    pixel_count: usize,
) -> Vec<Rgba> {
    let channel = decoded_channel(images.pixel_format(roughness), roughness_channel);
    let tint_colors = images.decode_pixels(tint);
    let roughness_colors = images.decode_pixels(roughness);

    tint_colors[..pixel_count]
        .par_iter()
        .zip(roughness_colors[..pixel_count].par_iter())
        .with_min_len(images.parallel_chunk_size())
        .map(|(t, r)| Rgba::from_rgb(t.rgb(), r.to_array()[channel]))
        .collect()
}

// =============================================================================
// SUMMED AREA TABLE
// =============================================================================

/// Computes the summed area table of mip level 0 of a 2D image.
///
/// Entry `(x, y)` holds the sum of all linear pixels in `[0, x] x [0, y]`,
/// accumulated in double precision. Entries are stored row by row.
#[must_use]
pub fn compute_summed_area_table(images: &Images, id: ImageId) -> Vec<Rgba> {
    let width = images.width(id, 0) as usize;
    let height = images.height(id, 0) as usize;
    let pixels = images.decode_level(id, 0);

    let mut table = Vec::with_capacity(width * height);
    let mut previous_row = vec![[0f64; 4]; width];
    for y in 0..height {
        let mut row_sum = [0f64; 4];
        for x in 0..width {
            let pixel = pixels[x + y * width].to_array();
            let above = &mut previous_row[x];
            for c in 0..4 {
                row_sum[c] += f64::from(pixel[c]);
                above[c] += row_sum[c];
            }
            #[allow(clippy::cast_possible_truncation)]
            table.push(Rgba::new(
                above[0] as f32,
                above[1] as f32,
                above[2] as f32,
                above[3] as f32,
            ));
        }
    }
    table
}
