use image::{GrayImage, RgbImage};

use crate::core::config::EventDefinition;
use crate::core::error::ScanError;
use crate::core::matchers::context::ScanContext;
use crate::core::matchers::{assets, split_qualified, MatchResult};

/// Masked comparison of a crop against its reference template. `ccorr`
/// selects normalized cross-correlation instead of mean absolute
/// difference; acceptance semantics are identical, only the numeric curve
/// differs.
pub(super) fn match_masked(
    crop: &RgbImage,
    qualified: &str,
    def: &EventDefinition,
    ctx: &mut ScanContext,
    ccorr: bool,
) -> Result<MatchResult, ScanError> {
    let (game, event) = split_qualified(qualified);
    let template = assets::load_rgb(&assets::unique_template_path(
        ctx.data_root(),
        game,
        qualified,
    ))?;
    let mask = assets::load_gray(&assets::mask_path(ctx.data_root(), game, qualified))?;

    check_shape(event, crop.dimensions(), template.dimensions())?;
    check_shape(event, mask.dimensions(), template.dimensions())?;

    let score = if ccorr {
        masked_ccorr(crop, &template, &mask)
    } else {
        masked_abs_diff(crop, &template, &mask)
    };
    let matched = score >= def.threshold;
    if matched {
        ctx.save_artifact(crop, event, score)?;
    }

    Ok(MatchResult {
        matched,
        score,
        resolved: Some(event.to_string()),
    })
}

/// Grayscale normalized squared difference, no mask.
pub(super) fn match_gray(
    crop: &RgbImage,
    qualified: &str,
    def: &EventDefinition,
    ctx: &mut ScanContext,
) -> Result<MatchResult, ScanError> {
    let (game, event) = split_qualified(qualified);
    let template = assets::load_gray(&assets::unique_template_path(
        ctx.data_root(),
        game,
        qualified,
    ))?;

    let crop_gray = image::imageops::grayscale(crop);
    check_shape(event, crop_gray.dimensions(), template.dimensions())?;

    let score = gray_nsd(&crop_gray, &template);
    let matched = score >= def.threshold;
    if matched {
        ctx.save_artifact(crop, event, score)?;
    }

    Ok(MatchResult {
        matched,
        score,
        resolved: Some(event.to_string()),
    })
}

fn check_shape(event: &str, crop: (u32, u32), template: (u32, u32)) -> Result<(), ScanError> {
    if crop != template {
        return Err(ScanError::ShapeMismatch {
            event: event.to_string(),
            crop_w: crop.0,
            crop_h: crop.1,
            template_w: template.0,
            template_h: template.1,
        });
    }
    Ok(())
}

/// `1 - mae/255` over mask-selected pixels, all channels.
fn masked_abs_diff(crop: &RgbImage, template: &RgbImage, mask: &GrayImage) -> f32 {
    let mut sum = 0.0f64;
    let mut count = 0u64;
    for ((c, t), m) in crop.pixels().zip(template.pixels()).zip(mask.pixels()) {
        if m.0[0] > 0 {
            for ch in 0..3 {
                sum += (c.0[ch] as f64 - t.0[ch] as f64).abs();
            }
            count += 3;
        }
    }
    if count == 0 {
        return 0.0;
    }
    let mae = sum / count as f64;
    ((1.0 - mae / 255.0) as f32).clamp(0.0, 1.0)
}

/// Normalized cross-correlation restricted to mask-selected pixels.
fn masked_ccorr(crop: &RgbImage, template: &RgbImage, mask: &GrayImage) -> f32 {
    let mut dot = 0.0f64;
    let mut norm_c = 0.0f64;
    let mut norm_t = 0.0f64;
    for ((c, t), m) in crop.pixels().zip(template.pixels()).zip(mask.pixels()) {
        if m.0[0] > 0 {
            for ch in 0..3 {
                let cv = c.0[ch] as f64;
                let tv = t.0[ch] as f64;
                dot += cv * tv;
                norm_c += cv * cv;
                norm_t += tv * tv;
            }
        }
    }
    let denom = (norm_c * norm_t).sqrt();
    if denom == 0.0 {
        // Both sides all-black inside the mask count as identical.
        return if norm_c == 0.0 && norm_t == 0.0 { 1.0 } else { 0.0 };
    }
    ((dot / denom) as f32).clamp(0.0, 1.0)
}

/// `1 - normalized squared difference`; the switch matcher reuses this.
pub(super) fn gray_nsd(crop: &GrayImage, template: &GrayImage) -> f32 {
    let mut num = 0.0f64;
    let mut norm_c = 0.0f64;
    let mut norm_t = 0.0f64;
    for (c, t) in crop.pixels().zip(template.pixels()) {
        let cv = c.0[0] as f64;
        let tv = t.0[0] as f64;
        let d = cv - tv;
        num += d * d;
        norm_c += cv * cv;
        norm_t += tv * tv;
    }
    let denom = (norm_c * norm_t).sqrt();
    let nsd = if denom == 0.0 {
        if num == 0.0 {
            0.0
        } else {
            1.0
        }
    } else {
        num / denom
    };
    ((1.0 - nsd) as f32).clamp(0.0, 1.0)
}
