//! 模板匹配策略 - 将裁剪区域与参考模板比对
//!
//! 四种策略:
//! 1. 掩码绝对差 - 逐像素 |crop - template|，掩码内取均值
//! 2. 掩码归一化互相关 - 同样的接受语义，不同的数值曲线
//! 3. 灰度归一化平方差 - 无掩码
//! 4. switch - 同一事件的多个外观变体，要求唯一胜者

pub mod assets;
pub mod context;
mod switch;
mod unique;

use image::RgbImage;

use crate::core::config::{EventDefinition, MatchKind};
use crate::core::error::ScanError;

pub use context::ScanContext;

#[derive(Debug, Clone)]
pub struct MatchResult {
    pub matched: bool,
    /// Similarity in `[0, 1]`, higher is better.
    pub score: f32,
    /// Event name for single-template strategies, winning sub-template
    /// name for the switch strategy.
    pub resolved: Option<String>,
}

impl MatchKind {
    /// Score one cropped region against the event's reference assets.
    pub fn evaluate(
        &self,
        crop: &RgbImage,
        qualified: &str,
        def: &EventDefinition,
        ctx: &mut ScanContext,
    ) -> Result<MatchResult, ScanError> {
        match self {
            MatchKind::MaskedAbsDiff => unique::match_masked(crop, qualified, def, ctx, false),
            MatchKind::MaskedCorr => unique::match_masked(crop, qualified, def, ctx, true),
            MatchKind::GraySqdiff => unique::match_gray(crop, qualified, def, ctx),
            MatchKind::Switch => switch::match_switch(crop, qualified, def, ctx),
        }
    }
}

/// Split a `<game>_<event>` qualified name.
pub(crate) fn split_qualified(qualified: &str) -> (&str, &str) {
    qualified.split_once('_').unwrap_or(("", qualified))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_qualified_on_first_underscore() {
        assert_eq!(split_qualified("bf2_spawn_troop"), ("bf2", "spawn_troop"));
        assert_eq!(split_qualified("nounderscore"), ("", "nounderscore"));
    }

    #[test]
    fn test_strategy_selected_by_configuration() {
        let dir = tempfile::tempdir().unwrap();
        let template = RgbImage::from_pixel(8, 8, image::Rgb([120, 40, 200]));
        let mask = image::GrayImage::from_pixel(8, 8, image::Luma([255]));

        let tpath = assets::unique_template_path(dir.path(), "bf2", "bf2_kill");
        let mpath = assets::mask_path(dir.path(), "bf2", "bf2_kill");
        std::fs::create_dir_all(tpath.parent().unwrap()).unwrap();
        std::fs::create_dir_all(mpath.parent().unwrap()).unwrap();
        template.save(tpath).unwrap();
        mask.save(mpath).unwrap();

        // Same event, same assets; only the catalog's strategy id differs.
        for strategy in ["fixtemplate_rgb", "fixtemplate_rgb_ccorr"] {
            let def: EventDefinition = serde_json::from_value(serde_json::json!({
                "roi": [0, 0, 8, 8],
                "match": strategy
            }))
            .unwrap();
            let mut ctx = ScanContext::dry_run(dir.path());
            let result = def
                .match_kind
                .evaluate(&template, "bf2_kill", &def, &mut ctx)
                .unwrap();
            assert!(result.matched, "strategy {strategy} should accept identity");
            assert!((result.score - 1.0).abs() < 1e-6);
        }
    }
}
