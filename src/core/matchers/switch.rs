use image::RgbImage;

use crate::core::config::EventDefinition;
use crate::core::error::ScanError;
use crate::core::matchers::context::ScanContext;
use crate::core::matchers::unique::gray_nsd;
use crate::core::matchers::{assets, split_qualified, MatchResult};

/// Compare the crop against every named sub-template ("switch") of the
/// event. Exactly one candidate at or above threshold wins; two or more is
/// a configuration defect and never resolved by best score.
pub(super) fn match_switch(
    crop: &RgbImage,
    qualified: &str,
    def: &EventDefinition,
    ctx: &mut ScanContext,
) -> Result<MatchResult, ScanError> {
    let (game, event) = split_qualified(qualified);
    if def.switches.is_empty() {
        return Err(ScanError::ConfigInvalid(vec![format!(
            "event '{qualified}' has no switches"
        )]));
    }

    let crop_gray = image::imageops::grayscale(crop);
    let mut candidates: Vec<(f32, &str)> = Vec::new();

    for switch in &def.switches {
        let template = assets::load_gray(&assets::switch_template_path(
            ctx.data_root(),
            game,
            qualified,
            switch,
        ))?;
        if crop_gray.dimensions() != template.dimensions() {
            return Err(ScanError::ShapeMismatch {
                event: format!("{event}/{switch}"),
                crop_w: crop_gray.width(),
                crop_h: crop_gray.height(),
                template_w: template.width(),
                template_h: template.height(),
            });
        }
        let score = gray_nsd(&crop_gray, &template);
        if score >= def.threshold {
            candidates.push((score, switch.as_str()));
        }
    }

    match candidates.as_slice() {
        [] => Ok(MatchResult {
            matched: false,
            score: 0.0,
            resolved: None,
        }),
        [(score, switch)] => {
            ctx.save_artifact(crop, event, *score)?;
            Ok(MatchResult {
                matched: true,
                score: *score,
                resolved: Some((*switch).to_string()),
            })
        }
        _ => Err(ScanError::CrossMatchAmbiguity {
            event: event.to_string(),
            candidates: candidates.iter().map(|(_, s)| (*s).to_string()).collect(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::GrayImage;
    use std::path::Path;

    fn write_switch_template(root: &Path, qualified: &str, switch: &str, value: u8) {
        let (game, _) = split_qualified(qualified);
        let path = assets::switch_template_path(root, game, qualified, switch);
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        GrayImage::from_pixel(8, 8, image::Luma([value]))
            .save(path)
            .unwrap();
    }

    fn def(switches: &[&str]) -> EventDefinition {
        serde_json::from_value(serde_json::json!({
            "roi": [0, 0, 8, 8],
            "match": "switch",
            "threshold": 0.9,
            "switches": switches
        }))
        .unwrap()
    }

    fn crop(value: u8) -> RgbImage {
        RgbImage::from_pixel(8, 8, image::Rgb([value, value, value]))
    }

    #[test]
    fn test_unique_winner_resolves_switch_name() {
        let dir = tempfile::tempdir().unwrap();
        write_switch_template(dir.path(), "bf2_loadout", "assault", 200);
        write_switch_template(dir.path(), "bf2_loadout", "sniper", 10);

        let mut ctx = ScanContext::dry_run(dir.path());
        let result =
            match_switch(&crop(200), "bf2_loadout", &def(&["assault", "sniper"]), &mut ctx)
                .unwrap();
        assert!(result.matched);
        assert_eq!(result.resolved.as_deref(), Some("assault"));
    }

    #[test]
    fn test_two_candidates_raise_cross_match_naming_both() {
        let dir = tempfile::tempdir().unwrap();
        write_switch_template(dir.path(), "bf2_loadout", "assault", 200);
        write_switch_template(dir.path(), "bf2_loadout", "officer", 200);

        let mut ctx = ScanContext::dry_run(dir.path());
        let err =
            match_switch(&crop(200), "bf2_loadout", &def(&["assault", "officer"]), &mut ctx)
                .unwrap_err();

        match err {
            ScanError::CrossMatchAmbiguity { event, candidates } => {
                assert_eq!(event, "loadout");
                assert_eq!(candidates, vec!["assault".to_string(), "officer".to_string()]);
            }
            other => panic!("expected CrossMatchAmbiguity, got {other:?}"),
        }
    }

    #[test]
    fn test_no_candidate_is_a_plain_non_match() {
        let dir = tempfile::tempdir().unwrap();
        write_switch_template(dir.path(), "bf2_loadout", "assault", 200);

        let mut ctx = ScanContext::dry_run(dir.path());
        let result = match_switch(&crop(10), "bf2_loadout", &def(&["assault"]), &mut ctx).unwrap();
        assert!(!result.matched);
        assert_eq!(result.score, 0.0);
        assert!(result.resolved.is_none());
    }

    #[test]
    fn test_missing_switch_template_is_asset_missing() {
        let dir = tempfile::tempdir().unwrap();
        let mut ctx = ScanContext::dry_run(dir.path());
        let err = match_switch(&crop(10), "bf2_loadout", &def(&["assault"]), &mut ctx)
            .unwrap_err();
        assert!(matches!(err, ScanError::AssetMissing(_)));
    }
}
