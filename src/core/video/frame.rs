use image::RgbImage;

use crate::core::config::Region;
use crate::core::video::timestamp::format_frame_timestamp;

/// 帧数据结构
#[derive(Debug, Clone)]
pub struct Frame {
    pub index: u64,
    pub image: RgbImage,
    pub timestamp: String,
}

impl Frame {
    pub fn new(index: u64, image: RgbImage, fps: u32) -> Self {
        Self {
            timestamp: format_frame_timestamp(index, fps),
            index,
            image,
        }
    }

    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }

    /// Crop the frame to an event region. The view is clipped at the frame
    /// border; a region/template size disagreement surfaces in the matcher.
    pub fn crop(&self, region: &Region) -> RgbImage {
        image::imageops::crop_imm(
            &self.image,
            region.x1,
            region.y1,
            region.width(),
            region.height(),
        )
        .to_image()
    }
}
