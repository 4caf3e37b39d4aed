pub mod scan;

pub use scan::{identify_game, scan_directory, scan_video, scan_video_as, ScanReport};
