/// 帧号 -> HH:MM:SS:FF 时间戳
pub fn format_frame_timestamp(frame_index: u64, fps: u32) -> String {
    let fps = fps.max(1) as u64;
    let hours = frame_index / (3600 * fps);
    let minutes = (frame_index / (60 * fps)) % 60;
    let seconds = (frame_index / fps) % 60;
    let frames = frame_index % fps;
    format!("{hours:02}:{minutes:02}:{seconds:02}:{frames:02}")
}
