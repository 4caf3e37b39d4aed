//! 游戏录像事件扫描器 - 基于模板匹配从录像中识别游戏内事件
//!
//! 核心策略:
//! 1. 游戏识别 - 通过 starter 画面确定录像属于哪个游戏
//! 2. FSM 门控 - 每帧只尝试当前状态可达的事件，避免跨阶段误匹配
//! 3. 双重节流 - trigger_interval 限制轮询频率，fcooldown 防止重复触发
//! 4. 多策略匹配 - 掩码差值/互相关、灰度平方差、switch 多模板

pub mod api;
pub mod core;

pub fn init_logging() {
    let _ = env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or("info"),
    )
    .try_init();
}
