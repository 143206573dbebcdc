//! Fixed deployment constants for the camera streaming pipeline.

/// Capture device used when no input source is given.
pub const DEFAULT_VIDEO_SOURCE: &str = "/dev/video0";
/// Raw pixel format negotiated with the capture device.
pub const DEFAULT_FORMAT: &str = "NV12";
/// Depth of every inter-stage queue.
pub const DEFAULT_MAX_BUFFER_SIZE: u32 = 5;

pub const CAPTURE_WIDTH: u32 = 3840;
pub const CAPTURE_HEIGHT: u32 = 2160;
pub const CAPTURE_FRAMERATE: (u32, u32) = (30, 1);

pub const RESOURCES_DIR: &str = "/home/root/VHT/resources";
pub const POSTPROCESS_DIR: &str = "/usr/lib/hailo-post-processes";

pub const VISION_CONFIG_FILE: &str = "configs/vision_config.json";
pub const HEF_FILE: &str = "yolov5m_wo_spp_60p_nv12.hef";
pub const NETWORK_CONFIG_FILE: &str = "configs/yolov5.json";
pub const POSTPROCESS_SO_FILE: &str = "libyolo_post.so";
pub const NETWORK_NAME: &str = "yolov5";

pub const FOUR_K_BITRATE: u32 = 25_000_000;
pub const FHD_BITRATE: u32 = 6_000_000;
pub const HD_BITRATE: u32 = 6_000_000;
pub const SD_BITRATE: u32 = 3_000_000;

/// Host receiving every RTP stream.
pub const TRANSPORT_HOST: &str = "10.0.0.2";
pub const UPLOAD_POOL_SIZE: u32 = 16;

/// Trailing fragment appended to the printed launch line by `--show-fps`.
/// Only meaningful to the shell, never handed to the engine.
pub const FPS_LAUNCH_SUFFIX: &str = "-v | grep -e hailo_display";
/// Prefix shared by every monitoring sink name.
pub const MONITOR_SINK_PREFIX: &str = "hailo_display";
