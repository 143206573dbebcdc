//! Element value objects.
//!
//! Every type renders the exact gst-launch tokens of one element through
//! `Display`; [`Chain`] joins them with the link operator.

use std::{
    fmt::{self, Display},
    path::PathBuf,
};

/// Link operator between two elements.
pub const LINK: &str = " ! ";

/// Discard policy of a queue when it is full.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Leaky {
    /// Block upstream.
    No,
    /// Drop the oldest buffers.
    Downstream,
}

impl Leaky {
    fn as_str(self) -> &'static str {
        match self {
            Leaky::No => "no",
            Leaky::Downstream => "downstream",
        }
    }
}

/// Bounded queue, unbounded in bytes and time.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct QueueSpec {
    pub leaky: Leaky,
    pub max_buffers: u32,
}

impl QueueSpec {
    pub fn lossless(max_buffers: u32) -> Self {
        Self {
            leaky: Leaky::No,
            max_buffers,
        }
    }

    pub fn leaky_downstream(max_buffers: u32) -> Self {
        Self {
            leaky: Leaky::Downstream,
            max_buffers,
        }
    }
}

impl Display for QueueSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "queue leaky={} max-size-buffers={} max-size-bytes=0 max-size-time=0",
            self.leaky.as_str(),
            self.max_buffers
        )
    }
}

/// V4L2 source plus the raw caps it is forced to negotiate.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CaptureSpec {
    pub device: String,
    pub width: u32,
    pub height: u32,
    pub framerate: (u32, u32),
    pub format: String,
}

impl CaptureSpec {
    pub fn source(&self) -> String {
        format!("v4l2src io-mode=mmap device={} name=src_0", self.device)
    }

    pub fn caps(&self) -> String {
        format!(
            "video/x-raw, width={}, height={}, framerate={}/{}, format={}",
            self.width, self.height, self.framerate.0, self.framerate.1, self.format
        )
    }
}

/// Vision preprocessor; the shared fan-out point of all branches.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PreprocSpec {
    pub config_path: PathBuf,
    pub name: &'static str,
}

impl Display for PreprocSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "hailovisionpreproc config-file-path={} name={}",
            self.config_path.display(),
            self.name
        )
    }
}

/// Detection network and its post-processing.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct InferenceSpec {
    pub hef_path: PathBuf,
    pub network_name: String,
    pub config_path: PathBuf,
    pub so_path: PathBuf,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct EncoderSpec {
    pub bitrate: u32,
    pub hrd: bool,
}

impl Display for EncoderSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "hailoh264enc bitrate={} hrd={}", self.bitrate, self.hrd)
    }
}

/// Processing elements a branch places between its queues.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Stage {
    Net { hef_path: PathBuf },
    Filter {
        function_name: String,
        config_path: PathBuf,
        so_path: PathBuf,
    },
    Overlay,
    Osd { config_path: PathBuf },
    Upload { pool_size: u32 },
    Encoder(EncoderSpec),
}

impl Stage {
    /// Net, filter and overlay, in that order.
    pub fn inference(spec: &InferenceSpec) -> [Stage; 3] {
        [
            Stage::Net {
                hef_path: spec.hef_path.clone(),
            },
            Stage::Filter {
                function_name: spec.network_name.clone(),
                config_path: spec.config_path.clone(),
                so_path: spec.so_path.clone(),
            },
            Stage::Overlay,
        ]
    }
}

impl Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Stage::Net { hef_path } => write!(f, "hailonet hef-path={}", hef_path.display()),
            Stage::Filter {
                function_name,
                config_path,
                so_path,
            } => write!(
                f,
                "hailofilter function-name={function_name} config-path={} so-path={} qos=false",
                config_path.display(),
                so_path.display()
            ),
            Stage::Overlay => f.write_str("hailooverlay qos=false"),
            Stage::Osd { config_path } => {
                write!(f, "hailoosd config-path={}", config_path.display())
            }
            Stage::Upload { pool_size } => write!(f, "hailoupload pool-size={pool_size}"),
            Stage::Encoder(encoder) => Display::fmt(encoder, f),
        }
    }
}

/// RTP payloader feeding a UDP sink.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TransportSpec {
    pub host: String,
    pub port: u16,
    pub sync: bool,
}

impl TransportSpec {
    pub fn payloader(&self) -> &'static str {
        "rtph264pay config-interval=1"
    }

    pub fn caps(&self) -> &'static str {
        "application/x-rtp, media=(string)video, encoding-name=(string)H264"
    }

    pub fn sink(&self) -> String {
        format!(
            "udpsink host={} sync={} port={}",
            self.host, self.sync, self.port
        )
    }
}

/// Frame-rate reporting sink that renders nothing.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MonitorSpec {
    pub name: String,
    pub sync: bool,
}

impl Display for MonitorSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "fpsdisplaysink text-overlay=false sync={} video-sink=fakesink name={}",
            self.sync, self.name
        )
    }
}

/// Linear run of elements joined by [`LINK`].
#[derive(Debug, Default)]
pub struct Chain {
    elements: Vec<String>,
}

impl Chain {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn then(mut self, element: impl Display) -> Self {
        self.elements.push(element.to_string());
        self
    }
}

impl Display for Chain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (idx, element) in self.elements.iter().enumerate() {
            if idx > 0 {
                f.write_str(LINK)?;
            }
            f.write_str(element)?;
        }
        Ok(())
    }
}
