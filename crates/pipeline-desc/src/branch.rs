//! The four resolution branches hanging off the preprocessor.

use std::{
    fmt::{self, Display},
    path::PathBuf,
};

use crate::{
    defaults,
    params::ResourcePaths,
    stages::{
        Chain, EncoderSpec, InferenceSpec, LINK, MonitorSpec, QueueSpec, Stage, TransportSpec,
    },
};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum BranchKind {
    UltraHd,
    FullHd,
    Hd,
    Sd,
}

impl BranchKind {
    /// Render order of the branches in the description.
    pub const ALL: [BranchKind; 4] = [
        BranchKind::UltraHd,
        BranchKind::FullHd,
        BranchKind::Hd,
        BranchKind::Sd,
    ];

    /// Suffix of the branch's OSD config file.
    pub fn osd_suffix(self) -> &'static str {
        match self {
            BranchKind::UltraHd => "4k",
            BranchKind::FullHd => "fhd",
            BranchKind::Hd => "hd",
            BranchKind::Sd => "sd",
        }
    }

    pub fn bitrate(self) -> u32 {
        match self {
            BranchKind::UltraHd => defaults::FOUR_K_BITRATE,
            BranchKind::FullHd => defaults::FHD_BITRATE,
            BranchKind::Hd => defaults::HD_BITRATE,
            BranchKind::Sd => defaults::SD_BITRATE,
        }
    }

    pub fn transport_port(self) -> u16 {
        match self {
            BranchKind::UltraHd => 5000,
            BranchKind::FullHd => 5002,
            BranchKind::Hd => 5004,
            BranchKind::Sd => 5006,
        }
    }

    pub fn tee_name(self) -> &'static str {
        match self {
            BranchKind::UltraHd => "fourk_enc_tee",
            BranchKind::FullHd => "fhd_tee",
            BranchKind::Hd => "hd_tee",
            BranchKind::Sd => "sd_tee",
        }
    }

    pub fn monitor_name(self) -> String {
        let tail = match self {
            BranchKind::UltraHd => "4k_enc",
            BranchKind::FullHd => "fhd",
            BranchKind::Hd => "hd_enc",
            BranchKind::Sd => "sd_enc",
        };
        format!("{}_{tail}", defaults::MONITOR_SINK_PREFIX)
    }

    /// Only the full-HD branch runs the detection network.
    pub fn runs_inference(self) -> bool {
        matches!(self, BranchKind::FullHd)
    }
}

/// One branch: processing stages, encoder, and the tee feeding its two leaves.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BranchSpec {
    pub kind: BranchKind,
    pub overlay_config_path: PathBuf,
    pub inference: Option<InferenceSpec>,
    pub encoder: EncoderSpec,
    pub tee_name: String,
    pub transport: TransportSpec,
    pub monitor: MonitorSpec,
    pub queue: QueueSpec,
}

impl BranchSpec {
    /// Standard deployment layout of `kind`.
    pub fn standard(kind: BranchKind, resources: &ResourcePaths, max_buffers: u32) -> Self {
        let inference = kind.runs_inference().then(|| InferenceSpec {
            hef_path: resources.hef(),
            network_name: defaults::NETWORK_NAME.to_string(),
            config_path: resources.network_config(),
            so_path: resources.postprocess_so(),
        });

        Self {
            kind,
            overlay_config_path: resources.osd_config(kind.osd_suffix()),
            inference,
            encoder: EncoderSpec {
                bitrate: kind.bitrate(),
                hrd: false,
            },
            tee_name: kind.tee_name().to_string(),
            transport: TransportSpec {
                host: defaults::TRANSPORT_HOST.to_string(),
                port: kind.transport_port(),
                sync: false,
            },
            monitor: MonitorSpec {
                name: kind.monitor_name(),
                sync: false,
            },
            queue: QueueSpec::lossless(max_buffers),
        }
    }

    /// Processing stages in link order. Each one gets a queue in front of it.
    pub fn stages(&self) -> Vec<Stage> {
        let mut stages = Vec::with_capacity(6);
        if let Some(inference) = &self.inference {
            stages.extend(Stage::inference(inference));
        }
        stages.push(Stage::Osd {
            config_path: self.overlay_config_path.clone(),
        });
        if self.inference.is_some() {
            stages.push(Stage::Upload {
                pool_size: defaults::UPLOAD_POOL_SIZE,
            });
        }
        stages.push(Stage::Encoder(self.encoder));
        stages
    }
}

/// Renders the branch body without the upstream `preproc. ! ` subscription.
impl Display for BranchSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut trunk = Chain::new();
        for stage in self.stages() {
            trunk = trunk.then(self.queue).then(stage);
        }
        let trunk = trunk
            .then("video/x-h264")
            .then(format_args!("tee name={}", self.tee_name));

        let transport = Chain::new()
            .then(self.queue)
            .then(self.transport.payloader())
            .then(self.transport.caps())
            .then(self.transport.sink());
        let monitor = Chain::new().then(self.queue).then(&self.monitor);

        let tee = &self.tee_name;
        write!(f, "{trunk} {tee}.{LINK}{transport} {tee}.{LINK}{monitor} ")
    }
}
