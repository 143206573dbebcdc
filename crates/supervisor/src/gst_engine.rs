//! GStreamer-backed [`PipelineEngine`].

use std::{sync::LazyLock, time::Duration};

use gstreamer as gst;
use gstreamer::prelude::*;
use tracing::debug;

use crate::engine::{BusMessage, EngineError, PipelineEngine, PlaybackState, Severity, StageFault};

static CAT: LazyLock<gst::DebugCategory> = LazyLock::new(|| {
    gst::DebugCategory::new(
        "camstream",
        gst::DebugColorFlags::empty(),
        Some("Camera streaming pipeline supervisor"),
    )
});

/// Property carrying fpsdisplaysink measurements.
const FPS_PROPERTY: &str = "last-message";

pub struct GstEngine {
    /// Name prefix of sinks whose measurements are forwarded.
    fps_sink_prefix: Option<String>,
}

pub struct GstInstance {
    pipeline: gst::Element,
    bus: gst::Bus,
    message_types: Vec<gst::MessageType>,
}

impl GstEngine {
    pub fn init() -> Result<Self, EngineError> {
        gst::init().map_err(|err| EngineError::Init(err.to_string()))?;
        debug!("GStreamer {} initialised", gst::version_string());
        Ok(Self {
            fps_sink_prefix: None,
        })
    }

    /// Forward frame-rate reports of sinks named `<prefix>*` as stats messages.
    pub fn with_fps_reporting(mut self, prefix: impl Into<String>) -> Self {
        self.fps_sink_prefix = Some(prefix.into());
        self
    }

    fn stats(&self, message: &gst::message::PropertyNotify) -> Option<BusMessage> {
        let prefix = self.fps_sink_prefix.as_deref()?;
        let (object, property, value) = message.get();
        if property != FPS_PROPERTY {
            return None;
        }
        let stage = object.name();
        if !stage.starts_with(prefix) {
            return None;
        }
        let text = value?.get::<Option<String>>().ok().flatten()?;
        Some(BusMessage::Stats {
            stage: stage.to_string(),
            text,
        })
    }
}

impl PipelineEngine for GstEngine {
    type Instance = GstInstance;

    fn construct(&mut self, description: &str) -> Result<GstInstance, EngineError> {
        let pipeline = gst::parse::launch(description)
            .map_err(|err| EngineError::Construct(err.to_string()))?;
        let bus = pipeline.bus().ok_or(EngineError::MissingBus)?;

        let mut message_types = vec![gst::MessageType::Error, gst::MessageType::Eos];
        if self.fps_sink_prefix.is_some() {
            // The watch id is only needed to remove the watch before the
            // pipeline is dropped, which drop already does.
            let _ = pipeline.add_property_deep_notify_watch(Some(FPS_PROPERTY), true);
            message_types.push(gst::MessageType::PropertyNotify);
        }

        Ok(GstInstance {
            pipeline,
            bus,
            message_types,
        })
    }

    fn set_state(
        &mut self,
        instance: &GstInstance,
        state: PlaybackState,
    ) -> Result<(), EngineError> {
        let target = match state {
            PlaybackState::Playing => gst::State::Playing,
            PlaybackState::Null => gst::State::Null,
        };
        instance
            .pipeline
            .set_state(target)
            .map(|_| ())
            .map_err(|err| EngineError::StateChange {
                state,
                reason: err.to_string(),
            })
    }

    fn send_eos(&mut self, instance: &GstInstance) -> bool {
        instance.pipeline.send_event(gst::event::Eos::new())
    }

    fn poll_bus(&mut self, instance: &GstInstance, timeout: Duration) -> Option<BusMessage> {
        let timeout = gst::ClockTime::from_mseconds(timeout.as_millis() as u64);
        let message = instance
            .bus
            .timed_pop_filtered(timeout, &instance.message_types)?;

        use gst::MessageView;
        match message.view() {
            MessageView::Error(err) => Some(BusMessage::Error(StageFault {
                stage: err
                    .src()
                    .map(|src| src.name().to_string())
                    .unwrap_or_else(|| "unknown".to_string()),
                message: err.error().to_string(),
                debug: err.debug().map(|debug| debug.to_string()),
            })),
            MessageView::Eos(..) => Some(BusMessage::Eos),
            MessageView::PropertyNotify(notify) => self.stats(notify),
            _ => Some(BusMessage::Other(format!("{:?}", message.type_()))),
        }
    }

    fn release(&mut self, instance: GstInstance) {
        drop(instance);
        debug!("GStreamer pipeline released");
    }

    fn diagnostic(&mut self, instance: &GstInstance, severity: Severity, text: &str) {
        let pipeline = &instance.pipeline;
        match severity {
            Severity::Info => gst::info!(CAT, obj = pipeline, "{}", text),
            Severity::Warning => gst::warning!(CAT, obj = pipeline, "{}", text),
            Severity::Error => gst::error!(CAT, obj = pipeline, "{}", text),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;

    use super::*;
    use crate::{
        interrupt::{InterruptFlags, InterruptSource},
        lifecycle::{Outcome, Supervisor, SupervisorError},
    };

    /// Counts teardown calls on the way through to the real engine.
    struct Counting {
        inner: GstEngine,
        nulls: u32,
        releases: u32,
        eos_sent: u32,
    }

    impl Counting {
        fn new() -> Self {
            Self {
                inner: GstEngine::init().expect("gstreamer init"),
                nulls: 0,
                releases: 0,
                eos_sent: 0,
            }
        }
    }

    impl PipelineEngine for Counting {
        type Instance = GstInstance;

        fn construct(&mut self, description: &str) -> Result<GstInstance, EngineError> {
            self.inner.construct(description)
        }

        fn set_state(
            &mut self,
            instance: &GstInstance,
            state: PlaybackState,
        ) -> Result<(), EngineError> {
            if state == PlaybackState::Null {
                self.nulls += 1;
            }
            self.inner.set_state(instance, state)
        }

        fn send_eos(&mut self, instance: &GstInstance) -> bool {
            self.eos_sent += 1;
            self.inner.send_eos(instance)
        }

        fn poll_bus(&mut self, instance: &GstInstance, timeout: Duration) -> Option<BusMessage> {
            self.inner.poll_bus(instance, timeout)
        }

        fn release(&mut self, instance: GstInstance) {
            self.releases += 1;
            self.inner.release(instance);
        }
    }

    #[derive(Default)]
    struct LocalInterrupts {
        flags: InterruptFlags,
        restores: Cell<u32>,
    }

    impl InterruptSource for LocalInterrupts {
        fn take_interrupt(&self) -> bool {
            self.flags.take_interrupt()
        }

        fn set_waiting_for_eos(&self, waiting: bool) {
            self.flags.set_waiting_for_eos(waiting);
        }

        fn restore(&self) {
            self.restores.set(self.restores.get() + 1);
        }
    }

    #[test]
    fn finite_source_reaches_end_of_stream() {
        let mut supervisor = Supervisor::new(Counting::new(), LocalInterrupts::default());
        let report = supervisor
            .run("fakesrc num-buffers=3 ! fakesink")
            .expect("run");

        assert_eq!(report.outcome, Outcome::Ok);
        assert_eq!(report.eos_requests, 0);
        let (engine, interrupts) = supervisor.into_parts();
        assert_eq!(engine.nulls, 1);
        assert_eq!(engine.releases, 1);
        assert_eq!(interrupts.restores.get(), 1);
    }

    #[test]
    fn unknown_element_fails_construction() {
        let mut supervisor = Supervisor::new(Counting::new(), LocalInterrupts::default());
        let err = supervisor
            .run("fakesrc ! no_such_element")
            .expect_err("unknown element");

        assert!(matches!(
            err,
            SupervisorError::Construction(EngineError::Construct(_))
        ));
        let (engine, _) = supervisor.into_parts();
        assert_eq!(engine.nulls, 0);
        assert_eq!(engine.releases, 0);
    }

    #[test]
    fn pending_interrupt_drains_endless_source() {
        let interrupts = LocalInterrupts::default();
        interrupts.flags.on_interrupt(|| {});
        let mut supervisor = Supervisor::new(Counting::new(), interrupts);
        let report = supervisor
            .run("fakesrc num-buffers=-1 ! fakesink")
            .expect("run");

        assert_eq!(report.outcome, Outcome::Ok);
        assert_eq!(report.eos_requests, 1);
        let (engine, _) = supervisor.into_parts();
        assert_eq!(engine.eos_sent, 1);
        assert_eq!(engine.nulls, 1);
        assert_eq!(engine.releases, 1);
    }

    #[test]
    fn error_message_names_the_posting_element() {
        let mut engine = GstEngine::init().expect("gstreamer init");
        let instance = engine
            .construct("fakesrc name=encoder0 num-buffers=1 ! fakesink")
            .expect("construct");
        let bin = instance
            .pipeline
            .downcast_ref::<gst::Bin>()
            .expect("launch line yields a bin");
        let src = bin.by_name("encoder0").expect("named element");

        let message = gst::message::Error::builder(gst::CoreError::Failed, "encoder stalled")
            .src(&src)
            .build();
        instance.bus.post(message).expect("post on bus");

        match engine.poll_bus(&instance, Duration::from_millis(250)) {
            Some(BusMessage::Error(fault)) => {
                assert_eq!(fault.stage, "encoder0");
                assert_eq!(fault.message, "encoder stalled");
            }
            other => panic!("expected stage error, got {other:?}"),
        }
        engine.release(instance);
    }

    #[test]
    fn quiet_bus_times_out() {
        let mut engine = GstEngine::init().expect("gstreamer init");
        let instance = engine
            .construct("fakesrc num-buffers=1 ! fakesink")
            .expect("construct");
        assert_eq!(engine.poll_bus(&instance, Duration::from_millis(20)), None);
        engine.release(instance);
    }
}
