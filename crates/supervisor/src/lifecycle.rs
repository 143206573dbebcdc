//! Lifecycle supervisor driving one pipeline run from construction to
//! teardown.
//!
//! The run is a single bounded-wait poll loop. Each iteration waits on the
//! engine bus for at most the poll interval, then checks the interrupt flag.
//! An interrupt turns into one EOS injection; the loop keeps polling until the
//! engine confirms EOS or reports an error. Teardown always runs.

use std::time::Duration;

use thiserror::Error;
use tracing::{debug, error, info, warn};

use crate::{
    engine::{BusMessage, EngineError, PipelineEngine, PlaybackState, Severity, StageFault},
    interrupt::InterruptSource,
};

/// Bus wait per iteration; bounds interrupt latency to four checks a second.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(250);

/// Process status for an error-terminated run: the engine's generic flow
/// error (-5) as an exit byte.
pub const FLOW_ERROR_EXIT_CODE: u8 = 251;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Outcome {
    Ok,
    Error,
}

impl Outcome {
    pub fn exit_code(self) -> u8 {
        match self {
            Outcome::Ok => 0,
            Outcome::Error => FLOW_ERROR_EXIT_CODE,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LifecycleState {
    Idle,
    Playing,
    EosRequested,
    Terminated(Outcome),
}

/// What a finished run looked like.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RunReport {
    pub outcome: Outcome,
    /// Set when a stage error terminated the run.
    pub fault: Option<StageFault>,
    pub eos_requests: u32,
    pub state: LifecycleState,
}

#[derive(Debug, Error)]
pub enum SupervisorError {
    #[error("pipeline construction failed")]
    Construction(#[source] EngineError),
}

pub struct Supervisor<E, I> {
    engine: E,
    interrupts: I,
    poll_interval: Duration,
    state: LifecycleState,
}

impl<E, I> Supervisor<E, I>
where
    E: PipelineEngine,
    I: InterruptSource,
{
    pub fn new(engine: E, interrupts: I) -> Self {
        Self {
            engine,
            interrupts,
            poll_interval: DEFAULT_POLL_INTERVAL,
            state: LifecycleState::Idle,
        }
    }

    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    pub fn state(&self) -> LifecycleState {
        self.state
    }

    pub fn engine(&self) -> &E {
        &self.engine
    }

    pub fn into_parts(self) -> (E, I) {
        (self.engine, self.interrupts)
    }

    /// Construct the pipeline from `description` and supervise it to the end.
    pub fn run(&mut self, description: &str) -> Result<RunReport, SupervisorError> {
        let span = tracing::info_span!(
            "camstream.supervise",
            poll_ms = self.poll_interval.as_millis() as u64,
            outcome = tracing::field::Empty,
        );
        let _span_guard = span.enter();

        let instance = self
            .engine
            .construct(description)
            .map_err(SupervisorError::Construction)?;
        info!("Parsed pipeline");

        info!("Setting state to playing");
        if let Err(err) = self.engine.set_state(&instance, PlaybackState::Playing) {
            // The engine posts the cause on its bus; the poll loop picks it up.
            warn!("{err}");
        }
        self.state = LifecycleState::Playing;

        let (outcome, fault, eos_requests) = self.poll_until_terminated(&instance);
        self.state = LifecycleState::Terminated(outcome);
        span.record("outcome", tracing::field::debug(outcome));

        self.teardown(instance);
        info!("Pipeline ended");

        Ok(RunReport {
            outcome,
            fault,
            eos_requests,
            state: self.state,
        })
    }

    fn poll_until_terminated(
        &mut self,
        instance: &E::Instance,
    ) -> (Outcome, Option<StageFault>, u32) {
        let mut eos_requests = 0;
        loop {
            if let Some(message) = self.engine.poll_bus(instance, self.poll_interval) {
                if let Some((outcome, fault)) = self.terminal(instance, message) {
                    self.interrupts.set_waiting_for_eos(false);
                    self.interrupts.restore();
                    return (outcome, fault, eos_requests);
                }
            }

            if self.state == LifecycleState::Playing && self.interrupts.take_interrupt() {
                self.interrupts.set_waiting_for_eos(true);
                self.report(instance, "handling interrupt. send EOS");
                if !self.engine.send_eos(instance) {
                    warn!("Engine rejected the EOS event");
                }
                eos_requests += 1;
                self.state = LifecycleState::EosRequested;
            }
        }
    }

    /// Classify a bus message; `None` means keep polling.
    fn terminal(
        &mut self,
        instance: &E::Instance,
        message: BusMessage,
    ) -> Option<(Outcome, Option<StageFault>)> {
        match message {
            BusMessage::Error(fault) => {
                let text = format!(
                    "Error received from element {}: {}",
                    fault.stage, fault.message
                );
                self.engine.diagnostic(instance, Severity::Error, &text);
                error!("{text}");
                error!(
                    "Debugging information: {}",
                    fault.debug.as_deref().unwrap_or("none")
                );
                Some((Outcome::Error, Some(fault)))
            }
            BusMessage::Eos => {
                self.engine.diagnostic(instance, Severity::Info, "End-Of-Stream reached");
                info!("End-Of-Stream reached");
                Some((Outcome::Ok, None))
            }
            BusMessage::Stats { stage, text } => {
                info!(stage = %stage, "{text}");
                None
            }
            BusMessage::Other(kind) => {
                let text = format!("Unexpected message received: {kind}");
                self.engine.diagnostic(instance, Severity::Warning, &text);
                warn!("{text}");
                Some((Outcome::Error, None))
            }
        }
    }

    fn report(&mut self, instance: &E::Instance, text: &str) {
        self.engine.diagnostic(instance, Severity::Info, text);
        self.engine.diagnostic(instance, Severity::Error, text);
        info!("{text}");
    }

    fn teardown(&mut self, instance: E::Instance) {
        if let Err(err) = self.engine.set_state(&instance, PlaybackState::Null) {
            warn!("{err}");
        }
        self.engine.release(instance);
        debug!("Pipeline released");
    }
}

#[cfg(test)]
mod tests {
    use std::{cell::Cell, collections::VecDeque, rc::Rc};

    use super::*;
    use crate::interrupt::InterruptFlags;

    enum Step {
        Quiet,
        Deliver(BusMessage),
        /// Simulates SIGINT arriving during this poll.
        Interrupt,
    }

    #[derive(Debug, PartialEq, Eq)]
    enum Call {
        Construct,
        SetState(PlaybackState),
        SendEos,
        Release,
    }

    struct ScriptedEngine {
        script: VecDeque<Step>,
        flags: Rc<InterruptFlags>,
        restores: Rc<Cell<u32>>,
        calls: Vec<Call>,
        fail_construct: bool,
    }

    impl PipelineEngine for ScriptedEngine {
        type Instance = ();

        fn construct(&mut self, _description: &str) -> Result<(), EngineError> {
            self.calls.push(Call::Construct);
            if self.fail_construct {
                Err(EngineError::Construct("no element \"hailonet\"".into()))
            } else {
                Ok(())
            }
        }

        fn set_state(&mut self, _: &(), state: PlaybackState) -> Result<(), EngineError> {
            self.calls.push(Call::SetState(state));
            Ok(())
        }

        fn send_eos(&mut self, _: &()) -> bool {
            self.calls.push(Call::SendEos);
            true
        }

        fn poll_bus(&mut self, _: &(), _timeout: Duration) -> Option<BusMessage> {
            match self.script.pop_front() {
                Some(Step::Deliver(message)) => Some(message),
                Some(Step::Interrupt) => {
                    let restores = self.restores.clone();
                    self.flags.on_interrupt(|| restores.set(restores.get() + 1));
                    None
                }
                Some(Step::Quiet) => None,
                // A drained script behaves like a well-behaved pipeline.
                None => Some(BusMessage::Eos),
            }
        }

        fn release(&mut self, _: ()) {
            self.calls.push(Call::Release);
        }
    }

    struct TestInterrupts {
        flags: Rc<InterruptFlags>,
        restores: Rc<Cell<u32>>,
    }

    impl InterruptSource for TestInterrupts {
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

    fn supervisor(script: Vec<Step>) -> Supervisor<ScriptedEngine, TestInterrupts> {
        let flags = Rc::new(InterruptFlags::new());
        let restores = Rc::new(Cell::new(0));
        let engine = ScriptedEngine {
            script: script.into(),
            flags: flags.clone(),
            restores: restores.clone(),
            calls: Vec::new(),
            fail_construct: false,
        };
        Supervisor::new(engine, TestInterrupts { flags, restores })
            .with_poll_interval(Duration::from_millis(1))
    }

    fn fault(stage: &str) -> BusMessage {
        BusMessage::Error(StageFault {
            stage: stage.into(),
            message: "Internal data stream error.".into(),
            debug: None,
        })
    }

    fn count(calls: &[Call], wanted: &Call) -> usize {
        calls.iter().filter(|call| *call == wanted).count()
    }

    #[test]
    fn eos_without_interrupt_exits_cleanly() {
        let mut sup = supervisor(vec![Step::Quiet, Step::Deliver(BusMessage::Eos)]);
        let report = sup.run("fakesrc ! fakesink").expect("run");
        assert_eq!(report.outcome, Outcome::Ok);
        assert_eq!(report.outcome.exit_code(), 0);
        assert_eq!(report.eos_requests, 0);
        assert_eq!(sup.state(), LifecycleState::Terminated(Outcome::Ok));
        assert_eq!(
            sup.engine().calls,
            [
                Call::Construct,
                Call::SetState(PlaybackState::Playing),
                Call::SetState(PlaybackState::Null),
                Call::Release
            ]
        );
    }

    #[test]
    fn stage_error_terminates_with_error_and_tears_down() {
        let mut sup = supervisor(vec![Step::Deliver(fault("encoder0"))]);
        let report = sup.run("x").expect("run");
        assert_eq!(report.outcome, Outcome::Error);
        assert_ne!(report.outcome.exit_code(), 0);
        assert_eq!(report.fault.map(|f| f.stage).as_deref(), Some("encoder0"));
        let calls = &sup.engine().calls;
        assert_eq!(count(calls, &Call::SetState(PlaybackState::Null)), 1);
        assert_eq!(count(calls, &Call::Release), 1);
    }

    #[test]
    fn error_wins_over_pending_interrupt() {
        let mut sup = supervisor(vec![Step::Deliver(fault("src_0"))]);
        sup.engine.flags.on_interrupt(|| {});
        let report = sup.run("x").expect("run");
        assert_eq!(report.outcome, Outcome::Error);
        assert_eq!(report.eos_requests, 0);
        assert_eq!(count(&sup.engine().calls, &Call::SendEos), 0);
    }

    #[test]
    fn interrupt_then_eos_sends_exactly_one_eos() {
        let mut sup = supervisor(vec![
            Step::Interrupt,
            Step::Quiet,
            Step::Quiet,
            Step::Deliver(BusMessage::Eos),
        ]);
        let report = sup.run("x").expect("run");
        assert_eq!(report.outcome, Outcome::Ok);
        assert_eq!(report.eos_requests, 1);

        let calls = &sup.engine().calls;
        assert_eq!(count(calls, &Call::SendEos), 1);
        let eos_at = calls.iter().position(|c| *c == Call::SendEos);
        let null_at = calls
            .iter()
            .position(|c| *c == Call::SetState(PlaybackState::Null));
        assert!(eos_at < null_at);
    }

    #[test]
    fn second_interrupt_restores_default_without_second_eos() {
        let mut sup = supervisor(vec![
            Step::Interrupt,
            Step::Interrupt,
            Step::Quiet,
            Step::Deliver(BusMessage::Eos),
        ]);
        let report = sup.run("x").expect("run");
        assert_eq!(report.eos_requests, 1);
        assert_eq!(count(&sup.engine().calls, &Call::SendEos), 1);
        // Handler restore on first delivery; the pending mark set by the
        // supervisor absorbs the second; final restore after EOS.
        let (_, interrupts) = sup.into_parts();
        assert_eq!(interrupts.restores.get(), 2);
        assert!(!interrupts.flags.waiting_for_eos());
    }

    #[test]
    fn stats_messages_do_not_terminate() {
        let mut sup = supervisor(vec![
            Step::Deliver(BusMessage::Stats {
                stage: "hailo_display_fhd".into(),
                text: "rendered: 30, dropped: 0, current: 30.00, average: 30.00".into(),
            }),
            Step::Deliver(BusMessage::Eos),
        ]);
        let report = sup.run("x").expect("run");
        assert_eq!(report.outcome, Outcome::Ok);
    }

    #[test]
    fn unexpected_message_is_an_error() {
        let mut sup = supervisor(vec![Step::Deliver(BusMessage::Other("Tag".into()))]);
        let report = sup.run("x").expect("run");
        assert_eq!(report.outcome, Outcome::Error);
        assert!(report.fault.is_none());
        assert_eq!(count(&sup.engine().calls, &Call::Release), 1);
    }

    #[test]
    fn construction_failure_skips_teardown() {
        let mut sup = supervisor(Vec::new());
        sup.engine.fail_construct = true;
        let err = sup.run("bogus ! ").expect_err("construction must fail");
        assert!(matches!(err, SupervisorError::Construction(_)));
        assert_eq!(sup.engine().calls, [Call::Construct]);
        assert_eq!(sup.state(), LifecycleState::Idle);
    }
}
