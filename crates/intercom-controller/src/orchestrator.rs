//! Event orchestration.
//!
//! The orchestrator merges every input of the intercom into the call and
//! door state machines. Each input has its own long-lived task:
//!
//! ```text
//! ┌──────────────┐
//! │ call button  │──► on_button ─────────► CallController::toggle
//! ├──────────────┤
//! │ door sensor  │──► on_door_feedback ──► classify_feedback ─► hangup
//! ├──────────────┤
//! │ events       │──► on_event ──────────► mark_established / mark_closed
//! │              │                         DTMF 5 ─► unlock pulse
//! ├──────────────┤
//! │ responses    │──► on_response (log)
//! ├──────────────┤
//! │ liveness     │──► on_liveness ───────► publish available, blink green
//! ├──────────────┤
//! │ bus          │──► on_bus_message ────► hangup ─► announce ─► unlock
//! └──────────────┘
//! ```
//!
//! Handlers never fail: errors are logged and the task moves on to the
//! next input. A task ends only when its source is closed.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinSet;
use tracing::{debug, error, info, warn};

use intercom_bus::{BusClient, BusMessage, Topics};
use intercom_core::constants::{
    AVAILABLE_PAYLOAD, CALL_PAYLOAD, LIVENESS_BLINK_SECS, UNLOCK_DIGIT, UNLOCK_PULSE_SECS,
    UNLOCK_SOUND,
};
use intercom_hardware::{EdgeSource, OutputPin};
use intercom_network::ControlStreams;
use intercom_protocol::{Event, EventKind, Response};

use crate::call::CallController;
use crate::door::{DoorController, FeedbackVerdict, classify_feedback};
use crate::softphone::Softphone;

/// The two indicator lights of the intercom panel.
#[derive(Clone)]
pub struct Indicators {
    /// Lit while a call is up.
    pub red: Arc<dyn OutputPin>,

    /// Blinks on every liveness reply.
    pub green: Arc<dyn OutputPin>,
}

impl Indicators {
    pub fn new(red: Arc<dyn OutputPin>, green: Arc<dyn OutputPin>) -> Self {
        Self { red, green }
    }
}

/// Inputs consumed by [`Orchestrator::start`].
pub struct Sources<Btn, Fb> {
    pub button: Btn,
    pub door_feedback: Fb,

    /// Present when voice calling is enabled.
    pub control: Option<ControlStreams>,

    /// Present when the bus is enabled.
    pub bus: Option<mpsc::Receiver<BusMessage>>,
}

struct Voice<S> {
    calls: Arc<CallController<S>>,
    number: String,
}

struct Bus<B> {
    client: B,
    topics: Topics,
}

/// Central coordinator of the intercom.
///
/// Build one with [`Orchestrator::builder`], then either call the `on_*`
/// handlers directly or hand the input sources to [`Orchestrator::start`].
pub struct Orchestrator<S, P, B> {
    door: Arc<DoorController<P>>,
    indicators: Indicators,
    voice: Option<Voice<S>>,
    bus: Option<Bus<B>>,
    unlock_pulse: Duration,
    blink: Duration,
}

impl<S, P, B> Orchestrator<S, P, B>
where
    S: Softphone + 'static,
    P: OutputPin + 'static,
    B: BusClient + 'static,
{
    pub fn builder(
        door: Arc<DoorController<P>>,
        indicators: Indicators,
    ) -> OrchestratorBuilder<S, P, B> {
        OrchestratorBuilder {
            door,
            indicators,
            voice: None,
            bus: None,
            unlock_pulse: Duration::from_secs(UNLOCK_PULSE_SECS),
            blink: Duration::from_secs(LIVENESS_BLINK_SECS),
        }
    }

    /// Spawn one task per input source.
    ///
    /// The returned set holds every task; tasks end only when their source
    /// is closed or fails.
    pub fn start<Btn, Fb>(self: Arc<Self>, sources: Sources<Btn, Fb>) -> JoinSet<()>
    where
        Btn: EdgeSource + 'static,
        Fb: EdgeSource + 'static,
    {
        let mut tasks = JoinSet::new();

        let this = Arc::clone(&self);
        let mut button = sources.button;
        tasks.spawn(async move {
            loop {
                match button.next_edge().await {
                    Ok(_) => this.on_button().await,
                    Err(e) => {
                        error!("Call button watch stopped: {}", e);
                        break;
                    }
                }
            }
        });

        let this = Arc::clone(&self);
        let mut door_feedback = sources.door_feedback;
        tasks.spawn(async move {
            loop {
                match door_feedback.next_edge().await {
                    Ok(_) => this.on_door_feedback().await,
                    Err(e) => {
                        error!("Door sensor watch stopped: {}", e);
                        break;
                    }
                }
            }
        });

        if let Some(control) = sources.control {
            let ControlStreams {
                mut responses,
                mut events,
                mut liveness,
            } = control;

            let this = Arc::clone(&self);
            tasks.spawn(async move {
                while let Some(event) = events.recv().await {
                    this.on_event(event).await;
                }
                debug!("Event stream closed");
            });

            let this = Arc::clone(&self);
            tasks.spawn(async move {
                while let Some(response) = responses.recv().await {
                    this.on_response(response);
                }
                debug!("Response stream closed");
            });

            let this = Arc::clone(&self);
            tasks.spawn(async move {
                while let Some(reply) = liveness.recv().await {
                    this.on_liveness(reply).await;
                }
                debug!("Liveness stream closed");
            });
        }

        if let Some(mut messages) = sources.bus {
            let this = Arc::clone(&self);
            tasks.spawn(async move {
                while let Some(message) = messages.recv().await {
                    this.on_bus_message(message).await;
                }
                debug!("Bus stream closed");
            });
        }

        tasks
    }

    /// Call button pressed.
    pub async fn on_button(&self) {
        info!("Call button pressed");
        if let Some(bus) = &self.bus {
            self.publish(bus.topics.call(), CALL_PAYLOAD).await;
        }

        let Some(voice) = &self.voice else {
            return;
        };
        match voice.calls.toggle(&voice.number).await {
            Ok(outcome) => info!("Call button: {}", outcome),
            // The error announcement was already played.
            Err(e) => error!("Call button action failed: {}", e),
        }
    }

    /// Message received from the bus.
    ///
    /// Hangup, announcement and pulse run in this order in the calling task.
    pub async fn on_bus_message(&self, message: BusMessage) {
        let Some(bus) = &self.bus else {
            return;
        };
        if !bus.topics.is_unlock(&message.topic) {
            debug!("Ignoring bus message on {}", message.topic);
            return;
        }

        info!("Remote unlock requested");
        if let Some(voice) = &self.voice {
            match voice.calls.hangup_if_active().await {
                Ok(true) => info!("Call hung up before remote unlock"),
                Ok(false) => {}
                Err(e) => error!("Hangup before remote unlock failed: {}", e),
            }
            self.announce_unlock(voice).await;
        }

        if let Err(e) = self.door.unlock(self.unlock_pulse).await {
            error!("Remote unlock failed: {}", e);
        }
    }

    /// Event received from the calling engine.
    pub async fn on_event(&self, event: Event) {
        let kind = event.kind();
        debug!("Event {} ({})", event.kind, event.id);

        let Some(voice) = &self.voice else {
            return;
        };

        match kind {
            kind if kind.marks_call_up() => {
                voice.calls.mark_established().await;
                self.set_indicator(&self.indicators.red, true, "red");
            }
            EventKind::CallClosed => {
                voice.calls.mark_closed().await;
                self.set_indicator(&self.indicators.red, false, "red");
            }
            EventKind::DtmfStart if event.param == UNLOCK_DIGIT => {
                info!("Unlock digit received from {}", event.peeruri);
                self.announce_unlock(voice).await;

                // The pulse runs on its own so the event queue keeps flowing.
                let door = Arc::clone(&self.door);
                let pulse = self.unlock_pulse;
                tokio::spawn(async move {
                    if let Err(e) = door.unlock(pulse).await {
                        error!("Unlock from keypad failed: {}", e);
                    }
                });
            }
            EventKind::DtmfStart | EventKind::DtmfEnd => {
                debug!("DTMF {} ignored", event.param);
            }
            _ => debug!("Unhandled event {}", event.kind),
        }
    }

    /// Door sensor edge.
    pub async fn on_door_feedback(&self) {
        let call_active = match &self.voice {
            Some(voice) => voice.calls.is_active().await,
            None => false,
        };

        match classify_feedback(self.door.unlocked_by_system(), call_active) {
            FeedbackVerdict::SystemRelease => debug!("Door opened by system release"),
            FeedbackVerdict::IdleManualRelease => {
                warn!("Door released manually with no call in progress");
            }
            FeedbackVerdict::ManualOverride => {
                info!("Door released from the handset, hanging up");
                if let Some(voice) = &self.voice {
                    if let Err(e) = voice.calls.hangup_if_active().await {
                        error!("Hangup after manual release failed: {}", e);
                    }
                }
            }
        }
    }

    /// Liveness reply from the calling engine.
    pub async fn on_liveness(&self, reply: Response) {
        debug!("Liveness reply (ok: {})", reply.ok);
        if let Some(bus) = &self.bus {
            self.publish(bus.topics.available(), AVAILABLE_PAYLOAD).await;
        }

        self.set_indicator(&self.indicators.green, true, "green");
        tokio::time::sleep(self.blink).await;
        self.set_indicator(&self.indicators.green, false, "green");
    }

    /// Reply to a dial, hangup or play command.
    pub fn on_response(&self, response: Response) {
        if response.ok {
            debug!("Command {} succeeded: {}", response.token, response.data);
        } else {
            warn!("Command {} failed: {}", response.token, response.data);
        }
    }

    pub fn door(&self) -> &DoorController<P> {
        &self.door
    }

    /// The call controller, when voice calling is enabled.
    pub fn calls(&self) -> Option<&CallController<S>> {
        self.voice.as_ref().map(|voice| voice.calls.as_ref())
    }

    async fn announce_unlock(&self, voice: &Voice<S>) {
        if let Err(e) = voice.calls.softphone().play(UNLOCK_SOUND).await {
            warn!("Failed to play {}: {}", UNLOCK_SOUND, e);
        }
    }

    async fn publish(&self, topic: &str, payload: &str) {
        let Some(bus) = &self.bus else {
            return;
        };
        if let Err(e) = bus.client.publish(topic, payload).await {
            warn!("Failed to publish to {}: {}", topic, e);
        }
    }

    fn set_indicator(&self, pin: &Arc<dyn OutputPin>, on: bool, name: &str) {
        if let Err(e) = pin.set_level(on.into()) {
            warn!("Failed to set {} light: {}", name, e);
        }
    }
}

/// Builder for [`Orchestrator`].
///
/// # Examples
///
/// ```
/// use std::sync::Arc;
/// use intercom_bus::MockBus;
/// use intercom_controller::mock::MockSoftphone;
/// use intercom_controller::{CallController, DoorController, Indicators, Orchestrator};
/// use intercom_hardware::DetachedPin;
///
/// let door = Arc::new(DoorController::new(DetachedPin::new("strike")));
/// let indicators = Indicators::new(
///     Arc::new(DetachedPin::new("red")),
///     Arc::new(DetachedPin::new("green")),
/// );
///
/// let orchestrator = Orchestrator::builder(door, indicators)
///     .with_voice(Arc::new(CallController::new(MockSoftphone::new())), "0612345678")
///     .with_bus(MockBus::new(), "intercom/frontdoor")
///     .build();
///
/// assert!(orchestrator.calls().is_some());
/// ```
pub struct OrchestratorBuilder<S, P, B> {
    door: Arc<DoorController<P>>,
    indicators: Indicators,
    voice: Option<Voice<S>>,
    bus: Option<Bus<B>>,
    unlock_pulse: Duration,
    blink: Duration,
}

impl<S, P, B> OrchestratorBuilder<S, P, B>
where
    S: Softphone + 'static,
    P: OutputPin + 'static,
    B: BusClient + 'static,
{
    /// Enable voice calling: button presses toggle a call to `number`.
    pub fn with_voice(mut self, calls: Arc<CallController<S>>, number: impl Into<String>) -> Self {
        self.voice = Some(Voice {
            calls,
            number: number.into(),
        });
        self
    }

    /// Enable the bus with topics under `base_topic`.
    ///
    /// `base_topic` must be non-empty; `Settings::validate` rejects an empty
    /// one before the orchestrator is built.
    pub fn with_bus(mut self, client: B, base_topic: &str) -> Self {
        self.bus = Some(Bus {
            client,
            topics: Topics::new(base_topic),
        });
        self
    }

    pub fn with_unlock_pulse(mut self, pulse: Duration) -> Self {
        self.unlock_pulse = pulse;
        self
    }

    pub fn with_blink(mut self, blink: Duration) -> Self {
        self.blink = blink;
        self
    }

    pub fn build(self) -> Orchestrator<S, P, B> {
        Orchestrator {
            door: self.door,
            indicators: self.indicators,
            voice: self.voice,
            bus: self.bus,
            unlock_pulse: self.unlock_pulse,
            blink: self.blink,
        }
    }
}
