use crate::dispatch::{render_intent, NotificationDispatcher};
use crate::log::LogDelivery;
use crate::{EscalationSink, NotificationDelivery};
use alertflow_common::types::{
    ChannelKind, EscalationAction, EscalationEffect, NotificationIntent, Severity,
};
use anyhow::Result;
use async_trait::async_trait;
use std::collections::BTreeSet;
use std::sync::{Arc, Mutex};

#[derive(Default)]
struct Recording {
    intents: Mutex<Vec<NotificationIntent>>,
    effects: Mutex<Vec<EscalationEffect>>,
}

#[async_trait]
impl NotificationDelivery for Recording {
    async fn deliver(&self, intent: &NotificationIntent) -> Result<()> {
        self.intents.lock().unwrap().push(intent.clone());
        Ok(())
    }

    fn name(&self) -> &str {
        "recording"
    }
}

#[async_trait]
impl EscalationSink for Recording {
    async fn execute(&self, effect: &EscalationEffect) -> Result<()> {
        self.effects.lock().unwrap().push(effect.clone());
        Ok(())
    }

    fn name(&self) -> &str {
        "recording"
    }
}

fn channels(kinds: &[ChannelKind]) -> BTreeSet<ChannelKind> {
    kinds.iter().copied().collect()
}

#[test]
fn render_intent_prefixes_severity() {
    let intent = render_intent(
        "a-1",
        Severity::Critical,
        "Device offline",
        "Device d1 stopped reporting",
        channels(&[ChannelKind::Push, ChannelKind::Email]),
    );
    assert_eq!(intent.title, "[CRITICAL] Device offline");
    assert_eq!(intent.body, "Device d1 stopped reporting");
    assert_eq!(intent.channels.len(), 2);
}

#[test]
fn render_intent_falls_back_to_title_body() {
    let intent = render_intent("a-1", Severity::Low, "Ping", "", channels(&[ChannelKind::Sms]));
    assert_eq!(intent.body, "Ping");
}

#[tokio::test(start_paused = true)]
async fn dispatcher_delivers_immediate_intent() {
    let recording = Arc::new(Recording::default());
    let dispatcher =
        NotificationDispatcher::new(recording.clone(), Arc::new(LogDelivery));

    let intent = render_intent(
        "a-1",
        Severity::High,
        "Device offline",
        "gone",
        channels(&[ChannelKind::Push]),
    );
    dispatcher.schedule(intent, 0).unwrap();

    // Let the spawned task run
    tokio::time::sleep(std::time::Duration::from_millis(10)).await;

    let intents = recording.intents.lock().unwrap();
    assert_eq!(intents.len(), 1);
    assert_eq!(intents[0].alert_id, "a-1");
}

#[tokio::test(start_paused = true)]
async fn dispatcher_waits_for_delay() {
    let recording = Arc::new(Recording::default());
    let dispatcher =
        NotificationDispatcher::new(recording.clone(), Arc::new(LogDelivery));

    let intent = render_intent(
        "a-2",
        Severity::Medium,
        "Billing failure",
        "",
        channels(&[ChannelKind::Email]),
    );
    dispatcher.schedule(intent, 5).unwrap();

    tokio::time::sleep(std::time::Duration::from_secs(1)).await;
    assert!(recording.intents.lock().unwrap().is_empty(), "fired too early");

    // Paused-time sleep auto-advances past the 5-minute delay
    tokio::time::sleep(std::time::Duration::from_secs(5 * 60)).await;
    assert_eq!(recording.intents.lock().unwrap().len(), 1);
}

#[tokio::test(start_paused = true)]
async fn dispatcher_rejects_empty_channel_set() {
    let recording = Arc::new(Recording::default());
    let dispatcher =
        NotificationDispatcher::new(recording.clone(), Arc::new(LogDelivery));

    let intent = render_intent("a-3", Severity::Low, "No channels", "", BTreeSet::new());
    let err = dispatcher.schedule(intent, 0).unwrap_err();
    assert!(matches!(err, crate::error::NotifyError::EmptyChannelSet { .. }));

    tokio::time::sleep(std::time::Duration::from_millis(10)).await;
    assert!(recording.intents.lock().unwrap().is_empty());
}

#[tokio::test(start_paused = true)]
async fn dispatcher_tolerates_absurd_delay() {
    let recording = Arc::new(Recording::default());
    let dispatcher =
        NotificationDispatcher::new(recording.clone(), Arc::new(LogDelivery));

    let intent = render_intent(
        "a-5",
        Severity::Low,
        "Far future",
        "",
        channels(&[ChannelKind::Push]),
    );
    // Must neither overflow nor fire
    dispatcher.schedule(intent, i64::MAX).unwrap();

    tokio::time::sleep(std::time::Duration::from_secs(60)).await;
    assert!(recording.intents.lock().unwrap().is_empty());
}

#[tokio::test(start_paused = true)]
async fn dispatcher_executes_escalation_effect() {
    let recording = Arc::new(Recording::default());
    let dispatcher =
        NotificationDispatcher::new(Arc::new(LogDelivery), recording.clone());

    dispatcher.execute_effect(EscalationEffect {
        alert_id: "a-4".to_string(),
        action: EscalationAction::CreateTicket {
            params: serde_json::json!({ "queue": "ops" }),
        },
    });

    tokio::time::sleep(std::time::Duration::from_millis(10)).await;

    let effects = recording.effects.lock().unwrap();
    assert_eq!(effects.len(), 1);
    assert_eq!(effects[0].action.kind(), "create_ticket");
}
