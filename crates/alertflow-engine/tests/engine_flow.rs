//! End-to-end flows through the public engine API.

use alertflow_engine::config::EngineConfig;
use alertflow_engine::scheduler;
use alertflow_engine::AlertService;
use alertflow_common::types::{
    AlertFilter, AlertStatus, Condition, ConditionOp, CorrelationAction, EscalationEffect,
    NotificationIntent, Severity,
};
use anyhow::Result;
use async_trait::async_trait;
use serde_json::json;
use std::sync::{Arc, Mutex};
use std::time::Duration;

#[derive(Default)]
struct Recording {
    intents: Mutex<Vec<NotificationIntent>>,
    effects: Mutex<Vec<EscalationEffect>>,
}

#[async_trait]
impl alertflow_notify::NotificationDelivery for Recording {
    async fn deliver(&self, intent: &NotificationIntent) -> Result<()> {
        self.intents.lock().unwrap().push(intent.clone());
        Ok(())
    }

    fn name(&self) -> &str {
        "recording"
    }
}

#[async_trait]
impl alertflow_notify::EscalationSink for Recording {
    async fn execute(&self, effect: &EscalationEffect) -> Result<()> {
        self.effects.lock().unwrap().push(effect.clone());
        Ok(())
    }

    fn name(&self) -> &str {
        "recording"
    }
}

fn new_service() -> (Arc<AlertService>, Arc<Recording>) {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
    let recording = Arc::new(Recording::default());
    let service = Arc::new(AlertService::new(
        EngineConfig::default(),
        recording.clone(),
        recording.clone(),
    ));
    (service, recording)
}

fn offline_request(device: &str) -> alertflow_common::types::CreateAlertRequest {
    serde_json::from_value(json!({
        "source": "device-telemetry",
        "type": "DEVICE_OFFLINE",
        "title": "Device stopped reporting",
        "userId": "u-100",
        "deviceId": device,
    }))
    .unwrap()
}

#[tokio::test(start_paused = true)]
async fn lifecycle_with_background_scheduler() {
    let (service, recording) = new_service();
    let alert = service.create_alert(offline_request("d-1")).unwrap();
    assert_eq!(alert.status, AlertStatus::Active);
    assert_eq!(alert.severity, Severity::High);
    assert_eq!(alert.priority, 80);
    assert_eq!(alert.occurrence_count, 1);

    let handle = scheduler::spawn(service.clone(), 1);
    tokio::time::sleep(Duration::from_secs(2)).await;

    // The first ticks must have flushed the matching notification rule
    {
        let intents = recording.intents.lock().unwrap();
        assert_eq!(intents.len(), 1);
        assert_eq!(intents[0].alert_id, alert.id);
        assert_eq!(intents[0].title, "[HIGH] Device stopped reporting");
    }

    let acked = service.acknowledge_alert(&alert.id, "u-100").unwrap();
    assert_eq!(acked.status, AlertStatus::Acknowledged);

    let resolved = service
        .resolve_alert(&alert.id, "device came back", "u-100")
        .unwrap();
    assert_eq!(resolved.status, AlertStatus::Resolved);
    assert_eq!(resolved.resolution.as_deref(), Some("device came back"));

    let stats = service.stats();
    assert_eq!(stats.total_alerts, 1);
    assert_eq!(stats.resolved_alerts, 1);
    assert_eq!(stats.by_severity.get("high"), Some(&1));

    handle.stop().await;
}

#[tokio::test(start_paused = true)]
async fn duplicate_occurrences_notify_once() {
    let (service, recording) = new_service();
    let first = service.create_alert(offline_request("d-1")).unwrap();
    let second = service.create_alert(offline_request("d-1")).unwrap();
    assert_eq!(first.id, second.id);
    assert_eq!(second.occurrence_count, 2);

    service.run_tick();
    service.run_tick();
    tokio::time::sleep(Duration::from_millis(10)).await;

    assert_eq!(service.get_alerts(&AlertFilter::default()).len(), 1);
    assert_eq!(recording.intents.lock().unwrap().len(), 1);
}

#[tokio::test(start_paused = true)]
async fn correlation_rule_escalates_an_alert_storm() {
    let (service, _) = new_service();
    service
        .create_correlation_rule(
            "telemetry storm",
            vec![Condition {
                field: "source".to_string(),
                operator: ConditionOp::Equals,
                value: json!("device-telemetry"),
            }],
            30,
            3,
            CorrelationAction::Escalate,
            true,
        )
        .unwrap();

    for device in ["d-1", "d-2", "d-3"] {
        service.create_alert(offline_request(device)).unwrap();
    }

    service.run_tick();
    tokio::time::sleep(Duration::from_millis(10)).await;

    let alerts = service.get_alerts(&AlertFilter::default());
    assert_eq!(alerts.len(), 3);
    assert!(alerts.iter().all(|a| a.escalation_level == 1));
}

#[tokio::test(start_paused = true)]
async fn scheduler_stops_on_shutdown() {
    let (service, recording) = new_service();
    let handle = scheduler::spawn(service.clone(), 1);
    tokio::time::sleep(Duration::from_secs(1)).await;
    handle.stop().await;

    // Alerts created after shutdown are never flushed
    service.create_alert(offline_request("d-9")).unwrap();
    tokio::time::sleep(Duration::from_secs(5)).await;
    assert!(recording.intents.lock().unwrap().is_empty());
}
