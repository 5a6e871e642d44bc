//! Periodic expiration sweeper: auto-resolves alerts whose timeout
//! elapsed and expires alerts past their explicit deadline. Auto-resolve
//! is checked first, so an alert satisfying both ends up resolved.

use crate::stats::StatsCounters;
use crate::store::AlertStore;
use chrono::{DateTime, Duration, Utc};

pub(crate) fn run(
    store: &mut AlertStore,
    stats: &mut StatsCounters,
    now: DateTime<Utc>,
) -> (usize, usize) {
    let mut resolved = 0;
    let mut expired = 0;

    for id in store.active_ids() {
        let Some((created_at, auto_resolve_timeout, expires_at)) = store
            .get(&id)
            .map(|a| (a.created_at, a.auto_resolve_timeout, a.expires_at))
        else {
            continue;
        };

        if let Some(timeout) = auto_resolve_timeout {
            if now >= created_at + Duration::minutes(timeout) {
                match store.resolve(&id, "auto_resolved", "system", now) {
                    Ok(alert) => {
                        let sample = (now - alert.created_at).num_seconds() as f64 / 60.0;
                        stats.record_resolved(sample);
                        resolved += 1;
                        tracing::info!(alert_id = %id, "Alert auto-resolved");
                    }
                    Err(e) => tracing::error!(alert_id = %id, error = %e, "Auto-resolve failed"),
                }
                continue;
            }
        }

        if let Some(deadline) = expires_at {
            if now > deadline {
                match store.expire(&id, now) {
                    Ok(_) => {
                        expired += 1;
                        tracing::info!(alert_id = %id, "Alert expired");
                    }
                    Err(e) => tracing::error!(alert_id = %id, error = %e, "Expiration failed"),
                }
            }
        }
    }

    (resolved, expired)
}
