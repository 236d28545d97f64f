//! Readiness polling

use std::future::Future;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::provider::ProviderGateway;

/// Polling options
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PollSettings {
    /// Delay before each state query, in seconds
    pub interval_secs: u64,

    /// Maximum number of state queries
    pub max_attempts: u32,
}

impl Default for PollSettings {
    fn default() -> Self {
        Self {
            interval_secs: 10,
            max_attempts: 30,
        }
    }
}

impl PollSettings {
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs)
    }

    /// Upper bound on time spent polling
    pub fn budget(&self) -> Duration {
        self.interval() * self.max_attempts
    }
}

/// Outcome of waiting for an instance to start
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "readiness", rename_all = "snake_case")]
pub enum Readiness {
    /// The instance reported running
    Ready { attempts: u32 },

    /// The attempt budget ran out; the instance may still be booting
    TimedOut {
        attempts: u32,
        last_status: Option<String>,
    },

    /// The provider reported no instance id, so there was nothing to poll
    UnknownInstance,
}

impl Readiness {
    pub fn is_ready(&self) -> bool {
        matches!(self, Readiness::Ready { .. })
    }

    pub fn attempts(&self) -> u32 {
        match self {
            Readiness::Ready { attempts } | Readiness::TimedOut { attempts, .. } => *attempts,
            Readiness::UnknownInstance => 0,
        }
    }
}

/// A single state query made while polling
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PollAttempt {
    pub attempt: u32,
    pub elapsed: Duration,
    /// Reported status, `None` if the query failed
    pub status: Option<String>,
}

/// Sleep, then query state, until the instance is running or the budget is
/// spent. Failed queries count as attempts. Never returns an error.
pub async fn poll_until_ready<S, F, O>(
    gateway: &dyn ProviderGateway,
    instance_id: &str,
    settings: &PollSettings,
    sleep_fn: S,
    mut observe: O,
) -> Readiness
where
    S: Fn(Duration) -> F,
    F: Future<Output = ()>,
    O: FnMut(&PollAttempt),
{
    info!(
        "Waiting for instance {} to start ({} attempts, {:?} apart)",
        instance_id,
        settings.max_attempts,
        settings.interval()
    );

    let mut last_status = None;

    for attempt in 1..=settings.max_attempts {
        sleep_fn(settings.interval()).await;

        let status = match gateway.get_state(instance_id).await {
            Ok(state) => Some(state.status_text().unwrap_or("unknown").to_string()),
            Err(e) => {
                debug!("State query {} for {} failed: {}", attempt, instance_id, e);
                None
            }
        };

        observe(&PollAttempt {
            attempt,
            elapsed: settings.interval() * attempt,
            status: status.clone(),
        });

        if let Some(ref s) = status {
            if s.eq_ignore_ascii_case("running") {
                info!("Instance {} running after {} attempts", instance_id, attempt);
                return Readiness::Ready { attempts: attempt };
            }
            last_status = Some(s.clone());
        }
    }

    warn!(
        "Instance {} not running after {:?}; it may still be starting",
        instance_id,
        settings.budget()
    );

    Readiness::TimedOut {
        attempts: settings.max_attempts,
        last_status,
    }
}
