//! Daily triggers: cron schedules evaluated in the configured time zone.

use std::future::Future;
use std::str::FromStr;

use chrono::{DateTime, NaiveTime, Timelike, Utc};
use chrono_tz::Tz;
use cron::Schedule;
use tokio::task::JoinHandle;
use tracing::{error, info};

/// Accepts "HH:MM" or a 7-field cron expression (sec min hour day month dow year).
pub fn parse_schedule(spec: &str) -> Result<Schedule, String> {
    let spec = spec.trim();
    let expr = match NaiveTime::parse_from_str(spec, "%H:%M") {
        Ok(t) => format!("0 {} {} * * * *", t.minute(), t.hour()),
        Err(_) => spec.to_string(),
    };
    Schedule::from_str(&expr).map_err(|e| format!("Invalid schedule '{}': {}", spec, e))
}

/// Next firing strictly after `after`, in `tz` wall-clock terms.
pub fn next_fire(schedule: &Schedule, tz: Tz, after: DateTime<Utc>) -> Option<DateTime<Utc>> {
    schedule
        .after(&after.with_timezone(&tz))
        .next()
        .map(|t| t.with_timezone(&Utc))
}

/// A named daily trigger.
#[derive(Debug, Clone)]
pub struct Trigger {
    pub name: &'static str,
    pub schedule: Schedule,
    pub tz: Tz,
}

/// Run `job` every time `trigger` fires, forever. Job errors are logged and
/// the loop moves on to the next firing.
pub fn spawn_daily<F, Fut, E>(trigger: Trigger, job: F) -> JoinHandle<()>
where
    F: Fn() -> Fut + Send + 'static,
    Fut: Future<Output = Result<(), E>> + Send + 'static,
    E: std::fmt::Display + 'static,
{
    tokio::spawn(async move {
        loop {
            let now = Utc::now();
            let Some(next) = next_fire(&trigger.schedule, trigger.tz, now) else {
                error!("⏰ {} has no future occurrence, stopping", trigger.name);
                return;
            };
            info!("⏰ Next {} run at {}", trigger.name, next.with_timezone(&trigger.tz));

            let wait = (next - now).to_std().unwrap_or_default();
            tokio::time::sleep(wait).await;

            info!("⏰ Running {}", trigger.name);
            if let Err(e) = job().await {
                error!("{} failed: {}", trigger.name, e);
            }
        }
    })
}
