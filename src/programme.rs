use std::sync::Arc;

use chrono::Utc;

use sqlx::SqlitePool;

use tokio::sync::broadcast;

use uuid::Uuid;

use crate::client::{DeliveryClient, GeneratorClient};
use crate::curriculum;
use crate::domain::EmailAddress;
use crate::model::{MessageStatus, NewMessage};
use crate::render;
use crate::repo::{MessageRepo, SqliteMessageRepo};

/// What one finished run produced
#[derive(Debug, Clone)]
pub struct RunSummary {
    pub subscriber_id: Uuid,
    pub scheduled: usize,
    pub failed: usize,
    pub phases_skipped: usize,
}

/// Terminal event of a background run, published on the runner's
/// completion channel
#[derive(Debug, Clone)]
pub enum RunOutcome {
    Completed(RunSummary),
    /// The run stopped early; only a store failure does this
    Aborted {
        subscriber_id: Uuid,
        reason: String,
    },
}

const COMPLETION_CHANNEL_CAPACITY: usize = 64;

/// Drives programme generation for enrolled subscribers.
///
/// One background task per enrollment; the enrollment response never waits
/// on it. Every run ends with a `RunOutcome` on the completion channel, so
/// the lifecycle is observable outside the request cycle.
#[derive(Clone)]
pub struct ProgrammeRunner {
    pool: SqlitePool,
    generator: Arc<GeneratorClient>,
    delivery: Arc<DeliveryClient>,
    completions: broadcast::Sender<RunOutcome>,
}

impl ProgrammeRunner {
    pub fn new(pool: SqlitePool, generator: GeneratorClient, delivery: DeliveryClient) -> Self {
        let (completions, _) = broadcast::channel(COMPLETION_CHANNEL_CAPACITY);

        Self {
            pool,
            generator: Arc::new(generator),
            delivery: Arc::new(delivery),
            completions,
        }
    }

    pub fn delivery_client(&self) -> &DeliveryClient {
        &self.delivery
    }

    /// Subscribe to run completions. Call before `spawn` to observe a
    /// specific run.
    pub fn completions(&self) -> broadcast::Receiver<RunOutcome> {
        self.completions.subscribe()
    }

    /// Fire-and-forget: start one programme run in the background
    pub fn spawn(&self, subscriber_id: Uuid, email: EmailAddress, role_description: String) {
        let runner = self.clone();

        tokio::spawn(async move {
            let outcome = match runner
                .run_programme(subscriber_id, &email, &role_description)
                .await
            {
                Ok(summary) => {
                    tracing::info!(
                        %subscriber_id,
                        scheduled = summary.scheduled,
                        failed = summary.failed,
                        phases_skipped = summary.phases_skipped,
                        "Programme run complete"
                    );
                    RunOutcome::Completed(summary)
                }
                Err(error) => {
                    tracing::error!(%subscriber_id, "Programme run aborted: {:?}", error);
                    RunOutcome::Aborted {
                        subscriber_id,
                        reason: error.to_string(),
                    }
                }
            };

            // No receiver is fine; the outcome is informational
            let _ = runner.completions.send(outcome);
        });
    }

    /// Walk the curriculum phase by phase. Provider failures are contained
    /// here: a failed generation skips its phase, a failed submission records
    /// a `failed` message, and either way the run continues. Only store
    /// errors propagate.
    #[tracing::instrument(name = "Run programme", skip(self, email, role_description))]
    pub async fn run_programme(
        &self,
        subscriber_id: Uuid,
        email: &EmailAddress,
        role_description: &str,
    ) -> crate::error::Result<RunSummary> {
        // One base instant for the whole run; every scheduled_for derives
        // from it exactly once
        let now = Utc::now();

        let mut summary = RunSummary {
            subscriber_id,
            scheduled: 0,
            failed: 0,
            phases_skipped: 0,
        };

        for phase in curriculum::phases() {
            let drafts = match self.generator.generate(phase, role_description).await {
                Ok(drafts) => drafts,
                Err(error) => {
                    tracing::warn!(
                        phase = phase.id,
                        "Skipping phase, generation failed: {:?}",
                        error
                    );
                    summary.phases_skipped += 1;
                    continue;
                }
            };

            for draft in drafts {
                let rendered = render::render(&draft, now);

                let external_delivery_id = match self.delivery.schedule(email, &rendered).await {
                    Ok(id) => Some(id),
                    Err(error) => {
                        tracing::warn!(
                            phase = phase.id,
                            day = draft.day,
                            "Submission failed: {:?}",
                            error
                        );
                        None
                    }
                };

                let status = if external_delivery_id.is_some() {
                    summary.scheduled += 1;
                    MessageStatus::Scheduled
                } else {
                    summary.failed += 1;
                    MessageStatus::Failed
                };

                let new_message = NewMessage {
                    subscriber_id,
                    external_delivery_id,
                    day_offset: draft.day,
                    phase_id: phase.id.into(),
                    subject: draft.subject.clone(),
                    scheduled_for: rendered.scheduled_for,
                    status,
                };

                SqliteMessageRepo::insert(&self.pool, &new_message).await?;
            }
        }

        Ok(summary)
    }
}
