use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde_json::{Map, Value};

use super::deadline::AdmissionWindow;
use super::idempotency;
use super::parser::FormSubmission;
use super::tracks::TrackForm;
use super::uploads::{AttachmentUploader, UploadOutcome};
use super::validate::{self, is_checked};
use super::{IntakeError, IntakeWarning, Receipt};
use crate::config::{IntakeConfig, StorageConfig};
use crate::db::SubmissionRepository;
use crate::email::templates::{self, Confirmation};
use crate::email::{Email, Mailer};
use crate::models::{NewSubmission, Track};
use crate::storage::ObjectStore;

/// Gate → Validate → Upload → Persist → Notify, in that order, for one form.
pub struct IntakePipeline {
    config: IntakeConfig,
    repo: Arc<dyn SubmissionRepository>,
    mailer: Arc<dyn Mailer>,
    grants_uploader: AttachmentUploader,
    posters_uploader: AttachmentUploader,
}

impl IntakePipeline {
    pub fn new(
        config: IntakeConfig,
        storage: &StorageConfig,
        repo: Arc<dyn SubmissionRepository>,
        store: Arc<dyn ObjectStore>,
        mailer: Arc<dyn Mailer>,
    ) -> Self {
        let ttl = Duration::from_secs(config.signed_url_ttl_secs);
        Self {
            grants_uploader: AttachmentUploader::new(store.clone(), &storage.grants_bucket, ttl),
            posters_uploader: AttachmentUploader::new(store, &storage.posters_bucket, ttl),
            config,
            repo,
            mailer,
        }
    }

    pub fn config(&self) -> &IntakeConfig {
        &self.config
    }

    pub fn window(&self, track: Track) -> AdmissionWindow {
        AdmissionWindow::for_track(&self.config, track)
    }

    fn uploader(&self, track: Track) -> &AttachmentUploader {
        if track.is_grant() {
            &self.grants_uploader
        } else {
            &self.posters_uploader
        }
    }

    pub async fn run(
        &self,
        track: Track,
        input: &FormSubmission,
        now: DateTime<Utc>,
    ) -> Result<Receipt, IntakeError> {
        let window = self.window(track);
        if window.is_closed_at(now) {
            tracing::info!("Rejected {track} submission: window closed");
            return Err(IntakeError::ClosedWindow {
                track,
                cutoff: window.cutoff,
            });
        }

        let result = validate::validate(track, &input.fields);
        if !result.is_ok() {
            tracing::debug!("Validation failed for {track}: {:?}", result);
            return Err(IntakeError::ValidationFailed(result));
        }

        let form = TrackForm::for_track(track);
        let mut warnings = Vec::new();
        let mut uploads = Map::new();
        for slot in form.attachments {
            let outcome = self
                .uploader(track)
                .upload(
                    input.files.get(slot.field),
                    slot.prefix,
                    form.default_content_type,
                    now,
                )
                .await;

            match &outcome {
                UploadOutcome::Failed { reason, .. } => {
                    warnings.push(IntakeWarning::UploadFailed {
                        role: slot.role.to_string(),
                        reason: reason.clone(),
                    });
                }
                UploadOutcome::Stored { url, .. } if url.is_empty() => {
                    warnings.push(IntakeWarning::UploadFailed {
                        role: slot.role.to_string(),
                        reason: "no retrieval URL available".to_string(),
                    });
                }
                _ => {}
            }
            uploads.insert(slot.role.to_string(), Value::String(outcome.url().to_string()));
        }

        let record = build_record(form, input, &uploads);
        let inserted = self.repo.insert(&record).await.map_err(|e| {
            tracing::error!("Failed to store {track} submission: {e}");
            IntakeError::PersistFailed(e)
        })?;

        if inserted.duplicate {
            tracing::info!(
                "Duplicate {track} submission matched existing id {}",
                inserted.id
            );
            return Ok(Receipt {
                track,
                submission_id: inserted.id,
                created_at: inserted.created_at,
                duplicate: true,
                notified: false,
                uploads,
                warnings,
            });
        }

        tracing::info!("Stored {track} submission {}", inserted.id);

        let poster_url = uploads
            .get("poster")
            .and_then(|v| v.as_str())
            .unwrap_or("")
            .to_string();
        let body = templates::render_confirmation(&Confirmation {
            track,
            applicant_name: &record.applicant_name,
            project_title: match track {
                Track::Poster => input.field("title"),
                _ => input.field("project_title"),
            },
            organization: input.field("org_name"),
            school: input.field("school"),
            category: input.field("category"),
            poster_url: &poster_url,
            submitted_at: now,
            timezone: self.config.timezone,
            submission_id: inserted.id,
        });

        let notified = match body {
            Ok(html_body) => {
                let email = Email {
                    to: record.email.clone(),
                    cc: Some(self.config.cc_email.clone()),
                    subject: templates::subject(track).to_string(),
                    html_body,
                };
                self.mailer.send(&email).await
            }
            Err(e) => {
                tracing::error!("Failed to render confirmation for submission {}: {e}", inserted.id);
                false
            }
        };
        if !notified {
            tracing::warn!("Confirmation email for submission {} was not sent", inserted.id);
            warnings.push(IntakeWarning::NotifyFailed);
        }

        Ok(Receipt {
            track,
            submission_id: inserted.id,
            created_at: inserted.created_at,
            duplicate: false,
            notified,
            uploads,
            warnings,
        })
    }
}

/// Declared fields go into the payload; anything else the client sent is dropped.
fn build_record(form: &TrackForm, input: &FormSubmission, uploads: &Map<String, Value>) -> NewSubmission {
    let mut payload = Map::new();
    for def in form.fields {
        payload.insert(
            def.name.to_string(),
            Value::String(input.field(def.name).to_string()),
        );
    }

    if !form.eligibility.is_empty() {
        let eligibility: Map<String, Value> = form
            .eligibility
            .iter()
            .map(|cb| {
                (
                    cb.key.to_string(),
                    Value::Bool(is_checked(input.fields.get(cb.name).map(String::as_str))),
                )
            })
            .collect();
        payload.insert("eligibility".to_string(), Value::Object(eligibility));
    }

    let undeclared: Vec<&String> = input
        .fields
        .keys()
        .filter(|k| form.field(k).is_none() && !form.eligibility.iter().any(|cb| cb.name == k.as_str()))
        .collect();
    if !undeclared.is_empty() {
        tracing::debug!("Dropping undeclared {} fields: {:?}", form.track, undeclared);
    }

    NewSubmission {
        track: form.track,
        applicant_name: input.field(form.identity.name).trim().to_string(),
        email: input.field(form.identity.email).trim().to_string(),
        phone: form
            .identity
            .phone
            .map(|p| input.field(p).trim().to_string())
            .unwrap_or_default(),
        payload: Value::Object(payload),
        uploads: Value::Object(uploads.clone()),
        idempotency_key: idempotency::key(form, input),
    }
}
