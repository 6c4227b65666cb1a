use askama::Template;
use axum::body::Bytes;
use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{Html, IntoResponse, Response};
use chrono::Utc;

use crate::email::templates::CONTACT_EMAIL;
use crate::error::AppError;
use crate::intake::parser::{self, FormSubmission};
use crate::intake::tracks::{FieldKind, SELECT_PLACEHOLDER, TrackForm};
use crate::intake::validate::is_checked;
use crate::intake::{IntakeError, Receipt};
use crate::models::Track;
use crate::state::SharedState;

struct TrackCard {
    slug: &'static str,
    heading: &'static str,
    deadline: String,
    open: bool,
}

#[derive(Template)]
#[template(path = "index.html")]
struct IndexTemplate {
    tracks: Vec<TrackCard>,
    contact_email: &'static str,
}

struct OptionView {
    value: String,
    selected: bool,
}

struct FieldView {
    name: &'static str,
    label: &'static str,
    required: bool,
    is_textarea: bool,
    is_select: bool,
    input_type: &'static str,
    value: String,
    options: Vec<OptionView>,
}

struct CheckboxView {
    name: &'static str,
    label: &'static str,
    checked: bool,
}

struct AttachmentView {
    field: &'static str,
    label: &'static str,
    accept: &'static str,
}

#[derive(Template)]
#[template(path = "apply/form.html")]
struct FormTemplate {
    slug: &'static str,
    heading: &'static str,
    deadline: String,
    closed: bool,
    closed_message: String,
    problems: Vec<String>,
    fields: Vec<FieldView>,
    checkboxes: Vec<CheckboxView>,
    attachments: Vec<AttachmentView>,
    contact_email: &'static str,
}

#[derive(Template)]
#[template(path = "apply/result.html")]
struct ResultTemplate {
    heading: &'static str,
    success: bool,
    message: String,
    submission_id: Option<i64>,
    warnings: Vec<String>,
    contact_email: &'static str,
}

pub fn parse_track(slug: &str) -> Result<Track, AppError> {
    Track::from_slug(slug).ok_or_else(|| AppError::NotFound("Unknown track".to_string()))
}

pub async fn index(State(state): State<SharedState>) -> impl IntoResponse {
    let now = Utc::now();
    let tracks = Track::ALL
        .iter()
        .map(|&track| {
            let window = state.pipeline.window(track);
            TrackCard {
                slug: track.as_str(),
                heading: TrackForm::for_track(track).heading,
                deadline: window.label().unwrap_or_else(|| "Open".to_string()),
                open: !window.is_closed_at(now),
            }
        })
        .collect();

    let template = IndexTemplate {
        tracks,
        contact_email: CONTACT_EMAIL,
    };
    Html(template.render().unwrap_or_default())
}

pub async fn form_page(
    State(state): State<SharedState>,
    Path(slug): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let track = parse_track(&slug)?;
    Ok(render_form(&state, track, &FormSubmission::default(), Vec::new()))
}

pub async fn submit(
    State(state): State<SharedState>,
    Path(slug): Path<String>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Response, AppError> {
    let track = parse_track(&slug)?;
    let input = parser::parse_request(&headers, body)
        .await
        .map_err(AppError::BadRequest)?;

    let response = match state.pipeline.run(track, &input, Utc::now()).await {
        Ok(receipt) => render_receipt(track, &receipt).into_response(),
        Err(IntakeError::ValidationFailed(result)) => (
            StatusCode::UNPROCESSABLE_ENTITY,
            render_form(&state, track, &input, result.problems()),
        )
            .into_response(),
        Err(IntakeError::ClosedWindow { .. }) => (
            StatusCode::FORBIDDEN,
            render_form(&state, track, &input, Vec::new()),
        )
            .into_response(),
        Err(e @ IntakeError::PersistFailed(_)) => {
            let template = ResultTemplate {
                heading: TrackForm::for_track(track).heading,
                success: false,
                message: e.to_string(),
                submission_id: None,
                warnings: Vec::new(),
                contact_email: CONTACT_EMAIL,
            };
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Html(template.render().unwrap_or_default()),
            )
                .into_response()
        }
    };

    Ok(response)
}

pub fn success_message(track: Track, duplicate: bool) -> &'static str {
    if duplicate {
        return "This submission was already received. (Duplicate prevented)";
    }
    match track {
        Track::Organization => "Thank you! Your organization application has been submitted.",
        Track::Student => "Thank you! Your student application has been submitted.",
        Track::Poster => "Thank you! Your poster has been submitted.",
    }
}

fn render_receipt(track: Track, receipt: &Receipt) -> Html<String> {
    let template = ResultTemplate {
        heading: TrackForm::for_track(track).heading,
        success: true,
        message: success_message(track, receipt.duplicate).to_string(),
        submission_id: Some(receipt.submission_id),
        warnings: receipt.warnings.iter().map(|w| w.to_string()).collect(),
        contact_email: CONTACT_EMAIL,
    };
    Html(template.render().unwrap_or_default())
}

fn render_form(
    state: &SharedState,
    track: Track,
    input: &FormSubmission,
    problems: Vec<String>,
) -> Html<String> {
    let form = TrackForm::for_track(track);
    let window = state.pipeline.window(track);
    let closed = window.is_closed_at(Utc::now());

    let fields = form
        .fields
        .iter()
        .map(|def| {
            let value = input.field(def.name).to_string();
            let options = match def.kind {
                FieldKind::Select(options) => options
                    .iter()
                    .map(|opt| OptionView {
                        value: opt.to_string(),
                        selected: if value.is_empty() {
                            *opt == SELECT_PLACEHOLDER
                        } else {
                            *opt == value
                        },
                    })
                    .collect(),
                _ => Vec::new(),
            };
            FieldView {
                name: def.name,
                label: def.label,
                required: def.required,
                is_textarea: def.kind == FieldKind::TextArea,
                is_select: matches!(def.kind, FieldKind::Select(_)),
                input_type: if def.kind == FieldKind::Email { "email" } else { "text" },
                value,
                options,
            }
        })
        .collect();

    let checkboxes = form
        .eligibility
        .iter()
        .map(|cb| CheckboxView {
            name: cb.name,
            label: cb.label,
            checked: is_checked(input.fields.get(cb.name).map(String::as_str)),
        })
        .collect();

    let attachments = form
        .attachments
        .iter()
        .map(|slot| AttachmentView {
            field: slot.field,
            label: slot.label,
            accept: slot.accept,
        })
        .collect();

    let template = FormTemplate {
        slug: track.as_str(),
        heading: form.heading,
        deadline: window.label().unwrap_or_else(|| "Open".to_string()),
        closed,
        closed_message: format!("The {track} submission deadline has passed."),
        problems,
        fields,
        checkboxes,
        attachments,
        contact_email: CONTACT_EMAIL,
    };
    Html(template.render().unwrap_or_default())
}
