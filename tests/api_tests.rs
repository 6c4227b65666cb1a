mod common;

use std::sync::atomic::Ordering;

use chrono::TimeZone;
use reqwest::StatusCode;
use reqwest::multipart::{Form, Part};
use serde_json::{Value, json};

use common::{ADMIN_PASSWORD, eastern, organization_fields, poster_fields, student_fields, test_config};

fn as_json(pairs: &[(&str, &str)]) -> Value {
    let mut obj = serde_json::Map::new();
    for (k, v) in pairs {
        obj.insert(k.to_string(), json!(v));
    }
    Value::Object(obj)
}

fn session_cookie(resp: &reqwest::Response) -> String {
    resp.headers()
        .get_all("set-cookie")
        .iter()
        .filter_map(|v| v.to_str().ok())
        .find(|v| v.starts_with("admin_session="))
        .and_then(|v| v.split(';').next())
        .expect("no session cookie")
        .to_string()
}

// ── Health & pages ──────────────────────────────────────────────

#[tokio::test]
async fn health_returns_ok() {
    let app = common::spawn_app().await;

    let resp = app.client.get(app.url("/health")).send().await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(resp.headers()["x-content-type-options"], "nosniff");
    assert_eq!(resp.headers()["x-frame-options"], "DENY");
    assert_eq!(resp.text().await.unwrap(), "ok");
}

#[tokio::test]
async fn index_lists_every_track() {
    let app = common::spawn_app().await;

    let resp = app.client.get(app.url("/")).send().await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let html = resp.text().await.unwrap();
    assert!(html.contains("Organization Application (2025)"));
    assert!(html.contains("Medical Student Application (2025)"));
    assert!(html.contains("Research Poster Submission"));
    assert!(html.contains("/apply/poster"));
}

#[tokio::test]
async fn form_page_renders_fields_and_eligibility() {
    let app = common::spawn_app().await;

    let resp = app
        .client
        .get(app.url("/apply/organization"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let html = resp.text().await.unwrap();
    assert!(html.contains("name=\"org_name\""));
    assert!(html.contains("name=\"elig_nonprofit\""));
    assert!(html.contains("name=\"proposal_file\""));
}

#[tokio::test]
async fn unknown_track_is_not_found() {
    let app = common::spawn_app().await;

    let resp = app.client.get(app.url("/apply/alumni")).send().await.unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);

    let (_, status) = app.submit_form("alumni", &organization_fields()).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn closed_form_page_disables_inputs() {
    let mut config = test_config();
    config.intake.student_deadline = Some(eastern().with_ymd_and_hms(2025, 10, 19, 23, 59, 0).unwrap());
    let app = common::spawn_app_with(config).await;

    let resp = app.client.get(app.url("/apply/student")).send().await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let html = resp.text().await.unwrap();
    assert!(html.contains("The student submission deadline has passed."));
    assert!(html.contains("<fieldset class=\"form-body\" disabled>"));

    let resp = app
        .client
        .post(app.url("/apply/student"))
        .form(&student_fields())
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);
    assert_eq!(app.repo.insert_count(), 0);
}

// ── Intake API ──────────────────────────────────────────────────

#[tokio::test]
async fn submit_form_creates_submission() {
    let app = common::spawn_app().await;

    let (body, status) = app.submit_form("organization", &organization_fields()).await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    assert_eq!(body["status"], "created");
    assert_eq!(body["track"], "organization");
    assert_eq!(body["submission_id"], 1);
    assert_eq!(body["notified"], true);
    assert_eq!(body["warnings"], json!([]));
    assert_eq!(body["uploads"]["proposal"], "");

    assert_eq!(app.mailer.sent().len(), 1);
}

#[tokio::test]
async fn submit_json_creates_submission() {
    let app = common::spawn_app().await;

    let (body, status) = app
        .submit_json("student", &as_json(&student_fields()))
        .await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    assert_eq!(app.repo.rows()[0].email, "grace.hopper@yale.edu");
}

#[tokio::test]
async fn resubmission_reports_duplicate() {
    let app = common::spawn_app().await;

    let (first, _) = app.submit_form("student", &student_fields()).await;
    let (second, status) = app.submit_form("student", &student_fields()).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(second["status"], "duplicate");
    assert_eq!(second["submission_id"], first["submission_id"]);
    assert_eq!(app.mailer.attempt_count(), 1);
}

#[tokio::test]
async fn invalid_submission_returns_every_problem() {
    let app = common::spawn_app().await;

    let (body, status) = app
        .submit_form("student", &[("applicant_name", "Grace Hopper"), ("school", "— Select —")])
        .await;

    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(
        body["validation"]["missing"],
        json!(["Medical School", "School Email", "Phone", "Project Title"])
    );
    assert_eq!(body["validation"]["eligibility_ok"], false);
    assert_eq!(body["validation"]["length_ok"], true);
    assert!(body["error"].as_str().unwrap().contains("eligibility"));
    assert_eq!(app.repo.insert_count(), 0);
}

#[tokio::test]
async fn closed_track_is_forbidden() {
    let mut config = test_config();
    config.intake.org_deadline = Some(eastern().with_ymd_and_hms(2025, 10, 17, 16, 59, 0).unwrap());
    let app = common::spawn_app_with(config).await;

    let (body, status) = app.submit_form("organization", &organization_fields()).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"], "The organization submission deadline has passed.");
    assert!(body["deadline"].as_str().unwrap().starts_with("2025-10-17T16:59:00"));
    assert_eq!(app.repo.insert_count(), 0);

    // Other tracks are unaffected
    let (_, status) = app.submit_form("student", &student_fields()).await;
    assert_eq!(status, StatusCode::CREATED);
}

#[tokio::test]
async fn persist_failure_is_server_error() {
    let app = common::spawn_app().await;
    app.repo.fail_insert.store(true, Ordering::SeqCst);

    let (body, status) = app.submit_form("poster", &poster_fields()).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(body["error"].as_str().unwrap().contains("problem saving"));
    assert_eq!(app.mailer.attempt_count(), 0);
}

#[tokio::test]
async fn multipart_poster_upload_is_stored() {
    let app = common::spawn_app().await;

    let mut form = Form::new();
    for (k, v) in poster_fields() {
        form = form.text(k, v);
    }
    let part = Part::bytes(b"%PDF-1.7 poster".to_vec())
        .file_name("team_poster.pdf")
        .mime_str("application/pdf")
        .unwrap();
    form = form.part("poster_file", part);

    let resp = app
        .client
        .post(app.url("/api/v1/submissions/poster"))
        .multipart(form)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::CREATED);
    let body: Value = resp.json().await.unwrap();

    let url = body["uploads"]["poster"].as_str().unwrap();
    assert!(url.contains("/nhcma-posters/posters/"));
    assert!(url.contains("_team_poster.pdf"));

    let objects = app.store.objects();
    assert_eq!(objects.len(), 1);
    assert_eq!(objects[0].len, 15);
}

#[tokio::test]
async fn empty_multipart_file_input_is_ignored() {
    let app = common::spawn_app().await;

    let mut form = Form::new();
    for (k, v) in poster_fields() {
        form = form.text(k, v);
    }
    let part = Part::bytes(Vec::new()).file_name("");
    form = form.part("poster_file", part);

    let resp = app
        .client
        .post(app.url("/api/v1/submissions/poster"))
        .multipart(form)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::CREATED);
    assert_eq!(app.store.put_count(), 0);
}

// ── HTML intake ─────────────────────────────────────────────────

#[tokio::test]
async fn html_submission_shows_thank_you() {
    let app = common::spawn_app().await;

    let resp = app
        .client
        .post(app.url("/apply/student"))
        .form(&student_fields())
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let html = resp.text().await.unwrap();
    assert!(html.contains("Thank you! Your student application has been submitted."));
    assert!(html.contains("Submission ID: 1"));
}

#[tokio::test]
async fn html_validation_failure_rerenders_form_with_input() {
    let app = common::spawn_app().await;

    let resp = app
        .client
        .post(app.url("/apply/poster"))
        .form(&[("lead_author", "Katherine Johnson"), ("category", "Fellow")])
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let html = resp.text().await.unwrap();
    assert!(html.contains("Please complete all required fields: Contact Email, Title of Project, Abstract (250 words max)."));
    assert!(html.contains("value=\"Katherine Johnson\""));
    assert!(html.contains("<option value=\"Fellow\" selected>"));
}

// ── Admin API ───────────────────────────────────────────────────

#[tokio::test]
async fn admin_login_issues_token() {
    let app = common::spawn_app().await;

    let (body, status) = app.login(ADMIN_PASSWORD).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["access_token"].is_string());
    assert!(body["expires_at"].is_string());

    // Surrounding whitespace is ignored
    let (_, status) = app.login(&format!("  {ADMIN_PASSWORD}\n")).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn admin_login_rejects_wrong_password() {
    let app = common::spawn_app().await;

    let (body, status) = app.login("hunter2").await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "Incorrect password");
}

#[tokio::test]
async fn admin_login_unavailable_without_credential() {
    let mut config = test_config();
    config.admin.credential = None;
    let app = common::spawn_app_with(config).await;

    let (body, status) = app.login(ADMIN_PASSWORD).await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body["error"], "Admin password is not configured");
}

#[tokio::test]
async fn admin_login_rate_limited_after_five_failures() {
    let app = common::spawn_app().await;

    for _ in 0..5 {
        let (_, status) = app.login("wrong").await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    let (_, status) = app.login(ADMIN_PASSWORD).await;
    assert_eq!(status, StatusCode::TOO_MANY_REQUESTS);
}

#[tokio::test]
async fn admin_list_requires_session() {
    let app = common::spawn_app().await;

    let resp = app
        .client
        .get(app.url("/api/v1/admin/submissions"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

    let (_, status) = app.get_auth("/api/v1/admin/submissions", "not-a-token").await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn admin_list_filters_by_track_newest_first() {
    let app = common::spawn_app().await;
    app.submit_form("organization", &organization_fields()).await;
    app.submit_form("student", &student_fields()).await;
    app.submit_form("poster", &poster_fields()).await;

    let token = app.admin_token().await;

    let (body, status) = app.get_auth("/api/v1/admin/submissions", &token).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["total"], 3);
    let ids: Vec<i64> = body["submissions"]
        .as_array()
        .unwrap()
        .iter()
        .map(|s| s["id"].as_i64().unwrap())
        .collect();
    assert_eq!(ids, vec![3, 2, 1]);

    let (body, _) = app
        .get_auth("/api/v1/admin/submissions?track=poster", &token)
        .await;
    assert_eq!(body["total"], 1);
    assert_eq!(body["submissions"][0]["track"], "poster");
    assert_eq!(body["submissions"][0]["payload_json"]["title"], "Sepsis Screening in the ED");

    let (_, status) = app
        .get_auth("/api/v1/admin/submissions?track=alumni", &token)
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn admin_list_reports_datastore_failure() {
    let app = common::spawn_app().await;
    let token = app.admin_token().await;
    app.repo.fail_list.store(true, Ordering::SeqCst);

    let (body, status) = app.get_auth("/api/v1/admin/submissions", &token).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["error"], "Could not load submissions");
}

#[tokio::test]
async fn admin_export_downloads_csv() {
    let app = common::spawn_app().await;
    app.submit_form("organization", &organization_fields()).await;
    let token = app.admin_token().await;

    let resp = app
        .client
        .get(app.url("/api/v1/admin/submissions/export?track=organization"))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(resp.headers()["content-type"], "text/csv; charset=utf-8");
    assert_eq!(
        resp.headers()["content-disposition"],
        "attachment; filename=\"grantdesk_submissions.csv\""
    );
    let csv = resp.text().await.unwrap();
    let header = csv.lines().next().unwrap();
    assert!(header.starts_with("id,track,created_at,applicant_name,email,phone"));
    assert!(header.contains(",org_name"));
    assert!(csv.contains("Elm City Free Clinic"));

    let resp = app
        .client
        .get(app.url("/api/v1/admin/submissions/export?view=scoring"))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(
        resp.headers()["content-disposition"],
        "attachment; filename=\"grantdesk_scoring_export.csv\""
    );
    let csv = resp.text().await.unwrap();
    assert!(csv.lines().next().unwrap().ends_with(",Org Name,School,Project Title,Budget Total"));
    assert!(csv.contains(",Elm City Free Clinic,,Mobile Vaccination Van,5000"));
}

// ── Admin pages ─────────────────────────────────────────────────

#[tokio::test]
async fn admin_page_redirects_to_login_without_session() {
    let app = common::spawn_app().await;

    let resp = app
        .client
        .get(app.url("/admin/submissions"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::SEE_OTHER);
    assert_eq!(resp.headers()["location"], "/admin/login");
}

#[tokio::test]
async fn admin_page_login_sets_cookie_and_shows_table() {
    let app = common::spawn_app().await;
    app.submit_form("student", &student_fields()).await;

    let resp = app
        .client
        .post(app.url("/admin/login"))
        .form(&[("password", ADMIN_PASSWORD)])
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::SEE_OTHER);
    assert_eq!(resp.headers()["location"], "/admin/submissions");
    let cookie = session_cookie(&resp);

    let resp = app
        .client
        .get(app.url("/admin/submissions?track=student"))
        .header("cookie", &cookie)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let html = resp.text().await.unwrap();
    assert!(html.contains("Grace Hopper"));
    assert!(html.contains("Yale School of Medicine"));

    // The cookie also authorizes the JSON API
    let resp = app
        .client
        .get(app.url("/api/v1/admin/submissions"))
        .header("cookie", &cookie)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
}

#[tokio::test]
async fn admin_page_login_shows_error_on_wrong_password() {
    let app = common::spawn_app().await;

    let resp = app
        .client
        .post(app.url("/admin/login"))
        .form(&[("password", "nope")])
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    assert!(resp.text().await.unwrap().contains("Incorrect password."));
}

#[tokio::test]
async fn admin_page_shows_datastore_error_on_screen() {
    let app = common::spawn_app().await;
    let token = app.admin_token().await;
    app.repo.fail_list.store(true, Ordering::SeqCst);

    let resp = app
        .client
        .get(app.url("/admin/submissions"))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    assert!(resp.text().await.unwrap().contains("Error loading submissions."));
}

#[tokio::test]
async fn logout_clears_session_cookie() {
    let app = common::spawn_app().await;

    let resp = app
        .client
        .post(app.url("/admin/logout"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::SEE_OTHER);
    assert_eq!(resp.headers()["location"], "/admin/login");
    let cookie = resp
        .headers()
        .get_all("set-cookie")
        .iter()
        .filter_map(|v| v.to_str().ok())
        .find(|v| v.starts_with("admin_session="))
        .unwrap()
        .to_string();
    assert!(cookie.contains("Max-Age=0"));
}
