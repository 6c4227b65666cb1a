use std::collections::BTreeMap;

use axum::http::HeaderMap;
use bytes::Bytes;
use serde_json::Value;

/// One uploaded file as received from the browser.
#[derive(Debug, Clone)]
pub struct FileBlob {
    pub file_name: String,
    pub content_type: Option<String>,
    pub data: Bytes,
}

/// Raw form input: text fields plus any attached files, keyed by input name.
#[derive(Debug, Clone, Default)]
pub struct FormSubmission {
    pub fields: BTreeMap<String, String>,
    pub files: BTreeMap<String, FileBlob>,
}

impl FormSubmission {
    pub fn field(&self, name: &str) -> &str {
        self.fields.get(name).map(String::as_str).unwrap_or("")
    }
}

/// Parse a request body based on the Content-Type header.
pub async fn parse_request(headers: &HeaderMap, body: Bytes) -> Result<FormSubmission, String> {
    let content_type = headers
        .get("content-type")
        .and_then(|v| v.to_str().ok())
        .unwrap_or("application/x-www-form-urlencoded");

    if content_type.contains("multipart/form-data") {
        parse_multipart(content_type, body).await
    } else if content_type.contains("application/x-www-form-urlencoded") {
        parse_form_urlencoded(&body)
    } else if content_type.contains("application/json") {
        parse_json(&body)
    } else {
        Err(format!("Unsupported content type: {content_type}"))
    }
}

fn parse_form_urlencoded(body: &[u8]) -> Result<FormSubmission, String> {
    std::str::from_utf8(body).map_err(|e| format!("Invalid UTF-8: {e}"))?;
    let fields = form_urlencoded::parse(body)
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect();

    Ok(FormSubmission {
        fields,
        files: BTreeMap::new(),
    })
}

fn parse_json(body: &[u8]) -> Result<FormSubmission, String> {
    let value: Value = serde_json::from_slice(body).map_err(|e| format!("Invalid JSON: {e}"))?;
    let Value::Object(obj) = value else {
        return Err("Expected a JSON object".to_string());
    };

    let mut fields = BTreeMap::new();
    for (key, value) in obj {
        let text = match value {
            Value::String(s) => s,
            Value::Null => continue,
            Value::Bool(b) => b.to_string(),
            Value::Number(n) => n.to_string(),
            other => return Err(format!("Field '{key}' must be a scalar, got {other}")),
        };
        fields.insert(key, text);
    }

    Ok(FormSubmission {
        fields,
        files: BTreeMap::new(),
    })
}

/// Parse multipart form data using multer. Parts with a filename become file
/// blobs; a file input left empty arrives with an empty filename and is skipped.
async fn parse_multipart(content_type: &str, body: Bytes) -> Result<FormSubmission, String> {
    let boundary =
        multer::parse_boundary(content_type).map_err(|_| "Missing multipart boundary".to_string())?;

    let stream = futures_util::stream::once(async { Ok::<_, std::io::Error>(body) });
    let mut multipart = multer::Multipart::new(stream, boundary);

    let mut form = FormSubmission::default();
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| format!("Multipart error: {e}"))?
    {
        let name = field.name().unwrap_or("unknown").to_string();

        match field.file_name().map(|s| s.to_string()) {
            Some(file_name) => {
                let content_type = field.content_type().map(|m| m.to_string());
                let data = field
                    .bytes()
                    .await
                    .map_err(|e| format!("File read error: {e}"))?;
                if file_name.is_empty() {
                    continue;
                }
                form.files.insert(
                    name,
                    FileBlob {
                        file_name,
                        content_type,
                        data,
                    },
                );
            }
            None => {
                let value = field
                    .text()
                    .await
                    .map_err(|e| format!("Field read error: {e}"))?;
                form.fields.insert(name, value);
            }
        }
    }

    Ok(form)
}
