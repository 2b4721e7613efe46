use std::collections::HashMap;

use axum::extract::Multipart;
use axum::response::Response;

use crate::responses;

pub mod chat;
pub mod history;
pub mod images;
pub mod meta;
pub mod spec;

/// Drain a multipart body into named fields. Malformed bodies are a
/// client error, reported in the uniform failure shape.
pub(crate) async fn read_form(
    mut multipart: Multipart,
) -> Result<HashMap<String, Vec<u8>>, Response> {
    let mut fields = HashMap::new();
    loop {
        let field = match multipart.next_field().await {
            Ok(Some(field)) => field,
            Ok(None) => break,
            Err(err) => {
                return Err(responses::unprocessable(format!(
                    "invalid form body: {err}"
                )))
            }
        };
        let Some(name) = field.name().map(str::to_string) else {
            continue;
        };
        match field.bytes().await {
            Ok(bytes) => {
                fields.insert(name, bytes.to_vec());
            }
            Err(err) => {
                return Err(responses::unprocessable(format!(
                    "invalid form field {name}: {err}"
                )))
            }
        }
    }
    Ok(fields)
}

/// A required non-empty text field.
pub(crate) fn text_field(fields: &HashMap<String, Vec<u8>>, name: &str) -> Option<String> {
    fields
        .get(name)
        .and_then(|bytes| std::str::from_utf8(bytes).ok())
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}
