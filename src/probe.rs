//! Payload detection: one unproxied probe request to the target, parsed for
//! the first form, deciding whether the run sends GETs or form-encoded POSTs.
//!
//! The result is computed once before workers start and shared read-only;
//! any probe failure falls back to plain GET.

use scraper::{Html, Selector};
use tracing::{info, warn};
use url::form_urlencoded;

/// HTTP method used for the run's requests.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestMethod {
    Get,
    Post,
}

/// Probe result: the method and, for POST, the form-encoded body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DetectedPayload {
    pub method: RequestMethod,
    pub body: Option<String>,
}

impl DetectedPayload {
    /// Plain GET with no body, the fallback for every non-form case.
    pub fn get() -> Self {
        Self {
            method: RequestMethod::Get,
            body: None,
        }
    }
}

/// Probes the target with a single GET and inspects the markup.
///
/// Any failure (unreachable target, error status, non-text body, no form)
/// degrades to GET.
pub async fn detect(client: &reqwest::Client, url: &str) -> DetectedPayload {
    match probe(client, url).await {
        Ok(payload) => {
            info!(method = ?payload.method, payload = ?payload.body, "detected submission method");
            payload
        }
        Err(e) => {
            warn!(url, error = %e, "payload probe failed, falling back to GET");
            DetectedPayload::get()
        }
    }
}

async fn probe(client: &reqwest::Client, url: &str) -> Result<DetectedPayload, reqwest::Error> {
    // An error status is a failed probe; only markup from a successful
    // response decides the submission method.
    let body = client
        .get(url)
        .send()
        .await?
        .error_for_status()?
        .text()
        .await?;
    Ok(parse_form_payload(&body))
}

/// Extracts a POST payload from the first form in the document.
///
/// Inputs are taken in document order using their literal `name`/`value`
/// attributes; a missing value becomes the empty string, and inputs without
/// a name are skipped. A document with no form, or a form with no usable
/// inputs, means GET.
pub fn parse_form_payload(html: &str) -> DetectedPayload {
    let document = Html::parse_document(html);
    let form_selector = Selector::parse("form").unwrap();
    let input_selector = Selector::parse("input").unwrap();

    let Some(form) = document.select(&form_selector).next() else {
        return DetectedPayload::get();
    };

    let mut serializer = form_urlencoded::Serializer::new(String::new());
    let mut found_input = false;
    for input in form.select(&input_selector) {
        let Some(name) = input.value().attr("name") else {
            continue;
        };
        let value = input.value().attr("value").unwrap_or("");
        serializer.append_pair(name, value);
        found_input = true;
    }

    if !found_input {
        return DetectedPayload::get();
    }

    DetectedPayload {
        method: RequestMethod::Post,
        body: Some(serializer.finish()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn form_with_inputs_yields_post_payload() {
        let html = r#"
            <html><body>
              <form action="/submit" method="post">
                <input type="text" name="a" value="1">
                <input type="text" name="b">
                <button type="submit">Go</button>
              </form>
            </body></html>
        "#;
        let payload = parse_form_payload(html);
        assert_eq!(payload.method, RequestMethod::Post);
        assert_eq!(payload.body.as_deref(), Some("a=1&b="));
    }

    #[test]
    fn no_form_yields_get() {
        let html = "<html><body><p>Nothing to submit here.</p></body></html>";
        assert_eq!(parse_form_payload(html), DetectedPayload::get());
    }

    #[test]
    fn form_without_inputs_yields_get() {
        let html = r#"<form action="/x"><button>Go</button></form>"#;
        assert_eq!(parse_form_payload(html), DetectedPayload::get());
    }

    #[test]
    fn only_first_form_is_used() {
        let html = r#"
            <form><input name="first" value="1"></form>
            <form><input name="second" value="2"></form>
        "#;
        let payload = parse_form_payload(html);
        assert_eq!(payload.body.as_deref(), Some("first=1"));
    }

    #[test]
    fn unnamed_inputs_are_skipped() {
        let html = r#"
            <form>
              <input type="hidden" value="ignored">
              <input name="kept" value="yes">
            </form>
        "#;
        let payload = parse_form_payload(html);
        assert_eq!(payload.body.as_deref(), Some("kept=yes"));
    }

    #[test]
    fn values_are_url_encoded() {
        let html = r#"<form><input name="q" value="a b&c"></form>"#;
        let payload = parse_form_payload(html);
        assert_eq!(payload.body.as_deref(), Some("q=a+b%26c"));
    }

    #[test]
    fn inputs_kept_in_document_order() {
        let html = r#"
            <form>
              <input name="z" value="3">
              <input name="a" value="1">
              <input name="m" value="2">
            </form>
        "#;
        let payload = parse_form_payload(html);
        assert_eq!(payload.body.as_deref(), Some("z=3&a=1&m=2"));
    }
}
