//! Response envelope handling.
//!
//! Every reply from the service is wrapped as
//! `<rsp stat="ok">…</rsp>` or `<rsp stat="fail"><err code="…" msg="…"/></rsp>`.
//! `Response::parse` accepts only successful envelopes, so a `Response` value
//! always holds a well-formed, successful document.

use tracing::warn;

use crate::error::ApiError;
use crate::http::HttpResponse;

#[derive(Debug, Clone)]
pub struct Response {
    body: String,
}

impl Response {
    /// Validate the HTTP status and the envelope of a transport response.
    pub fn parse(response: HttpResponse) -> Result<Self, ApiError> {
        if response.status != 200 {
            return Err(ApiError::Http {
                status: response.status,
                body: response.body,
            });
        }
        Self::from_xml(response.body)
    }

    /// Validate an envelope given as XML text.
    pub fn from_xml(body: impl Into<String>) -> Result<Self, ApiError> {
        let response = Self { body: body.into() };
        response.check_envelope()?;
        Ok(response)
    }

    pub fn body(&self) -> &str {
        &self.body
    }

    /// Parse the body. The borrow ties the document to this response.
    pub fn document(&self) -> Result<roxmltree::Document<'_>, ApiError> {
        Ok(roxmltree::Document::parse(&self.body)?)
    }

    fn check_envelope(&self) -> Result<(), ApiError> {
        let document = self.document()?;
        let root = document.root_element();
        let stat = root.attribute("stat");
        if root.has_tag_name("rsp") && stat == Some("ok") {
            return Ok(());
        }
        let (code, message) = if !root.has_tag_name("rsp") {
            (String::new(), format!("unexpected root element `{}`", root.tag_name().name()))
        } else if stat == Some("fail") {
            let err = root.children().find(|node| node.has_tag_name("err"));
            let code = err.and_then(|n| n.attribute("code")).unwrap_or_default().to_string();
            let message = err.and_then(|n| n.attribute("msg")).unwrap_or_default().to_string();
            (code, message)
        } else {
            (String::new(), format!("unexpected status `{}`", stat.unwrap_or_default()))
        };
        warn!(%code, %message, "remote call failed");
        Err(ApiError::Remote { code, message })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn http(status: u16, body: &str) -> HttpResponse {
        HttpResponse {
            status,
            headers: Vec::new(),
            body: body.to_string(),
        }
    }

    #[test]
    fn ok_envelope_is_accepted() {
        let response = Response::parse(http(200, r#"<rsp stat="ok"><photoid>1</photoid></rsp>"#)).unwrap();
        let document = response.document().unwrap();
        assert_eq!(document.root_element().tag_name().name(), "rsp");
    }

    #[test]
    fn fail_envelope_becomes_remote_error() {
        let err = Response::parse(http(
            200,
            r#"<rsp stat="fail"><err code="1" msg="Photo &quot;9&quot; not found"/></rsp>"#,
        ))
        .unwrap_err();
        match err {
            ApiError::Remote { code, message } => {
                assert_eq!(code, "1");
                assert_eq!(message, "Photo \"9\" not found");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn missing_status_is_rejected() {
        let err = Response::from_xml(r#"<rsp><photo id="1"/></rsp>"#).unwrap_err();
        assert!(matches!(err, ApiError::Remote { ref message, .. } if message == "unexpected status ``"));
    }

    #[test]
    fn unknown_status_is_rejected() {
        let err = Response::from_xml(r#"<rsp stat="error"><err code="5" msg="x"/></rsp>"#).unwrap_err();
        match err {
            ApiError::Remote { code, message } => {
                assert_eq!(code, "");
                assert_eq!(message, "unexpected status `error`");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn foreign_root_is_rejected() {
        let err = Response::from_xml(r#"<html stat="ok"><photo id="1"/></html>"#).unwrap_err();
        assert!(matches!(err, ApiError::Remote { ref message, .. } if message.contains("`html`")));
    }

    #[test]
    fn non_200_status_is_http_error() {
        let err = Response::parse(http(503, "unavailable")).unwrap_err();
        assert!(matches!(err, ApiError::Http { status: 503, .. }));
    }

    #[test]
    fn malformed_body_is_xml_error() {
        let err = Response::parse(http(200, "<rsp stat=\"ok\">")).unwrap_err();
        assert!(matches!(err, ApiError::Xml(_)));
    }
}
