//! Protocol codec: classifies inbound requests and formats outbound responses
//! for the HTTP Resumable Upload draft (`Upload-Draft-Interop-Version` 3/5/6).

use salvo_core::http::header::HeaderName;
use salvo_core::http::{HeaderMap, Method, StatusCode};

use crate::error::ProtocolError;
use crate::sfv;

pub const H_INTEROP_VERSION: &str = "upload-draft-interop-version";
pub const H_COMPLETE: &str = "upload-complete";
pub const H_INCOMPLETE: &str = "upload-incomplete";
pub const H_OFFSET: &str = "upload-offset";
pub const H_LENGTH: &str = "upload-length";
pub const H_LIMIT: &str = "upload-limit";
pub const PARTIAL_UPLOAD_CONTENT_TYPE: &str = "application/partial-upload";

/// Interop versions this crate understands. `v4` exists in the draft series
/// but is intentionally unsupported; see `SPEC_FULL.md` §9.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum InteropVersion {
    V3 = 3,
    V5 = 5,
    V6 = 6,
}

impl InteropVersion {
    fn from_u32(raw: u32) -> Result<Self, ProtocolError> {
        match raw {
            3 => Ok(Self::V3),
            5 => Ok(Self::V5),
            6 => Ok(Self::V6),
            other => Err(ProtocolError::UnsupportedInteropVersion(other)),
        }
    }

    #[must_use]
    pub fn as_u32(self) -> u32 {
        self as u32
    }
}

/// The classified intent of an inbound request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Intent {
    /// Not a resumable-upload request at all; pass through untouched.
    None,
    /// A new upload, declared on a non-resumption path.
    Creation {
        complete: bool,
        content_length: Option<u64>,
        upload_length: Option<u64>,
    },
    /// `HEAD` on a resumption path.
    OffsetRetrieval,
    /// `PATCH` on a resumption path.
    Appending {
        offset: u64,
        complete: bool,
        content_length: Option<u64>,
        upload_length: Option<u64>,
    },
    /// `DELETE` on a resumption path.
    Cancellation,
    /// `OPTIONS`.
    Options,
}

/// A classified request, including the negotiated interop version.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Classified {
    pub version: InteropVersion,
    pub intent: Intent,
}

fn header_str<'h>(headers: &'h HeaderMap, name: &str) -> Option<&'h str> {
    headers.get(name).and_then(|v| v.to_str().ok())
}

fn header_display_name(name: &str) -> &'static str {
    match name {
        H_COMPLETE => "Upload-Complete",
        H_INCOMPLETE => "Upload-Incomplete",
        H_OFFSET => "Upload-Offset",
        H_LENGTH => "Upload-Length",
        _ => "unknown",
    }
}

fn header_absent(headers: &HeaderMap, name: &str) -> Result<(), ProtocolError> {
    if headers.contains_key(name) {
        Err(ProtocolError::ExtraHeaderField(header_display_name(name)))
    } else {
        Ok(())
    }
}

fn parse_complete(headers: &HeaderMap, version: InteropVersion) -> Result<bool, ProtocolError> {
    if version >= InteropVersion::V5 {
        let raw = header_str(headers, H_COMPLETE)
            .ok_or(ProtocolError::MissingHeaderField("Upload-Complete"))?;
        sfv::parse_boolean(raw)
    } else {
        let raw = header_str(headers, H_INCOMPLETE)
            .ok_or(ProtocolError::MissingHeaderField("Upload-Incomplete"))?;
        sfv::parse_boolean(raw).map(|incomplete| !incomplete)
    }
}

fn parse_optional_u64(headers: &HeaderMap, name: &str) -> Result<Option<u64>, ProtocolError> {
    match header_str(headers, name) {
        Some(raw) => sfv::parse_integer(raw).map(Some),
        None => Ok(None),
    }
}

/// Classifies an inbound request.
///
/// `path` is the request path; `is_resumption` tells whether it falls under
/// the registry's configured prefix (see [`crate::registry::UploadRegistry::is_resumption`]).
pub fn classify(
    method: &Method,
    headers: &HeaderMap,
    is_resumption: bool,
) -> Result<Classified, ProtocolError> {
    let Some(raw_version) = header_str(headers, H_INTEROP_VERSION) else {
        return Ok(Classified {
            version: InteropVersion::V6,
            intent: Intent::None,
        });
    };
    let version = InteropVersion::from_u32(
        sfv::parse_integer(raw_version).map_err(|_| ProtocolError::InvalidInteger("Upload-Draft-Interop-Version"))? as u32,
    )?;

    if !is_resumption {
        if *method == Method::POST {
            let complete = parse_complete(headers, version)?;
            if let Some(offset) = parse_optional_u64(headers, H_OFFSET)? {
                if offset != 0 {
                    return Err(ProtocolError::ExtraHeaderField("Upload-Offset"));
                }
            }
            let content_length = parse_optional_u64(headers, "content-length")?;
            let upload_length = parse_optional_u64(headers, H_LENGTH)?;
            return Ok(Classified {
                version,
                intent: Intent::Creation {
                    complete,
                    content_length,
                    upload_length,
                },
            });
        }
        if *method == Method::OPTIONS {
            return Ok(Classified {
                version,
                intent: Intent::Options,
            });
        }
        return Ok(Classified {
            version,
            intent: Intent::None,
        });
    }

    match *method {
        Method::HEAD => {
            for name in [H_COMPLETE, H_INCOMPLETE, H_OFFSET, H_LENGTH] {
                header_absent(headers, name)?;
            }
            Ok(Classified {
                version,
                intent: Intent::OffsetRetrieval,
            })
        }
        Method::DELETE => {
            for name in [H_COMPLETE, H_INCOMPLETE, H_OFFSET, H_LENGTH] {
                header_absent(headers, name)?;
            }
            Ok(Classified {
                version,
                intent: Intent::Cancellation,
            })
        }
        Method::OPTIONS => {
            for name in [H_COMPLETE, H_INCOMPLETE, H_OFFSET, H_LENGTH] {
                header_absent(headers, name)?;
            }
            Ok(Classified {
                version,
                intent: Intent::Options,
            })
        }
        Method::PATCH => {
            if version >= InteropVersion::V6 {
                let content_type = header_str(headers, "content-type").unwrap_or_default();
                if !content_type.eq_ignore_ascii_case(PARTIAL_UPLOAD_CONTENT_TYPE) {
                    return Err(ProtocolError::MissingHeaderField("Content-Type"));
                }
            }
            let offset = header_str(headers, H_OFFSET)
                .ok_or(ProtocolError::MissingHeaderField("Upload-Offset"))
                .and_then(sfv::parse_integer)?;
            let complete = parse_complete(headers, version)?;
            let content_length = parse_optional_u64(headers, "content-length")?;
            let upload_length = parse_optional_u64(headers, H_LENGTH)?;
            Ok(Classified {
                version,
                intent: Intent::Appending {
                    offset,
                    complete,
                    content_length,
                    upload_length,
                },
            })
        }
        _ => Err(ProtocolError::UnknownMethod),
    }
}

/// Strips resumable-upload protocol headers from a request head before it is
/// forwarded to the application pipeline.
pub fn strip_protocol_headers(headers: &mut HeaderMap) {
    for name in [H_COMPLETE, H_INCOMPLETE, H_OFFSET] {
        if let Ok(name) = name.parse::<HeaderName>() {
            headers.remove(name);
        }
    }
}

/// Writes the completeness header pair (`Upload-Complete` on v5+, the
/// inverted `Upload-Incomplete` on v3) for an outbound response.
pub fn set_completeness(headers: &mut HeaderMap, version: InteropVersion, complete: bool) {
    let (name, value) = if version >= InteropVersion::V5 {
        (H_COMPLETE, sfv::format_boolean(complete))
    } else {
        (H_INCOMPLETE, sfv::format_boolean(!complete))
    };
    if let (Ok(name), Ok(value)) = (name.parse::<HeaderName>(), value.parse()) {
        headers.insert(name, value);
    }
}

/// Writes `Upload-Draft-Interop-Version` and `Upload-Offset` for an outbound response.
pub fn set_version_and_offset(headers: &mut HeaderMap, version: InteropVersion, offset: u64) {
    if let Ok(value) = sfv::format_integer(u64::from(version.as_u32())).parse() {
        headers.insert(
            H_INTEROP_VERSION.parse::<HeaderName>().expect("static header name"),
            value,
        );
    }
    if let Ok(value) = sfv::format_integer(offset).parse() {
        headers.insert(
            H_OFFSET.parse::<HeaderName>().expect("static header name"),
            value,
        );
    }
}

/// Builds the `Upload-Limit` dictionary value advertised on `OPTIONS` responses.
#[must_use]
pub fn default_upload_limit() -> String {
    let mut dict = sfv::Dictionary::new();
    dict.insert("min-size", sfv::Item::Integer(0));
    dict.format()
}

/// Rewrites an `OPTIONS` response that the application answered with `501
/// Not Implemented` into the protocol's required `200 OK` + `Upload-Limit`.
pub fn rewrite_options_response(status: &mut StatusCode, headers: &mut HeaderMap) {
    if *status == StatusCode::NOT_IMPLEMENTED {
        *status = StatusCode::OK;
        if let (Ok(name), Ok(value)) = (
            H_LIMIT.parse::<HeaderName>(),
            default_upload_limit().parse(),
        ) {
            headers.insert(name, value);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use salvo_core::http::header::{CONTENT_LENGTH, CONTENT_TYPE};

    fn headers(pairs: &[(&str, &str)]) -> HeaderMap {
        let mut map = HeaderMap::new();
        for (k, v) in pairs {
            map.insert(k.parse::<HeaderName>().unwrap(), v.parse().unwrap());
        }
        map
    }

    #[test]
    fn no_version_header_is_none() {
        let h = headers(&[]);
        let c = classify(&Method::POST, &h, false).unwrap();
        assert_eq!(c.intent, Intent::None);
    }

    #[test]
    fn unknown_version_rejected() {
        let h = headers(&[(H_INTEROP_VERSION, "4")]);
        let err = classify(&Method::POST, &h, false).unwrap_err();
        assert!(matches!(err, ProtocolError::UnsupportedInteropVersion(4)));
    }

    #[test]
    fn creation_v6() {
        let h = headers(&[
            (H_INTEROP_VERSION, "6"),
            (H_COMPLETE, "?1"),
            (CONTENT_LENGTH.as_str(), "5"),
        ]);
        let c = classify(&Method::POST, &h, false).unwrap();
        assert_eq!(c.version, InteropVersion::V6);
        assert_eq!(
            c.intent,
            Intent::Creation {
                complete: true,
                content_length: Some(5),
                upload_length: None,
            }
        );
    }

    #[test]
    fn creation_v3_uses_incomplete_inverse() {
        let h = headers(&[(H_INTEROP_VERSION, "3"), (H_INCOMPLETE, "?0")]);
        let c = classify(&Method::POST, &h, false).unwrap();
        assert_eq!(
            c.intent,
            Intent::Creation {
                complete: true,
                content_length: None,
                upload_length: None,
            }
        );
    }

    #[test]
    fn head_on_resumption_path_is_offset_retrieval() {
        let h = headers(&[(H_INTEROP_VERSION, "6")]);
        let c = classify(&Method::HEAD, &h, true).unwrap();
        assert_eq!(c.intent, Intent::OffsetRetrieval);
    }

    #[test]
    fn head_with_extra_header_rejected() {
        let h = headers(&[(H_INTEROP_VERSION, "6"), (H_OFFSET, "0")]);
        let err = classify(&Method::HEAD, &h, true).unwrap_err();
        assert!(matches!(err, ProtocolError::ExtraHeaderField("Upload-Offset")));
    }

    #[test]
    fn patch_v6_requires_partial_upload_content_type() {
        let h = headers(&[
            (H_INTEROP_VERSION, "6"),
            (H_OFFSET, "3"),
            (H_COMPLETE, "?1"),
        ]);
        let err = classify(&Method::PATCH, &h, true).unwrap_err();
        assert!(matches!(err, ProtocolError::MissingHeaderField("Content-Type")));
    }

    #[test]
    fn patch_v6_with_content_type_succeeds() {
        let h = headers(&[
            (H_INTEROP_VERSION, "6"),
            (H_OFFSET, "3"),
            (H_COMPLETE, "?1"),
            (CONTENT_TYPE.as_str(), PARTIAL_UPLOAD_CONTENT_TYPE),
        ]);
        let c = classify(&Method::PATCH, &h, true).unwrap();
        assert_eq!(
            c.intent,
            Intent::Appending {
                offset: 3,
                complete: true,
                content_length: None,
                upload_length: None,
            }
        );
    }

    #[test]
    fn unknown_method_on_resumption_path() {
        let h = headers(&[(H_INTEROP_VERSION, "6")]);
        let err = classify(&Method::PUT, &h, true).unwrap_err();
        assert!(matches!(err, ProtocolError::UnknownMethod));
    }

    #[test]
    fn strip_protocol_headers_removes_only_protocol_fields() {
        let mut h = headers(&[
            (H_COMPLETE, "?1"),
            (H_OFFSET, "5"),
            (CONTENT_LENGTH.as_str(), "5"),
        ]);
        strip_protocol_headers(&mut h);
        assert!(!h.contains_key(H_COMPLETE));
        assert!(!h.contains_key(H_OFFSET));
        assert!(h.contains_key(CONTENT_LENGTH));
    }

    #[test]
    fn options_rewrite_501_to_200() {
        let mut status = StatusCode::NOT_IMPLEMENTED;
        let mut h = HeaderMap::new();
        rewrite_options_response(&mut status, &mut h);
        assert_eq!(status, StatusCode::OK);
        assert!(h.contains_key(H_LIMIT));
    }
}
