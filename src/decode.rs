use bytes::Bytes;
use serde_json::{Map, Value};

use crate::{xml::parse_xml, Blob, Body, DecodeError};

type Decoder = fn(&str, Bytes, bool) -> Result<Body, DecodeError>;

/// One row of the content-type decision table.
pub(crate) struct ContentDecoder {
    pub name: &'static str,
    pub matches: fn(&str) -> bool,
    pub decode: Decoder,
}

/// Decoders in priority order; the first matching row wins.
pub(crate) const CONTENT_DECODERS: &[ContentDecoder] = &[
    ContentDecoder {
        name: "json",
        matches: |ct| ct.contains("application/json"),
        decode: decode_json,
    },
    ContentDecoder {
        name: "multipart",
        matches: |ct| ct.contains("multipart/form-data"),
        decode: |_, body, _| Ok(Body::Stream(body)),
    },
    ContentDecoder {
        name: "text",
        matches: |ct| ct.contains("text/plain"),
        decode: decode_text,
    },
    ContentDecoder {
        name: "octet-stream",
        matches: |ct| ct.contains("application/octet-stream"),
        decode: decode_buffer,
    },
    ContentDecoder {
        name: "image",
        matches: |ct| ct.contains("image/"),
        decode: decode_blob,
    },
    ContentDecoder {
        name: "form-urlencoded",
        matches: |ct| ct.contains("application/x-www-form-urlencoded"),
        decode: decode_form,
    },
    ContentDecoder {
        name: "xml",
        matches: |ct| {
            ct.contains("application/xml") || ct.contains("text/xml") || ct.contains("soap+xml")
        },
        decode: decode_xml,
    },
];

/// Decodes a response body according to its declared `Content-Type`.
pub(crate) fn decode_body(
    content_type: Option<&str>,
    body: Bytes,
    return_json: bool,
) -> Result<Body, DecodeError> {
    let Some(content_type) = content_type else {
        return Ok(Body::message("No ContentType"));
    };

    match CONTENT_DECODERS
        .iter()
        .find(|decoder| (decoder.matches)(content_type))
    {
        Some(decoder) => {
            #[cfg(feature = "tracing")]
            tracing::trace!(decoder = decoder.name, content_type, "decoding response body");

            (decoder.decode)(content_type, body, return_json)
        }
        None => Ok(Body::message("Unknown ContentType")),
    }
}

fn decode_json(_: &str, body: Bytes, _: bool) -> Result<Body, DecodeError> {
    Ok(Body::Json(serde_json::from_slice(&body)?))
}

fn decode_text(_: &str, body: Bytes, return_json: bool) -> Result<Body, DecodeError> {
    let text = Body::Text(bytes_to_string(body));
    Ok(box_if(return_json, "text", text))
}

fn decode_buffer(_: &str, body: Bytes, return_json: bool) -> Result<Body, DecodeError> {
    Ok(box_if(return_json, "buffer", Body::Buffer(body)))
}

fn decode_blob(content_type: &str, body: Bytes, return_json: bool) -> Result<Body, DecodeError> {
    let blob = Body::Blob(Blob {
        content_type: content_type.to_owned(),
        data: body,
    });
    Ok(box_if(return_json, "blob", blob))
}

// Always a mapping; `return_json` does not apply.
fn decode_form(_: &str, body: Bytes, _: bool) -> Result<Body, DecodeError> {
    let mut params = Map::new();
    for (key, value) in url::form_urlencoded::parse(&body) {
        params.insert(key.into_owned(), Value::String(value.into_owned()));
    }
    Ok(Body::Json(Value::Object(params)))
}

fn decode_xml(_: &str, body: Bytes, return_json: bool) -> Result<Body, DecodeError> {
    let text = bytes_to_string(body);
    if return_json {
        Ok(Body::Json(parse_xml(&text)?))
    } else {
        Ok(Body::Text(text))
    }
}

fn box_if(return_json: bool, key: &'static str, body: Body) -> Body {
    if return_json {
        Body::boxed(key, body)
    } else {
        body
    }
}

fn bytes_to_string(body: Bytes) -> String {
    String::from_utf8_lossy(&body).into_owned()
}
