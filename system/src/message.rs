use serde::{Deserialize, Serialize};

use crate::types::{Pixel, SessionCode};

/// Inbound message, tagged by `requestType`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "requestType", rename_all = "camelCase")]
pub enum Request {
    Session,
    Canvas {
        #[serde(rename = "canvasCode")]
        canvas_code: String,
    },
    Draw {
        #[serde(rename = "canvasCode")]
        canvas_code: String,
        x: i64,
        y: i64,
        #[serde(default)]
        color: Option<String>,
    },
    Image {
        #[serde(rename = "canvasCode")]
        canvas_code: String,
    },
    /// Keep-alive sent by older clients. Ignored.
    #[serde(rename = "none")]
    KeepAlive {
        #[serde(rename = "canvasCode", default)]
        canvas_code: Option<String>,
    },
}

impl Request {
    /// Decodes one text frame. `None` for anything that isn't a known request,
    /// including `{}`.
    pub fn decode(raw: &[u8]) -> Option<Self> {
        match serde_json::from_slice(raw) {
            Ok(request) => Some(request),
            Err(err) => {
                log::debug!("Dropping undecodable request: {}", err);
                None
            }
        }
    }
}

/// Outbound message, tagged by `responseType`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "responseType", rename_all = "camelCase")]
pub enum Response {
    SessionResponse {
        code: SessionCode,
    },
    CanvasResponse {
        pixels: Vec<Pixel>,
    },
    DrawResponse {
        ok: bool,
    },
    CanvasUpdate {
        #[serde(rename = "canvasCode")]
        canvas_code: SessionCode,
        x: u16,
        y: u16,
        color: String,
    },
    /// Base64 encoded PNG.
    ImageResponse {
        image: String,
    },
}

impl Response {
    pub fn encode(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn it_decodes_every_request_kind() {
        assert_eq!(
            Request::decode(br#"{"requestType":"session","canvasCode":"session"}"#),
            Some(Request::Session)
        );
        assert_eq!(
            Request::decode(br#"{"requestType":"canvas","canvasCode":"ABCDEFGH"}"#),
            Some(Request::Canvas {
                canvas_code: "ABCDEFGH".into()
            })
        );
        assert_eq!(
            Request::decode(
                br##"{"requestType":"draw","canvasCode":"ABCDEFGH","x":-1,"y":2,"color":"#FF0000"}"##
            ),
            Some(Request::Draw {
                canvas_code: "ABCDEFGH".into(),
                x: -1,
                y: 2,
                color: Some("#FF0000".into()),
            })
        );
        assert_eq!(
            Request::decode(br#"{"requestType":"image","canvasCode":"ABCDEFGH"}"#),
            Some(Request::Image {
                canvas_code: "ABCDEFGH".into()
            })
        );
    }

    #[test]
    fn it_decodes_draw_without_color() {
        let request =
            Request::decode(br#"{"requestType":"draw","canvasCode":"ABCDEFGH","x":1,"y":2}"#);
        assert!(matches!(request, Some(Request::Draw { color: None, .. })));
        let request = Request::decode(
            br#"{"requestType":"draw","canvasCode":"ABCDEFGH","x":1,"y":2,"color":null}"#,
        );
        assert!(matches!(request, Some(Request::Draw { color: None, .. })));
    }

    #[test]
    fn it_decodes_keep_alive() {
        assert_eq!(
            Request::decode(br#"{"requestType":"none","canvasCode":"session"}"#),
            Some(Request::KeepAlive {
                canvas_code: Some("session".into())
            })
        );
    }

    #[test]
    fn it_drops_garbage() {
        assert_eq!(Request::decode(b"{}"), None);
        assert_eq!(Request::decode(b""), None);
        assert_eq!(Request::decode(b"not json"), None);
        assert_eq!(Request::decode(br#"{"requestType":"explode"}"#), None);
        assert_eq!(Request::decode(br#"{"requestType":"canvas"}"#), None);
        assert_eq!(
            Request::decode(br#"{"requestType":"draw","canvasCode":"A","x":"1","y":2}"#),
            None
        );
    }

    #[test]
    fn it_encodes_responses_with_tag() {
        let code = SessionCode::parse("ABCDEFGH").expect("");
        let encoded: serde_json::Value = serde_json::from_str(
            &Response::CanvasUpdate {
                canvas_code: code.clone(),
                x: 5,
                y: 6,
                color: "#FF0000".into(),
            }
            .encode()
            .expect(""),
        )
        .expect("");
        assert_eq!(
            encoded,
            json!({
                "responseType": "canvasUpdate",
                "canvasCode": "ABCDEFGH",
                "x": 5,
                "y": 6,
                "color": "#FF0000",
            })
        );

        let encoded: serde_json::Value =
            serde_json::from_str(&Response::DrawResponse { ok: false }.encode().expect(""))
                .expect("");
        assert_eq!(encoded, json!({"responseType": "drawResponse", "ok": false}));

        let encoded: serde_json::Value =
            serde_json::from_str(&Response::SessionResponse { code }.encode().expect(""))
                .expect("");
        assert_eq!(
            encoded,
            json!({"responseType": "sessionResponse", "code": "ABCDEFGH"})
        );
    }
}
