//! One invocation: read the request, run it, write one frame.

use std::io::{Read, Write};

use crate::action::{ActionContext, ActionKind, dispatch};
use crate::core::{RawRequest, Request, Response};
use crate::error::BACKEND_ISSUE;
use crate::frame::FrameWriter;
use crate::Result;

/// Turn raw request bytes into exactly one response.
pub fn handle(input: &[u8], cx: &ActionContext<'_>) -> Response {
    let parsed = RawRequest::from_slice(input).and_then(|raw| {
        let kind = ActionKind::from_name(raw.action()?)?;
        let request = Request::parse(raw, kind.target_shape(), cx.limits())?;
        Ok((kind, request))
    });
    match parsed {
        Ok((kind, request)) => dispatch(kind, request, cx),
        Err(err) => {
            tracing::info!(error = %err, "request rejected");
            Response::error(err.to_string())
        }
    }
}

/// Read the whole request from `input` and write its framed response to
/// `output`. Only a failure to write the frame is an error.
pub fn run_once<R: Read, W: Write>(
    mut input: R,
    output: W,
    cx: &ActionContext<'_>,
) -> Result<Response> {
    let mut buf = Vec::new();
    let response = match input.read_to_end(&mut buf) {
        Ok(_) => handle(&buf, cx),
        Err(err) => {
            tracing::error!(kind = "IoError", message = %err, "failed to read request");
            Response::error(BACKEND_ISSUE)
        }
    };

    write_response(output, &response)?;
    Ok(response)
}

/// Write `response` as the single frame of this invocation.
pub fn write_response<W: Write>(output: W, response: &Response) -> Result<()> {
    let mut writer = FrameWriter::new(output);
    writer.write_response(response)?;
    writer.into_inner().flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::action::tests::Harness;
    use crate::frame::FrameReader;
    use crate::svn::testing::ScriptedExecutor;
    use base64::Engine;
    use base64::engine::general_purpose::STANDARD;

    fn b64(text: &str) -> String {
        STANDARD.encode(text)
    }

    fn payload(action: &str, data: serde_json::Value) -> Vec<u8> {
        serde_json::to_vec(&serde_json::json!({
            "action": action,
            "username": b64("u"),
            "password": b64("p"),
            "data": data,
        }))
        .unwrap()
    }

    #[test]
    fn malformed_and_unknown_requests_get_generic_errors() {
        let exec = ScriptedExecutor::ok();
        let h = Harness::new(&exec);

        let response = handle(b"{not json", &h.cx);
        assert!(!response.success());
        assert!(response.to_value().get("path").is_none());

        let response = handle(&payload("teleport", serde_json::json!({})), &h.cx);
        assert_eq!(response.error_message(), Some("unknown action 'teleport'"));
        assert!(exec.calls().is_empty());
    }

    #[test]
    fn credentials_are_base64_decoded_and_passed_to_svn() {
        let exec = ScriptedExecutor::new(|_| Ok("Path: /x\n".into()));
        let h = Harness::new(&exec);
        let response = handle(&payload("Create", serde_json::json!({"path": "x"})), &h.cx);
        assert!(response.success());
        let args = exec.calls()[0].to_args();
        let user = args.iter().position(|a| a == "--username").unwrap();
        assert_eq!(args[user + 1], "u");
        assert_eq!(args[user + 3], "p");
    }

    #[test]
    fn forty_one_paths_are_rejected_before_running() {
        let exec = ScriptedExecutor::ok();
        let h = Harness::new(&exec);
        let paths: Vec<String> = (1..=41).map(|i| format!("/path/{i}")).collect();
        let response = handle(
            &payload("BulkUpdate", serde_json::json!({"paths": paths})),
            &h.cx,
        );
        assert_eq!(
            response.error_message(),
            Some("up to 40 paths can be handled together")
        );
        assert!(exec.calls().is_empty());
    }

    #[test]
    fn run_once_writes_one_frame() {
        let exec = ScriptedExecutor::new(|_| Ok("1.14.2\n".into()));
        let h = Harness::new(&exec);
        let input = payload("version", serde_json::json!({}));

        let mut out = Vec::new();
        let response = run_once(input.as_slice(), &mut out, &h.cx).unwrap();

        let mut reader = FrameReader::new(out.as_slice(), 1 << 20);
        let frame = reader.read_next().unwrap().unwrap();
        assert_eq!(frame, response.to_json().unwrap());
        assert!(reader.read_next().unwrap().is_none());
    }
}
