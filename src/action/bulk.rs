//! Fan one multi-path request out into independent single-path actions.

use super::lifecycle::Action;
use super::{ActionContext, ActionKind};
use crate::core::{ClientError, Request, RequestLimits, Response};

/// Run `kind`'s element operation once per path, in order.
///
/// Every path runs to completion whatever its siblings did; each takes and
/// drops the agent lock on its own. The aggregate succeeds only if every
/// element did.
pub fn run(kind: ActionKind, request: &Request, cx: &ActionContext<'_>) -> Response {
    let Some(element) = kind.element() else {
        return Response::error(
            ClientError::UnknownAction {
                name: kind.name().to_string(),
            }
            .to_string(),
        );
    };
    if let Err(err) = validate(request) {
        tracing::info!(action = %kind, error = %err, "bulk request rejected");
        return Response::error(err.to_string());
    }

    let paths = request.paths();
    tracing::info!(action = %kind, paths = paths.len(), "bulk request");
    let responses = paths
        .iter()
        .map(|path| {
            let sub = request.for_path(element.name(), path.clone());
            Action::new(element, sub, cx).run()
        })
        .collect();
    Response::bulk(responses)
}

fn validate(request: &Request) -> Result<(), ClientError> {
    request.credentials()?;
    let paths = request.paths();
    if paths.is_empty() {
        return Err(ClientError::MissingPaths);
    }
    if paths.len() > RequestLimits::MAX_PATHS {
        return Err(ClientError::TooManyPaths {
            max: RequestLimits::MAX_PATHS,
            got: paths.len(),
        });
    }
    Ok(())
}
