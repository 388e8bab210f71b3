//! warp adapter for [`DialRouter`].

use std::sync::Arc;

use bytes::{Buf, BufMut, Bytes, BytesMut};
use futures::{pin_mut, Stream, StreamExt};
use tracing::debug;
use warp::http::{HeaderMap, Method, StatusCode};
use warp::path::FullPath;
use warp::{Filter, Rejection};

use crate::router::{DialRequest, DialResponse, DialRouter};

/// Hard cap on buffered request bodies, as a multiple of the router's
/// `max_content_length`. Bodies between the two still reach the router, which
/// answers 404 or 413 itself.
pub const BODY_LIMIT_FACTOR: usize = 4;

/// Catch-all filter handing every request to `router`.
///
/// The filter never rejects: unknown routes are answered by the router with 404,
/// so it can be mounted as-is or combined with other filters via `or`. Bodies
/// larger than [`BODY_LIMIT_FACTOR`] times the router's limit are answered with
/// 413 without being buffered in full.
pub fn dial_filter(
    router: Arc<DialRouter>,
) -> impl Filter<Extract = (DialResponse,), Error = Rejection> + Clone {
    let limit = router
        .settings()
        .max_content_length
        .saturating_mul(BODY_LIMIT_FACTOR);

    warp::method()
        .and(warp::path::full())
        .and(warp::header::headers_cloned())
        .and(warp::body::stream().then(move |stream| collect_body(stream, limit)))
        .and_then(
            move |method: Method, path: FullPath, headers: HeaderMap, body: Result<Bytes, StatusCode>| {
                let router = router.clone();
                async move {
                    let body = match body {
                        Ok(body) => body,
                        Err(status) => return Ok::<_, Rejection>(DialResponse::status(status)),
                    };
                    let request = DialRequest {
                        method,
                        path: path.as_str().to_string(),
                        headers,
                        body,
                    };
                    Ok(router.handle(request).await)
                }
            },
        )
}

async fn collect_body<S, B>(stream: S, limit: usize) -> Result<Bytes, StatusCode>
where
    S: Stream<Item = Result<B, warp::Error>>,
    B: Buf,
{
    pin_mut!(stream);
    let mut body = BytesMut::new();
    while let Some(chunk) = stream.next().await {
        let chunk = chunk.map_err(|e| {
            debug!("Failed to read request body: {}", e);
            StatusCode::BAD_REQUEST
        })?;
        if body.len() + chunk.remaining() > limit {
            debug!("Request body exceeds {} bytes", limit);
            return Err(StatusCode::PAYLOAD_TOO_LARGE);
        }
        body.put(chunk);
    }
    Ok(body.freeze())
}
