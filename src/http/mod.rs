//! HTTP presentation surface.
//!
//! A small Axum server exposing the live view, recording controls, milestone
//! buttons, and saved-roast history as JSON, plus a Server-Sent Events stream
//! of samples and recording events. Handlers call straight into the shared
//! [`AcquisitionContext`](crate::context::AcquisitionContext).

mod routes;
mod sse;

pub use routes::{
    build_router, run_http_server, ForcedStopResponse, HealthResponse, HttpServerError, HttpState,
    ToggleRequest, UpdateBeanInfoRequest,
};
