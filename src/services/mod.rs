//! Service layer coordinating session state, validation, and SSE fan-out.

pub mod documentation;
pub mod health_service;
pub mod session_service;
pub mod sse_events;
pub mod sse_service;
