/// WebSocket connection and message handling for team consoles.
pub mod console_service;
/// OpenAPI documentation generation.
pub mod documentation;
/// Competition lifecycle: creation, summary, teardown.
pub mod game_service;
/// Health check service.
pub mod health_service;
/// Host-side round commands.
pub mod host_service;
/// Team-side round commands.
pub mod play_service;
/// Public service for read-only competition information.
pub mod public_service;
/// Server-Sent Events message generation.
pub mod sse_events;
/// Server-Sent Events broadcasting service.
pub mod sse_service;
