/// State management module
///
/// This module handles all application state, including:
/// - Shared data structures (data.rs)
/// - Transient notices (notice.rs)
/// - The screen's orchestration logic (session.rs)

pub mod data;
pub mod notice;
pub mod session;
