/*!
 * Session management for loaded videos.
 *
 * This module provides:
 * - The per-video caption session context
 * - Session replacement on navigation to another video
 */

pub mod manager;
pub mod models;

// Re-export main types
pub use manager::SessionManager;
pub use models::{CaptionSession, SessionInfo, SessionSettings};
