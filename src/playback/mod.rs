/*!
 * Playback side of the overlay: the video player seam, keyboard bindings,
 * subtitle renderers and the navigation controller tying them together.
 */

pub mod controller;
pub mod keyboard;
pub mod player;
pub mod render;

pub use controller::{ControllerEvent, NavigationCommand, NavigationController, NavigationMode, ReplayState};
pub use keyboard::{command_for_key, FocusTarget, KeyEvent};
pub use player::{ClockMode, PlayerEvent, SimulatedPlayer, VideoPlayer};
pub use render::{DisplayMode, OverlayRenderer, Renderer, SubtitleSource, SubtitleUpdate, TextRenderer};
