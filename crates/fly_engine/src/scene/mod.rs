//! The demo scene
//!
//! ```text
//! window events -> FrameInput -> View::update
//!                                View::draw -> Compositor -> meshes
//! ```
//!
//! [`View`] is the only stateful piece; [`FrameInput`] is rebuilt from key
//! state every frame.

pub mod input;
pub mod view;

pub use input::FrameInput;
pub use view::View;
