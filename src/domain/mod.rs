pub mod chunks;
pub mod phase;
pub mod spec;
pub mod stitch;
pub mod storyboard;
