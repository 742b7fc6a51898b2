pub mod chunks;
pub mod orchestrator;
pub mod storyboard;
