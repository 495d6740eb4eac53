pub mod stage0_parse;
pub mod stage1_segment;
pub mod stage2_identity;
pub mod stage3_samples;
pub mod stage4_patterns;
pub mod stage5_render;

pub use stage0_parse::*;
pub use stage1_segment::*;
pub use stage2_identity::*;
pub use stage3_samples::*;
pub use stage4_patterns::*;
pub use stage5_render::*;
