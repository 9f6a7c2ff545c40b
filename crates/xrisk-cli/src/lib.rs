pub mod explore;
pub mod pipeline;
pub mod util;
