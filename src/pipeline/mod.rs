pub mod extraction;
pub mod parsing;
pub mod normalize;
pub mod classify;
pub mod assemble;
pub mod processor;
