pub mod assemble;
pub mod pattern;
