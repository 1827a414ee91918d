pub mod assembler;
pub mod program;
