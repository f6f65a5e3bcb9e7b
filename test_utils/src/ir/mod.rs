pub mod generator;
pub mod source;

pub use generator::{GenCase, GenComm, GenProgram, GenStmt};
pub use source::SourceWriter;
