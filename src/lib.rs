//! Turn type tree dumps of serialized objects into deduplicated C# record declarations.
//!
//! Pipeline: dump text → [`tree::TypeTreeNode`] → [`reference::ReferenceTree`] →
//! canonical names ([`generator::ClassCodeGenerator`]) → emitted code ([`emit`]).
pub mod cli;
pub mod dump;
pub mod emit;
pub mod error;
pub mod generator;
pub mod ident;
pub mod reference;
pub mod tree;

pub use error::{GenerateError, ParseError};
pub use generator::ClassCodeGenerator;
pub use tree::{ShapeTag, TypeTreeNode};
