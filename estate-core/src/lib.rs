//! EstateHub Core - Domain Types
//!
//! Pure domain vocabulary shared by the API layer: identifiers, the closed
//! sets of statuses/types/stages stored in the database, validation errors,
//! and the deal pipeline rules. No I/O happens here.

pub mod enums;
pub mod error;
pub mod identity;
pub mod pipeline;

pub use enums::*;
pub use error::{EnumParseError, ValidationError, ValidationResult};
pub use identity::*;
pub use pipeline::{PropertyOutcome, StageTransition};
