//! HTTP clients to the five downstream language/analysis microservices.
//! Each is grounded on the matching `workers/*/main.py` module; the
//! services themselves are out of scope and described only by their
//! request/response shape.

pub mod codegen;
pub mod dhscanner;
pub mod kbgen;
pub mod native;
pub mod queryengine;

pub use codegen::CodegenClient;
pub use dhscanner::{DhscannerParseOutcome, DhscannerParserClient, FailureLocation};
pub use kbgen::KbgenClient;
pub use native::{NativeParserClient, NativeParserEndpoints};
pub use queryengine::{build_kb, QueryengineClient};
