//! Backend module - Code generation

pub mod js;

pub use js::JsTranslator;
