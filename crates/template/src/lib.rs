//! Template versions and their resolution against order data.
//!
//! A template version is a JSON layout loaded once through a
//! [`ResourceProvider`](annex9_traits::ResourceProvider), validated and then
//! shared read-only. The [`TemplateResolver`] pairs each of its fields with a
//! value taken from the order or produced by a named rule.

mod error;
mod loader;
mod metadata;
mod resolver;
mod rules;
pub mod schema;
mod values;
mod version;

pub use error::{TemplateError, ValidationError};
pub use loader::{LoadOptions, TemplateLoader};
pub use metadata::RenderMetadata;
pub use resolver::{ResolvedField, ResolvedValue, TemplateResolver};
pub use rules::{RuleContext, RuleFn, RuleRegistry};
pub use schema::{
    ChoiceOption, Decoration, FieldKind, FieldSpec, FieldType, FontDecl, FontRef, ShrinkSetting,
    TemplateDefinition,
};
pub use values::{DATE_FORMAT, FieldValue, OrderData, TIME_FORMAT};
pub use version::TemplateVersion;
