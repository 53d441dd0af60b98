pub mod error;
pub use error::Result;
pub use error::Error;
pub use error::RuleError;
pub use error::SelectionError;

pub mod config;
pub use config::ResolverOptions;

pub mod attribute;
pub use attribute::Attribute;
pub use attribute::AttributeContainer;
pub use attribute::AttributeValue;

pub mod schema;
pub use schema::AttributeMatchingSchema;

pub mod capability;
pub use capability::Capability;
pub use capability::CapabilitySelector;

pub mod component;
pub use component::Component;
pub use component::ComponentIdentifier;
pub use component::Variant;

pub mod failure;
pub use failure::ResolutionFailure;
pub use failure::FailureKind;

pub mod selector;
pub use selector::VariantSelector;
pub use selector::SelectionRequest;

pub mod graph_resolver;
pub use graph_resolver::GraphResolverBuilder;
pub use graph_resolver::GraphResolution;
pub use graph_resolver::ResolutionStatus;
