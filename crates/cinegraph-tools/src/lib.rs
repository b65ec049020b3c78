//! Cinegraph Tools - capabilities the agent can call
//!
//! The capability set is closed: each variant of [`Capability`] names one
//! tool with a declared input schema, and [`CapabilityRegistry`] dispatches
//! by matching on the variant. To add a capability: add the variant, its
//! tool under src/tools/, and the match arm in the registry.

pub mod registry;
pub mod tools;

pub use registry::{Capability, CapabilityRegistry, Tool, ToolResult};
pub use tools::information::{
    build_prompt, EntityResolver, InformationArgs, InformationTool, Lookup, QueryExecutor, QueryExample,
    QuerySynthesizer, ResolutionOrchestrator,
};
