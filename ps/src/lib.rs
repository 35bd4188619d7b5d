//! PromptStore - schema-aware prompt template registry
//!
//! Manages parameterized prompt templates that reference named configuration
//! values through nested paths, conditionals, loops, and inclusion of other
//! templates. Given a template, the system resolves its transitive inclusion
//! closure, statically infers the nested configuration schema required to
//! render it, validates or synthesizes a configuration against that schema,
//! and renders the final prompt text.
//!
//! # Architecture
//!
//! ```text
//! registry dir/
//! ├── main.tmpl          # [[template "header.tmpl" .]] Hello [[.user.name]]
//! ├── header.tmpl        # [[.site.title]]
//! └── main_config.json   # {"site": {"title": ""}, "user": {"name": ""}}
//! ```
//!
//! # Example
//!
//! ```ignore
//! use promptstore::{LocalRegistry, PromptSystem};
//!
//! let system = PromptSystem::new(LocalRegistry::new("prompts/"));
//! let config = system.generate_config("main.tmpl", "main_config.json")?;
//! let prompt = system.build("main.tmpl", &config)?;
//! ```

pub mod cli;
pub mod config;
pub mod error;
pub mod registry;
pub mod resolver;
pub mod settings;
pub mod system;
pub mod template;

pub use config::{Config, synthesize};
pub use error::Error;
pub use registry::{LocalRegistry, Registry, TEMPLATE_EXT, normalize_name};
pub use resolver::{ResolvedSet, resolve};
pub use settings::Settings;
pub use system::PromptSystem;
pub use template::Template;
