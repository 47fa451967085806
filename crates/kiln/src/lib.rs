//! # kiln - include resolution and templating for machine provisioning configs
//!
//! ## Introduction for developers
//!
//! Read this to understand how `kiln` works internally.
//!
//! ### Documents
//!
//! A document is a yaml file. Next to the provisioning payload (see [schema::Config]) it may carry three reserved
//! keys:
//!
//! ```yaml
//! import:               # `include` is accepted as well
//!   base.yaml:          # path relative to this file
//!   units/etcd.yaml:    # parameters only visible to this import
//!     name: etcd-1
//! output: node-1.yaml   # where `kiln render` writes the result
//! type: cloud-config    # output format, see [render]
//!
//! systemd:
//!   units:
//!     - name: "{{ .name }}.service"
//! ```
//!
//! ### Loading
//!
//! see [document::Loader::load]
//!
//! The raw text is interpolated first ([template::render]) with the parameters handed down by the importer. Only
//! then it is parsed as yaml, the reserved keys are taken out and the rest is kept as a [value::Value]. Storage
//! files pointing to `file://` urls are read and inlined at this point.
//!
//! ### Resolving
//!
//! see [resolver::Resolver::resolve]
//!
//! Imports are loaded and resolved depth-first in declaration order, each one merged into its importer
//! ([value::Value::merge]): objects merge key-wise, arrays concatenate, later scalars win.
//!
//! A [error::PathStack] tracks the files on the current branch. Importing any of them again fails with
//! [Error::CircularDependency]. A file shared by two branches is merged twice.
//!
//! ### Rendering
//!
//! see [render::render]
//!
//! The merged payload is interpreted as [schema::Config], validated ([validate]) and emitted. Findings that are not
//! fatal end up in a [report::Report] next to the output.
//!
//! ### Normalizing
//!
//! Everything written is passed through [normalize::normalize] first. It removes null, false, zero and empty values
//! until nothing changes anymore.

pub mod cancel;
pub mod document;
pub mod error;
pub mod fs;
pub mod ignition;
pub mod normalize;
pub mod render;
pub mod report;
pub mod resolver;
pub mod schema;
pub mod template;
pub mod transpile;
pub mod validate;
pub mod value;
pub mod visit;

pub use cancel::Cancellation;
pub use document::{Document, Loader};
pub use error::{Error, Result};
pub use fs::{FileSystem, MemoryFs, OsFs};
pub use normalize::normalize;
pub use render::{render, save_to, Format, RenderError, Rendered};
pub use report::Report;
pub use resolver::Resolver;
pub use template::Parameters;
pub use value::Value;
