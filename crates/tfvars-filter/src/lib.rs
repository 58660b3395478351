//! # tfvars-filter
//!
//! Reduce a `.tfvars` file to the variables a module actually declares.
//!
//! ## Introduction for developers
//!
//! Read this to understand how `tfvars-filter` works internally.
//!
//! ### The problem
//!
//! Given a module
//! ```hcl
//! variable "region" {}
//! ```
//! and a tfvars file
//! ```hcl
//! # shared settings
//! region  = "eu-west-1"
//! zone_id = "abc" # only used by another module
//! ```
//! the output is
//! ```hcl
//! # shared settings
//! region  = "eu-west-1"
//! zone_id = null # only used by another module
//! ```
//!
//! Undeclared attributes are not removed, their value becomes `null`. Everything else stays byte for byte as it was:
//! comments, blank lines, alignment, attribute order.
//!
//! ### Loading the module
//!
//! see [module::Module::load]
//!
//! All `*.tf` and `*.tf.json` files of the module directory are parsed and `variable` blocks are collected. The
//! variable names form a [filter::DeclaredSet]. A module that cannot be loaded stops everything before the tfvars file
//! is even read.
//!
//! ### Parsing the document
//!
//! see [document::Document::parse]
//!
//! The document is not turned into a syntax tree and rendered back, as that would lose formatting. Instead a
//! [scanner::SpanScanner] reports where each root attribute's name and value are located, and the
//! [document::Document] splits the text into segments along those boundaries:
//!
//! | **text**                        | **segment** |
//! |---------------------------------|-------------|
//! | `# shared settings\nregion  = ` | opaque      |
//! | `"eu-west-1"`                   | value       |
//! | `\nzone_id = `                  | opaque      |
//! | `"abc"`                         | value       |
//! | ` # only used by ...\n`         | opaque      |
//!
//! Blocks at the root are part of an opaque segment. Syntax errors abort parsing; there is no partial document. This
//! includes assigning the same name twice, which HCL does not allow.
//!
//! ### Filtering
//!
//! see [filter::neutralize_undeclared]
//!
//! Each value segment of an undeclared name gets [filter::NULL_LITERAL] as its new payload. Serializing concatenates
//! all segments again.
//!
//! ### Errors
//!
//! Everything a user should see is a [diagnostics::Diagnostic], positioned where possible. They are rendered as
//! `file:line: summary; detail`.
//!
pub mod diagnostics;
pub mod document;
pub mod filter;
pub mod module;
pub mod report;
pub mod scanner;
