//! Declared variables of a module directory
//!
//! A module is every `*.tf` and `*.tf.json` file directly inside a directory. Only `variable` blocks are of interest:
//! ```hcl
//! variable "region" {
//!   description = "where to deploy"
//!   default     = "eu-west-1"
//! }
//! ```
//! The JSON form declares the same under a root `"variable"` property, either an object keyed by variable name or an
//! array of such objects.
//!
//! Loading never stops at the first broken file; all problems are collected into [Diagnostics].
use crate::diagnostics::{Diagnostic, Diagnostics, Origin, Pos, Subject};
use crate::filter::DeclaredSet;
use hcl_edit::structure::Structure;
use hcl_edit::Span;
use indexmap::IndexMap;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Variable {
    pub name: String,
    pub description: Option<String>,
    /// `true` when there is no default
    pub required: bool,
    pub sensitive: bool,
    /// file the variable was declared in
    pub file: PathBuf,
}

#[derive(Default, Debug)]
pub struct Module {
    variables: IndexMap<String, Variable>,
}

impl Module {
    /// Loads all configuration files in `dir_path`
    #[tracing::instrument(level = "info", skip_all, fields(path = %dir_path.display()))]
    pub fn load(dir_path: &Path) -> Result<Self, Diagnostics> {
        let mut module = Module::default();
        let mut diagnostics = Diagnostics::new();

        let mut files = match list_files(dir_path) {
            Ok(files) => files,
            Err(err) => {
                tracing::debug!(%err, "unable to list module directory");
                return Err(Diagnostic::error(
                    "Failed to read module directory",
                    format!(
                        "Module directory {} does not exist or cannot be read.",
                        dir_path.display()
                    ),
                )
                .into());
            }
        };
        // override files apply on top of all primary files
        files.sort_by_key(|(file_path, kind)| (kind.is_override(), file_path.clone()));

        for (file_path, kind) in files {
            if let Err(file_diagnostics) = module.load_file(&file_path, kind) {
                diagnostics.extend(file_diagnostics);
            }
        }

        tracing::info!(variables = module.variables.len(), "module loaded");
        diagnostics.into_result(module)
    }

    fn load_file(&mut self, file_path: &Path, kind: FileKind) -> Result<(), Diagnostics> {
        tracing::info!(path = %file_path.display(), "loading file");

        let contents = std::fs::read_to_string(file_path)
            .map_err(|err| LoadError::from(err).diagnostic(file_path))?;

        match kind {
            FileKind::Native { is_override } => self.insert_native(&contents, file_path, is_override),
            FileKind::Json { is_override } => self.insert_json(&contents, file_path, is_override),
        }
    }

    /// Adds the variables declared in native HCL syntax
    pub fn insert_native(
        &mut self,
        contents: &str,
        file_path: &Path,
        is_override: bool,
    ) -> Result<(), Diagnostics> {
        let body = hcl_edit::parser::parse_body(contents)
            .map_err(|err| LoadError::from(err).diagnostic(file_path))?;

        let origin = Origin::new(file_path.display().to_string());
        let mut diagnostics = Diagnostics::new();
        for structure in body.into_iter() {
            let Structure::Block(block) = structure else {
                continue;
            };

            if block.ident.value().as_str() != "variable" {
                continue;
            }

            if block.labels.len() != 1 {
                diagnostics.push(Diagnostic::error(
                    "Invalid variable block",
                    format!(
                        "A variable block in {} must have exactly one label: the variable name.",
                        file_path.display()
                    ),
                )
                .with_subject(origin.subject_at(contents, block.span().map_or(0, |span| span.start))));
                continue;
            }

            let mut variable = Variable {
                name: block.labels[0].as_str().to_string(),
                description: None,
                required: true,
                sensitive: false,
                file: file_path.to_owned(),
            };

            for attribute in block.body.attributes() {
                let value: hcl::Expression = attribute.value.clone().into();
                match (attribute.key.value().as_str(), value) {
                    ("description", hcl::Expression::String(description)) => {
                        variable.description = Some(description)
                    }
                    ("sensitive", hcl::Expression::Bool(sensitive)) => variable.sensitive = sensitive,
                    ("default", _) => variable.required = false,
                    _ => {}
                }
            }

            if let Err(diagnostic) = self.insert(variable, is_override) {
                diagnostics.push(diagnostic);
            }
        }

        diagnostics.into_result(())
    }

    /// Adds the variables declared in JSON syntax
    pub fn insert_json(
        &mut self,
        contents: &str,
        file_path: &Path,
        is_override: bool,
    ) -> Result<(), Diagnostics> {
        let root: serde_json::Value = serde_json::from_str(contents)
            .map_err(|err| LoadError::from(err).diagnostic(file_path))?;

        // serde_json keeps no positions, point at the first "variable" key instead
        let property = contents.find("\"variable\"").unwrap_or(0);
        let subject = Origin::new(file_path.display().to_string()).subject_at(contents, property);
        let invalid = || {
            Diagnostic::error(
                "Invalid variable declarations",
                format!(
                    "The \"variable\" property in {} must be an object or an array of objects.",
                    file_path.display()
                ),
            )
            .with_subject(subject.clone())
        };

        let groups = match root.get("variable") {
            None => vec![],
            Some(serde_json::Value::Object(group)) => vec![group],
            Some(serde_json::Value::Array(items)) => items
                .iter()
                .map(|item| item.as_object().ok_or_else(invalid))
                .collect::<Result<Vec<_>, _>>()?,
            Some(_) => return Err(invalid().into()),
        };

        let mut diagnostics = Diagnostics::new();
        for (name, declaration) in groups.into_iter().flatten() {
            let variable = Variable {
                name: name.clone(),
                description: declaration
                    .get("description")
                    .and_then(serde_json::Value::as_str)
                    .map(str::to_string),
                required: declaration.get("default").is_none(),
                sensitive: declaration
                    .get("sensitive")
                    .and_then(serde_json::Value::as_bool)
                    .unwrap_or(false),
                file: file_path.to_owned(),
            };

            if let Err(diagnostic) = self.insert(variable, is_override) {
                diagnostics.push(diagnostic);
            }
        }

        diagnostics.into_result(())
    }

    /// Adds a variable
    ///
    /// Override files may redeclare a variable. Their attributes are merged into the existing declaration.
    fn insert(&mut self, variable: Variable, is_override: bool) -> Result<(), Diagnostic> {
        let Some(existing) = self.variables.get_mut(&variable.name) else {
            if is_override {
                return Err(Diagnostic::error(
                    "Missing base variable declaration to override",
                    format!(
                        "There is no variable named \"{}\". An override file can only override a variable that was already declared in a primary configuration file.",
                        variable.name
                    ),
                ));
            }

            tracing::debug!(name = %variable.name, file = %variable.file.display(), "variable declared");
            self.variables.insert(variable.name.clone(), variable);
            return Ok(());
        };

        if !is_override {
            return Err(Diagnostic::error(
                "Duplicate variable declaration",
                format!(
                    "A variable named \"{}\" was already declared in {}. Variable names must be unique within a module.",
                    variable.name,
                    existing.file.display()
                ),
            ));
        }

        tracing::debug!(name = %variable.name, file = %variable.file.display(), "variable overridden");
        if variable.description.is_some() {
            existing.description = variable.description;
        }
        existing.required &= variable.required;
        existing.sensitive |= variable.sensitive;
        Ok(())
    }

    pub fn variables(&self) -> impl Iterator<Item = &Variable> {
        self.variables.values()
    }

    pub fn variable(&self, name: &str) -> Option<&Variable> {
        self.variables.get(name)
    }

    /// Names of all declared variables
    pub fn declared(&self) -> DeclaredSet {
        self.variables.keys().cloned().collect()
    }
}

fn list_files(dir_path: &Path) -> std::io::Result<Vec<(PathBuf, FileKind)>> {
    let mut files = vec![];
    for dir_entry in std::fs::read_dir(dir_path)? {
        let dir_entry = dir_entry?;
        if !dir_entry.file_type()?.is_file() {
            continue;
        }

        let file_path = dir_entry.path();
        if let Some(kind) = FileKind::of(&file_path) {
            files.push((file_path, kind));
        }
    }
    Ok(files)
}

#[derive(thiserror::Error, Debug)]
pub enum LoadError {
    #[error("Failed to read file")]
    IoError(#[from] std::io::Error),
    #[error("Invalid HCL syntax")]
    HclParseFailed(#[from] hcl_edit::parser::Error),
    #[error("Invalid JSON syntax")]
    JsonParseFailed(#[from] serde_json::Error),
}

impl LoadError {
    /// Describes this error as a diagnostic for `file_path`
    pub fn diagnostic(&self, file_path: &Path) -> Diagnostic {
        let subject = |line, column, byte| {
            Subject::new(file_path.display().to_string(), Pos { line, column, byte })
        };

        match self {
            LoadError::IoError(err) => Diagnostic::error(
                self.to_string(),
                format!("The configuration file {} could not be read: {err}", file_path.display()),
            ),
            LoadError::HclParseFailed(err) => {
                let location = err.location();
                Diagnostic::error(self.to_string(), err.message()).with_subject(subject(
                    location.line(),
                    location.column(),
                    location.offset(),
                ))
            }
            LoadError::JsonParseFailed(err) => Diagnostic::error(self.to_string(), err.to_string())
                .with_subject(subject(err.line(), err.column(), 0)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FileKind {
    Native { is_override: bool },
    Json { is_override: bool },
}

impl FileKind {
    fn is_override(self) -> bool {
        match self {
            FileKind::Native { is_override } | FileKind::Json { is_override } => is_override,
        }
    }

    /// `None` for files that are not configuration files, including editor backups and lock files
    fn of(path: &Path) -> Option<FileKind> {
        let name = path.file_name()?.to_str()?;
        if name.starts_with('.') || name.starts_with('#') || name.ends_with('~') {
            return None;
        }

        let is_override = |stem: &str| stem == "override" || stem.ends_with("_override");
        if let Some(stem) = name.strip_suffix(".tf.json") {
            return Some(FileKind::Json {
                is_override: is_override(stem),
            });
        }
        if let Some(stem) = name.strip_suffix(".tf") {
            return Some(FileKind::Native {
                is_override: is_override(stem),
            });
        }

        None
    }
}

/// Utility macro to create a [Module] from in-memory files
///
/// ```
/// # use tfvars_filter::module;
/// let module = module! {
///   "main.tf" => r#"variable "region" {}"#,
///   "extra.tf.json" => r#"{"variable": {"zone": {}}}"#
/// };
/// assert!(module.declared().contains("zone"));
/// ```
///
/// # Panic
/// Panics on invalid input
///
/// ```should_panic
/// # use tfvars_filter::module;
/// module! { "main.tf" => "variable {}" };
/// ```
#[macro_export]
macro_rules! module {
    { $($path:expr => $contents:expr),+ $(,)? } => {{
        let mut module = $crate::module::Module::default();
        $(
            let path: &str = $path;
            let result = if path.ends_with(".json") {
                module.insert_json($contents, ::std::path::Path::new(path), false)
            } else {
                module.insert_native($contents, ::std::path::Path::new(path), false)
            };
            result.expect("module source must be valid");
        )+
        module
    }};
}

#[cfg(test)]
mod test {
    use super::*;
    use pretty_assertions::assert_eq;

    fn write(dir: &Path, name: &str, contents: &str) {
        std::fs::write(dir.join(name), contents).expect("writable temp dir");
    }

    #[test]
    fn native_variables() {
        let module = module! {
            "main.tf" => r#"
            variable "region" {
              description = "where to deploy"
              default     = "eu-west-1"
            }

            variable "password" {
              sensitive = true
            }

            resource "x" "y" {
              region = var.region
            }

            locals {
              variable = "not a declaration"
            }
            "#
        };

        assert_eq!(
            module.variables().map(|v| v.name.as_str()).collect::<Vec<_>>(),
            vec!["region", "password"]
        );

        let region = module.variable("region").expect("declared");
        assert_eq!(region.description.as_deref(), Some("where to deploy"));
        assert!(!region.required);

        let password = module.variable("password").expect("declared");
        assert!(password.required);
        assert!(password.sensitive);
    }

    #[test]
    fn json_variables() {
        let module = module! {
            "a.tf.json" => r#"{"variable": {"one": {"default": 1}, "two": {"description": "second"}}}"#,
            "b.tf.json" => r#"{"variable": [{"three": {"sensitive": true}}]}"#
        };

        let declared = module.declared();
        assert_eq!(declared.iter().collect::<Vec<_>>(), vec!["one", "two", "three"]);
        assert!(!module.variable("one").expect("declared").required);
        assert!(module.variable("three").expect("declared").sensitive);
    }

    #[test]
    fn invalid_json_variable_property() {
        let mut module = Module::default();
        let diagnostics = module
            .insert_json("{\n  \"variable\": \"nope\"\n}", Path::new("x.tf.json"), false)
            .expect_err("must fail");
        let diagnostic = diagnostics.iter().next().expect("one diagnostic");

        assert_eq!(diagnostic.summary, "Invalid variable declarations");
        let subject = diagnostic.subject.as_ref().expect("positioned");
        assert_eq!((subject.source.as_str(), subject.start.line), ("x.tf.json", 2));
    }

    #[test]
    fn missing_label() {
        let mut module = Module::default();
        let diagnostics = module
            .insert_native("variable \"ok\" {}\n\nvariable {}\n", Path::new("main.tf"), false)
            .expect_err("must fail");

        assert_eq!(diagnostics.len(), 1);
        let diagnostic = diagnostics.iter().next().expect("one diagnostic");
        assert_eq!(diagnostic.summary, "Invalid variable block");
        let subject = diagnostic.subject.as_ref().expect("positioned");
        assert_eq!((subject.source.as_str(), subject.start.line), ("main.tf", 3));
        assert!(module.declared().contains("ok"));
    }

    #[test]
    fn load_directory() {
        let dir = tempfile::tempdir().expect("temp dir");
        write(dir.path(), "variables.tf", "variable \"b\" {}\n");
        write(dir.path(), "extra.tf.json", r#"{"variable": {"a": {}}}"#);
        write(dir.path(), "b_override.tf", "variable \"b\" {\n  default = 1\n}\n");
        write(dir.path(), "terraform.tfvars", "not = valid = hcl");
        write(dir.path(), ".hidden.tf", "broken {");
        write(dir.path(), "backup.tf~", "broken {");
        std::fs::create_dir(dir.path().join("nested.tf")).expect("create dir");

        let module = Module::load(dir.path()).expect("must load");

        // files are loaded in name order
        assert_eq!(
            module.declared().iter().collect::<Vec<_>>(),
            vec!["a", "b"]
        );
        assert!(!module.variable("b").expect("declared").required);
    }

    #[test]
    fn duplicate_declaration() {
        let dir = tempfile::tempdir().expect("temp dir");
        write(dir.path(), "a.tf", "variable \"x\" {}\n");
        write(dir.path(), "b.tf", "variable \"x\" {}\n");

        let diagnostics = Module::load(dir.path()).expect_err("must fail");
        assert_eq!(
            diagnostics.iter().next().map(|d| d.summary.as_str()),
            Some("Duplicate variable declaration")
        );
    }

    #[test]
    fn parse_errors_are_positioned_and_collected() {
        let dir = tempfile::tempdir().expect("temp dir");
        write(dir.path(), "a.tf", "variable \"x\" {\n");
        write(dir.path(), "b.tf.json", "{\n  \"variable\": \n");

        let diagnostics = Module::load(dir.path()).expect_err("must fail");
        assert_eq!(diagnostics.len(), 2);

        let sources: Vec<String> = diagnostics
            .iter()
            .map(|d| d.subject.as_ref().expect("positioned").source.clone())
            .collect();
        assert!(sources[0].ends_with("a.tf"));
        assert!(sources[1].ends_with("b.tf.json"));
    }

    #[test]
    fn override_without_base_declaration() {
        let dir = tempfile::tempdir().expect("temp dir");
        write(dir.path(), "main.tf", "variable \"a\" {}\n");
        write(dir.path(), "override.tf", "variable \"b\" {}\n");

        let diagnostics = Module::load(dir.path()).expect_err("must fail");
        assert_eq!(
            diagnostics.iter().next().map(|d| d.summary.as_str()),
            Some("Missing base variable declaration to override")
        );
    }

    #[test]
    fn missing_directory() {
        let dir = tempfile::tempdir().expect("temp dir");
        let missing = dir.path().join("does-not-exist");

        let diagnostics = Module::load(&missing).expect_err("must fail");
        let diagnostic = diagnostics.iter().next().expect("one diagnostic");

        assert_eq!(diagnostic.summary, "Failed to read module directory");
        assert_eq!(diagnostic.subject, None);
    }

    #[test]
    fn empty_directory() {
        let dir = tempfile::tempdir().expect("temp dir");
        let module = Module::load(dir.path()).expect("must load");
        assert!(module.declared().is_empty());
    }

    #[test]
    fn file_kinds() {
        assert_eq!(
            FileKind::of(Path::new("dir/main.tf")),
            Some(FileKind::Native { is_override: false })
        );
        assert_eq!(
            FileKind::of(Path::new("a_override.tf.json")),
            Some(FileKind::Json { is_override: true })
        );
        assert_eq!(FileKind::of(Path::new("#main.tf#")), None);
        assert_eq!(FileKind::of(Path::new("vars.tfvars")), None);
    }
}
