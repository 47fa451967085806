//! documents and how they are loaded
//!
//! A document file is a template (see [crate::template]) that renders to yaml:
//!
//! ```yaml
//! import:                   # or `include`, files relative to this document
//!   base.yaml:              # no parameters
//!   units/app.yaml:
//!     name: web             # parameters for units/app.yaml only
//! output: web.ign           # where the renderer writes to
//! type: ignition            # what the renderer writes
//!
//! systemd:                  # everything else is the provisioning payload
//!   units:
//!     - name: foo.service
//! ```
use crate::cancel::Cancellation;
use crate::error::{Error, ParseError, Result};
use crate::fs::{clean, FileSystem};
use crate::schema::Config;
use crate::template::{self, Parameters, TemplateError};
use crate::value::{Object, Value};
use std::io::Read;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Imported files, in declaration order, and the parameters bound to each
pub type Imports = indexmap::IndexMap<String, Parameters>;

#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    /// Provisioning payload, always an object
    pub config: Value,
    pub imports: Imports,
    pub output: Option<String>,
    /// Output format, see [crate::render::Format]
    pub kind: Option<String>,

    path: Option<PathBuf>,
    dir: PathBuf,
}

impl Default for Document {
    fn default() -> Self {
        Self {
            config: Value::object(),
            imports: Default::default(),
            output: None,
            kind: None,
            path: None,
            dir: PathBuf::new(),
        }
    }
}

impl Document {
    /// Parse rendered document text. `path` is where the document came from, imports are relative to its directory.
    pub fn parse(text: &str, path: Option<&Path>) -> Result<Self, ParseError> {
        let value: Value = if text.trim().is_empty() {
            Value::Null
        } else {
            serde_yaml::from_str(text).map_err(ParseError::Yaml)?
        };

        let mut object = match value {
            Value::Object(object) => object,
            Value::Null => Object::new(),
            _ => {
                return Err(ParseError::Structure(
                    "top level must be a mapping".into(),
                ))
            }
        };

        let mut imports = Imports::new();
        for key in ["import", "include"] {
            if let Some(value) = object.shift_remove(key) {
                parse_imports(key, value, &mut imports)?;
            }
        }

        let output = take_string(&mut object, "output")?;
        let kind = take_string(&mut object, "type")?;

        let config = Value::Object(object);
        Config::from_value(&config).map_err(ParseError::Schema)?;

        let path = path.map(clean);
        let dir = path
            .as_deref()
            .and_then(Path::parent)
            .map(Path::to_path_buf)
            .unwrap_or_default();

        Ok(Self {
            config,
            imports,
            output,
            kind,
            path,
            dir,
        })
    }

    /// Source file, if loaded from one
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Directory imports are resolved against
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn display_path(&self) -> std::path::Display<'_> {
        self.path.as_deref().unwrap_or(Path::new("<inline>")).display()
    }

    /// Merge an imported document into this one
    ///
    /// Only the payload is merged. `output`, `type` and imports of `child` are dropped.
    pub fn append(&mut self, child: Document) {
        tracing::debug!(parent = %self.display_path(), child = %child.display_path(), "merging document");
        self.config.merge(child.config);
    }

    /// Typed view of the payload
    pub fn schema(&self) -> Result<Config> {
        Config::from_value(&self.config).map_err(|source| Error::Parse {
            path: self.path.clone().unwrap_or_default(),
            source: ParseError::Schema(source),
        })
    }
}

fn parse_imports(key: &str, value: Value, imports: &mut Imports) -> Result<(), ParseError> {
    let entries = match value {
        Value::Null => return Ok(()),
        Value::Object(entries) => entries,
        _ => {
            return Err(ParseError::Structure(format!(
                "`{key}` must be a mapping of file to parameters"
            )))
        }
    };

    for (file, parameters) in entries {
        let parameters = match parameters {
            Value::Null => Parameters::new(),
            Value::Object(parameters) => parameters
                .into_iter()
                .map(|(name, value)| {
                    let value = parameter(&file, &name, value)?;
                    Ok((name, value))
                })
                .collect::<Result<_, ParseError>>()?,
            _ => {
                return Err(ParseError::Structure(format!(
                    "parameters of {file:?} must be a mapping"
                )))
            }
        };

        imports.insert(file, parameters);
    }

    Ok(())
}

/// Textual form of a scalar parameter
fn parameter(file: &str, name: &str, value: Value) -> Result<String, ParseError> {
    match value {
        Value::Null => Ok(String::new()),
        Value::Boolean(value) => Ok(value.to_string()),
        Value::Integer(value) => Ok(value.to_string()),
        Value::Decimal(value) => Ok(value.to_string()),
        Value::String(value) => Ok(value),
        Value::Array(_) | Value::Object(_) => Err(ParseError::Structure(format!(
            "parameter {name:?} of {file:?} must be a scalar"
        ))),
    }
}

fn take_string(object: &mut Object, key: &str) -> Result<Option<String>, ParseError> {
    match object.shift_remove(key) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(value)) if value.is_empty() => Ok(None),
        Some(Value::String(value)) => Ok(Some(value)),
        Some(_) => Err(ParseError::Structure(format!("`{key}` must be a string"))),
    }
}

/// Path of a `file://` url, relative to the document directory
///
/// `file:///a/b` and `file://host/a/b` both yield `a/b`
fn local_path(url: &str) -> Option<Result<PathBuf, ParseError>> {
    let rest = url.strip_prefix("file://")?;
    let rest = rest.split(['?', '#']).next().unwrap_or_default();
    let path = rest.find('/').map(|start| &rest[start + 1..]).unwrap_or_default();

    if path.is_empty() {
        return Some(Err(ParseError::Structure(format!(
            "local file url {url:?} has no path"
        ))));
    }

    Some(
        urlencoding::decode(path)
            .map(|path| PathBuf::from(path.into_owned()))
            .map_err(|_| ParseError::Structure(format!("local file url {url:?} is not utf-8"))),
    )
}

/// Loads documents through a [FileSystem]
#[derive(Debug, Clone, derive_new::new)]
pub struct Loader {
    fs: Arc<dyn FileSystem>,
    #[new(default)]
    cancellation: Cancellation,
}

impl Loader {
    pub fn with_cancellation(mut self, cancellation: Cancellation) -> Self {
        self.cancellation = cancellation;
        self
    }

    pub fn fs(&self) -> &dyn FileSystem {
        self.fs.as_ref()
    }

    pub fn cancellation(&self) -> &Cancellation {
        &self.cancellation
    }

    /// Load a single document, imports stay unresolved
    pub fn load(&self, path: &Path, parameters: &Parameters) -> Result<Document> {
        self.cancellation.check()?;

        let path = clean(path);
        tracing::info!(path = %path.display(), "loading file");

        let reader = self.fs.open(&path).map_err(|e| Error::io(&path, e))?;
        self.load_from_reader(reader, &path, parameters)
    }

    /// Load a document from an already opened source
    pub fn load_from_reader(
        &self,
        mut reader: impl Read,
        path: &Path,
        parameters: &Parameters,
    ) -> Result<Document> {
        self.cancellation.check()?;

        let mut raw = Vec::new();
        reader
            .read_to_end(&mut raw)
            .map_err(|e| Error::io(path, e))?;

        let text = String::from_utf8(raw).map_err(|e| Error::Parse {
            path: path.to_path_buf(),
            source: e.into(),
        })?;

        let text = template::render(&text, parameters).map_err(|source| match source {
            TemplateError::MissingParameter { name } => Error::MissingParameter {
                path: path.to_path_buf(),
                name,
            },
            source => Error::Template {
                path: path.to_path_buf(),
                source,
            },
        })?;

        let mut document = Document::parse(&text, Some(path)).map_err(|source| Error::Parse {
            path: path.to_path_buf(),
            source,
        })?;

        self.inline_local_files(&mut document)?;
        Ok(document)
    }

    /// Replace `file://` contents of `storage.files` by the referenced file
    fn inline_local_files(&self, document: &mut Document) -> Result<()> {
        let Some(files) = document
            .config
            .pointer_mut(&["storage", "files"])
            .and_then(Value::as_array_mut)
        else {
            return Ok(());
        };

        for (index, file) in files.iter_mut().enumerate() {
            let Some(url) = file
                .pointer(&["contents", "remote", "url"])
                .and_then(Value::as_str)
            else {
                continue;
            };

            let Some(local) = local_path(url) else {
                continue;
            };

            let local = local.map_err(|source| Error::Parse {
                path: document.path.clone().unwrap_or_default(),
                source,
            })?;
            let path = self.fs.join(&document.dir, &local);

            tracing::debug!(index, path = %path.display(), "inlining local file");
            let contents = self.read_to_string(&path)?;

            if let Some(contents_object) = file
                .pointer_mut(&["contents"])
                .and_then(Value::as_object_mut)
            {
                contents_object.insert("inline".into(), contents.into());
            }
            if let Some(url) = file.pointer_mut(&["contents", "remote", "url"]) {
                *url = Value::String(String::new());
            }
        }

        Ok(())
    }

    fn read_to_string(&self, path: &Path) -> Result<String> {
        self.cancellation.check()?;

        let mut raw = Vec::new();
        self.fs
            .open(path)
            .and_then(|mut reader| reader.read_to_end(&mut raw))
            .map_err(|e| Error::io(path, e))?;

        String::from_utf8(raw).map_err(|e| Error::Parse {
            path: path.to_path_buf(),
            source: e.into(),
        })
    }
}
