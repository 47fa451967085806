//! include graph resolution
//!
//! Imports are resolved depth-first in declaration order. Each imported file is loaded with the parameters bound by
//! its importer, resolved itself, and then merged into the importer (see [crate::value::Value::merge]).
//!
//! Cycles are detected per branch with a [PathStack]: a file may be imported from two unrelated branches (and is then
//! merged twice) but never by one of its own ancestors.
use crate::document::{Document, Loader};
use crate::error::{Error, PathStack, Result};
use crate::template::Parameters;
use std::path::Path;

#[derive(Debug, Clone, derive_new::new)]
pub struct Resolver {
    loader: Loader,
}

impl Resolver {
    pub fn loader(&self) -> &Loader {
        &self.loader
    }

    /// Load the document at `path` and resolve all of its imports
    pub fn open(&self, path: &Path, parameters: &Parameters) -> Result<Document> {
        let document = self.loader.load(path, parameters)?;
        self.resolve_root(document)
    }

    /// Resolve a root document. The document's own path, if any, is the bottom of the stack.
    pub fn resolve_root(&self, document: Document) -> Result<Document> {
        let stack = match document.path() {
            Some(path) => PathStack::new().with(path),
            None => PathStack::new(),
        };

        self.resolve(document, &stack)
    }

    /// Resolve all imports of `document`, `stack` holds the files being resolved on this branch
    #[tracing::instrument(level = "debug", skip_all, fields(document = %document.display_path(), depth = stack.len()))]
    pub fn resolve(&self, mut document: Document, stack: &PathStack) -> Result<Document> {
        let imports = std::mem::take(&mut document.imports);

        for (import, parameters) in &imports {
            self.loader.cancellation().check()?;

            let full_path = self.loader.fs().join(document.dir(), Path::new(import));
            if stack.contains(&full_path) {
                tracing::debug!(path = %full_path.display(), %stack, "circular dependency");
                return Err(Error::CircularDependency {
                    stack: stack.clone(),
                    path: full_path,
                });
            }

            let child = self.loader.load(&full_path, parameters)?;
            let child = self.resolve(child, &stack.with(&full_path))?;

            document.append(child);
        }

        document.imports = imports;
        Ok(document)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::cancel::Cancellation;
    use crate::fs::MemoryFs;
    use crate::value::Value;
    use pretty_assertions::assert_eq;
    use std::path::PathBuf;
    use std::sync::Arc;

    fn resolver(files: &[(&str, &str)]) -> Resolver {
        let fs = MemoryFs::new();
        for (path, contents) in files {
            fs.insert(path, *contents);
        }

        Resolver::new(Loader::new(Arc::new(fs)))
    }

    fn unit_names(document: &Document) -> Vec<String> {
        let Some(Value::Array(units)) = document.config.pointer(&["systemd", "units"]) else {
            return vec![];
        };

        units
            .iter()
            .filter_map(|unit| unit.pointer(&["name"]).and_then(Value::as_str))
            .map(str::to_string)
            .collect()
    }

    #[test]
    fn later_scalar_wins_arrays_concatenate() {
        let resolver = resolver(&[
            (
                "root.yaml",
                "import:\n  a.yaml:\n  b.yaml:\nsystemd:\n  units:\n    - name: root\n",
            ),
            (
                "a.yaml",
                "foo: a\nstorage:\n  files:\n    - path: /a\n      mode: 420\nsystemd:\n  units:\n    - name: a\n",
            ),
            (
                "b.yaml",
                "foo: b\nstorage:\n  files:\n    - path: /b\nsystemd:\n  units:\n    - name: b\n",
            ),
        ]);

        let document = resolver
            .open(Path::new("root.yaml"), &Parameters::new())
            .unwrap();

        assert_eq!(unit_names(&document), ["root", "a", "b"]);
        assert_eq!(document.config.pointer(&["foo"]), Some(&Value::from("b")));
        assert_eq!(
            document.config.pointer(&["storage", "files"]),
            Some(&serde_yaml::from_str::<Value>("[{path: /a, mode: 420}, {path: /b}]").unwrap())
        );
    }

    #[test]
    fn imports_are_relative_to_the_importer() {
        let resolver = resolver(&[
            ("root.yaml", "import:\n  sub/a.yaml:\n"),
            ("sub/a.yaml", "import:\n  ../b.yaml:\n  c.yaml:\n"),
            ("b.yaml", "systemd: {units: [{name: b}]}"),
            ("sub/c.yaml", "systemd: {units: [{name: c}]}"),
        ]);

        let document = resolver
            .open(Path::new("root.yaml"), &Parameters::new())
            .unwrap();
        assert_eq!(unit_names(&document), ["b", "c"]);
    }

    #[test]
    fn absolute_imports_are_relative_to_the_importer() {
        let resolver = resolver(&[
            ("conf/root.yaml", "import:\n  /lib/a.yaml:\n"),
            ("conf/lib/a.yaml", "systemd: {units: [{name: joined}]}"),
            ("/lib/a.yaml", "systemd: {units: [{name: absolute}]}"),
        ]);

        let document = resolver
            .open(Path::new("conf/root.yaml"), &Parameters::new())
            .unwrap();
        assert_eq!(unit_names(&document), ["joined"]);
    }

    #[test]
    fn parameters_are_not_inherited() {
        let resolver = resolver(&[
            ("root.yaml", "import:\n  a.yaml:\n    name: a\n"),
            ("a.yaml", "import:\n  b.yaml:\nsystemd: {units: [{name: '{{ .name }}'}]}"),
            ("b.yaml", "systemd: {units: [{name: '{{ .name }}'}]}"),
        ]);

        let err = resolver
            .open(Path::new("root.yaml"), &Parameters::new())
            .unwrap_err();
        assert!(
            matches!(err, Error::MissingParameter { path, name } if path == Path::new("b.yaml") && name == "name")
        );
    }

    #[test]
    fn self_import() {
        let resolver = resolver(&[("a.yaml", "import:\n  ./a.yaml:\n")]);

        let err = resolver
            .open(Path::new("a.yaml"), &Parameters::new())
            .unwrap_err();
        assert_eq!(err.cycle().unwrap(), vec![PathBuf::from("a.yaml"); 2]);
    }

    #[test]
    fn cycle_deep_in_the_tree() {
        let resolver = resolver(&[
            ("root.yaml", "import:\n  a.yaml:\n"),
            ("a.yaml", "import:\n  b.yaml:\n"),
            ("b.yaml", "import:\n  c.yaml:\n"),
            ("c.yaml", "import:\n  a.yaml:\n"),
        ]);

        let err = resolver
            .open(Path::new("root.yaml"), &Parameters::new())
            .unwrap_err();
        assert_eq!(
            err.cycle().unwrap(),
            ["root.yaml", "a.yaml", "b.yaml", "c.yaml", "a.yaml"].map(PathBuf::from)
        );
    }

    #[test]
    fn inline_root_starts_with_empty_stack() {
        let resolver = resolver(&[("a.yaml", "systemd: {units: [{name: a}]}")]);
        let root = Document::parse("import:\n  a.yaml:\n  ./a.yaml:\n", None).unwrap();

        let document = resolver.resolve(root, &PathStack::new()).unwrap();
        assert_eq!(unit_names(&document), ["a", "a"]);
        assert_eq!(document.imports.len(), 2);
    }

    #[test]
    fn stops_when_cancelled() {
        let cancellation = Cancellation::new();
        let resolver = Resolver::new(
            resolver(&[("root.yaml", "import:\n  a.yaml:\n"), ("a.yaml", "")])
                .loader()
                .clone()
                .with_cancellation(cancellation.clone()),
        );

        let root = resolver
            .loader()
            .load(Path::new("root.yaml"), &Parameters::new())
            .unwrap();
        cancellation.cancel();

        assert!(matches!(
            resolver.resolve_root(root),
            Err(Error::Cancelled)
        ));
    }
}
