//! output rendering
//!
//! A resolved [Document] is emitted in the format named by its `type`:
//!
//! | `type`         | output                                        |
//! |----------------|-----------------------------------------------|
//! | `cloud-config` | `#cloud-config` yaml, see [crate::transpile] |
//! | `ignition`     | ignition 2.0.0 json, see [crate::ignition]   |
//! | anything else  | yaml in the native format                     |
//!
//! Validation runs first. Zero fields are stripped from every output.
use crate::document::Document;
use crate::error::{Error, ParseError, Result};
use crate::fs::{clean, relative, FileSystem};
use crate::ignition;
use crate::normalize::normalize;
use crate::report::Report;
use crate::transpile::{self, transpile};
use crate::validate::validate;
use crate::value;
use serde::Serialize;
use std::io::Write;
use std::path::{Component, Path};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    Native,
    Ignition,
    CloudConfig,
}

impl Format {
    pub fn from_kind(kind: Option<&str>) -> Self {
        match kind {
            Some("cloud-config") => Format::CloudConfig,
            Some("ignition") => Format::Ignition,
            _ => Format::Native,
        }
    }
}

#[derive(Debug)]
pub struct Rendered {
    pub format: Format,
    pub bytes: Vec<u8>,
    /// Non fatal findings
    pub report: Report,
}

#[derive(thiserror::Error, Debug)]
#[error("unable to render {path}")]
pub struct RenderError {
    pub path: String,
    /// Everything found up to the failure
    pub report: Report,
    #[source]
    pub source: Error,
}

pub fn render(document: &Document) -> Result<Rendered, RenderError> {
    let format = Format::from_kind(document.kind.as_deref());
    tracing::info!(document = %document.display_path(), ?format, "rendering");

    let mut report = Report::default();
    match render_format(document, format, &mut report) {
        Ok(bytes) => Ok(Rendered {
            format,
            bytes,
            report,
        }),
        Err(source) => Err(RenderError {
            path: document.display_path().to_string(),
            report,
            source,
        }),
    }
}

fn render_format(document: &Document, format: Format, report: &mut Report) -> Result<Vec<u8>> {
    let config = document.schema()?;

    report.merge(validate(&config));
    if report.is_fatal() {
        return Err(Error::Validation {
            report: report.clone(),
        });
    }

    match format {
        Format::Native => yaml(&config),
        Format::Ignition => json(&ignition::Config::from(&config)),
        Format::CloudConfig => {
            // cloud-config is derived from what an ignition consumer would read
            let machine = serde_json::to_vec(&ignition::Config::from(&config))?;
            let machine: ignition::Config = serde_json::from_slice(&machine)?;

            let (cloud_config, findings) = transpile(&machine);
            report.merge(findings);

            let mut bytes = format!("{}\n", transpile::HEADER).into_bytes();
            bytes.extend(yaml(&cloud_config)?);
            Ok(bytes)
        }
    }
}

fn yaml<T: Serialize>(structure: &T) -> Result<Vec<u8>> {
    let value = normalize(value::to_value(structure)?);
    Ok(serde_yaml::to_string(&value)?.into_bytes())
}

fn json<T: Serialize>(structure: &T) -> Result<Vec<u8>> {
    let value = normalize(value::to_value(structure)?);
    let mut bytes = serde_json::to_vec_pretty(&value)?;
    bytes.push(b'\n');
    Ok(bytes)
}

/// Render `document` and write it to `output` below `dir`
///
/// Documents without `output` are skipped, the returned report is empty then. An absolute `output` is taken
/// relative to `dir`, one leaving `dir` through `..` is rejected.
pub fn save_to(document: &Document, fs: &dyn FileSystem, dir: &Path) -> Result<Report, RenderError> {
    let Some(output) = document.output.as_deref() else {
        tracing::debug!(document = %document.display_path(), "no output, skipped");
        return Ok(Report::default());
    };

    let target = clean(&relative(Path::new(output)));
    if matches!(target.components().next(), None | Some(Component::ParentDir)) {
        return Err(RenderError {
            path: document.display_path().to_string(),
            report: Report::default(),
            source: Error::Parse {
                path: document.path().map(Path::to_path_buf).unwrap_or_default(),
                source: ParseError::Structure(format!(
                    "output {output:?} is outside of the output directory"
                )),
            },
        });
    }

    let rendered = render(document)?;
    let path = fs.join(dir, &target);

    let written = fs
        .create(&path)
        .and_then(|mut file| file.write_all(&rendered.bytes).and_then(|_| file.flush()));
    if let Err(err) = written {
        return Err(RenderError {
            path: document.display_path().to_string(),
            report: rendered.report,
            source: Error::io(path, err),
        });
    }

    tracing::info!(document = %document.display_path(), output = %path.display(), "saved");
    Ok(rendered.report)
}

impl Document {
    pub fn render(&self) -> Result<Rendered, RenderError> {
        render(self)
    }

    pub fn save_to(&self, fs: &dyn FileSystem, dir: &Path) -> Result<Report, RenderError> {
        save_to(self, fs, dir)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::fs::MemoryFs;
    use crate::report::EntryKind;
    use crate::transpile::CloudConfig;
    use pretty_assertions::assert_eq;

    fn document(text: &str) -> Document {
        Document::parse(text, Some(Path::new("root.yaml"))).unwrap()
    }

    const PAYLOAD: &str = r#"
storage:
  files:
    - path: /etc/hostname
      mode: 420
      contents:
        inline: node-1
systemd:
  units:
    - name: a.service
      enable: true
      mask: false
"#;

    #[test]
    fn native() {
        let rendered = document(PAYLOAD).render().unwrap();
        assert_eq!(rendered.format, Format::Native);

        let text = String::from_utf8(rendered.bytes).unwrap();
        insta::assert_snapshot!(text.trim_end(), @r###"
        storage:
          files:
          - path: /etc/hostname
            contents:
              inline: node-1
            mode: 420
        systemd:
          units:
          - name: a.service
            enable: true
        "###);

        assert_eq!(rendered.report.entries.len(), 1);
        assert_eq!(rendered.report.entries[0].kind, EntryKind::Warning);
    }

    #[test]
    fn ignition() {
        let rendered = document(&format!("type: ignition\n{PAYLOAD}")).render().unwrap();
        assert_eq!(rendered.format, Format::Ignition);

        let json: serde_json::Value = serde_json::from_slice(&rendered.bytes).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "ignition": {"version": "2.0.0"},
                "storage": {"files": [{
                    "path": "/etc/hostname",
                    "contents": {"source": "data:,node-1"},
                    "mode": 420,
                }]},
                "systemd": {"units": [{"name": "a.service", "enable": true}]},
            })
        );
    }

    #[test]
    fn cloud_config() {
        let text = format!("type: cloud-config\n{PAYLOAD}").replace(
            "storage:\n",
            "storage:\n  disks:\n    - device: /dev/sda\n",
        );
        let rendered = document(&text).render().unwrap();
        assert_eq!(rendered.format, Format::CloudConfig);

        let text = String::from_utf8(rendered.bytes).unwrap();
        let body = text.strip_prefix("#cloud-config\n").unwrap();
        let cloud_config: CloudConfig = serde_yaml::from_str(body).unwrap();

        assert_eq!(cloud_config.write_files[0].content, "node-1");
        assert_eq!(cloud_config.write_files[0].permissions, "0644");
        assert!(cloud_config.coreos.units[0].runtime);
        assert!(!body.contains("owner"));

        let messages: Vec<_> = rendered
            .report
            .entries
            .iter()
            .map(|entry| entry.message.as_str())
            .collect();
        assert!(messages.contains(&"storage.disks is not supported in cloud-config"));
    }

    #[test]
    fn fatal_report_aborts() {
        let err = document("systemd: {units: [{name: a.service, contents: '[Unit'}]}")
            .render()
            .unwrap_err();

        assert!(err.report.is_fatal());
        assert!(matches!(err.source, Error::Validation { .. }));
        assert_eq!(err.path, "root.yaml");
    }

    #[test]
    fn unknown_type_is_native() {
        assert_eq!(Format::from_kind(Some("fuze")), Format::Native);
        assert_eq!(Format::from_kind(None), Format::Native);
    }

    #[test]
    fn save_only_with_output() {
        let fs = MemoryFs::new();

        let report = document(PAYLOAD).save_to(&fs, Path::new("out")).unwrap();
        assert!(report.is_empty());
        assert_eq!(fs.get("out/node.yaml"), None);

        document(&format!("output: node.yaml\n{PAYLOAD}"))
            .save_to(&fs, Path::new("out"))
            .unwrap();
        let written = String::from_utf8(fs.get("out/node.yaml").unwrap()).unwrap();
        assert!(written.starts_with("storage:\n"));
    }

    #[test]
    fn absolute_output_stays_below_dir() {
        let fs = MemoryFs::new();

        document(&format!("output: /etc/node.yaml\n{PAYLOAD}"))
            .save_to(&fs, Path::new("out"))
            .unwrap();

        assert!(fs.get("out/etc/node.yaml").is_some());
        assert_eq!(fs.get("/etc/node.yaml"), None);
    }

    #[test]
    fn output_outside_dir_is_rejected() {
        let fs = MemoryFs::new();

        for output in ["../../escaped.yaml", "a/../../escaped.yaml", ".."] {
            let err = document(&format!("output: {output}\n{PAYLOAD}"))
                .save_to(&fs, Path::new("out"))
                .unwrap_err();

            assert!(
                matches!(err.source, Error::Parse { source: ParseError::Structure(_), .. }),
                "{output}"
            );
        }
        assert_eq!(fs.get("../escaped.yaml"), None);
        assert_eq!(fs.get("escaped.yaml"), None);
    }
}
