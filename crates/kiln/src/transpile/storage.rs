use super::{Transpiler, WriteFile};
use crate::ignition;
use base64::Engine;

impl Transpiler {
    pub(super) fn storage(&mut self, storage: &ignition::Storage) {
        if !storage.raid.is_empty() {
            self.unsupported("storage.raid");
        }
        if !storage.disks.is_empty() {
            self.unsupported("storage.disks");
        }
        if !storage.filesystems.is_empty() {
            self.unsupported("storage.filesystems");
        }

        for (index, file) in storage.files.iter().enumerate() {
            self.storage_file(index, file);
        }
    }

    fn storage_file(&mut self, index: usize, file: &ignition::File) {
        let key = format!("storage.files[{index}]");

        let content = match scheme(&file.contents.source) {
            None => String::new(),
            Some("data") => match decode_data_url(&file.contents.source) {
                Ok(content) => content,
                Err(err) => {
                    self.ignored_entry(&key, Some(&err.to_string()));
                    return;
                }
            },
            Some(_) => {
                self.ignored_entry(&key, Some("only 'data' source are supported"));
                return;
            }
        };

        let owner = match (file.user.id, file.group.id) {
            (0, _) => String::new(),
            (user, 0) => user.to_string(),
            (user, group) => format!("{user}:{group}"),
        };

        self.cloud_config.write_files.push(WriteFile {
            path: file.path.clone(),
            content,
            owner,
            permissions: permissions(file.mode),
        });
    }
}

/// Octal file mode with a leading zero
fn permissions(mode: u32) -> String {
    match mode {
        0 => "0".into(),
        mode => format!("0{mode:o}"),
    }
}

/// Url scheme, `None` for an empty source
fn scheme(source: &str) -> Option<&str> {
    if source.is_empty() {
        return None;
    }

    match source.split_once(':') {
        Some((scheme, _))
            if !scheme.is_empty()
                && scheme
                    .chars()
                    .all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.')) =>
        {
            Some(scheme)
        }
        _ => Some(""),
    }
}

#[derive(thiserror::Error, Debug, PartialEq)]
pub enum DataUrlError {
    #[error("not a data url")]
    Scheme,
    #[error("data url without ',' separator")]
    Separator,
    #[error("invalid base64 payload")]
    Base64,
    #[error("payload is not valid utf-8")]
    Utf8,
}

/// Decode `data:[<mediatype>][;base64],<data>`
pub fn decode_data_url(url: &str) -> Result<String, DataUrlError> {
    let rest = url.strip_prefix("data:").ok_or(DataUrlError::Scheme)?;
    let (media_type, data) = rest.split_once(',').ok_or(DataUrlError::Separator)?;

    let bytes = if media_type.ends_with(";base64") {
        let data = urlencoding::decode_binary(data.as_bytes());
        base64::engine::general_purpose::STANDARD
            .decode(data.as_ref())
            .map_err(|_| DataUrlError::Base64)?
    } else {
        urlencoding::decode_binary(data.as_bytes()).into_owned()
    };

    String::from_utf8(bytes).map_err(|_| DataUrlError::Utf8)
}
