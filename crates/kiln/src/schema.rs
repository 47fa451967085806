//! typed provisioning payload
//!
//! The human editable format of documents. Every field is optional, unknown fields are ignored. Serializing
//! yields every field, [crate::normalize] strips the ones that were never set.
use crate::normalize::normalize;
use crate::value::{self, Value};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub storage: Storage,
    pub systemd: Systemd,
    pub networkd: Networkd,
    pub passwd: Passwd,
}

impl Config {
    /// Interpret a payload
    ///
    /// Zero entries are pruned first, a section written as `systemd:` is null and would not fit [Systemd].
    pub fn from_value(payload: &Value) -> Result<Self, serde_yaml::Error> {
        match normalize(payload.clone()) {
            Value::Null => Ok(Self::default()),
            payload => value::from_value(&payload),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Storage {
    pub disks: Vec<Disk>,
    pub raid: Vec<Raid>,
    pub filesystems: Vec<Filesystem>,
    pub files: Vec<File>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Disk {
    pub device: String,
    pub wipe_table: bool,
    pub partitions: Vec<Partition>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Partition {
    pub label: String,
    pub number: i64,
    pub size: String,
    pub start: String,
    pub type_guid: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Raid {
    pub name: String,
    pub level: String,
    pub devices: Vec<String>,
    pub spares: i64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Filesystem {
    pub name: String,
    pub mount: Mount,
    pub path: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Mount {
    pub device: String,
    pub format: String,
    pub create: Create,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Create {
    pub force: bool,
    pub options: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct File {
    pub filesystem: String,
    pub path: String,
    pub contents: FileContents,
    pub mode: u32,
    pub user: Id,
    pub group: Id,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileContents {
    pub inline: String,
    pub remote: Remote,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Remote {
    pub url: String,
    pub compression: String,
    pub verification: Verification,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Verification {
    pub hash: String,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Id {
    pub id: u32,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Systemd {
    pub units: Vec<SystemdUnit>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SystemdUnit {
    pub name: String,
    pub enable: bool,
    pub mask: bool,
    pub contents: String,
    pub dropins: Vec<DropIn>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DropIn {
    pub name: String,
    pub contents: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Networkd {
    pub units: Vec<NetworkdUnit>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NetworkdUnit {
    pub name: String,
    pub contents: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Passwd {
    pub users: Vec<User>,
    pub groups: Vec<Group>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct User {
    pub name: String,
    pub password_hash: String,
    pub ssh_authorized_keys: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Group {
    pub name: String,
    pub gid: Option<u32>,
    pub password_hash: String,
}

#[cfg(test)]
mod test {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn unmarshal() {
        let payload: Value = serde_yaml::from_str(
            r#"
systemd:
  units:
    - name: installer.service
      enable: true
      contents: |
        [Unit]
        Requires=network-online.target
        [Service]
        ExecStart=/opt/installer
storage:
  files:
    - path: /etc/hostname
      mode: 420
      contents:
        inline: node-1
unknown_section: ignored
"#,
        )
        .unwrap();

        let config = Config::from_value(&payload).unwrap();
        assert_eq!(config.systemd.units.len(), 1);
        assert!(config.systemd.units[0].enable);
        assert!(config.systemd.units[0].contents.starts_with("[Unit]\n"));
        assert_eq!(config.storage.files[0].contents.inline, "node-1");
        assert_eq!(config.storage.files[0].mode, 420);
    }

    #[test]
    fn null_payload_is_empty() {
        assert_eq!(Config::from_value(&Value::Null).unwrap(), Config::default());
    }

    #[test]
    fn empty_sections() {
        let payload: Value = serde_yaml::from_str("systemd:\nstorage: {files: ~}").unwrap();
        assert_eq!(Config::from_value(&payload).unwrap(), Config::default());
    }

    #[test]
    fn wrong_shape_is_an_error() {
        let payload: Value = serde_yaml::from_str("systemd: {units: not-a-list}").unwrap();
        assert!(Config::from_value(&payload).is_err());
    }
}
