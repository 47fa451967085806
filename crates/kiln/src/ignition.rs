//! ignition 2.0.0 machine format
//!
//! The machine readable counterpart of [crate::schema]. Inline file contents become `data:` urls.
use crate::schema;
use serde::{Deserialize, Serialize};

pub const VERSION: &str = "2.0.0";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Config {
    pub ignition: Ignition,
    pub storage: Storage,
    pub systemd: Systemd,
    pub networkd: Networkd,
    pub passwd: Passwd,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Ignition {
    pub version: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Storage {
    pub disks: Vec<Disk>,
    pub raid: Vec<Raid>,
    pub filesystems: Vec<Filesystem>,
    pub files: Vec<File>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Disk {
    pub device: String,
    pub wipe_table: bool,
    pub partitions: Vec<Partition>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Partition {
    pub label: String,
    pub number: i64,
    pub size: String,
    pub start: String,
    pub type_guid: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Raid {
    pub name: String,
    pub level: String,
    pub devices: Vec<String>,
    pub spares: i64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Filesystem {
    pub name: String,
    pub mount: Mount,
    pub path: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Mount {
    pub device: String,
    pub format: String,
    pub create: Create,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Create {
    pub force: bool,
    pub options: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct File {
    pub filesystem: String,
    pub path: String,
    pub contents: FileContents,
    pub mode: u32,
    pub user: Id,
    pub group: Id,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct FileContents {
    pub compression: String,
    pub source: String,
    pub verification: Verification,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
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
#[serde(default, rename_all = "camelCase")]
pub struct User {
    pub name: String,
    pub password_hash: String,
    pub ssh_authorized_keys: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Group {
    pub name: String,
    pub gid: Option<u32>,
    pub password_hash: String,
}

/// `data:` url carrying `contents`
pub fn data_url(contents: &str) -> String {
    format!("data:,{}", urlencoding::encode(contents))
}

impl From<&schema::Config> for Config {
    fn from(config: &schema::Config) -> Self {
        Config {
            ignition: Ignition {
                version: VERSION.into(),
            },
            storage: (&config.storage).into(),
            systemd: Systemd {
                units: config
                    .systemd
                    .units
                    .iter()
                    .map(|unit| SystemdUnit {
                        name: unit.name.clone(),
                        enable: unit.enable,
                        mask: unit.mask,
                        contents: unit.contents.clone(),
                        dropins: unit
                            .dropins
                            .iter()
                            .map(|dropin| DropIn {
                                name: dropin.name.clone(),
                                contents: dropin.contents.clone(),
                            })
                            .collect(),
                    })
                    .collect(),
            },
            networkd: Networkd {
                units: config
                    .networkd
                    .units
                    .iter()
                    .map(|unit| NetworkdUnit {
                        name: unit.name.clone(),
                        contents: unit.contents.clone(),
                    })
                    .collect(),
            },
            passwd: Passwd {
                users: config
                    .passwd
                    .users
                    .iter()
                    .map(|user| User {
                        name: user.name.clone(),
                        password_hash: user.password_hash.clone(),
                        ssh_authorized_keys: user.ssh_authorized_keys.clone(),
                    })
                    .collect(),
                groups: config
                    .passwd
                    .groups
                    .iter()
                    .map(|group| Group {
                        name: group.name.clone(),
                        gid: group.gid,
                        password_hash: group.password_hash.clone(),
                    })
                    .collect(),
            },
        }
    }
}

impl From<&schema::Storage> for Storage {
    fn from(storage: &schema::Storage) -> Self {
        Storage {
            disks: storage
                .disks
                .iter()
                .map(|disk| Disk {
                    device: disk.device.clone(),
                    wipe_table: disk.wipe_table,
                    partitions: disk
                        .partitions
                        .iter()
                        .map(|partition| Partition {
                            label: partition.label.clone(),
                            number: partition.number,
                            size: partition.size.clone(),
                            start: partition.start.clone(),
                            type_guid: partition.type_guid.clone(),
                        })
                        .collect(),
                })
                .collect(),
            raid: storage
                .raid
                .iter()
                .map(|raid| Raid {
                    name: raid.name.clone(),
                    level: raid.level.clone(),
                    devices: raid.devices.clone(),
                    spares: raid.spares,
                })
                .collect(),
            filesystems: storage
                .filesystems
                .iter()
                .map(|filesystem| Filesystem {
                    name: filesystem.name.clone(),
                    mount: Mount {
                        device: filesystem.mount.device.clone(),
                        format: filesystem.mount.format.clone(),
                        create: Create {
                            force: filesystem.mount.create.force,
                            options: filesystem.mount.create.options.clone(),
                        },
                    },
                    path: filesystem.path.clone(),
                })
                .collect(),
            files: storage.files.iter().map(File::from).collect(),
        }
    }
}

impl From<&schema::File> for File {
    fn from(file: &schema::File) -> Self {
        // inline contents win over a remote source
        let source = if !file.contents.inline.is_empty() {
            data_url(&file.contents.inline)
        } else {
            file.contents.remote.url.clone()
        };

        File {
            filesystem: file.filesystem.clone(),
            path: file.path.clone(),
            contents: FileContents {
                compression: file.contents.remote.compression.clone(),
                source,
                verification: Verification {
                    hash: file.contents.remote.verification.hash.clone(),
                },
            },
            mode: file.mode,
            user: Id { id: file.user.id },
            group: Id { id: file.group.id },
        }
    }
}
