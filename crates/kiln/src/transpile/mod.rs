//! ignition to cloud-config
//!
//! cloud-config covers only a subset of ignition. Everything that cannot be expressed is dropped and leaves a
//! warning in the [Report].
use crate::ignition;
use crate::report::{Entry, Report};
use serde::{Deserialize, Serialize};

mod storage;
mod systemd;

pub use storage::{decode_data_url, DataUrlError};

/// Header line cloud-init expects in front of the yaml
pub const HEADER: &str = "#cloud-config";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CloudConfig {
    pub write_files: Vec<WriteFile>,
    pub coreos: CoreOs,
    pub users: Vec<User>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WriteFile {
    pub path: String,
    pub content: String,
    pub owner: String,
    pub permissions: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CoreOs {
    pub units: Vec<Unit>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Unit {
    pub name: String,
    pub enable: bool,
    pub mask: bool,
    pub runtime: bool,
    pub content: String,
    pub drop_ins: Vec<UnitDropIn>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct UnitDropIn {
    pub name: String,
    pub content: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct User {
    pub name: String,
    pub passwd: String,
    pub ssh_authorized_keys: Vec<String>,
}

pub fn transpile(config: &ignition::Config) -> (CloudConfig, Report) {
    let mut transpiler = Transpiler::default();

    transpiler.storage(&config.storage);
    transpiler.systemd(&config.systemd);
    transpiler.networkd(&config.networkd);
    transpiler.passwd(&config.passwd);

    tracing::debug!(
        files = transpiler.cloud_config.write_files.len(),
        units = transpiler.cloud_config.coreos.units.len(),
        warnings = transpiler.report.entries.len(),
        "transpiled to cloud-config"
    );
    (transpiler.cloud_config, transpiler.report)
}

#[derive(Debug, Default)]
struct Transpiler {
    cloud_config: CloudConfig,
    report: Report,
}

impl Transpiler {
    fn unsupported(&mut self, key: &str) {
        self.report.add(Entry::warning(format!(
            "{key} is not supported in cloud-config"
        )));
    }

    fn ignored_entry(&mut self, key: &str, reason: Option<&str>) {
        let message = match reason {
            Some(reason) => format!("ignored {key}, not supported in cloud-config, {reason}"),
            None => format!("ignored {key}, not supported in cloud-config"),
        };
        self.report.add(Entry::warning(message));
    }

    fn passwd(&mut self, passwd: &ignition::Passwd) {
        if !passwd.groups.is_empty() {
            self.unsupported("passwd.groups");
        }

        self.cloud_config
            .users
            .extend(passwd.users.iter().map(|user| User {
                name: user.name.clone(),
                passwd: user.password_hash.clone(),
                ssh_authorized_keys: user.ssh_authorized_keys.clone(),
            }));
    }
}
