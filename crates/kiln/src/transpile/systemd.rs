use super::{Transpiler, Unit, UnitDropIn};
use crate::ignition;

impl Transpiler {
    pub(super) fn systemd(&mut self, systemd: &ignition::Systemd) {
        for unit in &systemd.units {
            self.cloud_config.coreos.units.push(Unit {
                name: unit.name.clone(),
                enable: unit.enable,
                mask: unit.mask,
                runtime: true,
                content: unit.contents.clone(),
                drop_ins: unit
                    .dropins
                    .iter()
                    .map(|dropin| UnitDropIn {
                        name: dropin.name.clone(),
                        content: dropin.contents.clone(),
                    })
                    .collect(),
            });
        }
    }

    // networkd units are plain units to coreos-cloudinit
    pub(super) fn networkd(&mut self, networkd: &ignition::Networkd) {
        for unit in &networkd.units {
            self.cloud_config.coreos.units.push(Unit {
                name: unit.name.clone(),
                runtime: true,
                content: unit.contents.clone(),
                ..Default::default()
            });
        }
    }
}
