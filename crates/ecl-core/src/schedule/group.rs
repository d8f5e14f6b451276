use super::dynamic_state::DynamicState;
use super::well::Phase;
use crate::domain::{EclError, ScheduleResult};
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};

/// Root of every group tree.
pub const FIELD: &str = "FIELD";

fn unknown(kind: &str, text: &str) -> EclError {
    EclError::invalid_input(
        "SCHEDULE.INVALID_ENUM",
        format!("'{text}' is not a valid {kind}"),
    )
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum GroupProductionControl {
    #[default]
    None,
    Orat,
    Wrat,
    Grat,
    Lrat,
    Crat,
    Resv,
    Prbl,
    Fld,
}

impl GroupProductionControl {
    pub fn parse(text: &str) -> ScheduleResult<Self> {
        match text {
            "NONE" => Ok(Self::None),
            "ORAT" => Ok(Self::Orat),
            "WRAT" => Ok(Self::Wrat),
            "GRAT" => Ok(Self::Grat),
            "LRAT" => Ok(Self::Lrat),
            "CRAT" => Ok(Self::Crat),
            "RESV" => Ok(Self::Resv),
            "PRBL" => Ok(Self::Prbl),
            "FLD" => Ok(Self::Fld),
            other => Err(unknown("group production control", other)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum GroupInjectionControl {
    #[default]
    None,
    Rate,
    Resv,
    Rein,
    Vrep,
    Fld,
}

impl GroupInjectionControl {
    pub fn parse(text: &str) -> ScheduleResult<Self> {
        match text {
            "NONE" => Ok(Self::None),
            "RATE" => Ok(Self::Rate),
            "RESV" => Ok(Self::Resv),
            "REIN" => Ok(Self::Rein),
            "VREP" => Ok(Self::Vrep),
            "FLD" => Ok(Self::Fld),
            other => Err(unknown("group injection control", other)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub enum ExceedAction {
    #[default]
    #[serde(rename = "NONE")]
    None,
    #[serde(rename = "CON")]
    Con,
    #[serde(rename = "+CON")]
    ConPlus,
    #[serde(rename = "WELL")]
    Well,
    #[serde(rename = "PLUG")]
    Plug,
    #[serde(rename = "RATE")]
    Rate,
}

impl ExceedAction {
    pub fn parse(text: &str) -> ScheduleResult<Self> {
        match text {
            "NONE" => Ok(Self::None),
            "CON" => Ok(Self::Con),
            "+CON" => Ok(Self::ConPlus),
            "WELL" => Ok(Self::Well),
            "PLUG" => Ok(Self::Plug),
            "RATE" => Ok(Self::Rate),
            other => Err(unknown("exceed action", other)),
        }
    }
}

/// GCONPROD targets, SI.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct GroupProductionTargets {
    pub control: GroupProductionControl,
    pub oil: f64,
    pub water: f64,
    pub gas: f64,
    pub liquid: f64,
    pub reservoir: f64,
    pub exceed_action: ExceedAction,
}

/// GCONINJE targets, SI.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct GroupInjectionTargets {
    pub phase: Phase,
    pub control: GroupInjectionControl,
    pub surface_max_rate: f64,
    pub reservoir_max_rate: f64,
    pub reinjection_fraction: f64,
    pub voidage_fraction: f64,
}

impl Default for GroupInjectionTargets {
    fn default() -> Self {
        Self {
            phase: Phase::Water,
            control: GroupInjectionControl::None,
            surface_max_rate: 0.0,
            reservoir_max_rate: 0.0,
            reinjection_fraction: 0.0,
            voidage_fraction: 0.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Group {
    name: String,
    creation_step: usize,
    production: DynamicState<GroupProductionTargets>,
    injection: DynamicState<GroupInjectionTargets>,
    production_group: DynamicState<bool>,
    efficiency_factor: DynamicState<f64>,
    transfer_efficiency: DynamicState<bool>,
    wells: DynamicState<BTreeSet<String>>,
}

impl Group {
    pub fn new(name: &str, creation_step: usize) -> Self {
        Self {
            name: name.to_string(),
            creation_step,
            production: DynamicState::new(GroupProductionTargets::default()),
            injection: DynamicState::new(GroupInjectionTargets::default()),
            production_group: DynamicState::new(false),
            efficiency_factor: DynamicState::new(1.0),
            transfer_efficiency: DynamicState::new(true),
            wells: DynamicState::new(BTreeSet::new()),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn creation_step(&self) -> usize {
        self.creation_step
    }

    pub fn has_been_defined(&self, step: usize) -> bool {
        step >= self.creation_step
    }

    pub fn production_targets(&self, step: usize) -> GroupProductionTargets {
        *self.production.get(step)
    }

    pub fn set_production_targets(&mut self, step: usize, targets: GroupProductionTargets) -> bool {
        self.production_group.update(step, true);
        self.production.update(step, targets)
    }

    pub fn injection_targets(&self, step: usize) -> GroupInjectionTargets {
        *self.injection.get(step)
    }

    pub fn set_injection_targets(&mut self, step: usize, targets: GroupInjectionTargets) -> bool {
        self.production_group.update(step, false);
        self.injection.update(step, targets)
    }

    pub fn is_production_group(&self, step: usize) -> bool {
        *self.production_group.get(step)
    }

    pub fn is_injection_group(&self, step: usize) -> bool {
        !self.is_production_group(step)
    }

    pub fn efficiency_factor(&self, step: usize) -> f64 {
        *self.efficiency_factor.get(step)
    }

    pub fn transfer_efficiency(&self, step: usize) -> bool {
        *self.transfer_efficiency.get(step)
    }

    pub fn set_efficiency(&mut self, step: usize, factor: f64, transfer: bool) {
        self.efficiency_factor.update(step, factor);
        self.transfer_efficiency.update(step, transfer);
    }

    pub fn wells(&self, step: usize) -> &BTreeSet<String> {
        self.wells.get(step)
    }

    pub fn has_well(&self, well: &str, step: usize) -> bool {
        self.wells(step).contains(well)
    }

    pub fn add_well(&mut self, well: &str, step: usize) -> bool {
        let mut wells = self.wells(step).clone();
        wells.insert(well.to_string());
        self.wells.update(step, wells)
    }

    pub fn remove_well(&mut self, well: &str, step: usize) -> bool {
        let mut wells = self.wells(step).clone();
        wells.remove(well);
        self.wells.update(step, wells)
    }
}

/// Child to parent links under the implicit FIELD root.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct GroupTree {
    parents: BTreeMap<String, String>,
}

impl GroupTree {
    pub fn new() -> Self {
        Self::default()
    }

    /// Moves `child` under `parent`. Returns whether the tree changed.
    pub fn update(&mut self, child: &str, parent: &str) -> bool {
        if self.parents.get(child).map(String::as_str) == Some(parent) {
            return false;
        }
        self.parents.insert(child.to_string(), parent.to_string());
        true
    }

    pub fn has_node(&self, name: &str) -> bool {
        name == FIELD
            || self.parents.contains_key(name)
            || self.parents.values().any(|parent| parent == name)
    }

    pub fn parent(&self, child: &str) -> Option<&str> {
        self.parents.get(child).map(String::as_str)
    }

    pub fn children(&self, parent: &str) -> Vec<&str> {
        self.parents
            .iter()
            .filter(|(_, p)| p.as_str() == parent)
            .map(|(child, _)| child.as_str())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::{ExceedAction, FIELD, Group, GroupProductionTargets, GroupTree};

    #[test]
    fn tree_moves_children_between_parents() {
        let mut tree = GroupTree::new();
        assert!(tree.update("G1", FIELD));
        assert!(!tree.update("G1", FIELD));
        assert!(tree.update("G2", "G1"));
        assert!(tree.update("G2", FIELD));
        assert_eq!(tree.children(FIELD), vec!["G1", "G2"]);
        assert!(tree.children("G1").is_empty());
        assert!(tree.has_node("G2"));
        assert!(!tree.has_node("G3"));
    }

    #[test]
    fn group_role_follows_last_targets() {
        let mut group = Group::new("G1", 0);
        group.set_production_targets(2, GroupProductionTargets::default());
        assert!(group.is_production_group(2));
        assert!(group.is_injection_group(1));
    }

    #[test]
    fn well_membership_is_versioned() {
        let mut group = Group::new("G1", 0);
        group.add_well("OP1", 1);
        group.remove_well("OP1", 3);
        assert!(group.has_well("OP1", 2));
        assert!(!group.has_well("OP1", 3));
    }

    #[test]
    fn exceed_action_accepts_plus_con() {
        assert_eq!(ExceedAction::parse("+CON").ok(), Some(ExceedAction::ConPlus));
        assert!(ExceedAction::parse("STOP").is_err());
    }
}
