//! Server-side bulk operations and the single-slot runner that drives them.

use std::{collections::HashMap, fmt, str::FromStr};

use shared::{domain::WeaponType, error::ParseEnumError, protocol::SoundtrackGroups};
use tracing::{info, warn};

use crate::{ClientResult, RecordApi};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OperationId {
    DeleteAllByWeaponType,
    DeleteOneByWeaponType,
    GroupBySoundtrack,
    UpdateMoodToSadness,
    AssignCars,
}

impl OperationId {
    pub const ALL: &'static [OperationId] = &[
        OperationId::DeleteAllByWeaponType,
        OperationId::DeleteOneByWeaponType,
        OperationId::GroupBySoundtrack,
        OperationId::UpdateMoodToSadness,
        OperationId::AssignCars,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::DeleteAllByWeaponType => "delete-by-weapon",
            Self::DeleteOneByWeaponType => "delete-one-by-weapon",
            Self::GroupBySoundtrack => "group-by-soundtrack",
            Self::UpdateMoodToSadness => "update-mood",
            Self::AssignCars => "assign-cars",
        }
    }

    pub fn descriptor(&self) -> OperationDescriptor {
        let weapon_input = || OperationInput {
            kind: InputKind::Select,
            name: WEAPON_TYPE_INPUT,
            label: "Weapon Type",
            required: true,
            options: WeaponType::ALL.iter().map(|w| w.as_str()).collect(),
        };

        match self {
            Self::DeleteAllByWeaponType => OperationDescriptor {
                id: *self,
                title: "Delete All by Weapon Type",
                description: "Remove all human beings with specified weapon type",
                inputs: vec![weapon_input()],
                mutates: true,
            },
            Self::DeleteOneByWeaponType => OperationDescriptor {
                id: *self,
                title: "Delete One by Weapon Type",
                description: "Remove one human being with specified weapon type",
                inputs: vec![weapon_input()],
                mutates: true,
            },
            Self::GroupBySoundtrack => OperationDescriptor {
                id: *self,
                title: "Group by Soundtrack",
                description: "Count human beings grouped by soundtrack name",
                inputs: Vec::new(),
                mutates: false,
            },
            Self::UpdateMoodToSadness => OperationDescriptor {
                id: *self,
                title: "Update All Moods to Sadness",
                description: "Set mood to SADNESS for all human beings",
                inputs: Vec::new(),
                mutates: true,
            },
            Self::AssignCars => OperationDescriptor {
                id: *self,
                title: "Assign Cars to Heroes",
                description: "Give red Lada Kalina to all heroes without cars",
                inputs: Vec::new(),
                mutates: true,
            },
        }
    }
}

impl fmt::Display for OperationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OperationId {
    type Err = ParseEnumError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let raw_trimmed = raw.trim();
        Self::ALL
            .iter()
            .copied()
            .find(|id| id.as_str().eq_ignore_ascii_case(raw_trimmed))
            .ok_or_else(|| ParseEnumError::new("operation", raw))
    }
}

pub const WEAPON_TYPE_INPUT: &str = "weaponType";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputKind {
    Select,
    Text,
    Number,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OperationInput {
    pub kind: InputKind,
    pub name: &'static str,
    pub label: &'static str,
    pub required: bool,
    pub options: Vec<&'static str>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OperationDescriptor {
    pub id: OperationId,
    pub title: &'static str,
    pub description: &'static str,
    pub inputs: Vec<OperationInput>,
    /// Whether a successful run changes records (and so stales the list).
    pub mutates: bool,
}

pub fn catalog() -> Vec<OperationDescriptor> {
    OperationId::ALL.iter().map(OperationId::descriptor).collect()
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OperationResult {
    Completed,
    Grouped(SoundtrackGroups),
}

/// One line per group: `"<label>: <count> human beings"`.
pub fn render_groups(groups: &SoundtrackGroups) -> String {
    groups
        .iter()
        .map(|group| format!("{}: {} human beings", group.soundtrack_name, group.count))
        .collect::<Vec<_>>()
        .join("\n")
}

/// A fully parameterised call, ready to dispatch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperationCall {
    DeleteAllByWeaponType(WeaponType),
    DeleteOneByWeaponType(WeaponType),
    GroupBySoundtrack,
    UpdateMoodToSadness,
    AssignCars,
}

impl OperationCall {
    pub async fn dispatch(self, api: &dyn RecordApi) -> ClientResult<OperationResult> {
        match self {
            Self::DeleteAllByWeaponType(weapon_type) => {
                api.delete_all_by_weapon_type(weapon_type).await?
            }
            Self::DeleteOneByWeaponType(weapon_type) => {
                api.delete_one_by_weapon_type(weapon_type).await?
            }
            Self::GroupBySoundtrack => {
                return Ok(OperationResult::Grouped(api.group_by_soundtrack().await?));
            }
            Self::UpdateMoodToSadness => api.update_all_moods_to_sadness().await?,
            Self::AssignCars => api.assign_car_to_heroes_without_car().await?,
        }
        Ok(OperationResult::Completed)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum RunState {
    #[default]
    Idle,
    Running(OperationId),
    Succeeded {
        id: OperationId,
        message: String,
    },
    Failed {
        id: OperationId,
        message: String,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunTicket {
    pub id: OperationId,
    pub call: OperationCall,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OperationReport {
    pub id: OperationId,
    pub success: bool,
    pub message: String,
    pub result: Option<OperationResult>,
    /// The caller should reload the records list.
    pub refresh_requested: bool,
}

/// Runs at most one bulk operation at a time and keeps the banner text for
/// the last one.
#[derive(Debug, Default)]
pub struct BulkOrchestrator {
    state: RunState,
    inputs: HashMap<OperationId, HashMap<&'static str, String>>,
}

impl BulkOrchestrator {
    pub fn state(&self) -> &RunState {
        &self.state
    }

    pub fn is_running(&self) -> bool {
        matches!(self.state, RunState::Running(_))
    }

    pub fn set_input(&mut self, id: OperationId, name: &str, value: impl Into<String>) {
        let descriptor = id.descriptor();
        let Some(input) = descriptor.inputs.iter().find(|input| input.name == name) else {
            warn!(operation = %id, input = name, "ignoring unknown operation input");
            return;
        };
        self.inputs
            .entry(id)
            .or_default()
            .insert(input.name, value.into());
    }

    pub fn input(&self, id: OperationId, name: &str) -> Option<&str> {
        self.inputs
            .get(&id)
            .and_then(|values| values.get(name))
            .map(String::as_str)
    }

    fn missing_required_input(&self, descriptor: &OperationDescriptor) -> bool {
        descriptor.inputs.iter().any(|input| {
            input.required
                && self
                    .input(descriptor.id, input.name)
                    .map_or(true, |value| value.trim().is_empty())
        })
    }

    /// Mirrors the execute button: disabled while anything is running, while
    /// a required input is blank, or while a select holds an unknown choice.
    pub fn is_disabled(&self, id: OperationId) -> bool {
        self.is_running()
            || self.missing_required_input(&id.descriptor())
            || self.build_call(id).is_none()
    }

    fn build_call(&self, id: OperationId) -> Option<OperationCall> {
        let weapon_type = || {
            self.input(id, WEAPON_TYPE_INPUT)
                .and_then(|raw| raw.parse::<WeaponType>().ok())
        };
        Some(match id {
            OperationId::DeleteAllByWeaponType => {
                OperationCall::DeleteAllByWeaponType(weapon_type()?)
            }
            OperationId::DeleteOneByWeaponType => {
                OperationCall::DeleteOneByWeaponType(weapon_type()?)
            }
            OperationId::GroupBySoundtrack => OperationCall::GroupBySoundtrack,
            OperationId::UpdateMoodToSadness => OperationCall::UpdateMoodToSadness,
            OperationId::AssignCars => OperationCall::AssignCars,
        })
    }

    /// Moves to `Running` and returns the call to dispatch, or `None` when the
    /// operation is disabled.
    pub fn begin(&mut self, id: OperationId) -> Option<RunTicket> {
        if self.is_running() || self.missing_required_input(&id.descriptor()) {
            return None;
        }
        let call = self.build_call(id)?;
        info!(operation = %id, "running bulk operation");
        self.state = RunState::Running(id);
        Some(RunTicket { id, call })
    }

    /// Clears the last result banner.
    pub fn dismiss(&mut self) {
        if !self.is_running() {
            self.state = RunState::Idle;
        }
    }

    pub fn finish(
        &mut self,
        ticket: RunTicket,
        result: ClientResult<OperationResult>,
    ) -> OperationReport {
        let descriptor = ticket.id.descriptor();
        match result {
            Ok(result) => {
                let message = match &result {
                    OperationResult::Grouped(groups) => {
                        format!("Grouping completed:\n{}", render_groups(groups))
                    }
                    OperationResult::Completed => {
                        format!("{} completed successfully!", descriptor.title)
                    }
                };
                self.state = RunState::Succeeded {
                    id: ticket.id,
                    message: message.clone(),
                };
                OperationReport {
                    id: ticket.id,
                    success: true,
                    message,
                    result: Some(result),
                    refresh_requested: descriptor.mutates,
                }
            }
            Err(err) => {
                let message = failure_message(&descriptor, &err.user_message());
                warn!(operation = %ticket.id, error = %err, "bulk operation failed");
                self.state = RunState::Failed {
                    id: ticket.id,
                    message: message.clone(),
                };
                OperationReport {
                    id: ticket.id,
                    success: false,
                    message,
                    result: None,
                    refresh_requested: false,
                }
            }
        }
    }

    pub async fn execute(
        &mut self,
        api: &dyn RecordApi,
        id: OperationId,
    ) -> Option<OperationReport> {
        let ticket = self.begin(id)?;
        let result = ticket.call.dispatch(api).await;
        Some(self.finish(ticket, result))
    }
}

fn failure_message(descriptor: &OperationDescriptor, message: &str) -> String {
    format!("Error during {}: {message}", descriptor.title)
}

#[cfg(test)]
#[path = "tests/operations_tests.rs"]
mod tests;
