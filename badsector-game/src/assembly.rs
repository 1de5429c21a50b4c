//! Hardware assembly: holding bay selection, installation and the derived
//! diagnostics readout.
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::data::PartId;
use crate::error::ActionError;
use crate::numbers::rounded_percent;
use crate::state::{GameState, PartStatus, PcPart};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum DiagnosticStatus {
    Optimal,
    Degraded,
    Critical,
}

impl DiagnosticStatus {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Optimal => "OPTIMAL",
            Self::Degraded => "DEGRADED",
            Self::Critical => "CRITICAL",
        }
    }
}

impl fmt::Display for DiagnosticStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One line of the diagnostics readout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DiagnosticMetric {
    pub id: &'static str,
    pub label: &'static str,
    pub value: u32,
    pub unit: &'static str,
    pub status: DiagnosticStatus,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
struct Installed {
    motherboard: bool,
    cpu: bool,
    gpu: bool,
    psu: bool,
}

impl Installed {
    fn scan(parts: &[PcPart]) -> Self {
        let has = |id: PartId| {
            parts
                .iter()
                .any(|p| p.id() == id && p.status == PartStatus::Installed)
        };
        Self {
            motherboard: has(PartId::Motherboard),
            cpu: has(PartId::CpuRam),
            gpu: has(PartId::Gpu),
            psu: has(PartId::Psu),
        }
    }
}

/// Diagnostics derived from which parts are installed.
#[must_use]
pub fn diagnostics(parts: &[PcPart]) -> [DiagnosticMetric; 4] {
    use DiagnosticStatus::{Critical, Degraded, Optimal};
    let hw = Installed::scan(parts);

    let (logic, logic_status) = match (hw.motherboard, hw.cpu) {
        (true, true) => (100, Optimal),
        (true, false) => (45, Degraded),
        (false, _) => (0, Critical),
    };
    // An empty socket reads cold; a CPU without power runs hot.
    let (temp, temp_status) = match (hw.cpu, hw.psu) {
        (true, true) => (42, Optimal),
        (true, false) => (74, Critical),
        (false, _) => (22, Optimal),
    };
    let (spec, spec_status) = match (hw.gpu, hw.psu) {
        (true, true) => (94, Optimal),
        (true, false) => (40, Degraded),
        (false, _) => (0, Critical),
    };
    let (volt, volt_status) = if hw.psu { (99, Optimal) } else { (0, Critical) };

    [
        DiagnosticMetric {
            id: "logic",
            label: "Logic Coherence (MB)",
            value: logic,
            unit: "%",
            status: logic_status,
        },
        DiagnosticMetric {
            id: "temp",
            label: "Core Temp (CPU)",
            value: temp,
            unit: "°C",
            status: temp_status,
        },
        DiagnosticMetric {
            id: "spec",
            label: "Spectral Sync (GPU)",
            value: spec,
            unit: "mHz",
            status: spec_status,
        },
        DiagnosticMetric {
            id: "volt",
            label: "Voltage Stability (PSU)",
            value: volt,
            unit: "%",
            status: volt_status,
        },
    ]
}

/// Percentage of parts installed, rounded.
#[must_use]
pub fn system_integrity(parts: &[PcPart]) -> u8 {
    let installed = parts
        .iter()
        .filter(|p| p.status == PartStatus::Installed)
        .count();
    rounded_percent(installed, parts.len())
}

/// Toggle the holding-bay selection. Selecting another part replaces the
/// current selection. Returns the new selection.
///
/// # Errors
///
/// [`ActionError::PartNotInBay`] unless the part is FOUND.
pub fn select_part(state: &mut GameState, id: PartId) -> Result<Option<PartId>, ActionError> {
    match state.part(id).map(|p| p.status) {
        Some(PartStatus::Found) => {}
        Some(PartStatus::Installed) => return Err(ActionError::PartAlreadyInstalled(id)),
        _ => return Err(ActionError::PartNotInBay(id)),
    }
    state.selected_part = if state.selected_part == Some(id) {
        None
    } else {
        Some(id)
    };
    Ok(state.selected_part)
}

/// Result of clicking an assembly slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "slot", rename_all = "snake_case")]
pub enum SlotClick {
    Installed { part: PartId },
    /// The slot's part is not the selected one; nothing changed.
    NeedsSelection { part: PartId },
}

/// Click the assembly slot for `id`.
///
/// # Errors
///
/// [`ActionError::PartAlreadyInstalled`] for a filled slot.
pub fn click_slot(state: &mut GameState, id: PartId) -> Result<SlotClick, ActionError> {
    let Some(part) = state.part(id) else {
        return Err(ActionError::PartNotInBay(id));
    };
    if part.status == PartStatus::Installed {
        return Err(ActionError::PartAlreadyInstalled(id));
    }
    if state.selected_part != Some(id) {
        return Ok(SlotClick::NeedsSelection { part: id });
    }
    let installed = state
        .part_mut(id)
        .is_some_and(|p| p.advance_to(PartStatus::Installed));
    if !installed {
        return Err(ActionError::PartNotInBay(id));
    }
    state.selected_part = None;
    Ok(SlotClick::Installed { part: id })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::catalog;

    fn with_installed(ids: &[PartId]) -> GameState {
        let mut state = GameState::initial(catalog());
        for part in &mut state.parts {
            if ids.contains(&part.id()) {
                part.status = PartStatus::Installed;
            }
        }
        state
    }

    fn metric(parts: &[PcPart], id: &str) -> DiagnosticMetric {
        diagnostics(parts).into_iter().find(|m| m.id == id).unwrap()
    }

    #[test]
    fn logic_reading_tracks_board_and_cpu() {
        let state = with_installed(&[PartId::Motherboard]);
        let logic = metric(&state.parts, "logic");
        assert_eq!((logic.value, logic.status), (45, DiagnosticStatus::Degraded));

        let state = with_installed(&[]);
        let logic = metric(&state.parts, "logic");
        assert_eq!((logic.value, logic.status), (0, DiagnosticStatus::Critical));

        let state = with_installed(&[PartId::Motherboard, PartId::CpuRam]);
        assert_eq!(metric(&state.parts, "logic").value, 100);
    }

    #[test]
    fn power_dependent_readings() {
        let state = with_installed(&[PartId::CpuRam, PartId::Gpu]);
        let temp = metric(&state.parts, "temp");
        assert_eq!((temp.value, temp.status), (74, DiagnosticStatus::Critical));
        let spec = metric(&state.parts, "spec");
        assert_eq!((spec.value, spec.status), (40, DiagnosticStatus::Degraded));
        assert_eq!(metric(&state.parts, "volt").status, DiagnosticStatus::Critical);

        let state = with_installed(&PartId::ALL);
        let all: Vec<(u32, DiagnosticStatus)> = diagnostics(&state.parts)
            .iter()
            .map(|m| (m.value, m.status))
            .collect();
        assert!(all.iter().all(|(_, s)| *s == DiagnosticStatus::Optimal));
        assert_eq!(
            all.iter().map(|(v, _)| *v).collect::<Vec<_>>(),
            vec![100, 42, 94, 99]
        );
        assert_eq!(metric(&with_installed(&[]).parts, "temp").value, 22);
    }

    #[test]
    fn integrity_is_rounded_share_installed() {
        assert_eq!(system_integrity(&with_installed(&[]).parts), 0);
        assert_eq!(
            system_integrity(&with_installed(&[PartId::Gpu, PartId::Psu]).parts),
            50
        );
        assert_eq!(system_integrity(&with_installed(&PartId::ALL).parts), 100);
    }

    #[test]
    fn selection_toggles_single_slot() {
        let mut state = GameState::initial(catalog());
        assert_eq!(
            select_part(&mut state, PartId::Gpu),
            Err(ActionError::PartNotInBay(PartId::Gpu))
        );
        for id in [PartId::Gpu, PartId::Psu] {
            state.part_mut(id).unwrap().status = PartStatus::Found;
        }
        assert_eq!(select_part(&mut state, PartId::Gpu), Ok(Some(PartId::Gpu)));
        assert_eq!(select_part(&mut state, PartId::Psu), Ok(Some(PartId::Psu)));
        assert_eq!(select_part(&mut state, PartId::Psu), Ok(None));
    }

    #[test]
    fn slot_click_installs_only_selected_part() {
        let mut state = GameState::initial(catalog());
        state.part_mut(PartId::Psu).unwrap().status = PartStatus::Found;

        assert_eq!(
            click_slot(&mut state, PartId::Psu),
            Ok(SlotClick::NeedsSelection { part: PartId::Psu })
        );
        assert_eq!(state.part(PartId::Psu).unwrap().status, PartStatus::Found);

        select_part(&mut state, PartId::Psu).unwrap();
        assert_eq!(
            click_slot(&mut state, PartId::Psu),
            Ok(SlotClick::Installed { part: PartId::Psu })
        );
        assert_eq!(state.part(PartId::Psu).unwrap().status, PartStatus::Installed);
        assert!(state.selected_part.is_none());
        assert_eq!(
            click_slot(&mut state, PartId::Psu),
            Err(ActionError::PartAlreadyInstalled(PartId::Psu))
        );
    }
}
