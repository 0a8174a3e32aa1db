use crate::{Phase, PhaseId, PhaseMatches};

/// Bracket position of a phase name, earliest first. Unknown names sort last.
pub fn phase_rank(name: &str) -> u8 {
    let n = name.trim().to_ascii_lowercase().replace(['-', '_'], " ");
    match n.as_str() {
        "round of 64" => 0,
        "round of 32" | "sedicesimi" => 1,
        "round of 16" | "ottavi" => 2,
        "quarterfinal" | "quarterfinals" | "quarter final" | "quarti" => 3,
        "semifinal" | "semifinals" | "semi final" | "semifinali" => 4,
        "final" | "finals" | "finale" => 5,
        _ => u8::MAX,
    }
}

/// Sort grouped matches by bracket progression, then by name for unknown phases.
pub fn order_groups(groups: &mut [PhaseMatches]) {
    groups.sort_by(|a, b| {
        phase_rank(&a.phase_name)
            .cmp(&phase_rank(&b.phase_name))
            .then_with(|| a.phase_name.cmp(&b.phase_name))
    });
}

/// Phases of one tournament in server order, plus the current selection of
/// the match form's phase control.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PhaseCatalog {
    phases: Vec<Phase>,
    selected: Option<usize>,
}

impl PhaseCatalog {
    /// Server order is kept as-is; the catalog never re-sorts.
    pub fn from_server(phases: Vec<Phase>) -> Self {
        Self { phases, selected: None }
    }

    pub fn is_empty(&self) -> bool {
        self.phases.is_empty()
    }

    pub fn len(&self) -> usize {
        self.phases.len()
    }

    pub fn phases(&self) -> &[Phase] {
        &self.phases
    }

    /// `(id, display name)` pairs for a selection control.
    pub fn options(&self) -> Vec<(PhaseId, String)> {
        self.phases.iter().map(|p| (p.id, p.name.clone())).collect()
    }

    pub fn select(&mut self, id: PhaseId) -> bool {
        match self.phases.iter().position(|p| p.id == id) {
            Some(idx) => {
                self.selected = Some(idx);
                true
            }
            None => false,
        }
    }

    pub fn clear_selection(&mut self) {
        self.selected = None;
    }

    pub fn selected(&self) -> Option<&Phase> {
        self.selected.and_then(|idx| self.phases.get(idx))
    }

    pub fn selected_id(&self) -> Option<PhaseId> {
        self.selected().map(|p| p.id)
    }

    pub fn find(&self, id: PhaseId) -> Option<&Phase> {
        self.phases.iter().find(|p| p.id == id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn phase(id: PhaseId, name: &str) -> Phase {
        Phase {
            id,
            tournament_id: 1,
            name: name.to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn catalog_preserves_server_order() {
        let catalog = PhaseCatalog::from_server(vec![
            phase(9, "Final"),
            phase(3, "Round of 16"),
            phase(5, "Semifinal"),
        ]);
        let names: Vec<String> = catalog.options().into_iter().map(|(_, n)| n).collect();
        assert_eq!(names, vec!["Final", "Round of 16", "Semifinal"]);
    }

    #[test]
    fn selection_requires_a_known_phase() {
        let mut catalog = PhaseCatalog::from_server(vec![phase(1, "Round of 16"), phase(2, "Quarterfinal")]);
        assert!(catalog.selected().is_none());
        assert!(!catalog.select(42));
        assert!(catalog.select(2));
        assert_eq!(catalog.selected_id(), Some(2));
        catalog.clear_selection();
        assert_eq!(catalog.selected_id(), None);
    }

    #[test]
    fn groups_sort_by_bracket_progression() {
        let mut groups: Vec<PhaseMatches> = ["Final", "Quarterfinal", "Exhibition", "Round of 16", "Semifinal"]
            .into_iter()
            .map(|name| PhaseMatches { phase_name: name.to_string(), matches: vec![] })
            .collect();
        order_groups(&mut groups);
        let names: Vec<&str> = groups.iter().map(|g| g.phase_name.as_str()).collect();
        assert_eq!(names, vec!["Round of 16", "Quarterfinal", "Semifinal", "Final", "Exhibition"]);
    }
}
