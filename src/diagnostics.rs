//! Labelled readouts handed to the control panel.

use serde::Serialize;
use std::fmt;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DiagnosticEntry {
    pub group: String,
    pub label: &'static str,
    pub value: f64,
    pub unit: &'static str,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Diagnostics {
    pub entries: Vec<DiagnosticEntry>,
    pub notes: Vec<String>,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, group: impl Into<String>, label: &'static str, value: f64, unit: &'static str) {
        self.entries.push(DiagnosticEntry {
            group: group.into(),
            label,
            value,
            unit,
        });
    }

    pub fn note(&mut self, text: impl Into<String>) {
        self.notes.push(text.into());
    }

    /// First entry with the given label, in any group.
    pub fn get(&self, label: &str) -> Option<f64> {
        self.entries.iter().find(|e| e.label == label).map(|e| e.value)
    }

    pub fn get_in(&self, group: &str, label: &str) -> Option<f64> {
        self.entries
            .iter()
            .find(|e| e.group == group && e.label == label)
            .map(|e| e.value)
    }
}

impl fmt::Display for Diagnostics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut current: Option<&str> = None;
        for e in &self.entries {
            if current != Some(e.group.as_str()) {
                if current.is_some() {
                    writeln!(f)?;
                }
                writeln!(f, "[{}]", e.group)?;
                current = Some(e.group.as_str());
            }
            if e.unit.is_empty() {
                writeln!(f, "  {}: {:.2}", e.label, e.value)?;
            } else {
                writeln!(f, "  {}: {:.2} {}", e.label, e.value, e.unit)?;
            }
        }
        for n in &self.notes {
            writeln!(f, "! {}", n)?;
        }
        Ok(())
    }
}
