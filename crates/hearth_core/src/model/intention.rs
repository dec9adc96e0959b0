//! Intention catalog entries and their context generators.
//!
//! # Invariants
//! - Descriptors are immutable once the registry is built.
//! - Context generators are pure functions of the record they receive.

use crate::model::card::TaskRecord;

/// Key of the built-in continuity intention.
pub const WEAVING: &str = "weaving";
pub const CODE_DEVELOPMENT: &str = "code_development";
pub const CREATIVE_FLOW: &str = "creative_flow";
pub const LIFE_ORGANIZATION: &str = "life_organization";

/// Renders a task-scoped context text for one record.
pub type ContextGenerator = fn(&TaskRecord) -> String;

/// One named category of work.
#[derive(Debug, Clone)]
pub struct IntentionDescriptor {
    pub key: String,
    pub name: String,
    /// Single-glyph badge shown next to the name.
    pub emoji: String,
    /// Style tag consumed by presentation layers.
    pub style: String,
    pub description: String,
    pub context: ContextGenerator,
}

impl IntentionDescriptor {
    pub fn new(
        key: impl Into<String>,
        name: impl Into<String>,
        emoji: impl Into<String>,
        style: impl Into<String>,
        description: impl Into<String>,
        context: ContextGenerator,
    ) -> Self {
        Self {
            key: key.into(),
            name: name.into(),
            emoji: emoji.into(),
            style: style.into(),
            description: description.into(),
            context,
        }
    }

    /// `"<emoji> <name> - <description>"`, the active-intention banner line.
    pub fn label(&self) -> String {
        format!("{} {} - {}", self.emoji, self.name, self.description)
    }

    pub fn render_context(&self, record: &TaskRecord) -> String {
        (self.context)(record)
    }
}

/// The four intentions every installation starts with.
pub fn builtin_descriptors() -> Vec<IntentionDescriptor> {
    vec![
        IntentionDescriptor::new(
            WEAVING,
            "Weaving",
            "🌌",
            "quantum",
            "Quantum System Development",
            weaving_context,
        ),
        IntentionDescriptor::new(
            CODE_DEVELOPMENT,
            "Code Development",
            "🔥",
            "fire",
            "Development & Engineering",
            code_context,
        ),
        IntentionDescriptor::new(
            CREATIVE_FLOW,
            "Creative Flow",
            "💧",
            "water",
            "Art & Expression",
            creative_context,
        ),
        IntentionDescriptor::new(
            LIFE_ORGANIZATION,
            "Life Organization",
            "🌍",
            "earth",
            "Life & Systems",
            organization_context,
        ),
    ]
}

fn weaving_context(record: &TaskRecord) -> String {
    let notes = record
        .details
        .as_deref()
        .unwrap_or("No specific details provided yet");
    format!(
        "🌌 QUANTUM WEAVER COLLABORATIVE CONTEXT

TASK: {essence}
INTENTION: WEAVING (Sovereign System Development)

ARCHITECTURAL CONTEXT:
- Building an energy management system with intention-scoped cards
- Local-first state with durable snapshots
- Continuity preserved across sessions through tracked artifacts

TECHNICAL CONSTRAINTS:
- Must preserve export/import compatibility
- Must support dynamic intention switching
- Must provide context generation per task

SUCCESS CRITERIA:
- Clear energy card lifecycle
- Proper state management and persistence
- Seamless intention transitions
- Maintained session continuity

IMPLEMENTATION NOTES:
{notes}",
        essence = record.essence,
    )
}

fn code_context(record: &TaskRecord) -> String {
    format!(
        "🔥 CODE DEVELOPMENT CONTEXT

TASK: {}
INTENTION: CODE DEVELOPMENT

FOCUS: Technical implementation and engineering
APPROACH: Test-driven, documented, maintainable
OUTPUT: Production-ready code artifacts",
        record.essence
    )
}

fn creative_context(record: &TaskRecord) -> String {
    format!(
        "💧 CREATIVE FLOW CONTEXT

TASK: {}
INTENTION: CREATIVE EXPRESSION

FOCUS: Artistic expression and inspiration
APPROACH: Flow state, iterative refinement
OUTPUT: Creative works and expressions",
        record.essence
    )
}

fn organization_context(record: &TaskRecord) -> String {
    format!(
        "🌍 LIFE ORGANIZATION CONTEXT

TASK: {}
INTENTION: SYSTEM ORGANIZATION

FOCUS: Life administration and system management
APPROACH: Structured, efficient, sustainable
OUTPUT: Organized systems and clarity",
        record.essence
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    #[test]
    fn weaving_context_falls_back_when_details_missing() {
        let record = TaskRecord::new(1, "Wire store", WEAVING, None, Utc::now()).unwrap();
        let text = builtin_descriptors()[0].render_context(&record);
        assert!(text.contains("TASK: Wire store"));
        assert!(text.ends_with("No specific details provided yet"));
    }

    #[test]
    fn label_joins_badge_name_and_description() {
        let code = &builtin_descriptors()[1];
        assert_eq!(code.label(), "🔥 Code Development - Development & Engineering");
    }
}
