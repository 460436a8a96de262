//! The catalogue of operations a user can apply to a selection.
//!
//! Built-in instructions are compiled in; custom ones live in the settings store.
//! Both share one id space.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::protocol::{Envelope, ProcessRequest};

/// Appended to every instruction before it is sent to a backend.
pub const FORMAT_SUFFIX: &str =
    "Format the output as Markdown when structure helps readability. Don't wrap it in a code block.";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Instruction {
    pub id: String,
    pub title: String,
    #[serde(rename = "instruction")]
    pub instruction_text: String,
}

impl Instruction {
    pub fn new(title: &str, instruction_text: &str) -> Self {
        Self {
            id: derive_id(title),
            title: title.trim().to_string(),
            instruction_text: instruction_text.trim().to_string(),
        }
    }

    pub fn is_builtin(&self) -> bool {
        is_builtin(&self.id)
    }

    /// Instruction text plus the fixed formatting suffix.
    pub fn resolved_text(&self) -> String {
        format!("{} {}", self.instruction_text, FORMAT_SUFFIX)
    }

    /// Build the process-trigger envelope for `selected_text`.
    pub fn trigger(&self, selected_text: &str) -> Envelope {
        Envelope::ProcessText(ProcessRequest {
            text: selected_text.to_string(),
            instruction: self.resolved_text(),
            operation: self.title.clone(),
            instruction_id: self.id.clone(),
        })
    }
}

struct Builtin {
    id: &'static str,
    title: &'static str,
    instruction: &'static str,
    action_title: &'static str,
    loading_title: &'static str,
}

const BUILTINS: &[Builtin] = &[
    Builtin {
        id: "fixGrammar",
        title: "Fix Grammar",
        instruction: "Fix the grammar and make any necessary corrections in the given text. Don't output anything else. Keep it simple and don't use any heavy or non-standard words.",
        action_title: "Enhanced with grammar fix",
        loading_title: "Fixing grammar",
    },
    Builtin {
        id: "rephraseSentence",
        title: "Rephrase Sentence",
        instruction: "Rephrase the given text to convey the same meaning in a different way. Don't output anything else.",
        action_title: "Rephrased",
        loading_title: "Rephrasing sentence",
    },
    Builtin {
        id: "formalize",
        title: "Formalize",
        instruction: "Make the given text more formal and professional. Don't output anything else.",
        action_title: "Formalized",
        loading_title: "Formalizing text",
    },
    Builtin {
        id: "simplify",
        title: "Simplify",
        instruction: "Simplify the given text to make it easier to understand. Don't output anything else.",
        action_title: "Simplified",
        loading_title: "Simplifying text",
    },
    Builtin {
        id: "summarize",
        title: "Summarize",
        instruction: "Summarize the given text concisely. Don't output anything else.",
        action_title: "Summarized",
        loading_title: "Summarizing text",
    },
];

pub fn builtin_instructions() -> Vec<Instruction> {
    BUILTINS
        .iter()
        .map(|builtin| Instruction {
            id: builtin.id.to_string(),
            title: builtin.title.to_string(),
            instruction_text: builtin.instruction.to_string(),
        })
        .collect()
}

pub fn is_builtin(id: &str) -> bool {
    BUILTINS.iter().any(|builtin| builtin.id == id)
}

/// Lowercase the title and keep only `[a-z0-9]`.
pub fn derive_id(title: &str) -> String {
    title
        .to_lowercase()
        .chars()
        .filter(|c| c.is_ascii_lowercase() || c.is_ascii_digit())
        .collect()
}

/// Title shown once a result is available, e.g. "Rephrased".
pub fn action_title(instruction_id: &str, operation: &str) -> String {
    BUILTINS
        .iter()
        .find(|builtin| builtin.id == instruction_id)
        .map(|builtin| builtin.action_title.to_string())
        .unwrap_or_else(|| format!("\"{}\" result", operation))
}

/// Title shown while a request is pending, e.g. "Rephrasing sentence".
pub fn loading_title(instruction_id: &str, operation: &str) -> String {
    BUILTINS
        .iter()
        .find(|builtin| builtin.id == instruction_id)
        .map(|builtin| builtin.loading_title.to_string())
        .unwrap_or_else(|| format!("Performing \"{}\"", operation))
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum InstructionError {
    #[error("Title and instruction are both required")]
    Incomplete,

    #[error("Title \"{0}\" does not contain any letters or digits")]
    EmptyId(String),

    #[error("An instruction with id \"{0}\" already exists")]
    Duplicate(String),

    #[error("Built-in instruction \"{0}\" cannot be changed")]
    Builtin(String),

    #[error("No custom instruction with id \"{0}\"")]
    NotFound(String),
}

/// Built-ins followed by the user's custom instructions.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InstructionSet {
    customs: Vec<Instruction>,
}

impl InstructionSet {
    /// Wrap a persisted list, dropping entries whose id collides with a built-in
    /// or an earlier custom instruction.
    pub fn new(customs: Vec<Instruction>) -> Self {
        let mut set = Self::default();
        for custom in customs {
            if set.find(&custom.id).is_some() || custom.id.is_empty() {
                tracing::warn!(id = %custom.id, "skipping custom instruction with conflicting id");
                continue;
            }
            set.customs.push(custom);
        }
        set
    }

    pub fn all(&self) -> Vec<Instruction> {
        let mut all = builtin_instructions();
        all.extend(self.customs.iter().cloned());
        all
    }

    pub fn customs(&self) -> &[Instruction] {
        &self.customs
    }

    pub fn into_customs(self) -> Vec<Instruction> {
        self.customs
    }

    pub fn find(&self, id: &str) -> Option<Instruction> {
        builtin_instructions()
            .into_iter()
            .find(|instruction| instruction.id == id)
            .or_else(|| self.customs.iter().find(|custom| custom.id == id).cloned())
    }

    pub fn add_custom(
        &mut self,
        title: &str,
        instruction_text: &str,
    ) -> Result<Instruction, InstructionError> {
        if title.trim().is_empty() || instruction_text.trim().is_empty() {
            return Err(InstructionError::Incomplete);
        }
        let instruction = Instruction::new(title, instruction_text);
        if instruction.id.is_empty() {
            return Err(InstructionError::EmptyId(title.to_string()));
        }
        // Built-in ids are camelCase, so compare case-insensitively against them.
        let clashes_builtin = BUILTINS
            .iter()
            .any(|builtin| builtin.id.eq_ignore_ascii_case(&instruction.id));
        if clashes_builtin || self.find(&instruction.id).is_some() {
            return Err(InstructionError::Duplicate(instruction.id));
        }

        self.customs.push(instruction.clone());
        Ok(instruction)
    }

    /// Change title and text in place; the id stays stable.
    pub fn update_custom(
        &mut self,
        id: &str,
        title: &str,
        instruction_text: &str,
    ) -> Result<Instruction, InstructionError> {
        if is_builtin(id) {
            return Err(InstructionError::Builtin(id.to_string()));
        }
        if title.trim().is_empty() || instruction_text.trim().is_empty() {
            return Err(InstructionError::Incomplete);
        }
        let custom = self
            .customs
            .iter_mut()
            .find(|custom| custom.id == id)
            .ok_or_else(|| InstructionError::NotFound(id.to_string()))?;
        custom.title = title.trim().to_string();
        custom.instruction_text = instruction_text.trim().to_string();
        Ok(custom.clone())
    }

    pub fn remove_custom(&mut self, id: &str) -> Result<Instruction, InstructionError> {
        if is_builtin(id) {
            return Err(InstructionError::Builtin(id.to_string()));
        }
        let index = self
            .customs
            .iter()
            .position(|custom| custom.id == id)
            .ok_or_else(|| InstructionError::NotFound(id.to_string()))?;
        Ok(self.customs.remove(index))
    }
}
