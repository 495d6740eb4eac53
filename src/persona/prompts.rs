use serde::{Deserialize, Serialize};

use crate::models::IdentityMap;

/// Placeholder replaced by the persona name in prompt templates
pub const NAME_PLACEHOLDER: &str = "{name}";

/// Placeholder replaced by the chat label in the group line
pub const GROUP_PLACEHOLDER: &str = "{group}";

/// Whether the system prompt mentions the chat the sample came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GroupContext {
    /// Same persona instruction for every sample
    #[default]
    Omit,
    /// Append the originating chat label to the persona instruction
    Include,
}

/// Prompt templates describing the target persona
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PersonaConfig {
    /// Persona name; defaults to the target's canonical name
    pub name: Option<String>,
    /// System instruction template
    pub description: String,
    /// Line placed before the rendered history
    pub history_header: String,
    /// Line placed after the rendered history
    pub reply_instruction: String,
    /// Group line template, used with `GroupContext::Include`
    pub group_line: String,
    /// Label used when a block carries no chat label
    pub unknown_group: String,
    pub group_context: GroupContext,
}

impl Default for PersonaConfig {
    fn default() -> Self {
        Self {
            name: None,
            description: "You are {name}, a regular member of this group chat. \
                          Reply the way {name} usually does."
                .to_string(),
            history_header: "Conversation history:".to_string(),
            reply_instruction: "Reply as {name}:".to_string(),
            group_line: "You are chatting in the group '{group}'.".to_string(),
            unknown_group: "unknown group".to_string(),
            group_context: GroupContext::Omit,
        }
    }
}

/// Persona templates bound to a concrete name
#[derive(Debug, Clone)]
pub struct Persona {
    name: String,
    config: PersonaConfig,
}

impl Persona {
    pub fn new(name: impl Into<String>, config: PersonaConfig) -> Self {
        Self {
            name: name.into(),
            config,
        }
    }

    /// Bind the templates to the configured name, the target's canonical
    /// name, or the bare target id, in that order
    pub fn resolve(config: &PersonaConfig, identity: &IdentityMap, target_id: &str) -> Self {
        let name = config
            .name
            .clone()
            .filter(|n| !n.trim().is_empty())
            .or_else(|| identity.get(target_id).map(str::to_string))
            .unwrap_or_else(|| target_id.to_string());
        Self::new(name, config.clone())
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Build the system instruction for a sample from the given chat
    pub fn system_prompt(&self, chat: Option<&str>) -> String {
        let mut prompt = self.fill(&self.config.description);
        if self.config.group_context == GroupContext::Include {
            let group = chat
                .filter(|c| !c.is_empty())
                .unwrap_or(&self.config.unknown_group);
            prompt.push(' ');
            prompt.push_str(&self.fill(&self.config.group_line).replace(GROUP_PLACEHOLDER, group));
        }
        prompt
    }

    /// Build the user message around rendered context lines
    pub fn user_prompt(&self, context_lines: &[String]) -> String {
        let mut prompt = String::new();
        let header = self.fill(&self.config.history_header);
        if !header.is_empty() {
            prompt.push_str(&header);
            prompt.push('\n');
        }
        prompt.push_str(&context_lines.join("\n"));
        let instruction = self.fill(&self.config.reply_instruction);
        if !instruction.is_empty() {
            prompt.push_str("\n\n");
            prompt.push_str(&instruction);
        }
        prompt
    }

    fn fill(&self, template: &str) -> String {
        template.replace(NAME_PLACEHOLDER, &self.name)
    }
}

/// Render one context record as `"<name>: <text>"`
pub fn format_context_line(name: &str, text: &str) -> String {
    format!("{}: {}", name, text)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_prefers_configured_name() {
        let mut identity = IdentityMap::new();
        identity.insert("111", "Alice");

        let config = PersonaConfig {
            name: Some("Ally".to_string()),
            ..Default::default()
        };
        assert_eq!(Persona::resolve(&config, &identity, "111").name(), "Ally");

        let config = PersonaConfig::default();
        assert_eq!(Persona::resolve(&config, &identity, "111").name(), "Alice");
        assert_eq!(Persona::resolve(&config, &identity, "999").name(), "999");
    }

    #[test]
    fn test_system_prompt_group_modes() {
        let omit = Persona::new("Alice", PersonaConfig::default());
        let prompt = omit.system_prompt(Some("Friends"));
        assert!(prompt.starts_with("You are Alice,"));
        assert!(!prompt.contains("Friends"));

        let include = Persona::new(
            "Alice",
            PersonaConfig {
                group_context: GroupContext::Include,
                ..Default::default()
            },
        );
        assert!(include
            .system_prompt(Some("Friends"))
            .ends_with("You are chatting in the group 'Friends'."));
        assert!(include.system_prompt(None).ends_with("'unknown group'."));
    }

    #[test]
    fn test_user_prompt_framing() {
        let persona = Persona::new("Alice", PersonaConfig::default());
        let prompt = persona.user_prompt(&["Bob: hi".to_string(), "Carol: yo".to_string()]);
        assert_eq!(
            prompt,
            "Conversation history:\nBob: hi\nCarol: yo\n\nReply as Alice:"
        );
    }

    #[test]
    fn test_user_prompt_bare_lines() {
        let config = PersonaConfig {
            history_header: String::new(),
            reply_instruction: String::new(),
            ..Default::default()
        };
        let persona = Persona::new("Alice", config);
        assert_eq!(persona.user_prompt(&["Bob: hi".to_string()]), "Bob: hi");
    }
}
