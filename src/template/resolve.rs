//! Turning templates into literal commands, prompting where needed.

use std::collections::HashMap;

use tracing::debug;

use super::parse::{Segment, Template};
use super::variables::VariableTable;
use crate::error::CommandError;
use crate::ports::PresentationHost;

/// A value the user has to supply.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ask {
    /// Variable the answer is bound to.
    pub variable: String,
    /// Prompt message.
    pub message: String,
    /// Pre-filled value.
    pub default: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Part {
    Text(String),
    Answer(String),
}

/// A batch of templates with everything known already substituted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolutionPlan {
    commands: Vec<Vec<Part>>,
    asks: Vec<Ask>,
}

impl ResolutionPlan {
    /// Values still to be asked for, in left-to-right order across the
    /// batch, each variable once.
    #[must_use]
    pub fn asks(&self) -> &[Ask] {
        &self.asks
    }

    /// Produces the final command lines.
    ///
    /// Variables missing from `answers` substitute as empty strings.
    #[must_use]
    pub fn substitute(&self, answers: &HashMap<String, String>) -> Vec<String> {
        self.commands
            .iter()
            .map(|parts| {
                parts
                    .iter()
                    .map(|part| match part {
                        Part::Text(text) => text.as_str(),
                        Part::Answer(name) => answers.get(name).map_or("", String::as_str),
                    })
                    .collect::<String>()
            })
            .collect()
    }
}

/// Resolves `${...}` placeholders against a [`VariableTable`].
#[derive(Debug, Clone)]
pub struct TemplateResolver {
    variables: VariableTable,
}

impl TemplateResolver {
    /// Creates a resolver over the given variables.
    #[must_use]
    pub fn new(variables: VariableTable) -> Self {
        Self { variables }
    }

    /// Substitutes known variables and silent defaults, collecting the rest
    /// as asks.
    #[must_use]
    pub fn plan(&self, commands: &[String]) -> ResolutionPlan {
        let mut anonymous = 0;
        let mut asks: Vec<Ask> = Vec::new();
        let mut planned = Vec::with_capacity(commands.len());

        for command in commands {
            let template = Template::parse(command, &mut anonymous);
            let mut parts = Vec::new();
            for segment in template.segments() {
                match segment {
                    Segment::Literal(text) => parts.push(Part::Text(text.clone())),
                    Segment::Placeholder(placeholder) => {
                        if let Some(value) = self.variables.get(&placeholder.name) {
                            parts.push(Part::Text(value.to_string()));
                        } else if placeholder.has_silent_default() {
                            parts.push(Part::Text(placeholder.prompt_default().to_string()));
                        } else {
                            if !asks.iter().any(|ask| ask.variable == placeholder.name) {
                                asks.push(Ask {
                                    variable: placeholder.name.clone(),
                                    message: placeholder.prompt_message().to_string(),
                                    default: placeholder.prompt_default().to_string(),
                                });
                            }
                            parts.push(Part::Answer(placeholder.name.clone()));
                        }
                    }
                }
            }
            planned.push(parts);
        }

        ResolutionPlan { commands: planned, asks }
    }

    /// Resolves a batch, asking the host for each unresolved variable in turn.
    ///
    /// # Errors
    ///
    /// Returns [`CommandError::PromptCancelled`] as soon as any prompt is
    /// cancelled; later prompts are not shown.
    pub async fn resolve(
        &self,
        commands: &[String],
        host: &dyn PresentationHost,
    ) -> Result<Vec<String>, CommandError> {
        let plan = self.plan(commands);
        let mut answers = HashMap::with_capacity(plan.asks().len());
        for ask in plan.asks() {
            let answer = host
                .prompt_input(&ask.message, &ask.default)
                .await
                .ok_or(CommandError::PromptCancelled)?;
            debug!(variable = %ask.variable, "placeholder answered");
            answers.insert(ask.variable.clone(), answer);
        }
        Ok(plan.substitute(&answers))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::memory::{MemoryHost, StaticWorkspace};
    use pretty_assertions::assert_eq;

    fn resolver() -> TemplateResolver {
        TemplateResolver::new(VariableTable::from_workspace(&StaticWorkspace::empty()))
    }

    fn commands(lines: &[&str]) -> Vec<String> {
        lines.iter().map(|line| (*line).to_string()).collect()
    }

    #[tokio::test]
    async fn prompts_with_message_and_default() {
        let host = MemoryHost::new();
        host.push_answers([Some("world".to_string())]);

        let resolved =
            resolver().resolve(&commands(&["echo ${x:hello:Enter x}"]), &host).await.unwrap();

        assert_eq!(resolved, vec!["echo world"]);
        assert_eq!(host.prompts(), vec![("Enter x".to_string(), "hello".to_string())]);
    }

    #[tokio::test]
    async fn known_variable_never_prompts() {
        let host = MemoryHost::new();
        let resolver = TemplateResolver::new(VariableTable::from_workspace(
            &StaticWorkspace::empty().with_active_file("/tmp/a.txt"),
        ));

        let resolved = resolver.resolve(&commands(&["echo ${file_name}"]), &host).await.unwrap();

        assert_eq!(resolved, vec!["echo a.txt"]);
        assert!(host.prompts().is_empty());
    }

    #[tokio::test]
    async fn two_part_placeholder_uses_default_silently() {
        let host = MemoryHost::new();
        let resolved =
            resolver().resolve(&commands(&["make ${target:all}", "ls ${dir:}"]), &host).await;

        assert_eq!(resolved.unwrap(), vec!["make all", "ls "]);
        assert!(host.prompts().is_empty());
    }

    #[tokio::test]
    async fn empty_variable_value_falls_through_to_prompt() {
        let host = MemoryHost::new();
        host.push_answers([Some("notes.md".to_string())]);

        let resolved = resolver().resolve(&commands(&["wc ${file}"]), &host).await.unwrap();

        assert_eq!(resolved, vec!["wc notes.md"]);
        assert_eq!(host.prompts(), vec![("file".to_string(), String::new())]);
    }

    #[tokio::test]
    async fn batch_shares_answers() {
        let host = MemoryHost::new();
        host.push_answers([Some("feature".to_string())]);

        let resolved = resolver()
            .resolve(&commands(&["git checkout ${b}", "git push origin ${b}"]), &host)
            .await
            .unwrap();

        assert_eq!(resolved, vec!["git checkout feature", "git push origin feature"]);
        assert_eq!(host.prompts().len(), 1);
    }

    #[tokio::test]
    async fn asks_in_left_to_right_order() {
        let host = MemoryHost::new();
        host.push_answers(["1", "2", "3"].map(|a| Some(a.to_string())));

        let resolved = resolver()
            .resolve(&commands(&["cmd ${c::C} ${a::A}", "cmd ${b::B} ${c::C}"]), &host)
            .await
            .unwrap();

        let messages: Vec<String> = host.prompts().into_iter().map(|(message, _)| message).collect();
        assert_eq!(messages, vec!["C", "A", "B"]);
        assert_eq!(resolved, vec!["cmd 1 2", "cmd 3 1"]);
    }

    #[tokio::test]
    async fn cancelling_stops_further_prompts() {
        let host = MemoryHost::new();
        host.push_answers([Some("one".to_string()), None, Some("three".to_string())]);

        let result = resolver().resolve(&commands(&["echo ${a} ${b} ${c}"]), &host).await;

        assert!(matches!(result, Err(CommandError::PromptCancelled)));
        assert_eq!(host.prompts().len(), 2);
    }

    #[test]
    fn plan_without_placeholders_has_no_asks() {
        let plan = resolver().plan(&commands(&["ls -la"]));
        assert!(plan.asks().is_empty());
        assert_eq!(plan.substitute(&HashMap::new()), vec!["ls -la"]);
    }
}
