//! Prompt construction
//!
//! Every task has a fixed system prompt and a user-prompt format. Formats use
//! `{field}` placeholders for required instance fields and `{field?}` for
//! optional ones; a line whose optional placeholder has no value is left out.
//! `{{` and `}}` produce literal braces.
//!
//! Templates are parsed and checked against the task's instance schema when
//! they are loaded, so a bad placeholder fails the run before any instance is
//! judged.

use crate::error::{EvalError, Result};
use crate::schema::EvaluationInstance;
use crate::task::{Field, Presence, Task};
use regex::Regex;
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::OnceLock;

const REVIEW_SYSTEM_PROMPT: &str = include_str!("../prompts/review.txt");
const TRANSLATION_SYSTEM_PROMPT: &str = include_str!("../prompts/translation.txt");

const REVIEW_USER_FORMAT: &str = "{text}";
const TRANSLATION_USER_FORMAT: &str =
    "input_text: {source}\ntranslated_text: {candidate}\nreference_text: {reference?}";

/// The messages sent to the judge for one instance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromptPair {
    pub system: String,
    pub user: String,
}

#[derive(Debug, Clone, PartialEq)]
enum Segment {
    Literal(String),
    Field { field: Field, optional: bool },
}

/// A parsed user-prompt format.
#[derive(Debug, Clone, PartialEq)]
pub struct UserFormat {
    lines: Vec<Vec<Segment>>,
}

impl UserFormat {
    pub fn parse(raw: &str) -> Result<Self> {
        let lines = raw.split('\n').map(parse_line).collect::<Result<Vec<_>>>()?;
        Ok(Self { lines })
    }

    /// Placeholders in order of appearance, with their optional flag.
    pub fn placeholders(&self) -> impl Iterator<Item = (Field, bool)> + '_ {
        self.lines.iter().flatten().filter_map(|segment| match segment {
            Segment::Field { field, optional } => Some((*field, *optional)),
            Segment::Literal(_) => None,
        })
    }
}

/// Matches escaped braces, a `{name}` placeholder, or a stray brace.
static PLACEHOLDER_REGEX: OnceLock<Regex> = OnceLock::new();

fn placeholder_regex() -> &'static Regex {
    PLACEHOLDER_REGEX
        .get_or_init(|| Regex::new(r"\{\{|\}\}|\{([^{}]*)\}|[{}]").expect("Invalid regex pattern"))
}

fn parse_line(line: &str) -> Result<Vec<Segment>> {
    let mut segments = Vec::new();
    let mut literal = String::new();
    let mut last = 0;

    for captures in placeholder_regex().captures_iter(line) {
        let Some(token) = captures.get(0) else { continue };
        literal.push_str(&line[last..token.start()]);
        last = token.end();

        let name = match (token.as_str(), captures.get(1)) {
            ("{{", _) => {
                literal.push('{');
                continue;
            }
            ("}}", _) => {
                literal.push('}');
                continue;
            }
            (_, Some(name)) => name.as_str().trim(),
            ("{", None) => {
                return Err(EvalError::Template(format!("Unclosed placeholder in '{}'", line)));
            }
            _ => return Err(EvalError::Template(format!("Unmatched '}}' in '{}'", line))),
        };

        let (name, optional) = match name.strip_suffix('?') {
            Some(stripped) => (stripped, true),
            None => (name, false),
        };
        let field = Field::from_name(name)
            .ok_or_else(|| EvalError::Template(format!("Unknown placeholder '{{{}}}'", name)))?;

        if !literal.is_empty() {
            segments.push(Segment::Literal(std::mem::take(&mut literal)));
        }
        segments.push(Segment::Field { field, optional });
    }

    literal.push_str(&line[last..]);
    if !literal.is_empty() {
        segments.push(Segment::Literal(literal));
    }
    Ok(segments)
}

/// System prompt plus user format for one task, validated against that task.
#[derive(Debug, Clone, PartialEq)]
pub struct PromptTemplate {
    task: Task,
    system: String,
    user: UserFormat,
}

impl PromptTemplate {
    pub fn new(task: Task, system: impl Into<String>, user_format: &str) -> Result<Self> {
        let system = system.into();
        if system.trim().is_empty() {
            return Err(EvalError::Template(format!("System prompt for '{}' is empty", task)));
        }

        let user = UserFormat::parse(user_format)?;
        for (field, optional) in user.placeholders() {
            match task.field_presence(field) {
                None => {
                    return Err(EvalError::Template(format!(
                        "Placeholder '{{{}}}' is not available for the '{}' task",
                        field.name(),
                        task
                    )));
                }
                Some(Presence::Optional) if !optional => {
                    return Err(EvalError::Template(format!(
                        "Field '{}' is optional for the '{}' task; write '{{{}?}}'",
                        field.name(),
                        task,
                        field.name()
                    )));
                }
                _ => {}
            }
        }

        Ok(Self { task, system, user })
    }

    pub fn builtin(task: Task) -> Result<Self> {
        match task {
            Task::Review => Self::new(task, REVIEW_SYSTEM_PROMPT, REVIEW_USER_FORMAT),
            Task::Translation => Self::new(task, TRANSLATION_SYSTEM_PROMPT, TRANSLATION_USER_FORMAT),
        }
    }

    pub fn task(&self) -> Task {
        self.task
    }

    pub fn system_prompt(&self) -> &str {
        &self.system
    }

    pub fn render(&self, instance: &EvaluationInstance) -> Result<PromptPair> {
        let mut rendered = Vec::with_capacity(self.user.lines.len());

        'lines: for line in &self.user.lines {
            let mut out = String::new();
            for segment in line {
                match segment {
                    Segment::Literal(text) => out.push_str(text),
                    Segment::Field { field, optional } => {
                        match instance.field(self.task, *field) {
                            Some(value) => out.push_str(value),
                            None if *optional => continue 'lines,
                            None => {
                                return Err(EvalError::Template(format!(
                                    "Instance '{}' has no '{}' field",
                                    instance.id,
                                    field.name()
                                )));
                            }
                        }
                    }
                }
            }
            rendered.push(out);
        }

        Ok(PromptPair { system: self.system.clone(), user: rendered.join("\n") })
    }
}

/// Read-only set of templates for every task, loaded once per run.
#[derive(Debug, Clone)]
pub struct PromptBuilder {
    templates: BTreeMap<Task, PromptTemplate>,
}

impl PromptBuilder {
    pub fn builtin() -> Result<Self> {
        let templates: BTreeMap<Task, PromptTemplate> = Task::ALL
            .into_iter()
            .map(|task| PromptTemplate::builtin(task).map(|t| (task, t)))
            .collect::<Result<_>>()?;
        Ok(Self { templates })
    }

    /// Load overrides from `dir`: `{task}.txt` replaces the system prompt and
    /// `{task}.user.txt` the user format. Missing files keep the built-ins.
    pub fn from_dir(dir: impl AsRef<Path>) -> Result<Self> {
        let dir = dir.as_ref();
        if !dir.is_dir() {
            return Err(EvalError::Config(format!(
                "Prompt directory '{}' does not exist",
                dir.display()
            )));
        }

        let mut builder = Self::builtin()?;
        for task in Task::ALL {
            let system_path = dir.join(format!("{}.txt", task));
            let user_path = dir.join(format!("{}.user.txt", task));
            if !system_path.exists() && !user_path.exists() {
                continue;
            }

            let builtin = PromptTemplate::builtin(task)?;
            let system = read_optional(&system_path)?
                .unwrap_or_else(|| builtin.system_prompt().to_string());
            let user_format = read_optional(&user_path)?
                .unwrap_or_else(|| builtin_user_format(task).to_string());
            let user_format = user_format.trim_end_matches('\n');

            tracing::debug!(%task, dir = %dir.display(), "Loaded prompt template overrides");
            builder.templates.insert(task, PromptTemplate::new(task, system, user_format)?);
        }
        Ok(builder)
    }

    pub fn with_template(mut self, template: PromptTemplate) -> Self {
        self.templates.insert(template.task(), template);
        self
    }

    pub fn template(&self, task: Task) -> Result<&PromptTemplate> {
        self.templates
            .get(&task)
            .ok_or_else(|| EvalError::Template(format!("No template loaded for '{}'", task)))
    }

    pub fn build(&self, task: Task, instance: &EvaluationInstance) -> Result<PromptPair> {
        self.template(task)?.render(instance)
    }
}

fn builtin_user_format(task: Task) -> &'static str {
    match task {
        Task::Review => REVIEW_USER_FORMAT,
        Task::Translation => TRANSLATION_USER_FORMAT,
    }
}

fn read_optional(path: &Path) -> Result<Option<String>> {
    if !path.exists() {
        return Ok(None);
    }
    std::fs::read_to_string(path).map(Some).map_err(|e| {
        EvalError::Template(format!("Failed to read prompt file {}: {}", path.display(), e))
    })
}
