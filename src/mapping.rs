//! # Mapping
//! A text mapping turns one schematized record into another by way of a single LLM
//! completion call. The [`MappingDefinition`] holds the human-authored prompt assets:
//! guidelines, an input template, an output template, and worked examples. The
//! [`CompletionMapping`] engine renders a record through the input template, appends it
//! to a fixed prompt prefix, obtains a completion from a
//! [`TextCompletions`](crate::completions::TextCompletions) collaborator, and
//! inverse-parses the completion against the output template.
//!
//! What happens when a completion does not match the expected shape is a first-class
//! parameter: [`ParseFailurePolicy::Strict`] propagates the parse error, while
//! [`ParseFailurePolicy::DefaultOnParseFailure`] substitutes a default for every output
//! key and marks the outcome as failed, letting a batch continue past one bad record.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use anyhow::{bail, Context, Result};
use serde_json::Value;

use crate::completions::{Prompt, Role, TextCompletions};
use crate::corpus::errors::SchemaConflictError;
use crate::corpus::{Record, RecordSet};
use crate::logging::Logger;
use crate::template::{FieldValues, Template};
use crate::JsonMap;

const GUIDELINES_FILE: &str = "guidelines.txt";
const INPUT_TEMPLATE_FILE: &str = "input_template.txt";
const OUTPUT_TEMPLATE_FILE: &str = "output_template.txt";
const EXAMPLES_YAML_FILE: &str = "examples.yaml";
const EXAMPLES_TSV_FILE: &str = "examples.tsv";

const LOGGING_SOURCE: &str = "CompletionMapping";
const LOGGING_COMPLETION_KEY: &str = "Completion";
const LOGGING_ERROR_KEY: &str = "Error";

const LOGGED_GUIDELINES_CHARS: usize = 64;

/// Worked input/output example for a mapping. Keys of `inputs` correspond to the input
/// template's keys, keys of `outputs` to the output template's keys.
#[derive(Debug, Clone)]
#[readonly::make]
pub struct MappingExample {
    pub inputs: HashMap<String, String>,
    pub outputs: HashMap<String, String>,
}

impl MappingExample {
    pub fn new(inputs: HashMap<String, String>, outputs: HashMap<String, String>) -> Self {
        Self { inputs, outputs }
    }
}

/// Guidelines, input/output templates, and worked examples that define one text mapping.
/// Immutable once loaded.
#[derive(Debug, Clone)]
#[readonly::make]
pub struct MappingDefinition {
    pub guidelines: String,
    pub input_template: Template,
    pub output_template: Template,
    pub examples: Vec<MappingExample>,
    pub source_dir: Option<PathBuf>,
}

impl MappingDefinition {
    /// Assemble a definition, rejecting input/output templates that share more than one
    /// key. An overlap of exactly one key is tolerated for compatibility with existing
    /// definitions.
    pub fn new(
        guidelines: impl Into<String>,
        input_template: Template,
        output_template: Template,
        examples: Vec<MappingExample>,
        source_dir: Option<PathBuf>,
    ) -> Result<Self, SchemaConflictError> {
        let overlapping: Vec<String> = input_template
            .keys
            .iter()
            .filter(|key| output_template.keys.contains(key))
            .cloned()
            .collect();
        if overlapping.len() > 1 {
            return Err(SchemaConflictError::new(
                overlapping,
                "input and output templates",
            ));
        }
        Ok(Self {
            guidelines: guidelines.into(),
            input_template,
            output_template,
            examples,
            source_dir,
        })
    }

    /// Load a definition from a directory containing `guidelines.txt`,
    /// `input_template.txt`, `output_template.txt`, and `examples.yaml` or
    /// `examples.tsv` (YAML preferred when both exist).
    pub fn load_from_directory(dir: impl AsRef<Path>) -> Result<Self> {
        let dir = dir.as_ref();
        let guidelines = read_asset(dir, GUIDELINES_FILE)?.trim().to_string();
        let input_template = Template::load(read_asset(dir, INPUT_TEMPLATE_FILE)?)?;
        let output_template = Template::load(read_asset(dir, OUTPUT_TEMPLATE_FILE)?)?;

        let yaml_path = dir.join(EXAMPLES_YAML_FILE);
        let tsv_path = dir.join(EXAMPLES_TSV_FILE);
        let examples_path = if yaml_path.exists() {
            yaml_path
        } else if tsv_path.exists() {
            tsv_path
        } else {
            bail!(
                "mapping definition directory '{}' must contain {} or {}",
                dir.display(),
                EXAMPLES_YAML_FILE,
                EXAMPLES_TSV_FILE
            );
        };
        let examples =
            Self::load_examples(&examples_path, &input_template.keys, &output_template.keys)?;

        Ok(Self::new(
            guidelines,
            input_template,
            output_template,
            examples,
            Some(dir.to_path_buf()),
        )?)
    }

    fn load_examples(
        path: &Path,
        input_keys: &[String],
        output_keys: &[String],
    ) -> Result<Vec<MappingExample>> {
        let corpus = RecordSet::load(path)?;
        corpus
            .iter()
            .map(|record| {
                let inputs = select_fields(record, input_keys, path)?;
                let outputs = select_fields(record, output_keys, path)?;
                Ok(MappingExample::new(inputs, outputs))
            })
            .collect()
    }
}

fn read_asset(dir: &Path, file_name: &str) -> Result<String> {
    fs::read_to_string(dir.join(file_name))
        .with_context(|| format!("reading '{}' in '{}'", file_name, dir.display()))
}

fn select_fields(
    record: &Record,
    keys: &[String],
    path: &Path,
) -> Result<HashMap<String, String>> {
    keys.iter()
        .map(|key| {
            let value = record.get(key).ok_or_else(|| {
                anyhow::anyhow!(
                    "examples file '{}' is missing template key '{}'",
                    path.display(),
                    key
                )
            })?;
            Ok((key.clone(), value.to_string()))
        })
        .collect()
}

/// Outcome of mapping one record: the raw completion, the parsed output fields, and
/// whether the completion matched the output template's shape.
#[derive(Debug, Clone)]
#[readonly::make]
pub struct MappingOutcome {
    pub raw: String,
    pub parsed: HashMap<String, String>,
    pub success: bool,
    pub error_message: Option<String>,
}

/// What to do when a completion cannot be parsed against the output template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParseFailurePolicy {
    /// Propagate the parse error to the caller; a batch halts at the first failure.
    Strict,
    /// Substitute the given value for every output key, mark the outcome as failed, and
    /// keep going.
    DefaultOnParseFailure(String),
}

/// Options for assembling the record set produced by
/// [`CompletionMapping::map_corpus`].
#[derive(Debug, Clone)]
pub struct MapCorpusOptions {
    /// Row-join the input record set onto the output record set.
    pub include_inputs: bool,
    /// Extend the output schema with the three debug fields below.
    pub include_debug_fields: bool,
    pub success_field: String,
    pub error_message_field: String,
    pub raw_completion_field: String,
}

impl Default for MapCorpusOptions {
    fn default() -> Self {
        Self {
            include_inputs: true,
            include_debug_fields: false,
            success_field: "Completion Success".to_string(),
            error_message_field: "Error Message".to_string(),
            raw_completion_field: "Completion".to_string(),
        }
    }
}

/// Text mapping engine driving records through the template/completion cycle.
pub struct CompletionMapping<C: TextCompletions> {
    definition: MappingDefinition,
    client: C,
    prompt_prefix: Prompt,
    logger: Logger,
}

impl<C: TextCompletions> CompletionMapping<C> {
    /// Build an engine, pre-rendering the fixed prompt prefix: one system turn with the
    /// guidelines, then a user/assistant turn pair per worked example.
    pub fn new(definition: MappingDefinition, client: C, logger: Logger) -> Result<Self> {
        let prompt_prefix = Self::build_prompt_prefix(&definition)?;
        Ok(Self {
            definition,
            client,
            prompt_prefix,
            logger,
        })
    }

    /// Load the definition from a directory and build an engine around it.
    pub fn load_from_directory(
        dir: impl AsRef<Path>,
        client: C,
        logger: Logger,
    ) -> Result<Self> {
        Self::new(MappingDefinition::load_from_directory(dir)?, client, logger)
    }

    fn build_prompt_prefix(definition: &MappingDefinition) -> Result<Prompt> {
        let mut messages = vec![(Role::System, definition.guidelines.clone())];
        for example in &definition.examples {
            messages.push((Role::User, definition.input_template.fill(&example.inputs)?));
            messages.push((
                Role::Assistant,
                definition.output_template.fill(&example.outputs)?,
            ));
        }
        Ok(Prompt::new(messages))
    }

    pub fn definition(&self) -> &MappingDefinition {
        &self.definition
    }

    pub fn client(&self) -> &C {
        &self.client
    }

    pub fn prompt_prefix(&self) -> &Prompt {
        &self.prompt_prefix
    }

    /// The full prompt with the final user turn left unfilled, placeholders visible.
    /// For human inspection only; never sent to the collaborator.
    pub fn prompt_template(&self) -> Prompt {
        self.prompt_prefix
            .with_message(Role::User, self.definition.input_template.raw.clone())
    }

    /// Map one record. Rendering errors and collaborator errors always propagate; a
    /// parse failure is absorbed into a failed outcome only under
    /// [`ParseFailurePolicy::DefaultOnParseFailure`].
    pub async fn map(
        &self,
        record: &impl FieldValues,
        policy: &ParseFailurePolicy,
    ) -> Result<MappingOutcome> {
        let rendered_input = self.definition.input_template.fill(record)?;
        let prompt = self
            .prompt_prefix
            .with_message(Role::User, rendered_input.clone());

        let started = Instant::now();
        let completion = self.client.run(&prompt).await?;
        let elapsed = started.elapsed();

        self.logger.object(
            LOGGING_SOURCE,
            LOGGING_COMPLETION_KEY,
            self.completion_event(&prompt, &rendered_input, &completion, elapsed),
        );

        match self.definition.output_template.parse(&completion) {
            Ok(parsed) => Ok(MappingOutcome {
                raw: completion,
                parsed,
                success: true,
                error_message: None,
            }),
            Err(parse_error) => {
                self.logger.object(
                    LOGGING_SOURCE,
                    LOGGING_ERROR_KEY,
                    self.error_event(&rendered_input, &completion, &parse_error.to_string(), policy),
                );
                match policy {
                    ParseFailurePolicy::Strict => Err(parse_error.into()),
                    ParseFailurePolicy::DefaultOnParseFailure(default) => Ok(MappingOutcome {
                        raw: completion,
                        parsed: self
                            .definition
                            .output_template
                            .keys
                            .iter()
                            .map(|key| (key.clone(), default.clone()))
                            .collect(),
                        success: false,
                        error_message: Some(parse_error.to_string()),
                    }),
                }
            }
        }
    }

    /// Map records in input order. One record's unrecovered failure aborts the batch.
    pub async fn map_batch(
        &self,
        records: &[Record],
        policy: &ParseFailurePolicy,
    ) -> Result<Vec<MappingOutcome>> {
        let mut outcomes = Vec::with_capacity(records.len());
        for record in records {
            outcomes.push(self.map(record, policy).await?);
        }
        Ok(outcomes)
    }

    /// Map a whole record set into a new record set whose fields are the output
    /// template's keys, optionally extended with debug fields and row-joined onto the
    /// input record set.
    pub async fn map_corpus(
        &self,
        corpus: &RecordSet,
        policy: &ParseFailurePolicy,
        options: &MapCorpusOptions,
    ) -> Result<RecordSet> {
        if options.include_debug_fields {
            let mut overlapping: Vec<String> = Vec::new();
            for field in [
                &options.success_field,
                &options.error_message_field,
                &options.raw_completion_field,
            ] {
                if self.definition.input_template.keys.contains(field)
                    || self.definition.output_template.keys.contains(field)
                {
                    overlapping.push(field.clone());
                }
            }
            if !overlapping.is_empty() {
                return Err(
                    SchemaConflictError::new(overlapping, "debug fields and template keys").into(),
                );
            }
        }

        let outcomes = self.map_batch(corpus.records(), policy).await?;

        let mut fields = self.definition.output_template.keys.clone();
        if options.include_debug_fields {
            fields.push(options.success_field.clone());
            fields.push(options.error_message_field.clone());
            fields.push(options.raw_completion_field.clone());
        }

        let mut records = Vec::with_capacity(outcomes.len());
        for outcome in outcomes {
            let mut field_values = outcome.parsed;
            if options.include_debug_fields {
                field_values.insert(options.success_field.clone(), outcome.success.to_string());
                field_values.insert(
                    options.error_message_field.clone(),
                    outcome.error_message.unwrap_or_default(),
                );
                field_values.insert(options.raw_completion_field.clone(), outcome.raw);
            }
            records.push(Record::new(field_values));
        }
        let output_set = RecordSet::new(fields, records)?;

        if options.include_inputs {
            corpus.join(&output_set)
        } else {
            Ok(output_set)
        }
    }

    fn base_event(&self, rendered_input: &str, completion: &str) -> JsonMap {
        let mut event = JsonMap::new();
        event.insert(
            "Model".to_string(),
            self.client
                .model_id()
                .map_or(Value::Null, |model| Value::from(model)),
        );
        event.insert(
            "Definition Directory".to_string(),
            self.definition
                .source_dir
                .as_ref()
                .map_or(Value::Null, |dir| Value::from(dir.display().to_string())),
        );
        event.insert(
            "Guidelines".to_string(),
            Value::from(format!(
                "{}...",
                self.definition
                    .guidelines
                    .chars()
                    .take(LOGGED_GUIDELINES_CHARS)
                    .collect::<String>()
            )),
        );
        event.insert("Input Message".to_string(), Value::from(rendered_input));
        event.insert("Completion".to_string(), Value::from(completion));
        event
    }

    fn completion_event(
        &self,
        prompt: &Prompt,
        rendered_input: &str,
        completion: &str,
        elapsed: Duration,
    ) -> JsonMap {
        let mut event = self.base_event(rendered_input, completion);
        event.insert(
            "Prompt Character Count".to_string(),
            Value::from(prompt.character_length() as u64),
        );
        event.insert(
            "Completion Time (seconds)".to_string(),
            Value::from(elapsed.as_secs_f64()),
        );
        event
    }

    fn error_event(
        &self,
        rendered_input: &str,
        completion: &str,
        error_message: &str,
        policy: &ParseFailurePolicy,
    ) -> JsonMap {
        let mut event = self.base_event(rendered_input, completion);
        event.insert("Error Type".to_string(), Value::from("Parse"));
        event.insert(
            "Error Default Value".to_string(),
            match policy {
                ParseFailurePolicy::Strict => Value::Null,
                ParseFailurePolicy::DefaultOnParseFailure(default) => Value::from(default.as_str()),
            },
        );
        event.insert("Error Message".to_string(), Value::from(error_message));
        event
    }
}

#[cfg(test)]
mod mapping_tests {
    use std::collections::{HashMap, VecDeque};
    use std::fs;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    use anyhow::{anyhow, Result};
    use async_trait::async_trait;

    use super::{
        CompletionMapping, MapCorpusOptions, MappingDefinition, MappingExample,
        ParseFailurePolicy,
    };
    use crate::completions::{Prompt, Role, TextCompletions};
    use crate::corpus::errors::SchemaConflictError;
    use crate::corpus::{Record, RecordSet};
    use crate::logging::Logger;
    use crate::template::errors::TemplateParseError;
    use crate::template::Template;

    struct ScriptedCompletions {
        replies: Mutex<VecDeque<String>>,
        calls: AtomicUsize,
    }

    impl ScriptedCompletions {
        fn new(replies: &[&str]) -> Self {
            Self {
                replies: Mutex::new(replies.iter().map(|r| r.to_string()).collect()),
                calls: AtomicUsize::new(0),
            }
        }

        fn call_count(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl TextCompletions for ScriptedCompletions {
        async fn run(&self, _prompt: &Prompt) -> Result<String> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.replies
                .lock()
                .unwrap()
                .pop_front()
                .ok_or_else(|| anyhow!("no scripted reply left"))
        }

        fn model_id(&self) -> Option<&str> {
            Some("scripted")
        }
    }

    fn values(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    fn definition() -> MappingDefinition {
        MappingDefinition::new(
            "Classify the sentiment of each review.",
            Template::load("Review: {text}").unwrap(),
            Template::load("Sentiment: {label}").unwrap(),
            vec![MappingExample::new(
                values(&[("text", "loved it")]),
                values(&[("label", "positive")]),
            )],
            None,
        )
        .unwrap()
    }

    fn engine(replies: &[&str]) -> CompletionMapping<ScriptedCompletions> {
        CompletionMapping::new(
            definition(),
            ScriptedCompletions::new(replies),
            Logger::disabled(),
        )
        .unwrap()
    }

    fn corpus(texts: &[&str]) -> RecordSet {
        RecordSet::new(
            vec!["text".to_string()],
            texts
                .iter()
                .map(|text| Record::new(values(&[("text", text)])))
                .collect(),
        )
        .unwrap()
    }

    #[test]
    fn test_definition_rejects_two_shared_keys() {
        let error = MappingDefinition::new(
            "guidelines",
            Template::load("{a} and {b}").unwrap(),
            Template::load("{a}, {b}").unwrap(),
            vec![],
            None,
        )
        .expect_err("two shared keys should fail");
        assert_eq!(error.overlapping.len(), 2);
    }

    #[test]
    fn test_definition_tolerates_one_shared_key() {
        assert!(MappingDefinition::new(
            "guidelines",
            Template::load("{a} and {b}").unwrap(),
            Template::load("{a} gives {c}").unwrap(),
            vec![],
            None,
        )
        .is_ok());
    }

    #[test]
    fn test_prompt_prefix_shape() {
        let engine = engine(&[]);
        let messages = engine.prompt_prefix().messages();
        assert_eq!(messages.len(), 3);
        assert_eq!(
            messages[0],
            (
                Role::System,
                "Classify the sentiment of each review.".to_string()
            )
        );
        assert_eq!(messages[1], (Role::User, "Review: loved it".to_string()));
        assert_eq!(
            messages[2],
            (Role::Assistant, "Sentiment: positive".to_string())
        );
    }

    #[test]
    fn test_prompt_template_keeps_placeholders() {
        let engine = engine(&[]);
        let template = engine.prompt_template();
        assert_eq!(template.len(), 4);
        assert_eq!(
            template.messages()[3],
            (Role::User, "Review: {text}".to_string())
        );
    }

    #[tokio::test]
    async fn test_map_parses_completion() {
        let engine = engine(&["Sentiment: negative"]);
        let record = Record::new(values(&[("text", "hated it")]));
        let outcome = engine.map(&record, &ParseFailurePolicy::Strict).await.unwrap();
        assert!(outcome.success);
        assert_eq!(outcome.parsed, values(&[("label", "negative")]));
        assert_eq!(outcome.raw, "Sentiment: negative");
        assert!(outcome.error_message.is_none());
    }

    #[tokio::test]
    async fn test_map_missing_input_field_propagates() {
        let engine = engine(&["Sentiment: negative"]);
        let record = Record::new(values(&[("other", "x")]));
        assert!(engine.map(&record, &ParseFailurePolicy::Strict).await.is_err());
        assert_eq!(engine.client().call_count(), 0);
    }

    #[tokio::test]
    async fn test_map_strict_propagates_parse_failure() {
        let engine = engine(&["no such shape"]);
        let record = Record::new(values(&[("text", "hated it")]));
        let error = engine
            .map(&record, &ParseFailurePolicy::Strict)
            .await
            .expect_err("unparseable completion should fail");
        assert!(error.downcast_ref::<TemplateParseError>().is_some());
    }

    #[tokio::test]
    async fn test_map_default_absorbs_parse_failure() {
        let engine = engine(&["no such shape"]);
        let record = Record::new(values(&[("text", "hated it")]));
        let outcome = engine
            .map(
                &record,
                &ParseFailurePolicy::DefaultOnParseFailure("unknown".to_string()),
            )
            .await
            .unwrap();
        assert!(!outcome.success);
        assert_eq!(outcome.parsed, values(&[("label", "unknown")]));
        assert_eq!(outcome.raw, "no such shape");
        assert!(outcome
            .error_message
            .as_deref()
            .unwrap()
            .contains("at start of text"));
    }

    #[tokio::test]
    async fn test_map_batch_preserves_order() {
        let engine = engine(&["Sentiment: positive", "Sentiment: negative"]);
        let records = vec![
            Record::new(values(&[("text", "good")])),
            Record::new(values(&[("text", "bad")])),
        ];
        let outcomes = engine
            .map_batch(&records, &ParseFailurePolicy::Strict)
            .await
            .unwrap();
        assert_eq!(outcomes[0].parsed["label"], "positive");
        assert_eq!(outcomes[1].parsed["label"], "negative");
    }

    #[tokio::test]
    async fn test_map_corpus_joins_inputs() {
        let engine = engine(&["Sentiment: positive", "Sentiment: negative"]);
        let mapped = engine
            .map_corpus(
                &corpus(&["good", "bad"]),
                &ParseFailurePolicy::Strict,
                &MapCorpusOptions::default(),
            )
            .await
            .unwrap();
        assert_eq!(mapped.fields(), &["text".to_string(), "label".to_string()]);
        assert_eq!(mapped.records()[1].get("text"), Some("bad"));
        assert_eq!(mapped.records()[1].get("label"), Some("negative"));
    }

    #[tokio::test]
    async fn test_map_corpus_debug_fields() {
        let engine = engine(&["Sentiment: positive", "garbage"]);
        let options = MapCorpusOptions {
            include_inputs: false,
            include_debug_fields: true,
            ..Default::default()
        };
        let mapped = engine
            .map_corpus(
                &corpus(&["good", "bad"]),
                &ParseFailurePolicy::DefaultOnParseFailure(String::new()),
                &options,
            )
            .await
            .unwrap();
        assert_eq!(
            mapped.fields(),
            &[
                "label".to_string(),
                "Completion Success".to_string(),
                "Error Message".to_string(),
                "Completion".to_string(),
            ]
        );
        assert_eq!(mapped.records()[0].get("Completion Success"), Some("true"));
        assert_eq!(mapped.records()[0].get("Error Message"), Some(""));
        assert_eq!(mapped.records()[1].get("Completion Success"), Some("false"));
        assert_eq!(mapped.records()[1].get("Completion"), Some("garbage"));
    }

    #[tokio::test]
    async fn test_map_corpus_debug_field_collision_checked_first() {
        let engine = engine(&["Sentiment: positive"]);
        let options = MapCorpusOptions {
            include_debug_fields: true,
            success_field: "label".to_string(),
            ..Default::default()
        };
        let error = engine
            .map_corpus(&corpus(&["good"]), &ParseFailurePolicy::Strict, &options)
            .await
            .expect_err("colliding debug field should fail");
        assert!(error.downcast_ref::<SchemaConflictError>().is_some());
        assert_eq!(engine.client().call_count(), 0);
    }

    #[test]
    fn test_load_from_directory_prefers_yaml() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("guidelines.txt"), "Classify reviews.\n").unwrap();
        fs::write(dir.path().join("input_template.txt"), "Review: {text}\n").unwrap();
        fs::write(dir.path().join("output_template.txt"), "Sentiment: {label}\n").unwrap();
        fs::write(
            dir.path().join("examples.yaml"),
            "-\n  text: 'from yaml'\n  label: 'positive'\n",
        )
        .unwrap();
        fs::write(
            dir.path().join("examples.tsv"),
            "text\tlabel\nfrom tsv\tnegative\n",
        )
        .unwrap();

        let definition = MappingDefinition::load_from_directory(dir.path()).unwrap();
        assert_eq!(definition.guidelines, "Classify reviews.");
        assert_eq!(definition.examples.len(), 1);
        assert_eq!(definition.examples[0].inputs["text"], "from yaml");
        assert_eq!(definition.examples[0].outputs["label"], "positive");
    }

    #[test]
    fn test_load_from_directory_falls_back_to_tsv() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("guidelines.txt"), "Classify reviews.\n").unwrap();
        fs::write(dir.path().join("input_template.txt"), "Review: {text}\n").unwrap();
        fs::write(dir.path().join("output_template.txt"), "Sentiment: {label}\n").unwrap();
        fs::write(
            dir.path().join("examples.tsv"),
            "text\tlabel\nfrom tsv\tnegative\n",
        )
        .unwrap();

        let definition = MappingDefinition::load_from_directory(dir.path()).unwrap();
        assert_eq!(definition.examples[0].outputs["label"], "negative");
        assert_eq!(definition.source_dir.as_deref(), Some(dir.path()));
    }

    #[test]
    fn test_load_from_directory_requires_examples() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("guidelines.txt"), "Classify reviews.\n").unwrap();
        fs::write(dir.path().join("input_template.txt"), "Review: {text}\n").unwrap();
        fs::write(dir.path().join("output_template.txt"), "Sentiment: {label}\n").unwrap();

        let error = MappingDefinition::load_from_directory(dir.path())
            .expect_err("missing examples should fail");
        assert!(error.to_string().contains("examples.yaml"));
    }

    #[test]
    fn test_load_from_directory_rejects_malformed_template() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("guidelines.txt"), "Classify reviews.\n").unwrap();
        fs::write(dir.path().join("input_template.txt"), "{a}{b}\n").unwrap();
        fs::write(dir.path().join("output_template.txt"), "Sentiment: {label}\n").unwrap();
        fs::write(dir.path().join("examples.tsv"), "a\tb\tlabel\n").unwrap();

        assert!(MappingDefinition::load_from_directory(dir.path()).is_err());
    }
}
