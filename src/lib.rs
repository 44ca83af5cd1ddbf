//! # llmap
//!
//! Template-driven framework for mapping schematized text records through LLM completions.
//!
//! ## Concepts and Design
//! `llmap` follows data-driven design. A mapping is defined entirely by human-authored
//! prompt assets on disk, so users should easily track every string that ends up in a
//! prompt and every string that comes back out of a completion.
//!
//! ### Template
//!
//! A [`Template`](crate::template::Template) is a string of alternating literal text and
//! named placeholders like `{this}`. It supports two directions:
//!
//! * **fill** — substitute values into the placeholders to produce a concrete string.
//! * **parse** — the inverse: recover placeholder values from text that follows the
//!   template's literal structure.
//!
//! The two directions round-trip for well-formed text, which is what makes a template
//! usable both for rendering prompts and for extracting fields from completions.
//!
//! ### Mapping Definition
//!
//! A [`MappingDefinition`](crate::mapping::MappingDefinition) bundles guidelines text, an
//! input template, an output template, and worked examples. It is loaded from a directory
//! of four files and is immutable thereafter.
//!
//! ### Record and Record Set
//!
//! A [`Record`](crate::corpus::Record) is an immutable mapping from field name to string
//! value. A [`RecordSet`](crate::corpus::RecordSet) is an ordered, schema-uniform
//! collection of records that can be loaded from and saved to TSV or YAML files, and
//! row-joined with another record set over disjoint fields.
//!
//! ### Mapping Engine
//!
//! A [`CompletionMapping`](crate::mapping::CompletionMapping) renders one record into a
//! prompt, sends it to a [`TextCompletions`](crate::completions::TextCompletions)
//! collaborator, inverse-parses the completion against the output template, and packages
//! the outcome. Batch and whole-corpus variants drive records strictly in input order.
//!
//! ### Endpoint or LLM
//!
//! The completion collaborator is a trait, so the engine never knows whether it is
//! talking to OpenAI (the built-in implementation behind the `openai` feature) or to a
//! scripted stub in a test.
//!
//! ### Observability
//!
//! Every mapping attempt is recorded through an explicit
//! [`Logger`](crate::logging::Logger) handed to the engine at construction. The log is an
//! append-only line-oriented file with a small query interface; there is no process-global
//! logging state.

pub mod completions;
pub mod corpus;
pub mod logging;
pub mod mapping;
pub mod template;

use serde_json::{Map, Value};

pub type JsonMap = Map<String, Value>;
