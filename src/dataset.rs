//! Reading and writing execution logs.
//!
//! A log is a `;`-delimited table with a header row and one record per attempted action:
//!
//! ```text
//! state;action;action_parameters;result;next_state
//! "{""on(a, b)"": ""True"", ""handempty"": ""False""}";stack;"[""a"", ""b""]";True;None
//! ```
//!
//! States are JSON objects mapping a fact key (`name(a, b)`, or a bare `name` for nullary
//! predicates) to `"True"` or `"False"`.

use std::collections::HashMap;
use std::fs::File;
use std::io::{Read, Write};
use std::path::Path;
use std::rc::Rc;

use itertools::Itertools;
use serde_json::{Map, Value};
use thiserror::Error;

use crate::learning::grounding::schemas;
use crate::learning::{GroundedPredicate, State};
use crate::pddl::{Domain, Predicate};

pub const HEADER: [&str; 5] = ["state", "action", "action_parameters", "result", "next_state"];

#[derive(Error, Debug)]
pub enum DatasetError {
    #[error("could not open {path}: {source}")]
    Io { path: String, #[source] source: std::io::Error },
    #[error(transparent)]
    Csv(#[from] csv::Error),
    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("unknown predicate `{0}`")]
    UnknownPredicate(String),
    #[error("predicate `{name}` expects {expected} arguments, found {found}")]
    PredicateArity { name: String, expected: usize, found: usize },
    #[error("malformed fact `{0}`")]
    MalformedFact(String),
    #[error("expected {expected} columns, found {found}")]
    ColumnCount { expected: usize, found: usize },
}

/// One attempted action application.
#[derive(Clone, Debug, PartialEq)]
pub struct Example {
    pub state: State,
    pub action: String,
    pub parameters: Vec<String>,
    pub success: bool,
    /// Absent for failed applications and for logs that only record outcomes.
    pub next_state: Option<State>,
}

/// Key under which a literal is stored in a logged state.
pub fn fact_key(literal: &GroundedPredicate) -> String {
    if literal.bindings().is_empty() {
        literal.name().to_string()
    } else {
        format!("{}({})", literal.name(), literal.arguments().join(", "))
    }
}

fn parse_fact_key(key: &str) -> Result<(&str, Vec<&str>), DatasetError> {
    let key = key.trim();
    let Some(open) = key.find('(') else {
        if key.is_empty() || key.contains(')') {
            return Err(DatasetError::MalformedFact(key.to_string()));
        }
        return Ok((key, Vec::new()));
    };
    let inner = key[open + 1..].strip_suffix(')')
        .ok_or_else(|| DatasetError::MalformedFact(key.to_string()))?;
    let name = key[..open].trim();
    if name.is_empty() {
        return Err(DatasetError::MalformedFact(key.to_string()));
    }
    let arguments: Vec<&str> = if inner.trim().is_empty() {
        Vec::new()
    } else {
        inner.split(',').map(str::trim).collect()
    };
    if arguments.iter().any(|a| a.is_empty()) {
        return Err(DatasetError::MalformedFact(key.to_string()));
    }
    Ok((name, arguments))
}

fn truth(value: &Value) -> bool {
    match value {
        Value::String(s) => s.eq_ignore_ascii_case("true"),
        Value::Bool(b) => *b,
        _ => false,
    }
}

/// Turns log records into [`Example`]s checked against a domain.
pub struct DatasetReader<'a> {
    domain: &'a Domain,
    schemas: HashMap<String, Rc<Predicate>>,
}

impl<'a> DatasetReader<'a> {
    pub fn new(domain: &'a Domain) -> Self {
        Self { domain, schemas: schemas(domain) }
    }

    /// Parses one JSON state column. The result declares every domain predicate.
    pub fn read_state(&self, text: &str) -> Result<State, DatasetError> {
        let value: Value = serde_json::from_str(text)?;
        let Value::Object(facts) = value else {
            return Err(DatasetError::MalformedFact(text.to_string()));
        };
        let mut state = State::for_domain(self.domain);
        for (key, value) in &facts {
            let (name, arguments) = parse_fact_key(key)?;
            let schema = self.schemas.get(&name.to_ascii_lowercase())
                .ok_or_else(|| DatasetError::UnknownPredicate(name.to_string()))?;
            if schema.arity() != arguments.len() {
                return Err(DatasetError::PredicateArity {
                    name: name.to_string(),
                    expected: schema.arity(),
                    found: arguments.len(),
                });
            }
            state.insert(GroundedPredicate::from_arguments(schema.clone(), arguments, truth(value)));
        }
        Ok(state)
    }

    fn example(&self, record: &csv::StringRecord) -> Result<Example, DatasetError> {
        if record.len() != HEADER.len() {
            return Err(DatasetError::ColumnCount { expected: HEADER.len(), found: record.len() });
        }
        let next_state = match record[4].trim() {
            "" => None,
            text if text.eq_ignore_ascii_case("none") => None,
            text => Some(self.read_state(text)?),
        };
        Ok(Example {
            state: self.read_state(&record[0])?,
            action: record[1].trim().to_string(),
            parameters: serde_json::from_str(&record[2])?,
            success: record[3].trim().eq_ignore_ascii_case("true"),
            next_state,
        })
    }

    pub fn load<P: AsRef<Path>>(&self, path: P) -> Result<Vec<Example>, DatasetError> {
        let path = path.as_ref();
        let file = File::open(path)
            .map_err(|source| DatasetError::Io { path: path.display().to_string(), source })?;
        let _span = tracing::span!(tracing::Level::DEBUG, "dataset", path = %path.display()).entered();
        self.load_from_reader(file)
    }

    /// Reads every record, skipping (and logging) the ones that do not fit the domain.
    pub fn load_from_reader<R: Read>(&self, reader: R) -> Result<Vec<Example>, DatasetError> {
        let mut reader = csv::ReaderBuilder::new()
            .delimiter(b';')
            .has_headers(true)
            .flexible(true)
            .from_reader(reader);
        let mut examples = Vec::new();
        for (row, record) in reader.records().enumerate() {
            // Header is line 1.
            let line = row + 2;
            let record = match record {
                Ok(record) => record,
                Err(e) if e.is_io_error() => return Err(e.into()),
                Err(e) => {
                    tracing::warn!(line, error = %e, "skipping unreadable row");
                    continue;
                }
            };
            match self.example(&record) {
                Ok(example) => examples.push(example),
                Err(e) => tracing::warn!(line, error = %e, "skipping row"),
            }
        }
        tracing::debug!(examples = examples.len(), "loaded dataset");
        Ok(examples)
    }
}

/// Writes [`Example`]s in the format [`DatasetReader`] reads.
pub struct DatasetWriter<W: Write> {
    writer: csv::Writer<W>,
    header_written: bool,
}

impl<W: Write> DatasetWriter<W> {
    pub fn new(writer: W) -> Self {
        let writer = csv::WriterBuilder::new().delimiter(b';').from_writer(writer);
        Self { writer, header_written: false }
    }

    fn header(&mut self) -> Result<(), DatasetError> {
        if !self.header_written {
            self.writer.write_record(HEADER)?;
            self.header_written = true;
        }
        Ok(())
    }

    pub fn write(&mut self, example: &Example) -> Result<(), DatasetError> {
        self.header()?;
        let next_state = match &example.next_state {
            Some(state) => render_state(state)?,
            None => "None".to_string(),
        };
        self.writer.write_record([
            render_state(&example.state)?,
            example.action.clone(),
            serde_json::to_string(&example.parameters)?,
            if example.success { "True" } else { "False" }.to_string(),
            next_state,
        ])?;
        Ok(())
    }

    /// Flushes and hands back the underlying writer.
    pub fn finish(mut self) -> Result<W, DatasetError> {
        self.header()?;
        self.writer.flush().map_err(csv::Error::from)?;
        self.writer.into_inner().map_err(|e| csv::Error::from(e.into_error()).into())
    }
}

/// JSON object form of a state. A fact stored with both polarities keeps the positive one.
pub fn render_state(state: &State) -> Result<String, DatasetError> {
    let mut facts = Map::new();
    for literal in state.literals() {
        let key = fact_key(literal);
        if !literal.is_positive() && facts.contains_key(&key) {
            continue;
        }
        let value = if literal.is_positive() { "True" } else { "False" };
        facts.insert(key, Value::String(value.to_string()));
    }
    Ok(serde_json::to_string(&Value::Object(facts))?)
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::{fact_key, parse_fact_key, DatasetError, DatasetReader, DatasetWriter, Example};
    use crate::pddl::Domain;

    const DOMAIN: &str = "(define (domain blocksworld) (:types block)
        (:predicates (on ?x - block ?y - block) (clear ?x - block) (handempty))
        (:action stack :parameters (?x - block ?y - block)))";

    const LOG: &str = "state;action;action_parameters;result;next_state
\"{\"\"on(a, b)\"\": \"\"True\"\", \"\"clear(a)\"\": \"\"true\"\", \"\"handempty\"\": \"\"False\"\"}\";stack;\"[\"\"a\"\", \"\"b\"\"]\";True;\"{\"\"on(a, b)\"\": \"\"True\"\"}\"
\"{\"\"holding(a)\"\": \"\"True\"\"}\";stack;\"[\"\"a\"\", \"\"b\"\"]\";True;None
\"{\"\"on(a)\"\": \"\"True\"\"}\";stack;\"[\"\"a\"\", \"\"b\"\"]\";True;None
\"{not json\";stack;\"[\"\"a\"\", \"\"b\"\"]\";True;None
\"{}\";stack;\"[\"\"a\"\"]\"
\"{\"\"clear(b)\"\": \"\"maybe\"\"}\";stack;\"[\"\"b\"\", \"\"a\"\"]\";False;None
";

    #[test]
    fn test_fact_keys() {
        assert_eq!(parse_fact_key("on(a, b)").unwrap(), ("on", vec!["a", "b"]));
        assert_eq!(parse_fact_key(" handempty ").unwrap(), ("handempty", vec![]));
        assert_eq!(parse_fact_key("handempty()").unwrap(), ("handempty", vec![]));
        assert!(matches!(parse_fact_key("on(a, b"), Err(DatasetError::MalformedFact(_))));
        assert!(matches!(parse_fact_key("on(a,,b)"), Err(DatasetError::MalformedFact(_))));
        assert!(matches!(parse_fact_key("(a)"), Err(DatasetError::MalformedFact(_))));
    }

    #[test]
    fn test_read_state() {
        let domain = Domain::parse(DOMAIN).unwrap();
        let reader = DatasetReader::new(&domain);
        let state = reader.read_state("{\"on(a, b)\": \"TRUE\", \"handempty\": \"False\", \"clear(c)\": \"yes\"}").unwrap();
        assert_eq!(state.names().collect::<Vec<_>>(), vec!["clear", "handempty", "on"]);
        assert_eq!(state.to_string(), "clear:\n- (not (clear c))\n\nhandempty:\n- (not (handempty))\n\non:\n- (on a b)\n\n");
        let on = state.get("on").unwrap().iter().next().unwrap();
        assert_eq!(fact_key(on), "on(a, b)");
        assert!(matches!(reader.read_state("{\"holding(a)\": \"True\"}"), Err(DatasetError::UnknownPredicate(p)) if p == "holding"));
        assert!(matches!(reader.read_state("{\"on(a)\": \"True\"}"), Err(DatasetError::PredicateArity { expected: 2, found: 1, .. })));
        assert!(matches!(reader.read_state("[1, 2]"), Err(DatasetError::MalformedFact(_))));
        assert!(matches!(reader.read_state("{"), Err(DatasetError::Json(_))));
    }

    #[test]
    fn test_malformed_rows_are_skipped() {
        let domain = Domain::parse(DOMAIN).unwrap();
        let reader = DatasetReader::new(&domain);
        let examples = reader.load_from_reader(LOG.as_bytes()).unwrap();
        assert_eq!(examples.len(), 2);
        assert_eq!(examples[0].parameters, vec!["a", "b"]);
        assert!(examples[0].success);
        assert_eq!(examples[0].state.len(), 3);
        assert_eq!(examples[0].next_state.as_ref().map(|s| s.len()), Some(1));
        assert!(!examples[1].success);
        assert!(examples[1].next_state.is_none());
        assert!(!examples[1].state.literals().next().unwrap().is_positive());
    }

    #[test]
    fn test_load_from_file() {
        let domain = Domain::parse(DOMAIN).unwrap();
        let reader = DatasetReader::new(&domain);
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(LOG.as_bytes()).unwrap();
        assert_eq!(reader.load(file.path()).unwrap().len(), 2);

        let empty = tempfile::NamedTempFile::new().unwrap();
        assert!(reader.load(empty.path()).unwrap().is_empty());

        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("missing.csv");
        assert!(matches!(reader.load(&missing), Err(DatasetError::Io { .. })));
    }

    #[test]
    fn test_writer_round_trip() {
        let domain = Domain::parse(DOMAIN).unwrap();
        let reader = DatasetReader::new(&domain);
        let examples: Vec<Example> = reader.load_from_reader(LOG.as_bytes()).unwrap();

        let mut writer = DatasetWriter::new(Vec::new());
        for example in &examples {
            writer.write(example).unwrap();
        }
        let bytes = writer.finish().unwrap();
        let text = String::from_utf8(bytes.clone()).unwrap();
        assert!(text.starts_with("state;action;action_parameters;result;next_state\n"));
        assert_eq!(reader.load_from_reader(bytes.as_slice()).unwrap(), examples);
    }

    #[test]
    fn test_empty_writer_emits_header() {
        let bytes = DatasetWriter::new(Vec::new()).finish().unwrap();
        assert_eq!(String::from_utf8(bytes).unwrap(), "state;action;action_parameters;result;next_state\n");
    }
}
