//! Scripted in-memory stand-in for the native Oracle client.
//!
//! Statements are matched against registered rules by case-insensitive
//! substring on whitespace-normalized SQL; the most recently registered rule
//! wins. Sequences are modelled closely enough for `NEXTVAL`/`CURRVAL`,
//! `ALTER SEQUENCE` and the catalog lookups the adapter issues.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use lazy_static::lazy_static;
use regex::Regex;

use crate::config::OracleOptions;
use crate::driver::{NativeDriver, NativeSession};
use crate::error::NativeError;
use crate::types::{CommitMode, NativeStatementType, RowValues};

lazy_static! {
    static ref NEXTVAL: Regex =
        Regex::new(r"^select ([\w.$#]+)\.nextval from dual").expect("valid nextval");
    static ref CURRVAL: Regex =
        Regex::new(r"^select ([\w.$#]+)\.currval from dual").expect("valid currval");
    static ref ALTER_SEQUENCE: Regex = Regex::new(
        r"^alter sequence ([\w.$#]+) increment by (-?\d+)(?: minvalue (-?\d+))?"
    )
    .expect("valid alter sequence");
    static ref CREATE_SEQUENCE: Regex =
        Regex::new(r"^create sequence ([\w.$#]+)").expect("valid create sequence");
    static ref MIN_VALUE: Regex =
        Regex::new(r"^select min_value from all_sequences where sequence_name = '([^']+)'")
            .expect("valid min_value");
    static ref SEQUENCE_PROBE: Regex = Regex::new(
        r"^select sequence_name from (?:all|user)_sequences where sequence_name = '([^']+)'"
    )
    .expect("valid sequence probe");
}

fn normalize(sql: &str) -> String {
    sql.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

fn bare(name: &str) -> String {
    name.rsplit_once('.')
        .map_or(name, |(_, n)| n)
        .to_lowercase()
}

fn statement_type(normalized: &str) -> NativeStatementType {
    match normalized.split_whitespace().next().unwrap_or_default() {
        "select" | "with" => NativeStatementType::Select,
        "describe" => NativeStatementType::Describe,
        "insert" => NativeStatementType::Insert,
        "update" => NativeStatementType::Update,
        "delete" => NativeStatementType::Delete,
        "merge" => NativeStatementType::Merge,
        "create" => NativeStatementType::Create,
        "alter" => NativeStatementType::Alter,
        "drop" => NativeStatementType::Drop,
        "begin" => NativeStatementType::Begin,
        "declare" => NativeStatementType::Declare,
        "call" => NativeStatementType::Call,
        _ => NativeStatementType::Unknown,
    }
}

#[derive(Debug, Clone)]
enum Outcome {
    Rows(Vec<Vec<RowValues>>),
    Affected(u64),
    Fail(NativeError),
}

#[derive(Debug, Clone)]
struct Rule {
    pattern: String,
    outcome: Outcome,
}

#[derive(Debug, Clone)]
struct SequenceState {
    last: i64,
    increment: i64,
    min_value: i64,
    defined_in_session: bool,
}

#[derive(Debug, Default)]
struct ScriptState {
    rules: Vec<Rule>,
    parse_failures: Vec<Rule>,
    open_failure: Option<NativeError>,
    sequences: HashMap<String, SequenceState>,
    executed: Vec<(String, CommitMode)>,
    prefetches: Vec<u32>,
    commits: usize,
    rollbacks: usize,
    cancels: usize,
    frees: usize,
    closed: bool,
}

impl ScriptState {
    fn matching_rule(rules: &[Rule], normalized: &str) -> Option<Outcome> {
        rules
            .iter()
            .rev()
            .find(|rule| normalized.contains(&rule.pattern))
            .map(|rule| rule.outcome.clone())
    }

    /// Statements answered by the sequence model, if this is one of them.
    fn sequence_outcome(&mut self, normalized: &str) -> Option<Outcome> {
        if let Some(caps) = NEXTVAL.captures(normalized) {
            let name = bare(&caps[1]);
            let Some(seq) = self.sequences.get_mut(&name) else {
                return Some(Outcome::Fail(NativeError::with_code(
                    2289,
                    "ORA-02289: sequence does not exist",
                )));
            };
            let next = seq.last + seq.increment;
            if next < seq.min_value {
                return Some(Outcome::Fail(NativeError::with_code(
                    8004,
                    format!("ORA-08004: sequence {name}.NEXTVAL goes below MINVALUE"),
                )));
            }
            seq.last = next;
            seq.defined_in_session = true;
            return Some(Outcome::Rows(vec![vec![RowValues::Int(next)]]));
        }
        if let Some(caps) = CURRVAL.captures(normalized) {
            let name = bare(&caps[1]);
            return Some(match self.sequences.get(&name) {
                Some(seq) if seq.defined_in_session => {
                    Outcome::Rows(vec![vec![RowValues::Int(seq.last)]])
                }
                Some(_) => Outcome::Fail(NativeError::with_code(
                    8002,
                    format!("ORA-08002: sequence {name}.CURRVAL is not yet defined in this session"),
                )),
                None => Outcome::Fail(NativeError::with_code(
                    2289,
                    "ORA-02289: sequence does not exist",
                )),
            });
        }
        if let Some(caps) = ALTER_SEQUENCE.captures(normalized) {
            let name = bare(&caps[1]);
            let Some(seq) = self.sequences.get_mut(&name) else {
                return Some(Outcome::Fail(NativeError::with_code(
                    2289,
                    "ORA-02289: sequence does not exist",
                )));
            };
            seq.increment = caps[2].parse().unwrap_or(1);
            if let Some(min) = caps.get(3).and_then(|m| m.as_str().parse().ok()) {
                seq.min_value = min;
            }
            return Some(Outcome::Affected(0));
        }
        if let Some(caps) = CREATE_SEQUENCE.captures(normalized) {
            self.sequences.insert(
                bare(&caps[1]),
                SequenceState {
                    last: 0,
                    increment: 1,
                    min_value: 1,
                    defined_in_session: false,
                },
            );
            return Some(Outcome::Affected(0));
        }
        if let Some(caps) = MIN_VALUE.captures(normalized) {
            let rows = self
                .sequences
                .get(&bare(&caps[1]))
                .map(|seq| vec![vec![RowValues::Int(seq.min_value)]])
                .unwrap_or_default();
            return Some(Outcome::Rows(rows));
        }
        if let Some(caps) = SEQUENCE_PROBE.captures(normalized) {
            let name = bare(&caps[1]);
            let rows = if self.sequences.contains_key(&name) {
                vec![vec![RowValues::Text(name.to_uppercase())]]
            } else {
                Vec::new()
            };
            return Some(Outcome::Rows(rows));
        }
        if normalized == "select sequence_name from all_sequences" {
            let mut names: Vec<&String> = self.sequences.keys().collect();
            names.sort();
            let rows = names
                .into_iter()
                .map(|name| vec![RowValues::Text(name.to_uppercase())])
                .collect();
            return Some(Outcome::Rows(rows));
        }
        None
    }
}

/// Driver handle; clones share the same script and logs.
#[derive(Debug, Clone, Default)]
pub struct ScriptedOracle {
    state: Arc<Mutex<ScriptState>>,
}

impl ScriptedOracle {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, ScriptState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Answer statements containing `pattern` with `rows`.
    pub fn on_query(&self, pattern: &str, rows: Vec<Vec<RowValues>>) -> &Self {
        self.lock().rules.push(Rule {
            pattern: normalize(pattern),
            outcome: Outcome::Rows(rows),
        });
        self
    }

    /// Report `affected` rows for statements containing `pattern`.
    pub fn on_execute(&self, pattern: &str, affected: u64) -> &Self {
        self.lock().rules.push(Rule {
            pattern: normalize(pattern),
            outcome: Outcome::Affected(affected),
        });
        self
    }

    /// Fail execution of statements containing `pattern`.
    pub fn fail_on(&self, pattern: &str, error: NativeError) -> &Self {
        self.lock().rules.push(Rule {
            pattern: normalize(pattern),
            outcome: Outcome::Fail(error),
        });
        self
    }

    /// Fail parsing of statements containing `pattern`.
    pub fn fail_parse(&self, pattern: &str, error: NativeError) -> &Self {
        self.lock().parse_failures.push(Rule {
            pattern: normalize(pattern),
            outcome: Outcome::Fail(error),
        });
        self
    }

    pub fn fail_open(&self, error: NativeError) -> &Self {
        self.lock().open_failure = Some(error);
        self
    }

    /// Register a sequence whose last generated value is `last`.
    pub fn with_sequence(&self, name: &str, last: i64, min_value: i64) -> &Self {
        self.lock().sequences.insert(
            bare(name),
            SequenceState {
                last,
                increment: 1,
                min_value,
                defined_in_session: false,
            },
        );
        self
    }

    /// Value the next `NEXTVAL` of `name` would produce.
    #[must_use]
    pub fn peek_nextval(&self, name: &str) -> Option<i64> {
        self.lock()
            .sequences
            .get(&bare(name))
            .map(|seq| seq.last + seq.increment)
    }

    /// Every executed statement with its commit flag, in order.
    #[must_use]
    pub fn executed(&self) -> Vec<(String, CommitMode)> {
        self.lock().executed.clone()
    }

    #[must_use]
    pub fn executed_sql(&self) -> Vec<String> {
        self.lock()
            .executed
            .iter()
            .map(|(sql, _)| sql.clone())
            .collect()
    }

    /// How many executed statements contain `pattern`.
    #[must_use]
    pub fn count_matching(&self, pattern: &str) -> usize {
        let pattern = normalize(pattern);
        self.lock()
            .executed
            .iter()
            .filter(|(sql, _)| normalize(sql).contains(&pattern))
            .count()
    }

    #[must_use]
    pub fn prefetches(&self) -> Vec<u32> {
        self.lock().prefetches.clone()
    }

    #[must_use]
    pub fn commits(&self) -> usize {
        self.lock().commits
    }

    #[must_use]
    pub fn rollbacks(&self) -> usize {
        self.lock().rollbacks
    }

    #[must_use]
    pub fn cancels(&self) -> usize {
        self.lock().cancels
    }

    #[must_use]
    pub fn frees(&self) -> usize {
        self.lock().frees
    }

    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.lock().closed
    }
}

#[async_trait]
impl NativeDriver for ScriptedOracle {
    type Session = ScriptedSession;

    async fn open(&self, _options: &OracleOptions) -> Result<Self::Session, NativeError> {
        let mut state = self.lock();
        if let Some(error) = state.open_failure.clone() {
            return Err(error);
        }
        state.closed = false;
        for seq in state.sequences.values_mut() {
            seq.defined_in_session = false;
        }
        Ok(ScriptedSession {
            driver: self.clone(),
        })
    }
}

/// Session opened by [`ScriptedOracle`].
#[derive(Debug)]
pub struct ScriptedSession {
    driver: ScriptedOracle,
}

/// Parsed statement of a [`ScriptedSession`].
#[derive(Debug)]
pub struct ScriptedStatement {
    sql: String,
    normalized: String,
    kind: NativeStatementType,
    rows: Vec<Vec<RowValues>>,
    num_rows: u64,
}

#[async_trait]
impl NativeSession for ScriptedSession {
    type Statement = ScriptedStatement;

    async fn parse(&mut self, sql: &str) -> Result<Self::Statement, NativeError> {
        let normalized = normalize(sql);
        let state = self.driver.lock();
        if let Some(Outcome::Fail(error)) =
            ScriptState::matching_rule(&state.parse_failures, &normalized)
        {
            return Err(error);
        }
        Ok(ScriptedStatement {
            sql: sql.to_string(),
            kind: statement_type(&normalized),
            normalized,
            rows: Vec::new(),
            num_rows: 0,
        })
    }

    async fn execute(
        &mut self,
        statement: &mut Self::Statement,
        mode: CommitMode,
    ) -> Result<(), NativeError> {
        let mut state = self.driver.lock();
        state.executed.push((statement.sql.clone(), mode));

        let outcome = match ScriptState::matching_rule(&state.rules, &statement.normalized) {
            Some(Outcome::Fail(error)) => Some(Outcome::Fail(error)),
            scripted => state.sequence_outcome(&statement.normalized).or(scripted),
        };
        match outcome {
            Some(Outcome::Fail(error)) => Err(error),
            Some(Outcome::Rows(rows)) => {
                statement.rows = rows;
                Ok(())
            }
            Some(Outcome::Affected(affected)) => {
                statement.num_rows = affected;
                Ok(())
            }
            None => Ok(()),
        }
    }

    fn statement_type(&self, statement: &Self::Statement) -> NativeStatementType {
        statement.kind
    }

    fn set_prefetch(&mut self, _statement: &mut Self::Statement, rows: u32) {
        self.driver.lock().prefetches.push(rows);
    }

    async fn fetch_all(
        &mut self,
        statement: &mut Self::Statement,
        skip: usize,
        max_rows: Option<usize>,
    ) -> Result<Vec<Vec<RowValues>>, NativeError> {
        let remaining = std::mem::take(&mut statement.rows).into_iter().skip(skip);
        let rows: Vec<Vec<RowValues>> = match max_rows {
            Some(max) => remaining.take(max).collect(),
            None => remaining.collect(),
        };
        statement.num_rows = rows.len() as u64;
        Ok(rows)
    }

    fn num_rows(&self, statement: &Self::Statement) -> u64 {
        statement.num_rows
    }

    async fn cancel(&mut self, _statement: &mut Self::Statement) -> Result<(), NativeError> {
        self.driver.lock().cancels += 1;
        Ok(())
    }

    fn free(&mut self, _statement: Self::Statement) {
        self.driver.lock().frees += 1;
    }

    async fn commit(&mut self) -> Result<(), NativeError> {
        self.driver.lock().commits += 1;
        Ok(())
    }

    async fn rollback(&mut self) -> Result<(), NativeError> {
        self.driver.lock().rollbacks += 1;
        Ok(())
    }

    async fn close(&mut self) -> Result<bool, NativeError> {
        self.driver.lock().closed = true;
        Ok(true)
    }
}
