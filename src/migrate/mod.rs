//! JMock to Mockito migration of one compilation unit.
//!
//! [`migrate_unit`] runs the passes in a fixed order over copy-on-write
//! units: scaffold, expectation blocks, orphaned rule calls, then imports and
//! test annotations. Any host failure returns the unit exactly as found.

pub mod classify;
pub mod cleaner;
pub mod extract;
pub mod junit;
pub mod names;
pub mod plan;
pub mod retention;
pub mod scaffold;

use std::collections::BTreeMap;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use tree_sitter::Node;

use crate::config::{FailurePolicy, MigrateConfig};
use crate::error::{ExpectationError, JavaError};
use crate::java::format::reformat;
use crate::java::splice::{remove_statements, splice_statements, Position};
use crate::java::{
    child_of_kind, find_all, line_of, named_children, statements, type_path, ImportRequests,
    JavaUnit, TextEdit, TextRange, TypeResolver, UnitSymbols,
};
use crate::migrate::junit::TestAnnotationMigration;
use crate::migrate::retention::is_kept;
use crate::migrate::names::{CHECKING, EXPECTATIONS, MOCKERY, MOCKITO, SOURCE_TYPES};

/// How far the migration of a unit got.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "kebab-case")]
pub enum MigrationState {
    /// The unit does not use any rule type; nothing was done.
    NotApplicable,
    ScaffoldRewritten,
    BlocksRewritten,
    Cleaned,
    Done,
    /// The unit was returned as found.
    Aborted,
}

impl std::fmt::Display for MigrationState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            MigrationState::NotApplicable => "not-applicable",
            MigrationState::ScaffoldRewritten => "scaffold-rewritten",
            MigrationState::BlocksRewritten => "blocks-rewritten",
            MigrationState::Cleaned => "cleaned",
            MigrationState::Done => "done",
            MigrationState::Aborted => "aborted",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "kebab-case")]
pub enum DiagnosticKind {
    MalformedExpectation,
    UnsupportedArgumentShape,
    UnresolvedType,
    DroppedInteraction,
    /// A class keeps its rule fields because something that survives the
    /// rewrite still uses them.
    RuleFieldKept,
    SkippedTestAnnotation,
    UnitAborted,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Info,
    Warning,
    Error,
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Severity::Info => "info",
            Severity::Warning => "warning",
            Severity::Error => "error",
        };
        f.write_str(name)
    }
}

/// A construct the migration skipped or could not handle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct Diagnostic {
    pub kind: DiagnosticKind,
    pub severity: Severity,
    /// 1-based line in the input source.
    pub line: usize,
    pub message: String,
}

impl Diagnostic {
    pub fn new(
        kind: DiagnosticKind,
        severity: Severity,
        line: usize,
        message: impl Into<String>,
    ) -> Self {
        Self {
            kind,
            severity,
            line,
            message: message.into(),
        }
    }

    /// Malformed blocks are errors; an unsupported shape only leaves its
    /// block on JMock.
    fn from_expectation(error: &ExpectationError) -> Self {
        let (kind, severity) = match error {
            ExpectationError::MalformedExpectation { .. } => {
                (DiagnosticKind::MalformedExpectation, Severity::Error)
            }
            ExpectationError::UnsupportedArgumentShape { .. } => {
                (DiagnosticKind::UnsupportedArgumentShape, Severity::Warning)
            }
        };
        Self::new(kind, severity, error.line(), error.to_string())
    }
}

/// Result of migrating one compilation unit.
#[derive(Debug, Clone)]
pub struct MigrationOutcome {
    /// Rewritten source, or the input when nothing changed.
    pub source: String,
    pub changed: bool,
    pub state: MigrationState,
    pub blocks_rewritten: usize,
    pub diagnostics: Vec<Diagnostic>,
}

/// Migrate one Java compilation unit.
pub fn migrate_unit(source: &str, config: &MigrateConfig) -> MigrationOutcome {
    let mut diagnostics = Vec::new();
    let unit = match JavaUnit::parse(source) {
        Ok(unit) => unit,
        Err(e) => return aborted(source, diagnostics, &e.to_string(), 1),
    };
    let symbols = UnitSymbols::build(&unit, &config.types);

    if !SOURCE_TYPES.iter().any(|ty| symbols.uses_type(&unit, ty)) {
        tracing::debug!("no rule types referenced, skipping unit");
        return MigrationOutcome {
            source: source.to_string(),
            changed: false,
            state: MigrationState::NotApplicable,
            blocks_rewritten: 0,
            diagnostics,
        };
    }

    let mut migration = Migration {
        symbols: &symbols,
        config,
        baseline: unit.error_count(),
        imports: ImportRequests::new(),
        diagnostics: &mut diagnostics,
        state: MigrationState::NotApplicable,
        blocks_rewritten: 0,
        tests_blocked: None,
        kept: BTreeMap::new(),
    };

    match migration.run(unit) {
        Ok(Some(unit)) => {
            let state = migration.state;
            let blocks_rewritten = migration.blocks_rewritten;
            let output = unit.into_source();
            let changed = output != source;
            tracing::info!(%state, blocks_rewritten, changed, "migrated unit");
            MigrationOutcome {
                source: output,
                changed,
                state,
                blocks_rewritten,
                diagnostics,
            }
        }
        Ok(None) => {
            let line = diagnostics
                .iter()
                .find(|d| d.severity == Severity::Error)
                .map(|d| d.line)
                .unwrap_or(1);
            aborted(
                source,
                diagnostics,
                "expectation block could not be rewritten; unit left as found",
                line,
            )
        }
        Err(e) => {
            let line = match &e {
                JavaError::SyntaxRegression { line, .. } => *line,
                _ => 1,
            };
            aborted(source, diagnostics, &e.to_string(), line)
        }
    }
}

fn aborted(
    source: &str,
    mut diagnostics: Vec<Diagnostic>,
    reason: &str,
    line: usize,
) -> MigrationOutcome {
    tracing::warn!("unit left unchanged: {reason}");
    diagnostics.push(Diagnostic::new(
        DiagnosticKind::UnitAborted,
        Severity::Error,
        line,
        reason,
    ));
    MigrationOutcome {
        source: source.to_string(),
        changed: false,
        state: MigrationState::Aborted,
        blocks_rewritten: 0,
        diagnostics,
    }
}

/// State threaded through the passes of one unit.
struct Migration<'a> {
    symbols: &'a UnitSymbols,
    config: &'a MigrateConfig,
    /// Parse errors of the input; no pass may add to them.
    baseline: usize,
    imports: ImportRequests,
    diagnostics: &'a mut Vec<Diagnostic>,
    state: MigrationState,
    blocks_rewritten: usize,
    /// Line of an `@Test(...)` that blocks the Jupiter migration.
    tests_blocked: Option<usize>,
    /// Classes that keep their rule fields, with the line of the first
    /// reference that survives.
    kept: BTreeMap<String, usize>,
}

/// What the survey of the input unit found.
struct Survey {
    /// A block failed with `MalformedExpectation`.
    malformed: bool,
    /// `checking(...)` statements of the blocks that can be rewritten.
    rewritable: Vec<TextRange>,
}

/// A block opened by `<mockery>.checking(new Expectations() {{ ... }})`.
enum Candidate<'t> {
    Block {
        /// The `checking(...)` statement.
        checking: Node<'t>,
        /// The initializer block inside the anonymous `Expectations`.
        body: Node<'t>,
    },
    UnresolvedReceiver {
        line: usize,
        receiver: String,
    },
}

impl Migration<'_> {
    /// Run every pass. `Ok(None)` means the failure policy asks for the unit
    /// to be left as found.
    ///
    /// Diagnostics are collected from the input unit before anything is
    /// rewritten, so their lines refer to the input.
    fn run(&mut self, unit: JavaUnit) -> Result<Option<JavaUnit>, JavaError> {
        let survey = self.survey_blocks(&unit);
        if survey.malformed && self.config.failure_policy == FailurePolicy::LeaveUnit {
            return Ok(None);
        }
        self.kept = retention::kept_rule_owners(&unit, self.symbols, &survey.rewritable);
        for (class, line) in &self.kept {
            tracing::warn!(class = %class, line, "rule field still in use, class left on JMock");
            self.diagnostics.push(Diagnostic::new(
                DiagnosticKind::RuleFieldKept,
                Severity::Warning,
                *line,
                format!("rule fields of `{class}` still in use; class left on JMock"),
            ));
        }
        self.tests_blocked = junit::blocking_annotation(&unit, self.symbols);

        let scaffold = scaffold::rewrite_classes(
            &unit,
            self.symbols,
            &self.kept,
            &mut self.imports,
            self.diagnostics,
        );

        let unit = self.commit(unit, scaffold.edits)?;
        self.state = MigrationState::ScaffoldRewritten;

        let edits = self.rewrite_blocks(&unit)?;
        let unit = self.commit(unit, edits)?;
        self.state = MigrationState::BlocksRewritten;

        let edits = cleaner::clean(&unit, self.symbols, &scaffold.retired_classes);
        let mut unit = self.commit(unit, edits)?;
        self.state = MigrationState::Cleaned;

        if self.blocks_rewritten > 0 {
            for member in ["when", "verify", "times"] {
                self.imports.request_import(MOCKITO, Some(member));
            }
            if self.config.migrate_test_annotations {
                unit = self.migrate_tests(unit)?;
            }
        }
        if let Some(edit) = self.imports.commit(&unit, &self.config.imports) {
            unit = self.commit(unit, vec![edit])?;
        }
        self.state = MigrationState::Done;
        Ok(Some(unit))
    }

    /// Apply `edits`, tidy the touched lines and check the result still
    /// parses as well as the input did.
    fn commit(&self, unit: JavaUnit, edits: Vec<TextEdit>) -> Result<JavaUnit, JavaError> {
        if edits.is_empty() {
            return Ok(unit);
        }
        let (next, touched) = unit.apply(edits)?;
        let verbatim = next.multiline_literals();
        let next = JavaUnit::parse(reformat(next.source(), &touched, &verbatim))?;
        next.ensure_no_regression(self.baseline)?;
        Ok(next)
    }

    /// Record a diagnostic for every expectation block that will not be
    /// rewritten or loses interactions, and collect the blocks that will.
    fn survey_blocks(&mut self, unit: &JavaUnit) -> Survey {
        let mut survey = Survey {
            malformed: false,
            rewritable: Vec::new(),
        };
        for block in find_all(unit.root(), "block") {
            let (checking, body) = match candidate(unit, self.symbols, block) {
                Some(Candidate::Block { checking, body }) => (checking, body),
                Some(Candidate::UnresolvedReceiver { line, receiver }) => {
                    self.diagnostics.push(Diagnostic::new(
                        DiagnosticKind::UnresolvedType,
                        Severity::Warning,
                        line,
                        format!("cannot resolve the type of `{receiver}`; block left unchanged"),
                    ));
                    continue;
                }
                None => continue,
            };

            let extraction = match extract::extract(unit, body) {
                Ok(extraction) => extraction,
                Err(e) => {
                    tracing::warn!("expectation block left unchanged: {e}");
                    self.diagnostics.push(Diagnostic::from_expectation(&e));
                    survey.malformed |= matches!(e, ExpectationError::MalformedExpectation { .. });
                    continue;
                }
            };
            for dropped in &extraction.dropped {
                tracing::info!(line = dropped.line, "dropped expectation: {}", dropped.reason);
                self.diagnostics.push(Diagnostic::new(
                    DiagnosticKind::DroppedInteraction,
                    Severity::Info,
                    dropped.line,
                    dropped.reason.clone(),
                ));
            }
            if extraction.interactions.is_empty() {
                self.diagnostics.push(Diagnostic::new(
                    DiagnosticKind::DroppedInteraction,
                    Severity::Warning,
                    line_of(checking),
                    "expectation block has no complete interaction; left in place",
                ));
            } else {
                survey
                    .rewritable
                    .push(TextRange::new(checking.start_byte(), checking.end_byte()));
            }
        }
        survey
    }

    /// Edits replacing every rewritable expectation block with stubs and
    /// verifications.
    fn rewrite_blocks(&mut self, unit: &JavaUnit) -> Result<Vec<TextEdit>, JavaError> {
        let mut edits = Vec::new();

        for block in find_all(unit.root(), "block") {
            let Some(Candidate::Block { checking, body }) = candidate(unit, self.symbols, block)
            else {
                continue;
            };
            if is_kept(&type_path(unit, checking), &self.kept) {
                continue;
            }
            let Ok(extraction) = extract::extract(unit, body) else {
                continue;
            };
            let plan = plan::plan(&extraction.interactions);
            if plan.is_empty() {
                continue;
            }

            if statements(block).len() == 1 {
                let fragment = plan.stubs.followed_by(&plan.verifications);
                edits.push(splice_statements(
                    unit,
                    block,
                    Position::First,
                    fragment.template(),
                    fragment.arguments(),
                )?);
            } else {
                edits.push(splice_statements(
                    unit,
                    block,
                    Position::First,
                    plan.stubs.template(),
                    plan.stubs.arguments(),
                )?);
                edits.push(splice_statements(
                    unit,
                    block,
                    Position::Last,
                    plan.verifications.template(),
                    plan.verifications.arguments(),
                )?);
            }
            edits.extend(remove_statements(unit, &[checking]));

            for (owner, member) in &extraction.matcher_imports {
                self.imports.request_import(*owner, Some(*member));
            }
            self.blocks_rewritten += 1;
            tracing::debug!(
                interactions = extraction.interactions.len(),
                "rewrote expectation block"
            );
        }

        Ok(edits)
    }

    fn migrate_tests(&mut self, unit: JavaUnit) -> Result<JavaUnit, JavaError> {
        if let Some((class, line)) = self.kept.iter().next() {
            self.diagnostics.push(Diagnostic::new(
                DiagnosticKind::SkippedTestAnnotation,
                Severity::Info,
                *line,
                format!("`{class}` still runs JUnit 4 rules; test annotations left as JUnit 4"),
            ));
            return Ok(unit);
        }
        if let Some(line) = self.tests_blocked {
            self.diagnostics.push(Diagnostic::new(
                DiagnosticKind::SkippedTestAnnotation,
                Severity::Info,
                line,
                "@Test with arguments has no Jupiter equivalent; test annotations left as JUnit 4",
            ));
            return Ok(unit);
        }
        match junit::migrate_test_annotations(&unit, self.symbols, &mut self.imports) {
            TestAnnotationMigration::Migrated { edits, count } => {
                tracing::debug!("moved {count} @Test annotations to Jupiter");
                self.commit(unit, edits)
            }
            TestAnnotationMigration::Skipped { .. } | TestAnnotationMigration::NothingToDo => {
                Ok(unit)
            }
        }
    }
}

/// Match `block` against the expectation block shape: its first statement is
/// `<receiver>.checking(new Expectations() {{ ... }})` with a receiver of
/// type `org.jmock.Mockery`.
fn candidate<'t>(
    unit: &JavaUnit,
    resolver: &dyn TypeResolver,
    block: Node<'t>,
) -> Option<Candidate<'t>> {
    let first = statements(block).into_iter().next()?;
    if first.kind() != "expression_statement" {
        return None;
    }
    let call = named_children(first)
        .into_iter()
        .next()
        .filter(|expr| expr.kind() == "method_invocation")?;
    let name = call.child_by_field_name("name").map(|n| unit.text(n))?;
    if name != CHECKING {
        return None;
    }

    let args = named_children(call.child_by_field_name("arguments")?);
    let [creation] = args.as_slice() else {
        return None;
    };
    if creation.kind() != "object_creation_expression" {
        return None;
    }
    let is_expectations = creation
        .child_by_field_name("type")
        .and_then(|ty| resolver.resolve_type_name(unit.text(ty)))
        .is_some_and(|ty| ty.qualified_name() == EXPECTATIONS);
    if !is_expectations {
        return None;
    }

    let receiver = call.child_by_field_name("object")?;
    match resolver.receiver_type(unit, receiver) {
        Some(ty) if resolver.is_of_type(&ty, MOCKERY) => {}
        Some(_) => return None,
        None => {
            return Some(Candidate::UnresolvedReceiver {
                line: line_of(first),
                receiver: unit.text(receiver).to_string(),
            })
        }
    }

    let class_body = child_of_kind(*creation, "class_body")?;
    let body = named_children(class_body)
        .into_iter()
        .find(|n| n.kind() == "block")?;
    Some(Candidate::Block {
        checking: first,
        body,
    })
}
