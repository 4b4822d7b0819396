use crate::migrate::extract::MockInteraction;

/// Stub statement: `when(<mock>.<call>).thenReturn(<value>);`
pub const STUB_TEMPLATE: &str = "when(#{}).thenReturn(#{});";
/// Verification statement: `verify(<mock>, times(1)).<call>;`
pub const VERIFY_TEMPLATE: &str = "verify(#{}, times(1))#{};";

/// A multi-statement fragment spliced at one coordinate: newline-joined
/// templates plus the flat argument list that fills them.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StatementPlan {
    template: String,
    arguments: Vec<String>,
    statements: usize,
}

impl StatementPlan {
    fn push(&mut self, template: &str, arguments: [String; 2]) {
        if !self.template.is_empty() {
            self.template.push('\n');
        }
        self.template.push_str(template);
        self.arguments.extend(arguments);
        self.statements += 1;
    }

    pub fn template(&self) -> &str {
        &self.template
    }

    pub fn arguments(&self) -> &[String] {
        &self.arguments
    }

    /// Number of statements the fragment renders to.
    pub fn len(&self) -> usize {
        self.statements
    }

    pub fn is_empty(&self) -> bool {
        self.statements == 0
    }

    /// `self` followed by `other`, as one fragment.
    pub fn followed_by(&self, other: &StatementPlan) -> StatementPlan {
        let mut joined = self.clone();
        if !other.is_empty() {
            if !joined.template.is_empty() {
                joined.template.push('\n');
            }
            joined.template.push_str(&other.template);
            joined.arguments.extend(other.arguments.iter().cloned());
            joined.statements += other.statements;
        }
        joined
    }
}

/// Stub and verification fragments for one expectation block. Entry `i` of
/// both belongs to interaction `i`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RewritePlan {
    pub stubs: StatementPlan,
    pub verifications: StatementPlan,
}

impl RewritePlan {
    pub fn is_empty(&self) -> bool {
        self.stubs.is_empty()
    }
}

pub fn plan(interactions: &[MockInteraction]) -> RewritePlan {
    let mut plan = RewritePlan::default();
    for interaction in interactions {
        let call = interaction.call();
        plan.stubs.push(
            STUB_TEMPLATE,
            [
                format!("{}.{call}", interaction.target),
                interaction.return_value.clone(),
            ],
        );
        plan.verifications.push(
            VERIFY_TEMPLATE,
            [interaction.target.clone(), format!(".{call}")],
        );
    }
    plan
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::java::template::render;

    fn interaction(member: &str, arguments: &[&str], value: &str) -> MockInteraction {
        MockInteraction {
            target: "mockedList".to_string(),
            member: member.to_string(),
            arguments: arguments.iter().map(|a| a.to_string()).collect(),
            return_value: value.to_string(),
            line: 1,
        }
    }

    #[test]
    fn test_plan_keeps_order_and_pairs() {
        let plan = plan(&[
            interaction("add", &["\"one\""], "true"),
            interaction("size", &[], "100"),
        ]);
        assert_eq!(plan.stubs.len(), 2);
        assert_eq!(plan.verifications.len(), 2);
        assert_eq!(
            render(plan.stubs.template(), plan.stubs.arguments()).unwrap(),
            "when(mockedList.add(\"one\")).thenReturn(true);\nwhen(mockedList.size()).thenReturn(100);"
        );
        assert_eq!(
            render(plan.verifications.template(), plan.verifications.arguments()).unwrap(),
            "verify(mockedList, times(1)).add(\"one\");\nverify(mockedList, times(1)).size();"
        );
    }

    #[test]
    fn test_arity_is_preserved() {
        let plan = plan(&[interaction("put", &["eq(\"k\")", "any(String.class)"], "null")]);
        let stub = render(plan.stubs.template(), plan.stubs.arguments()).unwrap();
        assert_eq!(stub, "when(mockedList.put(eq(\"k\"), any(String.class))).thenReturn(null);");
    }

    #[test]
    fn test_empty_plan() {
        let plan = plan(&[]);
        assert!(plan.is_empty());
        assert!(plan.verifications.is_empty());
        assert_eq!(plan.stubs.template(), "");
    }

    #[test]
    fn test_followed_by() {
        let plan = plan(&[interaction("size", &[], "1")]);
        let joined = plan.stubs.followed_by(&plan.verifications);
        assert_eq!(joined.len(), 2);
        assert_eq!(
            render(joined.template(), joined.arguments()).unwrap(),
            "when(mockedList.size()).thenReturn(1);\nverify(mockedList, times(1)).size();"
        );
    }
}
