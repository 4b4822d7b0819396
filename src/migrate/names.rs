//! Qualified names of the framework types and members the migration touches.

pub const MOCKERY: &str = "org.jmock.Mockery";
pub const JUNIT_RULE_MOCKERY: &str = "org.jmock.integration.junit4.JUnitRuleMockery";
pub const EXPECTATIONS: &str = "org.jmock.Expectations";
pub const JMOCK_MOCK: &str = "org.jmock.auto.Mock";

pub const MOCKITO_RULE: &str = "org.mockito.junit.MockitoRule";
pub const MOCKITO_TEST_RULE: &str = "org.mockito.junit.MockitoTestRule";
pub const MOCKITO_MOCK: &str = "org.mockito.Mock";
pub const MOCKITO: &str = "org.mockito.Mockito";
pub const ARGUMENT_MATCHERS: &str = "org.mockito.ArgumentMatchers";

pub const EXTEND_WITH: &str = "org.junit.jupiter.api.extension.ExtendWith";
pub const MOCKITO_EXTENSION: &str = "org.mockito.junit.jupiter.MockitoExtension";
pub const RUN_WITH: &str = "org.junit.runner.RunWith";
pub const MOCKITO_RUNNERS: &[&str] = &[
    "org.mockito.runners.MockitoJUnitRunner",
    "org.mockito.junit.MockitoJUnitRunner",
];

pub const JUNIT4_TEST: &str = "org.junit.Test";
pub const JUPITER_TEST: &str = "org.junit.jupiter.api.Test";

/// Annotation added to classes whose rule fields were retired.
pub const EXTEND_WITH_MOCKITO: &str = "@ExtendWith(MockitoExtension.class)";

/// Types whose presence makes a unit a migration candidate.
pub const SOURCE_TYPES: &[&str] = &[JUNIT_RULE_MOCKERY, MOCKITO_RULE, MOCKITO_TEST_RULE];

/// Imports that become dead once a `JUnitRuleMockery` rule is gone.
pub const JMOCK_RULE_IMPORTS: &[&str] = &[
    JUNIT_RULE_MOCKERY,
    "org.junit.Rule",
    "org.jmock.imposters.ByteBuddyClassImposteriser",
    "org.jmock.lib.concurrent.Synchroniser",
    EXPECTATIONS,
];

/// Imports that become dead once a Mockito rule field is gone.
pub const MOCKITO_RULE_IMPORTS: &[&str] = &[
    MOCKITO_RULE,
    MOCKITO_TEST_RULE,
    "org.junit.Rule",
    "org.mockito.junit.MockitoJUnit",
    "org.mockito.quality.Strictness",
];

/// Expectation DSL keywords, compared case-insensitively.
pub const ONE_OF: &str = "oneOf";
pub const WILL: &str = "will";
pub const WITH: &str = "with";
pub const RETURN_VALUE: &str = "returnValue";
pub const CHECKING: &str = "checking";

/// JMock matchers that accept any instance of a class literal's type.
pub const TYPE_HINT_MATCHERS: &[&str] = &["any", "a", "an", "aNonNull"];
