//! MSBuild condition parser.
//!
//! Parses the `Condition` attribute of `.csproj` `<PropertyGroup>` elements
//! to find the `Config|Platform` scope the group applies to:
//!
//! ```text
//! '$(Configuration)|$(Platform)' == 'Release|iPhone'
//! ```
//!
//! Uses [`chumsky`] for the parsing grammar. Conditions of any other form
//! (`!=`, `and`/`or`, `Exists(..)`) do not name a scope and fail to parse.
//!
//! ## Grammar
//!
//! ```text
//! comparison = quoted '==' quoted
//! quoted     = "'" chars "'"
//! ```

use chumsky::prelude::*;

use crate::model::ConfigKey;

/// `'lhs' == 'rhs'`, each side split into literal and variable fragments.
#[derive(Debug, Clone, PartialEq)]
pub struct Comparison {
    pub lhs: Vec<ExprValue>,
    pub rhs: Vec<ExprValue>,
}

/// A fragment of a quoted value that may contain `$(Variable)` references.
#[derive(Debug, Clone, PartialEq)]
pub enum ExprValue {
    Literal(String),
    Variable(String),
}

/// Split the raw text between single quotes into [`ExprValue`] fragments.
fn parse_string_parts(s: &str) -> Vec<ExprValue> {
    let mut parts = Vec::new();
    let mut literal = String::new();
    let mut chars = s.chars().peekable();

    while let Some(c) = chars.next() {
        if c == '$' && chars.peek() == Some(&'(') {
            if !literal.is_empty() {
                parts.push(ExprValue::Literal(std::mem::take(&mut literal)));
            }
            chars.next(); // '('
            let var_name: String = chars.by_ref().take_while(|&ch| ch != ')').collect();
            parts.push(ExprValue::Variable(var_name));
        } else {
            literal.push(c);
        }
    }

    if !literal.is_empty() {
        parts.push(ExprValue::Literal(literal));
    }

    parts
}

fn condition_parser<'a>() -> impl Parser<'a, &'a str, Comparison, extra::Err<Simple<'a, char>>> {
    let quoted = just('\'')
        .ignore_then(none_of('\'').repeated().to_slice())
        .then_ignore(just('\''))
        .map(parse_string_parts);

    quoted
        .padded()
        .then_ignore(just("=="))
        .then(quoted.padded())
        .map(|(lhs, rhs)| Comparison { lhs, rhs })
}

/// Parse a condition attribute string into a [`Comparison`].
pub fn parse_condition(input: &str) -> Result<Comparison, String> {
    condition_parser()
        .parse(input)
        .into_result()
        .map_err(|errs| {
            let messages: Vec<String> = errs.iter().map(|e| format!("{e}")).collect();
            format!(
                "Failed to parse condition '{}': {}",
                input,
                messages.join("; ")
            )
        })
}

fn is_variable(part: &ExprValue, names: &[&str]) -> bool {
    matches!(part, ExprValue::Variable(v) if names.iter().any(|n| v.eq_ignore_ascii_case(n)))
}

/// The `Config|Platform` key a property group condition selects, when the
/// left side is `$(Configuration)|$(Platform)` and the right a plain literal.
pub fn config_platform_scope(cmp: &Comparison) -> Option<ConfigKey> {
    let [config, ExprValue::Literal(sep), platform] = cmp.lhs.as_slice() else {
        return None;
    };
    if sep.trim() != "|"
        || !is_variable(config, &["Configuration", "Config"])
        || !is_variable(platform, &["Platform"])
    {
        return None;
    }

    let [ExprValue::Literal(value)] = cmp.rhs.as_slice() else {
        return None;
    };
    ConfigKey::parse(value)
}

/// Parse `input` and extract its scope in one step.
pub fn scope_of(input: &str) -> Option<ConfigKey> {
    parse_condition(input)
        .ok()
        .and_then(|cmp| config_platform_scope(&cmp))
}

// ═══════════════════════════════════════════════════════════════════════════════
//  Tests
// ═══════════════════════════════════════════════════════════════════════════════
