//! Parsed statement arguments

use crate::qname::{QName, SchemaPath};
use std::fmt;
use yang_ir::Revision;

/// Value of a `status` statement
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Status {
    #[default]
    Current,
    Deprecated,
    Obsolete,
}

impl Status {
    #[must_use]
    pub fn parse(text: &str) -> Option<Self> {
        match text {
            "current" => Some(Self::Current),
            "deprecated" => Some(Self::Deprecated),
            "obsolete" => Some(Self::Obsolete),
            _ => None,
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Current => "current",
            Self::Deprecated => "deprecated",
            Self::Obsolete => "obsolete",
        })
    }
}

/// Boolean feature expression of an `if-feature` statement
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum IfFeatureExpr {
    Feature(QName),
    Not(Box<IfFeatureExpr>),
    And(Vec<IfFeatureExpr>),
    Or(Vec<IfFeatureExpr>),
}

impl IfFeatureExpr {
    /// Parse an expression, resolving each feature reference through
    /// `resolve`.
    ///
    /// ```text
    /// expr   = term *("or" term)
    /// term   = factor *("and" factor)
    /// factor = "not" factor / "(" expr ")" / identifier-ref
    /// ```
    ///
    /// # Errors
    ///
    /// Returns a message describing the first syntax or resolution failure.
    pub fn parse<F>(text: &str, mut resolve: F) -> Result<Self, String>
    where
        F: FnMut(&str) -> Result<QName, String>,
    {
        let spaced = text.replace('(', " ( ").replace(')', " ) ");
        let tokens: Vec<&str> = spaced.split_whitespace().collect();
        let mut pos = 0;
        let expr = Self::parse_or(&tokens, &mut pos, &mut resolve)?;
        if pos != tokens.len() {
            return Err(format!("unexpected '{}' in if-feature expression", tokens[pos]));
        }
        Ok(expr)
    }

    fn parse_or<F>(tokens: &[&str], pos: &mut usize, resolve: &mut F) -> Result<Self, String>
    where
        F: FnMut(&str) -> Result<QName, String>,
    {
        let mut terms = vec![Self::parse_and(tokens, pos, resolve)?];
        while tokens.get(*pos) == Some(&"or") {
            *pos += 1;
            terms.push(Self::parse_and(tokens, pos, resolve)?);
        }
        Ok(if terms.len() == 1 {
            terms.remove(0)
        } else {
            Self::Or(terms)
        })
    }

    fn parse_and<F>(tokens: &[&str], pos: &mut usize, resolve: &mut F) -> Result<Self, String>
    where
        F: FnMut(&str) -> Result<QName, String>,
    {
        let mut factors = vec![Self::parse_factor(tokens, pos, resolve)?];
        while tokens.get(*pos) == Some(&"and") {
            *pos += 1;
            factors.push(Self::parse_factor(tokens, pos, resolve)?);
        }
        Ok(if factors.len() == 1 {
            factors.remove(0)
        } else {
            Self::And(factors)
        })
    }

    fn parse_factor<F>(tokens: &[&str], pos: &mut usize, resolve: &mut F) -> Result<Self, String>
    where
        F: FnMut(&str) -> Result<QName, String>,
    {
        let Some(token) = tokens.get(*pos) else {
            return Err("unexpected end of if-feature expression".to_string());
        };
        *pos += 1;
        match *token {
            "not" => Ok(Self::Not(Box::new(Self::parse_factor(tokens, pos, resolve)?))),
            "(" => {
                let inner = Self::parse_or(tokens, pos, resolve)?;
                if tokens.get(*pos) != Some(&")") {
                    return Err("missing ')' in if-feature expression".to_string());
                }
                *pos += 1;
                Ok(inner)
            }
            ")" | "and" | "or" => Err(format!("unexpected '{token}' in if-feature expression")),
            name => resolve(name).map(Self::Feature),
        }
    }

    /// Evaluate with the given feature support predicate
    pub fn evaluate<F>(&self, supported: &F) -> bool
    where
        F: Fn(&QName) -> bool,
    {
        match self {
            Self::Feature(name) => supported(name),
            Self::Not(inner) => !inner.evaluate(supported),
            Self::And(items) => items.iter().all(|e| e.evaluate(supported)),
            Self::Or(items) => items.iter().any(|e| e.evaluate(supported)),
        }
    }

    /// All feature references in the expression, in order of appearance
    #[must_use]
    pub fn features(&self) -> Vec<&QName> {
        let mut out = Vec::new();
        let mut stack = vec![self];
        while let Some(expr) = stack.pop() {
            match expr {
                Self::Feature(name) => out.push(name),
                Self::Not(inner) => stack.push(inner),
                Self::And(items) | Self::Or(items) => stack.extend(items.iter().rev()),
            }
        }
        out
    }
}

/// Statement argument after parsing by its statement support
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub enum Argument {
    /// Statement takes no argument
    #[default]
    None,
    /// Free text (descriptions, patterns, version strings)
    Text(String),
    /// Identifier or identifier reference
    QName(QName),
    /// Schema node identifier
    SchemaPath(SchemaPath),
    Revision(Revision),
    Boolean(bool),
    Unsigned(u64),
    /// `max-elements unbounded`
    Unbounded,
    Status(Status),
    /// Space-separated list keys
    Keys(Vec<QName>),
    IfFeature(IfFeatureExpr),
}

impl Argument {
    #[must_use]
    pub fn as_qname(&self) -> Option<&QName> {
        match self {
            Self::QName(q) => Some(q),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(t) => Some(t),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Boolean(b) => Some(*b),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_unsigned(&self) -> Option<u64> {
        match self {
            Self::Unsigned(n) => Some(*n),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_schema_path(&self) -> Option<&SchemaPath> {
        match self {
            Self::SchemaPath(p) => Some(p),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_status(&self) -> Option<Status> {
        match self {
            Self::Status(s) => Some(*s),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::qname::QNameModule;

    fn resolver(name: &str) -> Result<QName, String> {
        if name.contains(':') && !name.starts_with("a:") {
            return Err(format!("unknown prefix in '{name}'"));
        }
        let local = name.trim_start_matches("a:");
        Ok(QNameModule::new("urn:a", None).qname(local))
    }

    #[test]
    fn test_if_feature_precedence() {
        let expr = IfFeatureExpr::parse("x or y and not z", resolver).unwrap();
        let supported = |q: &QName| q.local_name() == "x";
        assert!(expr.evaluate(&supported));

        let only_y = |q: &QName| q.local_name() == "y";
        assert!(expr.evaluate(&only_y));

        let y_and_z = |q: &QName| q.local_name() != "x";
        assert!(!expr.evaluate(&y_and_z));
    }

    #[test]
    fn test_if_feature_parentheses() {
        let expr = IfFeatureExpr::parse("not (a:x or y)", resolver).unwrap();
        let names: Vec<_> = expr.features().iter().map(|q| q.local_name().to_string()).collect();
        assert_eq!(names, vec!["x", "y"]);
        assert!(expr.evaluate(&|_: &QName| false));
    }

    #[test]
    fn test_if_feature_errors() {
        assert!(IfFeatureExpr::parse("x and", resolver).is_err());
        assert!(IfFeatureExpr::parse("(x or y", resolver).is_err());
        assert!(IfFeatureExpr::parse("x y", resolver).is_err());
        let err = IfFeatureExpr::parse("b:x", resolver).unwrap_err();
        assert!(err.contains("unknown prefix"));
    }

    #[test]
    fn test_status_parse() {
        assert_eq!(Status::parse("deprecated"), Some(Status::Deprecated));
        assert_eq!(Status::parse("gone"), None);
        assert_eq!(Status::default(), Status::Current);
    }
}
