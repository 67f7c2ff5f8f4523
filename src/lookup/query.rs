//! Parsing of `name[@version]` package queries

use std::fmt;
use std::str::FromStr;

use crate::lookup::error::QueryError;

/// Package name plus an optional requested range
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackageQuery {
    pub name: String,
    pub range: Option<String>,
}

impl FromStr for PackageQuery {
    type Err = QueryError;

    /// `react`, `react@^18`, `@types/node@20.1.0`.
    /// The last `@` separates the range unless it starts the name (scoped packages).
    fn from_str(query: &str) -> Result<Self, Self::Err> {
        let query = query.trim();

        let (name, range) = match query.rfind('@') {
            Some(index) if index > 0 => (&query[..index], Some(&query[index + 1..])),
            _ => (query, None),
        };

        if name.is_empty() {
            return Err(QueryError::EmptyName(query.to_string()));
        }

        Ok(Self {
            name: name.to_string(),
            range: range
                .filter(|range| !range.trim().is_empty())
                .map(str::to_string),
        })
    }
}

impl fmt::Display for PackageQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.range {
            Some(range) => write!(f, "{}@{}", self.name, range),
            None => f.write_str(&self.name),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("react", "react", None)]
    #[case("express@1.0.0", "express", Some("1.0.0"))]
    #[case("lodash@^4.17.0", "lodash", Some("^4.17.0"))]
    #[case("@types/node", "@types/node", None)]
    #[case("@types/node@20.1.0", "@types/node", Some("20.1.0"))]
    #[case("  react@latest  ", "react", Some("latest"))]
    #[case("react@", "react", None)]
    fn parse_returns_name_and_range(
        #[case] query: &str,
        #[case] name: &str,
        #[case] range: Option<&str>,
    ) {
        let parsed: PackageQuery = query.parse().unwrap();

        assert_eq!(parsed.name, name);
        assert_eq!(parsed.range.as_deref(), range);
    }

    #[rstest]
    #[case("")]
    #[case("   ")]
    fn parse_rejects_empty_name(#[case] query: &str) {
        assert!(matches!(
            query.parse::<PackageQuery>(),
            Err(QueryError::EmptyName(_))
        ));
    }

    #[test]
    fn display_round_trips_the_query() {
        let parsed: PackageQuery = "@types/node@20.1.0".parse().unwrap();

        assert_eq!(parsed.to_string(), "@types/node@20.1.0");
    }
}
