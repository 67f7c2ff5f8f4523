//! npm version range matching
//!
//! Supports npm semver range specifications:
//! - `1.2.3`, `=1.2.3`, `v1.2.3` - exact match
//! - `1`, `1.2`, `1.x`, `1.2.x`, `*` - X-ranges (partial versions are X-ranges too)
//! - `^1.2.3` - compatible with version (>=1.2.3 <2.0.0)
//! - `~1.2.3`, `~>1.2.3` - approximately equivalent (>=1.2.3 <1.3.0)
//! - `>=1.2.3`, `>1.2.3`, `<=1.2.3`, `<1.2.3` - comparison operators
//! - `1.0.0 - 2.0.0` - hyphen range
//! - `>=1.0.0 <2.0.0` - space-separated AND
//! - `^1.0.0 || ^2.0.0` - OR
//!
//! A pre-release version only satisfies a comparator set when one of the
//! set's comparators names a pre-release on the same `major.minor.patch`:
//! `^1.2.3-beta.1` accepts `1.2.3-beta.4` but not `1.2.4-beta.1`.

use std::ops::Bound;

use semver::{BuildMetadata, Prerelease, Version};

/// Operators that may be separated from their version by whitespace (`>= 1.2.3`)
const OPERATORS: &[&str] = &[">=", "<=", ">", "<", "=", "^", "~", "~>"];

/// Largest version component npm accepts (`Number.MAX_SAFE_INTEGER`).
/// Bounds are computed with `component + 1`, which cannot overflow below it.
const MAX_SAFE_COMPONENT: u64 = (1 << 53) - 1;

/// Parsed npm range: alternatives joined by `||`, each an AND of ranges
#[derive(Debug, Clone, PartialEq)]
pub struct VersionReq {
    sets: Vec<Vec<VersionRange>>,
}

impl VersionReq {
    /// Parse a range expression; `None` if any part is not valid npm range syntax
    pub fn parse(spec: &str) -> Option<Self> {
        let sets = spec
            .split("||")
            .map(parse_set)
            .collect::<Option<Vec<_>>>()?;
        Some(Self { sets })
    }

    /// Check if a version satisfies any alternative of this range
    pub fn matches(&self, version: &Version) -> bool {
        let stripped;
        let version = if version.build.is_empty() {
            version
        } else {
            stripped = Version {
                build: BuildMetadata::EMPTY,
                ..version.clone()
            };
            &stripped
        };

        self.sets.iter().any(|set| set_matches(set, version))
    }

    /// Highest version in `versions` that satisfies this range.
    /// Strings that are not valid versions are skipped.
    pub fn max_satisfying<'a, I>(&self, versions: I) -> Option<&'a str>
    where
        I: IntoIterator<Item = &'a str>,
    {
        versions
            .into_iter()
            .filter_map(|v| Version::parse(v).ok().map(|parsed| (v, parsed)))
            .filter(|(_, parsed)| self.matches(parsed))
            .max_by(|(_, a), (_, b)| a.cmp(b))
            .map(|(original, _)| original)
    }
}

/// Whether `spec` is a syntactically valid npm range expression
pub fn is_valid_range(spec: &str) -> bool {
    VersionReq::parse(spec).is_some()
}

fn set_matches(set: &[VersionRange], version: &Version) -> bool {
    if !set.iter().all(|range| range.matches(version)) {
        return false;
    }

    version.pre.is_empty() || set.iter().any(|range| range.allows_prerelease_of(version))
}

/// Parse one `||` alternative. An empty alternative matches everything, like `*`.
fn parse_set(spec: &str) -> Option<Vec<VersionRange>> {
    let tokens = tokenize(spec);
    if tokens.is_empty() {
        return Some(vec![VersionRange::XRange(Partial::ANY)]);
    }

    let mut ranges = Vec::new();
    let mut i = 0;
    while i < tokens.len() {
        if tokens.get(i + 1).map(String::as_str) == Some("-") {
            let from = Partial::parse(&tokens[i])?;
            let to = Partial::parse(tokens.get(i + 2)?)?;
            ranges.push(VersionRange::Hyphen { from, to });
            i += 3;
        } else {
            ranges.push(VersionRange::parse(&tokens[i])?);
            i += 1;
        }
    }

    Some(ranges)
}

/// Split on whitespace, gluing a bare operator to the token that follows it
fn tokenize(spec: &str) -> Vec<String> {
    let mut tokens = Vec::new();
    let mut pending_operator: Option<&str> = None;

    for word in spec.split_whitespace() {
        if let Some(operator) = pending_operator.take() {
            tokens.push(format!("{operator}{word}"));
        } else if OPERATORS.contains(&word) {
            pending_operator = Some(word);
        } else {
            tokens.push(word.to_string());
        }
    }

    // A dangling operator is kept so that parsing rejects it
    if let Some(operator) = pending_operator {
        tokens.push(operator.to_string());
    }

    tokens
}

/// A version whose trailing components may be wildcards (`1`, `1.2`, `1.x`, `*`)
#[derive(Debug, Clone, PartialEq)]
struct Partial {
    major: Option<u64>,
    minor: Option<u64>,
    patch: Option<u64>,
    pre: Prerelease,
}

impl Partial {
    const ANY: Partial = Partial {
        major: None,
        minor: None,
        patch: None,
        pre: Prerelease::EMPTY,
    };

    fn parse(spec: &str) -> Option<Self> {
        let spec = spec.trim_start_matches(|c: char| c == '=' || c == 'v' || c == 'V');
        if spec.is_empty() {
            return None;
        }

        let spec = spec.split_once('+').map_or(spec, |(core, _build)| core);
        let (core, pre) = match spec.split_once('-') {
            Some((core, pre)) => (core, Some(pre)),
            None => (spec, None),
        };

        let components: Vec<&str> = core.split('.').collect();
        if components.len() > 3 {
            return None;
        }

        let mut numbers = [None; 3];
        for (slot, component) in numbers.iter_mut().zip(&components) {
            *slot = match *component {
                "x" | "X" | "*" => None,
                digits if !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit()) => {
                    Some(digits.parse::<u64>().ok().filter(|n| *n <= MAX_SAFE_COMPONENT)?)
                }
                _ => return None,
            };
        }

        // Everything after the first wildcard is a wildcard too (`1.x.3` == `1.x`)
        if numbers[0].is_none() {
            numbers[1] = None;
        }
        if numbers[1].is_none() {
            numbers[2] = None;
        }

        let pre = match pre {
            Some(pre) if numbers.iter().all(Option::is_some) => Prerelease::new(pre).ok()?,
            Some(_) => return None,
            None => Prerelease::EMPTY,
        };

        let [major, minor, patch] = numbers;
        Some(Self {
            major,
            minor,
            patch,
            pre,
        })
    }

    /// Lowest version the partial covers (`1.2` -> `1.2.0`)
    fn floor(&self) -> Version {
        Version {
            major: self.major.unwrap_or(0),
            minor: self.minor.unwrap_or(0),
            patch: self.patch.unwrap_or(0),
            pre: self.pre.clone(),
            build: BuildMetadata::EMPTY,
        }
    }

    /// Upper edge that still includes every version the partial covers
    /// (`1.2` -> `<1.3.0-0`, `1.2.3` -> `<=1.2.3`)
    fn ceiling(&self) -> Bound<Version> {
        match (self.major, self.minor, self.patch) {
            (None, _, _) => Bound::Unbounded,
            (Some(major), None, _) => Bound::Excluded(lowest_of(major + 1, 0, 0)),
            (Some(major), Some(minor), None) => Bound::Excluded(lowest_of(major, minor + 1, 0)),
            (Some(_), Some(_), Some(_)) => Bound::Included(self.floor()),
        }
    }

    fn names_prerelease_of(&self, version: &Version) -> bool {
        !self.pre.is_empty()
            && self.major == Some(version.major)
            && self.minor == Some(version.minor)
            && self.patch == Some(version.patch)
    }
}

/// `major.minor.patch-0`, the lowest version sharing that release tuple
fn lowest_of(major: u64, minor: u64, patch: u64) -> Version {
    Version {
        major,
        minor,
        patch,
        pre: Prerelease::new("0").unwrap_or(Prerelease::EMPTY),
        build: BuildMetadata::EMPTY,
    }
}

#[derive(Debug, Clone, PartialEq)]
struct Interval {
    lower: Bound<Version>,
    upper: Bound<Version>,
}

impl Interval {
    const ANY: Interval = Interval {
        lower: Bound::Unbounded,
        upper: Bound::Unbounded,
    };

    fn contains(&self, version: &Version) -> bool {
        let above = match &self.lower {
            Bound::Included(lower) => version >= lower,
            Bound::Excluded(lower) => version > lower,
            Bound::Unbounded => true,
        };
        let below = match &self.upper {
            Bound::Included(upper) => version <= upper,
            Bound::Excluded(upper) => version < upper,
            Bound::Unbounded => true,
        };
        above && below
    }
}

/// Represents a single parsed npm comparator
#[derive(Debug, Clone, PartialEq)]
enum VersionRange {
    /// Exact version or wildcard: `1.2.3`, `1.2`, `1.x`, `*`
    XRange(Partial),
    /// Caret range: ^1.2.3 means >=1.2.3 <2.0.0 (or special cases for 0.x)
    Caret(Partial),
    /// Tilde range: ~1.2.3 means >=1.2.3 <1.3.0
    Tilde(Partial),
    Gte(Partial),
    Gt(Partial),
    Lte(Partial),
    Lt(Partial),
    /// Hyphen range: 1.0.0 - 2.0.0 means >=1.0.0 <=2.0.0
    Hyphen { from: Partial, to: Partial },
}

impl VersionRange {
    fn parse(spec: &str) -> Option<Self> {
        if let Some(rest) = spec.strip_prefix(">=") {
            Partial::parse(rest).map(VersionRange::Gte)
        } else if let Some(rest) = spec.strip_prefix('>') {
            Partial::parse(rest).map(VersionRange::Gt)
        } else if let Some(rest) = spec.strip_prefix("<=") {
            Partial::parse(rest).map(VersionRange::Lte)
        } else if let Some(rest) = spec.strip_prefix('<') {
            Partial::parse(rest).map(VersionRange::Lt)
        } else if let Some(rest) = spec.strip_prefix('^') {
            Partial::parse(rest).map(VersionRange::Caret)
        } else if let Some(rest) = spec.strip_prefix("~>") {
            Partial::parse(rest).map(VersionRange::Tilde)
        } else if let Some(rest) = spec.strip_prefix('~') {
            Partial::parse(rest).map(VersionRange::Tilde)
        } else {
            Partial::parse(spec).map(VersionRange::XRange)
        }
    }

    /// Versions covered by this comparator, or `None` when it can never match
    /// (`>*`, `<*`)
    fn interval(&self) -> Option<Interval> {
        let interval = match self {
            VersionRange::XRange(p) | VersionRange::Lte(p) | VersionRange::Gte(p)
                if p.major.is_none() =>
            {
                Interval::ANY
            }
            VersionRange::Caret(p) | VersionRange::Tilde(p) if p.major.is_none() => Interval::ANY,
            VersionRange::Gt(p) | VersionRange::Lt(p) if p.major.is_none() => return None,
            VersionRange::XRange(p) => Interval {
                lower: Bound::Included(p.floor()),
                upper: p.ceiling(),
            },
            VersionRange::Caret(p) => {
                // ^1.2.3 -> <2.0.0, ^0.2.3 -> <0.3.0, ^0.0.3 -> <0.0.4
                let upper = match (p.major, p.minor, p.patch) {
                    (Some(major), _, _) if major > 0 => lowest_of(major + 1, 0, 0),
                    (_, None, _) => lowest_of(1, 0, 0),
                    (_, Some(minor), _) if minor > 0 => lowest_of(0, minor + 1, 0),
                    (_, _, None) => lowest_of(0, 1, 0),
                    (_, _, Some(patch)) => lowest_of(0, 0, patch + 1),
                };
                Interval {
                    lower: Bound::Included(p.floor()),
                    upper: Bound::Excluded(upper),
                }
            }
            VersionRange::Tilde(p) => {
                let major = p.major.unwrap_or(0);
                let upper = match p.minor {
                    None => lowest_of(major + 1, 0, 0),
                    Some(minor) => lowest_of(major, minor + 1, 0),
                };
                Interval {
                    lower: Bound::Included(p.floor()),
                    upper: Bound::Excluded(upper),
                }
            }
            VersionRange::Gte(p) => Interval {
                lower: Bound::Included(p.floor()),
                upper: Bound::Unbounded,
            },
            VersionRange::Gt(p) => {
                // >1.2 means above every 1.2.x, i.e. >=1.3.0
                let lower = match (p.major.unwrap_or(0), p.minor, p.patch) {
                    (major, None, _) => Bound::Included(Version::new(major + 1, 0, 0)),
                    (major, Some(minor), None) => Bound::Included(Version::new(major, minor + 1, 0)),
                    _ => Bound::Excluded(p.floor()),
                };
                Interval {
                    lower,
                    upper: Bound::Unbounded,
                }
            }
            VersionRange::Lte(p) => Interval {
                lower: Bound::Unbounded,
                upper: p.ceiling(),
            },
            VersionRange::Lt(p) => {
                let upper = if p.patch.is_some() {
                    p.floor()
                } else {
                    let floor = p.floor();
                    lowest_of(floor.major, floor.minor, 0)
                };
                Interval {
                    lower: Bound::Unbounded,
                    upper: Bound::Excluded(upper),
                }
            }
            VersionRange::Hyphen { from, to } => Interval {
                lower: match from.major {
                    Some(_) => Bound::Included(from.floor()),
                    None => Bound::Unbounded,
                },
                upper: to.ceiling(),
            },
        };

        Some(interval)
    }

    fn matches(&self, version: &Version) -> bool {
        self.interval()
            .is_some_and(|interval| interval.contains(version))
    }

    fn allows_prerelease_of(&self, version: &Version) -> bool {
        match self {
            VersionRange::Hyphen { from, to } => {
                from.names_prerelease_of(version) || to.names_prerelease_of(version)
            }
            VersionRange::XRange(p)
            | VersionRange::Caret(p)
            | VersionRange::Tilde(p)
            | VersionRange::Gte(p)
            | VersionRange::Gt(p)
            | VersionRange::Lte(p)
            | VersionRange::Lt(p) => p.names_prerelease_of(version),
        }
    }
}
