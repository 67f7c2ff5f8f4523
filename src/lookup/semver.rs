use semver::Version;

/// Parse a version that may carry leading `=`/`v` characters or surrounding
/// whitespace, e.g. `"  =v1.2.3 "` -> `1.2.3`.
///
/// Partial versions are not padded: `"1.2"` is a range, not a version.
pub fn clean_version(version: &str) -> Option<Version> {
    let trimmed = version
        .trim()
        .trim_start_matches(|c: char| c == '=' || c == 'v' || c == 'V' || c.is_whitespace());
    Version::parse(trimmed).ok()
}

/// Find the semantically maximum version from a list
///
/// Pre-releases take part in the ordering (`3.0.0-alpha.1` > `2.0.0`).
/// Invalid versions are skipped.
pub fn find_semantic_max<'a, I>(versions: I) -> Option<&'a str>
where
    I: IntoIterator<Item = &'a str>,
{
    versions
        .into_iter()
        .filter_map(|v| Version::parse(v).ok().map(|parsed| (v, parsed)))
        .max_by(|(_, a), (_, b)| a.cmp(b))
        .map(|(original, _)| original)
}
