//! A ready-made inclusion policy.
//!
//! `Selector` covers what image signing needs: a list of node paths (exact,
//! glob or regex) to include, and per-name property overrides. Everything else
//! is left to the enclosing node.

use regex::Regex;

use crate::{BoxError, Include, Item, Verdict};

#[derive(Debug, Clone, Default)]
pub struct Selector {
    paths: Vec<String>,
    patterns: Vec<Regex>,
    include_props: Vec<String>,
    exclude_props: Vec<String>,
}

impl Selector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Include the node at exactly `path`.
    pub fn node(mut self, path: impl Into<String>) -> Self {
        self.paths.push(path.into());
        self
    }

    /// Include every node whose path matches `glob`.
    ///
    /// `*` matches within one path component, `**` across components and `?`
    /// matches a single character other than `/`.
    pub fn node_glob(self, glob: &str) -> Result<Self, regex::Error> {
        let pattern = glob_to_regex(glob);
        self.node_regex(&pattern)
    }

    /// Include every node whose whole path matches `pattern`.
    pub fn node_regex(mut self, pattern: &str) -> Result<Self, regex::Error> {
        let anchored = format!("^(?:{pattern})$");
        self.patterns.push(Regex::new(&anchored)?);
        Ok(self)
    }

    /// Always include properties called `name`, even in excluded nodes.
    pub fn include_property(mut self, name: impl Into<String>) -> Self {
        self.include_props.push(name.into());
        self
    }

    /// Never include properties called `name`.
    pub fn exclude_property(mut self, name: impl Into<String>) -> Self {
        self.exclude_props.push(name.into());
        self
    }

    pub fn is_empty(&self) -> bool {
        self.paths.is_empty() && self.patterns.is_empty() && self.include_props.is_empty()
    }

    pub fn selects_node(&self, path: &str) -> bool {
        self.paths.iter().any(|p| p == path) || self.patterns.iter().any(|re| re.is_match(path))
    }

    /// Exclusions win over inclusions for the same name.
    pub fn property_verdict(&self, name: &str) -> Verdict {
        if self.exclude_props.iter().any(|p| p == name) {
            Verdict::Exclude
        } else if self.include_props.iter().any(|p| p == name) {
            Verdict::Include
        } else {
            Verdict::Inherit
        }
    }
}

impl Include for Selector {
    fn include(&mut self, item: Item<'_>) -> Result<Verdict, BoxError> {
        Ok(match item {
            Item::Node { path } if self.selects_node(path) => Verdict::Include,
            Item::Node { .. } => Verdict::Exclude,
            Item::Property { name, .. } => self.property_verdict(name),
        })
    }
}

/// Whether `path` is an absolute node path such as `/` or `/images/kernel@1`.
pub fn is_node_path(path: &str) -> bool {
    regex!(r"^(?:/|(?:/[^/\x00]+)+)$").is_match(path)
}

fn glob_to_regex(glob: &str) -> String {
    let mut out = String::with_capacity(glob.len() * 2);
    let mut chars = glob.chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            '*' if chars.peek() == Some(&'*') => {
                chars.next();
                out.push_str(".*");
            }
            '*' => out.push_str("[^/]*"),
            '?' => out.push_str("[^/]"),
            c => out.push_str(&regex::escape(c.encode_utf8(&mut [0u8; 4]))),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exact_and_pattern_nodes() {
        let selector = Selector::new()
            .node("/")
            .node_glob("/images/*@1")
            .unwrap()
            .node_regex(r"/configurations/conf@\d+")
            .unwrap();

        assert!(selector.selects_node("/"));
        assert!(selector.selects_node("/images/kernel@1"));
        assert!(selector.selects_node("/configurations/conf@2"));
        assert!(!selector.selects_node("/images"));
        assert!(!selector.selects_node("/images/kernel@1/hash@1"));
        assert!(!selector.selects_node("/configurations/conf@2/x"));
    }

    #[test]
    fn double_star_crosses_components() {
        let selector = Selector::new().node_glob("/images/**/hash@?").unwrap();
        assert!(selector.selects_node("/images/kernel@1/hash@1"));
        assert!(!selector.selects_node("/images/kernel@1/hash@10"));
        assert!(!selector.selects_node("/configurations/hash@1"));
    }

    #[test]
    fn glob_escapes_regex_syntax() {
        let selector = Selector::new().node_glob("/a.b/(x)").unwrap();
        assert!(selector.selects_node("/a.b/(x)"));
        assert!(!selector.selects_node("/aXb/(x)"));
    }

    #[test]
    fn property_exclusion_wins() {
        let mut selector = Selector::new().include_property("data").exclude_property("data").include_property("algo");
        assert_eq!(selector.property_verdict("data"), Verdict::Exclude);
        assert_eq!(selector.include(Item::Property { name: "algo", len: 6 }).unwrap(), Verdict::Include);
        assert_eq!(selector.include(Item::Property { name: "other", len: 0 }).unwrap(), Verdict::Inherit);
        assert_eq!(selector.include(Item::Node { path: "/" }).unwrap(), Verdict::Exclude);
    }

    #[test]
    fn selector_macro_builds_lists() {
        let selector = selector! {
            nodes: ["/", "/images"],
            include_props: ["default"],
            exclude_props: ["data", "timestamp"],
        };
        assert!(selector.selects_node("/images"));
        assert!(!selector.is_empty());
        assert_eq!(selector.property_verdict("default"), Verdict::Include);
        assert_eq!(selector.property_verdict("timestamp"), Verdict::Exclude);
    }

    #[test]
    fn validates_node_paths() {
        assert!(is_node_path("/"));
        assert!(is_node_path("/images/kernel@1"));
        assert!(!is_node_path(""));
        assert!(!is_node_path("images"));
        assert!(!is_node_path("/images/"));
        assert!(!is_node_path("//x"));
    }
}
