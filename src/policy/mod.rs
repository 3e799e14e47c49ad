//! # Trust Policy Module
//!
//! @title Trusted Data Policy Model
//! @author Ramprasad
//!
//! Holds the merged, normalized trust policy that drives every classification
//! decision. The policy is built once per run (see [`PolicyLoader`]) and read
//! everywhere; it is immutable after load and safe to share by reference.
//!
//! ## Policy Tables
//!
//! | Table | Meaning |
//! |-------|---------|
//! | `safe_functions` | function result is safe iff all arguments are safe |
//! | `safe_methods` / `safe_static_methods` | return value unconditionally safe |
//! | `check_methods_safety` / `check_static_methods_safety` | safe iff flagged argument positions are safe, verdict only |
//! | `check_methods` | argument check that also reports each unsafe argument |
//! | `clear_methods` / `clear_static_methods` | calling sanitizes the first argument's variable |
//! | `variables` / `properties` | inherently trusted names per declaring scope |
//!
//! Method, function, variable and property keys are case-folded to lower case
//! at load time; class keys are matched verbatim. Lookups fold the query the
//! same way.

mod loader;

pub use loader::{PolicyError, PolicyLoader, POLICY_FILE_NAME};

use serde::Deserialize;
use std::collections::{HashMap, HashSet};

/// Method key in the check tables that applies to every method of a class
/// without a specific entry.
pub const ALL_METHODS: &str = "__all__";

/// Which argument positions of a checked call must be safe.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ArgSpec {
    /// Every argument position.
    All,

    /// No position; the call is accepted as-is.
    None,

    /// An explicit ordered set of positions.
    Positions(Vec<usize>),
}

impl ArgSpec {
    /// Resolves the spec against an actual argument count.
    pub fn positions(&self, argc: usize) -> Vec<usize> {
        match self {
            ArgSpec::All => (0..argc).collect(),
            ArgSpec::None => Vec::new(),
            ArgSpec::Positions(positions) => {
                positions.iter().copied().filter(|&p| p < argc).collect()
            }
        }
    }

    /// Unions another spec into this one. `All` absorbs everything, `None`
    /// yields to anything; position sets union.
    fn union(&mut self, other: ArgSpec) {
        match (&mut *self, other) {
            (ArgSpec::All, _) => {}
            (_, ArgSpec::All) => *self = ArgSpec::All,
            (_, ArgSpec::None) => {}
            (ArgSpec::None, other) => *self = other,
            (ArgSpec::Positions(mine), ArgSpec::Positions(theirs)) => {
                mine.extend(theirs);
                mine.sort_unstable();
                mine.dedup();
            }
        }
    }
}

type MethodSet = HashMap<String, HashSet<String>>;
type CheckTable = HashMap<String, HashMap<String, ArgSpec>>;
type ScopedNames = HashMap<String, HashMap<String, HashSet<String>>>;

/// The merged trust policy, read-only after load.
#[derive(Debug, Clone, Default)]
pub struct TrustPolicy {
    safe_functions: HashSet<String>,
    safe_methods: MethodSet,
    safe_static_methods: MethodSet,
    check_methods: CheckTable,
    check_methods_safety: CheckTable,
    check_static_methods_safety: CheckTable,
    clear_methods: MethodSet,
    clear_static_methods: MethodSet,
    variables: ScopedNames,
    properties: ScopedNames,

    /// Folded method names appearing in any check table; used to report
    /// receiver types the host failed to resolve on calls we would otherwise
    /// have vetted.
    watch_list: HashSet<String>,
}

impl TrustPolicy {
    /// The baseline policy: the functions whose results have historically
    /// been treated as safe combinators of their (safe) arguments. Discovered
    /// configuration files union on top of this.
    pub fn builtin() -> Self {
        let mut policy = Self::default();
        for name in ["sprintf", "implode", "join", "reset", "current"] {
            policy.safe_functions.insert(name.to_string());
        }
        policy
    }

    /// Whether a function is a safe combinator.
    pub fn is_safe_function(&self, name: &str) -> bool {
        self.safe_functions.contains(&name.to_lowercase())
    }

    /// Whether a method's return value is unconditionally safe.
    pub fn is_safe_method(&self, class: &str, method: &str) -> bool {
        contains_method(&self.safe_methods, class, method)
    }

    /// Whether a static method's return value is unconditionally safe.
    pub fn is_safe_static_method(&self, class: &str, method: &str) -> bool {
        contains_method(&self.safe_static_methods, class, method)
    }

    /// Argument spec for a diagnostic-producing method check.
    pub fn check_method(&self, class: &str, method: &str) -> Option<&ArgSpec> {
        lookup_check(&self.check_methods, class, method)
    }

    /// Argument spec for a verdict-only method check.
    pub fn check_method_safety(&self, class: &str, method: &str) -> Option<&ArgSpec> {
        lookup_check(&self.check_methods_safety, class, method)
    }

    /// Argument spec for a verdict-only static method check.
    pub fn check_static_method_safety(&self, class: &str, method: &str) -> Option<&ArgSpec> {
        lookup_check(&self.check_static_methods_safety, class, method)
    }

    /// Whether an instance method launders its first argument.
    pub fn is_clear_method(&self, class: &str, method: &str) -> bool {
        contains_method(&self.clear_methods, class, method)
    }

    /// Whether a static method launders its first argument.
    pub fn is_clear_static_method(&self, class: &str, method: &str) -> bool {
        contains_method(&self.clear_static_methods, class, method)
    }

    /// Whether a variable is whitelisted in the given declaring scope.
    pub fn variable_trusted(&self, class: &str, function: &str, variable: &str) -> bool {
        scoped_contains(&self.variables, class, function, variable)
    }

    /// Whether a property is whitelisted in the given declaring scope.
    pub fn property_trusted(&self, class: &str, function: &str, property: &str) -> bool {
        scoped_contains(&self.properties, class, function, property)
    }

    /// Whether a method name is vetted anywhere in the check tables.
    pub fn watch_listed(&self, method: &str) -> bool {
        self.watch_list.contains(&method.to_lowercase())
    }

    /// Per-table entry counts, for the `policy` command summary.
    pub fn table_sizes(&self) -> Vec<(&'static str, usize)> {
        vec![
            ("safe_functions", self.safe_functions.len()),
            ("safe_methods", count_methods(&self.safe_methods)),
            ("safe_static_methods", count_methods(&self.safe_static_methods)),
            ("check_methods", count_checks(&self.check_methods)),
            ("check_methods_safety", count_checks(&self.check_methods_safety)),
            (
                "check_static_methods_safety",
                count_checks(&self.check_static_methods_safety),
            ),
            ("clear_methods", count_methods(&self.clear_methods)),
            ("clear_static_methods", count_methods(&self.clear_static_methods)),
            ("variables", count_scoped(&self.variables)),
            ("properties", count_scoped(&self.properties)),
        ]
    }

    /// Merges one raw configuration file into the policy.
    ///
    /// Later sources only ever add: leaf sets union, argument specs widen,
    /// nothing previously loaded is dropped.
    pub fn merge(&mut self, raw: PolicyFile) {
        for name in raw.safe_functions {
            self.safe_functions.insert(name.to_lowercase());
        }
        merge_method_set(&mut self.safe_methods, raw.safe_methods);
        merge_method_set(&mut self.safe_static_methods, raw.safe_static_methods);
        merge_check_table(&mut self.check_methods, raw.check_methods);
        merge_check_table(&mut self.check_methods_safety, raw.check_methods_safety);
        merge_check_table(
            &mut self.check_static_methods_safety,
            raw.check_static_methods_safety,
        );
        merge_method_set(&mut self.clear_methods, raw.clear_methods);
        merge_method_set(&mut self.clear_static_methods, raw.clear_static_methods);
        merge_scoped(&mut self.variables, raw.variables);
        merge_scoped(&mut self.properties, raw.properties);

        self.rebuild_watch_list();
    }

    fn rebuild_watch_list(&mut self) {
        self.watch_list.clear();
        for table in [&self.check_methods, &self.check_methods_safety] {
            for methods in table.values() {
                for method in methods.keys() {
                    if method != ALL_METHODS {
                        self.watch_list.insert(method.clone());
                    }
                }
            }
        }
    }
}

fn contains_method(table: &MethodSet, class: &str, method: &str) -> bool {
    table
        .get(class)
        .map_or(false, |methods| methods.contains(&method.to_lowercase()))
}

fn lookup_check<'a>(table: &'a CheckTable, class: &str, method: &str) -> Option<&'a ArgSpec> {
    let methods = table.get(class)?;
    methods
        .get(&method.to_lowercase())
        .or_else(|| methods.get(ALL_METHODS))
}

fn scoped_contains(table: &ScopedNames, class: &str, function: &str, name: &str) -> bool {
    table
        .get(class)
        .and_then(|functions| functions.get(&function.to_lowercase()))
        .map_or(false, |names| names.contains(&name.to_lowercase()))
}

fn count_methods(table: &MethodSet) -> usize {
    table.values().map(HashSet::len).sum()
}

fn count_checks(table: &CheckTable) -> usize {
    table.values().map(HashMap::len).sum()
}

fn count_scoped(table: &ScopedNames) -> usize {
    table
        .values()
        .flat_map(HashMap::values)
        .map(HashSet::len)
        .sum()
}

fn merge_method_set(into: &mut MethodSet, from: HashMap<String, Vec<String>>) {
    for (class, methods) in from {
        let entry = into.entry(class).or_default();
        for method in methods {
            entry.insert(method.to_lowercase());
        }
    }
}

fn merge_check_table(into: &mut CheckTable, from: HashMap<String, HashMap<String, RawArgSpec>>) {
    for (class, methods) in from {
        let entry = into.entry(class).or_default();
        for (method, raw) in methods {
            let spec = ArgSpec::from(raw);
            entry
                .entry(method.to_lowercase())
                .and_modify(|existing| existing.union(spec.clone()))
                .or_insert(spec);
        }
    }
}

fn merge_scoped(into: &mut ScopedNames, from: HashMap<String, HashMap<String, Vec<String>>>) {
    for (class, functions) in from {
        let class_entry = into.entry(class).or_default();
        for (function, names) in functions {
            let fn_entry = class_entry.entry(function.to_lowercase()).or_default();
            for name in names {
                fn_entry.insert(name.to_lowercase());
            }
        }
    }
}

/// One `trusted_data.json` file as deserialized from disk, before
/// normalization.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PolicyFile {
    #[serde(default)]
    pub safe_functions: Vec<String>,

    #[serde(default)]
    pub safe_methods: HashMap<String, Vec<String>>,

    #[serde(default)]
    pub safe_static_methods: HashMap<String, Vec<String>>,

    #[serde(default)]
    pub check_methods: HashMap<String, HashMap<String, RawArgSpec>>,

    #[serde(default)]
    pub check_methods_safety: HashMap<String, HashMap<String, RawArgSpec>>,

    #[serde(default)]
    pub check_static_methods_safety: HashMap<String, HashMap<String, RawArgSpec>>,

    #[serde(default)]
    pub clear_methods: HashMap<String, Vec<String>>,

    #[serde(default)]
    pub clear_static_methods: HashMap<String, Vec<String>>,

    #[serde(default)]
    pub variables: HashMap<String, HashMap<String, Vec<String>>>,

    #[serde(default)]
    pub properties: HashMap<String, HashMap<String, Vec<String>>>,
}

/// Argument spec as written in configuration: `true` checks every position,
/// `false` none, a list checks exactly those positions.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum RawArgSpec {
    Flag(bool),
    Positions(Vec<usize>),
}

impl From<RawArgSpec> for ArgSpec {
    fn from(raw: RawArgSpec) -> Self {
        match raw {
            RawArgSpec::Flag(true) => ArgSpec::All,
            RawArgSpec::Flag(false) => ArgSpec::None,
            RawArgSpec::Positions(mut positions) => {
                positions.sort_unstable();
                positions.dedup();
                ArgSpec::Positions(positions)
            }
        }
    }
}
