use crate::parser::PairingPolicy;
use crate::report::Check;
use std::path::PathBuf;

pub const DEFAULT_MIGRATIONS_DIR: &str = "supabase/migrations";
pub const DEFAULT_TYPES_FILE: &str = "src/types/database.types.ts";
pub const DEFAULT_MODULES_DIR: &str = "src/lib/supabase/modules";
pub const DEFAULT_MODULE_FILE: &str = "index.ts";

/// Options for a verification run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerifyOptions {
    /// Directory holding the `*.sql` migration history
    pub migrations_dir: PathBuf,
    /// Generated type-description file
    pub types_file: PathBuf,
    /// Root of the data-access module tree
    pub modules_dir: PathBuf,
    /// Leaf file name of a module (default: "index.ts")
    pub module_file_name: String,
    /// How predicate columns are paired with tables
    pub pairing: PairingPolicy,
    /// Glob patterns of tables to keep (empty keeps all)
    pub include_tables: Vec<String>,
    /// Glob patterns of tables to drop from the report
    pub exclude_tables: Vec<String>,
    /// Comparisons to run
    pub check: Check,
}

impl Default for VerifyOptions {
    fn default() -> Self {
        Self {
            migrations_dir: DEFAULT_MIGRATIONS_DIR.into(),
            types_file: DEFAULT_TYPES_FILE.into(),
            modules_dir: DEFAULT_MODULES_DIR.into(),
            module_file_name: DEFAULT_MODULE_FILE.into(),
            pairing: PairingPolicy::default(),
            include_tables: Vec::new(),
            exclude_tables: Vec::new(),
            check: Check::default(),
        }
    }
}

impl VerifyOptions {
    /// Create options with the three input locations.
    pub fn new(
        migrations_dir: impl Into<PathBuf>,
        types_file: impl Into<PathBuf>,
        modules_dir: impl Into<PathBuf>,
    ) -> Self {
        Self {
            migrations_dir: migrations_dir.into(),
            types_file: types_file.into(),
            modules_dir: modules_dir.into(),
            ..Default::default()
        }
    }

    /// Resolve every default location against a project root.
    pub fn in_project(root: impl Into<PathBuf>) -> Self {
        let root = root.into();
        Self::new(
            root.join(DEFAULT_MIGRATIONS_DIR),
            root.join(DEFAULT_TYPES_FILE),
            root.join(DEFAULT_MODULES_DIR),
        )
    }

    pub fn with_module_file_name(mut self, name: impl Into<String>) -> Self {
        self.module_file_name = name.into();
        self
    }

    pub fn with_pairing(mut self, pairing: PairingPolicy) -> Self {
        self.pairing = pairing;
        self
    }

    pub fn with_include_tables(mut self, patterns: Vec<String>) -> Self {
        self.include_tables = patterns;
        self
    }

    pub fn with_exclude_tables(mut self, patterns: Vec<String>) -> Self {
        self.exclude_tables = patterns;
        self
    }

    pub fn with_check(mut self, check: Check) -> Self {
        self.check = check;
        self
    }
}
