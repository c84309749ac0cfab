#![allow(dead_code)]

pub use driftcheck::api::{verify, VerifyOptions};
pub use driftcheck::report::{render_text, Check, ExitStatus};
pub use std::fs;
pub use std::path::{Path, PathBuf};
pub use tempfile::TempDir;

/// A throwaway project laid out like a real one: migrations, a generated
/// type file and a module tree, all under a temporary root.
pub struct Project {
    pub root: TempDir,
}

impl Project {
    pub fn new() -> Self {
        let project = Self {
            root: TempDir::new().unwrap(),
        };
        fs::create_dir_all(project.migrations_dir()).unwrap();
        fs::create_dir_all(project.modules_dir()).unwrap();
        project
    }

    pub fn migrations_dir(&self) -> PathBuf {
        self.root.path().join("supabase/migrations")
    }

    pub fn types_file(&self) -> PathBuf {
        self.root.path().join("src/types/database.types.ts")
    }

    pub fn modules_dir(&self) -> PathBuf {
        self.root.path().join("src/lib/supabase/modules")
    }

    pub fn migration(self, name: &str, sql: &str) -> Self {
        fs::write(self.migrations_dir().join(name), sql).unwrap();
        self
    }

    pub fn types(self, ts: &str) -> Self {
        let path = self.types_file();
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, ts).unwrap();
        self
    }

    pub fn module(self, name: &str, ts: &str) -> Self {
        let dir = self.modules_dir().join(name);
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join("index.ts"), ts).unwrap();
        self
    }

    pub fn options(&self) -> VerifyOptions {
        VerifyOptions::in_project(self.root.path())
    }
}

pub const INIT_SQL: &str = r#"
CREATE TABLE profiles (
    id UUID PRIMARY KEY,
    email TEXT NOT NULL
);

CREATE TABLE bilans (
    id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
    beneficiaire_id UUID NOT NULL REFERENCES profiles(id),
    consultant_id UUID,
    statut TEXT DEFAULT 'en_cours'
);
"#;

pub const ADD_PHONE_SQL: &str = "ALTER TABLE profiles ADD COLUMN IF NOT EXISTS phone TEXT;\n";

/// Types matching `INIT_SQL` followed by `ADD_PHONE_SQL`.
pub const SYNCED_TYPES: &str = r#"
export type Database = {
  public: {
    Tables: {
      profiles: {
        Row: {
          id: string
          email: string
          phone: string | null
        }
        Insert: {
          id: string
          email: string
        }
      }
      bilans: {
        Row: {
          id: string
          beneficiaire_id: string
          consultant_id: string | null
          statut: string | null
        }
      }
    }
  }
}
"#;

pub const CLEAN_MODULE: &str = r#"
export async function listBilans(beneficiaireId: string) {
  return supabase
    .from('bilans')
    .select('*')
    .eq('beneficiaire_id', beneficiaireId)
    .order('statut')
}
"#;

/// A project where every comparison is clean.
pub fn clean_project() -> Project {
    Project::new()
        .migration("001_init.sql", INIT_SQL)
        .migration("002_phone.sql", ADD_PHONE_SQL)
        .types(SYNCED_TYPES)
        .module("bilans", CLEAN_MODULE)
}
