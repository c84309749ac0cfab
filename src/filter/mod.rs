use glob::Pattern;

/// Glob-based table selection. Exclusions win over inclusions; with no
/// inclusions every table not excluded is kept.
#[derive(Debug, Clone, Default)]
pub struct TableFilter {
    include: Vec<Pattern>,
    exclude: Vec<Pattern>,
}

impl TableFilter {
    pub fn new(include: &[String], exclude: &[String]) -> Result<Self, glob::PatternError> {
        let include = include
            .iter()
            .map(|s| Pattern::new(s))
            .collect::<Result<Vec<_>, _>>()?;

        let exclude = exclude
            .iter()
            .map(|s| Pattern::new(s))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(TableFilter { include, exclude })
    }

    pub fn is_empty(&self) -> bool {
        self.include.is_empty() && self.exclude.is_empty()
    }

    pub fn matches(&self, table: &str) -> bool {
        if self.exclude.iter().any(|pattern| pattern.matches(table)) {
            return false;
        }

        self.include.is_empty() || self.include.iter().any(|pattern| pattern.matches(table))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn patterns(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn no_filters_includes_everything() {
        let filter = TableFilter::new(&[], &[]).unwrap();
        assert!(filter.is_empty());
        assert!(filter.matches("anything"));
    }

    #[test]
    fn exclude_underscore_prefix() {
        let filter = TableFilter::new(&[], &patterns(&["_*"])).unwrap();
        assert!(!filter.matches("_migrations"));
        assert!(filter.matches("bilans"));
    }

    #[test]
    fn include_pattern_filters() {
        let filter = TableFilter::new(&patterns(&["bilan*"]), &[]).unwrap();
        assert!(filter.matches("bilans"));
        assert!(filter.matches("bilan_documents"));
        assert!(!filter.matches("profiles"));
    }

    #[test]
    fn exclude_takes_precedence() {
        let filter = TableFilter::new(&patterns(&["bilan*"]), &patterns(&["*_archive"])).unwrap();
        assert!(!filter.matches("bilans_archive"));
    }

    #[test]
    fn question_mark_matches_single_char() {
        let filter = TableFilter::new(&patterns(&["rdv_?"]), &[]).unwrap();
        assert!(filter.matches("rdv_a"));
        assert!(!filter.matches("rdv_ab"));
    }

    #[test]
    fn invalid_pattern_returns_error() {
        assert!(TableFilter::new(&patterns(&["[invalid"]), &[]).is_err());
        assert!(TableFilter::new(&[], &patterns(&["[invalid"])).is_err());
    }
}
