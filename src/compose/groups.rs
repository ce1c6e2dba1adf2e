//! Constellation expansion

use std::collections::HashMap;

/// Expands a single constellation name into its member directories
#[derive(Debug, Clone, Default)]
pub struct GroupExpander {
    groups: HashMap<String, Vec<String>>,
}

impl GroupExpander {
    pub fn new(groups: HashMap<String, Vec<String>>) -> Self {
        Self { groups }
    }

    /// Replace a one-element request naming a group with that group's members.
    ///
    /// Anything else passes through untouched, and members are never
    /// expanded again.
    pub fn expand(&self, requested: &[String]) -> Vec<String> {
        if let [single] = requested {
            if let Some(members) = self.groups.get(single) {
                tracing::debug!("Expanding constellation {} to {:?}", single, members);
                return members.clone();
            }
        }

        requested.to_vec()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strings(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    fn expander() -> GroupExpander {
        let mut groups = HashMap::new();
        groups.insert("teams".to_string(), strings(&["api", "billing"]));
        groups.insert("everything".to_string(), strings(&["teams", "gateway"]));
        GroupExpander::new(groups)
    }

    #[test]
    fn test_single_group_expands() {
        assert_eq!(
            expander().expand(&strings(&["teams"])),
            strings(&["api", "billing"])
        );
    }

    #[test]
    fn test_multiple_names_never_expand() {
        assert_eq!(
            expander().expand(&strings(&["teams", "gateway"])),
            strings(&["teams", "gateway"])
        );
    }

    #[test]
    fn test_no_recursive_expansion() {
        assert_eq!(
            expander().expand(&strings(&["everything"])),
            strings(&["teams", "gateway"])
        );
    }

    #[test]
    fn test_unknown_name_passes_through() {
        assert_eq!(expander().expand(&strings(&["api"])), strings(&["api"]));
        assert!(expander().expand(&[]).is_empty());
    }
}
