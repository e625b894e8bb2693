//! Group manifest: group name to ordered file list.
//!
//! Entries starting with `@` splice in another group's files at that
//! position, so `["@angularSrc", "src/extra.js"]` expands to every file of
//! `angularSrc` followed by `src/extra.js`.

use indexmap::{IndexMap, IndexSet};
use log::debug;

use crate::error::{BuildError, Result};

const GROUP_REF_PREFIX: char = '@';

/// Immutable view of the configured file groups.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GroupManifest {
    groups: IndexMap<String, Vec<String>>,
}

impl GroupManifest {
    pub fn new(groups: IndexMap<String, Vec<String>>) -> Self {
        Self { groups }
    }

    pub fn contains(&self, group: &str) -> bool {
        self.groups.contains_key(group)
    }

    pub fn group_names(&self) -> impl Iterator<Item = &str> {
        self.groups.keys().map(String::as_str)
    }

    /// Raw entries of every group, `@` references included
    pub fn raw_entries(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.groups
            .iter()
            .map(|(name, files)| (name.as_str(), files.as_slice()))
    }

    /// Expanded, ordered file list for one group.
    ///
    /// `module` only labels the error when the group does not exist.
    pub fn files_for(&self, module: &str, group: &str) -> Result<Vec<String>> {
        let mut files = Vec::new();
        let mut stack = IndexSet::new();
        self.expand_into(module, group, &mut stack, &mut files)?;
        debug!("Group '{group}' expands to {} files", files.len());
        Ok(files)
    }

    /// Concatenate the expansions of several groups, in argument order.
    /// Duplicates are kept.
    pub fn merge_files_for(&self, module: &str, groups: &[&str]) -> Result<Vec<String>> {
        let mut files = Vec::new();
        for group in groups {
            files.extend(self.files_for(module, group)?);
        }
        Ok(files)
    }

    fn expand_into(
        &self,
        module: &str,
        group: &str,
        stack: &mut IndexSet<String>,
        out: &mut Vec<String>,
    ) -> Result<()> {
        let Some(entries) = self.groups.get(group) else {
            return Err(BuildError::UnknownGroup {
                module: module.to_owned(),
                group: group.to_owned(),
            });
        };

        if !stack.insert(group.to_owned()) {
            let mut chain: Vec<String> = stack.iter().cloned().collect();
            chain.push(group.to_owned());
            return Err(BuildError::GroupCycle { chain });
        }

        for entry in entries {
            match entry.strip_prefix(GROUP_REF_PREFIX) {
                Some(referenced) => self.expand_into(module, referenced, stack, out)?,
                None => out.push(entry.clone()),
            }
        }

        stack.pop();
        Ok(())
    }
}
