use crate::group::FieldmapGroup;
use intended_for_catalog::{Acquisition, FieldmapFile};

/// Acquisitions assigned to one fieldmap group, in assignment order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupAssignment<'a> {
    pub group: &'a FieldmapGroup,
    pub acquisitions: Vec<&'a Acquisition>,
}

/// Result of one pairing run. Borrows the caller's acquisitions and groups;
/// every group is present, possibly with no acquisitions.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Assignment<'a> {
    groups: Vec<GroupAssignment<'a>>,
}

impl<'a> Assignment<'a> {
    pub(crate) fn for_groups(groups: &'a [FieldmapGroup]) -> Self {
        Self {
            groups: groups
                .iter()
                .map(|group| GroupAssignment {
                    group,
                    acquisitions: Vec::new(),
                })
                .collect(),
        }
    }

    pub(crate) fn assign(&mut self, slot: usize, acquisition: &'a Acquisition) {
        self.groups[slot].acquisitions.push(acquisition);
    }

    /// True when there were no groups to assign to.
    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    pub fn groups(&self) -> &[GroupAssignment<'a>] {
        &self.groups
    }

    /// Number of acquisitions assigned across all groups.
    pub fn assigned_count(&self) -> usize {
        self.groups.iter().map(|g| g.acquisitions.len()).sum()
    }

    /// One entry per fieldmap file: both members of a group share the
    /// group's acquisition list.
    pub fn per_fieldmap_file(
        &self,
    ) -> impl Iterator<Item = (&'a FieldmapFile, &[&'a Acquisition])> + '_ {
        self.groups.iter().flat_map(|entry| {
            entry
                .group
                .members
                .iter()
                .map(move |member| (member, entry.acquisitions.as_slice()))
        })
    }
}
