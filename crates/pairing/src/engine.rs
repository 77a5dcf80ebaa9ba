use crate::assignment::Assignment;
use crate::error::{PairingError, Result};
use crate::group::FieldmapGroup;
use crate::strategy::Strategy;
use intended_for_catalog::Acquisition;

/// Assigns functional acquisitions to fieldmap groups.
///
/// Both inputs must already be sorted ascending by `order_key`; the engine
/// does not re-sort. Each call returns a fresh [`Assignment`].
#[derive(Debug, Clone)]
pub struct PairingEngine {
    strategy: Strategy,
    task_order: Vec<String>,
}

impl PairingEngine {
    pub fn new(strategy: Strategy) -> Self {
        Self {
            strategy,
            task_order: Vec::new(),
        }
    }

    /// Task enumeration used to partition acquisitions under [`Strategy::Task`].
    pub fn with_task_order<I, S>(mut self, tasks: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.task_order = tasks.into_iter().map(Into::into).collect();
        self
    }

    pub fn strategy(&self) -> Strategy {
        self.strategy
    }

    pub fn pair<'a>(
        &self,
        acquisitions: &'a [Acquisition],
        groups: &'a [FieldmapGroup],
    ) -> Result<Assignment<'a>> {
        if groups.is_empty() {
            log::debug!("No fieldmap groups; nothing to assign");
            return Ok(Assignment::default());
        }

        let mut assignment = Assignment::for_groups(groups);
        match self.strategy {
            Strategy::Last => assign_last(&mut assignment, groups, acquisitions.iter()),
            Strategy::Closest => assign_closest(&mut assignment, groups, acquisitions),
            Strategy::Task => {
                for partition in self.task_partitions(acquisitions) {
                    assign_last(&mut assignment, groups, partition.into_iter());
                }
            }
            Strategy::EtaSquared => {
                return Err(PairingError::UnsupportedStrategy(
                    Strategy::EtaSquared.to_string(),
                ));
            }
        }

        log::debug!(
            "Strategy {} assigned {} acquisitions to {} groups",
            self.strategy,
            assignment.assigned_count(),
            groups.len()
        );
        Ok(assignment)
    }

    /// Acquisitions split by task in enumeration order. Acquisitions without
    /// a task, or with a task missing from the enumeration, form a final
    /// partition so that none is dropped.
    fn task_partitions<'a>(&self, acquisitions: &'a [Acquisition]) -> Vec<Vec<&'a Acquisition>> {
        let mut partitions: Vec<Vec<&'a Acquisition>> = self
            .task_order
            .iter()
            .map(|task| {
                acquisitions
                    .iter()
                    .filter(|acq| acq.task.as_deref() == Some(task.as_str()))
                    .collect()
            })
            .collect();

        let rest: Vec<&'a Acquisition> = acquisitions
            .iter()
            .filter(|acq| {
                acq.task
                    .as_ref()
                    .map_or(true, |task| !self.task_order.contains(task))
            })
            .collect();
        if !rest.is_empty() {
            log::debug!("{} acquisitions outside the task enumeration", rest.len());
            partitions.push(rest);
        }
        partitions
    }
}

fn assign_last<'a>(
    assignment: &mut Assignment<'a>,
    groups: &'a [FieldmapGroup],
    acquisitions: impl Iterator<Item = &'a Acquisition>,
) {
    // max_by_key keeps the later group on equal keys.
    let Some((slot, _)) = groups
        .iter()
        .enumerate()
        .max_by_key(|(_, group)| group.order_key)
    else {
        return;
    };
    for acquisition in acquisitions {
        assignment.assign(slot, acquisition);
    }
}

/// Two-pointer merge: the cursor only moves forward, and it moves past a
/// group only when the acquisition is strictly later than the next group.
fn assign_closest<'a>(
    assignment: &mut Assignment<'a>,
    groups: &'a [FieldmapGroup],
    acquisitions: &'a [Acquisition],
) {
    let last = groups.len() - 1;
    let mut cursor = 0;
    for acquisition in acquisitions {
        while cursor < last && acquisition.order_key > groups[cursor + 1].order_key {
            cursor += 1;
        }
        assignment.assign(cursor, acquisition);
    }
}
