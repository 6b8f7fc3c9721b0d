use std::collections::HashMap;

use uuid::Uuid;

use crate::tasks::{Task, TaskStatus};

/// Where a dragged card was dropped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DropTarget {
    /// Empty area of a column.
    Column(TaskStatus),
    /// On top of another card.
    Task(Uuid),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Position {
    pub status: TaskStatus,
    pub index: usize,
}

/// A task and its slot, taken before an optimistic change.
#[derive(Debug, Clone)]
pub(crate) struct Snapshot {
    task: Task,
    position: Position,
    generation: u64,
}

impl Snapshot {
    pub(crate) fn position(&self) -> Position {
        self.position
    }
}

/// Rendered board: each column's tasks in display order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BoardView {
    pub todo: Vec<Task>,
    pub in_progress: Vec<Task>,
    pub done: Vec<Task>,
}

impl BoardView {
    pub fn column(&self, status: TaskStatus) -> &[Task] {
        match status {
            TaskStatus::Todo => &self.todo,
            TaskStatus::InProgress => &self.in_progress,
            TaskStatus::Done => &self.done,
        }
    }

    pub fn ids(&self, status: TaskStatus) -> Vec<Uuid> {
        self.column(status).iter().map(|t| t.id).collect()
    }
}

/// Tasks of one project, keyed by id and ordered per column.
///
/// Every task id sits in exactly one column, the one matching its status.
/// Column order is local only; the server keeps no order field.
#[derive(Debug, Default)]
pub struct BoardState {
    project_id: Option<Uuid>,
    tasks: HashMap<Uuid, Task>,
    columns: [Vec<Uuid>; 3],
    generation: u64,
}

impl BoardState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn project_id(&self) -> Option<Uuid> {
        self.project_id
    }

    /// Bumped by every [`BoardState::replace`].
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    pub fn task(&self, id: Uuid) -> Option<&Task> {
        self.tasks.get(&id)
    }

    pub fn column_ids(&self, status: TaskStatus) -> &[Uuid] {
        &self.columns[status.index()]
    }

    pub fn position(&self, id: Uuid) -> Option<Position> {
        let status = self.tasks.get(&id)?.status;
        let index = self.columns[status.index()].iter().position(|t| *t == id)?;
        Some(Position { status, index })
    }

    pub fn view(&self) -> BoardView {
        let collect = |status: TaskStatus| -> Vec<Task> {
            self.columns[status.index()]
                .iter()
                .filter_map(|id| self.tasks.get(id).cloned())
                .collect()
        };
        BoardView {
            todo: collect(TaskStatus::Todo),
            in_progress: collect(TaskStatus::InProgress),
            done: collect(TaskStatus::Done),
        }
    }

    /// Replaces everything with the server's list, keeping its order.
    pub fn replace(&mut self, project_id: Uuid, tasks: Vec<Task>) {
        self.project_id = Some(project_id);
        self.tasks.clear();
        self.columns.iter_mut().for_each(Vec::clear);
        for task in tasks {
            self.detach(task.id);
            self.push(task);
        }
        self.generation += 1;
    }

    pub fn resolve_target(&self, target: DropTarget) -> Option<TaskStatus> {
        match target {
            DropTarget::Column(status) => Some(status),
            DropTarget::Task(id) => self.tasks.get(&id).map(|t| t.status),
        }
    }

    /// Single-element move inside one column: take `active` out and put it
    /// at the index `over` had. Returns `false` if nothing changed.
    pub fn reorder(&mut self, active: Uuid, over: Uuid) -> bool {
        let (Some(from), Some(to)) = (self.position(active), self.position(over)) else {
            return false;
        };
        if from.status != to.status || from.index == to.index {
            return false;
        }
        let column = &mut self.columns[from.status.index()];
        let id = column.remove(from.index);
        column.insert(to.index, id);
        true
    }

    /// Moves a task into `status` at `index` (end of column when `None`).
    /// Returns where it was.
    pub fn set_status(
        &mut self,
        id: Uuid,
        status: TaskStatus,
        index: Option<usize>,
    ) -> Option<Position> {
        let previous = self.detach(id)?;
        let task = self.tasks.get_mut(&id)?;
        task.status = status;
        let column = &mut self.columns[status.index()];
        let at = index.unwrap_or(column.len()).min(column.len());
        column.insert(at, id);
        Some(previous)
    }

    /// Takes a server copy of a task. A known task keeps its slot unless the
    /// server moved it to another column; new or moved tasks go to the end.
    pub fn merge(&mut self, task: Task) {
        match self.tasks.get(&task.id).map(|t| t.status) {
            Some(status) if status == task.status => {
                self.tasks.insert(task.id, task);
            }
            Some(_) => {
                self.detach(task.id);
                self.push(task);
            }
            None => self.push(task),
        }
    }

    pub fn remove(&mut self, id: Uuid) -> Option<(Task, Position)> {
        let position = self.detach(id)?;
        let task = self.tasks.remove(&id)?;
        Some((task, position))
    }

    pub(crate) fn snapshot(&self, id: Uuid) -> Option<Snapshot> {
        Some(Snapshot {
            task: self.tasks.get(&id)?.clone(),
            position: self.position(id)?,
            generation: self.generation,
        })
    }

    /// Puts a task back exactly where the snapshot saw it.
    ///
    /// Skipped (returns `false`) if a `replace` happened since the snapshot:
    /// the fresh server list already wins.
    pub(crate) fn restore(&mut self, snapshot: Snapshot) -> bool {
        if snapshot.generation != self.generation {
            return false;
        }
        let id = snapshot.task.id;
        self.detach(id);
        let column = &mut self.columns[snapshot.position.status.index()];
        let at = snapshot.position.index.min(column.len());
        column.insert(at, id);
        self.tasks.insert(id, snapshot.task);
        true
    }

    fn push(&mut self, task: Task) {
        self.columns[task.status.index()].push(task.id);
        self.tasks.insert(task.id, task);
    }

    /// Removes the id from its column, leaving the task record in place.
    fn detach(&mut self, id: Uuid) -> Option<Position> {
        let position = self.position(id)?;
        self.columns[position.status.index()].remove(position.index);
        Some(position)
    }

    #[cfg(test)]
    pub(crate) fn is_consistent(&self) -> bool {
        let placed: usize = self.columns.iter().map(Vec::len).sum();
        placed == self.tasks.len()
            && TaskStatus::ALL.iter().all(|status| {
                self.columns[status.index()]
                    .iter()
                    .all(|id| self.tasks.get(id).is_some_and(|t| t.status == *status))
            })
    }
}
