//! Task graph assembly: subtask resolution and contributions.

use super::{Task, TaskTarget};
use crate::error::{ModelError, Result};
use indexmap::IndexMap;
use std::collections::HashSet;
use tracing::debug;

/// Stable index of a task in its [`TaskGraph`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TaskId(usize);

/// Arena of tasks in registration order.
#[derive(Debug, Default)]
pub struct TaskGraph {
    tasks: Vec<Task>,
    index: IndexMap<String, TaskId>,
}

impl TaskGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a task. A task with the same name is replaced in place.
    pub fn add_task(&mut self, task: Task) -> TaskId {
        if let Some(&id) = self.index.get(&task.name) {
            debug!(task = %task.name, "overriding task");
            self.tasks[id.0] = task;
            return id;
        }
        let id = TaskId(self.tasks.len());
        self.index.insert(task.name.clone(), id);
        self.tasks.push(task);
        id
    }

    pub fn get(&self, id: TaskId) -> &Task {
        &self.tasks[id.0]
    }

    pub fn id_of(&self, name: &str) -> Option<TaskId> {
        self.index.get(name).copied()
    }

    pub fn by_name(&self, name: &str) -> Option<&Task> {
        self.id_of(name).map(|id| self.get(id))
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    /// Names of the resolved subtasks of `id`; empty until resolved.
    pub fn subtask_names(&self, id: TaskId) -> Vec<&str> {
        self.get(id)
            .subtasks()
            .unwrap_or_default()
            .iter()
            .map(|&sub| self.get(sub).name.as_str())
            .collect()
    }

    /// First existing candidate of `target`, referenced from task `from`.
    fn lookup(&self, from: &str, target: &TaskTarget) -> Result<TaskId> {
        target
            .candidates()
            .iter()
            .find_map(|name| self.id_of(name))
            .ok_or_else(|| ModelError::TaskResolution {
                task: from.to_string(),
                candidates: target.candidates().to_vec(),
            })
    }

    /// Map the declared dependencies of `id` to task ids.
    ///
    /// Idempotent: once resolved, the subtask list is returned unchanged.
    pub fn resolve_subtasks(&mut self, id: TaskId) -> Result<&[TaskId]> {
        if self.tasks[id.0].subtasks.is_none() {
            let task = &self.tasks[id.0];
            let subtasks = task
                .deps
                .iter()
                .map(|dep| self.lookup(&task.name, dep))
                .collect::<Result<Vec<_>>>()?;
            self.tasks[id.0].subtasks = Some(subtasks);
        }
        Ok(self.tasks[id.0].subtasks.as_deref().unwrap_or_default())
    }

    /// Apply the append/prepend contributions of `id` to their targets.
    pub fn resolve_contributions(&mut self, id: TaskId) -> Result<()> {
        let task = &self.tasks[id.0];
        let append_to = task.append_to.clone();
        let prepend_to = task.prepend_to.clone();
        self.contribute(id, append_to.as_ref(), true)?;
        self.contribute(id, prepend_to.as_ref(), false)
    }

    fn contribute(&mut self, id: TaskId, target: Option<&TaskTarget>, append: bool) -> Result<()> {
        let Some(target) = target else {
            return Ok(());
        };
        let name = self.tasks[id.0].name.clone();
        let target_id = self.lookup(&name, target)?;
        if target_id == id || self.tasks[target_id.0].deps.iter().any(|d| d.is_name(&name)) {
            return Ok(());
        }

        // Existing dependencies of the target first, so several contributors
        // stack up on an initialized list.
        self.resolve_subtasks(target_id)?;

        let target_task = &mut self.tasks[target_id.0];
        debug!(
            task = %name,
            target = %target_task.name,
            mode = if append { "append" } else { "prepend" },
            "contributing dependency"
        );
        let subtasks = target_task.subtasks.get_or_insert_with(Vec::new);
        if append {
            target_task.deps.push(TaskTarget::One(name));
            subtasks.push(id);
        } else {
            target_task.deps.insert(0, TaskTarget::One(name));
            subtasks.insert(0, id);
        }
        Ok(())
    }

    /// Resolve every task's subtasks, then every task's contributions, in
    /// registration order.
    pub fn validate_all(&mut self) -> Result<()> {
        let ids: Vec<TaskId> = (0..self.tasks.len()).map(TaskId).collect();
        for &id in &ids {
            self.resolve_subtasks(id)?;
        }
        for &id in &ids {
            self.resolve_contributions(id)?;
        }
        debug!(tasks = ids.len(), "task graph validated");
        Ok(())
    }

    /// Dependencies-first order of `id` and everything it depends on, each
    /// task listed once.
    pub fn execution_order(&mut self, id: TaskId) -> Result<Vec<TaskId>> {
        let mut order = Vec::new();
        let mut done = HashSet::new();
        let mut visiting = HashSet::new();
        self.visit(id, &mut visiting, &mut done, &mut order)?;
        Ok(order)
    }

    fn visit(
        &mut self,
        id: TaskId,
        visiting: &mut HashSet<TaskId>,
        done: &mut HashSet<TaskId>,
        order: &mut Vec<TaskId>,
    ) -> Result<()> {
        if done.contains(&id) {
            return Ok(());
        }
        if !visiting.insert(id) {
            return Err(ModelError::TaskCycle {
                task: self.tasks[id.0].name.clone(),
            });
        }
        let subtasks = self.resolve_subtasks(id)?.to_vec();
        for sub in subtasks {
            self.visit(sub, visiting, done, order)?;
        }
        visiting.remove(&id);
        done.insert(id);
        order.push(id);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCode;

    fn graph(tasks: Vec<Task>) -> TaskGraph {
        let mut graph = TaskGraph::new();
        for task in tasks {
            graph.add_task(task);
        }
        graph
    }

    fn id(graph: &TaskGraph, name: &str) -> TaskId {
        graph.id_of(name).unwrap()
    }

    fn dep_names(graph: &TaskGraph, name: &str) -> Vec<String> {
        graph
            .by_name(name)
            .unwrap()
            .deps()
            .iter()
            .map(|d| d.candidates()[0].clone())
            .collect()
    }

    #[test]
    fn test_resolve_subtasks_idempotent() {
        let mut graph = graph(vec![
            Task::new("a"),
            Task::new("b").with_deps(["a"]),
        ]);
        let b = id(&graph, "b");
        let first = graph.resolve_subtasks(b).unwrap().to_vec();
        assert_eq!(first, vec![id(&graph, "a")]);
        assert_eq!(graph.resolve_subtasks(b).unwrap(), first.as_slice());
    }

    #[test]
    fn test_unknown_dependency_fails() {
        let mut graph = graph(vec![Task::new("b").with_deps(["missing"])]);
        let err = graph.validate_all().unwrap_err();
        assert_eq!(err.code(), ErrorCode::TaskResolution);
        assert!(err.to_string().contains("missing"));
    }

    #[test]
    fn test_candidate_dependency() {
        let mut graph = graph(vec![
            Task::new("present"),
            Task::new("b").with_deps([TaskTarget::from(vec!["missing", "present"])]),
        ]);
        graph.validate_all().unwrap();
        assert_eq!(graph.subtask_names(id(&graph, "b")), vec!["present"]);
    }

    #[test]
    fn test_append_contributions_keep_order() {
        let mut graph = graph(vec![
            Task::new("setup"),
            Task::new("target").with_deps(["setup"]),
            Task::new("t1").with_append_to("target"),
            Task::new("t2").with_append_to("target"),
        ]);
        graph.validate_all().unwrap();
        assert_eq!(dep_names(&graph, "target"), vec!["setup", "t1", "t2"]);
        assert_eq!(
            graph.subtask_names(id(&graph, "target")),
            vec!["setup", "t1", "t2"]
        );
    }

    #[test]
    fn test_prepend_contribution_goes_first() {
        let mut graph = graph(vec![
            Task::new("setup"),
            Task::new("target").with_deps(["setup"]),
            Task::new("early").with_prepend_to("target"),
        ]);
        graph.validate_all().unwrap();
        assert_eq!(dep_names(&graph, "target"), vec!["early", "setup"]);
        assert_eq!(
            graph.subtask_names(id(&graph, "target")),
            vec!["early", "setup"]
        );
    }

    #[test]
    fn test_contribution_before_target_is_registered_first() {
        // Contributor visited before the target: target's own deps must still
        // be resolved before the contribution is added.
        let mut graph = graph(vec![
            Task::new("setup"),
            Task::new("t1").with_append_to("target"),
            Task::new("target").with_deps(["setup"]),
        ]);
        let t1 = id(&graph, "t1");
        graph.resolve_contributions(t1).unwrap();
        let target = id(&graph, "target");
        assert_eq!(graph.subtask_names(target), vec!["setup", "t1"]);
        graph.validate_all().unwrap();
        assert_eq!(graph.subtask_names(target), vec!["setup", "t1"]);
    }

    #[test]
    fn test_self_and_duplicate_contributions_are_noops() {
        let mut graph = graph(vec![
            Task::new("t1"),
            Task::new("target").with_deps(["t1"]),
            Task::new("selfish").with_append_to("selfish"),
        ]);
        graph.add_task(Task::new("t1").with_append_to("target"));
        graph.validate_all().unwrap();
        assert_eq!(dep_names(&graph, "target"), vec!["t1"]);
        assert!(dep_names(&graph, "selfish").is_empty());
    }

    #[test]
    fn test_contribution_candidates() {
        let mut graph = graph(vec![
            Task::new("present"),
            Task::new("t").with_append_to(vec!["missing", "present"]),
        ]);
        graph.validate_all().unwrap();
        assert_eq!(dep_names(&graph, "present"), vec!["t"]);

        let mut graph = graph_missing();
        let err = graph.validate_all().unwrap_err();
        assert!(matches!(err, ModelError::TaskResolution { ref candidates, .. } if candidates.len() == 2));
    }

    fn graph_missing() -> TaskGraph {
        graph(vec![Task::new("t").with_prepend_to(vec!["nope", "neither"])])
    }

    #[test]
    fn test_replaced_task_keeps_position() {
        let mut graph = graph(vec![Task::new("a"), Task::new("b")]);
        let a = graph.add_task(Task::new("a").with_description("new"));
        assert_eq!(a, TaskId(0));
        assert_eq!(graph.len(), 2);
        assert_eq!(graph.get(a).description, "new");
    }

    #[test]
    fn test_execution_order_dependencies_first() {
        let mut graph = graph(vec![
            Task::new("fetch"),
            Task::new("compile").with_deps(["fetch"]),
            Task::new("test").with_deps(["compile", "fetch"]),
            Task::new("lint").with_append_to("test"),
        ]);
        graph.validate_all().unwrap();
        let test = id(&graph, "test");
        let order: Vec<String> = graph
            .execution_order(test)
            .unwrap()
            .into_iter()
            .map(|t| graph.get(t).name.clone())
            .collect();
        assert_eq!(order, vec!["fetch", "compile", "lint", "test"]);
    }

    #[test]
    fn test_execution_order_detects_cycle() {
        let mut graph = graph(vec![
            Task::new("a").with_deps(["b"]),
            Task::new("b").with_deps(["a"]),
        ]);
        graph.validate_all().unwrap();
        let a = id(&graph, "a");
        assert_eq!(
            graph.execution_order(a).unwrap_err().code(),
            ErrorCode::TaskCycle
        );
    }
}
