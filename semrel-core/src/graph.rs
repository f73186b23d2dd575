//! Dependency-ordered async task execution using petgraph and tokio.

use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;

use petgraph::algo::toposort;
use petgraph::graph::{DiGraph, NodeIndex};
use tokio::task::JoinSet;

use crate::error::{Error, Result};

type TaskFuture<T> = Pin<Box<dyn Future<Output = Result<T>> + Send>>;
type TaskFn<T> = Box<dyn FnOnce(TaskInputs<T>) -> TaskFuture<T> + Send>;

/// Results of a task's declared dependencies.
#[derive(Debug)]
pub struct TaskInputs<T> {
    results: HashMap<String, T>,
}

impl<T> TaskInputs<T> {
    pub fn get(&self, name: &str) -> Option<&T> {
        self.results.get(name)
    }

    /// Takes ownership of a dependency's result.
    pub fn take(&mut self, name: &str) -> Option<T> {
        self.results.remove(name)
    }

    pub fn len(&self) -> usize {
        self.results.len()
    }

    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }
}

struct TaskNode<T> {
    name: String,
    deps: Vec<String>,
    run: TaskFn<T>,
}

/// A set of named async tasks with declared dependencies.
///
/// Each task runs exactly once, after all of its dependencies have completed,
/// and receives their results. Tasks without a dependency path between them
/// may run concurrently.
pub struct TaskGraph<T> {
    tasks: Vec<TaskNode<T>>,
}

impl<T> Default for TaskGraph<T> {
    fn default() -> Self {
        Self { tasks: Vec::new() }
    }
}

impl<T> TaskGraph<T>
where
    T: Clone + Send + 'static,
{
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a task that runs once every task in `deps` has succeeded.
    pub fn task<F, Fut>(mut self, name: &str, deps: &[&str], run: F) -> Self
    where
        F: FnOnce(TaskInputs<T>) -> Fut + Send + 'static,
        Fut: Future<Output = Result<T>> + Send + 'static,
    {
        self.tasks.push(TaskNode {
            name: name.to_string(),
            deps: deps.iter().map(|d| d.to_string()).collect(),
            run: Box::new(move |inputs| Box::pin(run(inputs))),
        });
        self
    }

    /// Returns task names in an order consistent with their dependencies.
    ///
    /// # Errors
    ///
    /// Returns an error if a dependency is not a task in the graph or the
    /// dependencies form a cycle.
    pub fn execution_order(&self) -> Result<Vec<String>> {
        let mut graph = DiGraph::<String, ()>::new();
        let mut node_map: HashMap<&str, NodeIndex> = HashMap::new();

        for task in &self.tasks {
            if node_map.contains_key(task.name.as_str()) {
                return Err(Error::TaskGraph(format!(
                    "Task '{}' is defined more than once",
                    task.name
                )));
            }
            let node = graph.add_node(task.name.clone());
            node_map.insert(task.name.as_str(), node);
        }

        for task in &self.tasks {
            let to_node = node_map[task.name.as_str()];
            for dep in &task.deps {
                let from_node =
                    node_map
                        .get(dep.as_str())
                        .ok_or_else(|| Error::TaskNotFound {
                            name: dep.clone(),
                            required_by: task.name.clone(),
                        })?;
                graph.add_edge(*from_node, to_node, ());
            }
        }

        let sorted = toposort(&graph, None).map_err(|cycle| {
            let cycle_node = graph[cycle.node_id()].clone();
            Error::CircularDependency(format!("Cycle detected involving: {}", cycle_node))
        })?;

        Ok(sorted.into_iter().map(|idx| graph[idx].clone()).collect())
    }

    /// Runs every task and returns all results keyed by task name.
    ///
    /// On the first failure no further tasks are started; tasks already
    /// running are awaited and their results discarded, and that first
    /// failure is returned.
    ///
    /// # Errors
    ///
    /// Returns the first task error, or a graph error if the graph is invalid
    /// or a task panics.
    pub async fn run(self) -> Result<HashMap<String, T>> {
        let order = self.execution_order()?;

        let mut pending: HashMap<String, TaskNode<T>> = self
            .tasks
            .into_iter()
            .map(|task| (task.name.clone(), task))
            .collect();
        let mut completed: HashMap<String, T> = HashMap::with_capacity(order.len());
        let mut join_set: JoinSet<(String, Result<T>)> = JoinSet::new();
        let mut failure: Option<Error> = None;

        loop {
            if failure.is_none() {
                let ready: Vec<String> = order
                    .iter()
                    .filter(|name| {
                        pending
                            .get(*name)
                            .map(|task| task.deps.iter().all(|d| completed.contains_key(d)))
                            .unwrap_or(false)
                    })
                    .cloned()
                    .collect();

                for name in ready {
                    let Some(task) = pending.remove(&name) else {
                        continue;
                    };
                    let inputs = TaskInputs {
                        results: task
                            .deps
                            .iter()
                            .filter_map(|d| completed.get(d).map(|r| (d.clone(), r.clone())))
                            .collect(),
                    };
                    tracing::trace!(task = %name, "starting task");
                    let future = (task.run)(inputs);
                    join_set.spawn(async move { (name, future.await) });
                }
            }

            let Some(joined) = join_set.join_next().await else {
                break;
            };

            let (name, result) = match joined {
                Ok(pair) => pair,
                Err(e) => {
                    if failure.is_none() {
                        failure = Some(Error::TaskGraph(format!("Task panicked: {}", e)));
                    }
                    continue;
                }
            };

            match result {
                Ok(value) if failure.is_none() => {
                    tracing::trace!(task = %name, "task completed");
                    completed.insert(name, value);
                }
                Ok(_) => {
                    tracing::debug!(task = %name, "discarding result after earlier failure");
                }
                Err(e) => {
                    tracing::debug!(task = %name, error = %e, "task failed");
                    if failure.is_none() {
                        failure = Some(e);
                    }
                }
            }
        }

        if let Some(e) = failure {
            return Err(e);
        }

        if !pending.is_empty() {
            let mut names: Vec<String> = pending.into_keys().collect();
            names.sort();
            return Err(Error::TaskGraph(format!(
                "Tasks never became ready: {}",
                names.join(", ")
            )));
        }

        Ok(completed)
    }
}
