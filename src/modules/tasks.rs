//! To-do list with priorities, due dates, filtering and sorting.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::load_or_notice;
use crate::host::lifecycle::{
    ActionOutcome, Module, ModuleAction, ModuleContext, ModuleError, ModuleView, Notice,
};
use crate::registry::ModuleId;

const ITEMS_KEY: &str = "items";

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Low,
    Medium,
    High,
}

impl Priority {
    fn parse(raw: &str) -> Option<Self> {
        match raw {
            "low" => Some(Self::Low),
            "medium" => Some(Self::Medium),
            "high" => Some(Self::High),
            _ => None,
        }
    }

    fn rank(priority: Option<Self>) -> u8 {
        match priority {
            Some(Self::High) => 3,
            Some(Self::Medium) => 2,
            Some(Self::Low) => 1,
            None => 0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: i64,
    pub text: String,
    pub done: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub due_date: Option<chrono::NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub priority: Option<Priority>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskFilter {
    #[default]
    All,
    Active,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskSort {
    #[default]
    Default,
    Alpha,
    Date,
    Priority,
}

#[derive(Serialize)]
struct TasksView<'a> {
    tasks: Vec<&'a Task>,
    filter: TaskFilter,
    sort: TaskSort,
    query: &'a str,
    remaining: usize,
}

pub struct TasksModule {
    id: ModuleId,
    tasks: Vec<Task>,
    filter: TaskFilter,
    sort: TaskSort,
    query: String,
    notice: Option<Notice>,
}

impl TasksModule {
    pub fn new() -> Self {
        Self {
            id: ModuleId::from("tasks"),
            tasks: Vec::new(),
            filter: TaskFilter::default(),
            sort: TaskSort::default(),
            query: String::new(),
            notice: None,
        }
    }

    /// Tasks after filter, search and sort, as displayed.
    pub fn visible_tasks(&self) -> Vec<&Task> {
        let needle = self.query.trim().to_lowercase();
        let mut out: Vec<&Task> = self
            .tasks
            .iter()
            .filter(|t| self.filter == TaskFilter::All || !t.done)
            .filter(|t| needle.is_empty() || t.text.to_lowercase().contains(&needle))
            .collect();
        match self.sort {
            TaskSort::Default => {}
            TaskSort::Alpha => out.sort_by(|a, b| a.text.to_lowercase().cmp(&b.text.to_lowercase())),
            // Undated tasks sort last.
            TaskSort::Date => out.sort_by_key(|t| (t.due_date.is_none(), t.due_date)),
            TaskSort::Priority => {
                out.sort_by(|a, b| Priority::rank(b.priority).cmp(&Priority::rank(a.priority)))
            }
        }
        out
    }

    fn next_id(&self) -> i64 {
        let now = chrono::Utc::now().timestamp_millis();
        let max = self.tasks.iter().map(|t| t.id).max().unwrap_or(0);
        now.max(max + 1)
    }

    fn find_mut(&mut self, id: i64) -> Result<&mut Task, ModuleError> {
        self.tasks
            .iter_mut()
            .find(|t| t.id == id)
            .ok_or_else(|| ModuleError::InvalidAction(format!("no task {id}")))
    }

    fn save(&mut self, ctx: &ModuleContext) -> Result<(), ModuleError> {
        ctx.store.put(ITEMS_KEY, &self.tasks)?;
        self.notice = None;
        Ok(())
    }
}

fn parse_due(action: &ModuleAction) -> Result<Option<chrono::NaiveDate>, ModuleError> {
    match action.payload.get("dueDate").and_then(|v| v.as_str()) {
        Some(raw) if !raw.is_empty() => chrono::NaiveDate::parse_from_str(raw, "%Y-%m-%d")
            .map(Some)
            .map_err(|e| ModuleError::InvalidAction(format!("dueDate: {e}"))),
        _ => Ok(None),
    }
}

#[async_trait]
impl Module for TasksModule {
    async fn mount(&mut self, ctx: &mut ModuleContext) -> Result<(), ModuleError> {
        let (tasks, notice) = load_or_notice(&ctx.store, ITEMS_KEY)?;
        self.tasks = tasks;
        self.notice = notice;
        Ok(())
    }

    fn render(&self) -> ModuleView {
        let view = TasksView {
            tasks: self.visible_tasks(),
            filter: self.filter,
            sort: self.sort,
            query: &self.query,
            remaining: self.tasks.iter().filter(|t| !t.done).count(),
        };
        ModuleView::ready(&self.id, view).with_notice(self.notice.clone())
    }

    async fn handle(
        &mut self,
        action: ModuleAction,
        ctx: &mut ModuleContext,
    ) -> Result<ActionOutcome, ModuleError> {
        match action.name.as_str() {
            "add" => {
                let text = action.str_arg("text")?.trim().to_string();
                if text.is_empty() {
                    return Ok(ActionOutcome::Handled);
                }
                let priority = action
                    .payload
                    .get("priority")
                    .and_then(|v| v.as_str())
                    .and_then(Priority::parse);
                let task = Task {
                    id: self.next_id(),
                    text,
                    done: false,
                    due_date: parse_due(&action)?,
                    priority,
                };
                self.tasks.insert(0, task);
                self.save(ctx)?;
            }
            "toggle" => {
                let task = self.find_mut(action.i64_arg("id")?)?;
                task.done = !task.done;
                self.save(ctx)?;
            }
            "update" => {
                let due = parse_due(&action)?;
                let task = self.find_mut(action.i64_arg("id")?)?;
                if let Some(text) = action.payload.get("text").and_then(|v| v.as_str()) {
                    task.text = text.to_string();
                }
                if let Some(p) = action.payload.get("priority").and_then(|v| v.as_str()) {
                    task.priority = Priority::parse(p);
                }
                if action.payload.get("dueDate").is_some() {
                    task.due_date = due;
                }
                self.save(ctx)?;
            }
            "delete" => {
                let id = action.i64_arg("id")?;
                self.tasks.retain(|t| t.id != id);
                self.save(ctx)?;
            }
            "reorder" => {
                let order: Vec<i64> = action
                    .payload
                    .get("ids")
                    .and_then(|v| serde_json::from_value(v.clone()).ok())
                    .ok_or_else(|| ModuleError::InvalidAction("reorder: missing 'ids'".into()))?;
                let mut reordered: Vec<Task> = order
                    .iter()
                    .filter_map(|id| self.tasks.iter().find(|t| t.id == *id).cloned())
                    .collect();
                // Tasks missing from the new order keep their relative order at the end.
                for task in &self.tasks {
                    if !order.contains(&task.id) {
                        reordered.push(task.clone());
                    }
                }
                self.tasks = reordered;
                self.save(ctx)?;
            }
            "filter" => {
                self.filter = serde_json::from_value(action.payload["value"].clone())
                    .map_err(|e| ModuleError::InvalidAction(format!("filter: {e}")))?;
            }
            "sort" => {
                self.sort = serde_json::from_value(action.payload["value"].clone())
                    .map_err(|e| ModuleError::InvalidAction(format!("sort: {e}")))?;
            }
            "search" => {
                self.query = action.str_arg("query")?.to_string();
            }
            _ => return Err(action.unknown()),
        }
        Ok(ActionOutcome::Handled)
    }
}
