use chrono::{NaiveDate, NaiveDateTime};
use tracing::info;

use crate::auth::{auth::AuthUser, policy};
use crate::error::{ServiceError, ServiceResult};
use crate::model::task::{NewTask, Task, TaskStatus};
use crate::store::{TaskFilter, TaskStore, UserStore};
use crate::utils::time_window::day_window;

#[derive(Debug, Clone)]
pub struct CreateTaskInput {
    pub name: String,
    pub description: Option<String>,
    pub assignee_id: Option<u64>,
}

/// Admins may assign anyone or leave the task unassigned; anybody else
/// always creates for themselves. New tasks start as PLANNED.
pub async fn create_task<S>(
    store: &S,
    actor: &AuthUser,
    input: CreateTaskInput,
    now: NaiveDateTime,
) -> ServiceResult<Task>
where
    S: TaskStore + UserStore,
{
    let name = input.name.trim();
    if name.is_empty() {
        return Err(ServiceError::Validation("Task name is required".into()));
    }

    let assignee_id = if actor.role.is_admin() {
        input.assignee_id
    } else {
        Some(actor.user_id)
    };

    if let Some(id) = assignee_id.filter(|&id| id != actor.user_id) {
        if store.find_user(id).await?.is_none() {
            return Err(ServiceError::Validation(format!("Assignee {id} does not exist")));
        }
    }

    let task = store
        .insert_task(NewTask {
            name: name.to_string(),
            description: input.description.filter(|d| !d.trim().is_empty()),
            creator_id: actor.user_id,
            assignee_id,
            created_at: now,
        })
        .await?;

    info!(task_id = task.id, creator_id = actor.user_id, assignee_id = ?assignee_id, "Task created");
    Ok(task)
}

/// Admins see every task, others only what is assigned to them. `today`
/// narrows to tasks created on that calendar day. Newest first.
pub async fn list_tasks<S: TaskStore>(
    store: &S,
    actor: &AuthUser,
    today: Option<NaiveDate>,
) -> ServiceResult<Vec<Task>> {
    let filter = TaskFilter {
        assignee_id: (!actor.role.is_admin()).then_some(actor.user_id),
        created: today.map(day_window).unwrap_or_default(),
        ..TaskFilter::default()
    };
    Ok(store.list_tasks(&filter).await?)
}

/// Any status may follow any other; only who may change it is enforced.
/// Unassigned tasks are left to admins.
pub async fn update_status<S: TaskStore>(
    store: &S,
    actor: &AuthUser,
    task_id: u64,
    status: TaskStatus,
    now: NaiveDateTime,
) -> ServiceResult<Task> {
    let task = store
        .find_task(task_id)
        .await?
        .ok_or_else(|| ServiceError::NotFound("Task not found".into()))?;

    let allowed = match task.assignee_id {
        Some(assignee_id) => policy::authorize(actor, assignee_id),
        None => policy::require_admin(actor),
    };
    allowed.map_err(|_| ServiceError::Forbidden("Not authorized to update this task".into()))?;

    let updated = store.update_task_status(task.id, status, now).await?;
    info!(
        task_id,
        user_id = actor.user_id,
        from = %task.status,
        to = %updated.status,
        "Task status updated"
    );
    Ok(updated)
}
