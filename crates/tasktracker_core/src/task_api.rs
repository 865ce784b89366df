use crate::error::AppError;
use crate::model::{Task, TaskStatus};
use crate::storage::json_store;
use std::path::Path;
use time::format_description::well_known::Rfc3339;
use time::{Date, OffsetDateTime};

/// Partial update applied by [`update_task`]; `None` leaves a field alone.
#[derive(Debug, Clone, Default)]
pub struct TaskChanges {
    pub title: Option<String>,
    pub description: Option<String>,
    pub date: Option<Date>,
    pub status: Option<TaskStatus>,
}

impl TaskChanges {
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.description.is_none()
            && self.date.is_none()
            && self.status.is_none()
    }
}

pub fn add_task(
    path: &Path,
    title: &str,
    description: Option<&str>,
    date: Date,
    status: TaskStatus,
) -> Result<Task, AppError> {
    let trimmed = title.trim();
    if trimmed.is_empty() {
        return Err(AppError::invalid_input("title is required"));
    }

    let created_at = OffsetDateTime::now_utc()
        .format(&Rfc3339)
        .map_err(|err| AppError::invalid_data(err.to_string()))?;
    let id = format!("task-{}", OffsetDateTime::now_utc().unix_timestamp_nanos());

    let task = Task {
        id,
        title: trimmed.to_string(),
        description: description
            .map(str::trim)
            .filter(|text| !text.is_empty())
            .map(str::to_string),
        date,
        status,
        created_at,
    };

    let mut tasks = json_store::load_tasks(path)?;
    tasks.push(task.clone());
    json_store::save_tasks(path, &tasks)?;

    Ok(task)
}

pub fn update_task(path: &Path, id: &str, changes: &TaskChanges) -> Result<Task, AppError> {
    let trimmed_id = id.trim();
    if trimmed_id.is_empty() {
        return Err(AppError::invalid_input("id is required"));
    }
    if changes.is_empty() {
        return Err(AppError::invalid_input("nothing to update"));
    }

    let title = match changes.title.as_deref() {
        Some(value) => {
            let trimmed = value.trim();
            if trimmed.is_empty() {
                return Err(AppError::invalid_input("title is required"));
            }
            Some(trimmed.to_string())
        }
        None => None,
    };

    let mut tasks = json_store::load_tasks(path)?;
    let index = tasks
        .iter()
        .position(|task| task.id == trimmed_id)
        .ok_or_else(|| AppError::invalid_input("task not found"))?;

    let task = &mut tasks[index];
    if let Some(title) = title {
        task.title = title;
    }
    if let Some(description) = changes.description.as_deref() {
        let trimmed = description.trim();
        task.description = if trimmed.is_empty() {
            None
        } else {
            Some(trimmed.to_string())
        };
    }
    if let Some(date) = changes.date {
        task.date = date;
    }
    if let Some(status) = changes.status {
        task.status = status;
    }

    let updated = task.clone();
    json_store::save_tasks(path, &tasks)?;

    Ok(updated)
}

pub fn delete_task(path: &Path, id: &str) -> Result<Task, AppError> {
    let trimmed_id = id.trim();
    if trimmed_id.is_empty() {
        return Err(AppError::invalid_input("id is required"));
    }

    let mut tasks = json_store::load_tasks(path)?;
    let index = tasks
        .iter()
        .position(|task| task.id == trimmed_id)
        .ok_or_else(|| AppError::invalid_input("task not found"))?;

    let removed = tasks.remove(index);
    json_store::save_tasks(path, &tasks)?;

    Ok(removed)
}

pub fn get_task_by_id(path: &Path, id: &str) -> Result<Task, AppError> {
    let trimmed_id = id.trim();
    if trimmed_id.is_empty() {
        return Err(AppError::invalid_input("id is required"));
    }

    let tasks = json_store::load_tasks(path)?;
    tasks
        .into_iter()
        .find(|task| task.id == trimmed_id)
        .ok_or_else(|| AppError::invalid_input("task not found"))
}

pub fn list_all(path: &Path) -> Result<Vec<Task>, AppError> {
    json_store::load_tasks(path)
}

pub fn list_for_date(path: &Path, date: Date) -> Result<Vec<Task>, AppError> {
    let tasks = json_store::load_tasks(path)?;
    Ok(tasks.into_iter().filter(|task| task.date == date).collect())
}

/// Date-range filter with either bound optional; no bounds means the whole
/// collection.
pub fn list_in_range(
    path: &Path,
    from: Option<Date>,
    to: Option<Date>,
) -> Result<Vec<Task>, AppError> {
    let tasks = json_store::load_tasks(path)?;
    Ok(filter_in_range(tasks, from, to))
}

pub fn list_by_status(path: &Path, status: TaskStatus) -> Result<Vec<Task>, AppError> {
    let tasks = json_store::load_tasks(path)?;
    Ok(tasks
        .into_iter()
        .filter(|task| task.status == status)
        .collect())
}

/// Replaces the whole collection with an imported one. Incoming ids must
/// be unique.
pub fn replace_all(path: &Path, tasks: Vec<Task>) -> Result<usize, AppError> {
    let mut seen = std::collections::HashSet::new();
    for task in &tasks {
        if !seen.insert(task.id.as_str()) {
            return Err(AppError::invalid_data(format!(
                "duplicate task id {}",
                task.id
            )));
        }
    }

    let count = tasks.len();
    json_store::save_tasks(path, &tasks)?;
    Ok(count)
}

pub fn export_tasks(path: &Path, dest: &Path) -> Result<usize, AppError> {
    let tasks = json_store::load_tasks(path)?;
    json_store::save_tasks(dest, &tasks)?;
    Ok(tasks.len())
}

fn filter_in_range(tasks: Vec<Task>, from: Option<Date>, to: Option<Date>) -> Vec<Task> {
    tasks
        .into_iter()
        .filter(|task| {
            if let Some(from) = from
                && task.date < from
            {
                return false;
            }
            if let Some(to) = to
                && task.date > to
            {
                return false;
            }
            true
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::{
        TaskChanges, add_task, delete_task, export_tasks, filter_in_range, get_task_by_id,
        list_by_status, list_for_date, replace_all, update_task,
    };
    use crate::model::{Task, TaskStatus};
    use crate::storage::json_store;
    use std::path::PathBuf;
    use std::time::{SystemTime, UNIX_EPOCH};
    use time::format_description::well_known::Rfc3339;
    use time::{Date, Duration, Month, OffsetDateTime};

    fn temp_path(file_name: &str) -> PathBuf {
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap()
            .as_nanos();
        std::env::temp_dir().join(format!("tasktracker-{nanos}-{file_name}"))
    }

    fn sample_date() -> Date {
        Date::from_calendar_date(2025, Month::December, 20).unwrap()
    }

    fn stored_task(id: &str, date: Date, status: TaskStatus) -> Task {
        Task {
            id: id.to_string(),
            title: "demo".to_string(),
            description: None,
            date,
            status,
            created_at: "2025-12-01T00:00:00Z".to_string(),
        }
    }

    #[test]
    fn add_task_rejects_blank_title() {
        let path = temp_path("blank-title.json");
        let err = add_task(&path, "  ", None, sample_date(), TaskStatus::NotStarted).unwrap_err();
        std::fs::remove_file(&path).ok();

        assert_eq!(err.code(), "invalid_input");
    }

    #[test]
    fn add_task_writes_to_store() {
        let path = temp_path("add-task.json");
        let task = add_task(
            &path,
            " demo ",
            Some("some notes"),
            sample_date(),
            TaskStatus::NotStarted,
        )
        .unwrap();
        let loaded = json_store::load_tasks(&path).unwrap();
        std::fs::remove_file(&path).ok();

        assert_eq!(loaded.len(), 1);
        assert_eq!(loaded[0], task);
        assert!(task.id.starts_with("task-"));
        assert_eq!(task.title, "demo");
        assert_eq!(task.description.as_deref(), Some("some notes"));
        assert_eq!(task.date, sample_date());
        assert_eq!(task.status, TaskStatus::NotStarted);
        OffsetDateTime::parse(&task.created_at, &Rfc3339).unwrap();
    }

    #[test]
    fn add_task_drops_blank_description() {
        let path = temp_path("blank-description.json");
        let task = add_task(&path, "demo", Some("   "), sample_date(), TaskStatus::InProgress)
            .unwrap();
        std::fs::remove_file(&path).ok();

        assert_eq!(task.description, None);
    }

    #[test]
    fn update_task_applies_partial_changes() {
        let path = temp_path("update-task.json");
        let original = stored_task("task-1", sample_date(), TaskStatus::NotStarted);
        json_store::save_tasks(&path, std::slice::from_ref(&original)).unwrap();

        let changes = TaskChanges {
            status: Some(TaskStatus::Completed),
            date: Some(sample_date() + Duration::days(1)),
            ..TaskChanges::default()
        };
        let updated = update_task(&path, "task-1", &changes).unwrap();
        let loaded = json_store::load_tasks(&path).unwrap();
        std::fs::remove_file(&path).ok();

        assert_eq!(updated.title, original.title);
        assert_eq!(updated.status, TaskStatus::Completed);
        assert_eq!(updated.date, sample_date() + Duration::days(1));
        assert_eq!(updated.created_at, original.created_at);
        assert_eq!(loaded[0], updated);
    }

    #[test]
    fn update_task_clears_description_when_blanked() {
        let path = temp_path("update-clear-description.json");
        let mut original = stored_task("task-1", sample_date(), TaskStatus::NotStarted);
        original.description = Some("old notes".to_string());
        json_store::save_tasks(&path, std::slice::from_ref(&original)).unwrap();

        let changes = TaskChanges {
            description: Some("  ".to_string()),
            ..TaskChanges::default()
        };
        let updated = update_task(&path, "task-1", &changes).unwrap();
        std::fs::remove_file(&path).ok();

        assert_eq!(updated.description, None);
    }

    #[test]
    fn update_task_rejects_blank_title() {
        let path = temp_path("update-blank-title.json");
        let task = stored_task("task-1", sample_date(), TaskStatus::NotStarted);
        json_store::save_tasks(&path, &[task]).unwrap();

        let changes = TaskChanges {
            title: Some("  ".to_string()),
            ..TaskChanges::default()
        };
        let err = update_task(&path, "task-1", &changes).unwrap_err();
        std::fs::remove_file(&path).ok();

        assert_eq!(err.code(), "invalid_input");
    }

    #[test]
    fn update_task_rejects_empty_changes() {
        let path = temp_path("update-empty.json");
        let task = stored_task("task-1", sample_date(), TaskStatus::NotStarted);
        json_store::save_tasks(&path, &[task]).unwrap();

        let err = update_task(&path, "task-1", &TaskChanges::default()).unwrap_err();
        std::fs::remove_file(&path).ok();

        assert_eq!(err.code(), "invalid_input");
    }

    #[test]
    fn update_task_rejects_missing_id() {
        let path = temp_path("update-missing.json");
        let task = stored_task("task-1", sample_date(), TaskStatus::NotStarted);
        json_store::save_tasks(&path, &[task]).unwrap();

        let changes = TaskChanges {
            status: Some(TaskStatus::Completed),
            ..TaskChanges::default()
        };
        let err = update_task(&path, "task-2", &changes).unwrap_err();
        std::fs::remove_file(&path).ok();

        assert_eq!(err.code(), "invalid_input");
    }

    #[test]
    fn delete_task_removes_task() {
        let path = temp_path("delete-task.json");
        let task = stored_task("task-1", sample_date(), TaskStatus::NotStarted);
        json_store::save_tasks(&path, &[task]).unwrap();

        let removed = delete_task(&path, "task-1").unwrap();
        let loaded = json_store::load_tasks(&path).unwrap();
        std::fs::remove_file(&path).ok();

        assert_eq!(removed.id, "task-1");
        assert!(loaded.is_empty());
    }

    #[test]
    fn delete_task_rejects_unknown_id() {
        let path = temp_path("delete-missing.json");
        let task = stored_task("task-1", sample_date(), TaskStatus::NotStarted);
        json_store::save_tasks(&path, &[task]).unwrap();

        let err = delete_task(&path, "task-2").unwrap_err();
        std::fs::remove_file(&path).ok();

        assert_eq!(err.code(), "invalid_input");
    }

    #[test]
    fn get_task_by_id_returns_task() {
        let path = temp_path("get-task.json");
        let task = stored_task("task-1", sample_date(), TaskStatus::Completed);
        json_store::save_tasks(&path, std::slice::from_ref(&task)).unwrap();

        let fetched = get_task_by_id(&path, "task-1").unwrap();
        std::fs::remove_file(&path).ok();

        assert_eq!(fetched, task);
    }

    #[test]
    fn get_task_by_id_rejects_blank_id() {
        let path = temp_path("get-blank.json");
        json_store::save_tasks(&path, &[]).unwrap();

        let err = get_task_by_id(&path, "  ").unwrap_err();
        std::fs::remove_file(&path).ok();

        assert_eq!(err.code(), "invalid_input");
    }

    #[test]
    fn list_for_date_matches_exact_day() {
        let path = temp_path("list-for-date.json");
        let day = sample_date();
        let tasks = vec![
            stored_task("task-1", day, TaskStatus::NotStarted),
            stored_task("task-2", day + Duration::days(1), TaskStatus::NotStarted),
        ];
        json_store::save_tasks(&path, &tasks).unwrap();

        let listed = list_for_date(&path, day).unwrap();
        std::fs::remove_file(&path).ok();

        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].id, "task-1");
    }

    #[test]
    fn list_by_status_filters_tasks() {
        let path = temp_path("list-by-status.json");
        let tasks = vec![
            stored_task("task-1", sample_date(), TaskStatus::Completed),
            stored_task("task-2", sample_date(), TaskStatus::InProgress),
        ];
        json_store::save_tasks(&path, &tasks).unwrap();

        let listed = list_by_status(&path, TaskStatus::Completed).unwrap();
        std::fs::remove_file(&path).ok();

        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].id, "task-1");
    }

    #[test]
    fn filter_in_range_honors_optional_bounds() {
        let day = sample_date();
        let tasks = vec![
            stored_task("early", day - Duration::days(2), TaskStatus::NotStarted),
            stored_task("mid", day, TaskStatus::NotStarted),
            stored_task("late", day + Duration::days(2), TaskStatus::NotStarted),
        ];

        let both = filter_in_range(
            tasks.clone(),
            Some(day - Duration::days(1)),
            Some(day + Duration::days(1)),
        );
        assert_eq!(both.len(), 1);
        assert_eq!(both[0].id, "mid");

        let from_only = filter_in_range(tasks.clone(), Some(day), None);
        assert_eq!(from_only.len(), 2);

        let to_only = filter_in_range(tasks.clone(), None, Some(day));
        assert_eq!(to_only.len(), 2);

        let unbounded = filter_in_range(tasks, None, None);
        assert_eq!(unbounded.len(), 3);
    }

    #[test]
    fn replace_all_overwrites_store() {
        let path = temp_path("replace-all.json");
        let existing = stored_task("task-1", sample_date(), TaskStatus::NotStarted);
        json_store::save_tasks(&path, &[existing]).unwrap();

        let incoming = vec![
            stored_task("task-2", sample_date(), TaskStatus::Completed),
            stored_task("task-3", sample_date(), TaskStatus::InProgress),
        ];
        let count = replace_all(&path, incoming).unwrap();
        let loaded = json_store::load_tasks(&path).unwrap();
        std::fs::remove_file(&path).ok();

        assert_eq!(count, 2);
        assert_eq!(loaded.len(), 2);
        assert_eq!(loaded[0].id, "task-2");
    }

    #[test]
    fn replace_all_rejects_duplicate_ids() {
        let path = temp_path("replace-dup.json");
        let incoming = vec![
            stored_task("task-1", sample_date(), TaskStatus::Completed),
            stored_task("task-1", sample_date(), TaskStatus::Completed),
        ];

        let err = replace_all(&path, incoming).unwrap_err();
        std::fs::remove_file(&path).ok();

        assert_eq!(err.code(), "invalid_data");
    }

    #[test]
    fn export_tasks_copies_collection() {
        let path = temp_path("export-src.json");
        let dest = temp_path("export-dest.json");
        let tasks = vec![
            stored_task("task-1", sample_date(), TaskStatus::Completed),
            stored_task("task-2", sample_date(), TaskStatus::NotStarted),
        ];
        json_store::save_tasks(&path, &tasks).unwrap();

        let count = export_tasks(&path, &dest).unwrap();
        let exported = json_store::load_tasks(&dest).unwrap();
        std::fs::remove_file(&path).ok();
        std::fs::remove_file(&dest).ok();

        assert_eq!(count, 2);
        assert_eq!(exported, tasks);
    }
}
