use anyhow::{Result, bail};

use todos_application::api::{CreateArgs, DeleteArgs, ReadArgs, ToggleArgs, UpdateArgs};
use todos_application::{TaskApi, TaskRequest, TaskResponse};
use todos_core::task::{Task, TaskId};

use crate::Filter;

fn format_task(task: &Task) -> String {
    let mark = if task.is_completed { "x" } else { " " };
    let mut line = format!(
        "[{}] {}  {}  {}",
        mark,
        task.id,
        task.created_at.format("%Y-%m-%d %H:%M"),
        task.title
    );
    if !task.description.is_empty() {
        line.push_str(&format!(" ({})", task.description));
    }
    line
}

fn read_request(filter: Filter, newest: bool) -> TaskRequest {
    let args = ReadArgs::default();
    match (filter, newest) {
        (Filter::All, false) => TaskRequest::GetAll(args),
        (Filter::All, true) => TaskRequest::GetAllNewest(args),
        (Filter::Incomplete, false) => TaskRequest::GetIncomplete(args),
        (Filter::Incomplete, true) => TaskRequest::GetIncompleteNewest(args),
        (Filter::Completed, false) => TaskRequest::GetCompleted(args),
        // No newest-first completed view; reverse the creation-order read
        (Filter::Completed, true) => TaskRequest::GetCompleted(args),
    }
}

fn expect_task(response: TaskResponse) -> Result<Task> {
    match response {
        TaskResponse::Task(task) => Ok(task),
        other => bail!("Unexpected response: {:?}", other),
    }
}

pub async fn add(api: &TaskApi, token: Option<&str>, title: String, description: String) -> Result<()> {
    let request = TaskRequest::Create(CreateArgs {
        title,
        description,
        user_id: None,
    });
    let task = expect_task(api.call(token, request).await?)?;
    println!("Created {}", task.id);
    Ok(())
}

pub async fn list(api: &TaskApi, token: Option<&str>, filter: Filter, newest: bool) -> Result<()> {
    let mut tasks = match api.call(token, read_request(filter, newest)).await? {
        TaskResponse::Tasks(tasks) => tasks,
        other => bail!("Unexpected response: {:?}", other),
    };
    if filter == Filter::Completed && newest {
        tasks.reverse();
    }

    if tasks.is_empty() {
        println!("No tasks.");
        return Ok(());
    }
    for task in &tasks {
        println!("{}", format_task(task));
    }
    Ok(())
}

pub async fn edit(
    api: &TaskApi,
    token: Option<&str>,
    id: String,
    title: Option<String>,
    description: Option<String>,
) -> Result<()> {
    if title.is_none() && description.is_none() {
        bail!("Nothing to change: pass --title and/or --description");
    }
    let request = TaskRequest::UpdateTodo(UpdateArgs {
        id: TaskId::from(id),
        title,
        description,
        user_id: None,
    });
    let task = expect_task(api.call(token, request).await?)?;
    println!("{}", format_task(&task));
    Ok(())
}

pub async fn toggle(api: &TaskApi, token: Option<&str>, id: String, completed: bool) -> Result<()> {
    let request = TaskRequest::Toggle(ToggleArgs {
        id: TaskId::from(id.as_str()),
        is_completed: completed,
        user_id: None,
    });
    api.call(token, request).await?;
    println!(
        "Marked {} as {}",
        id,
        if completed { "completed" } else { "incomplete" }
    );
    Ok(())
}

pub async fn delete(api: &TaskApi, token: Option<&str>, id: String) -> Result<()> {
    let request = TaskRequest::DeleteTodo(DeleteArgs {
        id: TaskId::from(id.as_str()),
        user_id: None,
    });
    api.call(token, request).await?;
    println!("Deleted {}", id);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn task(description: &str, is_completed: bool) -> Task {
        Task {
            id: TaskId::from("t-1"),
            title: "Buy milk".to_string(),
            description: description.to_string(),
            is_completed,
            created_at: Utc.with_ymd_and_hms(2024, 5, 1, 9, 30, 0).unwrap(),
            user_id: None,
        }
    }

    #[test]
    fn test_format_task() {
        assert_eq!(
            format_task(&task("2%", true)),
            "[x] t-1  2024-05-01 09:30  Buy milk (2%)"
        );
        assert_eq!(
            format_task(&task("", false)),
            "[ ] t-1  2024-05-01 09:30  Buy milk"
        );
    }

    #[test]
    fn test_read_request_mapping() {
        assert_eq!(read_request(Filter::All, true).method(), "getAllNewest");
        assert_eq!(read_request(Filter::Incomplete, false).method(), "getIncomplete");
        assert_eq!(read_request(Filter::Completed, true).method(), "getCompleted");
    }
}
