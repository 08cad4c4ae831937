//! Dashboard statistics
//!
//! Pure projection over `(project, tasks)` rows. The caller loads the rows
//! and supplies the clock, which keeps every number here reproducible.

use chrono::{DateTime, Duration, NaiveDate, Utc};
use serde::Serialize;

use crate::domain::project::{Project, ProjectStatus};
use crate::domain::task::{Task, TaskPriority, TaskStatus};

/// Days covered by the trend series, today included
pub const TREND_DAYS: i64 = 7;

/// How far ahead a due date counts as upcoming
pub const UPCOMING_WINDOW_DAYS: i64 = 7;

/// Projects shown in the global dashboard
pub const RECENT_PROJECTS_LIMIT: usize = 5;

/// A project with all of its tasks
#[derive(Debug, Clone, Serialize)]
pub struct ProjectWithTasks {
    #[serde(flatten)]
    pub project: Project,
    pub tasks: Vec<Task>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatCounts {
    pub total_projects: usize,
    pub total_tasks: usize,
    pub total_project_in_progress: usize,
    pub total_task_done: usize,
    pub total_task_to_do: usize,
    pub total_task_in_progress: usize,
    pub total_task_testing: usize,
}

/// Per-day status counts of tasks last touched on that day
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TrendBucket {
    /// Short weekday name, e.g. `Mon`
    pub name: String,
    pub date: NaiveDate,
    pub completed: usize,
    pub in_progress: usize,
    pub to_do: usize,
    pub testing: usize,
}

/// One slice of a pie or bar chart
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChartSlice {
    pub name: &'static str,
    pub value: usize,
    pub color: &'static str,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UpcomingTask {
    pub id: String,
    pub title: String,
    pub status: TaskStatus,
    pub priority: TaskPriority,
    pub due_date: DateTime<Utc>,
    pub project_id: String,
    pub project_title: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardStats {
    pub stats: StatCounts,
    pub task_trends_data: Vec<TrendBucket>,
    pub task_status_data: Vec<ChartSlice>,
    pub task_priority_data: Vec<ChartSlice>,
    pub upcoming_tasks: Vec<UpcomingTask>,
    pub recent_projects: Vec<ProjectWithTasks>,
}

fn status_color(status: TaskStatus) -> &'static str {
    match status {
        TaskStatus::ToDo => "#6b7280",
        TaskStatus::InProgress => "#3b82f6",
        TaskStatus::Testing => "#f59e0b",
        TaskStatus::Done => "#10b981",
    }
}

fn priority_color(priority: TaskPriority) -> &'static str {
    match priority {
        TaskPriority::High => "#ef4444",
        TaskPriority::Medium => "#f59e0b",
        TaskPriority::Low => "#6b7280",
    }
}

/// Build the dashboard for `projects`, which must already be newest first
pub fn summarize(
    projects: Vec<ProjectWithTasks>,
    recent_limit: usize,
    now: DateTime<Utc>,
) -> DashboardStats {
    let tasks: Vec<(&Project, &Task)> = projects
        .iter()
        .flat_map(|p| p.tasks.iter().map(move |t| (&p.project, t)))
        .collect();

    let count_status = |status: TaskStatus| tasks.iter().filter(|(_, t)| t.status == status).count();
    let count_priority =
        |priority: TaskPriority| tasks.iter().filter(|(_, t)| t.priority == priority).count();

    let stats = StatCounts {
        total_projects: projects.len(),
        total_tasks: tasks.len(),
        total_project_in_progress: projects
            .iter()
            .filter(|p| p.project.status == ProjectStatus::InProgress)
            .count(),
        total_task_done: count_status(TaskStatus::Done),
        total_task_to_do: count_status(TaskStatus::ToDo),
        total_task_in_progress: count_status(TaskStatus::InProgress),
        total_task_testing: count_status(TaskStatus::Testing),
    };

    let task_status_data = TaskStatus::ALL
        .iter()
        .map(|&status| ChartSlice {
            name: status.as_str(),
            value: count_status(status),
            color: status_color(status),
        })
        .collect();

    let task_priority_data = [TaskPriority::High, TaskPriority::Medium, TaskPriority::Low]
        .iter()
        .map(|&priority| ChartSlice {
            name: priority.as_str(),
            value: count_priority(priority),
            color: priority_color(priority),
        })
        .collect();

    let task_trends_data = trend_series(tasks.iter().map(|(_, t)| *t), now);
    let upcoming_tasks = upcoming(&tasks, now);

    let recent_projects = projects.into_iter().take(recent_limit).collect();

    DashboardStats {
        stats,
        task_trends_data,
        task_status_data,
        task_priority_data,
        upcoming_tasks,
        recent_projects,
    }
}

/// Seven UTC calendar days ending today, oldest first
fn trend_series<'t>(tasks: impl Iterator<Item = &'t Task> + Clone, now: DateTime<Utc>) -> Vec<TrendBucket> {
    let today = now.date_naive();

    (0..TREND_DAYS)
        .rev()
        .map(|days_ago| {
            let date = today - Duration::days(days_ago);
            let mut bucket = TrendBucket {
                name: date.format("%a").to_string(),
                date,
                completed: 0,
                in_progress: 0,
                to_do: 0,
                testing: 0,
            };
            for task in tasks.clone().filter(|t| t.updated_at.date_naive() == date) {
                match task.status {
                    TaskStatus::Done => bucket.completed += 1,
                    TaskStatus::InProgress => bucket.in_progress += 1,
                    TaskStatus::ToDo => bucket.to_do += 1,
                    TaskStatus::Testing => bucket.testing += 1,
                }
            }
            bucket
        })
        .collect()
}

/// Tasks due after `now` and no later than the window end, soonest first
fn upcoming(tasks: &[(&Project, &Task)], now: DateTime<Utc>) -> Vec<UpcomingTask> {
    let horizon = now + Duration::days(UPCOMING_WINDOW_DAYS);

    let mut due: Vec<UpcomingTask> = tasks
        .iter()
        .filter_map(|(project, task)| {
            let due_date = task.due_date?;
            (due_date > now && due_date <= horizon).then(|| UpcomingTask {
                id: task.id.clone(),
                title: task.title.clone(),
                status: task.status,
                priority: task.priority,
                due_date,
                project_id: project.id.clone(),
                project_title: project.title.clone(),
            })
        })
        .collect();
    due.sort_by_key(|t| t.due_date);
    due
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn now() -> DateTime<Utc> {
        // A Wednesday
        Utc.with_ymd_and_hms(2024, 5, 15, 12, 0, 0).unwrap()
    }

    fn task(status: TaskStatus, updated_at: DateTime<Utc>) -> Task {
        let mut task = Task::new("p1", "Task", "u1");
        task.status = status;
        task.updated_at = updated_at;
        task
    }

    fn project_with(tasks: Vec<Task>) -> ProjectWithTasks {
        let mut project = Project::new("Website", None, "u1");
        project.id = "p1".to_string();
        ProjectWithTasks { project, tasks }
    }

    #[test]
    fn test_empty_dashboard() {
        let stats = summarize(vec![], RECENT_PROJECTS_LIMIT, now());

        assert_eq!(stats.stats, StatCounts::default());
        assert_eq!(stats.task_trends_data.len(), 7);
        assert!(stats.task_trends_data.iter().all(|b| b.completed == 0));
        assert_eq!(stats.task_status_data.len(), 4);
        assert!(stats.upcoming_tasks.is_empty());
        assert!(stats.recent_projects.is_empty());
    }

    #[test]
    fn test_status_and_priority_histograms() {
        let mut high = task(TaskStatus::InProgress, now());
        high.priority = TaskPriority::High;
        let tasks = vec![
            task(TaskStatus::ToDo, now()),
            task(TaskStatus::ToDo, now()),
            high,
            task(TaskStatus::Done, now()),
        ];
        let stats = summarize(vec![project_with(tasks)], RECENT_PROJECTS_LIMIT, now());

        assert_eq!(stats.stats.total_tasks, 4);
        assert_eq!(stats.stats.total_task_to_do, 2);
        assert_eq!(stats.stats.total_task_in_progress, 1);
        assert_eq!(stats.stats.total_task_done, 1);
        assert_eq!(stats.stats.total_task_testing, 0);

        let to_do = &stats.task_status_data[0];
        assert_eq!((to_do.name, to_do.value, to_do.color), ("To Do", 2, "#6b7280"));
        let done = &stats.task_status_data[3];
        assert_eq!((done.name, done.value, done.color), ("Done", 1, "#10b981"));

        let high = &stats.task_priority_data[0];
        assert_eq!((high.name, high.value, high.color), ("High", 1, "#ef4444"));
        let medium = &stats.task_priority_data[1];
        assert_eq!(medium.value, 3);
    }

    #[test]
    fn test_trend_counts_done_task_three_days_ago() {
        let three_days_ago = now() - Duration::days(3);
        let stats = summarize(
            vec![project_with(vec![task(TaskStatus::Done, three_days_ago)])],
            RECENT_PROJECTS_LIMIT,
            now(),
        );

        let trends = &stats.task_trends_data;
        assert_eq!(trends.len(), 7);
        assert_eq!(trends[6].date, now().date_naive());
        assert_eq!(trends[6].name, "Wed");
        assert_eq!(trends[3].date, three_days_ago.date_naive());
        assert_eq!(trends[3].completed, 1);
        let others: usize = trends
            .iter()
            .enumerate()
            .filter(|(i, _)| *i != 3)
            .map(|(_, b)| b.completed + b.in_progress + b.to_do + b.testing)
            .sum();
        assert_eq!(others, 0);
    }

    #[test]
    fn test_trend_ignores_tasks_outside_window() {
        let stats = summarize(
            vec![project_with(vec![task(TaskStatus::ToDo, now() - Duration::days(7))])],
            RECENT_PROJECTS_LIMIT,
            now(),
        );
        assert!(stats.task_trends_data.iter().all(|b| b.to_do == 0));
    }

    #[test]
    fn test_upcoming_window_boundaries() {
        let mut inside = task(TaskStatus::ToDo, now());
        inside.title = "inside".into();
        inside.due_date = Some(now() + Duration::days(6));

        let mut on_edge = task(TaskStatus::ToDo, now());
        on_edge.title = "edge".into();
        on_edge.due_date = Some(now() + Duration::days(7));

        let mut beyond = task(TaskStatus::ToDo, now());
        beyond.title = "beyond".into();
        beyond.due_date = Some(now() + Duration::days(8));

        let mut overdue = task(TaskStatus::ToDo, now());
        overdue.title = "overdue".into();
        overdue.due_date = Some(now() - Duration::hours(1));

        let mut due_now = task(TaskStatus::ToDo, now());
        due_now.title = "now".into();
        due_now.due_date = Some(now());

        let undated = task(TaskStatus::ToDo, now());

        let stats = summarize(
            vec![project_with(vec![beyond, on_edge, inside, overdue, due_now, undated])],
            RECENT_PROJECTS_LIMIT,
            now(),
        );

        let titles: Vec<&str> = stats.upcoming_tasks.iter().map(|t| t.title.as_str()).collect();
        assert_eq!(titles, vec!["inside", "edge"]);
        assert_eq!(stats.upcoming_tasks[0].project_title, "Website");
    }

    #[test]
    fn test_upcoming_horizon_to_the_second() {
        let horizon = now() + Duration::days(UPCOMING_WINDOW_DAYS);

        let mut just_inside = task(TaskStatus::ToDo, now());
        just_inside.title = "just inside".into();
        just_inside.due_date = Some(horizon - Duration::seconds(1));

        let mut just_outside = task(TaskStatus::ToDo, now());
        just_outside.title = "just outside".into();
        just_outside.due_date = Some(horizon + Duration::seconds(1));

        let mut first_second = task(TaskStatus::ToDo, now());
        first_second.title = "first second".into();
        first_second.due_date = Some(now() + Duration::seconds(1));

        let stats = summarize(
            vec![project_with(vec![just_outside, just_inside, first_second])],
            RECENT_PROJECTS_LIMIT,
            now(),
        );

        let titles: Vec<&str> = stats.upcoming_tasks.iter().map(|t| t.title.as_str()).collect();
        assert_eq!(titles, vec!["first second", "just inside"]);
    }

    #[test]
    fn test_trend_one_completion_per_day() {
        let tasks = (0..TREND_DAYS)
            .map(|days_ago| task(TaskStatus::Done, now() - Duration::days(days_ago)))
            .collect();
        let stats = summarize(vec![project_with(tasks)], RECENT_PROJECTS_LIMIT, now());

        assert_eq!(stats.task_trends_data.len(), 7);
        for bucket in &stats.task_trends_data {
            assert_eq!(bucket.completed, 1, "bucket {}", bucket.date);
            assert_eq!(bucket.to_do + bucket.in_progress + bucket.testing, 0);
        }
    }

    #[test]
    fn test_recent_projects_limited_and_in_progress_counted() {
        let projects: Vec<ProjectWithTasks> = (0..7)
            .map(|i| {
                let mut project = Project::new(format!("P{i}"), None, "u1");
                if i % 2 == 0 {
                    project.status = ProjectStatus::InProgress;
                }
                ProjectWithTasks { project, tasks: vec![] }
            })
            .collect();

        let stats = summarize(projects, RECENT_PROJECTS_LIMIT, now());
        assert_eq!(stats.stats.total_projects, 7);
        assert_eq!(stats.stats.total_project_in_progress, 4);
        assert_eq!(stats.recent_projects.len(), 5);
        assert_eq!(stats.recent_projects[0].project.title, "P0");
    }

    #[test]
    fn test_serialized_keys() {
        let stats = summarize(vec![project_with(vec![])], 1, now());
        let json = serde_json::to_value(&stats).unwrap();

        assert!(json["stats"]["totalProjectInProgress"].is_number());
        assert!(json["stats"]["totalTaskToDo"].is_number());
        assert!(json["taskTrendsData"][0]["inProgress"].is_number());
        assert!(json["taskStatusData"].is_array());
        assert!(json["taskPriorityData"].is_array());
        assert!(json["upcomingTasks"].is_array());
        assert_eq!(json["recentProjects"][0]["title"], "Website");
        assert!(json["recentProjects"][0]["tasks"].is_array());
    }
}
