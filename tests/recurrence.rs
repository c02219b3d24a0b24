mod support;

use chrono::Duration;
use support::{at, seeded_store, task, task_record, MODULE, PROJECT};
use taskdeck::actor::StaticIdentity;
use taskdeck::model::{ActivityKind, RecurrencePattern};
use taskdeck::recurrence::{create_new_instance, recurrent_tasks_to_create};
use taskdeck::store::ProjectScope;
use taskdeck::tasks::TaskRecords;

#[tokio::test]
async fn new_instance_stamps_the_original() -> Result<(), Box<dyn std::error::Error>> {
    let mut practice = task("Choir practice");
    practice.recurrence_pattern = Some(RecurrencePattern::Weekly);
    practice.due_date = Some(at(2024, 1, 1));
    practice.fullfilled = true;
    let store = seeded_store(vec![
        task_record(1, PROJECT, practice),
        task_record(2, PROJECT, task("One-off")),
    ])
    .await;
    let identity = StaticIdentity::new(3);
    let tasks = TaskRecords::new(ProjectScope::new(&store, MODULE, PROJECT), &identity);

    let now = at(2024, 1, 9);
    let snapshot = tasks.list().await?;
    let due: Vec<i64> = recurrent_tasks_to_create(&snapshot, now).iter().map(|task| task.id).collect();
    assert_eq!(due, vec![1]);

    let original = tasks.get(1).await?;
    let instance = create_new_instance(&tasks, &original, now)
        .await?
        .expect("instance due");
    assert_eq!(instance.due_date, Some(at(2024, 1, 8)));
    assert!(!instance.fullfilled);
    assert!(instance.activity.is_empty());

    let stamped = tasks.get(1).await?;
    assert_eq!(stamped.recurrence_last_created, Some(now));
    let entry = stamped.activity.last().expect("update entry");
    assert_eq!(entry.kind, ActivityKind::Update);
    let value = entry.value.clone().expect("diff");
    assert!(value.get("recurrenceLastCreated").is_some());

    // The next interval starts at the stamp.
    assert!(create_new_instance(&tasks, &stamped, now + Duration::days(6))
        .await?
        .is_none());
    assert!(create_new_instance(&tasks, &stamped, now + Duration::days(7))
        .await?
        .is_some());
    Ok(())
}
