mod support;

use serde_json::json;
use support::{seeded_store, task, MODULE, PROJECT};
use taskdeck::actor::StaticIdentity;
use taskdeck::model::ActivityKind;
use taskdeck::store::ProjectScope;
use taskdeck::tasks::{comments, TaskRecords};
use taskdeck::Error;

#[tokio::test]
async fn writes_are_logged_with_the_actor() -> Result<(), Box<dyn std::error::Error>> {
    let store = seeded_store(Vec::new()).await;
    let identity = StaticIdentity::new(8);
    let tasks = TaskRecords::new(ProjectScope::new(&store, MODULE, PROJECT), &identity);

    let created = tasks.create(task("Old name")).await?;
    assert_eq!(created.activity.len(), 1);
    assert_eq!(created.activity[0].kind, ActivityKind::Create);
    assert_eq!(created.activity[0].person_id, 8);

    let mut renamed = created.value.clone();
    renamed.name = "New name".to_string();
    renamed.tags = vec![3];
    let updated = tasks.update(&created, renamed).await?;

    let entry = updated.activity.last().expect("update entry");
    assert_eq!(entry.kind, ActivityKind::Update);
    assert_eq!(
        entry.value,
        Some(json!({
            "name": { "from": "Old name", "to": "New name" },
            "tags": { "to": [3] },
        }))
    );

    let toggled = tasks.toggle(&updated).await?;
    assert!(toggled.fullfilled);
    assert_eq!(toggled.activity.last().and_then(|entry| entry.value.clone()), Some(json!(true)));

    let commented = tasks.comment(&toggled, "Booked the hall").await?;
    let notes = comments(&commented);
    assert_eq!(notes.len(), 1);
    assert_eq!(notes[0].value, Some(json!("Booked the hall")));

    let stored = tasks.get(created.id).await?;
    assert_eq!(stored.activity.len(), 4);
    assert_eq!(stored.name, "New name");
    Ok(())
}

#[tokio::test]
async fn empty_comments_and_unknown_tasks_are_rejected() -> Result<(), Box<dyn std::error::Error>> {
    let store = seeded_store(Vec::new()).await;
    let identity = StaticIdentity::new(8);
    let tasks = TaskRecords::new(ProjectScope::new(&store, MODULE, PROJECT), &identity);

    let created = tasks.create(task("Sweep")).await?;
    assert!(matches!(
        tasks.comment(&created, "   ").await,
        Err(Error::InvalidArgument(_))
    ));
    assert!(matches!(
        tasks.get(999).await,
        Err(Error::TaskNotFound { id: 999, project: PROJECT })
    ));
    Ok(())
}
