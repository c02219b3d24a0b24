mod support;

use support::{list, list_record, seeded_store, MODULE, OTHER_PROJECT, PROJECT};
use taskdeck::lists::ListRecords;
use taskdeck::session::Session;
use taskdeck::store::ProjectScope;

#[tokio::test]
async fn concurrent_bootstraps_create_one_default_list() -> Result<(), Box<dyn std::error::Error>> {
    let store = seeded_store(Vec::new()).await;
    let session = Session::new();
    let lists = ListRecords::new(ProjectScope::new(&store, MODULE, PROJECT), &session, "Tasks");

    let (first, second) = tokio::join!(lists.ensure_default_list(), lists.ensure_default_list());
    let created: Vec<_> = [first?, second?].into_iter().flatten().collect();
    assert_eq!(created.len(), 1);

    let defaults: Vec<_> = lists.lists().await?.into_iter().filter(|list| list.is_default).collect();
    assert_eq!(defaults.len(), 1);
    assert_eq!(defaults[0].name, "Tasks");
    assert!(!session.is_creating_default_list(PROJECT));
    Ok(())
}

#[tokio::test]
async fn existing_default_list_is_kept() -> Result<(), Box<dyn std::error::Error>> {
    let store = seeded_store(vec![list_record(5, PROJECT, list("Inbox", true, true, false))]).await;
    let session = Session::new();
    let lists = ListRecords::new(ProjectScope::new(&store, MODULE, PROJECT), &session, "Tasks");

    assert!(lists.ensure_default_list().await?.is_none());
    assert_eq!(lists.default_list().await?.map(|list| list.id), Some(5));
    Ok(())
}

#[tokio::test]
async fn bootstrap_is_per_project() -> Result<(), Box<dyn std::error::Error>> {
    let store = seeded_store(vec![list_record(5, PROJECT, list("Inbox", true, true, false))]).await;
    let session = Session::new();
    let other = ListRecords::new(
        ProjectScope::new(&store, MODULE, OTHER_PROJECT),
        &session,
        "Tasks",
    );

    let created = other.ensure_default_list().await?.expect("created");
    assert_eq!(created.data_category_id, OTHER_PROJECT);
    assert_eq!(other.lists().await?.len(), 1);
    Ok(())
}
