use image_api_smoke::{ImagesClient, RegisterImageRequest, TaskInput, TaskStatus, TaskType};
use images_api_dev::{DevConfig, InMemoryImagesService};

fn service() -> InMemoryImagesService {
    InMemoryImagesService::new(DevConfig::default())
}

#[tokio::test]
async fn registers_and_deletes_images() {
    let svc = service();
    let resp = svc
        .register_image(RegisterImageRequest {
            name: Some("dev".into()),
            ..Default::default()
        })
        .await
        .unwrap();
    assert_eq!(resp.status, 201);
    let image = resp.entity.unwrap();
    assert_eq!(image.owner.as_deref(), Some("dev-tenant"));
    assert_eq!(svc.image_ids(), vec![image.id.clone()]);

    assert_eq!(svc.delete_image(&image.id).await.unwrap().status, 204);
    assert_eq!(svc.delete_image(&image.id).await.unwrap().status, 404);
    assert_eq!(svc.deleted(), vec![image.id]);
}

#[tokio::test]
async fn file_upload_is_single_shot() {
    let svc = service();
    let image = svc
        .register_image(RegisterImageRequest::default())
        .await
        .unwrap()
        .entity
        .unwrap();

    assert_eq!(svc.get_image_file(&image.id).await.unwrap().status, 204);
    let stored = svc
        .store_image_file(&image.id, b"image-bytes".to_vec())
        .await
        .unwrap();
    assert_eq!(stored.status, 204);
    let again = svc
        .store_image_file(&image.id, b"other".to_vec())
        .await
        .unwrap();
    assert_eq!(again.status, 409);

    let fetched = svc.get_image_file(&image.id).await.unwrap();
    assert_eq!(fetched.status, 200);
    assert_eq!(fetched.entity.unwrap(), b"image-bytes");
    assert_eq!(svc.get_image_file("missing").await.unwrap().status, 404);
}

#[tokio::test]
async fn new_tasks_are_pending_and_owned_by_tenant() {
    let svc = service();
    let resp = svc
        .create_task(TaskInput::import("swift://c/i.qcow2", "qcow2"), TaskType::Import)
        .await
        .unwrap();
    assert_eq!(resp.status, 201);
    let task = resp.entity.unwrap();
    assert_eq!(task.status, Some(TaskStatus::Pending));
    assert_eq!(task.result, None);
    assert_eq!(task.owner.as_deref(), Some("dev-tenant"));
    assert_eq!(task.self_link, Some(format!("/v2/tasks/{}", task.id)));

    let fetched = svc.get_task(&task.id).await.unwrap();
    assert_eq!(fetched.entity, Some(task));
}

#[tokio::test]
async fn task_without_source_is_rejected() {
    let svc = service();
    let resp = svc
        .create_task(TaskInput::default(), TaskType::Import)
        .await
        .unwrap();
    assert_eq!(resp.status, 400);
    assert!(svc.tasks().is_empty());
}

#[tokio::test]
async fn deduplication_returns_first_task() {
    let svc = InMemoryImagesService::new(DevConfig {
        deduplicate_tasks: true,
        ..Default::default()
    });
    let input = TaskInput::import("swift://c/i.qcow2", "qcow2");
    let first = svc
        .create_task(input.clone(), TaskType::Import)
        .await
        .unwrap()
        .entity
        .unwrap();
    let second = svc
        .create_task(input, TaskType::Import)
        .await
        .unwrap()
        .entity
        .unwrap();
    assert_eq!(first, second);
    assert_eq!(svc.calls().create_task, 2);
}
