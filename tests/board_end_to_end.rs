//! Drives a live server through `ApiClient` and `Board`.

use std::net::SocketAddr;

use taskboard::{
    app::build_app,
    board::{Board, BoardError, DropTarget, MoveOutcome},
    client::{ApiClient, ClientError},
    projects::dto::CreateProjectRequest,
    state::AppState,
    tasks::{dto::CreateTaskRequest, TaskPatch, TaskStatus},
};

async fn spawn_server() -> SocketAddr {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let app = build_app(AppState::fake());
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    addr
}

fn base_url(addr: SocketAddr) -> String {
    format!("http://{addr}/api/v1")
}

#[tokio::test]
async fn board_round_trip() {
    let addr = spawn_server().await;
    let client = ApiClient::new(base_url(addr));

    let auth = client
        .signup("Ada", " Ada@Example.com ", "pw123456")
        .await
        .unwrap();
    assert_eq!(auth.user.email, "ada@example.com");
    assert!(client.is_authenticated());

    let project = client
        .create_project(&CreateProjectRequest::new("Launch", "Ship it"))
        .await
        .unwrap();
    let listed = client.list_projects().await.unwrap();
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].id, project.id);

    let board = Board::new(client);
    board.load(project.id).await.unwrap();
    for status in TaskStatus::ALL {
        assert!(board.column_ids(status).is_empty());
    }

    let a = board
        .create_task(CreateTaskRequest::new("Write copy", "landing page"))
        .await
        .unwrap();
    let b = board
        .create_task(CreateTaskRequest::new("Record demo", "two minutes"))
        .await
        .unwrap();
    let c = board
        .create_task(CreateTaskRequest::new("Publish", "blog").with_status(TaskStatus::Done))
        .await
        .unwrap();
    assert_eq!(a.status, TaskStatus::Todo);
    assert_eq!(board.column_ids(TaskStatus::Todo), vec![a.id, b.id]);
    assert_eq!(board.column_ids(TaskStatus::Done), vec![c.id]);

    // Reorder stays local.
    let outcome = board
        .move_task(b.id, Some(DropTarget::Task(a.id)))
        .await
        .unwrap();
    assert_eq!(outcome, MoveOutcome::Reordered);
    assert_eq!(board.column_ids(TaskStatus::Todo), vec![b.id, a.id]);

    let outcome = board
        .move_task(a.id, Some(DropTarget::Column(TaskStatus::InProgress)))
        .await
        .unwrap();
    assert_eq!(
        outcome,
        MoveOutcome::Moved {
            from: TaskStatus::Todo,
            to: TaskStatus::InProgress
        }
    );

    let edited = board
        .edit_task(
            c.id,
            TaskPatch {
                title: Some("Publish post".into()),
                ..TaskPatch::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(edited.title, "Publish post");
    assert_eq!(edited.status, TaskStatus::Done);

    board.delete_task(b.id).await.unwrap();

    // The server agrees with what the board shows, modulo in-column order.
    board.reload().await.unwrap();
    assert!(board.column_ids(TaskStatus::Todo).is_empty());
    assert_eq!(board.column_ids(TaskStatus::InProgress), vec![a.id]);
    assert_eq!(board.column_ids(TaskStatus::Done), vec![c.id]);
    assert_eq!(board.task(c.id).unwrap().title, "Publish post");
}

#[tokio::test]
async fn bad_credentials_and_expired_sessions() {
    let addr = spawn_server().await;
    let client = ApiClient::new(base_url(addr));
    client.signup("Bo", "bo@example.com", "pw123456").await.unwrap();

    let err = client.signup("Bo", "bo@example.com", "pw123456").await.unwrap_err();
    assert!(matches!(err, ClientError::Validation(ref m) if m == "User already exists"));

    client.logout();
    let err = client.login("bo@example.com", "wrong").await.unwrap_err();
    assert!(matches!(err, ClientError::Validation(ref m) if m == "Invalid credentials"));
    client.login("BO@example.com", "pw123456").await.unwrap();
    assert!(client.is_authenticated());

    let stale = ApiClient::new(base_url(addr)).with_token("not-a-jwt");
    let board = Board::new(stale);
    let err = board.load(uuid::Uuid::new_v4()).await.unwrap_err();
    assert!(err.is_unauthorized());
    assert!(matches!(err, BoardError::Api(ClientError::Unauthorized(_))));
    assert!(!board.api().is_authenticated());
}
