use bookmarks::routes::DashboardResponse;
use uuid::Uuid;

use crate::helpers::spawn_app;

#[tokio::test]
async fn dashboard_counts_all_and_shows_five_most_recent() {
    let app = spawn_app().await;
    let token = app.signed_jwt(Uuid::new_v4());

    let mut created = Vec::new();
    for n in 0..6 {
        created.push(
            app.create_bookmark(&token, &format!("https://{n}.example"), &format!("Site {n}"))
                .await,
        );
    }

    let response = app.get("/api/dashboard", Some(&token)).await;
    assert_eq!(response.status().as_u16(), 200);
    let dashboard: DashboardResponse = response.json().await.expect("dashboard body");

    assert_eq!(dashboard.bookmark_count, 6);
    created.reverse();
    created.truncate(5);
    assert_eq!(dashboard.recent_bookmarks, created);
}

#[tokio::test]
async fn dashboard_requires_a_session() {
    let app = spawn_app().await;

    let response = app.get("/api/dashboard", None).await;

    assert_eq!(response.status().as_u16(), 401);
}
